pub mod backup;
pub mod checkin;
pub mod closer;
pub mod dedup;
pub mod generator;
pub mod log;
pub mod members;
pub mod report;
pub mod scanner;
pub mod services;
pub mod wedge;
