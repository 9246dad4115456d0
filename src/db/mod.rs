pub mod attendance;
pub mod db_utils;
pub mod initialize;
pub mod log;
pub mod members;
pub mod migrate;
pub mod pool;
pub mod services;
pub mod stats;
