pub mod attendance;
pub mod member;
pub mod recurrence;
pub mod service;
