//! Unified application error type.
//! All modules (db, core, cli, utils) return AppError to keep the error
//! handling consistent and easy to manage.

use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    // ---------------------------
    // IO
    // ---------------------------
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    // ---------------------------
    // Database-related
    // ---------------------------
    #[error("Database error: {0}")]
    Db(#[from] rusqlite::Error),

    // ---------------------------
    // Parsing errors
    // ---------------------------
    #[error("Invalid date format: {0}")]
    InvalidDate(String),

    #[error("Invalid time format: {0}")]
    InvalidTime(String),

    #[error("Invalid value: {0}")]
    InvalidValue(String),

    // ---------------------------
    // Scheduling
    // ---------------------------
    #[error("Service {0} is not a recurring template")]
    InvalidTemplate(i64),

    #[error("Recurring service {0} has no recurrence pattern")]
    InvalidPattern(i64),

    #[error("A session of service {template} already exists on {date}")]
    DuplicateInstance { template: i64, date: String },

    #[error("Service with ID {0} not found")]
    ServiceNotFound(i64),

    // ---------------------------
    // Check-in
    // ---------------------------
    #[error("\"{0}\" is a recurring service template. Select a specific session/date to check in.")]
    InvalidTarget(String),

    #[error("Member with ID {0} not found")]
    MemberNotFound(String),

    #[error("Camera error: {0}")]
    DeviceError(String),

    #[error("Network error: {0}")]
    NetworkError(String),

    // ---------------------------
    // Config errors
    // ---------------------------
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to load configuration")]
    ConfigLoad,

    // ---------------------------
    // Export errors
    // ---------------------------
    #[error("Export error: {0}")]
    Export(String),

    // ---------------------------
    // Generic fallback
    // ---------------------------
    #[error("Internal error: {0}")]
    Other(String),
}

impl AppError {
    /// Errors after which the capture loop must stop and return to idle.
    /// Everything else is surfaced while the loop keeps sampling.
    pub fn halts_scanner(&self) -> bool {
        matches!(self, AppError::InvalidTarget(_) | AppError::DeviceError(_))
    }
}

pub type AppResult<T> = Result<T, AppError>;
