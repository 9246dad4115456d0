//! Column conversion helpers shared by the row mappers.

use crate::errors::AppError;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use rusqlite::types::Type;

pub const DATE_FMT: &str = "%Y-%m-%d";
pub const TIME_FMT: &str = "%H:%M";
pub const DATETIME_FMT: &str = "%Y-%m-%d %H:%M:%S";

fn conversion_err(idx: usize, err: AppError) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(err))
}

pub fn date_col(idx: usize, s: &str) -> rusqlite::Result<NaiveDate> {
    NaiveDate::parse_from_str(s, DATE_FMT)
        .map_err(|_| conversion_err(idx, AppError::InvalidDate(s.into())))
}

pub fn opt_date_col(idx: usize, s: Option<String>) -> rusqlite::Result<Option<NaiveDate>> {
    s.map(|v| date_col(idx, &v)).transpose()
}

pub fn time_col(idx: usize, s: &str) -> rusqlite::Result<NaiveTime> {
    NaiveTime::parse_from_str(s, TIME_FMT)
        .map_err(|_| conversion_err(idx, AppError::InvalidTime(s.into())))
}

pub fn opt_time_col(idx: usize, s: Option<String>) -> rusqlite::Result<Option<NaiveTime>> {
    s.map(|v| time_col(idx, &v)).transpose()
}

pub fn opt_datetime_col(idx: usize, s: Option<String>) -> rusqlite::Result<Option<NaiveDateTime>> {
    s.map(|v| {
        NaiveDateTime::parse_from_str(&v, DATETIME_FMT)
            .map_err(|_| conversion_err(idx, AppError::InvalidTime(v.clone())))
    })
    .transpose()
}

pub fn invalid_col(idx: usize, what: &str, value: &str) -> rusqlite::Error {
    conversion_err(idx, AppError::InvalidValue(format!("{what}: {value}")))
}

pub fn fmt_date(d: &NaiveDate) -> String {
    d.format(DATE_FMT).to_string()
}

pub fn fmt_time(t: &NaiveTime) -> String {
    t.format(TIME_FMT).to_string()
}

pub fn fmt_datetime(t: &NaiveDateTime) -> String {
    t.format(DATETIME_FMT).to_string()
}

/// True when `err` is a UNIQUE / PRIMARY KEY constraint violation.
pub fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _)
            if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
    )
}
