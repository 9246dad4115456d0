use crate::db::attendance::list_by_service;
use crate::db::pool::DbPool;
use crate::db::services::get_service;
use crate::errors::AppResult;
use crate::models::attendance::{Attendance, AttendanceStatus};
use crate::models::service::Service;
use serde::Serialize;

/// Attendance of one service with per-status totals.
#[derive(Debug, Clone, Serialize)]
pub struct AttendanceReport {
    pub service: Service,
    pub total_present: usize,
    pub total_late: usize,
    pub total_absent: usize,
    pub attendances: Vec<Attendance>,
}

impl AttendanceReport {
    pub fn total(&self) -> usize {
        self.attendances.len()
    }

    /// Share of recorded members who showed up at all (present or late).
    pub fn turnout_percent(&self) -> Option<f64> {
        if self.attendances.is_empty() {
            return None;
        }
        let came = (self.total_present + self.total_late) as f64;
        Some(came * 100.0 / self.total() as f64)
    }
}

pub struct ReportLogic;

impl ReportLogic {
    /// Templates are accepted and simply have no rows.
    pub fn fetch_by_service(pool: &DbPool, service_id: i64) -> AppResult<AttendanceReport> {
        let service = get_service(&pool.conn, service_id)?;
        let attendances = list_by_service(&pool.conn, service_id)?;

        let count = |s: AttendanceStatus| attendances.iter().filter(|a| a.status == s).count();

        Ok(AttendanceReport {
            total_present: count(AttendanceStatus::Present),
            total_late: count(AttendanceStatus::Late),
            total_absent: count(AttendanceStatus::Absent),
            service,
            attendances,
        })
    }
}
