//! Closing a session: every expected member without a row is marked absent.

use crate::core::checkin::ensure_check_in_target;
use crate::db::attendance::insert_if_absent;
use crate::db::log::audit;
use crate::db::members::list_regular_members;
use crate::db::pool::DbPool;
use crate::db::services::get_service;
use crate::errors::AppResult;
use crate::models::attendance::AttendanceStatus;
use crate::models::member::Member;
use crate::models::service::Service;
use chrono::{Duration, NaiveDateTime};
use rusqlite::Connection;
use serde::Serialize;
use std::collections::HashSet;

/// Who is expected at a session.
pub trait Roster {
    fn expected(&self, conn: &Connection, service: &Service) -> AppResult<Vec<Member>>;
}

/// Every member who is not a visitor.
pub struct ActiveMembers;

impl Roster for ActiveMembers {
    fn expected(&self, conn: &Connection, _service: &Service) -> AppResult<Vec<Member>> {
        list_regular_members(conn)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CloseSummary {
    pub updated_count: usize,
    pub message: String,
}

pub struct AbsenceCloser;

impl AbsenceCloser {
    /// Mark the rest of the roster absent in a single transaction.
    /// Calling it again finds nobody left and reports zero.
    pub fn close_session(
        pool: &mut DbPool,
        service_id: i64,
        roster: &dyn Roster,
    ) -> AppResult<CloseSummary> {
        let service = get_service(&pool.conn, service_id)?;
        ensure_check_in_target(&service)?;

        let tx = pool.conn.transaction()?;
        let mut updated_count = 0;

        for member in roster.expected(&tx, &service)? {
            if insert_if_absent(&tx, member.id, service.id, AttendanceStatus::Absent, None, true)?
                .is_some()
            {
                updated_count += 1;
            }
        }

        let message = if updated_count == 0 {
            format!(
                "Everyone expected at {} ({}) already has a record",
                service.name,
                service.date_str()
            )
        } else {
            format!(
                "Marked {} member(s) absent for {} ({})",
                updated_count,
                service.name,
                service.date_str()
            )
        };

        audit(&tx, "close", &service.name, &message)?;
        tx.commit()?;

        Ok(CloseSummary {
            updated_count,
            message,
        })
    }
}

/// Fires the closer once when a session's end time has just passed.
///
/// Only the window `(end, end + grace]` triggers, so reopening the scanner
/// long after the service never closes it again. A service is remembered as
/// handled even when the close attempt fails.
#[derive(Debug)]
pub struct AutoCloseWatcher {
    grace: Duration,
    fired: HashSet<i64>,
}

impl AutoCloseWatcher {
    pub fn new(grace: Duration) -> Self {
        Self {
            grace,
            fired: HashSet::new(),
        }
    }

    pub fn is_due(&self, service: &Service, now: NaiveDateTime) -> bool {
        if self.fired.contains(&service.id) {
            return false;
        }
        match service.ends_at() {
            Some(end) => now > end && now <= end + self.grace,
            None => false,
        }
    }

    /// Run `close` if due. Failures are logged and swallowed.
    pub fn poll<F>(
        &mut self,
        service: &Service,
        now: NaiveDateTime,
        close: F,
    ) -> Option<CloseSummary>
    where
        F: FnOnce(i64) -> AppResult<CloseSummary>,
    {
        if !self.is_due(service, now) {
            return None;
        }
        self.fired.insert(service.id);

        match close(service.id) {
            Ok(summary) => {
                tracing::info!(
                    service_id = service.id,
                    updated = summary.updated_count,
                    "Session ended, absences marked"
                );
                Some(summary)
            }
            Err(e) => {
                tracing::warn!(
                    service_id = service.id,
                    error = %e,
                    "Automatic absence marking failed"
                );
                None
            }
        }
    }
}
