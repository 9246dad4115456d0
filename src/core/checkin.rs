//! Check-in of a member into a session, recorded at most once.

use crate::db::attendance::{find_attendance, get_attendance, insert_if_absent};
use crate::db::log::audit;
use crate::db::members::find_by_code;
use crate::db::pool::DbPool;
use crate::db::services::get_service;
use crate::errors::{AppError, AppResult};
use crate::models::attendance::{Attendance, AttendanceStatus};
use crate::models::service::Service;
use chrono::{Duration, Local, NaiveDateTime};
use serde::Serialize;

/// How a check-in time maps to `present` or `late`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LatePolicy {
    /// Present up to and including the end of the session, late afterwards.
    UntilEnd,
    /// Late once this long has passed since the start.
    AfterStart(Duration),
}

impl LatePolicy {
    pub fn from_minutes(late_after_minutes: Option<u32>) -> Self {
        match late_after_minutes {
            Some(m) => LatePolicy::AfterStart(Duration::minutes(i64::from(m))),
            None => LatePolicy::UntilEnd,
        }
    }

    /// Never returns `Absent`; absences are only written by the closer.
    pub fn status_for(&self, service: &Service, now: NaiveDateTime) -> AttendanceStatus {
        let cutoff = match self {
            LatePolicy::UntilEnd => service.ends_at(),
            LatePolicy::AfterStart(grace) => service.starts_at().map(|s| s + *grace),
        };

        match cutoff {
            Some(limit) if now > limit => AttendanceStatus::Late,
            _ => AttendanceStatus::Present,
        }
    }
}

#[derive(Debug, Clone)]
pub enum CheckInOutcome {
    CheckedIn(Attendance),
    /// Informational: the existing row is returned untouched.
    AlreadyCheckedIn(Attendance),
}

impl CheckInOutcome {
    pub fn attendance(&self) -> &Attendance {
        match self {
            CheckInOutcome::CheckedIn(a) | CheckInOutcome::AlreadyCheckedIn(a) => a,
        }
    }

    pub fn already_checked_in(&self) -> bool {
        matches!(self, CheckInOutcome::AlreadyCheckedIn(_))
    }

    pub fn message(&self) -> String {
        match self {
            CheckInOutcome::CheckedIn(a) => format!("{} checked in successfully", a.member_name),
            CheckInOutcome::AlreadyCheckedIn(a) => {
                format!("{} is already checked in for this service", a.member_name)
            }
        }
    }
}

/// Wire shape of a check-in answer.
#[derive(Debug, Clone, Serialize)]
pub struct CheckInResponse {
    pub success: bool,
    pub already_checked_in: bool,
    pub message: String,
    pub attendance: Option<Attendance>,
}

impl From<CheckInOutcome> for CheckInResponse {
    fn from(outcome: CheckInOutcome) -> Self {
        let message = outcome.message();
        let already = outcome.already_checked_in();
        let attendance = match outcome {
            CheckInOutcome::CheckedIn(a) | CheckInOutcome::AlreadyCheckedIn(a) => a,
        };
        Self {
            success: !already,
            already_checked_in: already,
            message,
            attendance: Some(attendance),
        }
    }
}

impl CheckInResponse {
    /// Both a fresh check-in and a repeat end the scanning session.
    pub fn is_complete(&self) -> bool {
        self.success || self.already_checked_in
    }
}

/// Fails with `InvalidTarget` for templates; one-offs and instances pass.
pub fn ensure_check_in_target(service: &Service) -> AppResult<()> {
    if service.is_template() {
        return Err(AppError::InvalidTarget(service.name.clone()));
    }
    Ok(())
}

pub struct CheckInLogic;

impl CheckInLogic {
    pub fn check_in(
        pool: &mut DbPool,
        identifier: &str,
        service_id: i64,
        now: NaiveDateTime,
        policy: LatePolicy,
    ) -> AppResult<CheckInOutcome> {
        let identifier = identifier.trim();
        if identifier.is_empty() {
            return Err(AppError::InvalidValue("Please enter a member ID".into()));
        }

        let service = get_service(&pool.conn, service_id)?;
        ensure_check_in_target(&service)?;

        let member = find_by_code(&pool.conn, identifier)?
            .ok_or_else(|| AppError::MemberNotFound(identifier.to_string()))?;

        let status = policy.status_for(&service, now);
        let tx = pool.conn.transaction()?;

        let inserted = insert_if_absent(&tx, member.id, service.id, status, Some(now), false)?;
        let outcome = match inserted {
            Some(id) => {
                let row = get_attendance(&tx, id)?
                    .ok_or_else(|| AppError::Other(format!("attendance #{id} vanished")))?;
                let message = format!(
                    "{} {} for {} ({})",
                    member.full_name,
                    status.to_db_str(),
                    service.name,
                    service.date_str()
                );
                audit(&tx, "checkin", &member.code, &message)?;
                CheckInOutcome::CheckedIn(row)
            }
            None => {
                let row = find_attendance(&tx, member.id, service.id)?.ok_or_else(|| {
                    AppError::Other(format!(
                        "attendance for {} missing after conflict",
                        member.code
                    ))
                })?;
                CheckInOutcome::AlreadyCheckedIn(row)
            }
        };

        tx.commit()?;
        Ok(outcome)
    }
}

/// The check-in endpoint as the capture loop sees it.
pub trait CheckInGateway {
    fn check_in(&mut self, identifier: &str, service_id: i64) -> AppResult<CheckInResponse>;
}

/// Gateway backed directly by the local database, stamped with the wall clock.
pub struct LocalGateway<'a> {
    pool: &'a mut DbPool,
    policy: LatePolicy,
}

impl<'a> LocalGateway<'a> {
    pub fn new(pool: &'a mut DbPool, policy: LatePolicy) -> Self {
        Self { pool, policy }
    }

    pub fn pool(&mut self) -> &mut DbPool {
        self.pool
    }
}

impl CheckInGateway for LocalGateway<'_> {
    fn check_in(&mut self, identifier: &str, service_id: i64) -> AppResult<CheckInResponse> {
        let now = Local::now().naive_local();
        CheckInLogic::check_in(self.pool, identifier, service_id, now, self.policy)
            .map(Into::into)
    }
}
