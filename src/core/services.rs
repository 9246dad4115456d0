use crate::db::log::audit;
use crate::db::pool::DbPool;
use crate::db::services::{
    delete_service, get_service, insert_service, list_instances, list_services,
    update_instances_of, update_service,
};
use crate::errors::{AppError, AppResult};
use crate::models::service::{NewService, Service, ServiceChanges};
use chrono::NaiveTime;

/// A service must end after it starts. Open-ended services always pass.
pub fn ensure_time_range(start: NaiveTime, end: Option<NaiveTime>) -> AppResult<()> {
    match end {
        Some(end) if end <= start => Err(AppError::InvalidTime(
            "End time must be later than start time.".into(),
        )),
        _ => Ok(()),
    }
}

/// Times `svc` would have once `changes` are applied.
fn merged_times(svc: &Service, changes: &ServiceChanges) -> (NaiveTime, Option<NaiveTime>) {
    (
        changes.start_time.unwrap_or(svc.start_time),
        changes.end_time.or(svc.end_time),
    )
}

/// Create / update / delete for services. Everything except the recurrence
/// expansion itself, which lives in `core::generator`.
pub struct ServiceLogic;

impl ServiceLogic {
    pub fn fetch_all(pool: &DbPool) -> AppResult<Vec<Service>> {
        list_services(&pool.conn)
    }

    pub fn create(pool: &mut DbPool, new: &NewService) -> AppResult<Service> {
        ensure_time_range(new.start_time, new.end_time)?;

        let id = insert_service(&pool.conn, new)?;
        audit(
            &pool.conn,
            "service_add",
            &new.name,
            &format!("Created {} service #{}", new.kind.to_db_str(), id),
        )?;
        get_service(&pool.conn, id)
    }

    /// Update a service. Changes to a template are pushed to all of its
    /// sessions as well; returns how many sessions were touched.
    pub fn update(pool: &mut DbPool, id: i64, changes: &ServiceChanges) -> AppResult<usize> {
        if changes.is_empty() {
            return Err(AppError::InvalidValue(
                "Nothing to do: specify at least one field to change.".into(),
            ));
        }

        let svc = get_service(&pool.conn, id)?;
        let (start, end) = merged_times(&svc, changes);
        ensure_time_range(start, end)?;

        // sessions may carry their own times, each must stay valid
        if svc.is_template() {
            for session in list_instances(&pool.conn, id)? {
                let (start, end) = merged_times(&session, changes);
                ensure_time_range(start, end).map_err(|_| {
                    AppError::InvalidTime(format!(
                        "End time must be later than start time (session on {}).",
                        session.date_str()
                    ))
                })?;
            }
        }

        let tx = pool.conn.transaction()?;

        update_service(&tx, id, changes)?;
        let propagated = if svc.is_template() {
            update_instances_of(&tx, id, changes)?
        } else {
            0
        };

        audit(
            &tx,
            "service_edit",
            &svc.name,
            &format!("Service #{} updated, {} session(s) followed", id, propagated),
        )?;
        tx.commit()?;

        Ok(propagated)
    }

    pub fn delete(pool: &mut DbPool, id: i64) -> AppResult<()> {
        let svc = get_service(&pool.conn, id)?;
        delete_service(&pool.conn, id)?;
        audit(
            &pool.conn,
            "service_del",
            &svc.name,
            &format!("Service #{} deleted", id),
        )?;
        Ok(())
    }
}
