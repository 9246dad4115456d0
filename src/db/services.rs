use crate::db::db_utils::{
    fmt_date, fmt_time, invalid_col, opt_date_col, opt_time_col, time_col,
};
use crate::errors::{AppError, AppResult};
use crate::models::recurrence::RecurrencePattern;
use crate::models::service::{NewService, Service, ServiceChanges, ServiceKind};
use chrono::{Local, NaiveDate};
use rusqlite::{Connection, OptionalExtension, Row, params};

const SELECT_SERVICE: &str = "SELECT id, name, kind, date, anchor_date, start_time, end_time,
        location, description, recurrence_pattern, parent_id, created_at
     FROM services";

pub fn map_service(row: &Row) -> rusqlite::Result<Service> {
    let kind_str: String = row.get("kind")?;
    let pattern_str: String = row.get("recurrence_pattern")?;
    let pattern = RecurrencePattern::from_db_str(&pattern_str)
        .ok_or_else(|| invalid_col(9, "recurrence pattern", &pattern_str))?;
    let date = opt_date_col(3, row.get("date")?)?;

    let kind = match (kind_str.as_str(), date) {
        ("template", None) => ServiceKind::Template {
            pattern,
            anchor: opt_date_col(4, row.get("anchor_date")?)?,
        },
        ("instance", Some(date)) => {
            let parent: Option<i64> = row.get("parent_id")?;
            let parent = parent.ok_or_else(|| invalid_col(10, "instance without parent", ""))?;
            ServiceKind::Instance { parent, date }
        }
        ("oneoff", Some(date)) => ServiceKind::OneOff { date },
        _ => return Err(invalid_col(2, "service kind", &kind_str)),
    };

    let start: String = row.get("start_time")?;

    Ok(Service {
        id: row.get("id")?,
        name: row.get("name")?,
        start_time: time_col(5, &start)?,
        end_time: opt_time_col(6, row.get("end_time")?)?,
        location: row.get("location")?,
        description: row.get("description")?,
        kind,
        created_at: row.get("created_at")?,
    })
}

/// Insert a service row and return its id.
pub fn insert_service(conn: &Connection, svc: &NewService) -> AppResult<i64> {
    let now = Local::now().to_rfc3339();

    let (date, anchor, pattern, parent) = match &svc.kind {
        ServiceKind::Template { pattern, anchor } => {
            (None, anchor.as_ref().map(fmt_date), *pattern, None)
        }
        ServiceKind::Instance { parent, date } => {
            (Some(fmt_date(date)), None, RecurrencePattern::None, Some(*parent))
        }
        ServiceKind::OneOff { date } => (Some(fmt_date(date)), None, RecurrencePattern::None, None),
    };

    conn.execute(
        "INSERT INTO services
            (name, kind, date, anchor_date, start_time, end_time, location, description,
             recurrence_pattern, parent_id, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?11)",
        params![
            svc.name,
            svc.kind.to_db_str(),
            date,
            anchor,
            fmt_time(&svc.start_time),
            svc.end_time.as_ref().map(fmt_time),
            svc.location,
            svc.description,
            pattern.to_db_str(),
            parent,
            now,
        ],
    )?;

    Ok(conn.last_insert_rowid())
}

pub fn load_service(conn: &Connection, id: i64) -> AppResult<Option<Service>> {
    let sql = format!("{SELECT_SERVICE} WHERE id = ?1");
    let svc = conn.query_row(&sql, [id], map_service).optional()?;
    Ok(svc)
}

/// Like `load_service`, but a missing row is an error.
pub fn get_service(conn: &Connection, id: i64) -> AppResult<Service> {
    load_service(conn, id)?.ok_or(AppError::ServiceNotFound(id))
}

/// All services, newest sessions first; templates (no date) come last.
pub fn list_services(conn: &Connection) -> AppResult<Vec<Service>> {
    let sql = format!(
        "{SELECT_SERVICE} ORDER BY date IS NULL, date DESC, start_time DESC, id ASC"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map([], map_service)?;

    let mut out = Vec::new();
    for r in rows {
        out.push(r?);
    }
    Ok(out)
}

/// Sessions spawned from `template_id`, in date order.
pub fn list_instances(conn: &Connection, template_id: i64) -> AppResult<Vec<Service>> {
    let sql = format!("{SELECT_SERVICE} WHERE parent_id = ?1 ORDER BY date ASC");
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map([template_id], map_service)?;

    let mut out = Vec::new();
    for r in rows {
        out.push(r?);
    }
    Ok(out)
}

pub fn find_instance(
    conn: &Connection,
    template_id: i64,
    date: &NaiveDate,
) -> AppResult<Option<Service>> {
    let sql = format!("{SELECT_SERVICE} WHERE parent_id = ?1 AND date = ?2");
    let svc = conn
        .query_row(&sql, params![template_id, fmt_date(date)], map_service)
        .optional()?;
    Ok(svc)
}

/// Apply `changes` to the rows selected by `filter` (`id = ?1` or `parent_id = ?1`).
fn apply_changes(
    conn: &Connection,
    filter: &str,
    key: i64,
    changes: &ServiceChanges,
) -> AppResult<usize> {
    let now = Local::now().to_rfc3339();
    let sql = format!(
        "UPDATE services SET
            name        = COALESCE(?2, name),
            start_time  = COALESCE(?3, start_time),
            end_time    = COALESCE(?4, end_time),
            location    = COALESCE(?5, location),
            description = COALESCE(?6, description),
            updated_at  = ?7
         WHERE {filter}"
    );

    let n = conn.execute(
        &sql,
        params![
            key,
            changes.name,
            changes.start_time.as_ref().map(fmt_time),
            changes.end_time.as_ref().map(fmt_time),
            changes.location,
            changes.description,
            now,
        ],
    )?;
    Ok(n)
}

pub fn update_service(conn: &Connection, id: i64, changes: &ServiceChanges) -> AppResult<usize> {
    apply_changes(conn, "id = ?1", id, changes)
}

/// Push the same changes down to every session of a template.
pub fn update_instances_of(
    conn: &Connection,
    template_id: i64,
    changes: &ServiceChanges,
) -> AppResult<usize> {
    apply_changes(conn, "parent_id = ?1", template_id, changes)
}

/// Delete a service. Sessions and attendance go with it (ON DELETE CASCADE).
pub fn delete_service(conn: &Connection, id: i64) -> AppResult<usize> {
    let n = conn.execute("DELETE FROM services WHERE id = ?1", [id])?;
    Ok(n)
}
