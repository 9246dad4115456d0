use crate::db::db_utils::{fmt_datetime, invalid_col, opt_datetime_col};
use crate::errors::AppResult;
use crate::models::attendance::{Attendance, AttendanceStatus};
use chrono::{Local, NaiveDateTime};
use rusqlite::{Connection, OptionalExtension, Row, params};

const SELECT_ATTENDANCE: &str = "SELECT a.id, a.member_id, m.code AS member_code,
        m.full_name AS member_name, a.service_id, a.status, a.check_in_time,
        a.is_auto_marked, a.notes, a.created_at
     FROM attendance a
     JOIN members m ON m.id = a.member_id";

pub fn map_attendance(row: &Row) -> rusqlite::Result<Attendance> {
    let status_str: String = row.get("status")?;
    let status = AttendanceStatus::from_db_str(&status_str)
        .ok_or_else(|| invalid_col(5, "attendance status", &status_str))?;

    Ok(Attendance {
        id: row.get("id")?,
        member_id: row.get("member_id")?,
        member_code: row.get("member_code")?,
        member_name: row.get("member_name")?,
        service_id: row.get("service_id")?,
        status,
        check_in_time: opt_datetime_col(6, row.get("check_in_time")?)?,
        is_auto_marked: row.get("is_auto_marked")?,
        notes: row.get("notes")?,
        created_at: row.get("created_at")?,
    })
}

/// Insert unless the (member, service) pair already has a row.
///
/// Returns the new row id, or `None` when the UNIQUE(member_id, service_id)
/// constraint turned the insert into a no-op. This is the only write path
/// for attendance, so concurrent clients cannot produce a second row.
pub fn insert_if_absent(
    conn: &Connection,
    member_id: i64,
    service_id: i64,
    status: AttendanceStatus,
    check_in_time: Option<NaiveDateTime>,
    is_auto_marked: bool,
) -> AppResult<Option<i64>> {
    let n = conn.execute(
        "INSERT INTO attendance
            (member_id, service_id, status, check_in_time, is_auto_marked, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)
         ON CONFLICT(member_id, service_id) DO NOTHING",
        params![
            member_id,
            service_id,
            status.to_db_str(),
            check_in_time.as_ref().map(fmt_datetime),
            is_auto_marked,
            Local::now().to_rfc3339(),
        ],
    )?;

    if n == 0 {
        Ok(None)
    } else {
        Ok(Some(conn.last_insert_rowid()))
    }
}

pub fn get_attendance(conn: &Connection, id: i64) -> AppResult<Option<Attendance>> {
    let sql = format!("{SELECT_ATTENDANCE} WHERE a.id = ?1");
    let a = conn.query_row(&sql, [id], map_attendance).optional()?;
    Ok(a)
}

pub fn find_attendance(
    conn: &Connection,
    member_id: i64,
    service_id: i64,
) -> AppResult<Option<Attendance>> {
    let sql = format!("{SELECT_ATTENDANCE} WHERE a.member_id = ?1 AND a.service_id = ?2");
    let a = conn
        .query_row(&sql, params![member_id, service_id], map_attendance)
        .optional()?;
    Ok(a)
}

/// Rows for one service, earliest check-ins first, absences last.
pub fn list_by_service(conn: &Connection, service_id: i64) -> AppResult<Vec<Attendance>> {
    let sql = format!(
        "{SELECT_ATTENDANCE} WHERE a.service_id = ?1
         ORDER BY a.check_in_time IS NULL, a.check_in_time ASC, m.full_name ASC"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map([service_id], map_attendance)?;

    let mut out = Vec::new();
    for r in rows {
        out.push(r?);
    }
    Ok(out)
}
