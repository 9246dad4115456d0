use crate::errors::AppResult;
use crate::models::member::Member;
use chrono::Local;
use rusqlite::{Connection, OptionalExtension, Row, params};

const SELECT_MEMBER: &str =
    "SELECT id, code, full_name, email, phone, is_visitor, created_at FROM members";

pub fn map_member(row: &Row) -> rusqlite::Result<Member> {
    Ok(Member {
        id: row.get("id")?,
        code: row.get("code")?,
        full_name: row.get("full_name")?,
        email: row.get("email")?,
        phone: row.get("phone")?,
        is_visitor: row.get("is_visitor")?,
        created_at: row.get("created_at")?,
    })
}

pub fn insert_member(
    conn: &Connection,
    code: &str,
    full_name: &str,
    email: Option<&str>,
    phone: Option<&str>,
    is_visitor: bool,
) -> AppResult<i64> {
    conn.execute(
        "INSERT INTO members (code, full_name, email, phone, is_visitor, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            code,
            full_name,
            email,
            phone,
            is_visitor,
            Local::now().to_rfc3339()
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Resolve the identifier printed in a member's QR badge.
pub fn find_by_code(conn: &Connection, code: &str) -> AppResult<Option<Member>> {
    let sql = format!("{SELECT_MEMBER} WHERE code = ?1");
    let m = conn.query_row(&sql, [code], map_member).optional()?;
    Ok(m)
}

pub fn list_members(conn: &Connection) -> AppResult<Vec<Member>> {
    let sql = format!("{SELECT_MEMBER} ORDER BY full_name ASC");
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map([], map_member)?;

    let mut out = Vec::new();
    for r in rows {
        out.push(r?);
    }
    Ok(out)
}

/// Members expected at every service: everyone except visitors.
pub fn list_regular_members(conn: &Connection) -> AppResult<Vec<Member>> {
    let sql = format!("{SELECT_MEMBER} WHERE is_visitor = 0 ORDER BY id ASC");
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map([], map_member)?;

    let mut out = Vec::new();
    for r in rows {
        out.push(r?);
    }
    Ok(out)
}
