use crate::ui::messages::success;
use rusqlite::{Connection, OptionalExtension, Result};

/// Ensure that the `log` table exists with the modern schema.
fn ensure_log_table(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS log (
            id        INTEGER PRIMARY KEY AUTOINCREMENT,
            date      TEXT NOT NULL,
            operation TEXT NOT NULL,
            target    TEXT DEFAULT '',
            message   TEXT NOT NULL
        );
        "#,
    )?;
    Ok(())
}

fn migration_applied(conn: &Connection, version: &str) -> Result<bool> {
    let mut chk = conn.prepare(
        "SELECT 1 FROM log
         WHERE operation = 'migration_applied' AND target = ?1
         LIMIT 1",
    )?;
    Ok(chk.query_row([version], |_| Ok(())).optional()?.is_some())
}

fn mark_applied(conn: &Connection, version: &str, message: &str) -> Result<()> {
    conn.execute(
        "INSERT INTO log (date, operation, target, message)
         VALUES (datetime('now'), 'migration_applied', ?1, ?2)",
        [version, message],
    )?;
    Ok(())
}

/// Members, services and attendance.
///
/// `services` encodes the template / instance / one-off split through CHECK
/// constraints, and both uniqueness rules of the domain live here:
/// one session per (template, date) and one attendance row per
/// (member, service).
fn create_core_tables(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS members (
            id          INTEGER PRIMARY KEY AUTOINCREMENT,
            code        TEXT NOT NULL UNIQUE,
            full_name   TEXT NOT NULL,
            email       TEXT,
            phone       TEXT,
            is_visitor  INTEGER NOT NULL DEFAULT 0,
            created_at  TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS services (
            id                  INTEGER PRIMARY KEY AUTOINCREMENT,
            name                TEXT NOT NULL,
            kind                TEXT NOT NULL CHECK(kind IN ('template','instance','oneoff')),
            date                TEXT,
            anchor_date         TEXT,
            start_time          TEXT NOT NULL,
            end_time            TEXT,
            location            TEXT,
            description         TEXT,
            recurrence_pattern  TEXT NOT NULL DEFAULT 'none'
                                CHECK(recurrence_pattern IN ('none','weekly','monthly')),
            parent_id           INTEGER REFERENCES services(id) ON DELETE CASCADE,
            created_at          TEXT NOT NULL,
            updated_at          TEXT NOT NULL,
            CHECK (
                (kind = 'template' AND date IS NULL AND parent_id IS NULL) OR
                (kind = 'instance' AND date IS NOT NULL AND parent_id IS NOT NULL) OR
                (kind = 'oneoff'   AND date IS NOT NULL AND parent_id IS NULL)
            ),
            UNIQUE (parent_id, date)
        );

        CREATE INDEX IF NOT EXISTS idx_services_date ON services(date);
        CREATE INDEX IF NOT EXISTS idx_services_parent ON services(parent_id);

        CREATE TABLE IF NOT EXISTS attendance (
            id              INTEGER PRIMARY KEY AUTOINCREMENT,
            member_id       INTEGER NOT NULL REFERENCES members(id) ON DELETE CASCADE,
            service_id      INTEGER NOT NULL REFERENCES services(id) ON DELETE CASCADE,
            status          TEXT NOT NULL CHECK(status IN ('present','late','absent')),
            check_in_time   TEXT,
            is_auto_marked  INTEGER NOT NULL DEFAULT 0,
            notes           TEXT,
            created_at      TEXT NOT NULL,
            UNIQUE (member_id, service_id)
        );

        CREATE INDEX IF NOT EXISTS idx_attendance_service ON attendance(service_id);
        "#,
    )?;
    Ok(())
}

/// Public entry point: run all pending migrations.
///
/// Invoked by db::initialize::init_db().
pub fn run_pending_migrations(conn: &Connection) -> Result<()> {
    ensure_log_table(conn)?;

    let version = "20240101_0001_core_schema";
    if !migration_applied(conn, version)? {
        create_core_tables(conn)?;
        mark_applied(conn, version, "Created members, services and attendance tables")?;
        success(format!("Migration applied: {}", version));
    } else {
        // idempotent, repairs a half-created schema
        create_core_tables(conn)?;
    }

    Ok(())
}
