use crate::db::pool::DbPool;
use crate::utils::colors::{CYAN, GREEN, GREY, RESET, YELLOW};
use rusqlite::OptionalExtension;
use std::fs;

fn count(pool: &DbPool, sql: &str) -> rusqlite::Result<i64> {
    pool.conn.query_row(sql, [], |row| row.get(0))
}

pub fn print_db_info(pool: &DbPool, db_path: &str) -> rusqlite::Result<()> {
    println!();

    //
    // 1) FILE SIZE
    //
    let file_size = fs::metadata(db_path).map(|m| m.len()).unwrap_or(0);
    let file_mb = (file_size as f64) / (1024.0 * 1024.0);

    println!("{}• File:{} {}{}{}", CYAN, RESET, YELLOW, db_path, RESET);
    println!("{}• Size:{} {:.2} MB", CYAN, RESET, file_mb);

    //
    // 2) ROW COUNTS
    //
    let members = count(pool, "SELECT COUNT(*) FROM members")?;
    let templates = count(pool, "SELECT COUNT(*) FROM services WHERE kind = 'template'")?;
    let sessions = count(pool, "SELECT COUNT(*) FROM services WHERE kind != 'template'")?;
    let rows = count(pool, "SELECT COUNT(*) FROM attendance")?;

    println!("{}• Members:{} {}{}{}", CYAN, RESET, GREEN, members, RESET);
    println!("{}• Templates:{} {}{}{}", CYAN, RESET, GREEN, templates, RESET);
    println!("{}• Sessions:{} {}{}{}", CYAN, RESET, GREEN, sessions, RESET);
    println!("{}• Attendance rows:{} {}{}{}", CYAN, RESET, GREEN, rows, RESET);

    //
    // 3) SESSION DATE RANGE
    //
    let first_date: Option<String> = pool
        .conn
        .query_row(
            "SELECT MIN(date) FROM services WHERE date IS NOT NULL",
            [],
            |row| row.get(0),
        )
        .optional()?
        .flatten();

    let last_date: Option<String> = pool
        .conn
        .query_row(
            "SELECT MAX(date) FROM services WHERE date IS NOT NULL",
            [],
            |row| row.get(0),
        )
        .optional()?
        .flatten();

    let fmt_first = first_date.unwrap_or_else(|| format!("{GREY}--{RESET}"));
    let fmt_last = last_date.unwrap_or_else(|| format!("{GREY}--{RESET}"));

    println!("{}• Session range:{}", CYAN, RESET);
    println!("    from: {}", fmt_first);
    println!("    to:   {}", fmt_last);

    //
    // 4) AVERAGE TURNOUT
    //
    if sessions > 0 {
        let attended = count(pool, "SELECT COUNT(*) FROM attendance WHERE status != 'absent'")?;
        let avg = attended as f64 / sessions as f64;
        println!("{}• Average turnout/session:{} {:.2}", CYAN, RESET, avg);
    }

    println!();
    Ok(())
}
