use crate::db::pool::DbPool;
use crate::errors::{AppError, AppResult};
use ansi_term::Colour;
use regex::Regex;

const OP_WIDTH: usize = 60;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    pub id: i64,
    pub date: String,
    pub operation: String,
    pub target: String,
    pub message: String,
}

fn color_for_operation(op: &str) -> Colour {
    match op {
        "checkin" => Colour::Green,
        "close" => Colour::Red,
        "service_add" | "generate" | "add_instance" => Colour::Cyan,
        "service_edit" => Colour::Yellow,
        "service_del" => Colour::Red,
        "member_add" => Colour::Blue,
        "migration_applied" => Colour::Purple,
        "backup" | "export" => Colour::Blue,
        "init" => Colour::RGB(255, 153, 51),
        _ => Colour::White,
    }
}

/// "op (target)" with only the operation coloured, cut to `OP_WIDTH`
/// visible characters and padded on the visible width.
fn render_op(ansi: &Regex, op: &str, target: &str) -> String {
    let color = color_for_operation(op);
    let plain = if target.is_empty() {
        op.to_string()
    } else {
        format!("{op} ({target})")
    };

    let visible = if plain.chars().count() > OP_WIDTH {
        let mut s: String = plain.chars().take(OP_WIDTH - 3).collect();
        s.push_str("...");
        s
    } else {
        plain
    };

    let colored = match visible.split_once(' ') {
        Some((word, rest)) => format!("{} {}", color.paint(word), rest),
        None => color.paint(visible.as_str()).to_string(),
    };

    let shown = ansi.replace_all(&colored, "").chars().count();
    format!("{colored}{}", " ".repeat(OP_WIDTH.saturating_sub(shown)))
}

pub struct LogLogic;

impl LogLogic {
    pub fn load(pool: &DbPool) -> AppResult<Vec<LogEntry>> {
        let mut stmt = pool.conn.prepare_cached(
            "SELECT id, date, operation, target, message FROM log ORDER BY id ASC",
        )?;

        let rows = stmt.query_map([], |row| {
            let raw_date: String = row.get(1)?;
            let date = chrono::DateTime::parse_from_rfc3339(&raw_date)
                .map(|dt| dt.format("%FT%T%:z").to_string())
                .unwrap_or(raw_date);

            Ok(LogEntry {
                id: row.get(0)?,
                date,
                operation: row.get(2)?,
                target: row.get(3)?,
                message: row.get(4)?,
            })
        })?;

        let mut entries = Vec::new();
        for r in rows {
            entries.push(r?);
        }
        Ok(entries)
    }

    pub fn print_log(pool: &DbPool) -> AppResult<()> {
        let entries = Self::load(pool)?;
        if entries.is_empty() {
            println!("📜 Internal log is empty.");
            return Ok(());
        }

        let ansi =
            Regex::new(r"\x1B\[[0-9;]*[mK]").map_err(|e| AppError::Other(e.to_string()))?;

        let id_w = entries.iter().map(|e| e.id.to_string().len()).max().unwrap_or(1);
        let date_w = entries.iter().map(|e| e.date.len()).max().unwrap_or(10);

        println!("📜 Internal log:\n");

        for e in &entries {
            println!(
                "{:>id_w$}: {:<date_w$} | {} => {}",
                e.id,
                e.date,
                render_op(&ansi, &e.operation, &e.target),
                e.message,
                id_w = id_w,
                date_w = date_w
            );
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::initialize::init_db;
    use crate::db::log::audit;

    #[test]
    fn entries_come_back_in_insertion_order() {
        let pool = DbPool::in_memory().unwrap();
        init_db(&pool.conn).unwrap();
        audit(&pool.conn, "checkin", "M001", "Grace present").unwrap();
        audit(&pool.conn, "close", "Sunday Service", "Marked 2 member(s) absent").unwrap();

        let entries = LogLogic::load(&pool).unwrap();
        let ops: Vec<_> = entries.iter().map(|e| e.operation.as_str()).collect();
        // the schema migration logs itself first
        assert_eq!(ops.last(), Some(&"close"));
        assert!(ops.contains(&"checkin"));
    }

    #[test]
    fn rendered_op_pads_on_visible_width() {
        let ansi = Regex::new(r"\x1B\[[0-9;]*[mK]").unwrap();
        let out = render_op(&ansi, "checkin", "M001");
        let plain = ansi.replace_all(&out, "");
        assert!(plain.starts_with("checkin (M001)"));
        assert_eq!(plain.chars().count(), OP_WIDTH);

        let long = render_op(&ansi, "service_add", &"x".repeat(80));
        assert!(ansi.replace_all(&long, "").ends_with("..."));
    }
}
