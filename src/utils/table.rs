//! Table rendering utilities for CLI outputs.

use crate::utils::colors::RESET;

pub struct Column {
    pub header: String,
    pub width: usize,
}

impl Column {
    pub fn new(header: &str) -> Self {
        Self {
            header: header.to_string(),
            width: header.chars().count(),
        }
    }
}

/// A cell is its text plus an optional ANSI colour applied after padding,
/// so escapes never count toward the width.
type Cell = (String, Option<&'static str>);

pub struct Table {
    pub columns: Vec<Column>,
    rows: Vec<Vec<Cell>>,
}

impl Table {
    pub fn new(headers: &[&str]) -> Self {
        Self {
            columns: headers.iter().map(|h| Column::new(h)).collect(),
            rows: Vec::new(),
        }
    }

    pub fn add_row(&mut self, row: Vec<String>) {
        self.add_colored_row(row.into_iter().map(|s| (s, None)).collect());
    }

    pub fn add_colored_row(&mut self, row: Vec<Cell>) {
        for (col, (text, _)) in self.columns.iter_mut().zip(&row) {
            col.width = col.width.max(text.chars().count());
        }
        self.rows.push(row);
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn render(&self) -> String {
        let mut out = String::new();

        for col in &self.columns {
            out.push_str(&format!("{:<width$}  ", col.header, width = col.width));
        }
        out = out.trim_end().to_string();
        out.push('\n');

        let total: usize = self.columns.iter().map(|c| c.width + 2).sum();
        out.push_str(&"-".repeat(total.saturating_sub(2)));
        out.push('\n');

        for row in &self.rows {
            let mut line = String::new();
            for (i, col) in self.columns.iter().enumerate() {
                let (text, color) = row
                    .get(i)
                    .map(|(t, c)| (t.as_str(), *c))
                    .unwrap_or(("", None));
                let padded = format!("{:<width$}", text, width = col.width);
                match color {
                    Some(c) => line.push_str(&format!("{c}{padded}{RESET}  ")),
                    None => line.push_str(&format!("{padded}  ")),
                }
            }
            out.push_str(line.trim_end());
            out.push('\n');
        }

        out
    }
}
