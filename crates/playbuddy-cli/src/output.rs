//! Rendering command results as aligned tables or JSON.

use anyhow::{anyhow, bail, Result};
use playbuddy_core::cache::CachedData;
use playbuddy_core::QueryState;
use serde::Serialize;

/// Widest a single table cell may get before it is truncated
pub const MAX_CELL_WIDTH: usize = 48;

/// Column separator
const GAP: &str = "  ";

pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// The data behind a query, or an error explaining why there is none.
///
/// Offline copies and stale data kept after a failed refresh are returned
/// with a note on stderr.
pub fn require_data<T>(what: &str, state: QueryState<T>) -> Result<T> {
    if state.from_offline {
        let age = state
            .updated_at
            .map(|at| CachedData { data: (), cached_at: at }.age_display())
            .unwrap_or_else(|| "unknown age".to_string());
        eprintln!("Offline: showing {} saved {}", what, age);
    }
    match (state.data, state.error) {
        (Some(data), None) => Ok(data),
        (Some(data), Some(error)) => {
            eprintln!("Could not refresh {}: {}", what, error);
            Ok(data)
        }
        (None, Some(error)) => Err(anyhow!("Failed to fetch {}: {}", what, error)),
        (None, None) => bail!("{} requires a login; run `playbuddy login` first", what),
    }
}

/// A plain text table with left-aligned columns.
#[derive(Debug, Default)]
pub struct Table {
    headers: Vec<&'static str>,
    rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new(headers: &[&'static str]) -> Self {
        Self {
            headers: headers.to_vec(),
            rows: Vec::new(),
        }
    }

    pub fn row<I, S>(&mut self, cells: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let cells = cells
            .into_iter()
            .map(|c| playbuddy_core::utils::truncate(&c.into(), MAX_CELL_WIDTH))
            .collect();
        self.rows.push(cells);
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn render(&self) -> String {
        let columns = self.headers.len();
        let mut widths: Vec<usize> = self.headers.iter().map(|h| h.chars().count()).collect();
        for row in &self.rows {
            for (i, cell) in row.iter().take(columns).enumerate() {
                widths[i] = widths[i].max(cell.chars().count());
            }
        }

        let mut out = String::new();
        let header: Vec<String> = self.headers.iter().map(|h| h.to_string()).collect();
        push_line(&mut out, &header, &widths);
        for row in &self.rows {
            push_line(&mut out, row, &widths);
        }
        out
    }

    pub fn print(&self) {
        if self.is_empty() {
            println!("(none)");
        } else {
            print!("{}", self.render());
        }
    }
}

fn push_line(out: &mut String, cells: &[String], widths: &[usize]) {
    let mut line = String::new();
    for (i, width) in widths.iter().enumerate() {
        let cell = cells.get(i).map(String::as_str).unwrap_or("");
        if i > 0 {
            line.push_str(GAP);
        }
        line.push_str(cell);
        let pad = width.saturating_sub(cell.chars().count());
        line.extend(std::iter::repeat(' ').take(pad));
    }
    out.push_str(line.trim_end());
    out.push('\n');
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use playbuddy_core::{ApiError, QueryStatus};

    use super::*;

    #[test]
    fn test_table_alignment() {
        let mut table = Table::new(&["ID", "NAME"]);
        table.row(["1", "Rope Jam"]);
        table.row(["1234", "Munch"]);
        assert_eq!(table.render(), "ID    NAME\n1     Rope Jam\n1234  Munch\n");
    }

    #[test]
    fn test_table_truncates_long_cells() {
        let mut table = Table::new(&["NAME"]);
        table.row(["x".repeat(100)]);
        let rendered = table.render();
        let line = rendered.lines().nth(1).unwrap();
        assert_eq!(line.chars().count(), MAX_CELL_WIDTH);
        assert!(line.ends_with("..."));
    }

    #[test]
    fn test_table_short_rows_are_padded() {
        let mut table = Table::new(&["A", "B", "C"]);
        table.row(["only"]);
        assert_eq!(table.render(), "A     B  C\nonly\n");
    }

    #[test]
    fn test_require_data_success() {
        let state = QueryState {
            data: Some(vec![1, 2]),
            status: QueryStatus::Success,
            ..QueryState::default()
        };
        assert_eq!(require_data("events", state).unwrap(), vec![1, 2]);
    }

    #[test]
    fn test_require_data_keeps_stale_data_on_error() {
        let state = QueryState {
            data: Some(7),
            error: Some(Arc::new(ApiError::NotFound("kinks".into()))),
            status: QueryStatus::Error,
            ..QueryState::default()
        };
        assert_eq!(require_data("kinks", state).unwrap(), 7);
    }

    #[test]
    fn test_require_data_errors() {
        let failed: QueryState<i32> = QueryState {
            error: Some(Arc::new(ApiError::NotFound("kinks".into()))),
            status: QueryStatus::Error,
            ..QueryState::default()
        };
        let message = require_data("kinks", failed).unwrap_err().to_string();
        assert!(message.starts_with("Failed to fetch kinks"));

        let idle: QueryState<i32> = QueryState::default();
        let message = require_data("festival schedule", idle).unwrap_err().to_string();
        assert!(message.contains("playbuddy login"));
    }
}
