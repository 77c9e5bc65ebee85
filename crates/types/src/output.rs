//! Normalized tabular output model.

use serde_json::Value;

/// Header used for single-row informational results.
pub const INFO_HEADER: &str = "Info";
/// Header used for single-row decode-failure results.
pub const ERROR_HEADER: &str = "Error";

/// The parsing engine's normalized result: a header, rows of cells, and
/// optionally the structured per-row payloads for tree inspection.
///
/// Invariant: every row has exactly `header.len()` cells. Producers that
/// cannot guarantee this emit a single informational row instead.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedOutput {
    /// Name of the command that produced this result.
    pub command: String,
    /// Ordered column names.
    pub header: Vec<String>,
    /// Ordered rows; each cell is display text.
    pub rows: Vec<Vec<String>>,
    /// Structured per-row payloads, present for commands with a JSON viewer.
    pub raw_items: Option<Vec<Value>>,
    /// Item count reported by the external service, when present.
    pub count: Option<u64>,
    /// Opaque cursor for the next page; empty = no further pages.
    pub next_token: String,
}

impl ParsedOutput {
    /// A single-row informational result, used for empty or absent data.
    pub fn info(command: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            header: vec![INFO_HEADER.to_string()],
            rows: vec![vec![message.into()]],
            ..Default::default()
        }
    }

    /// A single-row error result, used when structural decoding fails.
    pub fn decode_failure(command: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            header: vec![ERROR_HEADER.to_string()],
            rows: vec![vec![message.into()]],
            ..Default::default()
        }
    }

    /// Appends a row, truncating or padding it to the header width so the
    /// row/header invariant holds.
    pub fn push_row(&mut self, mut cells: Vec<String>) {
        cells.truncate(self.header.len());
        while cells.len() < self.header.len() {
            cells.push(String::new());
        }
        self.rows.push(cells);
    }

    /// The primary cell of the selected row, used as the selection value.
    pub fn primary_cell(&self, row: usize) -> Option<&str> {
        self.rows.get(row).and_then(|r| r.first()).map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_row_pads_and_truncates_to_header_width() {
        let mut out = ParsedOutput {
            command: "list".into(),
            header: vec!["A".into(), "B".into()],
            ..Default::default()
        };
        out.push_row(vec!["only".into()]);
        out.push_row(vec!["x".into(), "y".into(), "z".into()]);
        assert_eq!(out.rows[0], vec!["only".to_string(), String::new()]);
        assert_eq!(out.rows[1], vec!["x".to_string(), "y".to_string()]);
    }

    #[test]
    fn info_result_is_single_row() {
        let out = ParsedOutput::info("scan", "no items");
        assert_eq!(out.header, vec![INFO_HEADER.to_string()]);
        assert_eq!(out.rows, vec![vec!["no items".to_string()]]);
    }
}
