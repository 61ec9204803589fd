//! Markdown table structure detection.
//!
//! Scans the start of a document for a table header: a line containing at
//! least one pipe, immediately followed by a separator line made up of
//! pipes, hyphens, and whitespace. Detection runs once per document and
//! its result is reused for every chunk the table chunker produces.
//!
//! A table that starts beyond the scanned window is treated as
//! non-tabular and routed to the generic chunker. Pipe-bearing lines
//! whose next line fails separator syntax are ambiguous and also fall
//! through to the generic path.

use crate::models::TableHeader;

/// Number of leading lines inspected for a header + separator pair.
const DETECT_WINDOW_LINES: usize = 100;

/// Detect a markdown table at the start of `text`.
///
/// Returns the header and separator lines plus the byte offset where the
/// table body begins, or `None` when no table is found in the window.
pub fn detect_table(text: &str) -> Option<TableHeader> {
    let mut offset = 0usize;
    let mut prev: Option<&str> = None;

    for raw in text.split_inclusive('\n').take(DETECT_WINDOW_LINES + 1) {
        let line = raw.trim_end_matches(['\n', '\r']);
        let line_end = offset + raw.len();

        if let Some(header) = prev {
            if header.contains('|') && is_separator(line) {
                return Some(TableHeader {
                    header_line: header.to_string(),
                    separator_line: line.to_string(),
                    header_end_offset: line_end,
                });
            }
        }

        prev = Some(line);
        offset = line_end;
    }

    None
}

/// A separator row contains only pipes, hyphens, and whitespace, with at
/// least one hyphen. A bare `|` row or an empty line does not qualify.
fn is_separator(line: &str) -> bool {
    let trimmed = line.trim();
    !trimmed.is_empty()
        && trimmed.contains('-')
        && trimmed
            .chars()
            .all(|c| c == '|' || c == '-' || c.is_whitespace())
}
