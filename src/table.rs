//! Size-bounded markdown table chunker.
//!
//! Splits a detected table's body rows into chunks of at most
//! `target_size` characters. Every chunk begins with the table's header
//! and separator lines so each one stays independently interpretable for
//! embedding and retrieval, and consecutive chunks share a fixed
//! row-count overlap to preserve continuity across split boundaries.
//!
//! A single row that exceeds the budget on its own (header included) is
//! still emitted as one oversized chunk rather than truncated or dropped.

use crate::config::ChunkingConfig;
use crate::models::TableHeader;

/// Split the table body of `text` into chunk texts.
///
/// Rows are consumed one at a time; when appending the next row would
/// push the chunk past `cfg.target_size`, the chunk closes and a new one
/// opens with the header + separator followed by the last
/// `cfg.overlap_rows` rows of the closed chunk. The final partial chunk
/// is emitted even when under-sized, and a chunk always consumes at
/// least one unseen row, so oversized rows cannot stall the loop.
pub fn chunk_table(text: &str, header: &TableHeader, cfg: &ChunkingConfig) -> Vec<String> {
    let prefix_len = header.header_line.len() + header.separator_line.len() + 1;
    let body = &text[header.header_end_offset..];
    let rows: Vec<&str> = body.lines().collect();

    let mut chunks: Vec<String> = Vec::new();
    // Rows accumulated for the open chunk, overlap carryover included.
    let mut current: Vec<&str> = Vec::new();
    let mut current_len = prefix_len;
    // Unseen rows consumed by the open chunk (excludes carried overlap).
    let mut fresh = 0usize;

    for row in rows {
        let added = row.len() + 1;
        if fresh > 0 && current_len + added > cfg.target_size {
            chunks.push(render(header, &current));
            let (carry, carry_len) = overlap_tail(&current, cfg, prefix_len + added);
            current = carry;
            current_len = prefix_len + carry_len;
            fresh = 0;
        }
        current.push(row);
        current_len += added;
        fresh += 1;
    }

    if fresh > 0 || chunks.is_empty() {
        chunks.push(render(header, &current));
    }

    chunks
}

/// Select the rows carried into the next chunk: up to `overlap_rows`
/// rows from the tail of the closed chunk. `reserved` is the space the
/// header, separator, and the pending unseen row already claim, so the
/// overlap is accounted against the size budget before new rows are
/// added and an oversized row is never re-carried.
fn overlap_tail<'a>(
    rows: &[&'a str],
    cfg: &ChunkingConfig,
    reserved: usize,
) -> (Vec<&'a str>, usize) {
    let mut carry: Vec<&'a str> = Vec::new();
    let mut carry_len = 0usize;
    for row in rows.iter().rev().take(cfg.overlap_rows) {
        let added = row.len() + 1;
        if reserved + carry_len + added > cfg.target_size {
            break;
        }
        carry.push(*row);
        carry_len += added;
    }
    carry.reverse();
    (carry, carry_len)
}

/// Assemble one chunk: header, separator, then the given rows, joined by
/// single newlines with no trailing newline.
fn render(header: &TableHeader, rows: &[&str]) -> String {
    let mut text = String::with_capacity(
        header.header_line.len()
            + header.separator_line.len()
            + 1
            + rows.iter().map(|r| r.len() + 1).sum::<usize>(),
    );
    text.push_str(&header.header_line);
    text.push('\n');
    text.push_str(&header.separator_line);
    for row in rows {
        text.push('\n');
        text.push_str(row);
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detect::detect_table;

    fn cfg(target_size: usize, overlap_rows: usize) -> ChunkingConfig {
        ChunkingConfig {
            target_size,
            overlap_rows,
        }
    }

    fn table_doc(rows: usize) -> String {
        let mut text = String::from("| id | pattern | notes |\n|----|---------|-------|");
        for i in 0..rows {
            text.push_str(&format!("\n| {} | pattern-{} | row number {} |", i, i, i));
        }
        text
    }

    fn header_of(text: &str) -> TableHeader {
        detect_table(text).expect("test doc must contain a table")
    }

    #[test]
    fn test_small_table_single_chunk() {
        let text = table_doc(3);
        let chunks = chunk_table(&text, &header_of(&text), &cfg(2000, 5));
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0], text);
    }

    #[test]
    fn test_every_chunk_starts_with_header() {
        let text = table_doc(167);
        let header = header_of(&text);
        let chunks = chunk_table(&text, &header, &cfg(400, 5));
        assert!(chunks.len() > 1);
        let lead = format!("{}\n{}\n", header.header_line, header.separator_line);
        for chunk in &chunks {
            assert!(chunk.starts_with(&lead), "chunk missing header: {}", chunk);
        }
    }

    #[test]
    fn test_size_bound_holds_for_normal_rows() {
        let text = table_doc(167);
        let chunks = chunk_table(&text, &header_of(&text), &cfg(400, 5));
        for chunk in &chunks {
            assert!(chunk.len() <= 400, "chunk over budget: {} chars", chunk.len());
        }
    }

    #[test]
    fn test_overlap_rows_repeat_across_boundary() {
        let text = table_doc(60);
        let chunks = chunk_table(&text, &header_of(&text), &cfg(400, 5));
        assert!(chunks.len() > 1);
        for pair in chunks.windows(2) {
            let prev_rows: Vec<&str> = pair[0].lines().skip(2).collect();
            let next_rows: Vec<&str> = pair[1].lines().skip(2).collect();
            let tail = &prev_rows[prev_rows.len() - 5..];
            assert_eq!(&next_rows[..5], tail);
        }
    }

    #[test]
    fn test_all_rows_survive_in_order() {
        let text = table_doc(167);
        let chunks = chunk_table(&text, &header_of(&text), &cfg(500, 5));
        // Walk chunks dropping the 5-row overlap after the first.
        let mut seen: Vec<String> = Vec::new();
        for (i, chunk) in chunks.iter().enumerate() {
            let skip = if i == 0 { 0 } else { 5 };
            for row in chunk.lines().skip(2 + skip) {
                seen.push(row.to_string());
            }
        }
        let original: Vec<&str> = text.lines().skip(2).collect();
        assert_eq!(seen, original);
    }

    #[test]
    fn test_oversized_row_emitted_whole() {
        let long_cell = "x".repeat(5000);
        let text = format!(
            "| id | blob |\n|----|------|\n| 1 | {} |\n| 2 | small |",
            long_cell
        );
        let chunks = chunk_table(&text, &header_of(&text), &cfg(2000, 5));
        let oversized: Vec<&String> = chunks.iter().filter(|c| c.len() > 2000).collect();
        assert_eq!(oversized.len(), 1);
        assert!(oversized[0].contains(&long_cell));
        // The small row is still present somewhere.
        assert!(chunks.iter().any(|c| c.contains("| 2 | small |")));
    }

    #[test]
    fn test_header_only_table() {
        let text = "| a | b |\n|---|---|";
        let chunks = chunk_table(text, &header_of(text), &cfg(2000, 5));
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0], text);
    }

    #[test]
    fn test_zero_overlap() {
        let text = table_doc(40);
        let chunks = chunk_table(&text, &header_of(&text), &cfg(300, 0));
        assert!(chunks.len() > 1);
        let mut seen: Vec<String> = Vec::new();
        for chunk in &chunks {
            seen.extend(chunk.lines().skip(2).map(|r| r.to_string()));
        }
        let original: Vec<&str> = text.lines().skip(2).collect();
        assert_eq!(seen, original);
    }
}
