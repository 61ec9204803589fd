//! Document chunking entry point and generic fallback chunker.
//!
//! [`chunk_document`] routes a document through structure detection:
//! tables go to the table chunker, everything else is split here on
//! paragraph boundaries (`\n\n`), falling back to sentence boundaries
//! and finally hard character cuts for oversized paragraphs. Accumulated
//! segments respect the `target_size` budget with the same
//! overlap-on-carryover policy as the table path, operating on text
//! segments instead of rows.
//!
//! Emitted chunks are stamped with their identity here: source id,
//! ordinal index, total count, content kind, a UUID, and a SHA-256 hash
//! of the text for staleness detection downstream.

use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::config::ChunkingConfig;
use crate::detect::detect_table;
use crate::models::{Chunk, ChunkKind};
use crate::table::chunk_table;

/// Split a document into stamped chunks.
///
/// Runs table detection once, routes to the matching splitter, and
/// assigns final metadata. At least one chunk is always returned, even
/// for empty text.
///
/// # Guarantees
///
/// - Chunk indices are contiguous: `0, 1, 2, …, total_chunks - 1`.
/// - `kind` and `has_header` are identical across a document's chunks.
/// - Table chunks all start with the same header + separator bytes.
pub fn chunk_document(source_id: &str, text: &str, cfg: &ChunkingConfig) -> Vec<Chunk> {
    let (texts, kind, has_header) = match detect_table(text) {
        Some(header) => (chunk_table(text, &header, cfg), ChunkKind::Table, true),
        None => (split_generic(text, cfg), ChunkKind::Generic, false),
    };
    finalize_chunks(source_id, kind, has_header, texts)
}

/// Split prose or mixed content into chunk texts.
fn split_generic(text: &str, cfg: &ChunkingConfig) -> Vec<String> {
    let mut segments: Vec<&str> = Vec::new();
    for para in text.split("\n\n") {
        let trimmed = para.trim();
        if trimmed.is_empty() {
            continue;
        }
        if trimmed.len() <= cfg.target_size {
            segments.push(trimmed);
        } else {
            split_oversized(trimmed, cfg.target_size, &mut segments);
        }
    }

    let mut chunks: Vec<String> = Vec::new();
    let mut buf: Vec<&str> = Vec::new();
    let mut buf_len = 0usize;
    // Segments consumed by the open chunk, carried overlap excluded.
    let mut fresh = 0usize;

    for seg in segments {
        let mut added = joined_len(&buf, seg);
        if fresh > 0 && buf_len + added > cfg.target_size {
            chunks.push(buf.join("\n\n"));
            let (carry, carry_len) = overlap_tail(&buf, cfg, seg.len());
            buf = carry;
            buf_len = carry_len;
            fresh = 0;
            added = joined_len(&buf, seg);
        }
        buf.push(seg);
        buf_len += added;
        fresh += 1;
    }

    if fresh > 0 || chunks.is_empty() {
        chunks.push(buf.join("\n\n"));
    }

    chunks
}

/// Cost of appending `seg` to the buffer, separator included.
fn joined_len(buf: &[&str], seg: &str) -> usize {
    if buf.is_empty() {
        seg.len()
    } else {
        seg.len() + 2
    }
}

/// Segments carried into the next chunk: up to `overlap_rows` trailing
/// segments, accounted against the size budget alongside the pending
/// unseen segment so an oversized segment is never re-carried.
fn overlap_tail<'a>(
    buf: &[&'a str],
    cfg: &ChunkingConfig,
    reserved: usize,
) -> (Vec<&'a str>, usize) {
    let mut carry: Vec<&'a str> = Vec::new();
    let mut carry_len = 0usize;
    for seg in buf.iter().rev().take(cfg.overlap_rows) {
        let added = seg.len() + 2;
        if reserved + carry_len + added > cfg.target_size {
            break;
        }
        carry.push(*seg);
        carry_len += added;
    }
    carry.reverse();
    // The leading segment pays no separator.
    if !carry.is_empty() {
        carry_len -= 2;
    }
    (carry, carry_len)
}

/// Break a paragraph that exceeds the budget into segments of at most
/// `max_chars`, preferring sentence ends, then newline or space
/// boundaries, then a hard cut snapped to a UTF-8 char boundary.
fn split_oversized<'a>(para: &'a str, max_chars: usize, out: &mut Vec<&'a str>) {
    let mut remaining = para;
    while !remaining.is_empty() {
        if remaining.len() <= max_chars {
            out.push(remaining);
            break;
        }

        let window = snap_to_char_boundary(remaining, max_chars);
        let cut = remaining[..window]
            .rfind(". ")
            .map(|pos| pos + 2)
            .or_else(|| remaining[..window].rfind('\n').map(|pos| pos + 1))
            .or_else(|| remaining[..window].rfind(' ').map(|pos| pos + 1))
            .unwrap_or(window);
        let cut = snap_to_char_boundary(remaining, cut);
        // Guarantee forward progress even for pathological input.
        let cut = if cut == 0 {
            remaining
                .char_indices()
                .nth(1)
                .map(|(i, _)| i)
                .unwrap_or(remaining.len())
        } else {
            cut
        };

        let piece = remaining[..cut].trim();
        if !piece.is_empty() {
            out.push(piece);
        }
        remaining = remaining[cut..].trim_start();
    }
}

/// Snap a byte index back to the nearest valid UTF-8 char boundary.
fn snap_to_char_boundary(s: &str, index: usize) -> usize {
    if index >= s.len() {
        return s.len();
    }
    let mut i = index;
    while i > 0 && !s.is_char_boundary(i) {
        i -= 1;
    }
    i
}

/// Stamp final identity onto raw chunk texts.
fn finalize_chunks(
    source_id: &str,
    kind: ChunkKind,
    has_header: bool,
    texts: Vec<String>,
) -> Vec<Chunk> {
    let total = texts.len() as i64;
    texts
        .into_iter()
        .enumerate()
        .map(|(i, text)| {
            let mut hasher = Sha256::new();
            hasher.update(text.as_bytes());
            let hash = format!("{:x}", hasher.finalize());

            Chunk {
                id: Uuid::new_v4().to_string(),
                source_id: source_id.to_string(),
                chunk_index: i as i64,
                total_chunks: total,
                kind,
                has_header,
                text,
                hash,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg(target_size: usize, overlap_rows: usize) -> ChunkingConfig {
        ChunkingConfig {
            target_size,
            overlap_rows,
        }
    }

    #[test]
    fn test_small_text_single_chunk() {
        let chunks = chunk_document("doc.md", "Hello, world!", &cfg(2000, 5));
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].chunk_index, 0);
        assert_eq!(chunks[0].total_chunks, 1);
        assert_eq!(chunks[0].kind, ChunkKind::Generic);
        assert!(!chunks[0].has_header);
        assert_eq!(chunks[0].text, "Hello, world!");
    }

    #[test]
    fn test_empty_text() {
        let chunks = chunk_document("doc.md", "", &cfg(2000, 5));
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].chunk_index, 0);
    }

    #[test]
    fn test_multiple_paragraphs_under_limit() {
        let text = "First paragraph.\n\nSecond paragraph.\n\nThird paragraph.";
        let chunks = chunk_document("doc.md", text, &cfg(2000, 0));
        assert_eq!(chunks.len(), 1);
        assert!(chunks[0].text.contains("First paragraph."));
        assert!(chunks[0].text.contains("Third paragraph."));
    }

    #[test]
    fn test_chunk_indices_contiguous() {
        let text = (0..50)
            .map(|i| format!("Paragraph number {}.", i))
            .collect::<Vec<_>>()
            .join("\n\n");
        let chunks = chunk_document("doc.md", &text, &cfg(60, 1));
        assert!(chunks.len() > 1);
        let total = chunks.len() as i64;
        for (i, c) in chunks.iter().enumerate() {
            assert_eq!(c.chunk_index, i as i64, "index mismatch at position {}", i);
            assert_eq!(c.total_chunks, total);
        }
    }

    #[test]
    fn test_overlap_segments_carry_over() {
        let text = (0..20)
            .map(|i| format!("Paragraph number {}.", i))
            .collect::<Vec<_>>()
            .join("\n\n");
        let chunks = chunk_document("doc.md", &text, &cfg(100, 1));
        assert!(chunks.len() > 1);
        for pair in chunks.windows(2) {
            let last_seg = pair[0].text.split("\n\n").last().unwrap();
            assert!(
                pair[1].text.starts_with(last_seg),
                "expected '{}' to lead the next chunk",
                last_seg
            );
        }
    }

    #[test]
    fn test_oversized_paragraph_sentence_split() {
        let text = (0..40)
            .map(|i| format!("Sentence number {} is here.", i))
            .collect::<Vec<_>>()
            .join(" ");
        let chunks = chunk_document("doc.md", &text, &cfg(120, 0));
        assert!(chunks.len() > 1);
        for c in &chunks {
            assert!(c.text.len() <= 120, "chunk over budget: {}", c.text.len());
        }
    }

    #[test]
    fn test_multibyte_utf8_hard_cut() {
        let text = "┌──────────────────┐│ not a table      │└──────────────────┘".repeat(4);
        let chunks = chunk_document("doc.md", &text, &cfg(50, 0));
        assert!(!chunks.is_empty());
        for c in &chunks {
            assert!(!c.text.is_empty());
        }
    }

    #[test]
    fn test_table_document_routes_to_table_chunker() {
        let mut text = String::from("| id | name |\n|----|------|");
        for i in 0..100 {
            text.push_str(&format!("\n| {} | item-{} |", i, i));
        }
        let chunks = chunk_document("catalog.md", &text, &cfg(300, 2));
        assert!(chunks.len() > 1);
        for c in &chunks {
            assert_eq!(c.kind, ChunkKind::Table);
            assert!(c.has_header);
            assert!(c.text.starts_with("| id | name |\n|----|------|"));
        }
    }

    #[test]
    fn test_deterministic_text_and_hash() {
        let text = "Alpha\n\nBeta\n\nGamma\n\nDelta";
        let a = chunk_document("doc.md", text, &cfg(14, 1));
        let b = chunk_document("doc.md", text, &cfg(14, 1));
        assert_eq!(a.len(), b.len());
        for (x, y) in a.iter().zip(b.iter()) {
            assert_eq!(x.text, y.text);
            assert_eq!(x.hash, y.hash);
            assert_eq!(x.chunk_index, y.chunk_index);
        }
    }
}
