//! Core data models used throughout corpus-stitch.
//!
//! These types represent the chunks that flow through the splitting
//! pipeline and the table-header record produced by structure detection.

/// Content flavor of a chunk, decided once per document.
///
/// Detection is document-global: every chunk derived from one source
/// carries the same kind, and the reconstructor branches on it
/// exhaustively instead of consulting an ad hoc flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkKind {
    /// Produced by the table chunker; text starts with header + separator.
    Table,
    /// Produced by the generic paragraph/sentence chunker.
    Generic,
}

impl ChunkKind {
    /// Stable string form used in the database `kind` column.
    pub fn as_str(&self) -> &'static str {
        match self {
            ChunkKind::Table => "table",
            ChunkKind::Generic => "generic",
        }
    }

    /// Parse the string form back; `None` for unknown values.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "table" => Some(ChunkKind::Table),
            "generic" => Some(ChunkKind::Generic),
            _ => None,
        }
    }
}

/// A bounded-size unit of document text stored for independent retrieval.
#[derive(Debug, Clone)]
pub struct Chunk {
    /// Chunk UUID.
    pub id: String,
    /// Identifier of the owning source document (corpus-relative path).
    pub source_id: String,
    /// Zero-based ordinal among chunks of the same source. Contiguous.
    pub chunk_index: i64,
    /// Number of chunks the source produced at ingestion time. Identical
    /// across all chunks of one source.
    pub total_chunks: i64,
    /// Table or generic content.
    pub kind: ChunkKind,
    /// True if `text` begins with the detected header + separator lines.
    pub has_header: bool,
    /// Literal chunk content, including any prepended header material.
    pub text: String,
    /// SHA-256 hex of `text`, for staleness detection downstream.
    pub hash: String,
}

/// Result of markdown table detection at the start of a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableHeader {
    /// The column-name row (contains at least one pipe).
    pub header_line: String,
    /// The delimiter row beneath it (pipes, hyphens, whitespace).
    pub separator_line: String,
    /// Byte offset into the document where body rows start.
    pub header_end_offset: usize,
}
