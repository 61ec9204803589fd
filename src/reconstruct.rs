//! Document reconstruction from stored chunks.
//!
//! Fetches every chunk belonging to a source, orders them by their
//! write-time `chunk_index` (store insertion order is never trusted),
//! strips the duplicated table header beyond the first chunk, drops
//! overlap rows repeated at chunk boundaries, and concatenates the rest
//! into one logical document. Used by the `stitch reconstruct` CLI
//! command and exposed to downstream consumers (LLM prompt builders,
//! format converters).

use anyhow::{bail, Result};
use serde::Serialize;

use crate::config::Config;
use crate::db;
use crate::models::{Chunk, ChunkKind};
use crate::store::sqlite::SqliteStore;
use crate::store::Store;

/// Boundary rows compared when de-duplicating overlap. Larger than any
/// sane `overlap_rows` setting.
const MAX_OVERLAP_SCAN: usize = 32;

/// A single chunk within a [`ReconstructResult`], in document order.
#[derive(Debug, Clone, Serialize)]
pub struct ChunkView {
    pub index: i64,
    pub text: String,
}

/// Reassembled document returned by [`reconstruct`].
#[derive(Debug, Clone, Serialize)]
pub struct ReconstructResult {
    pub source_id: String,
    /// The reconstructed logical document.
    pub content: String,
    /// The ordered chunks the content was assembled from.
    pub chunks: Vec<ChunkView>,
    /// Chunk count recorded at ingestion time.
    pub total_chunks: i64,
    /// Set when the retrieved set disagrees with `total_chunks` or has
    /// index gaps. A partially re-ingested document can legitimately
    /// produce this state, so it is not a hard failure.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

/// Reassemble the document identified by `source_id`.
///
/// Fails when no chunks match; store errors propagate unchanged.
/// Idempotent and order-independent: any input order of the same chunk
/// set yields identical output, because assembly always re-sorts by
/// `chunk_index`.
pub async fn reconstruct(store: &dyn Store, source_id: &str) -> Result<ReconstructResult> {
    let mut chunks = store.fetch_source(source_id).await?;
    if chunks.is_empty() {
        bail!("no chunks found for source '{}'", source_id);
    }

    chunks.sort_by_key(|c| c.chunk_index);

    let total_chunks = chunks[0].total_chunks;
    let warning = consistency_warning(&chunks, total_chunks);

    let content = match chunks[0].kind {
        ChunkKind::Table => assemble_table(&chunks),
        ChunkKind::Generic => chunks
            .iter()
            .map(|c| c.text.as_str())
            .collect::<Vec<_>>()
            .join("\n\n"),
    };

    let views = chunks
        .iter()
        .map(|c| ChunkView {
            index: c.chunk_index,
            text: c.text.clone(),
        })
        .collect();

    Ok(ReconstructResult {
        source_id: source_id.to_string(),
        content,
        chunks: views,
        total_chunks,
        warning,
    })
}

/// Compare the retrieved set against its own ingestion-time record.
fn consistency_warning(chunks: &[Chunk], total_chunks: i64) -> Option<String> {
    if chunks.len() as i64 != total_chunks {
        return Some(format!(
            "retrieved {} chunks but {} were recorded at ingestion",
            chunks.len(),
            total_chunks
        ));
    }
    for (i, chunk) in chunks.iter().enumerate() {
        if chunk.chunk_index != i as i64 {
            return Some(format!(
                "chunk indices are not contiguous: expected {} at position {}, found {}",
                i, i, chunk.chunk_index
            ));
        }
    }
    None
}

/// Concatenate table chunks: the header and separator survive once, and
/// rows repeated across a chunk boundary by the overlap carry are
/// dropped by row identity.
fn assemble_table(chunks: &[Chunk]) -> String {
    let mut header: Vec<&str> = Vec::new();
    let mut rows: Vec<&str> = Vec::new();

    for (i, chunk) in chunks.iter().enumerate() {
        let mut lines = chunk.text.split('\n');
        if chunk.has_header {
            let head = lines.next();
            let sep = lines.next();
            if i == 0 {
                header.extend(head);
                header.extend(sep);
            }
        }

        let body: Vec<&str> = lines.collect();
        let skip = overlap_prefix(&rows, &body);
        rows.extend(&body[skip..]);
    }

    let mut out = header.join("\n");
    for row in rows {
        out.push('\n');
        out.push_str(row);
    }
    out
}

/// Longest prefix of `next` that duplicates the tail of the rows
/// already assembled.
fn overlap_prefix(assembled: &[&str], next: &[&str]) -> usize {
    let max_k = assembled.len().min(next.len()).min(MAX_OVERLAP_SCAN);
    for k in (1..=max_k).rev() {
        if assembled[assembled.len() - k..] == next[..k] {
            return k;
        }
    }
    0
}

/// CLI entry point — reconstructs and prints to stdout.
pub async fn run_reconstruct(config: &Config, source_id: &str, json: bool) -> Result<()> {
    let pool = db::connect(config).await?;
    let store = SqliteStore::new(pool.clone());

    let result = match reconstruct(&store, source_id).await {
        Ok(r) => r,
        Err(e) => {
            pool.close().await;
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    pool.close().await;

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    println!("--- Source ---");
    println!("source_id:    {}", result.source_id);
    println!("chunks:       {}", result.chunks.len());
    println!("total_chunks: {}", result.total_chunks);
    if let Some(ref warning) = result.warning {
        eprintln!("warning: {}", warning);
    }
    println!();
    println!("{}", result.content);

    Ok(())
}
