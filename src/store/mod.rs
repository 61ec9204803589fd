//! Storage abstraction for corpus-stitch.
//!
//! The [`Store`] trait defines the narrow interface this core needs from
//! the external chunk store: persist chunks, supersede a document's
//! chunk set wholesale, and fetch chunks back for reconstruction.
//! Backend failures propagate unchanged; no retries happen here.
//!
//! Implementations must be `Send + Sync` to work with async runtimes.

pub mod memory;
pub mod sqlite;

use anyhow::Result;
use async_trait::async_trait;

use crate::models::Chunk;

/// Abstract chunk store.
///
/// All operations are async (via `async-trait`). The in-memory
/// implementation returns immediately-ready futures.
///
/// # Operations
///
/// | Method | Purpose |
/// |--------|---------|
/// | [`put_chunk`](Store::put_chunk) | Persist one chunk with its metadata |
/// | [`replace_chunks`](Store::replace_chunks) | Supersede all chunks of a source |
/// | [`fetch_source`](Store::fetch_source) | All chunks of one source, unordered |
/// | [`fetch_all`](Store::fetch_all) | Bulk fetch across the whole store |
#[async_trait]
pub trait Store: Send + Sync {
    /// Persist one chunk. Overwrites an existing chunk occupying the
    /// same `(source_id, chunk_index)` slot.
    async fn put_chunk(&self, chunk: &Chunk) -> Result<()>;

    /// Atomically replace every chunk belonging to `source_id` with the
    /// given set. Used on re-ingestion so readers never see a mix of
    /// old and new chunk indices once the replace completes.
    async fn replace_chunks(&self, source_id: &str, chunks: &[Chunk]) -> Result<()>;

    /// Fetch all chunks whose source matches, in no guaranteed order.
    ///
    /// Backends with an indexed `source_id` column filter server-side;
    /// backends without one may scan [`fetch_all`](Store::fetch_all)
    /// and filter client-side.
    async fn fetch_source(&self, source_id: &str) -> Result<Vec<Chunk>>;

    /// Fetch every stored chunk.
    async fn fetch_all(&self) -> Result<Vec<Chunk>>;
}
