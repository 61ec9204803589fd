//! In-memory [`Store`] implementation for tests.
//!
//! Uses a `Vec` behind `std::sync::RwLock` for thread safety. This
//! backend has no index on `source_id`, so [`fetch_source`] is the
//! full-scan-then-filter compatibility path: it fetches broadly and
//! matches client-side, the pattern required for stores without
//! server-side equality filters.
//!
//! [`fetch_source`]: Store::fetch_source

use std::sync::RwLock;

use anyhow::Result;
use async_trait::async_trait;

use crate::models::Chunk;

use super::Store;

/// In-memory chunk store.
pub struct InMemoryStore {
    chunks: RwLock<Vec<Chunk>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            chunks: RwLock::new(Vec::new()),
        }
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Store for InMemoryStore {
    async fn put_chunk(&self, chunk: &Chunk) -> Result<()> {
        let mut stored = self.chunks.write().unwrap();
        stored.retain(|c| {
            !(c.source_id == chunk.source_id && c.chunk_index == chunk.chunk_index)
        });
        stored.push(chunk.clone());
        Ok(())
    }

    async fn replace_chunks(&self, source_id: &str, chunks: &[Chunk]) -> Result<()> {
        let mut stored = self.chunks.write().unwrap();
        stored.retain(|c| c.source_id != source_id);
        stored.extend(chunks.iter().cloned());
        Ok(())
    }

    async fn fetch_source(&self, source_id: &str) -> Result<Vec<Chunk>> {
        let stored = self.chunks.read().unwrap();
        Ok(stored
            .iter()
            .filter(|c| c.source_id == source_id)
            .cloned()
            .collect())
    }

    async fn fetch_all(&self) -> Result<Vec<Chunk>> {
        let stored = self.chunks.read().unwrap();
        Ok(stored.clone())
    }
}
