//! SQLite-backed [`Store`] implementation.
//!
//! Maps each [`Store`] operation to SQL against the `chunks` table.
//! `source_id` is indexed, so [`fetch_source`] filters server-side
//! instead of scanning the whole store.
//!
//! [`fetch_source`]: Store::fetch_source

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

use crate::models::{Chunk, ChunkKind};

use super::Store;

/// SQLite implementation of the [`Store`] trait.
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

fn row_to_chunk(row: &SqliteRow) -> Result<Chunk> {
    let kind_str: String = row.get("kind");
    let kind = ChunkKind::parse(&kind_str)
        .ok_or_else(|| anyhow!("unknown chunk kind in store: '{}'", kind_str))?;

    Ok(Chunk {
        id: row.get("id"),
        source_id: row.get("source_id"),
        chunk_index: row.get("chunk_index"),
        total_chunks: row.get("total_chunks"),
        kind,
        has_header: row.get("has_header"),
        text: row.get("text"),
        hash: row.get("hash"),
    })
}

async fn insert_chunk<'e, E>(executor: E, chunk: &Chunk, now: i64) -> Result<()>
where
    E: sqlx::Executor<'e, Database = sqlx::Sqlite>,
{
    sqlx::query(
        r#"
        INSERT INTO chunks (id, source_id, chunk_index, total_chunks, kind, has_header, text, hash, ingested_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT(source_id, chunk_index) DO UPDATE SET
            id = excluded.id,
            total_chunks = excluded.total_chunks,
            kind = excluded.kind,
            has_header = excluded.has_header,
            text = excluded.text,
            hash = excluded.hash,
            ingested_at = excluded.ingested_at
        "#,
    )
    .bind(&chunk.id)
    .bind(&chunk.source_id)
    .bind(chunk.chunk_index)
    .bind(chunk.total_chunks)
    .bind(chunk.kind.as_str())
    .bind(chunk.has_header)
    .bind(&chunk.text)
    .bind(&chunk.hash)
    .bind(now)
    .execute(executor)
    .await?;

    Ok(())
}

#[async_trait]
impl Store for SqliteStore {
    async fn put_chunk(&self, chunk: &Chunk) -> Result<()> {
        let now = chrono::Utc::now().timestamp();
        insert_chunk(&self.pool, chunk, now).await
    }

    async fn replace_chunks(&self, source_id: &str, chunks: &[Chunk]) -> Result<()> {
        let now = chrono::Utc::now().timestamp();
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM chunks WHERE source_id = ?")
            .bind(source_id)
            .execute(&mut *tx)
            .await?;

        for chunk in chunks {
            insert_chunk(&mut *tx, chunk, now).await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn fetch_source(&self, source_id: &str) -> Result<Vec<Chunk>> {
        let rows = sqlx::query("SELECT * FROM chunks WHERE source_id = ?")
            .bind(source_id)
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(row_to_chunk).collect()
    }

    async fn fetch_all(&self) -> Result<Vec<Chunk>> {
        let rows = sqlx::query("SELECT * FROM chunks")
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(row_to_chunk).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunk::chunk_document;
    use crate::config::{ChunkingConfig, Config, CorpusConfig, DbConfig};
    use crate::db;
    use crate::migrate;

    async fn test_store() -> (tempfile::TempDir, SqliteStore) {
        let tmp = tempfile::TempDir::new().unwrap();
        let config = Config {
            db: DbConfig {
                path: tmp.path().join("stitch.sqlite"),
            },
            chunking: ChunkingConfig {
                target_size: 400,
                overlap_rows: 5,
            },
            corpus: CorpusConfig {
                root: tmp.path().to_path_buf(),
                include_globs: vec!["**/*.md".to_string()],
                exclude_globs: Vec::new(),
                follow_symlinks: false,
            },
        };
        migrate::run_migrations(&config).await.unwrap();
        let pool = db::connect(&config).await.unwrap();
        (tmp, SqliteStore::new(pool))
    }

    fn sample_chunks(source_id: &str, rows: usize) -> Vec<Chunk> {
        let mut text = String::from("| id | name |\n|----|------|");
        for i in 0..rows {
            text.push_str(&format!("\n| {} | item-{} |", i, i));
        }
        chunk_document(
            source_id,
            &text,
            &ChunkingConfig {
                target_size: 200,
                overlap_rows: 2,
            },
        )
    }

    #[tokio::test]
    async fn test_put_and_fetch_source_filters_server_side() {
        let (_tmp, store) = test_store().await;

        for chunk in sample_chunks("a.md", 30) {
            store.put_chunk(&chunk).await.unwrap();
        }
        for chunk in sample_chunks("b.md", 5) {
            store.put_chunk(&chunk).await.unwrap();
        }

        let fetched = store.fetch_source("a.md").await.unwrap();
        assert!(!fetched.is_empty());
        assert!(fetched.iter().all(|c| c.source_id == "a.md"));
        assert!(fetched.iter().all(|c| c.kind == ChunkKind::Table));
        assert!(fetched.iter().all(|c| c.has_header));

        let all = store.fetch_all().await.unwrap();
        assert!(all.len() > fetched.len());
    }

    #[tokio::test]
    async fn test_replace_supersedes_old_set() {
        let (_tmp, store) = test_store().await;

        let old = sample_chunks("a.md", 30);
        store.replace_chunks("a.md", &old).await.unwrap();

        let new = sample_chunks("a.md", 3);
        assert!(new.len() < old.len());
        store.replace_chunks("a.md", &new).await.unwrap();

        let fetched = store.fetch_source("a.md").await.unwrap();
        assert_eq!(fetched.len(), new.len());
        assert!(fetched.iter().all(|c| c.total_chunks == new.len() as i64));
    }

    #[tokio::test]
    async fn test_metadata_round_trip() {
        let (_tmp, store) = test_store().await;

        let chunks = sample_chunks("a.md", 30);
        store.replace_chunks("a.md", &chunks).await.unwrap();

        let mut fetched = store.fetch_source("a.md").await.unwrap();
        fetched.sort_by_key(|c| c.chunk_index);

        for (original, stored) in chunks.iter().zip(fetched.iter()) {
            assert_eq!(original.id, stored.id);
            assert_eq!(original.chunk_index, stored.chunk_index);
            assert_eq!(original.total_chunks, stored.total_chunks);
            assert_eq!(original.kind, stored.kind);
            assert_eq!(original.has_header, stored.has_header);
            assert_eq!(original.text, stored.text);
            assert_eq!(original.hash, stored.hash);
        }
    }
}
