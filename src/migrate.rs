use anyhow::Result;

use crate::config::Config;
use crate::db;

pub async fn run_migrations(config: &Config) -> Result<()> {
    let pool = db::connect(config).await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS chunks (
            id TEXT PRIMARY KEY,
            source_id TEXT NOT NULL,
            chunk_index INTEGER NOT NULL,
            total_chunks INTEGER NOT NULL,
            kind TEXT NOT NULL,
            has_header INTEGER NOT NULL DEFAULT 0,
            text TEXT NOT NULL,
            hash TEXT NOT NULL,
            ingested_at INTEGER NOT NULL,
            UNIQUE(source_id, chunk_index)
        )
        "#,
    )
    .execute(&pool)
    .await?;

    // chunk_index is assigned at write time and re-sorted at read time;
    // the source_id index makes the reconstructor's equality filter cheap.
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_chunks_source_id ON chunks(source_id)")
        .execute(&pool)
        .await?;

    pool.close().await;
    Ok(())
}
