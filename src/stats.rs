//! Database statistics and health overview.
//!
//! Provides a quick summary of what's stored: document counts, chunk
//! counts, table share, and per-document breakdowns. Used by
//! `stitch stats` to give confidence that ingestion is working as
//! expected.

use anyhow::Result;
use sqlx::Row;

use crate::config::Config;
use crate::db;

/// Per-document breakdown.
struct SourceStats {
    source_id: String,
    kind: String,
    chunk_count: i64,
    total_chunks: i64,
    last_ingest_ts: Option<i64>,
}

/// Run the stats command: query the database and print a summary.
pub async fn run_stats(config: &Config) -> Result<()> {
    let pool = db::connect(config).await?;

    let total_docs: i64 = sqlx::query_scalar("SELECT COUNT(DISTINCT source_id) FROM chunks")
        .fetch_one(&pool)
        .await?;

    let total_chunks: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM chunks")
        .fetch_one(&pool)
        .await?;

    let table_chunks: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM chunks WHERE kind = 'table'")
            .fetch_one(&pool)
            .await?;

    let db_size = std::fs::metadata(&config.db.path)
        .map(|m| m.len())
        .unwrap_or(0);

    println!("corpus-stitch — Database Stats");
    println!("==============================");
    println!();
    println!("  Database:     {}", config.db.path.display());
    println!("  Size:         {}", format_bytes(db_size));
    println!();
    println!("  Documents:    {}", total_docs);
    println!("  Chunks:       {}", total_chunks);
    println!(
        "  Table chunks: {} / {} ({}%)",
        table_chunks,
        total_chunks,
        if total_chunks > 0 {
            (table_chunks * 100) / total_chunks
        } else {
            0
        }
    );

    let source_rows = sqlx::query(
        r#"
        SELECT
            source_id,
            kind,
            COUNT(*) AS chunk_count,
            MAX(total_chunks) AS total_chunks,
            MAX(ingested_at) AS last_ingest
        FROM chunks
        GROUP BY source_id
        ORDER BY chunk_count DESC
        "#,
    )
    .fetch_all(&pool)
    .await?;

    let source_stats: Vec<SourceStats> = source_rows
        .iter()
        .map(|row| SourceStats {
            source_id: row.get("source_id"),
            kind: row.get("kind"),
            chunk_count: row.get("chunk_count"),
            total_chunks: row.get("total_chunks"),
            last_ingest_ts: row.get("last_ingest"),
        })
        .collect();

    if !source_stats.is_empty() {
        println!();
        println!("  By document:");
        println!(
            "  {:<40} {:>8} {:>8} {:>8}   {}",
            "SOURCE", "KIND", "CHUNKS", "TOTAL", "LAST INGEST"
        );
        println!("  {}", "-".repeat(86));

        for s in &source_stats {
            let ingest_display = match s.last_ingest_ts {
                Some(ts) => format_ts_relative(ts),
                None => "never".to_string(),
            };
            println!(
                "  {:<40} {:>8} {:>8} {:>8}   {}",
                s.source_id, s.kind, s.chunk_count, s.total_chunks, ingest_display
            );
        }
    }

    println!();

    pool.close().await;
    Ok(())
}

/// Format a byte count as a human-readable string.
fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{} B", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else if bytes < 1024 * 1024 * 1024 {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    } else {
        format!("{:.2} GB", bytes as f64 / (1024.0 * 1024.0 * 1024.0))
    }
}

/// Format a Unix timestamp as a relative time string (e.g. "3 hours ago").
fn format_ts_relative(ts: i64) -> String {
    let now = chrono::Utc::now().timestamp();
    let delta = now - ts;

    if delta < 0 {
        return format_ts_iso(ts);
    }

    if delta < 60 {
        "just now".to_string()
    } else if delta < 3600 {
        let mins = delta / 60;
        format!("{} min{} ago", mins, if mins == 1 { "" } else { "s" })
    } else if delta < 86400 {
        let hours = delta / 3600;
        format!("{} hour{} ago", hours, if hours == 1 { "" } else { "s" })
    } else if delta < 86400 * 30 {
        let days = delta / 86400;
        format!("{} day{} ago", days, if days == 1 { "" } else { "s" })
    } else {
        format_ts_iso(ts)
    }
}

fn format_ts_iso(ts: i64) -> String {
    chrono::DateTime::from_timestamp(ts, 0)
        .map(|dt| dt.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| ts.to_string())
}
