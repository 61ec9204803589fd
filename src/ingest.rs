//! Corpus ingestion.
//!
//! Walks the configured corpus directory, splits every matching
//! document with [`chunk_document`], and replaces each document's chunk
//! set in the store. One malformed document never aborts the walk:
//! unreadable files are skipped with a warning and the run continues.

use anyhow::{bail, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};
use std::path::PathBuf;
use walkdir::WalkDir;

use crate::chunk::chunk_document;
use crate::config::Config;
use crate::db;
use crate::models::ChunkKind;
use crate::store::sqlite::SqliteStore;
use crate::store::Store;

/// A corpus file selected for ingestion.
struct CorpusFile {
    /// Corpus-relative path; doubles as the document's stable source id.
    source_id: String,
    path: PathBuf,
}

pub async fn run_ingest(config: &Config, dry_run: bool, limit: Option<usize>) -> Result<()> {
    let mut files = scan_corpus(config)?;

    if let Some(lim) = limit {
        files.truncate(lim);
    }

    if dry_run {
        let mut total_chunks = 0usize;
        let mut tables = 0usize;
        for file in &files {
            let body = std::fs::read_to_string(&file.path).unwrap_or_default();
            let chunks = chunk_document(&file.source_id, &body, &config.chunking);
            if chunks.iter().any(|c| c.kind == ChunkKind::Table) {
                tables += 1;
            }
            total_chunks += chunks.len();
        }
        println!("ingest (dry-run)");
        println!("  files found: {}", files.len());
        println!("  tables detected: {}", tables);
        println!("  estimated chunks: {}", total_chunks);
        return Ok(());
    }

    let pool = db::connect(config).await?;
    let store = SqliteStore::new(pool.clone());

    let mut docs_written = 0u64;
    let mut chunks_written = 0u64;
    let mut tables = 0u64;
    let mut skipped = 0u64;

    for file in &files {
        let body = match std::fs::read_to_string(&file.path) {
            Ok(body) => body,
            Err(e) => {
                eprintln!("warning: skipping {}: {}", file.source_id, e);
                skipped += 1;
                continue;
            }
        };

        let chunks = chunk_document(&file.source_id, &body, &config.chunking);
        if chunks.iter().any(|c| c.kind == ChunkKind::Table) {
            tables += 1;
        }
        for chunk in &chunks {
            if chunk.text.len() > config.chunking.target_size {
                eprintln!(
                    "warning: {} chunk {} exceeds target size ({} chars): atomic row kept whole",
                    file.source_id,
                    chunk.chunk_index,
                    chunk.text.len()
                );
            }
        }

        let chunk_count = chunks.len() as u64;
        store.replace_chunks(&file.source_id, &chunks).await?;

        docs_written += 1;
        chunks_written += chunk_count;
    }

    println!("ingest");
    println!("  files found: {}", files.len());
    println!("  documents written: {}", docs_written);
    println!("  chunks written: {}", chunks_written);
    println!("  tables detected: {}", tables);
    if skipped > 0 {
        println!("  skipped: {}", skipped);
    }
    println!("ok");

    pool.close().await;
    Ok(())
}

/// Enumerate corpus files matching the configured globs, sorted by
/// source id for deterministic ordering.
fn scan_corpus(config: &Config) -> Result<Vec<CorpusFile>> {
    let corpus = &config.corpus;
    if !corpus.root.exists() {
        bail!("corpus root does not exist: {}", corpus.root.display());
    }

    let include_set = build_globset(&corpus.include_globs)?;

    let mut default_excludes = vec![
        "**/.git/**".to_string(),
        "**/target/**".to_string(),
        "**/node_modules/**".to_string(),
    ];
    default_excludes.extend(corpus.exclude_globs.clone());
    let exclude_set = build_globset(&default_excludes)?;

    let mut files = Vec::new();

    let walker = WalkDir::new(&corpus.root).follow_links(corpus.follow_symlinks);
    for entry in walker {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        let relative = path.strip_prefix(&corpus.root).unwrap_or(path);
        let rel_str = relative.to_string_lossy().to_string();

        if exclude_set.is_match(&rel_str) {
            continue;
        }
        if !include_set.is_match(&rel_str) {
            continue;
        }

        files.push(CorpusFile {
            source_id: rel_str,
            path: path.to_path_buf(),
        });
    }

    files.sort_by(|a, b| a.source_id.cmp(&b.source_id));

    Ok(files)
}

fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(Glob::new(pattern)?);
    }
    Ok(builder.build()?)
}
