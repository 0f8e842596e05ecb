//! Content-hash cache for generator output
//!
//! Running the external generator is slow, so its output is persisted per
//! book as `database_<sha256>.json`:
//!
//! ```json
//! { "sourceHash": "<sha256 hex of the epub>", "cfiData": [ ... ] }
//! ```
//!
//! A record is only used when its stored hash matches the current digest of
//! the book file; anything else is a miss and triggers regeneration.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::{AppError, Result};
use crate::generator::CfiGenerator;
use crate::locator::{Document, Section};

/// Persisted generator output
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheRecord {
    #[serde(alias = "epubHash")]
    pub source_hash: String,
    pub cfi_data: Vec<Section>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CacheRecordRef<'a> {
    source_hash: &'a str,
    cfi_data: &'a [Section],
}

/// Directory of cache records
#[derive(Debug, Clone)]
pub struct CfiCache {
    dir: PathBuf,
}

impl CfiCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn record_path(&self, source_hash: &str) -> PathBuf {
        self.dir.join(format!("database_{}.json", source_hash))
    }

    /// Read the record for `source_hash` if it exists and is valid
    pub async fn load(&self, source_hash: &str) -> Option<Vec<Section>> {
        let path = self.record_path(source_hash);
        let json = match tokio::fs::read_to_string(&path).await {
            Ok(json) => json,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
            Err(e) => {
                tracing::warn!(path = %path.display(), "Failed to read cache record: {}", e);
                return None;
            }
        };

        let record: CacheRecord = match serde_json::from_str(&json) {
            Ok(record) => record,
            Err(e) => {
                tracing::warn!(path = %path.display(), "Malformed cache record: {}", e);
                return None;
            }
        };

        if record.source_hash != source_hash {
            tracing::debug!(
                expected = %source_hash,
                stored = %record.source_hash,
                "Stale cache record"
            );
            return None;
        }

        Some(record.cfi_data)
    }

    /// Write (or overwrite) the record for `source_hash`
    pub async fn store(&self, source_hash: &str, sections: &[Section]) -> Result<()> {
        tokio::fs::create_dir_all(&self.dir).await?;
        let record = CacheRecordRef {
            source_hash,
            cfi_data: sections,
        };
        let json = serde_json::to_string_pretty(&record)?;
        tokio::fs::write(self.record_path(source_hash), json).await?;
        Ok(())
    }

    /// Load the document for `epub`, regenerating it on a cache miss
    pub async fn load_or_generate(
        &self,
        epub: &Path,
        generator: &dyn CfiGenerator,
    ) -> Result<Document> {
        let source_hash = compute_file_hash(epub).await?;
        self.load_or_generate_with_hash(epub, &source_hash, generator)
            .await
    }

    /// As [`Self::load_or_generate`], for a caller that already hashed the file
    pub async fn load_or_generate_with_hash(
        &self,
        epub: &Path,
        source_hash: &str,
        generator: &dyn CfiGenerator,
    ) -> Result<Document> {
        if let Some(sections) = self.load(source_hash).await {
            tracing::debug!(epub = %epub.display(), "CFI cache hit");
            return Ok(Document::new(sections));
        }

        tracing::info!(epub = %epub.display(), "No cached CFIs, generating");
        let sections = generator.generate(epub).await?;
        self.store(source_hash, &sections).await?;
        Ok(Document::new(sections))
    }
}

/// SHA-256 of `data` as lowercase hex
pub fn compute_hash(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

/// SHA-256 of a file's bytes as lowercase hex
pub async fn compute_file_hash(path: &Path) -> Result<String> {
    let data = tokio::fs::read(path).await.map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            AppError::FileNotFound(path.to_path_buf())
        } else {
            AppError::Io(e)
        }
    })?;
    Ok(compute_hash(&data))
}
