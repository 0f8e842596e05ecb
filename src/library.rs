//! In-memory document library
//!
//! Keeps recently used books parsed, keyed by the SHA-256 of the book file,
//! so that many bookmarks against one book share a single flat index.

use std::num::NonZeroUsize;
use std::path::Path;
use std::sync::Arc;

use lru::LruCache;
use tokio::sync::Mutex;

use crate::cache::{compute_file_hash, CfiCache};
use crate::error::Result;
use crate::generator::CfiGenerator;
use crate::locator::Document;

/// LRU of loaded documents in front of the on-disk cache
pub struct DocumentLibrary {
    cache: CfiCache,
    generator: Arc<dyn CfiGenerator>,
    documents: Mutex<LruCache<String, Arc<Document>>>,
}

impl DocumentLibrary {
    pub fn new(cache: CfiCache, generator: Arc<dyn CfiGenerator>, capacity: NonZeroUsize) -> Self {
        Self {
            cache,
            generator,
            documents: Mutex::new(LruCache::new(capacity)),
        }
    }

    /// Return the document for `epub`, loading it on first use
    pub async fn get_or_load(&self, epub: &Path) -> Result<Arc<Document>> {
        let source_hash = compute_file_hash(epub).await?;

        if let Some(document) = self.documents.lock().await.get(&source_hash) {
            tracing::trace!(epub = %epub.display(), "Library hit");
            return Ok(Arc::clone(document));
        }

        let document = Arc::new(
            self.cache
                .load_or_generate_with_hash(epub, &source_hash, self.generator.as_ref())
                .await?,
        );

        self.documents
            .lock()
            .await
            .put(source_hash, Arc::clone(&document));

        Ok(document)
    }

    /// Number of documents currently held in memory
    pub async fn len(&self) -> usize {
        self.documents.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.documents.lock().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::locator::{Node, Section};
    use async_trait::async_trait;
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;

    #[derive(Default)]
    struct CountingGenerator {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl CfiGenerator for CountingGenerator {
        async fn generate(&self, epub: &Path) -> Result<Vec<Section>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let name = epub.file_name().unwrap().to_string_lossy().into_owned();
            Ok(vec![Section::new(vec![Node::new("/6/2!/4/2/1", name)])])
        }
    }

    fn write_book(dir: &TempDir, name: &str) -> PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, name.as_bytes()).unwrap();
        path
    }

    #[tokio::test]
    async fn test_reuses_loaded_document() {
        let temp_dir = TempDir::new().unwrap();
        let generator = Arc::new(CountingGenerator::default());
        let library = DocumentLibrary::new(
            CfiCache::new(temp_dir.path().join("db")),
            generator.clone(),
            NonZeroUsize::new(2).unwrap(),
        );
        let book = write_book(&temp_dir, "one.epub");

        let first = library.get_or_load(&book).await.unwrap();
        let second = library.get_or_load(&book).await.unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(generator.calls.load(Ordering::SeqCst), 1);
        assert_eq!(library.len().await, 1);
    }

    #[tokio::test]
    async fn test_evicts_least_recently_used() {
        let temp_dir = TempDir::new().unwrap();
        let generator = Arc::new(CountingGenerator::default());
        let library = DocumentLibrary::new(
            CfiCache::new(temp_dir.path().join("db")),
            generator.clone(),
            NonZeroUsize::new(1).unwrap(),
        );
        let one = write_book(&temp_dir, "one.epub");
        let two = write_book(&temp_dir, "two.epub");

        let first = library.get_or_load(&one).await.unwrap();
        library.get_or_load(&two).await.unwrap();
        let reloaded = library.get_or_load(&one).await.unwrap();

        // Evicted from memory but served from the on-disk cache
        assert!(!Arc::ptr_eq(&first, &reloaded));
        assert_eq!(generator.calls.load(Ordering::SeqCst), 2);
        assert_eq!(library.len().await, 1);
    }
}
