//! Kobo bookmark database
//!
//! Reads highlights from the `Bookmark` table of a Kobo e-reader's
//! `KoboReader.sqlite`. The database is opened read-only.

use std::path::{Path, PathBuf};

use serde::Serialize;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};

use crate::error::Result;

/// A highlight or note made on the device
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Bookmark {
    pub bookmark_id: String,
    /// Book the bookmark belongs to, e.g. `file:///mnt/onboard/Books/x.epub`
    pub volume_id: String,
    /// Highlighted text
    pub text: Option<String>,
    /// User's note
    pub annotation: Option<String>,
}

impl Bookmark {
    /// Highlighted text, if any non-blank text was captured
    pub fn highlighted_text(&self) -> Option<&str> {
        self.text.as_deref().filter(|text| !text.trim().is_empty())
    }

    /// File name of the book, decoded from the volume id
    pub fn volume_file_name(&self) -> Option<String> {
        let raw = self
            .volume_id
            .strip_prefix("file://")
            .unwrap_or(&self.volume_id);
        let decoded = urlencoding::decode(raw)
            .map(|s| s.into_owned())
            .unwrap_or_else(|_| raw.to_string());

        let name = decoded
            .rsplit(['/', '\\'])
            .next()
            .filter(|name| !name.is_empty())
            .map(str::to_string);
        name
    }

    /// Path of the book inside a local copy of the device library
    pub fn resolve_volume(&self, library_dir: &Path) -> Option<PathBuf> {
        let path = library_dir.join(self.volume_file_name()?);
        path.is_file().then_some(path)
    }
}

/// Read-only handle on a Kobo database
pub struct KoboDatabase {
    pool: SqlitePool,
}

impl KoboDatabase {
    pub async fn open(path: &Path) -> Result<Self> {
        let options = SqliteConnectOptions::new()
            .filename(path)
            .read_only(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await?;

        tracing::debug!(path = %path.display(), "Opened Kobo database");
        Ok(Self { pool })
    }

    /// All bookmarks in id order
    pub async fn bookmarks(&self) -> Result<Vec<Bookmark>> {
        let bookmarks = sqlx::query_as::<_, Bookmark>(
            r#"
            SELECT BookmarkID AS bookmark_id,
                   VolumeID AS volume_id,
                   Text AS text,
                   Annotation AS annotation
            FROM Bookmark
            ORDER BY BookmarkID
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(bookmarks)
    }

    pub async fn close(self) {
        self.pool.close().await;
    }
}
