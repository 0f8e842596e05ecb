//! Annotation export
//!
//! Turns device bookmarks into reader annotations anchored by CFI range
//! references.

use std::path::Path;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::kobo::Bookmark;
use crate::library::DocumentLibrary;
use crate::locator::{locate, RangeReference};

/// An exported highlight
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Annotation {
    /// CFI range reference of the highlighted passage
    pub value: String,
    pub color: String,
    pub text: String,
    pub note: String,
    /// RFC 3339 creation time
    pub created: String,
    pub modified: String,
}

impl Annotation {
    pub fn from_bookmark(bookmark: &Bookmark, reference: &RangeReference, color: &str) -> Self {
        Self {
            value: reference.to_string(),
            color: color.to_string(),
            text: bookmark.text.clone().unwrap_or_default(),
            note: bookmark.annotation.clone().unwrap_or_default(),
            created: Utc::now().to_rfc3339(),
            modified: String::new(),
        }
    }
}

/// A bookmark that could not be exported
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SkippedBookmark {
    pub bookmark_id: String,
    pub volume_id: String,
    pub reason: String,
}

#[derive(Debug, Default)]
pub struct ExportReport {
    pub annotations: Vec<Annotation>,
    pub skipped: Vec<SkippedBookmark>,
}

/// Locate every highlighted bookmark in its book.
///
/// Books are looked up by file name in `library_dir`. Bookmarks without text,
/// without a local book, or whose text cannot be found are skipped.
pub async fn export_bookmarks(
    library: &DocumentLibrary,
    bookmarks: &[Bookmark],
    library_dir: &Path,
    color: &str,
) -> ExportReport {
    let mut report = ExportReport::default();

    for bookmark in bookmarks {
        let skip = |reason: String| SkippedBookmark {
            bookmark_id: bookmark.bookmark_id.clone(),
            volume_id: bookmark.volume_id.clone(),
            reason,
        };

        let Some(text) = bookmark.highlighted_text() else {
            tracing::debug!(bookmark = %bookmark.bookmark_id, "Bookmark has no text");
            report.skipped.push(skip("no highlighted text".to_string()));
            continue;
        };

        let Some(epub) = bookmark.resolve_volume(library_dir) else {
            tracing::warn!(
                bookmark = %bookmark.bookmark_id,
                volume = %bookmark.volume_id,
                "Book not found in library"
            );
            report.skipped.push(skip("book not found in library".to_string()));
            continue;
        };

        let document = match library.get_or_load(&epub).await {
            Ok(document) => document,
            Err(e) => {
                tracing::warn!(epub = %epub.display(), "Failed to load book: {}", e);
                report.skipped.push(skip(e.to_string()));
                continue;
            }
        };

        match locate(&document, text) {
            Ok(reference) => {
                tracing::info!(bookmark = %bookmark.bookmark_id, cfi = %reference, "Found CFI");
                report
                    .annotations
                    .push(Annotation::from_bookmark(bookmark, &reference, color));
            }
            Err(e) => {
                tracing::warn!(bookmark = %bookmark.bookmark_id, "{}", e);
                report.skipped.push(skip(e.to_string()));
            }
        }
    }

    report
}
