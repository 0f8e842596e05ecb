//! Flat document index
//!
//! Linearizes the section/node tree into one virtual buffer of normalized
//! text. Node texts are concatenated directly, with no separators, and each
//! node records its half-open character span in that buffer.

use super::normalize::normalize;
use super::types::{Document, FragmentLocator};

/// One node's place in the flat buffer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexEntry {
    pub locator: FragmentLocator,
    pub normalized_text: String,
    /// First character of the node in the buffer
    pub start_offset: usize,
    /// One past the node's last character
    pub end_offset: usize,
}

impl IndexEntry {
    pub fn len(&self) -> usize {
        self.end_offset - self.start_offset
    }

    pub fn is_empty(&self) -> bool {
        self.start_offset == self.end_offset
    }

    /// Whether `offset` falls inside `[start_offset, end_offset)`
    pub fn contains(&self, offset: usize) -> bool {
        self.start_offset <= offset && offset < self.end_offset
    }
}

/// Offset-annotated, read-only view of a document
#[derive(Debug, Clone, Default)]
pub struct FlatIndex {
    entries: Vec<IndexEntry>,
    buffer: String,
    char_len: usize,
}

impl FlatIndex {
    /// Build the index for a document in one pass over its nodes
    pub fn build(document: &Document) -> Self {
        let mut entries = Vec::with_capacity(document.node_count());
        let mut buffer = String::new();
        let mut char_len = 0;

        for node in document.nodes() {
            let normalized_text = normalize(&node.text);
            let start_offset = char_len;
            char_len += normalized_text.chars().count();
            buffer.push_str(&normalized_text);

            entries.push(IndexEntry {
                locator: node.locator.clone(),
                normalized_text,
                start_offset,
                end_offset: char_len,
            });
        }

        tracing::debug!(
            nodes = entries.len(),
            chars = char_len,
            "Built flat document index"
        );

        Self {
            entries,
            buffer,
            char_len,
        }
    }

    pub fn entries(&self) -> &[IndexEntry] {
        &self.entries
    }

    /// The concatenated normalized text of every node
    pub fn buffer(&self) -> &str {
        &self.buffer
    }

    /// Buffer length in characters
    pub fn len(&self) -> usize {
        self.char_len
    }

    pub fn is_empty(&self) -> bool {
        self.char_len == 0
    }

    /// The non-empty entry whose span contains `offset`
    pub fn entry_containing(&self, offset: usize) -> Option<&IndexEntry> {
        let idx = self.entries.partition_point(|e| e.end_offset <= offset);
        self.entries.get(idx).filter(|e| e.contains(offset))
    }

    /// The non-empty entry whose span ends at or after `end`, starting before it
    pub fn entry_ending_at(&self, end: usize) -> Option<&IndexEntry> {
        let idx = self.entries.partition_point(|e| e.end_offset < end);
        self.entries
            .get(idx)
            .filter(|e| e.start_offset < end && end <= e.end_offset)
    }
}
