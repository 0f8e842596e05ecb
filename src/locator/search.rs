//! Span search over a flat index
//!
//! The query is normalized with the same policy as the node texts and then
//! located with a single leftmost substring scan of the concatenated buffer,
//! so a match may cross any number of node and section boundaries.

use super::error::{LocateError, Result};
use super::index::FlatIndex;
use super::normalize::normalize;
use super::resolve::resolve;
use super::types::{BufferSpan, MatchRange};

/// Searches one document's flat index
#[derive(Debug, Clone, Copy)]
pub struct SpanSearcher<'a> {
    index: &'a FlatIndex,
}

impl<'a> SpanSearcher<'a> {
    pub fn new(index: &'a FlatIndex) -> Self {
        Self { index }
    }

    /// Buffer span of the leftmost occurrence of the query
    pub fn find_span(&self, query: &str) -> Result<BufferSpan> {
        let needle = normalize(query);
        if needle.is_empty() {
            return Err(LocateError::not_found(query));
        }

        let buffer = self.index.buffer();
        let byte_pos = buffer
            .find(&needle)
            .ok_or_else(|| LocateError::not_found(query))?;

        let start = buffer[..byte_pos].chars().count();
        let span = BufferSpan::new(start, needle.chars().count());

        tracing::trace!(start = span.start, len = span.len, "Query matched");
        Ok(span)
    }

    /// Buffer spans of up to `limit` non-overlapping occurrences, leftmost first
    pub fn find_spans(&self, query: &str, limit: usize) -> Vec<BufferSpan> {
        let needle = normalize(query);
        if needle.is_empty() || limit == 0 {
            return Vec::new();
        }

        let needle_len = needle.chars().count();
        let buffer = self.index.buffer();
        let mut spans = Vec::new();
        let mut scanned_bytes = 0;
        let mut scanned_chars = 0;

        for (byte_pos, _) in buffer.match_indices(&needle) {
            scanned_chars += buffer[scanned_bytes..byte_pos].chars().count();
            scanned_bytes = byte_pos;
            spans.push(BufferSpan::new(scanned_chars, needle_len));

            if spans.len() >= limit {
                break;
            }
        }

        spans
    }

    /// Node-local range of the leftmost occurrence of the query
    pub fn search(&self, query: &str) -> Result<MatchRange> {
        let span = self.find_span(query)?;
        resolve(self.index, span)
    }

    /// Node-local ranges of up to `limit` occurrences, leftmost first
    pub fn search_all(&self, query: &str, limit: usize) -> Result<Vec<MatchRange>> {
        self.find_spans(query, limit)
            .into_iter()
            .map(|span| resolve(self.index, span))
            .collect()
    }
}
