//! Mapping buffer spans back onto nodes

use super::error::{LocateError, Result};
use super::index::FlatIndex;
use super::types::{BufferSpan, MatchRange};

/// Resolve a buffer span to its boundary nodes and node-local offsets.
///
/// The start boundary is the node containing `span.start`; the end boundary is
/// the node containing the last matched character. Both may be the same node.
pub fn resolve(index: &FlatIndex, span: BufferSpan) -> Result<MatchRange> {
    if span.is_empty() {
        return Err(LocateError::IllFormedIndex(format!(
            "cannot resolve empty span at offset {}",
            span.start
        )));
    }

    let start = index.entry_containing(span.start).ok_or_else(|| {
        LocateError::IllFormedIndex(format!(
            "no node covers start offset {} (buffer length {})",
            span.start,
            index.len()
        ))
    })?;

    let end = index.entry_ending_at(span.end()).ok_or_else(|| {
        LocateError::IllFormedIndex(format!(
            "no node covers end offset {} (buffer length {})",
            span.end(),
            index.len()
        ))
    })?;

    Ok(MatchRange {
        start_locator: start.locator.clone(),
        start_offset: span.start - start.start_offset,
        end_locator: end.locator.clone(),
        end_offset: span.end() - end.start_offset,
    })
}
