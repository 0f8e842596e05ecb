//! Passage locator
//!
//! Finds a short passage of plain text inside a CFI-annotated book and
//! encodes where it occurs as an EPUB CFI range reference.
//!
//! # Pipeline
//!
//! ```text
//! Document ──▶ FlatIndex ──▶ SpanSearcher ──▶ resolve ──▶ format_range
//!  sections     normalized    leftmost         boundary     epubcfi(common,
//!  of nodes     buffer +      substring        nodes +      /start:n,
//!               node spans    of the query     offsets      /end:n)
//! ```
//!
//! Every stage is a synchronous, pure computation over immutable inputs.
//! A [`Document`] builds its [`FlatIndex`] once and can be shared across
//! threads for concurrent searches.
//!
//! # Usage
//!
//! ```
//! use cfi_locator::locator::{locate, Document, Node, Section};
//!
//! let document = Document::new(vec![Section::new(vec![
//!     Node::new("/6/4!/4/2/1", "hello wo"),
//!     Node::new("/6/4!/4/4/1", "rld today"),
//! ])]);
//!
//! let reference = locate(&document, "world").unwrap();
//! assert_eq!(reference.to_string(), "epubcfi(6/4!/4,/2/1:6,/4/1:3)");
//! ```

mod error;
mod format;
mod index;
mod normalize;
mod resolve;
mod search;
mod types;

pub use error::{LocateError, Result};
pub use format::{format_range, RangeReference, ReferenceParseError, RelativePoint};
pub use index::{FlatIndex, IndexEntry};
pub use normalize::normalize;
pub use resolve::resolve;
pub use search::SpanSearcher;
pub use types::{BufferSpan, Document, FragmentLocator, MatchRange, Node, Section};

/// Locate the first occurrence of `query` and encode it as a range reference
pub fn locate(document: &Document, query: &str) -> Result<RangeReference> {
    let range = SpanSearcher::new(document.index()).search(query)?;
    Ok(format_range(&range))
}

/// Locate up to `limit` occurrences of `query`, leftmost first
pub fn locate_all(document: &Document, query: &str, limit: usize) -> Result<Vec<RangeReference>> {
    let ranges = SpanSearcher::new(document.index()).search_all(query, limit)?;
    Ok(ranges.iter().map(format_range).collect())
}
