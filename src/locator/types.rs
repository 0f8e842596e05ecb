//! Locator data types
//!
//! The document tree consumed by the locator (as produced by the external CFI
//! generator), the fragment locators attached to its nodes, and the match
//! ranges produced by a search.

use std::fmt;
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};

use super::index::FlatIndex;

/// Identifier of a text node inside the book, e.g. `/6/4[chap01]!/4/2/1`
///
/// The structural path is a `/`-separated sequence of steps; the final numeric
/// step identifies the text node itself. A locator may also carry a resolved
/// `:offset` suffix, which is ignored for structural comparison.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FragmentLocator(String);

impl FragmentLocator {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The locator without any trailing `:offset`
    pub fn point(&self) -> &str {
        match self.0.rsplit_once(':') {
            Some((point, offset))
                if !offset.is_empty() && offset.bytes().all(|b| b.is_ascii_digit()) =>
            {
                point
            }
            _ => &self.0,
        }
    }

    /// Steps of the point, without the leading root separator
    pub fn steps(&self) -> Vec<&str> {
        let point = self.point();
        let point = point.strip_prefix('/').unwrap_or(point);
        if point.is_empty() {
            return Vec::new();
        }
        point.split('/').collect()
    }

    /// Number of leading steps that describe shared structure.
    ///
    /// A trailing all-digit step is the node's own index and is excluded.
    pub fn structural_len(&self) -> usize {
        let steps = self.steps();
        match steps.last() {
            Some(last) if !last.is_empty() && last.bytes().all(|b| b.is_ascii_digit()) => {
                steps.len() - 1
            }
            _ => steps.len(),
        }
    }
}

impl fmt::Display for FragmentLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for FragmentLocator {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

/// Smallest addressable unit of text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    /// Raw extracted text content
    #[serde(rename = "node")]
    pub text: String,
    #[serde(rename = "cfi")]
    pub locator: FragmentLocator,
}

impl Node {
    pub fn new(locator: impl Into<FragmentLocator>, text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            locator: locator.into(),
        }
    }
}

/// Ordered group of nodes (a heading in the generator output)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    #[serde(default)]
    pub content: Vec<Node>,
}

impl Section {
    pub fn new(content: Vec<Node>) -> Self {
        Self { content }
    }
}

/// An immutable, ordered book text tree.
///
/// The flattened search index is built on first use and reused for the
/// lifetime of the document.
#[derive(Debug, Clone)]
pub struct Document {
    sections: Vec<Section>,
    index: OnceLock<FlatIndex>,
}

impl Document {
    pub fn new(sections: Vec<Section>) -> Self {
        Self {
            sections,
            index: OnceLock::new(),
        }
    }

    /// Parse the generator's JSON output (an array of headings)
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        let sections: Vec<Section> = serde_json::from_str(json)?;
        Ok(Self::new(sections))
    }

    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    /// All nodes in document order
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.sections.iter().flat_map(|section| section.content.iter())
    }

    pub fn node_count(&self) -> usize {
        self.sections.iter().map(|section| section.content.len()).sum()
    }

    /// The flattened index, built once per document
    pub fn index(&self) -> &FlatIndex {
        self.index.get_or_init(|| FlatIndex::build(self))
    }
}

impl From<Vec<Section>> for Document {
    fn from(sections: Vec<Section>) -> Self {
        Self::new(sections)
    }
}

/// Half-open character span `[start, start + len)` in the flat buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BufferSpan {
    pub start: usize,
    pub len: usize,
}

impl BufferSpan {
    pub fn new(start: usize, len: usize) -> Self {
        Self { start, len }
    }

    pub fn end(&self) -> usize {
        self.start + self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

/// Result of a successful search, in node-local character offsets
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchRange {
    pub start_locator: FragmentLocator,
    /// Index of the first matched character
    pub start_offset: usize,
    pub end_locator: FragmentLocator,
    /// One past the last matched character
    pub end_offset: usize,
}

impl MatchRange {
    /// Whether both boundaries fall inside the same node
    pub fn is_single_node(&self) -> bool {
        self.start_locator == self.end_locator
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_locator_point_strips_offset() {
        let locator = FragmentLocator::new("/6/4!/4/2/1:12");
        assert_eq!(locator.point(), "/6/4!/4/2/1");

        let locator = FragmentLocator::new("/6/4!/4/2/1");
        assert_eq!(locator.point(), "/6/4!/4/2/1");
    }

    #[test]
    fn test_locator_steps() {
        let locator = FragmentLocator::new("/6/4[chap01]!/4/2/1");
        assert_eq!(locator.steps(), vec!["6", "4[chap01]!", "4", "2", "1"]);
        assert_eq!(locator.structural_len(), 4);

        let locator = FragmentLocator::new("body/2/4");
        assert_eq!(locator.steps(), vec!["body", "2", "4"]);
        assert_eq!(locator.structural_len(), 2);
    }

    #[test]
    fn test_locator_without_numeric_tail_keeps_all_steps() {
        let locator = FragmentLocator::new("/4/2[para]");
        assert_eq!(locator.structural_len(), 2);
        assert!(FragmentLocator::new("").steps().is_empty());
    }

    #[test]
    fn test_document_from_generator_json() {
        let json = r#"[
            {"label": "Chapter 1", "content": [
                {"node": "Call me Ishmael.", "cfi": "/6/2!/4/2/1"},
                {"node": "Some years ago", "cfi": "/6/2!/4/4/1"}
            ]},
            {"content": []}
        ]"#;

        let document = Document::from_json(json).unwrap();
        assert_eq!(document.sections().len(), 2);
        assert_eq!(document.node_count(), 2);

        let first = document.nodes().next().unwrap();
        assert_eq!(first.text, "Call me Ishmael.");
        assert_eq!(first.locator.as_str(), "/6/2!/4/2/1");
    }

    #[test]
    fn test_document_index_is_cached() {
        let document = Document::new(vec![Section::new(vec![Node::new("/4/2/1", "alpha")])]);
        let first = document.index() as *const FlatIndex;
        let second = document.index() as *const FlatIndex;
        assert_eq!(first, second);
    }
}
