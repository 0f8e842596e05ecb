//! CFI range formatting
//!
//! Encodes a match range as a single EPUB CFI range reference by factoring
//! out the structural steps both boundaries share:
//!
//! ```text
//! start  /6/4!/4/2/1   offset 5
//! end    /6/4!/4/6/1   offset 3
//!
//! epubcfi(6/4!/4,/2/1:5,/6/1:3)
//!         │      │      └── end suffix and offset
//!         │      └───────── start suffix and offset
//!         └──────────────── shared structure
//! ```
//!
//! The trailing node index of each locator never counts as shared
//! structure, so both suffixes always name their node.

use std::fmt;
use std::str::FromStr;

use serde::{Serialize, Serializer};
use thiserror::Error;

use super::types::MatchRange;

/// One boundary of a range, relative to the shared structure
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelativePoint {
    pub steps: Vec<String>,
    pub offset: usize,
}

impl fmt::Display for RelativePoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/{}:{}", self.steps.join("/"), self.offset)
    }
}

/// Compact range reference: `epubcfi(<common>,/<start>:<n>,/<end>:<n>)`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RangeReference {
    pub common: Vec<String>,
    pub start: RelativePoint,
    pub end: RelativePoint,
}

impl RangeReference {
    /// Whether the boundaries share any structure at all.
    ///
    /// Ranges inside one well-formed document always share at least the
    /// document root step.
    pub fn has_common_root(&self) -> bool {
        !self.common.is_empty()
    }

    /// Absolute point reference of the range start
    pub fn start_point(&self) -> String {
        self.point(&self.start)
    }

    /// Absolute point reference of the range end
    pub fn end_point(&self) -> String {
        self.point(&self.end)
    }

    fn point(&self, relative: &RelativePoint) -> String {
        if self.common.is_empty() {
            format!("epubcfi({})", relative)
        } else {
            format!("epubcfi(/{}{})", self.common.join("/"), relative)
        }
    }
}

impl fmt::Display for RangeReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "epubcfi({},{},{})",
            self.common.join("/"),
            self.start,
            self.end
        )
    }
}

impl Serialize for RangeReference {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Encode a match range by factoring out the shared structural prefix
pub fn format_range(range: &MatchRange) -> RangeReference {
    let start_steps = range.start_locator.steps();
    let end_steps = range.end_locator.steps();
    let start_structure = &start_steps[..range.start_locator.structural_len()];
    let end_structure = &end_steps[..range.end_locator.structural_len()];

    let shared = start_structure
        .iter()
        .zip(end_structure.iter())
        .take_while(|(a, b)| a == b)
        .count();

    let owned = |steps: &[&str]| steps.iter().map(|s| s.to_string()).collect::<Vec<_>>();

    let reference = RangeReference {
        common: owned(&start_steps[..shared]),
        start: RelativePoint {
            steps: owned(&start_steps[shared..]),
            offset: range.start_offset,
        },
        end: RelativePoint {
            steps: owned(&end_steps[shared..]),
            offset: range.end_offset,
        },
    };

    if !reference.has_common_root() {
        tracing::warn!(
            start = %range.start_locator,
            end = %range.end_locator,
            "Range boundaries share no structure; document may be malformed"
        );
    }

    reference
}

/// Errors parsing a range reference string
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ReferenceParseError {
    #[error("Reference must start with 'epubcfi('")]
    MissingPrefix,

    #[error("Reference must end with ')'")]
    MissingClosingParen,

    #[error("Expected three comma-separated parts, found {0}")]
    InvalidRange(usize),

    #[error("Range boundary must start with '/': {0}")]
    ExpectedStep(String),

    #[error("Invalid character offset in boundary: {0}")]
    InvalidCharacterOffset(String),

    #[error("Unclosed bracket in reference")]
    UnclosedBracket,
}

impl FromStr for RangeReference {
    type Err = ReferenceParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let inner = s
            .trim()
            .strip_prefix("epubcfi(")
            .ok_or(ReferenceParseError::MissingPrefix)?
            .strip_suffix(')')
            .ok_or(ReferenceParseError::MissingClosingParen)?;

        let parts = split_top_level(inner)?;
        let [common, start, end] = parts.as_slice() else {
            return Err(ReferenceParseError::InvalidRange(parts.len()));
        };

        let common = common
            .strip_prefix('/')
            .unwrap_or(*common)
            .split('/')
            .filter(|step| !step.is_empty())
            .map(str::to_string)
            .collect();

        Ok(RangeReference {
            common,
            start: parse_relative(start)?,
            end: parse_relative(end)?,
        })
    }
}

/// Split on commas outside `[...]` assertions, honouring `^` escapes
fn split_top_level(input: &str) -> Result<Vec<&str>, ReferenceParseError> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut escaped = false;
    let mut last = 0;

    for (pos, ch) in input.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match ch {
            '^' => escaped = true,
            '[' => depth += 1,
            ']' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                parts.push(&input[last..pos]);
                last = pos + 1;
            }
            _ => {}
        }
    }

    if depth > 0 {
        return Err(ReferenceParseError::UnclosedBracket);
    }
    parts.push(&input[last..]);
    Ok(parts)
}

fn parse_relative(part: &str) -> Result<RelativePoint, ReferenceParseError> {
    let path = part
        .strip_prefix('/')
        .ok_or_else(|| ReferenceParseError::ExpectedStep(part.to_string()))?;
    let (path, offset) = path
        .rsplit_once(':')
        .ok_or_else(|| ReferenceParseError::InvalidCharacterOffset(part.to_string()))?;
    let offset = offset
        .parse()
        .map_err(|_| ReferenceParseError::InvalidCharacterOffset(part.to_string()))?;

    let steps = if path.is_empty() {
        Vec::new()
    } else {
        path.split('/').map(str::to_string).collect()
    };

    Ok(RelativePoint { steps, offset })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::locator::types::FragmentLocator;

    fn range(start: &str, start_offset: usize, end: &str, end_offset: usize) -> MatchRange {
        MatchRange {
            start_locator: FragmentLocator::new(start),
            start_offset,
            end_locator: FragmentLocator::new(end),
            end_offset,
        }
    }

    #[test]
    fn test_factors_common_prefix() {
        let reference = format_range(&range("/body/2/4", 5, "/body/2/9", 3));
        assert_eq!(reference.to_string(), "epubcfi(body/2,/4:5,/9:3)");
    }

    #[test]
    fn test_same_node_keeps_node_index_in_suffix() {
        let reference = format_range(&range("/6/4!/4/2/1", 3, "/6/4!/4/2/1", 17));
        assert_eq!(reference.to_string(), "epubcfi(6/4!/4/2,/1:3,/1:17)");
    }

    #[test]
    fn test_component_wise_comparison() {
        // /4/2 and /4/20 share only /4
        let reference = format_range(&range("/4/2/1", 0, "/4/20/1", 4));
        assert_eq!(reference.to_string(), "epubcfi(4,/2/1:0,/20/1:4)");
    }

    #[test]
    fn test_different_depths() {
        let reference = format_range(&range("/6/4!/4/2/1", 10, "/6/4!/4/6/2/3", 2));
        assert_eq!(reference.to_string(), "epubcfi(6/4!/4,/2/1:10,/6/2/3:2)");
    }

    #[test]
    fn test_cross_chapter_range() {
        let reference = format_range(&range(
            "/6/4[chap01]!/4/40/1",
            12,
            "/6/6[chap02]!/4/2/1",
            8,
        ));
        assert_eq!(
            reference.to_string(),
            "epubcfi(6,/4[chap01]!/4/40/1:12,/6[chap02]!/4/2/1:8)"
        );
    }

    #[test]
    fn test_locator_offset_suffix_is_ignored() {
        let reference = format_range(&range("/6/2!/4/2/1:0", 5, "/6/2!/4/4/1:0", 3));
        assert_eq!(reference.to_string(), "epubcfi(6/2!/4,/2/1:5,/4/1:3)");
    }

    #[test]
    fn test_no_shared_structure() {
        let reference = format_range(&range("a/1", 1, "b/1", 2));
        assert!(!reference.has_common_root());
        assert_eq!(reference.to_string(), "epubcfi(,/a/1:1,/b/1:2)");
    }

    #[test]
    fn test_start_and_end_points() {
        let reference = format_range(&range("/6/4!/4/2/1", 5, "/6/4!/4/6/1", 3));
        assert_eq!(reference.start_point(), "epubcfi(/6/4!/4/2/1:5)");
        assert_eq!(reference.end_point(), "epubcfi(/6/4!/4/6/1:3)");
    }

    #[test]
    fn test_parse_reference() {
        let reference: RangeReference = "epubcfi(6/4[chap,01]!/4,/2/1:5,/6/1:3)".parse().unwrap();
        assert_eq!(reference.common, vec!["6", "4[chap,01]!", "4"]);
        assert_eq!(reference.start.steps, vec!["2", "1"]);
        assert_eq!(reference.start.offset, 5);
        assert_eq!(reference.end.offset, 3);
        assert_eq!(reference.to_string(), "epubcfi(6/4[chap,01]!/4,/2/1:5,/6/1:3)");
    }

    #[test]
    fn test_parse_formatted_output() {
        let formatted = format_range(&range("/6/4!/4/2/1", 5, "/6/4!/4/6/1", 3));
        let parsed: RangeReference = formatted.to_string().parse().unwrap();
        assert_eq!(parsed, formatted);
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(
            "/6/4!/4,/2:1,/4:2".parse::<RangeReference>(),
            Err(ReferenceParseError::MissingPrefix)
        );
        assert_eq!(
            "epubcfi(6/4,/2:1,/4:2".parse::<RangeReference>(),
            Err(ReferenceParseError::MissingClosingParen)
        );
        assert_eq!(
            "epubcfi(/6/4!/4/2/1:5)".parse::<RangeReference>(),
            Err(ReferenceParseError::InvalidRange(1))
        );
        assert!(matches!(
            "epubcfi(6,/2/1:x,/4:2)".parse::<RangeReference>(),
            Err(ReferenceParseError::InvalidCharacterOffset(_))
        ));
        assert!(matches!(
            "epubcfi(6,2/1:3,/4:2)".parse::<RangeReference>(),
            Err(ReferenceParseError::ExpectedStep(_))
        ));
    }

    #[test]
    fn test_serializes_as_string() {
        let reference = format_range(&range("/body/2/4", 5, "/body/2/9", 3));
        let json = serde_json::to_string(&reference).unwrap();
        assert_eq!(json, "\"epubcfi(body/2,/4:5,/9:3)\"");
    }
}
