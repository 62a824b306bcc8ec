//! Provenance annotation grammar, version 1
//!
//! ```text
//! annotation := ""                                  (no provenance)
//!             | open [ group ( "," group )* ] close
//! group      := open [ id ( ";" id )* ] close
//! id         := relation ":" token ":" column       (see identifier)
//! open/close := "(" ")" | "[" "]" | "{" "}"         (must pair up)
//! ```
//!
//! The engine emits `{[a;b],[c]}`; the panel emits `((a;b),(c))`. Both parse
//! to the same value. Whitespace around groups and identifiers is ignored.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::errors::{AnnotationError, AnnotationResult};
use crate::identifier::TaggedCellId;

/// Version tag of the grammar above
pub const ANNOTATION_GRAMMAR_VERSION: u8 = 1;

/// Separates correlation groups at depth 0
pub const GROUP_SEPARATOR: char = ',';

/// Separates identifiers inside a group
pub const ID_SEPARATOR: char = ';';

fn closer_for(open: char) -> Option<char> {
    match open {
        '(' => Some(')'),
        '[' => Some(']'),
        '{' => Some('}'),
        _ => None,
    }
}

fn is_closer(c: char) -> bool {
    matches!(c, ')' | ']' | '}')
}

fn is_delimiter(c: char) -> bool {
    closer_for(c).is_some() || is_closer(c)
}

/// Source cells explaining one output column of one output row
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CorrelationGroup(BTreeSet<TaggedCellId>);

impl CorrelationGroup {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ids(&self) -> &BTreeSet<TaggedCellId> {
        &self.0
    }

    pub fn into_ids(self) -> BTreeSet<TaggedCellId> {
        self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

impl FromIterator<TaggedCellId> for CorrelationGroup {
    fn from_iter<I: IntoIterator<Item = TaggedCellId>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Ordered correlation groups of one output row; group `i` explains column `i + 1`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProvenanceAnnotation {
    #[serde(default = "grammar_version")]
    pub version: u8,
    pub groups: Vec<CorrelationGroup>,
}

fn grammar_version() -> u8 {
    ANNOTATION_GRAMMAR_VERSION
}

impl ProvenanceAnnotation {
    pub fn new(groups: Vec<CorrelationGroup>) -> Self {
        Self {
            version: ANNOTATION_GRAMMAR_VERSION,
            groups,
        }
    }

    /// Group explaining the 1-indexed output `column`, if the annotation has one
    pub fn group_for_column(&self, column: u32) -> Option<&CorrelationGroup> {
        let index = usize::try_from(column.checked_sub(1)?).ok()?;
        self.groups.get(index)
    }

    /// Parse an annotation string
    pub fn parse(input: &str) -> AnnotationResult<Self> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Ok(Self::default());
        }

        let body = strip_enclosing(trimmed)?;
        if body.trim().is_empty() {
            return Ok(Self::default());
        }

        let groups = split_top_level(body)?
            .into_iter()
            .map(parse_group)
            .collect::<AnnotationResult<Vec<_>>>()?;
        Ok(Self::new(groups))
    }

    /// Encode in the parenthesized dialect
    pub fn encode(&self) -> String {
        self.to_string()
    }
}

impl Default for ProvenanceAnnotation {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl fmt::Display for ProvenanceAnnotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("(")?;
        for (i, group) in self.groups.iter().enumerate() {
            if i > 0 {
                write!(f, "{}", GROUP_SEPARATOR)?;
            }
            f.write_str("(")?;
            for (j, id) in group.ids().iter().enumerate() {
                if j > 0 {
                    write!(f, "{}", ID_SEPARATOR)?;
                }
                write!(f, "{}", id)?;
            }
            f.write_str(")")?;
        }
        f.write_str(")")
    }
}

impl FromStr for ProvenanceAnnotation {
    type Err = AnnotationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Remove one matching outer delimiter pair
fn strip_enclosing(input: &str) -> AnnotationResult<&str> {
    let open = input.chars().next().unwrap_or_default();
    let close = closer_for(open).ok_or_else(|| AnnotationError::MissingEnclosure {
        input: input.to_string(),
    })?;
    if input.len() < 2 || !input.ends_with(close) {
        return Err(AnnotationError::Unclosed {
            expected: close,
            input: input.to_string(),
        });
    }
    Ok(&input[open.len_utf8()..input.len() - close.len_utf8()])
}

/// Split on group separators at nesting depth 0, checking that every
/// delimiter pairs up
fn split_top_level(input: &str) -> AnnotationResult<Vec<&str>> {
    let mut expected_closers: Vec<char> = Vec::new();
    let mut parts = Vec::new();
    let mut start = 0;

    for (offset, c) in input.char_indices() {
        if let Some(close) = closer_for(c) {
            expected_closers.push(close);
        } else if is_closer(c) {
            match expected_closers.pop() {
                Some(expected) if expected == c => {}
                Some(expected) => {
                    return Err(AnnotationError::MismatchedDelimiter {
                        expected,
                        found: c,
                        offset,
                        input: input.to_string(),
                    })
                }
                None => {
                    return Err(AnnotationError::UnexpectedCloser {
                        found: c,
                        offset,
                        input: input.to_string(),
                    })
                }
            }
        } else if c == GROUP_SEPARATOR && expected_closers.is_empty() {
            parts.push(&input[start..offset]);
            start = offset + c.len_utf8();
        }
    }

    if let Some(expected) = expected_closers.pop() {
        return Err(AnnotationError::Unclosed {
            expected,
            input: input.to_string(),
        });
    }
    parts.push(&input[start..]);
    Ok(parts)
}

fn parse_group(raw: &str) -> AnnotationResult<CorrelationGroup> {
    let raw = raw.trim();
    let body = strip_enclosing(raw)?;
    if body.chars().any(is_delimiter) {
        return Err(AnnotationError::NestedGroup {
            group: raw.to_string(),
        });
    }
    if body.trim().is_empty() {
        return Ok(CorrelationGroup::new());
    }

    body.split(ID_SEPARATOR)
        .map(|id| {
            let id = id.trim();
            if id.is_empty() {
                return Err(AnnotationError::EmptyIdentifier {
                    group: raw.to_string(),
                });
            }
            Ok(TaggedCellId::parse(id)?)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(s: &str) -> TaggedCellId {
        TaggedCellId::parse(s).unwrap()
    }

    #[test]
    fn test_parse_panel_dialect() {
        let a = ProvenanceAnnotation::parse("((personnel:t1:1;personnel:t2:1),(personnel:t1:2))").unwrap();
        assert_eq!(a.version, ANNOTATION_GRAMMAR_VERSION);
        assert_eq!(a.groups.len(), 2);
        assert_eq!(a.groups[0].len(), 2);
        assert!(a.groups[1].ids().contains(&id("personnel:t1:2")));
    }

    #[test]
    fn test_parse_engine_dialect() {
        let engine = ProvenanceAnnotation::parse("{[personnel:t1:1;personnel:t2:1],[personnel:t1:2]}").unwrap();
        let panel = ProvenanceAnnotation::parse("((personnel:t1:1;personnel:t2:1),(personnel:t1:2))").unwrap();
        assert_eq!(engine, panel);
    }

    #[test]
    fn test_empty_forms() {
        assert!(ProvenanceAnnotation::parse("").unwrap().groups.is_empty());
        assert!(ProvenanceAnnotation::parse("   ").unwrap().groups.is_empty());
        assert!(ProvenanceAnnotation::parse("()").unwrap().groups.is_empty());
        assert!(ProvenanceAnnotation::parse("{}").unwrap().groups.is_empty());

        let one_empty = ProvenanceAnnotation::parse("(())").unwrap();
        assert_eq!(one_empty.groups.len(), 1);
        assert!(one_empty.groups[0].is_empty());

        let mixed = ProvenanceAnnotation::parse("((),(r:t:2))").unwrap();
        assert!(mixed.groups[0].is_empty());
        assert_eq!(mixed.groups[1].len(), 1);
    }

    #[test]
    fn test_duplicates_collapse() {
        let a = ProvenanceAnnotation::parse("((r:t:1;r:t:1))").unwrap();
        assert_eq!(a.groups[0].len(), 1);
    }

    #[test]
    fn test_whitespace_tolerated() {
        let a = ProvenanceAnnotation::parse(" ( ( r:t:1 ; r:u:1 ) , ( ) ) ").unwrap();
        assert_eq!(a.groups.len(), 2);
        assert_eq!(a.groups[0].len(), 2);
    }

    #[test]
    fn test_unbalanced_is_malformed() {
        assert!(matches!(
            ProvenanceAnnotation::parse("(a;b"),
            Err(AnnotationError::Unclosed { expected: ')', .. })
        ));
        assert!(matches!(
            ProvenanceAnnotation::parse("((r:t:1)"),
            Err(AnnotationError::Unclosed { .. })
        ));
        assert!(matches!(
            ProvenanceAnnotation::parse("((r:t:1)))"),
            Err(AnnotationError::UnexpectedCloser { .. })
        ));
        assert!(matches!(
            ProvenanceAnnotation::parse("((r:t:1]),(r:t:2))"),
            Err(AnnotationError::MismatchedDelimiter { expected: ')', found: ']', .. })
        ));
    }

    #[test]
    fn test_structural_errors() {
        assert!(matches!(
            ProvenanceAnnotation::parse("r:t:1"),
            Err(AnnotationError::MissingEnclosure { .. })
        ));
        assert!(matches!(
            ProvenanceAnnotation::parse("(r:t:1)"),
            Err(AnnotationError::MissingEnclosure { .. })
        ));
        assert!(matches!(
            ProvenanceAnnotation::parse("(((r:t:1)))"),
            Err(AnnotationError::NestedGroup { .. })
        ));
        assert!(matches!(
            ProvenanceAnnotation::parse("((r:t:1;;r:t:2))"),
            Err(AnnotationError::EmptyIdentifier { .. })
        ));
        assert!(matches!(
            ProvenanceAnnotation::parse("((r:t))"),
            Err(AnnotationError::Identifier(_))
        ));
    }

    #[test]
    fn test_separator_inside_group_is_not_a_group_boundary() {
        // A comma nested inside a group must not split groups; it then fails
        // identifier validation instead of silently shifting columns.
        assert!(matches!(
            ProvenanceAnnotation::parse("((r:t:1,r:t:2),(r:t:3))"),
            Err(AnnotationError::Identifier(_))
        ));
    }

    #[test]
    fn test_group_for_column_is_one_indexed() {
        let a = ProvenanceAnnotation::parse("((a:t:1),(b:t:2),(c:t:3))").unwrap();
        assert!(a.group_for_column(0).is_none());
        assert!(a.group_for_column(2).unwrap().ids().contains(&id("b:t:2")));
        assert!(a.group_for_column(4).is_none());
    }

    #[test]
    fn test_encode_panel_dialect() {
        let a = ProvenanceAnnotation::parse("{[r:u:1;r:t:1],[]}").unwrap();
        assert_eq!(a.encode(), "((r:t:1;r:u:1),())");
        assert_eq!(ProvenanceAnnotation::default().encode(), "()");
    }

    #[test]
    fn test_json_shape() {
        let a = ProvenanceAnnotation::parse("((r:t:1),())").unwrap();
        let json = serde_json::to_value(&a).unwrap();
        assert_eq!(json, serde_json::json!({"version": 1, "groups": [["r:t:1"], []]}));
    }
}
