//! Tagged Cell Identifiers: `relation:token:column`

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::errors::{IdentifierError, IdentifierResult};

/// Separates the three fields of a Tagged Cell Identifier
pub const FIELD_DELIMITER: char = ':';

/// Characters the annotation grammar reserves; never legal inside an identifier
pub const ANNOTATION_RESERVED: [char; 8] = ['(', ')', '[', ']', '{', '}', ',', ';'];

/// True if `c` may not appear inside any identifier field
pub fn is_reserved(c: char) -> bool {
    c == FIELD_DELIMITER || c.is_whitespace() || ANNOTATION_RESERVED.contains(&c)
}

/// Stable, page-wide name of one rendered source cell
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TaggedCellId {
    relation: String,
    token: String,
    column: u32,
}

impl TaggedCellId {
    /// Build an identifier, rejecting fields that would make the encoding ambiguous
    pub fn new(
        relation: impl Into<String>,
        token: impl Into<String>,
        column: u32,
    ) -> IdentifierResult<Self> {
        let relation = relation.into();
        let token = token.into();
        check_field("relation", &relation)?;
        check_field("token", &token)?;
        if column == 0 {
            return Err(IdentifierError::ZeroOrdinal {
                input: format!("{}{}{}{}0", relation, FIELD_DELIMITER, token, FIELD_DELIMITER),
            });
        }
        Ok(Self {
            relation,
            token,
            column,
        })
    }

    pub fn relation(&self) -> &str {
        &self.relation
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    /// 1-indexed column ordinal within the relation's visible columns
    pub fn column(&self) -> u32 {
        self.column
    }

    /// Parse `relation:token:column`
    pub fn parse(input: &str) -> IdentifierResult<Self> {
        let mut fields = input.split(FIELD_DELIMITER);
        let relation = fields.next().unwrap_or_default();
        let token = fields.next().ok_or_else(|| IdentifierError::MissingField {
            field: "token",
            input: input.to_string(),
        })?;
        let column = fields.next().ok_or_else(|| IdentifierError::MissingField {
            field: "column",
            input: input.to_string(),
        })?;
        if fields.next().is_some() {
            return Err(IdentifierError::ExtraField {
                input: input.to_string(),
            });
        }
        let column = parse_ordinal(column, input)?;
        Self::new(relation, token, column).map_err(|err| match err {
            IdentifierError::EmptyField { field, .. } => IdentifierError::EmptyField {
                field,
                input: input.to_string(),
            },
            other => other,
        })
    }
}

impl fmt::Display for TaggedCellId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{}{}{}{}",
            self.relation, FIELD_DELIMITER, self.token, FIELD_DELIMITER, self.column
        )
    }
}

impl FromStr for TaggedCellId {
    type Err = IdentifierError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for TaggedCellId {
    type Error = IdentifierError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<TaggedCellId> for String {
    fn from(id: TaggedCellId) -> Self {
        id.to_string()
    }
}

/// Encode `(relation, token, column)` as its on-page name
pub fn encode_source_id(relation: &str, token: &str, column: u32) -> IdentifierResult<String> {
    TaggedCellId::new(relation, token, column).map(|id| id.to_string())
}

/// Inverse of [`encode_source_id`]
pub fn decode_source_id(input: &str) -> IdentifierResult<TaggedCellId> {
    TaggedCellId::parse(input)
}

/// Parse a 1-indexed ordinal; `input` is the whole string for error context
pub(crate) fn parse_ordinal(value: &str, input: &str) -> IdentifierResult<u32> {
    if value.is_empty() || !value.bytes().all(|b| b.is_ascii_digit()) {
        return Err(IdentifierError::NonNumericOrdinal {
            value: value.to_string(),
            input: input.to_string(),
        });
    }
    let ordinal: u32 = value
        .parse()
        .map_err(|_| IdentifierError::NonNumericOrdinal {
            value: value.to_string(),
            input: input.to_string(),
        })?;
    if ordinal == 0 {
        return Err(IdentifierError::ZeroOrdinal {
            input: input.to_string(),
        });
    }
    Ok(ordinal)
}

fn check_field(field: &'static str, value: &str) -> IdentifierResult<()> {
    if value.is_empty() {
        return Err(IdentifierError::EmptyField {
            field,
            input: value.to_string(),
        });
    }
    if let Some(ch) = value.chars().find(|c| is_reserved(*c)) {
        return Err(IdentifierError::ReservedCharacter {
            field,
            value: value.to_string(),
            ch,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_matches_grammar() {
        assert_eq!(encode_source_id("personnel", "t1", 1).unwrap(), "personnel:t1:1");
    }

    #[test]
    fn test_decode_fields() {
        let id = decode_source_id("personnel:0e9a-44:3").unwrap();
        assert_eq!(id.relation(), "personnel");
        assert_eq!(id.token(), "0e9a-44");
        assert_eq!(id.column(), 3);
    }

    #[test]
    fn test_encode_rejects_reserved_characters() {
        for bad in ["a:b", "a b", "a;b", "a,b", "a(b", "a]b", "a{b"] {
            let err = encode_source_id(bad, "t1", 1).unwrap_err();
            assert!(matches!(err, IdentifierError::ReservedCharacter { field: "relation", .. }), "{bad}");
        }
        assert!(matches!(
            encode_source_id("personnel", "t:1", 1),
            Err(IdentifierError::ReservedCharacter { field: "token", .. })
        ));
    }

    #[test]
    fn test_decode_missing_fields() {
        assert!(matches!(
            decode_source_id("personnel"),
            Err(IdentifierError::MissingField { field: "token", .. })
        ));
        assert!(matches!(
            decode_source_id("personnel:t1"),
            Err(IdentifierError::MissingField { field: "column", .. })
        ));
        assert!(matches!(
            decode_source_id(":t1:1"),
            Err(IdentifierError::EmptyField { field: "relation", .. })
        ));
    }

    #[test]
    fn test_decode_bad_ordinals() {
        assert!(matches!(
            decode_source_id("personnel:t1:x"),
            Err(IdentifierError::NonNumericOrdinal { .. })
        ));
        assert!(matches!(
            decode_source_id("personnel:t1:-1"),
            Err(IdentifierError::NonNumericOrdinal { .. })
        ));
        assert!(matches!(
            decode_source_id("personnel:t1:0"),
            Err(IdentifierError::ZeroOrdinal { .. })
        ));
    }

    #[test]
    fn test_decode_delimiter_imbalance() {
        assert!(matches!(
            decode_source_id("personnel:t1:1:2"),
            Err(IdentifierError::ExtraField { .. })
        ));
    }

    #[test]
    fn test_serde_as_string() {
        let id = TaggedCellId::new("personnel", "t2", 2).unwrap();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"personnel:t2:2\"");
        let back: TaggedCellId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
        assert!(serde_json::from_str::<TaggedCellId>("\"personnel\"").is_err());
    }
}
