use serde::{Deserialize, Serialize};
use std::fmt;

/// Type discriminator of a static field, stored as an INTEGER code.
///
/// Codes that no build of the editor produced are kept as `Unknown` rather
/// than rejected, so rows written by other tools still load; the materializer
/// renders them with its default constructor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "i64", into = "i64")]
pub enum FieldType {
    Bool,
    Text,
    TextArea,
    File,
    Unknown(i64),
}

impl FieldType {
    /// The types offered in the editor, in display order.
    pub const PREDEFINED: [FieldType; 4] = [Self::Bool, Self::Text, Self::TextArea, Self::File];

    pub fn code(&self) -> i64 {
        match self {
            Self::Bool => 0,
            Self::Text => 1,
            Self::TextArea => 2,
            Self::File => 3,
            Self::Unknown(code) => *code,
        }
    }

    pub fn from_code(code: i64) -> Self {
        match code {
            0 => Self::Bool,
            1 => Self::Text,
            2 => Self::TextArea,
            3 => Self::File,
            other => Self::Unknown(other),
        }
    }

    /// Whether an editor type token names a static type code rather than a
    /// select-field label. Only non-empty all-digit tokens do.
    pub fn is_type_token(token: &str) -> bool {
        !token.is_empty() && token.bytes().all(|b| b.is_ascii_digit())
    }

    /// Parse an editor type token. `None` for non-codes and codes that
    /// overflow the stored integer.
    pub fn parse_token(token: &str) -> Option<Self> {
        if !Self::is_type_token(token) {
            return None;
        }
        token.parse::<i64>().ok().map(Self::from_code)
    }

    /// Human-readable name shown in the editor's type picker.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Bool => "Checkbox",
            Self::Text => "Text field",
            Self::TextArea => "HTML field",
            Self::File => "Image",
            Self::Unknown(_) => "Unknown",
        }
    }
}

impl From<i64> for FieldType {
    fn from(code: i64) -> Self {
        Self::from_code(code)
    }
}

impl From<FieldType> for i64 {
    fn from(field_type: FieldType) -> Self {
        field_type.code()
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_stable() {
        for field_type in FieldType::PREDEFINED {
            assert_eq!(FieldType::from_code(field_type.code()), field_type);
        }
        assert_eq!(FieldType::from_code(42), FieldType::Unknown(42));
        assert_eq!(FieldType::Unknown(42).code(), 42);
    }

    #[test]
    fn only_digit_tokens_parse() {
        assert_eq!(FieldType::parse_token("1"), Some(FieldType::Text));
        assert_eq!(FieldType::parse_token("07"), Some(FieldType::Unknown(7)));
        assert_eq!(FieldType::parse_token(""), None);
        assert_eq!(FieldType::parse_token("-1"), None);
        assert_eq!(FieldType::parse_token("Color"), None);
        assert_eq!(FieldType::parse_token("1a"), None);
        assert!(FieldType::is_type_token("99999999999999999999"));
        assert_eq!(FieldType::parse_token("99999999999999999999"), None);
    }
}
