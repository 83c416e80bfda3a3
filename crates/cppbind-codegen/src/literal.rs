//! Rendering of attribute values as C# literals.

use crate::attributes::{AttributeKind, AttributeRecord};
use crate::{CodegenError, Result};

/// Render a classified attribute value as a target-language literal.
///
/// Strings are wrapped in double quotes as-is; any escaping beyond what the
/// tokenizer preserved is up to the caller.
pub fn format_literal(value: &str, kind: AttributeKind) -> Result<String> {
    match kind {
        AttributeKind::Nil => Err(CodegenError::InvalidAttributeKind {
            value: value.to_string(),
        }),
        AttributeKind::String => Ok(format!("\"{}\"", value)),
        AttributeKind::Bool => Ok(value.to_lowercase()),
        AttributeKind::Int | AttributeKind::Double => Ok(value.to_string()),
    }
}

impl AttributeRecord {
    /// The record's value as a target-language literal.
    pub fn literal(&self) -> Result<String> {
        format_literal(&self.value, self.kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attributes::parse_attributes;

    #[test]
    fn test_string_is_quoted() {
        assert_eq!(
            format_literal("hello, world", AttributeKind::String).unwrap(),
            "\"hello, world\""
        );
    }

    #[test]
    fn test_bool_is_lowercased() {
        assert_eq!(format_literal("TRUE", AttributeKind::Bool).unwrap(), "true");
        assert_eq!(format_literal("False", AttributeKind::Bool).unwrap(), "false");
    }

    #[test]
    fn test_numbers_pass_through() {
        assert_eq!(format_literal("42", AttributeKind::Int).unwrap(), "42");
        assert_eq!(format_literal("3.14", AttributeKind::Double).unwrap(), "3.14");
        assert_eq!(format_literal("10abc", AttributeKind::Int).unwrap(), "10abc");
    }

    #[test]
    fn test_nil_is_rejected() {
        let err = format_literal("x", AttributeKind::Nil).unwrap_err();
        assert!(matches!(err, CodegenError::InvalidAttributeKind { .. }));
    }

    #[test]
    fn test_record_literal() {
        let records = parse_attributes(r#"msg="hello, world", ok=TRUE"#);
        let literals: Vec<_> = records.iter().map(|r| r.literal().unwrap()).collect();
        assert_eq!(literals, vec!["\"hello, world\"", "true"]);
    }
}
