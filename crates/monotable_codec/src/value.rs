//! Key field values.

use crate::encoder::KeyFormat;
use crate::error::{FormatError, FormatResult};
use serde_json::Value;

/// A value that may appear inside a composite key.
///
/// Keys are built from a closed set of value types: text and
/// non-negative integers. Everything else is rejected with a
/// [`FormatError`] instead of being coerced to some string form.
///
/// Both types render without a type marker, so a key field must hold
/// one value type across all records. Digit-only text such as `"42"`
/// encodes like the integer `42` (or `00..042` when padded); keys stay
/// unique only among values of the same type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldValue<'a> {
    /// Text, written verbatim.
    Text(&'a str),
    /// Non-negative integer, optionally zero-padded.
    Integer(u64),
}

impl<'a> FieldValue<'a> {
    /// Classifies a JSON value for use in a key.
    ///
    /// `null` is treated the same as an absent field and yields `Ok(None)`.
    ///
    /// # Errors
    ///
    /// Returns an error for booleans, arrays, objects, negative numbers
    /// and non-integer numbers.
    pub fn from_json(field: &str, value: &'a Value) -> FormatResult<Option<Self>> {
        match value {
            Value::Null => Ok(None),
            Value::String(text) => Ok(Some(Self::Text(text))),
            Value::Number(number) => {
                if let Some(n) = number.as_u64() {
                    Ok(Some(Self::Integer(n)))
                } else if number.is_i64() {
                    Err(FormatError::NegativeNumber {
                        field: field.to_string(),
                    })
                } else {
                    Err(FormatError::unsupported_value(field, "non-integer number"))
                }
            }
            Value::Bool(_) => Err(FormatError::unsupported_value(field, "boolean")),
            Value::Array(_) => Err(FormatError::unsupported_value(field, "array")),
            Value::Object(_) => Err(FormatError::unsupported_value(field, "object")),
        }
    }

    /// Renders the value as it appears after `fieldName-` in a key.
    ///
    /// # Errors
    ///
    /// Returns an error if text contains the separator, or if an integer
    /// has more digits than the padding width while padding is enabled.
    pub fn render(&self, field: &str, format: &KeyFormat) -> FormatResult<String> {
        match self {
            Self::Text(text) => {
                if text.contains(format.separator()) {
                    return Err(FormatError::SeparatorInValue {
                        field: field.to_string(),
                        separator: format.separator().to_string(),
                    });
                }
                Ok((*text).to_string())
            }
            Self::Integer(n) => {
                let digits = n.to_string();
                if !format.pad_numbers() {
                    return Ok(digits);
                }
                let width = format.padded_number_length();
                if digits.len() > width {
                    return Err(FormatError::NumberTooWide {
                        field: field.to_string(),
                        width,
                    });
                }
                Ok(format!("{digits:0>width$}"))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn null_is_absent() {
        assert_eq!(FieldValue::from_json("a", &Value::Null).unwrap(), None);
    }

    #[test]
    fn classifies_text_and_integers() {
        let text = json!("couch");
        let num = json!(42);
        assert_eq!(
            FieldValue::from_json("a", &text).unwrap(),
            Some(FieldValue::Text("couch"))
        );
        assert_eq!(
            FieldValue::from_json("a", &num).unwrap(),
            Some(FieldValue::Integer(42))
        );
    }

    #[test]
    fn rejects_negative_and_fractional_numbers() {
        assert!(matches!(
            FieldValue::from_json("n", &json!(-3)),
            Err(FormatError::NegativeNumber { .. })
        ));
        assert!(matches!(
            FieldValue::from_json("n", &json!(1.5)),
            Err(FormatError::UnsupportedValue { kind: "non-integer number", .. })
        ));
    }

    #[test]
    fn rejects_structured_values() {
        for value in [json!(true), json!([1]), json!({"a": 1})] {
            assert!(matches!(
                FieldValue::from_json("x", &value),
                Err(FormatError::UnsupportedValue { .. })
            ));
        }
    }

    #[test]
    fn pads_integers_to_width() {
        let format = KeyFormat::default();
        let rendered = FieldValue::Integer(42).render("n", &format).unwrap();
        assert_eq!(rendered, "00000000000000000042");
        assert_eq!(rendered.len(), 20);
    }

    #[test]
    fn digit_text_renders_like_an_integer() {
        let format = KeyFormat::default().with_padding(false);
        let text = FieldValue::Text("42").render("n", &format).unwrap();
        assert_eq!(text, FieldValue::Integer(42).render("n", &format).unwrap());

        let padded = KeyFormat::default();
        let text = FieldValue::Text("00000000000000000042").render("n", &padded).unwrap();
        assert_eq!(text, FieldValue::Integer(42).render("n", &padded).unwrap());
    }

    #[test]
    fn unpadded_integers_are_plain() {
        let format = KeyFormat::default().with_padding(false);
        assert_eq!(FieldValue::Integer(42).render("n", &format).unwrap(), "42");
    }

    #[test]
    fn too_wide_number_is_rejected() {
        let format = KeyFormat::default().with_padded_number_length(3);
        assert!(matches!(
            FieldValue::Integer(12345).render("n", &format),
            Err(FormatError::NumberTooWide { width: 3, .. })
        ));
    }

    #[test]
    fn separator_in_text_is_rejected() {
        let format = KeyFormat::default();
        assert!(matches!(
            FieldValue::Text("a#b").render("t", &format),
            Err(FormatError::SeparatorInValue { .. })
        ));
    }
}
