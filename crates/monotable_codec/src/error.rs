//! Error types for the codec crate.

use thiserror::Error;

/// Result type for key formatting operations.
pub type FormatResult<T> = Result<T, FormatError>;

/// Errors that can occur while encoding or decoding composite keys.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FormatError {
    /// The field holds a value type that cannot be part of a key.
    #[error("field `{field}` holds an unsupported key value ({kind})")]
    UnsupportedValue {
        /// The offending field.
        field: String,
        /// The JSON kind that was found.
        kind: &'static str,
    },

    /// Negative numbers have no order-preserving padded form.
    #[error("field `{field}` holds a negative number")]
    NegativeNumber {
        /// The offending field.
        field: String,
    },

    /// The number has more digits than the configured padding width.
    #[error("field `{field}` does not fit in {width} padded digits")]
    NumberTooWide {
        /// The offending field.
        field: String,
        /// The configured padding width.
        width: usize,
    },

    /// A text value contains the composite key separator.
    #[error("field `{field}` contains the key separator `{separator}`")]
    SeparatorInValue {
        /// The offending field.
        field: String,
        /// The configured separator.
        separator: String,
    },

    /// A field required to persist a record is absent.
    #[error("key field `{field}` is missing")]
    MissingKeyField {
        /// The missing field.
        field: String,
    },

    /// A declared key field is absent while a later one is present.
    #[error("key field `{missing}` is missing but `{present}` after it is present")]
    KeyFieldGap {
        /// The first missing field.
        missing: String,
        /// A later field that is present.
        present: String,
    },

    /// An encoded key does not follow the key grammar.
    #[error("malformed key: {message}")]
    MalformedKey {
        /// Description of the problem.
        message: String,
    },
}

impl FormatError {
    /// Creates an unsupported value error.
    pub fn unsupported_value(field: impl Into<String>, kind: &'static str) -> Self {
        Self::UnsupportedValue {
            field: field.into(),
            kind,
        }
    }

    /// Creates a missing key field error.
    pub fn missing_key_field(field: impl Into<String>) -> Self {
        Self::MissingKeyField {
            field: field.into(),
        }
    }

    /// Creates a malformed key error.
    pub fn malformed_key(message: impl Into<String>) -> Self {
        Self::MalformedKey {
            message: message.into(),
        }
    }
}
