//! Error types for Monotable core.

use thiserror::Error;

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur in Monotable core operations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// The repository configuration is invalid.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// No index can serve the query.
    #[error("query error: {0}")]
    Query(#[from] QueryError),

    /// A record could not be formatted for storage.
    #[error("format error: {0}")]
    Format(#[from] monotable_codec::FormatError),

    /// Storage backend error, passed through unchanged.
    #[error("storage error: {0}")]
    Storage(#[from] monotable_storage::StorageError),

    /// A record could not be converted to or from an attribute map.
    #[error("serialization error: {message}")]
    Serialization {
        /// Description of the failure.
        message: String,
    },

    /// Operation not permitted on this repository.
    #[error("invalid operation: {message}")]
    InvalidOperation {
        /// Description of why the operation is invalid.
        message: String,
    },
}

impl CoreError {
    /// Creates a serialization error.
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::Serialization {
            message: message.into(),
        }
    }

    /// Creates an invalid operation error.
    pub fn invalid_operation(message: impl Into<String>) -> Self {
        Self::InvalidOperation {
            message: message.into(),
        }
    }
}

impl From<serde_json::Error> for CoreError {
    fn from(err: serde_json::Error) -> Self {
        Self::serialization(err.to_string())
    }
}

/// Errors raised while building a repository configuration.
///
/// These are fatal to the repository being built.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// The object name is empty or contains the separator.
    #[error("invalid object name `{name}`: {reason}")]
    InvalidObjectName {
        /// The object name.
        name: String,
        /// Why it was rejected.
        reason: String,
    },

    /// The composite key separator cannot delimit key segments.
    #[error("invalid composite key separator `{separator}`: {reason}")]
    InvalidSeparator {
        /// The rejected separator.
        separator: String,
        /// Why it was rejected.
        reason: String,
    },

    /// The padding width is outside the supported range.
    #[error("padded number length {width} is outside 1..={max}")]
    InvalidPaddingWidth {
        /// The requested width.
        width: usize,
        /// The largest supported width.
        max: usize,
    },

    /// A field list is empty or repeats a field.
    #[error("invalid field list for `{query}`: {reason}")]
    InvalidFieldList {
        /// Query name, or empty for the primary key.
        query: String,
        /// Why it was rejected.
        reason: String,
    },

    /// An index declaration is malformed.
    #[error("index `{query}` is not valid: {reason}")]
    InvalidIndex {
        /// The offending query name.
        query: String,
        /// Why it was rejected.
        reason: String,
    },

    /// A slot number is outside the range for its index kind.
    #[error("index `{query}` uses {kind} slot {slot}, valid slots are 0..={max}")]
    SlotOutOfRange {
        /// The offending query name.
        query: String,
        /// "local" or "global".
        kind: &'static str,
        /// The requested slot.
        slot: u8,
        /// The highest valid slot.
        max: u8,
    },

    /// Two indexes of the same kind claim one slot.
    #[error("index `{query}` reuses {kind} slot {slot} already taken by `{taken_by}`")]
    SlotInUse {
        /// The offending query name.
        query: String,
        /// "local" or "global".
        kind: &'static str,
        /// The contested slot.
        slot: u8,
        /// The query that claimed the slot first.
        taken_by: String,
    },

    /// Two indexes share a tag.
    #[error("duplicate index tag `{tag}`")]
    DuplicateTag {
        /// The repeated tag.
        tag: String,
    },
}

impl ConfigError {
    /// Creates an invalid index error.
    pub fn invalid_index(query: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidIndex {
            query: query.into(),
            reason: reason.into(),
        }
    }

    /// Creates an invalid field list error.
    pub fn invalid_field_list(query: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidFieldList {
            query: query.into(),
            reason: reason.into(),
        }
    }
}

/// Errors raised when executing a query.
///
/// These are recoverable: retry with a different filter or index.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum QueryError {
    /// The query was executed without a filter.
    #[error("query has no filter")]
    MissingFilter,

    /// No index is keyed on the supplied filter fields.
    #[error("no index matches filter fields {fields:?}")]
    NoMatchingIndex {
        /// The supplied filter fields, sorted.
        fields: Vec<String>,
    },

    /// The named index does not exist.
    #[error("unknown index `{tag}`")]
    UnknownIndex {
        /// The requested tag.
        tag: String,
    },

    /// The named index cannot serve the supplied filter.
    #[error("index `{tag}` cannot serve this filter: {reason}")]
    IndexMismatch {
        /// The requested tag.
        tag: String,
        /// Why the filter does not fit.
        reason: String,
    },

    /// The filter is not a flat object.
    #[error("filter must be an object of field values")]
    InvalidFilter,

    /// The cursor was issued by a repository for another object type.
    #[error("cursor belongs to `{object_name}`")]
    ForeignCursor {
        /// Object name recorded in the cursor.
        object_name: String,
    },
}
