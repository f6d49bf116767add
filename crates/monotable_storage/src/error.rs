//! Error types for storage operations.

use thiserror::Error;

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors that can occur during storage operations.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StorageError {
    /// The table does not exist.
    #[error("table not found: {table}")]
    TableNotFound {
        /// The requested table.
        table: String,
    },

    /// The index does not exist on the table.
    #[error("index {index} not found on table {table}")]
    IndexNotFound {
        /// The table searched.
        table: String,
        /// The requested index.
        index: String,
    },

    /// A key is missing, has the wrong type, or names the wrong attributes.
    #[error("invalid key: {message}")]
    InvalidKey {
        /// Description of the problem.
        message: String,
    },

    /// The table exists with a different key schema.
    #[error("schema mismatch on table {table}: {message}")]
    SchemaMismatch {
        /// The table.
        table: String,
        /// Description of the mismatch.
        message: String,
    },

    /// An error reported by the underlying store.
    #[error("backend error: {message}")]
    Backend {
        /// The backend's message.
        message: String,
    },
}

impl StorageError {
    /// Creates a table not found error.
    pub fn table_not_found(table: impl Into<String>) -> Self {
        Self::TableNotFound {
            table: table.into(),
        }
    }

    /// Creates an invalid key error.
    pub fn invalid_key(message: impl Into<String>) -> Self {
        Self::InvalidKey {
            message: message.into(),
        }
    }

    /// Creates a backend error.
    pub fn backend(message: impl Into<String>) -> Self {
        Self::Backend {
            message: message.into(),
        }
    }
}
