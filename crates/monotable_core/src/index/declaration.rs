//! User-facing index declarations.

use serde::{Deserialize, Serialize};

/// How a query name maps onto the table's physical indexes.
///
/// Declarations are keyed by a query name (the *tag*) in
/// [`RepositoryConfigBuilder::index`](crate::RepositoryConfigBuilder::index).
///
/// ```json
/// { "type": "local", "which": 2, "sort_key_fields": ["country", "state"] }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum IndexDeclaration {
    /// Another name for the primary index.
    Primary,

    /// A local secondary index sharing the primary partition key.
    Local {
        /// Slot in `0..5`.
        which: u8,
        /// Fields encoded into the slot's sort key.
        sort_key_fields: Vec<String>,
    },

    /// A global secondary index with its own partition key.
    Global {
        /// Slot in `0..20`.
        which: u8,
        /// Fields encoded into the slot's partition key.
        hash_key_fields: Vec<String>,
        /// Fields encoded into the slot's sort key.
        sort_key_fields: Vec<String>,
    },

    /// A global index over attributes the caller writes verbatim.
    CustomGlobal {
        /// Partition key attribute of the physical index.
        hash_key_attribute: String,
        /// Sort key attribute of the physical index.
        sort_key_attribute: String,
        /// Physical index name; defaults to the tag.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        index_name: Option<String>,
    },
}

impl IndexDeclaration {
    /// Declares a local index in slot `which`.
    pub fn local<I, S>(which: u8, sort_key_fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Local {
            which,
            sort_key_fields: sort_key_fields.into_iter().map(Into::into).collect(),
        }
    }

    /// Declares a global index in slot `which`.
    pub fn global<H, S, A, B>(which: u8, hash_key_fields: H, sort_key_fields: S) -> Self
    where
        H: IntoIterator<Item = A>,
        A: Into<String>,
        S: IntoIterator<Item = B>,
        B: Into<String>,
    {
        Self::Global {
            which,
            hash_key_fields: hash_key_fields.into_iter().map(Into::into).collect(),
            sort_key_fields: sort_key_fields.into_iter().map(Into::into).collect(),
        }
    }

    /// Declares a custom global index over two raw attributes.
    pub fn custom_global(
        hash_key_attribute: impl Into<String>,
        sort_key_attribute: impl Into<String>,
    ) -> Self {
        Self::CustomGlobal {
            hash_key_attribute: hash_key_attribute.into(),
            sort_key_attribute: sort_key_attribute.into(),
            index_name: None,
        }
    }

    /// Sets the physical name of a custom global index.
    ///
    /// Has no effect on other declarations.
    #[must_use]
    pub fn with_index_name(mut self, name: impl Into<String>) -> Self {
        if let Self::CustomGlobal { index_name, .. } = &mut self {
            *index_name = Some(name.into());
        }
        self
    }
}
