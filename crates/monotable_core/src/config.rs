//! Repository configuration.

use monotable_codec::{KeyFormat, DEFAULT_PADDED_NUMBER_LENGTH, DEFAULT_SEPARATOR};
use monotable_storage::TableSchema;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ConfigError;
use crate::index::{IndexDeclaration, IndexDescriptor, IndexSet};
use crate::types::{FieldList, HASH_KEY_ATTRIBUTE, SORT_KEY_ATTRIBUTE};

/// Table used when none is configured.
pub const DEFAULT_TABLE_NAME: &str = "single_table";

/// Widest supported zero padding.
pub const MAX_PADDED_NUMBER_LENGTH: usize = 64;

/// Immutable layout of one object type within a table.
///
/// Built once through [`RepositoryConfig::builder`] and shared by every
/// operation of the repository.
#[derive(Debug, Clone)]
pub struct RepositoryConfig {
    table_name: String,
    object_name: String,
    key_format: KeyFormat,
    indexes: IndexSet,
}

impl RepositoryConfig {
    /// Starts a configuration for records of type `object_name`.
    pub fn builder(object_name: impl Into<String>) -> RepositoryConfigBuilder {
        RepositoryConfigBuilder::new(object_name)
    }

    /// Table holding the records.
    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    /// Object name, the namespace of every key.
    pub fn object_name(&self) -> &str {
        &self.object_name
    }

    /// Separator and padding used for encoded keys.
    pub fn key_format(&self) -> &KeyFormat {
        &self.key_format
    }

    /// All indexes, primary first.
    pub fn indexes(&self) -> &IndexSet {
        &self.indexes
    }

    /// The primary index.
    pub fn primary_index(&self) -> &IndexDescriptor {
        self.indexes.primary()
    }

    /// Looks up an index by query name.
    pub fn index_by_tag(&self, tag: &str) -> Option<&IndexDescriptor> {
        self.indexes.by_tag(tag)
    }

    /// Attributes the formatter derives for secondary indexes.
    pub fn derived_attributes(&self) -> impl Iterator<Item = &str> {
        self.indexes
            .iter()
            .flat_map(IndexDescriptor::derived_attributes)
    }

    /// Physical table definition: primary key plus secondary indexes.
    ///
    /// Aliases of the same physical index appear once.
    pub fn table_schema(&self) -> TableSchema {
        let mut schema = TableSchema {
            table_name: self.table_name.clone(),
            hash_attribute: HASH_KEY_ATTRIBUTE.to_string(),
            sort_attribute: SORT_KEY_ATTRIBUTE.to_string(),
            indexes: Vec::new(),
        };
        for index in self.indexes.iter().filter_map(IndexDescriptor::physical_schema) {
            if schema.index(&index.name).is_none() {
                schema.indexes.push(index);
            }
        }
        schema
    }
}

/// Builder for [`RepositoryConfig`].
#[derive(Debug, Clone)]
pub struct RepositoryConfigBuilder {
    object_name: String,
    table_name: String,
    hash_key_fields: Vec<String>,
    sort_key_fields: Vec<String>,
    separator: String,
    pad_numbers: bool,
    padded_number_length: usize,
    indexes: Vec<(String, IndexDeclaration)>,
}

impl RepositoryConfigBuilder {
    fn new(object_name: impl Into<String>) -> Self {
        Self {
            object_name: object_name.into(),
            table_name: DEFAULT_TABLE_NAME.to_string(),
            hash_key_fields: Vec::new(),
            sort_key_fields: Vec::new(),
            separator: DEFAULT_SEPARATOR.to_string(),
            pad_numbers: true,
            padded_number_length: DEFAULT_PADDED_NUMBER_LENGTH,
            indexes: Vec::new(),
        }
    }

    /// Sets the table name.
    #[must_use]
    pub fn table_name(mut self, name: impl Into<String>) -> Self {
        self.table_name = name.into();
        self
    }

    /// Sets the fields of the primary partition key.
    #[must_use]
    pub fn hash_key_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.hash_key_fields = fields.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the fields of the primary sort key.
    #[must_use]
    pub fn sort_key_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.sort_key_fields = fields.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the composite key separator.
    #[must_use]
    pub fn composite_key_separator(mut self, separator: impl Into<String>) -> Self {
        self.separator = separator.into();
        self
    }

    /// Sets whether integers are zero-padded in keys.
    #[must_use]
    pub fn pad_numbers(mut self, value: bool) -> Self {
        self.pad_numbers = value;
        self
    }

    /// Sets the zero-padding width.
    #[must_use]
    pub fn padded_number_length(mut self, width: usize) -> Self {
        self.padded_number_length = width;
        self
    }

    /// Declares an index under query name `tag`.
    #[must_use]
    pub fn index(mut self, tag: impl Into<String>, declaration: IndexDeclaration) -> Self {
        self.indexes.push((tag.into(), declaration));
        self
    }

    /// Validates the layout.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigError`] found.
    pub fn build(self) -> Result<RepositoryConfig, ConfigError> {
        if self.separator.is_empty() {
            return Err(ConfigError::InvalidSeparator {
                separator: self.separator,
                reason: "must not be empty".into(),
            });
        }
        if self.separator.contains('-') {
            return Err(ConfigError::InvalidSeparator {
                separator: self.separator,
                reason: "must not contain `-`, which joins field names to values".into(),
            });
        }
        check_name(&self.object_name, &self.separator).map_err(|reason| {
            ConfigError::InvalidObjectName {
                name: self.object_name.clone(),
                reason,
            }
        })?;
        if self.table_name.is_empty() {
            return Err(ConfigError::InvalidObjectName {
                name: self.object_name.clone(),
                reason: "table name must not be empty".into(),
            });
        }
        if self.padded_number_length == 0 || self.padded_number_length > MAX_PADDED_NUMBER_LENGTH
        {
            return Err(ConfigError::InvalidPaddingWidth {
                width: self.padded_number_length,
                max: MAX_PADDED_NUMBER_LENGTH,
            });
        }

        let hash = FieldList::new("", self.hash_key_fields)?;
        let sort = FieldList::new("", self.sort_key_fields)?;
        let indexes = IndexSet::build(&self.object_name, &self.separator, hash, sort, &self.indexes)?;

        let key_format = KeyFormat::new(self.separator)
            .with_padding(self.pad_numbers)
            .with_padded_number_length(self.padded_number_length);

        debug!(
            object_name = %self.object_name,
            table = %self.table_name,
            indexes = indexes.len(),
            "built repository config"
        );
        Ok(RepositoryConfig {
            table_name: self.table_name,
            object_name: self.object_name,
            key_format,
            indexes,
        })
    }
}

fn check_name(name: &str, separator: &str) -> Result<(), String> {
    if name.is_empty() {
        return Err("must not be empty".into());
    }
    if name.contains(separator) {
        return Err(format!("contains the separator `{separator}`"));
    }
    Ok(())
}

/// One declared index of a [`RepositoryDefinition`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedIndex {
    /// Query name.
    pub name: String,
    /// The declaration.
    pub index: IndexDeclaration,
}

fn default_table_name() -> String {
    DEFAULT_TABLE_NAME.to_string()
}

fn default_separator() -> String {
    DEFAULT_SEPARATOR.to_string()
}

const fn default_pad_numbers() -> bool {
    true
}

const fn default_padded_number_length() -> usize {
    DEFAULT_PADDED_NUMBER_LENGTH
}

/// Serializable repository layout, for declaring repositories in data.
///
/// ```
/// use monotable_core::RepositoryDefinition;
///
/// let definition: RepositoryDefinition = serde_json::from_str(r#"{
///     "object_name": "User",
///     "hash_key_fields": ["id"],
///     "indexes": [
///         { "name": "byEmail", "index": {
///             "type": "global", "which": 0,
///             "hash_key_fields": ["email"], "sort_key_fields": ["id"] } }
///     ]
/// }"#).unwrap();
///
/// let config = definition.build().unwrap();
/// assert_eq!(config.table_name(), "single_table");
/// assert!(config.index_by_tag("byEmail").is_some());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryDefinition {
    /// Object name.
    pub object_name: String,
    /// Table name.
    #[serde(default = "default_table_name")]
    pub table_name: String,
    /// Primary partition key fields.
    pub hash_key_fields: Vec<String>,
    /// Primary sort key fields.
    #[serde(default)]
    pub sort_key_fields: Vec<String>,
    /// Composite key separator.
    #[serde(default = "default_separator")]
    pub composite_key_separator: String,
    /// Whether integers are zero-padded.
    #[serde(default = "default_pad_numbers")]
    pub pad_numbers: bool,
    /// Zero-padding width.
    #[serde(default = "default_padded_number_length")]
    pub padded_number_length: usize,
    /// Declared indexes, in declaration order.
    #[serde(default)]
    pub indexes: Vec<NamedIndex>,
}

impl RepositoryDefinition {
    /// Converts the definition into a builder.
    pub fn into_builder(self) -> RepositoryConfigBuilder {
        let builder = RepositoryConfig::builder(self.object_name)
            .table_name(self.table_name)
            .hash_key_fields(self.hash_key_fields)
            .sort_key_fields(self.sort_key_fields)
            .composite_key_separator(self.composite_key_separator)
            .pad_numbers(self.pad_numbers)
            .padded_number_length(self.padded_number_length);
        self.indexes
            .into_iter()
            .fold(builder, |builder, named| builder.index(named.name, named.index))
    }

    /// Validates the definition.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigError`] found.
    pub fn build(self) -> Result<RepositoryConfig, ConfigError> {
        self.into_builder().build()
    }
}
