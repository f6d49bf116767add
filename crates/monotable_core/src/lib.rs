//! # Monotable Core
//!
//! Single-table layouts for key-value/wide-column stores.
//!
//! Monotable stores many object types in one table. Each type gets a
//! [`RepositoryConfig`] describing its primary key and a fixed set of
//! secondary index slots. This crate provides:
//!
//! - The index model: primary, local, global and custom global indexes
//! - Index selection: picking the index that serves an equality filter
//! - Document formatting: deriving every index attribute of a record
//! - [`Repository<T>`]: typed CRUD, batch operations and paginated queries
//!
//! Key encoding lives in `monotable_codec`; the storage contract and an
//! in-memory backend live in `monotable_storage`.
//!
//! ## Query Model
//!
//! Queries name fields, never indexes. A filter such as
//! `{"userId": "jim", "country": "usa"}` is matched against every index:
//! the hash-key fields must all be present and the remaining fields must
//! form a prefix of the sort-key fields. The best match is read with one
//! range request.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod document;
mod error;
mod index;
mod provision;
mod repository;
mod types;

pub use config::{
    NamedIndex, RepositoryConfig, RepositoryConfigBuilder, RepositoryDefinition,
    DEFAULT_TABLE_NAME, MAX_PADDED_NUMBER_LENGTH,
};
pub use document::to_attributes;
pub use error::{ConfigError, CoreError, CoreResult, QueryError};
pub use index::{
    find_index_for_query, match_index, IndexDeclaration, IndexDescriptor, IndexKind, IndexMatch,
    IndexSet, MatchFailure, HASH_MATCH_WEIGHT, RESERVED_ATTRIBUTE_PREFIX,
};
pub use provision::{ensure_tables, merged_schemas};
pub use repository::{Cursor, QueryBuilder, QueryResults, Repository};
pub use types::{
    FieldList, GlobalSlot, LocalSlot, GLOBAL_SLOT_COUNT, HASH_KEY_ATTRIBUTE, LOCAL_SLOT_COUNT,
    OBJECT_TYPE_ATTRIBUTE, SORT_KEY_ATTRIBUTE,
};

// Re-export the layers below for convenience.
pub use monotable_codec::{FormatError, FormatResult, KeyFormat};
pub use monotable_storage::{AttributeMap, SortDirection, StorageBackend, StorageError};
