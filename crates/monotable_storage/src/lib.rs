//! # Monotable Storage
//!
//! Storage backend contract and implementations for Monotable.
//!
//! This crate provides the lowest-level storage abstraction for Monotable.
//! Storage backends are **opaque item stores** - they hold flat attribute
//! maps keyed by a partition/sort pair and answer range reads against the
//! table and its secondary indexes.
//!
//! ## Design Principles
//!
//! - Backends know key attribute names, never how keys are encoded
//! - All operations are async for non-blocking I/O
//! - Backend errors are surfaced unchanged; retries are the backend's concern
//! - Must be `Send + Sync` for concurrent access
//!
//! ## Available Backends
//!
//! - [`InMemoryBackend`] - For testing and local development
//!
//! ## Example
//!
//! ```rust
//! use monotable_storage::{
//!     InMemoryBackend, KeyCondition, QueryRequest, SortDirection, StorageBackend, TableSchema,
//! };
//! use serde_json::json;
//!
//! # tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(async {
//! let backend = InMemoryBackend::new();
//! backend.ensure_table(&TableSchema {
//!     table_name: "t".into(),
//!     hash_attribute: "pk".into(),
//!     sort_attribute: "sk".into(),
//!     indexes: vec![],
//! }).await.unwrap();
//!
//! let item = json!({"pk": "user#1", "sk": "order#7"});
//! backend.put_item("t", item.as_object().unwrap().clone()).await.unwrap();
//!
//! let page = backend.query(&QueryRequest {
//!     table_name: "t".into(),
//!     index_name: None,
//!     hash_key: KeyCondition { attribute: "pk".into(), value: json!("user#1") },
//!     sort_key_prefix: None,
//!     direction: SortDirection::Asc,
//!     limit: None,
//!     exclusive_start_key: None,
//! }).await.unwrap();
//! assert_eq!(page.items.len(), 1);
//! # });
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod backend;
mod error;
mod memory;
mod types;

pub use backend::{StorageBackend, MAX_BATCH_GET_KEYS, MAX_BATCH_WRITE_REQUESTS};
pub use error::{StorageError, StorageResult};
pub use memory::InMemoryBackend;
pub use types::{
    AttributeMap, BeginsWith, IndexSchema, IndexType, ItemKey, ItemUpdate, KeyCondition,
    QueryPage, QueryRequest, SortDirection, TableSchema, WriteRequest,
};
