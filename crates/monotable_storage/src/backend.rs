//! Storage backend trait definition.

use async_trait::async_trait;

use crate::error::StorageResult;
use crate::types::{
    AttributeMap, ItemKey, ItemUpdate, QueryPage, QueryRequest, TableSchema, WriteRequest,
};

/// Most keys a single batch read may carry.
pub const MAX_BATCH_GET_KEYS: usize = 100;

/// Most requests a single batch write may carry.
pub const MAX_BATCH_WRITE_REQUESTS: usize = 25;

/// A key-value/wide-column store holding items as flat attribute maps.
///
/// Backends are **opaque item stores**. They know about a table's key
/// attributes and its secondary indexes, and nothing about how keys are
/// encoded. Monotable owns all key interpretation.
///
/// # Invariants
///
/// - `put_item` is an unconditional upsert
/// - `delete_item` of an absent item succeeds
/// - `get_item` of an absent item returns `Ok(None)`
/// - Items lacking an index's key attributes are not visible in that index
/// - `query` returns a `last_evaluated_key` only if more matches remain
/// - Backends must be `Send + Sync` for concurrent access
///
/// Errors are returned as-is to callers; retry policy belongs to the
/// backend implementation, not to Monotable.
///
/// # Implementors
///
/// - [`super::InMemoryBackend`] - For testing and local development
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Creates the table if missing and adds any missing indexes.
    ///
    /// This is provisioning, treated as opaque external setup.
    ///
    /// # Errors
    ///
    /// Returns an error if the table exists with different key attributes.
    async fn ensure_table(&self, schema: &TableSchema) -> StorageResult<()>;

    /// Reads one item by primary key.
    ///
    /// # Errors
    ///
    /// Returns an error if the table is missing or the key is invalid.
    async fn get_item(&self, table: &str, key: &ItemKey) -> StorageResult<Option<AttributeMap>>;

    /// Stores an item, replacing any item with the same primary key.
    ///
    /// Returns the stored item.
    ///
    /// # Errors
    ///
    /// Returns an error if the table is missing or the item lacks its key.
    async fn put_item(&self, table: &str, item: AttributeMap) -> StorageResult<AttributeMap>;

    /// Merges `update` into the item, creating it if absent.
    ///
    /// Returns the item as stored after the update.
    ///
    /// # Errors
    ///
    /// Returns an error if the table is missing or the update touches
    /// the primary key attributes.
    async fn update_item(
        &self,
        table: &str,
        key: &ItemKey,
        update: ItemUpdate,
    ) -> StorageResult<AttributeMap>;

    /// Deletes one item. Deleting an absent item is a no-op.
    ///
    /// # Errors
    ///
    /// Returns an error if the table is missing or the key is invalid.
    async fn delete_item(&self, table: &str, key: &ItemKey) -> StorageResult<()>;

    /// Reads one page from the table or a secondary index.
    ///
    /// # Errors
    ///
    /// Returns an error if the table or index is missing, or the key
    /// conditions name the wrong attributes.
    async fn query(&self, request: &QueryRequest) -> StorageResult<QueryPage>;

    /// Reads several items by primary key, skipping absent ones.
    ///
    /// At most [`MAX_BATCH_GET_KEYS`] keys are passed per call.
    ///
    /// # Errors
    ///
    /// Returns the first error encountered.
    async fn batch_get(&self, table: &str, keys: &[ItemKey]) -> StorageResult<Vec<AttributeMap>> {
        let mut items = Vec::with_capacity(keys.len());
        for key in keys {
            if let Some(item) = self.get_item(table, key).await? {
                items.push(item);
            }
        }
        Ok(items)
    }

    /// Applies several puts and deletes.
    ///
    /// At most [`MAX_BATCH_WRITE_REQUESTS`] requests are passed per call.
    /// The batch is not atomic.
    ///
    /// # Errors
    ///
    /// Returns the first error encountered; earlier requests stay applied.
    async fn batch_write(&self, table: &str, requests: Vec<WriteRequest>) -> StorageResult<()> {
        for request in requests {
            match request {
                WriteRequest::Put(item) => {
                    self.put_item(table, item).await?;
                }
                WriteRequest::Delete(key) => self.delete_item(table, &key).await?,
            }
        }
        Ok(())
    }
}
