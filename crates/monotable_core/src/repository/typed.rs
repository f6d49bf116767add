//! Typed repository implementation.

use std::collections::BTreeSet;
use std::marker::PhantomData;
use std::sync::Arc;

use monotable_storage::{
    ItemUpdate, StorageBackend, WriteRequest, MAX_BATCH_GET_KEYS, MAX_BATCH_WRITE_REQUESTS,
};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use super::query::{Cursor, QueryBuilder};
use crate::config::RepositoryConfig;
use crate::document::to_attributes;
use crate::error::{CoreError, CoreResult, QueryError};
use crate::index::{find_index_for_query, IndexDescriptor};
use crate::types::OBJECT_TYPE_ATTRIBUTE;

/// Records of one object type stored in a shared table.
///
/// `Repository<T>` converts records to stored items through serde and
/// the repository's [`RepositoryConfig`]. Reads and writes by id go
/// through the primary index; [`query`](Self::query) picks an index from
/// the filter fields.
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use monotable_core::{IndexDeclaration, Repository, RepositoryConfig};
/// use monotable_storage::{InMemoryBackend, StorageBackend};
/// use serde::{Deserialize, Serialize};
/// use serde_json::json;
///
/// #[derive(Debug, PartialEq, Serialize, Deserialize)]
/// struct User {
///     id: String,
///     email: String,
/// }
///
/// # tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(async {
/// let config = RepositoryConfig::builder("User")
///     .hash_key_fields(["id"])
///     .index("byEmail", IndexDeclaration::global(0, ["email"], ["id"]))
///     .build()
///     .unwrap();
///
/// let backend = Arc::new(InMemoryBackend::new());
/// backend.ensure_table(&config.table_schema()).await.unwrap();
///
/// let users: Repository<User> = Repository::new(config, backend);
/// users.put(&User { id: "jim".into(), email: "jim@example.com".into() }).await.unwrap();
///
/// let page = users
///     .query()
///     .filter(&json!({"email": "jim@example.com"}))
///     .get()
///     .await
///     .unwrap();
/// assert_eq!(page.results[0].id, "jim");
/// # });
/// ```
pub struct Repository<T> {
    config: Arc<RepositoryConfig>,
    backend: Arc<dyn StorageBackend>,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Clone for Repository<T> {
    fn clone(&self) -> Self {
        Self {
            config: Arc::clone(&self.config),
            backend: Arc::clone(&self.backend),
            _marker: PhantomData,
        }
    }
}

impl<T> std::fmt::Debug for Repository<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Repository")
            .field("object_name", &self.config.object_name())
            .field("table_name", &self.config.table_name())
            .finish_non_exhaustive()
    }
}

impl<T> Repository<T>
where
    T: Serialize + DeserializeOwned + Send + Sync,
{
    /// Creates a repository over `backend`.
    pub fn new(config: RepositoryConfig, backend: Arc<dyn StorageBackend>) -> Self {
        Self::with_shared_config(Arc::new(config), backend)
    }

    /// Creates a repository sharing an existing configuration.
    pub fn with_shared_config(
        config: Arc<RepositoryConfig>,
        backend: Arc<dyn StorageBackend>,
    ) -> Self {
        debug!(
            object_name = config.object_name(),
            table = config.table_name(),
            indexes = config.indexes().len(),
            "opened repository"
        );
        Self {
            config,
            backend,
            _marker: PhantomData,
        }
    }

    /// Returns the configuration.
    pub fn config(&self) -> &RepositoryConfig {
        &self.config
    }

    pub(crate) fn backend(&self) -> &dyn StorageBackend {
        self.backend.as_ref()
    }

    /// Returns the stored form of `record` without writing it.
    ///
    /// # Errors
    ///
    /// Returns an error if the record does not serialize to an object or
    /// a key field cannot be encoded.
    pub fn format(&self, record: &T) -> CoreResult<monotable_storage::AttributeMap> {
        let record = to_attributes(record)?;
        Ok(self.config.format_record(&record)?)
    }

    /// Returns the index a filter over `fields` would read.
    pub fn find_index_for_query<I, S>(&self, fields: I) -> Option<&IndexDescriptor>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let fields: BTreeSet<String> = fields.into_iter().map(Into::into).collect();
        find_index_for_query(self.config.indexes(), &fields).map(|m| m.index)
    }

    /// Reads a record by its primary key fields.
    ///
    /// Returns `None` if no record is stored under the key.
    ///
    /// # Errors
    ///
    /// Returns an error if a primary key field is missing from `id` or
    /// the backend fails.
    pub async fn get<I>(&self, id: &I) -> CoreResult<Option<T>>
    where
        I: Serialize + Sync + ?Sized,
    {
        let key = self.config.primary_key(&to_attributes(id)?)?;
        match self.backend.get_item(self.config.table_name(), &key).await? {
            Some(item) => Ok(Some(self.config.decode_item(item)?)),
            None => Ok(None),
        }
    }

    /// Stores a record, replacing any record with the same key.
    ///
    /// # Errors
    ///
    /// Returns an error if the record cannot be formatted or the backend
    /// fails.
    pub async fn put(&self, record: &T) -> CoreResult<T> {
        let item = self.format(record)?;
        let stored = self.backend.put_item(self.config.table_name(), item).await?;
        self.config.decode_item(stored)
    }

    /// Stores a record, replacing any record with the same key.
    ///
    /// Same as [`put`](Self::put); both are unconditional.
    ///
    /// # Errors
    ///
    /// Returns an error if the record cannot be formatted or the backend
    /// fails.
    pub async fn overwrite(&self, record: &T) -> CoreResult<T> {
        self.put(record).await
    }

    /// Merges `changes` into the record at `id` and re-derives its index
    /// attributes.
    ///
    /// A `null` change removes the field; an index whose hash fields are
    /// no longer all present is dropped from the item. Primary key fields
    /// cannot be changed. If no record exists, one is created from `id`
    /// and `changes`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidOperation`] if `changes` alters a
    /// primary key field, or a format or backend error.
    pub async fn update<I, C>(&self, id: &I, changes: &C) -> CoreResult<T>
    where
        I: Serialize + Sync + ?Sized,
        C: Serialize + Sync + ?Sized,
    {
        let id = to_attributes(id)?;
        let changes = to_attributes(changes)?;
        let key = self.config.primary_key(&id)?;

        let primary = self.config.primary_index();
        for field in primary
            .hash_key_fields()
            .iter()
            .chain(primary.sort_key_fields().iter())
        {
            if let Some(value) = changes.get(field) {
                if id.get(field) != Some(value) {
                    return Err(CoreError::invalid_operation(format!(
                        "update cannot change primary key field `{field}`"
                    )));
                }
            }
        }

        let table = self.config.table_name();
        let mut merged = match self.backend.get_item(table, &key).await? {
            Some(item) => self.config.strip_item(item),
            None => id.clone(),
        };
        let mut update = ItemUpdate::default();
        for (field, value) in &id {
            update.set.insert(field.clone(), value.clone());
        }
        for (field, value) in changes {
            if value.is_null() {
                merged.remove(&field);
                update.remove.push(field);
            } else {
                merged.insert(field.clone(), value.clone());
                update.set.insert(field, value);
            }
        }

        let formatted = self.config.format_record(&merged)?;
        update.set.insert(
            OBJECT_TYPE_ATTRIBUTE.to_string(),
            Value::String(self.config.object_name().to_string()),
        );
        for attribute in self.config.derived_attributes() {
            if let Some(value) = formatted.get(attribute) {
                update.set.insert(attribute.to_string(), value.clone());
            } else {
                update.remove.push(attribute.to_string());
            }
        }

        let stored = self.backend.update_item(table, &key, update).await?;
        self.config.decode_item(stored)
    }

    /// Deletes the record at `id`. Deleting an absent record succeeds.
    ///
    /// # Errors
    ///
    /// Returns an error if a primary key field is missing from `id` or
    /// the backend fails.
    pub async fn delete<I>(&self, id: &I) -> CoreResult<()>
    where
        I: Serialize + Sync + ?Sized,
    {
        let key = self.config.primary_key(&to_attributes(id)?)?;
        Ok(self.backend.delete_item(self.config.table_name(), &key).await?)
    }

    /// Reads several records by id, skipping absent ones.
    ///
    /// # Errors
    ///
    /// Returns an error if any id lacks a primary key field or the
    /// backend fails.
    pub async fn batch_get<I>(&self, ids: &[I]) -> CoreResult<Vec<T>>
    where
        I: Serialize + Sync,
    {
        let keys = ids
            .iter()
            .map(|id| Ok(self.config.primary_key(&to_attributes(id)?)?))
            .collect::<CoreResult<Vec<_>>>()?;

        let mut records = Vec::with_capacity(keys.len());
        for chunk in keys.chunks(MAX_BATCH_GET_KEYS) {
            let items = self
                .backend
                .batch_get(self.config.table_name(), chunk)
                .await?;
            for item in items {
                records.push(self.config.decode_item(item)?);
            }
        }
        Ok(records)
    }

    /// Stores several records.
    ///
    /// Every record is formatted before anything is written. Writes are
    /// not atomic across chunks.
    ///
    /// # Errors
    ///
    /// Returns an error if any record cannot be formatted or the backend
    /// fails.
    pub async fn batch_put(&self, records: &[T]) -> CoreResult<()> {
        let requests = records
            .iter()
            .map(|record| Ok(WriteRequest::Put(self.format(record)?)))
            .collect::<CoreResult<Vec<_>>>()?;
        self.write_chunks(requests).await
    }

    /// Deletes several records by id.
    ///
    /// # Errors
    ///
    /// Returns an error if any id lacks a primary key field or the
    /// backend fails.
    pub async fn batch_delete<I>(&self, ids: &[I]) -> CoreResult<()>
    where
        I: Serialize + Sync,
    {
        let requests = ids
            .iter()
            .map(|id| {
                Ok(WriteRequest::Delete(
                    self.config.primary_key(&to_attributes(id)?)?,
                ))
            })
            .collect::<CoreResult<Vec<_>>>()?;
        self.write_chunks(requests).await
    }

    async fn write_chunks(&self, requests: Vec<WriteRequest>) -> CoreResult<()> {
        for chunk in requests.chunks(MAX_BATCH_WRITE_REQUESTS) {
            self.backend
                .batch_write(self.config.table_name(), chunk.to_vec())
                .await?;
        }
        Ok(())
    }

    /// Starts a query; the index is chosen from the filter fields.
    pub fn query(&self) -> QueryBuilder<'_, T> {
        QueryBuilder::new(self, None)
    }

    /// Starts a query pinned to the index named `tag`.
    pub fn index(&self, tag: impl Into<String>) -> QueryBuilder<'_, T> {
        QueryBuilder::new(self, Some(tag.into()))
    }

    /// Resumes a query from the cursor of a previous page.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::ForeignCursor`] if the cursor was issued for
    /// another object type.
    pub fn resume(&self, cursor: Cursor) -> CoreResult<QueryBuilder<'_, T>> {
        if cursor.object_name() != self.config.object_name() {
            return Err(QueryError::ForeignCursor {
                object_name: cursor.object_name().to_string(),
            }
            .into());
        }
        Ok(QueryBuilder::from_cursor(self, cursor))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::IndexDeclaration;
    use monotable_storage::InMemoryBackend;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    struct Purchase {
        id: String,
        user_id: String,
        item_id: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        purchase_date: Option<u64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        created_at: Option<u64>,
    }

    fn purchase(id: &str, purchase_date: Option<u64>) -> Purchase {
        Purchase {
            id: id.into(),
            user_id: "jim".into(),
            item_id: "couch".into(),
            purchase_date,
            created_at: Some(1),
        }
    }

    fn id_of(p: &Purchase) -> serde_json::Value {
        json!({"userId": p.user_id, "itemId": p.item_id, "id": p.id})
    }

    async fn setup() -> (Arc<InMemoryBackend>, Repository<Purchase>) {
        let config = RepositoryConfig::builder("Purchase")
            .hash_key_fields(["userId"])
            .sort_key_fields(["itemId", "id"])
            .index("byDate", IndexDeclaration::global(0, ["purchaseDate"], ["id"]))
            .build()
            .unwrap();
        let backend = Arc::new(InMemoryBackend::new());
        backend.ensure_table(&config.table_schema()).await.unwrap();
        let repository = Repository::new(config, backend.clone());
        (backend, repository)
    }

    #[tokio::test]
    async fn put_then_get() {
        let (backend, repository) = setup().await;
        let record = purchase("p1", Some(5));
        assert_eq!(repository.put(&record).await.unwrap(), record);

        let found = repository.get(&id_of(&record)).await.unwrap();
        assert_eq!(found, Some(record));

        let items = backend.items("single_table");
        assert_eq!(items.len(), 1);
        assert_eq!(items[0]["__hashKey"], "Purchase#userId-jim");
        assert_eq!(items[0]["__sortKey"], "Purchase#itemId-couch#id-p1");
        assert_eq!(items[0]["__objectType"], "Purchase");
    }

    #[tokio::test]
    async fn get_absent_returns_none() {
        let (_, repository) = setup().await;
        let found = repository
            .get(&json!({"userId": "nobody", "itemId": "x", "id": "y"}))
            .await
            .unwrap();
        assert_eq!(found, None);
    }

    #[tokio::test]
    async fn get_requires_primary_key_fields() {
        let (_, repository) = setup().await;
        let err = repository.get(&json!({"userId": "jim"})).await.unwrap_err();
        assert!(matches!(err, CoreError::Format(_)));
    }

    #[tokio::test]
    async fn overwrite_replaces_record() {
        let (_, repository) = setup().await;
        let record = purchase("p1", Some(5));
        repository.put(&record).await.unwrap();

        let replacement = Purchase {
            purchase_date: None,
            created_at: None,
            ..record.clone()
        };
        repository.overwrite(&replacement).await.unwrap();
        let found = repository.get(&id_of(&record)).await.unwrap();
        assert_eq!(found, Some(replacement));
    }

    #[tokio::test]
    async fn overwrite_twice_matches_once() {
        let (backend, repository) = setup().await;
        let record = purchase("p1", Some(5));

        repository.overwrite(&record).await.unwrap();
        let once = backend.items("single_table");
        repository.overwrite(&record).await.unwrap();
        let twice = backend.items("single_table");

        assert_eq!(once, twice);
        assert_eq!(twice.len(), 1);
        assert_eq!(
            twice[0]["__gsiHash0"],
            "Purchase-byDate#purchaseDate-00000000000000000005"
        );
        assert_eq!(twice[0]["__gsiSort0"], "byDate#id-p1");
    }

    #[tokio::test]
    async fn update_changes_fields() {
        let (_, repository) = setup().await;
        let record = purchase("p1", Some(5));
        repository.put(&record).await.unwrap();

        let updated = repository
            .update(&id_of(&record), &json!({"createdAt": 99}))
            .await
            .unwrap();
        assert_eq!(updated.created_at, Some(99));
        assert_eq!(updated.purchase_date, Some(5));
    }

    #[tokio::test]
    async fn update_rederives_index_membership() {
        let (backend, repository) = setup().await;
        let record = purchase("p1", None);
        repository.put(&record).await.unwrap();
        assert!(!backend.items("single_table")[0].contains_key("__gsiHash0"));

        repository
            .update(&id_of(&record), &json!({"purchaseDate": 5}))
            .await
            .unwrap();
        let items = backend.items("single_table");
        let item = &items[0];
        assert_eq!(
            item["__gsiHash0"],
            "Purchase-byDate#purchaseDate-00000000000000000005"
        );
        assert_eq!(item["__gsiSort0"], "byDate#id-p1");

        let updated = repository
            .update(&id_of(&record), &json!({"purchaseDate": null}))
            .await
            .unwrap();
        assert_eq!(updated.purchase_date, None);
        let items = backend.items("single_table");
        let item = &items[0];
        assert!(!item.contains_key("__gsiHash0"));
        assert!(!item.contains_key("__gsiSort0"));
    }

    #[tokio::test]
    async fn update_rejects_primary_key_change() {
        let (_, repository) = setup().await;
        let record = purchase("p1", None);
        repository.put(&record).await.unwrap();

        let err = repository
            .update(&id_of(&record), &json!({"itemId": "table"}))
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::InvalidOperation { .. }));
    }

    #[tokio::test]
    async fn update_creates_missing_record() {
        let (_, repository) = setup().await;
        let record = purchase("p9", None);
        let created = repository
            .update(&id_of(&record), &json!({"createdAt": 1}))
            .await
            .unwrap();
        assert_eq!(created, record);
        assert_eq!(repository.get(&id_of(&record)).await.unwrap(), Some(record));
    }

    #[tokio::test]
    async fn delete_removes_record_and_tolerates_absence() {
        let (backend, repository) = setup().await;
        let record = purchase("p1", None);
        repository.put(&record).await.unwrap();

        repository.delete(&id_of(&record)).await.unwrap();
        assert_eq!(backend.item_count("single_table"), 0);
        repository.delete(&id_of(&record)).await.unwrap();
    }

    #[tokio::test]
    async fn batch_operations_span_chunks() {
        let (backend, repository) = setup().await;
        let records: Vec<Purchase> = (0..30)
            .map(|i| purchase(&format!("p{i:02}"), Some(i)))
            .collect();
        repository.batch_put(&records).await.unwrap();
        assert_eq!(backend.item_count("single_table"), 30);

        let ids: Vec<serde_json::Value> = records.iter().map(id_of).collect();
        let found = repository.batch_get(&ids).await.unwrap();
        assert_eq!(found, records);

        repository.batch_delete(&ids).await.unwrap();
        assert_eq!(backend.item_count("single_table"), 0);
    }

    #[tokio::test]
    async fn batch_put_formats_everything_first() {
        let (backend, repository) = setup().await;
        let mut bad = purchase("p1", None);
        bad.item_id = "a#b".into();
        let records = vec![purchase("p0", None), bad];

        let err = repository.batch_put(&records).await.unwrap_err();
        assert!(matches!(err, CoreError::Format(_)));
        assert_eq!(backend.item_count("single_table"), 0);
    }

    #[test]
    fn find_index_for_query_uses_field_names() {
        let config = RepositoryConfig::builder("Purchase")
            .hash_key_fields(["userId"])
            .sort_key_fields(["itemId", "id"])
            .index("byDate", IndexDeclaration::global(0, ["purchaseDate"], ["id"]))
            .build()
            .unwrap();
        let repository: Repository<Purchase> =
            Repository::new(config, Arc::new(InMemoryBackend::new()));

        let index = repository.find_index_for_query(["purchaseDate"]).unwrap();
        assert_eq!(index.tag(), "byDate");
        assert!(repository
            .find_index_for_query(["userId", "itemId"])
            .unwrap()
            .is_primary());
        assert!(repository.find_index_for_query(["id"]).is_none());
    }
}
