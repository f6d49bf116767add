//! In-memory storage backend for testing.

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use parking_lot::RwLock;
use serde_json::Value;
use tracing::trace;

use crate::backend::StorageBackend;
use crate::error::{StorageError, StorageResult};
use crate::types::{
    AttributeMap, ItemKey, ItemUpdate, QueryPage, QueryRequest, SortDirection, TableSchema,
};

/// Primary key of a stored item: (partition value, sort value).
type PrimaryKey = (String, String);

#[derive(Debug)]
struct Table {
    schema: TableSchema,
    items: BTreeMap<PrimaryKey, AttributeMap>,
}

impl Table {
    fn new(schema: TableSchema) -> Self {
        Self {
            schema,
            items: BTreeMap::new(),
        }
    }

    fn check_key(&self, key: &ItemKey) -> StorageResult<PrimaryKey> {
        if key.hash_attribute != self.schema.hash_attribute
            || key.sort_attribute != self.schema.sort_attribute
        {
            return Err(StorageError::invalid_key(format!(
                "key names ({}, {}) but table {} is keyed on ({}, {})",
                key.hash_attribute,
                key.sort_attribute,
                self.schema.table_name,
                self.schema.hash_attribute,
                self.schema.sort_attribute
            )));
        }
        Ok((key.hash_value.clone(), key.sort_value.clone()))
    }

    fn primary_key_of(&self, item: &AttributeMap) -> StorageResult<PrimaryKey> {
        let hash = string_attribute(item, &self.schema.hash_attribute)?;
        let sort = string_attribute(item, &self.schema.sort_attribute)?;
        Ok((hash.to_string(), sort.to_string()))
    }

    /// Partition and sort attributes read by `index_name`.
    fn key_attributes(&self, index_name: Option<&str>) -> StorageResult<(&str, &str)> {
        match index_name {
            None => Ok((
                self.schema.hash_attribute.as_str(),
                self.schema.sort_attribute.as_str(),
            )),
            Some(name) => {
                let index = self
                    .schema
                    .index(name)
                    .ok_or_else(|| StorageError::IndexNotFound {
                        table: self.schema.table_name.clone(),
                        index: name.to_string(),
                    })?;
                Ok((index.hash_attribute.as_str(), index.sort_attribute.as_str()))
            }
        }
    }

    /// Key attributes of `item` that identify its position in an index.
    fn position_key(&self, item: &AttributeMap, sort_attribute: &str) -> AttributeMap {
        let mut key = AttributeMap::new();
        for attribute in [
            self.schema.hash_attribute.as_str(),
            self.schema.sort_attribute.as_str(),
            sort_attribute,
        ] {
            if let Some(value) = item.get(attribute) {
                key.insert(attribute.to_string(), value.clone());
            }
        }
        key
    }

    fn position_of(&self, key: &AttributeMap, sort_attribute: &str) -> StorageResult<Position> {
        let sort = key.get(sort_attribute).cloned().ok_or_else(|| {
            StorageError::invalid_key(format!("start key lacks `{sort_attribute}`"))
        })?;
        Ok(Position {
            sort,
            primary: self.primary_key_of(key)?,
        })
    }
}

/// Ordering of an item within one index.
#[derive(Debug, Clone)]
struct Position {
    sort: Value,
    primary: PrimaryKey,
}

impl Position {
    fn order(&self, other: &Self) -> Ordering {
        compare_values(&self.sort, &other.sort).then_with(|| self.primary.cmp(&other.primary))
    }
}

/// An in-memory storage backend.
///
/// This backend keeps every table in memory and is suitable for:
/// - Unit tests
/// - Integration tests
/// - Local development without a remote store
///
/// Secondary indexes are evaluated at query time by scanning the table,
/// so items missing an index's attributes are naturally absent from it.
///
/// # Thread Safety
///
/// This backend is thread-safe and can be shared across tasks.
///
/// # Example
///
/// ```rust
/// use monotable_storage::{InMemoryBackend, ItemKey, StorageBackend, TableSchema};
/// use serde_json::json;
///
/// # tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(async {
/// let backend = InMemoryBackend::new();
/// backend.ensure_table(&TableSchema {
///     table_name: "t".into(),
///     hash_attribute: "pk".into(),
///     sort_attribute: "sk".into(),
///     indexes: vec![],
/// }).await.unwrap();
///
/// let item = json!({"pk": "a", "sk": "b", "n": 1}).as_object().unwrap().clone();
/// backend.put_item("t", item.clone()).await.unwrap();
///
/// let key = ItemKey::new("pk", "a", "sk", "b");
/// assert_eq!(backend.get_item("t", &key).await.unwrap(), Some(item));
/// # });
/// ```
#[derive(Debug, Default)]
pub struct InMemoryBackend {
    tables: RwLock<HashMap<String, Table>>,
}

impl InMemoryBackend {
    /// Creates a new backend with no tables.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the schema of a table, if it exists.
    #[must_use]
    pub fn schema(&self, table: &str) -> Option<TableSchema> {
        self.tables.read().get(table).map(|t| t.schema.clone())
    }

    /// Returns the number of items stored in a table.
    #[must_use]
    pub fn item_count(&self, table: &str) -> usize {
        self.tables.read().get(table).map_or(0, |t| t.items.len())
    }

    /// Returns a copy of every item in a table, in primary key order.
    ///
    /// Useful for testing and debugging.
    #[must_use]
    pub fn items(&self, table: &str) -> Vec<AttributeMap> {
        self.tables
            .read()
            .get(table)
            .map(|t| t.items.values().cloned().collect())
            .unwrap_or_default()
    }

    /// Removes every item from every table, keeping the schemas.
    pub fn clear(&self) {
        for table in self.tables.write().values_mut() {
            table.items.clear();
        }
    }
}

#[async_trait]
impl StorageBackend for InMemoryBackend {
    async fn ensure_table(&self, schema: &TableSchema) -> StorageResult<()> {
        let mut tables = self.tables.write();
        match tables.get_mut(&schema.table_name) {
            Some(existing) => {
                if existing.schema.hash_attribute != schema.hash_attribute
                    || existing.schema.sort_attribute != schema.sort_attribute
                {
                    return Err(StorageError::SchemaMismatch {
                        table: schema.table_name.clone(),
                        message: "primary key attributes differ".into(),
                    });
                }
                let added = existing.schema.merge_indexes(schema);
                trace!(table = %schema.table_name, ?added, "merged table indexes");
            }
            None => {
                trace!(table = %schema.table_name, "created table");
                tables.insert(schema.table_name.clone(), Table::new(schema.clone()));
            }
        }
        Ok(())
    }

    async fn get_item(&self, table: &str, key: &ItemKey) -> StorageResult<Option<AttributeMap>> {
        let tables = self.tables.read();
        let table = tables
            .get(table)
            .ok_or_else(|| StorageError::table_not_found(table))?;
        let primary = table.check_key(key)?;
        Ok(table.items.get(&primary).cloned())
    }

    async fn put_item(&self, table: &str, item: AttributeMap) -> StorageResult<AttributeMap> {
        let mut tables = self.tables.write();
        let table = tables
            .get_mut(table)
            .ok_or_else(|| StorageError::table_not_found(table))?;
        let primary = table.primary_key_of(&item)?;
        table.items.insert(primary, item.clone());
        Ok(item)
    }

    async fn update_item(
        &self,
        table: &str,
        key: &ItemKey,
        update: ItemUpdate,
    ) -> StorageResult<AttributeMap> {
        let mut tables = self.tables.write();
        let table = tables
            .get_mut(table)
            .ok_or_else(|| StorageError::table_not_found(table))?;
        let primary = table.check_key(key)?;

        for attribute in [&key.hash_attribute, &key.sort_attribute] {
            if update.remove.contains(attribute) {
                return Err(StorageError::invalid_key(format!(
                    "cannot remove key attribute `{attribute}`"
                )));
            }
        }
        let key_attributes = key.to_attributes();
        for (attribute, value) in &key_attributes {
            if update.set.get(attribute).is_some_and(|v| v != value) {
                return Err(StorageError::invalid_key(format!(
                    "cannot change key attribute `{attribute}`"
                )));
            }
        }

        let item = table.items.entry(primary).or_insert(key_attributes);
        for attribute in &update.remove {
            item.remove(attribute);
        }
        item.extend(update.set);
        Ok(item.clone())
    }

    async fn delete_item(&self, table: &str, key: &ItemKey) -> StorageResult<()> {
        let mut tables = self.tables.write();
        let table = tables
            .get_mut(table)
            .ok_or_else(|| StorageError::table_not_found(table))?;
        let primary = table.check_key(key)?;
        table.items.remove(&primary);
        Ok(())
    }

    async fn query(&self, request: &QueryRequest) -> StorageResult<QueryPage> {
        let tables = self.tables.read();
        let table = tables
            .get(&request.table_name)
            .ok_or_else(|| StorageError::table_not_found(&request.table_name))?;
        let (hash_attribute, sort_attribute) =
            table.key_attributes(request.index_name.as_deref())?;

        if request.hash_key.attribute != hash_attribute {
            return Err(StorageError::invalid_key(format!(
                "partition condition on `{}`, index is keyed on `{hash_attribute}`",
                request.hash_key.attribute
            )));
        }
        if let Some(prefix) = &request.sort_key_prefix {
            if prefix.attribute != sort_attribute {
                return Err(StorageError::invalid_key(format!(
                    "sort condition on `{}`, index is sorted on `{sort_attribute}`",
                    prefix.attribute
                )));
            }
        }

        let mut matches: Vec<(Position, &AttributeMap)> = Vec::new();
        for (primary, item) in &table.items {
            if item.get(hash_attribute) != Some(&request.hash_key.value) {
                continue;
            }
            let Some(sort) = item.get(sort_attribute) else {
                continue;
            };
            if let Some(prefix) = &request.sort_key_prefix {
                if !sort.as_str().is_some_and(|s| s.starts_with(&prefix.prefix)) {
                    continue;
                }
            }
            let position = Position {
                sort: sort.clone(),
                primary: primary.clone(),
            };
            matches.push((position, item));
        }

        matches.sort_by(|a, b| a.0.order(&b.0));
        if request.direction == SortDirection::Desc {
            matches.reverse();
        }

        if let Some(start) = &request.exclusive_start_key {
            let start = table.position_of(start, sort_attribute)?;
            let past = match request.direction {
                SortDirection::Asc => Ordering::Greater,
                SortDirection::Desc => Ordering::Less,
            };
            matches.retain(|(position, _)| position.order(&start) == past);
        }

        let limit = request.limit.unwrap_or(usize::MAX).max(1);
        let has_more = matches.len() > limit;
        matches.truncate(limit);

        let last_evaluated_key = if has_more {
            matches
                .last()
                .map(|(_, item)| table.position_key(item, sort_attribute))
        } else {
            None
        };
        let items: Vec<AttributeMap> = matches.into_iter().map(|(_, item)| item.clone()).collect();
        trace!(
            table = %request.table_name,
            index = ?request.index_name,
            returned = items.len(),
            has_more,
            "query page"
        );

        Ok(QueryPage {
            items,
            last_evaluated_key,
        })
    }
}

fn string_attribute<'a>(item: &'a AttributeMap, attribute: &str) -> StorageResult<&'a str> {
    item.get(attribute)
        .and_then(Value::as_str)
        .ok_or_else(|| StorageError::invalid_key(format!("`{attribute}` must be a string")))
}

/// Orders sort key values: numbers numerically, strings bytewise,
/// numbers before strings before anything else.
fn compare_values(a: &Value, b: &Value) -> Ordering {
    fn rank(value: &Value) -> u8 {
        match value {
            Value::Number(_) => 0,
            Value::String(_) => 1,
            _ => 2,
        }
    }

    match (a, b) {
        (Value::String(x), Value::String(y)) => x.cmp(y),
        (Value::Number(x), Value::Number(y)) => {
            let x = x.as_f64().unwrap_or(f64::NAN);
            let y = y.as_f64().unwrap_or(f64::NAN);
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        _ => rank(a)
            .cmp(&rank(b))
            .then_with(|| a.to_string().cmp(&b.to_string())),
    }
}
