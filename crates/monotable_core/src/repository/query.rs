//! Query building and pagination.

use std::collections::BTreeSet;

use monotable_codec::{encode_complete_key, encode_key, FormatError};
use monotable_storage::{AttributeMap, BeginsWith, KeyCondition, QueryRequest, SortDirection};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use super::typed::Repository;
use crate::error::{CoreError, CoreResult, QueryError};
use crate::index::{find_index_for_query, match_index, IndexDescriptor, IndexMatch};

/// Opaque position after one page of a query.
///
/// Carries everything needed to fetch the next page, so it can be
/// serialized, handed to a client, and passed back to
/// [`Repository::resume`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cursor {
    object_name: String,
    index_tag: String,
    filter: AttributeMap,
    direction: SortDirection,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    limit: Option<usize>,
    start_key: AttributeMap,
}

impl Cursor {
    /// Object type the cursor was issued for.
    pub fn object_name(&self) -> &str {
        &self.object_name
    }

    /// Tag of the index being read.
    pub fn index_tag(&self) -> &str {
        &self.index_tag
    }

    /// Walk direction of the query.
    pub fn direction(&self) -> SortDirection {
        self.direction
    }
}

/// One page of records.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryResults<T> {
    /// Records in index order.
    pub results: Vec<T>,
    /// Present when more records may follow.
    pub next_page: Option<Cursor>,
}

impl<T> QueryResults<T> {
    /// Returns true if another page can be requested.
    pub fn has_more(&self) -> bool {
        self.next_page.is_some()
    }
}

/// A query under construction.
///
/// Index selection is deferred: a filter no index can serve is reported
/// by [`get`](Self::get) or [`delete_all`](Self::delete_all), not by
/// [`filter`](Self::filter).
#[must_use = "a query does nothing until `get` or `delete_all` is awaited"]
pub struct QueryBuilder<'r, T> {
    repository: &'r Repository<T>,
    tag: Option<String>,
    filter: Option<CoreResult<AttributeMap>>,
    direction: SortDirection,
    limit: Option<usize>,
    start_key: Option<AttributeMap>,
}

impl<T> std::fmt::Debug for QueryBuilder<'_, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryBuilder")
            .field("repository", self.repository)
            .field("tag", &self.tag)
            .field("direction", &self.direction)
            .field("limit", &self.limit)
            .finish_non_exhaustive()
    }
}

impl<'r, T> QueryBuilder<'r, T>
where
    T: Serialize + DeserializeOwned + Send + Sync,
{
    pub(super) fn new(repository: &'r Repository<T>, tag: Option<String>) -> Self {
        Self {
            repository,
            tag,
            filter: None,
            direction: SortDirection::Asc,
            limit: None,
            start_key: None,
        }
    }

    pub(super) fn from_cursor(repository: &'r Repository<T>, cursor: Cursor) -> Self {
        Self {
            repository,
            tag: Some(cursor.index_tag),
            filter: Some(Ok(cursor.filter)),
            direction: cursor.direction,
            limit: cursor.limit,
            start_key: Some(cursor.start_key),
        }
    }

    /// Sets the equality filter: an object of field values.
    ///
    /// `null` values are ignored.
    pub fn filter<F>(mut self, filter: &F) -> Self
    where
        F: Serialize + ?Sized,
    {
        let filter = match serde_json::to_value(filter) {
            Ok(Value::Object(mut map)) => {
                map.retain(|_, value| !value.is_null());
                Ok(map)
            }
            Ok(_) => Err(QueryError::InvalidFilter.into()),
            Err(err) => Err(CoreError::from(err)),
        };
        self.filter = Some(filter);
        self
    }

    /// Sets the walk direction. Defaults to ascending.
    pub fn sort_direction(mut self, direction: SortDirection) -> Self {
        self.direction = direction;
        self
    }

    /// Sets the page size. A limit of zero is treated as one.
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Reads one page.
    ///
    /// # Errors
    ///
    /// Returns a [`QueryError`] if there is no filter or no index can
    /// serve it, a [`FormatError`] if a filter value cannot be encoded,
    /// or the backend's error.
    pub async fn get(mut self) -> CoreResult<QueryResults<T>> {
        let filter = self.take_filter()?;
        let (index, request) = self.plan(&filter)?;
        let config = self.repository.config();
        let page = self.repository.backend().query(&request).await?;

        let results = page
            .items
            .into_iter()
            .filter(|item| config.owns_item(item) && satisfies(index, &filter, item))
            .map(|item| config.decode_item(item))
            .collect::<CoreResult<Vec<T>>>()?;
        let next_page = page.last_evaluated_key.map(|start_key| Cursor {
            object_name: config.object_name().to_string(),
            index_tag: index.tag().to_string(),
            filter,
            direction: self.direction,
            limit: self.limit,
            start_key,
        });
        Ok(QueryResults { results, next_page })
    }

    /// Deletes every record matching the filter.
    ///
    /// Pages through the matches, using the limit as the page size, and
    /// deletes each one. Returns the number of records deleted. Records
    /// written concurrently may survive.
    ///
    /// # Errors
    ///
    /// Same as [`get`](Self::get). Records deleted before an error stay
    /// deleted.
    pub async fn delete_all(mut self) -> CoreResult<usize> {
        let filter = self.take_filter()?;
        let (index, mut request) = self.plan(&filter)?;
        let config = self.repository.config();
        let backend = self.repository.backend();

        let mut deleted = 0;
        loop {
            let page = backend.query(&request).await?;
            let matches = page
                .items
                .iter()
                .filter(|item| config.owns_item(item) && satisfies(index, &filter, item));
            for item in matches {
                let key = config.stored_key(item).ok_or_else(|| {
                    CoreError::invalid_operation("stored item has no primary key")
                })?;
                backend.delete_item(config.table_name(), &key).await?;
                deleted += 1;
            }
            match page.last_evaluated_key {
                Some(start_key) => request.exclusive_start_key = Some(start_key),
                None => break,
            }
        }

        debug!(tag = index.tag(), deleted, "deleted matching records");
        Ok(deleted)
    }

    fn take_filter(&mut self) -> CoreResult<AttributeMap> {
        match self.filter.take() {
            Some(filter) => filter,
            None => Err(QueryError::MissingFilter.into()),
        }
    }

    fn select(&self, filter: &AttributeMap) -> Result<IndexMatch<'r>, QueryError> {
        let indexes = self.repository.config().indexes();
        let fields: BTreeSet<String> = filter.keys().cloned().collect();
        match &self.tag {
            None => find_index_for_query(indexes, &fields).ok_or_else(|| {
                QueryError::NoMatchingIndex {
                    fields: fields.into_iter().collect(),
                }
            }),
            Some(tag) => {
                let index = indexes
                    .by_tag(tag)
                    .ok_or_else(|| QueryError::UnknownIndex { tag: tag.clone() })?;
                match_index(index, &fields).map_err(|failure| QueryError::IndexMismatch {
                    tag: tag.clone(),
                    reason: failure.to_string(),
                })
            }
        }
    }

    fn plan(&self, filter: &AttributeMap) -> CoreResult<(&'r IndexDescriptor, QueryRequest)> {
        let config = self.repository.config();
        let matched = self.select(filter)?;
        let index = matched.index;

        let (hash_value, sort_prefix) = if index.is_custom_index() {
            let hash = filter
                .get(index.hash_key_attribute())
                .cloned()
                .unwrap_or_default();
            let prefix = if matched.sort_prefix_len == 0 {
                None
            } else {
                match filter.get(index.sort_key_attribute()) {
                    Some(Value::String(prefix)) => Some(prefix.clone()),
                    _ => {
                        return Err(FormatError::unsupported_value(
                            index.sort_key_attribute(),
                            "non-string begins-with value",
                        )
                        .into())
                    }
                }
            };
            (hash, prefix)
        } else {
            let format = config.key_format();
            let hash = encode_complete_key(
                filter,
                index.hash_key_fields().as_slice(),
                index.hash_key_descriptor(),
                format,
            )?;
            let prefix = encode_key(
                filter,
                &index.sort_key_fields()[..matched.sort_prefix_len],
                index.sort_key_descriptor(),
                format,
            )?;
            (Value::String(hash), Some(prefix))
        };

        debug!(
            tag = index.tag(),
            index = index.index_name().unwrap_or("primary"),
            prefix = sort_prefix.as_deref().unwrap_or(""),
            "planned query"
        );
        let request = QueryRequest {
            table_name: config.table_name().to_string(),
            index_name: index.index_name().map(str::to_string),
            hash_key: KeyCondition {
                attribute: index.hash_key_attribute().to_string(),
                value: hash_value,
            },
            sort_key_prefix: sort_prefix.map(|prefix| BeginsWith {
                attribute: index.sort_key_attribute().to_string(),
                prefix,
            }),
            direction: self.direction,
            limit: self.limit,
            exclusive_start_key: self.start_key.clone(),
        };
        Ok((index, request))
    }
}

/// Returns whether `item` holds every filter value.
///
/// The begins-with prefix also admits longer values (`us` matches `usa`),
/// so results are checked field by field. A custom index sort attribute
/// keeps begins-with semantics.
fn satisfies(index: &IndexDescriptor, filter: &AttributeMap, item: &AttributeMap) -> bool {
    filter.iter().all(|(field, expected)| {
        let actual = item.get(field);
        if index.is_custom_index() && field == index.sort_key_attribute() {
            match (actual, expected) {
                (Some(Value::String(actual)), Value::String(prefix)) => actual.starts_with(prefix),
                _ => false,
            }
        } else {
            actual == Some(expected)
        }
    })
}
