//! Request and response types shared by storage backends.
//!
//! Items are flat attribute maps. The storage layer does not interpret
//! attribute values beyond the key attributes named in a table's
//! [`TableSchema`].

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A stored item: attribute name to JSON value.
pub type AttributeMap = serde_json::Map<String, Value>;

/// Direction in which a query walks an index's sort key.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    /// Ascending sort key order.
    #[default]
    Asc,
    /// Descending sort key order.
    Desc,
}

/// The primary key of one item.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ItemKey {
    /// Name of the partition key attribute.
    pub hash_attribute: String,
    /// Partition key value.
    pub hash_value: String,
    /// Name of the sort key attribute.
    pub sort_attribute: String,
    /// Sort key value.
    pub sort_value: String,
}

impl ItemKey {
    /// Creates an item key.
    pub fn new(
        hash_attribute: impl Into<String>,
        hash_value: impl Into<String>,
        sort_attribute: impl Into<String>,
        sort_value: impl Into<String>,
    ) -> Self {
        Self {
            hash_attribute: hash_attribute.into(),
            hash_value: hash_value.into(),
            sort_attribute: sort_attribute.into(),
            sort_value: sort_value.into(),
        }
    }

    /// Returns the key as an attribute map.
    pub fn to_attributes(&self) -> AttributeMap {
        let mut map = AttributeMap::new();
        map.insert(
            self.hash_attribute.clone(),
            Value::String(self.hash_value.clone()),
        );
        map.insert(
            self.sort_attribute.clone(),
            Value::String(self.sort_value.clone()),
        );
        map
    }
}

/// A partial update applied to one item.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ItemUpdate {
    /// Attributes to set, replacing existing values.
    pub set: AttributeMap,
    /// Attributes to remove. Absent attributes are ignored.
    pub remove: Vec<String>,
}

impl ItemUpdate {
    /// Returns true if the update changes nothing.
    pub fn is_empty(&self) -> bool {
        self.set.is_empty() && self.remove.is_empty()
    }
}

/// One entry of a batch write.
#[derive(Debug, Clone, PartialEq)]
pub enum WriteRequest {
    /// Unconditionally store the item.
    Put(AttributeMap),
    /// Delete the item if it exists.
    Delete(ItemKey),
}

/// Equality condition on an index's partition key.
#[derive(Debug, Clone, PartialEq)]
pub struct KeyCondition {
    /// The partition key attribute.
    pub attribute: String,
    /// The value it must equal.
    pub value: Value,
}

/// Begins-with condition on an index's sort key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BeginsWith {
    /// The sort key attribute.
    pub attribute: String,
    /// The required string prefix.
    pub prefix: String,
}

/// A range read against the table or one of its indexes.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryRequest {
    /// The table to read.
    pub table_name: String,
    /// The secondary index to read, or `None` for the table itself.
    pub index_name: Option<String>,
    /// Partition key equality.
    pub hash_key: KeyCondition,
    /// Optional sort key prefix.
    pub sort_key_prefix: Option<BeginsWith>,
    /// Walk direction.
    pub direction: SortDirection,
    /// Page size. `None` reads every match.
    pub limit: Option<usize>,
    /// Continue after this key, as returned in [`QueryPage::last_evaluated_key`].
    pub exclusive_start_key: Option<AttributeMap>,
}

/// One page of query results.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryPage {
    /// Matching items in index order.
    pub items: Vec<AttributeMap>,
    /// Present when more matches remain; pass back as the start key.
    pub last_evaluated_key: Option<AttributeMap>,
}

/// Kind of a physical secondary index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IndexType {
    /// Shares the table's partition key.
    Local,
    /// Has its own partition key.
    Global,
}

/// Physical definition of one secondary index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexSchema {
    /// Physical index name.
    pub name: String,
    /// Local or global.
    pub index_type: IndexType,
    /// Partition key attribute.
    pub hash_attribute: String,
    /// Sort key attribute.
    pub sort_attribute: String,
}

/// Physical definition of a table and its secondary indexes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSchema {
    /// Table name.
    pub table_name: String,
    /// Partition key attribute.
    pub hash_attribute: String,
    /// Sort key attribute.
    pub sort_attribute: String,
    /// Secondary indexes, unique by name.
    pub indexes: Vec<IndexSchema>,
}

impl TableSchema {
    /// Looks up a secondary index by name.
    pub fn index(&self, name: &str) -> Option<&IndexSchema> {
        self.indexes.iter().find(|i| i.name == name)
    }

    /// Adds every index of `other` not already defined here.
    ///
    /// Returns the names of indexes that were added.
    pub fn merge_indexes(&mut self, other: &TableSchema) -> Vec<String> {
        let mut added = Vec::new();
        for index in &other.indexes {
            if self.index(&index.name).is_none() {
                self.indexes.push(index.clone());
                added.push(index.name.clone());
            }
        }
        added
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schema(indexes: &[&str]) -> TableSchema {
        TableSchema {
            table_name: "t".into(),
            hash_attribute: "__hashKey".into(),
            sort_attribute: "__sortKey".into(),
            indexes: indexes
                .iter()
                .map(|name| IndexSchema {
                    name: (*name).into(),
                    index_type: IndexType::Global,
                    hash_attribute: format!("{name}_h"),
                    sort_attribute: format!("{name}_s"),
                })
                .collect(),
        }
    }

    #[test]
    fn item_key_attributes() {
        let key = ItemKey::new("h", "a", "s", "b");
        let attrs = key.to_attributes();
        assert_eq!(attrs.len(), 2);
        assert_eq!(attrs["h"], "a");
        assert_eq!(attrs["s"], "b");
    }

    #[test]
    fn merge_adds_only_new_indexes() {
        let mut base = schema(&["gsi0", "lsi1"]);
        let added = base.merge_indexes(&schema(&["gsi0", "gsi2"]));
        assert_eq!(added, vec!["gsi2".to_string()]);
        assert_eq!(base.indexes.len(), 3);
    }

    #[test]
    fn sort_direction_serializes_lowercase() {
        let json = serde_json::to_string(&SortDirection::Desc).unwrap();
        assert_eq!(json, "\"desc\"");
        assert_eq!(SortDirection::default(), SortDirection::Asc);
    }
}
