//! Document formatting.
//!
//! A record is stored as its own fields plus the key attributes of every
//! index it belongs to:
//!
//! | Attribute | Value |
//! |-----------|-------|
//! | `__hashKey` / `__sortKey` | primary key, always written |
//! | `__objectType` | the object name |
//! | `__lsiN` | local index sort key |
//! | `__gsiHashN` / `__gsiSortN` | global index key, only if every hash field is present |
//!
//! Custom global indexes read attributes of the record itself and add
//! nothing.

use monotable_codec::{
    encode_complete_key, encode_contiguous_key, is_present, FormatResult,
};
use monotable_storage::{AttributeMap, ItemKey};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::config::RepositoryConfig;
use crate::error::{CoreError, CoreResult};
use crate::index::IndexKind;
use crate::types::{HASH_KEY_ATTRIBUTE, OBJECT_TYPE_ATTRIBUTE, SORT_KEY_ATTRIBUTE};

/// Serializes a value into a flat attribute map.
///
/// # Errors
///
/// Returns [`CoreError::Serialization`] if the value does not serialize
/// to a JSON object.
pub fn to_attributes<V: Serialize + ?Sized>(value: &V) -> CoreResult<AttributeMap> {
    match serde_json::to_value(value)? {
        Value::Object(map) => Ok(map),
        other => Err(CoreError::serialization(format!(
            "expected a record object, got {}",
            json_kind(&other)
        ))),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

impl RepositoryConfig {
    /// Builds the stored item for `record`.
    ///
    /// Every primary key field must be present. A global index is
    /// attached only when all of its hash fields are present; its sort
    /// key, like a local index sort key, may stop at the first absent
    /// field but must not skip one.
    ///
    /// # Errors
    ///
    /// Returns a [`FormatError`](monotable_codec::FormatError) if a key
    /// field is missing or holds an unencodable value.
    pub fn format_record(&self, record: &AttributeMap) -> FormatResult<AttributeMap> {
        let format = self.key_format();
        let mut item = record.clone();
        for attribute in self.derived_attributes() {
            item.remove(attribute);
        }

        let key = self.primary_key(record)?;
        item.insert(HASH_KEY_ATTRIBUTE.to_string(), Value::String(key.hash_value));
        item.insert(SORT_KEY_ATTRIBUTE.to_string(), Value::String(key.sort_value));
        item.insert(
            OBJECT_TYPE_ATTRIBUTE.to_string(),
            Value::String(self.object_name().to_string()),
        );

        for index in self.indexes() {
            match index.kind() {
                IndexKind::Local(_) => {}
                IndexKind::Global(_) => {
                    if !index.hash_key_fields().iter().all(|f| is_present(record, f)) {
                        continue;
                    }
                    let hash = encode_complete_key(
                        record,
                        index.hash_key_fields().as_slice(),
                        index.hash_key_descriptor(),
                        format,
                    )?;
                    item.insert(index.hash_key_attribute().to_string(), Value::String(hash));
                }
                IndexKind::Primary | IndexKind::CustomGlobal { .. } => continue,
            }
            let sort = encode_contiguous_key(
                record,
                index.sort_key_fields().as_slice(),
                index.sort_key_descriptor(),
                format,
            )?;
            item.insert(index.sort_key_attribute().to_string(), Value::String(sort));
        }
        Ok(item)
    }

    /// Removes every engine-written attribute from a stored item.
    ///
    /// Custom index attributes are record fields and are kept.
    pub fn strip_item(&self, mut item: AttributeMap) -> AttributeMap {
        item.remove(HASH_KEY_ATTRIBUTE);
        item.remove(SORT_KEY_ATTRIBUTE);
        item.remove(OBJECT_TYPE_ATTRIBUTE);
        for attribute in self.derived_attributes() {
            item.remove(attribute);
        }
        item
    }

    /// Encodes the primary key of `record`.
    ///
    /// # Errors
    ///
    /// Returns [`FormatError::MissingKeyField`](monotable_codec::FormatError::MissingKeyField)
    /// if a primary key field is absent.
    pub fn primary_key(&self, record: &AttributeMap) -> FormatResult<ItemKey> {
        let primary = self.primary_index();
        let format = self.key_format();
        let hash = encode_complete_key(
            record,
            primary.hash_key_fields().as_slice(),
            primary.hash_key_descriptor(),
            format,
        )?;
        let sort = encode_complete_key(
            record,
            primary.sort_key_fields().as_slice(),
            primary.sort_key_descriptor(),
            format,
        )?;
        Ok(ItemKey::new(
            HASH_KEY_ATTRIBUTE,
            hash,
            SORT_KEY_ATTRIBUTE,
            sort,
        ))
    }

    /// Reads the primary key back from a stored item.
    pub fn stored_key(&self, item: &AttributeMap) -> Option<ItemKey> {
        let hash = item.get(HASH_KEY_ATTRIBUTE)?.as_str()?;
        let sort = item.get(SORT_KEY_ATTRIBUTE)?.as_str()?;
        Some(ItemKey::new(HASH_KEY_ATTRIBUTE, hash, SORT_KEY_ATTRIBUTE, sort))
    }

    /// Returns true if the stored item was written for this object type.
    pub fn owns_item(&self, item: &AttributeMap) -> bool {
        item.get(OBJECT_TYPE_ATTRIBUTE).and_then(Value::as_str) == Some(self.object_name())
    }

    /// Converts a stored item into a record.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Serialization`] if the stripped item does not
    /// deserialize into `T`.
    pub fn decode_item<T: DeserializeOwned>(&self, item: AttributeMap) -> CoreResult<T> {
        let record = self.strip_item(item);
        Ok(serde_json::from_value(Value::Object(record))?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::IndexDeclaration;
    use monotable_codec::FormatError;
    use proptest::prelude::*;
    use serde_json::json;

    fn purchase_config() -> RepositoryConfig {
        RepositoryConfig::builder("Purchase")
            .hash_key_fields(["userId"])
            .sort_key_fields(["itemId", "id"])
            .index(
                "getPurchasersOfItem",
                IndexDeclaration::global(0, ["itemId"], ["purchaseDate", "userId"]),
            )
            .index(
                "mostRecentPurchases",
                IndexDeclaration::local(0, ["purchaseDate", "itemId"]),
            )
            .index(
                "location",
                IndexDeclaration::local(2, ["country", "state", "city", "purchaseDate", "itemId"]),
            )
            .index("byStore", IndexDeclaration::custom_global("storeId", "soldAt"))
            .build()
            .unwrap()
    }

    fn record(value: Value) -> AttributeMap {
        match value {
            Value::Object(map) => map,
            _ => unreachable!(),
        }
    }

    fn sample() -> AttributeMap {
        record(json!({
            "id": "1",
            "userId": "1208493",
            "itemId": "awesomecouch",
            "purchaseDate": 1_572_481_596_741_u64,
            "country": "usa",
            "state": "ut",
            "city": "provo",
        }))
    }

    #[test]
    fn formats_every_index_attribute() {
        let config = RepositoryConfig::builder("Purchase")
            .hash_key_fields(["userId"])
            .sort_key_fields(["itemId", "id"])
            .pad_numbers(false)
            .index(
                "getPurchasersOfItem",
                IndexDeclaration::global(0, ["itemId"], ["purchaseDate", "userId"]),
            )
            .index(
                "location",
                IndexDeclaration::local(2, ["country", "state", "city", "purchaseDate", "itemId"]),
            )
            .build()
            .unwrap();
        let item = config.format_record(&sample()).unwrap();

        assert_eq!(item["__hashKey"], "Purchase#userId-1208493");
        assert_eq!(item["__sortKey"], "Purchase#itemId-awesomecouch#id-1");
        assert_eq!(item["__objectType"], "Purchase");
        assert_eq!(
            item["__gsiHash0"],
            "Purchase-getPurchasersOfItem#itemId-awesomecouch"
        );
        assert_eq!(
            item["__gsiSort0"],
            "getPurchasersOfItem#purchaseDate-1572481596741#userId-1208493"
        );
        assert_eq!(
            item["__lsi2"],
            "location#country-usa#state-ut#city-provo#purchaseDate-1572481596741#itemId-awesomecouch"
        );
        assert_eq!(item["city"], "provo");
    }

    #[test]
    fn pads_numbers_by_default() {
        let item = purchase_config().format_record(&sample()).unwrap();
        assert_eq!(
            item["__lsi0"],
            "mostRecentPurchases#purchaseDate-00000001572481596741#itemId-awesomecouch"
        );
    }

    #[test]
    fn sort_key_without_fields_is_the_object_name() {
        let config = RepositoryConfig::builder("User")
            .hash_key_fields(["id"])
            .build()
            .unwrap();
        let item = config
            .format_record(&record(json!({"id": "jim", "name": "Jim"})))
            .unwrap();
        assert_eq!(item["__hashKey"], "User#id-jim");
        assert_eq!(item["__sortKey"], "User");
    }

    #[test]
    fn omits_global_index_without_hash_fields() {
        let mut fields = sample();
        fields.remove("itemId");
        // Primary sort key needs itemId, so use a config without it.
        let config = RepositoryConfig::builder("Purchase")
            .hash_key_fields(["userId"])
            .sort_key_fields(["id"])
            .index(
                "getPurchasersOfItem",
                IndexDeclaration::global(0, ["itemId"], ["purchaseDate"]),
            )
            .build()
            .unwrap();
        let item = config.format_record(&fields).unwrap();
        assert!(!item.contains_key("__gsiHash0"));
        assert!(!item.contains_key("__gsiSort0"));
    }

    #[test]
    fn partial_local_sort_key_is_a_prefix() {
        let mut fields = sample();
        fields.remove("city");
        fields.remove("purchaseDate");
        fields.remove("itemId");
        let config = RepositoryConfig::builder("Purchase")
            .hash_key_fields(["userId"])
            .sort_key_fields(["id"])
            .index(
                "location",
                IndexDeclaration::local(2, ["country", "state", "city"]),
            )
            .build()
            .unwrap();
        let item = config.format_record(&fields).unwrap();
        assert_eq!(item["__lsi2"], "location#country-usa#state-ut");
    }

    #[test]
    fn gap_in_index_sort_key_is_rejected() {
        let mut fields = sample();
        fields.remove("state");
        let err = purchase_config().format_record(&fields).unwrap_err();
        assert!(matches!(err, FormatError::KeyFieldGap { .. }));
    }

    #[test]
    fn missing_primary_field_is_rejected() {
        let mut fields = sample();
        fields.remove("userId");
        let err = purchase_config().format_record(&fields).unwrap_err();
        assert_eq!(err, FormatError::missing_key_field("userId"));
    }

    #[test]
    fn stale_index_attributes_are_replaced() {
        let mut fields = sample();
        fields.remove("itemId");
        fields.insert("__gsiHash0".into(), json!("stale"));
        let config = RepositoryConfig::builder("Purchase")
            .hash_key_fields(["userId"])
            .sort_key_fields(["id"])
            .index(
                "getPurchasersOfItem",
                IndexDeclaration::global(0, ["itemId"], ["purchaseDate"]),
            )
            .build()
            .unwrap();
        let item = config.format_record(&fields).unwrap();
        assert!(!item.contains_key("__gsiHash0"));
    }

    #[test]
    fn strip_keeps_custom_index_attributes() {
        let config = purchase_config();
        let mut fields = sample();
        fields.insert("storeId".into(), json!("s1"));
        fields.insert("soldAt".into(), json!("2019"));
        let item = config.format_record(&fields).unwrap();
        assert_eq!(config.strip_item(item), fields);
    }

    #[test]
    fn stored_key_round_trips() {
        let config = purchase_config();
        let item = config.format_record(&sample()).unwrap();
        let key = config.stored_key(&item).unwrap();
        assert_eq!(key, config.primary_key(&sample()).unwrap());
        assert!(config.owns_item(&item));
        assert!(config.stored_key(&sample()).is_none());
    }

    #[test]
    fn to_attributes_requires_an_object() {
        assert!(to_attributes(&json!({"a": 1})).is_ok());
        let err = to_attributes(&json!([1, 2])).unwrap_err();
        assert!(matches!(err, CoreError::Serialization { .. }));
    }

    proptest! {
        #[test]
        fn format_then_strip_is_identity(
            user in "[a-z0-9]{1,12}",
            item_id in "[a-z]{1,12}",
            id in "[a-z0-9]{1,8}",
            date in any::<u32>(),
            store in proptest::option::of("[a-z]{2}"),
        ) {
            let config = purchase_config();
            let mut fields = record(json!({
                "userId": user,
                "itemId": item_id,
                "id": id,
                "purchaseDate": date,
                "country": "usa",
                "state": "ut",
                "city": "provo",
            }));
            if let Some(store) = store {
                fields.insert("storeId".into(), Value::String(store));
            }
            let item = config.format_record(&fields).unwrap();
            prop_assert_eq!(config.strip_item(item), fields);
        }
    }
}
