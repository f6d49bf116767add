//! Property-based test generators using proptest.
//!
//! Provides strategies for generating random test data that the key
//! encoder accepts: field names without separators or the reserved
//! prefix, text without the default separator, and non-negative
//! integers.

use proptest::prelude::*;
use serde_json::{Map, Value};

use crate::fixtures::Purchase;

/// Strategy for generating valid field names.
pub fn field_name_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-z][a-zA-Z0-9]{0,15}").expect("Invalid regex")
}

/// Strategy for generating text values free of the default separator.
pub fn text_value_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-zA-Z0-9 _.-]{1,24}").expect("Invalid regex")
}

/// Strategy for generating key field values: text or a non-negative integer.
pub fn key_value_strategy() -> impl Strategy<Value = Value> {
    prop_oneof![
        text_value_strategy().prop_map(Value::from),
        (0u64..=u64::from(u32::MAX) * 1000).prop_map(Value::from),
    ]
}

/// Strategy for generating `len` distinct field names.
pub fn field_list_strategy(len: std::ops::Range<usize>) -> impl Strategy<Value = Vec<String>> {
    prop::collection::btree_set(field_name_strategy(), len)
        .prop_map(|set| set.into_iter().collect::<Vec<_>>())
        .prop_shuffle()
}

/// Strategy for generating a record holding a value for every field in
/// `fields`.
pub fn record_strategy(fields: Vec<String>) -> impl Strategy<Value = Map<String, Value>> {
    let len = fields.len();
    prop::collection::vec(key_value_strategy(), len).prop_map(move |values| {
        fields
            .iter()
            .cloned()
            .zip(values)
            .collect::<Map<String, Value>>()
    })
}

/// Strategy for generating purchases from a small pool of users and items.
pub fn purchase_strategy() -> impl Strategy<Value = Purchase> {
    (
        "[a-z]{1,8}",
        prop::sample::select(vec!["jim", "dwight", "pam", "kevin"]),
        prop::sample::select(vec!["jello", "stapler", "guitar", "battlestar"]),
        1_500_000_000_000u64..1_600_000_000_000u64,
        prop::sample::select(vec![("usa", "ut", "provo"), ("usa", "pa", "scranton"), ("can", "on", "ottawa")]),
    )
        .prop_map(|(id, user, item, date, (country, state, city))| {
            Purchase::new(&id, user, item, date).at(country, state, city)
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    proptest! {
        #[test]
        fn field_names_are_valid(name in field_name_strategy()) {
            prop_assert!(!name.is_empty());
            prop_assert!(!name.starts_with("__"));
            prop_assert!(!name.contains('#'));
        }

        #[test]
        fn text_values_avoid_separator(text in text_value_strategy()) {
            prop_assert!(!text.contains('#'));
        }

        #[test]
        fn field_lists_are_distinct(fields in field_list_strategy(1..6)) {
            let mut sorted = fields.clone();
            sorted.sort();
            sorted.dedup();
            prop_assert_eq!(sorted.len(), fields.len());
        }
    }
}
