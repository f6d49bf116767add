//! Core type definitions for Monotable.

use std::fmt;
use std::ops::Deref;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Attribute holding the encoded primary partition key.
pub const HASH_KEY_ATTRIBUTE: &str = "__hashKey";

/// Attribute holding the encoded primary sort key.
pub const SORT_KEY_ATTRIBUTE: &str = "__sortKey";

/// Attribute holding the object name of a stored record.
pub const OBJECT_TYPE_ATTRIBUTE: &str = "__objectType";

/// Number of local secondary index slots.
pub const LOCAL_SLOT_COUNT: u8 = 5;

/// Number of global secondary index slots.
pub const GLOBAL_SLOT_COUNT: u8 = 20;

const LOCAL_SORT_ATTRIBUTES: [&str; LOCAL_SLOT_COUNT as usize] =
    ["__lsi0", "__lsi1", "__lsi2", "__lsi3", "__lsi4"];

const LOCAL_INDEX_NAMES: [&str; LOCAL_SLOT_COUNT as usize] = ["lsi0", "lsi1", "lsi2", "lsi3", "lsi4"];

const GLOBAL_HASH_ATTRIBUTES: [&str; GLOBAL_SLOT_COUNT as usize] = [
    "__gsiHash0",
    "__gsiHash1",
    "__gsiHash2",
    "__gsiHash3",
    "__gsiHash4",
    "__gsiHash5",
    "__gsiHash6",
    "__gsiHash7",
    "__gsiHash8",
    "__gsiHash9",
    "__gsiHash10",
    "__gsiHash11",
    "__gsiHash12",
    "__gsiHash13",
    "__gsiHash14",
    "__gsiHash15",
    "__gsiHash16",
    "__gsiHash17",
    "__gsiHash18",
    "__gsiHash19",
];

const GLOBAL_SORT_ATTRIBUTES: [&str; GLOBAL_SLOT_COUNT as usize] = [
    "__gsiSort0",
    "__gsiSort1",
    "__gsiSort2",
    "__gsiSort3",
    "__gsiSort4",
    "__gsiSort5",
    "__gsiSort6",
    "__gsiSort7",
    "__gsiSort8",
    "__gsiSort9",
    "__gsiSort10",
    "__gsiSort11",
    "__gsiSort12",
    "__gsiSort13",
    "__gsiSort14",
    "__gsiSort15",
    "__gsiSort16",
    "__gsiSort17",
    "__gsiSort18",
    "__gsiSort19",
];

const GLOBAL_INDEX_NAMES: [&str; GLOBAL_SLOT_COUNT as usize] = [
    "gsi0", "gsi1", "gsi2", "gsi3", "gsi4", "gsi5", "gsi6", "gsi7", "gsi8", "gsi9", "gsi10",
    "gsi11", "gsi12", "gsi13", "gsi14", "gsi15", "gsi16", "gsi17", "gsi18", "gsi19",
];

/// A validated local secondary index slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LocalSlot(u8);

impl LocalSlot {
    /// Returns the slot if it is in `0..LOCAL_SLOT_COUNT`.
    #[must_use]
    pub const fn new(slot: u8) -> Option<Self> {
        if slot < LOCAL_SLOT_COUNT {
            Some(Self(slot))
        } else {
            None
        }
    }

    /// Returns the raw slot number.
    #[must_use]
    pub const fn as_u8(self) -> u8 {
        self.0
    }

    /// Returns the reserved sort key attribute of this slot.
    #[must_use]
    pub const fn sort_attribute(self) -> &'static str {
        LOCAL_SORT_ATTRIBUTES[self.0 as usize]
    }

    /// Returns the physical index name of this slot.
    #[must_use]
    pub const fn index_name(self) -> &'static str {
        LOCAL_INDEX_NAMES[self.0 as usize]
    }
}

impl fmt::Display for LocalSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "lsi:{}", self.0)
    }
}

/// A validated global secondary index slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GlobalSlot(u8);

impl GlobalSlot {
    /// Returns the slot if it is in `0..GLOBAL_SLOT_COUNT`.
    #[must_use]
    pub const fn new(slot: u8) -> Option<Self> {
        if slot < GLOBAL_SLOT_COUNT {
            Some(Self(slot))
        } else {
            None
        }
    }

    /// Returns the raw slot number.
    #[must_use]
    pub const fn as_u8(self) -> u8 {
        self.0
    }

    /// Returns the reserved partition key attribute of this slot.
    #[must_use]
    pub const fn hash_attribute(self) -> &'static str {
        GLOBAL_HASH_ATTRIBUTES[self.0 as usize]
    }

    /// Returns the reserved sort key attribute of this slot.
    #[must_use]
    pub const fn sort_attribute(self) -> &'static str {
        GLOBAL_SORT_ATTRIBUTES[self.0 as usize]
    }

    /// Returns the physical index name of this slot.
    #[must_use]
    pub const fn index_name(self) -> &'static str {
        GLOBAL_INDEX_NAMES[self.0 as usize]
    }
}

impl fmt::Display for GlobalSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "gsi:{}", self.0)
    }
}

/// An ordered list of distinct field names.
///
/// Order is significant: it fixes the encoding order of a key and
/// therefore which prefixes of it can be queried.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldList(Vec<String>);

impl FieldList {
    /// Validates a field list declared for `query`.
    ///
    /// # Errors
    ///
    /// Returns an error if a name is empty or repeated.
    pub fn new<I, S>(query: &str, fields: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let fields: Vec<String> = fields.into_iter().map(Into::into).collect();
        for (i, field) in fields.iter().enumerate() {
            if field.is_empty() {
                return Err(ConfigError::invalid_field_list(query, "empty field name"));
            }
            if fields[..i].contains(field) {
                return Err(ConfigError::invalid_field_list(
                    query,
                    format!("field `{field}` listed twice"),
                ));
            }
        }
        Ok(Self(fields))
    }

    /// Returns the field names in order.
    #[must_use]
    pub fn as_slice(&self) -> &[String] {
        &self.0
    }
}

impl Deref for FieldList {
    type Target = [String];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}
