//! The validated set of indexes of one repository.

use std::collections::HashMap;

use tracing::debug;

use super::declaration::IndexDeclaration;
use super::descriptor::IndexDescriptor;
use crate::error::ConfigError;
use crate::types::{FieldList, GlobalSlot, LocalSlot, GLOBAL_SLOT_COUNT, LOCAL_SLOT_COUNT};

/// Prefix reserved for attributes the engine writes.
pub const RESERVED_ATTRIBUTE_PREFIX: &str = "__";

/// Primary index followed by the declared indexes, in declaration order.
///
/// Declaration order is significant: the selector breaks score ties in
/// favor of the earlier index, with the primary index always first.
#[derive(Debug, Clone)]
pub struct IndexSet {
    indexes: Vec<IndexDescriptor>,
    by_tag: HashMap<String, usize>,
}

impl IndexSet {
    /// Resolves declarations into descriptors.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] naming the first offending declaration.
    pub fn build(
        object_name: &str,
        separator: &str,
        hash_key_fields: FieldList,
        sort_key_fields: FieldList,
        declarations: &[(String, IndexDeclaration)],
    ) -> Result<Self, ConfigError> {
        if hash_key_fields.is_empty() {
            return Err(ConfigError::invalid_field_list(
                "",
                "primary key needs at least one hash field",
            ));
        }
        check_fields("", &hash_key_fields, separator)?;
        check_fields("", &sort_key_fields, separator)?;
        check_disjoint("", &hash_key_fields, &sort_key_fields)?;

        let primary = IndexDescriptor::primary(object_name, hash_key_fields, sort_key_fields);
        let mut set = Self {
            indexes: vec![primary],
            by_tag: HashMap::from([(String::new(), 0)]),
        };
        let mut local_slots: HashMap<u8, &str> = HashMap::new();
        let mut global_slots: HashMap<u8, &str> = HashMap::new();
        let mut physical_names: HashMap<String, &str> = HashMap::new();

        for (tag, declaration) in declarations {
            check_tag(tag, separator)?;
            if set.by_tag.contains_key(tag.as_str()) {
                return Err(ConfigError::DuplicateTag { tag: tag.clone() });
            }

            let descriptor = match declaration {
                IndexDeclaration::Primary => set.primary().alias(tag),
                IndexDeclaration::Local {
                    which,
                    sort_key_fields,
                } => {
                    let slot = LocalSlot::new(*which).ok_or_else(|| ConfigError::SlotOutOfRange {
                        query: tag.clone(),
                        kind: "local",
                        slot: *which,
                        max: LOCAL_SLOT_COUNT - 1,
                    })?;
                    claim_slot(&mut local_slots, tag, "local", *which)?;
                    let sort = non_empty_fields(tag, "sort", sort_key_fields, separator)?;
                    check_disjoint(tag, set.primary().hash_key_fields(), &sort)?;
                    IndexDescriptor::local(set.primary(), tag, slot, sort)
                }
                IndexDeclaration::Global {
                    which,
                    hash_key_fields,
                    sort_key_fields,
                } => {
                    let slot =
                        GlobalSlot::new(*which).ok_or_else(|| ConfigError::SlotOutOfRange {
                            query: tag.clone(),
                            kind: "global",
                            slot: *which,
                            max: GLOBAL_SLOT_COUNT - 1,
                        })?;
                    claim_slot(&mut global_slots, tag, "global", *which)?;
                    let hash = non_empty_fields(tag, "hash", hash_key_fields, separator)?;
                    let sort = non_empty_fields(tag, "sort", sort_key_fields, separator)?;
                    check_disjoint(tag, &hash, &sort)?;
                    IndexDescriptor::global(object_name, tag, slot, hash, sort)
                }
                IndexDeclaration::CustomGlobal {
                    hash_key_attribute,
                    sort_key_attribute,
                    index_name,
                } => {
                    check_custom_attribute(tag, hash_key_attribute)?;
                    check_custom_attribute(tag, sort_key_attribute)?;
                    if hash_key_attribute == sort_key_attribute {
                        return Err(ConfigError::invalid_index(
                            tag.as_str(),
                            "hash and sort attributes must differ",
                        ));
                    }
                    let name = index_name.as_deref().unwrap_or(tag);
                    if name.is_empty() {
                        return Err(ConfigError::invalid_index(tag.as_str(), "empty index name"));
                    }
                    IndexDescriptor::custom_global(
                        object_name,
                        tag,
                        hash_key_attribute,
                        sort_key_attribute,
                        name,
                    )
                }
            };

            if let Some(name) = descriptor.index_name() {
                if let Some(other) = physical_names.insert(name.to_string(), tag) {
                    return Err(ConfigError::invalid_index(
                        tag.as_str(),
                        format!("physical index `{name}` already used by `{other}`"),
                    ));
                }
            }

            set.by_tag.insert(tag.clone(), set.indexes.len());
            set.indexes.push(descriptor);
        }

        debug!(
            object_name,
            indexes = set.indexes.len(),
            "resolved index declarations"
        );
        Ok(set)
    }

    /// The primary index.
    pub fn primary(&self) -> &IndexDescriptor {
        &self.indexes[0]
    }

    /// Looks up an index by tag. The empty tag names the primary index.
    pub fn by_tag(&self, tag: &str) -> Option<&IndexDescriptor> {
        self.by_tag.get(tag).map(|&i| &self.indexes[i])
    }

    /// All indexes, primary first, then in declaration order.
    pub fn iter(&self) -> std::slice::Iter<'_, IndexDescriptor> {
        self.indexes.iter()
    }

    /// Number of indexes, including the primary index.
    pub fn len(&self) -> usize {
        self.indexes.len()
    }

    /// Always false: the primary index is always present.
    pub fn is_empty(&self) -> bool {
        self.indexes.is_empty()
    }
}

impl<'a> IntoIterator for &'a IndexSet {
    type Item = &'a IndexDescriptor;
    type IntoIter = std::slice::Iter<'a, IndexDescriptor>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

fn check_tag(tag: &str, separator: &str) -> Result<(), ConfigError> {
    if tag.is_empty() {
        return Err(ConfigError::invalid_index(tag, "empty query name"));
    }
    if tag.contains(separator) {
        return Err(ConfigError::invalid_index(
            tag,
            format!("query name contains the separator `{separator}`"),
        ));
    }
    Ok(())
}

fn check_fields(query: &str, fields: &FieldList, separator: &str) -> Result<(), ConfigError> {
    for field in fields.iter() {
        if field.contains(separator) {
            return Err(ConfigError::invalid_field_list(
                query,
                format!("field `{field}` contains the separator `{separator}`"),
            ));
        }
        if field.starts_with(RESERVED_ATTRIBUTE_PREFIX) {
            return Err(ConfigError::invalid_field_list(
                query,
                format!("field `{field}` uses the reserved prefix `{RESERVED_ATTRIBUTE_PREFIX}`"),
            ));
        }
    }
    Ok(())
}

fn non_empty_fields(
    query: &str,
    role: &str,
    fields: &[String],
    separator: &str,
) -> Result<FieldList, ConfigError> {
    if fields.is_empty() {
        return Err(ConfigError::invalid_field_list(
            query,
            format!("{role} key fields must not be empty"),
        ));
    }
    let list = FieldList::new(query, fields.iter().cloned())?;
    check_fields(query, &list, separator)?;
    Ok(list)
}

fn claim_slot<'t>(
    slots: &mut HashMap<u8, &'t str>,
    tag: &'t str,
    kind: &'static str,
    slot: u8,
) -> Result<(), ConfigError> {
    if let Some(taken_by) = slots.insert(slot, tag) {
        return Err(ConfigError::SlotInUse {
            query: tag.to_string(),
            kind,
            slot,
            taken_by: taken_by.to_string(),
        });
    }
    Ok(())
}

fn check_custom_attribute(query: &str, attribute: &str) -> Result<(), ConfigError> {
    if attribute.is_empty() {
        return Err(ConfigError::invalid_index(query, "empty attribute name"));
    }
    if attribute.starts_with(RESERVED_ATTRIBUTE_PREFIX) {
        return Err(ConfigError::invalid_index(
            query,
            format!("attribute `{attribute}` uses the reserved prefix `{RESERVED_ATTRIBUTE_PREFIX}`"),
        ));
    }
    Ok(())
}

/// A field may key the hash or the sort of one index, not both.
fn check_disjoint(tag: &str, hash: &[String], sort: &[String]) -> Result<(), ConfigError> {
    match sort.iter().find(|field| hash.contains(field)) {
        Some(field) => Err(ConfigError::invalid_field_list(
            tag,
            format!("field `{field}` is in both the hash and sort keys"),
        )),
        None => Ok(()),
    }
}
