//! Resolved index descriptors.

use monotable_storage::{IndexSchema, IndexType};

use crate::types::{FieldList, GlobalSlot, LocalSlot, HASH_KEY_ATTRIBUTE, SORT_KEY_ATTRIBUTE};

/// Which physical index a descriptor reads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IndexKind {
    /// The table's own primary key.
    Primary,
    /// A local secondary index slot.
    Local(LocalSlot),
    /// A global secondary index slot.
    Global(GlobalSlot),
    /// A global index over caller-written attributes.
    CustomGlobal {
        /// Physical index name.
        index_name: String,
    },
}

/// A fully resolved index: where its keys live and how they are encoded.
///
/// Descriptors are built once per repository by
/// [`IndexSet::build`](super::IndexSet::build) and never change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexDescriptor {
    tag: String,
    kind: IndexKind,
    hash_key_fields: FieldList,
    hash_key_attribute: String,
    hash_key_descriptor: String,
    sort_key_fields: FieldList,
    sort_key_attribute: String,
    sort_key_descriptor: String,
}

impl IndexDescriptor {
    /// The primary index. Both key descriptors are the object name.
    pub(crate) fn primary(object_name: &str, hash: FieldList, sort: FieldList) -> Self {
        Self {
            tag: String::new(),
            kind: IndexKind::Primary,
            hash_key_fields: hash,
            hash_key_attribute: HASH_KEY_ATTRIBUTE.to_string(),
            hash_key_descriptor: object_name.to_string(),
            sort_key_fields: sort,
            sort_key_attribute: SORT_KEY_ATTRIBUTE.to_string(),
            sort_key_descriptor: object_name.to_string(),
        }
    }

    /// The primary index under another tag.
    pub(crate) fn alias(&self, tag: &str) -> Self {
        Self {
            tag: tag.to_string(),
            ..self.clone()
        }
    }

    /// A local index: shares the primary partition key, sorts on its slot.
    pub(crate) fn local(primary: &Self, tag: &str, slot: LocalSlot, sort: FieldList) -> Self {
        Self {
            tag: tag.to_string(),
            kind: IndexKind::Local(slot),
            hash_key_fields: primary.hash_key_fields.clone(),
            hash_key_attribute: primary.hash_key_attribute.clone(),
            hash_key_descriptor: primary.hash_key_descriptor.clone(),
            sort_key_fields: sort,
            sort_key_attribute: slot.sort_attribute().to_string(),
            sort_key_descriptor: tag.to_string(),
        }
    }

    /// A global index in a reserved slot.
    pub(crate) fn global(
        object_name: &str,
        tag: &str,
        slot: GlobalSlot,
        hash: FieldList,
        sort: FieldList,
    ) -> Self {
        Self {
            tag: tag.to_string(),
            kind: IndexKind::Global(slot),
            hash_key_fields: hash,
            hash_key_attribute: slot.hash_attribute().to_string(),
            hash_key_descriptor: format!("{object_name}-{tag}"),
            sort_key_fields: sort,
            sort_key_attribute: slot.sort_attribute().to_string(),
            sort_key_descriptor: tag.to_string(),
        }
    }

    /// A global index bound to attributes the caller writes.
    pub(crate) fn custom_global(
        object_name: &str,
        tag: &str,
        hash_attribute: &str,
        sort_attribute: &str,
        index_name: &str,
    ) -> Self {
        Self {
            tag: tag.to_string(),
            kind: IndexKind::CustomGlobal {
                index_name: index_name.to_string(),
            },
            hash_key_fields: FieldList::default(),
            hash_key_attribute: hash_attribute.to_string(),
            hash_key_descriptor: format!("{object_name}-{tag}"),
            sort_key_fields: FieldList::default(),
            sort_key_attribute: sort_attribute.to_string(),
            sort_key_descriptor: tag.to_string(),
        }
    }

    /// Query name; empty for the primary index.
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Physical index this descriptor reads.
    pub fn kind(&self) -> &IndexKind {
        &self.kind
    }

    /// Returns true for the primary index and its aliases.
    pub fn is_primary(&self) -> bool {
        matches!(self.kind, IndexKind::Primary)
    }

    /// Returns true if keys are raw attributes rather than encoded fields.
    pub fn is_custom_index(&self) -> bool {
        matches!(self.kind, IndexKind::CustomGlobal { .. })
    }

    /// Physical index name to query, `None` for the table itself.
    pub fn index_name(&self) -> Option<&str> {
        match &self.kind {
            IndexKind::Primary => None,
            IndexKind::Local(slot) => Some(slot.index_name()),
            IndexKind::Global(slot) => Some(slot.index_name()),
            IndexKind::CustomGlobal { index_name } => Some(index_name.as_str()),
        }
    }

    /// Fields encoded into the partition key.
    pub fn hash_key_fields(&self) -> &FieldList {
        &self.hash_key_fields
    }

    /// Attribute holding the partition key.
    pub fn hash_key_attribute(&self) -> &str {
        &self.hash_key_attribute
    }

    /// Namespace prefix of the encoded partition key.
    pub fn hash_key_descriptor(&self) -> &str {
        &self.hash_key_descriptor
    }

    /// Fields encoded into the sort key, in order.
    pub fn sort_key_fields(&self) -> &FieldList {
        &self.sort_key_fields
    }

    /// Attribute holding the sort key.
    pub fn sort_key_attribute(&self) -> &str {
        &self.sort_key_attribute
    }

    /// Namespace prefix of the encoded sort key.
    pub fn sort_key_descriptor(&self) -> &str {
        &self.sort_key_descriptor
    }

    /// Filter fields that address this index: `(hash, sort)`.
    ///
    /// Custom indexes are addressed by their raw attribute names.
    pub fn query_fields(&self) -> (Vec<&str>, Vec<&str>) {
        if self.is_custom_index() {
            return (
                vec![self.hash_key_attribute.as_str()],
                vec![self.sort_key_attribute.as_str()],
            );
        }
        (
            self.hash_key_fields.iter().map(String::as_str).collect(),
            self.sort_key_fields.iter().map(String::as_str).collect(),
        )
    }

    /// Attributes the formatter derives for this index.
    ///
    /// Empty for the primary index, whose attributes are always written,
    /// and for custom indexes, whose attributes belong to the record.
    pub fn derived_attributes(&self) -> Vec<&str> {
        match self.kind {
            IndexKind::Local(_) => vec![self.sort_key_attribute.as_str()],
            IndexKind::Global(_) => vec![
                self.hash_key_attribute.as_str(),
                self.sort_key_attribute.as_str(),
            ],
            IndexKind::Primary | IndexKind::CustomGlobal { .. } => Vec::new(),
        }
    }

    /// Physical secondary index definition, `None` for the primary index.
    pub fn physical_schema(&self) -> Option<IndexSchema> {
        let index_type = match self.kind {
            IndexKind::Primary => return None,
            IndexKind::Local(_) => IndexType::Local,
            IndexKind::Global(_) | IndexKind::CustomGlobal { .. } => IndexType::Global,
        };
        Some(IndexSchema {
            name: self.index_name()?.to_string(),
            index_type,
            hash_attribute: self.hash_key_attribute.clone(),
            sort_attribute: self.sort_key_attribute.clone(),
        })
    }
}
