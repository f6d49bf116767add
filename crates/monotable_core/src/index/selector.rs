//! Index selection for queries.
//!
//! A filter is a set of field names with equality values. An index can
//! serve it when every hash-key field is present and every remaining
//! filter field is consumed by a prefix of the index's sort-key fields.
//! Among qualifying indexes the longest sort prefix wins; ties go to the
//! earlier index (primary first, then declaration order).

use std::collections::BTreeSet;

use thiserror::Error;
use tracing::debug;

use super::descriptor::IndexDescriptor;
use super::set::IndexSet;

/// Score bonus for an index whose hash key is fully matched.
///
/// Larger than any possible sort prefix, so a hash match always dominates.
pub const HASH_MATCH_WEIGHT: usize = 1_000;

/// A qualifying index and how much of its sort key the filter covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexMatch<'a> {
    /// The matched index.
    pub index: &'a IndexDescriptor,
    /// Number of leading sort-key fields present in the filter.
    pub sort_prefix_len: usize,
    /// Ranking score.
    pub score: usize,
}

/// Why one index cannot serve a filter.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MatchFailure {
    /// The filter is empty.
    #[error("filter names no fields")]
    EmptyFilter,

    /// A hash-key field is absent from the filter.
    #[error("hash key field `{field}` is not in the filter")]
    MissingHashField {
        /// The absent field.
        field: String,
    },

    /// Filter fields outside the hash key and the matched sort prefix.
    #[error("fields {fields:?} are not a prefix of the sort key")]
    UnconsumedFields {
        /// The leftover fields, sorted.
        fields: Vec<String>,
    },
}

/// Checks whether `index` can serve a filter over `fields`.
///
/// # Errors
///
/// Returns the reason the index does not qualify.
pub fn match_index<'a>(
    index: &'a IndexDescriptor,
    fields: &BTreeSet<String>,
) -> Result<IndexMatch<'a>, MatchFailure> {
    if fields.is_empty() {
        return Err(MatchFailure::EmptyFilter);
    }

    let (hash, sort) = index.query_fields();
    if let Some(field) = hash.iter().find(|f| !fields.contains(**f)) {
        return Err(MatchFailure::MissingHashField {
            field: (*field).to_string(),
        });
    }

    let sort_prefix_len = sort.iter().take_while(|f| fields.contains(**f)).count();
    let consumed = &sort[..sort_prefix_len];
    let leftover: Vec<String> = fields
        .iter()
        .filter(|f| !hash.contains(&f.as_str()) && !consumed.contains(&f.as_str()))
        .cloned()
        .collect();
    if !leftover.is_empty() {
        return Err(MatchFailure::UnconsumedFields { fields: leftover });
    }

    let hash_bonus = if hash.is_empty() { 0 } else { HASH_MATCH_WEIGHT };
    Ok(IndexMatch {
        index,
        sort_prefix_len,
        score: hash_bonus + sort_prefix_len,
    })
}

/// Picks the best index for a filter over `fields`.
///
/// Returns `None` when the filter is empty or no index qualifies.
pub fn find_index_for_query<'a>(
    indexes: &'a IndexSet,
    fields: &BTreeSet<String>,
) -> Option<IndexMatch<'a>> {
    let mut best: Option<IndexMatch<'a>> = None;
    for index in indexes {
        let Ok(candidate) = match_index(index, fields) else {
            continue;
        };
        match &best {
            Some(current) if candidate.score <= current.score => {}
            _ => best = Some(candidate),
        }
    }

    match &best {
        Some(m) => debug!(
            tag = m.index.tag(),
            sort_prefix_len = m.sort_prefix_len,
            "selected index"
        ),
        None => debug!(?fields, "no index matches filter"),
    }
    best
}
