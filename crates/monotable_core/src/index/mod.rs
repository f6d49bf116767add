//! The index model of a repository.
//!
//! Every repository reads and writes through a fixed set of indexes:
//!
//! - the **primary** index (`__hashKey` / `__sortKey`)
//! - up to 5 **local** indexes sharing the primary partition key
//!   (`__lsi0`..`__lsi4`)
//! - up to 20 **global** indexes with their own partition key
//!   (`__gsiHash0`/`__gsiSort0`..)
//! - any number of **custom global** indexes over attributes the caller
//!   writes directly
//!
//! Each index is addressed by a query name (its tag). Queries do not name
//! physical indexes; the [`find_index_for_query`] selector picks one from
//! the filter fields.

mod declaration;
mod descriptor;
mod selector;
mod set;

pub use declaration::IndexDeclaration;
pub use descriptor::{IndexDescriptor, IndexKind};
pub use selector::{find_index_for_query, match_index, IndexMatch, MatchFailure, HASH_MATCH_WEIGHT};
pub use set::{IndexSet, RESERVED_ATTRIBUTE_PREFIX};
