//! Typed repository API.
//!
//! Provides `Repository<T>` for reading and writing records of one
//! object type, and `QueryBuilder` for index-selected range reads.

mod query;
mod typed;

pub use query::{Cursor, QueryBuilder, QueryResults};
pub use typed::Repository;
