//! # Monotable Testkit
//!
//! Test utilities for Monotable.
//!
//! This crate provides:
//! - Record fixtures and repository layouts
//! - A provisioned in-memory store
//! - Property-based test generators using proptest
//! - Test log output through `tracing-subscriber`
//!
//! ## Usage
//!
//! ```rust,ignore
//! use monotable_testkit::prelude::*;
//!
//! #[tokio::test]
//! async fn test_with_store() {
//!     let store = TestStore::seeded().await;
//!     let page = store.purchases.query().filter(&json!({"userId": "jim"})).get().await?;
//!     // ... assertions
//! }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod generators;
mod logging;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::fixtures::*;
    pub use crate::generators::*;
    pub use crate::logging::init_tracing;
}

pub use fixtures::*;
pub use generators::*;
pub use logging::init_tracing;
