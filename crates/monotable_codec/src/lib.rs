//! # Monotable Codec
//!
//! Composite key encoding for Monotable.
//!
//! Every key stored by Monotable is a string of the form
//! `descriptor(sep field-value)*`. This crate turns an ordered field list
//! of a JSON record into such a key and back:
//!
//! - The descriptor namespaces the key (object name or query name)
//! - Fields are written in declaration order
//! - An absent field ends the key, leaving a valid begins-with prefix
//! - Numbers are zero-padded so string order equals numeric order
//!
//! ## Value Rules
//!
//! - Text is written verbatim and must not contain the separator
//! - Non-negative integers are written in decimal, optionally padded
//! - `null` is treated as absent
//! - Everything else is a [`FormatError`]
//!
//! ## Usage
//!
//! ```
//! use monotable_codec::{encode_key, KeyFormat};
//! use serde_json::json;
//!
//! let record = json!({"userId": "1208493", "createdAt": 42});
//! let record = record.as_object().unwrap();
//!
//! let format = KeyFormat::default().with_padding(false);
//! let key = encode_key(record, &["userId", "createdAt"], "Purchase", &format).unwrap();
//! assert_eq!(key, "Purchase#userId-1208493#createdAt-42");
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod decoder;
mod encoder;
mod error;
mod value;

pub use decoder::decode_key;
pub use encoder::{
    encode_complete_key, encode_contiguous_key, encode_key, is_present, present_prefix_len,
    KeyBuilder, KeyFormat, DEFAULT_PADDED_NUMBER_LENGTH, DEFAULT_SEPARATOR,
};
pub use error::{FormatError, FormatResult};
pub use value::FieldValue;
