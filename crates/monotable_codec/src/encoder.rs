//! Composite key encoder.

use crate::error::{FormatError, FormatResult};
use crate::value::FieldValue;
use serde_json::{Map, Value};

/// Default separator between key segments.
pub const DEFAULT_SEPARATOR: &str = "#";

/// Default width numbers are padded to.
///
/// Twenty digits holds every `u64`.
pub const DEFAULT_PADDED_NUMBER_LENGTH: usize = 20;

/// Formatting rules shared by every key of one repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyFormat {
    separator: String,
    pad_numbers: bool,
    padded_number_length: usize,
}

impl Default for KeyFormat {
    fn default() -> Self {
        Self {
            separator: DEFAULT_SEPARATOR.to_string(),
            pad_numbers: true,
            padded_number_length: DEFAULT_PADDED_NUMBER_LENGTH,
        }
    }
}

impl KeyFormat {
    /// Creates a format with the given separator and default padding.
    pub fn new(separator: impl Into<String>) -> Self {
        Self {
            separator: separator.into(),
            ..Self::default()
        }
    }

    /// Enables or disables zero-padding of numbers.
    #[must_use]
    pub fn with_padding(mut self, pad_numbers: bool) -> Self {
        self.pad_numbers = pad_numbers;
        self
    }

    /// Sets the width numbers are padded to.
    #[must_use]
    pub fn with_padded_number_length(mut self, width: usize) -> Self {
        self.padded_number_length = width;
        self
    }

    /// Returns the segment separator.
    pub fn separator(&self) -> &str {
        &self.separator
    }

    /// Returns whether numbers are zero-padded.
    pub fn pad_numbers(&self) -> bool {
        self.pad_numbers
    }

    /// Returns the padding width.
    pub fn padded_number_length(&self) -> usize {
        self.padded_number_length
    }
}

/// Incremental builder for one composite key.
///
/// Produces `descriptor(sep field-value)*`.
pub struct KeyBuilder<'f> {
    buffer: String,
    format: &'f KeyFormat,
}

impl<'f> KeyBuilder<'f> {
    /// Starts a key with the given namespace descriptor.
    pub fn new(descriptor: &str, format: &'f KeyFormat) -> Self {
        Self {
            buffer: descriptor.to_string(),
            format,
        }
    }

    /// Appends one `field-value` segment.
    ///
    /// # Errors
    ///
    /// Returns an error if the value cannot be rendered.
    pub fn push(&mut self, field: &str, value: FieldValue<'_>) -> FormatResult<()> {
        let rendered = value.render(field, self.format)?;
        self.buffer.push_str(&self.format.separator);
        self.buffer.push_str(field);
        self.buffer.push('-');
        self.buffer.push_str(&rendered);
        Ok(())
    }

    /// Returns the key built so far.
    pub fn as_str(&self) -> &str {
        &self.buffer
    }

    /// Consumes the builder and returns the key.
    pub fn finish(self) -> String {
        self.buffer
    }
}

/// Encodes `fields` of `record` into a composite key.
///
/// Encoding stops at the first absent (or `null`) field and returns the
/// key built so far, which is a valid prefix for begins-with queries.
///
/// # Errors
///
/// Returns an error if a present field holds a value that cannot be
/// part of a key.
pub fn encode_key<S: AsRef<str>>(
    record: &Map<String, Value>,
    fields: &[S],
    descriptor: &str,
    format: &KeyFormat,
) -> FormatResult<String> {
    let mut builder = KeyBuilder::new(descriptor, format);
    for field in fields {
        let field = field.as_ref();
        let value = match record.get(field) {
            Some(raw) => FieldValue::from_json(field, raw)?,
            None => None,
        };
        match value {
            Some(value) => builder.push(field, value)?,
            None => break,
        }
    }
    Ok(builder.finish())
}

/// Encodes a key whose fields must all be present.
///
/// # Errors
///
/// Returns [`FormatError::MissingKeyField`] naming the first absent field,
/// or a value error from [`encode_key`].
pub fn encode_complete_key<S: AsRef<str>>(
    record: &Map<String, Value>,
    fields: &[S],
    descriptor: &str,
    format: &KeyFormat,
) -> FormatResult<String> {
    if let Some(missing) = fields.iter().find(|f| !is_present(record, f.as_ref())) {
        return Err(FormatError::missing_key_field(missing.as_ref()));
    }
    encode_key(record, fields, descriptor, format)
}

/// Encodes a key whose present fields must form a prefix of `fields`.
///
/// Trailing absent fields are allowed; an absent field followed by a
/// present one is rejected.
///
/// # Errors
///
/// Returns [`FormatError::KeyFieldGap`] on a gap, or a value error from
/// [`encode_key`].
pub fn encode_contiguous_key<S: AsRef<str>>(
    record: &Map<String, Value>,
    fields: &[S],
    descriptor: &str,
    format: &KeyFormat,
) -> FormatResult<String> {
    let prefix = present_prefix_len(record, fields);
    if let Some(present) = fields[prefix..]
        .iter()
        .find(|f| is_present(record, f.as_ref()))
    {
        return Err(FormatError::KeyFieldGap {
            missing: fields[prefix].as_ref().to_string(),
            present: present.as_ref().to_string(),
        });
    }
    encode_key(record, fields, descriptor, format)
}

/// Returns how many leading `fields` are present in `record`.
pub fn present_prefix_len<S: AsRef<str>>(record: &Map<String, Value>, fields: &[S]) -> usize {
    fields
        .iter()
        .take_while(|f| is_present(record, f.as_ref()))
        .count()
}

/// Returns whether `field` is present and not `null`.
pub fn is_present(record: &Map<String, Value>, field: &str) -> bool {
    record.get(field).is_some_and(|v| !v.is_null())
}
