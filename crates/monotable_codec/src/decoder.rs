//! Composite key decoder.

use crate::encoder::KeyFormat;
use crate::error::{FormatError, FormatResult};

/// Splits an encoded key back into `(field, raw value)` segments.
///
/// `fields` is the declared field list the key was encoded from. The key
/// may hold fewer segments than fields (a prefix key), but the segments
/// it holds must follow the declared order. Values come back as the raw
/// text written into the key, padding included.
///
/// # Errors
///
/// Returns [`FormatError::MalformedKey`] if the key does not start with
/// `descriptor`, holds more segments than fields, or a segment names the
/// wrong field.
pub fn decode_key<S: AsRef<str>>(
    key: &str,
    descriptor: &str,
    fields: &[S],
    format: &KeyFormat,
) -> FormatResult<Vec<(String, String)>> {
    let rest = key.strip_prefix(descriptor).ok_or_else(|| {
        FormatError::malformed_key(format!("`{key}` does not start with `{descriptor}`"))
    })?;
    if rest.is_empty() {
        return Ok(Vec::new());
    }

    let separator = format.separator();
    let body = rest.strip_prefix(separator).ok_or_else(|| {
        FormatError::malformed_key(format!("expected `{separator}` after `{descriptor}`"))
    })?;

    let mut segments = Vec::new();
    for (index, segment) in body.split(separator).enumerate() {
        let field: &str = fields
            .get(index)
            .map(|f| f.as_ref())
            .ok_or_else(|| FormatError::malformed_key(format!("unexpected segment `{segment}`")))?;
        let value = segment
            .strip_prefix(field)
            .and_then(|s| s.strip_prefix('-'))
            .ok_or_else(|| {
                FormatError::malformed_key(format!("segment `{segment}` is not for `{field}`"))
            })?;
        segments.push((field.to_string(), value.to_string()));
    }
    Ok(segments)
}
