//! Date normalization
//!
//! Replaces store-native timestamps in the top-level fields of a document with
//! [`Value::Date`]. Nested objects and arrays are left alone: inlined documents
//! get their own normalization pass when the resolver formats them.
//!
//! Normalization is idempotent because a `Date` never matches the timestamp
//! shape.
//!
//! A timestamp whose milliseconds fall outside the range `chrono` can
//! represent (roughly ±262,000 years) has no date form. It stays a
//! [`Value::Timestamp`], so consumers must still handle that variant for
//! such values.

use crate::document::Document;
use crate::value::{Fields, Value};

/// Normalize the top-level timestamp fields of a document
pub fn normalize_dates(mut doc: Document) -> Document {
    doc.fields = normalize_fields(doc.fields);
    doc
}

/// Normalize the top-level timestamp entries of a field map
pub fn normalize_fields(fields: Fields) -> Fields {
    fields
        .into_iter()
        .map(|(name, value)| (name, normalize_value(value)))
        .collect()
}

/// Convert a single timestamp value; everything else passes through.
///
/// A timestamp outside the representable date range is returned unchanged
/// as [`Value::Timestamp`]; see the module docs.
pub fn normalize_value(value: Value) -> Value {
    match value {
        Value::Timestamp(ts) => match ts.to_date() {
            Some(date) => Value::Date(date),
            // out of chrono's range
            None => Value::Timestamp(ts),
        },
        other => other,
    }
}
