//! Query key builder
//!
//! A [`QueryKey`] is a deterministic string fingerprint of a
//! [`QueryDescriptor`]. Two descriptors built independently from the same
//! inputs yield the same key; any difference in collection, filter (operator,
//! field or value), sort, cursor, limit or delivery flags yields a different
//! one. Nothing depends on object identity: references encode by path.
//!
//! ## Layout
//!
//! ```text
//! "assets"|["isApproved"==true]|"createdAt":desc|after="a9"|20|live,expand|{"payload"}
//! ```
//!
//! The filter sentinels keep their historical spellings: no filter is
//! `undefined` and the skip sentinel is `false`. An id filter is the quoted
//! id, so no id can spell a sentinel.

use crate::query::{Filter, QueryDescriptor};
use crate::value::Value;
use std::fmt::{self, Write};

/// Spelling of [`Filter::NoFilter`] in a key
pub const NO_FILTER_KEY: &str = "undefined";
/// Spelling of [`Filter::SkipQuery`] in a key
pub const SKIP_QUERY_KEY: &str = "false";

/// Stable fingerprint of a query descriptor
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QueryKey(String);

impl QueryKey {
    /// The key text
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&QueryDescriptor> for QueryKey {
    fn from(descriptor: &QueryDescriptor) -> Self {
        build_query_key(descriptor)
    }
}

/// Build the key for a descriptor
pub fn build_query_key(descriptor: &QueryDescriptor) -> QueryKey {
    let mut key = String::new();
    encode_str(&descriptor.collection, &mut key);
    key.push('|');
    key.push_str(&filter_key(&descriptor.filter));
    key.push('|');
    match &descriptor.order_by {
        Some(order) => {
            encode_str(&order.field, &mut key);
            key.push(':');
            key.push_str(order.direction.as_str());
        }
        None => key.push('-'),
    }
    key.push('|');
    match &descriptor.cursor {
        Some(cursor) => {
            key.push_str("after=");
            encode_str(cursor.id(), &mut key);
        }
        None => key.push('-'),
    }
    key.push('|');
    match descriptor.limit {
        Some(limit) => {
            let _ = write!(key, "{}", limit);
        }
        None => key.push('-'),
    }
    key.push('|');
    key.push_str(if descriptor.live { "live" } else { "once" });
    key.push(',');
    key.push_str(if descriptor.expand_references {
        "expand"
    } else {
        "shallow"
    });
    key.push('|');
    key.push('{');
    for (i, field) in descriptor.nested_fields.iter().enumerate() {
        if i > 0 {
            key.push(',');
        }
        encode_str(field, &mut key);
    }
    key.push('}');
    QueryKey(key)
}

/// Key fragment for a filter
pub fn filter_key(filter: &Filter) -> String {
    match filter {
        Filter::NoFilter => NO_FILTER_KEY.to_string(),
        Filter::SkipQuery => SKIP_QUERY_KEY.to_string(),
        Filter::ById(id) => {
            let mut out = String::new();
            encode_str(id, &mut out);
            out
        }
        Filter::ByClauses(clauses) => {
            let mut out = String::from("[");
            for (i, clause) in clauses.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                encode_str(&clause.field, &mut out);
                out.push_str(clause.op.as_str());
                encode_value(&clause.value, &mut out);
            }
            out.push(']');
            out
        }
    }
}

fn encode_str(s: &str, out: &mut String) {
    // serde_json quoting is unambiguous for any content
    out.push_str(&serde_json::Value::String(s.to_string()).to_string());
}

fn encode_value(value: &Value, out: &mut String) {
    match value {
        Value::Null => out.push_str("null"),
        Value::Bool(b) => {
            let _ = write!(out, "{}", b);
        }
        Value::Int(i) => {
            let _ = write!(out, "{}", i);
        }
        Value::Float(f) => {
            let _ = write!(out, "{:?}", f);
        }
        Value::String(s) => encode_str(s, out),
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                encode_value(item, out);
            }
            out.push(']');
        }
        Value::Object(fields) => {
            out.push('{');
            for (i, (name, item)) in fields.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                encode_str(name, out);
                out.push(':');
                encode_value(item, out);
            }
            out.push('}');
        }
        Value::Timestamp(ts) => {
            let _ = write!(out, "ts({},{})", ts.seconds, ts.nanoseconds);
        }
        Value::Date(d) => {
            let _ = write!(out, "date({})", d.timestamp_millis());
        }
        Value::Reference(r) => {
            out.push_str("ref(");
            encode_str(&r.path(), out);
            out.push(')');
        }
    }
}
