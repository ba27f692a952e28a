//! Core types for the catalog read layer
//!
//! This crate defines the synchronous building blocks of the query path:
//! - Value: field values, including store timestamps, dates and references
//! - Reference: pointer to `(collection, id)` and its detection helpers
//! - StoreTimestamp: the store-native `(seconds, nanoseconds)` timestamp
//! - Document: raw and formatted records
//! - QueryDescriptor: declarative reads with a tagged [`Filter`]
//! - QueryKey: stable fingerprint gating re-execution
//! - Date normalization over top-level fields
//! - Error: error taxonomy shared by all crates

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod date;
pub mod document;
pub mod error;
pub mod key;
pub mod query;
pub mod reference;
pub mod timestamp;
pub mod value;

pub use date::{normalize_dates, normalize_fields, normalize_value};
pub use document::{Document, ID_FIELD};
pub use error::{CatalogError, CatalogResult, ErrorKind};
pub use key::{build_query_key, filter_key, QueryKey, NO_FILTER_KEY, SKIP_QUERY_KEY};
pub use query::{Cursor, Direction, Filter, FilterClause, FilterOp, OrderBy, QueryDescriptor};
pub use reference::{
    is_reference, is_reference_json, make_reference, Reference, REF_ENVELOPE_KEY, REF_PATH_FIELD,
};
pub use timestamp::StoreTimestamp;
pub use value::{Fields, Value};
