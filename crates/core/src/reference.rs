//! Reference type: a pointer to a document
//!
//! A [`Reference`] names a document by `(collection, id)` without carrying any
//! of its data. Writers embed references in documents to link records; the
//! resolver recognizes them on the read path and inlines the target.
//!
//! ## Path form
//!
//! References render and parse as `collection/id`. Both segments must be
//! non-empty and must not contain `/`.
//!
//! ```
//! use catalog_core::{make_reference, Reference};
//!
//! let r = make_reference("users", "u1");
//! assert_eq!(r.path(), "users/u1");
//! assert_eq!("users/u1".parse::<Reference>().unwrap(), r);
//! ```

use crate::error::CatalogError;
use crate::value::Value;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// JSON key of the reference envelope: `{"$ref": "collection/id"}`
pub const REF_ENVELOPE_KEY: &str = "$ref";

/// Field added to every inlined reference, holding the reference path
pub const REF_PATH_FIELD: &str = "refPath";

/// Pointer to a document in a collection
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Reference {
    collection: String,
    id: String,
}

impl Reference {
    /// Create a reference to `collection/id`
    pub fn new(collection: impl Into<String>, id: impl Into<String>) -> Self {
        Reference {
            collection: collection.into(),
            id: id.into(),
        }
    }

    /// The collection the target lives in
    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// The target document id
    pub fn id(&self) -> &str {
        &self.id
    }

    /// `collection/id`
    pub fn path(&self) -> String {
        format!("{}/{}", self.collection, self.id)
    }

    /// The JSON envelope writers persist for this reference
    pub fn to_json(&self) -> serde_json::Value {
        let mut map = serde_json::Map::with_capacity(1);
        map.insert(
            REF_ENVELOPE_KEY.to_string(),
            serde_json::Value::String(self.path()),
        );
        serde_json::Value::Object(map)
    }

    /// Parse a JSON reference envelope; `None` for anything else
    pub fn from_json(json: &serde_json::Value) -> Option<Self> {
        let map = json.as_object()?;
        if map.len() != 1 {
            return None;
        }
        map.get(REF_ENVELOPE_KEY)?.as_str()?.parse().ok()
    }
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.collection, self.id)
    }
}

impl FromStr for Reference {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.split('/');
        match (parts.next(), parts.next(), parts.next()) {
            (Some(collection), Some(id), None) if !collection.is_empty() && !id.is_empty() => {
                Ok(Reference::new(collection, id))
            }
            _ => Err(CatalogError::construction(format!(
                "invalid reference path '{}': expected 'collection/id'",
                s
            ))),
        }
    }
}

/// Build a reference value for writers
pub fn make_reference(collection: impl Into<String>, id: impl Into<String>) -> Reference {
    Reference::new(collection, id)
}

/// True iff `value` is a reference and not a resolved document
pub fn is_reference(value: &Value) -> bool {
    matches!(value, Value::Reference(_))
}

/// True iff `json` is exactly the reference envelope
pub fn is_reference_json(json: &serde_json::Value) -> bool {
    Reference::from_json(json).is_some()
}
