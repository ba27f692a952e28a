//! Documents as read from the store
//!
//! A [`Document`] is both the raw record a store returns and the formatted
//! record consumers receive. Formatting changes field values (timestamps,
//! references) but never the `id` or `collection`.

use crate::error::{CatalogError, CatalogResult};
use crate::reference::Reference;
use crate::value::{Fields, Value};
use serde::{Deserialize, Serialize};

/// Field name carrying the document id when a document is flattened
pub const ID_FIELD: &str = "id";

/// A document snapshot: id, parent collection and fields
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Document id, stable across formatting
    pub id: String,
    /// Parent collection
    pub collection: String,
    /// Field map
    pub fields: Fields,
}

impl Document {
    /// Create a document
    pub fn new(collection: impl Into<String>, id: impl Into<String>, fields: Fields) -> Self {
        Document {
            id: id.into(),
            collection: collection.into(),
            fields,
        }
    }

    /// Build a document from a JSON object, recognizing store shapes
    pub fn from_json(
        collection: impl Into<String>,
        id: impl Into<String>,
        json: &serde_json::Value,
    ) -> CatalogResult<Self> {
        match Value::from_json(json) {
            Value::Object(fields) => Ok(Document::new(collection, id, fields)),
            other => Err(CatalogError::construction(format!(
                "document body must be an object, got {}",
                other.type_name()
            ))),
        }
    }

    /// Reference pointing at this document
    pub fn reference(&self) -> Reference {
        Reference::new(self.collection.clone(), self.id.clone())
    }

    /// Look up a field
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    /// Builder-style field insert
    pub fn with_field(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(field.into(), value.into());
        self
    }

    /// Flatten into an object: the fields plus `id`
    pub fn to_value(&self) -> Value {
        let mut fields = self.fields.clone();
        fields.insert(ID_FIELD.to_string(), Value::String(self.id.clone()));
        Value::Object(fields)
    }

    /// Flatten into JSON: the fields plus `id`
    pub fn to_json(&self) -> serde_json::Value {
        self.to_value().to_json()
    }
}
