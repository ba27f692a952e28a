//! Reference resolution
//!
//! Two passes expand references embedded in a document:
//! - [`resolve_references`]: top-level reference fields, plus the reference
//!   fields of declared nested-resolvable sub-objects
//! - [`resolve_array_references`]: arrays whose elements are references, plus
//!   the legacy `{ parent: <reference> }` shape
//!
//! ## Cycle avoidance
//!
//! Every fetched document is inlined shallow: its timestamps are normalized
//! but its own references stay as they are. Nested-resolvable objects get
//! exactly one extra hop and are not searched for further nested objects.
//! A graph where A references B and B references A therefore expands to one
//! level and stops.
//!
//! An object carrying `refPath` is an inlined document. Neither pass looks
//! inside it, which also makes formatting an already formatted record a
//! no-op.
//!
//! ## Concurrency
//!
//! Sibling fields (and the elements of one array) are fetched concurrently and
//! joined. The first failure fails the whole document.

use crate::store::DocumentStore;
use catalog_core::{
    is_reference, normalize_fields, CatalogError, CatalogResult, Document, Fields, Reference,
    Value, ID_FIELD, REF_PATH_FIELD,
};
use futures::future::try_join_all;
use std::collections::BTreeSet;
use tracing::trace;

/// Sub-field resolved by the legacy comment/history shape
pub const LEGACY_PARENT_FIELD: &str = "parent";

/// Switches for the resolution passes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolveOptions {
    /// When false both passes return the document untouched
    pub fetch_children: bool,
    /// Inline top-level reference fields
    pub populate_refs: bool,
    /// Fields holding sub-objects whose references are resolved one hop
    pub nested_fields: BTreeSet<String>,
}

impl ResolveOptions {
    /// Resolve everything the descriptor flags allow
    pub fn new(populate_refs: bool, nested_fields: BTreeSet<String>) -> Self {
        ResolveOptions {
            fetch_children: true,
            populate_refs,
            nested_fields,
        }
    }

    /// Do not fetch anything
    pub fn shallow() -> Self {
        ResolveOptions {
            fetch_children: false,
            populate_refs: false,
            nested_fields: BTreeSet::new(),
        }
    }
}

/// Fetch `reference` and inline it as `{...fields, id, refPath}`.
///
/// The inlined document is shallow: dates normalized, references untouched.
/// A missing target inlines as `{id, refPath}`.
pub async fn fetch_inline(
    store: &dyn DocumentStore,
    reference: &Reference,
) -> CatalogResult<Value> {
    let fetched = store
        .get(reference)
        .await
        .map_err(|e| CatalogError::resolution(reference.clone(), e))?;
    trace!(
        target: "catalog::resolve",
        reference = %reference,
        found = fetched.is_some(),
        "Reference fetched"
    );
    Ok(inline_document(reference, fetched))
}

fn inline_document(reference: &Reference, fetched: Option<Document>) -> Value {
    let mut fields = fetched
        .map(|doc| normalize_fields(doc.fields))
        .unwrap_or_default();
    let id = Value::String(reference.id().to_string());
    fields.insert(ID_FIELD.to_string(), id);
    fields.insert(REF_PATH_FIELD.to_string(), Value::String(reference.path()));
    Value::Object(fields)
}

fn is_inlined(object: &Fields) -> bool {
    object.contains_key(REF_PATH_FIELD)
}

/// Inline top-level references and nested-resolvable sub-objects
pub async fn resolve_references(
    store: &dyn DocumentStore,
    mut doc: Document,
    options: &ResolveOptions,
) -> CatalogResult<Document> {
    if !options.fetch_children {
        return Ok(doc);
    }
    let fields = std::mem::take(&mut doc.fields);
    let resolved = try_join_all(fields.into_iter().map(|(name, value)| async move {
        let value = match value {
            Value::Reference(reference) if options.populate_refs => {
                fetch_inline(store, &reference).await?
            }
            Value::Object(nested)
                if options.nested_fields.contains(&name) && !is_inlined(&nested) =>
            {
                Value::Object(resolve_nested_object(store, nested).await?)
            }
            other => other,
        };
        Ok::<_, CatalogError>((name, value))
    }))
    .await?;
    doc.fields = resolved.into_iter().collect();
    Ok(doc)
}

/// One extra hop: inline the direct reference fields of a sub-object
async fn resolve_nested_object(
    store: &dyn DocumentStore,
    nested: Fields,
) -> CatalogResult<Fields> {
    let resolved = try_join_all(nested.into_iter().map(|(name, value)| async move {
        let value = match value {
            Value::Reference(reference) => fetch_inline(store, &reference).await?,
            other => other,
        };
        Ok::<_, CatalogError>((name, value))
    }))
    .await?;
    Ok(resolved.into_iter().collect())
}

/// Inline references held in arrays, and the legacy `parent` sub-field
pub async fn resolve_array_references(
    store: &dyn DocumentStore,
    mut doc: Document,
    options: &ResolveOptions,
) -> CatalogResult<Document> {
    if !options.fetch_children {
        return Ok(doc);
    }
    let fields = std::mem::take(&mut doc.fields);
    let resolved = try_join_all(fields.into_iter().map(|(name, value)| async move {
        let value = match value {
            Value::Array(items) if items.iter().any(is_reference) => {
                Value::Array(resolve_array(store, items).await?)
            }
            Value::Object(mut object) if !is_inlined(&object) => {
                if let Some(Value::Reference(parent)) = object.get(LEGACY_PARENT_FIELD) {
                    let parent = parent.clone();
                    let inlined = fetch_inline(store, &parent).await?;
                    object.insert(LEGACY_PARENT_FIELD.to_string(), inlined);
                }
                Value::Object(object)
            }
            other => other,
        };
        Ok::<_, CatalogError>((name, value))
    }))
    .await?;
    doc.fields = resolved.into_iter().collect();
    Ok(doc)
}

async fn resolve_array(
    store: &dyn DocumentStore,
    items: Vec<Value>,
) -> CatalogResult<Vec<Value>> {
    try_join_all(items.into_iter().map(|item| async move {
        match item {
            Value::Reference(reference) => fetch_inline(store, &reference).await,
            other => Ok(other),
        }
    }))
    .await
}
