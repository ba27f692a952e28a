//! Formatting pipeline
//!
//! Turns raw records into formatted records:
//!
//! ```text
//! raw ──► normalize_dates ──► resolve_references ──► resolve_array_references ──► formatted
//! ```
//!
//! Formatting is idempotent. A formatted record has no timestamps and no
//! references left in the positions the pipeline looks at, so a second pass
//! fetches nothing and changes nothing.

use crate::resolve::{resolve_array_references, resolve_references, ResolveOptions};
use crate::store::DocumentStore;
use catalog_core::{normalize_dates, CatalogResult, Document};
use futures::future::try_join_all;

/// Run the full pipeline over one record
pub async fn format_document(
    store: &dyn DocumentStore,
    raw: Document,
    options: &ResolveOptions,
) -> CatalogResult<Document> {
    let doc = normalize_dates(raw);
    let doc = resolve_references(store, doc, options).await?;
    resolve_array_references(store, doc, options).await
}

/// Run the pipeline over a result set, keeping order
pub async fn format_documents(
    store: &dyn DocumentStore,
    raws: Vec<Document>,
    options: &ResolveOptions,
) -> CatalogResult<Vec<Document>> {
    try_join_all(
        raws.into_iter()
            .map(|raw| format_document(store, raw, options)),
    )
    .await
}
