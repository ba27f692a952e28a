//! Query executor
//!
//! [`QueryExecutor`] binds a store, an error reporter and the config. It
//! translates descriptors into plans, fetches snapshots and runs them through
//! the formatting pipeline. [`LiveQuery`](crate::LiveQuery) builds the live
//! state machine on top of it; [`QueryExecutor::run_query`] is the one-shot
//! path.

use crate::config::CatalogConfig;
use crate::format::{format_document, format_documents};
use crate::report::ErrorReporter;
use crate::resolve::ResolveOptions;
use crate::store::{DocumentStore, QueryPlan, Snapshot};
use catalog_core::{CatalogError, CatalogResult, Document, QueryDescriptor};
use std::sync::Arc;
use tracing::debug;

/// Formatted result of a query
#[derive(Debug, Clone, PartialEq)]
pub enum QueryData {
    /// Result of a by-id query; `None` when the document does not exist
    One(Option<Document>),
    /// Result of a collection query; empty when nothing matches
    Many(Vec<Document>),
}

impl QueryData {
    /// The single record of a by-id result
    pub fn as_one(&self) -> Option<&Document> {
        match self {
            QueryData::One(doc) => doc.as_ref(),
            QueryData::Many(_) => None,
        }
    }

    /// The records of a collection result
    pub fn as_many(&self) -> Option<&[Document]> {
        match self {
            QueryData::Many(docs) => Some(docs),
            QueryData::One(_) => None,
        }
    }

    /// Number of records held
    pub fn len(&self) -> usize {
        match self {
            QueryData::One(doc) => usize::from(doc.is_some()),
            QueryData::Many(docs) => docs.len(),
        }
    }

    /// Whether no record is held
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Executes descriptors against a store
#[derive(Clone)]
pub struct QueryExecutor {
    store: Arc<dyn DocumentStore>,
    reporter: Arc<dyn ErrorReporter>,
    config: Arc<CatalogConfig>,
}

impl QueryExecutor {
    /// Create an executor
    pub fn new(
        store: Arc<dyn DocumentStore>,
        reporter: Arc<dyn ErrorReporter>,
        config: Arc<CatalogConfig>,
    ) -> Self {
        QueryExecutor {
            store,
            reporter,
            config,
        }
    }

    /// The shared store handle
    pub fn store(&self) -> &Arc<dyn DocumentStore> {
        &self.store
    }

    /// The active configuration
    pub fn config(&self) -> &CatalogConfig {
        &self.config
    }

    /// Forward a failure to the reporter
    pub fn report(&self, error: &CatalogError) {
        self.reporter.report(error);
    }

    /// Translate a descriptor
    pub fn plan(&self, descriptor: &QueryDescriptor) -> CatalogResult<QueryPlan> {
        QueryPlan::from_descriptor(descriptor, &self.config.query_limits())
    }

    /// Pipeline options for a descriptor.
    ///
    /// Descriptors without nested-field declarations get the configured
    /// defaults.
    pub fn resolve_options(&self, descriptor: &QueryDescriptor) -> ResolveOptions {
        let nested = if descriptor.nested_fields.is_empty() {
            self.config.nested_field_set()
        } else {
            descriptor.nested_fields.clone()
        };
        ResolveOptions::new(descriptor.expand_references, nested)
    }

    /// Fetch the raw snapshot of a plan once
    pub async fn fetch(&self, plan: &QueryPlan) -> CatalogResult<Option<Snapshot>> {
        match plan {
            QueryPlan::Skip => Ok(None),
            QueryPlan::Lookup(reference) => {
                Ok(Some(Snapshot::One(self.store.get(reference).await?)))
            }
            QueryPlan::Scan(query) => Ok(Some(Snapshot::Many(self.store.query(query).await?))),
        }
    }

    /// Run a raw snapshot through the formatting pipeline
    pub async fn format_snapshot(
        &self,
        snapshot: Snapshot,
        options: &ResolveOptions,
    ) -> CatalogResult<QueryData> {
        let store = self.store.as_ref();
        match snapshot {
            Snapshot::One(None) => Ok(QueryData::One(None)),
            Snapshot::One(Some(raw)) => Ok(QueryData::One(Some(
                format_document(store, raw, options).await?,
            ))),
            Snapshot::Many(raws) => Ok(QueryData::Many(
                format_documents(store, raws, options).await?,
            )),
        }
    }

    /// One-shot query.
    ///
    /// Returns `Ok(None)` for a skipped descriptor without contacting the
    /// store. Failures are reported once and returned.
    pub async fn run_query(
        &self,
        descriptor: &QueryDescriptor,
    ) -> CatalogResult<Option<QueryData>> {
        let result = self.run_query_inner(descriptor).await;
        if let Err(e) = &result {
            self.report(e);
        }
        result
    }

    async fn run_query_inner(
        &self,
        descriptor: &QueryDescriptor,
    ) -> CatalogResult<Option<QueryData>> {
        let plan = self.plan(descriptor)?;
        let Some(snapshot) = self.fetch(&plan).await? else {
            debug!(target: "catalog::query", collection = %descriptor.collection, "Query skipped");
            return Ok(None);
        };
        let options = self.resolve_options(descriptor);
        let data = self.format_snapshot(snapshot, &options).await?;
        debug!(
            target: "catalog::query",
            collection = %descriptor.collection,
            records = data.len(),
            "Query completed"
        );
        Ok(Some(data))
    }
}

impl std::fmt::Debug for QueryExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryExecutor")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
