//! Application context
//!
//! [`Catalog`] owns the process-wide store handle, the error reporter and the
//! configuration. Screens get their executors and live queries from it
//! instead of reaching for a global client.

use crate::config::CatalogConfig;
use crate::executor::{QueryData, QueryExecutor};
use crate::live::LiveQuery;
use crate::report::{ErrorReporter, TracingReporter};
use crate::store::DocumentStore;
use catalog_core::{CatalogError, CatalogResult, QueryDescriptor};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

// ============================================================================
// Catalog Builder
// ============================================================================

/// Builder for [`Catalog`]
///
/// ```ignore
/// use catalog_engine::{Catalog, InMemoryStore};
///
/// let catalog = Catalog::builder()
///     .store(InMemoryStore::new())
///     .config_dir("/etc/myapp")
///     .build()?;
/// ```
#[derive(Default)]
pub struct CatalogBuilder {
    store: Option<Arc<dyn DocumentStore>>,
    reporter: Option<Arc<dyn ErrorReporter>>,
    config: Option<CatalogConfig>,
    config_dir: Option<PathBuf>,
}

impl CatalogBuilder {
    /// Create a builder with nothing set
    pub fn new() -> Self {
        Self::default()
    }

    /// Store every query runs against (required)
    pub fn store<S: DocumentStore + 'static>(mut self, store: S) -> Self {
        self.store = Some(Arc::new(store));
        self
    }

    /// Share an existing store handle
    pub fn shared_store(mut self, store: Arc<dyn DocumentStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Failure sink; defaults to [`TracingReporter`]
    pub fn reporter<R: ErrorReporter + 'static>(mut self, reporter: Arc<R>) -> Self {
        self.reporter = Some(reporter);
        self
    }

    /// Use this configuration
    pub fn config(mut self, config: CatalogConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Load `catalog.toml` from `dir`, writing the default file first if it
    /// does not exist. Ignored when [`config`](Self::config) is also set.
    pub fn config_dir<P: Into<PathBuf>>(mut self, dir: P) -> Self {
        self.config_dir = Some(dir.into());
        self
    }

    /// Build the context
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - No store was configured
    /// - The config file cannot be read or is invalid
    pub fn build(self) -> CatalogResult<Catalog> {
        let store = self
            .store
            .ok_or_else(|| CatalogError::config("a document store is required"))?;
        let config = match (self.config, self.config_dir) {
            (Some(config), _) => {
                config.validate()?;
                config
            }
            (None, Some(dir)) => CatalogConfig::load_or_init(&dir)?,
            (None, None) => CatalogConfig::default(),
        };
        let reporter = self
            .reporter
            .unwrap_or_else(|| Arc::new(TracingReporter) as Arc<dyn ErrorReporter>);

        info!(
            target: "catalog::query",
            nested_fields = ?config.nested_fields,
            max_disjunction_values = config.max_disjunction_values,
            "Catalog ready"
        );
        Ok(Catalog {
            executor: QueryExecutor::new(store, reporter, Arc::new(config)),
        })
    }
}

impl std::fmt::Debug for CatalogBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatalogBuilder")
            .field("has_store", &self.store.is_some())
            .field("has_reporter", &self.reporter.is_some())
            .field("config", &self.config)
            .field("config_dir", &self.config_dir)
            .finish()
    }
}

// ============================================================================
// Catalog
// ============================================================================

/// Application-level query context
#[derive(Debug, Clone)]
pub struct Catalog {
    executor: QueryExecutor,
}

impl Catalog {
    /// Start building a context
    pub fn builder() -> CatalogBuilder {
        CatalogBuilder::new()
    }

    /// Executor sharing this context's store, reporter and config
    pub fn executor(&self) -> QueryExecutor {
        self.executor.clone()
    }

    /// One-shot query; see [`QueryExecutor::run_query`]
    pub async fn run_query(
        &self,
        descriptor: &QueryDescriptor,
    ) -> CatalogResult<Option<QueryData>> {
        self.executor.run_query(descriptor).await
    }

    /// Fresh idle live query
    pub fn live_query(&self) -> LiveQuery {
        LiveQuery::new(self.executor())
    }

    /// The shared store handle
    pub fn store(&self) -> &Arc<dyn DocumentStore> {
        self.executor.store()
    }

    /// The active configuration
    pub fn config(&self) -> &CatalogConfig {
        self.executor.config()
    }
}
