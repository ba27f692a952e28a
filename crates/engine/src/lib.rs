//! Query engine for the catalog read layer
//!
//! This crate runs descriptors from `catalog-core` against a document store:
//! - Store: the [`DocumentStore`] seam plus the in-memory implementation
//! - Resolution: reference expansion and the formatting pipeline
//! - Execution: one-shot queries ([`QueryExecutor`]) and live queries
//!   ([`LiveQuery`])
//! - Context: [`Catalog`], which owns the store handle, the error reporter
//!   and the configuration
//!
//! The engine is the only component that knows about:
//! - Native query translation and its limits
//! - Listener lifecycles
//! - Error reporting

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod context;
pub mod executor;
pub mod format;
pub mod live;
pub mod logging;
pub mod report;
pub mod resolve;
pub mod store;

pub use config::{CatalogConfig, LoggingConfig, CONFIG_FILE_NAME};
pub use context::{Catalog, CatalogBuilder};
pub use executor::{QueryData, QueryExecutor};
pub use format::{format_document, format_documents};
pub use live::{LiveQuery, QueryPhase, QueryState};
pub use logging::init_tracing;
pub use report::{CollectingReporter, ErrorReporter, TracingReporter};
pub use resolve::{
    fetch_inline, resolve_array_references, resolve_references, ResolveOptions,
    LEGACY_PARENT_FIELD,
};
pub use store::{
    DocumentStore, InMemoryStore, ListenTarget, Listener, ListenerRegistration, NativeQuery,
    QueryLimits, QueryPlan, Snapshot, SnapshotResult,
};
