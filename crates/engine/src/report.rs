//! Error reporting sink
//!
//! Every pipeline failure is handed to an [`ErrorReporter`] once. Reporting is
//! fire-and-forget and never changes control flow.

use catalog_core::{CatalogError, ErrorKind};
use parking_lot::Mutex;
use tracing::error;

/// Destination for query failures
pub trait ErrorReporter: Send + Sync {
    /// Record a failure
    fn report(&self, error: &CatalogError);
}

impl<F> ErrorReporter for F
where
    F: Fn(&CatalogError) + Send + Sync,
{
    fn report(&self, error: &CatalogError) {
        self(error)
    }
}

/// Logs failures through `tracing`
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingReporter;

impl ErrorReporter for TracingReporter {
    fn report(&self, error: &CatalogError) {
        error!(target: "catalog::query", kind = ?error.kind(), error = %error, "Query failed");
    }
}

/// Keeps every reported failure in memory
#[derive(Debug, Default)]
pub struct CollectingReporter {
    reported: Mutex<Vec<(ErrorKind, String)>>,
}

impl CollectingReporter {
    /// Create an empty reporter
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of failures reported so far
    pub fn count(&self) -> usize {
        self.reported.lock().len()
    }

    /// Kinds of the reported failures, in order
    pub fn kinds(&self) -> Vec<ErrorKind> {
        self.reported.lock().iter().map(|(kind, _)| *kind).collect()
    }

    /// Messages of the reported failures, in order
    pub fn messages(&self) -> Vec<String> {
        self.reported
            .lock()
            .iter()
            .map(|(_, msg)| msg.clone())
            .collect()
    }
}

impl ErrorReporter for CollectingReporter {
    fn report(&self, error: &CatalogError) {
        self.reported.lock().push((error.kind(), error.to_string()));
    }
}
