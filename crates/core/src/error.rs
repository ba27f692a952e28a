//! Error types for the catalog read layer
//!
//! Every failure the query path can produce is one of a small set of kinds:
//! - Construction: the descriptor cannot be turned into a native query
//! - Transport: the store failed during a fetch or a live listener
//! - Resolution: fetching a referenced document failed while formatting
//!
//! We use `thiserror` for the `Display` and `Error` implementations.

use crate::reference::Reference;
use std::io;
use thiserror::Error;

/// Result type alias for catalog operations
pub type CatalogResult<T> = std::result::Result<T, CatalogError>;

/// Coarse classification of a [`CatalogError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Bad descriptor, never retried
    Construction,
    /// Store or network failure
    Transport,
    /// Referenced document fetch failed
    Resolution,
    /// Invalid or unreadable configuration
    Config,
    /// Local I/O failure
    Io,
}

/// Error types for the catalog read layer
#[derive(Debug, Error)]
pub enum CatalogError {
    /// The query descriptor cannot be executed as given
    #[error("Invalid query: {0}")]
    Construction(String),

    /// The store failed while fetching or listening
    #[error("Transport error: {0}")]
    Transport(String),

    /// A referenced document could not be fetched while formatting a record
    #[error("Failed to resolve reference {reference}: {source}")]
    Resolution {
        /// The reference being resolved
        reference: Reference,
        /// The underlying failure
        #[source]
        source: Box<CatalogError>,
    },

    /// Configuration could not be parsed or validated
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O error (config files)
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl CatalogError {
    /// Create a construction error
    pub fn construction(msg: impl Into<String>) -> Self {
        CatalogError::Construction(msg.into())
    }

    /// Create a transport error
    pub fn transport(msg: impl Into<String>) -> Self {
        CatalogError::Transport(msg.into())
    }

    /// Create a config error
    pub fn config(msg: impl Into<String>) -> Self {
        CatalogError::Config(msg.into())
    }

    /// Wrap `source` as the failure to resolve `reference`
    pub fn resolution(reference: Reference, source: CatalogError) -> Self {
        CatalogError::Resolution {
            reference,
            source: Box::new(source),
        }
    }

    /// Classify this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            CatalogError::Construction(_) => ErrorKind::Construction,
            CatalogError::Transport(_) => ErrorKind::Transport,
            CatalogError::Resolution { .. } => ErrorKind::Resolution,
            CatalogError::Config(_) => ErrorKind::Config,
            CatalogError::Io(_) => ErrorKind::Io,
        }
    }

    /// Whether a consumer may see this error go away by re-running the query.
    ///
    /// Construction and config errors are permanent for a given descriptor.
    pub fn is_transient(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::Transport | ErrorKind::Resolution | ErrorKind::Io
        )
    }
}
