//! Catalog - live document queries over a hosted document store
//!
//! A screen describes what it wants with a [`QueryDescriptor`]; the catalog
//! fetches it once or keeps it live, expands embedded references into inline
//! records and normalizes store timestamps into dates.
//!
//! # Quick Start
//!
//! ```ignore
//! use catalog::{Catalog, FilterOp, InMemoryStore, QueryDescriptor};
//!
//! let catalog = Catalog::builder().store(InMemoryStore::new()).build()?;
//!
//! // One-shot
//! let assets = catalog
//!     .run_query(&QueryDescriptor::new("assets").filter("isApproved", FilterOp::Eq, true))
//!     .await?;
//!
//! // Live
//! let mut query = catalog.live_query();
//! query.observe(&QueryDescriptor::new("assets"));
//! let state = query.settled().await;
//! let (is_loading, is_errored, data) = state.as_tuple();
//! ```
//!
//! # Architecture
//!
//! `catalog-core` holds the synchronous data model (values, references,
//! descriptors, query keys). `catalog-engine` holds everything that talks to
//! a store. Both are re-exported here.

pub use catalog_core::*;
pub use catalog_engine::*;
