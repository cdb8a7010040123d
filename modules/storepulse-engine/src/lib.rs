//! Hybrid sentiment consensus engine.
//!
//! Reconciles the store's own buyer ratings with sentiment harvested
//! from external web sources via the Insight service, and produces a
//! human-readable verdict plus machine-readable scores, cached
//! independently per data source.

pub mod aggregator;
pub mod consensus;
pub mod engine;
pub mod existence;
pub mod fetcher;
#[cfg(any(test, feature = "test-support"))]
pub mod testing;
pub mod traits;

pub use engine::ConsensusEngine;
pub use fetcher::{ExternalSentiment, FetchOutcome};
pub use traits::CatalogStore;
