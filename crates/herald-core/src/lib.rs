//! # Herald Core
//!
//! Generic data-access substrate for Herald.
//!
//! This crate provides a thread-safe, type-partitioned cache and a
//! cache-aside repository that layers pluggable per-type persistence over
//! that cache.
//!
//! ## Features
//!
//! - [`TypedCacheStore`]: one strongly typed bucket per entity type, one mutex
//! - [`DataSource`]: the backing-store contract, with [`MemorySource`] built in
//! - [`SourceInvocator`]: per-type binding of get/set/delete/delete-all
//! - [`Repository`]: cache-then-store reads, store-then-cache writes
//!
//! ## Example
//!
//! ```
//! use std::sync::Arc;
//! use herald_core::{Entity, MemorySource, Repository, TypedCacheStore};
//!
//! #[derive(Debug, Clone)]
//! struct Subscription { channel: String }
//!
//! impl Entity for Subscription {
//!     fn object_id(&self) -> &str { &self.channel }
//! }
//!
//! let repository = Repository::new(
//!     Arc::new(TypedCacheStore::new()),
//!     Arc::new(MemorySource::default()),
//! );
//! repository.add_source_invocator::<Subscription>();
//!
//! repository.set_item(Subscription { channel: "42".into() })?;
//! let all = repository.try_get_items::<Subscription>(|_| true)?;
//! assert_eq!(all.len(), 1);
//! # Ok::<(), herald_core::SourceError>(())
//! ```

pub mod cache;
pub mod entity;
pub mod error;
pub mod metrics;
pub mod repository;
pub mod source;

// Re-exports
pub use cache::{CacheKey, CachePredicate, TypedCacheStore};
pub use entity::{Entity, EntityType};
pub use error::{SourceError, SourceResult};
pub use metrics::{CacheMetrics, register_cache_metrics};
pub use repository::{Repository, SourceInvocator};
pub use source::{DataSource, MemorySource};

/// Returns the crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_is_semver() {
        assert_eq!(version().split('.').count(), 3, "Version should be semver");
    }
}
