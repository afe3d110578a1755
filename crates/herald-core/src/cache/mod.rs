//! In-memory caching.
//!
//! This module provides the type-partitioned cache that sits in front of
//! every backing store, together with its key and predicate types.

mod keys;
mod store;

pub use keys::{CacheKey, CachePredicate};
pub use store::TypedCacheStore;
