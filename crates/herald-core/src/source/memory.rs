//! In-process backing store.

use std::sync::atomic::{AtomicU64, Ordering};

use tracing::debug;

use super::DataSource;
use crate::cache::{CacheKey, CachePredicate, TypedCacheStore};
use crate::entity::Entity;
use crate::error::SourceResult;

/// A thread-safe in-memory store holding rows of any entity type.
///
/// Rows live in their own [`TypedCacheStore`], separate from any cache the
/// repository keeps in front of this store. Useful as the default store of
/// a host without a database, and as the reference store in tests.
#[derive(Debug)]
pub struct MemorySource {
    name: String,
    rows: TypedCacheStore,
    writes: AtomicU64,
}

impl MemorySource {
    /// Creates an empty store with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            rows: TypedCacheStore::new(),
            writes: AtomicU64::new(0),
        }
    }

    /// Returns the number of stored rows of type `T`.
    pub fn row_count<T: Entity>(&self) -> usize {
        self.rows.len::<T>()
    }

    /// Returns the number of successful writes and deletes since creation.
    pub fn write_count(&self) -> u64 {
        self.writes.load(Ordering::Relaxed)
    }

    fn record_write(&self, rows: usize) {
        self.writes.fetch_add(rows as u64, Ordering::Relaxed);
    }
}

impl Default for MemorySource {
    fn default() -> Self {
        Self::new("memory")
    }
}

impl<T: Entity> DataSource<T> for MemorySource {
    fn get(&self, id: &str) -> SourceResult<Option<T>> {
        Ok(self.rows.get(&CacheKey::<T>::new(id)))
    }

    fn find(&self, predicate: &dyn Fn(&T) -> bool) -> SourceResult<Vec<T>> {
        Ok(self
            .rows
            .find(&CachePredicate::new(|item: &T| predicate(item)))
            .unwrap_or_default())
    }

    fn set(&self, item: &T) -> SourceResult<bool> {
        self.rows.insert(item.clone());
        self.record_write(1);
        Ok(true)
    }

    fn delete(&self, item: &T) -> SourceResult<usize> {
        let removed = usize::from(self.rows.remove(&CacheKey::of(item)).is_some());
        self.record_write(removed);
        Ok(removed)
    }

    fn delete_all(&self) -> SourceResult<usize> {
        let removed = self.rows.remove_where(&CachePredicate::<T>::all()).len();
        self.record_write(removed);
        debug!(
            source = %self.name,
            entity = %T::entity_type(),
            removed,
            "deleted all rows"
        );
        Ok(removed)
    }

    fn name(&self) -> &str {
        &self.name
    }
}
