//! Cache-aside repository.
//!
//! The [`Repository`] routes reads through the cache first and the backing
//! store second, and writes through the store first and the cache second.
//! Each entity type is served by a [`SourceInvocator`] registered at feature
//! start-up; a type without an invocator degrades every operation to its
//! "nothing happened" value instead of failing.

mod invocator;

pub use invocator::SourceInvocator;

use std::any::{Any, TypeId};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use indexmap::IndexSet;
use parking_lot::Mutex;
use tracing::{debug, trace};

use crate::cache::{CacheKey, CachePredicate, TypedCacheStore};
use crate::entity::Entity;
use crate::error::SourceResult;
use crate::metrics::CacheMetrics;
use crate::source::DataSource;

type Invocators = HashMap<TypeId, Box<dyn Any + Send>>;

/// Cache-aside façade over a [`TypedCacheStore`] and per-type stores.
///
/// All operations are serialized by one repository-wide lock, which is held
/// while the invocator talks to its store. Store failures are returned to the
/// caller unmodified; on a failed write the cache is left untouched.
///
/// `S` is the default store used by [`Repository::add_source_invocator`].
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use herald_core::{CacheKey, Entity, MemorySource, Repository, TypedCacheStore};
///
/// #[derive(Debug, Clone, PartialEq)]
/// struct Article { id: String }
///
/// impl Entity for Article {
///     fn object_id(&self) -> &str { &self.id }
/// }
///
/// let cache = Arc::new(TypedCacheStore::new());
/// let repository = Repository::new(Arc::clone(&cache), Arc::new(MemorySource::default()));
/// repository.add_source_invocator::<Article>();
///
/// assert!(repository.set_item(Article { id: "a1".into() }).unwrap());
/// assert!(cache.contains(&CacheKey::<Article>::new("a1")));
///
/// let found = repository.try_get_item::<Article>(&["a1", "a2"]).unwrap();
/// assert_eq!(found, vec![Article { id: "a1".into() }]);
/// ```
pub struct Repository<S> {
    cache: Arc<TypedCacheStore>,
    source: Arc<S>,
    invocators: Mutex<Invocators>,
    metrics: CacheMetrics,
}

impl<S: Send + Sync + 'static> Repository<S> {
    /// Creates a repository over `cache`, bound to the default store `source`.
    pub fn new(cache: Arc<TypedCacheStore>, source: Arc<S>) -> Self {
        Self {
            cache,
            source,
            invocators: Mutex::new(HashMap::new()),
            metrics: CacheMetrics::new(),
        }
    }

    /// Returns the cache this repository maintains.
    pub fn cache(&self) -> &Arc<TypedCacheStore> {
        &self.cache
    }

    /// Returns the default store.
    pub fn source(&self) -> &Arc<S> {
        &self.source
    }

    /// Returns the cache hit/miss recorder.
    pub fn metrics(&self) -> &CacheMetrics {
        &self.metrics
    }

    // ============================================
    // Invocators
    // ============================================

    /// Registers `invocator` for `T`.
    ///
    /// Registration is idempotent and never overwrites an existing binding.
    /// Returns `true` if the invocator was registered.
    pub fn add_invocator<T: Entity>(&self, invocator: SourceInvocator<T>) -> bool {
        let mut invocators = self.invocators.lock();
        let entity = T::entity_type();

        if invocators.contains_key(&entity.type_id()) {
            trace!(%entity, "invocator already registered");
            return false;
        }

        invocators.insert(entity.type_id(), Box::new(invocator));
        debug!(%entity, "registered invocator");
        true
    }

    /// Registers an invocator for `T` bound to the default store.
    pub fn add_source_invocator<T: Entity>(&self) -> bool
    where
        S: DataSource<T>,
    {
        self.add_invocator(SourceInvocator::<T>::from_source(Arc::clone(&self.source)))
    }

    /// Removes the invocator for `T`. Returns `true` if one was registered.
    pub fn remove_invocator<T: Entity>(&self) -> bool {
        let removed = self
            .invocators
            .lock()
            .remove(&TypeId::of::<T>())
            .is_some();

        if removed {
            debug!(entity = %T::entity_type(), "removed invocator");
        }
        removed
    }

    /// Returns true if an invocator is registered for `T`.
    pub fn has_invocator<T: Entity>(&self) -> bool {
        self.invocators.lock().contains_key(&TypeId::of::<T>())
    }

    // ============================================
    // Reads and writes
    // ============================================

    /// Writes `item` to its store, then to the cache.
    ///
    /// Returns the store's success flag. Without an invocator for `T` this
    /// returns `Ok(false)` and the cache is not touched; when the store
    /// declines or fails the cache is not touched either.
    pub fn set_item<T: Entity>(&self, item: T) -> SourceResult<bool> {
        let invocators = self.invocators.lock();
        let Some(invocator) = invocator::<T>(&invocators) else {
            return Ok(false);
        };

        let stored = invocator.set(&item)?;
        if stored {
            self.cache.insert(item);
        }
        Ok(stored)
    }

    /// Fetches items by identifier.
    ///
    /// Identifiers are de-duplicated. Cached items are served directly; the
    /// remaining identifiers are fetched from the store in exactly one
    /// batched call and written into the cache. The result holds the cache
    /// hits first, followed by the freshly fetched items. Identifiers the
    /// store does not know are silently left out, and leave no cache entry.
    pub fn try_get_item<T: Entity>(&self, ids: &[impl AsRef<str>]) -> SourceResult<Vec<T>> {
        let invocators = self.invocators.lock();
        let Some(invocator) = invocator::<T>(&invocators) else {
            return Ok(Vec::new());
        };

        let ids: IndexSet<&str> = ids.iter().map(|id| id.as_ref()).collect();
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let keys: Vec<CacheKey<T>> = ids.iter().map(|id| CacheKey::new(*id)).collect();
        let mut result = self.cache.get_many(&keys);
        self.metrics.record_hits(result.len() as u64);

        if result.len() == ids.len() {
            return Ok(result);
        }

        let hits: HashSet<&str> = result.iter().map(Entity::object_id).collect();
        let missing: HashSet<&str> = ids.iter().copied().filter(|id| !hits.contains(id)).collect();
        drop(hits);

        self.metrics.record_misses(missing.len() as u64);
        self.metrics.record_fetch(T::entity_type().short_name());

        let fetched = invocator.get(&|item: &T| missing.contains(item.object_id()))?;
        debug!(
            entity = %T::entity_type(),
            requested = ids.len(),
            missing = missing.len(),
            fetched = fetched.len(),
            "fetched missing items from store"
        );

        for item in fetched {
            self.cache.insert(item.clone());
            result.push(item);
        }

        Ok(result)
    }

    /// Fetches every item matching `predicate` from the store.
    ///
    /// Predicates are not key-addressable, so the store is always queried.
    /// Every result is written through to the cache.
    pub fn try_get_items<T: Entity>(&self, predicate: impl Fn(&T) -> bool) -> SourceResult<Vec<T>> {
        let invocators = self.invocators.lock();
        let Some(invocator) = invocator::<T>(&invocators) else {
            return Ok(Vec::new());
        };

        self.metrics.record_fetch(T::entity_type().short_name());
        let items = invocator.get(&predicate)?;

        for item in &items {
            self.cache.insert(item.clone());
        }

        Ok(items)
    }

    /// Removes `item` from the cache, then deletes it from the store.
    ///
    /// Returns the store's affected-row count, or `0` without an invocator.
    pub fn delete_item<T: Entity>(&self, item: &T) -> SourceResult<usize> {
        let invocators = self.invocators.lock();
        let Some(invocator) = invocator::<T>(&invocators) else {
            return Ok(0);
        };

        self.cache.remove(&CacheKey::of(item));
        invocator.delete(item)
    }

    /// Clears every cached `T`, then deletes every `T` from the store.
    ///
    /// The cache is cleared before the store is asked to delete. If the store
    /// call fails, the cache stays empty while the store keeps its rows; the
    /// next read simply misses and re-fetches. Returns the store's count.
    pub fn delete_all<T: Entity>(&self) -> SourceResult<usize> {
        let invocators = self.invocators.lock();
        let Some(invocator) = invocator::<T>(&invocators) else {
            return Ok(0);
        };

        let evicted = self.cache.remove_where(&CachePredicate::<T>::all()).len();
        debug!(entity = %T::entity_type(), evicted, "cleared cached items");

        invocator.delete_all()
    }
}

impl<S> fmt::Debug for Repository<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Repository")
            .field("cache", &self.cache)
            .field("invocators", &self.invocators.lock().len())
            .field("metrics", &self.metrics)
            .finish_non_exhaustive()
    }
}

fn invocator<T: Entity>(invocators: &Invocators) -> Option<&SourceInvocator<T>> {
    invocators
        .get(&TypeId::of::<T>())
        .and_then(|inv| inv.downcast_ref::<SourceInvocator<T>>())
}
