//! Thread-safe, type-partitioned in-memory store.

use std::any::{Any, TypeId};
use std::collections::HashMap;

use parking_lot::Mutex;
use tracing::trace;

use super::keys::{CacheKey, CachePredicate};
use crate::entity::Entity;

/// One strongly typed bucket. Items are keyed by their identifier.
type Bucket<T> = HashMap<String, T>;

/// A registry of strongly typed buckets, one per entity type.
///
/// Each bucket is created on the first write of its type and owns its own
/// key space, so `CacheKey<A>::new("1")` and `CacheKey<B>::new("1")` never
/// collide. The whole store sits behind a single mutex; every operation is
/// short (O(1) for keyed access, O(items of one type) for predicates).
///
/// The lock is not reentrant: predicates must not call back into the store.
///
/// # Examples
///
/// ```
/// use herald_core::{CacheKey, CachePredicate, Entity, TypedCacheStore};
///
/// #[derive(Debug, Clone, PartialEq)]
/// struct Article { id: String }
///
/// impl Entity for Article {
///     fn object_id(&self) -> &str { &self.id }
/// }
///
/// let store = TypedCacheStore::new();
/// let key = CacheKey::<Article>::new("a1");
///
/// // No bucket yet: predicate reads report "absent".
/// assert!(store.find(&CachePredicate::<Article>::all()).is_none());
///
/// store.set(&key, Article { id: "a1".into() });
/// assert!(store.contains(&key));
/// assert_eq!(store.get(&key).map(|a| a.id), Some("a1".to_string()));
/// ```
#[derive(Default)]
pub struct TypedCacheStore {
    buckets: Mutex<HashMap<TypeId, Box<dyn Any + Send>>>,
}

impl TypedCacheStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `item` under `key`, replacing any previous value.
    ///
    /// Returns the replaced item, if there was one.
    pub fn set<T: Entity>(&self, key: &CacheKey<T>, item: T) -> Option<T> {
        let mut buckets = self.buckets.lock();
        bucket_mut_or_insert::<T>(&mut buckets).insert(key.id().to_string(), item)
    }

    /// Stores `item` under its own identifier.
    pub fn insert<T: Entity>(&self, item: T) -> Option<T> {
        let key = CacheKey::of(&item);
        self.set(&key, item)
    }

    /// Returns a copy of the item stored under `key`.
    pub fn get<T: Entity>(&self, key: &CacheKey<T>) -> Option<T> {
        let buckets = self.buckets.lock();
        bucket::<T>(&buckets).and_then(|b| b.get(key.id()).cloned())
    }

    /// Returns the items stored under `keys`, silently skipping missing ones.
    ///
    /// Items are returned in key order.
    pub fn get_many<T: Entity>(&self, keys: &[CacheKey<T>]) -> Vec<T> {
        let buckets = self.buckets.lock();
        match bucket::<T>(&buckets) {
            Some(b) => keys.iter().filter_map(|k| b.get(k.id()).cloned()).collect(),
            None => Vec::new(),
        }
    }

    /// Returns the items of type `T` matching `predicate`.
    ///
    /// `None` means the bucket for `T` has never been created; `Some` with an
    /// empty vector means the bucket exists but nothing matched.
    pub fn find<T: Entity>(&self, predicate: &CachePredicate<'_, T>) -> Option<Vec<T>> {
        let buckets = self.buckets.lock();
        bucket::<T>(&buckets).map(|b| {
            b.values()
                .filter(|item| predicate.matches(item))
                .cloned()
                .collect()
        })
    }

    /// Removes and returns the item stored under `key`.
    pub fn remove<T: Entity>(&self, key: &CacheKey<T>) -> Option<T> {
        let mut buckets = self.buckets.lock();
        bucket_mut::<T>(&mut buckets).and_then(|b| b.remove(key.id()))
    }

    /// Removes every item of type `T` matching `predicate`, returning them.
    ///
    /// The bucket itself survives, even when it ends up empty.
    pub fn remove_where<T: Entity>(&self, predicate: &CachePredicate<'_, T>) -> Vec<T> {
        let mut buckets = self.buckets.lock();
        let Some(b) = bucket_mut::<T>(&mut buckets) else {
            return Vec::new();
        };

        let doomed: Vec<String> = b
            .iter()
            .filter(|(_, item)| predicate.matches(item))
            .map(|(id, _)| id.clone())
            .collect();

        let removed: Vec<T> = doomed.iter().filter_map(|id| b.remove(id)).collect();
        trace!(
            entity = %T::entity_type(),
            removed = removed.len(),
            "removed cached items by predicate"
        );
        removed
    }

    /// Returns true if an item is stored under `key`.
    pub fn contains<T: Entity>(&self, key: &CacheKey<T>) -> bool {
        let buckets = self.buckets.lock();
        bucket::<T>(&buckets).is_some_and(|b| b.contains_key(key.id()))
    }

    /// Returns true if a bucket for `T` exists.
    pub fn contains_type<T: Entity>(&self) -> bool {
        self.buckets.lock().contains_key(&TypeId::of::<T>())
    }

    /// Returns the number of cached items of type `T`.
    pub fn len<T: Entity>(&self) -> usize {
        let buckets = self.buckets.lock();
        bucket::<T>(&buckets).map_or(0, HashMap::len)
    }

    /// Returns the number of type buckets.
    pub fn bucket_count(&self) -> usize {
        self.buckets.lock().len()
    }

    /// Drops every bucket.
    pub fn clear(&self) {
        self.buckets.lock().clear();
    }
}

impl std::fmt::Debug for TypedCacheStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TypedCacheStore")
            .field("buckets", &self.bucket_count())
            .finish()
    }
}

fn bucket<T: Entity>(buckets: &HashMap<TypeId, Box<dyn Any + Send>>) -> Option<&Bucket<T>> {
    buckets
        .get(&TypeId::of::<T>())
        .and_then(|b| b.downcast_ref::<Bucket<T>>())
}

fn bucket_mut<T: Entity>(
    buckets: &mut HashMap<TypeId, Box<dyn Any + Send>>,
) -> Option<&mut Bucket<T>> {
    buckets
        .get_mut(&TypeId::of::<T>())
        .and_then(|b| b.downcast_mut::<Bucket<T>>())
}

fn bucket_mut_or_insert<T: Entity>(
    buckets: &mut HashMap<TypeId, Box<dyn Any + Send>>,
) -> &mut Bucket<T> {
    let slot = buckets
        .entry(TypeId::of::<T>())
        .or_insert_with(|| Box::new(Bucket::<T>::new()));

    // The slot for TypeId::of::<T>() only ever holds a Bucket<T>.
    match slot.downcast_mut::<Bucket<T>>() {
        Some(b) => b,
        None => unreachable!("bucket registered under a foreign type id"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Article {
        id: String,
        title: String,
    }

    impl Article {
        fn new(id: &str, title: &str) -> Self {
            Self {
                id: id.to_string(),
                title: title.to_string(),
            }
        }
    }

    impl Entity for Article {
        fn object_id(&self) -> &str {
            &self.id
        }
    }

    #[derive(Debug, Clone, PartialEq)]
    struct Channel {
        id: String,
    }

    impl Entity for Channel {
        fn object_id(&self) -> &str {
            &self.id
        }
    }

    #[test]
    fn test_set_get_overwrite() {
        let store = TypedCacheStore::new();
        let key = CacheKey::<Article>::new("a1");

        assert!(store.set(&key, Article::new("a1", "first")).is_none());
        let previous = store.set(&key, Article::new("a1", "second"));

        assert_eq!(previous.map(|a| a.title), Some("first".to_string()));
        assert_eq!(store.get(&key).map(|a| a.title), Some("second".to_string()));
        assert_eq!(store.len::<Article>(), 1);
    }

    #[test]
    fn test_buckets_do_not_share_keys() {
        let store = TypedCacheStore::new();
        store.insert(Article::new("1", "article"));
        store.insert(Channel {
            id: "1".to_string(),
        });

        assert_eq!(store.bucket_count(), 2);
        assert!(store.remove(&CacheKey::<Channel>::new("1")).is_some());
        assert!(store.contains(&CacheKey::<Article>::new("1")));
        assert!(!store.contains(&CacheKey::<Channel>::new("1")));
    }

    #[test]
    fn test_get_many_skips_missing() {
        let store = TypedCacheStore::new();
        store.insert(Article::new("a1", "one"));
        store.insert(Article::new("a3", "three"));

        let keys = ["a1", "a2", "a3"].map(CacheKey::<Article>::new);
        let ids: Vec<String> = store.get_many(&keys).into_iter().map(|a| a.id).collect();

        assert_eq!(ids, vec!["a1", "a3"]);
        assert!(store.get_many::<Channel>(&[CacheKey::new("a1")]).is_empty());
    }

    #[test]
    fn test_find_absent_vs_empty() {
        let store = TypedCacheStore::new();
        let none = CachePredicate::<Article>::new(|a| a.title == "missing");

        assert_eq!(store.find(&none), None);

        store.insert(Article::new("a1", "one"));
        assert_eq!(store.find(&none), Some(Vec::new()));
        assert_eq!(store.find(&CachePredicate::<Article>::all()).map(|v| v.len()), Some(1));
    }

    #[test]
    fn test_remove_where() {
        let store = TypedCacheStore::new();
        store.insert(Article::new("a1", "keep"));
        store.insert(Article::new("a2", "drop"));
        store.insert(Article::new("a3", "drop"));

        let removed = store.remove_where(&CachePredicate::<Article>::new(|a| a.title == "drop"));

        assert_eq!(removed.len(), 2);
        assert_eq!(store.len::<Article>(), 1);
        assert!(store.contains(&CacheKey::<Article>::new("a1")));

        let removed = store.remove_where(&CachePredicate::<Article>::all());
        assert_eq!(removed.len(), 1);
        // The bucket survives an emptying removal.
        assert_eq!(store.find(&CachePredicate::<Article>::all()), Some(Vec::new()));
    }

    #[test]
    fn test_remove_missing() {
        let store = TypedCacheStore::new();
        assert!(store.remove(&CacheKey::<Article>::new("nope")).is_none());
        assert!(store.remove_where(&CachePredicate::<Article>::all()).is_empty());
        assert!(!store.contains_type::<Article>());
    }

    #[test]
    fn test_concurrent_writers() {
        use std::sync::Arc;
        use std::thread;

        let store = Arc::new(TypedCacheStore::new());
        let handles: Vec<_> = (0..8)
            .map(|t| {
                let store = Arc::clone(&store);
                thread::spawn(move || {
                    for i in 0..100 {
                        store.insert(Article::new(&format!("{t}-{i}"), "x"));
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(store.len::<Article>(), 800);
    }
}
