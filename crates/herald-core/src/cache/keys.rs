//! Typed cache keys and predicates.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;

use crate::entity::{Entity, EntityType};

/// Key addressing one cached item of type `T`.
///
/// The entity type is carried in the key's type parameter, so a key can
/// only ever address the bucket of its own type.
///
/// # Examples
///
/// ```
/// use herald_core::{CacheKey, Entity};
///
/// #[derive(Clone)]
/// struct Article { id: String }
///
/// impl Entity for Article {
///     fn object_id(&self) -> &str { &self.id }
/// }
///
/// let key = CacheKey::<Article>::new("a1");
/// assert_eq!(key.id(), "a1");
/// assert_eq!(key.to_string(), "Article:a1");
/// ```
pub struct CacheKey<T> {
    id: String,
    _entity: PhantomData<fn() -> T>,
}

impl<T: Entity> CacheKey<T> {
    /// Creates a key for the item with the given identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            _entity: PhantomData,
        }
    }

    /// Creates the key under which `item` is cached.
    pub fn of(item: &T) -> Self {
        Self::new(item.object_id())
    }

    /// Returns the item identifier.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Returns the entity type this key belongs to.
    pub fn entity_type(&self) -> EntityType {
        T::entity_type()
    }
}

impl<T> Clone for CacheKey<T> {
    fn clone(&self) -> Self {
        Self {
            id: self.id.clone(),
            _entity: PhantomData,
        }
    }
}

impl<T> PartialEq for CacheKey<T> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl<T> Eq for CacheKey<T> {}

impl<T> Hash for CacheKey<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl<T: Entity> fmt::Debug for CacheKey<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheKey")
            .field("entity", &self.entity_type().short_name())
            .field("id", &self.id)
            .finish()
    }
}

impl<T: Entity> fmt::Display for CacheKey<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.entity_type(), self.id)
    }
}

/// Selects a subset of the cached items of type `T`.
///
/// Predicates run while the store lock is held and must not call back
/// into the store.
pub struct CachePredicate<'a, T> {
    predicate: Box<dyn Fn(&T) -> bool + 'a>,
}

impl<'a, T: Entity> CachePredicate<'a, T> {
    /// Wraps a closure as a cache predicate.
    pub fn new(predicate: impl Fn(&T) -> bool + 'a) -> Self {
        Self {
            predicate: Box::new(predicate),
        }
    }

    /// A predicate matching every item of the type.
    pub fn all() -> Self {
        Self::new(|_| true)
    }

    /// Evaluates the predicate against one item.
    pub fn matches(&self, item: &T) -> bool {
        (self.predicate)(item)
    }

    /// Returns the entity type whose bucket this predicate selects from.
    pub fn entity_type(&self) -> EntityType {
        T::entity_type()
    }
}

impl<T: Entity> fmt::Debug for CachePredicate<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CachePredicate")
            .field("entity", &self.entity_type().short_name())
            .finish_non_exhaustive()
    }
}
