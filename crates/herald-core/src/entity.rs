//! Entities: domain objects with a stable string identifier.

use std::any::{TypeId, type_name};
use std::fmt;
use std::hash::{Hash, Hasher};

/// A cacheable, persistable domain object.
///
/// Every entity exposes a stable string identifier. Two entities of the same
/// type with the same identifier are considered the same row by both the
/// cache and the backing store.
///
/// # Example
///
/// ```
/// use herald_core::Entity;
///
/// #[derive(Debug, Clone)]
/// struct Article {
///     id: String,
/// }
///
/// impl Entity for Article {
///     fn object_id(&self) -> &str {
///         &self.id
///     }
/// }
///
/// let article = Article { id: "a1".into() };
/// assert_eq!(article.object_id(), "a1");
/// ```
pub trait Entity: Clone + Send + Sync + 'static {
    /// Returns the stable identifier of this entity.
    fn object_id(&self) -> &str;

    /// Returns the type descriptor used to partition caches and stores.
    fn entity_type() -> EntityType
    where
        Self: Sized,
    {
        EntityType::of::<Self>()
    }
}

/// Identifies one entity type.
///
/// Equality and hashing use the [`TypeId`] only; the name is kept for
/// logging and error messages.
#[derive(Debug, Clone, Copy)]
pub struct EntityType {
    id: TypeId,
    name: &'static str,
}

impl EntityType {
    /// Returns the descriptor for `T`.
    pub fn of<T: 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: type_name::<T>(),
        }
    }

    /// Returns the underlying type identifier.
    pub fn type_id(&self) -> TypeId {
        self.id
    }

    /// Returns the fully qualified type name.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Returns the type name without its module path.
    pub fn short_name(&self) -> &'static str {
        let base = self.name.split('<').next().unwrap_or(self.name);
        base.rsplit("::").next().unwrap_or(base)
    }
}

impl PartialEq for EntityType {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for EntityType {}

impl Hash for EntityType {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.short_name())
    }
}
