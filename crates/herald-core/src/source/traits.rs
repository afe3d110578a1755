//! Backing store trait definition.

use crate::entity::Entity;
use crate::error::SourceResult;

/// An authoritative store of entities of type `T`.
///
/// Stores behave like row-level access keyed by the entity's own string
/// identifier. Implementations must be safe under concurrent invocation:
/// the repository calls them while holding its own lock, but other callers
/// may hold the same store.
///
/// A store type usually implements `DataSource<T>` for every entity type
/// it can hold, so one store instance can back many repositories'
/// invocators.
///
/// # Implementors
///
/// - [`MemorySource`](crate::MemorySource) - in-process rows, one key space per type
///
/// # Example
///
/// ```ignore
/// use herald_core::{DataSource, Entity, SourceResult};
///
/// struct SqliteSource { /* ... */ }
///
/// impl<T: Entity + Row> DataSource<T> for SqliteSource {
///     fn get(&self, id: &str) -> SourceResult<Option<T>> { /* ... */ }
///     // ...
/// }
/// ```
pub trait DataSource<T: Entity>: Send + Sync {
    /// Fetches one item by identifier.
    fn get(&self, id: &str) -> SourceResult<Option<T>>;

    /// Fetches every item matching `predicate`.
    fn find(&self, predicate: &dyn Fn(&T) -> bool) -> SourceResult<Vec<T>>;

    /// Inserts or replaces `item`.
    ///
    /// Returns `false` if the store declined the write without failing.
    fn set(&self, item: &T) -> SourceResult<bool>;

    /// Deletes `item`, returning the number of affected rows.
    fn delete(&self, item: &T) -> SourceResult<usize>;

    /// Deletes every item of type `T`, returning the number of affected rows.
    fn delete_all(&self) -> SourceResult<usize>;

    /// Returns the name of this store, used for logging.
    fn name(&self) -> &str {
        "source"
    }
}
