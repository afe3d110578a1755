//! Per-entity-type bindings of store operations.

use std::fmt;
use std::sync::Arc;

use crate::entity::Entity;
use crate::error::SourceResult;
use crate::source::DataSource;

type GetFn<T> = dyn Fn(&dyn Fn(&T) -> bool) -> SourceResult<Vec<T>> + Send + Sync;
type SetFn<T> = dyn Fn(&T) -> SourceResult<bool> + Send + Sync;
type DeleteFn<T> = dyn Fn(&T) -> SourceResult<usize> + Send + Sync;
type DeleteAllFn = dyn Fn() -> SourceResult<usize> + Send + Sync;

/// Binds the four row-level operations of one entity type to a store.
///
/// An invocator is stateless: it carries no cache and no lock of its own.
/// Cloning is cheap and shares the underlying closures.
pub struct SourceInvocator<T> {
    get: Arc<GetFn<T>>,
    set: Arc<SetFn<T>>,
    delete: Arc<DeleteFn<T>>,
    delete_all: Arc<DeleteAllFn>,
}

impl<T: Entity> SourceInvocator<T> {
    /// Creates an invocator from four explicit operations.
    pub fn new<G, S, D, A>(get: G, set: S, delete: D, delete_all: A) -> Self
    where
        G: Fn(&dyn Fn(&T) -> bool) -> SourceResult<Vec<T>> + Send + Sync + 'static,
        S: Fn(&T) -> SourceResult<bool> + Send + Sync + 'static,
        D: Fn(&T) -> SourceResult<usize> + Send + Sync + 'static,
        A: Fn() -> SourceResult<usize> + Send + Sync + 'static,
    {
        Self {
            get: Arc::new(get),
            set: Arc::new(set),
            delete: Arc::new(delete),
            delete_all: Arc::new(delete_all),
        }
    }

    /// Creates an invocator forwarding every operation to `source`.
    pub fn from_source<S>(source: Arc<S>) -> Self
    where
        S: DataSource<T> + ?Sized + 'static,
    {
        let get_src = Arc::clone(&source);
        let set_src = Arc::clone(&source);
        let delete_src = Arc::clone(&source);

        Self::new(
            move |predicate| get_src.find(predicate),
            move |item| set_src.set(item),
            move |item| delete_src.delete(item),
            move || source.delete_all(),
        )
    }

    /// Fetches every item matching `predicate`.
    pub fn get(&self, predicate: &dyn Fn(&T) -> bool) -> SourceResult<Vec<T>> {
        (self.get)(predicate)
    }

    /// Writes `item` to the store.
    pub fn set(&self, item: &T) -> SourceResult<bool> {
        (self.set)(item)
    }

    /// Deletes `item` from the store.
    pub fn delete(&self, item: &T) -> SourceResult<usize> {
        (self.delete)(item)
    }

    /// Deletes every item of the type from the store.
    pub fn delete_all(&self) -> SourceResult<usize> {
        (self.delete_all)()
    }
}

impl<T> Clone for SourceInvocator<T> {
    fn clone(&self) -> Self {
        Self {
            get: Arc::clone(&self.get),
            set: Arc::clone(&self.set),
            delete: Arc::clone(&self.delete),
            delete_all: Arc::clone(&self.delete_all),
        }
    }
}

impl<T: Entity> fmt::Debug for SourceInvocator<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SourceInvocator")
            .field("entity", &T::entity_type().short_name())
            .finish_non_exhaustive()
    }
}
