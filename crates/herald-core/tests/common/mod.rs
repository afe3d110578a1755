#![allow(dead_code)]
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use herald_core::{
    DataSource, Entity, MemorySource, Repository, SourceError, SourceResult, TypedCacheStore,
};

/// Minimal entity used across the integration tests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Article {
    pub id: String,
    pub title: String,
}

impl Entity for Article {
    fn object_id(&self) -> &str {
        &self.id
    }
}

pub fn article(id: &str) -> Article {
    Article {
        id: id.to_string(),
        title: format!("title of {id}"),
    }
}

/// Store stub wrapping a `MemorySource`, counting calls and failing on demand.
#[derive(Default)]
pub struct RecordingSource {
    pub inner: MemorySource,
    pub fetches: AtomicUsize,
    pub fail_writes: AtomicBool,
    pub fail_reads: AtomicBool,
    pub decline_writes: AtomicBool,
}

impl RecordingSource {
    pub fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    pub fn decline_writes(&self, decline: bool) {
        self.decline_writes.store(decline, Ordering::SeqCst);
    }

    fn check_write(&self) -> SourceResult<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(SourceError::unavailable("write refused by test"));
        }
        Ok(())
    }
}

impl<T: Entity> DataSource<T> for RecordingSource {
    fn get(&self, id: &str) -> SourceResult<Option<T>> {
        self.inner.get(id)
    }

    fn find(&self, predicate: &dyn Fn(&T) -> bool) -> SourceResult<Vec<T>> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(SourceError::unavailable("read refused by test"));
        }
        self.inner.find(predicate)
    }

    fn set(&self, item: &T) -> SourceResult<bool> {
        self.check_write()?;
        if self.decline_writes.load(Ordering::SeqCst) {
            return Ok(false);
        }
        self.inner.set(item)
    }

    fn delete(&self, item: &T) -> SourceResult<usize> {
        self.check_write()?;
        self.inner.delete(item)
    }

    fn delete_all(&self) -> SourceResult<usize> {
        self.check_write()?;
        DataSource::<T>::delete_all(&self.inner)
    }
}

/// Builds a repository over a fresh cache and recording store, with
/// `Article` registered.
pub fn article_repository() -> (Arc<TypedCacheStore>, Arc<RecordingSource>, Repository<RecordingSource>) {
    let cache = Arc::new(TypedCacheStore::new());
    let source = Arc::new(RecordingSource::default());
    let repository = Repository::new(Arc::clone(&cache), Arc::clone(&source));
    repository.add_source_invocator::<Article>();
    (cache, source, repository)
}
