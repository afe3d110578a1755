//! Repository cache metrics recording.

use metrics::counter;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Registers the repository cache metric descriptions.
///
/// Call once at start-up, after a recorder has been installed.
pub fn register_cache_metrics() {
    metrics::describe_counter!(
        "herald_repository_cache_hits_total",
        "Items served from the repository cache"
    );
    metrics::describe_counter!(
        "herald_repository_cache_misses_total",
        "Requested items absent from the repository cache"
    );
    metrics::describe_counter!(
        "herald_repository_store_fetches_total",
        "Batched fetches issued to backing stores"
    );
}

/// Hit/miss recorder for the repository cache.
///
/// Keeps local atomic counters for cheap reads and mirrors every event into
/// the `metrics` facade.
#[derive(Debug, Clone, Default)]
pub struct CacheMetrics {
    hits: Arc<AtomicU64>,
    misses: Arc<AtomicU64>,
    fetches: Arc<AtomicU64>,
}

impl CacheMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `n` cache hits.
    pub fn record_hits(&self, n: u64) {
        if n == 0 {
            return;
        }
        self.hits.fetch_add(n, Ordering::Relaxed);
        counter!("herald_repository_cache_hits_total").increment(n);
    }

    /// Records `n` cache misses.
    pub fn record_misses(&self, n: u64) {
        if n == 0 {
            return;
        }
        self.misses.fetch_add(n, Ordering::Relaxed);
        counter!("herald_repository_cache_misses_total").increment(n);
    }

    /// Records one store fetch.
    pub fn record_fetch(&self, entity: &'static str) {
        self.fetches.fetch_add(1, Ordering::Relaxed);
        counter!("herald_repository_store_fetches_total", "entity" => entity).increment(1);
    }

    /// Hit rate in `[0, 1]`, for logging.
    pub fn hit_rate(&self) -> f64 {
        let hits = self.hits() as f64;
        let total = hits + self.misses() as f64;
        if total == 0.0 { 0.0 } else { hits / total }
    }

    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    pub fn misses(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }

    /// Returns the number of store fetches issued.
    pub fn fetches(&self) -> u64 {
        self.fetches.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hit_rate() {
        let metrics = CacheMetrics::new();
        assert_eq!(metrics.hit_rate(), 0.0);

        metrics.record_hits(3);
        metrics.record_misses(1);

        assert!((metrics.hit_rate() - 0.75).abs() < 0.001);
    }

    #[test]
    fn test_counters() {
        let metrics = CacheMetrics::new();
        metrics.record_hits(0);
        metrics.record_misses(2);
        metrics.record_fetch("Article");

        assert_eq!(metrics.hits(), 0);
        assert_eq!(metrics.misses(), 2);
        assert_eq!(metrics.fetches(), 1);
    }

    #[test]
    fn test_clones_share_counters() {
        let metrics = CacheMetrics::new();
        let other = metrics.clone();
        other.record_hits(1);
        assert_eq!(metrics.hits(), 1);
    }
}
