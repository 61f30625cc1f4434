use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StoreMetricsSnapshot {
    /// Batched by-source/by-target edge lookups that reached SQLite.
    pub edge_batches: u64,
    pub connected_edge_lookups: u64,
    pub node_lookups: u64,
    pub cache_hits: u64,
    pub cache_misses: u64,
}

#[derive(Default)]
pub struct StoreMetrics {
    edge_batches: AtomicU64,
    connected_edge_lookups: AtomicU64,
    node_lookups: AtomicU64,
    cache_hits: AtomicU64,
    cache_misses: AtomicU64,
}

impl StoreMetrics {
    pub fn snapshot(&self) -> StoreMetricsSnapshot {
        StoreMetricsSnapshot {
            edge_batches: self.edge_batches.load(Ordering::Relaxed),
            connected_edge_lookups: self.connected_edge_lookups.load(Ordering::Relaxed),
            node_lookups: self.node_lookups.load(Ordering::Relaxed),
            cache_hits: self.cache_hits.load(Ordering::Relaxed),
            cache_misses: self.cache_misses.load(Ordering::Relaxed),
        }
    }

    pub fn reset(&self) {
        self.edge_batches.store(0, Ordering::Relaxed);
        self.connected_edge_lookups.store(0, Ordering::Relaxed);
        self.node_lookups.store(0, Ordering::Relaxed);
        self.cache_hits.store(0, Ordering::Relaxed);
        self.cache_misses.store(0, Ordering::Relaxed);
    }

    pub fn record_edge_batch(&self) {
        self.edge_batches.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_connected_lookup(&self) {
        self.connected_edge_lookups.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_node_lookup(&self) {
        self.node_lookups.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_cache_hits(&self, count: u64) {
        self.cache_hits.fetch_add(count, Ordering::Relaxed);
    }

    pub fn record_cache_misses(&self, count: u64) {
        self.cache_misses.fetch_add(count, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reset_clears_all_counters() {
        let metrics = StoreMetrics::default();
        metrics.record_edge_batch();
        metrics.record_node_lookup();
        metrics.record_cache_hits(3);
        metrics.record_cache_misses(2);
        assert_eq!(metrics.snapshot().cache_hits, 3);
        metrics.reset();
        assert_eq!(metrics.snapshot(), StoreMetricsSnapshot::default());
    }
}
