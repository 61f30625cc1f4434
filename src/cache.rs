use ahash::AHashMap;
use parking_lot::RwLock;

use crate::graph::Edge;

/// Live edges incident to a node in one direction, keyed by node name.
#[derive(Default)]
pub struct AdjacencyCache {
    inner: RwLock<AHashMap<String, Vec<Edge>>>,
}

impl AdjacencyCache {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(AHashMap::new()),
        }
    }

    pub fn get(&self, key: &str) -> Option<Vec<Edge>> {
        self.inner.read().get(key).cloned()
    }

    pub fn insert(&self, key: String, value: Vec<Edge>) {
        self.inner.write().insert(key, value);
    }

    pub fn clear(&self) {
        self.inner.write().clear();
    }
}
