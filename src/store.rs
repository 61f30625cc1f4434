//! Graph store port consumed by the traversal engine and the assembler. Edge
//! lookups are batched by name set so a traversal costs one round-trip per BFS
//! layer rather than one per edge. Implementations must hide soft-deleted edges
//! from every method; callers never filter on `deleted_at` themselves.

use std::sync::Arc;

use ahash::AHashSet;

use crate::{
    errors::LineageError,
    graph::{Edge, Node},
};

pub trait GraphStore {
    /// Live edges whose target is one of `names`.
    fn find_edges_by_targets(&self, names: &AHashSet<String>) -> Result<Vec<Edge>, LineageError>;
    /// Live edges whose source is one of `names`.
    fn find_edges_by_sources(&self, names: &AHashSet<String>) -> Result<Vec<Edge>, LineageError>;
    /// Live edges with `name` at either end, sorted by `(source, target)`.
    fn find_connected_edges(&self, name: &str) -> Result<Vec<Edge>, LineageError>;
    fn find_node(&self, name: &str) -> Result<Option<Node>, LineageError>;
    fn exists_node(&self, name: &str) -> Result<bool, LineageError>;

    /// Nodes registered under any of `names`; missing names are skipped.
    fn find_nodes(&self, names: &[String]) -> Result<Vec<Node>, LineageError> {
        let mut nodes = Vec::with_capacity(names.len());
        for name in names {
            if let Some(node) = self.find_node(name)? {
                nodes.push(node);
            }
        }
        Ok(nodes)
    }
}

impl<'a, S> GraphStore for &'a S
where
    S: GraphStore + ?Sized,
{
    fn find_edges_by_targets(&self, names: &AHashSet<String>) -> Result<Vec<Edge>, LineageError> {
        (*self).find_edges_by_targets(names)
    }

    fn find_edges_by_sources(&self, names: &AHashSet<String>) -> Result<Vec<Edge>, LineageError> {
        (*self).find_edges_by_sources(names)
    }

    fn find_connected_edges(&self, name: &str) -> Result<Vec<Edge>, LineageError> {
        (*self).find_connected_edges(name)
    }

    fn find_node(&self, name: &str) -> Result<Option<Node>, LineageError> {
        (*self).find_node(name)
    }

    fn exists_node(&self, name: &str) -> Result<bool, LineageError> {
        (*self).exists_node(name)
    }

    fn find_nodes(&self, names: &[String]) -> Result<Vec<Node>, LineageError> {
        (*self).find_nodes(names)
    }
}

impl<S> GraphStore for Arc<S>
where
    S: GraphStore + ?Sized,
{
    fn find_edges_by_targets(&self, names: &AHashSet<String>) -> Result<Vec<Edge>, LineageError> {
        self.as_ref().find_edges_by_targets(names)
    }

    fn find_edges_by_sources(&self, names: &AHashSet<String>) -> Result<Vec<Edge>, LineageError> {
        self.as_ref().find_edges_by_sources(names)
    }

    fn find_connected_edges(&self, name: &str) -> Result<Vec<Edge>, LineageError> {
        self.as_ref().find_connected_edges(name)
    }

    fn find_node(&self, name: &str) -> Result<Option<Node>, LineageError> {
        self.as_ref().find_node(name)
    }

    fn exists_node(&self, name: &str) -> Result<bool, LineageError> {
        self.as_ref().exists_node(name)
    }

    fn find_nodes(&self, names: &[String]) -> Result<Vec<Node>, LineageError> {
        self.as_ref().find_nodes(names)
    }
}
