//! Map-backed [`GraphStore`] for embedding and tests. Mirrors the mutation
//! rules of the SQLite store: edges need registered endpoints, deletion of an
//! edge is a soft delete, and referenced nodes cannot be removed.

use std::collections::BTreeMap;

use ahash::AHashSet;
use chrono::Utc;
use parking_lot::RwLock;

use crate::{
    errors::LineageError,
    graph::{Edge, EdgeType, Node, validate_edge, validate_node},
    store::GraphStore,
};

#[derive(Default)]
struct State {
    nodes: BTreeMap<String, Node>,
    edges: Vec<Edge>,
}

#[derive(Default)]
pub struct InMemoryLineageStore {
    state: RwLock<State>,
}

impl InMemoryLineageStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_node(&self, node: &Node) -> Result<(), LineageError> {
        validate_node(node)?;
        let mut state = self.state.write();
        if state.nodes.contains_key(&node.name) {
            return Err(LineageError::invalid_input(format!(
                "node {} already registered",
                node.name
            )));
        }
        state.nodes.insert(node.name.clone(), node.clone());
        Ok(())
    }

    pub fn update_node(&self, node: &Node) -> Result<(), LineageError> {
        validate_node(node)?;
        let mut state = self.state.write();
        let existing = state
            .nodes
            .get_mut(&node.name)
            .ok_or_else(|| LineageError::not_found(format!("node {}", node.name)))?;
        let created_at = existing.created_at;
        *existing = Node {
            created_at,
            updated_at: Utc::now(),
            ..node.clone()
        };
        Ok(())
    }

    pub fn delete_node(&self, name: &str) -> Result<(), LineageError> {
        let mut state = self.state.write();
        if live(&state.edges).any(|e| e.source == name || e.target == name) {
            return Err(LineageError::invalid_input(format!(
                "node {name} is still referenced by lineage edges"
            )));
        }
        state
            .nodes
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| LineageError::not_found(format!("node {name}")))
    }

    pub fn insert_edge(&self, edge: &Edge) -> Result<(), LineageError> {
        validate_edge(edge)?;
        let mut state = self.state.write();
        if !state.nodes.contains_key(&edge.source) || !state.nodes.contains_key(&edge.target) {
            return Err(LineageError::invalid_input(
                "edge endpoints must reference registered nodes",
            ));
        }
        state.edges.push(Edge {
            deleted_at: None,
            ..edge.clone()
        });
        Ok(())
    }

    pub fn delete_edge(
        &self,
        source: &str,
        target: &str,
        edge_type: EdgeType,
    ) -> Result<usize, LineageError> {
        let now = Utc::now();
        let mut state = self.state.write();
        let mut affected = 0;
        for edge in state.edges.iter_mut().filter(|e| {
            !e.is_deleted() && e.source == source && e.target == target && e.edge_type == edge_type
        }) {
            edge.deleted_at = Some(now);
            affected += 1;
        }
        if affected == 0 {
            return Err(LineageError::not_found(format!(
                "edge {source} -> {target} ({edge_type})"
            )));
        }
        Ok(affected)
    }

    pub fn list_node_names(&self) -> Vec<String> {
        self.state.read().nodes.keys().cloned().collect()
    }
}

fn live(edges: &[Edge]) -> impl Iterator<Item = &Edge> {
    edges.iter().filter(|e| !e.is_deleted())
}

fn sorted(mut edges: Vec<Edge>) -> Vec<Edge> {
    edges.sort_by(|a, b| {
        (a.source.as_str(), a.target.as_str(), a.edge_type)
            .cmp(&(b.source.as_str(), b.target.as_str(), b.edge_type))
    });
    edges
}

impl GraphStore for InMemoryLineageStore {
    fn find_edges_by_targets(&self, names: &AHashSet<String>) -> Result<Vec<Edge>, LineageError> {
        let state = self.state.read();
        Ok(sorted(
            live(&state.edges)
                .filter(|e| names.contains(&e.target))
                .cloned()
                .collect(),
        ))
    }

    fn find_edges_by_sources(&self, names: &AHashSet<String>) -> Result<Vec<Edge>, LineageError> {
        let state = self.state.read();
        Ok(sorted(
            live(&state.edges)
                .filter(|e| names.contains(&e.source))
                .cloned()
                .collect(),
        ))
    }

    fn find_connected_edges(&self, name: &str) -> Result<Vec<Edge>, LineageError> {
        let state = self.state.read();
        Ok(sorted(
            live(&state.edges)
                .filter(|e| e.source == name || e.target == name)
                .cloned()
                .collect(),
        ))
    }

    fn find_node(&self, name: &str) -> Result<Option<Node>, LineageError> {
        Ok(self.state.read().nodes.get(name).cloned())
    }

    fn exists_node(&self, name: &str) -> Result<bool, LineageError> {
        Ok(self.state.read().nodes.contains_key(name))
    }
}
