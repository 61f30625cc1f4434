use std::collections::BTreeSet;

use ahash::{AHashMap, AHashSet};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    errors::LineageError,
    graph::{Edge, EdgeKey, Node},
    store::GraphStore,
    traversal::NodeWithDepth,
};

/// A discovered node together with its signed depth from the root.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineageNode {
    #[serde(flatten)]
    pub node: Node,
    pub depth: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineageGraph {
    pub root: Node,
    pub nodes: Vec<LineageNode>,
    pub edges: Vec<Edge>,
    pub total_upstream: usize,
    pub total_downstream: usize,
}

impl LineageGraph {
    pub fn node_names(&self) -> BTreeSet<&str> {
        self.nodes.iter().map(|n| n.node.name.as_str()).collect()
    }

    pub fn edge_pairs(&self) -> BTreeSet<(&str, &str)> {
        self.edges
            .iter()
            .map(|e| (e.source.as_str(), e.target.as_str()))
            .collect()
    }
}

/// Builds the renderable graph for `root` from a traversal result. Nodes keep
/// traversal order; edges are restricted to pairs inside root ∪ discovered.
pub fn assemble<S>(
    store: &S,
    root: Node,
    traversal: &[NodeWithDepth],
) -> Result<LineageGraph, LineageError>
where
    S: GraphStore + ?Sized,
{
    let discovered: Vec<&NodeWithDepth> = traversal
        .iter()
        .filter(|item| item.name != root.name)
        .collect();
    let names: Vec<String> = discovered.iter().map(|item| item.name.clone()).collect();

    let mut records: AHashMap<String, Node> = store
        .find_nodes(&names)?
        .into_iter()
        .map(|node| (node.name.clone(), node))
        .collect();
    let mut nodes = Vec::with_capacity(discovered.len());
    for item in &discovered {
        match records.remove(&item.name) {
            Some(node) => nodes.push(LineageNode {
                node,
                depth: item.depth,
            }),
            None => debug!(
                node = %item.name,
                root = %root.name,
                "lineage edge references an unregistered node"
            ),
        }
    }

    let mut members: AHashSet<&str> = names.iter().map(String::as_str).collect();
    members.insert(root.name.as_str());
    let edges = collect_edges(store, &root.name, &names, &members)?;

    Ok(LineageGraph {
        total_upstream: discovered.iter().filter(|item| item.depth < 0).count(),
        total_downstream: discovered.iter().filter(|item| item.depth > 0).count(),
        root,
        nodes,
        edges,
    })
}

fn collect_edges<S>(
    store: &S,
    root: &str,
    names: &[String],
    members: &AHashSet<&str>,
) -> Result<Vec<Edge>, LineageError>
where
    S: GraphStore + ?Sized,
{
    let mut seen: AHashSet<EdgeKey> = AHashSet::new();
    let mut edges = Vec::new();
    for name in std::iter::once(root).chain(names.iter().map(String::as_str)) {
        for edge in store.find_connected_edges(name)? {
            if !members.contains(edge.source.as_str()) || !members.contains(edge.target.as_str()) {
                continue;
            }
            if seen.insert(edge.key()) {
                edges.push(edge);
            }
        }
    }
    edges.sort_by(|a, b| {
        (a.source.as_str(), a.target.as_str(), a.edge_type)
            .cmp(&(b.source.as_str(), b.target.as_str(), b.edge_type))
    });
    Ok(edges)
}
