//! Breadth-first lineage traversal over a [`GraphStore`].
//!
//! Depths are signed relative to the start node: upstream hops count down from
//! `-1`, downstream hops count up from `1`. Each BFS layer is resolved with a
//! single batched store lookup, and a storage error aborts the whole traversal.

use std::collections::VecDeque;

use ahash::AHashSet;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{errors::LineageError, graph::Edge, store::GraphStore};

pub const UNLIMITED_DEPTH: i32 = -1;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeWithDepth {
    pub name: String,
    pub depth: i32,
}

impl NodeWithDepth {
    pub fn new(name: impl Into<String>, depth: i32) -> Self {
        Self {
            name: name.into(),
            depth,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TraversalDirection {
    Upstream,
    Downstream,
}

impl TraversalDirection {
    fn step(self) -> i32 {
        match self {
            TraversalDirection::Upstream => -1,
            TraversalDirection::Downstream => 1,
        }
    }

    fn edges<S>(self, store: &S, frontier: &AHashSet<String>) -> Result<Vec<Edge>, LineageError>
    where
        S: GraphStore + ?Sized,
    {
        match self {
            TraversalDirection::Upstream => store.find_edges_by_targets(frontier),
            TraversalDirection::Downstream => store.find_edges_by_sources(frontier),
        }
    }

    fn neighbor(self, edge: Edge) -> String {
        match self {
            TraversalDirection::Upstream => edge.source,
            TraversalDirection::Downstream => edge.target,
        }
    }
}

pub fn find_upstream<S>(
    store: &S,
    resource_name: &str,
    max_depth: i32,
) -> Result<Vec<NodeWithDepth>, LineageError>
where
    S: GraphStore + ?Sized,
{
    traverse(store, resource_name, max_depth, TraversalDirection::Upstream)
}

pub fn find_downstream<S>(
    store: &S,
    resource_name: &str,
    max_depth: i32,
) -> Result<Vec<NodeWithDepth>, LineageError>
where
    S: GraphStore + ?Sized,
{
    traverse(store, resource_name, max_depth, TraversalDirection::Downstream)
}

/// Upstream, then the root at depth 0, then downstream, keeping the first
/// occurrence of each name. A node that is both ancestor and descendant keeps
/// its upstream depth.
pub fn find_both_directions<S>(
    store: &S,
    resource_name: &str,
    max_depth: i32,
) -> Result<Vec<NodeWithDepth>, LineageError>
where
    S: GraphStore + ?Sized,
{
    let upstream = find_upstream(store, resource_name, max_depth)?;
    let downstream = find_downstream(store, resource_name, max_depth)?;
    Ok(merge_directions(resource_name, upstream, downstream))
}

pub(crate) fn merge_directions(
    resource_name: &str,
    upstream: Vec<NodeWithDepth>,
    downstream: Vec<NodeWithDepth>,
) -> Vec<NodeWithDepth> {
    let mut seen = AHashSet::with_capacity(upstream.len() + downstream.len() + 1);
    let mut merged = Vec::with_capacity(upstream.len() + downstream.len() + 1);
    let root = NodeWithDepth::new(resource_name, 0);
    for item in upstream
        .into_iter()
        .chain(std::iter::once(root))
        .chain(downstream)
    {
        if seen.insert(item.name.clone()) {
            merged.push(item);
        }
    }
    merged
}

pub fn traverse<S>(
    store: &S,
    resource_name: &str,
    max_depth: i32,
    direction: TraversalDirection,
) -> Result<Vec<NodeWithDepth>, LineageError>
where
    S: GraphStore + ?Sized,
{
    if max_depth < UNLIMITED_DEPTH {
        return Err(LineageError::invalid_input(format!(
            "max depth must be -1 (unlimited) or non-negative, got {max_depth}"
        )));
    }
    if max_depth == 0 {
        return Ok(Vec::new());
    }

    let mut visited = AHashSet::new();
    let mut queue = VecDeque::new();
    let mut ordered = Vec::new();
    visited.insert(resource_name.to_string());
    queue.push_back((resource_name.to_string(), 0i32));

    while let Some(&(_, depth)) = queue.front() {
        let mut frontier = AHashSet::new();
        while queue.front().is_some_and(|(_, d)| *d == depth) {
            if let Some((name, _)) = queue.pop_front() {
                frontier.insert(name);
            }
        }
        if !may_expand(depth, max_depth) {
            continue;
        }
        let edges = direction.edges(store, &frontier)?;
        debug!(
            start = resource_name,
            depth,
            frontier = frontier.len(),
            edges = edges.len(),
            "expanded lineage layer"
        );
        let next_depth = depth + direction.step();
        for edge in edges {
            let neighbor = direction.neighbor(edge);
            if visited.insert(neighbor.clone()) {
                ordered.push(NodeWithDepth::new(neighbor.clone(), next_depth));
                queue.push_back((neighbor, next_depth));
            }
        }
    }

    ordered.sort_by(|a, b| a.depth.cmp(&b.depth).then_with(|| a.name.cmp(&b.name)));
    Ok(ordered)
}

/// The root layer always expands; deeper layers stop once they reach the bound.
fn may_expand(depth: i32, max_depth: i32) -> bool {
    max_depth == UNLIMITED_DEPTH || depth == 0 || depth.abs() < max_depth
}
