use std::{collections::BTreeMap, fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::{
    assembler::{LineageGraph, assemble},
    errors::LineageError,
    graph::SqliteLineageStore,
    store::GraphStore,
    traversal::{self, UNLIMITED_DEPTH, merge_directions},
};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LineageDirection {
    Upstream,
    Downstream,
    #[default]
    Both,
}

impl fmt::Display for LineageDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            LineageDirection::Upstream => "UPSTREAM",
            LineageDirection::Downstream => "DOWNSTREAM",
            LineageDirection::Both => "BOTH",
        })
    }
}

impl FromStr for LineageDirection {
    type Err = LineageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "UPSTREAM" => Ok(LineageDirection::Upstream),
            "DOWNSTREAM" => Ok(LineageDirection::Downstream),
            "BOTH" => Ok(LineageDirection::Both),
            other => Err(LineageError::invalid_input(format!(
                "unknown lineage direction {other}"
            ))),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LineageRequest {
    pub direction: LineageDirection,
    pub max_depth: i32,
}

impl Default for LineageRequest {
    fn default() -> Self {
        Self {
            direction: LineageDirection::Both,
            max_depth: UNLIMITED_DEPTH,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineageStatistics {
    pub upstream_count: usize,
    pub downstream_count: usize,
    pub total_connected: usize,
}

impl LineageStatistics {
    pub fn new(upstream_count: usize, downstream_count: usize) -> Self {
        Self {
            upstream_count,
            downstream_count,
            total_connected: upstream_count + downstream_count,
        }
    }

    pub fn to_map(&self) -> BTreeMap<String, usize> {
        BTreeMap::from([
            ("upstream_count".to_string(), self.upstream_count),
            ("downstream_count".to_string(), self.downstream_count),
            ("total_connected".to_string(), self.total_connected),
        ])
    }
}

/// String-keyed view of optional statistics; absent resources map to an empty map.
pub fn statistics_map(stats: Option<LineageStatistics>) -> BTreeMap<String, usize> {
    stats.map(|s| s.to_map()).unwrap_or_default()
}

/// Public lineage operations over any [`GraphStore`].
pub struct LineageService<S> {
    store: S,
}

impl<S: GraphStore> LineageService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    #[instrument(skip(self), level = "debug")]
    pub fn get_lineage_graph(
        &self,
        resource_name: &str,
        direction: LineageDirection,
        max_depth: i32,
    ) -> Result<LineageGraph, LineageError> {
        let root = self
            .store
            .find_node(resource_name)?
            .ok_or_else(|| LineageError::resource_not_found(resource_name))?;
        let traversal = match direction {
            LineageDirection::Upstream => {
                traversal::find_upstream(&self.store, resource_name, max_depth)?
            }
            LineageDirection::Downstream => {
                traversal::find_downstream(&self.store, resource_name, max_depth)?
            }
            LineageDirection::Both => {
                traversal::find_both_directions(&self.store, resource_name, max_depth)?
            }
        };
        assemble(&self.store, root, &traversal)
    }

    pub fn lineage_graph(
        &self,
        resource_name: &str,
        request: LineageRequest,
    ) -> Result<LineageGraph, LineageError> {
        self.get_lineage_graph(resource_name, request.direction, request.max_depth)
    }

    pub fn exists_in_lineage(&self, resource_name: &str) -> Result<bool, LineageError> {
        self.store.exists_node(resource_name)
    }

    /// `Ok(None)` when the resource is not part of the graph.
    #[instrument(skip(self), level = "debug")]
    pub fn get_lineage_statistics(
        &self,
        resource_name: &str,
    ) -> Result<Option<LineageStatistics>, LineageError> {
        if !self.store.exists_node(resource_name)? {
            return Ok(None);
        }
        let upstream = traversal::find_upstream(&self.store, resource_name, UNLIMITED_DEPTH)?;
        let downstream = traversal::find_downstream(&self.store, resource_name, UNLIMITED_DEPTH)?;
        let merged = merge_directions(resource_name, upstream, downstream);
        let upstream_count = merged.iter().filter(|n| n.depth < 0).count();
        let downstream_count = merged.iter().filter(|n| n.depth > 0).count();
        Ok(Some(LineageStatistics::new(upstream_count, downstream_count)))
    }
}

impl SqliteLineageStore {
    pub fn lineage(&self) -> LineageService<&SqliteLineageStore> {
        LineageService::new(self)
    }
}
