//! Data-asset lineage graph: bounded upstream/downstream traversal over a
//! pluggable graph store, with an embedded SQLite store and an in-memory store.
//! Run the Criterion traversal bench with `cargo bench` to inspect reports under `target/criterion`.

pub mod assembler;
pub mod cache;
pub mod config;
pub mod errors;
pub mod graph;
pub mod memory;
pub mod schema;
pub mod service;
pub mod store;
pub mod traversal;

pub use crate::assembler::{LineageGraph, LineageNode};
pub use crate::config::{CommandLineConfig, StoreConfig};
pub use crate::errors::{LineageError, Result};
pub use crate::graph::{Edge, EdgeType, Node, NodeType, SqliteLineageStore};
pub use crate::memory::InMemoryLineageStore;
pub use crate::service::{
    LineageDirection, LineageRequest, LineageService, LineageStatistics, statistics_map,
};
pub use crate::store::GraphStore;
pub use crate::traversal::{
    NodeWithDepth, UNLIMITED_DEPTH, find_both_directions, find_downstream, find_upstream,
};
