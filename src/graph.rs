mod metrics;
mod sqlite_store;
mod types;

pub use metrics::{StoreMetrics, StoreMetricsSnapshot};
pub use sqlite_store::SqliteLineageStore;
pub use types::{
    Edge, EdgeKey, EdgeType, Node, NodeType, row_to_edge, row_to_node, validate_edge,
    validate_node,
};
