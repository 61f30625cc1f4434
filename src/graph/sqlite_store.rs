use std::path::Path;

use ahash::{AHashMap, AHashSet};
use chrono::Utc;
use parking_lot::{Mutex, MutexGuard};
use rusqlite::{Connection, OptionalExtension, params, params_from_iter};
use tracing::debug;

use crate::{
    cache::AdjacencyCache,
    config::StoreConfig,
    errors::LineageError,
    schema::ensure_schema,
    store::GraphStore,
};

use super::{
    metrics::{StoreMetrics, StoreMetricsSnapshot},
    types::{Edge, EdgeType, Node, row_to_edge, row_to_node, validate_edge, validate_node},
};

const NODE_COLUMNS: &str =
    "name, node_type, owner, team, description, tags, created_at, updated_at";
const EDGE_COLUMNS: &str = "source, target, edge_type, created_at, deleted_at";
// Well under SQLITE_MAX_VARIABLE_NUMBER on every supported SQLite build.
const MAX_BATCH_PARAMS: usize = 500;

#[derive(Clone, Copy)]
enum EdgeColumn {
    Source,
    Target,
}

impl EdgeColumn {
    fn as_sql(self) -> &'static str {
        match self {
            EdgeColumn::Source => "source",
            EdgeColumn::Target => "target",
        }
    }

    fn key(self, edge: &Edge) -> &str {
        match self {
            EdgeColumn::Source => &edge.source,
            EdgeColumn::Target => &edge.target,
        }
    }
}

/// SQLite-backed lineage graph. The connection sits behind a mutex so a single
/// store can serve concurrent lineage queries.
pub struct SqliteLineageStore {
    conn: Mutex<Connection>,
    by_source: AdjacencyCache,
    by_target: AdjacencyCache,
    cache_enabled: bool,
    metrics: StoreMetrics,
}

impl SqliteLineageStore {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, LineageError> {
        let conn =
            Connection::open(path).map_err(|e| LineageError::connection(e.to_string()))?;
        ensure_schema(&conn)?;
        Ok(Self::from_connection(conn, true))
    }

    pub fn open_in_memory() -> Result<Self, LineageError> {
        let conn = Connection::open_in_memory()
            .map_err(|e| LineageError::connection(e.to_string()))?;
        ensure_schema(&conn)?;
        Ok(Self::from_connection(conn, true))
    }

    pub fn from_config(config: &StoreConfig) -> Result<Self, LineageError> {
        let conn = if config.is_in_memory() {
            Connection::open_in_memory()
        } else {
            Connection::open(&config.database)
        }
        .map_err(|e| LineageError::connection(e.to_string()))?;
        ensure_schema(&conn)?;
        Ok(Self::from_connection(conn, config.adjacency_cache))
    }

    pub fn metrics_snapshot(&self) -> StoreMetricsSnapshot {
        self.metrics.snapshot()
    }

    pub fn reset_metrics(&self) {
        self.metrics.reset();
    }

    pub fn insert_node(&self, node: &Node) -> Result<(), LineageError> {
        validate_node(node)?;
        let tags = serde_json::to_string(&node.tags)
            .map_err(|e| LineageError::invalid_input(e.to_string()))?;
        let conn = self.conn();
        if node_exists(&conn, &node.name)? {
            return Err(LineageError::invalid_input(format!(
                "node {} already registered",
                node.name
            )));
        }
        conn.execute(
            "INSERT INTO lineage_nodes(name, node_type, owner, team, description, tags, created_at, updated_at)
             VALUES(?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                node.name.as_str(),
                node.node_type.as_str(),
                node.owner.as_deref(),
                node.team.as_deref(),
                node.description.as_deref(),
                tags,
                node.created_at,
                node.updated_at,
            ],
        )
        .map_err(|e| LineageError::query(e.to_string()))?;
        debug!(node = %node.name, node_type = %node.node_type, "registered lineage node");
        Ok(())
    }

    /// Replaces the metadata of an existing node and bumps `updated_at`.
    pub fn update_node(&self, node: &Node) -> Result<(), LineageError> {
        validate_node(node)?;
        let tags = serde_json::to_string(&node.tags)
            .map_err(|e| LineageError::invalid_input(e.to_string()))?;
        let affected = self
            .conn()
            .execute(
                "UPDATE lineage_nodes
                 SET node_type=?1, owner=?2, team=?3, description=?4, tags=?5, updated_at=?6
                 WHERE name=?7",
                params![
                    node.node_type.as_str(),
                    node.owner.as_deref(),
                    node.team.as_deref(),
                    node.description.as_deref(),
                    tags,
                    Utc::now(),
                    node.name.as_str(),
                ],
            )
            .map_err(|e| LineageError::query(e.to_string()))?;
        if affected == 0 {
            return Err(LineageError::not_found(format!("node {}", node.name)));
        }
        Ok(())
    }

    /// Removes a node that no live edge references.
    pub fn delete_node(&self, name: &str) -> Result<(), LineageError> {
        let conn = self.conn();
        let referenced: Option<i64> = conn
            .query_row(
                "SELECT 1 FROM lineage_edges
                 WHERE deleted_at IS NULL AND (source=?1 OR target=?1) LIMIT 1",
                params![name],
                |row| row.get(0),
            )
            .optional()
            .map_err(|e| LineageError::query(e.to_string()))?;
        if referenced.is_some() {
            return Err(LineageError::invalid_input(format!(
                "node {name} is still referenced by lineage edges"
            )));
        }
        let affected = conn
            .execute("DELETE FROM lineage_nodes WHERE name=?1", params![name])
            .map_err(|e| LineageError::query(e.to_string()))?;
        if affected == 0 {
            return Err(LineageError::not_found(format!("node {name}")));
        }
        self.invalidate_caches();
        debug!(node = name, "deleted lineage node");
        Ok(())
    }

    /// Inserts an edge between two registered nodes and returns its rowid.
    pub fn insert_edge(&self, edge: &Edge) -> Result<i64, LineageError> {
        validate_edge(edge)?;
        let conn = self.conn();
        if !node_exists(&conn, &edge.source)? || !node_exists(&conn, &edge.target)? {
            return Err(LineageError::invalid_input(
                "edge endpoints must reference registered nodes",
            ));
        }
        conn.execute(
            "INSERT INTO lineage_edges(source, target, edge_type, created_at, deleted_at)
             VALUES(?1, ?2, ?3, ?4, NULL)",
            params![
                edge.source.as_str(),
                edge.target.as_str(),
                edge.edge_type.as_str(),
                edge.created_at,
            ],
        )
        .map_err(|e| LineageError::query(e.to_string()))?;
        self.invalidate_caches();
        debug!(
            from = %edge.source,
            to = %edge.target,
            edge_type = %edge.edge_type,
            "inserted lineage edge"
        );
        Ok(conn.last_insert_rowid())
    }

    /// Soft-deletes every live `(source, target, edge_type)` edge and returns how many were marked.
    pub fn delete_edge(
        &self,
        source: &str,
        target: &str,
        edge_type: EdgeType,
    ) -> Result<usize, LineageError> {
        let conn = self.conn();
        let affected = conn
            .execute(
                "UPDATE lineage_edges SET deleted_at=?1
                 WHERE source=?2 AND target=?3 AND edge_type=?4 AND deleted_at IS NULL",
                params![Utc::now(), source, target, edge_type.as_str()],
            )
            .map_err(|e| LineageError::query(e.to_string()))?;
        if affected == 0 {
            return Err(LineageError::not_found(format!(
                "edge {source} -> {target} ({edge_type})"
            )));
        }
        self.invalidate_caches();
        debug!(
            from = source,
            to = target,
            edge_type = %edge_type,
            affected,
            "soft-deleted lineage edge"
        );
        Ok(affected)
    }

    pub fn list_node_names(&self) -> Result<Vec<String>, LineageError> {
        let conn = self.conn();
        let mut stmt = conn
            .prepare_cached("SELECT name FROM lineage_nodes ORDER BY name")
            .map_err(|e| LineageError::query(e.to_string()))?;
        let rows = stmt
            .query_map([], |row| row.get(0))
            .map_err(|e| LineageError::query(e.to_string()))?;
        let mut names = Vec::new();
        for name in rows {
            names.push(name.map_err(|e| LineageError::query(e.to_string()))?);
        }
        Ok(names)
    }

    /// Returns `(nodes, live edges)`.
    pub fn counts(&self) -> Result<(usize, usize), LineageError> {
        let conn = self.conn();
        let nodes: i64 = conn
            .query_row("SELECT COUNT(*) FROM lineage_nodes", [], |row| row.get(0))
            .map_err(|e| LineageError::query(e.to_string()))?;
        let edges: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM lineage_edges WHERE deleted_at IS NULL",
                [],
                |row| row.get(0),
            )
            .map_err(|e| LineageError::query(e.to_string()))?;
        Ok((nodes as usize, edges as usize))
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock()
    }

    fn invalidate_caches(&self) {
        self.by_source.clear();
        self.by_target.clear();
    }

    fn edges_by(
        &self,
        column: EdgeColumn,
        names: &AHashSet<String>,
    ) -> Result<Vec<Edge>, LineageError> {
        if names.is_empty() {
            return Ok(Vec::new());
        }
        let cache = match column {
            EdgeColumn::Source => &self.by_source,
            EdgeColumn::Target => &self.by_target,
        };
        // Held across query and cache fill so a concurrent mutation cannot
        // interleave an invalidation with a stale insert.
        let conn = self.conn();
        let mut edges = Vec::new();
        let mut misses: Vec<&str> = Vec::with_capacity(names.len());
        for name in names {
            match self.cache_enabled.then(|| cache.get(name)).flatten() {
                Some(cached) => edges.extend(cached),
                None => misses.push(name.as_str()),
            }
        }
        if self.cache_enabled {
            self.metrics
                .record_cache_hits((names.len() - misses.len()) as u64);
            self.metrics.record_cache_misses(misses.len() as u64);
        }
        if misses.is_empty() {
            return Ok(edges);
        }
        misses.sort_unstable();

        let mut fetched = Vec::new();
        for chunk in misses.chunks(MAX_BATCH_PARAMS) {
            let sql = format!(
                "SELECT {EDGE_COLUMNS} FROM lineage_edges
                 WHERE deleted_at IS NULL AND {} IN ({})
                 ORDER BY source, target, edge_type, id",
                column.as_sql(),
                placeholders(chunk.len()),
            );
            let mut stmt = conn
                .prepare_cached(&sql)
                .map_err(|e| LineageError::query(e.to_string()))?;
            let rows = stmt
                .query_map(params_from_iter(chunk.iter()), row_to_edge)
                .map_err(|e| LineageError::query(e.to_string()))?;
            for row in rows {
                fetched.push(row.map_err(|e| LineageError::query(e.to_string()))?);
            }
            self.metrics.record_edge_batch();
        }

        if self.cache_enabled {
            let mut grouped: AHashMap<&str, Vec<Edge>> =
                misses.iter().map(|name| (*name, Vec::new())).collect();
            for edge in &fetched {
                if let Some(bucket) = grouped.get_mut(column.key(edge)) {
                    bucket.push(edge.clone());
                }
            }
            for (name, bucket) in grouped {
                cache.insert(name.to_string(), bucket);
            }
        }
        edges.extend(fetched);
        Ok(edges)
    }

    fn from_connection(conn: Connection, cache_enabled: bool) -> Self {
        conn.set_prepared_statement_cache_capacity(128);
        Self {
            conn: Mutex::new(conn),
            by_source: AdjacencyCache::new(),
            by_target: AdjacencyCache::new(),
            cache_enabled,
            metrics: StoreMetrics::default(),
        }
    }
}

impl GraphStore for SqliteLineageStore {
    fn find_edges_by_targets(&self, names: &AHashSet<String>) -> Result<Vec<Edge>, LineageError> {
        self.edges_by(EdgeColumn::Target, names)
    }

    fn find_edges_by_sources(&self, names: &AHashSet<String>) -> Result<Vec<Edge>, LineageError> {
        self.edges_by(EdgeColumn::Source, names)
    }

    fn find_connected_edges(&self, name: &str) -> Result<Vec<Edge>, LineageError> {
        self.metrics.record_connected_lookup();
        let conn = self.conn();
        let sql = format!(
            "SELECT {EDGE_COLUMNS} FROM lineage_edges
             WHERE deleted_at IS NULL AND (source=?1 OR target=?1)
             ORDER BY source, target, edge_type, id"
        );
        let mut stmt = conn
            .prepare_cached(&sql)
            .map_err(|e| LineageError::query(e.to_string()))?;
        let rows = stmt
            .query_map(params![name], row_to_edge)
            .map_err(|e| LineageError::query(e.to_string()))?;
        let mut edges = Vec::new();
        for row in rows {
            edges.push(row.map_err(|e| LineageError::query(e.to_string()))?);
        }
        Ok(edges)
    }

    fn find_node(&self, name: &str) -> Result<Option<Node>, LineageError> {
        self.metrics.record_node_lookup();
        let sql = format!("SELECT {NODE_COLUMNS} FROM lineage_nodes WHERE name=?1");
        self.conn()
            .query_row(&sql, params![name], row_to_node)
            .optional()
            .map_err(|e| LineageError::query(e.to_string()))
    }

    fn exists_node(&self, name: &str) -> Result<bool, LineageError> {
        self.metrics.record_node_lookup();
        node_exists(&self.conn(), name)
    }

    fn find_nodes(&self, names: &[String]) -> Result<Vec<Node>, LineageError> {
        if names.is_empty() {
            return Ok(Vec::new());
        }
        let conn = self.conn();
        let mut nodes = Vec::with_capacity(names.len());
        for chunk in names.chunks(MAX_BATCH_PARAMS) {
            self.metrics.record_node_lookup();
            let sql = format!(
                "SELECT {NODE_COLUMNS} FROM lineage_nodes WHERE name IN ({}) ORDER BY name",
                placeholders(chunk.len()),
            );
            let mut stmt = conn
                .prepare_cached(&sql)
                .map_err(|e| LineageError::query(e.to_string()))?;
            let rows = stmt
                .query_map(params_from_iter(chunk.iter()), row_to_node)
                .map_err(|e| LineageError::query(e.to_string()))?;
            for row in rows {
                nodes.push(row.map_err(|e| LineageError::query(e.to_string()))?);
            }
        }
        Ok(nodes)
    }
}

fn node_exists(conn: &Connection, name: &str) -> Result<bool, LineageError> {
    let exists: Option<i64> = conn
        .query_row(
            "SELECT 1 FROM lineage_nodes WHERE name=?1",
            params![name],
            |row| row.get(0),
        )
        .optional()
        .map_err(|e| LineageError::query(e.to_string()))?;
    Ok(exists.is_some())
}

fn placeholders(count: usize) -> String {
    let mut out = String::with_capacity(count * 2);
    for idx in 0..count {
        if idx > 0 {
            out.push(',');
        }
        out.push('?');
    }
    out
}
