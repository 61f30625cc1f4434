use rusqlite::Connection;

use crate::errors::LineageError;

pub fn ensure_schema(conn: &Connection) -> Result<(), LineageError> {
    conn.execute_batch(
        r#"
        PRAGMA foreign_keys = ON;
        CREATE TABLE IF NOT EXISTS lineage_nodes (
            name        TEXT PRIMARY KEY NOT NULL,
            node_type   TEXT NOT NULL,
            owner       TEXT,
            team        TEXT,
            description TEXT,
            tags        TEXT NOT NULL DEFAULT '[]',
            created_at  TEXT NOT NULL,
            updated_at  TEXT NOT NULL
        );
        CREATE TABLE IF NOT EXISTS lineage_edges (
            id          INTEGER PRIMARY KEY AUTOINCREMENT,
            source      TEXT NOT NULL,
            target      TEXT NOT NULL,
            edge_type   TEXT NOT NULL,
            created_at  TEXT NOT NULL,
            deleted_at  TEXT
        );
        CREATE INDEX IF NOT EXISTS idx_edges_source_live
            ON lineage_edges(source) WHERE deleted_at IS NULL;
        CREATE INDEX IF NOT EXISTS idx_edges_target_live
            ON lineage_edges(target) WHERE deleted_at IS NULL;
        CREATE INDEX IF NOT EXISTS idx_edges_triple
            ON lineage_edges(source, target, edge_type);
        "#,
    )
    .map_err(|e| LineageError::schema(e.to_string()))?;
    Ok(())
}
