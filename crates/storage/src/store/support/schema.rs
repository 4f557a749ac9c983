#![forbid(unsafe_code)]

use super::super::StoreError;
use rusqlite::{Connection, params};

pub(in crate::store) const SCHEMA_VERSION: &str = "1";

pub(in crate::store) fn install_schema(conn: &Connection) -> Result<(), StoreError> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS meta (
          key TEXT PRIMARY KEY,
          value TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS trees (
          tree TEXT PRIMARY KEY
        );

        CREATE TABLE IF NOT EXISTS counters (
          tree TEXT NOT NULL,
          name TEXT NOT NULL,
          value INTEGER NOT NULL,
          PRIMARY KEY (tree, name),
          FOREIGN KEY(tree) REFERENCES trees(tree) ON DELETE CASCADE
        );

        CREATE TABLE IF NOT EXISTS nodes (
          tree TEXT NOT NULL,
          id INTEGER NOT NULL,
          name TEXT NOT NULL,
          parent_id INTEGER,
          lft INTEGER NOT NULL,
          rgt INTEGER NOT NULL,
          PRIMARY KEY (tree, id),
          FOREIGN KEY(tree) REFERENCES trees(tree) ON DELETE CASCADE,
          FOREIGN KEY(tree, parent_id) REFERENCES nodes(tree, id),
          CHECK(lft < rgt),
          CHECK(parent_id IS NULL OR parent_id <> id)
        );

        CREATE INDEX IF NOT EXISTS idx_nodes_tree_lft ON nodes(tree, lft);
        CREATE INDEX IF NOT EXISTS idx_nodes_tree_rgt ON nodes(tree, rgt);
        CREATE INDEX IF NOT EXISTS idx_nodes_tree_parent ON nodes(tree, parent_id, lft);
        "#,
    )?;
    conn.execute(
        "INSERT OR IGNORE INTO meta(key, value) VALUES (?1, ?2)",
        params!["schema_version", SCHEMA_VERSION],
    )?;
    tracing::debug!(version = SCHEMA_VERSION, "schema installed");
    Ok(())
}
