#![forbid(unsafe_code)]

use super::super::StoreError;
use rusqlite::{OptionalExtension, Transaction, params};

pub(in crate::store) const NODE_SEQ: &str = "node_seq";

pub(in crate::store) fn ensure_tree_tx(
    tx: &Transaction<'_>,
    tree: &str,
) -> Result<(), StoreError> {
    tx.execute("INSERT OR IGNORE INTO trees(tree) VALUES (?1)", params![tree])?;
    Ok(())
}

fn counter_value_tx(tx: &Transaction<'_>, tree: &str, name: &str) -> Result<i64, StoreError> {
    Ok(tx
        .query_row(
            "SELECT value FROM counters WHERE tree=?1 AND name=?2",
            params![tree, name],
            |row| row.get::<_, i64>(0),
        )
        .optional()?
        .unwrap_or(0))
}

fn store_counter_tx(
    tx: &Transaction<'_>,
    tree: &str,
    name: &str,
    value: i64,
) -> Result<(), StoreError> {
    tx.execute(
        "INSERT INTO counters(tree, name, value) VALUES (?1, ?2, ?3) \
         ON CONFLICT(tree, name) DO UPDATE SET value=excluded.value",
        params![tree, name, value],
    )?;
    Ok(())
}

pub(in crate::store) fn next_counter_tx(
    tx: &Transaction<'_>,
    tree: &str,
    name: &str,
) -> Result<i64, StoreError> {
    let next = counter_value_tx(tx, tree, name)?
        .checked_add(1)
        .ok_or(StoreError::InvalidInput("node counter overflow"))?;
    store_counter_tx(tx, tree, name, next)?;
    Ok(next)
}

/// Raises the counter to at least `value`, so allocated ids never collide with explicit ones.
pub(in crate::store) fn bump_counter_tx(
    tx: &Transaction<'_>,
    tree: &str,
    name: &str,
    value: i64,
) -> Result<(), StoreError> {
    if counter_value_tx(tx, tree, name)? < value {
        store_counter_tx(tx, tree, name, value)?;
    }
    Ok(())
}
