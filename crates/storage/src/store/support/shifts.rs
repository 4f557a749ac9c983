#![forbid(unsafe_code)]

use super::super::StoreError;
use ns_core::ids::NodeId;
use ns_core::{Bounds, Shift};
use rusqlite::{Transaction, params};

/// Applies `shift` to every positioned node of the tree. Parked rows (negative bounds) are left alone.
pub(in crate::store) fn apply_shift_tx(
    tx: &Transaction<'_>,
    tree: &str,
    shift: Shift,
) -> Result<usize, StoreError> {
    if shift.delta == 0 {
        return Ok(0);
    }
    let touched = tx.execute(
        "UPDATE nodes \
         SET lft = CASE WHEN lft > ?2 THEN lft + ?3 ELSE lft END, \
             rgt = CASE WHEN rgt > ?2 THEN rgt + ?3 ELSE rgt END \
         WHERE tree=?1 AND rgt > ?2 AND lft > 0",
        params![tree, shift.after, shift.delta],
    )?;
    Ok(touched)
}

/// Moves the whole subtree `source` below zero, keeping its internal order.
///
/// Returns the number of parked rows.
pub(in crate::store) fn park_subtree_tx(
    tx: &Transaction<'_>,
    tree: &str,
    source: Bounds,
) -> Result<usize, StoreError> {
    let parked = tx.execute(
        "UPDATE nodes SET lft = lft - ?4, rgt = rgt - ?4 \
         WHERE tree=?1 AND lft >= ?2 AND lft <= ?3",
        params![tree, source.left, source.right, park_distance(source)],
    )?;
    Ok(parked)
}

/// Brings parked rows back so the subtree's left boundary lands on `landing_left`.
pub(in crate::store) fn unpark_subtree_tx(
    tx: &Transaction<'_>,
    tree: &str,
    source: Bounds,
    landing_left: i64,
) -> Result<usize, StoreError> {
    let delta = park_distance(source) + (landing_left - source.left);
    let restored = tx.execute(
        "UPDATE nodes SET lft = lft + ?2, rgt = rgt + ?2 WHERE tree=?1 AND lft < 0",
        params![tree, delta],
    )?;
    Ok(restored)
}

const fn park_distance(source: Bounds) -> i64 {
    source.right + 1
}

pub(in crate::store) fn insert_node_tx(
    tx: &Transaction<'_>,
    tree: &str,
    id: NodeId,
    name: &str,
    parent_id: Option<NodeId>,
    bounds: Bounds,
) -> Result<(), StoreError> {
    tx.execute(
        "INSERT INTO nodes(tree, id, name, parent_id, lft, rgt) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            tree,
            id.get(),
            name,
            parent_id.map(NodeId::get),
            bounds.left,
            bounds.right
        ],
    )?;
    Ok(())
}

pub(in crate::store) fn delete_range_tx(
    tx: &Transaction<'_>,
    tree: &str,
    bounds: Bounds,
) -> Result<usize, StoreError> {
    let deleted = tx.execute(
        "DELETE FROM nodes WHERE tree=?1 AND lft >= ?2 AND rgt <= ?3",
        params![tree, bounds.left, bounds.right],
    )?;
    Ok(deleted)
}

pub(in crate::store) fn update_parent_tx(
    tx: &Transaction<'_>,
    tree: &str,
    id: NodeId,
    parent_id: NodeId,
) -> Result<(), StoreError> {
    tx.execute(
        "UPDATE nodes SET parent_id=?3 WHERE tree=?1 AND id=?2",
        params![tree, id.get(), parent_id.get()],
    )?;
    Ok(())
}

pub(in crate::store) fn update_bounds_tx(
    tx: &Transaction<'_>,
    tree: &str,
    id: NodeId,
    bounds: Bounds,
) -> Result<(), StoreError> {
    tx.execute(
        "UPDATE nodes SET lft=?3, rgt=?4 WHERE tree=?1 AND id=?2",
        params![tree, id.get(), bounds.left, bounds.right],
    )?;
    Ok(())
}
