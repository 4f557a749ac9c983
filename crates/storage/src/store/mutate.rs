#![forbid(unsafe_code)]

use super::StoreError;
use super::query::TreeQuery;
use super::requests::CreateNodeRequest;
use super::resolve::{MoveTarget, Resolution};
use super::support::*;
use ns_core::ids::NodeId;
use ns_core::{
    Anchor, Bounds, InvariantViolation, MoveOutcome, MoveRejection, Node, check_tree, leaf_at,
    narrow_for_delete, relocate_subtree, widen_for_insert,
};
use rusqlite::{Transaction, params};
use std::collections::BTreeMap;

pub(super) fn create_node_tx(
    tx: &Transaction<'_>,
    tree: &str,
    request: CreateNodeRequest,
) -> Result<Node, StoreError> {
    let name = request.name.trim();
    if name.is_empty() {
        return Err(StoreError::InvalidInput("node name must not be empty"));
    }
    ensure_tree_tx(tx, tree)?;

    let query = TreeQuery::new(tx, tree);
    let id = match request.id {
        Some(id) => {
            if query.find(id)?.is_some() {
                return Err(StoreError::InvalidInput("node id already exists"));
            }
            bump_counter_tx(tx, tree, NODE_SEQ, id.get())?;
            id
        }
        None => {
            let raw = next_counter_tx(tx, tree, NODE_SEQ)?;
            NodeId::try_new(raw).map_err(|_| StoreError::InvalidInput("node counter overflow"))?
        }
    };

    let (parent_id, point) = match request.parent_id {
        Some(parent_id) => {
            let parent = query.get(parent_id)?;
            (Some(parent.id), Anchor::LastChildOf(parent.bounds).point())
        }
        None => match query.root()? {
            Some(root) => (Some(root.id), Anchor::LastChildOf(root.bounds).point()),
            None => (None, 0),
        },
    };

    let widened = apply_shift_tx(tx, tree, widen_for_insert(point, 2))?;
    let bounds = leaf_at(point);
    insert_node_tx(tx, tree, id, name, parent_id, bounds)?;

    tracing::debug!(
        tree,
        node = %id,
        parent = ?parent_id.map(NodeId::get),
        bounds = %bounds,
        widened,
        "created node"
    );
    query.get(id)
}

pub(super) fn delete_node_tx(
    tx: &Transaction<'_>,
    tree: &str,
    id: NodeId,
) -> Result<usize, StoreError> {
    let query = TreeQuery::new(tx, tree);
    let node = query.get(id)?;

    let deleted = delete_range_tx(tx, tree, node.bounds)?;
    let expected = usize::try_from(node.bounds.width() / 2)
        .map_err(|_| StoreError::InvalidInput("numeric overflow"))?;
    if deleted != expected {
        return Err(StoreError::InvariantViolation(InvariantViolation::WidthMismatch {
            id,
            width: node.bounds.right - node.bounds.left,
            descendants: deleted as i64 - 1,
        }));
    }
    let narrowed = apply_shift_tx(tx, tree, narrow_for_delete(node.bounds))?;

    tracing::debug!(tree, node = %id, bounds = %node.bounds, deleted, narrowed, "deleted subtree");
    Ok(deleted)
}

/// Detach, re-point and attach `node` with its subtree.
pub(super) fn apply_move_tx(
    tx: &Transaction<'_>,
    tree: &str,
    node: &Node,
    resolution: Resolution,
) -> Result<MoveOutcome, StoreError> {
    let MoveTarget { parent, point } = match resolution {
        Resolution::Target(target) => target,
        Resolution::Rejected(reason) => {
            tracing::debug!(tree, node = %node.id, reason = reason.as_str(), "move rejected");
            return Ok(MoveOutcome::Rejected(reason));
        }
    };

    let plan = match relocate_subtree(node.bounds, point) {
        Ok(plan) => plan,
        Err(err) => {
            let reason = MoveRejection::from(err);
            tracing::debug!(tree, node = %node.id, reason = reason.as_str(), "move rejected");
            return Ok(MoveOutcome::Rejected(reason));
        }
    };

    let parked = park_subtree_tx(tx, tree, plan.source)?;
    let expected = usize::try_from(plan.width() / 2)
        .map_err(|_| StoreError::InvalidInput("numeric overflow"))?;
    if parked != expected {
        return Err(StoreError::InvariantViolation(InvariantViolation::WidthMismatch {
            id: node.id,
            width: plan.source.right - plan.source.left,
            descendants: parked as i64 - 1,
        }));
    }

    // Detach must land before the attach point is used: it is expressed in post-detach numbering.
    let narrowed = apply_shift_tx(tx, tree, plan.detach)?;
    let widened = apply_shift_tx(tx, tree, plan.attach)?;
    unpark_subtree_tx(tx, tree, plan.source, plan.landing.left)?;
    update_parent_tx(tx, tree, node.id, parent)?;

    tracing::debug!(
        tree,
        node = %node.id,
        parent = %parent,
        from = %plan.source,
        to = %plan.landing,
        narrowed,
        widened,
        "moved subtree"
    );
    Ok(MoveOutcome::Moved(TreeQuery::new(tx, tree).get(node.id)?))
}

/// Recomputes every boundary pair from `parent_id`, keeping sibling order by current `left`.
///
/// Returns the number of nodes whose bounds changed.
pub(super) fn rebuild_bounds_tx(
    tx: &Transaction<'_>,
    tree: &str,
) -> Result<usize, StoreError> {
    let mut stmt = tx.prepare(
        "SELECT id, parent_id, lft, rgt FROM nodes WHERE tree=?1 ORDER BY lft ASC, id ASC",
    )?;
    let rows = stmt.query_map(params![tree], |row| {
        Ok((
            node_id_column(row, 0)?,
            row.get::<_, Option<i64>>(1)?,
            Bounds::new(row.get(2)?, row.get(3)?),
        ))
    })?;
    let rows = rows.collect::<Result<Vec<_>, _>>()?;
    drop(stmt);

    if rows.is_empty() {
        return Ok(0);
    }

    let mut children: BTreeMap<Option<i64>, Vec<NodeId>> = BTreeMap::new();
    let mut current: BTreeMap<NodeId, Bounds> = BTreeMap::new();
    for (id, parent, bounds) in &rows {
        children.entry(*parent).or_default().push(*id);
        current.insert(*id, *bounds);
    }

    let roots = children.get(&None).cloned().unwrap_or_default();
    let root = match roots.as_slice() {
        [root] => *root,
        [first, second, ..] => {
            return Err(StoreError::InvariantViolation(
                InvariantViolation::MultipleRoots {
                    first: *first,
                    second: *second,
                },
            ));
        }
        [] => {
            return Err(StoreError::InvariantViolation(
                InvariantViolation::BrokenParentLinks { id: rows[0].0 },
            ));
        }
    };

    let mut assigned: BTreeMap<NodeId, Bounds> = BTreeMap::new();
    let mut counter = 0i64;
    let mut stack = vec![(root, false)];
    while let Some((id, closing)) = stack.pop() {
        counter += 1;
        if closing {
            if let Some(bounds) = assigned.get_mut(&id) {
                bounds.right = counter;
            }
            continue;
        }
        assigned.insert(id, Bounds::new(counter, counter));
        stack.push((id, true));
        if let Some(kids) = children.get(&Some(id.get())) {
            for child in kids.iter().rev() {
                stack.push((*child, false));
            }
        }
    }

    if let Some((id, _, _)) = rows.iter().find(|(id, _, _)| !assigned.contains_key(id)) {
        return Err(StoreError::InvariantViolation(
            InvariantViolation::BrokenParentLinks { id: *id },
        ));
    }

    let mut changed = 0usize;
    for (id, bounds) in &assigned {
        if current.get(id) != Some(bounds) {
            update_bounds_tx(tx, tree, *id, *bounds)?;
            changed += 1;
        }
    }

    tracing::info!(tree, nodes = rows.len(), changed, "rebuilt bounds from parent links");
    Ok(changed)
}

pub(super) fn verify_tree_tx(query: &TreeQuery<'_>) -> Result<(), StoreError> {
    let shapes = query.shapes()?;
    check_tree(&shapes).map_err(|violation| {
        tracing::warn!(tree = query.tree(), violation = %violation, "tree invariant violated");
        StoreError::InvariantViolation(violation)
    })
}
