#![forbid(unsafe_code)]

use super::StoreError;
use super::query::TreeQuery;
use ns_core::ids::NodeId;
use ns_core::{Anchor, Directive, MoveRejection, Node};

/// Absolute destination of a move: the new parent and the insertion point
/// (pre-move numbering) right after which the subtree is spliced.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(super) struct MoveTarget {
    pub(super) parent: NodeId,
    pub(super) point: i64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(super) enum Resolution {
    Target(MoveTarget),
    Rejected(MoveRejection),
}

fn target(parent: NodeId, anchor: Anchor) -> Resolution {
    Resolution::Target(MoveTarget {
        parent,
        point: anchor.point(),
    })
}

pub(super) fn resolve_directive(
    query: &TreeQuery<'_>,
    node: &Node,
    directive: Directive,
) -> Result<Resolution, StoreError> {
    let Some(parent_id) = node.parent_id else {
        return Ok(Resolution::Rejected(MoveRejection::IsRoot));
    };

    let resolution = match directive {
        Directive::Higher => match query.left_sibling(node)? {
            Some(sibling) => target(parent_id, Anchor::Before(sibling.bounds)),
            None => Resolution::Rejected(MoveRejection::NoLeftSibling),
        },
        Directive::Lower => match query.right_sibling(node)? {
            Some(sibling) => target(parent_id, Anchor::After(sibling.bounds)),
            None => Resolution::Rejected(MoveRejection::NoRightSibling),
        },
        Directive::Highest => {
            let parent = query.get(parent_id)?;
            match query.first_child(&parent)? {
                Some(first) if first.id != node.id => {
                    target(parent_id, Anchor::Before(first.bounds))
                }
                _ => Resolution::Rejected(MoveRejection::AlreadyFirst),
            }
        }
        Directive::Lowest => {
            let parent = query.get(parent_id)?;
            match query.last_child(&parent)? {
                Some(last) if last.id != node.id => target(parent_id, Anchor::After(last.bounds)),
                _ => Resolution::Rejected(MoveRejection::AlreadyLast),
            }
        }
        Directive::Above(reference) | Directive::Below(reference) => {
            let reference = query.get(reference)?;
            if reference.id == node.id {
                Resolution::Rejected(MoveRejection::Unchanged)
            } else if node.is_ancestor_of(&reference) {
                Resolution::Rejected(MoveRejection::IntoOwnSubtree)
            } else {
                match reference.parent_id {
                    None => Resolution::Rejected(MoveRejection::IsRoot),
                    Some(reference_parent) if matches!(directive, Directive::Above(_)) => {
                        target(reference_parent, Anchor::Before(reference.bounds))
                    }
                    Some(reference_parent) => {
                        target(reference_parent, Anchor::After(reference.bounds))
                    }
                }
            }
        }
        Directive::Into(reference) => {
            let reference = query.get(reference)?;
            if reference.id == node.id || node.is_ancestor_of(&reference) {
                Resolution::Rejected(MoveRejection::IntoOwnSubtree)
            } else {
                target(reference.id, Anchor::LastChildOf(reference.bounds))
            }
        }
        Directive::Indent => match query.left_sibling(node)? {
            Some(sibling) => target(sibling.id, Anchor::LastChildOf(sibling.bounds)),
            None => Resolution::Rejected(MoveRejection::NoLeftSibling),
        },
        Directive::Outdent => {
            let parent = query.get(parent_id)?;
            match parent.parent_id {
                Some(grandparent_id) => target(grandparent_id, Anchor::After(parent.bounds)),
                None => Resolution::Rejected(MoveRejection::NoGrandparent),
            }
        }
        Directive::To(position) => resolve_position(query, node, position)?,
    };

    Ok(resolution)
}

fn resolve_position(
    query: &TreeQuery<'_>,
    node: &Node,
    position: i64,
) -> Result<Resolution, StoreError> {
    let Some(point) = position.checked_sub(1) else {
        return Ok(Resolution::Rejected(MoveRejection::OutsideRoot));
    };
    let Some(root) = query.root()? else {
        return Ok(Resolution::Rejected(MoveRejection::OutsideRoot));
    };
    if !root.bounds.encloses_point(point) {
        return Ok(Resolution::Rejected(MoveRejection::OutsideRoot));
    }
    if node.bounds.encloses_point(point) {
        return Ok(Resolution::Rejected(MoveRejection::IntoOwnSubtree));
    }
    match query.enclosing(point)? {
        Some(parent) => Ok(Resolution::Target(MoveTarget {
            parent: parent.id,
            point,
        })),
        None => Ok(Resolution::Rejected(MoveRejection::OutsideRoot)),
    }
}

/// Reparenting resolves to `into(parent)`; the current parent keeps the node where it is.
pub(super) fn resolve_parent(
    query: &TreeQuery<'_>,
    node: &Node,
    parent_id: Option<NodeId>,
) -> Result<Resolution, StoreError> {
    match (node.parent_id, parent_id) {
        (current, wanted) if current == wanted => {
            Ok(Resolution::Rejected(MoveRejection::Unchanged))
        }
        (Some(_), None) => Ok(Resolution::Rejected(MoveRejection::SecondRoot)),
        (_, Some(parent_id)) => resolve_directive(query, node, Directive::Into(parent_id)),
        (None, None) => Ok(Resolution::Rejected(MoveRejection::Unchanged)),
    }
}
