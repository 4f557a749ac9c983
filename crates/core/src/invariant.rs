#![forbid(unsafe_code)]

use crate::ids::NodeId;
use crate::model::NodeShape;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InvariantViolation {
    InvalidBounds {
        id: NodeId,
        left: i64,
        right: i64,
    },
    NonContiguous {
        expected: i64,
        found: i64,
    },
    MultipleRoots {
        first: NodeId,
        second: NodeId,
    },
    Overlap {
        outer: NodeId,
        inner: NodeId,
    },
    ParentMismatch {
        id: NodeId,
        expected: Option<NodeId>,
        stored: Option<NodeId>,
    },
    WidthMismatch {
        id: NodeId,
        width: i64,
        descendants: i64,
    },
    /// `parent_id` links do not form a single rooted tree.
    BrokenParentLinks {
        id: NodeId,
    },
}

impl std::fmt::Display for InvariantViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidBounds { id, left, right } => {
                write!(f, "node {id} has invalid bounds ({left},{right})")
            }
            Self::NonContiguous { expected, found } => write!(
                f,
                "boundary values are not contiguous (expected={expected}, found={found})"
            ),
            Self::MultipleRoots { first, second } => {
                write!(f, "multiple roots (first={first}, second={second})")
            }
            Self::Overlap { outer, inner } => {
                write!(f, "ranges overlap (outer={outer}, inner={inner})")
            }
            Self::ParentMismatch {
                id,
                expected,
                stored,
            } => write!(
                f,
                "parent mismatch for node {id} (expected={}, stored={})",
                fmt_parent(*expected),
                fmt_parent(*stored)
            ),
            Self::WidthMismatch {
                id,
                width,
                descendants,
            } => write!(
                f,
                "width mismatch for node {id} (width={width}, descendants={descendants})"
            ),
            Self::BrokenParentLinks { id } => {
                write!(f, "parent links do not form a tree (at node {id})")
            }
        }
    }
}

impl std::error::Error for InvariantViolation {}

fn fmt_parent(parent: Option<NodeId>) -> String {
    match parent {
        Some(id) => id.to_string(),
        None => "none".to_string(),
    }
}

/// Verifies the nested-set invariant over every node of one tree.
///
/// An empty slice is a valid (empty) tree.
pub fn check_tree(nodes: &[NodeShape]) -> Result<(), InvariantViolation> {
    for node in nodes {
        if node.bounds.left >= node.bounds.right {
            return Err(InvariantViolation::InvalidBounds {
                id: node.id,
                left: node.bounds.left,
                right: node.bounds.right,
            });
        }
    }

    let mut values = Vec::with_capacity(nodes.len() * 2);
    for node in nodes {
        values.push(node.bounds.left);
        values.push(node.bounds.right);
    }
    values.sort_unstable();
    for (index, found) in values.iter().enumerate() {
        let expected = index as i64 + 1;
        if *found != expected {
            return Err(InvariantViolation::NonContiguous {
                expected,
                found: *found,
            });
        }
    }

    let mut ordered = nodes.to_vec();
    ordered.sort_by_key(|node| node.bounds.left);

    let mut stack: Vec<NodeShape> = Vec::new();
    for (index, node) in ordered.iter().enumerate() {
        while stack
            .last()
            .is_some_and(|top| top.bounds.right < node.bounds.left)
        {
            stack.pop();
        }

        let expected = match stack.last() {
            Some(top) => {
                if node.bounds.right > top.bounds.right {
                    return Err(InvariantViolation::Overlap {
                        outer: top.id,
                        inner: node.id,
                    });
                }
                Some(top.id)
            }
            None if index == 0 => None,
            None => {
                return Err(InvariantViolation::MultipleRoots {
                    first: ordered[0].id,
                    second: node.id,
                });
            }
        };

        if node.parent_id != expected {
            return Err(InvariantViolation::ParentMismatch {
                id: node.id,
                expected,
                stored: node.parent_id,
            });
        }
        stack.push(*node);
    }

    let lefts = ordered
        .iter()
        .map(|node| node.bounds.left)
        .collect::<Vec<_>>();
    for node in &ordered {
        let start = lefts.partition_point(|left| *left <= node.bounds.left);
        let end = lefts.partition_point(|left| *left < node.bounds.right);
        let descendants = (end - start) as i64;
        let width = node.bounds.right - node.bounds.left;
        if width != 1 + 2 * descendants {
            return Err(InvariantViolation::WidthMismatch {
                id: node.id,
                width,
                descendants,
            });
        }
    }

    Ok(())
}
