#![forbid(unsafe_code)]

use crate::ids::NodeId;

/// Boundary pair of one node. `left < right` for every stored node.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Bounds {
    pub left: i64,
    pub right: i64,
}

impl Bounds {
    pub const fn new(left: i64, right: i64) -> Self {
        Self { left, right }
    }

    /// Number of boundary values covered, `right - left + 1`. Always even for a valid node.
    pub const fn width(self) -> i64 {
        self.right - self.left + 1
    }

    pub const fn is_leaf(self) -> bool {
        self.right == self.left + 1
    }

    pub const fn descendant_count(self) -> i64 {
        (self.right - self.left - 1) / 2
    }

    /// Strict containment: `other` lies inside `self` and is not `self`.
    pub const fn contains(self, other: Bounds) -> bool {
        self.left < other.left && other.right < self.right
    }

    /// True when a splice right after boundary `point` lands inside this range.
    pub const fn encloses_point(self, point: i64) -> bool {
        self.left <= point && point < self.right
    }

    pub const fn offset(self, delta: i64) -> Bounds {
        Bounds::new(self.left + delta, self.right + delta)
    }
}

impl std::fmt::Display for Bounds {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({},{})", self.left, self.right)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Node {
    pub id: NodeId,
    pub name: String,
    pub parent_id: Option<NodeId>,
    pub bounds: Bounds,
}

impl Node {
    pub fn left(&self) -> i64 {
        self.bounds.left
    }

    pub fn right(&self) -> i64 {
        self.bounds.right
    }

    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }

    pub fn is_leaf(&self) -> bool {
        self.bounds.is_leaf()
    }

    /// True when `other` sits anywhere below this node.
    pub fn is_ancestor_of(&self, other: &Node) -> bool {
        self.bounds.contains(other.bounds)
    }

    pub fn shape(&self) -> NodeShape {
        NodeShape {
            id: self.id,
            parent_id: self.parent_id,
            bounds: self.bounds,
        }
    }
}

/// The structural part of a node: everything the invariant checker needs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NodeShape {
    pub id: NodeId,
    pub parent_id: Option<NodeId>,
    pub bounds: Bounds,
}
