#![forbid(unsafe_code)]

use crate::ids::NodeId;
use crate::model::Node;
use crate::range::RelocationError;

/// Relative (or absolute, for `To`) instruction for repositioning a node with its subtree.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Directive {
    /// Swap with the left sibling.
    Higher,
    /// Swap with the right sibling.
    Lower,
    /// First position among the current siblings.
    Highest,
    /// Last position among the current siblings.
    Lowest,
    /// Sibling of the reference, immediately before it.
    Above(NodeId),
    /// Sibling of the reference, immediately after it.
    Below(NodeId),
    /// Last child of the reference.
    Into(NodeId),
    /// Last child of the left sibling.
    Indent,
    /// Next sibling of the current parent.
    Outdent,
    /// Left boundary lands at this gap of the pre-move numbering.
    To(i64),
}

impl Directive {
    pub fn as_str(self) -> &'static str {
        match self {
            Directive::Higher => "higher",
            Directive::Lower => "lower",
            Directive::Highest => "highest",
            Directive::Lowest => "lowest",
            Directive::Above(_) => "above",
            Directive::Below(_) => "below",
            Directive::Into(_) => "into",
            Directive::Indent => "indent",
            Directive::Outdent => "outdent",
            Directive::To(_) => "to",
        }
    }

}

impl std::fmt::Display for Directive {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Directive::Above(id) | Directive::Below(id) | Directive::Into(id) => {
                write!(f, "{}:{id}", self.as_str())
            }
            Directive::To(position) => write!(f, "to:{position}"),
            _ => f.write_str(self.as_str()),
        }
    }
}

/// Why a directive left the tree untouched. Not an error: callers branch on it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MoveRejection {
    NoLeftSibling,
    NoRightSibling,
    AlreadyFirst,
    AlreadyLast,
    /// The moving node (or the sibling reference) is the root.
    IsRoot,
    /// Outdent from a child of the root: there is no sibling position above the parent.
    NoGrandparent,
    /// Detaching a non-root node from every parent would create a second root.
    SecondRoot,
    IntoOwnSubtree,
    Unchanged,
    OutsideRoot,
}

impl MoveRejection {
    pub fn as_str(self) -> &'static str {
        match self {
            MoveRejection::NoLeftSibling => "no_left_sibling",
            MoveRejection::NoRightSibling => "no_right_sibling",
            MoveRejection::AlreadyFirst => "already_first",
            MoveRejection::AlreadyLast => "already_last",
            MoveRejection::IsRoot => "is_root",
            MoveRejection::NoGrandparent => "no_grandparent",
            MoveRejection::SecondRoot => "second_root",
            MoveRejection::IntoOwnSubtree => "into_own_subtree",
            MoveRejection::Unchanged => "unchanged",
            MoveRejection::OutsideRoot => "outside_root",
        }
    }
}

impl From<RelocationError> for MoveRejection {
    fn from(value: RelocationError) -> Self {
        match value {
            RelocationError::IntoOwnSubtree => MoveRejection::IntoOwnSubtree,
            RelocationError::Unchanged => MoveRejection::Unchanged,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MoveOutcome {
    Moved(Node),
    Rejected(MoveRejection),
}

impl MoveOutcome {
    pub fn is_moved(&self) -> bool {
        matches!(self, MoveOutcome::Moved(_))
    }

    pub fn node(&self) -> Option<&Node> {
        match self {
            MoveOutcome::Moved(node) => Some(node),
            MoveOutcome::Rejected(_) => None,
        }
    }
}
