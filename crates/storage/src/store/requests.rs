#![forbid(unsafe_code)]

use ns_core::ids::NodeId;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CreateNodeRequest {
    /// Explicit id; allocated from the tree's counter when `None`.
    pub id: Option<NodeId>,
    pub name: String,
    /// Appended as the last child of this node. Without a parent the node becomes the root
    /// of an empty tree, or the last child of the existing root.
    pub parent_id: Option<NodeId>,
}

impl CreateNodeRequest {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
            parent_id: None,
        }
    }

    pub fn with_id(mut self, id: NodeId) -> Self {
        self.id = Some(id);
        self
    }

    pub fn under(mut self, parent_id: NodeId) -> Self {
        self.parent_id = Some(parent_id);
        self
    }
}
