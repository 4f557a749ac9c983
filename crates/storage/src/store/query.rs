#![forbid(unsafe_code)]

use super::StoreError;
use super::support::{NODE_COLUMNS, node_from_row};
use ns_core::ids::NodeId;
use ns_core::{Node, NodeShape};
use rusqlite::{Connection, OptionalExtension, Params, params};

/// Read-only structural queries over one tree, answered from boundary predicates.
///
/// Every list is ordered by ascending `left` unless noted otherwise.
#[derive(Clone, Copy, Debug)]
pub struct TreeQuery<'a> {
    conn: &'a Connection,
    tree: &'a str,
}

impl<'a> TreeQuery<'a> {
    pub(super) fn new(conn: &'a Connection, tree: &'a str) -> Self {
        Self { conn, tree }
    }

    pub fn tree(&self) -> &str {
        self.tree
    }

    fn select(&self, filter: &str, params: impl Params) -> Result<Vec<Node>, StoreError> {
        let sql = format!(
            "SELECT {NODE_COLUMNS} FROM nodes WHERE tree=?1 AND {filter} ORDER BY lft ASC"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params, node_from_row)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    fn select_one(&self, filter: &str, params: impl Params) -> Result<Option<Node>, StoreError> {
        let sql = format!("SELECT {NODE_COLUMNS} FROM nodes WHERE tree=?1 AND {filter} LIMIT 1");
        Ok(self.conn.query_row(&sql, params, node_from_row).optional()?)
    }

    pub fn find(&self, id: NodeId) -> Result<Option<Node>, StoreError> {
        self.select_one("id=?2", params![self.tree, id.get()])
    }

    pub fn get(&self, id: NodeId) -> Result<Node, StoreError> {
        self.find(id)?.ok_or(StoreError::UnknownNode(id))
    }

    pub fn count(&self) -> Result<usize, StoreError> {
        let count = self.conn.query_row(
            "SELECT COUNT(1) FROM nodes WHERE tree=?1",
            params![self.tree],
            |row| row.get::<_, i64>(0),
        )?;
        usize::try_from(count).map_err(|_| StoreError::InvalidInput("numeric overflow"))
    }

    pub fn root(&self) -> Result<Option<Node>, StoreError> {
        self.select_one("parent_id IS NULL ORDER BY lft ASC", params![self.tree])
    }

    /// The whole tree in pre-order.
    pub fn nodes(&self) -> Result<Vec<Node>, StoreError> {
        self.select("1=1", params![self.tree])
    }

    pub fn shapes(&self) -> Result<Vec<NodeShape>, StoreError> {
        Ok(self.nodes()?.iter().map(Node::shape).collect())
    }

    pub fn parent(&self, node: &Node) -> Result<Option<Node>, StoreError> {
        match node.parent_id {
            Some(parent_id) => self.find(parent_id),
            None => Ok(None),
        }
    }

    pub fn children(&self, node: &Node) -> Result<Vec<Node>, StoreError> {
        self.select("parent_id=?2", params![self.tree, node.id.get()])
    }

    pub fn first_child(&self, node: &Node) -> Result<Option<Node>, StoreError> {
        self.select_one(
            "parent_id=?2 ORDER BY lft ASC",
            params![self.tree, node.id.get()],
        )
    }

    pub fn last_child(&self, node: &Node) -> Result<Option<Node>, StoreError> {
        self.select_one(
            "parent_id=?2 ORDER BY lft DESC",
            params![self.tree, node.id.get()],
        )
    }

    /// Root first.
    pub fn ancestors(&self, node: &Node) -> Result<Vec<Node>, StoreError> {
        self.select(
            "lft < ?2 AND rgt > ?3",
            params![self.tree, node.left(), node.right()],
        )
    }

    /// Root first, `node` last.
    pub fn self_and_ancestors(&self, node: &Node) -> Result<Vec<Node>, StoreError> {
        self.select(
            "lft <= ?2 AND rgt >= ?3",
            params![self.tree, node.left(), node.right()],
        )
    }

    pub fn descendants(&self, node: &Node) -> Result<Vec<Node>, StoreError> {
        self.select(
            "lft > ?2 AND rgt < ?3",
            params![self.tree, node.left(), node.right()],
        )
    }

    /// `node` first.
    pub fn self_and_descendants(&self, node: &Node) -> Result<Vec<Node>, StoreError> {
        self.select(
            "lft >= ?2 AND rgt <= ?3",
            params![self.tree, node.left(), node.right()],
        )
    }

    pub fn leaves(&self) -> Result<Vec<Node>, StoreError> {
        self.select("rgt = lft + 1", params![self.tree])
    }

    /// Leaves among `node` and its descendants.
    pub fn leaves_of(&self, node: &Node) -> Result<Vec<Node>, StoreError> {
        self.select(
            "lft >= ?2 AND rgt <= ?3 AND rgt = lft + 1",
            params![self.tree, node.left(), node.right()],
        )
    }

    pub fn left_sibling(&self, node: &Node) -> Result<Option<Node>, StoreError> {
        let Some(parent_id) = node.parent_id else {
            return Ok(None);
        };
        self.select_one(
            "parent_id=?2 AND rgt=?3",
            params![self.tree, parent_id.get(), node.left() - 1],
        )
    }

    pub fn right_sibling(&self, node: &Node) -> Result<Option<Node>, StoreError> {
        let Some(parent_id) = node.parent_id else {
            return Ok(None);
        };
        self.select_one(
            "parent_id=?2 AND lft=?3",
            params![self.tree, parent_id.get(), node.right() + 1],
        )
    }

    pub fn siblings(&self, node: &Node) -> Result<Vec<Node>, StoreError> {
        let Some(parent_id) = node.parent_id else {
            return Ok(Vec::new());
        };
        self.select(
            "parent_id=?2 AND id<>?3",
            params![self.tree, parent_id.get(), node.id.get()],
        )
    }

    pub fn self_and_siblings(&self, node: &Node) -> Result<Vec<Node>, StoreError> {
        let Some(parent_id) = node.parent_id else {
            return self.select("id=?2", params![self.tree, node.id.get()]);
        };
        self.select("parent_id=?2", params![self.tree, parent_id.get()])
    }

    /// Depth below the root; the root is level 0.
    pub fn level(&self, node: &Node) -> Result<usize, StoreError> {
        let count = self.conn.query_row(
            "SELECT COUNT(1) FROM nodes WHERE tree=?1 AND lft < ?2 AND rgt > ?3",
            params![self.tree, node.left(), node.right()],
            |row| row.get::<_, i64>(0),
        )?;
        usize::try_from(count).map_err(|_| StoreError::InvalidInput("numeric overflow"))
    }

    /// Tightest node whose range encloses a splice right after boundary `point`.
    pub fn enclosing(&self, point: i64) -> Result<Option<Node>, StoreError> {
        self.select_one(
            "lft <= ?2 AND rgt > ?2 ORDER BY lft DESC",
            params![self.tree, point],
        )
    }
}
