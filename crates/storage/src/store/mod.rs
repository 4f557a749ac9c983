#![forbid(unsafe_code)]

mod config;
mod error;
mod mutate;
mod query;
mod requests;
mod resolve;
mod support;

pub use config::*;
pub use error::StoreError;
pub use query::TreeQuery;
pub use requests::*;

use mutate::*;
use ns_core::ids::{NodeId, TreeId};
use ns_core::{Directive, MoveOutcome, Node};
use resolve::{resolve_directive, resolve_parent};
use rusqlite::{Connection, Transaction, TransactionBehavior};
use std::path::Path;
use support::install_schema;

#[derive(Debug)]
pub struct SqliteStore {
    conn: Connection,
    config: StoreConfig,
    in_memory: bool,
}

impl SqliteStore {
    pub fn open(storage_dir: impl AsRef<Path>) -> Result<Self, StoreError> {
        Self::open_with(StoreConfig::new(storage_dir))
    }

    pub fn open_with(config: StoreConfig) -> Result<Self, StoreError> {
        std::fs::create_dir_all(&config.storage_dir)?;
        let conn = Connection::open(config.db_path())?;
        conn.execute_batch("PRAGMA journal_mode=WAL;\nPRAGMA synchronous=NORMAL;")?;
        Self::from_connection(conn, config, false)
    }

    /// Private database with the self-check always on.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let mut config = StoreConfig::new("");
        config.verify_invariants = true;
        Self::from_connection(Connection::open_in_memory()?, config, true)
    }

    fn from_connection(
        conn: Connection,
        config: StoreConfig,
        in_memory: bool,
    ) -> Result<Self, StoreError> {
        conn.busy_timeout(config.busy_timeout)?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        install_schema(&conn)?;
        let location = if in_memory {
            ":memory:".to_string()
        } else {
            config.db_path().display().to_string()
        };
        tracing::info!(
            path = %location,
            verify_invariants = config.verify_invariants,
            "opened nested set store"
        );
        Ok(Self {
            conn,
            config,
            in_memory,
        })
    }

    pub fn storage_dir(&self) -> Option<&Path> {
        if self.in_memory {
            None
        } else {
            Some(&self.config.storage_dir)
        }
    }

    pub fn query<'a>(&'a self, tree: &'a TreeId) -> TreeQuery<'a> {
        TreeQuery::new(&self.conn, tree.as_str())
    }

    pub fn list_trees(&self) -> Result<Vec<TreeId>, StoreError> {
        let mut stmt = self.conn.prepare("SELECT tree FROM trees ORDER BY tree ASC")?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
        let mut out = Vec::new();
        for tree in rows {
            out.push(
                TreeId::try_new(tree?).map_err(|_| StoreError::InvalidInput("invalid tree row"))?,
            );
        }
        Ok(out)
    }

    /// Runs `f` inside one write transaction scoped to `tree`.
    ///
    /// The transaction commits only if `f` succeeds and, when enabled, the tree passes the
    /// self-check; every other exit rolls it back.
    pub fn batch<T, F>(&mut self, tree: &TreeId, f: F) -> Result<T, StoreError>
    where
        F: FnOnce(&mut TreeTx<'_>) -> Result<T, StoreError>,
    {
        let verify = self.config.verify_invariants;
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        let mut scope = TreeTx {
            tx,
            tree: tree.as_str().to_string(),
            dirty: false,
        };
        let value = match f(&mut scope) {
            Ok(value) => value,
            Err(err) => {
                tracing::debug!(tree = %tree, error = %err, "rolled back tree transaction");
                return Err(err);
            }
        };
        if verify && scope.dirty {
            scope.check()?;
        }
        scope.tx.commit()?;
        Ok(value)
    }

    pub fn create_node(
        &mut self,
        tree: &TreeId,
        request: CreateNodeRequest,
    ) -> Result<Node, StoreError> {
        self.batch(tree, |tx| tx.create_node(request))
    }

    /// Removes the node and its whole subtree; returns the number of removed nodes.
    pub fn delete_node(&mut self, tree: &TreeId, id: NodeId) -> Result<usize, StoreError> {
        self.batch(tree, |tx| tx.delete_node(id))
    }

    pub fn move_node(
        &mut self,
        tree: &TreeId,
        id: NodeId,
        directive: Directive,
    ) -> Result<MoveOutcome, StoreError> {
        self.batch(tree, |tx| tx.move_node(id, directive))
    }

    pub fn set_parent(
        &mut self,
        tree: &TreeId,
        id: NodeId,
        parent_id: Option<NodeId>,
    ) -> Result<MoveOutcome, StoreError> {
        self.batch(tree, |tx| tx.set_parent(id, parent_id))
    }

    pub fn rebuild_bounds(&mut self, tree: &TreeId) -> Result<usize, StoreError> {
        self.batch(tree, |tx| tx.rebuild_bounds())
    }

    pub fn check_tree(&self, tree: &TreeId) -> Result<(), StoreError> {
        verify_tree_tx(&self.query(tree))
    }
}

/// One open write transaction over a single tree.
///
/// Mutations see each other's effects immediately; nothing is visible outside until
/// [`SqliteStore::batch`] commits.
pub struct TreeTx<'conn> {
    tx: Transaction<'conn>,
    tree: String,
    dirty: bool,
}

impl TreeTx<'_> {
    pub fn query(&self) -> TreeQuery<'_> {
        TreeQuery::new(&self.tx, &self.tree)
    }

    pub fn create_node(&mut self, request: CreateNodeRequest) -> Result<Node, StoreError> {
        let node = create_node_tx(&self.tx, &self.tree, request)?;
        self.dirty = true;
        Ok(node)
    }

    pub fn delete_node(&mut self, id: NodeId) -> Result<usize, StoreError> {
        let deleted = delete_node_tx(&self.tx, &self.tree, id)?;
        self.dirty = true;
        Ok(deleted)
    }

    pub fn move_node(&mut self, id: NodeId, directive: Directive) -> Result<MoveOutcome, StoreError> {
        let node = self.query().get(id)?;
        let resolution = resolve_directive(&self.query(), &node, directive)?;
        tracing::trace!(tree = %self.tree, node = %id, directive = %directive, ?resolution, "resolved directive");
        let outcome = apply_move_tx(&self.tx, &self.tree, &node, resolution)?;
        self.dirty |= outcome.is_moved();
        Ok(outcome)
    }

    /// Reparents through the move pipeline: `Some(parent)` appends under `parent`.
    pub fn set_parent(
        &mut self,
        id: NodeId,
        parent_id: Option<NodeId>,
    ) -> Result<MoveOutcome, StoreError> {
        let node = self.query().get(id)?;
        let resolution = resolve_parent(&self.query(), &node, parent_id)?;
        let outcome = apply_move_tx(&self.tx, &self.tree, &node, resolution)?;
        self.dirty |= outcome.is_moved();
        Ok(outcome)
    }

    pub fn rebuild_bounds(&mut self) -> Result<usize, StoreError> {
        let changed = rebuild_bounds_tx(&self.tx, &self.tree)?;
        self.dirty = true;
        Ok(changed)
    }

    pub fn check(&self) -> Result<(), StoreError> {
        verify_tree_tx(&self.query())
    }
}
