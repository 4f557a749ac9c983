#![allow(dead_code)]

use ns_core::Node;
use ns_core::ids::{NodeId, TreeId};
use ns_storage::{CreateNodeRequest, SqliteStore};
use std::path::PathBuf;

pub fn temp_dir(test_name: &str) -> PathBuf {
    let base = std::env::temp_dir();
    let pid = std::process::id();
    let nonce = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    let dir = base.join(format!("ns_storage_{test_name}_{pid}_{nonce}"));
    std::fs::create_dir_all(&dir).expect("create temp dir");
    dir
}

pub fn tree(name: &str) -> TreeId {
    TreeId::try_new(name).expect("tree id")
}

pub fn id(value: i64) -> NodeId {
    NodeId::try_new(value).expect("node id")
}

pub const CATALOG: [(i64, Option<i64>, &str); 10] = [
    (1, None, "Electronics"),
    (2, Some(1), "Televisions"),
    (3, Some(2), "Tube"),
    (4, Some(2), "LCD"),
    (5, Some(2), "Plasma"),
    (6, Some(1), "Portable Electronics"),
    (7, Some(6), "MP3 Players"),
    (8, Some(7), "Flash"),
    (9, Some(6), "CD Players"),
    (10, Some(6), "2 Way Radios"),
];

// id | lft | rgt
//  1 |  1  | 20  Electronics
//  2 |  2  |  9    Televisions
//  3 |  3  |  4      Tube
//  4 |  5  |  6      LCD
//  5 |  7  |  8      Plasma
//  6 | 10  | 19    Portable Electronics
//  7 | 11  | 14      MP3 Players
//  8 | 12  | 13        Flash
//  9 | 15  | 16      CD Players
// 10 | 17  | 18      2 Way Radios
pub const CATALOG_BOUNDS: [(i64, i64, i64); 10] = [
    (1, 1, 20),
    (2, 2, 9),
    (3, 3, 4),
    (4, 5, 6),
    (5, 7, 8),
    (6, 10, 19),
    (7, 11, 14),
    (8, 12, 13),
    (9, 15, 16),
    (10, 17, 18),
];

pub fn seed_catalog(store: &mut SqliteStore, tree: &TreeId) {
    for (node, parent, name) in CATALOG {
        let mut request = CreateNodeRequest::new(name).with_id(id(node));
        if let Some(parent) = parent {
            request = request.under(id(parent));
        }
        store.create_node(tree, request).expect("create catalog node");
    }
}

pub fn catalog_store() -> (SqliteStore, TreeId) {
    let mut store = SqliteStore::open_in_memory().expect("open store");
    let tree = tree("catalog");
    seed_catalog(&mut store, &tree);
    (store, tree)
}

pub fn node(store: &SqliteStore, tree: &TreeId, node: i64) -> Node {
    store.query(tree).get(id(node)).expect("get node")
}

pub fn pos(store: &SqliteStore, tree: &TreeId, node_id: i64) -> (i64, i64) {
    let node = node(store, tree, node_id);
    (node.left(), node.right())
}

/// `(id, left, right)` for every node, ordered by id.
pub fn snapshot(store: &SqliteStore, tree: &TreeId) -> Vec<(i64, i64, i64)> {
    let mut rows = store
        .query(tree)
        .nodes()
        .expect("nodes")
        .into_iter()
        .map(|node| (node.id.get(), node.left(), node.right()))
        .collect::<Vec<_>>();
    rows.sort();
    rows
}

pub fn names(nodes: &[Node]) -> Vec<&str> {
    nodes.iter().map(|node| node.name.as_str()).collect()
}

pub fn ids(nodes: &[Node]) -> Vec<i64> {
    nodes.iter().map(|node| node.id.get()).collect()
}
