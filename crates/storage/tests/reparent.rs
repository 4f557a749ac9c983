#![forbid(unsafe_code)]

mod support;

use ns_core::ids::{NodeId, TreeId};
use ns_core::{Directive, MoveOutcome, MoveRejection};
use ns_storage::{CreateNodeRequest, SqliteStore};
use support::*;

fn create(store: &mut SqliteStore, tree: &TreeId, name: &str, parent: Option<NodeId>) -> NodeId {
    let mut request = CreateNodeRequest::new(name);
    if let Some(parent) = parent {
        request = request.under(parent);
    }
    store.create_node(tree, request).expect("create node").id
}

fn is_ancestor(store: &SqliteStore, tree: &TreeId, ancestor: NodeId, node: NodeId) -> bool {
    let query = store.query(tree);
    let ancestor = query.get(ancestor).expect("ancestor");
    let node = query.get(node).expect("node");
    ancestor.is_ancestor_of(&node)
}

#[test]
fn reparenting_keeps_boundaries_consistent() {
    let mut store = SqliteStore::open_in_memory().expect("open store");
    let tree = tree("reparent");

    let c1 = create(&mut store, &tree, "New Electronics", None);
    let c2 = create(&mut store, &tree, "OLED TVs", None);
    assert_eq!(pos(&store, &tree, c1.get()), (1, 4));
    assert_eq!(pos(&store, &tree, c2.get()), (2, 3));

    let c3 = create(&mut store, &tree, "Portable Electronics", None);
    let outcome = store.set_parent(&tree, c3, Some(c1)).expect("set parent");
    assert_eq!(outcome, MoveOutcome::Rejected(MoveRejection::Unchanged));
    assert_eq!(pos(&store, &tree, c1.get()), (1, 6));
    assert_eq!(pos(&store, &tree, c2.get()), (2, 3));
    assert_eq!(pos(&store, &tree, c3.get()), (4, 5));

    let outcome = store.set_parent(&tree, c3, Some(c2)).expect("set parent");
    assert_eq!(outcome.node().and_then(|n| n.parent_id), Some(c2));
    assert_eq!(pos(&store, &tree, c1.get()), (1, 6));
    assert_eq!(pos(&store, &tree, c2.get()), (2, 5));
    assert_eq!(pos(&store, &tree, c3.get()), (3, 4));
    assert!(is_ancestor(&store, &tree, c1, c3));

    // Reparent and move in one transaction: the move sees the new parent.
    store
        .batch(&tree, |tx| {
            tx.set_parent(c3, Some(c1))?;
            tx.move_node(c3, Directive::Into(c2))
        })
        .expect("batch");
    assert_eq!(pos(&store, &tree, c1.get()), (1, 6));
    assert_eq!(pos(&store, &tree, c2.get()), (2, 5));
    assert_eq!(pos(&store, &tree, c3.get()), (3, 4));

    let c4 = create(&mut store, &tree, "Flash", Some(c2));
    let c5 = create(&mut store, &tree, "Sony", Some(c2));
    assert_eq!(pos(&store, &tree, c1.get()), (1, 10));
    assert_eq!(pos(&store, &tree, c2.get()), (2, 9));
    assert_eq!(pos(&store, &tree, c3.get()), (3, 4));
    assert_eq!(pos(&store, &tree, c4.get()), (5, 6));
    assert_eq!(pos(&store, &tree, c5.get()), (7, 8));

    assert!(
        store
            .move_node(&tree, c5, Directive::Above(c3))
            .expect("move")
            .is_moved()
    );
    assert_eq!(pos(&store, &tree, c3.get()), (5, 6));
    assert_eq!(pos(&store, &tree, c4.get()), (7, 8));
    assert_eq!(pos(&store, &tree, c5.get()), (3, 4));
    store.check_tree(&tree).expect("tree stays valid");
}

#[test]
fn set_parent_rejections() {
    let (mut store, tree) = catalog_store();

    let before = snapshot(&store, &tree);
    assert_eq!(
        store.set_parent(&tree, id(7), None).expect("set parent"),
        MoveOutcome::Rejected(MoveRejection::SecondRoot)
    );
    assert_eq!(
        store.set_parent(&tree, id(6), Some(id(8))).expect("set parent"),
        MoveOutcome::Rejected(MoveRejection::IntoOwnSubtree)
    );
    assert_eq!(
        store.set_parent(&tree, id(1), None).expect("set parent"),
        MoveOutcome::Rejected(MoveRejection::Unchanged)
    );
    assert_eq!(
        store.set_parent(&tree, id(1), Some(id(2))).expect("set parent"),
        MoveOutcome::Rejected(MoveRejection::IsRoot)
    );
    assert_eq!(snapshot(&store, &tree), before);
}

#[test]
fn set_parent_appends_as_last_child() {
    let (mut store, tree) = catalog_store();

    let outcome = store.set_parent(&tree, id(8), Some(id(2))).expect("set parent");
    let flash = outcome.node().expect("moved");
    assert_eq!(flash.parent_id, Some(id(2)));
    assert_eq!((flash.left(), flash.right()), (9, 10));

    let televisions = node(&store, &tree, 2);
    let mp3 = node(&store, &tree, 7);
    assert_eq!(
        ids(&store.query(&tree).children(&televisions).expect("children")),
        vec![3, 4, 5, 8]
    );
    assert!(mp3.is_leaf());
    store.check_tree(&tree).expect("tree stays valid");
}
