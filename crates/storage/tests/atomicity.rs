#![forbid(unsafe_code)]

mod support;

use ns_core::InvariantViolation;
use ns_storage::{CreateNodeRequest, SqliteStore, StoreConfig, StoreError};
use rusqlite::{Connection, params};
use std::time::Duration;
use support::*;

fn file_store(test_name: &str) -> (SqliteStore, StoreConfig) {
    let mut config = StoreConfig::new(temp_dir(test_name));
    config.verify_invariants = true;
    config.busy_timeout = Duration::from_millis(50);
    let store = SqliteStore::open_with(config.clone()).expect("open store");
    (store, config)
}

#[test]
fn batch_rolls_back_when_closure_fails() {
    let (mut store, tree) = catalog_store();

    let err = store
        .batch::<(), _>(&tree, |tx| {
            tx.create_node(CreateNodeRequest::new("Projectors").under(id(2)))?;
            tx.delete_node(id(6))?;
            assert_eq!(tx.query().count()?, 6);
            Err(StoreError::InvalidInput("abort"))
        })
        .expect_err("batch must fail");
    assert!(matches!(err, StoreError::InvalidInput("abort")));
    assert_eq!(snapshot(&store, &tree), CATALOG_BOUNDS.to_vec());
}

#[test]
fn unknown_reference_mid_batch_discards_earlier_moves() {
    let (mut store, tree) = catalog_store();

    let err = store
        .batch(&tree, |tx| {
            tx.move_node(id(4), ns_core::Directive::Highest)?;
            tx.move_node(id(5), ns_core::Directive::Into(id(404)))
        })
        .expect_err("unknown reference");
    assert!(matches!(err, StoreError::UnknownNode(missing) if missing == id(404)));
    assert_eq!(snapshot(&store, &tree), CATALOG_BOUNDS.to_vec());
}

#[test]
fn create_validation_leaves_tree_intact() {
    let (mut store, tree) = catalog_store();

    let err = store
        .create_node(&tree, CreateNodeRequest::new("   "))
        .expect_err("blank name");
    assert!(matches!(err, StoreError::InvalidInput(_)));

    let err = store
        .create_node(&tree, CreateNodeRequest::new("Duplicate").with_id(id(4)))
        .expect_err("duplicate id");
    assert!(matches!(err, StoreError::InvalidInput("node id already exists")));

    let err = store
        .create_node(&tree, CreateNodeRequest::new("Orphan").under(id(99)))
        .expect_err("unknown parent");
    assert!(matches!(err, StoreError::UnknownNode(missing) if missing == id(99)));

    assert_eq!(snapshot(&store, &tree), CATALOG_BOUNDS.to_vec());

    // Allocated ids continue after the highest explicit one.
    let created = store
        .create_node(&tree, CreateNodeRequest::new("Cameras"))
        .expect("create");
    assert_eq!(created.id, id(11));
    assert_eq!(created.parent_id, Some(id(1)));
    assert_eq!((created.left(), created.right()), (20, 21));
    assert_eq!(pos(&store, &tree, 1), (1, 22));
}

#[test]
fn counter_exhaustion_is_reported_not_wrapped() {
    let (mut store, tree) = catalog_store();
    store
        .create_node(&tree, CreateNodeRequest::new("Last").with_id(id(i64::MAX)))
        .expect("create with largest id");

    let err = store
        .create_node(&tree, CreateNodeRequest::new("Next"))
        .expect_err("no id left to allocate");
    assert!(matches!(err, StoreError::InvalidInput("node counter overflow")));
    assert_eq!(store.query(&tree).count().expect("count"), 11);
}

#[test]
fn only_creates_register_a_tree() {
    let mut store = SqliteStore::open_in_memory().expect("open store");
    let ghost = tree("ghost");

    assert_eq!(store.rebuild_bounds(&ghost).expect("rebuild empty tree"), 0);
    assert!(matches!(
        store.move_node(&ghost, id(1), ns_core::Directive::Higher),
        Err(StoreError::UnknownNode(_))
    ));
    assert!(matches!(
        store.delete_node(&ghost, id(1)),
        Err(StoreError::UnknownNode(_))
    ));
    store
        .batch(&ghost, |tx| tx.query().count())
        .expect("read-only batch");
    assert!(store.list_trees().expect("list trees").is_empty());

    store
        .create_node(&ghost, CreateNodeRequest::new("Root"))
        .expect("create root");
    let trees = store.list_trees().expect("list trees");
    assert_eq!(trees, vec![ghost]);
}

#[test]
fn delete_removes_whole_subtree_and_closes_gap() {
    let (mut store, tree) = catalog_store();

    assert_eq!(store.delete_node(&tree, id(6)).expect("delete"), 5);
    assert_eq!(pos(&store, &tree, 1), (1, 10));
    assert_eq!(store.query(&tree).leaves().expect("leaves").len(), 3);
    for gone in [6, 7, 8, 9, 10] {
        assert!(store.query(&tree).find(id(gone)).expect("find").is_none());
    }

    assert_eq!(store.delete_node(&tree, id(3)).expect("delete leaf"), 1);
    assert_eq!(pos(&store, &tree, 2), (2, 7));
    assert_eq!(pos(&store, &tree, 4), (3, 4));
    store.check_tree(&tree).expect("tree stays valid");

    assert_eq!(store.delete_node(&tree, id(1)).expect("delete root"), 4);
    assert_eq!(store.query(&tree).count().expect("count"), 0);
    assert!(store.query(&tree).root().expect("root").is_none());

    let fresh = store
        .create_node(&tree, CreateNodeRequest::new("Fresh Root"))
        .expect("create root");
    assert_eq!((fresh.left(), fresh.right()), (1, 2));
    assert!(fresh.is_root());
    assert_eq!(fresh.id, id(11));
}

#[test]
fn committed_state_survives_reopen() {
    let (mut store, config) = file_store("committed_state_survives_reopen");
    let tree = tree("catalog");
    seed_catalog(&mut store, &tree);
    assert_eq!(store.storage_dir(), Some(config.storage_dir.as_path()));
    drop(store);

    let mut reopened = SqliteStore::open_with(config).expect("reopen");
    assert_eq!(snapshot(&reopened, &tree), CATALOG_BOUNDS.to_vec());
    let created = reopened
        .create_node(&tree, CreateNodeRequest::new("Cameras"))
        .expect("create after reopen");
    assert_eq!(created.id, id(11));
}

#[test]
fn writer_waits_then_fails_while_another_connection_holds_the_lock() {
    let (mut store, config) = file_store("writer_busy");
    let tree = tree("catalog");
    seed_catalog(&mut store, &tree);

    let other = Connection::open(config.db_path()).expect("open raw connection");
    other.execute_batch("BEGIN IMMEDIATE;").expect("take write lock");

    let err = store
        .create_node(&tree, CreateNodeRequest::new("Blocked"))
        .expect_err("writer must time out");
    assert!(matches!(err, StoreError::Sql(_)));

    other.execute_batch("ROLLBACK;").expect("release write lock");
    store
        .create_node(&tree, CreateNodeRequest::new("Unblocked"))
        .expect("create after lock release");
    assert_eq!(store.query(&tree).count().expect("count"), 11);
}

#[test]
fn corrupted_bounds_block_writes_until_rebuilt() {
    let (mut store, config) = file_store("corrupted_bounds");
    let tree = tree("catalog");
    seed_catalog(&mut store, &tree);

    let raw = Connection::open(config.db_path()).expect("open raw connection");
    raw.execute(
        "UPDATE nodes SET lft=?3, rgt=?4 WHERE tree=?1 AND id=?2",
        params!["catalog", 8, 14, 15],
    )
    .expect("corrupt flash");

    let err = store.check_tree(&tree).expect_err("corruption detected");
    assert!(matches!(err, StoreError::InvariantViolation(_)));

    let err = store
        .create_node(&tree, CreateNodeRequest::new("Cameras"))
        .expect_err("verification rejects commit");
    assert!(matches!(err, StoreError::InvariantViolation(_)));
    assert_eq!(store.query(&tree).count().expect("count"), 10);

    assert_eq!(store.rebuild_bounds(&tree).expect("rebuild"), 1);
    assert_eq!(snapshot(&store, &tree), CATALOG_BOUNDS.to_vec());
    store.check_tree(&tree).expect("repaired");
    assert_eq!(store.rebuild_bounds(&tree).expect("rebuild again"), 0);
}

#[test]
fn rebuild_rejects_parent_cycles() {
    let (mut store, config) = file_store("parent_cycles");
    let tree = tree("catalog");
    seed_catalog(&mut store, &tree);

    let raw = Connection::open(config.db_path()).expect("open raw connection");
    raw.execute(
        "UPDATE nodes SET parent_id=?3 WHERE tree=?1 AND id=?2",
        params!["catalog", 7, 8],
    )
    .expect("introduce cycle");

    let err = store.rebuild_bounds(&tree).expect_err("cycle detected");
    match err {
        StoreError::InvariantViolation(InvariantViolation::BrokenParentLinks { id: broken }) => {
            assert_eq!(broken, id(7));
        }
        other => panic!("expected BrokenParentLinks, got {other:?}"),
    }
}
