mod common;

use common::*;
use relstore::{Extensions, ImmutableStore, Record, Store, StoreConfig, StoreError, TableReader, Value};
use serde_json::json;
use std::sync::Arc;

fn direct() -> Store {
    let mut store = schema().direct();
    for user in users() {
        store.add("users", record(user)).unwrap();
    }
    store
        .add_all("userHobbies", user_hobbies().into_iter().map(record))
        .unwrap();
    store
}

#[test]
fn test_direct_select_consumes_only_the_selected_table() {
    let mut store = direct();

    let users = store.select("users").unwrap();
    assert_eq!(users.len(), 2);
    assert!(store.rows("users").unwrap().is_empty());
    assert_eq!(store.rows("userHobbies").unwrap().len(), 3);

    let hobbies = store.select("userHobbies").unwrap();
    assert!(hobbies.iter().all(|h| h.get("user") == Some(&Value::Null)));
}

#[test]
fn test_direct_select_without_clear_is_idempotent() {
    let mut store = direct();
    let first = store.select_with("users", false).unwrap();
    let second = store.select_with("users", false).unwrap();
    assert_eq!(first, second);
    assert_eq!(to_json(first)[0]["hobbies"].as_array().map(Vec::len), Some(2));
}

#[test]
fn test_config_can_turn_off_consume() {
    let config = StoreConfig::from_value(json!({"consumeOnSelect": false})).unwrap();
    let mut store = schema_with(config).direct();
    store.add("users", record(json!({"id": 0}))).unwrap();

    store.select("users").unwrap();
    assert_eq!(store.rows("users").unwrap().len(), 1);
}

#[test]
fn test_direct_remove_by_id() {
    let mut store = direct();
    assert!(store.remove_by("userHobbies").id(0).unwrap());
    assert!(!store.remove_by("userHobbies").id(0).unwrap());

    let ids: Vec<Value> = store
        .rows("userHobbies")
        .unwrap()
        .iter()
        .filter_map(|r| r.get("id").cloned())
        .collect();
    assert_eq!(ids, vec![Value::from(1), Value::from(2)]);
}

#[test]
fn test_direct_clear_resets_all_tables() {
    let mut store = direct();
    store.clear();
    for table in ["users", "userHobbies"] {
        assert_eq!(store.rows(table).unwrap(), &[] as &[Record]);
    }
    assert_eq!(store.snapshot().table_names().count(), 2);
}

#[test]
fn test_direct_history_via_retained_snapshots() {
    let mut store = direct();
    let checkpoint = Arc::clone(store.snapshot());

    store.remove_by("users").id(0).unwrap();
    assert_eq!(store.rows("users").unwrap().len(), 1);
    assert_eq!(checkpoint.table("users").map(<[Record]>::len), Some(2));

    store.restore(checkpoint).unwrap();
    assert_eq!(store.rows("users").unwrap().len(), 2);
}

#[test]
fn test_functional_clear_keeps_every_table() {
    let store = seeded();
    let cleared = store.clear();

    assert!(cleared.table("users").unwrap().is_empty());
    assert!(cleared.table("userHobbies").unwrap().is_empty());
    assert_eq!(store.table("users").unwrap().len(), 2);
}

#[test]
fn test_both_flavours_read_the_same_view() {
    let mut store = direct();
    let functional = seeded();
    assert_eq!(store.view("users").unwrap(), functional.view("users").unwrap());
    assert_eq!(store.select("users").unwrap(), functional.table("users").unwrap());
}

#[test]
fn test_extensions_are_rebound_to_each_derived_store() {
    let extensions = Extensions::new()
        .method("names", |store, args| {
            let table = args.first().and_then(Value::as_str).unwrap_or("users");
            Ok(Value::Array(
                store
                    .rows(table)?
                    .iter()
                    .filter_map(|r| r.get("name").cloned())
                    .collect(),
            ))
        })
        .action("rename", |store, args| {
            let (Some(from), Some(to)) = (args.first().cloned(), args.get(1).cloned()) else {
                return Ok(store.clone());
            };
            store.apply(|tx| {
                tx.table("users")?.update_by("name", to).eq(from);
                Ok(())
            })
        })
        .property("label", "users-and-hobbies");

    let base = schema()
        .functional_with(extensions)
        .apply(|tx| {
            tx.table("users")?.add_all(users().into_iter().map(record));
            Ok(())
        })
        .unwrap();

    let renamed = base
        .invoke("rename", &[Value::from("foo"), Value::from("foofoo")])
        .unwrap();
    let unchanged = base.invoke("rename", &[]).unwrap();

    assert_eq!(
        base.call("names", &[]).unwrap(),
        Value::from(vec![Value::from("foo"), Value::from("bar")])
    );
    assert_eq!(
        renamed.call("names", &[]).unwrap(),
        Value::from(vec![Value::from("foofoo"), Value::from("bar")])
    );
    assert!(ImmutableStore::ptr_eq(&base, &unchanged));
    assert_eq!(renamed.property("label").and_then(Value::as_str), Some("users-and-hobbies"));
    assert_eq!(renamed.extensions().names().count(), 3);
}

#[test]
fn test_functional_store_from_existing_tables() {
    let store = direct();
    let schema = Arc::clone(store.schema());

    let functional = schema
        .functional_from(Arc::clone(store.snapshot()), Extensions::new())
        .unwrap();
    assert!(Arc::ptr_eq(functional.snapshot(), store.snapshot()));
    assert_eq!(functional.table("users").unwrap(), store.view("users").unwrap());

    let foreign = Arc::new(relstore::Snapshot::empty(["users", "posts"]));
    assert!(matches!(
        schema.functional_from(foreign, Extensions::new()),
        Err(StoreError::SchemaMismatch)
    ));
}
