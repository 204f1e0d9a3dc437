//! Shared fixtures for the integration tests.
//!
//! The users / userHobbies pair mirrors how UI state layers typically normalize a
//! one-to-many relation.

#![allow(dead_code)]

use relstore::{ImmutableStore, Record, Schema, StoreConfig};
use serde_json::{json, Value};
use std::sync::{Arc, Once};
use tracing_subscriber::EnvFilter;
use ulid::Ulid;

static TRACING: Once = Once::new();

/// Install a test subscriber once. Set `RUST_LOG=relstore=trace` to see joins.
pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

/// Generate a unique string id.
pub fn generate_id() -> String {
    Ulid::new().to_string()
}

pub fn record(value: Value) -> Record {
    Record::from_json(value).expect("fixture must be a JSON object")
}

pub fn users() -> Vec<Value> {
    vec![json!({"id": 0, "name": "foo"}), json!({"id": 1, "name": "bar"})]
}

pub fn user_hobbies() -> Vec<Value> {
    vec![
        json!({"id": 0, "userId": 0, "name": "programming"}),
        json!({"id": 1, "userId": 1, "name": "games"}),
        json!({"id": 2, "userId": 0, "name": "cooking"}),
    ]
}

pub fn schema_with(config: StoreConfig) -> Arc<Schema> {
    init_tracing();
    Schema::builder()
        .config(config)
        .table("users", |h| vec![h.table("userHobbies").on_as("userId", "hobbies").many("id")])
        .table("userHobbies", |h| vec![h.table("users").on_as("id", "user").one("userId")])
        .build()
        .expect("fixture schema is valid")
}

pub fn schema() -> Arc<Schema> {
    schema_with(StoreConfig::default())
}

/// A functional store holding the users and hobbies fixtures, added one at a time.
pub fn seeded() -> ImmutableStore {
    schema()
        .functional()
        .apply(|tx| {
            let mut users_table = tx.table("users")?;
            for user in users() {
                users_table.add(record(user));
            }
            let mut hobbies = tx.table("userHobbies")?;
            for hobby in user_hobbies() {
                hobbies.add(record(hobby));
            }
            Ok(())
        })
        .expect("seeding succeeds")
}

pub fn to_json(records: Vec<Record>) -> Value {
    Value::Array(records.into_iter().map(Value::from).collect())
}
