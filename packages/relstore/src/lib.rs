//! In-memory normalized tables with declarative relations.
//!
//! Tables live in immutable [`Snapshot`]s. Mutations run as batches that produce a new
//! snapshot, sharing every table they did not touch. Each table declares a resolver
//! describing how its rows join other tables; selecting a table runs those joins and
//! returns denormalized records.
//!
//! ```
//! use relstore::{Record, Schema};
//!
//! let schema = Schema::builder()
//!     .table("users", |h| vec![h.table("userHobbies").on_as("userId", "hobbies").many("id")])
//!     .table("userHobbies", |h| vec![h.table("users").on_as("id", "user").one("userId")])
//!     .build()?;
//!
//! let store = schema.functional().apply(|tx| {
//!     tx.table("users")?.add(Record::new().with("id", 0).with("name", "foo"));
//!     tx.table("userHobbies")?.add(Record::new().with("id", 0).with("userId", 0));
//!     Ok(())
//! })?;
//!
//! let users = store.table("users")?;
//! assert_eq!(users[0].get("hobbies").and_then(|h| h.as_array()).map(Vec::len), Some(1));
//! # Ok::<(), relstore::StoreError>(())
//! ```

pub mod config;
pub mod engine;
pub mod error;
pub mod immutable;
pub mod schema;
pub mod store;

pub use config::StoreConfig;
pub use engine::{
    Batch, Binding, Cardinality, Handles, Record, Relation, Resolution, Resolver, Snapshot, TableRef,
    Value,
};
pub use error::{Result, StoreError};
pub use immutable::{Extension, Extensions, ImmutableStore};
pub use schema::{Schema, SchemaBuilder};
pub use store::{RemoveBy, Store, TableReader};
