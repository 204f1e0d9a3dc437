//! Direct store: a stable handle whose snapshot is swapped on every change.

use crate::engine::{Batch, Record, Snapshot, TableName, Value};
use crate::error::Result;
use crate::schema::Schema;
use std::sync::Arc;
use tracing::{debug, instrument};

/// Read access shared by both store flavours.
pub trait TableReader {
    fn schema(&self) -> &Arc<Schema>;

    fn snapshot(&self) -> &Arc<Snapshot>;

    /// Denormalized rows of `table`. Never consumes the table.
    fn view(&self, table: &str) -> Result<Vec<Record>> {
        self.schema().select(self.snapshot(), table)
    }

    /// Stored (normalized) rows of `table`.
    fn rows(&self, table: &str) -> Result<&[Record]> {
        self.snapshot().rows(table)
    }
}

#[derive(Debug, Clone)]
pub struct Store {
    schema: Arc<Schema>,
    snapshot: Arc<Snapshot>,
}

impl TableReader for Store {
    fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    fn snapshot(&self) -> &Arc<Snapshot> {
        &self.snapshot
    }
}

impl Store {
    pub(crate) fn new(schema: Arc<Schema>) -> Self {
        let snapshot = Arc::new(schema.empty_snapshot());
        Self { schema, snapshot }
    }

    /// Run a batch against the live snapshot. Returns whether anything changed.
    pub fn mutate<F>(&mut self, f: F) -> Result<bool>
    where
        F: FnOnce(&mut Batch<'_>) -> Result<()>,
    {
        let next = self.snapshot.mutate(f)?;
        let changed = !Arc::ptr_eq(&next, &self.snapshot);
        self.snapshot = next;
        Ok(changed)
    }

    pub fn add(&mut self, table: &str, record: Record) -> Result<&mut Self> {
        self.mutate(|tx| {
            tx.table(table)?.add(record);
            Ok(())
        })?;
        Ok(self)
    }

    pub fn add_all<I>(&mut self, table: &str, records: I) -> Result<&mut Self>
    where
        I: IntoIterator<Item = Record>,
    {
        self.mutate(|tx| {
            tx.table(table)?.add_all(records);
            Ok(())
        })?;
        Ok(self)
    }

    /// Start an `id`-keyed removal on `table`.
    pub fn remove_by(&mut self, table: impl Into<TableName>) -> RemoveBy<'_> {
        RemoveBy {
            store: self,
            table: table.into(),
        }
    }

    /// Select using the configured consume behaviour.
    pub fn select(&mut self, table: &str) -> Result<Vec<Record>> {
        let clear = self.schema.config().consume_on_select;
        self.select_with(table, clear)
    }

    /// Denormalized rows of `table`; with `clear` the table is emptied afterwards.
    #[instrument(skip(self))]
    pub fn select_with(&mut self, table: &str, clear: bool) -> Result<Vec<Record>> {
        let rows = self.schema.select(&self.snapshot, table)?;
        if clear {
            self.mutate(|tx| {
                tx.table(table)?.clear();
                Ok(())
            })?;
        }
        Ok(rows)
    }

    /// Empty every table, keeping the table set.
    pub fn clear(&mut self) -> &mut Self {
        if self.snapshot.row_count() > 0 {
            self.snapshot = Arc::new(self.snapshot.cleared());
        }
        self
    }

    /// Replace the live snapshot with one captured earlier.
    pub fn restore(&mut self, snapshot: Arc<Snapshot>) -> Result<()> {
        self.schema.check_snapshot(&snapshot)?;
        debug!(rows = snapshot.row_count(), "snapshot restored");
        self.snapshot = snapshot;
        Ok(())
    }
}

/// Pending removal returned by [`Store::remove_by`].
pub struct RemoveBy<'s> {
    store: &'s mut Store,
    table: TableName,
}

impl RemoveBy<'_> {
    /// Remove every row whose `id` equals `value`. Returns whether anything was removed.
    pub fn id(self, value: impl Into<Value>) -> Result<bool> {
        let value = value.into();
        let table = self.table;
        let mut removed = false;
        self.store.mutate(|tx| {
            removed = tx.table(&table)?.delete_by("id").eq(value);
            Ok(())
        })?;
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StoreConfig;
    use crate::error::StoreError;
    use serde_json::json;

    fn schema(config: StoreConfig) -> Arc<Schema> {
        Schema::builder()
            .config(config)
            .table("users", |h| vec![h.table("userHobbies").on_as("userId", "hobbies").many("id")])
            .table("userHobbies", |h| vec![h.table("users").on_as("id", "user").one("userId")])
            .build()
            .unwrap()
    }

    fn user(id: i64, name: &str) -> Record {
        Record::new().with("id", id).with("name", name)
    }

    #[test]
    fn test_add_chains() {
        let mut store = schema(StoreConfig::default()).direct();
        store
            .add("users", user(0, "foo"))
            .unwrap()
            .add("users", user(1, "bar"))
            .unwrap();
        assert_eq!(store.rows("users").unwrap().len(), 2);
        assert!(store.add("posts", user(2, "baz")).is_err());
    }

    #[test]
    fn test_remove_by_id() {
        let mut store = schema(StoreConfig::default()).direct();
        store.add_all("users", [user(0, "foo"), user(1, "bar"), user(0, "dup")]).unwrap();

        assert!(store.remove_by("users").id(0).unwrap());
        assert!(!store.remove_by("users").id(0).unwrap());
        assert_eq!(store.rows("users").unwrap(), &[user(1, "bar")]);
        assert!(store.remove_by("posts").id(0).is_err());
    }

    #[test]
    fn test_select_consumes_by_default() {
        let mut store = schema(StoreConfig::default()).direct();
        store.add("users", user(0, "foo")).unwrap();

        let rows = store.select("users").unwrap();
        assert_eq!(rows[0].to_json(), json!({"id": 0, "name": "foo", "hobbies": []}));
        assert!(store.rows("users").unwrap().is_empty());
        assert!(store.select("users").unwrap().is_empty());
    }

    #[test]
    fn test_select_without_clear_is_repeatable() {
        let mut store = schema(StoreConfig::default().consume_on_select(false)).direct();
        store.add("users", user(0, "foo")).unwrap();
        let before = Arc::clone(store.snapshot());

        let first = store.select("users").unwrap();
        let second = store.select_with("users", false).unwrap();
        assert_eq!(first, second);
        assert!(Arc::ptr_eq(&before, store.snapshot()));
    }

    #[test]
    fn test_clear_and_restore() {
        let mut store = schema(StoreConfig::default()).direct();
        store.add("users", user(0, "foo")).unwrap();
        let saved = Arc::clone(store.snapshot());

        store.clear();
        assert!(store.snapshot().contains_table("users"));
        assert!(store.rows("users").unwrap().is_empty());
        assert!(store.rows("userHobbies").unwrap().is_empty());

        store.restore(saved).unwrap();
        assert_eq!(store.rows("users").unwrap().len(), 1);

        let foreign = Arc::new(Snapshot::empty(["posts"]));
        assert!(matches!(store.restore(foreign), Err(StoreError::SchemaMismatch)));
    }

    #[test]
    fn test_mutate_reports_change() {
        let mut store = schema(StoreConfig::default()).direct();
        let changed = store
            .mutate(|tx| {
                tx.table("users")?.delete_by("id").eq(0);
                Ok(())
            })
            .unwrap();
        assert!(!changed);
    }
}
