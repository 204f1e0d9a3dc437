//! Immutable table snapshots.
//!
//! A snapshot maps every schema table to its rows. Rows are held behind an `Arc`, so a
//! snapshot derived from another one shares every table it did not touch.

use super::mutation::Batch;
use super::types::{Record, TableName};
use crate::error::{Result, StoreError};
use indexmap::IndexMap;
use serde::Serialize;
use smol_str::SmolStr;
use std::sync::Arc;
use tracing::{debug, instrument};

/// Shared, immutable rows of one table.
pub type Rows = Arc<Vec<Record>>;

#[derive(Serialize, Clone, Debug, Default)]
#[serde(transparent)]
pub struct Snapshot {
    tables: IndexMap<TableName, Rows>,
}

impl Snapshot {
    /// A snapshot with every named table present and empty.
    pub fn empty<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<TableName>,
    {
        Self {
            tables: names
                .into_iter()
                .map(|name| (name.into(), Rows::default()))
                .collect(),
        }
    }

    pub(crate) fn from_tables(tables: IndexMap<TableName, Rows>) -> Self {
        Self { tables }
    }

    pub fn table(&self, name: &str) -> Option<&[Record]> {
        self.tables.get(name).map(|rows| rows.as_slice())
    }

    /// Like [`Snapshot::table`], but an unknown name is an error.
    pub fn rows(&self, name: &str) -> Result<&[Record]> {
        self.table(name).ok_or_else(|| StoreError::UnknownTable {
            table: SmolStr::new(name),
        })
    }

    pub(crate) fn shared_rows(&self, name: &str) -> Option<&Rows> {
        self.tables.get(name)
    }

    pub(crate) fn tables(&self) -> impl Iterator<Item = (&TableName, &Rows)> {
        self.tables.iter()
    }

    pub fn contains_table(&self, name: &str) -> bool {
        self.tables.contains_key(name)
    }

    pub fn table_names(&self) -> impl Iterator<Item = &TableName> {
        self.tables.keys()
    }

    /// Total number of rows across all tables.
    pub fn row_count(&self) -> usize {
        self.tables.values().map(|rows| rows.len()).sum()
    }

    /// True when both snapshots hold the same set of table names.
    pub fn same_tables(&self, other: &Snapshot) -> bool {
        self.tables.len() == other.tables.len()
            && self.tables.keys().all(|name| other.tables.contains_key(name))
    }

    /// Same table names, every table empty.
    pub fn cleared(&self) -> Snapshot {
        Snapshot::empty(self.tables.keys().cloned())
    }

    /// Run a batch of mutations against this snapshot.
    ///
    /// All operations the closure performs become visible together in the returned
    /// snapshot. When nothing effectively changed the very same `Arc` is returned, so
    /// callers can detect no-ops with [`Arc::ptr_eq`]. An error from the closure
    /// discards the whole batch.
    #[instrument(skip_all)]
    pub fn mutate<F>(self: &Arc<Self>, f: F) -> Result<Arc<Snapshot>>
    where
        F: FnOnce(&mut Batch<'_>) -> Result<()>,
    {
        let mut batch = Batch::new(self);
        f(&mut batch)?;

        match batch.commit() {
            Some(next) => Ok(Arc::new(next)),
            None => {
                debug!("batch produced no change");
                Ok(Arc::clone(self))
            }
        }
    }
}
