//! Batched, copy-on-write mutation of a snapshot.
//!
//! A [`Batch`] hands out one [`TableHandle`] per table name. Each table is copied out
//! of the base snapshot at most once, on its first effective write; tables that are
//! only read, or whose operations match nothing, stay shared with the base.

use super::snapshot::{Rows, Snapshot};
use super::types::{FastMap, FieldName, Record, TableName, Value};
use crate::error::{Result, StoreError};
use indexmap::IndexMap;
use smallvec::SmallVec;
use smol_str::SmolStr;
use std::sync::Arc;
use tracing::debug;

struct TableDraft {
    base: Rows,
    /// Present once the table has been written to.
    rows: Option<Vec<Record>>,
}

impl TableDraft {
    fn new(base: Rows) -> Self {
        Self { base, rows: None }
    }

    #[inline]
    fn current(&self) -> &[Record] {
        self.rows.as_deref().unwrap_or(self.base.as_slice())
    }

    fn rows_mut(&mut self) -> &mut Vec<Record> {
        self.rows.get_or_insert_with(|| Vec::clone(&self.base))
    }

    fn is_dirty(&self) -> bool {
        self.rows.is_some()
    }
}

/// The set of table handles passed to a mutation closure.
pub struct Batch<'s> {
    base: &'s Snapshot,
    drafts: FastMap<TableName, TableDraft>,
}

impl<'s> Batch<'s> {
    pub(crate) fn new(base: &'s Snapshot) -> Self {
        Self {
            base,
            drafts: FastMap::default(),
        }
    }

    /// Handle for one table. Names outside the schema are rejected.
    pub fn table(&mut self, name: &str) -> Result<TableHandle<'_>> {
        let base = self.base;
        if !base.contains_table(name) {
            return Err(StoreError::UnknownTable {
                table: SmolStr::new(name),
            });
        }

        let draft = self
            .drafts
            .entry(SmolStr::new(name))
            .or_insert_with(|| TableDraft::new(base.shared_rows(name).cloned().unwrap_or_default()));

        Ok(TableHandle { draft })
    }

    /// Names of the tables this batch has written to so far.
    pub fn touched_tables(&self) -> Vec<TableName> {
        self.base
            .table_names()
            .filter(|name| self.drafts.get(name.as_str()).is_some_and(TableDraft::is_dirty))
            .cloned()
            .collect()
    }

    /// Build the next snapshot, or `None` when nothing changed.
    pub(crate) fn commit(mut self) -> Option<Snapshot> {
        let touched = self.touched_tables();
        if touched.is_empty() {
            return None;
        }
        debug!(tables = ?touched, "batch committed");

        let base = self.base;
        let tables: IndexMap<TableName, Rows> = base
            .tables()
            .map(|(name, rows)| {
                let next = match self.drafts.remove(name.as_str()).and_then(|d| d.rows) {
                    Some(written) => Arc::new(written),
                    None => Arc::clone(rows),
                };
                (name.clone(), next)
            })
            .collect();

        Some(Snapshot::from_tables(tables))
    }
}

/// Mutation operations scoped to one table.
pub struct TableHandle<'b> {
    draft: &'b mut TableDraft,
}

impl<'b> TableHandle<'b> {
    /// Rows as seen inside the batch, including its own earlier writes.
    pub fn rows(&self) -> &[Record] {
        self.draft.current()
    }

    pub fn len(&self) -> usize {
        self.draft.current().len()
    }

    pub fn is_empty(&self) -> bool {
        self.draft.current().is_empty()
    }

    /// Append one record to the end of the table.
    pub fn add(&mut self, record: Record) -> &mut Self {
        self.draft.rows_mut().push(record);
        self
    }

    /// Append many records, preserving their order.
    pub fn add_all<I>(&mut self, records: I) -> &mut Self
    where
        I: IntoIterator<Item = Record>,
    {
        let mut records = records.into_iter().peekable();
        if records.peek().is_some() {
            self.draft.rows_mut().extend(records);
        }
        self
    }

    /// Set `field` to `new_value` on every record the returned predicate matches.
    pub fn update_by(&mut self, field: impl Into<FieldName>, new_value: impl Into<Value>) -> UpdateWhere<'_> {
        UpdateWhere {
            draft: &mut *self.draft,
            field: field.into(),
            new_value: new_value.into(),
        }
    }

    /// Remove every record the returned predicate matches on `field`.
    pub fn delete_by(&mut self, field: impl Into<FieldName>) -> DeleteWhere<'_> {
        DeleteWhere {
            draft: &mut *self.draft,
            field: field.into(),
        }
    }

    pub fn clear(&mut self) {
        if !self.draft.current().is_empty() {
            self.draft.rows = Some(Vec::new());
        }
    }
}

/// Predicate half of [`TableHandle::update_by`].
pub struct UpdateWhere<'h> {
    draft: &'h mut TableDraft,
    field: FieldName,
    new_value: Value,
}

impl UpdateWhere<'_> {
    /// Update records whose field equals `value`. Returns whether any matched.
    pub fn eq(&mut self, value: impl Into<Value>) -> bool {
        let value = value.into();
        let matched: SmallVec<[usize; 8]> = self
            .draft
            .current()
            .iter()
            .enumerate()
            .filter(|(_, record)| record.field_eq(&self.field, &value))
            .map(|(i, _)| i)
            .collect();

        if matched.is_empty() {
            return false;
        }

        // Matching rows that already hold the new value are not a change.
        if value == self.new_value {
            return true;
        }

        let rows = self.draft.rows_mut();
        for i in matched {
            rows[i].set(self.field.clone(), self.new_value.clone());
        }
        true
    }

    /// Apply [`UpdateWhere::eq`] for every value. Returns whether any matched.
    pub fn is_in<I, V>(&mut self, values: I) -> bool
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let mut any = false;
        for value in values {
            any |= self.eq(value);
        }
        any
    }
}

/// Predicate half of [`TableHandle::delete_by`].
pub struct DeleteWhere<'h> {
    draft: &'h mut TableDraft,
    field: FieldName,
}

impl DeleteWhere<'_> {
    /// Remove records whose field equals `value`, keeping survivors in order.
    /// Returns whether anything was removed.
    pub fn eq(&mut self, value: impl Into<Value>) -> bool {
        let value = value.into();
        let field = &self.field;
        if !self.draft.current().iter().any(|r| r.field_eq(field, &value)) {
            return false;
        }
        self.draft.rows_mut().retain(|r| !r.field_eq(field, &value));
        true
    }

    /// Apply [`DeleteWhere::eq`] for every value. Returns whether anything was removed.
    pub fn is_in<I, V>(&mut self, values: I) -> bool
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let mut any = false;
        for value in values {
            any |= self.eq(value);
        }
        any
    }
}
