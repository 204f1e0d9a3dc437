//! Relation declarations.
//!
//! Resolvers describe joins through [`Handles`]: one [`TableRef`] per schema table.
//! `handles.table("userHobbies").on_as("userId", "hobbies").many("id")` reads as
//! "attach every `userHobbies` row whose `userId` equals my `id`, under `hobbies`".
//! The intermediate [`Binding`] carries the target side until `.one`/`.many` turns it
//! into a [`Relation`].

use super::types::{FieldName, TableName};
use crate::config::StoreConfig;
use crate::error::{Result, StoreError};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::warn;

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Cardinality {
    /// Attach the first matching row, or null.
    One,
    /// Attach every matching row, in target-table order.
    Many,
}

/// One fully resolved join.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Relation {
    pub cardinality: Cardinality,
    /// Field on the selected table's rows holding the key.
    pub source_field: FieldName,
    pub target_table: TableName,
    /// Field on the target rows compared against the key.
    pub target_field: FieldName,
    /// Field the match is attached under in the output.
    pub output_field: FieldName,
}

/// Resolver-side handle for one table.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TableRef {
    table: TableName,
}

impl TableRef {
    pub fn new(table: impl Into<TableName>) -> Self {
        Self {
            table: table.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.table
    }

    /// Bind the target-side field. The output field defaults to the table name.
    pub fn on(&self, target_field: impl Into<FieldName>) -> Binding {
        Binding {
            target_table: self.table.clone(),
            target_field: target_field.into(),
            alias: None,
        }
    }

    /// Bind the target-side field and name the output field.
    pub fn on_as(&self, target_field: impl Into<FieldName>, output_field: impl Into<FieldName>) -> Binding {
        Binding {
            target_table: self.table.clone(),
            target_field: target_field.into(),
            alias: Some(output_field.into()),
        }
    }
}

/// Target side of a relation waiting for its source field and cardinality.
#[must_use = "a binding declares nothing until `.one` or `.many` is called"]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Binding {
    target_table: TableName,
    target_field: FieldName,
    alias: Option<FieldName>,
}

impl Binding {
    pub fn one(self, source_field: impl Into<FieldName>) -> Relation {
        self.finish(Cardinality::One, source_field.into(), None)
    }

    /// Like [`Binding::one`]; `output_field` applies only when the handle had no alias.
    pub fn one_as(self, source_field: impl Into<FieldName>, output_field: impl Into<FieldName>) -> Relation {
        self.finish(Cardinality::One, source_field.into(), Some(output_field.into()))
    }

    pub fn many(self, source_field: impl Into<FieldName>) -> Relation {
        self.finish(Cardinality::Many, source_field.into(), None)
    }

    /// Like [`Binding::many`]; `output_field` applies only when the handle had no alias.
    pub fn many_as(self, source_field: impl Into<FieldName>, output_field: impl Into<FieldName>) -> Relation {
        self.finish(Cardinality::Many, source_field.into(), Some(output_field.into()))
    }

    fn finish(self, cardinality: Cardinality, source_field: FieldName, output: Option<FieldName>) -> Relation {
        let output_field = self
            .alias
            .or(output)
            .unwrap_or_else(|| self.target_table.clone());
        Relation {
            cardinality,
            source_field,
            target_table: self.target_table,
            target_field: self.target_field,
            output_field,
        }
    }
}

/// The handle set given to a resolver, one [`TableRef`] per schema table.
#[derive(Clone, Debug)]
pub struct Handles {
    tables: IndexMap<TableName, TableRef>,
}

impl Handles {
    pub fn new<'a, I>(names: I) -> Self
    where
        I: IntoIterator<Item = &'a TableName>,
    {
        Self {
            tables: names
                .into_iter()
                .map(|name| (name.clone(), TableRef::new(name.clone())))
                .collect(),
        }
    }

    /// Handle for `name`.
    ///
    /// Names outside the schema still yield a handle; relations pointing at them are
    /// rejected when the resolver output is validated.
    pub fn table(&self, name: &str) -> TableRef {
        self.tables
            .get(name)
            .cloned()
            .unwrap_or_else(|| TableRef::new(name))
    }

    pub fn get(&self, name: &str) -> Option<&TableRef> {
        self.tables.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &TableRef> {
        self.tables.values()
    }
}

/// What a resolver returns.
#[derive(Clone, Debug, PartialEq)]
pub enum Resolution {
    Relations(Vec<Relation>),
    /// Deprecated raw-pair form: `output_field -> (target_table, target_field)`.
    Pairs(IndexMap<FieldName, (TableName, FieldName)>),
}

impl Resolution {
    pub fn pairs<I, O, T, F>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (O, (T, F))>,
        O: Into<FieldName>,
        T: Into<TableName>,
        F: Into<FieldName>,
    {
        Resolution::Pairs(
            pairs
                .into_iter()
                .map(|(output, (table, field))| (output.into(), (table.into(), field.into())))
                .collect(),
        )
    }

    /// Turn the resolver output for `table` into relations.
    ///
    /// Raw pairs are only accepted with `legacy_pairs`; each becomes a `Many` join on
    /// the same-named field of the source row.
    pub(crate) fn into_relations(self, table: &TableName, config: &StoreConfig) -> Result<Vec<Relation>> {
        match self {
            Resolution::Relations(relations) => Ok(relations),
            Resolution::Pairs(_) if !config.legacy_pairs => Err(StoreError::LegacyResolverDisabled {
                table: table.clone(),
            }),
            Resolution::Pairs(pairs) => {
                warn!(table = %table, "raw-pair resolver form is deprecated");
                Ok(pairs
                    .into_iter()
                    .map(|(output_field, (target_table, target_field))| Relation {
                        cardinality: Cardinality::Many,
                        source_field: target_field.clone(),
                        target_table,
                        target_field,
                        output_field,
                    })
                    .collect())
            }
        }
    }
}

impl From<Vec<Relation>> for Resolution {
    fn from(relations: Vec<Relation>) -> Self {
        Resolution::Relations(relations)
    }
}

/// Values a resolver closure may return. `None` and `()` mean "no result", which
/// fails the select.
pub trait IntoResolution {
    fn into_resolution(self) -> Option<Resolution>;
}

impl IntoResolution for Resolution {
    fn into_resolution(self) -> Option<Resolution> {
        Some(self)
    }
}

impl IntoResolution for Vec<Relation> {
    fn into_resolution(self) -> Option<Resolution> {
        Some(Resolution::Relations(self))
    }
}

impl<T: IntoResolution> IntoResolution for Option<T> {
    fn into_resolution(self) -> Option<Resolution> {
        self.and_then(IntoResolution::into_resolution)
    }
}

impl IntoResolution for () {
    fn into_resolution(self) -> Option<Resolution> {
        None
    }
}

/// Declares how the rows of one table relate to other tables.
///
/// Resolvers must be pure: they run on every select and once more, as a dry run,
/// when the schema is built.
pub trait Resolver: Send + Sync {
    fn resolve(&self, handles: &Handles) -> Option<Resolution>;
}

impl<F, R> Resolver for F
where
    F: Fn(&Handles) -> R + Send + Sync,
    R: IntoResolution,
{
    fn resolve(&self, handles: &Handles) -> Option<Resolution> {
        self(handles).into_resolution()
    }
}
