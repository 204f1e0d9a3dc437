//! The fixed table set of a store and the resolver declared for each table.

use crate::config::StoreConfig;
use crate::engine::{materialize, Handles, IntoResolution, Record, Relation, Resolver, Snapshot, TableName};
use crate::error::{Result, StoreError};
use crate::immutable::{Extensions, ImmutableStore};
use crate::store::Store;
use indexmap::IndexMap;
use smol_str::SmolStr;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, instrument};

pub struct Schema {
    resolvers: IndexMap<TableName, Arc<dyn Resolver>>,
    config: StoreConfig,
}

impl fmt::Debug for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Schema")
            .field("tables", &self.resolvers.keys().collect::<Vec<_>>())
            .field("config", &self.config)
            .finish()
    }
}

impl Schema {
    pub fn builder() -> SchemaBuilder {
        SchemaBuilder::default()
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    pub fn table_names(&self) -> impl Iterator<Item = &TableName> {
        self.resolvers.keys()
    }

    pub fn contains(&self, table: &str) -> bool {
        self.resolvers.contains_key(table)
    }

    /// Every table present, every table empty.
    pub fn empty_snapshot(&self) -> Snapshot {
        Snapshot::empty(self.resolvers.keys().cloned())
    }

    /// Run the resolver for `table` against a fresh handle set.
    pub fn relations(&self, table: &str) -> Result<Vec<Relation>> {
        let (name, resolver) = self
            .resolvers
            .get_key_value(table)
            .ok_or_else(|| StoreError::UnknownTable {
                table: SmolStr::new(table),
            })?;

        let handles = Handles::new(self.resolvers.keys());
        let resolution = resolver
            .resolve(&handles)
            .ok_or_else(|| StoreError::MissingRelations { table: name.clone() })?;

        let relations = resolution.into_relations(name, &self.config)?;
        self.check_targets(&relations)?;
        Ok(relations)
    }

    /// Denormalized rows of `table` in `snapshot`.
    #[instrument(skip(self, snapshot))]
    pub fn select(&self, snapshot: &Snapshot, table: &str) -> Result<Vec<Record>> {
        let relations = self.relations(table)?;
        let rows = materialize(snapshot, table, &relations)?;
        debug!(rows = rows.len(), relations = relations.len(), "selected");
        Ok(rows)
    }

    /// A stateful store over this schema.
    pub fn direct(self: &Arc<Self>) -> Store {
        Store::new(Arc::clone(self))
    }

    /// An immutable store value over this schema.
    pub fn functional(self: &Arc<Self>) -> ImmutableStore {
        self.functional_with(Extensions::default())
    }

    /// An immutable store value carrying `extensions` into every value derived from it.
    pub fn functional_with(self: &Arc<Self>, extensions: Extensions) -> ImmutableStore {
        ImmutableStore::new(Arc::clone(self), Arc::new(extensions))
    }

    /// An immutable store value starting from existing tables.
    ///
    /// The snapshot must hold exactly this schema's tables, e.g. one taken from another
    /// store over the same schema.
    pub fn functional_from(
        self: &Arc<Self>,
        snapshot: Arc<Snapshot>,
        extensions: Extensions,
    ) -> Result<ImmutableStore> {
        self.check_snapshot(&snapshot)?;
        Ok(ImmutableStore::with_snapshot(Arc::clone(self), snapshot, Arc::new(extensions)))
    }

    /// Fails with `SchemaMismatch` unless `snapshot` holds exactly this schema's tables.
    pub fn check_snapshot(&self, snapshot: &Snapshot) -> Result<()> {
        let matches = snapshot.table_names().count() == self.resolvers.len()
            && snapshot.table_names().all(|name| self.contains(name));
        if matches {
            Ok(())
        } else {
            Err(StoreError::SchemaMismatch)
        }
    }

    fn check_targets(&self, relations: &[Relation]) -> Result<()> {
        match relations.iter().find(|r| !self.contains(&r.target_table)) {
            Some(relation) => Err(StoreError::UnknownTable {
                table: relation.target_table.clone(),
            }),
            None => Ok(()),
        }
    }

    /// Dry-run every resolver so bad targets fail at construction.
    /// Resolvers returning nothing are left to fail at select.
    fn validate(&self) -> Result<()> {
        let handles = Handles::new(self.resolvers.keys());
        for (name, resolver) in &self.resolvers {
            let Some(resolution) = resolver.resolve(&handles) else {
                debug!(table = %name, "resolver returned nothing during validation");
                continue;
            };
            let relations = resolution.into_relations(name, &self.config)?;
            self.check_targets(&relations)?;
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct SchemaBuilder {
    tables: Vec<(TableName, Arc<dyn Resolver>)>,
    config: StoreConfig,
}

impl SchemaBuilder {
    /// Declare a table with a closure resolver.
    pub fn table<F, R>(self, name: impl Into<TableName>, resolver: F) -> Self
    where
        F: Fn(&Handles) -> R + Send + Sync + 'static,
        R: IntoResolution + 'static,
    {
        self.resolver(name, Arc::new(resolver))
    }

    /// Declare a table with no relations.
    pub fn plain_table(self, name: impl Into<TableName>) -> Self {
        self.table(name, |_| Vec::<Relation>::new())
    }

    /// Declare a table with any [`Resolver`] implementation.
    pub fn resolver(mut self, name: impl Into<TableName>, resolver: Arc<dyn Resolver>) -> Self {
        self.tables.push((name.into(), resolver));
        self
    }

    pub fn config(mut self, config: StoreConfig) -> Self {
        self.config = config;
        self
    }

    pub fn build(self) -> Result<Arc<Schema>> {
        let mut resolvers = IndexMap::with_capacity(self.tables.len());
        for (name, resolver) in self.tables {
            if resolvers.contains_key(&name) {
                return Err(StoreError::DuplicateTable { table: name });
            }
            resolvers.insert(name, resolver);
        }

        let schema = Schema {
            resolvers,
            config: self.config,
        };
        schema.validate()?;
        debug!(tables = ?schema.resolvers.keys().collect::<Vec<_>>(), "schema built");
        Ok(Arc::new(schema))
    }
}
