//! Functional store: every batch yields a new store value.
//!
//! Values are cheap to clone and never change. A batch that changes nothing returns a
//! value sharing the same snapshot, so [`ImmutableStore::ptr_eq`] detects no-ops.
//! Extensions travel with every derived value; methods are handed the value they are
//! called on.

use crate::engine::{Batch, Record, Snapshot, Value};
use crate::error::{Result, StoreError};
use crate::schema::Schema;
use crate::store::TableReader;
use indexmap::IndexMap;
use smol_str::SmolStr;
use std::fmt;
use std::sync::Arc;

/// Extension method computing a value from the store it is called on.
pub type Method = Arc<dyn Fn(&ImmutableStore, &[Value]) -> Result<Value> + Send + Sync>;

/// Extension method deriving a new store from the one it is called on.
pub type Action = Arc<dyn Fn(&ImmutableStore, &[Value]) -> Result<ImmutableStore> + Send + Sync>;

#[derive(Clone)]
pub enum Extension {
    Method(Method),
    Action(Action),
    Property(Value),
}

impl fmt::Debug for Extension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Extension::Method(_) => f.write_str("Method(..)"),
            Extension::Action(_) => f.write_str("Action(..)"),
            Extension::Property(value) => f.debug_tuple("Property").field(value).finish(),
        }
    }
}

/// Named extras attached to every store value derived from a functional store.
#[derive(Clone, Debug, Default)]
pub struct Extensions {
    entries: IndexMap<SmolStr, Extension>,
}

impl Extensions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn method<F>(mut self, name: impl Into<SmolStr>, method: F) -> Self
    where
        F: Fn(&ImmutableStore, &[Value]) -> Result<Value> + Send + Sync + 'static,
    {
        self.entries.insert(name.into(), Extension::Method(Arc::new(method)));
        self
    }

    pub fn action<F>(mut self, name: impl Into<SmolStr>, action: F) -> Self
    where
        F: Fn(&ImmutableStore, &[Value]) -> Result<ImmutableStore> + Send + Sync + 'static,
    {
        self.entries.insert(name.into(), Extension::Action(Arc::new(action)));
        self
    }

    pub fn property(mut self, name: impl Into<SmolStr>, value: impl Into<Value>) -> Self {
        self.entries.insert(name.into(), Extension::Property(value.into()));
        self
    }

    pub fn get(&self, name: &str) -> Option<&Extension> {
        self.entries.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &SmolStr> {
        self.entries.keys()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[derive(Clone, Debug)]
pub struct ImmutableStore {
    schema: Arc<Schema>,
    snapshot: Arc<Snapshot>,
    extensions: Arc<Extensions>,
}

impl TableReader for ImmutableStore {
    fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    fn snapshot(&self) -> &Arc<Snapshot> {
        &self.snapshot
    }
}

impl ImmutableStore {
    pub(crate) fn new(schema: Arc<Schema>, extensions: Arc<Extensions>) -> Self {
        let snapshot = Arc::new(schema.empty_snapshot());
        Self::with_snapshot(schema, snapshot, extensions)
    }

    pub(crate) fn with_snapshot(
        schema: Arc<Schema>,
        snapshot: Arc<Snapshot>,
        extensions: Arc<Extensions>,
    ) -> Self {
        Self {
            schema,
            snapshot,
            extensions,
        }
    }

    fn derive(&self, snapshot: Arc<Snapshot>) -> Self {
        Self {
            schema: Arc::clone(&self.schema),
            snapshot,
            extensions: Arc::clone(&self.extensions),
        }
    }

    /// True when both values wrap the same snapshot and extensions.
    pub fn ptr_eq(a: &ImmutableStore, b: &ImmutableStore) -> bool {
        Arc::ptr_eq(&a.snapshot, &b.snapshot) && Arc::ptr_eq(&a.extensions, &b.extensions)
    }

    /// Apply a batch, returning the derived store.
    pub fn apply<F>(&self, f: F) -> Result<ImmutableStore>
    where
        F: FnOnce(&mut Batch<'_>) -> Result<()>,
    {
        let next = self.snapshot.mutate(f)?;
        if Arc::ptr_eq(&next, &self.snapshot) {
            return Ok(self.clone());
        }
        Ok(self.derive(next))
    }

    /// Denormalized rows of `table`.
    pub fn table(&self, name: &str) -> Result<Vec<Record>> {
        self.view(name)
    }

    /// A store with every table emptied.
    pub fn clear(&self) -> ImmutableStore {
        self.derive(Arc::new(self.snapshot.cleared()))
    }

    pub fn extensions(&self) -> &Extensions {
        &self.extensions
    }

    /// Invoke a value-returning extension method on this store.
    pub fn call(&self, name: &str, args: &[Value]) -> Result<Value> {
        match self.extension(name)? {
            Extension::Method(method) => method(self, args),
            _ => Err(StoreError::NotAMethod {
                name: SmolStr::new(name),
            }),
        }
    }

    /// Invoke a store-deriving extension action on this store.
    pub fn invoke(&self, name: &str, args: &[Value]) -> Result<ImmutableStore> {
        match self.extension(name)? {
            Extension::Action(action) => action(self, args),
            _ => Err(StoreError::NotAMethod {
                name: SmolStr::new(name),
            }),
        }
    }

    pub fn property(&self, name: &str) -> Option<&Value> {
        match self.extensions.get(name) {
            Some(Extension::Property(value)) => Some(value),
            _ => None,
        }
    }

    /// Property extensions in declaration order. Methods are not listed.
    pub fn properties(&self) -> impl Iterator<Item = (&SmolStr, &Value)> {
        self.extensions.entries.iter().filter_map(|(name, ext)| match ext {
            Extension::Property(value) => Some((name, value)),
            _ => None,
        })
    }

    fn extension(&self, name: &str) -> Result<&Extension> {
        self.extensions.get(name).ok_or_else(|| StoreError::UnknownExtension {
            name: SmolStr::new(name),
        })
    }
}
