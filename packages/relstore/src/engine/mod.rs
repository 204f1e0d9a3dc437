pub mod materialize;
pub mod mutation;
pub mod relation;
pub mod snapshot;
pub mod types;

pub use materialize::materialize;
pub use mutation::{Batch, DeleteWhere, TableHandle, UpdateWhere};
pub use relation::{Binding, Cardinality, Handles, IntoResolution, Relation, Resolution, Resolver, TableRef};
pub use snapshot::{Rows, Snapshot};
pub use types::{FastMap, FieldMap, FieldName, Record, TableName, Value};
