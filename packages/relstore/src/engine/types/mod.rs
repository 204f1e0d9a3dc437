mod record;
mod value;

pub use record::Record;
pub use value::{FieldMap, Value};

use rustc_hash::FxHasher;
use smol_str::SmolStr;
use std::hash::BuildHasherDefault;

pub type FastMap<K, V> = std::collections::HashMap<K, V, BuildHasherDefault<FxHasher>>;

/// Optimized string type for table names (inlines strings <= 23 bytes).
pub type TableName = SmolStr;

/// Optimized string type for field names.
pub type FieldName = SmolStr;
