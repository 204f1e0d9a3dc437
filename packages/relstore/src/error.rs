use smol_str::SmolStr;

pub type Result<T, E = StoreError> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A resolver returned no relation list. An empty list is the way to declare "no relations".
    #[error("resolver for table `{table}` returned no relations")]
    MissingRelations { table: SmolStr },

    #[error("table `{table}` is not part of the schema")]
    UnknownTable { table: SmolStr },

    #[error("table `{table}` is declared more than once")]
    DuplicateTable { table: SmolStr },

    #[error("resolver for table `{table}` uses the raw-pair form, which is disabled")]
    LegacyResolverDisabled { table: SmolStr },

    #[error("snapshot tables do not match the schema")]
    SchemaMismatch,

    #[error("records must be built from JSON objects")]
    NotAnObject,

    #[error("no extension named `{name}`")]
    UnknownExtension { name: SmolStr },

    #[error("extension `{name}` cannot be called this way")]
    NotAMethod { name: SmolStr },

    #[error("invalid store config: {0}")]
    InvalidConfig(#[from] serde_json::Error),
}
