use thiserror::Error;

/// Main error type for indexing and retrieval
#[derive(Error, Debug)]
pub enum IndexerError {
    #[error("Duplicate field '{field}' in conjunction")]
    DuplicateField { field: String },

    #[error("Conjunction size {0} exceeds 255 include predicates")]
    ConjunctionSizeOverflow(usize),

    #[error("Conjunction index {0} exceeds 255 conjunctions per document")]
    ConjunctionIndexOverflow(usize),

    #[error("Value id {0} does not fit in 56 bits")]
    ValueIdOverflow(u64),

    #[error("Field '{0}' cannot be registered: field id space (256) exhausted")]
    FieldIdOverflow(String),

    #[error("Failed to parse value for field '{field}': {reason}")]
    ValueParse { field: String, reason: String },

    #[error("Failed to parse query value for field '{field}': {reason}")]
    QueryParse { field: String, reason: String },

    #[error("{0} queried before compilation")]
    NotCompiled(&'static str),

    #[error("Holder '{holder}' does not support operator {operator} (field '{field}')")]
    UnsupportedOperator {
        field: String,
        holder: String,
        operator: String,
    },

    #[error("Layout {layout} cannot index field '{field}' stored in holder '{holder}'")]
    UnsupportedLayout {
        field: String,
        holder: String,
        layout: &'static str,
    },

    #[error("Unknown entry holder: {0}")]
    UnknownHolder(String),

    #[error("Unknown value parser: {0}")]
    UnknownParser(String),

    #[error("{kind} '{name}' is already registered")]
    DuplicateRegistration { kind: &'static str, name: String },

    #[error("Field '{0}' is already configured")]
    FieldAlreadyConfigured(String),

    #[error("Invalid range for field '{field}': {reason}")]
    InvalidRange { field: String, reason: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] bincode::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias for indexer operations
pub type Result<T> = std::result::Result<T, IndexerError>;

impl IndexerError {
    /// Whether `SkipBadConjunction` may discard the conjunction that raised this error.
    ///
    /// Only value parse failures qualify; encoding overflows and configuration
    /// mismatches always abort the build.
    pub fn is_skippable(&self) -> bool {
        matches!(self, IndexerError::ValueParse { .. } | IndexerError::InvalidRange { .. })
    }
}
