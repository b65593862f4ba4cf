pub mod builder;
pub mod config;
pub mod error;
pub mod holder;
pub mod ids;
pub mod index;
pub mod metrics;
pub mod models;
pub mod parser;
pub mod pool;
pub mod retrieve;
pub mod scanner;

pub use builder::{BuildStats, IndexBuilder, MemoryConjunctionCache, MemoryDocumentCache};
pub use config::{
    BadConjunctionPolicy, FieldOption, HolderSettings, IndexLayout, IndexerSettings,
    QueryParsePolicy,
};
pub use error::{IndexerError, Result};
pub use ids::{ConjunctionId, DocId, EntryId};
pub use index::{BooleanIndex, IndexStats};
pub use metrics::IndexMetrics;
pub use models::*;
pub use retrieve::{ConjunctionCollector, DocIdCollector, ResultCollector, RetrieveOptions};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
