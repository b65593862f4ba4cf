//! Index construction: field configuration, two-phase conjunction preparation and
//! the optional preparation caches

#[allow(clippy::module_inception)]
mod builder;
mod cache;
mod txn;

pub use builder::{BuildStats, IndexBuilder};
pub use cache::{
    CachedDocument, ConjunctionCache, DocumentCache, MemoryConjunctionCache, MemoryDocumentCache,
};
pub use txn::{PreparedConjunction, PreparedPredicate};
