use dashmap::DashMap;
use serde::{Deserialize, Serialize};

use crate::ids::{ConjunctionId, DocId};

/// Prepared form of one document, as stored in a [`DocumentCache`]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedDocument {
    pub doc_id: DocId,
    pub version: u64,
    /// Fingerprint of the field schema the payloads were prepared under
    pub schema: u64,
    /// bincode-encoded prepared conjunctions
    pub conjunctions: Vec<Vec<u8>>,
}

/// Caller-supplied store of prepared documents keyed by (id, version)
///
/// Implementations must be usable from `&self`; the builder never holds a lock
/// across calls.
pub trait DocumentCache: Send + Sync {
    fn get(&self, doc_id: DocId, version: u64) -> Option<CachedDocument>;

    fn set(&self, entry: CachedDocument);

    fn clear(&self);
}

/// Caller-supplied store of encoded prepared conjunctions
pub trait ConjunctionCache: Send + Sync {
    fn get(&self, id: ConjunctionId) -> Option<Vec<u8>>;

    fn set(&self, id: ConjunctionId, data: Vec<u8>);

    fn clear(&self);
}

/// In-process [`DocumentCache`]
#[derive(Debug, Default)]
pub struct MemoryDocumentCache {
    entries: DashMap<(DocId, u64), CachedDocument>,
}

impl MemoryDocumentCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl DocumentCache for MemoryDocumentCache {
    fn get(&self, doc_id: DocId, version: u64) -> Option<CachedDocument> {
        self.entries.get(&(doc_id, version)).map(|e| e.value().clone())
    }

    fn set(&self, entry: CachedDocument) {
        self.entries.insert((entry.doc_id, entry.version), entry);
    }

    fn clear(&self) {
        self.entries.clear();
    }
}

/// In-process [`ConjunctionCache`]
#[derive(Debug, Default)]
pub struct MemoryConjunctionCache {
    entries: DashMap<ConjunctionId, Vec<u8>>,
}

impl MemoryConjunctionCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl ConjunctionCache for MemoryConjunctionCache {
    fn get(&self, id: ConjunctionId) -> Option<Vec<u8>> {
        self.entries.get(&id).map(|e| e.value().clone())
    }

    fn set(&self, id: ConjunctionId, data: Vec<u8>) {
        self.entries.insert(id, data);
    }

    fn clear(&self) {
        self.entries.clear();
    }
}
