use roaring::RoaringBitmap;
use std::collections::BTreeMap;

use crate::ids::DocId;
use crate::pool::Poolable;

/// Receives every matched conjunction
///
/// A document may be reported once per matching conjunction; collectors dedupe.
pub trait ResultCollector {
    fn add(&mut self, doc_id: DocId, conj_index: u8);

    fn reset(&mut self) {}
}

/// Distinct matched document ids
#[derive(Debug, Default, Clone)]
pub struct DocIdCollector {
    docs: RoaringBitmap,
}

impl DocIdCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Matched ids in ascending order
    pub fn doc_ids(&self) -> Vec<DocId> {
        self.docs.iter().collect()
    }

    pub fn contains(&self, doc_id: DocId) -> bool {
        self.docs.contains(doc_id)
    }

    pub fn len(&self) -> usize {
        self.docs.len() as usize
    }

    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }
}

impl ResultCollector for DocIdCollector {
    fn add(&mut self, doc_id: DocId, _conj_index: u8) {
        self.docs.insert(doc_id);
    }

    fn reset(&mut self) {
        self.docs.clear();
    }
}

impl Poolable for DocIdCollector {
    fn reset(&mut self) {
        self.docs.clear();
    }
}

/// Matched documents together with which of their conjunctions matched
#[derive(Debug, Default, Clone)]
pub struct ConjunctionCollector {
    hits: BTreeMap<DocId, Vec<u8>>,
}

impl ConjunctionCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn doc_ids(&self) -> Vec<DocId> {
        self.hits.keys().copied().collect()
    }

    /// Matched conjunction indexes of a document, ascending
    pub fn conjunctions(&self, doc_id: DocId) -> &[u8] {
        self.hits.get(&doc_id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.hits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }
}

impl ResultCollector for ConjunctionCollector {
    fn add(&mut self, doc_id: DocId, conj_index: u8) {
        let indexes = self.hits.entry(doc_id).or_default();
        if let Err(pos) = indexes.binary_search(&conj_index) {
            indexes.insert(pos, conj_index);
        }
    }

    fn reset(&mut self) {
        self.hits.clear();
    }
}
