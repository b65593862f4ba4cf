use serde::{Deserialize, Serialize};
use std::collections::hash_map::DefaultHasher;
use std::collections::BTreeMap;
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::cache::{CachedDocument, ConjunctionCache, DocumentCache};
use super::txn::{PreparedConjunction, PreparedPredicate};
use crate::config::{BadConjunctionPolicy, FieldOption, HolderSettings, IndexerSettings};
use crate::error::Result;
use crate::holder::Registry;
use crate::ids::ConjunctionId;
use crate::index::{writer_for, BooleanIndex, FieldCatalog, IndexCore, LayoutWriter};
use crate::metrics::IndexMetrics;
use crate::models::{Conjunction, Document};

/// Counters accumulated while building
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BuildStats {
    pub documents: usize,
    pub conjunctions: usize,
    pub predicates: usize,
    pub skipped_conjunctions: usize,
    pub document_cache_hits: usize,
    pub conjunction_cache_hits: usize,
}

/// Conjunction cache record
#[derive(Serialize, Deserialize)]
struct CachedConjunction {
    version: u64,
    schema: u64,
    conjunction: PreparedConjunction,
}

/// Accumulates documents and compiles them into a [`BooleanIndex`]
///
/// Every conjunction is prepared in full before any of it reaches a holder. Under
/// `FailFast` the first bad conjunction aborts `add_document`; under
/// `SkipBadConjunction` value-parse failures drop just that conjunction.
pub struct IndexBuilder {
    settings: IndexerSettings,
    registry: Registry,
    catalog: FieldCatalog,
    configured: BTreeMap<String, FieldOption>,
    schema: u64,
    writer: Box<dyn LayoutWriter>,
    document_cache: Option<Arc<dyn DocumentCache>>,
    conjunction_cache: Option<Arc<dyn ConjunctionCache>>,
    metrics: Option<IndexMetrics>,
    stats: BuildStats,
}

impl IndexBuilder {
    /// Builder with the built-in holders and parsers registered
    pub fn new(settings: IndexerSettings) -> Self {
        let registry = Registry::with_builtins(&settings.holders);
        Self::with_registry(settings, registry)
    }

    pub fn with_registry(settings: IndexerSettings, registry: Registry) -> Self {
        let configured = BTreeMap::new();
        let schema = schema_fingerprint(&configured, &settings.holders);
        Self {
            writer: writer_for(settings.layout),
            settings,
            registry,
            catalog: FieldCatalog::new(),
            configured,
            schema,
            document_cache: None,
            conjunction_cache: None,
            metrics: None,
            stats: BuildStats::default(),
        }
    }

    pub fn with_document_cache(mut self, cache: Arc<dyn DocumentCache>) -> Self {
        self.document_cache = Some(cache);
        self
    }

    pub fn with_conjunction_cache(mut self, cache: Arc<dyn ConjunctionCache>) -> Self {
        self.conjunction_cache = Some(cache);
        self
    }

    pub fn with_metrics(mut self, metrics: IndexMetrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Register custom holders or parsers before the fields that use them
    pub fn registry_mut(&mut self) -> &mut Registry {
        &mut self.registry
    }

    pub fn settings(&self) -> &IndexerSettings {
        &self.settings
    }

    pub fn stats(&self) -> &BuildStats {
        &self.stats
    }

    /// Bind a field to a holder and parser; a field can be configured once
    pub fn configure_field(&mut self, name: &str, option: FieldOption) -> Result<()> {
        self.writer.accepts(name, &option.container)?;
        let desc = self.catalog.configure(&self.registry, name, option.clone())?;
        self.configured.insert(name.to_string(), option);
        self.schema = schema_fingerprint(&self.configured, &self.settings.holders);
        info!(
            field = name,
            id = %desc.id,
            holder = %desc.option.container,
            parser = %desc.option.parser,
            "Configured field"
        );

        if self.stats.documents > 0 {
            self.clear_caches();
        }
        Ok(())
    }

    pub fn add_documents<'a>(&mut self, docs: impl IntoIterator<Item = &'a Document>) -> Result<()> {
        for doc in docs {
            self.add_document(doc)?;
        }
        Ok(())
    }

    pub fn add_document(&mut self, doc: &Document) -> Result<()> {
        let ids = doc.conjunction_ids()?;

        let prepared = match self.cached_document(doc) {
            Some(prepared) => prepared,
            None => {
                let prepared = self.prepare_document(doc, &ids)?;
                self.store_document(doc, &prepared);
                prepared
            }
        };

        for conj in &prepared {
            self.commit(conj)?;
        }

        self.stats.documents += 1;
        if let Some(metrics) = &self.metrics {
            metrics.documents_indexed.inc();
        }
        debug!(doc_id = doc.id, conjunctions = prepared.len(), "Indexed document");
        Ok(())
    }

    /// Compile everything added so far into a read-only index
    pub fn build(self) -> Result<Box<dyn BooleanIndex>> {
        let core = IndexCore::new(
            self.settings,
            self.catalog,
            self.metrics.clone(),
            self.stats.documents,
            self.stats.conjunctions,
        );
        let index = self.writer.finish(core)?;

        let stats = index.stats();
        if let Some(metrics) = &self.metrics {
            metrics.set_index_size(stats.documents, stats.entries);
        }
        info!(
            layout = stats.layout,
            documents = stats.documents,
            conjunctions = stats.conjunctions,
            skipped = self.stats.skipped_conjunctions,
            entries = stats.entries,
            "Built boolean index"
        );
        Ok(index)
    }

    fn prepare_document(
        &mut self,
        doc: &Document,
        ids: &[ConjunctionId],
    ) -> Result<Vec<PreparedConjunction>> {
        let mut prepared = Vec::with_capacity(ids.len());
        for (conj, &id) in doc.conjunctions().iter().zip(ids) {
            let outcome = match self.cached_conjunction(doc.version, id) {
                Some(hit) => Ok(hit),
                None => self.prepare_conjunction(id, conj).map(|fresh| {
                    self.store_conjunction(doc.version, &fresh);
                    fresh
                }),
            };

            match outcome {
                Ok(conj) => prepared.push(conj),
                Err(err)
                    if err.is_skippable()
                        && self.settings.bad_conjunction
                            == BadConjunctionPolicy::SkipBadConjunction =>
                {
                    warn!(
                        doc_id = doc.id,
                        conj_index = id.index(),
                        error = %err,
                        "Skipping bad conjunction"
                    );
                    self.stats.skipped_conjunctions += 1;
                    if let Some(metrics) = &self.metrics {
                        metrics.conjunctions_skipped.inc();
                    }
                }
                Err(err) => return Err(err),
            }
        }
        Ok(prepared)
    }

    fn prepare_conjunction(
        &mut self,
        id: ConjunctionId,
        conj: &Conjunction,
    ) -> Result<PreparedConjunction> {
        let Self {
            catalog,
            registry,
            writer,
            ..
        } = self;
        PreparedConjunction::prepare(id, conj, |name| {
            let desc = catalog.get_or_configure(registry, name)?;
            writer.accepts(name, desc.holder.name())?;
            Ok(desc)
        })
    }

    /// Hand a prepared conjunction to the layout writer
    ///
    /// Field resolution and id reservation run for every predicate before the first
    /// entry is written, so a conjunction lands in the index entirely or not at all.
    fn commit(&mut self, conj: &PreparedConjunction) -> Result<()> {
        let descs = conj
            .predicates
            .iter()
            .map(|pred| {
                let desc = self.catalog.get_or_configure(&self.registry, &pred.field)?;
                self.writer.accepts(&pred.field, desc.holder.name())?;
                Ok(desc)
            })
            .collect::<Result<Vec<_>>>()?;
        for (pred, desc) in conj.predicates.iter().zip(&descs) {
            self.writer.reserve(desc, conj.id, &pred.payload)?;
        }

        self.writer.add_conjunction(conj.id)?;
        for (PreparedPredicate { include, payload, .. }, desc) in conj.predicates.iter().zip(&descs) {
            self.writer.add_predicate(desc, conj.id, *include, payload)?;
        }

        self.stats.conjunctions += 1;
        self.stats.predicates += conj.predicates.len();
        if let Some(metrics) = &self.metrics {
            metrics.conjunctions_indexed.inc();
        }
        Ok(())
    }

    fn cached_document(&mut self, doc: &Document) -> Option<Vec<PreparedConjunction>> {
        if doc.version == 0 {
            return None;
        }
        let cache = self.document_cache.clone()?;
        let hit = cache
            .get(doc.id, doc.version)
            .and_then(|entry| self.decode_document(cache.as_ref(), entry));

        self.record_lookup("document", hit.is_some());
        if hit.is_some() {
            self.stats.document_cache_hits += 1;
        }
        hit
    }

    fn decode_document(
        &self,
        cache: &dyn DocumentCache,
        entry: CachedDocument,
    ) -> Option<Vec<PreparedConjunction>> {
        if entry.schema != self.schema {
            info!(doc_id = entry.doc_id, "Field schema changed, clearing document cache");
            cache.clear();
            return None;
        }
        entry
            .conjunctions
            .iter()
            .map(|bytes| PreparedConjunction::from_bytes(bytes))
            .collect::<Result<Vec<_>>>()
            .map_err(|err| warn!(doc_id = entry.doc_id, error = %err, "Discarding undecodable cached document"))
            .ok()
    }

    fn store_document(&self, doc: &Document, prepared: &[PreparedConjunction]) {
        let Some(cache) = &self.document_cache else {
            return;
        };
        match prepared
            .iter()
            .map(PreparedConjunction::to_bytes)
            .collect::<Result<Vec<_>>>()
        {
            Ok(conjunctions) => cache.set(CachedDocument {
                doc_id: doc.id,
                version: doc.version,
                schema: self.schema,
                conjunctions,
            }),
            Err(err) => warn!(doc_id = doc.id, error = %err, "Failed to encode document for cache"),
        }
    }

    fn cached_conjunction(&mut self, version: u64, id: ConjunctionId) -> Option<PreparedConjunction> {
        if version == 0 {
            return None;
        }
        let cache = self.conjunction_cache.clone()?;
        let hit = cache.get(id).and_then(|bytes| {
            let record: CachedConjunction = bincode::deserialize(&bytes)
                .map_err(|err| warn!(conj = %id, error = %err, "Discarding undecodable cached conjunction"))
                .ok()?;
            if record.schema != self.schema {
                info!(conj = %id, "Field schema changed, clearing conjunction cache");
                cache.clear();
                return None;
            }
            (record.version == version).then_some(record.conjunction)
        });

        self.record_lookup("conjunction", hit.is_some());
        if hit.is_some() {
            self.stats.conjunction_cache_hits += 1;
        }
        hit
    }

    fn store_conjunction(&self, version: u64, prepared: &PreparedConjunction) {
        let Some(cache) = &self.conjunction_cache else {
            return;
        };
        let record = CachedConjunction {
            version,
            schema: self.schema,
            conjunction: prepared.clone(),
        };
        match bincode::serialize(&record) {
            Ok(bytes) => cache.set(prepared.id, bytes),
            Err(err) => warn!(conj = %prepared.id, error = %err, "Failed to encode conjunction for cache"),
        }
    }

    fn record_lookup(&self, cache: &str, hit: bool) {
        if let Some(metrics) = &self.metrics {
            metrics.record_cache_lookup(cache, hit);
        }
    }

    fn clear_caches(&self) {
        if let Some(cache) = &self.document_cache {
            cache.clear();
        }
        if let Some(cache) = &self.conjunction_cache {
            cache.clear();
        }
        info!("Field schema changed, cleared preparation caches");
    }
}

impl std::fmt::Debug for IndexBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IndexBuilder")
            .field("layout", &self.settings.layout)
            .field("fields", &self.catalog.len())
            .field("stats", &self.stats)
            .finish_non_exhaustive()
    }
}

/// Identity of everything that shapes prepared payloads
fn schema_fingerprint(configured: &BTreeMap<String, FieldOption>, holders: &HolderSettings) -> u64 {
    let mut hasher = DefaultHasher::new();
    configured.hash(&mut hasher);
    holders.keyword_separator.hash(&mut hasher);
    holders.range_expand_threshold.hash(&mut hasher);
    hasher.finish()
}
