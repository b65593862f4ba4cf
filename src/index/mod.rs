//! Compiled, read-only boolean indexes and the writers that fill them
//!
//! Three layouts share one retrieval interface:
//! - size-grouped: one partition per conjunction size, merged bucket by bucket with a
//!   fixed threshold
//! - compacted: a single partition, threshold taken from each conjunction's own size
//! - bitmap: per-value conjunction bitmaps combined with set algebra

mod bitmap;
mod compacted;
mod field;
mod partition;
mod size_grouped;

use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use std::time::Instant;
use tracing::{debug, warn};

pub use bitmap::BitmapIndex;
pub use compacted::CompactedIndex;
pub use field::{FieldCatalog, FieldDesc};
pub use size_grouped::SizeGroupedIndex;

use crate::config::{IndexLayout, IndexerSettings, QueryParsePolicy};
use crate::error::{IndexerError, Result};
use crate::holder::PreparedPayload;
use crate::ids::{ConjunctionId, DocId, FieldId};
use crate::metrics::IndexMetrics;
use crate::models::{Assignments, Values};
use crate::pool::Pool;
use crate::retrieve::{DocIdCollector, ResultCollector, RetrieveOptions};

/// Read-only index answering assignment queries
///
/// Implementations are `Send + Sync`; concurrent retrievals share nothing mutable
/// apart from the scratch pools.
pub trait BooleanIndex: Send + Sync + fmt::Debug {
    fn layout(&self) -> IndexLayout;

    /// Report every matched conjunction to `collector`
    ///
    /// The collector is not reset first; results accumulate across calls.
    fn retrieve_with_collector(
        &self,
        assignments: &Assignments,
        collector: &mut dyn ResultCollector,
        options: &RetrieveOptions,
    ) -> Result<()>;

    /// Ascending ids of the matched documents
    fn retrieve(&self, assignments: &Assignments, options: &RetrieveOptions) -> Result<Vec<DocId>>;

    fn stats(&self) -> IndexStats;
}

/// Size summary of a built index
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IndexStats {
    pub layout: &'static str,
    pub documents: usize,
    pub conjunctions: usize,
    pub fields: usize,
    /// Holder partitions (size buckets, or 1) or field bitmaps
    pub partitions: usize,
    pub terms: usize,
    pub entries: usize,
}

/// State every layout carries besides its posting data
#[derive(Debug)]
pub(crate) struct IndexCore {
    pub settings: IndexerSettings,
    pub catalog: FieldCatalog,
    pub collectors: Pool<DocIdCollector>,
    pub metrics: Option<IndexMetrics>,
    pub documents: usize,
    pub conjunctions: usize,
}

impl IndexCore {
    pub fn new(
        settings: IndexerSettings,
        catalog: FieldCatalog,
        metrics: Option<IndexMetrics>,
        documents: usize,
        conjunctions: usize,
    ) -> Self {
        let collectors = Pool::new(settings.collector_pool_size);
        Self {
            settings,
            catalog,
            collectors,
            metrics,
            documents,
            conjunctions,
        }
    }

    /// Known, non-empty query fields keyed by id
    pub fn query_fields<'q>(
        &'q self,
        assignments: &'q Assignments,
    ) -> HashMap<FieldId, (&'q FieldDesc, &'q Values)> {
        let mut fields = HashMap::with_capacity(assignments.len());
        for (name, values) in assignments.iter() {
            if values.is_empty() {
                continue;
            }
            match self.catalog.get(name) {
                Some(desc) => {
                    fields.insert(desc.id, (desc.as_ref(), values));
                }
                None => debug!(field = %name, "Ignoring query field unknown to the index"),
            }
        }
        fields
    }

    /// Apply the query parse policy to a holder error
    ///
    /// Returns `Ok(())` when the field should be dropped and the query continue.
    pub fn tolerate_query_error(&self, err: IndexerError) -> Result<()> {
        let IndexerError::QueryParse { field, reason } = err else {
            return Err(err);
        };
        match self.settings.query_parse {
            QueryParsePolicy::Strict => Err(IndexerError::QueryParse { field, reason }),
            QueryParsePolicy::LogAndSkip => {
                warn!(field = %field, reason = %reason, "Dropping unparsable query field");
                if let Some(metrics) = &self.metrics {
                    metrics.query_parse_failures.inc();
                }
                Ok(())
            }
        }
    }

    /// Time a retrieval and record its outcome
    pub fn observe(&self, layout: IndexLayout, run: impl FnOnce() -> Result<()>) -> Result<()> {
        let start = Instant::now();
        let outcome = run();
        if let Some(metrics) = &self.metrics {
            match &outcome {
                Ok(()) => metrics.record_retrieve(layout.name(), start.elapsed().as_secs_f64()),
                Err(_) => metrics.record_retrieve_error(),
            }
        }
        outcome
    }

    /// Run a retrieval against a pooled collector
    pub fn collect_doc_ids(
        &self,
        run: impl FnOnce(&mut DocIdCollector) -> Result<()>,
    ) -> Result<Vec<DocId>> {
        let mut collector = self.collectors.acquire();
        let outcome = run(&mut collector);
        let ids = collector.doc_ids();
        self.collectors.release(collector);
        outcome.map(|()| ids)
    }

    pub fn stats(&self, layout: IndexLayout) -> IndexStats {
        IndexStats {
            layout: layout.name(),
            documents: self.documents,
            conjunctions: self.conjunctions,
            fields: self.catalog.len(),
            ..IndexStats::default()
        }
    }
}

/// Write side of a layout, fed by the builder and compiled exactly once
pub(crate) trait LayoutWriter: Send + fmt::Debug {
    /// Reject fields whose holder this layout cannot index
    fn accepts(&self, _field: &str, _holder: &str) -> Result<()> {
        Ok(())
    }

    /// Allocate ids for a predicate ahead of commit; adds no entries
    fn reserve(&mut self, desc: &FieldDesc, conj: ConjunctionId, payload: &PreparedPayload) -> Result<()>;

    /// Register a conjunction before its predicates are committed
    fn add_conjunction(&mut self, conj: ConjunctionId) -> Result<()>;

    fn add_predicate(
        &mut self,
        desc: &FieldDesc,
        conj: ConjunctionId,
        include: bool,
        payload: &PreparedPayload,
    ) -> Result<()>;

    fn finish(self: Box<Self>, core: IndexCore) -> Result<Box<dyn BooleanIndex>>;
}

pub(crate) fn writer_for(layout: IndexLayout) -> Box<dyn LayoutWriter> {
    match layout {
        IndexLayout::SizeGrouped => Box::<size_grouped::SizeGroupedWriter>::default(),
        IndexLayout::Compacted => Box::<compacted::CompactedWriter>::default(),
        IndexLayout::Bitmap => Box::<bitmap::BitmapWriter>::default(),
    }
}
