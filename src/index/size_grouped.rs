use std::collections::{BTreeMap, HashSet};
use tracing::{info, trace};

use super::partition::Partition;
use super::{BooleanIndex, FieldDesc, IndexCore, IndexStats, LayoutWriter};
use crate::config::IndexLayout;
use crate::error::Result;
use crate::holder::PreparedPayload;
use crate::ids::{ConjunctionId, DocId};
use crate::models::Assignments;
use crate::retrieve::{retrieve_k, ResultCollector, RetrieveOptions};

#[derive(Debug, Default)]
pub(crate) struct SizeGroupedWriter {
    buckets: BTreeMap<u8, Partition>,
}

impl LayoutWriter for SizeGroupedWriter {
    fn add_conjunction(&mut self, conj: ConjunctionId) -> Result<()> {
        self.buckets.entry(conj.size()).or_default().add_conjunction(conj);
        Ok(())
    }

    fn reserve(&mut self, desc: &FieldDesc, conj: ConjunctionId, payload: &PreparedPayload) -> Result<()> {
        self.buckets.entry(conj.size()).or_default().reserve(desc, payload)
    }

    fn add_predicate(
        &mut self,
        desc: &FieldDesc,
        conj: ConjunctionId,
        include: bool,
        payload: &PreparedPayload,
    ) -> Result<()> {
        self.buckets
            .entry(conj.size())
            .or_default()
            .add_predicate(desc, conj, include, payload)
    }

    fn finish(self: Box<Self>, core: IndexCore) -> Result<Box<dyn BooleanIndex>> {
        let SizeGroupedWriter { mut buckets } = *self;
        for partition in buckets.values_mut() {
            partition.compile()?;
        }
        info!(
            buckets = buckets.len(),
            max_size = buckets.keys().next_back().copied().unwrap_or(0),
            "Compiled size-grouped index"
        );
        Ok(Box::new(SizeGroupedIndex { core, buckets }))
    }
}

/// Index with one partition per conjunction size
///
/// A query assigning `n` fields can only satisfy conjunctions of size `<= n`, so
/// buckets above that are never opened.
#[derive(Debug)]
pub struct SizeGroupedIndex {
    core: IndexCore,
    buckets: BTreeMap<u8, Partition>,
}

impl SizeGroupedIndex {
    pub fn max_size(&self) -> u8 {
        self.buckets.keys().next_back().copied().unwrap_or(0)
    }
}

impl BooleanIndex for SizeGroupedIndex {
    fn layout(&self) -> IndexLayout {
        IndexLayout::SizeGrouped
    }

    fn retrieve_with_collector(
        &self,
        assignments: &Assignments,
        collector: &mut dyn ResultCollector,
        options: &RetrieveOptions,
    ) -> Result<()> {
        self.core.observe(self.layout(), || {
            let query = self.core.query_fields(assignments);
            let max_k = query.len().min(u8::MAX as usize) as u8;
            let mut dropped = HashSet::new();

            for (&k, partition) in self.buckets.range(..=max_k).rev() {
                let mut scanners = partition.scanners(&self.core, &query, &mut dropped, options)?;
                if options.dump_steps {
                    trace!(k, scanners = scanners.len(), "Scanning size bucket");
                }
                retrieve_k(&mut scanners, k as usize, collector, options);
            }
            Ok(())
        })
    }

    fn retrieve(&self, assignments: &Assignments, options: &RetrieveOptions) -> Result<Vec<DocId>> {
        self.core
            .collect_doc_ids(|collector| self.retrieve_with_collector(assignments, collector, options))
    }

    fn stats(&self) -> IndexStats {
        let mut stats = self.core.stats(self.layout());
        stats.partitions = self.buckets.len();
        for partition in self.buckets.values() {
            let holder = partition.stats();
            stats.terms += holder.terms;
            stats.entries += holder.entries;
        }
        stats
    }
}
