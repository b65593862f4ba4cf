use std::collections::HashSet;
use tracing::{info, trace};

use super::partition::Partition;
use super::{BooleanIndex, FieldDesc, IndexCore, IndexStats, LayoutWriter};
use crate::config::IndexLayout;
use crate::error::Result;
use crate::holder::PreparedPayload;
use crate::ids::{ConjunctionId, DocId};
use crate::models::Assignments;
use crate::retrieve::{retrieve_dynamic, ResultCollector, RetrieveOptions};

#[derive(Debug, Default)]
pub(crate) struct CompactedWriter {
    partition: Partition,
}

impl LayoutWriter for CompactedWriter {
    fn add_conjunction(&mut self, conj: ConjunctionId) -> Result<()> {
        self.partition.add_conjunction(conj);
        Ok(())
    }

    fn reserve(&mut self, desc: &FieldDesc, _conj: ConjunctionId, payload: &PreparedPayload) -> Result<()> {
        self.partition.reserve(desc, payload)
    }

    fn add_predicate(
        &mut self,
        desc: &FieldDesc,
        conj: ConjunctionId,
        include: bool,
        payload: &PreparedPayload,
    ) -> Result<()> {
        self.partition.add_predicate(desc, conj, include, payload)
    }

    fn finish(self: Box<Self>, core: IndexCore) -> Result<Box<dyn BooleanIndex>> {
        let CompactedWriter { mut partition } = *self;
        partition.compile()?;
        info!(entries = partition.stats().entries, "Compiled compacted index");
        Ok(Box::new(CompactedIndex { core, partition }))
    }
}

/// Index with a single holder set shared by every conjunction size
#[derive(Debug)]
pub struct CompactedIndex {
    core: IndexCore,
    partition: Partition,
}

impl BooleanIndex for CompactedIndex {
    fn layout(&self) -> IndexLayout {
        IndexLayout::Compacted
    }

    fn retrieve_with_collector(
        &self,
        assignments: &Assignments,
        collector: &mut dyn ResultCollector,
        options: &RetrieveOptions,
    ) -> Result<()> {
        self.core.observe(self.layout(), || {
            let query = self.core.query_fields(assignments);
            let mut dropped = HashSet::new();
            let mut scanners = self
                .partition
                .scanners(&self.core, &query, &mut dropped, options)?;
            if options.dump_steps {
                trace!(scanners = scanners.len(), "Scanning compacted index");
            }
            retrieve_dynamic(&mut scanners, collector, options);
            Ok(())
        })
    }

    fn retrieve(&self, assignments: &Assignments, options: &RetrieveOptions) -> Result<Vec<DocId>> {
        self.core
            .collect_doc_ids(|collector| self.retrieve_with_collector(assignments, collector, options))
    }

    fn stats(&self) -> IndexStats {
        let holder = self.partition.stats();
        IndexStats {
            partitions: 1,
            terms: holder.terms,
            entries: holder.entries,
            ..self.core.stats(self.layout())
        }
    }
}
