use std::collections::{HashMap, HashSet};
use tracing::debug;

use super::{FieldDesc, IndexCore};
use crate::error::{IndexerError, Result};
use crate::holder::{Entries, EntriesHolder, HolderStats, MatchedEntries, PreparedPayload, TermRef};
use crate::ids::{ConjunctionId, EntryId, FieldId};
use crate::models::Values;
use crate::retrieve::RetrieveOptions;
use crate::scanner::FieldScanner;

const WILDCARD_FIELD: &str = "<wildcard>";

/// One holder per field plus the wildcard list of size-0 conjunctions
#[derive(Debug, Default)]
pub(crate) struct Partition {
    holders: HashMap<FieldId, Box<dyn EntriesHolder>>,
    wildcard: Entries,
}

impl Partition {
    pub fn add_conjunction(&mut self, conj: ConjunctionId) {
        if conj.size() == 0 {
            self.wildcard.push(EntryId::new(conj, true));
        }
    }

    /// Create the field's holder if needed and reserve room for `payload`
    pub fn reserve(&mut self, desc: &FieldDesc, payload: &PreparedPayload) -> Result<()> {
        self.holders
            .entry(desc.id)
            .or_insert_with(|| desc.holder.create())
            .reserve(desc, payload)
    }

    pub fn add_predicate(
        &mut self,
        desc: &FieldDesc,
        conj: ConjunctionId,
        include: bool,
        payload: &PreparedPayload,
    ) -> Result<()> {
        self.holders
            .entry(desc.id)
            .or_insert_with(|| desc.holder.create())
            .commit(desc, payload, EntryId::new(conj, include))
    }

    pub fn compile(&mut self) -> Result<()> {
        for holder in self.holders.values_mut() {
            holder.compile()?;
        }
        self.wildcard.compile();
        Ok(())
    }

    /// Scanners for the query fields this partition holds, plus the wildcard
    ///
    /// Fields whose values fail to parse are dropped under the log-and-skip policy and
    /// remembered in `dropped`, so later partitions neither re-parse nor re-log them.
    pub fn scanners<'a>(
        &'a self,
        core: &IndexCore,
        query: &HashMap<FieldId, (&'a FieldDesc, &Values)>,
        dropped: &mut HashSet<FieldId>,
        options: &RetrieveOptions,
    ) -> Result<Vec<FieldScanner<'a>>> {
        let mut scanners = Vec::with_capacity(query.len() + 1);
        for (field_id, &(desc, values)) in query {
            if dropped.contains(field_id) {
                continue;
            }
            let Some(holder) = self.holders.get(field_id) else {
                continue;
            };

            match holder.get_entries(desc, values) {
                Ok(matched) => {
                    if options.dump_entries {
                        dump_entries(desc, &matched);
                    }
                    if !matched.is_empty() {
                        scanners.push(FieldScanner::new(&desc.name, matched));
                    }
                }
                Err(err @ IndexerError::QueryParse { .. }) => {
                    core.tolerate_query_error(err)?;
                    dropped.insert(*field_id);
                }
                Err(err) => return Err(err),
            }
        }

        if !self.wildcard.is_empty() {
            let matched = vec![MatchedEntries::new(TermRef::Wildcard, self.wildcard.as_slice())];
            scanners.push(FieldScanner::new(WILDCARD_FIELD, matched));
        }
        Ok(scanners)
    }

    pub fn stats(&self) -> HolderStats {
        let mut stats = HolderStats {
            terms: usize::from(!self.wildcard.is_empty()),
            entries: self.wildcard.len(),
        };
        for holder in self.holders.values() {
            stats += holder.stats();
        }
        stats
    }
}

fn dump_entries(desc: &FieldDesc, matched: &[MatchedEntries<'_>]) {
    for m in matched {
        debug!(
            field = %desc.name,
            term = %m.term,
            entries = ?m.entries,
            "Matched posting list"
        );
    }
}
