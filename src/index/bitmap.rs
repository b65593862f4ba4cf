use roaring::RoaringTreemap;
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, info};

use super::{BooleanIndex, FieldDesc, IndexCore, IndexStats, LayoutWriter};
use crate::config::IndexLayout;
use crate::error::{IndexerError, Result};
use crate::holder::{payload_mismatch, PreparedPayload, DEFAULT_HOLDER};
use crate::ids::{BitmapConjunctionId, ConjunctionId, DocId, FieldId};
use crate::models::{Assignments, Values};
use crate::parser::ValueDictionary;
use crate::pool::Pool;
use crate::retrieve::{ResultCollector, RetrieveOptions};

/// Conjunction bitmaps of one field
#[derive(Debug, Default)]
struct BitmapField {
    dict: ValueDictionary,
    include: HashMap<u64, RoaringTreemap>,
    exclude: HashMap<u64, RoaringTreemap>,
    /// Conjunctions with an include predicate on this field
    constrained: RoaringTreemap,
    /// Conjunctions without one; filled at compile time
    wildcard: RoaringTreemap,
}

impl BitmapField {
    fn entries(&self) -> u64 {
        self.include
            .values()
            .chain(self.exclude.values())
            .map(RoaringTreemap::len)
            .sum()
    }
}

#[derive(Debug, Default)]
pub(crate) struct BitmapWriter {
    fields: BTreeMap<FieldId, BitmapField>,
    all: RoaringTreemap,
}

impl LayoutWriter for BitmapWriter {
    fn accepts(&self, field: &str, holder: &str) -> Result<()> {
        if holder == DEFAULT_HOLDER {
            return Ok(());
        }
        Err(IndexerError::UnsupportedLayout {
            field: field.to_string(),
            holder: holder.to_string(),
            layout: IndexLayout::Bitmap.name(),
        })
    }

    fn add_conjunction(&mut self, conj: ConjunctionId) -> Result<()> {
        self.all.insert(BitmapConjunctionId::from(conj).as_u64());
        Ok(())
    }

    fn reserve(&mut self, desc: &FieldDesc, _conj: ConjunctionId, payload: &PreparedPayload) -> Result<()> {
        let PreparedPayload::Terms(terms) = payload else {
            return Err(payload_mismatch("bitmap", payload));
        };
        let field = self.fields.entry(desc.id).or_default();
        for term in terms {
            field.dict.intern(term)?;
        }
        Ok(())
    }

    fn add_predicate(
        &mut self,
        desc: &FieldDesc,
        conj: ConjunctionId,
        include: bool,
        payload: &PreparedPayload,
    ) -> Result<()> {
        let PreparedPayload::Terms(terms) = payload else {
            return Err(payload_mismatch("bitmap", payload));
        };
        let id = BitmapConjunctionId::from(conj).as_u64();
        let field = self.fields.entry(desc.id).or_default();

        let value_ids = terms
            .iter()
            .map(|term| field.dict.intern(term))
            .collect::<Result<Vec<_>>>()?;
        if include {
            field.constrained.insert(id);
        }
        let target = if include {
            &mut field.include
        } else {
            &mut field.exclude
        };
        for value_id in value_ids {
            target.entry(value_id).or_default().insert(id);
        }
        Ok(())
    }

    fn finish(self: Box<Self>, core: IndexCore) -> Result<Box<dyn BooleanIndex>> {
        let BitmapWriter { mut fields, all } = *self;
        for field in fields.values_mut() {
            field.wildcard = &all - &field.constrained;
            field.constrained = RoaringTreemap::new();
        }
        info!(fields = fields.len(), conjunctions = all.len(), "Compiled bitmap index");

        let scratch = Pool::new(core.settings.collector_pool_size * 2);
        Ok(Box::new(BitmapIndex {
            core,
            fields,
            all,
            scratch,
        }))
    }
}

/// Index evaluating each field as
/// `(OR include(values) | wildcard) - OR exclude(values)` and AND-ing the fields
///
/// Only fields stored in the `default` holder can be indexed this way.
#[derive(Debug)]
pub struct BitmapIndex {
    core: IndexCore,
    fields: BTreeMap<FieldId, BitmapField>,
    all: RoaringTreemap,
    scratch: Pool<RoaringTreemap>,
}

impl BitmapIndex {
    fn evaluate(
        &self,
        query: &HashMap<FieldId, (&FieldDesc, &Values)>,
        result: &mut RoaringTreemap,
        matched: &mut RoaringTreemap,
        options: &RetrieveOptions,
    ) -> Result<()> {
        *result |= &self.all;

        for (field_id, field) in &self.fields {
            matched.clear();
            *matched |= &field.wildcard;

            if let Some(&(desc, values)) = query.get(field_id) {
                match desc.parse_query(values) {
                    Ok(terms) => {
                        let value_ids: Vec<u64> =
                            terms.iter().filter_map(|t| field.dict.lookup(t)).collect();
                        for value_id in &value_ids {
                            if let Some(bitmap) = field.include.get(value_id) {
                                *matched |= bitmap;
                            }
                        }
                        for value_id in &value_ids {
                            if let Some(bitmap) = field.exclude.get(value_id) {
                                *matched -= bitmap;
                            }
                        }
                        if options.dump_entries {
                            debug!(field = %desc.name, values = value_ids.len(), candidates = matched.len(), "Evaluated field bitmap");
                        }
                    }
                    Err(err) => self.core.tolerate_query_error(err)?,
                }
            }

            *result &= &*matched;
            if result.is_empty() {
                break;
            }
        }
        Ok(())
    }
}

impl BooleanIndex for BitmapIndex {
    fn layout(&self) -> IndexLayout {
        IndexLayout::Bitmap
    }

    fn retrieve_with_collector(
        &self,
        assignments: &Assignments,
        collector: &mut dyn ResultCollector,
        options: &RetrieveOptions,
    ) -> Result<()> {
        self.core.observe(self.layout(), || {
            let query = self.core.query_fields(assignments);
            let mut result = self.scratch.acquire();
            let mut matched = self.scratch.acquire();

            let outcome = self.evaluate(&query, &mut result, &mut matched, options);
            if outcome.is_ok() {
                for raw in result.iter() {
                    let id = BitmapConjunctionId::from_u64(raw);
                    collector.add(id.doc_id(), id.index());
                }
            }

            self.scratch.release(result);
            self.scratch.release(matched);
            outcome
        })
    }

    fn retrieve(&self, assignments: &Assignments, options: &RetrieveOptions) -> Result<Vec<DocId>> {
        self.core
            .collect_doc_ids(|collector| self.retrieve_with_collector(assignments, collector, options))
    }

    fn stats(&self) -> IndexStats {
        IndexStats {
            partitions: self.fields.len(),
            terms: self.fields.values().map(|f| f.dict.len()).sum(),
            entries: self.fields.values().map(|f| f.entries() as usize).sum(),
            ..self.core.stats(self.layout())
        }
    }
}
