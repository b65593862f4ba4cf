use std::collections::HashMap;

use super::{
    payload_mismatch, unsupported_operator, Entries, EntriesHolder, HolderFactory, HolderStats,
    MatchedEntries, PreparedPayload, TermRef,
};
use crate::error::{IndexerError, Result};
use crate::ids::{EntryId, FieldValueKey};
use crate::index::FieldDesc;
use crate::models::{BoolExpr, Values};
use crate::parser::ValueDictionary;

pub const DEFAULT_HOLDER: &str = "default";

/// Exact-match holder: parsed value -> value id -> posting list
#[derive(Debug, Default)]
pub struct DefaultHolder {
    dict: ValueDictionary,
    plists: HashMap<FieldValueKey, Entries>,
    compiled: bool,
}

impl DefaultHolder {
    pub fn new() -> Self {
        Self::default()
    }
}

impl EntriesHolder for DefaultHolder {
    fn reserve(&mut self, _desc: &FieldDesc, payload: &PreparedPayload) -> Result<()> {
        if self.compiled {
            return Err(IndexerError::Internal("default holder already compiled".to_string()));
        }
        let PreparedPayload::Terms(terms) = payload else {
            return Err(payload_mismatch(DEFAULT_HOLDER, payload));
        };
        for term in terms {
            self.dict.intern(term)?;
        }
        Ok(())
    }

    fn commit(&mut self, desc: &FieldDesc, payload: &PreparedPayload, entry: EntryId) -> Result<()> {
        if self.compiled {
            return Err(IndexerError::Internal("default holder already compiled".to_string()));
        }
        let PreparedPayload::Terms(terms) = payload else {
            return Err(payload_mismatch(DEFAULT_HOLDER, payload));
        };

        let mut keys = terms
            .iter()
            .map(|term| FieldValueKey::new(desc.id, self.dict.intern(term)?))
            .collect::<Result<Vec<_>>>()?;
        keys.sort_unstable();
        keys.dedup();

        for key in keys {
            self.plists.entry(key).or_default().push(entry);
        }
        Ok(())
    }

    fn compile(&mut self) -> Result<()> {
        for plist in self.plists.values_mut() {
            plist.compile();
        }
        self.compiled = true;
        Ok(())
    }

    fn is_compiled(&self) -> bool {
        self.compiled
    }

    fn get_entries<'a>(&'a self, desc: &FieldDesc, values: &Values) -> Result<Vec<MatchedEntries<'a>>> {
        if !self.compiled {
            return Err(IndexerError::NotCompiled("default holder"));
        }
        let terms = desc.parse_query(values)?;

        let matched = terms
            .iter()
            .filter_map(|term| self.dict.lookup(term))
            .filter_map(|value_id| {
                let key = FieldValueKey::new(desc.id, value_id).ok()?;
                self.plists
                    .get(&key)
                    .map(|plist| MatchedEntries::new(TermRef::Value(key), plist.as_slice()))
            })
            .collect();
        Ok(matched)
    }

    fn stats(&self) -> HolderStats {
        HolderStats {
            terms: self.plists.len(),
            entries: self.plists.values().map(Entries::len).sum(),
        }
    }
}

/// Creates [`DefaultHolder`]s; supports the EQ operator only
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultHolderFactory;

impl HolderFactory for DefaultHolderFactory {
    fn name(&self) -> &str {
        DEFAULT_HOLDER
    }

    fn prepare(&self, desc: &FieldDesc, expr: &BoolExpr) -> Result<PreparedPayload> {
        if !expr.operator.is_eq() {
            return Err(unsupported_operator(desc, DEFAULT_HOLDER, expr));
        }
        Ok(PreparedPayload::Terms(desc.parse_values(&expr.value)?))
    }

    fn create(&self) -> Box<dyn EntriesHolder> {
        Box::new(DefaultHolder::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FieldOption;
    use crate::holder::test_support::field;
    use crate::ids::{ConjunctionId, MAX_VALUE_ID};
    use crate::models::Operator;
    use crate::parser::Term;

    fn entry(doc: u32, include: bool) -> EntryId {
        EntryId::new(ConjunctionId::new(doc, 0, 1).unwrap(), include)
    }

    #[test]
    fn test_commit_and_query() {
        let desc = field("city", FieldOption::default());
        let factory = DefaultHolderFactory;
        let mut holder = factory.create();

        let payload = factory
            .prepare(&desc, &BoolExpr::new(true, vec!["bj", "sh", "bj"]))
            .unwrap();
        holder.commit(&desc, &payload, entry(2, true)).unwrap();
        let payload = factory.prepare(&desc, &BoolExpr::new(false, "bj")).unwrap();
        holder.commit(&desc, &payload, entry(1, false)).unwrap();
        holder.compile().unwrap();

        let matched = holder.get_entries(&desc, &Values::from("bj")).unwrap();
        assert_eq!(matched.len(), 1);
        assert_eq!(matched[0].entries, &[entry(1, false), entry(2, true)]);

        let matched = holder
            .get_entries(&desc, &Values::from(vec!["sh", "gz"]))
            .unwrap();
        assert_eq!(matched.len(), 1);
        assert_eq!(matched[0].entries, &[entry(2, true)]);

        assert_eq!(holder.stats(), HolderStats { terms: 2, entries: 3 });
    }

    #[test]
    fn test_reserve_surfaces_value_id_overflow() {
        let desc = field("city", FieldOption::default());
        let mut holder = DefaultHolder {
            dict: ValueDictionary::with_next_id(MAX_VALUE_ID),
            ..DefaultHolder::default()
        };

        let two = PreparedPayload::Terms(vec![Term::Str("bj".into()), Term::Str("sh".into())]);
        assert!(matches!(
            holder.reserve(&desc, &two),
            Err(IndexerError::ValueIdOverflow(_))
        ));
        assert_eq!(holder.stats().entries, 0);

        // the id handed out before the overflow stays usable
        let one = PreparedPayload::Terms(vec![Term::Str("bj".into())]);
        holder.reserve(&desc, &one).unwrap();
        holder.commit(&desc, &one, entry(1, true)).unwrap();
        holder.compile().unwrap();
        assert_eq!(holder.get_entries(&desc, &Values::from("bj")).unwrap().len(), 1);
    }

    #[test]
    fn test_query_before_compile() {
        let desc = field("city", FieldOption::default());
        let holder = DefaultHolder::new();
        assert!(matches!(
            holder.get_entries(&desc, &Values::from("bj")),
            Err(IndexerError::NotCompiled(_))
        ));
    }

    #[test]
    fn test_rejects_range_operator() {
        let desc = field("age", FieldOption::default());
        let expr = BoolExpr::new(true, 18).with_operator(Operator::Gt);
        assert!(matches!(
            DefaultHolderFactory.prepare(&desc, &expr),
            Err(IndexerError::UnsupportedOperator { .. })
        ));
    }

    #[test]
    fn test_value_parse_failure() {
        let desc = field("age", FieldOption::new("default", "number"));
        let result = DefaultHolderFactory.prepare(&desc, &BoolExpr::new(true, "old"));
        assert!(matches!(result, Err(IndexerError::ValueParse { .. })));
    }
}
