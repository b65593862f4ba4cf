use std::collections::HashMap;

use super::{
    payload_mismatch, Entries, EntriesHolder, HolderFactory, HolderStats, MatchedEntries,
    PreparedPayload, SegmentTree, TermRef,
};
use crate::error::{IndexerError, Result};
use crate::ids::EntryId;
use crate::index::FieldDesc;
use crate::models::{BoolExpr, Operator, Values};

pub const RANGE_HOLDER: &str = "range";

/// Exclusive upper bound of ranges open to the right
const OPEN_END: i128 = i64::MAX as i128 + 1;

/// Numeric holder answering both exact points and GT / LT / BETWEEN ranges
#[derive(Debug, Default)]
pub struct RangeHolder {
    points: HashMap<i64, Entries>,
    pending: Vec<(i128, i128, EntryId)>,
    tree: SegmentTree,
    compiled: bool,
}

impl RangeHolder {
    pub fn new() -> Self {
        Self::default()
    }
}

impl EntriesHolder for RangeHolder {
    fn reserve(&mut self, _desc: &FieldDesc, payload: &PreparedPayload) -> Result<()> {
        if self.compiled {
            return Err(IndexerError::Internal("range holder already compiled".to_string()));
        }
        match payload {
            PreparedPayload::Ranges { .. } => Ok(()),
            other => Err(payload_mismatch(RANGE_HOLDER, other)),
        }
    }

    fn commit(&mut self, _desc: &FieldDesc, payload: &PreparedPayload, entry: EntryId) -> Result<()> {
        if self.compiled {
            return Err(IndexerError::Internal("range holder already compiled".to_string()));
        }
        let PreparedPayload::Ranges { ranges, points } = payload else {
            return Err(payload_mismatch(RANGE_HOLDER, payload));
        };

        let mut points = points.clone();
        points.sort_unstable();
        points.dedup();
        for point in points {
            self.points.entry(point).or_default().push(entry);
        }
        self.pending
            .extend(ranges.iter().filter(|(l, r)| l < r).map(|&(l, r)| (l, r, entry)));
        Ok(())
    }

    fn compile(&mut self) -> Result<()> {
        if self.compiled {
            return Ok(());
        }
        for plist in self.points.values_mut() {
            plist.compile();
        }
        self.tree = SegmentTree::build(&self.pending);
        self.pending = Vec::new();
        self.compiled = true;
        Ok(())
    }

    fn is_compiled(&self) -> bool {
        self.compiled
    }

    fn get_entries<'a>(&'a self, desc: &FieldDesc, values: &Values) -> Result<Vec<MatchedEntries<'a>>> {
        if !self.compiled {
            return Err(IndexerError::NotCompiled("range holder"));
        }

        let mut matched = Vec::new();
        for term in desc.parse_query(values)? {
            let x = term.as_i64().ok_or_else(|| IndexerError::QueryParse {
                field: desc.name.clone(),
                reason: format!("{} is not an integer", term),
            })?;
            if let Some(plist) = self.points.get(&x) {
                matched.push(MatchedEntries::new(TermRef::Point(x), plist.as_slice()));
            }
            for (node, plist) in self.tree.stab(x) {
                matched.push(MatchedEntries::new(TermRef::RangeNode(node as u32), plist.as_slice()));
            }
        }
        Ok(matched)
    }

    fn stats(&self) -> HolderStats {
        HolderStats {
            terms: self.points.len() + self.tree.node_count(),
            entries: self.points.values().map(Entries::len).sum::<usize>()
                + self.tree.entry_count()
                + self.pending.len(),
        }
    }
}

/// Creates [`RangeHolder`]s
///
/// Ranges covering at most `expand_threshold` integers are indexed as points.
#[derive(Debug, Clone, Copy)]
pub struct RangeHolderFactory {
    expand_threshold: i64,
}

impl RangeHolderFactory {
    pub fn new(expand_threshold: i64) -> Self {
        Self { expand_threshold }
    }

    fn integers(desc: &FieldDesc, expr: &BoolExpr) -> Result<Vec<i64>> {
        expr.value
            .iter()
            .map(|v| {
                v.as_i64().ok_or_else(|| IndexerError::ValueParse {
                    field: desc.name.clone(),
                    reason: format!("'{}' is not an integer", v),
                })
            })
            .collect()
    }

    fn single(desc: &FieldDesc, expr: &BoolExpr) -> Result<i64> {
        match Self::integers(desc, expr)?.as_slice() {
            [v] => Ok(*v),
            other => Err(IndexerError::InvalidRange {
                field: desc.name.clone(),
                reason: format!("{} expects one bound, got {}", expr.operator, other.len()),
            }),
        }
    }

    /// Half-open `[l, r)` for a range operator; `None` when nothing can match
    ///
    /// The upper end may be `i64::MAX + 1`, hence `i128`.
    fn bounds(desc: &FieldDesc, expr: &BoolExpr) -> Result<Option<(i128, i128)>> {
        let bounds = match expr.operator {
            Operator::Gt => {
                let l = i128::from(Self::single(desc, expr)?) + 1;
                Some((l, OPEN_END))
            }
            Operator::Lt => Some((i128::from(i64::MIN), i128::from(Self::single(desc, expr)?))),
            Operator::Between => match Self::integers(desc, expr)?.as_slice() {
                [lo, hi] if lo <= hi => Some((i128::from(*lo), i128::from(*hi) + 1)),
                [lo, hi] => {
                    return Err(IndexerError::InvalidRange {
                        field: desc.name.clone(),
                        reason: format!("lower bound {} exceeds upper bound {}", lo, hi),
                    })
                }
                other => {
                    return Err(IndexerError::InvalidRange {
                        field: desc.name.clone(),
                        reason: format!("BETWEEN expects two bounds, got {}", other.len()),
                    })
                }
            },
            Operator::Eq => None,
        };
        Ok(bounds.filter(|(l, r)| l < r))
    }
}

impl HolderFactory for RangeHolderFactory {
    fn name(&self) -> &str {
        RANGE_HOLDER
    }

    fn prepare(&self, desc: &FieldDesc, expr: &BoolExpr) -> Result<PreparedPayload> {
        if expr.operator.is_eq() {
            let points = desc
                .parse_values(&expr.value)?
                .iter()
                .map(|term| {
                    term.as_i64().ok_or_else(|| IndexerError::ValueParse {
                        field: desc.name.clone(),
                        reason: format!("{} is not an integer", term),
                    })
                })
                .collect::<Result<Vec<_>>>()?;
            return Ok(PreparedPayload::Ranges {
                ranges: Vec::new(),
                points,
            });
        }

        let (ranges, points) = match Self::bounds(desc, expr)? {
            Some((l, r)) if r - l <= i128::from(self.expand_threshold) => {
                let points = (l..r).filter_map(|v| i64::try_from(v).ok()).collect();
                (Vec::new(), points)
            }
            Some(range) => (vec![range], Vec::new()),
            None => (Vec::new(), Vec::new()),
        };
        Ok(PreparedPayload::Ranges { ranges, points })
    }

    fn create(&self) -> Box<dyn EntriesHolder> {
        Box::new(RangeHolder::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FieldOption;
    use crate::holder::test_support::field;
    use crate::ids::ConjunctionId;

    fn entry(doc: u32) -> EntryId {
        EntryId::new(ConjunctionId::new(doc, 0, 1).unwrap(), true)
    }

    fn matched_docs(holder: &dyn EntriesHolder, desc: &FieldDesc, x: i64) -> Vec<u32> {
        let mut docs: Vec<u32> = holder
            .get_entries(desc, &Values::from(x))
            .unwrap()
            .iter()
            .flat_map(|m| m.entries.iter().map(|e| e.conjunction().doc_id()))
            .collect();
        docs.sort_unstable();
        docs.dedup();
        docs
    }

    #[test]
    fn test_ranges_committed_directly() {
        let desc = field("age", FieldOption::range());
        let mut holder = RangeHolder::new();
        for (doc, l, r) in [(1, 18, 65), (2, 25, 35), (3, 60, 100)] {
            let payload = PreparedPayload::Ranges {
                ranges: vec![(l, r)],
                points: Vec::new(),
            };
            holder.commit(&desc, &payload, entry(doc)).unwrap();
        }
        holder.compile().unwrap();

        assert_eq!(matched_docs(&holder, &desc, 30), vec![1, 2]);
        assert_eq!(matched_docs(&holder, &desc, 70), vec![3]);
        assert!(matched_docs(&holder, &desc, 10).is_empty());
    }

    #[test]
    fn test_prepare_operators() {
        let desc = field("age", FieldOption::range());
        let factory = RangeHolderFactory::new(4);

        let gt = BoolExpr::new(true, 60).with_operator(Operator::Gt);
        assert_eq!(
            factory.prepare(&desc, &gt).unwrap(),
            PreparedPayload::Ranges {
                ranges: vec![(61, OPEN_END)],
                points: vec![]
            }
        );

        let lt = BoolExpr::new(true, 18).with_operator(Operator::Lt);
        assert_eq!(
            factory.prepare(&desc, &lt).unwrap(),
            PreparedPayload::Ranges {
                ranges: vec![(i128::from(i64::MIN), 18)],
                points: vec![]
            }
        );

        let small = BoolExpr::new(true, vec![3, 5]).with_operator(Operator::Between);
        assert_eq!(
            factory.prepare(&desc, &small).unwrap(),
            PreparedPayload::Ranges {
                ranges: vec![],
                points: vec![3, 4, 5]
            }
        );

        let eq = BoolExpr::new(true, vec![7, 7, 9]);
        assert_eq!(
            factory.prepare(&desc, &eq).unwrap(),
            PreparedPayload::Ranges {
                ranges: vec![],
                points: vec![7, 9]
            }
        );
    }

    #[test]
    fn test_invalid_ranges() {
        let desc = field("age", FieldOption::range());
        let factory = RangeHolderFactory::new(0);

        let inverted = BoolExpr::new(true, vec![10, 5]).with_operator(Operator::Between);
        assert!(matches!(
            factory.prepare(&desc, &inverted),
            Err(IndexerError::InvalidRange { .. })
        ));

        let two_bounds = BoolExpr::new(true, vec![1, 2]).with_operator(Operator::Gt);
        assert!(matches!(
            factory.prepare(&desc, &two_bounds),
            Err(IndexerError::InvalidRange { .. })
        ));

        let text = BoolExpr::new(true, "old").with_operator(Operator::Lt);
        assert!(matches!(
            factory.prepare(&desc, &text),
            Err(IndexerError::ValueParse { .. })
        ));

        let never = BoolExpr::new(true, i64::MAX).with_operator(Operator::Gt);
        assert!(factory.prepare(&desc, &never).unwrap().is_empty());
    }

    #[test]
    fn test_points_and_ranges_together() {
        let desc = field("score", FieldOption::range());
        let factory = RangeHolderFactory::new(2);
        let mut holder = factory.create();

        let exprs = [
            (1, BoolExpr::new(true, 50)),
            (2, BoolExpr::new(true, vec![40, 60]).with_operator(Operator::Between)),
            (3, BoolExpr::new(true, vec![49, 50]).with_operator(Operator::Between)),
        ];
        for (doc, expr) in &exprs {
            let payload = factory.prepare(&desc, expr).unwrap();
            holder.commit(&desc, &payload, entry(*doc)).unwrap();
        }
        holder.compile().unwrap();

        assert_eq!(matched_docs(holder.as_ref(), &desc, 50), vec![1, 2, 3]);
        assert_eq!(matched_docs(holder.as_ref(), &desc, 60), vec![2]);
        assert!(matched_docs(holder.as_ref(), &desc, 61).is_empty());
    }

    #[test]
    fn test_open_ranges_reach_integer_limits() {
        let desc = field("age", FieldOption::range());
        let factory = RangeHolderFactory::new(0);
        let mut holder = factory.create();

        let exprs = [
            (1, BoolExpr::new(true, 100).with_operator(Operator::Gt)),
            (2, BoolExpr::new(true, vec![0, i64::MAX]).with_operator(Operator::Between)),
            (3, BoolExpr::new(true, -100).with_operator(Operator::Lt)),
            (4, BoolExpr::new(true, vec![i64::MIN, 0]).with_operator(Operator::Between)),
        ];
        for (doc, expr) in &exprs {
            let payload = factory.prepare(&desc, expr).unwrap();
            holder.commit(&desc, &payload, entry(*doc)).unwrap();
        }
        holder.compile().unwrap();

        assert_eq!(matched_docs(holder.as_ref(), &desc, i64::MAX), vec![1, 2]);
        assert_eq!(matched_docs(holder.as_ref(), &desc, i64::MIN), vec![3, 4]);
        assert_eq!(matched_docs(holder.as_ref(), &desc, 0), vec![2, 4]);
        assert_eq!(matched_docs(holder.as_ref(), &desc, 100), vec![2]);
    }

    #[test]
    fn test_compile_twice_keeps_entries() {
        let desc = field("age", FieldOption::range());
        let factory = RangeHolderFactory::new(0);
        let mut holder = factory.create();

        let gt = BoolExpr::new(true, 10).with_operator(Operator::Gt);
        let eq = BoolExpr::new(true, 50);
        holder.commit(&desc, &factory.prepare(&desc, &gt).unwrap(), entry(1)).unwrap();
        holder.commit(&desc, &factory.prepare(&desc, &eq).unwrap(), entry(2)).unwrap();
        holder.compile().unwrap();
        let before = holder.stats();

        holder.compile().unwrap();
        assert!(holder.is_compiled());
        assert_eq!(holder.stats(), before);
        assert_eq!(matched_docs(holder.as_ref(), &desc, 50), vec![1, 2]);
    }
}
