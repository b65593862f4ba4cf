//! Every layout must agree with a direct evaluation of the DNF semantics

use be_indexer::{
    Assignments, BoolExpr, Conjunction, Document, FieldOption, IndexBuilder, IndexLayout,
    IndexerSettings, Operator, RetrieveOptions,
};
use proptest::prelude::*;
use std::collections::BTreeMap;

type RawConjunction = BTreeMap<usize, (bool, Vec<i64>)>;
type RawQuery = BTreeMap<usize, Vec<i64>>;

fn field(idx: usize) -> String {
    format!("f{}", idx)
}

fn conjunction_strategy() -> impl Strategy<Value = RawConjunction> {
    prop::collection::btree_map(
        0..4usize,
        (any::<bool>(), prop::collection::vec(0..6i64, 1..4)),
        0..4,
    )
}

fn docs_strategy() -> impl Strategy<Value = Vec<Vec<RawConjunction>>> {
    prop::collection::vec(prop::collection::vec(conjunction_strategy(), 0..4), 0..25)
}

fn query_strategy() -> impl Strategy<Value = RawQuery> {
    prop::collection::btree_map(0..5usize, prop::collection::vec(0..6i64, 1..3), 0..5)
}

fn to_documents(raw: &[Vec<RawConjunction>]) -> Vec<Document> {
    raw.iter()
        .enumerate()
        .map(|(id, conjs)| {
            conjs.iter().fold(Document::new(id as u32), |doc, exprs| {
                let conj = exprs.iter().fold(Conjunction::new(), |conj, (f, (inc, values))| {
                    conj.with_expr(field(*f), BoolExpr::new(*inc, values.clone()))
                        .unwrap()
                });
                doc.with_conjunction(conj).unwrap()
            })
        })
        .collect()
}

fn to_assignments(raw: &RawQuery) -> Assignments {
    raw.iter().fold(Assignments::new(), |q, (f, values)| {
        q.with(field(*f), values.clone())
    })
}

/// Reference evaluation straight from the definition
fn expected(raw: &[Vec<RawConjunction>], query: &RawQuery) -> Vec<u32> {
    raw.iter()
        .enumerate()
        .filter(|(_, conjs)| {
            conjs.iter().any(|exprs| {
                exprs.iter().all(|(f, (inc, values))| {
                    let hit = query
                        .get(f)
                        .map_or(false, |q| q.iter().any(|v| values.contains(v)));
                    hit == *inc
                })
            })
        })
        .map(|(id, _)| id as u32)
        .collect()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn layouts_match_reference(raw in docs_strategy(), queries in prop::collection::vec(query_strategy(), 1..6)) {
        let docs = to_documents(&raw);
        for layout in [IndexLayout::SizeGrouped, IndexLayout::Compacted, IndexLayout::Bitmap] {
            let mut builder = IndexBuilder::new(IndexerSettings::default().with_layout(layout));
            builder.add_documents(&docs).unwrap();
            let index = builder.build().unwrap();

            for query in &queries {
                let got = index
                    .retrieve(&to_assignments(query), &RetrieveOptions::default())
                    .unwrap();
                prop_assert_eq!(got, expected(&raw, query), "layout {:?}, query {:?}", layout, query);
            }
        }
    }
}

/// Predicate on a range field
#[derive(Clone, Debug)]
enum RangePredicate {
    Eq(Vec<i64>),
    Gt(i64),
    Lt(i64),
    Between(i64, i64),
}

impl RangePredicate {
    fn matches(&self, v: i64) -> bool {
        match self {
            RangePredicate::Eq(values) => values.contains(&v),
            RangePredicate::Gt(bound) => v > *bound,
            RangePredicate::Lt(bound) => v < *bound,
            RangePredicate::Between(lo, hi) => *lo <= v && v <= *hi,
        }
    }

    fn to_expr(&self, include: bool) -> BoolExpr {
        match self {
            RangePredicate::Eq(values) => BoolExpr::new(include, values.clone()),
            RangePredicate::Gt(bound) => BoolExpr::new(include, *bound).with_operator(Operator::Gt),
            RangePredicate::Lt(bound) => BoolExpr::new(include, *bound).with_operator(Operator::Lt),
            RangePredicate::Between(lo, hi) => {
                BoolExpr::new(include, vec![*lo, *hi]).with_operator(Operator::Between)
            }
        }
    }
}

type RawRangeConjunction = BTreeMap<usize, (bool, RangePredicate)>;

fn range_field(idx: usize) -> String {
    format!("r{}", idx)
}

fn range_predicate_strategy() -> impl Strategy<Value = RangePredicate> {
    prop_oneof![
        prop::collection::vec(-5..35i64, 1..4).prop_map(RangePredicate::Eq),
        (-5..35i64).prop_map(RangePredicate::Gt),
        (-5..35i64).prop_map(RangePredicate::Lt),
        (-5..35i64, 0..20i64).prop_map(|(lo, len)| RangePredicate::Between(lo, lo + len)),
    ]
}

fn range_docs_strategy() -> impl Strategy<Value = Vec<Vec<RawRangeConjunction>>> {
    let conjunction = prop::collection::btree_map(
        0..3usize,
        (any::<bool>(), range_predicate_strategy()),
        0..3,
    );
    prop::collection::vec(prop::collection::vec(conjunction, 0..3), 0..25)
}

fn range_query_strategy() -> impl Strategy<Value = RawQuery> {
    prop::collection::btree_map(0..4usize, prop::collection::vec(-8..40i64, 1..3), 0..4)
}

fn range_expected(raw: &[Vec<RawRangeConjunction>], query: &RawQuery) -> Vec<u32> {
    raw.iter()
        .enumerate()
        .filter(|(_, conjs)| {
            conjs.iter().any(|preds| {
                preds.iter().all(|(f, (inc, pred))| {
                    let hit = query
                        .get(f)
                        .map_or(false, |q| q.iter().any(|v| pred.matches(*v)));
                    hit == *inc
                })
            })
        })
        .map(|(id, _)| id as u32)
        .collect()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn range_fields_match_reference(
        raw in range_docs_strategy(),
        queries in prop::collection::vec(range_query_strategy(), 1..6),
        threshold in 0..6i64,
    ) {
        let docs: Vec<Document> = raw
            .iter()
            .enumerate()
            .map(|(id, conjs)| {
                conjs.iter().fold(Document::new(id as u32), |doc, preds| {
                    let conj = preds.iter().fold(Conjunction::new(), |conj, (f, (inc, pred))| {
                        conj.with_expr(range_field(*f), pred.to_expr(*inc)).unwrap()
                    });
                    doc.with_conjunction(conj).unwrap()
                })
            })
            .collect();

        for layout in [IndexLayout::SizeGrouped, IndexLayout::Compacted] {
            let settings = IndexerSettings::default()
                .with_layout(layout)
                .with_range_expand_threshold(threshold);
            let mut builder = IndexBuilder::new(settings);
            for f in 0..3 {
                builder.configure_field(&range_field(f), FieldOption::range()).unwrap();
            }
            builder.add_documents(&docs).unwrap();
            let index = builder.build().unwrap();

            for query in queries.iter() {
                let assignments = query.iter().fold(Assignments::new(), |q, (f, values)| {
                    q.with(range_field(*f), values.clone())
                });
                let got = index.retrieve(&assignments, &RetrieveOptions::default()).unwrap();
                prop_assert_eq!(
                    got,
                    range_expected(&raw, query),
                    "layout {:?}, threshold {}, query {:?}",
                    layout,
                    threshold,
                    query
                );
            }
        }
    }
}
