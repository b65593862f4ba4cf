use serde::{Deserialize, Serialize};
use std::fmt;

use crate::ids::{EntryId, FieldValueKey};
use crate::parser::Term;

/// Holder-specific result of preparing one predicate
///
/// Produced without touching holder state, so a conjunction can be prepared in full
/// before any of it is committed. Payloads carry canonical terms rather than
/// holder-local ids and are stable across builds, which is what the caches store.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PreparedPayload {
    /// Parsed values for exact-match holders
    Terms(Vec<Term>),
    /// Distinct non-empty keywords
    Keywords(Vec<String>),
    /// Half-open `[l, r)` ranges plus single points
    ///
    /// Bounds are widened to `i128` so an open upper end (`i64::MAX + 1`) still
    /// contains `i64::MAX`.
    Ranges {
        ranges: Vec<(i128, i128)>,
        points: Vec<i64>,
    },
    /// Opaque bytes for custom holders
    Custom(Vec<u8>),
}

impl PreparedPayload {
    pub fn kind(&self) -> &'static str {
        match self {
            PreparedPayload::Terms(_) => "terms",
            PreparedPayload::Keywords(_) => "keywords",
            PreparedPayload::Ranges { .. } => "ranges",
            PreparedPayload::Custom(_) => "custom",
        }
    }

    /// True when the predicate indexes no term at all
    pub fn is_empty(&self) -> bool {
        match self {
            PreparedPayload::Terms(terms) => terms.is_empty(),
            PreparedPayload::Keywords(keywords) => keywords.is_empty(),
            PreparedPayload::Ranges { ranges, points } => ranges.is_empty() && points.is_empty(),
            PreparedPayload::Custom(bytes) => bytes.is_empty(),
        }
    }
}

/// Which term a posting list was found under, for diagnostics
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TermRef {
    Value(FieldValueKey),
    Keyword(u32),
    RangeNode(u32),
    Point(i64),
    Wildcard,
}

impl fmt::Display for TermRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TermRef::Value(key) => write!(f, "{}", key),
            TermRef::Keyword(idx) => write!(f, "keyword#{}", idx),
            TermRef::RangeNode(idx) => write!(f, "range_node#{}", idx),
            TermRef::Point(v) => write!(f, "point({})", v),
            TermRef::Wildcard => f.write_str("wildcard"),
        }
    }
}

/// One posting list matched by a query value
#[derive(Clone, Copy, Debug)]
pub struct MatchedEntries<'a> {
    pub term: TermRef,
    pub entries: &'a [EntryId],
}

impl<'a> MatchedEntries<'a> {
    pub fn new(term: TermRef, entries: &'a [EntryId]) -> Self {
        Self { term, entries }
    }
}
