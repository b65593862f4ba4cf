use serde::{Deserialize, Serialize};
use std::fmt;

use crate::models::value::float_to_i64;
use crate::models::{Value, Values};

/// Canonical form of one parsed value
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Term {
    Int(i64),
    Str(String),
}

impl Term {
    /// Integer view, parsing string terms when they hold a number
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Term::Int(v) => Some(*v),
            Term::Str(s) => s.trim().parse().ok(),
        }
    }

    /// String view, formatting integers
    pub fn to_keyword(&self) -> String {
        match self {
            Term::Int(v) => v.to_string(),
            Term::Str(s) => s.clone(),
        }
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Term::Int(v) => write!(f, "{}", v),
            Term::Str(s) => write!(f, "{:?}", s),
        }
    }
}

/// Converts raw values into canonical terms
///
/// The same parser reads indexing-time predicate values and query-time assignment
/// values, so both sides agree on term identity. Returned terms are sorted and
/// deduplicated. The error is a human readable reason; callers attach the field.
pub trait ValueParser: Send + Sync + fmt::Debug {
    fn name(&self) -> &str;

    fn parse(&self, values: &Values) -> Result<Vec<Term>, String>;
}

fn finish(mut terms: Vec<Term>) -> Vec<Term> {
    terms.sort_unstable();
    terms.dedup();
    terms
}

/// Integers stay integers, everything else becomes a string term
#[derive(Debug, Default, Clone, Copy)]
pub struct CommonParser;

impl ValueParser for CommonParser {
    fn name(&self) -> &str {
        "common"
    }

    fn parse(&self, values: &Values) -> Result<Vec<Term>, String> {
        let terms = values
            .iter()
            .map(|v| match v {
                Value::Int(i) => Term::Int(*i),
                Value::Float(f) => float_to_i64(*f).map_or_else(|| Term::Str(v.to_string()), Term::Int),
                other => Term::Str(other.to_string()),
            })
            .collect();
        Ok(finish(terms))
    }
}

/// Accepts integers only (numeric strings included)
#[derive(Debug, Default, Clone, Copy)]
pub struct NumberParser;

impl ValueParser for NumberParser {
    fn name(&self) -> &str {
        "number"
    }

    fn parse(&self, values: &Values) -> Result<Vec<Term>, String> {
        let terms = values
            .iter()
            .map(|v| {
                v.as_i64()
                    .map(Term::Int)
                    .ok_or_else(|| format!("'{}' is not an integer", v))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(finish(terms))
    }
}

/// Every value is taken by its string form
#[derive(Debug, Default, Clone, Copy)]
pub struct StringParser;

impl ValueParser for StringParser {
    fn name(&self) -> &str {
        "string"
    }

    fn parse(&self, values: &Values) -> Result<Vec<Term>, String> {
        let terms = values.iter().map(|v| Term::Str(v.to_string())).collect();
        Ok(finish(terms))
    }
}
