use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::expr::{BoolExpr, Operator};
use super::value::{Value, Values};
use crate::error::{IndexerError, Result};
use crate::ids::{ConjunctionId, DocId, MAX_CONJUNCTION_INDEX};

/// AND-group of field predicates, at most one per field
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Conjunction {
    #[serde(default)]
    exprs: BTreeMap<String, BoolExpr>,
}

impl Conjunction {
    pub fn new() -> Self {
        Self::default()
    }

    /// Field value must be one of `values`
    pub fn include(self, field: impl Into<String>, values: impl Into<Values>) -> Result<Self> {
        self.with_expr(field, BoolExpr::new(true, values))
    }

    /// Field value must not be any of `values`
    pub fn exclude(self, field: impl Into<String>, values: impl Into<Values>) -> Result<Self> {
        self.with_expr(field, BoolExpr::new(false, values))
    }

    pub fn greater_than(self, field: impl Into<String>, value: i64) -> Result<Self> {
        self.with_expr(field, BoolExpr::new(true, value).with_operator(Operator::Gt))
    }

    pub fn less_than(self, field: impl Into<String>, value: i64) -> Result<Self> {
        self.with_expr(field, BoolExpr::new(true, value).with_operator(Operator::Lt))
    }

    /// Inclusive on both ends
    pub fn between(self, field: impl Into<String>, lo: i64, hi: i64) -> Result<Self> {
        let values = Values::from(vec![Value::Int(lo), Value::Int(hi)]);
        self.with_expr(field, BoolExpr::new(true, values).with_operator(Operator::Between))
    }

    /// Add a predicate; a second predicate on the same field is rejected
    pub fn with_expr(mut self, field: impl Into<String>, expr: BoolExpr) -> Result<Self> {
        let field = field.into();
        if self.exprs.contains_key(&field) {
            return Err(IndexerError::DuplicateField { field });
        }
        self.exprs.insert(field, expr);
        Ok(self)
    }

    /// Number of include predicates
    pub fn size(&self) -> usize {
        self.exprs.values().filter(|e| e.include).count()
    }

    pub fn exprs(&self) -> impl Iterator<Item = (&str, &BoolExpr)> {
        self.exprs.iter().map(|(field, expr)| (field.as_str(), expr))
    }

    pub fn expr(&self, field: &str) -> Option<&BoolExpr> {
        self.exprs.get(field)
    }

    pub fn len(&self) -> usize {
        self.exprs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.exprs.is_empty()
    }
}

/// One indexable item: matches when any of its conjunctions matches
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: DocId,
    /// Cache version; 0 disables cache reuse for this document
    #[serde(default, skip_serializing_if = "is_zero")]
    pub version: u64,
    #[serde(default)]
    cons: Vec<Conjunction>,
}

fn is_zero(v: &u64) -> bool {
    *v == 0
}

impl Document {
    pub fn new(id: DocId) -> Self {
        Self {
            id,
            version: 0,
            cons: Vec::new(),
        }
    }

    pub fn with_version(mut self, version: u64) -> Self {
        self.version = version;
        self
    }

    pub fn add_conjunction(&mut self, conj: Conjunction) -> Result<&mut Self> {
        if self.cons.len() > MAX_CONJUNCTION_INDEX {
            return Err(IndexerError::ConjunctionIndexOverflow(self.cons.len()));
        }
        self.cons.push(conj);
        Ok(self)
    }

    /// Builder-style variant of `add_conjunction`
    pub fn with_conjunction(mut self, conj: Conjunction) -> Result<Self> {
        self.add_conjunction(conj)?;
        Ok(self)
    }

    pub fn conjunctions(&self) -> &[Conjunction] {
        &self.cons
    }

    /// Packed ids of every conjunction, in positional order
    pub fn conjunction_ids(&self) -> Result<Vec<ConjunctionId>> {
        self.cons
            .iter()
            .enumerate()
            .map(|(idx, conj)| ConjunctionId::new(self.id, idx, conj.size()))
            .collect()
    }

    pub fn from_json(input: &str) -> Result<Self> {
        Ok(serde_json::from_str(input)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Parse documents from either a JSON array or JSON lines
pub fn parse_documents(input: &str) -> Result<Vec<Document>> {
    let trimmed = input.trim_start();
    if trimmed.starts_with('[') {
        return Ok(serde_json::from_str(trimmed)?);
    }

    trimmed
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(Document::from_json)
        .collect()
}
