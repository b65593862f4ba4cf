use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::Result;
use crate::holder::PreparedPayload;
use crate::ids::ConjunctionId;
use crate::index::FieldDesc;
use crate::models::Conjunction;

/// One predicate after its holder prepared it
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreparedPredicate {
    /// Field name; ids are per-build and not stable across builders
    pub field: String,
    pub include: bool,
    pub payload: PreparedPayload,
}

/// A conjunction whose every predicate prepared successfully
///
/// Nothing is committed until a whole conjunction reaches this state, so a failing
/// predicate never leaves its siblings half-indexed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreparedConjunction {
    pub id: ConjunctionId,
    pub predicates: Vec<PreparedPredicate>,
}

impl PreparedConjunction {
    /// Prepare every predicate of `conj`; `resolve` maps a field name to its descriptor
    pub fn prepare(
        id: ConjunctionId,
        conj: &Conjunction,
        mut resolve: impl FnMut(&str) -> Result<Arc<FieldDesc>>,
    ) -> Result<Self> {
        let predicates = conj
            .exprs()
            .map(|(field, expr)| {
                let desc = resolve(field)?;
                let payload = desc.holder.prepare(&desc, expr)?;
                Ok(PreparedPredicate {
                    field: field.to_string(),
                    include: expr.include,
                    payload,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { id, predicates })
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(bincode::serialize(self)?)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        Ok(bincode::deserialize(bytes)?)
    }
}
