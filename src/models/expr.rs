use serde::{Deserialize, Serialize};
use std::fmt;

use super::value::Values;

/// Comparison operator of a predicate
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Operator {
    /// Value membership (`in` / `not in`)
    #[default]
    Eq,
    /// Strictly greater than
    Gt,
    /// Strictly less than
    Lt,
    /// Inclusive `[lo, hi]`
    Between,
}

impl Operator {
    pub fn is_eq(&self) -> bool {
        matches!(self, Operator::Eq)
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Operator::Eq => "EQ",
            Operator::Gt => "GT",
            Operator::Lt => "LT",
            Operator::Between => "BETWEEN",
        };
        f.write_str(name)
    }
}

/// One field predicate; the field name is the key it is stored under
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BoolExpr {
    /// `true` for include (`in`, range) predicates, `false` for exclude (`not in`)
    #[serde(rename = "inc")]
    pub include: bool,
    pub value: Values,
    #[serde(default, skip_serializing_if = "Operator::is_eq")]
    pub operator: Operator,
}

impl BoolExpr {
    pub fn new(include: bool, value: impl Into<Values>) -> Self {
        Self {
            include,
            value: value.into(),
            operator: Operator::Eq,
        }
    }

    pub fn with_operator(mut self, operator: Operator) -> Self {
        self.operator = operator;
        self
    }
}
