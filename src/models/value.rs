use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A single raw predicate or query value
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// 64-bit integer
    Int(i64),
    /// 64-bit floating point
    Float(f64),
    /// String (keywords, categorical values)
    Str(String),
    /// Boolean flag
    Bool(bool),
}

impl Value {
    /// Convert to i64 if the value is integral
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(v) => Some(*v),
            Value::Float(v) => float_to_i64(*v),
            Value::Str(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }
}

/// Exact integer value of `v`, `None` when it has a fraction or lies outside `i64`
pub(crate) fn float_to_i64(v: f64) -> Option<i64> {
    // 2^63 is exactly representable; i64::MAX is not
    const LIMIT: f64 = 9_223_372_036_854_775_808.0;
    if v.fract() != 0.0 || !(-LIMIT..LIMIT).contains(&v) {
        return None;
    }
    Some(v as i64)
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(v) => write!(f, "{}", v),
            Value::Float(v) => write!(f, "{}", v),
            Value::Str(s) => f.write_str(s),
            Value::Bool(b) => write!(f, "{}", b),
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(v as i64)
    }
}

impl From<u32> for Value {
    fn from(v: u32) -> Self {
        Value::Int(v as i64)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Str(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Str(v)
    }
}

/// One or more values; JSON accepts either a scalar or a list
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Values(Vec<Value>);

impl Values {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Value> {
        self.0.iter()
    }

    pub fn as_slice(&self) -> &[Value] {
        &self.0
    }

    pub fn push(&mut self, value: impl Into<Value>) {
        self.0.push(value.into());
    }
}

impl<'de> Deserialize<'de> for Values {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum OneOrMany {
            Many(Vec<Value>),
            One(Value),
        }

        Ok(match OneOrMany::deserialize(deserializer)? {
            OneOrMany::Many(values) => Values(values),
            OneOrMany::One(value) => Values(vec![value]),
        })
    }
}

impl<'a> IntoIterator for &'a Values {
    type Item = &'a Value;
    type IntoIter = std::slice::Iter<'a, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl<V: Into<Value>> FromIterator<V> for Values {
    fn from_iter<I: IntoIterator<Item = V>>(iter: I) -> Self {
        Values(iter.into_iter().map(Into::into).collect())
    }
}

impl From<Value> for Values {
    fn from(v: Value) -> Self {
        Values(vec![v])
    }
}

impl<T: Into<Value>> From<Vec<T>> for Values {
    fn from(v: Vec<T>) -> Self {
        v.into_iter().collect()
    }
}

impl<T: Into<Value>, const N: usize> From<[T; N]> for Values {
    fn from(v: [T; N]) -> Self {
        v.into_iter().collect()
    }
}

impl From<i64> for Values {
    fn from(v: i64) -> Self {
        Values(vec![v.into()])
    }
}

impl From<i32> for Values {
    fn from(v: i32) -> Self {
        Values(vec![v.into()])
    }
}

impl From<bool> for Values {
    fn from(v: bool) -> Self {
        Values(vec![v.into()])
    }
}

impl From<&str> for Values {
    fn from(v: &str) -> Self {
        Values(vec![v.into()])
    }
}

impl From<String> for Values {
    fn from(v: String) -> Self {
        Values(vec![v.into()])
    }
}

/// Query assignment: field name to the concrete value(s) the query carries
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Assignments(BTreeMap<String, Values>);

impl Assignments {
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// Set the values of a field, replacing any previous assignment
    pub fn insert(&mut self, field: impl Into<String>, values: impl Into<Values>) {
        self.0.insert(field.into(), values.into());
    }

    /// Builder-style variant of `insert`
    pub fn with(mut self, field: impl Into<String>, values: impl Into<Values>) -> Self {
        self.insert(field, values);
        self
    }

    pub fn get(&self, field: &str) -> Option<&Values> {
        self.0.get(field)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Values)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
