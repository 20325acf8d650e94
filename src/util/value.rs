//! Payload values for datasets and attributes.
//!
//! Every piece of data that ends up in a dataset or attribute flows through
//! [`Value`], so builders can be compared for structural identity and the
//! in-memory backend can project files to JSON.

use std::fmt;

/// A scalar or array payload.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Str(String),
    Int(i64),
    Float(f64),
    StrList(Vec<String>),
    IntList(Vec<i64>),
    FloatList(Vec<f64>),
    /// Row-major matrix, e.g. per-sample feature vectors.
    FloatMatrix(Vec<Vec<f64>>),
}

impl Value {
    /// Short kind name for diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Str(_) => "str",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::StrList(_) => "str[]",
            Value::IntList(_) => "int[]",
            Value::FloatList(_) => "float[]",
            Value::FloatMatrix(_) => "float[][]",
        }
    }

    /// Number of top-level elements (1 for scalars).
    pub fn len(&self) -> usize {
        match self {
            Value::Str(_) | Value::Int(_) | Value::Float(_) => 1,
            Value::StrList(v) => v.len(),
            Value::IntList(v) => v.len(),
            Value::FloatList(v) => v.len(),
            Value::FloatMatrix(v) => v.len(),
        }
    }

    /// Check if an array value has no elements.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Project to JSON for dumps and inspection.
    pub fn to_json(&self) -> serde_json::Value {
        use serde_json::json;
        match self {
            Value::Str(s) => json!(s),
            Value::Int(i) => json!(i),
            Value::Float(f) => json!(f),
            Value::StrList(v) => json!(v),
            Value::IntList(v) => json!(v),
            Value::FloatList(v) => json!(v),
            Value::FloatMatrix(v) => json!(v),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Str(s) => write!(f, "{s}"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(x) => write!(f, "{x}"),
            other => write!(f, "{}({})", other.kind(), other.len()),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<Vec<String>> for Value {
    fn from(v: Vec<String>) -> Self {
        Value::StrList(v)
    }
}

impl From<&[&str]> for Value {
    fn from(v: &[&str]) -> Self {
        Value::StrList(v.iter().map(|s| s.to_string()).collect())
    }
}

impl From<Vec<i64>> for Value {
    fn from(v: Vec<i64>) -> Self {
        Value::IntList(v)
    }
}

impl From<Vec<f64>> for Value {
    fn from(v: Vec<f64>) -> Self {
        Value::FloatList(v)
    }
}

impl From<[f64; 3]> for Value {
    fn from(v: [f64; 3]) -> Self {
        Value::FloatList(v.to_vec())
    }
}

impl From<Vec<Vec<f64>>> for Value {
    fn from(v: Vec<Vec<f64>>) -> Self {
        Value::FloatMatrix(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_kinds() {
        assert_eq!(Value::from("abc").kind(), "str");
        assert_eq!(Value::from(1.5).kind(), "float");
        assert_eq!(Value::from(vec![1.0, 2.0]).len(), 2);
    }

    #[test]
    fn test_value_json() {
        let v = Value::from(vec![1i64, 2, 3]);
        assert_eq!(v.to_json(), serde_json::json!([1, 2, 3]));
    }
}
