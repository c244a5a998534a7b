//! Filter expressions evaluated by store backends.
//!
//! Records are JSON objects; a missing field evaluates as `null`. Values of
//! different JSON types order as null < bool < number < string < array <
//! object, numbers compare as f64 and strings lexicographically.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A filter condition over JSON records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Filter {
    Eq(String, Value),
    Ne(String, Value),
    Gt(String, Value),
    Gte(String, Value),
    Lt(String, Value),
    Lte(String, Value),
    In(String, Vec<Value>),
    And(Vec<Filter>),
    Or(Vec<Filter>),
}

impl Filter {
    /// Evaluates this filter against a JSON record.
    pub fn matches(&self, record: &Value) -> bool {
        match self {
            Filter::Eq(field, value) => compare_values(field_of(record, field), value).is_eq(),
            Filter::Ne(field, value) => !compare_values(field_of(record, field), value).is_eq(),
            Filter::Gt(field, value) => compare_values(field_of(record, field), value).is_gt(),
            Filter::Gte(field, value) => compare_values(field_of(record, field), value).is_ge(),
            Filter::Lt(field, value) => compare_values(field_of(record, field), value).is_lt(),
            Filter::Lte(field, value) => compare_values(field_of(record, field), value).is_le(),
            Filter::In(field, values) => {
                let actual = field_of(record, field);
                values.iter().any(|v| compare_values(actual, v).is_eq())
            }
            Filter::And(filters) => filters.iter().all(|f| f.matches(record)),
            Filter::Or(filters) => filters.iter().any(|f| f.matches(record)),
        }
    }

    /// Combines two optional filters into a conjunction.
    pub fn and_maybe(a: Option<Filter>, b: Option<Filter>) -> Option<Filter> {
        match (a, b) {
            (Some(a), Some(b)) => Some(Filter::And(vec![a, b])),
            (Some(a), None) => Some(a),
            (None, Some(b)) => Some(b),
            (None, None) => None,
        }
    }
}

const NULL: Value = Value::Null;

fn field_of<'a>(record: &'a Value, field: &str) -> &'a Value {
    record.get(field).unwrap_or(&NULL)
}

/// Totally orders two JSON values.
///
/// Mixed types order by type rank so that sorting over heterogeneous rows is
/// deterministic. Numbers compare by f64 value, which also makes `1` equal
/// to `1.0` regardless of how the record was serialized.
pub fn compare_values(a: &Value, b: &Value) -> Ordering {
    fn rank(v: &Value) -> u8 {
        match v {
            Value::Null => 0,
            Value::Bool(_) => 1,
            Value::Number(_) => 2,
            Value::String(_) => 3,
            Value::Array(_) => 4,
            Value::Object(_) => 5,
        }
    }

    match (a, b) {
        (Value::Null, Value::Null) => Ordering::Equal,
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (Value::Number(x), Value::Number(y)) => {
            let x = x.as_f64().unwrap_or(f64::NAN);
            let y = y.as_f64().unwrap_or(f64::NAN);
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Value::String(x), Value::String(y)) => x.cmp(y),
        (Value::Array(x), Value::Array(y)) => {
            for (xv, yv) in x.iter().zip(y.iter()) {
                let ord = compare_values(xv, yv);
                if !ord.is_eq() {
                    return ord;
                }
            }
            x.len().cmp(&y.len())
        }
        _ => rank(a).cmp(&rank(b)),
    }
}
