// src/json.rs
//! Wire seam: `serde_json::Value` in and out.
//!
//! JSON null maps onto the null sentinel in both directions. Object key
//! order survives (`preserve_order`), which the mapping handler and the
//! schema loader both rely on. Temporal and decimal application values
//! spell themselves as strings on the way out, matching what the scalar
//! handlers emit.

use crate::value::Value;

pub fn from_json(json: &serde_json::Value) -> Value {
    match json {
        serde_json::Value::Null => Value::Null,
        serde_json::Value::Bool(b) => Value::Bool(*b),
        serde_json::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::Int(i)
            } else {
                // u64 overflow and true floats both land here.
                Value::Float(n.as_f64().unwrap_or(f64::NAN))
            }
        }
        serde_json::Value::String(s) => Value::String(s.clone()),
        serde_json::Value::Array(items) => Value::List(items.iter().map(from_json).collect()),
        serde_json::Value::Object(map) => Value::Map(
            map.iter()
                .map(|(key, value)| (key.clone(), from_json(value)))
                .collect(),
        ),
    }
}

pub fn to_json(value: &Value) -> serde_json::Value {
    match value {
        Value::Null => serde_json::Value::Null,
        Value::Bool(b) => (*b).into(),
        Value::Int(n) => (*n).into(),
        Value::Float(x) => serde_json::Number::from_f64(*x)
            .map(serde_json::Value::Number)
            .unwrap_or(serde_json::Value::Null),
        Value::Decimal(d) => d.to_string().into(),
        Value::String(s) => s.clone().into(),
        Value::Date(d) => d.format("%Y-%m-%d").to_string().into(),
        Value::Time(t) => t.format("%H:%M:%S").to_string().into(),
        Value::DateTime(dt) => dt.to_rfc3339().into(),
        Value::List(items) => serde_json::Value::Array(items.iter().map(to_json).collect()),
        Value::Map(map) => serde_json::Value::Object(
            map.iter()
                .map(|(key, value)| (key.clone(), to_json(value)))
                .collect(),
        ),
    }
}

impl From<&serde_json::Value> for Value {
    fn from(json: &serde_json::Value) -> Self {
        from_json(json)
    }
}

impl From<&Value> for serde_json::Value {
    fn from(value: &Value) -> Self {
        to_json(value)
    }
}
