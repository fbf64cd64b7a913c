//! Scalar handlers: stateless converters for the primitive shapes.
//!
//! Deserialization is liberal: native values or their string spellings are
//! both fine, the way form-style wire data arrives. Serialization is
//! canonical: scalars emit their string form. An empty string deserializes
//! to null, which lands the node on its missing-fallback path.

use super::Type;
use crate::error::Invalid;
use crate::node::SchemaNode;
use crate::value::Value;
use chrono::{FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, Offset, Utc};
use rust_decimal::prelude::FromPrimitive;

fn not_a_number(node: &SchemaNode, value: &Value) -> Invalid {
    Invalid::new(node, format!("\"{value}\" is not a number"))
}

fn cannot_parse(node: &SchemaNode, value: &Value, shape: &str, err: impl std::fmt::Display) -> Invalid {
    Invalid::new(
        node,
        format!("\"{value}\" cannot be parsed as an iso8601 {shape}: {err}"),
    )
}

// ————————————————————————————————————————————————————————————————————————————
// STRINGS
// ————————————————————————————————————————————————————————————————————————————

/// Unicode string. Non-container values stringify; containers fail.
#[derive(Debug, Clone, Copy, Default)]
pub struct Str {
    /// Accept an empty string as a legitimate value instead of treating it
    /// as absent.
    pub allow_empty: bool,
}

impl Str {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn allowing_empty() -> Self {
        Str { allow_empty: true }
    }

    fn text_of(node: &SchemaNode, value: &Value) -> Result<String, Invalid> {
        match value {
            Value::String(s) => Ok(s.clone()),
            Value::Bool(_)
            | Value::Int(_)
            | Value::Float(_)
            | Value::Decimal(_)
            | Value::Date(_)
            | Value::Time(_)
            | Value::DateTime(_) => Ok(value.to_string()),
            other => Err(Invalid::new(node, format!("\"{other}\" is not a string"))),
        }
    }
}

impl Type for Str {
    fn deserialize(&self, node: &SchemaNode, cstruct: &Value) -> Result<Value, Invalid> {
        let text = Self::text_of(node, cstruct)?;
        if text.is_empty() && !self.allow_empty {
            return Ok(Value::Null);
        }
        Ok(Value::String(text))
    }

    fn serialize(&self, node: &SchemaNode, appstruct: &Value) -> Result<Value, Invalid> {
        if appstruct.is_null() {
            return Ok(Value::Null);
        }
        Ok(Value::String(Self::text_of(node, appstruct)?))
    }
}

// ————————————————————————————————————————————————————————————————————————————
// NUMBERS
// ————————————————————————————————————————————————————————————————————————————

/// 64-bit integer.
#[derive(Debug, Clone, Copy, Default)]
pub struct Integer;

impl Integer {
    /// `Ok(None)` is the empty-string case: absent rather than malformed.
    fn int_of(node: &SchemaNode, value: &Value) -> Result<Option<i64>, Invalid> {
        match value {
            Value::Int(n) => Ok(Some(*n)),
            Value::Float(x)
                if x.fract() == 0.0 && *x >= i64::MIN as f64 && *x <= i64::MAX as f64 =>
            {
                Ok(Some(*x as i64))
            }
            Value::String(s) => {
                let s = s.trim();
                if s.is_empty() {
                    return Ok(None);
                }
                s.parse::<i64>()
                    .map(Some)
                    .map_err(|_| not_a_number(node, value))
            }
            _ => Err(not_a_number(node, value)),
        }
    }
}

impl Type for Integer {
    fn deserialize(&self, node: &SchemaNode, cstruct: &Value) -> Result<Value, Invalid> {
        match Self::int_of(node, cstruct)? {
            Some(n) => Ok(Value::Int(n)),
            None => Ok(Value::Null),
        }
    }

    fn serialize(&self, node: &SchemaNode, appstruct: &Value) -> Result<Value, Invalid> {
        if appstruct.is_null() {
            return Ok(Value::Null);
        }
        match Self::int_of(node, appstruct)? {
            Some(n) => Ok(Value::String(n.to_string())),
            None => Err(not_a_number(node, appstruct)),
        }
    }
}

/// 64-bit float.
#[derive(Debug, Clone, Copy, Default)]
pub struct Float;

impl Float {
    fn float_of(node: &SchemaNode, value: &Value) -> Result<Option<f64>, Invalid> {
        match value {
            Value::Float(x) => Ok(Some(*x)),
            Value::Int(n) => Ok(Some(*n as f64)),
            Value::String(s) => {
                let s = s.trim();
                if s.is_empty() {
                    return Ok(None);
                }
                s.parse::<f64>()
                    .map(Some)
                    .map_err(|_| not_a_number(node, value))
            }
            _ => Err(not_a_number(node, value)),
        }
    }
}

impl Type for Float {
    fn deserialize(&self, node: &SchemaNode, cstruct: &Value) -> Result<Value, Invalid> {
        match Self::float_of(node, cstruct)? {
            Some(x) => Ok(Value::Float(x)),
            None => Ok(Value::Null),
        }
    }

    fn serialize(&self, node: &SchemaNode, appstruct: &Value) -> Result<Value, Invalid> {
        if appstruct.is_null() {
            return Ok(Value::Null);
        }
        match Self::float_of(node, appstruct)? {
            Some(x) => Ok(Value::String(x.to_string())),
            None => Err(not_a_number(node, appstruct)),
        }
    }
}

/// Exact decimal.
#[derive(Debug, Clone, Copy, Default)]
pub struct Decimal;

impl Decimal {
    fn decimal_of(
        node: &SchemaNode,
        value: &Value,
    ) -> Result<Option<rust_decimal::Decimal>, Invalid> {
        match value {
            Value::Decimal(d) => Ok(Some(*d)),
            Value::Int(n) => Ok(Some(rust_decimal::Decimal::from(*n))),
            Value::Float(x) => rust_decimal::Decimal::from_f64(*x)
                .map(Some)
                .ok_or_else(|| not_a_number(node, value)),
            Value::String(s) => {
                let s = s.trim();
                if s.is_empty() {
                    return Ok(None);
                }
                s.parse::<rust_decimal::Decimal>()
                    .map(Some)
                    .map_err(|_| not_a_number(node, value))
            }
            _ => Err(not_a_number(node, value)),
        }
    }
}

impl Type for Decimal {
    fn deserialize(&self, node: &SchemaNode, cstruct: &Value) -> Result<Value, Invalid> {
        match Self::decimal_of(node, cstruct)? {
            Some(d) => Ok(Value::Decimal(d)),
            None => Ok(Value::Null),
        }
    }

    fn serialize(&self, node: &SchemaNode, appstruct: &Value) -> Result<Value, Invalid> {
        if appstruct.is_null() {
            return Ok(Value::Null);
        }
        match Self::decimal_of(node, appstruct)? {
            Some(d) => Ok(Value::String(d.to_string())),
            None => Err(not_a_number(node, appstruct)),
        }
    }
}

// ————————————————————————————————————————————————————————————————————————————
// BOOLEANS
// ————————————————————————————————————————————————————————————————————————————

/// Boolean. `"false"` and `"0"` (case-insensitive) deserialize to false;
/// any other accepted scalar is true. Serializes to `"true"`/`"false"`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Boolean;

impl Boolean {
    fn bool_of(node: &SchemaNode, value: &Value) -> Result<Option<bool>, Invalid> {
        match value {
            Value::Bool(b) => Ok(Some(*b)),
            Value::Int(n) => Ok(Some(*n != 0)),
            Value::String(s) => {
                let s = s.trim();
                if s.is_empty() {
                    return Ok(None);
                }
                Ok(Some(!s.eq_ignore_ascii_case("false") && s != "0"))
            }
            other => Err(Invalid::new(node, format!("\"{other}\" is not a boolean"))),
        }
    }
}

impl Type for Boolean {
    fn deserialize(&self, node: &SchemaNode, cstruct: &Value) -> Result<Value, Invalid> {
        match Self::bool_of(node, cstruct)? {
            Some(b) => Ok(Value::Bool(b)),
            None => Ok(Value::Null),
        }
    }

    fn serialize(&self, node: &SchemaNode, appstruct: &Value) -> Result<Value, Invalid> {
        if appstruct.is_null() {
            return Ok(Value::Null);
        }
        match Self::bool_of(node, appstruct)? {
            Some(b) => Ok(Value::String(if b { "true" } else { "false" }.into())),
            None => Err(Invalid::new(
                node,
                format!("\"{appstruct}\" is not a boolean"),
            )),
        }
    }
}

// ————————————————————————————————————————————————————————————————————————————
// TEMPORALS
// ————————————————————————————————————————————————————————————————————————————

/// Calendar date, `YYYY-MM-DD` on the wire. Datetime input truncates to its
/// date part.
#[derive(Debug, Clone, Copy, Default)]
pub struct Date;

impl Type for Date {
    fn deserialize(&self, node: &SchemaNode, cstruct: &Value) -> Result<Value, Invalid> {
        match cstruct {
            Value::Date(d) => Ok(Value::Date(*d)),
            Value::DateTime(dt) => Ok(Value::Date(dt.date_naive())),
            Value::String(s) => {
                let s = s.trim();
                if s.is_empty() {
                    return Ok(Value::Null);
                }
                if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
                    return Ok(Value::Date(d));
                }
                // Datetime spellings are fine too; keep the date part.
                match chrono::DateTime::parse_from_rfc3339(s) {
                    Ok(dt) => Ok(Value::Date(dt.date_naive())),
                    Err(err) => Err(cannot_parse(node, cstruct, "date", err)),
                }
            }
            other => Err(Invalid::new(node, format!("\"{other}\" is not a date"))),
        }
    }

    fn serialize(&self, node: &SchemaNode, appstruct: &Value) -> Result<Value, Invalid> {
        match appstruct {
            Value::Null => Ok(Value::Null),
            Value::Date(d) => Ok(Value::String(d.format("%Y-%m-%d").to_string())),
            Value::DateTime(dt) => Ok(Value::String(dt.date_naive().format("%Y-%m-%d").to_string())),
            other => Err(Invalid::new(node, format!("\"{other}\" is not a date"))),
        }
    }
}

/// Wall-clock time, `HH:MM:SS` on the wire (seconds optional on input).
#[derive(Debug, Clone, Copy, Default)]
pub struct Time;

impl Type for Time {
    fn deserialize(&self, node: &SchemaNode, cstruct: &Value) -> Result<Value, Invalid> {
        match cstruct {
            Value::Time(t) => Ok(Value::Time(*t)),
            Value::String(s) => {
                let s = s.trim();
                if s.is_empty() {
                    return Ok(Value::Null);
                }
                NaiveTime::parse_from_str(s, "%H:%M:%S")
                    .or_else(|_| NaiveTime::parse_from_str(s, "%H:%M"))
                    .map(Value::Time)
                    .map_err(|err| cannot_parse(node, cstruct, "time", err))
            }
            other => Err(Invalid::new(node, format!("\"{other}\" is not a time"))),
        }
    }

    fn serialize(&self, node: &SchemaNode, appstruct: &Value) -> Result<Value, Invalid> {
        match appstruct {
            Value::Null => Ok(Value::Null),
            Value::Time(t) => Ok(Value::String(t.format("%H:%M:%S").to_string())),
            other => Err(Invalid::new(node, format!("\"{other}\" is not a time"))),
        }
    }
}

/// ISO-8601 instant with timezone.
///
/// Offset-less and date-only input is accepted and anchored at
/// `default_offset` (UTC unless configured otherwise), date-only at
/// midnight. `Date` application values coerce the same way during
/// serialization.
#[derive(Debug, Clone, Copy)]
pub struct DateTime {
    pub default_offset: FixedOffset,
}

impl Default for DateTime {
    fn default() -> Self {
        DateTime {
            default_offset: Utc.fix(),
        }
    }
}

impl DateTime {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_offset(default_offset: FixedOffset) -> Self {
        DateTime { default_offset }
    }

    // Interpret a naive timestamp as wall time at the configured offset.
    fn anchor(&self, naive: NaiveDateTime) -> chrono::DateTime<FixedOffset> {
        chrono::DateTime::from_naive_utc_and_offset(naive - self.default_offset, self.default_offset)
    }

    fn midnight(&self, date: NaiveDate) -> chrono::DateTime<FixedOffset> {
        self.anchor(date.and_time(NaiveTime::MIN))
    }

    fn parse(&self, node: &SchemaNode, value: &Value, s: &str) -> Result<chrono::DateTime<FixedOffset>, Invalid> {
        if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(s) {
            return Ok(dt);
        }
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S") {
            return Ok(self.anchor(naive));
        }
        match NaiveDate::parse_from_str(s, "%Y-%m-%d") {
            Ok(date) => Ok(self.midnight(date)),
            Err(err) => Err(cannot_parse(node, value, "datetime", err)),
        }
    }
}

impl Type for DateTime {
    fn deserialize(&self, node: &SchemaNode, cstruct: &Value) -> Result<Value, Invalid> {
        match cstruct {
            Value::DateTime(dt) => Ok(Value::DateTime(*dt)),
            Value::Date(d) => Ok(Value::DateTime(self.midnight(*d))),
            Value::String(s) => {
                let s = s.trim();
                if s.is_empty() {
                    return Ok(Value::Null);
                }
                self.parse(node, cstruct, s).map(Value::DateTime)
            }
            other => Err(Invalid::new(node, format!("\"{other}\" is not a datetime"))),
        }
    }

    fn serialize(&self, node: &SchemaNode, appstruct: &Value) -> Result<Value, Invalid> {
        match appstruct {
            Value::Null => Ok(Value::Null),
            Value::DateTime(dt) => Ok(Value::String(dt.to_rfc3339())),
            Value::Date(d) => Ok(Value::String(self.midnight(*d).to_rfc3339())),
            other => Err(Invalid::new(node, format!("\"{other}\" is not a datetime"))),
        }
    }
}
