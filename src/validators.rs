// src/validators.rs
//! Post-deserialization validators.
//!
//! A validator is a pure predicate over `(node, value)`; it runs only after
//! type coercion succeeds and never against a fallback value. Combinators
//! keep the failure shape flat: `All` merges every sub-validator's messages
//! into one failure on the same node.

use crate::error::Invalid;
use crate::node::SchemaNode;
use crate::value::{self, Value};
use once_cell::sync::Lazy;
use std::cmp::Ordering;
use std::fmt;

pub trait Validator: fmt::Debug + Send + Sync {
    fn validate(&self, node: &SchemaNode, value: &Value) -> Result<(), Invalid>;
}

/// All-of combinator: every sub-validator runs (no short-circuit); their
/// messages merge into a single failure.
#[derive(Debug, Default)]
pub struct All {
    validators: Vec<Box<dyn Validator>>,
}

impl All {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn and(mut self, validator: impl Validator + 'static) -> Self {
        self.validators.push(Box::new(validator));
        self
    }
}

impl Validator for All {
    fn validate(&self, node: &SchemaNode, value: &Value) -> Result<(), Invalid> {
        let mut msgs: Vec<String> = Vec::new();
        for validator in &self.validators {
            if let Err(err) = validator.validate(node, value) {
                msgs.extend(err.messages().iter().cloned());
            }
        }
        if msgs.is_empty() {
            Ok(())
        } else {
            Err(Invalid::with_messages(node, msgs))
        }
    }
}

/// Arbitrary predicate; the closure vetoes with its own message.
pub struct Function {
    func: Box<dyn Fn(&Value) -> Result<(), String> + Send + Sync>,
}

impl Function {
    pub fn new(func: impl Fn(&Value) -> Result<(), String> + Send + Sync + 'static) -> Self {
        Function {
            func: Box::new(func),
        }
    }
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Function(..)")
    }
}

impl Validator for Function {
    fn validate(&self, node: &SchemaNode, value: &Value) -> Result<(), Invalid> {
        (self.func)(value).map_err(|msg| Invalid::new(node, msg))
    }
}

/// Pattern validator over string values.
#[derive(Debug)]
pub struct Regex {
    pattern: regex::Regex,
    msg: String,
}

impl Regex {
    pub fn new(pattern: &str) -> Result<Self, regex::Error> {
        Self::with_msg(pattern, "String does not match expected pattern")
    }

    pub fn with_msg(pattern: &str, msg: impl Into<String>) -> Result<Self, regex::Error> {
        Ok(Regex {
            pattern: regex::Regex::new(pattern)?,
            msg: msg.into(),
        })
    }
}

impl Validator for Regex {
    fn validate(&self, node: &SchemaNode, value: &Value) -> Result<(), Invalid> {
        match value {
            Value::String(s) if self.pattern.is_match(s) => Ok(()),
            _ => Err(Invalid::new(node, self.msg.clone())),
        }
    }
}

static EMAIL: Lazy<regex::Regex> = Lazy::new(|| {
    regex::Regex::new(r"(?i)^[A-Z0-9._%+-]+@[A-Z0-9.-]+\.[A-Z]{2,}$")
        .expect("email pattern compiles")
});

/// Email address validator with a fixed case-insensitive pattern, compiled
/// once.
#[derive(Debug, Clone, Copy, Default)]
pub struct Email;

impl Validator for Email {
    fn validate(&self, node: &SchemaNode, value: &Value) -> Result<(), Invalid> {
        match value {
            Value::String(s) if EMAIL.is_match(s) => Ok(()),
            _ => Err(Invalid::new(node, "Invalid email address")),
        }
    }
}

/// Inclusive bounds over comparable values (numbers with numbers, temporals
/// and strings within their own kind). Incomparable pairs pass; bounds only
/// speak for kinds they can order.
#[derive(Debug, Default)]
pub struct Range {
    min: Option<Value>,
    max: Option<Value>,
}

impl Range {
    pub fn new(min: Option<Value>, max: Option<Value>) -> Self {
        Range { min, max }
    }
}

impl Validator for Range {
    fn validate(&self, node: &SchemaNode, value: &Value) -> Result<(), Invalid> {
        if let Some(min) = &self.min {
            if value::partial_cmp(value, min) == Some(Ordering::Less) {
                return Err(Invalid::new(
                    node,
                    format!("{value} is less than minimum value {min}"),
                ));
            }
        }
        if let Some(max) = &self.max {
            if value::partial_cmp(value, max) == Some(Ordering::Greater) {
                return Err(Invalid::new(
                    node,
                    format!("{value} is greater than maximum value {max}"),
                ));
            }
        }
        Ok(())
    }
}

/// Length bounds: characters for strings, elements for sequences and
/// mappings.
#[derive(Debug, Default)]
pub struct Length {
    min: Option<usize>,
    max: Option<usize>,
}

impl Length {
    pub fn new(min: Option<usize>, max: Option<usize>) -> Self {
        Length { min, max }
    }
}

impl Validator for Length {
    fn validate(&self, node: &SchemaNode, value: &Value) -> Result<(), Invalid> {
        let len = match value {
            Value::String(s) => s.chars().count(),
            Value::List(items) => items.len(),
            Value::Map(map) => map.len(),
            _ => return Ok(()),
        };
        if let Some(min) = self.min {
            if len < min {
                return Err(Invalid::new(
                    node,
                    format!("Shorter than minimum length {min}"),
                ));
            }
        }
        if let Some(max) = self.max {
            if len > max {
                return Err(Invalid::new(
                    node,
                    format!("Longer than maximum length {max}"),
                ));
            }
        }
        Ok(())
    }
}

/// Membership in a fixed set of choices.
#[derive(Debug)]
pub struct OneOf {
    choices: Vec<Value>,
}

impl OneOf {
    pub fn new(choices: impl IntoIterator<Item = Value>) -> Self {
        OneOf {
            choices: choices.into_iter().collect(),
        }
    }
}

impl Validator for OneOf {
    fn validate(&self, node: &SchemaNode, value: &Value) -> Result<(), Invalid> {
        if self.choices.contains(value) {
            return Ok(());
        }
        let choices = self
            .choices
            .iter()
            .map(|c| c.to_string())
            .collect::<Vec<_>>()
            .join(", ");
        Err(Invalid::new(
            node,
            format!("\"{value}\" is not one of {choices}"),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::scalar::{Integer, Str};

    fn int_node() -> SchemaNode {
        SchemaNode::new(Integer)
    }

    fn str_node() -> SchemaNode {
        SchemaNode::new(Str::new())
    }

    #[test]
    fn range_checks_both_bounds() {
        let range = Range::new(Some(Value::Int(1)), Some(Value::Int(10)));
        let node = int_node();
        assert!(range.validate(&node, &Value::Int(5)).is_ok());
        assert!(range.validate(&node, &Value::Int(1)).is_ok());
        assert!(range.validate(&node, &Value::Int(10)).is_ok());

        let low = range.validate(&node, &Value::Int(0)).unwrap_err();
        assert_eq!(low.messages(), ["0 is less than minimum value 1"]);
        let high = range.validate(&node, &Value::Int(11)).unwrap_err();
        assert_eq!(high.messages(), ["11 is greater than maximum value 10"]);
    }

    #[test]
    fn length_counts_characters_not_bytes() {
        let length = Length::new(None, Some(3));
        let node = str_node();
        assert!(length.validate(&node, &Value::String("äöü".into())).is_ok());
        assert!(length.validate(&node, &Value::String("äöüx".into())).is_err());
    }

    #[test]
    fn one_of_lists_the_choices_in_its_message() {
        let one_of = OneOf::new([Value::String("on".into()), Value::String("off".into())]);
        let node = str_node();
        assert!(one_of.validate(&node, &Value::String("on".into())).is_ok());
        let err = one_of
            .validate(&node, &Value::String("maybe".into()))
            .unwrap_err();
        assert_eq!(err.messages(), ["\"maybe\" is not one of on, off"]);
    }

    #[test]
    fn regex_uses_the_custom_message() {
        let re = Regex::with_msg(r"^\d+$", "digits only").unwrap();
        let node = str_node();
        assert!(re.validate(&node, &Value::String("123".into())).is_ok());
        let err = re.validate(&node, &Value::String("12a".into())).unwrap_err();
        assert_eq!(err.messages(), ["digits only"]);
    }

    #[test]
    fn email_accepts_plausible_addresses_only() {
        let node = str_node();
        assert!(Email.validate(&node, &Value::String("a.b+c@example.org".into())).is_ok());
        for bad in ["not-an-email", "a@b", "@example.org"] {
            assert!(
                Email.validate(&node, &Value::String(bad.into())).is_err(),
                "{bad} should be rejected"
            );
        }
    }

    #[test]
    fn function_vetoes_with_its_own_message() {
        let even = Function::new(|v| match v {
            Value::Int(n) if n % 2 == 0 => Ok(()),
            _ => Err("must be even".into()),
        });
        let node = int_node();
        assert!(even.validate(&node, &Value::Int(2)).is_ok());
        let err = even.validate(&node, &Value::Int(3)).unwrap_err();
        assert_eq!(err.messages(), ["must be even"]);
    }

    #[test]
    fn all_merges_every_failing_message() {
        let all = All::new()
            .and(Range::new(Some(Value::Int(10)), None))
            .and(Function::new(|v| match v {
                Value::Int(n) if n % 2 == 0 => Ok(()),
                _ => Err("must be even".into()),
            }));
        let node = int_node();
        let err = all.validate(&node, &Value::Int(3)).unwrap_err();
        assert_eq!(err.messages().len(), 2);
        assert!(err.messages()[0].contains("less than minimum"));
        assert_eq!(err.messages()[1], "must be even");
        // Flattened, the messages join with "; ".
        let report = err.flatten();
        let combined = report.values().next().map(String::as_str).unwrap_or("");
        assert!(combined.contains("; "));
    }

    #[test]
    fn validator_runs_through_the_node_after_coercion() {
        let node = SchemaNode::new(Integer)
            .named("age")
            .with_validator(Range::new(Some(Value::Int(0)), Some(Value::Int(150))));
        assert_eq!(
            node.deserialize(&Value::String("42".into())).unwrap(),
            Value::Int(42)
        );
        let err = node.deserialize(&Value::Int(200)).unwrap_err();
        assert_eq!(err.flatten().get("age").map(String::as_str), Some(
            "200 is greater than maximum value 150"
        ));
    }

    #[test]
    fn validator_does_not_run_when_coercion_fails() {
        // A range that would also fail; the coercion message must win alone.
        let node = SchemaNode::new(Integer)
            .with_validator(Range::new(Some(Value::Int(1000)), None));
        let err = node.deserialize(&Value::String("nope".into())).unwrap_err();
        assert_eq!(err.messages().len(), 1);
        assert!(err.messages()[0].contains("is not a number"));
    }
}
