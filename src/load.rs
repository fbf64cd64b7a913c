// src/load.rs
//! Data-driven schema construction.
//!
//! A schema description is ordinary JSON; deserializing one yields the same
//! `SchemaNode` tree the fluent API builds, with identical runtime
//! behavior. Field order in a `fields` object is the declared child order
//! (`IndexMap`, not a hash map, on purpose).
//!
//! ```json
//! {
//!   "type": "mapping",
//!   "unknown": "raise",
//!   "fields": {
//!     "age":  {"type": "integer", "validators": [{"kind": "range", "min": 0}]},
//!     "tags": {"type": "sequence", "item": {"type": "string"}, "missing": []}
//!   }
//! }
//! ```

use crate::json;
use crate::node::SchemaNode;
use crate::types::{scalar, Mapping, Sequence, Tuple, Unknown};
use crate::validators::{All, Email, Length, OneOf, Range, Regex};
use indexmap::IndexMap;
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LoadError {
    /// The description is not valid JSON or not a valid description;
    /// `path` is the JSON path to the offending spot.
    #[error("invalid schema description at {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid pattern for field \"{field}\": {source}")]
    Pattern {
        field: String,
        #[source]
        source: regex::Error,
    },
}

/// Parse a schema description document into a node tree.
pub fn from_str(src: &str) -> Result<SchemaNode, LoadError> {
    let de = &mut serde_json::Deserializer::from_str(src);
    let desc: NodeDesc = serde_path_to_error::deserialize(de).map_err(|err| LoadError::Parse {
        path: err.path().to_string(),
        source: err.into_inner(),
    })?;
    desc.build("")
}

/// Build a node tree from an already-parsed description value.
pub fn from_value(desc: &serde_json::Value) -> Result<SchemaNode, LoadError> {
    let desc: NodeDesc =
        serde_path_to_error::deserialize(desc.clone()).map_err(|err| LoadError::Parse {
            path: err.path().to_string(),
            source: err.into_inner(),
        })?;
    desc.build("")
}

// ————————————————————————————————————————————————————————————————————————————
// DESCRIPTION SHAPE
// ————————————————————————————————————————————————————————————————————————————

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
struct NodeDesc {
    #[serde(rename = "type")]
    kind: Kind,

    /// Mapping children, in declared order.
    #[serde(default)]
    fields: IndexMap<String, NodeDesc>,

    /// Sequence element shape.
    #[serde(default)]
    item: Option<Box<NodeDesc>>,

    /// Tuple positions.
    #[serde(default)]
    items: Vec<NodeDesc>,

    #[serde(default)]
    unknown: Option<UnknownDesc>,

    #[serde(default)]
    accept_scalar: bool,

    #[serde(default)]
    allow_empty: bool,

    #[serde(default)]
    default: Slot,

    #[serde(default)]
    missing: Slot,

    #[serde(default)]
    validators: Vec<ValidatorDesc>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "snake_case")]
enum Kind {
    Mapping,
    Sequence,
    Tuple,
    String,
    Integer,
    Float,
    Decimal,
    Boolean,
    Date,
    Time,
    Datetime,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "snake_case")]
enum UnknownDesc {
    Ignore,
    Raise,
    Preserve,
}

impl From<UnknownDesc> for Unknown {
    fn from(desc: UnknownDesc) -> Self {
        match desc {
            UnknownDesc::Ignore => Unknown::Ignore,
            UnknownDesc::Raise => Unknown::Raise,
            UnknownDesc::Preserve => Unknown::Preserve,
        }
    }
}

/// Absent-vs-null-aware fallback slot: a key that is not present at all
/// stays `Absent` (via `#[serde(default)]`), while an explicit JSON null is
/// a real value.
#[derive(Debug, Clone, Default)]
enum Slot {
    #[default]
    Absent,
    Set(serde_json::Value),
}

impl<'de> Deserialize<'de> for Slot {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        // Only reached when the key is present.
        Ok(Slot::Set(serde_json::Value::deserialize(deserializer)?))
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case", deny_unknown_fields)]
enum ValidatorDesc {
    Range {
        #[serde(default)]
        min: Option<serde_json::Value>,
        #[serde(default)]
        max: Option<serde_json::Value>,
    },
    Length {
        #[serde(default)]
        min: Option<usize>,
        #[serde(default)]
        max: Option<usize>,
    },
    OneOf {
        choices: Vec<serde_json::Value>,
    },
    Regex {
        pattern: String,
        #[serde(default)]
        msg: Option<String>,
    },
    Email,
}

// ————————————————————————————————————————————————————————————————————————————
// BUILD
// ————————————————————————————————————————————————————————————————————————————

impl NodeDesc {
    fn build(&self, name: &str) -> Result<SchemaNode, LoadError> {
        let mut node = match self.kind {
            Kind::Mapping => {
                let unknown = self.unknown.map(Unknown::from).unwrap_or_default();
                let mut node = SchemaNode::new(Mapping::with_unknown(unknown));
                for (field, desc) in &self.fields {
                    node.add(desc.build(field)?);
                }
                node
            }
            Kind::Sequence => {
                let mut node = SchemaNode::new(Sequence {
                    accept_scalar: self.accept_scalar,
                });
                if let Some(item) = &self.item {
                    node.add(item.build("")?);
                }
                node
            }
            Kind::Tuple => {
                let mut node = SchemaNode::new(Tuple::new());
                for desc in &self.items {
                    node.add(desc.build("")?);
                }
                node
            }
            Kind::String => SchemaNode::new(scalar::Str {
                allow_empty: self.allow_empty,
            }),
            Kind::Integer => SchemaNode::new(scalar::Integer),
            Kind::Float => SchemaNode::new(scalar::Float),
            Kind::Decimal => SchemaNode::new(scalar::Decimal),
            Kind::Boolean => SchemaNode::new(scalar::Boolean),
            Kind::Date => SchemaNode::new(scalar::Date),
            Kind::Time => SchemaNode::new(scalar::Time),
            Kind::Datetime => SchemaNode::new(scalar::DateTime::new()),
        };

        node = node.named(name);
        if let Slot::Set(value) = &self.default {
            node = node.with_default(json::from_json(value));
        }
        if let Slot::Set(value) = &self.missing {
            node = node.with_missing(json::from_json(value));
        }
        if let Some(all) = self.build_validators(name)? {
            node = node.with_validator(all);
        }
        Ok(node)
    }

    fn build_validators(&self, field: &str) -> Result<Option<All>, LoadError> {
        if self.validators.is_empty() {
            return Ok(None);
        }
        let mut all = All::new();
        for desc in &self.validators {
            all = match desc {
                ValidatorDesc::Range { min, max } => all.and(Range::new(
                    min.as_ref().map(json::from_json),
                    max.as_ref().map(json::from_json),
                )),
                ValidatorDesc::Length { min, max } => all.and(Length::new(*min, *max)),
                ValidatorDesc::OneOf { choices } => {
                    all.and(OneOf::new(choices.iter().map(json::from_json)))
                }
                ValidatorDesc::Regex { pattern, msg } => {
                    let validator = match msg {
                        Some(msg) => Regex::with_msg(pattern, msg),
                        None => Regex::new(pattern),
                    }
                    .map_err(|source| LoadError::Pattern {
                        field: field.to_owned(),
                        source,
                    })?;
                    all.and(validator)
                }
                ValidatorDesc::Email => all.and(Email),
            };
        }
        Ok(Some(all))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::json::from_json;
    use crate::value::{Missing, Value};
    use serde_json::json;

    #[test]
    fn loaded_tree_matches_a_hand_built_one() {
        let loaded = from_str(
            r#"{
                "type": "mapping",
                "fields": {
                    "age": {"type": "integer", "validators": [{"kind": "range", "min": 0, "max": 150}]},
                    "name": {"type": "string"}
                }
            }"#,
        )
        .unwrap();

        let built = SchemaNode::new(Mapping::new())
            .with_child(
                SchemaNode::new(scalar::Integer)
                    .named("age")
                    .with_validator(Range::new(Some(Value::Int(0)), Some(Value::Int(150)))),
            )
            .with_child(SchemaNode::new(scalar::Str::new()).named("name"));

        let good = from_json(&json!({"age": "42", "name": "b"}));
        assert_eq!(
            loaded.deserialize(&good).unwrap(),
            built.deserialize(&good).unwrap()
        );

        let bad = from_json(&json!({"age": 200}));
        assert_eq!(
            loaded.deserialize(&bad).unwrap_err().flatten(),
            built.deserialize(&bad).unwrap_err().flatten()
        );
    }

    #[test]
    fn field_order_in_the_description_is_declared_order() {
        let loaded = from_str(
            r#"{"type": "mapping", "fields": {
                "z": {"type": "integer"}, "a": {"type": "integer"}
            }}"#,
        )
        .unwrap();
        let names: Vec<_> = loaded.children().iter().map(|c| c.name()).collect();
        assert_eq!(names, ["z", "a"]);
    }

    #[test]
    fn absent_missing_means_required_but_explicit_null_does_not() {
        let loaded = from_str(
            r#"{"type": "mapping", "fields": {
                "req": {"type": "integer"},
                "opt": {"type": "integer", "missing": null},
                "dflt": {"type": "integer", "missing": 5}
            }}"#,
        )
        .unwrap();
        assert!(loaded.child("req").unwrap().required());
        assert_eq!(
            loaded.child("opt").unwrap().missing(),
            &Missing::Value(Value::Null)
        );
        assert_eq!(
            loaded.child("dflt").unwrap().missing(),
            &Missing::Value(Value::Int(5))
        );

        let result = loaded.deserialize(&from_json(&json!({"req": 1}))).unwrap();
        assert_eq!(result, from_json(&json!({"req": 1, "opt": null, "dflt": 5})));
    }

    #[test]
    fn sequences_and_tuples_load_their_element_shapes() {
        let loaded = from_str(
            r#"{"type": "mapping", "fields": {
                "xs": {"type": "sequence", "item": {"type": "integer"}},
                "pair": {"type": "tuple", "items": [{"type": "integer"}, {"type": "string"}]}
            }}"#,
        )
        .unwrap();
        let doc = from_json(&json!({"xs": ["1", "2"], "pair": [3, "x"]}));
        let result = loaded.deserialize(&doc).unwrap();
        assert_eq!(
            result,
            from_json(&json!({"xs": [1, 2], "pair": [3, "x"]}))
        );

        let err = loaded
            .deserialize(&from_json(&json!({"xs": [1], "pair": ["bad", "x"]})))
            .unwrap_err();
        assert!(err.flatten().contains_key("pair.0"));
    }

    #[test]
    fn unknown_policy_loads() {
        let loaded =
            from_str(r#"{"type": "mapping", "unknown": "preserve", "fields": {}}"#).unwrap();
        let doc = from_json(&json!({"extra": true}));
        assert_eq!(loaded.deserialize(&doc).unwrap(), doc);
    }

    #[test]
    fn parse_errors_carry_the_json_path() {
        let err = from_str(
            r#"{"type": "mapping", "fields": {"a": {"type": "intger"}}}"#,
        )
        .unwrap_err();
        let LoadError::Parse { path, .. } = err else {
            panic!("expected a parse error");
        };
        assert!(path.contains("fields.a"), "path was {path}");
    }

    #[test]
    fn bad_regex_patterns_are_load_errors() {
        let err = from_str(
            r#"{"type": "mapping", "fields": {
                "x": {"type": "string", "validators": [{"kind": "regex", "pattern": "("}]}
            }}"#,
        )
        .unwrap_err();
        assert!(matches!(err, LoadError::Pattern { field, .. } if field == "x"));
    }
}
