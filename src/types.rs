// src/types.rs
//! The bidirectional type contract and the composite handlers.
//!
//! Handlers are stateless (or minimally parametrized) strategy objects with
//! no reference back to any particular node; one instance may serve every
//! node that uses its shape. Composites coordinate per-child coercion with
//! a capture-then-aggregate pass: every child is processed before any
//! failure surfaces, so one call reports every independent problem in the
//! input instead of just the first.

pub mod scalar;

use crate::error::Invalid;
use crate::node::SchemaNode;
use crate::value::Value;
use indexmap::IndexMap;
use std::fmt;

/// The contract every type handler implements, scalar or composite.
pub trait Type: fmt::Debug + Send + Sync {
    /// Wire shape in, application shape out. Fails when `cstruct` cannot be
    /// structurally interpreted as this shape, a required sub-value is
    /// absent, or (at the node layer) a validator rejects the result.
    fn deserialize(&self, node: &SchemaNode, cstruct: &Value) -> Result<Value, Invalid>;

    /// The inverse projection. Fails when `appstruct` cannot be represented
    /// in this shape.
    fn serialize(&self, node: &SchemaNode, appstruct: &Value) -> Result<Value, Invalid>;

    /// Whether this type addresses its children by position (sequence,
    /// tuple) rather than by name. Consulted when flattening failure trees.
    fn positional(&self) -> bool {
        false
    }
}

/// Which of the two symmetric operations a composite pass is running.
/// Plays the role the per-direction callbacks would otherwise duplicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Dir {
    Deserialize,
    Serialize,
}

impl Dir {
    fn apply(self, node: &SchemaNode, value: &Value) -> Result<Value, Invalid> {
        match self {
            Dir::Deserialize => node.deserialize(value),
            Dir::Serialize => node.serialize(value),
        }
    }
}

// ————————————————————————————————————————————————————————————————————————————
// MAPPING
// ————————————————————————————————————————————————————————————————————————————

/// What a mapping does with input keys the schema does not declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Unknown {
    /// Drop leftover keys.
    #[default]
    Ignore,
    /// Leftover keys are a failure.
    Raise,
    /// Merge leftover key/value pairs verbatim into the result.
    Preserve,
}

/// Named-field composite. The node's children declare the keys; declared
/// order is processing order.
#[derive(Debug, Clone, Copy, Default)]
pub struct Mapping {
    pub unknown: Unknown,
}

impl Mapping {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_unknown(unknown: Unknown) -> Self {
        Mapping { unknown }
    }

    fn as_map(
        &self,
        node: &SchemaNode,
        value: &Value,
        dir: Dir,
    ) -> Result<IndexMap<String, Value>, Invalid> {
        match value {
            Value::Map(map) => Ok(map.clone()),
            // During serialization null stands for "no fields": every child
            // sees null and falls back to its own default.
            Value::Null if dir == Dir::Serialize => Ok(IndexMap::new()),
            other => Err(Invalid::new(
                node,
                format!("\"{other}\" is not a mapping type"),
            )),
        }
    }

    fn traverse(&self, node: &SchemaNode, value: &Value, dir: Dir) -> Result<Value, Invalid> {
        let mut rest = self.as_map(node, value, dir)?;
        let mut error: Option<Invalid> = None;
        let mut result = IndexMap::new();

        for (num, child) in node.children().iter().enumerate() {
            let subval = rest.shift_remove(child.name()).unwrap_or(Value::Null);
            match dir.apply(child, &subval) {
                Ok(sub) => {
                    result.insert(child.name().to_owned(), sub);
                }
                Err(err) => error
                    .get_or_insert_with(|| Invalid::bare(node))
                    .add(err, Some(num)),
            }
        }

        match self.unknown {
            Unknown::Ignore => {}
            Unknown::Preserve => result.extend(rest),
            Unknown::Raise => {
                if !rest.is_empty() {
                    let keys = rest.keys().map(String::as_str).collect::<Vec<_>>().join(", ");
                    let msg = format!("Unrecognized keys in mapping: \"{keys}\"");
                    // Ride along on the aggregate when per-child failures
                    // were captured, so one call still surfaces everything.
                    match error.as_mut() {
                        Some(err) => err.push_message(msg),
                        None => return Err(Invalid::new(node, msg)),
                    }
                }
            }
        }

        match error {
            Some(err) => Err(err),
            None => Ok(Value::Map(result)),
        }
    }
}

impl Type for Mapping {
    fn deserialize(&self, node: &SchemaNode, cstruct: &Value) -> Result<Value, Invalid> {
        self.traverse(node, cstruct, Dir::Deserialize)
    }

    fn serialize(&self, node: &SchemaNode, appstruct: &Value) -> Result<Value, Invalid> {
        self.traverse(node, appstruct, Dir::Serialize)
    }
}

// ————————————————————————————————————————————————————————————————————————————
// SEQUENCE
// ————————————————————————————————————————————————————————————————————————————

/// Homogeneous variable-length composite. Exactly one child declares the
/// element shape; that is an authoring invariant, checked here rather than
/// trusted.
#[derive(Debug, Clone, Copy, Default)]
pub struct Sequence {
    /// Coerce a lone non-sequence value into a one-element list instead of
    /// failing the structural check.
    pub accept_scalar: bool,
}

impl Sequence {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn scalar_friendly() -> Self {
        Sequence { accept_scalar: true }
    }

    fn as_list(&self, node: &SchemaNode, value: &Value, dir: Dir) -> Result<Vec<Value>, Invalid> {
        match value {
            Value::List(items) => Ok(items.clone()),
            // Null during serialization: there are no element positions to
            // push null into, so the result is simply empty.
            Value::Null if dir == Dir::Serialize => Ok(Vec::new()),
            other if self.accept_scalar => Ok(vec![other.clone()]),
            other => Err(Invalid::new(node, format!("\"{other}\" is not iterable"))),
        }
    }

    fn traverse(&self, node: &SchemaNode, value: &Value, dir: Dir) -> Result<Value, Invalid> {
        let Some(element) = node.children().first() else {
            return Err(Invalid::new(node, "sequence schema has no element node"));
        };
        let items = self.as_list(node, value, dir)?;

        let mut error: Option<Invalid> = None;
        let mut result = Vec::with_capacity(items.len());
        for (num, subval) in items.iter().enumerate() {
            match dir.apply(element, subval) {
                Ok(sub) => result.push(sub),
                Err(err) => error
                    .get_or_insert_with(|| Invalid::bare(node))
                    .add(err, Some(num)),
            }
        }

        match error {
            Some(err) => Err(err),
            None => Ok(Value::List(result)),
        }
    }
}

impl Type for Sequence {
    fn deserialize(&self, node: &SchemaNode, cstruct: &Value) -> Result<Value, Invalid> {
        self.traverse(node, cstruct, Dir::Deserialize)
    }

    fn serialize(&self, node: &SchemaNode, appstruct: &Value) -> Result<Value, Invalid> {
        self.traverse(node, appstruct, Dir::Serialize)
    }

    fn positional(&self) -> bool {
        true
    }
}

// ————————————————————————————————————————————————————————————————————————————
// TUPLE
// ————————————————————————————————————————————————————————————————————————————

/// Fixed-length heterogeneous composite. The input length must equal the
/// number of declared children; a mismatch is one structural failure, not a
/// per-element one, since positional correspondence is meaningless without
/// it.
#[derive(Debug, Clone, Copy, Default)]
pub struct Tuple;

impl Tuple {
    pub fn new() -> Self {
        Tuple
    }

    fn traverse(&self, node: &SchemaNode, value: &Value, dir: Dir) -> Result<Value, Invalid> {
        let children = node.children();
        let items: Vec<Value> = match value {
            Value::List(items) => items.clone(),
            // Null during serialization propagates into every position.
            Value::Null if dir == Dir::Serialize => vec![Value::Null; children.len()],
            other => {
                return Err(Invalid::new(node, format!("\"{other}\" is not iterable")));
            }
        };
        if items.len() != children.len() {
            return Err(Invalid::new(
                node,
                format!(
                    "\"{value}\" has an incorrect number of elements (expected {}, was {})",
                    children.len(),
                    items.len()
                ),
            ));
        }

        let mut error: Option<Invalid> = None;
        let mut result = Vec::with_capacity(children.len());
        for (num, (child, subval)) in children.iter().zip(items.iter()).enumerate() {
            match dir.apply(child, subval) {
                Ok(sub) => result.push(sub),
                Err(err) => error
                    .get_or_insert_with(|| Invalid::bare(node))
                    .add(err, Some(num)),
            }
        }

        match error {
            Some(err) => Err(err),
            None => Ok(Value::List(result)),
        }
    }
}

impl Type for Tuple {
    fn deserialize(&self, node: &SchemaNode, cstruct: &Value) -> Result<Value, Invalid> {
        self.traverse(node, cstruct, Dir::Deserialize)
    }

    fn serialize(&self, node: &SchemaNode, appstruct: &Value) -> Result<Value, Invalid> {
        self.traverse(node, appstruct, Dir::Serialize)
    }

    fn positional(&self) -> bool {
        true
    }
}

// ————————————————————————————————————————————————————————————————————————————
// TESTS
// ————————————————————————————————————————————————————————————————————————————
