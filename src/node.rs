// src/node.rs
//! Schema tree nodes.

use crate::error::Invalid;
use crate::types::Type;
use crate::validators::Validator;
use crate::value::{Default, Missing, Value};
use std::fmt;
use std::sync::Arc;

/// One position in a schema tree: a type handler, a name, fallbacks for both
/// directions, an optional validator, and an ordered list of children.
///
/// A node tree is built once and then treated as immutable; `clone()`
/// deep-copies the children while handler and validator instances stay
/// shared, so specialized variants never mutate a shared prototype and one
/// tree can serve many threads concurrently.
#[derive(Clone)]
pub struct SchemaNode {
    typ: Arc<dyn Type>,
    name: String,
    default: Default,
    missing: Missing,
    validator: Option<Arc<dyn Validator>>,
    children: Vec<SchemaNode>,
}

impl SchemaNode {
    /// A fresh anonymous node: no default, required, no validator.
    pub fn new(typ: impl Type + 'static) -> Self {
        Self::with_shared(Arc::new(typ))
    }

    /// Reuse an existing handler instance instead of boxing a fresh one;
    /// handlers are stateless, so one instance may serve any number of
    /// nodes.
    pub fn with_shared(typ: Arc<dyn Type>) -> Self {
        SchemaNode {
            typ,
            name: String::new(),
            default: Default::Unset,
            missing: Missing::Required,
            validator: None,
            children: Vec::new(),
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Serialization-time fallback substituted for a null input.
    pub fn with_default(mut self, value: Value) -> Self {
        self.default = Default::Value(value);
        self
    }

    /// Deserialization-time fallback; a node without one is required.
    pub fn with_missing(mut self, value: Value) -> Self {
        self.missing = Missing::Value(value);
        self
    }

    pub fn with_validator(mut self, validator: impl Validator + 'static) -> Self {
        self.validator = Some(Arc::new(validator));
        self
    }

    pub fn with_child(mut self, child: SchemaNode) -> Self {
        self.children.push(child);
        self
    }

    pub fn with_children(mut self, children: impl IntoIterator<Item = SchemaNode>) -> Self {
        self.children.extend(children);
        self
    }

    /// Append a subnode; authoring order is the declared order.
    pub fn add(&mut self, child: SchemaNode) {
        self.children.push(child);
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn typ(&self) -> &dyn Type {
        self.typ.as_ref()
    }

    pub fn default(&self) -> &Default {
        &self.default
    }

    pub fn missing(&self) -> &Missing {
        &self.missing
    }

    pub fn children(&self) -> &[SchemaNode] {
        &self.children
    }

    /// Look up a child by name.
    pub fn child(&self, name: &str) -> Option<&SchemaNode> {
        self.children.iter().find(|c| c.name == name)
    }

    /// True when absence during deserialization is an error.
    pub fn required(&self) -> bool {
        matches!(self.missing, Missing::Required)
    }

    /// Coerce a wire-shaped value into the application shape.
    ///
    /// The null sentinel never reaches the type handler: it resolves
    /// straight to the missing-fallback, which is an absence failure when
    /// the node is required. Fallback values skip the validator. A scalar
    /// handler may itself hand back null (empty input) to land on the same
    /// path.
    pub fn deserialize(&self, cstruct: &Value) -> Result<Value, Invalid> {
        let appstruct = if cstruct.is_null() {
            Value::Null
        } else {
            self.typ.deserialize(self, cstruct)?
        };
        if appstruct.is_null() {
            return match &self.missing {
                Missing::Required => Err(Invalid::new(self, "Required")),
                Missing::Value(fallback) => Ok(fallback.clone()),
            };
        }
        if let Some(validator) = &self.validator {
            validator.validate(self, &appstruct)?;
        }
        Ok(appstruct)
    }

    /// Project an application value into the wire shape.
    ///
    /// A null input takes the node's default first when one is set; the
    /// type handler then sees either the substituted value or null (scalars
    /// emit null, composites push it down into their children).
    pub fn serialize(&self, appstruct: &Value) -> Result<Value, Invalid> {
        if appstruct.is_null() {
            if let Default::Value(value) = &self.default {
                return self.typ.serialize(self, value);
            }
        }
        self.typ.serialize(self, appstruct)
    }
}

impl fmt::Debug for SchemaNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SchemaNode")
            .field("typ", &self.typ)
            .field("name", &self.name)
            .field("default", &self.default)
            .field("missing", &self.missing)
            .field("children", &self.children)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::scalar::{Integer, Str};
    use crate::types::Mapping;
    use crate::validators::Range;

    #[test]
    fn required_iff_missing_is_the_required_sentinel() {
        let bare = SchemaNode::new(Integer);
        assert!(bare.required());
        let with_fallback = SchemaNode::new(Integer).with_missing(Value::Int(7));
        assert!(!with_fallback.required());
        let with_null_fallback = SchemaNode::new(Integer).with_missing(Value::Null);
        assert!(!with_null_fallback.required());
    }

    #[test]
    fn null_resolves_to_the_missing_fallback_without_coercion() {
        let node = SchemaNode::new(Integer).with_missing(Value::Int(42));
        assert_eq!(node.deserialize(&Value::Null).unwrap(), Value::Int(42));
    }

    #[test]
    fn null_against_a_required_node_is_an_absence_failure() {
        let node = SchemaNode::new(Integer).named("n");
        let err = node.deserialize(&Value::Null).unwrap_err();
        assert_eq!(err.messages(), ["Required"]);
    }

    #[test]
    fn explicit_null_fallback_round_trips() {
        let node = SchemaNode::new(Integer).with_missing(Value::Null);
        assert_eq!(node.deserialize(&Value::Null).unwrap(), Value::Null);
    }

    #[test]
    fn fallback_values_skip_the_validator() {
        // The fallback violates the range on purpose; it must pass through.
        let node = SchemaNode::new(Integer)
            .with_missing(Value::Int(-1))
            .with_validator(Range::new(Some(Value::Int(0)), None));
        assert_eq!(node.deserialize(&Value::Null).unwrap(), Value::Int(-1));
        assert!(node.deserialize(&Value::Int(-1)).is_err());
    }

    #[test]
    fn serialize_substitutes_the_default_for_null() {
        let node = SchemaNode::new(Str::new()).with_default(Value::String("fallback".into()));
        assert_eq!(
            node.serialize(&Value::Null).unwrap(),
            Value::String("fallback".into())
        );
    }

    #[test]
    fn serialize_without_default_passes_null_through() {
        let node = SchemaNode::new(Str::new());
        assert_eq!(node.serialize(&Value::Null).unwrap(), Value::Null);
    }

    #[test]
    fn clone_is_a_structural_copy() {
        let prototype = SchemaNode::new(Mapping::new())
            .with_child(SchemaNode::new(Integer).named("a"));
        let mut specialized = prototype.clone();
        specialized.add(SchemaNode::new(Integer).named("b").with_missing(Value::Int(0)));

        assert_eq!(prototype.children().len(), 1);
        assert_eq!(specialized.children().len(), 2);
        assert!(prototype.child("b").is_none());
    }
}
