// src/lib.rs
//! Schema-driven bidirectional coercion for wire-shaped values.
//!
//! A schema is a tree of [`SchemaNode`]s, each binding a type handler
//! (scalar or composite), an optional validator, and fallbacks for both
//! directions. `deserialize` turns a wire value (nested maps / sequences /
//! scalars) into the application shape, validating along the way;
//! `serialize` is the inverse projection. Composites never stop at the
//! first bad child: every independent problem in one input surfaces in a
//! single [`Invalid`] tree, flattenable into a dotted-path report.
//!
//! ```
//! use shapecast::{Mapping, SchemaNode, Value, scalar};
//! use shapecast::validators::Range;
//!
//! let schema = SchemaNode::new(Mapping::new())
//!     .with_child(
//!         SchemaNode::new(scalar::Integer)
//!             .named("count")
//!             .with_validator(Range::new(Some(Value::Int(0)), None)),
//!     )
//!     .with_child(
//!         SchemaNode::new(scalar::Str::new())
//!             .named("label")
//!             .with_missing(Value::String("unlabeled".into())),
//!     );
//!
//! let doc = shapecast::json::from_json(&serde_json::json!({"count": "3"}));
//! match schema.deserialize(&doc).unwrap() {
//!     Value::Map(result) => {
//!         assert_eq!(result["count"], Value::Int(3));
//!         assert_eq!(result["label"], Value::String("unlabeled".into()));
//!     }
//!     other => panic!("expected a map, got {other}"),
//! }
//! ```

pub mod cli;
pub mod error;
pub mod json;
pub mod load;
pub mod node;
pub mod types;
pub mod validators;
pub mod value;

pub use error::Invalid;
pub use node::SchemaNode;
pub use types::scalar;
pub use types::{Mapping, Sequence, Tuple, Type, Unknown};
pub use value::{Missing, Value};
