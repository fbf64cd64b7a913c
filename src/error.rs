// src/error.rs
//! The failure tree.
//!
//! A failed coercion produces exactly one [`Invalid`] whose children mirror
//! the schema tree at the failing branches: composites capture every
//! per-child failure before surfacing their own aggregate, so a single pass
//! reports every independent problem in the input. Leaves carry messages;
//! [`Invalid::flatten`] turns the tree into a dotted-path report.
//!
//! An `Invalid` snapshots what it needs from its schema node (name and the
//! positional tag) instead of borrowing it, so failure trees own their data
//! outright and outlive the call that produced them. Children carry no
//! back-reference to their parent; flattening walks top-down, so the
//! parent's positional tag is always in hand when a child is keyed.

use crate::node::SchemaNode;
use indexmap::IndexMap;
use std::fmt;

#[derive(Debug, Clone)]
pub struct Invalid {
    node_name: String,
    /// Whether the node's type addresses children by position; drives the
    /// keying of this failure's children in `flatten`.
    positional: bool,
    msg: Vec<String>,
    pos: Option<usize>,
    children: Vec<Invalid>,
}

impl Invalid {
    /// A failure with a single message, attached at `node`.
    pub fn new(node: &SchemaNode, msg: impl Into<String>) -> Self {
        Self::with_messages(node, vec![msg.into()])
    }

    /// A failure carrying several messages at once (an all-of validator
    /// contributes one per rejected sub-validator).
    pub fn with_messages(node: &SchemaNode, msg: Vec<String>) -> Self {
        Invalid {
            node_name: node.name().to_owned(),
            positional: node.typ().positional(),
            msg,
            pos: None,
            children: Vec::new(),
        }
    }

    /// A message-less aggregation point for captured per-child failures.
    pub fn bare(node: &SchemaNode) -> Self {
        Self::with_messages(node, Vec::new())
    }

    pub fn node_name(&self) -> &str {
        &self.node_name
    }

    pub fn messages(&self) -> &[String] {
        &self.msg
    }

    /// Position among the parent's subnodes, recorded at `add` time.
    pub fn position(&self) -> Option<usize> {
        self.pos
    }

    pub fn children(&self) -> &[Invalid] {
        &self.children
    }

    /// Attach a child failure. `pos` is the child's position relative to the
    /// parent's other subnodes; when supplied it is recorded on the child
    /// and used as its key segment under a positional parent.
    pub fn add(&mut self, mut child: Invalid, pos: Option<usize>) {
        if pos.is_some() {
            child.pos = pos;
        }
        self.children.push(child);
    }

    pub(crate) fn push_message(&mut self, msg: String) {
        self.msg.push(msg);
    }

    /// Every root-to-leaf path through the failure tree, leftmost item the
    /// root and rightmost a leaf (any failure with no children). Recomputed
    /// from scratch on each call; failure trees are small and short-lived.
    pub fn paths(&self) -> Vec<Vec<&Invalid>> {
        fn traverse<'a>(
            node: &'a Invalid,
            stack: &mut Vec<&'a Invalid>,
            out: &mut Vec<Vec<&'a Invalid>>,
        ) {
            stack.push(node);
            if node.children.is_empty() {
                out.push(stack.clone());
            }
            for child in &node.children {
                traverse(child, stack, out);
            }
            stack.pop();
        }

        let mut out = Vec::new();
        traverse(self, &mut Vec::new(), &mut out);
        out
    }

    /// Flatten into a dotted-path → combined-message report with one entry
    /// per distinct leaf path, in traversal order.
    ///
    /// The key segment for a failure is its recorded position when the
    /// parent node's type is positional, otherwise its node name; the root
    /// contributes its own node name (usually empty, hence no segment).
    /// Empty segments are skipped; all non-empty messages along the path
    /// join with `"; "`.
    pub fn flatten(&self) -> IndexMap<String, String> {
        let mut report = IndexMap::new();
        for path in self.paths() {
            let mut keyparts: Vec<String> = Vec::new();
            let mut msgs: Vec<&str> = Vec::new();
            let mut parent: Option<&Invalid> = None;
            for exc in path {
                let positional_parent = parent.is_some_and(|p| p.positional);
                let segment = match exc.pos {
                    Some(pos) if positional_parent => pos.to_string(),
                    _ => exc.node_name.clone(),
                };
                if !segment.is_empty() {
                    keyparts.push(segment);
                }
                msgs.extend(exc.msg.iter().map(String::as_str).filter(|m| !m.is_empty()));
                parent = Some(exc);
            }
            report.insert(keyparts.join("."), msgs.join("; "));
        }
        report
    }
}

impl fmt::Display for Invalid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (key, msg)) in self.flatten().iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            if key.is_empty() {
                write!(f, "{msg}")?;
            } else {
                write!(f, "{key}: {msg}")?;
            }
        }
        Ok(())
    }
}

impl std::error::Error for Invalid {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::SchemaNode;
    use crate::types::scalar::{Integer, Str};
    use crate::types::{Mapping, Tuple};

    fn mapping_node(name: &str) -> SchemaNode {
        SchemaNode::new(Mapping::new()).named(name)
    }

    fn tuple_node(name: &str) -> SchemaNode {
        SchemaNode::new(Tuple::new()).named(name)
    }

    #[test]
    fn named_parent_keys_children_by_name() {
        let mut root = Invalid::bare(&mapping_node(""));
        root.add(
            Invalid::new(&SchemaNode::new(Integer).named("a"), "bad int"),
            Some(0),
        );
        root.add(
            Invalid::new(&SchemaNode::new(Str::new()).named("b"), "bad str"),
            Some(1),
        );
        let report = root.flatten();
        assert_eq!(report.get("a").map(String::as_str), Some("bad int"));
        assert_eq!(report.get("b").map(String::as_str), Some("bad str"));
    }

    #[test]
    fn positional_parent_keys_children_by_position() {
        let mut root = Invalid::bare(&tuple_node(""));
        root.add(
            Invalid::new(&SchemaNode::new(Integer).named("ignored"), "boom"),
            Some(0),
        );
        let report = root.flatten();
        assert_eq!(report.get("0").map(String::as_str), Some("boom"));
    }

    #[test]
    fn named_root_contributes_a_leading_segment() {
        let mut root = Invalid::bare(&tuple_node("point"));
        root.add(Invalid::new(&SchemaNode::new(Integer), "boom"), Some(1));
        let report = root.flatten();
        assert_eq!(report.get("point.1").map(String::as_str), Some("boom"));
    }

    #[test]
    fn messages_along_a_path_join_with_semicolons() {
        let mut root = Invalid::new(&mapping_node(""), "outer trouble");
        root.add(
            Invalid::new(&SchemaNode::new(Integer).named("a"), "inner trouble"),
            Some(0),
        );
        let report = root.flatten();
        assert_eq!(
            report.get("a").map(String::as_str),
            Some("outer trouble; inner trouble")
        );
    }

    #[test]
    fn paths_enumerate_every_leaf() {
        let mut root = Invalid::bare(&mapping_node(""));
        let mut nested = Invalid::bare(&tuple_node("pair"));
        nested.add(Invalid::new(&SchemaNode::new(Integer), "left"), Some(0));
        nested.add(Invalid::new(&SchemaNode::new(Integer), "right"), Some(1));
        root.add(nested, Some(0));
        root.add(
            Invalid::new(&SchemaNode::new(Str::new()).named("tag"), "bad tag"),
            Some(1),
        );

        let paths = root.paths();
        assert_eq!(paths.len(), 3);
        // Leftmost entry of every path is the root.
        assert!(paths.iter().all(|p| std::ptr::eq(p[0], &root)));

        let report = root.flatten();
        assert_eq!(report.get("pair.0").map(String::as_str), Some("left"));
        assert_eq!(report.get("pair.1").map(String::as_str), Some("right"));
        assert_eq!(report.get("tag").map(String::as_str), Some("bad tag"));
    }

    #[test]
    fn flatten_is_idempotent() {
        let mut root = Invalid::bare(&mapping_node(""));
        root.add(
            Invalid::new(&SchemaNode::new(Integer).named("a"), "boom"),
            Some(0),
        );
        assert_eq!(root.flatten(), root.flatten());
    }

    #[test]
    fn display_renders_the_flattened_report() {
        let mut root = Invalid::bare(&mapping_node(""));
        root.add(
            Invalid::new(&SchemaNode::new(Integer).named("a"), "boom"),
            Some(0),
        );
        assert_eq!(root.to_string(), "a: boom");
    }
}
