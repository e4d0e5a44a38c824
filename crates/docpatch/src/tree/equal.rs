//! Canonical tree equality as a first-mismatch diff.
//!
//! Two trees are structurally equal when they have the same shape, the same
//! node kinds, the same text and foreign payloads, and the same attribute
//! maps up to key order. On mismatch the comparison stops at the first
//! differing node in document order and reports its path with rendered
//! expected/actual summaries.

use docpatch_path::PathAddress;

use super::node::{attrs_to_value, AttrMap, Node};
use super::DocumentTree;

/// The first point at which two trees disagree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeMismatch {
    pub path: PathAddress,
    pub expected: String,
    pub actual: String,
}

impl std::fmt::Display for TreeMismatch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "at {}: expected {}, got {}",
            self.path, self.expected, self.actual
        )
    }
}

fn render_attrs(attrs: &AttrMap) -> String {
    format!("attrs {}", attrs_to_value(attrs))
}

fn mismatch(path: &PathAddress, expected: String, actual: String) -> Option<TreeMismatch> {
    Some(TreeMismatch {
        path: path.clone(),
        expected,
        actual,
    })
}

/// Compare `expected` against `actual`, returning the first mismatch in
/// document order, or `None` when the trees are structurally equal.
pub fn diff_first(expected: &DocumentTree, actual: &DocumentTree) -> Option<TreeMismatch> {
    if expected.attrs != actual.attrs {
        return mismatch(
            &PathAddress::root(),
            render_attrs(&expected.attrs),
            render_attrs(&actual.attrs),
        );
    }
    diff_children(&expected.children, &actual.children, &PathAddress::root())
}

fn diff_children(
    expected: &[Node],
    actual: &[Node],
    base: &PathAddress,
) -> Option<TreeMismatch> {
    for (i, pair) in expected.iter().zip(actual.iter()).enumerate() {
        if let Some(m) = diff_node(pair.0, pair.1, &base.child(i)) {
            return Some(m);
        }
    }
    if expected.len() != actual.len() {
        let i = expected.len().min(actual.len());
        let describe = |nodes: &[Node]| match nodes.get(i) {
            Some(n) => n.label(),
            None => "end of children".to_string(),
        };
        return mismatch(&base.child(i), describe(expected), describe(actual));
    }
    None
}

fn diff_node(expected: &Node, actual: &Node, path: &PathAddress) -> Option<TreeMismatch> {
    match (expected, actual) {
        (Node::Container(a), Node::Container(b)) => {
            if a.kind != b.kind {
                return mismatch(path, expected.label(), actual.label());
            }
            if a.attrs != b.attrs {
                return mismatch(path, render_attrs(&a.attrs), render_attrs(&b.attrs));
            }
            diff_children(&a.children, &b.children, path)
        }
        (Node::Text(a), Node::Text(b)) => {
            if a.text != b.text {
                return mismatch(path, expected.label(), actual.label());
            }
            if a.attrs != b.attrs {
                return mismatch(path, render_attrs(&a.attrs), render_attrs(&b.attrs));
            }
            None
        }
        (Node::Drawing(a), Node::Drawing(b)) => {
            if a.attrs != b.attrs {
                return mismatch(path, render_attrs(&a.attrs), render_attrs(&b.attrs));
            }
            None
        }
        (Node::Foreign(a), Node::Foreign(b)) => {
            if a.tag != b.tag || a.payload != b.payload {
                return mismatch(path, expected.label(), actual.label());
            }
            None
        }
        _ => mismatch(path, expected.label(), actual.label()),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────
