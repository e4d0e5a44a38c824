//! Mutable hierarchical document structure.
//!
//! The tree owns its nodes exclusively (no aliasing, no parent pointers);
//! nodes are located by [`docpatch_path::PathAddress`] only. Resolution and
//! mutation live in [`crate::op::apply`]; this module owns the shape.

use std::collections::BTreeMap;

pub mod equal;
pub mod node;

pub use equal::{diff_first, TreeMismatch};
pub use node::{
    attrs_from_value, attrs_to_value, canonical_value, merge_attrs, AttrMap, ContainerKind,
    ContainerNode, DrawingNode, ForeignNode, Node, TextNode,
};

/// A document: body attributes, an ordered list of top-level nodes, and a
/// resource table for embedded-object payloads.
///
/// Path `[i]` addresses `children[i]`; the root itself is addressed by the
/// empty path. Resources are referenced by name from drawing nodes
/// (non-owning); operations cannot express resource payloads, so the table
/// is excluded from the canonical equality relation.
#[derive(Debug, Clone, Default)]
pub struct DocumentTree {
    pub attrs: AttrMap,
    pub children: Vec<Node>,
    pub resources: BTreeMap<String, Vec<u8>>,
}

impl DocumentTree {
    /// An empty document.
    pub fn new() -> Self {
        DocumentTree::default()
    }

    /// True when the document has no content, attributes, or resources.
    pub fn is_empty(&self) -> bool {
        self.attrs.is_empty() && self.children.is_empty() && self.resources.is_empty()
    }

    /// Canonical structural equality (attribute key order and resource
    /// payloads excluded).
    pub fn same_structure(&self, other: &DocumentTree) -> bool {
        equal::diff_first(self, other).is_none()
    }
}
