//! Operation gathering.
//!
//! Reconstructs, from a document tree, the canonical operation sequence
//! that rebuilds an equivalent tree from an empty document: a depth-first,
//! left-to-right walk emitting one insert per node at its running insertion
//! path, followed by one `setAttributes` per non-empty attribute set.
//!
//! Gathering is deterministic: structurally identical trees yield
//! sequences whose canonical encoding is byte-identical (attribute keys
//! are sorted by the codec, and nothing depends on in-memory map order).

use docpatch_path::PathAddress;

use crate::op::{Op, Operation};
use crate::tree::{ContainerKind, DocumentTree, Node};

/// Extract the canonical operation sequence for `tree`.
///
/// Foreign nodes cannot be reconstructed by the closed vocabulary; they are
/// skipped with a warning and later siblings shift down to the paths they
/// will occupy in the rebuilt tree.
pub fn gather(tree: &DocumentTree) -> Vec<Operation> {
    let mut ops = Vec::new();
    if !tree.attrs.is_empty() {
        ops.push(Operation::new(Op::SetAttributes {
            start: PathAddress::root(),
            end: None,
            attrs: tree.attrs.clone(),
        }));
    }
    gather_children(&tree.children, &PathAddress::root(), &mut ops);
    ops
}

fn gather_children(children: &[Node], base: &PathAddress, ops: &mut Vec<Operation>) {
    let mut index = 0;
    for node in children {
        let path = base.child(index);
        match node {
            Node::Container(c) => {
                let insert = match c.kind {
                    ContainerKind::Paragraph => Op::InsertParagraph { start: path.clone() },
                    ContainerKind::Table => Op::InsertTable { start: path.clone() },
                    ContainerKind::Row => Op::InsertRows {
                        start: path.clone(),
                        count: 1,
                    },
                    ContainerKind::Cell => Op::InsertCells {
                        start: path.clone(),
                        count: 1,
                    },
                };
                ops.push(insert.into());
                if !c.attrs.is_empty() {
                    ops.push(
                        Op::SetAttributes {
                            start: path.clone(),
                            end: None,
                            attrs: c.attrs.clone(),
                        }
                        .into(),
                    );
                }
                gather_children(&c.children, &path, ops);
            }
            Node::Text(t) => {
                ops.push(
                    Op::InsertText {
                        start: path.clone(),
                        text: t.text.clone(),
                    }
                    .into(),
                );
                if !t.attrs.is_empty() {
                    ops.push(
                        Op::SetAttributes {
                            start: path,
                            end: None,
                            attrs: t.attrs.clone(),
                        }
                        .into(),
                    );
                }
            }
            Node::Drawing(d) => {
                ops.push(
                    Op::InsertDrawing {
                        start: path,
                        attrs: d.attrs.clone(),
                    }
                    .into(),
                );
            }
            Node::Foreign(f) => {
                tracing::warn!(path = %path, tag = %f.tag, "skipping foreign element while gathering");
                continue;
            }
        }
        index += 1;
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::op::{apply_all, decode_sequence, encode_sequence};
    use crate::tree::{attrs_from_value, ContainerNode, ForeignNode, TextNode};
    use serde_json::json;

    fn build(ops: serde_json::Value) -> DocumentTree {
        let mut tree = DocumentTree::new();
        let ops = decode_sequence(&ops).unwrap();
        apply_all(&mut tree, &ops).unwrap();
        tree
    }

    #[test]
    fn empty_tree_gathers_to_empty_sequence() {
        assert_eq!(gather(&DocumentTree::new()), vec![]);
    }

    #[test]
    fn gather_emits_inserts_in_document_order() {
        let tree = build(json!([
            {"name": "insertParagraph", "start": [0]},
            {"name": "insertText", "start": [0, 0], "text": "hi"},
            {"name": "insertTable", "start": [1]},
            {"name": "insertRows", "start": [1, 0], "count": 2},
        ]));
        let names: Vec<&str> = gather(&tree).iter().map(|o| o.op.name()).collect();
        assert_eq!(
            names,
            vec![
                "insertParagraph",
                "insertText",
                "insertTable",
                "insertRows",
                "insertRows"
            ]
        );
    }

    #[test]
    fn gather_apply_rebuilds_an_equivalent_tree() {
        let tree = build(json!([
            {"name": "insertParagraph", "start": [0]},
            {"name": "setAttributes", "start": [0], "attrs": {"style": "title"}},
            {"name": "insertText", "start": [0, 0], "text": "report"},
            {"name": "setAttributes", "start": [0, 0], "attrs": {"bold": true}},
            {"name": "insertDrawing", "start": [0, 1], "attrs": {"resource": "img.png"}},
            {"name": "insertParagraph", "start": [1]},
        ]));
        let mut rebuilt = DocumentTree::new();
        apply_all(&mut rebuilt, &gather(&tree)).unwrap();
        assert!(tree.same_structure(&rebuilt));
    }

    #[test]
    fn root_attrs_gather_first() {
        let mut tree = DocumentTree::new();
        tree.attrs = attrs_from_value(&json!({"lang": "en"})).unwrap();
        let ops = gather(&tree);
        assert_eq!(ops.len(), 1);
        assert_eq!(ops[0].op.name(), "setAttributes");
        assert!(ops[0].op.start().is_root());
    }

    #[test]
    fn foreign_nodes_are_skipped_and_siblings_shift() {
        let mut tree = build(json!([
            {"name": "insertParagraph", "start": [0]},
            {"name": "insertParagraph", "start": [1]},
        ]));
        tree.children.insert(
            1,
            Node::Foreign(ForeignNode {
                tag: "chart".to_string(),
                payload: json!({}),
            }),
        );
        let ops = gather(&tree);
        assert_eq!(ops.len(), 2);
        assert_eq!(ops[1].op.start().as_slice(), &[1]);
    }

    #[test]
    fn gathering_is_deterministic_across_attr_insertion_orders() {
        let mut a = DocumentTree::new();
        let mut b = DocumentTree::new();
        let mut pa = ContainerNode::new(ContainerKind::Paragraph);
        pa.attrs = attrs_from_value(&json!({"a": 1, "b": 2})).unwrap();
        let mut pb = ContainerNode::new(ContainerKind::Paragraph);
        pb.attrs = attrs_from_value(&json!({"b": 2, "a": 1})).unwrap();
        a.children.push(Node::Container(pa));
        b.children.push(Node::Container(pb));
        a.children.push(Node::Text(TextNode::new("x")));
        b.children.push(Node::Text(TextNode::new("x")));

        let ea = serde_json::to_string(&encode_sequence(&gather(&a))).unwrap();
        let eb = serde_json::to_string(&encode_sequence(&gather(&b))).unwrap();
        assert_eq!(ea, eb);
    }
}
