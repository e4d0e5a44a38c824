//! Operation application.
//!
//! Applies one operation at a time, in place, against a [`DocumentTree`].
//! Each application is all-or-nothing: addressing is validated before the
//! first mutation, and the one two-phase case (`move`) restores the removed
//! range when the re-resolved destination turns out to be invalid.

use docpatch_path::PathAddress;

use super::types::{ApplyError, Op, Operation};
use crate::tree::{
    merge_attrs, AttrMap, ContainerKind, ContainerNode, DocumentTree, DrawingNode, Node, TextNode,
};

// ── Path navigation ───────────────────────────────────────────────────────

fn prefix(path: &PathAddress, len: usize) -> PathAddress {
    path.iter().take(len).collect()
}

/// Resolve a non-root path to its node. Descending into a text or drawing
/// leaf is `PathNotAddressable`; descending into a foreign node is the
/// recoverable `ForeignElement`.
fn node_at_mut<'a>(
    tree: &'a mut DocumentTree,
    path: &PathAddress,
) -> Result<&'a mut Node, ApplyError> {
    if path.is_root() {
        return Err(ApplyError::PathNotFound(path.clone()));
    }
    let mut children = &mut tree.children;
    for depth in 0..path.len() - 1 {
        let idx = path[depth];
        let node = children
            .get_mut(idx)
            .ok_or_else(|| ApplyError::PathNotFound(path.clone()))?;
        match node {
            Node::Container(c) => children = &mut c.children,
            Node::Foreign(f) => {
                return Err(ApplyError::ForeignElement {
                    path: prefix(path, depth + 1),
                    tag: f.tag.clone(),
                })
            }
            _ => return Err(ApplyError::PathNotAddressable(prefix(path, depth + 1))),
        }
    }
    let idx = path[path.len() - 1];
    children
        .get_mut(idx)
        .ok_or_else(|| ApplyError::PathNotFound(path.clone()))
}

/// Resolve a path to a child list: the root body for the empty path,
/// otherwise the children of the container at `path`.
fn children_at_mut<'a>(
    tree: &'a mut DocumentTree,
    path: &PathAddress,
) -> Result<&'a mut Vec<Node>, ApplyError> {
    if path.is_root() {
        return Ok(&mut tree.children);
    }
    match node_at_mut(tree, path)? {
        Node::Container(c) => Ok(&mut c.children),
        Node::Foreign(f) => Err(ApplyError::ForeignElement {
            path: path.clone(),
            tag: f.tag.clone(),
        }),
        _ => Err(ApplyError::PathNotAddressable(path.clone())),
    }
}

struct InsertionPoint<'a> {
    parent_kind: Option<ContainerKind>,
    children: &'a mut Vec<Node>,
    index: usize,
}

/// Resolve a path for insertion: the final index may equal the child count
/// (insertion at end). `parent_kind` is `None` for the root body.
fn insertion_point_mut<'a>(
    tree: &'a mut DocumentTree,
    path: &PathAddress,
) -> Result<InsertionPoint<'a>, ApplyError> {
    let (parent, index) = path
        .split_last()
        .ok_or_else(|| ApplyError::PathNotAddressable(path.clone()))?;
    let (parent_kind, children) = if parent.is_root() {
        (None, &mut tree.children)
    } else {
        match node_at_mut(tree, &parent)? {
            Node::Container(c) => (Some(c.kind), &mut c.children),
            Node::Foreign(f) => {
                return Err(ApplyError::ForeignElement {
                    path: parent,
                    tag: f.tag.clone(),
                })
            }
            _ => return Err(ApplyError::PathNotAddressable(parent)),
        }
    };
    if index > children.len() {
        return Err(ApplyError::PathNotFound(path.clone()));
    }
    Ok(InsertionPoint {
        parent_kind,
        children,
        index,
    })
}

fn byte_offset(s: &str, char_pos: usize) -> Option<usize> {
    let mut remaining = char_pos;
    for (i, _) in s.char_indices() {
        if remaining == 0 {
            return Some(i);
        }
        remaining -= 1;
    }
    if remaining == 0 {
        Some(s.len())
    } else {
        None
    }
}

fn parent_of(path: &PathAddress) -> PathAddress {
    path.parent().unwrap_or_else(PathAddress::root)
}

// ── Individual operation applicators ──────────────────────────────────────

fn apply_insert_text(
    tree: &mut DocumentTree,
    start: &PathAddress,
    text: &str,
) -> Result<(), ApplyError> {
    let (target, last) = start
        .split_last()
        .ok_or_else(|| ApplyError::PathNotAddressable(start.clone()))?;
    if target.is_root() {
        return Err(ApplyError::PathNotAddressable(target));
    }
    match node_at_mut(tree, &target)? {
        // addressed into an existing run: `last` is a character offset
        Node::Text(run) => {
            let at = byte_offset(&run.text, last)
                .ok_or_else(|| ApplyError::PathNotFound(start.clone()))?;
            run.text.insert_str(at, text);
            Ok(())
        }
        // addressed into a paragraph: `last` is a child insertion index
        Node::Container(c) if c.kind == ContainerKind::Paragraph => {
            if last > c.children.len() {
                return Err(ApplyError::PathNotFound(start.clone()));
            }
            c.children.insert(last, Node::Text(TextNode::new(text)));
            Ok(())
        }
        Node::Foreign(f) => Err(ApplyError::ForeignElement {
            path: target.clone(),
            tag: f.tag.clone(),
        }),
        _ => Err(ApplyError::PathNotAddressable(target)),
    }
}

fn apply_delete(
    tree: &mut DocumentTree,
    start: &PathAddress,
    end: Option<&PathAddress>,
) -> Result<(), ApplyError> {
    let Some(end) = end else {
        let (parent, idx) = start
            .split_last()
            .ok_or_else(|| ApplyError::PathNotAddressable(start.clone()))?;
        let children = children_at_mut(tree, &parent)?;
        if idx >= children.len() {
            return Err(ApplyError::PathNotFound(start.clone()));
        }
        children.remove(idx);
        return Ok(());
    };

    if end < start || start.len() != end.len() {
        return Err(ApplyError::PathNotAddressable(start.clone()));
    }
    let (sp, si) = start
        .split_last()
        .ok_or_else(|| ApplyError::PathNotAddressable(start.clone()))?;
    let (ep, ei) = end
        .split_last()
        .ok_or_else(|| ApplyError::PathNotAddressable(end.clone()))?;

    if sp == ep {
        return delete_same_parent(tree, &sp, si, ei, start, end);
    }

    // paragraph-spanning range one level deep
    if start.len() >= 2 {
        let (sgp, p) = sp.split_last().ok_or_else(|| ApplyError::PathNotAddressable(start.clone()))?;
        let (egp, q) = ep.split_last().ok_or_else(|| ApplyError::PathNotAddressable(end.clone()))?;
        if sgp == egp && p < q {
            return delete_spanning(tree, &sgp, (p, si), (q, ei), end);
        }
    }
    Err(ApplyError::PathNotAddressable(start.clone()))
}

fn delete_same_parent(
    tree: &mut DocumentTree,
    parent: &PathAddress,
    si: usize,
    ei: usize,
    start: &PathAddress,
    end: &PathAddress,
) -> Result<(), ApplyError> {
    if parent.is_root() {
        if ei > tree.children.len() {
            return Err(ApplyError::PathNotFound(end.clone()));
        }
        tree.children.drain(si..ei);
        return Ok(());
    }
    match node_at_mut(tree, parent)? {
        // character range within one run
        Node::Text(run) => {
            let from = byte_offset(&run.text, si)
                .ok_or_else(|| ApplyError::PathNotFound(start.clone()))?;
            let to = byte_offset(&run.text, ei)
                .ok_or_else(|| ApplyError::PathNotFound(end.clone()))?;
            run.text.replace_range(from..to, "");
            Ok(())
        }
        // sibling node range
        Node::Container(c) => {
            if ei > c.children.len() {
                return Err(ApplyError::PathNotFound(end.clone()));
            }
            c.children.drain(si..ei);
            Ok(())
        }
        Node::Foreign(f) => Err(ApplyError::ForeignElement {
            path: parent.clone(),
            tag: f.tag.clone(),
        }),
        _ => Err(ApplyError::PathNotAddressable(parent.clone())),
    }
}

/// Delete `[.., p, i)` through `[.., q, j)` where `p < q` are sibling
/// paragraphs: the tail of `p`, the paragraphs between, and the head of `q`
/// go away, and what remains of `q` merges into `p`.
fn delete_spanning(
    tree: &mut DocumentTree,
    grandparent: &PathAddress,
    (p, i): (usize, usize),
    (q, j): (usize, usize),
    end: &PathAddress,
) -> Result<(), ApplyError> {
    let children = children_at_mut(tree, grandparent)?;
    if q >= children.len() {
        return Err(ApplyError::PathNotFound(end.clone()));
    }
    for k in [p, q] {
        match &children[k] {
            Node::Container(c) if c.kind == ContainerKind::Paragraph => {}
            Node::Foreign(f) => {
                return Err(ApplyError::ForeignElement {
                    path: grandparent.child(k),
                    tag: f.tag.clone(),
                })
            }
            _ => return Err(ApplyError::PathNotAddressable(grandparent.child(k))),
        }
    }
    let (len_p, len_q) = match (&children[p], &children[q]) {
        (Node::Container(cp), Node::Container(cq)) => (cp.children.len(), cq.children.len()),
        _ => unreachable!(),
    };
    if i > len_p {
        return Err(ApplyError::PathNotFound(grandparent.child(p).child(i)));
    }
    if j > len_q {
        return Err(ApplyError::PathNotFound(end.clone()));
    }

    let mut tail = match &mut children[q] {
        Node::Container(cq) => {
            cq.children.drain(..j);
            std::mem::take(&mut cq.children)
        }
        _ => unreachable!(),
    };
    match &mut children[p] {
        Node::Container(cp) => {
            cp.children.truncate(i);
            cp.children.append(&mut tail);
        }
        _ => unreachable!(),
    }
    children.drain(p + 1..=q);
    Ok(())
}

fn apply_move(
    tree: &mut DocumentTree,
    start: &PathAddress,
    end: Option<&PathAddress>,
    to: &PathAddress,
) -> Result<(), ApplyError> {
    let (parent, i) = start
        .split_last()
        .ok_or_else(|| ApplyError::PathNotAddressable(start.clone()))?;
    let end_path = match end {
        Some(end) => end.clone(),
        None => parent.child(i + 1),
    };
    if start <= to && *to < end_path {
        return Err(ApplyError::MoveTargetInsideRange {
            start: start.clone(),
            end: end_path,
            to: to.clone(),
        });
    }
    let (eparent, j) = end_path
        .split_last()
        .ok_or_else(|| ApplyError::PathNotAddressable(end_path.clone()))?;
    if eparent != parent || j < i {
        return Err(ApplyError::PathNotAddressable(start.clone()));
    }

    let removed: Vec<Node> = {
        let children = children_at_mut(tree, &parent)?;
        if j > children.len() {
            return Err(ApplyError::PathNotFound(end_path.clone()));
        }
        children.drain(i..j).collect()
    };

    // `to` is defined on the post-removal tree
    match insertion_point_mut(tree, to) {
        Ok(point) => {
            for (k, node) in removed.into_iter().enumerate() {
                point.children.insert(point.index + k, node);
            }
            Ok(())
        }
        Err(e) => {
            let children = children_at_mut(tree, &parent)?;
            for (k, node) in removed.into_iter().enumerate() {
                children.insert(i + k, node);
            }
            Err(e)
        }
    }
}

fn apply_set_attributes(
    tree: &mut DocumentTree,
    start: &PathAddress,
    end: Option<&PathAddress>,
    attrs: &AttrMap,
) -> Result<(), ApplyError> {
    if start.is_root() {
        if end.is_some() {
            return Err(ApplyError::PathNotAddressable(start.clone()));
        }
        merge_attrs(&mut tree.attrs, attrs);
        return Ok(());
    }
    let Some(end) = end else {
        return match node_at_mut(tree, start)? {
            Node::Foreign(f) => Err(ApplyError::ForeignElement {
                path: start.clone(),
                tag: f.tag.clone(),
            }),
            node => {
                if let Some(target) = node.attrs_mut() {
                    merge_attrs(target, attrs);
                }
                Ok(())
            }
        };
    };

    // closed range [start, end] over siblings
    let (sp, i) = start
        .split_last()
        .ok_or_else(|| ApplyError::PathNotAddressable(start.clone()))?;
    let (ep, j) = end
        .split_last()
        .ok_or_else(|| ApplyError::PathNotAddressable(end.clone()))?;
    if sp != ep || j < i {
        return Err(ApplyError::PathNotAddressable(start.clone()));
    }
    let children = children_at_mut(tree, &sp)?;
    if j >= children.len() {
        return Err(ApplyError::PathNotFound(end.clone()));
    }
    for (k, child) in children[i..=j].iter().enumerate() {
        if let Node::Foreign(f) = child {
            return Err(ApplyError::ForeignElement {
                path: sp.child(i + k),
                tag: f.tag.clone(),
            });
        }
    }
    for child in &mut children[i..=j] {
        if let Some(target) = child.attrs_mut() {
            merge_attrs(target, attrs);
        }
    }
    Ok(())
}

fn apply_split_paragraph(tree: &mut DocumentTree, start: &PathAddress) -> Result<(), ApplyError> {
    let (para_path, off) = start
        .split_last()
        .ok_or_else(|| ApplyError::PathNotAddressable(start.clone()))?;
    let (parent, p) = para_path
        .split_last()
        .ok_or_else(|| ApplyError::PathNotAddressable(para_path.clone()))?;
    let children = children_at_mut(tree, &parent)?;
    if p >= children.len() {
        return Err(ApplyError::PathNotFound(para_path));
    }
    let right = match &mut children[p] {
        Node::Container(c) if c.kind == ContainerKind::Paragraph => {
            if off > c.children.len() {
                return Err(ApplyError::PathNotFound(start.clone()));
            }
            let tail = c.children.split_off(off);
            Node::Container(ContainerNode {
                kind: c.kind,
                attrs: c.attrs.clone(),
                children: tail,
            })
        }
        Node::Foreign(f) => {
            return Err(ApplyError::ForeignElement {
                path: para_path,
                tag: f.tag.clone(),
            })
        }
        _ => return Err(ApplyError::PathNotAddressable(para_path)),
    };
    children.insert(p + 1, right);
    Ok(())
}

fn apply_merge_paragraph(tree: &mut DocumentTree, start: &PathAddress) -> Result<(), ApplyError> {
    let (parent, p) = start
        .split_last()
        .ok_or_else(|| ApplyError::PathNotAddressable(start.clone()))?;
    let children = children_at_mut(tree, &parent)?;
    if p >= children.len() {
        return Err(ApplyError::PathNotFound(start.clone()));
    }
    if p + 1 >= children.len() {
        return Err(ApplyError::PathNotFound(parent.child(p + 1)));
    }
    for k in [p, p + 1] {
        match &children[k] {
            Node::Container(c) if c.kind == ContainerKind::Paragraph => {}
            Node::Foreign(f) => {
                return Err(ApplyError::ForeignElement {
                    path: parent.child(k),
                    tag: f.tag.clone(),
                })
            }
            _ => return Err(ApplyError::PathNotAddressable(parent.child(k))),
        }
    }
    let right = children.remove(p + 1);
    match (&mut children[p], right) {
        (Node::Container(left), Node::Container(right)) => {
            left.children.extend(right.children);
            Ok(())
        }
        _ => unreachable!(),
    }
}

fn apply_insert_drawing(
    tree: &mut DocumentTree,
    start: &PathAddress,
    attrs: &AttrMap,
) -> Result<(), ApplyError> {
    let point = insertion_point_mut(tree, start)?;
    if point.parent_kind != Some(ContainerKind::Paragraph) {
        return Err(ApplyError::PathNotAddressable(parent_of(start)));
    }
    let index = point.index;
    point
        .children
        .insert(index, Node::Drawing(DrawingNode::new(attrs.clone())));
    Ok(())
}

fn apply_insert_containers(
    tree: &mut DocumentTree,
    start: &PathAddress,
    kind: ContainerKind,
    count: usize,
) -> Result<(), ApplyError> {
    let point = insertion_point_mut(tree, start)?;
    let parent_ok = match kind {
        // block containers live in the body or inside a table cell
        ContainerKind::Paragraph | ContainerKind::Table => {
            matches!(point.parent_kind, None | Some(ContainerKind::Cell))
        }
        ContainerKind::Row => point.parent_kind == Some(ContainerKind::Table),
        ContainerKind::Cell => point.parent_kind == Some(ContainerKind::Row),
    };
    if !parent_ok {
        return Err(ApplyError::PathNotAddressable(parent_of(start)));
    }
    for k in 0..count {
        point
            .children
            .insert(point.index + k, Node::Container(ContainerNode::new(kind)));
    }
    Ok(())
}

// ── Dispatch ──────────────────────────────────────────────────────────────

/// Apply a single operation in place.
pub fn apply_op(tree: &mut DocumentTree, op: &Op) -> Result<(), ApplyError> {
    match op {
        Op::InsertText { start, text } => apply_insert_text(tree, start, text),
        Op::Delete { start, end } => apply_delete(tree, start, end.as_ref()),
        Op::Move { start, end, to } => apply_move(tree, start, end.as_ref(), to),
        Op::SetAttributes { start, end, attrs } => {
            apply_set_attributes(tree, start, end.as_ref(), attrs)
        }
        Op::SplitParagraph { start } => apply_split_paragraph(tree, start),
        Op::MergeParagraph { start } => apply_merge_paragraph(tree, start),
        Op::InsertDrawing { start, attrs } => apply_insert_drawing(tree, start, attrs),
        Op::InsertParagraph { start } => {
            apply_insert_containers(tree, start, ContainerKind::Paragraph, 1)
        }
        Op::InsertTable { start } => apply_insert_containers(tree, start, ContainerKind::Table, 1),
        Op::InsertRows { start, count } => {
            apply_insert_containers(tree, start, ContainerKind::Row, *count)
        }
        Op::InsertCells { start, count } => {
            apply_insert_containers(tree, start, ContainerKind::Cell, *count)
        }
    }
}

// ── Sequence driver ───────────────────────────────────────────────────────

/// One skipped operation that touched a foreign element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForeignSkip {
    pub index: usize,
    pub path: PathAddress,
    pub tag: String,
}

/// Outcome of applying a sequence.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApplyReport {
    pub applied: usize,
    pub skipped: Vec<ForeignSkip>,
}

/// A non-recoverable failure, with enough context to reproduce.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
#[error("operation [index = {index}] ({name}) failed: {source}")]
pub struct SequenceError {
    pub index: usize,
    pub name: &'static str,
    #[source]
    pub source: ApplyError,
}

/// Apply a sequence in order. Foreign-element failures are logged, recorded,
/// and skipped; any other failure aborts the remaining sequence.
pub fn apply_all(tree: &mut DocumentTree, ops: &[Operation]) -> Result<ApplyReport, SequenceError> {
    let mut report = ApplyReport::default();
    for (index, operation) in ops.iter().enumerate() {
        match apply_op(tree, &operation.op) {
            Ok(()) => report.applied += 1,
            Err(ApplyError::ForeignElement { path, tag }) => {
                tracing::warn!(
                    index,
                    path = %path,
                    tag = %tag,
                    "skipping operation on foreign element"
                );
                report.skipped.push(ForeignSkip { index, path, tag });
            }
            Err(source) => {
                return Err(SequenceError {
                    index,
                    name: operation.op.name(),
                    source,
                })
            }
        }
    }
    Ok(report)
}

// ── Tests ─────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::op::codec::decode_record;
    use crate::tree::ForeignNode;
    use serde_json::json;

    fn op(v: serde_json::Value) -> Op {
        decode_record(&v).expect("bad test record").op
    }

    fn apply(tree: &mut DocumentTree, v: serde_json::Value) -> Result<(), ApplyError> {
        apply_op(tree, &op(v))
    }

    fn must(tree: &mut DocumentTree, v: serde_json::Value) {
        apply(tree, v).unwrap();
    }

    /// body: [ paragraph ["hello", drawing], paragraph ["world"] ]
    fn two_paragraphs() -> DocumentTree {
        let mut tree = DocumentTree::new();
        must(&mut tree, json!({"name": "insertParagraph", "start": [0]}));
        must(&mut tree, json!({"name": "insertParagraph", "start": [1]}));
        must(&mut tree, json!({"name": "insertText", "start": [0, 0], "text": "hello"}));
        must(&mut tree, json!({"name": "insertDrawing", "start": [0, 1], "attrs": {"w": 10}}));
        must(&mut tree, json!({"name": "insertText", "start": [1, 0], "text": "world"}));
        tree
    }

    fn text_at(tree: &DocumentTree, para: usize, run: usize) -> &str {
        match &tree.children[para] {
            Node::Container(c) => match &c.children[run] {
                Node::Text(t) => &t.text,
                other => panic!("not a run: {}", other.label()),
            },
            other => panic!("not a container: {}", other.label()),
        }
    }

    // ── inserts ───────────────────────────────────────────────────────────

    #[test]
    fn insert_structure_and_text() {
        let tree = two_paragraphs();
        assert_eq!(tree.children.len(), 2);
        assert_eq!(text_at(&tree, 0, 0), "hello");
        assert_eq!(text_at(&tree, 1, 0), "world");
    }

    #[test]
    fn insert_text_mid_run_splices() {
        let mut tree = two_paragraphs();
        must(&mut tree, json!({"name": "insertText", "start": [0, 0, 4], "text": "!!"}));
        assert_eq!(text_at(&tree, 0, 0), "hell!!o");
    }

    #[test]
    fn insert_text_offset_past_end_fails() {
        let mut tree = two_paragraphs();
        let e = apply(&mut tree, json!({"name": "insertText", "start": [0, 0, 6], "text": "x"}));
        assert_eq!(e, Err(ApplyError::PathNotFound(vec![0, 0, 6].into())));
    }

    #[test]
    fn insert_text_at_body_level_is_not_addressable() {
        let mut tree = two_paragraphs();
        let e = apply(&mut tree, json!({"name": "insertText", "start": [2], "text": "x"}));
        assert_eq!(e, Err(ApplyError::PathNotAddressable(PathAddress::root())));
    }

    #[test]
    fn table_structure_requires_matching_parents() {
        let mut tree = DocumentTree::new();
        must(&mut tree, json!({"name": "insertTable", "start": [0]}));
        must(&mut tree, json!({"name": "insertRows", "start": [0, 0], "count": 2}));
        must(&mut tree, json!({"name": "insertCells", "start": [0, 0, 0], "count": 3}));
        // rows only go under tables
        let e = apply(&mut tree, json!({"name": "insertRows", "start": [1]}));
        assert!(matches!(e, Err(ApplyError::PathNotAddressable(_))));
        // paragraphs go inside cells
        must(&mut tree, json!({"name": "insertParagraph", "start": [0, 0, 0, 0]}));
        match &tree.children[0] {
            Node::Container(table) => {
                assert_eq!(table.kind, ContainerKind::Table);
                assert_eq!(table.children.len(), 2);
            }
            _ => panic!("expected table"),
        }
    }

    #[test]
    fn insert_past_end_of_children_fails() {
        let mut tree = DocumentTree::new();
        let e = apply(&mut tree, json!({"name": "insertParagraph", "start": [1]}));
        assert_eq!(e, Err(ApplyError::PathNotFound(vec![1].into())));
    }

    // ── delete ────────────────────────────────────────────────────────────

    #[test]
    fn delete_single_node() {
        let mut tree = two_paragraphs();
        must(&mut tree, json!({"name": "delete", "start": [0, 1]}));
        match &tree.children[0] {
            Node::Container(c) => assert_eq!(c.children.len(), 1),
            _ => panic!(),
        }
    }

    #[test]
    fn delete_sibling_range_is_closed_open() {
        let mut tree = two_paragraphs();
        must(&mut tree, json!({"name": "delete", "start": [0], "end": [1]}));
        assert_eq!(tree.children.len(), 1);
        assert_eq!(text_at(&tree, 0, 0), "world");
    }

    #[test]
    fn delete_character_range() {
        let mut tree = two_paragraphs();
        must(&mut tree, json!({"name": "delete", "start": [0, 0, 1], "end": [0, 0, 4]}));
        assert_eq!(text_at(&tree, 0, 0), "ho");
    }

    #[test]
    fn delete_across_paragraphs_merges_boundaries() {
        let mut tree = two_paragraphs();
        // drop the drawing at the end of paragraph 0; "world" merges up
        must(&mut tree, json!({"name": "delete", "start": [0, 1], "end": [1, 0]}));
        assert_eq!(tree.children.len(), 1);
        assert_eq!(text_at(&tree, 0, 0), "hello");
        assert_eq!(text_at(&tree, 0, 1), "world");
    }

    #[test]
    fn delete_mixed_depth_range_is_not_addressable() {
        let mut tree = two_paragraphs();
        let e = apply(&mut tree, json!({"name": "delete", "start": [0, 0], "end": [1]}));
        assert!(matches!(e, Err(ApplyError::PathNotAddressable(_))));
    }

    // ── move ──────────────────────────────────────────────────────────────

    #[test]
    fn move_reorders_paragraphs() {
        let mut tree = two_paragraphs();
        must(&mut tree, json!({"name": "move", "start": [1], "to": [0]}));
        assert_eq!(text_at(&tree, 0, 0), "world");
        assert_eq!(text_at(&tree, 1, 0), "hello");
    }

    #[test]
    fn move_destination_uses_post_removal_addressing() {
        let mut tree = two_paragraphs();
        // after removing paragraph 0, the end of the body is index 1
        must(&mut tree, json!({"name": "move", "start": [0], "to": [1]}));
        assert_eq!(text_at(&tree, 0, 0), "world");
        assert_eq!(text_at(&tree, 1, 0), "hello");
    }

    #[test]
    fn move_into_own_range_is_rejected() {
        let mut tree = two_paragraphs();
        let e = apply(&mut tree, json!({"name": "move", "start": [0], "end": [2], "to": [1, 0]}));
        assert!(matches!(e, Err(ApplyError::MoveTargetInsideRange { .. })));
        assert_eq!(tree.children.len(), 2);
    }

    #[test]
    fn failed_move_restores_the_tree() {
        let mut tree = two_paragraphs();
        let e = apply(&mut tree, json!({"name": "move", "start": [1], "to": [5]}));
        assert!(matches!(e, Err(ApplyError::PathNotFound(_))));
        assert_eq!(tree.children.len(), 2);
        assert_eq!(text_at(&tree, 1, 0), "world");
    }

    #[test]
    fn move_runs_between_paragraphs() {
        let mut tree = two_paragraphs();
        must(&mut tree, json!({"name": "move", "start": [0, 0], "to": [1, 1]}));
        assert_eq!(text_at(&tree, 1, 0), "world");
        assert_eq!(text_at(&tree, 1, 1), "hello");
    }

    // ── setAttributes ─────────────────────────────────────────────────────

    #[test]
    fn set_attributes_merges_and_unsets() {
        let mut tree = two_paragraphs();
        must(&mut tree, json!({"name": "setAttributes", "start": [0, 0], "attrs": {"bold": true, "size": 11}}));
        must(&mut tree, json!({"name": "setAttributes", "start": [0, 0], "attrs": {"size": null, "italic": true}}));
        match &tree.children[0] {
            Node::Container(c) => match &c.children[0] {
                Node::Text(t) => {
                    assert_eq!(t.attrs.get("bold"), Some(&json!(true)));
                    assert_eq!(t.attrs.get("italic"), Some(&json!(true)));
                    assert_eq!(t.attrs.get("size"), None);
                }
                _ => panic!(),
            },
            _ => panic!(),
        }
    }

    #[test]
    fn set_attributes_over_closed_range() {
        let mut tree = two_paragraphs();
        must(&mut tree, json!({"name": "setAttributes", "start": [0], "end": [1], "attrs": {"align": "left"}}));
        for child in &tree.children {
            assert_eq!(child.attrs().unwrap().get("align"), Some(&json!("left")));
        }
    }

    #[test]
    fn set_attributes_on_root() {
        let mut tree = DocumentTree::new();
        must(&mut tree, json!({"name": "setAttributes", "start": [], "attrs": {"lang": "en"}}));
        assert_eq!(tree.attrs.get("lang"), Some(&json!("en")));
    }

    // ── split / merge ─────────────────────────────────────────────────────

    #[test]
    fn split_then_merge_restores_shape() {
        let mut tree = two_paragraphs();
        must(&mut tree, json!({"name": "setAttributes", "start": [0], "attrs": {"style": "body"}}));
        must(&mut tree, json!({"name": "splitParagraph", "start": [0, 1]}));
        assert_eq!(tree.children.len(), 3);
        // the right sibling inherits the paragraph attrs
        assert_eq!(tree.children[1].attrs().unwrap().get("style"), Some(&json!("body")));
        must(&mut tree, json!({"name": "mergeParagraph", "start": [0]}));
        assert_eq!(tree.children.len(), 2);
        assert_eq!(text_at(&tree, 0, 0), "hello");
    }

    #[test]
    fn split_non_paragraph_is_not_addressable() {
        let mut tree = DocumentTree::new();
        must(&mut tree, json!({"name": "insertTable", "start": [0]}));
        let e = apply(&mut tree, json!({"name": "splitParagraph", "start": [0, 0]}));
        assert_eq!(e, Err(ApplyError::PathNotAddressable(vec![0].into())));
    }

    #[test]
    fn merge_without_following_sibling_fails() {
        let mut tree = DocumentTree::new();
        must(&mut tree, json!({"name": "insertParagraph", "start": [0]}));
        let e = apply(&mut tree, json!({"name": "mergeParagraph", "start": [0]}));
        assert_eq!(e, Err(ApplyError::PathNotFound(vec![1].into())));
    }

    // ── foreign elements ──────────────────────────────────────────────────

    fn with_foreign() -> DocumentTree {
        let mut tree = two_paragraphs();
        tree.children.insert(
            1,
            Node::Foreign(ForeignNode {
                tag: "smartArt".to_string(),
                payload: json!({"xml": "<sa/>"}),
            }),
        );
        tree
    }

    #[test]
    fn descending_into_foreign_is_recoverable() {
        let mut tree = with_foreign();
        let e = apply(&mut tree, json!({"name": "insertText", "start": [1, 0], "text": "x"}));
        assert_eq!(
            e,
            Err(ApplyError::ForeignElement {
                path: vec![1].into(),
                tag: "smartArt".to_string()
            })
        );
    }

    #[test]
    fn deleting_a_whole_foreign_node_is_allowed() {
        let mut tree = with_foreign();
        must(&mut tree, json!({"name": "delete", "start": [1]}));
        assert_eq!(tree.children.len(), 2);
    }

    #[test]
    fn moving_a_whole_foreign_node_is_allowed() {
        let mut tree = with_foreign();
        must(&mut tree, json!({"name": "move", "start": [1], "to": [2]}));
        assert!(matches!(tree.children[2], Node::Foreign(_)));
    }

    #[test]
    fn sequence_skips_foreign_failures_and_continues() {
        let mut tree = with_foreign();
        let ops: Vec<Operation> = [
            json!({"name": "setAttributes", "start": [1], "attrs": {"x": 1}}),
            json!({"name": "insertText", "start": [0, 0, 5], "text": "!"}),
        ]
        .iter()
        .map(|v| decode_record(v).unwrap())
        .collect();
        let report = apply_all(&mut tree, &ops).unwrap();
        assert_eq!(report.applied, 1);
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.skipped[0].index, 0);
        assert_eq!(report.skipped[0].tag, "smartArt");
        assert_eq!(text_at(&tree, 0, 0), "hello!");
    }

    #[test]
    fn non_foreign_failure_aborts_with_context() {
        let mut tree = DocumentTree::new();
        let ops: Vec<Operation> = [
            json!({"name": "insertParagraph", "start": [0]}),
            json!({"name": "delete", "start": [4]}),
            json!({"name": "insertParagraph", "start": [1]}),
        ]
        .iter()
        .map(|v| decode_record(v).unwrap())
        .collect();
        let e = apply_all(&mut tree, &ops).unwrap_err();
        assert_eq!(e.index, 1);
        assert_eq!(e.name, "delete");
        assert_eq!(tree.children.len(), 1);
    }
}
