//! Core types for the edit-operation vocabulary.

use docpatch_path::PathAddress;
use thiserror::Error;

use crate::tree::AttrMap;

// ── Errors ────────────────────────────────────────────────────────────────

/// Classified failure of a single operation application.
///
/// Every variant except [`ApplyError::ForeignElement`] aborts the remaining
/// sequence; foreign-element failures are recoverable and are logged and
/// skipped by the sequence driver.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ApplyError {
    /// The address does not resolve to an existing node or insertion point.
    #[error("PATH_NOT_FOUND: {0}")]
    PathNotFound(PathAddress),

    /// The address resolves to a node of the wrong shape — a leaf where a
    /// container was required, or a container of the wrong kind.
    #[error("PATH_NOT_ADDRESSABLE: {0}")]
    PathNotAddressable(PathAddress),

    /// The operation would have to interpret, restructure, or clone a node
    /// outside the closed vocabulary. Recoverable: the caller logs and
    /// skips.
    #[error("FOREIGN_ELEMENT: <{tag}> at {path}")]
    ForeignElement { path: PathAddress, tag: String },

    /// A `move` whose destination falls inside the moved range.
    #[error("MOVE_TARGET_INSIDE_RANGE: {to} within [{start}, {end})")]
    MoveTargetInsideRange {
        start: PathAddress,
        end: PathAddress,
        to: PathAddress,
    },
}

impl ApplyError {
    /// The address the failure is anchored to.
    pub fn path(&self) -> &PathAddress {
        match self {
            ApplyError::PathNotFound(path) => path,
            ApplyError::PathNotAddressable(path) => path,
            ApplyError::ForeignElement { path, .. } => path,
            ApplyError::MoveTargetInsideRange { to, .. } => to,
        }
    }
}

/// Wire-format parse or validation failure. Surfaced before any
/// application begins; the whole batch is rejected.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("MALFORMED_OPERATION: {0}")]
pub struct MalformedOperation(pub String);

impl MalformedOperation {
    /// Wrap a record-level reason with the record's index in the sequence.
    pub fn at(index: usize, reason: impl std::fmt::Display) -> Self {
        MalformedOperation(format!("record [index = {index}]: {reason}"))
    }
}

// ── Op ────────────────────────────────────────────────────────────────────

/// One atomic edit. Fields are fully validated at parse time, so the
/// applier never checks field presence.
#[derive(Debug, Clone, PartialEq)]
pub enum Op {
    /// Insert text at `start`: into a run at a character offset, or as a
    /// new run at a paragraph child index.
    InsertText { start: PathAddress, text: String },

    /// Remove the closed-open range `[start, end)`; `end` absent means the
    /// single node at `start`.
    Delete {
        start: PathAddress,
        end: Option<PathAddress>,
    },

    /// Remove `[start, end)` and reinsert it at `to`, where `to` is
    /// resolved against the tree state after the removal.
    Move {
        start: PathAddress,
        end: Option<PathAddress>,
        to: PathAddress,
    },

    /// Merge `attrs` into every node of the closed range `[start, end]`;
    /// `null` values unset keys.
    SetAttributes {
        start: PathAddress,
        end: Option<PathAddress>,
        attrs: AttrMap,
    },

    /// Split the paragraph addressed by `start[..n-1]` into two siblings at
    /// child offset `start[n-1]`.
    SplitParagraph { start: PathAddress },

    /// Merge the paragraph at `start` with its following sibling.
    MergeParagraph { start: PathAddress },

    /// Insert a drawing leaf at `start` with `attrs`.
    InsertDrawing { start: PathAddress, attrs: AttrMap },

    /// Insert an empty paragraph at `start`.
    InsertParagraph { start: PathAddress },

    /// Insert an empty table at `start`.
    InsertTable { start: PathAddress },

    /// Insert `count` empty rows at `start` (parent must be a table).
    InsertRows { start: PathAddress, count: usize },

    /// Insert `count` empty cells at `start` (parent must be a row).
    InsertCells { start: PathAddress, count: usize },
}

impl Op {
    /// The wire-format `name` of this operation kind.
    pub fn name(&self) -> &'static str {
        match self {
            Op::InsertText { .. } => "insertText",
            Op::Delete { .. } => "delete",
            Op::Move { .. } => "move",
            Op::SetAttributes { .. } => "setAttributes",
            Op::SplitParagraph { .. } => "splitParagraph",
            Op::MergeParagraph { .. } => "mergeParagraph",
            Op::InsertDrawing { .. } => "insertDrawing",
            Op::InsertParagraph { .. } => "insertParagraph",
            Op::InsertTable { .. } => "insertTable",
            Op::InsertRows { .. } => "insertRows",
            Op::InsertCells { .. } => "insertCells",
        }
    }

    /// The operation's start address.
    pub fn start(&self) -> &PathAddress {
        match self {
            Op::InsertText { start, .. } => start,
            Op::Delete { start, .. } => start,
            Op::Move { start, .. } => start,
            Op::SetAttributes { start, .. } => start,
            Op::SplitParagraph { start } => start,
            Op::MergeParagraph { start } => start,
            Op::InsertDrawing { start, .. } => start,
            Op::InsertParagraph { start } => start,
            Op::InsertTable { start } => start,
            Op::InsertRows { start, .. } => start,
            Op::InsertCells { start, .. } => start,
        }
    }
}

// ── Operation ─────────────────────────────────────────────────────────────

/// An [`Op`] plus provenance metadata.
///
/// `opl` (operation length) and `osn` (operation sequence number) are
/// carried through parse and encode for provenance only; they never
/// participate in application or equivalence comparison.
#[derive(Debug, Clone, PartialEq)]
pub struct Operation {
    pub op: Op,
    pub opl: Option<u64>,
    pub osn: Option<u64>,
}

impl Operation {
    pub fn new(op: Op) -> Self {
        Operation {
            op,
            opl: None,
            osn: None,
        }
    }
}

impl From<Op> for Operation {
    fn from(op: Op) -> Self {
        Operation::new(op)
    }
}
