//! Round-trip equivalence comparison.
//!
//! Two operation sequences are semantically equivalent when replaying each
//! onto a fresh empty tree yields structurally equal trees under the
//! canonical equality relation — textual identity is not required, and the
//! provenance fields (`opl`/`osn`) never participate.

use crate::op::{apply_all, Operation, SequenceError};
use crate::tree::{diff_first, DocumentTree, TreeMismatch};

/// The comparator's result: a verdict, not an exception. Mismatches carry
/// the first differing node path with rendered expected/actual summaries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Pass,
    Fail(TreeMismatch),
}

impl Verdict {
    pub fn is_pass(&self) -> bool {
        matches!(self, Verdict::Pass)
    }
}

impl std::fmt::Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Verdict::Pass => f.write_str("pass"),
            Verdict::Fail(m) => write!(f, "fail: {m}"),
        }
    }
}

/// Decide whether `expected` and `actual` are semantically equivalent.
///
/// An apply failure during either replay is itself a failing verdict (the
/// sequences cannot denote the same document), anchored at the failing
/// operation's address.
pub fn compare(expected: &[Operation], actual: &[Operation]) -> Verdict {
    let expected_tree = match replay(expected) {
        Ok(tree) => tree,
        Err(e) => return replay_failure("expected", e),
    };
    let actual_tree = match replay(actual) {
        Ok(tree) => tree,
        Err(e) => return replay_failure("actual", e),
    };
    match diff_first(&expected_tree, &actual_tree) {
        None => Verdict::Pass,
        Some(mismatch) => Verdict::Fail(mismatch),
    }
}

fn replay(ops: &[Operation]) -> Result<DocumentTree, SequenceError> {
    let mut tree = DocumentTree::new();
    apply_all(&mut tree, ops)?;
    Ok(tree)
}

fn replay_failure(which: &str, e: SequenceError) -> Verdict {
    Verdict::Fail(TreeMismatch {
        path: e.source.path().clone(),
        expected: format!("{which} sequence replays cleanly"),
        actual: e.to_string(),
    })
}

// ── Tests ─────────────────────────────────────────────────────────────────
