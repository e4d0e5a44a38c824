//! The round-trip scenario pipeline.
//!
//! load → (gather or parse supplied operations) → replay onto a fresh
//! empty tree → save → reload → re-gather → compare. One harness serves
//! one scenario directory; scenarios never share mutable state, so
//! independent scenarios may run on separate threads.

use std::path::{Path, PathBuf};

use serde_json::Value;
use thiserror::Error;

use crate::gather::gather;
use crate::op::{
    apply_all, decode_sequence, validate_sequence, ApplyReport, MalformedOperation, Operation,
    SequenceError,
};
use crate::regression::{compare, Verdict};
use crate::serializer::{LoadError, SaveError, Serializer};
use crate::tree::DocumentTree;

/// Fatal scenario failures. An [`crate::regression::Verdict`] mismatch is
/// not an error; it is the scenario's result.
#[derive(Debug, Error)]
pub enum ScenarioError {
    #[error(transparent)]
    Load(#[from] LoadError),
    #[error(transparent)]
    Save(#[from] SaveError),
    #[error(transparent)]
    Malformed(#[from] MalformedOperation),
    #[error(transparent)]
    Apply(#[from] SequenceError),
}

/// What one scenario produced: the equivalence verdict plus the apply
/// report (how many operations ran, which were skipped on foreign
/// elements).
#[derive(Debug)]
pub struct RoundtripOutcome {
    pub verdict: Verdict,
    pub report: ApplyReport,
}

/// Runs round-trip scenarios against one output directory.
pub struct RoundtripHarness<S> {
    pub serializer: S,
    pub output_dir: PathBuf,
}

impl<S: Serializer> RoundtripHarness<S> {
    pub fn new(serializer: S, output_dir: impl Into<PathBuf>) -> Self {
        RoundtripHarness {
            serializer,
            output_dir: output_dir.into(),
        }
    }

    /// Run one scenario.
    ///
    /// `sequences` are operation batches in wire form, validated and
    /// decoded up front — a malformed record rejects the whole run before
    /// any application. When no sequences are supplied, the baseline is
    /// gathered from the loaded source document instead.
    pub fn run(
        &self,
        source: &Path,
        scenario: &str,
        sequences: &[Value],
    ) -> Result<RoundtripOutcome, ScenarioError> {
        let source_tree = self.serializer.load(source)?;
        let baseline = if sequences.is_empty() {
            gather(&source_tree)
        } else {
            for seq in sequences {
                validate_sequence(seq)?;
            }
            let mut ops: Vec<Operation> = Vec::new();
            for seq in sequences {
                ops.extend(decode_sequence(seq)?);
            }
            ops
        };

        let mut replayed = DocumentTree::new();
        let report = apply_all(&mut replayed, &baseline)?;

        let dest = self.output_dir.join(format!("{scenario}.json"));
        self.serializer.save(&replayed, &dest)?;
        let reloaded = self.serializer.load(&dest)?;
        let regathered = gather(&reloaded);

        let verdict = compare(&baseline, &regathered);
        tracing::info!(
            scenario,
            pass = verdict.is_pass(),
            applied = report.applied,
            skipped = report.skipped.len(),
            "roundtrip scenario finished"
        );
        Ok(RoundtripOutcome { verdict, report })
    }
}
