//! docpatch — verify that structured documents survive an edit round-trip.
//!
//! A document is a tree of typed nodes addressed by integer position paths
//! ([`docpatch_path::PathAddress`]). Edits are a closed vocabulary of
//! operations with a JSON wire format. The library applies operation
//! sequences to a tree, persists the tree through a packaged container
//! format, re-extracts ("gathers") the canonical operation sequence from
//! the result, and decides whether two sequences are semantically
//! equivalent — the machinery behind load → apply → save → reload →
//! re-gather regression scenarios.

pub mod gather;
pub mod op;
pub mod regression;
pub mod roundtrip;
pub mod serializer;
pub mod tree;

pub use docpatch_path::PathAddress;

pub use gather::gather;
pub use op::{
    apply_all, apply_op, decode_sequence, encode_sequence, validate_sequence, ApplyError,
    ApplyReport, MalformedOperation, Op, Operation, SequenceError,
};
pub use regression::{compare, Verdict};
pub use roundtrip::{RoundtripHarness, RoundtripOutcome, ScenarioError};
pub use serializer::{ContainerSerializer, LoadError, SaveError, Serializer};
pub use tree::{DocumentTree, Node, TreeMismatch};
