//! The edit-operation vocabulary: types, wire codec, validation, and
//! application.
//!
//! # Operations
//!
//! Content: `insertText`, `insertDrawing`, `delete`, `move`.
//!
//! Structure: `insertParagraph`, `insertTable`, `insertRows`, `insertCells`,
//! `splitParagraph`, `mergeParagraph`.
//!
//! Formatting: `setAttributes`.

pub mod apply;
pub mod codec;
pub mod types;
pub mod validate;

pub use apply::{apply_all, apply_op, ApplyReport, ForeignSkip, SequenceError};
pub use codec::{decode_record, decode_sequence, encode_record, encode_sequence};
pub use types::{ApplyError, MalformedOperation, Op, Operation};
pub use validate::{validate_record, validate_sequence};
