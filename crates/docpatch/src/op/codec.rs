//! JSON wire codec for operation records.
//!
//! A sequence is a JSON array of records; each record is an object with a
//! `name` field naming the kind plus kind-specific fields (`start`, `end`,
//! `to`, `attrs`, `text`, `count`) and optional provenance (`opl`, `osn`).
//! Unknown fields are ignored. Encoding is canonical: fields in fixed
//! order, attribute keys sorted, defaults omitted — equal in-memory
//! sequences always encode byte-identically.

use docpatch_path::PathAddress;
use serde_json::{Map, Value};

use super::types::{MalformedOperation, Op, Operation};
use crate::tree::{attrs_from_value, attrs_to_value, AttrMap};

// ── Field helpers ─────────────────────────────────────────────────────────

fn err(reason: impl Into<String>) -> MalformedOperation {
    MalformedOperation(reason.into())
}

fn req_path(obj: &Map<String, Value>, key: &str) -> Result<PathAddress, MalformedOperation> {
    let v = obj
        .get(key)
        .ok_or_else(|| err(format!("missing '{key}' field")))?;
    PathAddress::from_value(v).map_err(|e| err(format!("invalid '{key}' field: {e}")))
}

fn opt_path(
    obj: &Map<String, Value>,
    key: &str,
) -> Result<Option<PathAddress>, MalformedOperation> {
    match obj.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(v) => PathAddress::from_value(v)
            .map(Some)
            .map_err(|e| err(format!("invalid '{key}' field: {e}"))),
    }
}

fn req_str(obj: &Map<String, Value>, key: &str) -> Result<String, MalformedOperation> {
    obj.get(key)
        .and_then(|v| v.as_str())
        .map(|s| s.to_string())
        .ok_or_else(|| err(format!("missing string '{key}' field")))
}

fn req_attrs(obj: &Map<String, Value>, key: &str) -> Result<AttrMap, MalformedOperation> {
    let v = obj
        .get(key)
        .ok_or_else(|| err(format!("missing '{key}' field")))?;
    attrs_from_value(v).map_err(|e| err(format!("invalid '{key}' field: {e}")))
}

fn opt_count(obj: &Map<String, Value>) -> Result<usize, MalformedOperation> {
    match obj.get("count") {
        None | Some(Value::Null) => Ok(1),
        Some(v) => v
            .as_u64()
            .map(|n| n as usize)
            .ok_or_else(|| err("invalid 'count' field")),
    }
}

fn opt_meta(obj: &Map<String, Value>, key: &str) -> Result<Option<u64>, MalformedOperation> {
    match obj.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(v) => v
            .as_u64()
            .map(Some)
            .ok_or_else(|| err(format!("invalid '{key}' field"))),
    }
}

// ── Deserialization ───────────────────────────────────────────────────────

/// Decode one operation record.
pub fn decode_record(v: &Value) -> Result<Operation, MalformedOperation> {
    let obj = v
        .as_object()
        .ok_or_else(|| err("operation must be an object"))?;
    let name = obj
        .get("name")
        .and_then(|v| v.as_str())
        .ok_or_else(|| err("missing 'name' field"))?;
    let start = req_path(obj, "start")?;

    let op = match name {
        "insertText" => Op::InsertText {
            start,
            text: req_str(obj, "text")?,
        },
        "delete" => Op::Delete {
            start,
            end: opt_path(obj, "end")?,
        },
        "move" => Op::Move {
            start,
            end: opt_path(obj, "end")?,
            to: req_path(obj, "to")?,
        },
        "setAttributes" => Op::SetAttributes {
            start,
            end: opt_path(obj, "end")?,
            attrs: req_attrs(obj, "attrs")?,
        },
        "splitParagraph" => Op::SplitParagraph { start },
        "mergeParagraph" => Op::MergeParagraph { start },
        "insertDrawing" => Op::InsertDrawing {
            start,
            attrs: req_attrs(obj, "attrs")?,
        },
        "insertParagraph" => Op::InsertParagraph { start },
        "insertTable" => Op::InsertTable { start },
        "insertRows" => Op::InsertRows {
            start,
            count: opt_count(obj)?,
        },
        "insertCells" => Op::InsertCells {
            start,
            count: opt_count(obj)?,
        },
        other => return Err(err(format!("unknown operation name: {other}"))),
    };

    Ok(Operation {
        op,
        opl: opt_meta(obj, "opl")?,
        osn: opt_meta(obj, "osn")?,
    })
}

/// Decode a sequence (JSON array of records). Errors carry the failing
/// record's index; the whole batch is rejected on the first failure.
pub fn decode_sequence(v: &Value) -> Result<Vec<Operation>, MalformedOperation> {
    let arr = v
        .as_array()
        .ok_or_else(|| err("operation sequence must be an array"))?;
    arr.iter()
        .enumerate()
        .map(|(i, record)| decode_record(record).map_err(|e| MalformedOperation::at(i, e.0)))
        .collect()
}

// ── Serialization ─────────────────────────────────────────────────────────

/// Encode one operation record in canonical form.
pub fn encode_record(operation: &Operation) -> Value {
    let mut m = Map::new();
    m.insert("name".into(), Value::String(operation.op.name().to_string()));
    m.insert("start".into(), operation.op.start().to_value());

    match &operation.op {
        Op::InsertText { text, .. } => {
            m.insert("text".into(), Value::String(text.clone()));
        }
        Op::Delete { end, .. } => {
            if let Some(end) = end {
                m.insert("end".into(), end.to_value());
            }
        }
        Op::Move { end, to, .. } => {
            if let Some(end) = end {
                m.insert("end".into(), end.to_value());
            }
            m.insert("to".into(), to.to_value());
        }
        Op::SetAttributes { end, attrs, .. } => {
            if let Some(end) = end {
                m.insert("end".into(), end.to_value());
            }
            m.insert("attrs".into(), attrs_to_value(attrs));
        }
        Op::SplitParagraph { .. } | Op::MergeParagraph { .. } => {}
        Op::InsertDrawing { attrs, .. } => {
            m.insert("attrs".into(), attrs_to_value(attrs));
        }
        Op::InsertParagraph { .. } | Op::InsertTable { .. } => {}
        Op::InsertRows { count, .. } | Op::InsertCells { count, .. } => {
            if *count != 1 {
                m.insert("count".into(), Value::from(*count as u64));
            }
        }
    }

    if let Some(opl) = operation.opl {
        m.insert("opl".into(), Value::from(opl));
    }
    if let Some(osn) = operation.osn {
        m.insert("osn".into(), Value::from(osn));
    }
    Value::Object(m)
}

/// Encode a sequence as a JSON array of records.
pub fn encode_sequence(ops: &[Operation]) -> Value {
    Value::Array(ops.iter().map(encode_record).collect())
}

// ── Tests ─────────────────────────────────────────────────────────────────
