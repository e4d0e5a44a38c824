//! Raw-record validation.
//!
//! Validates operation records in their wire form, before decoding, so
//! untrusted batches are rejected early with the failing record's index.
//! This includes the static rejections the applier would only discover
//! mid-sequence: reversed ranges and a `move` destination inside its own
//! source range.

use docpatch_path::PathAddress;
use serde_json::{Map, Value};

use super::types::MalformedOperation;

fn err(reason: impl Into<String>) -> MalformedOperation {
    MalformedOperation(reason.into())
}

/// Validate a whole sequence. An empty array is valid (the degenerate
/// "no edits" batch).
pub fn validate_sequence(v: &Value) -> Result<(), MalformedOperation> {
    let arr = v
        .as_array()
        .ok_or_else(|| err("operation sequence must be an array"))?;
    for (i, record) in arr.iter().enumerate() {
        validate_record(record).map_err(|e| MalformedOperation::at(i, e.0))?;
    }
    Ok(())
}

/// Validate a single record.
pub fn validate_record(v: &Value) -> Result<(), MalformedOperation> {
    let obj = v
        .as_object()
        .ok_or_else(|| err("operation must be an object"))?;
    let name = obj
        .get("name")
        .and_then(|v| v.as_str())
        .ok_or_else(|| err("missing 'name' field"))?;

    let start = path_field(obj, "start")?.ok_or_else(|| err("missing 'start' field"))?;
    let end = path_field(obj, "end")?;
    if let Some(end) = &end {
        if end < &start {
            return Err(err(format!("reversed range: end {end} precedes start {start}")));
        }
    }

    match name {
        "insertText" => {
            require_nonempty(&start)?;
            if !matches!(obj.get("text"), Some(Value::String(_))) {
                return Err(err("insertText requires a string 'text' field"));
            }
            Ok(())
        }
        "delete" => require_nonempty(&start),
        "move" => {
            require_nonempty(&start)?;
            let to = path_field(obj, "to")?.ok_or_else(|| err("move requires a 'to' field"))?;
            require_nonempty(&to)?;
            validate_move_target(&start, end.as_ref(), &to)
        }
        "setAttributes" => validate_attrs_field(obj, true),
        "splitParagraph" | "mergeParagraph" => require_nonempty(&start),
        "insertDrawing" => {
            require_nonempty(&start)?;
            validate_attrs_field(obj, false)
        }
        "insertParagraph" | "insertTable" => require_nonempty(&start),
        "insertRows" | "insertCells" => {
            require_nonempty(&start)?;
            validate_count_field(obj)
        }
        other => Err(err(format!("unknown operation name: {other}"))),
    }
}

// ── Field validators ──────────────────────────────────────────────────────

fn path_field(
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

fn require_nonempty(path: &PathAddress) -> Result<(), MalformedOperation> {
    if path.is_root() {
        return Err(err("'start' must not be the root path"));
    }
    Ok(())
}

/// Destination must not fall inside `[start, end)`. Lexicographic
/// containment also covers descendants of moved nodes.
fn validate_move_target(
    start: &PathAddress,
    end: Option<&PathAddress>,
    to: &PathAddress,
) -> Result<(), MalformedOperation> {
    let end = match end {
        Some(end) => end.clone(),
        None => match start.split_last() {
            Some((parent, idx)) => parent.child(idx + 1),
            None => return Ok(()),
        },
    };
    if start <= to && to < &end {
        return Err(err("cannot move a range into itself"));
    }
    Ok(())
}

fn validate_attrs_field(
    obj: &Map<String, Value>,
    allow_null_values: bool,
) -> Result<(), MalformedOperation> {
    let attrs = obj
        .get("attrs")
        .ok_or_else(|| err("missing 'attrs' field"))?;
    let map = attrs
        .as_object()
        .ok_or_else(|| err("'attrs' must be an object"))?;
    for (key, value) in map {
        validate_attr_value(value, allow_null_values)
            .map_err(|reason| err(format!("attribute '{key}': {reason}")))?;
    }
    Ok(())
}

fn validate_attr_value(v: &Value, allow_null: bool) -> Result<(), String> {
    match v {
        Value::Null => {
            if allow_null {
                Ok(())
            } else {
                Err("null is only meaningful in setAttributes".to_string())
            }
        }
        Value::Bool(_) | Value::Number(_) | Value::String(_) => Ok(()),
        Value::Object(map) => {
            for value in map.values() {
                validate_attr_value(value, allow_null)?;
            }
            Ok(())
        }
        Value::Array(_) => Err("attribute values may not be arrays".to_string()),
    }
}

fn validate_count_field(obj: &Map<String, Value>) -> Result<(), MalformedOperation> {
    match obj.get("count") {
        None | Some(Value::Null) => Ok(()),
        Some(v) if v.as_u64().is_some() => Ok(()),
        Some(_) => Err(err("'count' must be a non-negative integer")),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────
