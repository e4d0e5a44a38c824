//! Document tree node types and attribute-map helpers.

use indexmap::IndexMap;
use serde_json::{Map, Value};

/// Per-node attribute mapping.
///
/// In-memory insertion order is preserved but carries no meaning; every
/// serialized form sorts keys (see [`attrs_to_value`]). Values are strings,
/// numbers, booleans, or nested mappings. `null` is not a stored value — it
/// is the unset marker inside a `setAttributes` payload.
pub type AttrMap = IndexMap<String, Value>;

// ── Kinds ─────────────────────────────────────────────────────────────────

/// The closed vocabulary of container kinds.
///
/// Every kind here has a creating operation, so a gathered operation
/// sequence can always rebuild the container structure it describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerKind {
    Paragraph,
    Table,
    Row,
    Cell,
}

impl ContainerKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContainerKind::Paragraph => "paragraph",
            ContainerKind::Table => "table",
            ContainerKind::Row => "row",
            ContainerKind::Cell => "cell",
        }
    }

    pub fn from_str(s: &str) -> Option<ContainerKind> {
        match s {
            "paragraph" => Some(ContainerKind::Paragraph),
            "table" => Some(ContainerKind::Table),
            "row" => Some(ContainerKind::Row),
            "cell" => Some(ContainerKind::Cell),
            _ => None,
        }
    }
}

// ── Nodes ─────────────────────────────────────────────────────────────────

/// A node in the document tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Container(ContainerNode),
    Text(TextNode),
    Drawing(DrawingNode),
    Foreign(ForeignNode),
}

/// An ordered container. Exclusively owns its children; the tree is acyclic
/// and addressed by position paths only, never by pointer.
#[derive(Debug, Clone, PartialEq)]
pub struct ContainerNode {
    pub kind: ContainerKind,
    pub attrs: AttrMap,
    pub children: Vec<Node>,
}

impl ContainerNode {
    pub fn new(kind: ContainerKind) -> Self {
        ContainerNode {
            kind,
            attrs: AttrMap::new(),
            children: Vec::new(),
        }
    }
}

/// A text run.
#[derive(Debug, Clone, PartialEq)]
pub struct TextNode {
    pub text: String,
    pub attrs: AttrMap,
}

impl TextNode {
    pub fn new(text: impl Into<String>) -> Self {
        TextNode {
            text: text.into(),
            attrs: AttrMap::new(),
        }
    }
}

/// An embedded-object leaf. A `"resource"` attribute, when present, names a
/// payload in the document's resource table (a non-owning reference).
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DrawingNode {
    pub attrs: AttrMap,
}

impl DrawingNode {
    pub fn new(attrs: AttrMap) -> Self {
        DrawingNode { attrs }
    }

    /// The resource name this drawing references, if any.
    pub fn resource(&self) -> Option<&str> {
        self.attrs.get("resource").and_then(|v| v.as_str())
    }
}

/// A node whose kind is outside the closed vocabulary. The payload is
/// preserved opaquely for fidelity and never interpreted; the tag is the
/// source format's kind name.
#[derive(Debug, Clone, PartialEq)]
pub struct ForeignNode {
    pub tag: String,
    pub payload: Value,
}

impl Node {
    /// Short human-readable label, used in diffs and error context.
    pub fn label(&self) -> String {
        match self {
            Node::Container(c) => format!("{} ({} children)", c.kind.as_str(), c.children.len()),
            Node::Text(t) => format!("text {:?}", t.text),
            Node::Drawing(_) => "drawing".to_string(),
            Node::Foreign(f) => format!("foreign <{}>", f.tag),
        }
    }

    /// The node's attribute map. `None` for foreign nodes, whose attributes
    /// live inside the opaque payload.
    pub fn attrs(&self) -> Option<&AttrMap> {
        match self {
            Node::Container(c) => Some(&c.attrs),
            Node::Text(t) => Some(&t.attrs),
            Node::Drawing(d) => Some(&d.attrs),
            Node::Foreign(_) => None,
        }
    }

    pub fn attrs_mut(&mut self) -> Option<&mut AttrMap> {
        match self {
            Node::Container(c) => Some(&mut c.attrs),
            Node::Text(t) => Some(&mut t.attrs),
            Node::Drawing(d) => Some(&mut d.attrs),
            Node::Foreign(_) => None,
        }
    }
}

// ── Attribute merge ───────────────────────────────────────────────────────

/// Merge `patch` into `target`: unspecified keys are untouched, `null`
/// removes a key, and nested mappings merge recursively.
pub fn merge_attrs(target: &mut AttrMap, patch: &AttrMap) {
    for (key, value) in patch {
        if value.is_null() {
            target.shift_remove(key);
            continue;
        }
        match (target.get_mut(key), value) {
            (Some(Value::Object(existing)), Value::Object(incoming)) => {
                merge_value_map(existing, incoming);
            }
            _ => {
                target.insert(key.clone(), value.clone());
            }
        }
    }
}

fn merge_value_map(target: &mut Map<String, Value>, patch: &Map<String, Value>) {
    for (key, value) in patch {
        if value.is_null() {
            target.remove(key);
            continue;
        }
        match (target.get_mut(key), value) {
            (Some(Value::Object(existing)), Value::Object(incoming)) => {
                merge_value_map(existing, incoming);
            }
            _ => {
                target.insert(key.clone(), value.clone());
            }
        }
    }
}

// ── Canonical serialization ───────────────────────────────────────────────

/// Recursively sort object keys so structurally equal values encode
/// byte-identically.
pub fn canonical_value(v: &Value) -> Value {
    match v {
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            let mut out = Map::new();
            for key in keys {
                out.insert(key.clone(), canonical_value(&map[key]));
            }
            Value::Object(out)
        }
        Value::Array(items) => Value::Array(items.iter().map(canonical_value).collect()),
        other => other.clone(),
    }
}

/// Encode an attribute map as a JSON object with sorted keys.
pub fn attrs_to_value(attrs: &AttrMap) -> Value {
    let mut keys: Vec<&String> = attrs.keys().collect();
    keys.sort();
    let mut out = Map::new();
    for key in keys {
        out.insert(key.clone(), canonical_value(&attrs[key]));
    }
    Value::Object(out)
}

/// Decode a JSON object into an attribute map.
pub fn attrs_from_value(v: &Value) -> Result<AttrMap, String> {
    let obj = v.as_object().ok_or("attrs must be an object")?;
    Ok(obj.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
}

// ── Tests ─────────────────────────────────────────────────────────────────
