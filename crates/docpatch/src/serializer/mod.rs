//! Document persistence.
//!
//! The [`Serializer`] trait is the external-collaborator boundary: load a
//! document from a fixture repository, save one to an output directory.
//! [`ContainerSerializer`] is the packaged JSON container implementation:
//!
//! ```json
//! {
//!   "version": 1,
//!   "content": ["body", null, ["paragraph", {"style": "title"}, "hello"]],
//!   "resources": {"img1.png": "<base64>"}
//! }
//! ```
//!
//! `content` is the tree as nested element arrays `[kind, attrs|null,
//! ...children]`; attribute-less text runs collapse to bare strings;
//! drawings are `["drawing", attrs]`; foreign nodes are
//! `["foreign", tag, payload]`, and any element with an unrecognized kind
//! tag loads as a foreign node carrying the whole element as payload.

use std::fs;
use std::path::{Path, PathBuf};

use base64::{engine::general_purpose::STANDARD as B64, Engine};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::tree::{
    attrs_from_value, attrs_to_value, canonical_value, AttrMap, ContainerKind, ContainerNode,
    DocumentTree, DrawingNode, ForeignNode, Node, TextNode,
};

pub const CONTAINER_VERSION: u64 = 1;

// ── Errors ────────────────────────────────────────────────────────────────

/// Failure restoring a document. Fatal to the scenario.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("LOAD_IO: {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("LOAD_JSON: {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("LOAD_CONTAINER: {0}")]
    Container(String),
}

/// Failure persisting a document. Fatal to the scenario.
#[derive(Debug, Error)]
pub enum SaveError {
    #[error("SAVE_IO: {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("SAVE_JSON: {source}")]
    Json {
        #[source]
        source: serde_json::Error,
    },
}

// ── Trait ─────────────────────────────────────────────────────────────────

/// Persistence boundary consumed by the round-trip harness.
pub trait Serializer {
    fn load(&self, source: &Path) -> Result<DocumentTree, LoadError>;
    fn save(&self, tree: &DocumentTree, dest: &Path) -> Result<(), SaveError>;
}

/// The packaged JSON container implementation.
#[derive(Debug, Clone, Copy, Default)]
pub struct ContainerSerializer;

impl ContainerSerializer {
    pub fn new() -> Self {
        ContainerSerializer
    }
}

impl Serializer for ContainerSerializer {
    fn load(&self, source: &Path) -> Result<DocumentTree, LoadError> {
        let text = fs::read_to_string(source).map_err(|e| LoadError::Io {
            path: source.to_path_buf(),
            source: e,
        })?;
        let value: Value = serde_json::from_str(&text).map_err(|e| LoadError::Json {
            path: source.to_path_buf(),
            source: e,
        })?;
        decode_container(&value)
    }

    fn save(&self, tree: &DocumentTree, dest: &Path) -> Result<(), SaveError> {
        let value = encode_container(tree);
        let text =
            serde_json::to_string_pretty(&value).map_err(|e| SaveError::Json { source: e })?;
        fs::write(dest, text).map_err(|e| SaveError::Io {
            path: dest.to_path_buf(),
            source: e,
        })
    }
}

// ── Encoding ──────────────────────────────────────────────────────────────

fn attrs_or_null(attrs: &AttrMap) -> Value {
    if attrs.is_empty() {
        Value::Null
    } else {
        attrs_to_value(attrs)
    }
}

/// Encode a tree as a container value (canonical: sorted attribute keys,
/// sorted resource names).
pub fn encode_container(tree: &DocumentTree) -> Value {
    let mut m = Map::new();
    m.insert("version".into(), Value::from(CONTAINER_VERSION));
    let mut body = vec![Value::String("body".into()), attrs_or_null(&tree.attrs)];
    body.extend(tree.children.iter().map(encode_node));
    m.insert("content".into(), Value::Array(body));
    if !tree.resources.is_empty() {
        let mut res = Map::new();
        for (name, bytes) in &tree.resources {
            res.insert(name.clone(), Value::String(B64.encode(bytes)));
        }
        m.insert("resources".into(), Value::Object(res));
    }
    Value::Object(m)
}

fn encode_node(node: &Node) -> Value {
    match node {
        Node::Container(c) => {
            let mut items = vec![
                Value::String(c.kind.as_str().to_string()),
                attrs_or_null(&c.attrs),
            ];
            items.extend(c.children.iter().map(encode_node));
            Value::Array(items)
        }
        Node::Text(t) if t.attrs.is_empty() => Value::String(t.text.clone()),
        Node::Text(t) => Value::Array(vec![
            Value::String("text".into()),
            attrs_to_value(&t.attrs),
            Value::String(t.text.clone()),
        ]),
        Node::Drawing(d) => Value::Array(vec![
            Value::String("drawing".into()),
            attrs_or_null(&d.attrs),
        ]),
        Node::Foreign(f) => Value::Array(vec![
            Value::String("foreign".into()),
            Value::String(f.tag.clone()),
            canonical_value(&f.payload),
        ]),
    }
}

// ── Decoding ──────────────────────────────────────────────────────────────

fn container_err(reason: impl Into<String>) -> LoadError {
    LoadError::Container(reason.into())
}

/// Decode a container value into a tree.
pub fn decode_container(v: &Value) -> Result<DocumentTree, LoadError> {
    let obj = v
        .as_object()
        .ok_or_else(|| container_err("container must be an object"))?;
    match obj.get("version").and_then(|v| v.as_u64()) {
        Some(CONTAINER_VERSION) => {}
        Some(other) => return Err(container_err(format!("unsupported version: {other}"))),
        None => return Err(container_err("missing 'version' field")),
    }
    let content = obj
        .get("content")
        .and_then(|v| v.as_array())
        .ok_or_else(|| container_err("'content' must be an element array"))?;
    if content.first().and_then(|v| v.as_str()) != Some("body") {
        return Err(container_err("'content' must be a body element"));
    }

    let mut tree = DocumentTree::new();
    tree.attrs = decode_attrs(content.get(1))?;
    tree.children = content
        .iter()
        .skip(2)
        .map(decode_node)
        .collect::<Result<_, _>>()?;

    if let Some(resources) = obj.get("resources") {
        let res = resources
            .as_object()
            .ok_or_else(|| container_err("'resources' must be an object"))?;
        for (name, payload) in res {
            let encoded = payload
                .as_str()
                .ok_or_else(|| container_err(format!("resource '{name}' must be a string")))?;
            let bytes = B64
                .decode(encoded)
                .map_err(|e| container_err(format!("resource '{name}': {e}")))?;
            tree.resources.insert(name.clone(), bytes);
        }
    }

    for name in referenced_resources(&tree.children) {
        if !tree.resources.contains_key(&name) {
            tracing::warn!(resource = %name, "drawing references a missing resource");
        }
    }
    Ok(tree)
}

fn decode_attrs(v: Option<&Value>) -> Result<AttrMap, LoadError> {
    match v {
        None | Some(Value::Null) => Ok(AttrMap::new()),
        Some(v) => attrs_from_value(v).map_err(container_err),
    }
}

fn decode_node(v: &Value) -> Result<Node, LoadError> {
    let items = match v {
        Value::String(text) => return Ok(Node::Text(TextNode::new(text.clone()))),
        Value::Array(items) => items,
        other => return Err(container_err(format!("unsupported node value: {other}"))),
    };
    let tag = items
        .first()
        .and_then(|v| v.as_str())
        .ok_or_else(|| container_err("element tag must be a string"))?;
    match tag {
        "text" => {
            let attrs = decode_attrs(items.get(1))?;
            let text = items
                .get(2)
                .and_then(|v| v.as_str())
                .ok_or_else(|| container_err("text element requires string content"))?;
            Ok(Node::Text(TextNode {
                text: text.to_string(),
                attrs,
            }))
        }
        "drawing" => Ok(Node::Drawing(DrawingNode::new(decode_attrs(items.get(1))?))),
        "foreign" => {
            let tag = items
                .get(1)
                .and_then(|v| v.as_str())
                .ok_or_else(|| container_err("foreign element requires a tag"))?;
            Ok(Node::Foreign(ForeignNode {
                tag: tag.to_string(),
                payload: items.get(2).cloned().unwrap_or(Value::Null),
            }))
        }
        other => match ContainerKind::from_str(other) {
            Some(kind) => {
                let attrs = decode_attrs(items.get(1))?;
                let children = items[2.min(items.len())..]
                    .iter()
                    .map(decode_node)
                    .collect::<Result<_, _>>()?;
                Ok(Node::Container(ContainerNode {
                    kind,
                    attrs,
                    children,
                }))
            }
            // a kind outside the vocabulary loads opaquely
            None => Ok(Node::Foreign(ForeignNode {
                tag: other.to_string(),
                payload: v.clone(),
            })),
        },
    }
}

fn referenced_resources(children: &[Node]) -> Vec<String> {
    let mut names = Vec::new();
    collect_resources(children, &mut names);
    names
}

fn collect_resources(children: &[Node], names: &mut Vec<String>) {
    for node in children {
        match node {
            Node::Drawing(d) => {
                if let Some(name) = d.resource() {
                    names.push(name.to_string());
                }
            }
            Node::Container(c) => collect_resources(&c.children, names),
            _ => {}
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────
