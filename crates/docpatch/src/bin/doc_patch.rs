//! `doc-patch` — apply an operation sequence to a container document.
//!
//! Usage:
//!   doc-patch '<operations-array-json>'
//!
//! The document is read from stdin. The operations are the first argument.

use std::io::{self, Read, Write};

use docpatch::op::{apply_all, decode_sequence, validate_sequence};
use docpatch::serializer::{decode_container, encode_container};

fn run(doc_text: &str, ops_text: &str) -> Result<String, String> {
    let doc_value: serde_json::Value =
        serde_json::from_str(doc_text.trim()).map_err(|e| format!("document: {e}"))?;
    let ops_value: serde_json::Value =
        serde_json::from_str(ops_text).map_err(|e| format!("operations: {e}"))?;
    validate_sequence(&ops_value).map_err(|e| e.to_string())?;
    let ops = decode_sequence(&ops_value).map_err(|e| e.to_string())?;
    let mut tree = decode_container(&doc_value).map_err(|e| e.to_string())?;
    apply_all(&mut tree, &ops).map_err(|e| e.to_string())?;
    serde_json::to_string_pretty(&encode_container(&tree)).map_err(|e| e.to_string())
}

fn main() {
    let args: Vec<String> = std::env::args().collect();
    let ops_text = match args.get(1) {
        Some(p) => p.clone(),
        None => {
            eprintln!("First argument must be an operation sequence (JSON array).");
            std::process::exit(1);
        }
    };

    let mut buf = String::new();
    if let Err(e) = io::stdin().read_to_string(&mut buf) {
        eprintln!("{e}");
        std::process::exit(1);
    }

    match run(&buf, &ops_text) {
        Ok(result) => {
            io::stdout().write_all(result.as_bytes()).unwrap();
            io::stdout().write_all(b"\n").unwrap();
        }
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(1);
        }
    }
}
