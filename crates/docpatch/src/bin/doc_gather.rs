//! `doc-gather` — extract the canonical operation sequence from a
//! container document.
//!
//! Usage:
//!   doc-gather < document.json
//!
//! The document is read from stdin; the sequence is written to stdout.

use std::io::{self, Read, Write};

use docpatch::gather::gather;
use docpatch::op::encode_sequence;
use docpatch::serializer::decode_container;

fn run(doc_text: &str) -> Result<String, String> {
    let doc_value: serde_json::Value =
        serde_json::from_str(doc_text.trim()).map_err(|e| format!("document: {e}"))?;
    let tree = decode_container(&doc_value).map_err(|e| e.to_string())?;
    let ops = gather(&tree);
    serde_json::to_string_pretty(&encode_sequence(&ops)).map_err(|e| e.to_string())
}

fn main() {
    let mut buf = String::new();
    if let Err(e) = io::stdin().read_to_string(&mut buf) {
        eprintln!("{e}");
        std::process::exit(1);
    }

    match run(&buf) {
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
