use std::path::PathBuf;

use ide::Suggestion;
use lang_ty::SchemaIndex;
use serde_json::Value;

pub fn schema() -> SchemaIndex {
    SchemaIndex::from_json(include_str!("../data/schema.json")).expect("fixture schema should load")
}

/// Strip the `|` cursor marker and return the source plus its byte offset.
pub fn at_marker(fixture: &str) -> (String, usize) {
    let offset = fixture.find('|').expect("fixture needs a | marker");
    (fixture.replacen('|', "", 1), offset)
}

pub fn data_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("data")
        .join(name)
}

/// The expected set stored in `tests/data/<name>`.
pub fn golden(name: &str) -> Value {
    let text = std::fs::read_to_string(data_path(name)).expect("golden file should exist");
    serde_json::from_str(&text.replace("\r\n", "\n")).expect("golden file should be JSON")
}

/// Serialized suggestions with replacement ranges removed, so a set can be
/// compared independently of where in a document it was requested.
pub fn comparable(items: &[Suggestion]) -> Value {
    let mut value = serde_json::to_value(items).expect("suggestions serialize");
    if let Value::Array(items) = &mut value {
        for item in items {
            if let Value::Object(fields) = item {
                fields.remove("replacementRange");
            }
        }
    }
    value
}
