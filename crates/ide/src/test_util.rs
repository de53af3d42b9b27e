use lang_syntax::TextSize;
use lang_ty::SchemaIndex;

use crate::{request_completions, CompletionConfig, Suggestion};

pub(crate) const SCHEMA_JSON: &str = include_str!("../tests/data/schema.json");

/// Strip the `|` cursor marker and return the source plus its offset.
pub(crate) fn at_marker(fixture: &str) -> (String, TextSize) {
    let offset = fixture.find('|').expect("fixture needs a | marker");
    (fixture.replacen('|', "", 1), TextSize::new(offset as u32))
}

pub(crate) fn fixture_schema() -> SchemaIndex {
    SchemaIndex::from_json(SCHEMA_JSON).expect("fixture schema should load")
}

pub(crate) fn complete(fixture: &str) -> Vec<Suggestion> {
    complete_with(fixture, &CompletionConfig::default())
}

pub(crate) fn complete_with(fixture: &str, config: &CompletionConfig) -> Vec<Suggestion> {
    let (src, offset) = at_marker(fixture);
    request_completions(&src, u32::from(offset) as usize, &fixture_schema(), config)
        .expect("marker offset should be valid")
}

pub(crate) fn labels(items: &[Suggestion]) -> Vec<&str> {
    items.iter().map(|s| s.label.as_str()).collect()
}
