// ==============================================================================
// Property-based tests for completion
// ==============================================================================
//
// Generates whole and truncated documents, then requests completions at
// every character boundary. Checks crash freedom and the shape guarantees of
// the result list; no assertions about which suggestions appear.

use lang_syntax::arbitrary::{arb_partial_source, arb_source};
use lang_syntax::{parse, resolve, TextSize};
use proptest::prelude::*;

use crate::test_util::fixture_schema;
use crate::{Analysis, CompletionConfig};

fn pbt_config() -> ProptestConfig {
    ProptestConfig {
        cases: std::env::var("PROPTEST_CASES")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(64),
        ..ProptestConfig::default()
    }
}

fn boundaries(src: &str) -> impl Iterator<Item = usize> + '_ {
    (0..=src.len()).filter(|&i| src.is_char_boundary(i))
}

fn snippet_configs() -> impl Strategy<Value = CompletionConfig> {
    (any::<bool>(), any::<bool>(), any::<bool>()).prop_map(|(snippets, case, decorators)| {
        CompletionConfig {
            snippets,
            case_sensitive_type_filter: case,
            decorators,
        }
    })
}

proptest! {
    #![proptest_config(pbt_config())]

    #[test]
    fn pbt_completion_no_crash(src in arb_partial_source(), config in snippet_configs()) {
        let schema = fixture_schema();
        let analysis = Analysis::new(src.clone());
        for offset in boundaries(&src) {
            prop_assert!(analysis.completions(offset, &schema, &config).is_ok());
        }
    }

    #[test]
    fn pbt_labels_sorted_and_unique(src in arb_source()) {
        let schema = fixture_schema();
        let analysis = Analysis::new(src.clone());
        let len = src.len() as u32;
        for offset in boundaries(&src) {
            let items = analysis.completions(offset, &schema, &CompletionConfig::default()).unwrap();
            for pair in items.windows(2) {
                prop_assert!(pair[0].label < pair[1].label, "{:?} at {} in {:?}", pair, offset, src);
            }
            for item in &items {
                if let Some(range) = item.replacement_range {
                    prop_assert!(range.start <= range.end && range.end <= len);
                }
                prop_assert!(!item.insert_text.contains('\r'));
            }
        }
    }

    #[test]
    fn pbt_completion_is_idempotent(src in arb_partial_source()) {
        let schema = fixture_schema();
        let config = CompletionConfig::default();
        let analysis = Analysis::new(src.clone());
        for offset in boundaries(&src) {
            let first = analysis.completions(offset, &schema, &config).unwrap();
            let second = analysis.completions(offset, &schema, &config).unwrap();
            prop_assert_eq!(first, second);
        }
    }

    #[test]
    fn pbt_string_bodies_and_comments_are_empty(src in arb_partial_source()) {
        let schema = fixture_schema();
        let config = CompletionConfig::default();
        let analysis = Analysis::new(src.clone());
        let root = parse(&src).syntax_node();
        for offset in boundaries(&src) {
            let pos = resolve(&root, TextSize::new(offset as u32));
            if pos.in_string_body() || pos.in_comment() {
                let items = analysis.completions(offset, &schema, &config).unwrap();
                prop_assert!(items.is_empty(), "{:?} at {} in {:?}", items, offset, src);
            }
        }
    }

    #[test]
    fn pbt_offsets_past_the_end_are_rejected(src in arb_partial_source(), extra in 1usize..8) {
        let analysis = Analysis::new(src.clone());
        let result = analysis.completions(src.len() + extra, &fixture_schema(), &CompletionConfig::default());
        prop_assert!(result.is_err());
    }
}
