// ==============================================================================
// Property-based tests for the lexer, parser and position resolver
// ==============================================================================

use proptest::prelude::*;
use rowan::TextSize;

use crate::arbitrary::{arb_partial_source, arb_source};
use crate::lexer::tokenize;
use crate::{parse, resolve, SyntaxKind::*};

fn pbt_config() -> ProptestConfig {
    ProptestConfig {
        cases: std::env::var("PROPTEST_CASES")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(256),
        ..ProptestConfig::default()
    }
}

proptest! {
    #![proptest_config(pbt_config())]

    #[test]
    fn pbt_tokens_cover_text(src in arb_partial_source()) {
        let tokens = tokenize(&src);
        let joined: String = tokens.iter().map(|t| t.text.as_str()).collect();
        prop_assert_eq!(joined, src);
        prop_assert_eq!(tokens.last().map(|t| t.kind), Some(EOF));
    }

    #[test]
    fn pbt_tree_is_lossless(src in arb_partial_source()) {
        let root = parse(&src).syntax_node();
        prop_assert_eq!(root.to_string(), src.clone());
        prop_assert_eq!(u32::from(root.text_range().len()) as usize, src.len());
    }

    #[test]
    fn pbt_well_formed_sources_parse_cleanly(src in arb_source()) {
        let parse = parse(&src);
        prop_assert!(parse.errors().is_empty(), "{:?} in {}", parse.errors(), src);
    }

    #[test]
    fn pbt_children_are_contiguous(src in arb_partial_source()) {
        let root = parse(&src).syntax_node();
        for node in root.descendants() {
            let mut cursor = node.text_range().start();
            for child in node.children_with_tokens() {
                prop_assert_eq!(child.text_range().start(), cursor);
                cursor = child.text_range().end();
            }
            prop_assert_eq!(cursor, node.text_range().end());
        }
    }

    #[test]
    fn pbt_resolve_never_panics(src in arb_partial_source()) {
        let root = parse(&src).syntax_node();
        for offset in (0..=src.len()).filter(|&i| src.is_char_boundary(i)) {
            let pos = resolve(&root, TextSize::new(offset as u32));
            prop_assert!(pos.node.text_range().contains_inclusive(pos.offset));
        }
    }
}
