// ==============================================================================
// Source generators for property tests
// ==============================================================================
//
// Template-based generators for well-formed documents, plus a mutation layer
// that truncates or splices them so the parser and completion see the kind
// of half-typed text an editor sends.

use proptest::prelude::*;

pub fn arb_ident() -> impl Strategy<Value = String> {
    "[a-z][a-zA-Z0-9]{0,6}".prop_filter("reserved word", |s| {
        !matches!(
            s.as_str(),
            "true" | "false" | "null" | "param" | "var" | "output" | "resource" | "module"
                | "for" | "in" | "existing" | "targetScope"
        )
    })
}

fn arb_string_lit() -> impl Strategy<Value = String> {
    prop_oneof![
        "[a-z ]{0,8}".prop_map(|s| format!("'{s}'")),
        ("[a-z]{0,4}", arb_ident()).prop_map(|(s, id)| format!("'{s}${{{id}}}{s}'")),
        "[a-z]{0,6}".prop_map(|s| format!("'''\n{s}\n'''")),
    ]
}

fn arb_literal() -> impl Strategy<Value = String> {
    prop_oneof![
        (0..1000i64).prop_map(|n| n.to_string()),
        Just("true".to_string()),
        Just("false".to_string()),
        Just("null".to_string()),
        arb_string_lit(),
    ]
}

pub fn arb_expr() -> impl Strategy<Value = String> {
    let leaf = prop_oneof![arb_literal(), arb_ident()];
    leaf.prop_recursive(3, 16, 4, |inner| {
        prop_oneof![
            (inner.clone(), inner.clone()).prop_map(|(a, b)| format!("{a} + {b}")),
            (inner.clone(), inner.clone(), inner.clone())
                .prop_map(|(c, a, b)| format!("{c} ? {a} : {b}")),
            (arb_ident(), arb_ident()).prop_map(|(a, b)| format!("{a}.{b}")),
            (arb_ident(), proptest::collection::vec(inner.clone(), 0..3))
                .prop_map(|(f, args)| format!("{f}({})", args.join(", "))),
            proptest::collection::vec(inner.clone(), 0..3)
                .prop_map(|items| format!("[\n{}\n]", items.join("\n"))),
            (arb_ident(), inner.clone(), inner.clone())
                .prop_map(|(x, xs, body)| format!("[for {x} in {xs}: {body}]")),
            proptest::collection::vec((arb_ident(), inner.clone()), 0..3).prop_map(|props| {
                let body: String = props.iter().map(|(k, v)| format!("  {k}: {v}\n")).collect();
                format!("{{\n{body}}}")
            }),
            inner.prop_map(|e| format!("!({e})")),
        ]
    })
}

fn arb_declaration() -> impl Strategy<Value = String> {
    prop_oneof![
        (arb_ident(), arb_expr()).prop_map(|(n, e)| format!("var {n} = {e}")),
        (arb_ident(), "(string|int|bool|object|array)")
            .prop_map(|(n, t)| format!("@description('p')\nparam {n} {t}")),
        (arb_ident(), arb_expr()).prop_map(|(n, e)| format!("output {n} string = {e}")),
        (arb_ident(), arb_expr()).prop_map(|(n, e)| {
            format!("resource {n} 'Microsoft.Storage/storageAccounts@2023-01-01' = {{\n  name: {e}\n}}")
        }),
        (arb_ident(), arb_expr())
            .prop_map(|(n, e)| format!("module {n} './mod.bicep' = {{\n  params: {{\n    x: {e}\n  }}\n}}")),
        Just("targetScope = 'subscription'".to_string()),
        "// [a-z ]{0,10}".prop_map(|c| c.to_string()),
    ]
}

/// A well-formed document of a few declarations.
pub fn arb_source() -> impl Strategy<Value = String> {
    proptest::collection::vec(arb_declaration(), 0..5).prop_map(|decls| decls.join("\n"))
}

/// A document that has been cut off or had a random fragment spliced in,
/// the way it looks while someone is still typing.
pub fn arb_partial_source() -> impl Strategy<Value = String> {
    let fragment = prop_oneof![
        Just("'"),
        Just("${"),
        Just("{"),
        Just("}"),
        Just("["),
        Just("("),
        Just("."),
        Just(":"),
        Just("="),
        Just("@"),
        Just("\n"),
        Just("/*"),
        Just("'''"),
    ];
    (arb_source(), any::<prop::sample::Index>(), fragment, any::<bool>()).prop_map(
        |(src, idx, fragment, truncate)| {
            let boundaries: Vec<usize> = (0..=src.len()).filter(|&i| src.is_char_boundary(i)).collect();
            let at = boundaries[idx.index(boundaries.len())];
            if truncate {
                src[..at].to_string()
            } else {
                format!("{}{fragment}{}", &src[..at], &src[at..])
            }
        },
    )
}
