// ==============================================================================
// Declarations
// ==============================================================================
//
// Top-level structure: a sequence of newline-separated declarations, each
// optionally preceded by decorators. Declaration keywords are plain
// identifiers in the lexer and are re-tagged here.

use crate::expressions::{self, at_declaration_start};
use crate::parser::Parser;
use crate::SyntaxKind::{self, *};

/// The declaration keywords, with the node and keyword kinds they produce.
pub(crate) const DECLARATION_KEYWORDS: &[(&str, SyntaxKind, SyntaxKind)] = &[
    ("targetScope", TARGET_SCOPE_DECL, TARGET_SCOPE_KW),
    ("param", PARAM_DECL, PARAM_KW),
    ("var", VAR_DECL, VAR_KW),
    ("output", OUTPUT_DECL, OUTPUT_KW),
    ("resource", RESOURCE_DECL, RESOURCE_KW),
    ("module", MODULE_DECL, MODULE_KW),
];

pub(crate) fn program(p: &mut Parser) {
    p.start_root();
    loop {
        match p.current() {
            EOF => break,
            NEWLINE => p.bump(),
            _ => declaration(p),
        }
    }
    p.eat_trivia();
    p.finish_node();
}

fn declaration_keyword(p: &Parser) -> Option<(SyntaxKind, SyntaxKind)> {
    if !p.at(IDENT) {
        return None;
    }
    let text = p.current_text();
    DECLARATION_KEYWORDS
        .iter()
        .find(|(kw, _, _)| *kw == text)
        .map(|&(_, node, kw)| (node, kw))
}

fn declaration(p: &mut Parser) {
    let checkpoint = p.checkpoint();
    let mut decorated = false;
    while p.at(AT) {
        decorator(p);
        decorated = true;
        p.eat_newlines();
    }

    let Some((node, keyword)) = declaration_keyword(p) else {
        if !decorated || !p.at(EOF) {
            p.err_recover("expected a declaration", &[NEWLINE]);
        }
        return;
    };

    p.start_node_at(checkpoint, node);
    p.bump_remap(keyword);
    match node {
        TARGET_SCOPE_DECL => {
            p.expect(EQ);
            expressions::expr(p);
        }
        PARAM_DECL => {
            name(p);
            type_name(p);
            if p.eat(EQ) {
                expressions::expr(p);
            }
        }
        VAR_DECL => {
            name(p);
            p.expect(EQ);
            expressions::expr(p);
        }
        OUTPUT_DECL => {
            name(p);
            type_name(p);
            p.expect(EQ);
            expressions::expr(p);
        }
        RESOURCE_DECL => {
            name(p);
            quoted(p, RESOURCE_TYPE, "resource type");
            if p.at_contextual("existing") {
                p.bump_remap(EXISTING_KW);
            }
            p.expect(EQ);
            expressions::expr(p);
        }
        MODULE_DECL => {
            name(p);
            quoted(p, MODULE_PATH, "module path");
            p.expect(EQ);
            expressions::expr(p);
        }
        _ => {}
    }
    p.finish_node();

    // An unclosed object or array may already have consumed the newline.
    if !p.at_any(&[NEWLINE, EOF, AT]) && !at_declaration_start(p) {
        p.err_recover("expected a new line after the declaration", &[NEWLINE]);
    }
}

fn decorator(p: &mut Parser) {
    p.start_node(DECORATOR);
    p.bump();
    if p.at(IDENT) {
        expressions::postfix_expr(p);
    } else {
        p.missing("decorator name");
    }
    p.finish_node();
    if !p.at_any(&[NEWLINE, EOF]) {
        p.err_recover("expected a new line after the decorator", &[NEWLINE]);
    }
}

fn name(p: &mut Parser) {
    if p.at(IDENT) {
        p.start_node(NAME);
        p.bump();
        p.finish_node();
    } else {
        p.missing("name");
    }
}

fn type_name(p: &mut Parser) {
    if p.at(IDENT) {
        p.start_node(TYPE_NAME);
        p.bump();
        p.finish_node();
    } else {
        p.missing("type");
    }
}

/// A string in a declaration header: the resource type or module path.
fn quoted(p: &mut Parser, kind: SyntaxKind, what: &str) {
    if p.at(STRING_START) {
        p.start_node(kind);
        expressions::string(p);
        p.finish_node();
    } else {
        p.missing(what);
    }
}
