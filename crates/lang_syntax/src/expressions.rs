// ==============================================================================
// Expressions
// ==============================================================================
//
// Precedence climbing for binary operators, then postfix chains over primary
// expressions. Objects, arrays, argument lists and interpolation holes loop
// until their closing token and stop early at anything that can only close
// an enclosing construct, so one missing delimiter does not eat the file.

use crate::grammar::DECLARATION_KEYWORDS;
use crate::parser::Parser;
use crate::SyntaxKind::*;

/// Tokens that only ever close an enclosing construct.
const CLOSERS: &[crate::SyntaxKind] = &[EOF, INTERP_END, R_BRACE, R_BRACK, R_PAREN];

/// A line that starts a new declaration: a declaration keyword followed by a
/// name, or `targetScope =`.
pub(crate) fn at_declaration_start(p: &Parser) -> bool {
    if p.at_contextual("targetScope") {
        return p.nth(1) == EQ;
    }
    p.at(IDENT)
        && DECLARATION_KEYWORDS
            .iter()
            .any(|(kw, _, _)| p.at_contextual(kw))
        && p.nth(1) == IDENT
}

pub(crate) fn at_expr_start(p: &Parser) -> bool {
    let kind = p.current();
    kind.is_word()
        || matches!(
            kind,
            INTEGER | STRING_START | L_BRACE | L_BRACK | L_PAREN | BANG | MINUS
        )
}

pub(crate) fn expr(p: &mut Parser) {
    if !p.enter() {
        return;
    }
    let checkpoint = p.checkpoint();
    binary(p, 1);
    if p.at(QUESTION) {
        p.start_node_at(checkpoint, TERNARY_EXPR);
        p.bump();
        expr(p);
        p.expect(COLON);
        expr(p);
        p.finish_node();
    }
    p.leave();
}

// Every operator of a chain wraps the expression so far one level deeper and
// counts against the nesting limit.
fn binary(p: &mut Parser, min_prec: u8) {
    let checkpoint = p.checkpoint();
    unary(p);
    let mut wraps = 0;
    while let Some(prec) = p.current().binary_precedence() {
        if prec < min_prec || !p.enter() {
            break;
        }
        wraps += 1;
        p.start_node_at(checkpoint, BINARY_EXPR);
        p.bump();
        binary(p, prec + 1);
        p.finish_node();
    }
    p.leave_n(wraps);
}

fn unary(p: &mut Parser) {
    if !p.at_any(&[BANG, MINUS]) {
        postfix_expr(p);
        return;
    }
    if !p.enter() {
        return;
    }
    p.start_node(UNARY_EXPR);
    p.bump();
    unary(p);
    p.finish_node();
    p.leave();
}

/// Member, index and call chains. Like `binary`, each link is one level of
/// nesting.
pub(crate) fn postfix_expr(p: &mut Parser) {
    let checkpoint = p.checkpoint();
    primary(p);
    let mut wraps = 0;
    loop {
        let kind = p.current();
        if !matches!(kind, DOT | L_BRACK | L_PAREN) || !p.enter() {
            break;
        }
        wraps += 1;
        match kind {
            DOT => {
                p.start_node_at(checkpoint, PROPERTY_ACCESS);
                p.bump();
                if p.current().is_word() {
                    p.bump_remap(IDENT);
                } else {
                    p.missing("property name");
                }
                p.finish_node();
            }
            L_BRACK => {
                p.start_node_at(checkpoint, ARRAY_ACCESS);
                p.bump();
                expr(p);
                p.expect(R_BRACK);
                p.finish_node();
            }
            _ => {
                p.start_node_at(checkpoint, CALL_EXPR);
                arg_list(p);
                p.finish_node();
            }
        }
    }
    p.leave_n(wraps);
}

fn primary(p: &mut Parser) {
    match p.current() {
        INTEGER | TRUE_KW | FALSE_KW | NULL_KW => {
            p.start_node(LITERAL);
            p.bump();
            p.finish_node();
        }
        STRING_START => string(p),
        L_BRACE => object(p),
        L_BRACK if p.nth_at_contextual(1, "for") => for_expr(p),
        L_BRACK => array(p),
        L_PAREN => {
            p.start_node(PAREN_EXPR);
            p.bump();
            p.eat_newlines();
            expr(p);
            p.eat_newlines_before(R_PAREN);
            p.expect(R_PAREN);
            p.finish_node();
        }
        kind if kind.is_word() => {
            p.start_node(VARIABLE_ACCESS);
            p.bump_remap(IDENT);
            p.finish_node();
        }
        _ => p.missing("expression"),
    }
}

// =============================================================================
// Strings
// =============================================================================

pub(crate) fn string(p: &mut Parser) {
    p.start_node(STRING);
    p.bump();
    loop {
        match p.current() {
            STRING_TEXT => p.bump(),
            INTERP_START => interpolation(p),
            STRING_END => {
                p.bump();
                break;
            }
            _ => {
                p.error("unterminated string");
                break;
            }
        }
    }
    p.finish_node();
}

fn interpolation(p: &mut Parser) {
    p.start_node(INTERPOLATION);
    p.bump();
    p.eat_newlines();
    expr(p);
    p.eat_newlines();

    if !p.at_any(&[INTERP_END, EOF]) {
        p.error("unexpected tokens in interpolation");
        p.start_node(ERROR);
        let mut depth = 0u32;
        while !p.at(EOF) {
            match p.current() {
                INTERP_START => depth += 1,
                INTERP_END if depth == 0 => break,
                INTERP_END => depth -= 1,
                _ => {}
            }
            p.bump();
        }
        p.finish_node();
    }
    p.expect(INTERP_END);
    p.finish_node();
}

// =============================================================================
// Objects and arrays
// =============================================================================

fn object(p: &mut Parser) {
    p.start_node(OBJECT);
    p.bump();
    loop {
        match p.current() {
            NEWLINE | COMMA => p.bump(),
            R_BRACE => {
                p.bump();
                break;
            }
            kind if CLOSERS.contains(&kind) => {
                p.missing("'}'");
                break;
            }
            _ if at_declaration_start(p) => {
                p.missing("'}'");
                break;
            }
            kind if kind.is_word() || kind == STRING_START => property(p),
            _ => p.err_recover("expected a property", &[NEWLINE, COMMA, R_BRACE]),
        }
    }
    p.finish_node();
}

fn property(p: &mut Parser) {
    p.start_node(OBJECT_PROPERTY);
    p.start_node(PROPERTY_KEY);
    if p.at(STRING_START) {
        string(p);
    } else {
        p.bump_remap(IDENT);
    }
    p.finish_node();

    let has_colon = p.expect(COLON);
    if has_colon || !p.at_any(&[NEWLINE, COMMA, R_BRACE, EOF]) {
        expr(p);
    }
    if !p.at_any(&[NEWLINE, COMMA]) && !p.at_any(CLOSERS) {
        p.err_recover("expected a new line after the property", &[NEWLINE, COMMA, R_BRACE]);
    }
    p.finish_node();
}

fn array(p: &mut Parser) {
    p.start_node(ARRAY);
    p.bump();
    loop {
        match p.current() {
            NEWLINE | COMMA => p.bump(),
            R_BRACK => {
                p.bump();
                break;
            }
            kind if CLOSERS.contains(&kind) => {
                p.missing("']'");
                break;
            }
            _ if at_declaration_start(p) => {
                p.missing("']'");
                break;
            }
            _ if at_expr_start(p) => {
                p.start_node(ARRAY_ITEM);
                expr(p);
                p.finish_node();
            }
            _ => p.err_recover("expected an array item", &[NEWLINE, COMMA, R_BRACK]),
        }
    }
    p.finish_node();
}

fn for_expr(p: &mut Parser) {
    p.start_node(FOR_EXPR);
    p.bump();
    p.bump_remap(FOR_KW);

    if p.at(IDENT) && !p.at_contextual("in") {
        p.start_node(NAME);
        p.bump();
        p.finish_node();
    } else {
        p.missing("loop variable");
    }
    if p.at_contextual("in") {
        p.bump_remap(IN_KW);
    } else {
        p.missing("'in'");
    }
    expr(p);
    p.expect(COLON);
    p.eat_newlines();
    expr(p);

    if !p.at(R_BRACK) && !p.at(NEWLINE) && !p.at_any(CLOSERS) {
        p.err_recover("expected ']'", &[NEWLINE, R_BRACK]);
    }
    p.eat_newlines_before(R_BRACK);
    p.expect(R_BRACK);
    p.finish_node();
}

fn arg_list(p: &mut Parser) {
    p.start_node(ARG_LIST);
    p.bump();
    loop {
        match p.current() {
            NEWLINE | COMMA => p.bump(),
            R_PAREN => {
                p.bump();
                break;
            }
            kind if CLOSERS.contains(&kind) => {
                p.missing("')'");
                break;
            }
            _ if at_declaration_start(p) => {
                p.missing("')'");
                break;
            }
            _ if at_expr_start(p) => expr(p),
            _ => p.err_recover("expected an argument", &[NEWLINE, COMMA, R_PAREN]),
        }
    }
    p.finish_node();
}
