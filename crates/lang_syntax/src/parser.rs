// ==============================================================================
// Parser infrastructure
// ==============================================================================
//
// A hand-written recursive descent parser that feeds a rowan GreenNodeBuilder.
// The grammar functions live in `grammar.rs` and `expressions.rs`; this file
// only knows about tokens, trivia and tree building.
//
// The parser never fails. Missing elements become zero-length MISSING nodes
// and unexpected tokens are wrapped in ERROR nodes, so every input yields a
// tree that covers the whole text.

use miette::{Diagnostic, SourceSpan};
use rowan::{Checkpoint, GreenNode, GreenNodeBuilder, TextRange};
use thiserror::Error;

use crate::lexer::Token;
use crate::SyntaxKind::{self, *};
use crate::{ast, SyntaxNode};

/// Expression nesting past this depth is absorbed into an ERROR node.
pub(crate) const MAX_DEPTH: usize = 128;

/// Result of parsing one document: the green tree plus recoverable errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parse {
    green: GreenNode,
    errors: Vec<SyntaxError>,
}

impl Parse {
    pub fn syntax_node(&self) -> SyntaxNode {
        SyntaxNode::new_root(self.green.clone())
    }

    pub fn tree(&self) -> ast::Program {
        ast::Program::new(self.syntax_node())
    }

    pub fn errors(&self) -> &[SyntaxError] {
        &self.errors
    }
}

/// A recoverable syntax error. These are reported alongside the tree and
/// never stop parsing.
#[derive(Debug, Clone, PartialEq, Eq, Error, Diagnostic)]
#[error("{message}")]
#[diagnostic(code(lang_syntax::syntax_error))]
pub struct SyntaxError {
    pub message: String,
    pub range: TextRange,
    #[label("here")]
    span: SourceSpan,
}

impl SyntaxError {
    pub fn new(message: impl Into<String>, range: TextRange) -> Self {
        let start: usize = range.start().into();
        let len: usize = range.len().into();
        Self {
            message: message.into(),
            range,
            span: (start, len).into(),
        }
    }
}

pub(crate) struct Parser<'t> {
    tokens: &'t [Token],
    pos: usize,
    builder: GreenNodeBuilder<'static>,
    errors: Vec<SyntaxError>,
    depth: usize,
}

impl<'t> Parser<'t> {
    pub(crate) fn new(tokens: &'t [Token]) -> Self {
        Self {
            tokens,
            pos: 0,
            builder: GreenNodeBuilder::new(),
            errors: Vec::new(),
            depth: 0,
        }
    }

    pub(crate) fn finish(self) -> Parse {
        Parse {
            green: self.builder.finish(),
            errors: self.errors,
        }
    }

    // =========================================================================
    // Token inspection (trivia is skipped)
    // =========================================================================

    fn nth_token(&self, n: usize) -> Option<&'t Token> {
        self.tokens[self.pos.min(self.tokens.len())..]
            .iter()
            .filter(|t| !t.kind.is_trivia())
            .nth(n)
    }

    pub(crate) fn nth(&self, n: usize) -> SyntaxKind {
        self.nth_token(n).map_or(EOF, |t| t.kind)
    }

    pub(crate) fn current(&self) -> SyntaxKind {
        self.nth(0)
    }

    pub(crate) fn at(&self, kind: SyntaxKind) -> bool {
        self.current() == kind
    }

    pub(crate) fn at_any(&self, kinds: &[SyntaxKind]) -> bool {
        kinds.contains(&self.current())
    }

    /// True when the nth significant token is the identifier `kw`.
    pub(crate) fn nth_at_contextual(&self, n: usize, kw: &str) -> bool {
        self.nth_token(n)
            .is_some_and(|t| t.kind == IDENT && t.text == kw)
    }

    pub(crate) fn at_contextual(&self, kw: &str) -> bool {
        self.nth_at_contextual(0, kw)
    }

    pub(crate) fn current_text(&self) -> &'t str {
        self.nth_token(0).map_or("", |t| t.text.as_str())
    }

    fn current_range(&self) -> TextRange {
        self.nth_token(0)
            .map(|t| t.range)
            .or_else(|| self.tokens.last().map(|t| t.range))
            .unwrap_or_default()
    }

    // =========================================================================
    // Tree building
    // =========================================================================

    /// Emit pending trivia into the currently open node.
    pub(crate) fn eat_trivia(&mut self) {
        while let Some(token) = self.tokens.get(self.pos) {
            if !token.kind.is_trivia() {
                break;
            }
            self.builder.token(token.kind.into(), token.text.as_str());
            self.pos += 1;
        }
    }

    pub(crate) fn start_root(&mut self) {
        self.builder.start_node(ROOT.into());
    }

    pub(crate) fn start_node(&mut self, kind: SyntaxKind) {
        self.eat_trivia();
        self.builder.start_node(kind.into());
    }

    pub(crate) fn finish_node(&mut self) {
        self.builder.finish_node();
    }

    pub(crate) fn checkpoint(&mut self) -> Checkpoint {
        self.eat_trivia();
        self.builder.checkpoint()
    }

    pub(crate) fn start_node_at(&mut self, checkpoint: Checkpoint, kind: SyntaxKind) {
        self.builder.start_node_at(checkpoint, kind.into());
    }

    /// Consume the current significant token. EOF is never emitted.
    pub(crate) fn bump(&mut self) {
        let kind = self.current();
        self.bump_remap(kind);
    }

    /// Consume the current token, re-tagging it as `kind` (contextual keywords).
    pub(crate) fn bump_remap(&mut self, kind: SyntaxKind) {
        self.eat_trivia();
        let Some(token) = self.tokens.get(self.pos) else {
            return;
        };
        if token.kind == EOF {
            return;
        }
        self.builder.token(kind.into(), token.text.as_str());
        self.pos += 1;
    }

    pub(crate) fn eat(&mut self, kind: SyntaxKind) -> bool {
        if self.at(kind) {
            self.bump();
            true
        } else {
            false
        }
    }

    pub(crate) fn eat_newlines(&mut self) {
        while self.at(NEWLINE) {
            self.bump();
        }
    }

    /// Eat newlines only when `kind` follows them, so an unclosed construct
    /// does not swallow the separators before the next declaration.
    pub(crate) fn eat_newlines_before(&mut self, kind: SyntaxKind) {
        let mut n = 0;
        while self.nth(n) == NEWLINE {
            n += 1;
        }
        if n > 0 && self.nth(n) == kind {
            self.eat_newlines();
        }
    }

    /// Consume `kind` or leave a MISSING placeholder where it was expected.
    pub(crate) fn expect(&mut self, kind: SyntaxKind) -> bool {
        if self.eat(kind) {
            return true;
        }
        self.missing(kind.describe());
        false
    }

    /// Record an error and emit a zero-length MISSING node at the position
    /// where the next token would start.
    pub(crate) fn missing(&mut self, what: &str) {
        let found = self.current().describe();
        self.error(format!("expected {what}, found {found}"));
        self.start_node(MISSING);
        self.finish_node();
    }

    pub(crate) fn error(&mut self, message: impl Into<String>) {
        let range = self.current_range();
        let message = message.into();
        log::trace!("syntax error at {range:?}: {message}");
        self.errors.push(SyntaxError::new(message, range));
    }

    /// Record an error and wrap tokens in an ERROR node until one of
    /// `recovery` (or EOF) is reached. Always consumes at least one token
    /// unless already at a recovery point.
    pub(crate) fn err_recover(&mut self, message: impl Into<String>, recovery: &[SyntaxKind]) {
        self.error(message);
        if self.at(EOF) || self.at_any(recovery) {
            return;
        }
        self.start_node(ERROR);
        self.bump();
        while !self.at(EOF) && !self.at_any(recovery) {
            self.bump();
        }
        self.finish_node();
    }

    // =========================================================================
    // Nesting depth
    // =========================================================================

    /// Enter a nested construct. Returns false (and absorbs the rest of the
    /// line) when the nesting limit is exceeded.
    pub(crate) fn enter(&mut self) -> bool {
        if self.depth >= MAX_DEPTH {
            self.err_recover("nesting too deep", &[NEWLINE]);
            self.start_node(MISSING);
            self.finish_node();
            return false;
        }
        self.depth += 1;
        true
    }

    pub(crate) fn leave(&mut self) {
        self.leave_n(1);
    }

    pub(crate) fn leave_n(&mut self, levels: usize) {
        self.depth = self.depth.saturating_sub(levels);
    }
}
