// ==============================================================================
// Completion context classification
// ==============================================================================
//
// Looks at the tokens around the cursor and decides which kind of completion
// applies. The rules below are tried in order and the first match wins:
//
//   1. Resource type     inside a resource's type string, or where it is missing
//   2. Decorator name    right after `@`
//   3. Resource header   after a complete resource type string (`existing`)
//   4. Type name         after the name of a param or output
//   5. Property key      after `{`, `,` or a line break inside an object
//   6. Property value    after the `:` of an object property
//   7. Member access     after `.`
//   8. Resource body     after the `=` of a resource or module
//   9. Declarations      at the start of a top-level line, or in an empty file
//  10. Expression        after an operator, `=`, `(`, `,`, `[`, `${`, `in`
//
// Nothing matches right after a complete operand (`'a'|`, `1|`, `)|`), in
// the middle of a declaration header, or where a new name is being typed.
// Comments and string bodies never complete.

use lang_syntax::{
    ast, ResolvedPosition,
    SyntaxKind::{self, *},
    SyntaxNode, SyntaxToken, TextRange, TextSize,
};
use rowan::{ast::AstNode, TokenAtOffset};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextKind {
    ResourceType,
    DecoratorName,
    ResourceHeader,
    TypeName,
    PropertyKey,
    PropertyValue,
    MemberAccess,
    ResourceBody,
    Declarations,
    /// `array_start` is set directly after the `[` of an array, where a `for`
    /// loop may begin.
    Expression { array_start: bool },
}

#[derive(Debug, Clone)]
pub struct CompletionContext {
    pub kind: ContextKind,
    /// What the context is about: the resource declaration for type and
    /// header completions, the object for keys, the property for values, the
    /// access expression for members, the decorator, or the root.
    pub node: SyntaxNode,
    /// Innermost node at the cursor. Scope lookups start here.
    pub anchor: SyntaxNode,
    /// The span a picked suggestion replaces: the word under the cursor, the
    /// whole type string, or an empty range at the cursor.
    pub replacement: TextRange,
    /// Text already typed between the start of the replacement and the cursor.
    pub prefix: String,
    pub trigger: Option<char>,
}

const TRIGGER_CHARS: &[char] = &['.', '@', ':', '\'', '[', '{', '(', ',', '='];

/// Tokens around the cursor, computed once and shared by every rule.
struct Probe<'a> {
    root: &'a SyntaxNode,
    offset: TextSize,
    /// Identifier or keyword the cursor is inside of or at the end of.
    word: Option<SyntaxToken>,
    /// Closest non-trivia token before the word (or the cursor).
    prev_raw: Option<SyntaxToken>,
    /// Same as `prev_raw` with newlines skipped as well.
    prev: Option<SyntaxToken>,
}

struct Match {
    kind: ContextKind,
    node: SyntaxNode,
    replacement: TextRange,
    prefix_start: TextSize,
}

type Rule = fn(&Probe) -> Option<Match>;

const RULES: &[(&str, Rule)] = &[
    ("resource type", resource_type),
    ("decorator name", decorator_name),
    ("resource header", resource_header),
    ("type name", type_name),
    ("property key", property_key),
    ("property value", property_value),
    ("member access", member_access),
    ("resource body", resource_body),
    ("declarations", declarations),
    ("expression", expression),
];

pub fn classify(
    root: &SyntaxNode,
    text: &str,
    resolved: &ResolvedPosition,
) -> Option<CompletionContext> {
    if resolved.in_string_body() || resolved.in_comment() {
        log::trace!("no completion inside {:?}", resolved.region);
        return None;
    }

    let probe = Probe::new(root, resolved.offset);
    let (name, found) = RULES
        .iter()
        .find_map(|(name, rule)| Some((*name, rule(&probe)?)))?;
    log::trace!(
        "rule `{name}` matched at {:?} (word={:?}, prev={:?})",
        probe.offset,
        probe.word,
        probe.prev
    );

    let offset = usize::from(resolved.offset);
    let prefix_start = usize::from(found.prefix_start).min(offset);
    let anchor = probe
        .word
        .as_ref()
        .and_then(|w| w.parent())
        .unwrap_or_else(|| resolved.node.clone());

    Some(CompletionContext {
        kind: found.kind,
        node: found.node,
        anchor,
        replacement: found.replacement,
        prefix: text.get(prefix_start..offset).unwrap_or_default().to_string(),
        trigger: text[..offset]
            .chars()
            .next_back()
            .filter(|c| TRIGGER_CHARS.contains(c)),
    })
}

impl<'a> Probe<'a> {
    fn new(root: &'a SyntaxNode, offset: TextSize) -> Self {
        let word = root
            .token_at_offset(offset)
            .find(|t| t.kind().is_word() && t.text_range().start() < offset);
        let start = word.as_ref().map_or(offset, |w| w.text_range().start());
        let prev_raw = skip_back(token_before(root, start), false);
        let prev = skip_back(prev_raw.clone(), true);
        Probe {
            root,
            offset,
            word,
            prev_raw,
            prev,
        }
    }

    /// The parent of the previous token when it is a `kind` token inside one
    /// of `parents`.
    fn prev_in(&self, kind: SyntaxKind, parents: &[SyntaxKind]) -> Option<SyntaxNode> {
        let prev = self.prev.as_ref().filter(|t| t.kind() == kind)?;
        prev.parent().filter(|p| parents.contains(&p.kind()))
    }

    fn word_kind(&self) -> Option<SyntaxKind> {
        self.word.as_ref().map(|w| w.kind())
    }

    fn word_parent_kind(&self) -> Option<SyntaxKind> {
        self.word.as_ref()?.parent().map(|p| p.kind())
    }

    /// Replace the word under the cursor, or insert at the cursor.
    fn matched(&self, kind: ContextKind, node: SyntaxNode) -> Match {
        let (replacement, prefix_start) = match &self.word {
            Some(word) => (word.text_range(), word.text_range().start()),
            None => (TextRange::empty(self.offset), self.offset),
        };
        Match {
            kind,
            node,
            replacement,
            prefix_start,
        }
    }
}

/// The token ending at or containing `pos`, not counting one that starts there.
fn token_before(root: &SyntaxNode, pos: TextSize) -> Option<SyntaxToken> {
    match root.token_at_offset(pos) {
        TokenAtOffset::None => None,
        TokenAtOffset::Single(token) if token.text_range().start() < pos => Some(token),
        TokenAtOffset::Single(token) => token.prev_token(),
        TokenAtOffset::Between(left, _) => Some(left),
    }
}

fn skip_back(mut token: Option<SyntaxToken>, skip_newlines: bool) -> Option<SyntaxToken> {
    while let Some(t) = &token {
        let kind = t.kind();
        if !(kind.is_trivia() || (skip_newlines && kind == NEWLINE)) {
            break;
        }
        token = t.prev_token();
    }
    token
}

fn resource_type(p: &Probe) -> Option<Match> {
    if let Some(found) = inside_type_string(p) {
        return Some(found);
    }
    let name = p.prev_in(IDENT, &[NAME])?;
    let decl = name.parent().and_then(ast::ResourceDecl::cast)?;
    if decl.resource_type().is_some() || p.word_parent_kind() == Some(NAME) {
        return None;
    }
    Some(p.matched(ContextKind::ResourceType, decl.syntax().clone()))
}

/// Inside the quotes of a resource type string. The whole string, quotes
/// included, is replaced.
fn inside_type_string(p: &Probe) -> Option<Match> {
    let type_node = p
        .root
        .token_at_offset(p.offset)
        .find_map(|t| t.parent_ancestors().find_map(ast::ResourceType::cast))?;
    let string = type_node.string()?;
    let open = string
        .syntax()
        .first_token()
        .filter(|t| t.kind() == STRING_START)?;
    let range = string.syntax().text_range();
    let body_start = open.text_range().end();
    let inside = p.offset >= body_start && (p.offset < range.end() || !string.is_terminated());
    if !inside {
        return None;
    }
    Some(Match {
        kind: ContextKind::ResourceType,
        node: type_node.syntax().parent()?,
        replacement: range,
        prefix_start: body_start,
    })
}

fn decorator_name(p: &Probe) -> Option<Match> {
    let decorator = p.prev_in(AT, &[DECORATOR])?;
    Some(p.matched(ContextKind::DecoratorName, decorator))
}

fn resource_header(p: &Probe) -> Option<Match> {
    let prev = p.prev.as_ref().filter(|t| t.kind() == STRING_END)?;
    let type_node = prev.parent()?.parent().filter(|n| n.kind() == RESOURCE_TYPE)?;
    let decl = type_node.parent().and_then(ast::ResourceDecl::cast)?;
    // `'T@1'|` touches the closing quote.
    if p.word.is_none() && p.offset <= prev.text_range().end() {
        return None;
    }
    if decl.is_existing() && p.word_kind() != Some(EXISTING_KW) {
        return None;
    }
    Some(p.matched(ContextKind::ResourceHeader, decl.syntax().clone()))
}

fn type_name(p: &Probe) -> Option<Match> {
    let name = p.prev_in(IDENT, &[NAME])?;
    let decl = name
        .parent()
        .filter(|d| matches!(d.kind(), PARAM_DECL | OUTPUT_DECL))?;
    if p.word.is_some() && p.word_parent_kind() != Some(TYPE_NAME) {
        return None;
    }
    Some(p.matched(ContextKind::TypeName, decl))
}

fn property_key(p: &Probe) -> Option<Match> {
    let prev = p
        .prev_raw
        .as_ref()
        .filter(|t| matches!(t.kind(), L_BRACE | NEWLINE | COMMA))?;
    let object = prev.parent().filter(|n| n.kind() == OBJECT)?;
    Some(p.matched(ContextKind::PropertyKey, object))
}

fn property_value(p: &Probe) -> Option<Match> {
    let property = p.prev_in(COLON, &[OBJECT_PROPERTY])?;
    Some(p.matched(ContextKind::PropertyValue, property))
}

fn member_access(p: &Probe) -> Option<Match> {
    let access = p.prev_in(DOT, &[PROPERTY_ACCESS])?;
    Some(p.matched(ContextKind::MemberAccess, access))
}

fn resource_body(p: &Probe) -> Option<Match> {
    let decl = p.prev_in(EQ, &[RESOURCE_DECL, MODULE_DECL])?;
    Some(p.matched(ContextKind::ResourceBody, decl))
}

fn declarations(p: &Probe) -> Option<Match> {
    // Newlines directly inside a declaration precede its keyword and follow
    // its decorators.
    let at_line_start = match &p.prev_raw {
        None => true,
        Some(t) => {
            t.kind() == NEWLINE
                && t.parent()
                    .is_some_and(|n| n.kind() == ROOT || n.kind().is_declaration())
        }
    };
    at_line_start.then(|| p.matched(ContextKind::Declarations, p.root.clone()))
}

fn expression(p: &Probe) -> Option<Match> {
    if let Some(newline) = p.prev_raw.as_ref().filter(|t| t.kind() == NEWLINE) {
        let list = newline
            .parent()
            .filter(|n| matches!(n.kind(), ARRAY | ARG_LIST))?;
        return Some(p.matched(ContextKind::Expression { array_start: false }, list));
    }

    let prev = p.prev.as_ref()?;
    let parent = prev.parent()?;
    let array_start = match (prev.kind(), parent.kind()) {
        (EQ, VAR_DECL | OUTPUT_DECL | PARAM_DECL | TARGET_SCOPE_DECL) => false,
        (kind, BINARY_EXPR) if kind.binary_precedence().is_some() => false,
        (BANG | MINUS, UNARY_EXPR) => false,
        (QUESTION | COLON, TERNARY_EXPR) => false,
        (COLON | IN_KW, FOR_EXPR) => false,
        (L_PAREN, ARG_LIST | PAREN_EXPR) => false,
        (COMMA, ARG_LIST | ARRAY) => false,
        (L_BRACK, ARRAY_ACCESS) => false,
        (L_BRACK, ARRAY) => true,
        (L_BRACK, FOR_EXPR) if p.word_kind() == Some(FOR_KW) => true,
        (INTERP_START, INTERPOLATION) => false,
        _ => return None,
    };
    Some(p.matched(ContextKind::Expression { array_start }, parent))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::at_marker;
    use lang_syntax::{parse, resolve};

    fn classify_at(fixture: &str) -> Option<CompletionContext> {
        let (src, offset) = at_marker(fixture);
        let root = parse(&src).syntax_node();
        let resolved = resolve(&root, offset);
        classify(&root, &src, &resolved)
    }

    fn kind_at(fixture: &str) -> Option<ContextKind> {
        classify_at(fixture).map(|c| c.kind)
    }

    const EXPR: Option<ContextKind> = Some(ContextKind::Expression { array_start: false });

    #[test]
    fn declarations_at_line_start() {
        assert_eq!(kind_at("|"), Some(ContextKind::Declarations));
        assert_eq!(kind_at("  |"), Some(ContextKind::Declarations));
        assert_eq!(kind_at("var a = 1\n|"), Some(ContextKind::Declarations));
        assert_eq!(kind_at("var a = 1\npa|"), Some(ContextKind::Declarations));
        assert_eq!(kind_at("@secure()\n|\nparam p string"), Some(ContextKind::Declarations));
    }

    #[test]
    fn resource_type_positions() {
        assert_eq!(kind_at("resource foo |"), Some(ContextKind::ResourceType));
        assert_eq!(kind_at("resource foo Mic|"), Some(ContextKind::ResourceType));
        assert_eq!(kind_at("resource foo '|'"), Some(ContextKind::ResourceType));
        assert_eq!(kind_at("resource foo 'Mic|"), Some(ContextKind::ResourceType));
        assert_eq!(kind_at("resource fo|"), None);
    }

    #[test]
    fn resource_type_replaces_whole_string() {
        let ctx = classify_at("resource foo 'Mic|ro' = {}").unwrap();
        assert_eq!(ctx.kind, ContextKind::ResourceType);
        assert_eq!(ctx.replacement, TextRange::new(13.into(), 20.into()));
        assert_eq!(ctx.prefix, "Mic");
        assert_eq!(ctx.node.kind(), RESOURCE_DECL);
    }

    #[test]
    fn resource_header_after_type_string() {
        assert_eq!(kind_at("resource foo 'A/b@1' |"), Some(ContextKind::ResourceHeader));
        assert_eq!(kind_at("resource foo 'A/b@1' exi|"), Some(ContextKind::ResourceHeader));
        assert_eq!(kind_at("resource foo 'A/b@1'|"), None);
    }

    #[test]
    fn decorators() {
        assert_eq!(kind_at("@|"), Some(ContextKind::DecoratorName));
        assert_eq!(kind_at("@desc|\nparam p string"), Some(ContextKind::DecoratorName));
        let ctx = classify_at("@|").unwrap();
        assert_eq!(ctx.trigger, Some('@'));
    }

    #[test]
    fn type_names() {
        assert_eq!(kind_at("param p |"), Some(ContextKind::TypeName));
        assert_eq!(kind_at("param p st|"), Some(ContextKind::TypeName));
        assert_eq!(kind_at("output o |"), Some(ContextKind::TypeName));
        assert_eq!(kind_at("param p|"), None);
        assert_eq!(kind_at("var v |"), None);
    }

    #[test]
    fn object_keys_and_values() {
        let src = "resource r 'A/b@1' = {\n  |\n}";
        let ctx = classify_at(src).unwrap();
        assert_eq!(ctx.kind, ContextKind::PropertyKey);
        assert_eq!(ctx.node.kind(), OBJECT);

        assert_eq!(kind_at("var o = {|}"), Some(ContextKind::PropertyKey));
        assert_eq!(kind_at("var o = { a: 1, |}"), Some(ContextKind::PropertyKey));
        assert_eq!(kind_at("var o = {\n  na|\n}"), Some(ContextKind::PropertyKey));
        assert_eq!(kind_at("var o = {\n  a: |\n}"), Some(ContextKind::PropertyValue));
        assert_eq!(kind_at("var o = {\n  a: fo|\n}"), Some(ContextKind::PropertyValue));
        assert_eq!(kind_at("var o = {\n  a: {|}\n}"), Some(ContextKind::PropertyKey));
    }

    #[test]
    fn members_and_bodies() {
        let ctx = classify_at("var a = b.|").unwrap();
        assert_eq!(ctx.kind, ContextKind::MemberAccess);
        assert_eq!(ctx.trigger, Some('.'));
        assert_eq!(kind_at("var a = b.na|"), Some(ContextKind::MemberAccess));
        assert_eq!(kind_at("resource r 'A/b@1' = |"), Some(ContextKind::ResourceBody));
        assert_eq!(kind_at("module m './m.bicep' = |"), Some(ContextKind::ResourceBody));
    }

    #[test]
    fn expression_positions() {
        assert_eq!(kind_at("var a = |"), EXPR);
        assert_eq!(kind_at("var a = fo|"), EXPR);
        assert_eq!(kind_at("var a = 1 + |"), EXPR);
        assert_eq!(kind_at("var a = !|"), EXPR);
        assert_eq!(kind_at("var a = concat(|)"), EXPR);
        assert_eq!(kind_at("var a = concat(1, |)"), EXPR);
        assert_eq!(kind_at("var a = x ? |"), EXPR);
        assert_eq!(kind_at("var a = [for x in |]"), EXPR);
        assert_eq!(kind_at("var a = [for x in y: |]"), EXPR);
        assert_eq!(kind_at("var a = 'abc${|}def'"), EXPR);
        assert_eq!(kind_at("var a = [\n  1\n  |\n]"), EXPR);
        assert_eq!(kind_at("@description(|)\nparam p string"), EXPR);
    }

    #[test]
    fn array_start_offers_for() {
        assert_eq!(
            kind_at("var a = [|]"),
            Some(ContextKind::Expression { array_start: true })
        );
        assert_eq!(
            kind_at("var a = [fo|]"),
            Some(ContextKind::Expression { array_start: true })
        );
        assert_eq!(kind_at("var a = [1, |]"), EXPR);
    }

    #[test]
    fn nothing_after_complete_operands() {
        assert_eq!(kind_at("var a = 'hello'|"), None);
        assert_eq!(kind_at("var a = 12|"), None);
        assert_eq!(kind_at("var a = f()|"), None);
        assert_eq!(kind_at("var a = [1]|"), None);
    }

    #[test]
    fn strings_and_comments_are_silent() {
        assert_eq!(kind_at("var x = '|'"), None);
        assert_eq!(kind_at("var x = 'ab|c'"), None);
        assert_eq!(kind_at("// hi |"), None);
        assert_eq!(kind_at("var x = 1 /* a | */"), None);
        assert_eq!(kind_at("module m './m|.bicep' = {}"), None);
    }
}
