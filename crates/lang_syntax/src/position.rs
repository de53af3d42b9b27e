// ==============================================================================
// Position resolution
// ==============================================================================
//
// Maps a byte offset to the token and node it sits in, and to the string or
// comment region it falls into. Offsets sit *between* characters, so offset
// 3 in `abc` is at the end of the identifier, not past it.

use rowan::{TextSize, TokenAtOffset};

use crate::{SyntaxKind::*, SyntaxNode, SyntaxToken};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Region {
    /// Literal text of a string.
    LiteralText,
    /// Strictly inside a string delimiter (`''|'`, `$|{`).
    Delimiter,
    /// Inside `${ ... }`, an ordinary expression position.
    InterpolationHole,
    Comment,
}

#[derive(Debug, Clone)]
pub struct ResolvedPosition {
    pub offset: TextSize,
    /// Deepest node containing the offset. A zero-length MISSING node sitting
    /// exactly at the offset takes precedence.
    pub node: SyntaxNode,
    /// The token at the offset. `None` only for an empty document.
    pub token: Option<SyntaxToken>,
    pub region: Option<Region>,
}

impl ResolvedPosition {
    /// Inside the literal text or a delimiter of a string. Interpolation holes
    /// and resource type strings do not count.
    pub fn in_string_body(&self) -> bool {
        matches!(self.region, Some(Region::LiteralText | Region::Delimiter))
    }

    pub fn in_comment(&self) -> bool {
        self.region == Some(Region::Comment)
    }

    pub fn in_interpolation(&self) -> bool {
        self.region == Some(Region::InterpolationHole)
    }
}

/// Resolve `offset` in the tree rooted at `root`. The offset must not exceed
/// the length of the text.
pub fn resolve(root: &SyntaxNode, offset: TextSize) -> ResolvedPosition {
    let token = pick_token(root.token_at_offset(offset));
    let node = missing_at(root, offset)
        .or_else(|| token.as_ref().and_then(|t| t.parent()))
        .unwrap_or_else(|| root.clone());

    let region = if comment_at(root, offset) {
        Some(Region::Comment)
    } else {
        string_region(root, offset)
    };

    log::trace!("resolved {offset:?}: node={:?} token={token:?} region={region:?}", node.kind());
    ResolvedPosition {
        offset,
        node,
        token,
        region,
    }
}

fn pick_token(at: TokenAtOffset<SyntaxToken>) -> Option<SyntaxToken> {
    match at {
        TokenAtOffset::None => None,
        TokenAtOffset::Single(token) => Some(token),
        TokenAtOffset::Between(left, right) => {
            if right.kind() == STRING_START {
                Some(left)
            } else {
                Some(right)
            }
        }
    }
}

/// The first MISSING node that starts exactly at `offset`.
fn missing_at(node: &SyntaxNode, offset: TextSize) -> Option<SyntaxNode> {
    for child in node.children() {
        let range = child.text_range();
        if range.start() > offset {
            break;
        }
        if range.end() < offset {
            continue;
        }
        if child.kind() == MISSING && range.start() == offset {
            return Some(child);
        }
        if let Some(found) = missing_at(&child, offset) {
            return Some(found);
        }
    }
    None
}

fn comment_at(root: &SyntaxNode, offset: TextSize) -> bool {
    root.token_at_offset(offset).any(|token| {
        let range = token.text_range();
        match token.kind() {
            LINE_COMMENT => range.start() < offset && offset <= range.end(),
            BLOCK_COMMENT => {
                let unterminated = token.text().len() < 4 || !token.text().ends_with("*/");
                range.start() < offset && (offset < range.end() || unterminated)
            }
            _ => false,
        }
    })
}

/// The innermost string that contains `offset`, excluding its start
/// boundary. The end boundary counts only for strings that run into end of
/// file.
fn innermost_string(node: &SyntaxNode, offset: TextSize) -> Option<SyntaxNode> {
    let mut found = None;
    for child in node.children() {
        let range = child.text_range();
        if range.start() >= offset {
            break;
        }
        if range.end() < offset {
            continue;
        }
        let is_type_string = child.parent().is_some_and(|p| p.kind() == RESOURCE_TYPE);
        if child.kind() == STRING && !is_type_string {
            let terminated = child.last_token().is_some_and(|t| t.kind() == STRING_END);
            if offset < range.end() || !terminated {
                found = Some(child.clone());
            }
        }
        if let Some(inner) = innermost_string(&child, offset) {
            found = Some(inner);
        }
    }
    found
}

fn string_region(root: &SyntaxNode, offset: TextSize) -> Option<Region> {
    let string = innermost_string(root, offset)?;

    for hole in string.children().filter(|n| n.kind() == INTERPOLATION) {
        let tokens: Vec<_> = hole
            .children_with_tokens()
            .filter_map(|it| it.into_token())
            .collect();
        let Some(open) = tokens.iter().find(|t| t.kind() == INTERP_START) else {
            continue;
        };
        let start = open.text_range().end();
        let end = tokens
            .iter()
            .find(|t| t.kind() == INTERP_END)
            .map_or(hole.text_range().end(), |t| t.text_range().start());
        if start <= offset && offset <= end {
            return Some(Region::InterpolationHole);
        }
    }

    let in_delimiter = string
        .children_with_tokens()
        .filter_map(|it| it.into_token())
        .filter(|t| t.kind().is_string_delimiter())
        .chain(
            string
                .children()
                .filter(|n| n.kind() == INTERPOLATION)
                .flat_map(|h| h.children_with_tokens().filter_map(|it| it.into_token()))
                .filter(|t| t.kind() == INTERP_START),
        )
        .any(|t| {
            let range = t.text_range();
            range.start() < offset && offset < range.end()
        });

    if in_delimiter {
        Some(Region::Delimiter)
    } else {
        Some(Region::LiteralText)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse;

    /// Resolve at the `|` marker.
    fn at_marker(src: &str) -> ResolvedPosition {
        let offset = src.find('|').expect("fixture needs a | marker");
        let text = src.replacen('|', "", 1);
        let root = parse(&text).syntax_node();
        resolve(&root, TextSize::new(offset as u32))
    }

    #[test]
    fn inside_string_text() {
        let pos = at_marker("var x = 'ab|c'");
        assert_eq!(pos.region, Some(Region::LiteralText));
        assert!(pos.in_string_body());
    }

    #[test]
    fn empty_string_body() {
        assert!(at_marker("var x = '|'").in_string_body());
    }

    #[test]
    fn before_opening_quote_is_outside() {
        let pos = at_marker("var x = |'abc'");
        assert_eq!(pos.region, None);
        assert_eq!(pos.token.map(|t| t.kind()), Some(WHITESPACE));
    }

    #[test]
    fn after_closing_quote_is_outside() {
        assert_eq!(at_marker("var x = 'abc'|").region, None);
    }

    #[test]
    fn interpolation_hole_is_expression() {
        let pos = at_marker("var x = 'abc${|}def'");
        assert_eq!(pos.region, Some(Region::InterpolationHole));
        assert!(!pos.in_string_body());
        assert_eq!(pos.node.kind(), MISSING);
        assert_eq!(pos.node.parent().map(|n| n.kind()), Some(INTERPOLATION));
    }

    #[test]
    fn hole_boundaries_are_inclusive() {
        assert!(at_marker("var x = 'a${|b}c'").in_interpolation());
        assert!(at_marker("var x = 'a${b|}c'").in_interpolation());
        assert!(!at_marker("var x = 'a${b}|c'").in_interpolation());
    }

    #[test]
    fn inside_interpolation_delimiter() {
        assert_eq!(at_marker("var x = 'a$|{b}c'").region, Some(Region::Delimiter));
    }

    #[test]
    fn nested_string_in_hole() {
        assert_eq!(
            at_marker("var x = 'a${f('in|ner')}c'").region,
            Some(Region::LiteralText)
        );
        assert_eq!(
            at_marker("var x = 'a${f(|'inner')}c'").region,
            Some(Region::InterpolationHole)
        );
    }

    #[test]
    fn unterminated_string_runs_to_end() {
        assert!(at_marker("var x = 'abc|").in_string_body());
        assert!(at_marker("var x = 'abc\nvar y = |").in_string_body());
    }

    #[test]
    fn resource_type_is_not_a_string_body() {
        let pos = at_marker("resource foo 'Mic|'");
        assert_eq!(pos.region, None);
        assert_eq!(pos.node.kind(), STRING);
        assert_eq!(pos.node.parent().map(|n| n.kind()), Some(RESOURCE_TYPE));
    }

    #[test]
    fn comments() {
        assert!(at_marker("// hello|\nvar x = 1").in_comment());
        assert!(!at_marker("|// hello\nvar x = 1").in_comment());
        assert!(at_marker("var x = /* a| */ 1").in_comment());
        assert!(!at_marker("var x = /* a */| 1").in_comment());
        assert!(at_marker("/* open |").in_comment());
    }

    #[test]
    fn missing_node_preferred() {
        let pos = at_marker("var x = |");
        assert_eq!(pos.node.kind(), MISSING);
        assert_eq!(pos.node.parent().map(|n| n.kind()), Some(VAR_DECL));
    }

    #[test]
    fn empty_document() {
        let pos = at_marker("|");
        assert_eq!(pos.node.kind(), ROOT);
        assert!(pos.token.is_none());
        assert_eq!(pos.region, None);
    }

    #[test]
    fn boundary_prefers_following_token() {
        let pos = at_marker("var x = a|+b");
        assert_eq!(pos.token.map(|t| t.kind()), Some(PLUS));
    }
}
