// ==============================================================================
// Lexer
// ==============================================================================
//
// Turns source text into a flat token stream that covers every byte of the
// input, trivia included, and ends with a zero-length EOF token. The lexer
// never fails: characters it does not recognise become single-character
// ERROR_TOKENs so the parser can recover around them.
//
// Strings are the interesting part. A string is split into delimiter, text
// and interpolation tokens, and the lexer keeps a mode stack so that the
// expression inside `${ ... }` is lexed normally, including nested strings
// and balanced braces:
//
//   'a${ {x: 'b'}.x }c'
//   ^ STRING_START
//    ^ STRING_TEXT
//     ^^ INTERP_START
//        ^ L_BRACE (depth 1, not the end of the hole)
//                  ^ INTERP_END (depth 0)

use derive_more::Debug;
use rowan::{TextRange, TextSize};
use smol_str::SmolStr;

use crate::SyntaxKind::{self, *};

#[derive(Debug, Clone, PartialEq, Eq)]
#[debug("{kind:?}@{range:?} {text:?}")]
pub struct Token {
    pub kind: SyntaxKind,
    pub range: TextRange,
    pub text: SmolStr,
    /// Set on the last token of a string literal or block comment that runs
    /// into end of file.
    pub unterminated: bool,
}

impl Token {
    pub fn len(&self) -> TextSize {
        self.range.len()
    }

    pub fn is_empty(&self) -> bool {
        self.range.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    /// Inside the body of a string literal.
    String { multiline: bool },
    /// Inside `${ ... }`. `depth` counts unmatched `{` opened in the hole.
    Hole { depth: u32 },
}

/// Tokenize `text`. The result covers the input exactly and always ends with
/// an EOF token.
pub fn tokenize(text: &str) -> Vec<Token> {
    let mut lexer = Lexer {
        src: text,
        pos: 0,
        modes: Vec::new(),
        tokens: Vec::new(),
        last_string_part: None,
        unterminated_comment: false,
    };
    lexer.run();
    lexer.tokens
}

struct Lexer<'a> {
    src: &'a str,
    pos: usize,
    modes: Vec<Mode>,
    tokens: Vec<Token>,
    /// Index of the most recent string delimiter/text token, flagged when the
    /// input ends inside a string.
    last_string_part: Option<usize>,
    /// The token being lexed is a block comment that runs into end of file.
    unterminated_comment: bool,
}

impl<'a> Lexer<'a> {
    fn run(&mut self) {
        while self.pos < self.src.len() {
            let (kind, len) = match self.modes.last().copied() {
                Some(Mode::String { multiline }) => self.string_body(multiline),
                _ => self.normal(),
            };
            self.push(kind, len);
        }

        if self.modes.iter().any(|m| matches!(m, Mode::String { .. })) {
            if let Some(idx) = self.last_string_part {
                self.tokens[idx].unterminated = true;
            }
        }

        let end = TextSize::of(self.src);
        self.tokens.push(Token {
            kind: EOF,
            range: TextRange::empty(end),
            text: SmolStr::default(),
            unterminated: false,
        });
    }

    fn push(&mut self, kind: SyntaxKind, len: usize) {
        debug_assert!(len > 0, "lexer must make progress");
        let start = self.pos;
        self.pos += len;
        if matches!(kind, STRING_START | STRING_TEXT | INTERP_START) {
            self.last_string_part = Some(self.tokens.len());
        }
        self.tokens.push(Token {
            kind,
            range: TextRange::new(offset(start), offset(self.pos)),
            text: SmolStr::new(&self.src[start..self.pos]),
            unterminated: std::mem::take(&mut self.unterminated_comment),
        });
    }

    /// Lex one token outside of a string body.
    fn normal(&mut self) -> (SyntaxKind, usize) {
        let src: &'a str = self.src;
        let rest = &src[self.pos..];
        let Some(c) = rest.chars().next() else {
            return (EOF, 0);
        };

        match c {
            ' ' | '\t' => (WHITESPACE, count_while(rest, |c| c == ' ' || c == '\t')),
            '\n' => (NEWLINE, 1),
            '\r' => (NEWLINE, if rest.starts_with("\r\n") { 2 } else { 1 }),
            '/' if rest.starts_with("//") => (
                LINE_COMMENT,
                rest.find(['\n', '\r']).unwrap_or(rest.len()),
            ),
            '/' if rest.starts_with("/*") => match rest[2..].find("*/") {
                Some(end) => (BLOCK_COMMENT, end + 4),
                None => {
                    self.unterminated_comment = true;
                    (BLOCK_COMMENT, rest.len())
                }
            },
            '\'' => {
                if rest.starts_with("'''") {
                    self.modes.push(Mode::String { multiline: true });
                    (STRING_START, 3)
                } else {
                    self.modes.push(Mode::String { multiline: false });
                    (STRING_START, 1)
                }
            }
            '0'..='9' => (INTEGER, count_while(rest, |c| c.is_ascii_digit())),
            c if is_ident_start(c) => {
                let len = count_while(rest, is_ident_continue);
                let kind = SyntaxKind::from_reserved(&rest[..len]).unwrap_or(IDENT);
                (kind, len)
            }
            '{' => {
                if let Some(Mode::Hole { depth }) = self.modes.last_mut() {
                    *depth += 1;
                }
                (L_BRACE, 1)
            }
            '}' => match self.modes.last_mut() {
                Some(Mode::Hole { depth: 0 }) => {
                    self.modes.pop();
                    (INTERP_END, 1)
                }
                Some(Mode::Hole { depth }) => {
                    *depth -= 1;
                    (R_BRACE, 1)
                }
                _ => (R_BRACE, 1),
            },
            '[' => (L_BRACK, 1),
            ']' => (R_BRACK, 1),
            '(' => (L_PAREN, 1),
            ')' => (R_PAREN, 1),
            ',' => (COMMA, 1),
            '.' => (DOT, 1),
            ':' => (COLON, 1),
            '@' => (AT, 1),
            '+' => (PLUS, 1),
            '-' => (MINUS, 1),
            '*' => (STAR, 1),
            '/' => (SLASH, 1),
            '%' => (PERCENT, 1),
            '?' => pick(rest, "??", QUESTION_QUESTION, QUESTION),
            '=' => pick(rest, "==", EQ_EQ, EQ),
            '!' => pick(rest, "!=", BANG_EQ, BANG),
            '<' => pick(rest, "<=", LT_EQ, LT),
            '>' => pick(rest, ">=", GT_EQ, GT),
            '&' if rest.starts_with("&&") => (AMP_AMP, 2),
            '|' if rest.starts_with("||") => (PIPE_PIPE, 2),
            other => (ERROR_TOKEN, other.len_utf8()),
        }
    }

    /// Lex one token inside a string body.
    fn string_body(&mut self, multiline: bool) -> (SyntaxKind, usize) {
        let src: &'a str = self.src;
        let rest = &src[self.pos..];
        let terminator = if multiline { "'''" } else { "'" };

        if rest.starts_with(terminator) {
            self.modes.pop();
            return (STRING_END, terminator.len());
        }
        if rest.starts_with("${") {
            self.modes.push(Mode::Hole { depth: 0 });
            return (INTERP_START, 2);
        }

        let mut i = 0;
        while i < rest.len() {
            let tail = &rest[i..];
            if tail.starts_with(terminator) || tail.starts_with("${") {
                break;
            }
            if !multiline && tail.starts_with('\\') {
                i += 1;
                i += rest[i..].chars().next().map_or(0, char::len_utf8);
                continue;
            }
            i += tail.chars().next().map_or(1, char::len_utf8);
        }
        (STRING_TEXT, i)
    }
}

fn offset(pos: usize) -> TextSize {
    TextSize::new(pos as u32)
}

fn pick(rest: &str, two: &str, long: SyntaxKind, short: SyntaxKind) -> (SyntaxKind, usize) {
    if rest.starts_with(two) {
        (long, two.len())
    } else {
        (short, 1)
    }
}

fn count_while(s: &str, pred: impl Fn(char) -> bool) -> usize {
    s.char_indices()
        .find(|&(_, c)| !pred(c))
        .map_or(s.len(), |(i, _)| i)
}

pub fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

pub fn is_ident_continue(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// Whether `text` can be written as a bare identifier (property keys and
/// member names that do not need quoting).
pub fn is_valid_identifier(text: &str) -> bool {
    let mut chars = text.chars();
    chars.next().is_some_and(is_ident_start)
        && chars.all(is_ident_continue)
        && SyntaxKind::from_reserved(text).is_none()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(src: &str) -> Vec<SyntaxKind> {
        tokenize(src).into_iter().map(|t| t.kind).collect()
    }

    fn assert_covers(src: &str) {
        let tokens = tokenize(src);
        let joined: String = tokens.iter().map(|t| t.text.as_str()).collect();
        assert_eq!(joined, src);
        assert_eq!(tokens.last().map(|t| t.kind), Some(EOF));
    }

    #[test]
    fn simple_declaration() {
        assert_eq!(
            kinds("var x = 1\n"),
            vec![IDENT, WHITESPACE, IDENT, WHITESPACE, EQ, WHITESPACE, INTEGER, NEWLINE, EOF]
        );
    }

    #[test]
    fn reserved_words() {
        assert_eq!(
            kinds("true false null param"),
            vec![TRUE_KW, WHITESPACE, FALSE_KW, WHITESPACE, NULL_KW, WHITESPACE, IDENT, EOF]
        );
    }

    #[test]
    fn plain_string() {
        assert_eq!(kinds("'abc'"), vec![STRING_START, STRING_TEXT, STRING_END, EOF]);
        assert_eq!(kinds("''"), vec![STRING_START, STRING_END, EOF]);
    }

    #[test]
    fn escapes_do_not_terminate() {
        let tokens = tokenize(r"'it\'s \${not} here'");
        let ks: Vec<_> = tokens.iter().map(|t| t.kind).collect();
        assert_eq!(ks, vec![STRING_START, STRING_TEXT, STRING_END, EOF]);
        assert_eq!(tokens[1].text, r"it\'s \${not} here");
    }

    #[test]
    fn interpolation() {
        assert_eq!(
            kinds("'a${b}c'"),
            vec![STRING_START, STRING_TEXT, INTERP_START, IDENT, INTERP_END, STRING_TEXT, STRING_END, EOF]
        );
    }

    #[test]
    fn nested_string_in_hole() {
        assert_eq!(
            kinds("'a${'b${c}'}d'"),
            vec![
                STRING_START,
                STRING_TEXT,
                INTERP_START,
                STRING_START,
                STRING_TEXT,
                INTERP_START,
                IDENT,
                INTERP_END,
                STRING_END,
                INTERP_END,
                STRING_TEXT,
                STRING_END,
                EOF
            ]
        );
    }

    #[test]
    fn braces_inside_hole_are_balanced() {
        assert_eq!(
            kinds("'${{a: 1}.a}'"),
            vec![
                STRING_START,
                INTERP_START,
                L_BRACE,
                IDENT,
                COLON,
                WHITESPACE,
                INTEGER,
                R_BRACE,
                DOT,
                IDENT,
                INTERP_END,
                STRING_END,
                EOF
            ]
        );
    }

    #[test]
    fn multiline_string() {
        let src = "'''\nit's ${x}\n'''";
        assert_eq!(
            kinds(src),
            vec![STRING_START, STRING_TEXT, INTERP_START, IDENT, INTERP_END, STRING_TEXT, STRING_END, EOF]
        );
        assert_covers(src);
    }

    #[test]
    fn unterminated_string_runs_to_eof() {
        let tokens = tokenize("var x = 'abc\nvar y = 1");
        let text = tokens.iter().find(|t| t.kind == STRING_TEXT).unwrap();
        assert_eq!(text.text, "abc\nvar y = 1");
        assert!(text.unterminated);
        assert_eq!(tokens.iter().filter(|t| t.unterminated).count(), 1);
    }

    #[test]
    fn unterminated_empty_string_flags_delimiter() {
        let tokens = tokenize("'");
        assert_eq!(tokens[0].kind, STRING_START);
        assert!(tokens[0].unterminated);
    }

    #[test]
    fn unterminated_hole_flags_string() {
        let tokens = tokenize("'abc${x");
        let start = tokens.iter().find(|t| t.kind == INTERP_START).unwrap();
        assert!(start.unterminated);
    }

    #[test]
    fn comments() {
        assert_eq!(
            kinds("// hi\n/* a\nb */x"),
            vec![LINE_COMMENT, NEWLINE, BLOCK_COMMENT, IDENT, EOF]
        );
        let tokens = tokenize("/* open");
        assert_eq!(tokens[0].kind, BLOCK_COMMENT);
        assert!(tokens[0].unterminated);
        assert_eq!(tokens.len(), 2);
    }

    #[test]
    fn unknown_characters_become_error_tokens() {
        assert_eq!(kinds("a # b"), vec![IDENT, WHITESPACE, ERROR_TOKEN, WHITESPACE, IDENT, EOF]);
        assert_eq!(kinds("é"), vec![ERROR_TOKEN, EOF]);
        assert_covers("a ¬ é & |");
    }

    #[test]
    fn operators() {
        assert_eq!(
            kinds("a==b!=c<=d>=e&&f||g??h"),
            vec![
                IDENT, EQ_EQ, IDENT, BANG_EQ, IDENT, LT_EQ, IDENT, GT_EQ, IDENT, AMP_AMP, IDENT,
                PIPE_PIPE, IDENT, QUESTION_QUESTION, IDENT, EOF
            ]
        );
    }

    #[test]
    fn crlf_is_one_newline() {
        assert_eq!(kinds("a\r\nb"), vec![IDENT, NEWLINE, IDENT, EOF]);
    }

    #[test]
    fn identifier_validity() {
        assert!(is_valid_identifier("name"));
        assert!(is_valid_identifier("_x1"));
        assert!(!is_valid_identifier("foo-bar"));
        assert!(!is_valid_identifier("1abc"));
        assert!(!is_valid_identifier("true"));
        assert!(!is_valid_identifier(""));
    }
}
