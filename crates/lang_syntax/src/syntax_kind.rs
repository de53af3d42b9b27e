// ==============================================================================
// Syntax kinds
// ==============================================================================
//
// One flat enum for both tokens and nodes, the layout rowan expects. Tokens
// come first so `is_token` is a range check.

#[allow(non_camel_case_types)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u16)]
pub enum SyntaxKind {
    // Trivia
    WHITESPACE = 0,
    LINE_COMMENT,
    BLOCK_COMMENT,

    // Newlines separate declarations, properties and array items.
    NEWLINE,

    IDENT,
    INTEGER,

    // Strings are split into delimiters, text and interpolation markers.
    STRING_START,
    STRING_TEXT,
    STRING_END,
    INTERP_START,
    INTERP_END,

    // Punctuation
    L_BRACE,
    R_BRACE,
    L_BRACK,
    R_BRACK,
    L_PAREN,
    R_PAREN,
    COMMA,
    DOT,
    COLON,
    QUESTION,
    QUESTION_QUESTION,
    EQ,
    EQ_EQ,
    BANG_EQ,
    BANG,
    LT,
    LT_EQ,
    GT,
    GT_EQ,
    PLUS,
    MINUS,
    STAR,
    SLASH,
    PERCENT,
    AMP_AMP,
    PIPE_PIPE,
    AT,

    // Reserved words.
    TRUE_KW,
    FALSE_KW,
    NULL_KW,

    // Contextual keywords, re-tagged from IDENT by the parser.
    TARGET_SCOPE_KW,
    PARAM_KW,
    VAR_KW,
    OUTPUT_KW,
    RESOURCE_KW,
    MODULE_KW,
    EXISTING_KW,
    FOR_KW,
    IN_KW,

    ERROR_TOKEN,
    EOF,

    // Nodes
    ROOT,
    DECORATOR,
    TARGET_SCOPE_DECL,
    PARAM_DECL,
    VAR_DECL,
    OUTPUT_DECL,
    RESOURCE_DECL,
    MODULE_DECL,
    NAME,
    TYPE_NAME,
    RESOURCE_TYPE,
    MODULE_PATH,
    OBJECT,
    OBJECT_PROPERTY,
    PROPERTY_KEY,
    ARRAY,
    ARRAY_ITEM,
    FOR_EXPR,
    STRING,
    INTERPOLATION,
    LITERAL,
    VARIABLE_ACCESS,
    PROPERTY_ACCESS,
    ARRAY_ACCESS,
    CALL_EXPR,
    ARG_LIST,
    PAREN_EXPR,
    UNARY_EXPR,
    BINARY_EXPR,
    TERNARY_EXPR,
    MISSING,
    ERROR,
}

use SyntaxKind::*;

impl SyntaxKind {
    pub fn is_trivia(self) -> bool {
        matches!(self, WHITESPACE | LINE_COMMENT | BLOCK_COMMENT)
    }

    pub fn is_token(self) -> bool {
        (self as u16) <= (EOF as u16)
    }

    pub fn is_comment(self) -> bool {
        matches!(self, LINE_COMMENT | BLOCK_COMMENT)
    }

    /// Tokens that can be the word under the cursor: identifiers and every
    /// keyword (reserved or contextual).
    pub fn is_word(self) -> bool {
        matches!(
            self,
            IDENT
                | TRUE_KW
                | FALSE_KW
                | NULL_KW
                | TARGET_SCOPE_KW
                | PARAM_KW
                | VAR_KW
                | OUTPUT_KW
                | RESOURCE_KW
                | MODULE_KW
                | EXISTING_KW
                | FOR_KW
                | IN_KW
        )
    }

    pub fn is_declaration(self) -> bool {
        matches!(
            self,
            TARGET_SCOPE_DECL | PARAM_DECL | VAR_DECL | OUTPUT_DECL | RESOURCE_DECL | MODULE_DECL
        )
    }

    pub fn is_expr(self) -> bool {
        matches!(
            self,
            LITERAL
                | STRING
                | OBJECT
                | ARRAY
                | FOR_EXPR
                | VARIABLE_ACCESS
                | PROPERTY_ACCESS
                | ARRAY_ACCESS
                | CALL_EXPR
                | PAREN_EXPR
                | UNARY_EXPR
                | BINARY_EXPR
                | TERNARY_EXPR
        )
    }

    pub fn is_string_delimiter(self) -> bool {
        matches!(self, STRING_START | STRING_END | INTERP_START | INTERP_END)
    }

    /// Binary operator precedence, higher binds tighter. `None` for tokens
    /// that are not binary operators.
    pub fn binary_precedence(self) -> Option<u8> {
        let prec = match self {
            QUESTION_QUESTION => 1,
            PIPE_PIPE => 2,
            AMP_AMP => 3,
            EQ_EQ | BANG_EQ => 4,
            LT | LT_EQ | GT | GT_EQ => 5,
            PLUS | MINUS => 6,
            STAR | SLASH | PERCENT => 7,
            _ => return None,
        };
        Some(prec)
    }

    /// Reserved words recognised by the lexer.
    pub fn from_reserved(text: &str) -> Option<SyntaxKind> {
        match text {
            "true" => Some(TRUE_KW),
            "false" => Some(FALSE_KW),
            "null" => Some(NULL_KW),
            _ => None,
        }
    }

    /// Human-readable token description for syntax errors.
    pub fn describe(self) -> &'static str {
        match self {
            NEWLINE => "new line",
            IDENT => "identifier",
            INTEGER => "integer",
            STRING_START | STRING_TEXT | STRING_END => "string",
            INTERP_START => "'${'",
            INTERP_END => "'}'",
            L_BRACE => "'{'",
            R_BRACE => "'}'",
            L_BRACK => "'['",
            R_BRACK => "']'",
            L_PAREN => "'('",
            R_PAREN => "')'",
            COMMA => "','",
            DOT => "'.'",
            COLON => "':'",
            QUESTION => "'?'",
            EQ => "'='",
            AT => "'@'",
            EOF => "end of file",
            k if k.is_word() => "keyword",
            _ => "token",
        }
    }
}

impl From<SyntaxKind> for rowan::SyntaxKind {
    fn from(kind: SyntaxKind) -> Self {
        rowan::SyntaxKind(kind as u16)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum BicepLanguage {}

impl rowan::Language for BicepLanguage {
    type Kind = SyntaxKind;

    fn kind_from_raw(raw: rowan::SyntaxKind) -> Self::Kind {
        assert!(raw.0 <= ERROR as u16);
        // SAFETY: `SyntaxKind` is `repr(u16)` and the range was just checked.
        unsafe { std::mem::transmute::<u16, SyntaxKind>(raw.0) }
    }

    fn kind_to_raw(kind: Self::Kind) -> rowan::SyntaxKind {
        kind.into()
    }
}

pub type SyntaxNode = rowan::SyntaxNode<BicepLanguage>;
pub type SyntaxToken = rowan::SyntaxToken<BicepLanguage>;
pub type SyntaxElement = rowan::SyntaxElement<BicepLanguage>;
pub type SyntaxNodePtr = rowan::ast::SyntaxNodePtr<BicepLanguage>;
