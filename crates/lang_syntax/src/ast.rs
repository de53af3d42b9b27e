// ==============================================================================
// Typed AST layer
// ==============================================================================
//
// Thin wrappers over syntax nodes. Every accessor returns an Option because
// the tree may be incomplete: a declaration without a name still parses, it
// just has a MISSING node where the name would be.

use rowan::ast::AstNode;
use smol_str::SmolStr;

use crate::{BicepLanguage, SyntaxKind, SyntaxKind::*, SyntaxNode, SyntaxToken};

macro_rules! ast_node {
    ($(#[$meta:meta])* $name:ident, $kind:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash)]
        pub struct $name(SyntaxNode);

        impl AstNode for $name {
            type Language = BicepLanguage;

            fn can_cast(kind: SyntaxKind) -> bool {
                kind == $kind
            }

            fn cast(node: SyntaxNode) -> Option<Self> {
                Self::can_cast(node.kind()).then(|| Self(node))
            }

            fn syntax(&self) -> &SyntaxNode {
                &self.0
            }
        }
    };
}

fn child<N: AstNode<Language = BicepLanguage>>(node: &SyntaxNode) -> Option<N> {
    node.children().find_map(N::cast)
}

fn token(node: &SyntaxNode, kind: SyntaxKind) -> Option<SyntaxToken> {
    node.children_with_tokens()
        .filter_map(|it| it.into_token())
        .find(|t| t.kind() == kind)
}

/// The first expression child that follows the first `after` token.
fn expr_after(node: &SyntaxNode, after: SyntaxKind) -> Option<SyntaxNode> {
    node.children_with_tokens()
        .skip_while(|it| it.kind() != after)
        .filter_map(|it| it.into_node())
        .find(|n| n.kind().is_expr())
}

ast_node!(
    /// The whole document.
    Program,
    ROOT
);

impl Program {
    pub(crate) fn new(node: SyntaxNode) -> Self {
        Self(node)
    }

    pub fn declarations(&self) -> impl Iterator<Item = Declaration> {
        self.0.children().filter_map(Declaration::cast)
    }
}

// =============================================================================
// Declarations
// =============================================================================

ast_node!(TargetScopeDecl, TARGET_SCOPE_DECL);
ast_node!(ParamDecl, PARAM_DECL);
ast_node!(VarDecl, VAR_DECL);
ast_node!(OutputDecl, OUTPUT_DECL);
ast_node!(ResourceDecl, RESOURCE_DECL);
ast_node!(ModuleDecl, MODULE_DECL);
ast_node!(Decorator, DECORATOR);

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Declaration {
    TargetScope(TargetScopeDecl),
    Param(ParamDecl),
    Var(VarDecl),
    Output(OutputDecl),
    Resource(ResourceDecl),
    Module(ModuleDecl),
}

impl AstNode for Declaration {
    type Language = BicepLanguage;

    fn can_cast(kind: SyntaxKind) -> bool {
        kind.is_declaration()
    }

    fn cast(node: SyntaxNode) -> Option<Self> {
        let decl = match node.kind() {
            TARGET_SCOPE_DECL => Self::TargetScope(TargetScopeDecl(node)),
            PARAM_DECL => Self::Param(ParamDecl(node)),
            VAR_DECL => Self::Var(VarDecl(node)),
            OUTPUT_DECL => Self::Output(OutputDecl(node)),
            RESOURCE_DECL => Self::Resource(ResourceDecl(node)),
            MODULE_DECL => Self::Module(ModuleDecl(node)),
            _ => return None,
        };
        Some(decl)
    }

    fn syntax(&self) -> &SyntaxNode {
        match self {
            Self::TargetScope(it) => it.syntax(),
            Self::Param(it) => it.syntax(),
            Self::Var(it) => it.syntax(),
            Self::Output(it) => it.syntax(),
            Self::Resource(it) => it.syntax(),
            Self::Module(it) => it.syntax(),
        }
    }
}

impl Declaration {
    pub fn name(&self) -> Option<Name> {
        child(self.syntax())
    }

    pub fn decorators(&self) -> impl Iterator<Item = Decorator> {
        self.syntax().children().filter_map(Decorator::cast)
    }

    /// The expression after `=`, if any.
    pub fn value(&self) -> Option<SyntaxNode> {
        expr_after(self.syntax(), EQ)
    }
}

impl ParamDecl {
    pub fn name(&self) -> Option<Name> {
        child(&self.0)
    }

    pub fn type_name(&self) -> Option<TypeName> {
        child(&self.0)
    }

    pub fn default_value(&self) -> Option<SyntaxNode> {
        expr_after(&self.0, EQ)
    }
}

impl VarDecl {
    pub fn name(&self) -> Option<Name> {
        child(&self.0)
    }

    pub fn value(&self) -> Option<SyntaxNode> {
        expr_after(&self.0, EQ)
    }
}

impl OutputDecl {
    pub fn name(&self) -> Option<Name> {
        child(&self.0)
    }

    pub fn type_name(&self) -> Option<TypeName> {
        child(&self.0)
    }

    pub fn value(&self) -> Option<SyntaxNode> {
        expr_after(&self.0, EQ)
    }
}

impl ResourceDecl {
    pub fn name(&self) -> Option<Name> {
        child(&self.0)
    }

    pub fn resource_type(&self) -> Option<ResourceType> {
        child(&self.0)
    }

    pub fn is_existing(&self) -> bool {
        token(&self.0, EXISTING_KW).is_some()
    }

    pub fn body(&self) -> Option<SyntaxNode> {
        expr_after(&self.0, EQ)
    }
}

impl ModuleDecl {
    pub fn name(&self) -> Option<Name> {
        child(&self.0)
    }

    pub fn path(&self) -> Option<ModulePath> {
        child(&self.0)
    }

    pub fn body(&self) -> Option<SyntaxNode> {
        expr_after(&self.0, EQ)
    }
}

impl Decorator {
    pub fn expr(&self) -> Option<SyntaxNode> {
        self.0.children().find(|n| n.kind().is_expr())
    }

    /// Name of the decorator function: `secure` in `@secure()`.
    pub fn name(&self) -> Option<SmolStr> {
        let mut expr = self.expr()?;
        if expr.kind() == CALL_EXPR {
            expr = expr.first_child()?;
        }
        VariableAccess::cast(expr)?.name()
    }
}

// =============================================================================
// Header parts
// =============================================================================

ast_node!(Name, NAME);
ast_node!(TypeName, TYPE_NAME);
ast_node!(
    /// The quoted `'Namespace/type@version'` of a resource declaration.
    ResourceType,
    RESOURCE_TYPE
);
ast_node!(ModulePath, MODULE_PATH);

impl Name {
    pub fn ident(&self) -> Option<SyntaxToken> {
        token(&self.0, IDENT)
    }

    pub fn text(&self) -> Option<SmolStr> {
        self.ident().map(|t| SmolStr::new(t.text()))
    }
}

impl TypeName {
    pub fn text(&self) -> Option<SmolStr> {
        token(&self.0, IDENT).map(|t| SmolStr::new(t.text()))
    }
}

impl ResourceType {
    pub fn string(&self) -> Option<StringLit> {
        child(&self.0)
    }

    pub fn type_id(&self) -> Option<String> {
        self.string()?.literal_value()
    }
}

impl ModulePath {
    pub fn string(&self) -> Option<StringLit> {
        child(&self.0)
    }

    pub fn path(&self) -> Option<String> {
        self.string()?.literal_value()
    }
}

// =============================================================================
// Expressions
// =============================================================================

ast_node!(Object, OBJECT);
ast_node!(ObjectProperty, OBJECT_PROPERTY);
ast_node!(PropertyKey, PROPERTY_KEY);
ast_node!(Array, ARRAY);
ast_node!(ForExpr, FOR_EXPR);
ast_node!(StringLit, STRING);
ast_node!(Interpolation, INTERPOLATION);
ast_node!(VariableAccess, VARIABLE_ACCESS);
ast_node!(PropertyAccess, PROPERTY_ACCESS);
ast_node!(CallExpr, CALL_EXPR);

impl Object {
    pub fn properties(&self) -> impl Iterator<Item = ObjectProperty> {
        self.0.children().filter_map(ObjectProperty::cast)
    }

    pub fn keys(&self) -> impl Iterator<Item = String> {
        self.properties().filter_map(|p| p.key()?.text())
    }

    pub fn property(&self, key: &str) -> Option<ObjectProperty> {
        self.properties()
            .find(|p| p.key().and_then(|k| k.text()).as_deref() == Some(key))
    }
}

impl ObjectProperty {
    pub fn key(&self) -> Option<PropertyKey> {
        child(&self.0)
    }

    pub fn colon(&self) -> Option<SyntaxToken> {
        token(&self.0, COLON)
    }

    pub fn value(&self) -> Option<SyntaxNode> {
        expr_after(&self.0, COLON)
    }
}

impl PropertyKey {
    /// The key as written: a bare identifier or the value of a plain string.
    pub fn text(&self) -> Option<String> {
        if let Some(ident) = token(&self.0, IDENT) {
            return Some(ident.text().to_string());
        }
        child::<StringLit>(&self.0)?.literal_value()
    }
}

impl Array {
    pub fn items(&self) -> impl Iterator<Item = SyntaxNode> {
        self.0
            .children()
            .filter(|n| n.kind() == ARRAY_ITEM)
            .filter_map(|item| item.children().find(|n| n.kind().is_expr()))
    }
}

impl ForExpr {
    pub fn variable(&self) -> Option<Name> {
        child(&self.0)
    }

    pub fn iterable(&self) -> Option<SyntaxNode> {
        expr_after(&self.0, IN_KW)
    }

    pub fn body(&self) -> Option<SyntaxNode> {
        expr_after(&self.0, COLON)
    }
}

impl StringLit {
    pub fn is_interpolated(&self) -> bool {
        self.0.children().any(|n| n.kind() == INTERPOLATION)
    }

    pub fn is_multiline(&self) -> bool {
        self.0
            .first_token()
            .is_some_and(|t| t.kind() == STRING_START && t.text() == "'''")
    }

    pub fn is_terminated(&self) -> bool {
        self.0
            .last_token()
            .is_some_and(|t| t.kind() == STRING_END)
    }

    pub fn interpolations(&self) -> impl Iterator<Item = Interpolation> {
        self.0.children().filter_map(Interpolation::cast)
    }

    /// The unescaped value of a string without interpolation.
    pub fn literal_value(&self) -> Option<String> {
        if self.is_interpolated() {
            return None;
        }
        let raw: String = self
            .0
            .children_with_tokens()
            .filter_map(|it| it.into_token())
            .filter(|t| t.kind() == STRING_TEXT)
            .map(|t| t.text().to_string())
            .collect();
        if self.is_multiline() {
            Some(raw)
        } else {
            Some(unescape(&raw))
        }
    }
}

impl Interpolation {
    pub fn expr(&self) -> Option<SyntaxNode> {
        self.0.children().find(|n| n.kind().is_expr())
    }
}

impl VariableAccess {
    pub fn ident(&self) -> Option<SyntaxToken> {
        token(&self.0, IDENT)
    }

    pub fn name(&self) -> Option<SmolStr> {
        self.ident().map(|t| SmolStr::new(t.text()))
    }
}

impl PropertyAccess {
    pub fn receiver(&self) -> Option<SyntaxNode> {
        self.0.first_child().filter(|n| n.kind().is_expr())
    }

    pub fn dot(&self) -> Option<SyntaxToken> {
        token(&self.0, DOT)
    }

    pub fn member(&self) -> Option<SyntaxToken> {
        self.0
            .children_with_tokens()
            .skip_while(|it| it.kind() != DOT)
            .filter_map(|it| it.into_token())
            .find(|t| t.kind() == IDENT)
    }
}

impl CallExpr {
    pub fn callee(&self) -> Option<SyntaxNode> {
        self.0.first_child().filter(|n| n.kind().is_expr())
    }

    pub fn function_name(&self) -> Option<SmolStr> {
        VariableAccess::cast(self.callee()?)?.name()
    }

    pub fn args(&self) -> impl Iterator<Item = SyntaxNode> {
        self.0
            .children()
            .filter(|n| n.kind() == ARG_LIST)
            .flat_map(|list| list.children().filter(|n| n.kind().is_expr()))
    }
}

/// Resolve the escape sequences of a single-line string body. Unknown or
/// malformed escapes are kept verbatim.
pub fn unescape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('\\') => out.push('\\'),
            Some('\'') => out.push('\''),
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('t') => out.push('\t'),
            Some('$') => out.push('$'),
            Some('u') if chars.peek() == Some(&'{') => {
                chars.next();
                let hex: String = chars.by_ref().take_while(|&c| c != '}').collect();
                match u32::from_str_radix(&hex, 16).ok().and_then(char::from_u32) {
                    Some(decoded) => out.push(decoded),
                    None => {
                        out.push_str("\\u{");
                        out.push_str(&hex);
                        out.push('}');
                    }
                }
            }
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}

/// Quote `text` as a single-line string literal.
pub fn quote(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('\'');
    for c in text.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\'' => out.push_str("\\'"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '$' => out.push_str("\\$"),
            c => out.push(c),
        }
    }
    out.push('\'');
    out
}
