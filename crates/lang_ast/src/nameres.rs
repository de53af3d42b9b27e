use std::{iter, ops};

use la_arena::{Arena, Idx as Id};
use lang_syntax::ast::{Declaration, ForExpr, Program};
use lang_syntax::{SyntaxKind::*, SyntaxNode, SyntaxNodePtr, TextSize};
use rowan::ast::AstNode;
use rustc_hash::{FxHashMap, FxHashSet};
use smol_str::SmolStr;

use crate::{Symbol, SymbolKind, SymbolTable};

pub type ScopeId = Id<ScopeData>;

impl ops::Index<ScopeId> for ModuleScopes {
    type Output = ScopeData;
    fn index(&self, index: ScopeId) -> &Self::Output {
        &self.scopes[index]
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScopeData {
    parent: Option<ScopeId>,
    symbols: Vec<Symbol>,
}

impl ScopeData {
    pub fn parent(&self) -> Option<ScopeId> {
        self.parent
    }

    pub fn symbols(&self) -> &[Symbol] {
        &self.symbols
    }
}

/// Scopes of one document: the root scope holds the top-level declarations,
/// and each `for` expression opens a child scope for its loop variable that
/// covers the loop body only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleScopes {
    scopes: Arena<ScopeData>,
    root: ScopeId,
    scope_by_for: FxHashMap<SyntaxNodePtr, ScopeId>,
}

impl ModuleScopes {
    pub fn new(root: &SyntaxNode) -> Self {
        let mut scopes = Arena::new();
        let root_scope = scopes.alloc(ScopeData {
            parent: None,
            symbols: Vec::new(),
        });
        let mut ms = ModuleScopes {
            scopes,
            root: root_scope,
            scope_by_for: FxHashMap::default(),
        };

        if let Some(program) = Program::cast(root.clone()) {
            let symbols = program.declarations().filter_map(|d| declaration_symbol(&d)).collect();
            ms.scopes[root_scope].symbols = symbols;
        }

        // Preorder, so an enclosing loop is always allocated before the loops
        // in its body.
        for node in root.descendants().filter(|n| n.kind() == FOR_EXPR) {
            let parent = ms.scope_for_node(&node);
            let symbols = ForExpr::cast(node.clone())
                .and_then(|f| f.variable())
                .and_then(|name| {
                    let ident = name.ident()?;
                    Some(Symbol {
                        name: SmolStr::new(ident.text()),
                        kind: SymbolKind::LoopVariable,
                        decl: SyntaxNodePtr::new(&node),
                        name_range: ident.text_range(),
                        detail: None,
                    })
                })
                .into_iter()
                .collect();
            let id = ms.scopes.alloc(ScopeData {
                parent: Some(parent),
                symbols,
            });
            ms.scope_by_for.insert(SyntaxNodePtr::new(&node), id);
        }

        log::trace!("built {} scopes", ms.scopes.len());
        ms
    }

    pub fn root(&self) -> ScopeId {
        self.root
    }

    pub fn ancestors(&self, scope_id: ScopeId) -> impl Iterator<Item = &'_ ScopeData> + '_ {
        iter::successors(Some(scope_id), |&i| self[i].parent).map(|i| &self[i])
    }

    /// The innermost scope visible from `node`. A loop scope applies from the
    /// `:` of its `for` expression onwards.
    pub fn scope_for_node(&self, node: &SyntaxNode) -> ScopeId {
        let start = node.text_range().start();
        node.ancestors()
            .filter(|a| a.kind() == FOR_EXPR && a != node)
            .find(|f| body_start(f).is_some_and(|colon_end| start >= colon_end))
            .and_then(|f| self.scope_by_for.get(&SyntaxNodePtr::new(&f)).copied())
            .unwrap_or(self.root)
    }
}

/// End of the `:` that separates a loop header from its body.
fn body_start(for_expr: &SyntaxNode) -> Option<TextSize> {
    for_expr
        .children_with_tokens()
        .filter_map(|it| it.into_token())
        .find(|t| t.kind() == COLON)
        .map(|t| t.text_range().end())
}

fn declaration_symbol(decl: &Declaration) -> Option<Symbol> {
    let (kind, detail) = match decl {
        Declaration::Param(p) => (
            SymbolKind::Parameter,
            p.type_name().and_then(|t| t.text()),
        ),
        Declaration::Var(_) => (SymbolKind::Variable, None),
        Declaration::Resource(r) => (
            SymbolKind::Resource,
            r.resource_type().and_then(|t| t.type_id()).map(SmolStr::from),
        ),
        Declaration::Module(m) => (
            SymbolKind::Module,
            m.path().and_then(|p| p.path()).map(SmolStr::from),
        ),
        Declaration::Output(_) | Declaration::TargetScope(_) => return None,
    };
    let ident = decl.name()?.ident()?;
    Some(Symbol {
        name: SmolStr::new(ident.text()),
        kind,
        decl: SyntaxNodePtr::new(decl.syntax()),
        name_range: ident.text_range(),
        detail,
    })
}

impl SymbolTable for ModuleScopes {
    fn symbols_in_scope(&self, node: &SyntaxNode) -> Vec<Symbol> {
        let own_decl = node
            .ancestors()
            .find(|n| n.kind().is_declaration())
            .map(|n| SyntaxNodePtr::new(&n));

        let mut seen = FxHashSet::default();
        self.ancestors(self.scope_for_node(node))
            .flat_map(|scope| scope.symbols.iter())
            .filter(|sym| Some(&sym.decl) != own_decl.as_ref())
            .filter(|sym| seen.insert(sym.name.clone()))
            .cloned()
            .collect()
    }
}
