pub mod builtins;
mod nameres;


use derive_more::Debug;
use lang_syntax::{SyntaxNode, SyntaxNodePtr, TextRange};
use smol_str::SmolStr;

pub use nameres::{ModuleScopes, ScopeData, ScopeId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SymbolKind {
    Parameter,
    Variable,
    Resource,
    Module,
    LoopVariable,
}

/// A name that can be referenced from an expression.
#[derive(Debug, Clone, PartialEq, Eq)]
#[debug("{kind:?}({name})")]
pub struct Symbol {
    pub name: SmolStr,
    pub kind: SymbolKind,
    /// The declaration (or `for` expression) that introduces the name.
    pub decl: SyntaxNodePtr,
    pub name_range: TextRange,
    /// Short description shown next to the name: the parameter type, the
    /// resource type id or the module path.
    pub detail: Option<SmolStr>,
}

pub trait SymbolTable {
    /// Every symbol visible from `node`, innermost scope first. The
    /// declaration that contains `node` is not visible from inside itself.
    fn symbols_in_scope(&self, node: &SyntaxNode) -> Vec<Symbol>;
}
