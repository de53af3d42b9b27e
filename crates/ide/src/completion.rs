// ==============================================================================
// Completion generation
// ==============================================================================
//
// Turns a classified context into suggestions. Each context has one
// generator:
//
//   - Resource types: type ids from the provider that match the typed prefix
//   - Decorators / keywords / type names: static tables from `builtins`
//   - Property keys: members of the object's schema type not yet written
//   - Property values: hints from the property's type, then the expression set
//   - Member access: members of the receiver's type, resolved through
//     resources, object-literal variables and already-typed segments
//   - Resource body: `{}` and a skeleton of the required properties
//   - Expression: symbols in scope, builtin functions, and `for` after `[`
//
// The merged list is then post-processed: labels are deduplicated keeping the
// first occurrence, the list is sorted by ordinal label, snippet-only items
// are dropped when snippets are off, line endings become `\n` and every
// range is clamped to the document.
//
// A failed type lookup only removes the contribution that needed it.

use itertools::Itertools;
use lang_ast::builtins::{self, BuiltinFunction, KeywordScope};
use lang_ast::{Symbol, SymbolKind, SymbolTable};
use lang_syntax::ast::{self, quote};
use lang_syntax::lexer::is_valid_identifier;
use lang_syntax::{SyntaxKind::*, SyntaxNode, TextSize};
use lang_ty::{LookupError, Member, PropertyDescriptor, TypeDescriptor, TypeProvider};
use rowan::ast::AstNode;
use rustc_hash::FxHashSet;
use smol_str::SmolStr;

use crate::context::{self, CompletionContext, ContextKind};
use crate::{Analysis, CompletionConfig, Suggestion, SuggestionKind};

pub(crate) fn completions(
    analysis: &Analysis,
    offset: TextSize,
    types: &dyn TypeProvider,
    config: &CompletionConfig,
) -> Vec<Suggestion> {
    let root = analysis.syntax();
    let resolved = lang_syntax::resolve(&root, offset);
    let Some(ctx) = context::classify(&root, analysis.text(), &resolved) else {
        log::debug!("completion at {offset:?}: no context");
        return Vec::new();
    };
    log::debug!(
        "completion at {offset:?}: {:?}, prefix={:?}, trigger={:?}",
        ctx.kind,
        ctx.prefix,
        ctx.trigger
    );

    let items = generate(&ctx, analysis, root, types, config);
    finish(items, &ctx, config, analysis.text().len())
}

/// Raw suggestions for one context, before deduplication and sorting.
pub(crate) fn generate(
    ctx: &CompletionContext,
    analysis: &Analysis,
    root: SyntaxNode,
    types: &dyn TypeProvider,
    config: &CompletionConfig,
) -> Vec<Suggestion> {
    let completer = Completer {
        analysis,
        root,
        types,
        config,
        ctx,
    };
    match ctx.kind {
        ContextKind::ResourceType => completer.resource_types(),
        ContextKind::DecoratorName => completer.decorators(),
        ContextKind::ResourceHeader => keywords(KeywordScope::AfterResourceType),
        ContextKind::TypeName => type_names(),
        ContextKind::PropertyKey => completer.property_keys(),
        ContextKind::PropertyValue => completer.property_values(),
        ContextKind::MemberAccess => completer.members(),
        ContextKind::ResourceBody => completer.resource_bodies(),
        ContextKind::Declarations => keywords(KeywordScope::TopLevel),
        ContextKind::Expression { array_start } => completer.expressions(array_start),
    }
}

fn finish(
    items: Vec<Suggestion>,
    ctx: &CompletionContext,
    config: &CompletionConfig,
    len: usize,
) -> Vec<Suggestion> {
    let mut seen = FxHashSet::default();
    let items: Vec<_> = items
        .into_iter()
        .filter(|s| config.snippets || !s.is_snippet())
        .filter(|s| seen.insert(s.label.clone()))
        .sorted_by(|a, b| a.label.as_str().cmp(b.label.as_str()))
        .map(|mut s| {
            if s.replacement_range.is_none() && !ctx.replacement.is_empty() {
                s = s.replacing(ctx.replacement);
            }
            s.normalize(len as u32);
            s
        })
        .collect();
    log::debug!("{} suggestions", items.len());
    items
}

struct Completer<'a> {
    analysis: &'a Analysis,
    root: SyntaxNode,
    types: &'a dyn TypeProvider,
    config: &'a CompletionConfig,
    ctx: &'a CompletionContext,
}

impl Completer<'_> {
    fn resource_types(&self) -> Vec<Suggestion> {
        let prefix = self.ctx.prefix.as_str();
        let lowered = prefix.to_lowercase();
        self.types
            .available_types(prefix)
            .into_iter()
            .filter(|id| {
                if self.config.case_sensitive_type_filter {
                    id.starts_with(prefix)
                } else {
                    id.to_lowercase().starts_with(&lowered)
                }
            })
            .map(|id| {
                Suggestion::new(id.clone(), SuggestionKind::ResourceType)
                    .insert(quote(&id))
                    .detail("Resource type")
                    .replacing(self.ctx.replacement)
            })
            .collect()
    }

    fn decorators(&self) -> Vec<Suggestion> {
        if !self.config.decorators {
            return Vec::new();
        }
        builtins::decorators()
            .iter()
            .map(|d| self.function(d))
            .collect()
    }

    fn function(&self, f: &BuiltinFunction) -> Suggestion {
        let s = Suggestion::new(f.name, SuggestionKind::Function)
            .detail(format!("{}{}", f.name, f.signature))
            .documentation(Some(f.description));
        match (f.takes_arguments(), self.config.snippets) {
            (true, true) => s.snippet(format!("{}($0)", f.name)),
            (true, false) => s,
            (false, _) => s.insert(format!("{}()", f.name)),
        }
    }

    fn snippet_or(&self, s: Suggestion, snippet: String, plain: &str) -> Suggestion {
        if self.config.snippets {
            s.snippet(snippet)
        } else {
            s.insert(plain)
        }
    }

    fn property_keys(&self) -> Vec<Suggestion> {
        let Some(object) = ast::Object::cast(self.ctx.node.clone()) else {
            return Vec::new();
        };
        let Some(ty) = self.degrade("property keys", self.expected_type(object.syntax())) else {
            return Vec::new();
        };

        // The key under the cursor is still being typed and does not count.
        let editing = self.ctx.replacement;
        let present: FxHashSet<String> = object
            .properties()
            .filter_map(|p| p.key())
            .filter(|k| editing.is_empty() || !k.syntax().text_range().contains_range(editing))
            .filter_map(|k| k.text())
            .collect();

        self.types
            .members_of(&ty)
            .into_iter()
            .filter(|m| !present.contains(m.name.as_str()))
            .map(|m| self.property_key(&m))
            .collect()
    }

    fn property_key(&self, member: &Member) -> Suggestion {
        let key = key_text(&member.name);
        let s = Suggestion::new(member.name.clone(), SuggestionKind::Property)
            .detail(member_detail(member))
            .documentation(member.description.clone())
            .insert(format!("{key}: "));
        if !self.config.snippets || !member.ty.is_composite() {
            return s;
        }
        if member.ty.is_object() {
            s.snippet(format!("{key}: {}", object_skeleton(&member.ty)))
        } else {
            s.snippet(format!("{key}: [\n\t$0\n]"))
        }
    }

    fn property_values(&self) -> Vec<Suggestion> {
        let mut items = match self.degrade("value hints", self.property_type(&self.ctx.node)) {
            Some(ty) => self.value_hints(&ty),
            None => Vec::new(),
        };
        items.extend(self.expressions(false));
        items
    }

    fn value_hints(&self, ty: &TypeDescriptor) -> Vec<Suggestion> {
        match ty {
            TypeDescriptor::Object { .. } => {
                let s = Suggestion::new("{}", SuggestionKind::Snippet).detail(ty.to_string());
                vec![self.snippet_or(s, object_skeleton(ty), "{}")]
            }
            TypeDescriptor::Array { .. } => {
                let s = Suggestion::new("[]", SuggestionKind::Snippet).detail(ty.to_string());
                vec![self.snippet_or(s, "[\n\t$0\n]".to_string(), "[]")]
            }
            TypeDescriptor::Bool => ["true", "false"]
                .into_iter()
                .map(|b| Suggestion::new(b, SuggestionKind::Value))
                .collect(),
            TypeDescriptor::Enum { values } => values
                .iter()
                .map(|v| Suggestion::new(quote(v), SuggestionKind::Value).detail(ty.to_string()))
                .collect(),
            TypeDescriptor::Any | TypeDescriptor::String | TypeDescriptor::Int => Vec::new(),
        }
    }

    fn members(&self) -> Vec<Suggestion> {
        let Some(access) = ast::PropertyAccess::cast(self.ctx.node.clone()) else {
            return Vec::new();
        };
        let Some(receiver) = access.receiver() else {
            return Vec::new();
        };
        let Some(ty) = self.degrade("members", self.value_type(&receiver)) else {
            return Vec::new();
        };
        let dot = access.dot();

        self.types
            .members_of(&ty)
            .into_iter()
            .map(|m| {
                let s = Suggestion::new(m.name.clone(), SuggestionKind::Property)
                    .detail(member_detail(&m))
                    .documentation(m.description.clone());
                if is_valid_identifier(&m.name) {
                    return s;
                }
                // `a.b-c` is not valid; rewrite to `a['b-c']`.
                let s = s.insert(format!("[{}]", quote(&m.name)));
                match &dot {
                    Some(dot) => s.with_edit(dot.text_range(), ""),
                    None => s,
                }
            })
            .collect()
    }

    fn resource_bodies(&self) -> Vec<Suggestion> {
        let empty = Suggestion::new("{}", SuggestionKind::Snippet).detail("Empty body");
        let mut items = vec![self.snippet_or(empty, "{\n\t$0\n}".to_string(), "{}")];

        if let Some(ty) = self.degrade("required properties", self.body_type(&self.ctx.node)) {
            if !ty.required_properties().is_empty() {
                items.push(
                    Suggestion::new("required-properties", SuggestionKind::Snippet)
                        .detail("Required properties")
                        .snippet(object_skeleton(&ty)),
                );
            }
        }
        items
    }

    fn expressions(&self, array_start: bool) -> Vec<Suggestion> {
        let mut items: Vec<_> = self
            .analysis
            .scopes()
            .symbols_in_scope(&self.ctx.anchor)
            .iter()
            .map(symbol_suggestion)
            .collect();
        items.extend(builtins::builtin_functions().iter().map(|f| self.function(f)));
        if array_start {
            items.extend(keywords(KeywordScope::ArrayStart));
        }
        items
    }

    /// Log a failed lookup and drop it. `Ok(None)` means nothing is known.
    fn degrade(
        &self,
        what: &str,
        result: Result<Option<TypeDescriptor>, LookupError>,
    ) -> Option<TypeDescriptor> {
        result.unwrap_or_else(|err| {
            log::debug!("no {what}: {err}");
            None
        })
    }

    // ==========================================================================
    // Type resolution
    // ==========================================================================

    /// Body type of a resource or module declaration.
    fn body_type(&self, decl: &SyntaxNode) -> Result<Option<TypeDescriptor>, LookupError> {
        match decl.kind() {
            RESOURCE_DECL => {
                let id = ast::ResourceDecl::cast(decl.clone())
                    .and_then(|r| r.resource_type())
                    .and_then(|t| t.type_id());
                match id {
                    Some(id) => self.types.lookup_type(&id).map(Some),
                    None => Ok(None),
                }
            }
            MODULE_DECL => Ok(Some(TypeDescriptor::module_body())),
            _ => Ok(None),
        }
    }

    /// The type a value at `node` is expected to have, from the position it
    /// sits in: a resource body, a typed property, an array item or a loop
    /// body.
    fn expected_type(&self, node: &SyntaxNode) -> Result<Option<TypeDescriptor>, LookupError> {
        let Some(parent) = node.parent() else {
            return Ok(None);
        };
        match parent.kind() {
            RESOURCE_DECL | MODULE_DECL => self.body_type(&parent),
            OBJECT_PROPERTY => self.property_type(&parent),
            ARRAY_ITEM => match parent.parent() {
                Some(array) => Ok(self.expected_type(&array)?.and_then(item_type)),
                None => Ok(None),
            },
            FOR_EXPR => {
                let body = ast::ForExpr::cast(parent.clone()).and_then(|f| f.body());
                if body.as_ref() != Some(node) {
                    return Ok(None);
                }
                // A loop over a declaration produces one body per item.
                match parent.parent() {
                    Some(decl) if matches!(decl.kind(), RESOURCE_DECL | MODULE_DECL) => {
                        self.body_type(&decl)
                    }
                    _ => Ok(self.expected_type(&parent)?.and_then(item_type)),
                }
            }
            _ => Ok(None),
        }
    }

    /// Declared type of an object property, looked up through its object.
    fn property_type(&self, property: &SyntaxNode) -> Result<Option<TypeDescriptor>, LookupError> {
        let Some(key) = ast::ObjectProperty::cast(property.clone()).and_then(|p| p.key()?.text())
        else {
            return Ok(None);
        };
        let Some(object) = property.parent() else {
            return Ok(None);
        };
        Ok(self
            .expected_type(&object)?
            .and_then(|ty| ty.property(&key).map(|p| p.ty.clone())))
    }

    /// The type of the value an expression evaluates to, as far as member
    /// completion can tell.
    fn value_type(&self, expr: &SyntaxNode) -> Result<Option<TypeDescriptor>, LookupError> {
        match expr.kind() {
            VARIABLE_ACCESS => {
                let Some(name) = ast::VariableAccess::cast(expr.clone()).and_then(|v| v.name())
                else {
                    return Ok(None);
                };
                let symbol = self
                    .analysis
                    .scopes()
                    .symbols_in_scope(expr)
                    .into_iter()
                    .find(|s| s.name == name);
                match symbol {
                    Some(symbol) => self.symbol_type(&symbol),
                    None => Ok(None),
                }
            }
            PROPERTY_ACCESS => {
                let Some(access) = ast::PropertyAccess::cast(expr.clone()) else {
                    return Ok(None);
                };
                let (Some(receiver), Some(member)) = (access.receiver(), access.member()) else {
                    return Ok(None);
                };
                Ok(self
                    .value_type(&receiver)?
                    .and_then(|ty| ty.property(member.text()).map(|p| p.ty.clone())))
            }
            ARRAY_ACCESS => match expr.first_child() {
                Some(receiver) => Ok(self.value_type(&receiver)?.and_then(item_type)),
                None => Ok(None),
            },
            PAREN_EXPR => match expr.children().find(|n| n.kind().is_expr()) {
                Some(inner) => self.value_type(&inner),
                None => Ok(None),
            },
            OBJECT => Ok(Some(literal_type(expr))),
            _ => Ok(None),
        }
    }

    fn symbol_type(&self, symbol: &Symbol) -> Result<Option<TypeDescriptor>, LookupError> {
        let decl = symbol.decl.to_node(&self.root);
        match symbol.kind {
            SymbolKind::Resource => Ok(self.body_type(&decl)?.map(resource_reference)),
            SymbolKind::Module => Ok(Some(module_reference())),
            SymbolKind::Variable => Ok(ast::VarDecl::cast(decl)
                .and_then(|v| v.value())
                .filter(|v| v.kind() == OBJECT)
                .map(|v| literal_type(&v))),
            SymbolKind::Parameter | SymbolKind::LoopVariable => Ok(None),
        }
    }
}

fn keywords(scope: KeywordScope) -> Vec<Suggestion> {
    builtins::keywords_valid_at(scope)
        .iter()
        .map(|k| Suggestion::new(k.name, SuggestionKind::Keyword).detail(k.detail))
        .collect()
}

fn type_names() -> Vec<Suggestion> {
    builtins::primitive_types()
        .iter()
        .map(|t| Suggestion::new(*t, SuggestionKind::Keyword).detail("Primitive type"))
        .collect()
}

fn symbol_suggestion(symbol: &Symbol) -> Suggestion {
    let kind = match symbol.kind {
        SymbolKind::Parameter => "param",
        SymbolKind::Variable => "var",
        SymbolKind::Resource => "resource",
        SymbolKind::Module => "module",
        SymbolKind::LoopVariable => "loop variable",
    };
    let detail = match &symbol.detail {
        Some(detail) => format!("{kind} {detail}"),
        None => kind.to_string(),
    };
    Suggestion::new(symbol.name.clone(), SuggestionKind::Symbol).detail(detail)
}

fn key_text(name: &str) -> String {
    if is_valid_identifier(name) {
        name.to_string()
    } else {
        quote(name)
    }
}

fn member_detail(member: &Member) -> String {
    if member.required {
        format!("{} (required)", member.ty)
    } else {
        member.ty.to_string()
    }
}

/// `{` and `}` around one line per required property with numbered tab
/// stops, or around a single `$0` when nothing is required.
fn object_skeleton(ty: &TypeDescriptor) -> String {
    let required = ty.required_properties();
    if required.is_empty() {
        return "{\n\t$0\n}".to_string();
    }
    let lines = required
        .iter()
        .enumerate()
        .map(|(i, name)| format!("\t{}: ${}", key_text(name), i + 1))
        .join("\n");
    format!("{{\n{lines}\n}}$0")
}

fn item_type(ty: TypeDescriptor) -> Option<TypeDescriptor> {
    match ty {
        TypeDescriptor::Array { items } => Some(*items),
        _ => None,
    }
}

/// A resource symbol exposes its body plus the read-only reference fields.
fn resource_reference(body: TypeDescriptor) -> TypeDescriptor {
    let TypeDescriptor::Object {
        name,
        mut properties,
    } = body
    else {
        return body;
    };
    for key in ["apiVersion", "id", "type"] {
        properties
            .entry(SmolStr::new(key))
            .or_insert_with(|| PropertyDescriptor::new(TypeDescriptor::String));
    }
    TypeDescriptor::Object { name, properties }
}

fn module_reference() -> TypeDescriptor {
    TypeDescriptor::object([
        ("name", PropertyDescriptor::new(TypeDescriptor::String)),
        (
            "outputs",
            PropertyDescriptor::new(TypeDescriptor::object::<_, SmolStr>([]))
                .with_description("Outputs of the module deployment."),
        ),
    ])
}

/// Shape of a literal value; object literals keep their keys.
fn literal_type(node: &SyntaxNode) -> TypeDescriptor {
    match node.kind() {
        OBJECT => TypeDescriptor::object(
            ast::Object::cast(node.clone())
                .into_iter()
                .flat_map(|o| o.properties())
                .filter_map(|p| {
                    let key = p.key()?.text()?;
                    let ty = p.value().map_or(TypeDescriptor::Any, |v| literal_type(&v));
                    Some((key, PropertyDescriptor::new(ty)))
                }),
        ),
        ARRAY => TypeDescriptor::array(TypeDescriptor::Any),
        STRING => TypeDescriptor::String,
        LITERAL => match node.first_token().map(|t| t.kind()) {
            Some(INTEGER) => TypeDescriptor::Int,
            Some(TRUE_KW | FALSE_KW) => TypeDescriptor::Bool,
            _ => TypeDescriptor::Any,
        },
        _ => TypeDescriptor::Any,
    }
}
