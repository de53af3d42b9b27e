mod completion;
pub mod config;
pub mod context;
pub mod convert;
mod error;
mod suggestion;

#[cfg(test)]
mod pbt;
#[cfg(test)]
mod test_util;

use lang_ast::ModuleScopes;
use lang_syntax::{Parse, SyntaxNode, TextSize};
use lang_ty::TypeProvider;

pub use config::CompletionConfig;
pub use convert::{LineIndex, Position};
pub use error::{CompletionError, ConfigError};
pub use suggestion::{InsertTextFormat, Span, Suggestion, SuggestionKind, TextEdit};

/// Everything derived from one document version: the syntax tree, its scopes
/// and the line table. Built once per text and queried any number of times.
#[derive(Debug, Clone)]
pub struct Analysis {
    text: String,
    parse: Parse,
    scopes: ModuleScopes,
    line_index: LineIndex,
}

impl Analysis {
    pub fn new(text: impl Into<String>) -> Self {
        let text = text.into();
        let parse = lang_syntax::parse(&text);
        let scopes = ModuleScopes::new(&parse.syntax_node());
        let line_index = LineIndex::new(&text);
        if !parse.errors().is_empty() {
            log::debug!("document has {} syntax errors", parse.errors().len());
        }
        Analysis {
            text,
            parse,
            scopes,
            line_index,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn syntax(&self) -> SyntaxNode {
        self.parse.syntax_node()
    }

    pub fn scopes(&self) -> &ModuleScopes {
        &self.scopes
    }

    pub fn line_index(&self) -> &LineIndex {
        &self.line_index
    }

    /// Suggestions at byte `offset`, sorted by label.
    pub fn completions(
        &self,
        offset: usize,
        types: &dyn TypeProvider,
        config: &CompletionConfig,
    ) -> Result<Vec<Suggestion>, CompletionError> {
        let offset = self.validate(offset)?;
        Ok(completion::completions(self, offset, types, config))
    }

    /// Like [`Analysis::completions`], addressed by line and character.
    pub fn completions_at(
        &self,
        pos: Position,
        types: &dyn TypeProvider,
        config: &CompletionConfig,
    ) -> Result<Vec<Suggestion>, CompletionError> {
        let offset = self
            .line_index()
            .offset(pos)
            .ok_or(CompletionError::InvalidPosition {
                line: pos.line,
                character: pos.character,
            })?;
        self.completions(offset as usize, types, config)
    }

    fn validate(&self, offset: usize) -> Result<TextSize, CompletionError> {
        let len = self.text.len();
        if offset > len {
            return Err(CompletionError::OffsetOutOfBounds { offset, len });
        }
        if !self.text.is_char_boundary(offset) {
            return Err(CompletionError::NotCharBoundary { offset });
        }
        u32::try_from(offset)
            .map(TextSize::new)
            .map_err(|_| CompletionError::OffsetOutOfBounds { offset, len })
    }
}

/// Parse `text` and compute the suggestions at byte `offset`.
pub fn request_completions(
    text: &str,
    offset: usize,
    types: &dyn TypeProvider,
    config: &CompletionConfig,
) -> Result<Vec<Suggestion>, CompletionError> {
    Analysis::new(text).completions(offset, types, config)
}
