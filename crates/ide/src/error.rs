use miette::Diagnostic;
use thiserror::Error;

/// Rejected completion requests. Anything past validation degrades to an
/// empty or partial result instead of failing.
#[derive(Debug, Clone, PartialEq, Eq, Error, Diagnostic)]
pub enum CompletionError {
    #[error("offset {offset} is past the end of the document ({len} bytes)")]
    #[diagnostic(code(ide::offset_out_of_bounds))]
    OffsetOutOfBounds { offset: usize, len: usize },

    #[error("offset {offset} is not on a character boundary")]
    #[diagnostic(code(ide::not_char_boundary))]
    NotCharBoundary { offset: usize },

    #[error("position {line}:{character} is outside the document")]
    #[diagnostic(code(ide::invalid_position))]
    InvalidPosition { line: u32, character: u32 },
}

#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    #[error("invalid completion configuration")]
    #[diagnostic(code(ide::config))]
    Toml(#[from] toml::de::Error),
}
