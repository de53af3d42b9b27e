pub mod ast;
mod expressions;
mod grammar;
pub mod lexer;
mod parser;
pub mod position;
mod syntax_kind;

#[cfg(any(test, feature = "proptest_support"))]
pub mod arbitrary;

#[cfg(test)]
mod pbt;

pub use parser::{Parse, SyntaxError};
pub use position::{resolve, Region, ResolvedPosition};
pub use rowan::{TextRange, TextSize};
pub use syntax_kind::*;

/// Parse a whole document. Never fails; syntax errors are reported on the
/// returned [`Parse`] next to a tree that covers the full text.
pub fn parse(text: &str) -> Parse {
    let tokens = lexer::tokenize(text);
    let mut parser = parser::Parser::new(&tokens);
    grammar::program(&mut parser);
    let parse = parser.finish();
    log::trace!("parsed {} bytes, {} syntax errors", text.len(), parse.errors().len());
    parse
}
