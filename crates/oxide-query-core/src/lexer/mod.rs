//! Fragment lexer.
//!
//! Converts a column, table or join fragment into an eagerly collected token
//! list. Malformed input never panics; it produces `Error` tokens that the
//! fragment parser reports.

mod span;
mod token;
mod tokenizer;

pub use span::Span;
pub use token::{Keyword, Token, TokenKind};
pub use tokenizer::Lexer;
