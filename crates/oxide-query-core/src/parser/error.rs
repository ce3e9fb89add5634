//! Fragment parser errors.

use thiserror::Error;

use crate::lexer::{Span, TokenKind};

/// A column, table or join fragment that could not be parsed.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{message} at position {span}")]
pub struct ParseError {
    pub message: String,
    pub span: Span,
    /// What the parser was looking for.
    pub expected: Option<String>,
    /// The offending token, `None` at end of input.
    pub found: Option<TokenKind>,
}

impl ParseError {
    #[must_use]
    pub fn new(message: impl Into<String>, span: Span) -> Self {
        Self {
            message: message.into(),
            span,
            expected: None,
            found: None,
        }
    }

    /// A token other than `expected` was found. Lexer errors keep their own
    /// message.
    #[must_use]
    pub fn unexpected(expected: impl Into<String>, found: TokenKind, span: Span) -> Self {
        let expected = expected.into();
        let message = if let TokenKind::Error(lex) = &found {
            format!("{lex}, expected {expected}")
        } else {
            format!("expected {expected}, found {found:?}")
        };
        Self {
            message,
            span,
            expected: Some(expected),
            found: Some(found),
        }
    }

    /// The fragment ended while `expected` was still required.
    #[must_use]
    pub fn unexpected_eof(expected: impl Into<String>, span: Span) -> Self {
        let expected = expected.into();
        Self {
            message: format!("unexpected end of fragment, expected {expected}"),
            span,
            expected: Some(expected),
            found: None,
        }
    }
}
