//! Fragment parser.
//!
//! Builder methods accept column, table and join strings such as
//! `users.email as mail` or `contacts on contacts.user_id = users.id`. This
//! module turns those fragments into AST nodes.

mod error;
mod fragment;

pub use error::ParseError;
pub use fragment::{FragmentParser, JoinExpression};

use crate::ast::Expr;

/// Parses a column with an optional alias.
///
/// # Errors
///
/// Returns a `ParseError` on malformed input.
pub fn parse_column(input: &str) -> Result<Expr, ParseError> {
    FragmentParser::new(input).parse_column_alias()
}

/// Parses a table with an optional alias.
///
/// # Errors
///
/// Returns a `ParseError` on malformed input.
pub fn parse_table(input: &str) -> Result<Expr, ParseError> {
    FragmentParser::new(input).parse_table_alias()
}
