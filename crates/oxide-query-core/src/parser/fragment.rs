//! Recursive descent parser for column, table and join fragments.

use super::error::ParseError;
use crate::ast::{
    ColumnReferenceExpression, Expr, Identifier, JsonArrow, JsonLeg, JsonPathExpression,
    PathExpression, TableName, TableReferenceExpression,
};
use crate::lexer::{Keyword, Lexer, Span, Token, TokenKind};

/// Comparison operators accepted between the two sides of a join fragment.
const JOIN_OPERATORS: &[&str] = &["=", "<>", "!=", "<", ">", "<=", ">=", "<=>"];

/// Output of [`FragmentParser::parse_join`].
#[derive(Debug, Clone, PartialEq)]
pub struct JoinExpression {
    /// The joined table, a `TableReference`.
    pub table: Expr,
    /// `left op right`, when the fragment carries an ON part.
    pub on: Option<Expr>,
}

/// Cursor over the tokens of one fragment.
pub struct FragmentParser<'a> {
    input: &'a str,
    tokens: Vec<Token>,
    index: usize,
}

impl<'a> FragmentParser<'a> {
    /// Tokenizes the fragment and positions the cursor on the first token.
    #[must_use]
    pub fn new(input: &'a str) -> Self {
        Self {
            input,
            tokens: Lexer::new(input).tokenize(),
            index: 0,
        }
    }

    /// Parses `column [-> key]* [AS alias]`.
    ///
    /// # Errors
    ///
    /// Returns a `ParseError` if the fragment is not a column with an
    /// optional alias.
    pub fn parse_column_alias(&mut self) -> Result<Expr, ParseError> {
        let expression = self.parse_column_expression()?;
        let alias = self.parse_optional_alias()?;
        self.finish()?;
        Ok(Expr::ColumnReference(ColumnReferenceExpression {
            expression: Box::new(expression),
            alias,
        }))
    }

    /// Parses `column [-> key]*` and rejects an alias.
    ///
    /// # Errors
    ///
    /// Returns a `ParseError` on malformed input or trailing tokens.
    pub fn parse_column_without_alias(&mut self) -> Result<Expr, ParseError> {
        let expression = self.parse_column_expression()?;
        self.finish()?;
        Ok(Expr::ColumnReference(ColumnReferenceExpression {
            expression: Box::new(expression),
            alias: None,
        }))
    }

    /// Parses `[schema.]table [AS alias]`.
    ///
    /// # Errors
    ///
    /// Returns a `ParseError` on malformed input, or when the table name is a
    /// lone reserved keyword.
    pub fn parse_table_alias(&mut self) -> Result<Expr, ParseError> {
        let table = self.parse_table_reference()?;
        self.finish()?;
        Ok(table)
    }

    /// Parses a bare `table.column` chain with neither alias nor JSON legs.
    ///
    /// # Errors
    ///
    /// Returns a `ParseError` on malformed input or trailing tokens.
    pub fn parse_unary_table_column(&mut self) -> Result<Expr, ParseError> {
        let path = self.parse_path(false)?;
        self.finish()?;
        Ok(Expr::Path(path))
    }

    /// Parses `table [AS alias] [ON left op right]`.
    ///
    /// # Errors
    ///
    /// Returns a `ParseError` on malformed input or trailing tokens.
    pub fn parse_join(&mut self) -> Result<JoinExpression, ParseError> {
        let table = self.parse_table_reference()?;
        let on = if self.peek_keyword(Keyword::On) {
            self.index += 1;
            let left = self.parse_path(false)?;
            let operator = self.expect_operator(JOIN_OPERATORS)?;
            let right = self.parse_path(false)?;
            Some(Expr::comparison(
                Expr::Path(left),
                operator,
                Expr::Path(right),
            ))
        } else {
            None
        };
        self.finish()?;
        Ok(JoinExpression { table, on })
    }

    /// Parses a bare alias made of identifier and period runs.
    ///
    /// # Errors
    ///
    /// Returns a `ParseError` if the fragment is empty or contains anything
    /// else.
    pub fn parse_as_name(&mut self) -> Result<String, ParseError> {
        let mut name = String::new();
        let mut expect_name = true;
        while let Some(token) = self.peek(0) {
            match &token.kind {
                TokenKind::Identifier(part) if expect_name => name.push_str(part),
                TokenKind::Keyword(kw) if expect_name => name.push_str(&kw.as_str().to_lowercase()),
                TokenKind::Character('.') if !expect_name => name.push('.'),
                _ => return Err(self.unexpected("alias name")),
            }
            expect_name = !expect_name;
            self.index += 1;
        }
        if name.is_empty() || expect_name {
            return Err(self.unexpected("alias name"));
        }
        Ok(name)
    }

    // --- Grammar pieces ---

    fn parse_column_expression(&mut self) -> Result<Expr, ParseError> {
        let column = self.parse_path(true)?;
        let mut legs = Vec::new();
        while let Some(arrow) = self.peek_json_arrow() {
            self.index += 1;
            legs.push(JsonLeg {
                arrow,
                key: self.expect_json_key()?,
            });
        }
        if legs.is_empty() {
            Ok(Expr::Path(column))
        } else {
            Ok(Expr::JsonPath(JsonPathExpression { column, legs }))
        }
    }

    fn parse_table_reference(&mut self) -> Result<Expr, ParseError> {
        let start = self.current_span();
        let path = self.parse_path(false)?;
        let lone_keyword = path.segments.len() == 1
            && self
                .index
                .checked_sub(1)
                .and_then(|i| self.tokens.get(i))
                .is_some_and(|t| matches!(t.kind, TokenKind::Keyword(_)));
        if lone_keyword {
            return Err(ParseError::new(
                format!("Ambiguous table name [{}], it is a reserved keyword", path.dotted()),
                start,
            ));
        }
        let alias = self.parse_optional_alias()?;
        Ok(Expr::TableReference(TableReferenceExpression {
            table: Box::new(Expr::TableName(TableName { path })),
            alias,
        }))
    }

    /// Parses `name (. name)*`, allowing a trailing `*` when `allow_star`.
    fn parse_path(&mut self, allow_star: bool) -> Result<PathExpression, ParseError> {
        let mut segments = Vec::new();
        loop {
            let Some(token) = self.peek(0) else {
                return Err(self.unexpected("identifier"));
            };
            match &token.kind {
                TokenKind::Identifier(name) => segments.push(Identifier::new(name.clone())),
                TokenKind::Keyword(kw) if *kw != Keyword::As && *kw != Keyword::On => {
                    let text = token.span.slice(self.input).unwrap_or_else(|| kw.as_str());
                    segments.push(Identifier::new(text));
                }
                TokenKind::Operator(op) if allow_star && op == "*" => {
                    segments.push(Identifier::new("*"));
                    self.index += 1;
                    break;
                }
                _ => return Err(self.unexpected("identifier")),
            }
            self.index += 1;
            if self.peek(0).is_some_and(|t| t.is_character('.')) {
                self.index += 1;
            } else {
                break;
            }
        }
        Ok(PathExpression { segments })
    }

    fn parse_optional_alias(&mut self) -> Result<Option<String>, ParseError> {
        if !self.peek_keyword(Keyword::As) {
            return Ok(None);
        }
        self.index += 1;
        match self.peek(0).map(|t| &t.kind) {
            Some(TokenKind::Identifier(name) | TokenKind::String(name)) => {
                let name = name.clone();
                self.index += 1;
                Ok(Some(name))
            }
            _ => Err(self.unexpected("alias")),
        }
    }

    fn peek_json_arrow(&self) -> Option<JsonArrow> {
        let token = self.peek(0)?;
        if token.is_operator("->") {
            Some(JsonArrow::Extract)
        } else if token.is_operator("->>") {
            Some(JsonArrow::ExtractText)
        } else {
            None
        }
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn expect_json_key(&mut self) -> Result<String, ParseError> {
        let key = match self.peek(0).map(|t| &t.kind) {
            Some(TokenKind::Identifier(key) | TokenKind::String(key)) => key.clone(),
            Some(TokenKind::Number(n)) if n.fract() == 0.0 && *n >= 0.0 => {
                format!("{}", *n as u64)
            }
            Some(TokenKind::Keyword(kw)) => kw.as_str().to_lowercase(),
            _ => return Err(self.unexpected("JSON key")),
        };
        self.index += 1;
        Ok(key)
    }

    fn expect_operator(&mut self, allowed: &[&str]) -> Result<String, ParseError> {
        match self.peek(0).map(|t| &t.kind) {
            Some(TokenKind::Operator(op)) if allowed.contains(&op.as_str()) => {
                let op = op.clone();
                self.index += 1;
                Ok(op)
            }
            _ => Err(self.unexpected("comparison operator")),
        }
    }

    // --- Cursor helpers ---

    /// Returns the token `offset` positions ahead of the cursor.
    #[must_use]
    pub fn peek(&self, offset: usize) -> Option<&Token> {
        self.tokens.get(self.index + offset)
    }

    fn peek_keyword(&self, keyword: Keyword) -> bool {
        self.peek(0).is_some_and(|t| t.is_keyword(keyword))
    }

    fn current_span(&self) -> Span {
        self.peek(0).map_or_else(|| Span::at(self.input.len()), |t| t.span)
    }

    /// Fails unless every token has been consumed.
    fn finish(&self) -> Result<(), ParseError> {
        match self.peek(0) {
            None => Ok(()),
            Some(_) => Err(self.unexpected("end of fragment")),
        }
    }

    fn unexpected(&self, expected: &str) -> ParseError {
        match self.peek(0) {
            Some(token) => ParseError::unexpected(expected, token.kind.clone(), token.span),
            None => ParseError::unexpected_eof(expected, self.current_span()),
        }
    }
}
