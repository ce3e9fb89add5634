//! Token types for the fragment lexer.

use super::Span;

/// Keywords recognized inside column, table and join fragments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Keyword {
    // Query structure
    Select,
    From,
    Where,
    Group,
    Order,
    By,
    Having,
    Limit,
    Offset,
    Distinct,
    All,
    Union,

    // Joins
    Join,
    Inner,
    Left,
    Right,
    Full,
    Outer,
    Cross,
    On,

    // Data manipulation
    Insert,
    Into,
    Values,
    Update,
    Set,
    Delete,

    // Predicates
    And,
    Or,
    Not,
    In,
    Is,
    Null,
    Like,
    Between,
    Exists,
    True,
    False,

    // Ordering
    Asc,
    Desc,

    // Expressions
    As,
    Case,
    When,
    Then,
    Else,
    End,
}

impl Keyword {
    /// Looks up a keyword, ignoring case.
    #[must_use]
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        let keyword = match s.to_ascii_lowercase().as_str() {
            "select" => Self::Select,
            "from" => Self::From,
            "where" => Self::Where,
            "group" => Self::Group,
            "order" => Self::Order,
            "by" => Self::By,
            "having" => Self::Having,
            "limit" => Self::Limit,
            "offset" => Self::Offset,
            "distinct" => Self::Distinct,
            "all" => Self::All,
            "union" => Self::Union,
            "join" => Self::Join,
            "inner" => Self::Inner,
            "left" => Self::Left,
            "right" => Self::Right,
            "full" => Self::Full,
            "outer" => Self::Outer,
            "cross" => Self::Cross,
            "on" => Self::On,
            "insert" => Self::Insert,
            "into" => Self::Into,
            "values" => Self::Values,
            "update" => Self::Update,
            "set" => Self::Set,
            "delete" => Self::Delete,
            "and" => Self::And,
            "or" => Self::Or,
            "not" => Self::Not,
            "in" => Self::In,
            "is" => Self::Is,
            "null" => Self::Null,
            "like" => Self::Like,
            "between" => Self::Between,
            "exists" => Self::Exists,
            "true" => Self::True,
            "false" => Self::False,
            "asc" => Self::Asc,
            "desc" => Self::Desc,
            "as" => Self::As,
            "case" => Self::Case,
            "when" => Self::When,
            "then" => Self::Then,
            "else" => Self::Else,
            "end" => Self::End,
            _ => return None,
        };
        Some(keyword)
    }

    /// Returns the keyword as SQL text.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Select => "SELECT",
            Self::From => "FROM",
            Self::Where => "WHERE",
            Self::Group => "GROUP",
            Self::Order => "ORDER",
            Self::By => "BY",
            Self::Having => "HAVING",
            Self::Limit => "LIMIT",
            Self::Offset => "OFFSET",
            Self::Distinct => "DISTINCT",
            Self::All => "ALL",
            Self::Union => "UNION",
            Self::Join => "JOIN",
            Self::Inner => "INNER",
            Self::Left => "LEFT",
            Self::Right => "RIGHT",
            Self::Full => "FULL",
            Self::Outer => "OUTER",
            Self::Cross => "CROSS",
            Self::On => "ON",
            Self::Insert => "INSERT",
            Self::Into => "INTO",
            Self::Values => "VALUES",
            Self::Update => "UPDATE",
            Self::Set => "SET",
            Self::Delete => "DELETE",
            Self::And => "AND",
            Self::Or => "OR",
            Self::Not => "NOT",
            Self::In => "IN",
            Self::Is => "IS",
            Self::Null => "NULL",
            Self::Like => "LIKE",
            Self::Between => "BETWEEN",
            Self::Exists => "EXISTS",
            Self::True => "TRUE",
            Self::False => "FALSE",
            Self::Asc => "ASC",
            Self::Desc => "DESC",
            Self::As => "AS",
            Self::Case => "CASE",
            Self::When => "WHEN",
            Self::Then => "THEN",
            Self::Else => "ELSE",
            Self::End => "END",
        }
    }
}

/// The kind of token.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    /// One of `( ) { } [ ] , : ; .`
    Character(char),
    /// Bare or backtick-quoted identifier.
    Identifier(String),
    /// Reserved word.
    Keyword(Keyword),
    /// Single- or double-quoted string, escapes already resolved.
    String(String),
    /// Operator, including the compound forms such as `<=>` and `->>`.
    Operator(String),
    /// Numeric literal.
    Number(f64),
    /// Invalid input, with a diagnostic message.
    Error(String),
}

/// A token with its span in the source fragment.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    /// The kind of token.
    pub kind: TokenKind,
    /// The location in the source fragment.
    pub span: Span,
}

impl Token {
    /// Creates a new token.
    #[must_use]
    pub const fn new(kind: TokenKind, span: Span) -> Self {
        Self { kind, span }
    }

    /// Returns true if this token is the given character.
    #[must_use]
    pub fn is_character(&self, c: char) -> bool {
        matches!(self.kind, TokenKind::Character(found) if found == c)
    }

    /// Returns true if this token is the given operator.
    #[must_use]
    pub fn is_operator(&self, op: &str) -> bool {
        matches!(&self.kind, TokenKind::Operator(found) if found == op)
    }

    /// Returns true if this token is the given keyword.
    #[must_use]
    pub fn is_keyword(&self, keyword: Keyword) -> bool {
        matches!(self.kind, TokenKind::Keyword(found) if found == keyword)
    }

    /// Returns the keyword if this is a keyword token.
    #[must_use]
    pub const fn as_keyword(&self) -> Option<Keyword> {
        match &self.kind {
            TokenKind::Keyword(kw) => Some(*kw),
            _ => None,
        }
    }

    /// Returns true if this is an error token.
    #[must_use]
    pub const fn is_error(&self) -> bool {
        matches!(self.kind, TokenKind::Error(_))
    }
}
