//! Fragment tokenizer implementation.

use super::{Keyword, Span, Token, TokenKind};

/// Single characters that form a `Character` token.
const CHARACTERS: &[char] = &['(', ')', '{', '}', '[', ']', ',', ':', ';', '.'];

/// Single characters that start an `Operator` token.
const OPERATORS: &[char] = &[
    '+', '-', '*', '/', '%', '^', '&', '|', '!', '=', '<', '>', '?',
];

/// A lexer that tokenizes column, table and join fragments.
pub struct Lexer<'a> {
    /// The input fragment.
    input: &'a str,
    /// The current byte position.
    pos: usize,
    /// The byte position of the start of the current token.
    start: usize,
}

impl<'a> Lexer<'a> {
    /// Creates a new lexer for the given fragment.
    #[must_use]
    pub const fn new(input: &'a str) -> Self {
        Self {
            input,
            pos: 0,
            start: 0,
        }
    }

    /// Returns the current character without advancing.
    fn peek(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    /// Returns the next character without advancing.
    fn peek_next(&self) -> Option<char> {
        let mut chars = self.input[self.pos..].chars();
        chars.next();
        chars.next()
    }

    /// Advances to the next character and returns it.
    fn advance(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    /// Skips whitespace, non-breaking space included.
    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(|c| c.is_whitespace() || c == '\u{a0}') {
            self.advance();
        }
    }

    fn make_span(&self) -> Span {
        Span::new(self.start, self.pos)
    }

    fn make_token(&self, kind: TokenKind) -> Token {
        Token::new(kind, self.make_span())
    }

    fn error(&self, message: impl Into<String>) -> Token {
        self.make_token(TokenKind::Error(message.into()))
    }

    fn is_identifier_start(c: char) -> bool {
        c.is_alphabetic() || c == '_' || c == '$'
    }

    fn is_identifier_part(c: char) -> bool {
        c.is_alphanumeric() || c == '_' || c == '$'
    }

    /// Scans an identifier or keyword.
    fn scan_identifier(&mut self) -> Token {
        while self.peek().is_some_and(Self::is_identifier_part) {
            self.advance();
        }

        let text = &self.input[self.start..self.pos];
        match Keyword::from_str(text) {
            Some(keyword) => self.make_token(TokenKind::Keyword(keyword)),
            None => self.make_token(TokenKind::Identifier(String::from(text))),
        }
    }

    /// Scans a backtick-quoted identifier.
    fn scan_quoted_identifier(&mut self) -> Token {
        self.advance(); // opening backtick
        let mut value = String::new();

        loop {
            match self.advance() {
                Some('`') if self.peek() == Some('`') => {
                    self.advance();
                    value.push('`');
                }
                Some('`') => break,
                Some(c) => value.push(c),
                None => {
                    return self.error(format!(
                        "Unterminated quoted identifier starting at {}",
                        self.start
                    ));
                }
            }
        }

        self.make_token(TokenKind::Identifier(value))
    }

    /// Scans a number (integer, decimal or exponent form).
    fn scan_number(&mut self) -> Token {
        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.advance();
        }

        if self.peek() == Some('.') && self.peek_next().is_some_and(|c| c.is_ascii_digit()) {
            self.advance(); // .
            while self.peek().is_some_and(|c| c.is_ascii_digit()) {
                self.advance();
            }
        }

        if self.peek().is_some_and(|c| c == 'e' || c == 'E') {
            self.advance();
            if self.peek().is_some_and(|c| c == '+' || c == '-') {
                self.advance();
            }
            if !self.peek().is_some_and(|c| c.is_ascii_digit()) {
                return self.error("Invalid exponent");
            }
            while self.peek().is_some_and(|c| c.is_ascii_digit()) {
                self.advance();
            }
        }

        let text = &self.input[self.start..self.pos];
        match text.parse::<f64>() {
            Ok(n) => self.make_token(TokenKind::Number(n)),
            Err(e) => self.error(format!("Invalid number: {e}")),
        }
    }

    /// Scans four hex digits following `\u`.
    fn scan_unicode_escape(&mut self) -> Result<char, String> {
        let mut code = 0u32;
        for _ in 0..4 {
            let digit = self
                .advance()
                .and_then(|c| c.to_digit(16))
                .ok_or_else(|| String::from("Invalid unicode escape"))?;
            code = code * 16 + digit;
        }
        char::from_u32(code).ok_or_else(|| format!("Invalid unicode escape [\\u{code:04x}]"))
    }

    /// Scans a quoted string literal.
    fn scan_string(&mut self, quote: char) -> Token {
        self.advance(); // opening quote
        let mut value = String::new();

        loop {
            match self.advance() {
                Some(c) if c == quote => break,
                Some('\\') => {
                    let escaped = match self.advance() {
                        Some('n') => '\n',
                        Some('t') => '\t',
                        Some('r') => '\r',
                        Some('b') => '\u{8}',
                        Some('f') => '\u{c}',
                        Some('v') => '\u{b}',
                        Some('0') => '\0',
                        Some('u') => match self.scan_unicode_escape() {
                            Ok(c) => c,
                            Err(message) => return self.error(message),
                        },
                        Some(other) => other,
                        None => {
                            return self
                                .error(format!("Unterminated quote starting at {}", self.start));
                        }
                    };
                    value.push(escaped);
                }
                Some(c) => value.push(c),
                None => {
                    return self.error(format!("Unterminated quote starting at {}", self.start));
                }
            }
        }

        self.make_token(TokenKind::String(value))
    }

    /// Scans an operator, preferring the longest compound form.
    fn scan_operator(&mut self, first: char) -> Token {
        let mut op = String::from(first);
        match (first, self.peek()) {
            ('<', Some('=')) => {
                self.advance();
                op.push('=');
                if self.peek() == Some('>') {
                    self.advance();
                    op.push('>');
                }
            }
            ('<', Some('>')) | ('>' | '!', Some('=')) | ('&', Some('&')) | ('|', Some('|')) => {
                if let Some(c) = self.advance() {
                    op.push(c);
                }
            }
            ('-', Some('>')) => {
                self.advance();
                op.push('>');
                if self.peek() == Some('>') {
                    self.advance();
                    op.push('>');
                }
            }
            _ => {}
        }
        self.make_token(TokenKind::Operator(op))
    }

    /// Scans the next token, or returns `None` at end of input.
    #[must_use]
    pub fn next_token(&mut self) -> Option<Token> {
        self.skip_whitespace();
        self.start = self.pos;

        let c = self.peek()?;
        let token = match c {
            '\'' | '"' => self.scan_string(c),
            '`' => self.scan_quoted_identifier(),
            '.' if self.peek_next().is_some_and(|n| n.is_ascii_digit()) => self.scan_number(),
            c if c.is_ascii_digit() => self.scan_number(),
            c if Self::is_identifier_start(c) => self.scan_identifier(),
            c if CHARACTERS.contains(&c) => {
                self.advance();
                self.make_token(TokenKind::Character(c))
            }
            c if OPERATORS.contains(&c) => {
                self.advance();
                self.scan_operator(c)
            }
            c => {
                self.advance();
                self.error(format!("Unexpected character [{c}] at {}", self.start))
            }
        };
        Some(token)
    }

    /// Tokenizes the entire fragment.
    #[must_use]
    pub fn tokenize(&mut self) -> Vec<Token> {
        let mut tokens = Vec::new();
        while let Some(token) = self.next_token() {
            tokens.push(token);
        }
        tokens
    }
}
