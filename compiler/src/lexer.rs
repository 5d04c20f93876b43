//! Lexer — Tokenizes Jack source code with error recovery.
//!
//! The lexer scans the source string character by character, producing a
//! vector of tokens terminated by [`TokenKind::Eof`]. Key design decisions:
//!
//! - **Error recovery**: On an unexpected character, we record an error and
//!   skip it, continuing to tokenize the rest. Callers treat any recorded
//!   error as fatal for the file, but all of them can be listed at once.
//!
//! - **Span tracking**: Every token records its byte offset range in the
//!   source, so later stages can point at the exact characters.
//!
//! - **Keyword recognition**: After scanning an identifier, we check it
//!   against the reserved-word table. Keyword-ness is membership in that
//!   set, not a separate lexical shape.

use crate::errors::CompileError;
use crate::token::{Keyword, Span, Token, TokenKind, MAX_INT_CONST, SYMBOLS};

pub struct Lexer<'src> {
    source: &'src str,
    chars: Vec<char>,
    start: usize,    // Start of current token (byte offset)
    current: usize,  // Current position (char index)
    byte_pos: usize, // Current byte position
    tokens: Vec<Token>,
    errors: Vec<CompileError>,
}

impl<'src> Lexer<'src> {
    pub fn new(source: &'src str) -> Self {
        Self {
            source,
            chars: source.chars().collect(),
            start: 0,
            current: 0,
            byte_pos: 0,
            tokens: Vec::new(),
            errors: Vec::new(),
        }
    }

    pub fn scan_tokens(&mut self) -> Vec<Token> {
        while !self.is_at_end() {
            self.start = self.byte_pos;
            self.scan_token();
        }
        self.tokens.push(Token::new(
            TokenKind::Eof,
            Span::new(self.byte_pos, self.byte_pos),
        ));
        self.tokens.clone()
    }

    pub fn errors(&self) -> &[CompileError] {
        &self.errors
    }

    /// Consume the lexer, keeping only the errors.
    pub fn into_errors(self) -> Vec<CompileError> {
        self.errors
    }

    fn scan_token(&mut self) {
        let c = self.advance();
        match c {
            c if c.is_whitespace() => {}

            // Single-line comments
            '/' if self.peek() == '/' => {
                while !self.is_at_end() && self.peek() != '\n' {
                    self.advance();
                }
            }

            // Block and doc comments; these do not nest.
            '/' if self.peek() == '*' => {
                self.advance();
                loop {
                    if self.is_at_end() {
                        self.error("unterminated block comment", "comment starts here");
                        return;
                    }
                    if self.peek() == '*' && self.peek_next() == '/' {
                        self.advance();
                        self.advance();
                        return;
                    }
                    self.advance();
                }
            }

            '"' => self.string(),

            c if c.is_ascii_digit() => self.number(c),

            c if c.is_ascii_alphabetic() || c == '_' => self.identifier(c),

            c if SYMBOLS.contains(&c) => self.add_token(TokenKind::Symbol(c)),

            _ => {
                self.error(
                    format!("unexpected character '{}'", c),
                    "not part of any token",
                );
            }
        }
    }

    // ── Literal scanners ─────────────────────────────────────────────

    fn string(&mut self) {
        let mut value = String::new();
        while !self.is_at_end() && self.peek() != '"' && self.peek() != '\n' {
            value.push(self.advance());
        }

        if self.is_at_end() || self.peek() == '\n' {
            self.error("unterminated string literal", "string starts here");
            return;
        }

        self.advance(); // closing "
        self.add_token(TokenKind::StrConst(value));
    }

    fn number(&mut self, first: char) {
        let mut s = String::new();
        s.push(first);
        while !self.is_at_end() && self.peek().is_ascii_digit() {
            s.push(self.advance());
        }

        match s.parse::<u16>() {
            Ok(n) if n <= MAX_INT_CONST => self.add_token(TokenKind::IntConst(n)),
            _ => self.error(
                format!("integer constant {} is out of range (0..={})", s, MAX_INT_CONST),
                "too large",
            ),
        }
    }

    fn identifier(&mut self, first: char) {
        let mut name = String::new();
        name.push(first);
        while !self.is_at_end() && (self.peek().is_ascii_alphanumeric() || self.peek() == '_') {
            name.push(self.advance());
        }

        let kind = match Keyword::lookup(&name) {
            Some(kw) => TokenKind::Keyword(kw),
            None => TokenKind::Identifier(name),
        };
        self.add_token(kind);
    }

    // ── Character-level helpers ──────────────────────────────────────

    fn advance(&mut self) -> char {
        let c = self.chars[self.current];
        self.current += 1;
        self.byte_pos += c.len_utf8();
        c
    }

    fn peek(&self) -> char {
        if self.is_at_end() {
            '\0'
        } else {
            self.chars[self.current]
        }
    }

    fn peek_next(&self) -> char {
        if self.current + 1 >= self.chars.len() {
            '\0'
        } else {
            self.chars[self.current + 1]
        }
    }

    fn is_at_end(&self) -> bool {
        self.current >= self.chars.len()
    }

    fn add_token(&mut self, kind: TokenKind) {
        self.tokens.push(Token::new(kind, Span::new(self.start, self.byte_pos)));
    }

    fn error(&mut self, message: impl Into<String>, label: &str) {
        let span = Span::new(self.start, self.byte_pos);
        self.errors
            .push(CompileError::lexical(message, self.source, span, label));
    }
}

/// Cursor over a token vector with one token of lookahead.
///
/// The vector always ends in an `Eof` token; reading past it keeps
/// returning that `Eof`.
pub struct TokenStream {
    tokens: Vec<Token>,
    current: usize,
}

impl TokenStream {
    pub fn new(mut tokens: Vec<Token>) -> Self {
        if !matches!(tokens.last(), Some(Token { kind: TokenKind::Eof, .. })) {
            let end = tokens.last().map(|t| t.span.end).unwrap_or(0);
            tokens.push(Token::new(TokenKind::Eof, Span::new(end, end)));
        }
        Self { tokens, current: 0 }
    }

    /// Look at the next token without consuming it.
    pub fn peek(&self) -> &Token {
        &self.tokens[self.current]
    }

    /// Consume and return the next token.
    pub fn advance(&mut self) -> Token {
        let token = self.tokens[self.current].clone();
        if !self.is_at_end() {
            self.current += 1;
        }
        token
    }

    pub fn is_at_end(&self) -> bool {
        matches!(self.tokens[self.current].kind, TokenKind::Eof)
    }
}
