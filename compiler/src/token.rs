//! Token types for the Jack language.
//!
//! Each token carries its kind and a span indicating its position in the
//! source. Keywords are resolved once by the lexer into [`Keyword`], so
//! later stages never re-classify raw text.

use std::fmt;

/// Byte offset range in the source string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }
}

/// The reserved words of Jack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Keyword {
    Class,
    Constructor,
    Function,
    Method,
    Field,
    Static,
    Var,
    Int,
    Char,
    Boolean,
    Void,
    True,
    False,
    Null,
    This,
    Let,
    Do,
    If,
    Else,
    While,
    Return,
}

impl Keyword {
    pub const ALL: [Keyword; 21] = [
        Keyword::Class,
        Keyword::Constructor,
        Keyword::Function,
        Keyword::Method,
        Keyword::Field,
        Keyword::Static,
        Keyword::Var,
        Keyword::Int,
        Keyword::Char,
        Keyword::Boolean,
        Keyword::Void,
        Keyword::True,
        Keyword::False,
        Keyword::Null,
        Keyword::This,
        Keyword::Let,
        Keyword::Do,
        Keyword::If,
        Keyword::Else,
        Keyword::While,
        Keyword::Return,
    ];

    /// Look up a word in the reserved-word set.
    pub fn lookup(word: &str) -> Option<Keyword> {
        Self::ALL.into_iter().find(|kw| kw.as_str() == word)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Keyword::Class => "class",
            Keyword::Constructor => "constructor",
            Keyword::Function => "function",
            Keyword::Method => "method",
            Keyword::Field => "field",
            Keyword::Static => "static",
            Keyword::Var => "var",
            Keyword::Int => "int",
            Keyword::Char => "char",
            Keyword::Boolean => "boolean",
            Keyword::Void => "void",
            Keyword::True => "true",
            Keyword::False => "false",
            Keyword::Null => "null",
            Keyword::This => "this",
            Keyword::Let => "let",
            Keyword::Do => "do",
            Keyword::If => "if",
            Keyword::Else => "else",
            Keyword::While => "while",
            Keyword::Return => "return",
        }
    }
}

/// Single-character symbols recognised by the lexer.
pub const SYMBOLS: &[char] = &[
    '{', '}', '(', ')', '[', ']', '.', ',', ';', '+', '-', '*', '/', '&', '|', '<', '>', '=', '~',
];

/// Largest integer constant Jack accepts.
pub const MAX_INT_CONST: u16 = 32767;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKind {
    Keyword(Keyword),
    Identifier(String),
    IntConst(u16),
    /// String contents without the surrounding quotes.
    StrConst(String),
    Symbol(char),
    Eof,
}

impl TokenKind {
    pub fn is_symbol(&self, c: char) -> bool {
        matches!(self, TokenKind::Symbol(s) if *s == c)
    }

    pub fn is_keyword(&self, kw: Keyword) -> bool {
        matches!(self, TokenKind::Keyword(k) if *k == kw)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

impl Token {
    pub fn new(kind: TokenKind, span: Span) -> Self {
        Self { kind, span }
    }
}

impl fmt::Display for Keyword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::Keyword(kw) => write!(f, "{}", kw),
            TokenKind::Identifier(name) => write!(f, "{}", name),
            TokenKind::IntConst(n) => write!(f, "{}", n),
            TokenKind::StrConst(s) => write!(f, "\"{}\"", s),
            TokenKind::Symbol(c) => write!(f, "{}", c),
            TokenKind::Eof => write!(f, "EOF"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keyword_lookup() {
        assert_eq!(Keyword::lookup("constructor"), Some(Keyword::Constructor));
        assert_eq!(Keyword::lookup("this"), Some(Keyword::This));
        assert_eq!(Keyword::lookup("Class"), None);
        assert_eq!(Keyword::lookup("main"), None);
    }

    #[test]
    fn test_every_keyword_round_trips_through_lookup() {
        for kw in Keyword::ALL {
            assert_eq!(Keyword::lookup(kw.as_str()), Some(kw));
        }
    }
}
