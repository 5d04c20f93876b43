//! Parse-tree listing: the syntax-analyzer stage of the toolchain.
//!
//! Walks the same grammar as [`crate::compiler`] but, instead of emitting VM
//! code, writes every non-terminal as a nested XML element and every token as
//! `<tag> text </tag>`. Nesting is indented two spaces per level.
//!
//! ```text
//! <class>
//!   <keyword> class </keyword>
//!   <identifier> Main </identifier>
//!   <symbol> { </symbol>
//!   <subroutineDec>
//!   ...
//! </class>
//! ```
//!
//! Calls are listed flat inside their `doStatement` or `term`, with the
//! arguments wrapped in `expressionList`.

use crate::compiler::BINARY_OPS;
use crate::errors::CompileError;
use crate::lexer::TokenStream;
use crate::token::{Keyword, TokenKind};
use crate::xml;

/// Parse one class and return its tree as XML.
pub fn parse_tree(source: &str) -> Result<String, CompileError> {
    let tokens = crate::tokenize(source)?;
    let mut analyzer = Analyzer {
        source,
        tokens: TokenStream::new(tokens),
        out: String::new(),
        depth: 0,
    };
    analyzer.class()?;

    if !analyzer.tokens.is_at_end() {
        let token = analyzer.tokens.peek().clone();
        return Err(CompileError::syntax(
            format!("unexpected '{}' after the class body", token.kind),
            source,
            token.span,
            "expected end of file",
        ));
    }
    Ok(analyzer.out)
}

struct Analyzer<'src> {
    source: &'src str,
    tokens: TokenStream,
    out: String,
    depth: usize,
}

impl<'src> Analyzer<'src> {
    // ── Program structure ────────────────────────────────────────────

    fn class(&mut self) -> Result<(), CompileError> {
        self.open("class");
        self.eat_keyword(Keyword::Class)?;
        self.eat_identifier()?;
        self.eat_symbol('{')?;
        while self.check_keyword(Keyword::Static) || self.check_keyword(Keyword::Field) {
            self.open("classVarDec");
            self.eat_any()?;
            self.var_names()?;
            self.close("classVarDec");
        }
        while [Keyword::Constructor, Keyword::Function, Keyword::Method]
            .into_iter()
            .any(|kw| self.check_keyword(kw))
        {
            self.subroutine_dec()?;
        }
        self.eat_symbol('}')?;
        self.close("class");
        Ok(())
    }

    /// `type varName (',' varName)* ';'`
    fn var_names(&mut self) -> Result<(), CompileError> {
        self.eat_type()?;
        self.eat_identifier()?;
        while self.check_symbol(',') {
            self.eat_any()?;
            self.eat_identifier()?;
        }
        self.eat_symbol(';')
    }

    fn subroutine_dec(&mut self) -> Result<(), CompileError> {
        self.open("subroutineDec");
        self.eat_any()?;
        if self.check_keyword(Keyword::Void) {
            self.eat_any()?;
        } else {
            self.eat_type()?;
        }
        self.eat_identifier()?;
        self.eat_symbol('(')?;

        self.open("parameterList");
        if !self.check_symbol(')') {
            self.eat_type()?;
            self.eat_identifier()?;
            while self.check_symbol(',') {
                self.eat_any()?;
                self.eat_type()?;
                self.eat_identifier()?;
            }
        }
        self.close("parameterList");
        self.eat_symbol(')')?;

        self.open("subroutineBody");
        self.eat_symbol('{')?;
        while self.check_keyword(Keyword::Var) {
            self.open("varDec");
            self.eat_any()?;
            self.var_names()?;
            self.close("varDec");
        }
        self.statements()?;
        self.eat_symbol('}')?;
        self.close("subroutineBody");

        self.close("subroutineDec");
        Ok(())
    }

    // ── Statements ───────────────────────────────────────────────────

    fn statements(&mut self) -> Result<(), CompileError> {
        self.open("statements");
        loop {
            match self.tokens.peek().kind {
                TokenKind::Keyword(Keyword::Let) => self.let_statement()?,
                TokenKind::Keyword(Keyword::If) => self.if_statement()?,
                TokenKind::Keyword(Keyword::While) => self.while_statement()?,
                TokenKind::Keyword(Keyword::Do) => self.do_statement()?,
                TokenKind::Keyword(Keyword::Return) => self.return_statement()?,
                _ => break,
            }
        }
        self.close("statements");
        Ok(())
    }

    fn let_statement(&mut self) -> Result<(), CompileError> {
        self.open("letStatement");
        self.eat_any()?;
        self.eat_identifier()?;
        if self.check_symbol('[') {
            self.eat_any()?;
            self.expression()?;
            self.eat_symbol(']')?;
        }
        self.eat_symbol('=')?;
        self.expression()?;
        self.eat_symbol(';')?;
        self.close("letStatement");
        Ok(())
    }

    fn if_statement(&mut self) -> Result<(), CompileError> {
        self.open("ifStatement");
        self.eat_any()?;
        self.condition()?;
        self.block()?;
        if self.check_keyword(Keyword::Else) {
            self.eat_any()?;
            self.block()?;
        }
        self.close("ifStatement");
        Ok(())
    }

    fn while_statement(&mut self) -> Result<(), CompileError> {
        self.open("whileStatement");
        self.eat_any()?;
        self.condition()?;
        self.block()?;
        self.close("whileStatement");
        Ok(())
    }

    fn do_statement(&mut self) -> Result<(), CompileError> {
        self.open("doStatement");
        self.eat_any()?;
        self.eat_identifier()?;
        self.call_rest()?;
        self.eat_symbol(';')?;
        self.close("doStatement");
        Ok(())
    }

    fn return_statement(&mut self) -> Result<(), CompileError> {
        self.open("returnStatement");
        self.eat_any()?;
        if !self.check_symbol(';') {
            self.expression()?;
        }
        self.eat_symbol(';')?;
        self.close("returnStatement");
        Ok(())
    }

    fn condition(&mut self) -> Result<(), CompileError> {
        self.eat_symbol('(')?;
        self.expression()?;
        self.eat_symbol(')')
    }

    fn block(&mut self) -> Result<(), CompileError> {
        self.eat_symbol('{')?;
        self.statements()?;
        self.eat_symbol('}')
    }

    // ── Expressions ──────────────────────────────────────────────────

    fn expression(&mut self) -> Result<(), CompileError> {
        self.open("expression");
        self.term()?;
        while self.check_binary_op() {
            self.eat_any()?;
            self.term()?;
        }
        self.close("expression");
        Ok(())
    }

    fn term(&mut self) -> Result<(), CompileError> {
        self.open("term");
        match self.tokens.peek().kind {
            TokenKind::IntConst(_) | TokenKind::StrConst(_) => self.eat_any()?,
            TokenKind::Keyword(Keyword::True | Keyword::False | Keyword::Null | Keyword::This) => {
                self.eat_any()?;
            }
            TokenKind::Symbol('(') => {
                self.eat_any()?;
                self.expression()?;
                self.eat_symbol(')')?;
            }
            TokenKind::Symbol('-' | '~') => {
                self.eat_any()?;
                self.term()?;
            }
            TokenKind::Identifier(_) => {
                self.eat_any()?;
                let next = &self.tokens.peek().kind;
                if next.is_symbol('[') {
                    self.eat_any()?;
                    self.expression()?;
                    self.eat_symbol(']')?;
                } else if next.is_symbol('.') || next.is_symbol('(') {
                    self.call_rest()?;
                }
            }
            _ => {
                let token = self.tokens.peek().clone();
                return Err(CompileError::syntax(
                    format!("expected an expression, found '{}'", token.kind),
                    self.source,
                    token.span,
                    "expected a term here",
                ));
            }
        }
        self.close("term");
        Ok(())
    }

    /// Everything after a call's leading identifier: `('.' name)? '(' args ')'`.
    fn call_rest(&mut self) -> Result<(), CompileError> {
        if self.check_symbol('.') {
            self.eat_any()?;
            self.eat_identifier()?;
        }
        self.eat_symbol('(')?;
        self.open("expressionList");
        if !self.check_symbol(')') {
            self.expression()?;
            while self.check_symbol(',') {
                self.eat_any()?;
                self.expression()?;
            }
        }
        self.close("expressionList");
        self.eat_symbol(')')
    }

    // ── Output ───────────────────────────────────────────────────────

    fn open(&mut self, tag: &str) {
        self.line(&format!("<{}>", tag));
        self.depth += 1;
    }

    fn close(&mut self, tag: &str) {
        self.depth -= 1;
        self.line(&format!("</{}>", tag));
    }

    fn line(&mut self, text: &str) {
        for _ in 0..self.depth {
            self.out.push_str("  ");
        }
        self.out.push_str(text);
        self.out.push('\n');
    }

    // ── Token helpers ────────────────────────────────────────────────

    fn check_symbol(&self, c: char) -> bool {
        self.tokens.peek().kind.is_symbol(c)
    }

    fn check_keyword(&self, kw: Keyword) -> bool {
        self.tokens.peek().kind.is_keyword(kw)
    }

    fn check_binary_op(&self) -> bool {
        matches!(self.tokens.peek().kind, TokenKind::Symbol(op) if BINARY_OPS.contains(&op))
    }

    /// Consume the next token if `accept` allows it and list it.
    fn eat(
        &mut self,
        accept: impl Fn(&TokenKind) -> bool,
        expected: &str,
    ) -> Result<(), CompileError> {
        let token = self.tokens.peek().clone();
        if !accept(&token.kind) {
            return Err(CompileError::syntax(
                format!("expected {}, found '{}'", expected, token.kind),
                self.source,
                token.span,
                format!("expected {}", expected),
            ));
        }
        self.tokens.advance();
        if let Some(element) = xml::token_element(&token.kind) {
            self.line(&element);
        }
        Ok(())
    }

    /// The caller has already checked what comes next.
    fn eat_any(&mut self) -> Result<(), CompileError> {
        self.eat(|kind| *kind != TokenKind::Eof, "a token")
    }

    fn eat_symbol(&mut self, c: char) -> Result<(), CompileError> {
        self.eat(|kind| kind.is_symbol(c), &format!("'{}'", c))
    }

    fn eat_keyword(&mut self, kw: Keyword) -> Result<(), CompileError> {
        self.eat(|kind| kind.is_keyword(kw), &format!("'{}'", kw))
    }

    fn eat_identifier(&mut self) -> Result<(), CompileError> {
        self.eat(|kind| matches!(kind, TokenKind::Identifier(_)), "an identifier")
    }

    fn eat_type(&mut self) -> Result<(), CompileError> {
        self.eat(
            |kind| {
                matches!(
                    kind,
                    TokenKind::Keyword(Keyword::Int | Keyword::Char | Keyword::Boolean)
                        | TokenKind::Identifier(_)
                )
            },
            "a type",
        )
    }
}

// ── Tests ───────────────────────────────────────────────────────────
