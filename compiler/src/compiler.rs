//! Compiler — single-pass Jack to VM code compilation.
//!
//! [`CompilationEngine`] is a recursive-descent parser that emits VM
//! commands as it recognises each construct. There is no AST: scope
//! resolution against the [`SymbolTable`] and instruction selection happen
//! at the point each production is parsed.
//!
//! Object layout conventions:
//!   - fields live in the `this` segment, based at `pointer 0`
//!   - array elements are reached through `pointer 1` and the `that` segment
//!   - a method's receiver is `argument 0`; declared parameters follow it
//!   - a constructor allocates one word per field with `Memory.alloc`
//!
//! Control flow lowers to `label`/`goto`/`if-goto` with labels numbered
//! from a counter owned by the engine, so labels are unique per file.
//! Expression nesting recurses on the host stack.

use log::debug;

use crate::errors::CompileError;
use crate::lexer::TokenStream;
use crate::symbol_table::{Kind, SymbolTable};
use crate::token::{Keyword, Span, Token, TokenKind};
use crate::vm::{ArithOp, Command, Segment, VmWriter};

/// Binary operators; Jack gives them all one precedence, left to right.
pub(crate) const BINARY_OPS: &[char] = &['+', '-', '*', '/', '&', '|', '<', '>', '='];

/// The three flavours of subroutine declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubroutineKind {
    Constructor,
    Function,
    Method,
}

impl SubroutineKind {
    fn from_keyword(kw: Keyword) -> Option<Self> {
        match kw {
            Keyword::Constructor => Some(SubroutineKind::Constructor),
            Keyword::Function => Some(SubroutineKind::Function),
            Keyword::Method => Some(SubroutineKind::Method),
            _ => None,
        }
    }
}

/// Statement forms, keyed by their leading keyword.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Statement {
    Let,
    If,
    While,
    Do,
    Return,
}

impl Statement {
    fn from_token(kind: &TokenKind) -> Option<Self> {
        match kind {
            TokenKind::Keyword(Keyword::Let) => Some(Statement::Let),
            TokenKind::Keyword(Keyword::If) => Some(Statement::If),
            TokenKind::Keyword(Keyword::While) => Some(Statement::While),
            TokenKind::Keyword(Keyword::Do) => Some(Statement::Do),
            TokenKind::Keyword(Keyword::Return) => Some(Statement::Return),
            _ => None,
        }
    }
}

/// Per-file compilation state.
#[derive(Debug)]
struct Context {
    class_name: String,
    subroutine: SubroutineKind,
    /// Incremented once per generated label, never reset.
    label_id: usize,
}

pub struct CompilationEngine<'src> {
    source: &'src str,
    tokens: TokenStream,
    symbols: SymbolTable,
    writer: VmWriter,
    ctx: Context,
}

impl<'src> CompilationEngine<'src> {
    pub fn new(source: &'src str, tokens: Vec<Token>) -> Self {
        Self {
            source,
            tokens: TokenStream::new(tokens),
            symbols: SymbolTable::new(),
            writer: VmWriter::new(),
            ctx: Context {
                class_name: String::new(),
                subroutine: SubroutineKind::Function,
                label_id: 0,
            },
        }
    }

    /// Compile the single class in the token stream and return its commands.
    pub fn compile(mut self) -> Result<Vec<Command>, CompileError> {
        self.compile_class()?;
        if !self.tokens.is_at_end() {
            let token = self.tokens.advance();
            return Err(self.syntax_error(
                format!("expected end of file after class, found '{}'", token.kind),
                token.span,
                "only one class per file",
            ));
        }
        Ok(self.writer.into_commands())
    }

    fn new_label(&mut self, base: &str) -> String {
        self.ctx.label_id += 1;
        format!("{}{}", base, self.ctx.label_id)
    }

    // ── Class ────────────────────────────────────────────────────────

    fn compile_class(&mut self) -> Result<(), CompileError> {
        self.expect_keyword(Keyword::Class)?;
        let (name, _) = self.expect_identifier()?;
        debug!("compiling class {}", name);
        self.ctx.class_name = name;
        self.expect_symbol('{')?;

        while self.check_keyword(Keyword::Static) || self.check_keyword(Keyword::Field) {
            self.compile_class_var_dec()?;
        }

        while let TokenKind::Keyword(kw) = self.tokens.peek().kind {
            match SubroutineKind::from_keyword(kw) {
                Some(kind) => {
                    self.tokens.advance();
                    self.compile_subroutine(kind)?;
                }
                None => break,
            }
        }

        self.expect_symbol('}')
    }

    fn compile_class_var_dec(&mut self) -> Result<(), CompileError> {
        let kind = match self.tokens.advance().kind {
            TokenKind::Keyword(Keyword::Static) => Kind::Static,
            _ => Kind::Field,
        };
        let type_name = self.expect_type()?;
        self.compile_name_list(&type_name, kind)
    }

    /// `name (',' name)* ';'`, defining each name in declaration order.
    fn compile_name_list(&mut self, type_name: &str, kind: Kind) -> Result<(), CompileError> {
        loop {
            let (name, _) = self.expect_identifier()?;
            self.symbols.define(&name, type_name, kind);
            if !self.match_symbol(',') {
                break;
            }
        }
        self.expect_symbol(';')
    }

    // ── Subroutines ──────────────────────────────────────────────────

    fn compile_subroutine(&mut self, kind: SubroutineKind) -> Result<(), CompileError> {
        self.symbols.start_subroutine();
        self.ctx.subroutine = kind;

        if !self.match_keyword(Keyword::Void) {
            self.expect_type()?;
        }
        let (name, _) = self.expect_identifier()?;
        let full_name = format!("{}.{}", self.ctx.class_name, name);
        debug!("compiling {:?} {}", kind, full_name);

        if kind == SubroutineKind::Method {
            let class_name = self.ctx.class_name.clone();
            self.symbols.define("this", &class_name, Kind::Argument);
        }

        self.expect_symbol('(')?;
        self.compile_parameter_list()?;
        self.expect_symbol(')')?;

        self.expect_symbol('{')?;
        while self.match_keyword(Keyword::Var) {
            let type_name = self.expect_type()?;
            self.compile_name_list(&type_name, Kind::Local)?;
        }

        self.writer.function(&full_name, self.symbols.var_count(Kind::Local));

        match kind {
            SubroutineKind::Constructor => {
                self.writer.push(Segment::Constant, self.symbols.var_count(Kind::Field));
                self.writer.call("Memory.alloc", 1);
                self.writer.pop(Segment::Pointer, 0);
            }
            SubroutineKind::Method => {
                self.writer.push(Segment::Argument, 0);
                self.writer.pop(Segment::Pointer, 0);
            }
            SubroutineKind::Function => {}
        }

        self.compile_statements()?;
        self.expect_symbol('}')
    }

    fn compile_parameter_list(&mut self) -> Result<(), CompileError> {
        if self.check_symbol(')') {
            return Ok(());
        }
        loop {
            let type_name = self.expect_type()?;
            let (name, _) = self.expect_identifier()?;
            self.symbols.define(&name, &type_name, Kind::Argument);
            if !self.match_symbol(',') {
                return Ok(());
            }
        }
    }

    // ── Statements ───────────────────────────────────────────────────

    fn compile_statements(&mut self) -> Result<(), CompileError> {
        while let Some(statement) = Statement::from_token(&self.tokens.peek().kind) {
            self.tokens.advance();
            match statement {
                Statement::Let => self.compile_let()?,
                Statement::If => self.compile_if()?,
                Statement::While => self.compile_while()?,
                Statement::Do => self.compile_do()?,
                Statement::Return => self.compile_return()?,
            }
        }
        Ok(())
    }

    fn compile_let(&mut self) -> Result<(), CompileError> {
        let (name, span) = self.expect_identifier()?;

        let is_array = self.match_symbol('[');
        if is_array {
            // Target address stays on the stack while the value is computed,
            // so array reads on the right-hand side cannot clobber it.
            self.push_variable(&name, span)?;
            self.compile_expression()?;
            self.expect_symbol(']')?;
            self.writer.arithmetic(ArithOp::Add);
        }

        self.expect_symbol('=')?;
        self.compile_expression()?;
        self.expect_symbol(';')?;

        if is_array {
            self.writer.pop(Segment::Temp, 0);
            self.writer.pop(Segment::Pointer, 1);
            self.writer.push(Segment::Temp, 0);
            self.writer.pop(Segment::That, 0);
            Ok(())
        } else {
            self.pop_variable(&name, span)
        }
    }

    fn compile_if(&mut self) -> Result<(), CompileError> {
        let else_label = self.new_label("IF");
        let end_label = self.new_label("ENDIF");

        self.compile_condition()?;
        self.writer.arithmetic(ArithOp::Not);
        self.writer.if_goto(&else_label);
        self.compile_block()?;

        if self.match_keyword(Keyword::Else) {
            self.writer.goto(&end_label);
            self.writer.label(&else_label);
            self.compile_block()?;
            self.writer.label(&end_label);
        } else {
            self.writer.label(&else_label);
        }
        Ok(())
    }

    fn compile_while(&mut self) -> Result<(), CompileError> {
        let top_label = self.new_label("WHILE");
        let end_label = self.new_label("ENDWHILE");

        self.writer.label(&top_label);
        self.compile_condition()?;
        self.writer.arithmetic(ArithOp::Not);
        self.writer.if_goto(&end_label);
        self.compile_block()?;
        self.writer.goto(&top_label);
        self.writer.label(&end_label);
        Ok(())
    }

    fn compile_do(&mut self) -> Result<(), CompileError> {
        let (name, span) = self.expect_identifier()?;
        self.compile_subroutine_call(name, span)?;
        self.writer.pop(Segment::Temp, 0);
        self.expect_symbol(';')
    }

    fn compile_return(&mut self) -> Result<(), CompileError> {
        if self.check_symbol(';') {
            self.writer.push(Segment::Constant, 0);
        } else {
            self.compile_expression()?;
        }
        self.expect_symbol(';')?;
        self.writer.ret();
        Ok(())
    }

    /// `'(' expression ')'`
    fn compile_condition(&mut self) -> Result<(), CompileError> {
        self.expect_symbol('(')?;
        self.compile_expression()?;
        self.expect_symbol(')')
    }

    /// `'{' statements '}'`
    fn compile_block(&mut self) -> Result<(), CompileError> {
        self.expect_symbol('{')?;
        self.compile_statements()?;
        self.expect_symbol('}')
    }

    // ── Expressions ──────────────────────────────────────────────────

    fn compile_expression(&mut self) -> Result<(), CompileError> {
        self.compile_term()?;
        while let TokenKind::Symbol(op) = self.tokens.peek().kind {
            if !BINARY_OPS.contains(&op) {
                break;
            }
            self.tokens.advance();
            self.compile_term()?;
            match op {
                '+' => self.writer.arithmetic(ArithOp::Add),
                '-' => self.writer.arithmetic(ArithOp::Sub),
                '*' => self.writer.call("Math.multiply", 2),
                '/' => self.writer.call("Math.divide", 2),
                '&' => self.writer.arithmetic(ArithOp::And),
                '|' => self.writer.arithmetic(ArithOp::Or),
                '<' => self.writer.arithmetic(ArithOp::Lt),
                '>' => self.writer.arithmetic(ArithOp::Gt),
                _ => self.writer.arithmetic(ArithOp::Eq),
            }
        }
        Ok(())
    }

    fn compile_term(&mut self) -> Result<(), CompileError> {
        let token = self.tokens.advance();
        match token.kind {
            TokenKind::IntConst(n) => {
                self.writer.push(Segment::Constant, n as usize);
            }

            TokenKind::StrConst(s) => {
                let chars: Vec<char> = s.chars().collect();
                self.writer.push(Segment::Constant, chars.len());
                self.writer.call("String.new", 1);
                for c in chars {
                    self.writer.push(Segment::Constant, c as usize);
                    self.writer.call("String.appendChar", 2);
                }
            }

            TokenKind::Keyword(Keyword::True) => {
                self.writer.push(Segment::Constant, 0);
                self.writer.arithmetic(ArithOp::Not);
            }
            TokenKind::Keyword(Keyword::False) | TokenKind::Keyword(Keyword::Null) => {
                self.writer.push(Segment::Constant, 0);
            }
            TokenKind::Keyword(Keyword::This) => self.compile_this(token.span)?,

            TokenKind::Symbol('(') => {
                self.compile_expression()?;
                self.expect_symbol(')')?;
            }
            TokenKind::Symbol('-') => {
                self.compile_term()?;
                self.writer.arithmetic(ArithOp::Neg);
            }
            TokenKind::Symbol('~') => {
                self.compile_term()?;
                self.writer.arithmetic(ArithOp::Not);
            }

            TokenKind::Identifier(name) => {
                let next = &self.tokens.peek().kind;
                if next.is_symbol('[') {
                    self.tokens.advance();
                    self.push_variable(&name, token.span)?;
                    self.compile_expression()?;
                    self.expect_symbol(']')?;
                    self.writer.arithmetic(ArithOp::Add);
                    self.writer.pop(Segment::Pointer, 1);
                    self.writer.push(Segment::That, 0);
                } else if next.is_symbol('.') || next.is_symbol('(') {
                    self.compile_subroutine_call(name, token.span)?;
                } else {
                    self.push_variable(&name, token.span)?;
                }
            }

            other => {
                return Err(self.syntax_error(
                    format!("expected an expression, found '{}'", other),
                    token.span,
                    "expected a term here",
                ));
            }
        }
        Ok(())
    }

    /// `this` reads the receiver binding.
    fn compile_this(&mut self, span: Span) -> Result<(), CompileError> {
        if self.symbols.lookup("this").is_some() {
            return self.push_variable("this", span);
        }
        match self.ctx.subroutine {
            SubroutineKind::Function => Err(self.syntax_error(
                "'this' cannot be used inside a function",
                span,
                "no receiver here",
            )),
            _ => {
                self.writer.push(Segment::Pointer, 0);
                Ok(())
            }
        }
    }

    /// Compile a call whose leading identifier has already been consumed.
    ///
    /// - `var.sub(...)`: method call on `var`, which is pushed first
    /// - `Name.sub(...)`: function or constructor call, no receiver
    /// - `sub(...)`: method call on the current object
    fn compile_subroutine_call(&mut self, name: String, span: Span) -> Result<(), CompileError> {
        let (target, implicit_args) = if self.match_symbol('.') {
            let (sub, _) = self.expect_identifier()?;
            let receiver_type = self.symbols.type_of(&name).map(str::to_string);
            match receiver_type {
                Some(type_name) => {
                    self.push_variable(&name, span)?;
                    (format!("{}.{}", type_name, sub), 1)
                }
                None => (format!("{}.{}", name, sub), 0),
            }
        } else {
            self.writer.push(Segment::Pointer, 0);
            (format!("{}.{}", self.ctx.class_name, name), 1)
        };

        self.expect_symbol('(')?;
        let explicit_args = self.compile_expression_list()?;
        self.expect_symbol(')')?;
        self.writer.call(&target, implicit_args + explicit_args);
        Ok(())
    }

    fn compile_expression_list(&mut self) -> Result<usize, CompileError> {
        if self.check_symbol(')') {
            return Ok(0);
        }
        let mut count = 0;
        loop {
            self.compile_expression()?;
            count += 1;
            if !self.match_symbol(',') {
                return Ok(count);
            }
        }
    }

    // ── Variable access ──────────────────────────────────────────────

    fn resolve(&self, name: &str, span: Span) -> Result<(Segment, usize), CompileError> {
        self.symbols
            .lookup(name)
            .map(|s| (s.kind.segment(), s.index))
            .ok_or_else(|| CompileError::unresolved(name, self.source, span))
    }

    fn push_variable(&mut self, name: &str, span: Span) -> Result<(), CompileError> {
        let (segment, index) = self.resolve(name, span)?;
        self.writer.push(segment, index);
        Ok(())
    }

    fn pop_variable(&mut self, name: &str, span: Span) -> Result<(), CompileError> {
        let (segment, index) = self.resolve(name, span)?;
        self.writer.pop(segment, index);
        Ok(())
    }

    // ── Token manipulation ───────────────────────────────────────────

    fn check_symbol(&self, c: char) -> bool {
        self.tokens.peek().kind.is_symbol(c)
    }

    fn check_keyword(&self, kw: Keyword) -> bool {
        self.tokens.peek().kind.is_keyword(kw)
    }

    fn match_symbol(&mut self, c: char) -> bool {
        if self.check_symbol(c) {
            self.tokens.advance();
            true
        } else {
            false
        }
    }

    fn match_keyword(&mut self, kw: Keyword) -> bool {
        if self.check_keyword(kw) {
            self.tokens.advance();
            true
        } else {
            false
        }
    }

    fn expect_symbol(&mut self, c: char) -> Result<(), CompileError> {
        if self.match_symbol(c) {
            return Ok(());
        }
        let token = self.tokens.peek().clone();
        Err(self.syntax_error(
            format!("expected '{}', found '{}'", c, token.kind),
            token.span,
            format!("expected '{}'", c),
        ))
    }

    fn expect_keyword(&mut self, kw: Keyword) -> Result<(), CompileError> {
        if self.match_keyword(kw) {
            return Ok(());
        }
        let token = self.tokens.peek().clone();
        Err(self.syntax_error(
            format!("expected '{}', found '{}'", kw, token.kind),
            token.span,
            format!("expected '{}'", kw),
        ))
    }

    fn expect_identifier(&mut self) -> Result<(String, Span), CompileError> {
        let token = self.tokens.advance();
        match token.kind {
            TokenKind::Identifier(name) => Ok((name, token.span)),
            other => Err(self.syntax_error(
                format!("expected identifier, found '{}'", other),
                token.span,
                "expected an identifier",
            )),
        }
    }

    /// `'int' | 'char' | 'boolean' | className`
    fn expect_type(&mut self) -> Result<String, CompileError> {
        let token = self.tokens.advance();
        match token.kind {
            TokenKind::Keyword(kw @ (Keyword::Int | Keyword::Char | Keyword::Boolean)) => {
                Ok(kw.as_str().to_string())
            }
            TokenKind::Identifier(name) => Ok(name),
            other => Err(self.syntax_error(
                format!("expected a type, found '{}'", other),
                token.span,
                "expected int, char, boolean, or a class name",
            )),
        }
    }

    fn syntax_error(
        &self,
        message: impl Into<String>,
        span: Span,
        label: impl Into<String>,
    ) -> CompileError {
        CompileError::syntax(message, self.source, span, label)
    }
}

// ── Tests ───────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::Lexer;
    use crate::vm::render;

    fn compile_source(src: &str) -> Vec<Command> {
        let mut lexer = Lexer::new(src);
        let tokens = lexer.scan_tokens();
        assert!(lexer.errors().is_empty(), "Lex errors: {:?}", lexer.errors());
        CompilationEngine::new(src, tokens)
            .compile()
            .expect("Compile failed")
    }

    fn compile_err(src: &str) -> CompileError {
        let mut lexer = Lexer::new(src);
        let tokens = lexer.scan_tokens();
        CompilationEngine::new(src, tokens)
            .compile()
            .expect_err("expected a compile error")
    }

    fn lines(commands: &[Command]) -> Vec<String> {
        commands.iter().map(|c| c.to_string()).collect()
    }

    fn position(haystack: &[String], needle: &str) -> usize {
        haystack
            .iter()
            .position(|l| l == needle)
            .unwrap_or_else(|| panic!("'{}' not found in {:#?}", needle, haystack))
    }

    #[test]
    fn test_method_prologue() {
        let out = lines(&compile_source(
            "class Foo { field int x; method int bar() { return x; } }",
        ));
        assert_eq!(
            out,
            vec![
                "function Foo.bar 0",
                "push argument 0",
                "pop pointer 0",
                "push this 0",
                "return",
            ]
        );
    }

    #[test]
    fn test_method_parameters_shifted_by_receiver() {
        let out = lines(&compile_source(
            "class P { method int pick(int a, int b) { return b; } }",
        ));
        assert_eq!(out[3], "push argument 2");
    }

    #[test]
    fn test_function_parameters_start_at_zero() {
        let out = lines(&compile_source(
            "class P { function int pick(int a, int b) { return b; } }",
        ));
        assert_eq!(out, vec!["function P.pick 0", "push argument 1", "return"]);
    }

    #[test]
    fn test_constructor_allocates_fields() {
        let out = lines(&compile_source(
            "class Point {
                field int x, y;
                static int count;
                field Point next;
                constructor Point new(int ax) {
                    let x = ax;
                    return this;
                }
            }",
        ));
        assert_eq!(
            out,
            vec![
                "function Point.new 0",
                "push constant 3",
                "call Memory.alloc 1",
                "pop pointer 0",
                "push argument 0",
                "pop this 0",
                "push pointer 0",
                "return",
            ]
        );
    }

    #[test]
    fn test_local_count_in_header() {
        let out = lines(&compile_source(
            "class M { function void f() { var int a, b; var Array c; return; } }",
        ));
        assert_eq!(out[0], "function M.f 3");
        assert_eq!(&out[1..], ["push constant 0", "return"]);
    }

    #[test]
    fn test_if_else_lowering() {
        let out = lines(&compile_source(
            "class C { function void f(boolean x) { var int y;
                if (x) { let y = 1; } else { let y = 2; }
                return; } }",
        ));
        assert_eq!(
            &out[1..11],
            [
                "push argument 0",
                "not",
                "if-goto IF1",
                "push constant 1",
                "pop local 0",
                "goto ENDIF2",
                "label IF1",
                "push constant 2",
                "pop local 0",
                "label ENDIF2",
            ]
        );
    }

    #[test]
    fn test_if_without_else_uses_skip_label_as_end() {
        let out = lines(&compile_source(
            "class C { function void f() { if (true) { } while (false) { } return; } }",
        ));
        assert_eq!(
            &out[1..],
            [
                "push constant 0",
                "not",
                "not",
                "if-goto IF1",
                "label IF1",
                "label WHILE3",
                "push constant 0",
                "not",
                "if-goto ENDWHILE4",
                "goto WHILE3",
                "label ENDWHILE4",
                "push constant 0",
                "return",
            ]
        );
    }

    #[test]
    fn test_while_lowering() {
        let out = lines(&compile_source(
            "class C { function void f() { var int i;
                while (i < 10) { let i = i + 1; }
                return; } }",
        ));
        assert_eq!(
            &out[1..13],
            [
                "label WHILE1",
                "push local 0",
                "push constant 10",
                "lt",
                "not",
                "if-goto ENDWHILE2",
                "push local 0",
                "push constant 1",
                "add",
                "pop local 0",
                "goto WHILE1",
                "label ENDWHILE2",
            ]
        );
    }

    #[test]
    fn test_labels_unique_across_subroutines() {
        let out = lines(&compile_source(
            "class C {
                function void f() { if (true) { } return; }
                function void g() { if (true) { } return; }
            }",
        ));
        assert!(out.contains(&"label IF1".to_string()));
        assert!(out.contains(&"label IF3".to_string()));
    }

    #[test]
    fn test_array_assignment_stashes_target_first() {
        let out = lines(&compile_source(
            "class C { function void f(Array a, int i, int j) {
                let a[i] = a[j];
                return; } }",
        ));
        assert_eq!(
            &out[1..14],
            [
                "push argument 0",
                "push argument 1",
                "add",
                "push argument 0",
                "push argument 2",
                "add",
                "pop pointer 1",
                "push that 0",
                "pop temp 0",
                "pop pointer 1",
                "push temp 0",
                "pop that 0",
                "push constant 0",
            ]
        );
    }

    #[test]
    fn test_array_target_address_precedes_source_reads() {
        let out = lines(&compile_source(
            "class C { function void f(Array a, int i, int j) {
                let a[i] = a[j];
                return; } }",
        ));
        let target_add = position(&out, "add");
        let first_pointer = position(&out, "pop pointer 1");
        assert!(target_add < first_pointer);
    }

    #[test]
    fn test_expression_is_left_to_right() {
        let out = lines(&compile_source(
            "class C { function int f() { return 1 + 2 * 3; } }",
        ));
        assert_eq!(
            &out[1..],
            [
                "push constant 1",
                "push constant 2",
                "add",
                "push constant 3",
                "call Math.multiply 2",
                "return",
            ]
        );
    }

    #[test]
    fn test_multiply_and_divide_are_distinct_calls() {
        let out = lines(&compile_source(
            "class C { function int f(int a) { return (a * 2) / (a - 1); } }",
        ));
        assert!(out.contains(&"call Math.multiply 2".to_string()));
        assert!(out.contains(&"call Math.divide 2".to_string()));
        assert!(out.contains(&"sub".to_string()));
    }

    #[test]
    fn test_operator_mnemonics() {
        let out = lines(&compile_source(
            "class C { function boolean f(int a) { return (a = 1) | (a > 2) & (a < 3); } }",
        ));
        for op in ["eq", "gt", "lt", "and", "or"] {
            assert!(out.contains(&op.to_string()), "missing {}", op);
        }
    }

    #[test]
    fn test_unary_operators() {
        let out = lines(&compile_source(
            "class C { function int f(int a) { return -a + ~a; } }",
        ));
        assert_eq!(
            &out[1..],
            ["push argument 0", "neg", "push argument 0", "not", "add", "return"]
        );
    }

    #[test]
    fn test_call_arity() {
        let out = lines(&compile_source(
            "class Game {
                field Ball ball;
                method void run() {
                    do ball.move(1, 2);
                    do Output.printInt(3);
                    do draw();
                    return;
                }
                method void draw() { return; }
            }",
        ));
        assert_eq!(
            &out[3..15],
            [
                "push this 0",
                "push constant 1",
                "push constant 2",
                "call Ball.move 3",
                "pop temp 0",
                "push constant 3",
                "call Output.printInt 1",
                "pop temp 0",
                "push pointer 0",
                "call Game.draw 1",
                "pop temp 0",
                "push constant 0",
            ]
        );
    }

    #[test]
    fn test_local_variable_shadows_class_name_for_calls() {
        let out = lines(&compile_source(
            "class Main { function void main() { var Square Square;
                do Square.dispose(); return; } }",
        ));
        assert_eq!(&out[1..3], ["push local 0", "call Square.dispose 1"]);
    }

    #[test]
    fn test_call_in_expression() {
        let out = lines(&compile_source(
            "class C { function int f() { return Math.max(1, C.g()); }
                       function int g() { return 0; } }",
        ));
        assert_eq!(
            &out[1..5],
            ["push constant 1", "call C.g 0", "call Math.max 2", "return"]
        );
    }

    #[test]
    fn test_string_constant() {
        let out = lines(&compile_source(
            "class C { function void f() { do Output.printString(\"Hi\"); return; } }",
        ));
        assert_eq!(
            &out[1..8],
            [
                "push constant 2",
                "call String.new 1",
                "push constant 72",
                "call String.appendChar 2",
                "push constant 105",
                "call String.appendChar 2",
                "call Output.printString 1",
            ]
        );
    }

    #[test]
    fn test_keyword_constants() {
        let out = lines(&compile_source(
            "class C { function void f() { var boolean b; var C c;
                let b = true; let b = false; let c = null; return; } }",
        ));
        assert_eq!(
            &out[1..8],
            [
                "push constant 0",
                "not",
                "pop local 0",
                "push constant 0",
                "pop local 0",
                "push constant 0",
                "pop local 1",
            ]
        );
    }

    #[test]
    fn test_this_in_method_reads_receiver_argument() {
        let out = lines(&compile_source(
            "class C { method C me() { return this; } }",
        ));
        assert_eq!(&out[3..], ["push argument 0", "return"]);
    }

    #[test]
    fn test_static_and_field_segments() {
        let out = lines(&compile_source(
            "class C { static int s; field int f;
                method void m() { let s = f; return; } }",
        ));
        assert_eq!(&out[3..5], ["push this 0", "pop static 0"]);
    }

    #[test]
    fn test_this_in_function_is_rejected() {
        let err = compile_err("class C { function C f() { return this; } }");
        assert!(matches!(err, CompileError::Syntax { .. }));
    }

    #[test]
    fn test_undefined_variable() {
        let err = compile_err("class C { function void f() { let y = 1; return; } }");
        match err {
            CompileError::Unresolved { name, line, .. } => {
                assert_eq!(name, "y");
                assert_eq!(line, 1);
            }
            other => panic!("expected Unresolved, got {:?}", other),
        }
    }

    #[test]
    fn test_undefined_variable_in_expression() {
        let err = compile_err("class C { function int f() { return z[0]; } }");
        assert!(matches!(err, CompileError::Unresolved { .. }));
    }

    #[test]
    fn test_missing_semicolon() {
        let err = compile_err("class C { function int f() { return 1 } }");
        assert!(err.to_string().contains("expected ';'"), "{}", err);
    }

    #[test]
    fn test_bad_term() {
        let err = compile_err("class C { function int f() { return 1 + ; } }");
        assert!(err.to_string().contains("expected an expression"), "{}", err);
    }

    #[test]
    fn test_trailing_tokens_after_class() {
        let err = compile_err("class A { } class B { }");
        assert!(matches!(err, CompileError::Syntax { .. }));
    }

    #[test]
    fn test_truncated_input() {
        let err = compile_err("class A { function void f() { while (true) {");
        assert!(err.to_string().contains("EOF"), "{}", err);
    }

    #[test]
    fn test_full_class_renders() {
        let src = "class Main {
            function void main() {
                var Array a;
                var int sum, i;
                let a = Array.new(3);
                let i = 0;
                while (i < 3) {
                    let a[i] = i * i;
                    let sum = sum + a[i];
                    let i = i + 1;
                }
                do Output.printInt(sum);
                return;
            }
        }";
        let text = render(&compile_source(src));
        assert!(text.starts_with("function Main.main 3\n"));
        assert!(text.ends_with("push constant 0\nreturn\n"));
    }
}
