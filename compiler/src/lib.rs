//! Jack Compiler — single-pass compiler from Jack classes to VM code.
//!
//! # Compiler Pipeline
//!
//! ```text
//! Source Code (.jack)
//!     │
//!     ▼
//! ┌──────────┐
//! │  Lexer    │  Tokenizes source into a stream of tokens with spans
//! └────┬─────┘
//!      │
//!      ▼
//! ┌──────────┐   ┌──────────────┐
//! │ Compiler  │◄─►│ Symbol table │  Recursive descent; resolves names and
//! └────┬─────┘   └──────────────┘  emits commands while parsing
//!      │
//!      ▼
//! ┌──────────┐
//! │ VmWriter  │  One stack-machine command per line
//! └────┬─────┘
//!      │
//!      ▼
//! VM code (.vm)
//! ```
//!
//! Two listings sit beside the pipeline: [`xml`] dumps the token stream and
//! [`analyzer`] walks the same grammar to dump the parse tree.

pub mod analyzer;
pub mod compiler;
pub mod driver;
pub mod errors;
pub mod lexer;
pub mod symbol_table;
pub mod token;
pub mod vm;
pub mod xml;

pub use errors::CompileError;

use compiler::CompilationEngine;
use lexer::Lexer;
use token::Token;
use vm::Command;

/// Tokenize a source file, failing on the first lexical error.
pub fn tokenize(source: &str) -> Result<Vec<Token>, CompileError> {
    let mut lexer = Lexer::new(source);
    let tokens = lexer.scan_tokens();
    match lexer.into_errors().into_iter().next() {
        Some(err) => Err(err),
        None => Ok(tokens),
    }
}

/// Compile one class to its VM commands.
pub fn compile_commands(source: &str) -> Result<Vec<Command>, CompileError> {
    let tokens = tokenize(source)?;
    CompilationEngine::new(source, tokens).compile()
}

/// Compile one class to VM text, one command per line.
pub fn compile(source: &str) -> Result<String, CompileError> {
    compile_commands(source).map(|commands| vm::render(&commands))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lexical_errors_abort_compilation() {
        let err = compile("class A { function void f() { return $; } }").unwrap_err();
        assert!(matches!(err, CompileError::Lexical { .. }));
    }

    #[test]
    fn test_output_parses_back() {
        let source = "class Counter {
            field int n;
            constructor Counter new() { let n = 0; return this; }
            method void inc() { let n = n + 1; return; }
            method int get() { return n; }
        }";
        let text = compile(source).unwrap();
        let parsed = vm::parse_program(&text).unwrap();
        assert_eq!(parsed, compile_commands(source).unwrap());
        assert_eq!(parsed.len(), text.lines().count());
    }
}
