//! Rich error reporting with source spans.
//!
//! Uses miette for terminal error output with source code context and
//! underlines. Every error class aborts compilation of the file it was
//! raised in; no partial instruction output is produced.

use crate::token::Span;
use miette::{Diagnostic, SourceSpan};
use thiserror::Error;

/// A compiler error with source location information.
#[derive(Error, Debug, Diagnostic)]
pub enum CompileError {
    /// Input text that matches no token pattern.
    #[error("{message} (line {line}, column {column})")]
    #[diagnostic(code(jack::lexical))]
    Lexical {
        message: String,
        #[source_code]
        src: String,
        #[label("{label}")]
        span: SourceSpan,
        label: String,
        line: usize,
        column: usize,
    },

    /// A token that does not fit the grammar at this position.
    #[error("{message} (line {line}, column {column})")]
    #[diagnostic(code(jack::syntax))]
    Syntax {
        message: String,
        #[source_code]
        src: String,
        #[label("{label}")]
        span: SourceSpan,
        label: String,
        line: usize,
        column: usize,
    },

    /// A variable that is defined in neither the subroutine nor the class scope.
    #[error("undefined variable '{name}' (line {line}, column {column})")]
    #[diagnostic(
        code(jack::unresolved),
        help("declare it with `var`, `field`, `static`, or as a parameter")
    )]
    Unresolved {
        name: String,
        #[source_code]
        src: String,
        #[label("not found in this scope")]
        span: SourceSpan,
        line: usize,
        column: usize,
    },
}

impl CompileError {
    pub fn lexical(
        message: impl Into<String>,
        src: &str,
        span: Span,
        label: impl Into<String>,
    ) -> Self {
        let (line, column) = line_col(src, span.start);
        Self::Lexical {
            message: message.into(),
            src: src.to_string(),
            span: to_source_span(span),
            label: label.into(),
            line,
            column,
        }
    }

    pub fn syntax(
        message: impl Into<String>,
        src: &str,
        span: Span,
        label: impl Into<String>,
    ) -> Self {
        let (line, column) = line_col(src, span.start);
        Self::Syntax {
            message: message.into(),
            src: src.to_string(),
            span: to_source_span(span),
            label: label.into(),
            line,
            column,
        }
    }

    pub fn unresolved(name: impl Into<String>, src: &str, span: Span) -> Self {
        let (line, column) = line_col(src, span.start);
        Self::Unresolved {
            name: name.into(),
            src: src.to_string(),
            span: to_source_span(span),
            line,
            column,
        }
    }

    /// 1-based line and column of the error.
    pub fn position(&self) -> (usize, usize) {
        match self {
            CompileError::Lexical { line, column, .. }
            | CompileError::Syntax { line, column, .. }
            | CompileError::Unresolved { line, column, .. } => (*line, *column),
        }
    }
}

fn to_source_span(span: Span) -> SourceSpan {
    (span.start, span.end.saturating_sub(span.start)).into()
}

/// Translate a byte offset into a 1-based (line, column) pair.
fn line_col(src: &str, offset: usize) -> (usize, usize) {
    let offset = offset.min(src.len());
    let before = &src[..offset];
    let line = before.matches('\n').count() + 1;
    let line_start = before.rfind('\n').map(|i| i + 1).unwrap_or(0);
    let column = before[line_start..].chars().count() + 1;
    (line, column)
}
