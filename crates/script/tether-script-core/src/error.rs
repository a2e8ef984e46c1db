use thiserror::Error;

use tether_api_core::coercion::to_display_string;
use tether_api_core::Value;

/// Source could not be turned into a syntax tree.
#[derive(Debug, Error, Clone, PartialEq)]
#[error("{message} at line {line}, column {column}")]
pub struct ParseError {
    pub message: String,
    /// Byte offset including the parser base.
    pub offset: usize,
    /// 1-based, relative to the parsed text.
    pub line: u32,
    pub column: u32,
}

impl ParseError {
    pub(crate) fn at(source: &str, local: usize, base: usize, message: impl Into<String>) -> Self {
        let (line, column) = line_column(source, local);
        Self {
            message: message.into(),
            offset: base + local,
            line,
            column,
        }
    }
}

/// 1-based line and column of byte `offset` in `source`.
pub fn line_column(source: &str, offset: usize) -> (u32, u32) {
    let upto = &source[..offset.min(source.len())];
    let line = upto.matches('\n').count() as u32 + 1;
    let column = match upto.rfind('\n') {
        Some(nl) => upto[nl + 1..].chars().count() as u32 + 1,
        None => upto.chars().count() as u32 + 1,
    };
    (line, column)
}

#[derive(Debug, Error, Clone, PartialEq)]
#[non_exhaustive]
pub enum CompileError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("source does not evaluate to a function")]
    NotAFunction,
}

/// Error raised while running a compiled function.
#[derive(Debug, Error, Clone, PartialEq)]
#[non_exhaustive]
pub enum EvalError {
    /// A script `throw`.
    #[error("Uncaught {}", to_display_string(.0))]
    Thrown(Value),

    #[error("ReferenceError: {name} is not defined")]
    Reference { name: String },

    #[error("TypeError: {message}")]
    Type { message: String },

    #[error("RangeError: maximum call depth {depth} exceeded")]
    CallDepth { depth: usize },
}
