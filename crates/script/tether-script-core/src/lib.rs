//! tether-script-core: the script side of bindings.
//!
//! - [`parser`] turns binding source into a span-annotated syntax tree.
//! - [`rewriter`] wraps a binding or signal handler into a function literal.
//! - [`interpreter`] compiles function literals and runs them against a
//!   [`ScopeAccess`] supplied by the binding engine.

pub mod ast;
pub mod error;
pub mod function;
pub mod interpreter;
pub mod lexer;
pub mod parser;
pub mod rewriter;

pub use error::{line_column, CompileError, EvalError, ParseError};
pub use function::{CompiledFunction, EmptyScope, ScopeAccess, ScriptCompiler};
pub use interpreter::{Interpreter, ScriptFunction};
pub use parser::{parse_program_at, parse_statement, parse_statement_at};
pub use rewriter::{RewriteBinding, RewriteSignalHandler};
