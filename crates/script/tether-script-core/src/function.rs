//! Contracts between compiled script functions and whoever hosts them.

use std::sync::Arc;

use tether_api_core::{ObjectId, Value};

use crate::error::{CompileError, EvalError};

/// Name resolution for identifiers a function does not declare itself.
///
/// Reads go through `&mut self` so an implementation can record them as dependencies.
pub trait ScopeAccess {
    /// Resolve a free identifier. `None` means it is not defined anywhere.
    fn lookup(&mut self, name: &str) -> Option<Value>;

    /// Assign a free identifier. Returns `false` if no such property exists.
    fn assign(&mut self, name: &str, value: Value) -> bool;

    /// Read a named property of a host object.
    fn member(&mut self, object: ObjectId, name: &str) -> Option<Value>;

    /// Write a named property of a host object.
    fn assign_member(&mut self, object: ObjectId, name: &str, value: Value) -> bool;
}

/// A function ready to be invoked repeatedly.
pub trait CompiledFunction {
    fn name(&self) -> &str;

    fn invoke(&self, this: &Value, args: &[Value], scope: &mut dyn ScopeAccess) -> Result<Value, EvalError>;
}

/// Turns function source text (`(function name(a, b) { ... })`) into a [`CompiledFunction`].
pub trait ScriptCompiler {
    fn compile(&self, source: &str) -> Result<Arc<dyn CompiledFunction>, CompileError>;
}

/// Scope with nothing in it.
#[derive(Debug, Default, Clone, Copy)]
pub struct EmptyScope;

impl ScopeAccess for EmptyScope {
    fn lookup(&mut self, _name: &str) -> Option<Value> {
        None
    }

    fn assign(&mut self, _name: &str, _value: Value) -> bool {
        false
    }

    fn member(&mut self, _object: ObjectId, _name: &str) -> Option<Value> {
        None
    }

    fn assign_member(&mut self, _object: ObjectId, _name: &str, _value: Value) -> bool {
        false
    }
}
