//! Compiled-binding executor: the closures of one document and the bindings made
//! from them.

use std::sync::Arc;

use hashbrown::HashMap;
use serde::{Deserialize, Serialize};

use tether_api_core::{ObjectId, PropertyIndex, WriteFlags};
use tether_script_core::{CompileError, CompiledFunction, RewriteBinding, ScriptCompiler};

use crate::binding::{BindingKind, BindingRecord};
use crate::diagnostics::{Diagnostic, DiagnosticKind};
use crate::engine::Engine;
use crate::error::BindingError;
use crate::ids::{BindingId, ProgramId};

/// Raw binding source as it appears in a document.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ClosureSource {
    pub source: String,
    #[serde(default = "first")]
    pub line: u32,
    #[serde(default = "first")]
    pub column: u32,
}

fn first() -> u32 {
    1
}

impl ClosureSource {
    pub fn new(source: impl Into<String>, line: u32, column: u32) -> Self {
        Self {
            source: source.into(),
            line,
            column,
        }
    }
}

pub(crate) struct Closure {
    /// Dropped once compiled.
    source: Option<String>,
    line: u32,
    column: u32,
    /// `None` after a failed compile: the closure is a no-op.
    function: Option<Arc<dyn CompiledFunction>>,
}

pub(crate) struct Program {
    pub url: String,
    closures: Vec<Closure>,
    compiled: bool,
    /// Document ids visible to every closure.
    pub context: HashMap<String, ObjectId>,
    /// Bindings configured from this program; may hold freed ids.
    bindings: Vec<BindingId>,
    pub ref_count: u32,
}

impl Program {
    fn new(url: String, sources: Vec<ClosureSource>) -> Self {
        let closures = sources
            .into_iter()
            .map(|c| Closure {
                source: Some(c.source),
                line: c.line,
                column: c.column,
                function: None,
            })
            .collect();
        Self {
            url,
            closures,
            compiled: false,
            context: HashMap::new(),
            bindings: Vec::new(),
            ref_count: 0,
        }
    }

    pub fn closure_line(&self, closure: usize) -> u32 {
        self.closures.get(closure).map(|c| c.line).unwrap_or(0)
    }

    /// Compile every closure, returning one diagnostic per failure.
    fn compile(&mut self, compiler: &dyn ScriptCompiler) -> Vec<Diagnostic> {
        log::debug!("compiling {} closures for {}", self.closures.len(), self.url);
        let mut failures = Vec::new();
        for (i, closure) in self.closures.iter_mut().enumerate() {
            let Some(source) = closure.source.take() else {
                continue;
            };
            let compiled = RewriteBinding::new(format!("binding_{i}"))
                .rewrite(&source, 0)
                .map_err(CompileError::from)
                .and_then(|text| compiler.compile(&text));
            match compiled {
                Ok(function) => closure.function = Some(function),
                Err(err) => {
                    let (line, column, message) = match &err {
                        CompileError::Parse(p) => {
                            let column = if p.line == 1 { closure.column + p.column - 1 } else { p.column };
                            (closure.line + p.line - 1, Some(column), p.message.clone())
                        }
                        other => (closure.line, None, other.to_string()),
                    };
                    failures.push(Diagnostic {
                        kind: DiagnosticKind::Compile,
                        message,
                        url: self.url.clone(),
                        line,
                        column,
                        immediate: true,
                    });
                }
            }
        }
        self.compiled = true;
        failures
    }
}

impl Engine {
    /// Register a document's closures. Nothing is compiled until the first binding is
    /// configured from it.
    pub fn create_program(&mut self, url: impl Into<String>, closures: Vec<ClosureSource>) -> ProgramId {
        let id = self.ids.alloc_program();
        self.programs.insert(id, Program::new(url.into(), closures));
        id
    }

    /// Create a binding that evaluates `closure` with `scope` as its scope object and
    /// writes to `(target, index)`. The caller attaches it with
    /// [`Engine::add_to_object`].
    pub fn config_binding(
        &mut self,
        program: ProgramId,
        closure: usize,
        target: ObjectId,
        index: PropertyIndex,
        scope: ObjectId,
    ) -> Result<BindingId, BindingError> {
        self.check_property(target, index)?;
        if self.objects.get(scope).is_none() {
            return Err(BindingError::UnknownObject(scope));
        }
        let p = self.programs.get_mut(&program).ok_or(BindingError::UnknownProgram(program))?;
        if closure >= p.closures.len() {
            return Err(BindingError::UnknownClosure { program, closure });
        }
        if !p.compiled {
            for diag in p.compile(self.compiler.as_ref()) {
                self.report_compile_error(diag);
            }
        }

        let kind = BindingKind::Script { program, closure, scope };
        let id = self.bindings.insert(BindingRecord::new(kind, target, index));
        if let Some(p) = self.programs.get_mut(&program) {
            p.ref_count += 1;
            p.bindings.push(id);
        }
        Ok(id)
    }

    /// Re-evaluate every enabled, attached binding made from `program`.
    pub fn refresh(&mut self, program: ProgramId) -> Result<(), BindingError> {
        let p = self.programs.get_mut(&program).ok_or(BindingError::UnknownProgram(program))?;
        let bindings = &self.bindings;
        p.bindings.retain(|id| bindings.contains(*id));
        for id in p.bindings.clone() {
            let live = self
                .bindings
                .get(id)
                .is_some_and(|r| r.state.enabled && r.state.added_to_object && !r.destroyed);
            if live {
                self.update(id, WriteFlags::empty())?;
            }
        }
        Ok(())
    }

    /// Bind `name` to `object` for identifier lookups in `program`. A compiled
    /// program re-evaluates its bindings.
    pub fn set_context_id(&mut self, program: ProgramId, name: impl Into<String>, object: ObjectId) -> Result<(), BindingError> {
        let p = self.programs.get_mut(&program).ok_or(BindingError::UnknownProgram(program))?;
        p.context.insert(name.into(), object);
        if p.compiled {
            self.refresh(program)?;
        }
        Ok(())
    }

    /// Number of bindings holding a reference to the program.
    pub fn program_ref_count(&self, program: ProgramId) -> Option<u32> {
        self.programs.get(&program).map(|p| p.ref_count)
    }

    pub fn program_url(&self, program: ProgramId) -> Option<&str> {
        self.programs.get(&program).map(|p| p.url.as_str())
    }

    pub fn is_compiled(&self, program: ProgramId) -> bool {
        self.programs.get(&program).is_some_and(|p| p.compiled)
    }

    /// `Some(true)` while the closure's raw text is still held.
    pub fn holds_source(&self, program: ProgramId, closure: usize) -> Option<bool> {
        let p = self.programs.get(&program)?;
        p.closures.get(closure).map(|c| c.source.is_some())
    }

    pub(crate) fn closure_function(&self, program: ProgramId, closure: usize) -> Option<Arc<dyn CompiledFunction>> {
        self.programs
            .get(&program)?
            .closures
            .get(closure)?
            .function
            .clone()
    }
}
