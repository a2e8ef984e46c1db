//! Name resolution for script bindings, with dependency capture.

use tether_api_core::{ObjectId, Value, WriteFlags};
use tether_script_core::ScopeAccess;

use crate::engine::Engine;
use crate::ids::ProgramId;

/// Scope chain seen by one evaluation: the scope object's properties, then the
/// program's context ids. Every property read is recorded.
pub(crate) struct EvalScope<'e> {
    engine: &'e mut Engine,
    scope: ObjectId,
    program: Option<ProgramId>,
    dependencies: Vec<(ObjectId, u32)>,
}

impl<'e> EvalScope<'e> {
    pub fn new(engine: &'e mut Engine, scope: ObjectId, program: Option<ProgramId>) -> Self {
        Self {
            engine,
            scope,
            program,
            dependencies: Vec::new(),
        }
    }

    pub fn into_dependencies(self) -> Vec<(ObjectId, u32)> {
        self.dependencies
    }

    fn read_named(&mut self, object: ObjectId, name: &str) -> Option<Value> {
        let obj = self.engine.objects.get(object)?;
        let index = obj.find(name)?;
        let value = obj.read(index)?;
        self.dependencies.push((object, index.core));
        Some(value)
    }

    fn write_named(&mut self, object: ObjectId, name: &str, value: Value) -> bool {
        let Some(index) = self.engine.objects.get(object).and_then(|o| o.find(name)) else {
            return false;
        };
        self.engine.write(object, index, value, WriteFlags::REMOVE_BINDING)
    }
}

impl ScopeAccess for EvalScope<'_> {
    fn lookup(&mut self, name: &str) -> Option<Value> {
        if let Some(value) = self.read_named(self.scope, name) {
            return Some(value);
        }
        let program = self.engine.programs.get(&self.program?)?;
        program.context.get(name).map(|id| Value::QObject(*id))
    }

    fn assign(&mut self, name: &str, value: Value) -> bool {
        self.write_named(self.scope, name, value)
    }

    fn member(&mut self, object: ObjectId, name: &str) -> Option<Value> {
        self.read_named(object, name)
    }

    fn assign_member(&mut self, object: ObjectId, name: &str, value: Value) -> bool {
        self.write_named(object, name, value)
    }
}
