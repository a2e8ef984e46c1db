//! Batched property changes, applied as one state transition.

use tether_api_core::{ObjectId, PropertyIndex, Value, WriteFlags};
use tether_script_core::RewriteBinding;

use crate::engine::Engine;
use crate::error::BindingError;
use crate::ids::ProgramId;

#[derive(Clone, Debug, PartialEq)]
pub enum ChangeValue {
    Value(Value),
    /// Evaluated once, with the changed object as scope.
    Expression(String),
}

#[derive(Clone, Debug, PartialEq)]
pub struct PropertyChange {
    pub object: ObjectId,
    pub index: PropertyIndex,
    pub value: ChangeValue,
}

impl PropertyChange {
    pub fn value(object: ObjectId, index: PropertyIndex, value: impl Into<Value>) -> Self {
        Self {
            object,
            index,
            value: ChangeValue::Value(value.into()),
        }
    }

    pub fn expression(object: ObjectId, index: PropertyIndex, source: impl Into<String>) -> Self {
        Self {
            object,
            index,
            value: ChangeValue::Expression(source.into()),
        }
    }
}

impl Engine {
    /// Apply `changes` as one transition.
    ///
    /// Every new value is computed against the state before the first write; the
    /// writes then happen one at a time, in order. A failure while computing values
    /// leaves every property untouched. Returns the number of writes accepted.
    pub fn apply_changes(&mut self, program: Option<ProgramId>, changes: &[PropertyChange]) -> Result<usize, BindingError> {
        let mut resolved = Vec::with_capacity(changes.len());
        for change in changes {
            self.check_property(change.object, change.index)?;
            let value = match &change.value {
                ChangeValue::Value(v) => v.clone(),
                ChangeValue::Expression(source) => self.evaluate(program, change.object, source)?,
            };
            resolved.push((change.object, change.index, value));
        }

        let mut written = 0;
        for (object, index, value) in resolved {
            if self.write(object, index, value, WriteFlags::REMOVE_BINDING) {
                written += 1;
            }
        }
        Ok(written)
    }

    /// Evaluate a one-off expression with `scope` as scope object. Reads are not
    /// subscribed to.
    pub fn evaluate(&mut self, program: Option<ProgramId>, scope: ObjectId, source: &str) -> Result<Value, BindingError> {
        if self.objects.get(scope).is_none() {
            return Err(BindingError::UnknownObject(scope));
        }
        let url = program
            .and_then(|p| self.program_url(p))
            .map(str::to_string)
            .unwrap_or_else(|| self.cfg.document_url.clone());
        let text = RewriteBinding::new("expression")
            .rewrite(source, 0)
            .map_err(|e| BindingError::Compile {
                url: url.clone(),
                line: e.line,
                message: e.message,
            })?;
        let function = self.compiler.compile(&text).map_err(|e| BindingError::Compile {
            url: url.clone(),
            line: 1,
            message: e.to_string(),
        })?;
        let (result, _) = self.invoke(function.as_ref(), scope, program);
        result.map_err(|e| BindingError::Evaluation {
            url,
            message: e.to_string(),
        })
    }
}
