//! Shared list model that crosses the worker boundary by handle rather than by copy.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use crate::value::Value;

/// Agent id meaning "not attached to any engine".
pub const NO_AGENT: u64 = 0;

/// Row storage for a list model. Each row is a plain object value.
#[derive(Debug, Default)]
pub struct ListModel {
    rows: RwLock<Vec<Value>>,
    agent: AtomicU64,
}

impl ListModel {
    pub fn new(rows: Vec<Value>) -> Self {
        Self {
            rows: RwLock::new(rows),
            agent: AtomicU64::new(NO_AGENT),
        }
    }

    pub fn len(&self) -> usize {
        match self.rows.read() {
            Ok(rows) => rows.len(),
            Err(poisoned) => poisoned.into_inner().len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Clone of the row at `index`.
    pub fn get(&self, index: usize) -> Option<Value> {
        match self.rows.read() {
            Ok(rows) => rows.get(index).cloned(),
            Err(poisoned) => poisoned.into_inner().get(index).cloned(),
        }
    }

    pub fn append(&self, row: Value) {
        match self.rows.write() {
            Ok(mut rows) => rows.push(row),
            Err(poisoned) => poisoned.into_inner().push(row),
        }
    }

    /// Snapshot of all rows.
    pub fn rows(&self) -> Vec<Value> {
        match self.rows.read() {
            Ok(rows) => rows.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Engine currently acting on this model, or [`NO_AGENT`].
    pub fn agent(&self) -> u64 {
        self.agent.load(Ordering::Acquire)
    }
}

/// Reference-counted handle to a [`ListModel`].
#[derive(Clone, Default)]
pub struct ListModelHandle(Arc<ListModel>);

impl ListModelHandle {
    pub fn new(model: ListModel) -> Self {
        Self(Arc::new(model))
    }

    pub fn model(&self) -> &ListModel {
        &self.0
    }

    /// Attach the model to the engine identified by `agent`.
    pub fn attach(&self, agent: u64) {
        self.0.agent.store(agent, Ordering::Release);
    }

    /// Number of live handles, including this one.
    pub fn ref_count(&self) -> usize {
        Arc::strong_count(&self.0)
    }

    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl PartialEq for ListModelHandle {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl fmt::Debug for ListModelHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListModelHandle")
            .field("rows", &self.0.len())
            .field("agent", &self.0.agent())
            .finish()
    }
}
