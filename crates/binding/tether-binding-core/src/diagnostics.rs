//! Structured diagnostics and the bounded delayed-error queue.

use std::collections::VecDeque;
use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum DiagnosticKind {
    BindingLoop,
    Compile,
    Evaluation,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub message: String,
    pub url: String,
    /// 1-based; 0 when no source line is known.
    pub line: u32,
    /// Columns are not tracked for evaluation errors.
    pub column: Option<u32>,
    /// Reported straight to the log instead of through the delayed queue.
    pub immediate: bool,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.line, self.column) {
            (0, _) => write!(f, "{}: {}", self.url, self.message),
            (line, Some(column)) => write!(f, "{}:{}:{}: {}", self.url, line, column, self.message),
            (line, None) => write!(f, "{}:{}: {}", self.url, line, self.message),
        }
    }
}

#[derive(Debug)]
pub(crate) struct DelayedErrors {
    queue: VecDeque<Diagnostic>,
    capacity: usize,
}

impl DelayedErrors {
    pub fn new(capacity: usize) -> Self {
        Self {
            queue: VecDeque::with_capacity(capacity.min(256)),
            capacity,
        }
    }

    /// Queue `diag`, handing it back when the queue is full.
    pub fn push(&mut self, diag: Diagnostic) -> Result<(), Diagnostic> {
        if self.queue.len() >= self.capacity {
            return Err(diag);
        }
        self.queue.push_back(diag);
        Ok(())
    }

    pub fn drain(&mut self) -> Vec<Diagnostic> {
        self.queue.drain(..).collect()
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }
}
