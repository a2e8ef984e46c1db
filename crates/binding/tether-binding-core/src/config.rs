#![allow(dead_code)]
//! Engine configuration.

use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Evaluation errors kept for [`crate::Engine::take_delayed_errors`]. Once the
    /// queue is full further errors are logged immediately.
    pub delayed_error_capacity: usize,
    /// URL reported for diagnostics that do not come from a loaded program.
    pub document_url: String,
    /// Restore the pre-evaluation value of a property whose binding looped.
    pub rollback_on_binding_loop: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            delayed_error_capacity: 64,
            document_url: "inline".to_string(),
            rollback_on_binding_loop: true,
        }
    }
}
