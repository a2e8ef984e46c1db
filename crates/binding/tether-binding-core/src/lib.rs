//! tether-binding-core: property bindings for tether objects.
//!
//! The [`Engine`] owns objects, binding records and loaded programs. A write to a
//! property re-evaluates, synchronously and in subscription order, every binding
//! that read it during its last evaluation.

mod arena;
pub mod binding;
pub mod changes;
pub mod config;
pub mod diagnostics;
pub mod document;
pub mod engine;
pub mod error;
pub mod ids;
pub mod object;
pub mod program;
mod scope;

pub use binding::{BindingInfo, BindingKind, BindingState};
pub use changes::{ChangeValue, PropertyChange};
pub use config::Config;
pub use diagnostics::{Diagnostic, DiagnosticKind};
pub use document::{json_to_value, BindingSpec, DocumentSpec, LoadedDocument, MemberSpec, ObjectSpec, PropertySpec};
pub use engine::{Engine, EngineStats};
pub use error::BindingError;
pub use ids::{BindingId, ProgramId};
pub use object::PropertyDecl;
pub use program::ClosureSource;
