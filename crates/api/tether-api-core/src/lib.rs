//! tether-api-core: value model and collaborator contracts (engine-agnostic).
//!
//! Every other tether crate speaks in terms of the types defined here: the dynamic
//! [`Value`], object and property addressing ([`ObjectId`], [`PropertyIndex`]), write
//! flags, and the [`PropertyHost`] trait through which animations and bindings read and
//! write properties.

pub mod coercion;
pub mod host;
pub mod ids;
pub mod list_model;
pub mod value;

pub use host::{InterceptedWrite, PropertyHost, WriteFlags};
pub use ids::{ObjectId, PropertyIndex};
pub use list_model::{ListModel, ListModelHandle};
pub use value::{Getter, RegExpFlags, SequenceKind, Value, ValueKind};
