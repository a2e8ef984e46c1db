use thiserror::Error;

use tether_api_core::ObjectId;

use crate::ids::{BindingId, ProgramId};

#[derive(Error, Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum BindingError {
    #[error("unknown object {0}")]
    UnknownObject(ObjectId),

    #[error("{object} has no property '{name}'")]
    UnknownProperty { object: ObjectId, name: String },

    #[error("{0} does not refer to a live binding")]
    StaleBinding(BindingId),

    #[error("{0} is already attached to an object")]
    AlreadyAttached(BindingId),

    #[error("unknown program {0:?}")]
    UnknownProgram(ProgramId),

    #[error("program {program:?} has no closure {closure}")]
    UnknownClosure { program: ProgramId, closure: usize },

    #[error("document references unknown object id '{0}'")]
    UnknownDocumentObject(String),

    #[error("invalid document: {0}")]
    Document(String),

    #[error("{url}:{line}: {message}")]
    Compile { url: String, line: u32, message: String },

    #[error("{url}: {message}")]
    Evaluation { url: String, message: String },
}
