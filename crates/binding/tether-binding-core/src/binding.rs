//! Binding records as stored in the engine arena.

use tether_api_core::{ObjectId, PropertyIndex};

use crate::diagnostics::Diagnostic;
use crate::ids::{BindingId, ProgramId};

/// What a binding does when it updates.
#[derive(Clone, Debug, PartialEq)]
pub enum BindingKind {
    /// Evaluates closure `closure` of `program` with `scope` as the scope object.
    Script {
        program: ProgramId,
        closure: usize,
        scope: ObjectId,
    },
    /// Groups the member bindings of one value-type property. Owned by the object
    /// list and reused once created.
    ValueTypeProxy { children: Option<BindingId> },
    /// Copies `source` into the target whenever `source` changes.
    PropertyToProperty { object: ObjectId, index: PropertyIndex },
}

impl BindingKind {
    pub fn is_proxy(&self) -> bool {
        matches!(self, BindingKind::ValueTypeProxy { .. })
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BindingState {
    pub enabled: bool,
    pub updating: bool,
    pub added_to_object: bool,
}

#[derive(Debug)]
pub(crate) struct BindingRecord {
    pub kind: BindingKind,
    pub target: ObjectId,
    pub index: PropertyIndex,
    pub state: BindingState,
    pub ref_count: u32,
    /// Next binding in the object list, or in the owning proxy's member list.
    pub next: Option<BindingId>,
    /// Properties read during the last evaluation.
    pub dependencies: Vec<(ObjectId, u32)>,
    pub error: Option<Diagnostic>,
    /// Re-entered while updating; the outer update decides about rollback.
    pub loop_detected: bool,
    /// Writing the pre-loop value back; re-entry is expected and not a loop.
    pub rolling_back: bool,
    /// `destroy` ran; the result of an in-flight evaluation is dropped.
    pub destroyed: bool,
}

impl BindingRecord {
    pub fn new(kind: BindingKind, target: ObjectId, index: PropertyIndex) -> Self {
        Self {
            kind,
            target,
            index,
            state: BindingState::default(),
            ref_count: 1,
            next: None,
            dependencies: Vec::new(),
            error: None,
            loop_detected: false,
            rolling_back: false,
            destroyed: false,
        }
    }
}

/// Read-only view handed out by [`crate::Engine::binding`].
#[derive(Clone, Debug, PartialEq)]
pub struct BindingInfo {
    pub kind: BindingKind,
    pub target: ObjectId,
    pub index: PropertyIndex,
    pub state: BindingState,
    pub ref_count: u32,
}
