//! Object and property addressing.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque handle to an object owned by the property system.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct ObjectId(pub u32);

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "object#{}", self.0)
    }
}

/// Identifies a property slot: a core index plus an optional member index for
/// properties that live inside a composite value type (`anchors.margins`, `rect.x`).
///
/// The member index is only meaningful when the core index names a value-type property.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct PropertyIndex {
    pub core: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value_type: Option<u32>,
}

impl PropertyIndex {
    #[inline]
    pub const fn new(core: u32) -> Self {
        Self {
            core,
            value_type: None,
        }
    }

    #[inline]
    pub const fn member(core: u32, member: u32) -> Self {
        Self {
            core,
            value_type: Some(member),
        }
    }

    #[inline]
    pub fn is_value_type(&self) -> bool {
        self.value_type.is_some()
    }

    /// The same property with the member index stripped.
    #[inline]
    pub fn core_only(&self) -> Self {
        Self::new(self.core)
    }
}

impl From<u32> for PropertyIndex {
    fn from(core: u32) -> Self {
        Self::new(core)
    }
}
