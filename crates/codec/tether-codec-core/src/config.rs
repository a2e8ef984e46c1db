use serde::{Deserialize, Serialize};

/// Largest value that fits in the 24-bit size field of a header.
pub const MAX_SIZE: u32 = 0x00FF_FFFF;

/// Codec limits. Values that exceed a limit encode as `Undefined`.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Limits {
    /// Cap on string length, element count and property count. Never above [`MAX_SIZE`].
    pub max_size: u32,
    /// Nesting depth past which arrays and objects are not descended into.
    pub max_depth: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_size: MAX_SIZE,
            max_depth: 512,
        }
    }
}

impl Limits {
    pub(crate) fn size_cap(&self) -> u32 {
        self.max_size.min(MAX_SIZE)
    }
}
