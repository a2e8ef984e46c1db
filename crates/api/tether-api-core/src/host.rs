//! The property host: the seam between bindings/animations and whatever owns the
//! property storage.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use crate::ids::{ObjectId, PropertyIndex};
use crate::value::Value;

bitflags! {
    /// Flags attached to a property write.
    #[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct WriteFlags: u32 {
        /// Destroy any binding currently attached at the written index.
        const REMOVE_BINDING = 1;
        /// Skip value interceptors (behaviors) installed on the property.
        const BYPASS_INTERCEPTORS = 1 << 1;
        /// Store the value without raising a change notification.
        const DONT_NOTIFY = 1 << 2;
    }
}

/// A write that an interceptor captured instead of storing.
#[derive(Clone, Debug, PartialEq)]
pub struct InterceptedWrite {
    pub object: ObjectId,
    pub index: PropertyIndex,
    pub value: Value,
}

/// Property storage as seen by the binding engine and the animation drivers.
pub trait PropertyHost {
    /// Current value of a property. Unknown properties read as `Undefined`.
    fn read(&self, object: ObjectId, index: PropertyIndex) -> Value;

    /// Store `value`. Returns `false` when the object or property does not exist.
    fn write(&mut self, object: ObjectId, index: PropertyIndex, value: Value, flags: WriteFlags) -> bool;

    /// Human-readable name used in diagnostics, e.g. `"width"` or `"font.pixelSize"`.
    fn display_name(&self, object: ObjectId, index: PropertyIndex) -> String {
        match index.value_type {
            Some(member) => format!("{}#{}.{}", object, index.core, member),
            None => format!("{}#{}", object, index.core),
        }
    }

    /// Drain writes captured by interceptors since the last call.
    fn take_intercepted(&mut self) -> Vec<InterceptedWrite> {
        Vec::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Single(Value);

    impl PropertyHost for Single {
        fn read(&self, _object: ObjectId, _index: PropertyIndex) -> Value {
            self.0.clone()
        }

        fn write(&mut self, _object: ObjectId, _index: PropertyIndex, value: Value, _flags: WriteFlags) -> bool {
            self.0 = value;
            true
        }
    }

    #[test]
    fn default_methods() {
        let mut host = Single(Value::Null);
        assert!(host.write(ObjectId(1), PropertyIndex::new(2), Value::from(3), WriteFlags::empty()));
        assert_eq!(host.read(ObjectId(1), PropertyIndex::new(2)), Value::Number(3.0));
        assert_eq!(
            host.display_name(ObjectId(1), PropertyIndex::member(2, 0)),
            "object#1#2.0"
        );
        assert!(host.take_intercepted().is_empty());
    }
}
