//! In-memory property host that records every write.

use std::collections::HashMap;

use tether_api_core::{ObjectId, PropertyHost, PropertyIndex, Value, WriteFlags};

#[derive(Clone, Debug, PartialEq)]
pub struct RecordedWrite {
    pub object: ObjectId,
    pub index: PropertyIndex,
    pub value: Value,
    pub flags: WriteFlags,
}

#[derive(Debug, Default)]
pub struct RecordingHost {
    values: HashMap<(ObjectId, PropertyIndex), Value>,
    pub writes: Vec<RecordedWrite>,
}

impl RecordingHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a value without recording a write.
    pub fn with(mut self, object: ObjectId, index: PropertyIndex, value: impl Into<Value>) -> Self {
        self.values.insert((object, index), value.into());
        self
    }

    pub fn number(&self, object: ObjectId, index: PropertyIndex) -> Option<f64> {
        self.values.get(&(object, index)).and_then(Value::as_number)
    }

    /// Writes made to one property, oldest first.
    pub fn writes_to(&self, object: ObjectId, index: PropertyIndex) -> Vec<&RecordedWrite> {
        self.writes
            .iter()
            .filter(|w| w.object == object && w.index == index)
            .collect()
    }

    pub fn clear_writes(&mut self) {
        self.writes.clear();
    }
}

impl PropertyHost for RecordingHost {
    fn read(&self, object: ObjectId, index: PropertyIndex) -> Value {
        self.values.get(&(object, index)).cloned().unwrap_or_default()
    }

    fn write(&mut self, object: ObjectId, index: PropertyIndex, value: Value, flags: WriteFlags) -> bool {
        self.writes.push(RecordedWrite {
            object,
            index,
            value: value.clone(),
            flags,
        });
        self.values.insert((object, index), value);
        true
    }
}
