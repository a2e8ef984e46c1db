//! Objects and their declared properties.
//!
//! Each object also carries the per-object binding data: the head of its binding
//! list and one live-binding counter per core property index.

use serde::{Deserialize, Serialize};

use tether_api_core::{ObjectId, PropertyIndex, Value};

use crate::ids::BindingId;

/// Declaration of one property on an object.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PropertyDecl {
    Plain {
        name: String,
        #[serde(default)]
        initial: Value,
    },
    /// A composite whose members can each carry their own binding.
    ValueType {
        name: String,
        members: Vec<(String, Value)>,
    },
}

impl PropertyDecl {
    pub fn plain(name: impl Into<String>, initial: impl Into<Value>) -> Self {
        PropertyDecl::Plain {
            name: name.into(),
            initial: initial.into(),
        }
    }

    pub fn value_type<K: Into<String>>(
        name: impl Into<String>,
        members: impl IntoIterator<Item = (K, Value)>,
    ) -> Self {
        PropertyDecl::ValueType {
            name: name.into(),
            members: members.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            PropertyDecl::Plain { name, .. } | PropertyDecl::ValueType { name, .. } => name,
        }
    }
}

#[derive(Debug)]
pub(crate) struct PropertySlot {
    pub name: String,
    pub value: Value,
    /// Member names of a value-type property, in declaration order.
    pub members: Option<Vec<String>>,
}

impl PropertySlot {
    fn from_decl(decl: PropertyDecl) -> Self {
        match decl {
            PropertyDecl::Plain { name, initial } => Self {
                name,
                value: initial,
                members: None,
            },
            PropertyDecl::ValueType { name, members } => Self {
                name,
                members: Some(members.iter().map(|(k, _)| k.clone()).collect()),
                value: Value::Object(members),
            },
        }
    }

    pub fn member_name(&self, member: u32) -> Option<&str> {
        self.members
            .as_ref()
            .and_then(|m| m.get(member as usize))
            .map(String::as_str)
    }
}

#[derive(Debug)]
pub(crate) struct ObjectData {
    pub name: String,
    pub properties: Vec<PropertySlot>,
    pub binding_head: Option<BindingId>,
    /// Number of bindings attached per core index. Non-zero means "has a binding".
    pub live: Vec<u32>,
}

impl ObjectData {
    pub fn new(name: String, decls: Vec<PropertyDecl>) -> Self {
        let properties: Vec<PropertySlot> = decls.into_iter().map(PropertySlot::from_decl).collect();
        let live = vec![0; properties.len()];
        Self {
            name,
            properties,
            binding_head: None,
            live,
        }
    }

    pub fn slot(&self, index: PropertyIndex) -> Option<&PropertySlot> {
        let slot = self.properties.get(index.core as usize)?;
        match index.value_type {
            Some(member) => slot.member_name(member).map(|_| slot),
            None => Some(slot),
        }
    }

    pub fn find(&self, name: &str) -> Option<PropertyIndex> {
        if let Some(i) = self.properties.iter().position(|p| p.name == name) {
            return Some(PropertyIndex::new(i as u32));
        }
        let (core, member) = name.split_once('.')?;
        let i = self.properties.iter().position(|p| p.name == core)?;
        let m = self.properties[i]
            .members
            .as_ref()?
            .iter()
            .position(|n| n == member)?;
        Some(PropertyIndex::member(i as u32, m as u32))
    }

    pub fn read(&self, index: PropertyIndex) -> Option<Value> {
        let slot = self.slot(index)?;
        match index.value_type {
            Some(member) => {
                let key = slot.member_name(member)?;
                Some(slot.value.get(key).cloned().unwrap_or_default())
            }
            None => Some(slot.value.clone()),
        }
    }

    /// Store a value and report whether it changed.
    pub fn store(&mut self, index: PropertyIndex, value: Value) -> bool {
        let Some(slot) = self.properties.get_mut(index.core as usize) else {
            return false;
        };
        match index.value_type {
            Some(member) => {
                let Some(key) = slot.member_name(member).map(str::to_string) else {
                    return false;
                };
                if slot.value.get(&key) == Some(&value) {
                    return false;
                }
                if !matches!(slot.value, Value::Object(_)) {
                    slot.value = Value::Object(Vec::new());
                }
                slot.value.set(&key, value);
                true
            }
            None => {
                if slot.value == value {
                    return false;
                }
                slot.value = value;
                true
            }
        }
    }

    pub fn display_name(&self, index: PropertyIndex) -> Option<String> {
        let slot = self.properties.get(index.core as usize)?;
        match index.value_type {
            Some(member) => Some(format!("{}.{}", slot.name, slot.member_name(member)?)),
            None => Some(slot.name.clone()),
        }
    }
}

/// Dense object storage indexed by [`ObjectId`].
#[derive(Debug, Default)]
pub(crate) struct ObjectStore {
    slots: Vec<Option<ObjectData>>,
}

impl ObjectStore {
    pub fn insert(&mut self, id: ObjectId, data: ObjectData) {
        let i = id.0 as usize;
        if self.slots.len() <= i {
            self.slots.resize_with(i + 1, || None);
        }
        self.slots[i] = Some(data);
    }

    pub fn get(&self, id: ObjectId) -> Option<&ObjectData> {
        self.slots.get(id.0 as usize).and_then(Option::as_ref)
    }

    pub fn get_mut(&mut self, id: ObjectId) -> Option<&mut ObjectData> {
        self.slots.get_mut(id.0 as usize).and_then(Option::as_mut)
    }

    pub fn remove(&mut self, id: ObjectId) -> Option<ObjectData> {
        self.slots.get_mut(id.0 as usize).and_then(Option::take)
    }
}
