//! JSON documents: objects, their properties and the bindings between them.

use hashbrown::HashMap;
use serde::{Deserialize, Serialize};

use tether_api_core::{ObjectId, Value, WriteFlags};

use crate::engine::Engine;
use crate::error::BindingError;
use crate::ids::{BindingId, ProgramId};
use crate::object::PropertyDecl;
use crate::program::ClosureSource;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DocumentSpec {
    pub url: String,
    #[serde(default)]
    pub objects: Vec<ObjectSpec>,
    #[serde(default)]
    pub bindings: Vec<BindingSpec>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ObjectSpec {
    /// Document id; also visible to scripts as a context id.
    pub id: String,
    #[serde(default)]
    pub properties: Vec<PropertySpec>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PropertySpec {
    pub name: String,
    #[serde(default)]
    pub value: Option<serde_json::Value>,
    /// Present for value-type properties.
    #[serde(default)]
    pub members: Option<Vec<MemberSpec>>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MemberSpec {
    pub name: String,
    #[serde(default)]
    pub value: Option<serde_json::Value>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BindingSpec {
    /// Document id of the target object.
    pub target: String,
    /// `"width"` or `"font.pixelSize"`.
    pub property: String,
    pub source: String,
    #[serde(default = "first")]
    pub line: u32,
    #[serde(default = "first")]
    pub column: u32,
    /// Scope object; defaults to the target.
    #[serde(default)]
    pub scope: Option<String>,
}

fn first() -> u32 {
    1
}

/// What [`Engine::load_document`] created.
#[derive(Clone, Debug)]
pub struct LoadedDocument {
    pub program: ProgramId,
    pub objects: HashMap<String, ObjectId>,
    /// In document order.
    pub bindings: Vec<BindingId>,
}

impl LoadedDocument {
    pub fn object(&self, id: &str) -> Option<ObjectId> {
        self.objects.get(id).copied()
    }
}

pub fn json_to_value(json: &serde_json::Value) -> Value {
    match json {
        serde_json::Value::Null => Value::Null,
        serde_json::Value::Bool(b) => Value::Bool(*b),
        serde_json::Value::Number(n) => Value::Number(n.as_f64().unwrap_or(f64::NAN)),
        serde_json::Value::String(s) => Value::String(s.clone()),
        serde_json::Value::Array(items) => Value::Array(items.iter().map(json_to_value).collect()),
        serde_json::Value::Object(map) => Value::Object(map.iter().map(|(k, v)| (k.clone(), json_to_value(v))).collect()),
    }
}

fn initial(json: &Option<serde_json::Value>) -> Value {
    json.as_ref().map(json_to_value).unwrap_or_default()
}

impl PropertySpec {
    fn to_decl(&self) -> PropertyDecl {
        match &self.members {
            Some(members) => PropertyDecl::value_type(
                self.name.clone(),
                members.iter().map(|m| (m.name.clone(), initial(&m.value))),
            ),
            None => PropertyDecl::plain(self.name.clone(), initial(&self.value)),
        }
    }
}

impl Engine {
    pub fn load_document_json(&mut self, json: &str) -> Result<LoadedDocument, BindingError> {
        let spec: DocumentSpec = serde_json::from_str(json).map_err(|e| BindingError::Document(e.to_string()))?;
        self.load_document(&spec)
    }

    /// Create the document's objects and program, attach every binding, then enable
    /// them in document order.
    pub fn load_document(&mut self, spec: &DocumentSpec) -> Result<LoadedDocument, BindingError> {
        let mut objects = HashMap::new();
        for object in &spec.objects {
            let decls = object.properties.iter().map(PropertySpec::to_decl).collect();
            let id = self.create_object(object.id.clone(), decls);
            objects.insert(object.id.clone(), id);
        }

        let closures = spec
            .bindings
            .iter()
            .map(|b| ClosureSource::new(b.source.clone(), b.line, b.column))
            .collect();
        let program = self.create_program(spec.url.clone(), closures);
        if let Some(p) = self.programs.get_mut(&program) {
            p.context.extend(objects.iter().map(|(k, v)| (k.clone(), *v)));
        }

        let lookup = |name: &str| {
            objects
                .get(name)
                .copied()
                .ok_or_else(|| BindingError::UnknownDocumentObject(name.to_string()))
        };
        let mut bindings = Vec::with_capacity(spec.bindings.len());
        for (closure, b) in spec.bindings.iter().enumerate() {
            let target = lookup(&b.target)?;
            let scope = match &b.scope {
                Some(scope) => lookup(scope)?,
                None => target,
            };
            let index = self.property(target, &b.property)?;
            let id = self.config_binding(program, closure, target, index, scope)?;
            self.add_to_object(id)?;
            bindings.push(id);
        }
        for id in &bindings {
            self.set_enabled(*id, true, WriteFlags::empty())?;
        }
        log::debug!("loaded {}: {} objects, {} bindings", spec.url, objects.len(), bindings.len());

        Ok(LoadedDocument {
            program,
            objects,
            bindings,
        })
    }
}
