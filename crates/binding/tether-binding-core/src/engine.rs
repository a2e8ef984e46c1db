#![allow(dead_code)]
//! The binding engine: objects, binding lists, dependency tracking and writes.

use hashbrown::{HashMap, HashSet};
use serde::{Deserialize, Serialize};

use tether_api_core::{InterceptedWrite, ObjectId, PropertyHost, PropertyIndex, Value, WriteFlags};
use tether_script_core::{CompiledFunction, EvalError, Interpreter, ScriptCompiler};

use crate::arena::Arena;
use crate::binding::{BindingInfo, BindingKind, BindingRecord};
use crate::config::Config;
use crate::diagnostics::{DelayedErrors, Diagnostic, DiagnosticKind};
use crate::error::BindingError;
use crate::ids::{BindingId, IdAllocator, ProgramId};
use crate::object::{ObjectData, ObjectStore, PropertyDecl};
use crate::program::Program;
use crate::scope::EvalScope;

/// Counters for the engine's lifetime.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineStats {
    /// Script bindings evaluated.
    pub evaluations: u64,
    pub loop_detections: u64,
    /// Bindings destroyed by a write carrying `REMOVE_BINDING`.
    pub bindings_removed_by_write: u64,
    /// Binding updates dispatched from property change notifications.
    pub notifications: u64,
}

pub struct Engine {
    pub(crate) cfg: Config,
    pub(crate) ids: IdAllocator,

    pub(crate) objects: ObjectStore,
    pub(crate) bindings: Arena<BindingRecord>,
    pub(crate) programs: HashMap<ProgramId, Program>,
    pub(crate) compiler: Box<dyn ScriptCompiler>,

    /// Bindings to re-evaluate when `(object, core index)` changes, in subscription order.
    pub(crate) subscriptions: HashMap<(ObjectId, u32), Vec<BindingId>>,
    pub(crate) interceptors: HashSet<(ObjectId, u32)>,

    // Outputs
    pub(crate) intercepted: Vec<InterceptedWrite>,
    pub(crate) diagnostics: Vec<Diagnostic>,
    pub(crate) delayed: DelayedErrors,
    pub(crate) stats: EngineStats,
}

impl Engine {
    pub fn new(cfg: Config) -> Self {
        Self::with_compiler(cfg, Box::new(Interpreter::new()))
    }

    /// Engine whose programs are compiled by `compiler` instead of the built-in interpreter.
    pub fn with_compiler(cfg: Config, compiler: Box<dyn ScriptCompiler>) -> Self {
        let delayed = DelayedErrors::new(cfg.delayed_error_capacity);
        Self {
            cfg,
            ids: IdAllocator::new(),
            objects: ObjectStore::default(),
            bindings: Arena::default(),
            programs: HashMap::new(),
            compiler,
            subscriptions: HashMap::new(),
            interceptors: HashSet::new(),
            intercepted: Vec::new(),
            diagnostics: Vec::new(),
            delayed,
            stats: EngineStats::default(),
        }
    }

    pub fn config(&self) -> &Config {
        &self.cfg
    }

    pub fn stats(&self) -> &EngineStats {
        &self.stats
    }

    /// Diagnostics reported immediately (loops, compile failures, overflowing errors).
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn take_diagnostics(&mut self) -> Vec<Diagnostic> {
        std::mem::take(&mut self.diagnostics)
    }

    pub fn pending_delayed_errors(&self) -> usize {
        self.delayed.len()
    }

    /// Drain evaluation errors queued since the last call.
    pub fn take_delayed_errors(&mut self) -> Vec<Diagnostic> {
        self.delayed.drain()
    }

    // ---------- objects ----------

    pub fn create_object(&mut self, name: impl Into<String>, decls: Vec<PropertyDecl>) -> ObjectId {
        let id = self.ids.alloc_object();
        self.objects.insert(id, ObjectData::new(name.into(), decls));
        id
    }

    /// Destroy every binding targeting `object`, then the object itself.
    pub fn destroy_object(&mut self, object: ObjectId) -> Result<(), BindingError> {
        if self.objects.get(object).is_none() {
            return Err(BindingError::UnknownObject(object));
        }
        for id in self.bindings_of(object) {
            self.destroy(id)?;
        }
        self.objects.remove(object);
        self.subscriptions.retain(|(o, _), _| *o != object);
        self.interceptors.retain(|(o, _)| *o != object);
        Ok(())
    }

    pub fn object_name(&self, object: ObjectId) -> Option<&str> {
        self.objects.get(object).map(|o| o.name.as_str())
    }

    /// Resolve `"width"` or `"font.pixelSize"` to a property index.
    pub fn property(&self, object: ObjectId, name: &str) -> Result<PropertyIndex, BindingError> {
        let obj = self.objects.get(object).ok_or(BindingError::UnknownObject(object))?;
        obj.find(name).ok_or_else(|| BindingError::UnknownProperty {
            object,
            name: name.to_string(),
        })
    }

    /// Read a property by name.
    pub fn value(&self, object: ObjectId, name: &str) -> Result<Value, BindingError> {
        let index = self.property(object, name)?;
        Ok(self.read(object, index))
    }

    /// Assign a property by name the way a script assignment does: any binding on
    /// the property is destroyed first.
    pub fn set_value(&mut self, object: ObjectId, name: &str, value: impl Into<Value>) -> Result<bool, BindingError> {
        let index = self.property(object, name)?;
        Ok(self.write(object, index, value.into(), WriteFlags::REMOVE_BINDING))
    }

    pub fn read(&self, object: ObjectId, index: PropertyIndex) -> Value {
        self.objects
            .get(object)
            .and_then(|o| o.read(index))
            .unwrap_or_default()
    }

    /// Write a property.
    ///
    /// Order: binding removal, interception, store, then change notification. Storing
    /// an equal value does not notify.
    pub fn write(&mut self, object: ObjectId, index: PropertyIndex, value: Value, flags: WriteFlags) -> bool {
        match self.objects.get(object) {
            Some(obj) if obj.slot(index).is_some() => {}
            _ => return false,
        }

        if flags.contains(WriteFlags::REMOVE_BINDING) {
            self.remove_bindings_at(object, index);
        }

        if !flags.contains(WriteFlags::BYPASS_INTERCEPTORS) && self.interceptors.contains(&(object, index.core)) {
            self.intercepted.push(InterceptedWrite { object, index, value });
            return true;
        }

        let changed = match self.objects.get_mut(object) {
            Some(obj) => obj.store(index, value),
            None => return false,
        };
        if changed && !flags.contains(WriteFlags::DONT_NOTIFY) {
            self.notify(object, index.core);
        }
        true
    }

    /// Capture writes to `(object, index.core)` instead of storing them.
    pub fn set_interceptor(&mut self, object: ObjectId, index: PropertyIndex) {
        self.interceptors.insert((object, index.core));
    }

    pub fn clear_interceptor(&mut self, object: ObjectId, index: PropertyIndex) {
        self.interceptors.remove(&(object, index.core));
    }

    // ---------- binding creation and inspection ----------

    /// A binding that copies `source` into `target` whenever `source` changes.
    pub fn create_property_binding(
        &mut self,
        source: (ObjectId, PropertyIndex),
        target: (ObjectId, PropertyIndex),
    ) -> Result<BindingId, BindingError> {
        self.check_property(source.0, source.1)?;
        self.check_property(target.0, target.1)?;
        let kind = BindingKind::PropertyToProperty {
            object: source.0,
            index: source.1,
        };
        Ok(self.bindings.insert(BindingRecord::new(kind, target.0, target.1)))
    }

    pub(crate) fn check_property(&self, object: ObjectId, index: PropertyIndex) -> Result<(), BindingError> {
        let obj = self.objects.get(object).ok_or(BindingError::UnknownObject(object))?;
        match obj.slot(index) {
            Some(_) => Ok(()),
            None => Err(BindingError::UnknownProperty {
                object,
                name: format!("#{}{}", index.core, index.value_type.map(|m| format!(".{m}")).unwrap_or_default()),
            }),
        }
    }

    pub fn binding(&self, id: BindingId) -> Option<BindingInfo> {
        self.bindings.get(id).map(|r| BindingInfo {
            kind: r.kind.clone(),
            target: r.target,
            index: r.index,
            state: r.state,
            ref_count: r.ref_count,
        })
    }

    /// Error stored by the binding's last failed evaluation.
    pub fn binding_error(&self, id: BindingId) -> Option<&Diagnostic> {
        self.bindings.get(id).and_then(|r| r.error.as_ref())
    }

    /// Number of binding records alive, proxies included.
    pub fn binding_count(&self) -> usize {
        self.bindings.len()
    }

    /// The object's binding list, newest first. Value-type proxies appear here; their
    /// members are listed by [`Engine::proxy_members`].
    pub fn bindings_of(&self, object: ObjectId) -> Vec<BindingId> {
        let head = self.objects.get(object).and_then(|o| o.binding_head);
        self.walk(head)
    }

    pub fn proxy_members(&self, proxy: BindingId) -> Vec<BindingId> {
        match self.bindings.get(proxy).map(|r| &r.kind) {
            Some(BindingKind::ValueTypeProxy { children }) => self.walk(*children),
            _ => Vec::new(),
        }
    }

    /// The live-binding bit for a core property index.
    pub fn has_binding(&self, object: ObjectId, core: u32) -> bool {
        self.objects
            .get(object)
            .and_then(|o| o.live.get(core as usize))
            .is_some_and(|n| *n > 0)
    }

    /// First binding attached at exactly `index`.
    pub fn binding_for(&self, object: ObjectId, index: PropertyIndex) -> Option<BindingId> {
        if index.is_value_type() {
            let proxy = self.find_proxy(object, index.core)?;
            return self
                .proxy_members(proxy)
                .into_iter()
                .find(|id| self.bindings.get(*id).is_some_and(|r| r.index == index));
        }
        self.bindings_of(object)
            .into_iter()
            .find(|id| self.bindings.get(*id).is_some_and(|r| !r.kind.is_proxy() && r.index == index))
    }

    fn walk(&self, mut cursor: Option<BindingId>) -> Vec<BindingId> {
        let mut out = Vec::new();
        while let Some(id) = cursor {
            out.push(id);
            cursor = self.bindings.get(id).and_then(|r| r.next);
        }
        out
    }

    fn find_proxy(&self, object: ObjectId, core: u32) -> Option<BindingId> {
        let mut cursor = self.objects.get(object)?.binding_head;
        while let Some(id) = cursor {
            let rec = self.bindings.get(id)?;
            if rec.kind.is_proxy() && rec.index.core == core {
                return Some(id);
            }
            cursor = rec.next;
        }
        None
    }

    // ---------- attach / detach ----------

    pub fn add_to_object(&mut self, id: BindingId) -> Result<(), BindingError> {
        let rec = self.bindings.get(id).ok_or(BindingError::StaleBinding(id))?;
        if rec.state.added_to_object || rec.destroyed {
            return Err(BindingError::AlreadyAttached(id));
        }
        let (target, index) = (rec.target, rec.index);
        if self.objects.get(target).is_none() {
            return Err(BindingError::UnknownObject(target));
        }

        if index.is_value_type() {
            let proxy = match self.find_proxy(target, index.core) {
                Some(proxy) => proxy,
                None => {
                    let mut proxy = BindingRecord::new(
                        BindingKind::ValueTypeProxy { children: None },
                        target,
                        index.core_only(),
                    );
                    proxy.state.enabled = true;
                    let proxy = self.bindings.insert(proxy);
                    self.link_into_object(proxy);
                    proxy
                }
            };
            let head = match self.bindings.get(proxy).map(|r| &r.kind) {
                Some(BindingKind::ValueTypeProxy { children }) => *children,
                _ => None,
            };
            if let Some(rec) = self.bindings.get_mut(id) {
                rec.next = head;
            }
            if let Some(BindingKind::ValueTypeProxy { children }) = self.bindings.get_mut(proxy).map(|r| &mut r.kind) {
                *children = Some(id);
            }
            self.mark_attached(id);
        } else {
            self.link_into_object(id);
        }
        Ok(())
    }

    fn link_into_object(&mut self, id: BindingId) {
        let Some(target) = self.bindings.get(id).map(|r| r.target) else {
            return;
        };
        let head = self.objects.get(target).and_then(|o| o.binding_head);
        if let Some(rec) = self.bindings.get_mut(id) {
            rec.next = head;
        }
        if let Some(obj) = self.objects.get_mut(target) {
            obj.binding_head = Some(id);
        }
        self.mark_attached(id);
    }

    fn mark_attached(&mut self, id: BindingId) {
        let Some(rec) = self.bindings.get_mut(id) else {
            return;
        };
        rec.state.added_to_object = true;
        rec.ref_count += 1;
        let (target, core, proxy) = (rec.target, rec.index.core, rec.kind.is_proxy());
        if !proxy {
            if let Some(n) = self.objects.get_mut(target).and_then(|o| o.live.get_mut(core as usize)) {
                *n += 1;
            }
        }
    }

    /// Unlink from the object list (or the owning proxy). No-op when not attached.
    pub fn remove_from_object(&mut self, id: BindingId) -> Result<(), BindingError> {
        let rec = self.bindings.get(id).ok_or(BindingError::StaleBinding(id))?;
        if !rec.state.added_to_object {
            return Ok(());
        }
        let (target, index, proxy) = (rec.target, rec.index, rec.kind.is_proxy());

        if index.is_value_type() {
            if let Some(owner) = self.find_proxy(target, index.core) {
                let head = match self.bindings.get(owner).map(|r| &r.kind) {
                    Some(BindingKind::ValueTypeProxy { children }) => *children,
                    _ => None,
                };
                let head = self.unlink(head, id);
                if let Some(BindingKind::ValueTypeProxy { children }) =
                    self.bindings.get_mut(owner).map(|r| &mut r.kind)
                {
                    *children = head;
                }
            }
        } else {
            let head = self.objects.get(target).and_then(|o| o.binding_head);
            let head = self.unlink(head, id);
            if let Some(obj) = self.objects.get_mut(target) {
                obj.binding_head = head;
            }
        }

        if !proxy {
            if let Some(n) = self.objects.get_mut(target).and_then(|o| o.live.get_mut(index.core as usize)) {
                *n = n.saturating_sub(1);
            }
        }
        if let Some(rec) = self.bindings.get_mut(id) {
            rec.state.added_to_object = false;
            rec.next = None;
        }
        self.release(id);
        Ok(())
    }

    /// Remove `id` from the list starting at `head`; returns the new head.
    fn unlink(&mut self, head: Option<BindingId>, id: BindingId) -> Option<BindingId> {
        let next = self.bindings.get(id).and_then(|r| r.next);
        if head == Some(id) {
            return next;
        }
        let mut cursor = head;
        while let Some(current) = cursor {
            let Some(rec) = self.bindings.get_mut(current) else {
                break;
            };
            if rec.next == Some(id) {
                rec.next = next;
                break;
            }
            cursor = rec.next;
        }
        head
    }

    fn release(&mut self, id: BindingId) {
        let Some(rec) = self.bindings.get_mut(id) else {
            return;
        };
        rec.ref_count = rec.ref_count.saturating_sub(1);
        // Freed by the update that is still running on it.
        if rec.ref_count == 0 && !rec.state.updating {
            self.free(id);
        }
    }

    fn free(&mut self, id: BindingId) {
        self.set_dependencies(id, Vec::new());
        self.bindings.remove(id);
    }

    // ---------- lifecycle ----------

    /// Enabling a disabled binding evaluates it. Proxies forward to their members.
    pub fn set_enabled(&mut self, id: BindingId, enable: bool, flags: WriteFlags) -> Result<(), BindingError> {
        let rec = self.bindings.get_mut(id).ok_or(BindingError::StaleBinding(id))?;
        if rec.destroyed {
            return Ok(());
        }
        let was = std::mem::replace(&mut rec.state.enabled, enable);
        if let BindingKind::ValueTypeProxy { .. } = rec.kind {
            for child in self.proxy_members(id) {
                self.set_enabled(child, enable, flags)?;
            }
            return Ok(());
        }
        if enable && !was {
            self.update(id, flags)?;
        }
        Ok(())
    }

    /// Disable, detach, clear the stored error and drop the program reference.
    /// Safe to call while the binding is evaluating; the record is freed when that
    /// evaluation returns.
    pub fn destroy(&mut self, id: BindingId) -> Result<(), BindingError> {
        let rec = self.bindings.get_mut(id).ok_or(BindingError::StaleBinding(id))?;
        if rec.destroyed {
            return Ok(());
        }
        rec.destroyed = true;
        rec.state.enabled = false;
        rec.error = None;
        let kind = rec.kind.clone();

        if let BindingKind::ValueTypeProxy { .. } = kind {
            for child in self.proxy_members(id) {
                self.destroy(child)?;
            }
        }
        self.remove_from_object(id)?;
        if let BindingKind::Script { program, .. } = kind {
            if let Some(p) = self.programs.get_mut(&program) {
                p.ref_count = p.ref_count.saturating_sub(1);
            }
        }
        self.set_dependencies(id, Vec::new());
        self.release(id);
        Ok(())
    }

    // ---------- evaluation ----------

    /// Re-evaluate a binding and write the result to its target.
    ///
    /// Re-entering a binding that is already updating is a binding loop: it is
    /// reported once and the property keeps its plain value.
    pub fn update(&mut self, id: BindingId, flags: WriteFlags) -> Result<(), BindingError> {
        let rec = self.bindings.get_mut(id).ok_or(BindingError::StaleBinding(id))?;
        if rec.destroyed {
            return Ok(());
        }
        if rec.state.updating {
            if rec.rolling_back {
                return Ok(());
            }
            rec.loop_detected = true;
            self.report_loop(id);
            return Ok(());
        }

        match rec.kind.clone() {
            BindingKind::ValueTypeProxy { .. } => {
                for child in self.proxy_members(id) {
                    self.update(child, flags)?;
                }
                Ok(())
            }
            BindingKind::PropertyToProperty { object, index } => {
                let previous = self.begin_update(id);
                let value = self.read(object, index);
                self.set_dependencies(id, vec![(object, index.core)]);
                self.finish_update(id, Ok(value), previous, flags);
                Ok(())
            }
            BindingKind::Script { program, closure, scope } => {
                let Some(function) = self.closure_function(program, closure) else {
                    return Ok(());
                };
                let previous = self.begin_update(id);
                self.stats.evaluations += 1;
                let (result, dependencies) = self.invoke(function.as_ref(), scope, Some(program));
                self.set_dependencies(id, dependencies);
                self.finish_update(id, result, previous, flags);
                Ok(())
            }
        }
    }

    pub(crate) fn invoke(
        &mut self,
        function: &dyn CompiledFunction,
        scope: ObjectId,
        program: Option<ProgramId>,
    ) -> (Result<Value, EvalError>, Vec<(ObjectId, u32)>) {
        let this = Value::QObject(scope);
        let mut eval = EvalScope::new(self, scope, program);
        let result = function.invoke(&this, &[], &mut eval);
        (result, eval.into_dependencies())
    }

    /// Set the updating flag and capture the value a loop would roll back to.
    fn begin_update(&mut self, id: BindingId) -> Value {
        let Some(rec) = self.bindings.get_mut(id) else {
            return Value::Undefined;
        };
        rec.state.updating = true;
        rec.loop_detected = false;
        let (target, index) = (rec.target, rec.index);
        self.read(target, index)
    }

    fn finish_update(&mut self, id: BindingId, result: Result<Value, EvalError>, previous: Value, flags: WriteFlags) {
        let Some(rec) = self.bindings.get(id) else {
            return;
        };
        let (target, index) = (rec.target, rec.index);
        if !rec.destroyed {
            match result {
                Ok(value) => {
                    if let Some(rec) = self.bindings.get_mut(id) {
                        rec.error = None;
                    }
                    self.write(target, index, value, flags - WriteFlags::REMOVE_BINDING);
                }
                Err(err) => self.report_evaluation_error(id, &err),
            }
        }

        let Some(rec) = self.bindings.get_mut(id) else {
            return;
        };
        let looped = std::mem::take(&mut rec.loop_detected);
        if looped && !rec.destroyed && self.cfg.rollback_on_binding_loop {
            // Dependents saw the looped value, so the restore must notify them too.
            rec.rolling_back = true;
            let restore = (flags - WriteFlags::REMOVE_BINDING) | WriteFlags::BYPASS_INTERCEPTORS;
            self.write(target, index, previous, restore);
        }

        let Some(rec) = self.bindings.get_mut(id) else {
            return;
        };
        rec.state.updating = false;
        rec.rolling_back = false;
        if rec.ref_count == 0 {
            self.free(id);
        }
    }

    /// Replace the binding's subscriptions. Unchanged sets keep their position.
    pub(crate) fn set_dependencies(&mut self, id: BindingId, mut deps: Vec<(ObjectId, u32)>) {
        let mut seen = HashSet::new();
        deps.retain(|d| seen.insert(*d));
        let Some(rec) = self.bindings.get_mut(id) else {
            return;
        };
        if rec.destroyed {
            deps.clear();
        }
        if rec.dependencies == deps {
            return;
        }
        let old = std::mem::replace(&mut rec.dependencies, deps.clone());
        for key in old {
            if let Some(subs) = self.subscriptions.get_mut(&key) {
                subs.retain(|b| *b != id);
                if subs.is_empty() {
                    self.subscriptions.remove(&key);
                }
            }
        }
        for key in deps {
            self.subscriptions.entry(key).or_default().push(id);
        }
    }

    /// Update every enabled, attached subscriber of `(object, core)`.
    pub(crate) fn notify(&mut self, object: ObjectId, core: u32) {
        let Some(subs) = self.subscriptions.get(&(object, core)) else {
            return;
        };
        for id in subs.clone() {
            let live = self
                .bindings
                .get(id)
                .is_some_and(|r| r.state.enabled && r.state.added_to_object && !r.destroyed);
            if !live {
                continue;
            }
            self.stats.notifications += 1;
            if let Err(err) = self.update(id, WriteFlags::empty()) {
                log::debug!("notify {object}#{core}: {err}");
            }
        }
    }

    fn remove_bindings_at(&mut self, object: ObjectId, index: PropertyIndex) {
        let mut doomed = Vec::new();
        for id in self.bindings_of(object) {
            let Some(rec) = self.bindings.get(id) else {
                continue;
            };
            if rec.index.core != index.core {
                continue;
            }
            if rec.kind.is_proxy() {
                for child in self.proxy_members(id) {
                    let matches = index.value_type.is_none() || self.bindings.get(child).is_some_and(|c| c.index == index);
                    if matches {
                        doomed.push(child);
                    }
                }
            } else if rec.index == index || index.value_type.is_none() {
                doomed.push(id);
            }
        }
        for id in doomed {
            if self.destroy(id).is_ok() {
                self.stats.bindings_removed_by_write += 1;
            }
        }
    }

    // ---------- diagnostics ----------

    fn location(&self, id: BindingId) -> (String, u32) {
        let script = self.bindings.get(id).and_then(|r| match r.kind {
            BindingKind::Script { program, closure, .. } => {
                let p = self.programs.get(&program)?;
                Some((p.url.clone(), p.closure_line(closure)))
            }
            _ => None,
        });
        script.unwrap_or_else(|| (self.cfg.document_url.clone(), 0))
    }

    fn report_loop(&mut self, id: BindingId) {
        let Some(rec) = self.bindings.get(id) else {
            return;
        };
        let (target, index) = (rec.target, rec.index);
        let name = self.display_name_of(target, index);
        let (url, line) = self.location(id);
        let diag = Diagnostic {
            kind: DiagnosticKind::BindingLoop,
            message: format!("Binding loop detected for property \"{name}\""),
            url,
            line,
            column: None,
            immediate: true,
        };
        log::warn!("{diag}");
        self.stats.loop_detections += 1;
        self.diagnostics.push(diag);
    }

    fn report_evaluation_error(&mut self, id: BindingId, err: &EvalError) {
        let (url, line) = self.location(id);
        let diag = Diagnostic {
            kind: DiagnosticKind::Evaluation,
            message: err.to_string(),
            url,
            line,
            column: None,
            immediate: false,
        };
        if let Some(rec) = self.bindings.get_mut(id) {
            rec.error = Some(diag.clone());
        }
        if let Err(mut diag) = self.delayed.push(diag) {
            diag.immediate = true;
            log::warn!("{diag}");
            self.diagnostics.push(diag);
        }
    }

    pub(crate) fn report_compile_error(&mut self, diag: Diagnostic) {
        log::warn!("{diag}");
        self.diagnostics.push(diag);
    }

    fn display_name_of(&self, object: ObjectId, index: PropertyIndex) -> String {
        self.objects
            .get(object)
            .and_then(|o| o.display_name(index))
            .unwrap_or_else(|| object.to_string())
    }
}

impl PropertyHost for Engine {
    fn read(&self, object: ObjectId, index: PropertyIndex) -> Value {
        Engine::read(self, object, index)
    }

    fn write(&mut self, object: ObjectId, index: PropertyIndex, value: Value, flags: WriteFlags) -> bool {
        Engine::write(self, object, index, value, flags)
    }

    fn display_name(&self, object: ObjectId, index: PropertyIndex) -> String {
        self.display_name_of(object, index)
    }

    fn take_intercepted(&mut self) -> Vec<InterceptedWrite> {
        std::mem::take(&mut self.intercepted)
    }
}
