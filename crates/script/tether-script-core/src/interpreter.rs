//! Tree-walking interpreter behind [`ScriptCompiler`].
//!
//! Locals live in frames owned by one invocation. Identifiers that are not local are
//! resolved through the caller's [`ScopeAccess`], which is how bindings see object
//! properties. Composite values have value semantics: `a.b = 1` rebuilds `a` and writes
//! it back.

use std::cmp::Ordering;
use std::sync::Arc;

use hashbrown::HashMap;
use tether_api_core::coercion::{
    loose_equals, number_to_string, strict_equals, to_boolean, to_display_string, to_number, type_of,
};
use tether_api_core::Value;

use crate::ast::*;
use crate::error::{CompileError, EvalError};
use crate::function::{CompiledFunction, ScopeAccess, ScriptCompiler};
use crate::parser::parse_statement;

const DEFAULT_MAX_CALL_DEPTH: usize = 64;

#[derive(Clone, Debug)]
pub struct Interpreter {
    max_call_depth: usize,
}

impl Default for Interpreter {
    fn default() -> Self {
        Self {
            max_call_depth: DEFAULT_MAX_CALL_DEPTH,
        }
    }
}

impl Interpreter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_call_depth(max_call_depth: usize) -> Self {
        Self { max_call_depth }
    }
}

impl ScriptCompiler for Interpreter {
    fn compile(&self, source: &str) -> Result<Arc<dyn CompiledFunction>, CompileError> {
        let stmt = parse_statement(source)?;
        match stmt.kind {
            StmtKind::Expr(Expr {
                kind: ExprKind::Function(def),
                ..
            }) => {
                let name = def.name.clone().unwrap_or_else(|| "anonymous".to_string());
                log::trace!("compiled {name}({} params)", def.params.len());
                Ok(Arc::new(ScriptFunction {
                    name,
                    def,
                    max_call_depth: self.max_call_depth,
                }))
            }
            _ => Err(CompileError::NotAFunction),
        }
    }
}

/// A compiled function literal.
#[derive(Debug)]
pub struct ScriptFunction {
    name: String,
    def: Arc<FunctionDef>,
    max_call_depth: usize,
}

impl ScriptFunction {
    pub fn params(&self) -> &[String] {
        &self.def.params
    }
}

impl CompiledFunction for ScriptFunction {
    fn name(&self) -> &str {
        &self.name
    }

    fn invoke(&self, this: &Value, args: &[Value], scope: &mut dyn ScopeAccess) -> Result<Value, EvalError> {
        let mut exec = Exec {
            scope,
            this: this.clone(),
            frames: Vec::new(),
            fn_frame: 0,
            depth: 0,
            max_depth: self.max_call_depth,
        };
        exec.call(&self.def, args)
    }
}

type EvalResult<T> = Result<T, EvalError>;

enum Flow {
    Normal,
    Break,
    Continue,
    Return(Value),
}

#[derive(Default)]
struct Frame {
    vars: HashMap<String, Value>,
    functions: HashMap<String, Arc<FunctionDef>>,
}

struct Exec<'s> {
    scope: &'s mut dyn ScopeAccess,
    this: Value,
    frames: Vec<Frame>,
    /// Frame receiving `var` and function declarations.
    fn_frame: usize,
    depth: usize,
    max_depth: usize,
}

fn type_error(message: impl Into<String>) -> EvalError {
    EvalError::Type {
        message: message.into(),
    }
}

fn is_place(expr: &Expr) -> bool {
    matches!(
        expr.kind,
        ExprKind::Ident(_) | ExprKind::Member { .. } | ExprKind::Index { .. }
    )
}

impl Exec<'_> {
    fn call(&mut self, def: &FunctionDef, args: &[Value]) -> EvalResult<Value> {
        if self.depth >= self.max_depth {
            return Err(EvalError::CallDepth {
                depth: self.max_depth,
            });
        }
        self.depth += 1;
        let saved_fn_frame = self.fn_frame;
        let mut frame = Frame::default();
        for (i, param) in def.params.iter().enumerate() {
            frame
                .vars
                .insert(param.clone(), args.get(i).cloned().unwrap_or_default());
        }
        self.frames.push(frame);
        let frame_count = self.frames.len();
        self.fn_frame = frame_count - 1;
        for stmt in &def.body {
            if let StmtKind::Function(inner) = &stmt.kind {
                self.declare_function(inner);
            }
        }
        let result = self.block_body(&def.body);
        self.frames.truncate(frame_count - 1);
        self.fn_frame = saved_fn_frame;
        self.depth -= 1;
        match result? {
            Flow::Return(value) => Ok(value),
            _ => Ok(Value::Undefined),
        }
    }

    fn scoped<T>(&mut self, f: impl FnOnce(&mut Self) -> EvalResult<T>) -> EvalResult<T> {
        self.frames.push(Frame::default());
        let result = f(self);
        self.frames.pop();
        result
    }

    fn declare_function(&mut self, def: &Arc<FunctionDef>) {
        if let Some(name) = &def.name {
            let frame = &mut self.frames[self.fn_frame];
            frame.functions.insert(name.clone(), def.clone());
            frame
                .vars
                .insert(name.clone(), Value::Function { name: name.clone() });
        }
    }

    fn lookup_local(&self, name: &str) -> Option<&Value> {
        self.frames.iter().rev().find_map(|f| f.vars.get(name))
    }

    fn find_function(&self, name: &str) -> Option<Arc<FunctionDef>> {
        self.frames
            .iter()
            .rev()
            .find_map(|f| f.functions.get(name).cloned())
    }

    fn read_name(&mut self, name: &str) -> EvalResult<Value> {
        if let Some(v) = self.lookup_local(name) {
            return Ok(v.clone());
        }
        match name {
            "undefined" => return Ok(Value::Undefined),
            "NaN" => return Ok(Value::Number(f64::NAN)),
            "Infinity" => return Ok(Value::Number(f64::INFINITY)),
            _ => {}
        }
        match self.scope.lookup(name) {
            Some(Value::Getter(getter)) => getter.read().map_err(|m| EvalError::Thrown(Value::String(m))),
            Some(v) => Ok(v),
            None => Err(EvalError::Reference {
                name: name.to_string(),
            }),
        }
    }

    fn write_name(&mut self, name: &str, value: Value) -> EvalResult<()> {
        if let Some(slot) = self.frames.iter_mut().rev().find_map(|f| f.vars.get_mut(name)) {
            *slot = value;
            return Ok(());
        }
        if self.scope.assign(name, value) {
            Ok(())
        } else {
            Err(EvalError::Reference {
                name: name.to_string(),
            })
        }
    }

    fn declare(&mut self, kind: DeclKind, decls: &[Declarator]) -> EvalResult<()> {
        for decl in decls {
            let value = match &decl.init {
                Some(init) => {
                    if let ExprKind::Function(def) = &init.kind {
                        self.frames[self.fn_frame]
                            .functions
                            .insert(decl.name.clone(), def.clone());
                    }
                    self.eval(init)?
                }
                None => Value::Undefined,
            };
            let target = match kind {
                DeclKind::Var => self.fn_frame,
                DeclKind::Let | DeclKind::Const => self.frames.len() - 1,
            };
            self.frames[target].vars.insert(decl.name.clone(), value);
        }
        Ok(())
    }

    fn block_body(&mut self, body: &[Stmt]) -> EvalResult<Flow> {
        for stmt in body {
            match self.exec(stmt)? {
                Flow::Normal => {}
                other => return Ok(other),
            }
        }
        Ok(Flow::Normal)
    }

    /// Run one loop iteration body. `None` means keep looping.
    fn loop_body(&mut self, body: &Stmt) -> EvalResult<Option<Flow>> {
        match self.exec(body)? {
            Flow::Break => Ok(Some(Flow::Normal)),
            Flow::Return(v) => Ok(Some(Flow::Return(v))),
            Flow::Normal | Flow::Continue => Ok(None),
        }
    }

    fn exec(&mut self, stmt: &Stmt) -> EvalResult<Flow> {
        match &stmt.kind {
            StmtKind::Empty => Ok(Flow::Normal),
            StmtKind::Expr(expr) => {
                self.eval(expr)?;
                Ok(Flow::Normal)
            }
            StmtKind::Block(body) => self.scoped(|ex| ex.block_body(body)),
            StmtKind::Var(kind, decls) => {
                self.declare(*kind, decls)?;
                Ok(Flow::Normal)
            }
            StmtKind::Function(def) => {
                self.declare_function(def);
                Ok(Flow::Normal)
            }
            StmtKind::If {
                test,
                consequent,
                alternate,
            } => {
                if to_boolean(&self.eval(test)?) {
                    self.exec(consequent)
                } else if let Some(alt) = alternate {
                    self.exec(alt)
                } else {
                    Ok(Flow::Normal)
                }
            }
            StmtKind::For {
                init,
                test,
                update,
                body,
            } => self.scoped(|ex| {
                match init {
                    Some(ForInit::Decl(kind, decls)) => ex.declare(*kind, decls)?,
                    Some(ForInit::Expr(expr)) => {
                        ex.eval(expr)?;
                    }
                    None => {}
                }
                loop {
                    if let Some(test) = test {
                        if !to_boolean(&ex.eval(test)?) {
                            return Ok(Flow::Normal);
                        }
                    }
                    if let Some(flow) = ex.loop_body(body)? {
                        return Ok(flow);
                    }
                    if let Some(update) = update {
                        ex.eval(update)?;
                    }
                }
            }),
            StmtKind::ForIn {
                decl,
                name,
                object,
                body,
                of,
            } => {
                let subject = self.eval(object)?;
                let items = if *of {
                    iterate_values(&subject)?
                } else {
                    iterate_keys(&subject)
                };
                self.scoped(|ex| {
                    for item in items {
                        if decl.is_some() {
                            if let Some(frame) = ex.frames.last_mut() {
                                frame.vars.insert(name.clone(), item);
                            }
                        } else {
                            ex.write_name(name, item)?;
                        }
                        if let Some(flow) = ex.loop_body(body)? {
                            return Ok(flow);
                        }
                    }
                    Ok(Flow::Normal)
                })
            }
            StmtKind::While { test, body } => {
                while to_boolean(&self.eval(test)?) {
                    if let Some(flow) = self.loop_body(body)? {
                        return Ok(flow);
                    }
                }
                Ok(Flow::Normal)
            }
            StmtKind::DoWhile { body, test } => loop {
                if let Some(flow) = self.loop_body(body)? {
                    return Ok(flow);
                }
                if !to_boolean(&self.eval(test)?) {
                    return Ok(Flow::Normal);
                }
            },
            StmtKind::Switch {
                discriminant,
                cases,
            } => {
                let value = self.eval(discriminant)?;
                let mut start = None;
                for (i, case) in cases.iter().enumerate() {
                    if let Some(test) = &case.test {
                        if strict_equals(&value, &self.eval(test)?) {
                            start = Some(i);
                            break;
                        }
                    }
                }
                let Some(start) = start.or_else(|| cases.iter().position(|c| c.test.is_none())) else {
                    return Ok(Flow::Normal);
                };
                self.scoped(|ex| {
                    for case in &cases[start..] {
                        match ex.block_body(&case.body)? {
                            Flow::Normal => {}
                            Flow::Break => return Ok(Flow::Normal),
                            other => return Ok(other),
                        }
                    }
                    Ok(Flow::Normal)
                })
            }
            StmtKind::Break => Ok(Flow::Break),
            StmtKind::Continue => Ok(Flow::Continue),
            StmtKind::Return(value) => Ok(Flow::Return(match value {
                Some(expr) => self.eval(expr)?,
                None => Value::Undefined,
            })),
            StmtKind::Throw(expr) => Err(EvalError::Thrown(self.eval(expr)?)),
        }
    }

    fn is_math(&self, expr: &Expr) -> bool {
        matches!(&expr.kind, ExprKind::Ident(n) if n == "Math") && self.lookup_local("Math").is_none()
    }

    fn eval(&mut self, expr: &Expr) -> EvalResult<Value> {
        Ok(match &expr.kind {
            ExprKind::Number(n) => Value::Number(*n),
            ExprKind::String(s) => Value::String(s.clone()),
            ExprKind::Bool(b) => Value::Bool(*b),
            ExprKind::Null => Value::Null,
            ExprKind::Ident(name) => self.read_name(name)?,
            ExprKind::This => self.this.clone(),
            ExprKind::Array(items) => Value::Array(
                items
                    .iter()
                    .map(|e| self.eval(e))
                    .collect::<EvalResult<Vec<_>>>()?,
            ),
            ExprKind::Object(props) => Value::Object(
                props
                    .iter()
                    .map(|(k, e)| Ok((k.clone(), self.eval(e)?)))
                    .collect::<EvalResult<Vec<_>>>()?,
            ),
            ExprKind::Function(def) => {
                self.declare_function(def);
                Value::Function {
                    name: def.name.clone().unwrap_or_else(|| "anonymous".to_string()),
                }
            }
            ExprKind::Member { object, property } => {
                if self.is_math(object) {
                    math_constant(property)
                        .ok_or_else(|| type_error(format!("Math.{property} is not a constant")))?
                } else {
                    let base = self.eval(object)?;
                    self.get_member(&base, property)?
                }
            }
            ExprKind::Index { object, index } => {
                let base = self.eval(object)?;
                let key = self.eval(index)?;
                self.get_index(&base, &key)?
            }
            ExprKind::Call { callee, args } => self.call_expr(callee, args)?,
            ExprKind::Unary { op, expr: inner } => match op {
                UnaryOp::TypeOf => {
                    let value = match &inner.kind {
                        ExprKind::Ident(name) => match self.read_name(name) {
                            Ok(v) => v,
                            Err(EvalError::Reference { .. }) => Value::Undefined,
                            Err(e) => return Err(e),
                        },
                        _ => self.eval(inner)?,
                    };
                    Value::String(type_of(&value).to_string())
                }
                UnaryOp::Not => Value::Bool(!to_boolean(&self.eval(inner)?)),
                UnaryOp::Minus => Value::Number(-to_number(&self.eval(inner)?)),
                UnaryOp::Plus => Value::Number(to_number(&self.eval(inner)?)),
                UnaryOp::Void => {
                    self.eval(inner)?;
                    Value::Undefined
                }
            },
            ExprKind::Update {
                delta,
                prefix,
                target,
            } => {
                let old = to_number(&self.eval(target)?);
                let new = old + delta;
                self.assign_to(target, Value::Number(new))?;
                Value::Number(if *prefix { new } else { old })
            }
            ExprKind::Binary { op, left, right } => {
                let l = self.eval(left)?;
                let r = self.eval(right)?;
                binary(*op, &l, &r)
            }
            ExprKind::Logical { op, left, right } => {
                let l = self.eval(left)?;
                match (op, to_boolean(&l)) {
                    (LogicalOp::And, true) | (LogicalOp::Or, false) => self.eval(right)?,
                    _ => l,
                }
            }
            ExprKind::Conditional {
                test,
                consequent,
                alternate,
            } => {
                if to_boolean(&self.eval(test)?) {
                    self.eval(consequent)?
                } else {
                    self.eval(alternate)?
                }
            }
            ExprKind::Assign { op, target, value } => {
                let v = match op {
                    None => self.eval(value)?,
                    Some(op) => {
                        let current = self.eval(target)?;
                        let rhs = self.eval(value)?;
                        binary(*op, &current, &rhs)
                    }
                };
                self.assign_to(target, v.clone())?;
                v
            }
            ExprKind::Sequence(items) => {
                let mut last = Value::Undefined;
                for item in items {
                    last = self.eval(item)?;
                }
                last
            }
        })
    }

    fn get_member(&mut self, base: &Value, property: &str) -> EvalResult<Value> {
        Ok(match base {
            Value::QObject(id) => self.scope.member(*id, property).unwrap_or_default(),
            Value::Object(_) => base.get(property).cloned().unwrap_or_default(),
            Value::Array(items) | Value::Sequence { items, .. } if property == "length" => {
                Value::Number(items.len() as f64)
            }
            Value::String(s) if property == "length" => Value::Number(s.encode_utf16().count() as f64),
            Value::ListModel(handle) if property == "count" => Value::Number(handle.model().len() as f64),
            Value::Getter(getter) => {
                let resolved = getter.read().map_err(|m| EvalError::Thrown(Value::String(m)))?;
                return self.get_member(&resolved, property);
            }
            Value::Undefined | Value::Null => {
                return Err(type_error(format!(
                    "Cannot read property '{property}' of {}",
                    to_display_string(base)
                )))
            }
            _ => Value::Undefined,
        })
    }

    fn get_index(&mut self, base: &Value, key: &Value) -> EvalResult<Value> {
        let position = match key {
            Value::Number(n) if n.fract() == 0.0 && *n >= 0.0 => Some(*n as usize),
            _ => None,
        };
        match (base, position) {
            (Value::Array(items) | Value::Sequence { items, .. }, Some(i)) => {
                Ok(items.get(i).cloned().unwrap_or_default())
            }
            (Value::String(s), Some(i)) => Ok(s
                .encode_utf16()
                .nth(i)
                .map(|unit| Value::String(String::from_utf16_lossy(&[unit])))
                .unwrap_or_default()),
            (Value::ListModel(handle), Some(i)) => Ok(handle.model().get(i).unwrap_or_default()),
            _ => self.get_member(base, &to_display_string(key)),
        }
    }

    fn assign_to(&mut self, target: &Expr, value: Value) -> EvalResult<()> {
        match &target.kind {
            ExprKind::Ident(name) => self.write_name(name, value),
            ExprKind::Member { object, property } => {
                self.assign_key(object, Value::String(property.clone()), value)
            }
            ExprKind::Index { object, index } => {
                let key = self.eval(index)?;
                self.assign_key(object, key, value)
            }
            _ => Err(type_error("invalid assignment target")),
        }
    }

    fn assign_key(&mut self, object: &Expr, key: Value, value: Value) -> EvalResult<()> {
        let base = self.eval(object)?;
        let name = to_display_string(&key);
        let updated = match base {
            Value::QObject(id) => {
                return if self.scope.assign_member(id, &name, value) {
                    Ok(())
                } else {
                    Err(type_error(format!("Cannot assign to property '{name}'")))
                };
            }
            mut obj @ Value::Object(_) => {
                obj.set(&name, value);
                obj
            }
            Value::Array(mut items) => match key {
                Value::Number(n) if n.fract() == 0.0 && (0.0..1e7).contains(&n) => {
                    let i = n as usize;
                    if i >= items.len() {
                        items.resize(i + 1, Value::Undefined);
                    }
                    items[i] = value;
                    Value::Array(items)
                }
                _ => return Err(type_error(format!("Cannot set property '{name}' of array"))),
            },
            other => {
                return Err(type_error(format!(
                    "Cannot set property '{name}' of {}",
                    to_display_string(&other)
                )))
            }
        };
        if is_place(object) {
            self.assign_to(object, updated)
        } else {
            Ok(())
        }
    }

    fn call_expr(&mut self, callee: &Expr, args: &[Expr]) -> EvalResult<Value> {
        let argv = args
            .iter()
            .map(|a| self.eval(a))
            .collect::<EvalResult<Vec<_>>>()?;
        match &callee.kind {
            ExprKind::Member { object, property } => {
                if self.is_math(object) {
                    return math(property, &argv);
                }
                let base = self.eval(object)?;
                let (result, updated) = method(&base, property, &argv)?;
                if let Some(updated) = updated {
                    if is_place(object) {
                        self.assign_to(object, updated)?;
                    }
                }
                Ok(result)
            }
            ExprKind::Ident(name) => {
                let target = match self.lookup_local(name) {
                    Some(Value::Function { name: fname }) => fname.clone(),
                    _ => name.clone(),
                };
                if let Some(def) = self.find_function(&target).or_else(|| self.find_function(name)) {
                    return self.call(&def, &argv);
                }
                if self.lookup_local(name).is_none() {
                    if let Some(result) = global_function(name, &argv) {
                        return Ok(result);
                    }
                }
                self.read_name(name)?;
                Err(type_error(format!("{name} is not a function")))
            }
            ExprKind::Function(def) => self.call(def, &argv),
            _ => {
                let value = self.eval(callee)?;
                Err(type_error(format!("{} is not a function", to_display_string(&value))))
            }
        }
    }
}

fn iterate_keys(subject: &Value) -> Vec<Value> {
    match subject {
        Value::Object(entries) => entries.iter().map(|(k, _)| Value::String(k.clone())).collect(),
        Value::Array(items) | Value::Sequence { items, .. } => {
            (0..items.len()).map(|i| Value::String(i.to_string())).collect()
        }
        Value::String(s) => (0..s.encode_utf16().count())
            .map(|i| Value::String(i.to_string()))
            .collect(),
        _ => Vec::new(),
    }
}

fn iterate_values(subject: &Value) -> EvalResult<Vec<Value>> {
    match subject {
        Value::Array(items) | Value::Sequence { items, .. } => Ok(items.clone()),
        Value::String(s) => Ok(s.chars().map(|c| Value::String(c.to_string())).collect()),
        Value::ListModel(handle) => Ok(handle.model().rows()),
        other => Err(type_error(format!("{} is not iterable", to_display_string(other)))),
    }
}

fn binary(op: BinaryOp, l: &Value, r: &Value) -> Value {
    let num = |f: fn(f64, f64) -> f64| Value::Number(f(to_number(l), to_number(r)));
    match op {
        BinaryOp::Add => {
            let stringish = |v: &Value| {
                matches!(
                    v,
                    Value::String(_) | Value::Array(_) | Value::Object(_) | Value::RegExp { .. }
                )
            };
            if stringish(l) || stringish(r) {
                Value::String(to_display_string(l) + &to_display_string(r))
            } else {
                num(|a, b| a + b)
            }
        }
        BinaryOp::Sub => num(|a, b| a - b),
        BinaryOp::Mul => num(|a, b| a * b),
        BinaryOp::Div => num(|a, b| a / b),
        BinaryOp::Rem => num(|a, b| a % b),
        BinaryOp::Lt | BinaryOp::Gt | BinaryOp::Le | BinaryOp::Ge => {
            let ordering = match (l, r) {
                (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
                _ => to_number(l).partial_cmp(&to_number(r)),
            };
            Value::Bool(match (op, ordering) {
                (_, None) => false,
                (BinaryOp::Lt, Some(o)) => o == Ordering::Less,
                (BinaryOp::Gt, Some(o)) => o == Ordering::Greater,
                (BinaryOp::Le, Some(o)) => o != Ordering::Greater,
                (_, Some(o)) => o != Ordering::Less,
            })
        }
        BinaryOp::Eq => Value::Bool(loose_equals(l, r)),
        BinaryOp::NotEq => Value::Bool(!loose_equals(l, r)),
        BinaryOp::StrictEq => Value::Bool(strict_equals(l, r)),
        BinaryOp::StrictNotEq => Value::Bool(!strict_equals(l, r)),
    }
}

fn arg_number(args: &[Value], i: usize) -> f64 {
    args.get(i).map(to_number).unwrap_or(f64::NAN)
}

fn math_constant(name: &str) -> Option<Value> {
    let v = match name {
        "PI" => std::f64::consts::PI,
        "E" => std::f64::consts::E,
        "SQRT2" => std::f64::consts::SQRT_2,
        "LN2" => std::f64::consts::LN_2,
        "LN10" => std::f64::consts::LN_10,
        _ => return None,
    };
    Some(Value::Number(v))
}

fn math(name: &str, args: &[Value]) -> EvalResult<Value> {
    let a = arg_number(args, 0);
    let v = match name {
        "min" => args.iter().map(to_number).fold(f64::INFINITY, |acc, x| {
            if acc.is_nan() || x.is_nan() {
                f64::NAN
            } else {
                acc.min(x)
            }
        }),
        "max" => args.iter().map(to_number).fold(f64::NEG_INFINITY, |acc, x| {
            if acc.is_nan() || x.is_nan() {
                f64::NAN
            } else {
                acc.max(x)
            }
        }),
        "abs" => a.abs(),
        "floor" => a.floor(),
        "ceil" => a.ceil(),
        "round" => (a + 0.5).floor(),
        "sqrt" => a.sqrt(),
        "pow" => a.powf(arg_number(args, 1)),
        "sin" => a.sin(),
        "cos" => a.cos(),
        "tan" => a.tan(),
        "atan" => a.atan(),
        "atan2" => a.atan2(arg_number(args, 1)),
        "exp" => a.exp(),
        "log" => a.ln(),
        _ => return Err(type_error(format!("Math.{name} is not a function"))),
    };
    Ok(Value::Number(v))
}

fn global_function(name: &str, args: &[Value]) -> Option<Value> {
    let first = args.first().cloned().unwrap_or_default();
    Some(match name {
        "Number" => Value::Number(if args.is_empty() { 0.0 } else { to_number(&first) }),
        "String" => Value::String(if args.is_empty() {
            String::new()
        } else {
            to_display_string(&first)
        }),
        "Boolean" => Value::Bool(to_boolean(&first)),
        "isNaN" => Value::Bool(to_number(&first).is_nan()),
        "isFinite" => Value::Bool(to_number(&first).is_finite()),
        "parseInt" => {
            let radix = args.get(1).map(to_number).filter(|r| *r >= 2.0 && *r <= 36.0);
            Value::Number(parse_int(&to_display_string(&first), radix.map(|r| r as u32)))
        }
        "parseFloat" => Value::Number(parse_float(&to_display_string(&first))),
        _ => return None,
    })
}

fn parse_int(text: &str, radix: Option<u32>) -> f64 {
    let mut s = text.trim();
    let mut sign = 1.0;
    if let Some(rest) = s.strip_prefix('-') {
        sign = -1.0;
        s = rest;
    } else if let Some(rest) = s.strip_prefix('+') {
        s = rest;
    }
    let mut radix = radix.unwrap_or(10);
    if radix == 16 || radix == 10 {
        if let Some(rest) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
            s = rest;
            radix = 16;
        }
    }
    let digits: Vec<u32> = s.chars().map_while(|c| c.to_digit(radix)).collect();
    if digits.is_empty() {
        return f64::NAN;
    }
    sign * digits.iter().fold(0.0, |acc, d| acc * radix as f64 + *d as f64)
}

fn parse_float(text: &str) -> f64 {
    let s = text.trim_start();
    let bytes = s.as_bytes();
    let mut end = 0;
    if matches!(bytes.first(), Some(b'+' | b'-')) {
        end = 1;
    }
    if s[end..].starts_with("Infinity") {
        return if s.starts_with('-') {
            f64::NEG_INFINITY
        } else {
            f64::INFINITY
        };
    }
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    if end < bytes.len() && bytes[end] == b'.' {
        end += 1;
        while end < bytes.len() && bytes[end].is_ascii_digit() {
            end += 1;
        }
    }
    if end < bytes.len() && matches!(bytes[end], b'e' | b'E') {
        let mut exp_end = end + 1;
        if exp_end < bytes.len() && matches!(bytes[exp_end], b'+' | b'-') {
            exp_end += 1;
        }
        if exp_end < bytes.len() && bytes[exp_end].is_ascii_digit() {
            while exp_end < bytes.len() && bytes[exp_end].is_ascii_digit() {
                exp_end += 1;
            }
            end = exp_end;
        }
    }
    s[..end].parse().unwrap_or(f64::NAN)
}

/// Clamp a possibly negative relative index into `0..=len`.
fn relative_index(v: f64, len: usize) -> usize {
    if v.is_nan() {
        0
    } else if v < 0.0 {
        (len as f64 + v).max(0.0) as usize
    } else {
        v.min(len as f64) as usize
    }
}

/// Built-in methods. The second element is the receiver's new value for mutating methods.
fn method(base: &Value, name: &str, args: &[Value]) -> EvalResult<(Value, Option<Value>)> {
    let result = match (base, name) {
        (Value::String(s), "toUpperCase") => Value::String(s.to_uppercase()),
        (Value::String(s), "toLowerCase") => Value::String(s.to_lowercase()),
        (Value::String(s), "trim") => Value::String(s.trim().to_string()),
        (Value::String(s), "charAt") => {
            let units: Vec<u16> = s.encode_utf16().collect();
            let i = relative_index(arg_number(args, 0), units.len());
            Value::String(
                units
                    .get(i)
                    .map(|u| String::from_utf16_lossy(&[*u]))
                    .unwrap_or_default(),
            )
        }
        (Value::String(s), "indexOf") => {
            let needle = args.first().map(to_display_string).unwrap_or_default();
            match s.find(&needle) {
                Some(byte) => Value::Number(s[..byte].encode_utf16().count() as f64),
                None => Value::Number(-1.0),
            }
        }
        (Value::String(s), "slice" | "substring") => {
            let units: Vec<u16> = s.encode_utf16().collect();
            let start = relative_index(arg_number(args, 0), units.len());
            let end = match args.get(1) {
                Some(v) => relative_index(to_number(v), units.len()),
                None => units.len(),
            };
            Value::String(String::from_utf16_lossy(&units[start..end.max(start)]))
        }
        (Value::String(s), "split") => {
            let sep = args.first().map(to_display_string).unwrap_or_default();
            let parts: Vec<Value> = if sep.is_empty() {
                s.chars().map(|c| Value::String(c.to_string())).collect()
            } else {
                s.split(sep.as_str()).map(Value::from).collect()
            };
            Value::Array(parts)
        }
        (Value::Number(n), "toFixed") => {
            let digits = arg_number(args, 0);
            let digits = if digits.is_nan() { 0 } else { digits.clamp(0.0, 20.0) as usize };
            Value::String(format!("{:.*}", digits, n))
        }
        (Value::Number(n), "toString") => Value::String(number_to_string(*n)),
        (Value::Array(items), "push") => {
            let mut items = items.clone();
            items.extend(args.iter().cloned());
            let len = items.len();
            return Ok((Value::Number(len as f64), Some(Value::Array(items))));
        }
        (Value::Array(items), "pop") => {
            let mut items = items.clone();
            let last = items.pop().unwrap_or_default();
            return Ok((last, Some(Value::Array(items))));
        }
        (Value::Array(items) | Value::Sequence { items, .. }, "join") => {
            let sep = match args.first() {
                Some(v) if !v.is_undefined() => to_display_string(v),
                _ => ",".to_string(),
            };
            Value::String(
                items
                    .iter()
                    .map(|v| if v.is_nullish() { String::new() } else { to_display_string(v) })
                    .collect::<Vec<_>>()
                    .join(&sep),
            )
        }
        (Value::Array(items) | Value::Sequence { items, .. }, "indexOf") => {
            let needle = args.first().cloned().unwrap_or_default();
            Value::Number(
                items
                    .iter()
                    .position(|v| strict_equals(v, &needle))
                    .map(|i| i as f64)
                    .unwrap_or(-1.0),
            )
        }
        (Value::Array(items), "slice") => {
            let start = relative_index(if args.is_empty() { 0.0 } else { arg_number(args, 0) }, items.len());
            let end = match args.get(1) {
                Some(v) => relative_index(to_number(v), items.len()),
                None => items.len(),
            };
            Value::Array(items[start..end.max(start)].to_vec())
        }
        (_, "toString") => Value::String(to_display_string(base)),
        _ => return Err(type_error(format!("{name} is not a function"))),
    };
    Ok((result, None))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_helpers() {
        assert_eq!(parse_int("  42px", None), 42.0);
        assert_eq!(parse_int("0x1F", None), 31.0);
        assert_eq!(parse_int("-7", None), -7.0);
        assert!(parse_int("px", None).is_nan());
        assert_eq!(parse_float("3.5e2abc"), 350.0);
        assert_eq!(parse_float("-Infinity"), f64::NEG_INFINITY);
    }

    #[test]
    fn addition_concatenates_strings() {
        assert_eq!(
            binary(BinaryOp::Add, &Value::from(1), &Value::from("px")),
            Value::from("1px")
        );
        assert_eq!(
            binary(BinaryOp::Add, &Value::from(1), &Value::Bool(true)),
            Value::from(2)
        );
        assert_eq!(
            binary(BinaryOp::Lt, &Value::from("a"), &Value::from("b")),
            Value::Bool(true)
        );
        assert_eq!(
            binary(BinaryOp::Ge, &Value::Number(f64::NAN), &Value::from(1)),
            Value::Bool(false)
        );
    }
}
