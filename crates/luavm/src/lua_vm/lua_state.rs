// Lua State: the call stack of frames plus the index-based stack API
// every instruction handler and native function works through.

use std::cell::RefCell;
use std::rc::Rc;

use crate::lua_value::{
    LuaClosure, LuaString, LuaTable, LuaType, LuaUpvalue, LuaValue, RustFunction, TableRef,
    UpvalueRef,
};
use crate::lua_vm::lua_call_frame::LuaCallFrame;
use crate::lua_vm::lua_limits::{LUA_MINSTACK, LUA_REGISTRYINDEX, LUA_RIDX_GLOBALS};
use crate::lua_vm::{LuaError, LuaResult, SafeOption};

pub struct LuaState {
    registry: TableRef,
    /// Frame of the innermost running call
    current: LuaCallFrame,
    /// Suspended callers, outermost first
    callers: Vec<LuaCallFrame>,
    /// Calls currently nested on the Rust stack
    pub(crate) native_depth: usize,
    options: SafeOption,
}

impl LuaState {
    pub fn new(options: SafeOption) -> Self {
        let mut registry = LuaTable::default();
        registry.put_int(LUA_RIDX_GLOBALS, LuaValue::new_table());
        LuaState {
            registry: Rc::new(RefCell::new(registry)),
            current: LuaCallFrame::new(LUA_MINSTACK, None),
            callers: Vec::new(),
            native_depth: 0,
            options,
        }
    }

    pub fn options(&self) -> &SafeOption {
        &self.options
    }

    pub fn registry(&self) -> &TableRef {
        &self.registry
    }

    /// The globals table held by the registry
    pub fn globals(&self) -> LuaValue {
        self.registry.borrow().get_int(LUA_RIDX_GLOBALS)
    }

    // ===== Frames =====

    #[inline]
    pub(crate) fn frame(&self) -> &LuaCallFrame {
        &self.current
    }

    #[inline]
    pub(crate) fn frame_mut(&mut self) -> &mut LuaCallFrame {
        &mut self.current
    }

    /// Number of calls currently active on top of the host frame
    pub fn call_depth(&self) -> usize {
        self.callers.len()
    }

    pub(crate) fn frame_at(&self, depth: usize) -> Option<&LuaCallFrame> {
        if depth == self.callers.len() {
            Some(&self.current)
        } else {
            self.callers.get(depth)
        }
    }

    pub(crate) fn frame_at_mut(&mut self, depth: usize) -> Option<&mut LuaCallFrame> {
        if depth == self.callers.len() {
            Some(&mut self.current)
        } else {
            self.callers.get_mut(depth)
        }
    }

    pub(crate) fn push_frame(&mut self, frame: LuaCallFrame) -> LuaResult<()> {
        if self.callers.len() >= self.options.max_call_depth {
            return Err(LuaError::StackOverflow);
        }
        let caller = std::mem::replace(&mut self.current, frame);
        self.callers.push(caller);
        Ok(())
    }

    /// Pop the running frame, closing every upvalue still aliasing it
    pub(crate) fn pop_frame(&mut self) -> LuaResult<LuaCallFrame> {
        let caller = self.callers.pop().ok_or(LuaError::StackUnderflow)?;
        let mut frame = std::mem::replace(&mut self.current, caller);
        frame.close_upvalues_from(0);
        Ok(frame)
    }

    // ===== Raw slot access (pseudo-index aware) =====

    fn upvalue_at(&self, idx: i32) -> Option<UpvalueRef> {
        let i = (LUA_REGISTRYINDEX - idx - 1) as usize;
        self.current.closure.as_ref()?.upvalues.get(i).cloned()
    }

    pub(crate) fn is_valid_index(&self, idx: i32) -> bool {
        if idx == LUA_REGISTRYINDEX {
            true
        } else if idx < LUA_REGISTRYINDEX {
            self.upvalue_at(idx).is_some()
        } else {
            self.current.is_valid(idx)
        }
    }

    pub(crate) fn get(&self, idx: i32) -> LuaValue {
        if idx == LUA_REGISTRYINDEX {
            return LuaValue::Table(self.registry.clone());
        }
        if idx < LUA_REGISTRYINDEX {
            return self
                .upvalue_at(idx)
                .map(|upvalue| upvalue.get_value(self))
                .unwrap_or_default();
        }
        self.current.get(idx)
    }

    pub(crate) fn set(&mut self, idx: i32, value: LuaValue) -> LuaResult<()> {
        if idx == LUA_REGISTRYINDEX {
            return match value {
                LuaValue::Table(t) => {
                    self.registry = t;
                    Ok(())
                }
                other => Err(LuaError::NotATable(other.type_name())),
            };
        }
        if idx < LUA_REGISTRYINDEX {
            if let Some(upvalue) = self.upvalue_at(idx) {
                upvalue.set_value(self, value);
            }
            return Ok(());
        }
        self.current.set(idx, value)
    }

    #[inline]
    pub(crate) fn push(&mut self, value: LuaValue) -> LuaResult<()> {
        self.current.push(value)
    }

    #[inline]
    pub(crate) fn pop_value(&mut self) -> LuaResult<LuaValue> {
        self.current.pop()
    }

    // ===== Basic stack manipulation =====

    pub fn get_top(&self) -> i32 {
        self.current.top as i32
    }

    pub fn abs_index(&self, idx: i32) -> i32 {
        self.current.abs_index(idx)
    }

    /// Grow the frame so `n` more values fit
    pub fn check_stack(&mut self, n: usize) -> LuaResult<()> {
        if self.current.top + n > self.options.max_stack_size {
            return Err(LuaError::StackOverflow);
        }
        self.current.ensure_capacity(n);
        Ok(())
    }

    pub fn pop(&mut self, n: usize) -> LuaResult<()> {
        for _ in 0..n {
            self.current.pop()?;
        }
        Ok(())
    }

    pub fn copy(&mut self, from_idx: i32, to_idx: i32) -> LuaResult<()> {
        let value = self.get(from_idx);
        self.set(to_idx, value)
    }

    pub fn push_value(&mut self, idx: i32) -> LuaResult<()> {
        let value = self.get(idx);
        self.push(value)
    }

    /// Pop the top value into `idx`
    pub fn replace(&mut self, idx: i32) -> LuaResult<()> {
        let value = self.pop_value()?;
        self.set(idx, value)
    }

    /// Move the top value down to `idx`, shifting the values above it up
    pub fn insert(&mut self, idx: i32) -> LuaResult<()> {
        self.rotate(idx, 1)
    }

    pub fn remove(&mut self, idx: i32) -> LuaResult<()> {
        self.rotate(idx, -1)?;
        self.pop(1)
    }

    /// Rotate the values in `[idx, top]` by `n` positions toward the top
    /// (negative `n` rotates toward the bottom), using three reversals.
    pub fn rotate(&mut self, idx: i32, n: i32) -> LuaResult<()> {
        let frame = &mut self.current;
        if !frame.is_valid(idx) {
            return Err(LuaError::InvalidIndex(idx as i64));
        }
        let t = frame.top as i32 - 1;
        let p = frame.abs_index(idx) - 1;
        if n.unsigned_abs() > (t - p + 1) as u32 {
            return Err(LuaError::InvalidIndex(n as i64));
        }
        let m = if n >= 0 { t - n } else { p - n - 1 };
        let mut reverse = |from: i32, to: i32| {
            if from >= 0 && from < to {
                frame.reverse(from as usize, to as usize);
            }
        };
        reverse(p, m);
        reverse(m + 1, t);
        reverse(p, t);
        Ok(())
    }

    /// Set the top to `idx`, padding with nil or popping
    pub fn set_top(&mut self, idx: i32) -> LuaResult<()> {
        let new_top = self.current.abs_index(idx);
        if new_top < 0 {
            return Err(LuaError::StackUnderflow);
        }
        let new_top = new_top as usize;
        if new_top < self.current.register_count() {
            return Err(LuaError::InvalidIndex(idx as i64));
        }
        let top = self.current.top;
        if new_top < top {
            self.pop(top - new_top)?;
        } else if new_top > top {
            self.check_stack(new_top - top)?;
            for _ in top..new_top {
                self.push(LuaValue::Nil)?;
            }
        }
        Ok(())
    }

    // ===== Push functions =====

    pub fn push_nil(&mut self) -> LuaResult<()> {
        self.push(LuaValue::Nil)
    }

    pub fn push_boolean(&mut self, b: bool) -> LuaResult<()> {
        self.push(LuaValue::Boolean(b))
    }

    pub fn push_integer(&mut self, n: i64) -> LuaResult<()> {
        self.push(LuaValue::Integer(n))
    }

    pub fn push_number(&mut self, n: f64) -> LuaResult<()> {
        self.push(LuaValue::Float(n))
    }

    pub fn push_string(&mut self, s: impl Into<LuaString>) -> LuaResult<()> {
        self.push(LuaValue::String(s.into()))
    }

    pub fn push_rust_function(&mut self, f: RustFunction) -> LuaResult<()> {
        self.push(LuaValue::function(LuaClosure::rust(f, Vec::new())))
    }

    /// Pop `n` values and push a native closure holding them as closed upvalues
    pub fn push_rust_closure(&mut self, f: RustFunction, n: usize) -> LuaResult<()> {
        let upvalues = self
            .current
            .pop_n(n)?
            .into_iter()
            .map(LuaUpvalue::new_closed)
            .collect();
        self.push(LuaValue::function(LuaClosure::rust(f, upvalues)))
    }

    pub fn push_global_table(&mut self) -> LuaResult<()> {
        let globals = self.globals();
        self.push(globals)
    }

    // ===== Access functions (stack -> host) =====

    pub fn type_of(&self, idx: i32) -> LuaType {
        if self.is_valid_index(idx) {
            self.get(idx).type_of()
        } else {
            LuaType::None
        }
    }

    pub fn type_name_at(&self, idx: i32) -> &'static str {
        self.type_of(idx).name()
    }

    pub fn is_none(&self, idx: i32) -> bool {
        self.type_of(idx) == LuaType::None
    }

    pub fn is_nil(&self, idx: i32) -> bool {
        self.type_of(idx) == LuaType::Nil
    }

    pub fn is_none_or_nil(&self, idx: i32) -> bool {
        matches!(self.type_of(idx), LuaType::None | LuaType::Nil)
    }

    pub fn is_boolean(&self, idx: i32) -> bool {
        self.type_of(idx) == LuaType::Boolean
    }

    pub fn is_integer(&self, idx: i32) -> bool {
        matches!(self.get(idx), LuaValue::Integer(_))
    }

    /// Number, or a string convertible to one
    pub fn is_number(&self, idx: i32) -> bool {
        self.to_number_x(idx).is_some()
    }

    /// String, or a number (always convertible to a string)
    pub fn is_string(&self, idx: i32) -> bool {
        matches!(self.type_of(idx), LuaType::String | LuaType::Number)
    }

    pub fn is_table(&self, idx: i32) -> bool {
        self.type_of(idx) == LuaType::Table
    }

    pub fn is_function(&self, idx: i32) -> bool {
        self.type_of(idx) == LuaType::Function
    }

    pub fn to_boolean(&self, idx: i32) -> bool {
        self.get(idx).to_boolean()
    }

    pub fn to_integer_x(&self, idx: i32) -> Option<i64> {
        self.get(idx).to_integer()
    }

    pub fn to_integer(&self, idx: i32) -> i64 {
        self.to_integer_x(idx).unwrap_or(0)
    }

    pub fn to_number_x(&self, idx: i32) -> Option<f64> {
        self.get(idx).to_float()
    }

    pub fn to_number(&self, idx: i32) -> f64 {
        self.to_number_x(idx).unwrap_or(0.0)
    }

    /// String at `idx`; a number is converted and the slot is replaced by the string
    pub fn to_string_x(&mut self, idx: i32) -> Option<LuaString> {
        match self.get(idx) {
            LuaValue::String(s) => Some(s),
            number @ (LuaValue::Integer(_) | LuaValue::Float(_)) => {
                let s = number.to_lua_string()?;
                self.set(idx, LuaValue::String(s.clone())).ok()?;
                Some(s)
            }
            _ => None,
        }
    }

    /// Length without metamethods: bytes of a string, border of a table
    pub fn raw_len(&self, idx: i32) -> usize {
        match self.get(idx) {
            LuaValue::String(s) => s.len(),
            LuaValue::Table(t) => t.borrow().len(),
            _ => 0,
        }
    }

    pub fn raw_equal(&self, idx1: i32, idx2: i32) -> bool {
        if !self.is_valid_index(idx1) || !self.is_valid_index(idx2) {
            return false;
        }
        self.get(idx1).raw_equals(&self.get(idx2))
    }
}
