/*----------------------------------------------------------------------
  Call Frame

  One activation record: the register/value slots of a Lua or native
  call, its top cursor, program counter, varargs and the open upvalues
  that alias its registers.

  Slot positions are 0-based; stack indices handed to the API are
  1-based (1 = bottom of the frame) or negative (relative to top).
  Invariant: top <= slots.len().
----------------------------------------------------------------------*/

use std::collections::HashMap;
use std::rc::Rc;

use ahash::RandomState;

use crate::lua_value::{LuaClosure, LuaValue, UpvalueRef};
use crate::lua_vm::lua_limits::LUA_REGISTRYINDEX;
use crate::lua_vm::{LuaError, LuaResult};

/// Destination of the results of a call made by CALL or TAILCALL:
/// stack index `a` of the caller and the instruction's `c` operand
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallSite {
    pub a: i32,
    pub c: i32,
}

pub struct LuaCallFrame {
    pub(crate) slots: Vec<LuaValue>,
    pub(crate) top: usize,
    pub(crate) closure: Option<Rc<LuaClosure>>,
    pub(crate) varargs: Vec<LuaValue>,
    pub(crate) pc: usize,
    /// register -> open upvalue aliasing it
    pub(crate) open_upvalues: HashMap<usize, UpvalueRef, RandomState>,
    /// Set for Lua frames entered from a running Lua frame. Their RETURN
    /// hands the results straight to the caller; frames without a call
    /// site end the dispatch loop instead.
    pub(crate) call_site: Option<CallSite>,
}

impl LuaCallFrame {
    pub fn new(capacity: usize, closure: Option<Rc<LuaClosure>>) -> Self {
        LuaCallFrame {
            slots: vec![LuaValue::Nil; capacity],
            top: 0,
            closure,
            varargs: Vec::new(),
            pc: 0,
            open_upvalues: HashMap::with_hasher(RandomState::new()),
            call_site: None,
        }
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Make room for `n` more values above top. Growth never shrinks the frame.
    pub fn ensure_capacity(&mut self, n: usize) {
        let needed = self.top + n;
        if needed > self.slots.len() {
            self.slots.resize(needed, LuaValue::Nil);
        }
    }

    pub fn push(&mut self, value: LuaValue) -> LuaResult<()> {
        if self.top == self.slots.len() {
            return Err(LuaError::StackOverflow);
        }
        self.slots[self.top] = value;
        self.top += 1;
        Ok(())
    }

    pub fn pop(&mut self) -> LuaResult<LuaValue> {
        if self.top < 1 {
            return Err(LuaError::StackUnderflow);
        }
        self.top -= 1;
        Ok(std::mem::take(&mut self.slots[self.top]))
    }

    /// Push `n` values taken from `values`, padding with nil; `n < 0` pushes all
    pub fn push_n(&mut self, values: Vec<LuaValue>, n: i32) -> LuaResult<()> {
        let n = if n < 0 { values.len() } else { n as usize };
        let len = values.len();
        for value in values.into_iter().take(n) {
            self.push(value)?;
        }
        for _ in len..n {
            self.push(LuaValue::Nil)?;
        }
        Ok(())
    }

    /// Pop the top `n` values, returned bottom to top
    pub fn pop_n(&mut self, n: usize) -> LuaResult<Vec<LuaValue>> {
        if n > self.top {
            return Err(LuaError::StackUnderflow);
        }
        let start = self.top - n;
        let values = self.slots[start..self.top]
            .iter_mut()
            .map(std::mem::take)
            .collect();
        self.top = start;
        Ok(values)
    }

    /// Convert a relative index to an absolute one; pseudo-indices pass through.
    /// The result is not range checked.
    #[inline]
    pub fn abs_index(&self, idx: i32) -> i32 {
        if idx >= 0 || idx <= LUA_REGISTRYINDEX {
            idx
        } else {
            idx + self.top as i32 + 1
        }
    }

    pub fn is_valid(&self, idx: i32) -> bool {
        let abs = self.abs_index(idx);
        abs > 0 && abs as usize <= self.top
    }

    /// Value at a stack index; invalid indices read as nil
    pub fn get(&self, idx: i32) -> LuaValue {
        if self.is_valid(idx) {
            self.slots[self.abs_index(idx) as usize - 1].clone()
        } else {
            LuaValue::Nil
        }
    }

    pub fn set(&mut self, idx: i32, value: LuaValue) -> LuaResult<()> {
        if !self.is_valid(idx) {
            return Err(LuaError::InvalidIndex(idx as i64));
        }
        let pos = self.abs_index(idx) as usize - 1;
        self.slots[pos] = value;
        Ok(())
    }

    /// Register access by 0-based slot position, used by upvalues
    pub(crate) fn slot(&self, pos: usize) -> Option<LuaValue> {
        self.slots.get(pos).cloned()
    }

    pub(crate) fn set_slot(&mut self, pos: usize, value: LuaValue) {
        if let Some(slot) = self.slots.get_mut(pos) {
            *slot = value;
        }
    }

    /// Reverse slots `from..=to` (0-based) in place
    pub fn reverse(&mut self, from: usize, to: usize) {
        if from < to && to < self.slots.len() {
            self.slots[from..=to].reverse();
        }
    }

    /// Registers declared by the running Lua function (0 for native frames)
    pub fn register_count(&self) -> usize {
        self.closure
            .as_ref()
            .and_then(|c| c.chunk())
            .map_or(0, |chunk| chunk.max_stack_size as usize)
    }

    /// Close every open upvalue aliasing register `register` or above
    pub fn close_upvalues_from(&mut self, register: usize) {
        let slots = &self.slots;
        self.open_upvalues.retain(|&reg, upvalue| {
            if reg >= register {
                upvalue.close(slots.get(reg).cloned().unwrap_or_default());
                false
            } else {
                true
            }
        });
    }
}
