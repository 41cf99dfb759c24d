/*----------------------------------------------------------------------
  Comparison Operations

  EQ, LT and LE compare RK(B) with RK(C) and skip the next instruction
  when the outcome differs from A. Numbers compare by mathematical
  value across the integer/float split (exactly, with no rounding),
  strings compare bytewise, everything else goes through __eq, __lt
  and __le.
----------------------------------------------------------------------*/

use std::cmp::Ordering;

use crate::lua_value::LuaValue;
use crate::lua_vm::{Instruction, LuaError, LuaResult, LuaState};

use super::metamethod::TmKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Lt,
    Le,
}

// 2^63, the first float above every i64
const TWO_POW_63: f64 = 9_223_372_036_854_775_808.0;

// i < f  <=>  i < ceil(f)
fn lt_int_float(i: i64, f: f64) -> bool {
    if f.is_nan() {
        return false;
    }
    let c = f.ceil();
    if c >= TWO_POW_63 {
        true
    } else if c < i64::MIN as f64 {
        false
    } else {
        i < c as i64
    }
}

// i <= f  <=>  i <= floor(f)
fn le_int_float(i: i64, f: f64) -> bool {
    if f.is_nan() {
        return false;
    }
    let fl = f.floor();
    if fl >= TWO_POW_63 {
        true
    } else if fl < i64::MIN as f64 {
        false
    } else {
        i <= fl as i64
    }
}

// f < i  <=>  floor(f) < i
fn lt_float_int(f: f64, i: i64) -> bool {
    if f.is_nan() {
        return false;
    }
    let fl = f.floor();
    if fl >= TWO_POW_63 {
        false
    } else if fl < i64::MIN as f64 {
        true
    } else {
        (fl as i64) < i
    }
}

// f <= i  <=>  ceil(f) <= i
fn le_float_int(f: f64, i: i64) -> bool {
    if f.is_nan() {
        return false;
    }
    let c = f.ceil();
    if c >= TWO_POW_63 {
        false
    } else if c < i64::MIN as f64 {
        true
    } else {
        c as i64 <= i
    }
}

/// `a < b` for two numbers; `None` unless both are numbers
fn num_lt(a: &LuaValue, b: &LuaValue) -> Option<bool> {
    Some(match (a, b) {
        (LuaValue::Integer(x), LuaValue::Integer(y)) => x < y,
        (LuaValue::Float(x), LuaValue::Float(y)) => x < y,
        (LuaValue::Integer(x), LuaValue::Float(y)) => lt_int_float(*x, *y),
        (LuaValue::Float(x), LuaValue::Integer(y)) => lt_float_int(*x, *y),
        _ => return None,
    })
}

fn num_le(a: &LuaValue, b: &LuaValue) -> Option<bool> {
    Some(match (a, b) {
        (LuaValue::Integer(x), LuaValue::Integer(y)) => x <= y,
        (LuaValue::Float(x), LuaValue::Float(y)) => x <= y,
        (LuaValue::Integer(x), LuaValue::Float(y)) => le_int_float(*x, *y),
        (LuaValue::Float(x), LuaValue::Integer(y)) => le_float_int(*x, *y),
        _ => return None,
    })
}

fn str_cmp(a: &LuaValue, b: &LuaValue) -> Option<Ordering> {
    match (a, b) {
        (LuaValue::String(x), LuaValue::String(y)) => Some(x.as_bytes().cmp(y.as_bytes())),
        _ => None,
    }
}

fn compare_error(a: &LuaValue, b: &LuaValue) -> LuaError {
    let (t1, t2) = (a.type_name(), b.type_name());
    if t1 == t2 {
        LuaError::type_error(format!("attempt to compare two {} values", t1))
    } else {
        LuaError::type_error(format!("attempt to compare {} with {}", t1, t2))
    }
}

impl LuaState {
    /// Compare the values at two stack indices. Invalid indices compare false.
    pub fn compare(&mut self, idx1: i32, idx2: i32, op: CompareOp) -> LuaResult<bool> {
        if !self.is_valid_index(idx1) || !self.is_valid_index(idx2) {
            return Ok(false);
        }
        let a = self.get(idx1);
        let b = self.get(idx2);
        match op {
            CompareOp::Eq => self.values_equal(&a, &b),
            CompareOp::Lt => self.less_than(&a, &b),
            CompareOp::Le => self.less_equal(&a, &b),
        }
    }

    pub(crate) fn values_equal(&mut self, a: &LuaValue, b: &LuaValue) -> LuaResult<bool> {
        if a.raw_equals(b) {
            return Ok(true);
        }
        if !(a.is_table() && b.is_table()) {
            return Ok(false);
        }
        match self.call_metamethod(a, b, TmKind::Eq)? {
            Some(result) => Ok(result.to_boolean()),
            None => Ok(false),
        }
    }

    pub(crate) fn less_than(&mut self, a: &LuaValue, b: &LuaValue) -> LuaResult<bool> {
        if let Some(result) = num_lt(a, b) {
            return Ok(result);
        }
        if let Some(ord) = str_cmp(a, b) {
            return Ok(ord == Ordering::Less);
        }
        match self.call_metamethod(a, b, TmKind::Lt)? {
            Some(result) => Ok(result.to_boolean()),
            None => Err(compare_error(a, b)),
        }
    }

    /// `a <= b`; without `__le`, falls back to `not (b < a)` via `__lt`
    pub(crate) fn less_equal(&mut self, a: &LuaValue, b: &LuaValue) -> LuaResult<bool> {
        if let Some(result) = num_le(a, b) {
            return Ok(result);
        }
        if let Some(ord) = str_cmp(a, b) {
            return Ok(ord != Ordering::Greater);
        }
        if let Some(result) = self.call_metamethod(a, b, TmKind::Le)? {
            return Ok(result.to_boolean());
        }
        match self.call_metamethod(b, a, TmKind::Lt)? {
            Some(result) => Ok(!result.to_boolean()),
            None => Err(compare_error(a, b)),
        }
    }
}

// if ((RK(B) op RK(C)) ~= A) then pc++
fn compare_and_skip(lua_state: &mut LuaState, instr: Instruction, op: CompareOp) -> LuaResult<()> {
    lua_state.get_rk(instr.get_b())?;
    lua_state.get_rk(instr.get_c())?;
    let result = lua_state.compare(-2, -1, op)?;
    lua_state.pop(2)?;
    if result != (instr.get_a() != 0) {
        lua_state.add_pc(1);
    }
    Ok(())
}

pub fn exec_eq(lua_state: &mut LuaState, instr: Instruction) -> LuaResult<()> {
    compare_and_skip(lua_state, instr, CompareOp::Eq)
}

pub fn exec_lt(lua_state: &mut LuaState, instr: Instruction) -> LuaResult<()> {
    compare_and_skip(lua_state, instr, CompareOp::Lt)
}

pub fn exec_le(lua_state: &mut LuaState, instr: Instruction) -> LuaResult<()> {
    compare_and_skip(lua_state, instr, CompareOp::Le)
}
