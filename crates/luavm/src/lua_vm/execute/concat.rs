/*----------------------------------------------------------------------
  Length and Concatenation

  LEN:    R(A) := length of R(B)
  CONCAT: R(A) := R(B).. ... ..R(C)

  Concatenation folds right to left, two operands at a time, so a run
  of strings and numbers is joined directly while any other operand
  pair goes through __concat.
----------------------------------------------------------------------*/

use crate::lua_value::{LuaString, LuaValue};
use crate::lua_vm::{Instruction, LuaError, LuaResult, LuaState};

use super::metamethod::TmKind;

fn concat_error(a: &LuaValue, b: &LuaValue) -> LuaError {
    let culprit = if a.is_string() || a.is_number() { b } else { a };
    LuaError::type_error(format!(
        "attempt to concatenate a {} value",
        culprit.type_name()
    ))
}

impl LuaState {
    /// Push the length of the value at `idx`, honouring `__len`
    pub fn len(&mut self, idx: i32) -> LuaResult<()> {
        let value = self.get(idx);
        if let LuaValue::String(s) = &value {
            return self.push_integer(s.len() as i64);
        }
        if let Some(result) = self.call_metamethod(&value, &value, TmKind::Len)? {
            return self.push(result);
        }
        match &value {
            LuaValue::Table(t) => {
                let n = t.borrow().len();
                self.push_integer(n as i64)
            }
            other => Err(LuaError::type_error(format!(
                "attempt to get length of a {} value",
                other.type_name()
            ))),
        }
    }

    /// Pop `n` values and push their concatenation; `n == 0` pushes ""
    pub fn concat(&mut self, n: usize) -> LuaResult<()> {
        if n == 0 {
            return self.push_string("");
        }
        for _ in 1..n {
            let b = self.pop_value()?;
            let a = self.pop_value()?;
            if let (Some(x), Some(y)) = (a.to_lua_string(), b.to_lua_string()) {
                let mut bytes = Vec::with_capacity(x.len() + y.len());
                bytes.extend_from_slice(x.as_bytes());
                bytes.extend_from_slice(y.as_bytes());
                self.push(LuaValue::String(LuaString::from(bytes)))?;
                continue;
            }
            match self.call_metamethod(&a, &b, TmKind::Concat)? {
                Some(result) => self.push(result)?,
                None => return Err(concat_error(&a, &b)),
            }
        }
        Ok(())
    }
}

/// LEN: R(A) := length of R(B)
pub fn exec_len(lua_state: &mut LuaState, instr: Instruction) -> LuaResult<()> {
    let a = instr.get_a() as i32 + 1;
    let b = instr.get_b() as i32 + 1;
    lua_state.len(b)?;
    lua_state.replace(a)
}

/// CONCAT: R(A) := R(B).. ... ..R(C)
pub fn exec_concat(lua_state: &mut LuaState, instr: Instruction) -> LuaResult<()> {
    let a = instr.get_a() as i32 + 1;
    let b = instr.get_b() as i32 + 1;
    let c = instr.get_c() as i32 + 1;
    let n = (c - b + 1).max(0) as usize;
    lua_state.check_stack(n)?;
    for i in b..=c {
        lua_state.push_value(i)?;
    }
    lua_state.concat(n)?;
    lua_state.replace(a)
}
