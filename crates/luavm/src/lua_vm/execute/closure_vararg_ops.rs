/*----------------------------------------------------------------------
  Closure and Vararg Operations

  CLOSURE instantiates a child prototype. Each upvalue descriptor
  either captures a register of the running frame (shared through the
  frame's open-upvalue index, so sibling closures see one cell) or
  aliases an upvalue of the running closure.

  VARARG copies the frame's extra arguments into registers.
----------------------------------------------------------------------*/

use crate::lua_value::{LuaClosure, LuaUpvalue, LuaValue};
use crate::lua_vm::{Instruction, LuaError, LuaResult, LuaState};

impl LuaState {
    /// Push a closure over child prototype `idx` of the running function
    pub(crate) fn load_proto(&mut self, idx: usize) -> LuaResult<()> {
        let parent = self
            .frame()
            .closure
            .clone()
            .ok_or_else(|| LuaError::runtime("CLOSURE outside a Lua function"))?;
        let proto = parent
            .chunk()
            .and_then(|chunk| chunk.child_protos.get(idx))
            .cloned()
            .ok_or_else(|| LuaError::runtime(format!("prototype index {} out of range", idx)))?;

        let depth = self.call_depth();
        let mut upvalues = Vec::with_capacity(proto.upvalue_descs.len());
        for desc in &proto.upvalue_descs {
            let index = desc.index as usize;
            let upvalue = if desc.in_stack {
                self.frame_mut()
                    .open_upvalues
                    .entry(index)
                    .or_insert_with(|| LuaUpvalue::new_open(depth, index))
                    .clone()
            } else {
                parent.upvalues.get(index).cloned().ok_or_else(|| {
                    LuaError::runtime(format!("upvalue index {} out of range", index))
                })?
            };
            upvalues.push(upvalue);
        }
        self.push(LuaValue::function(LuaClosure::lua(proto, upvalues)))
    }
}

/// CLOSURE A Bx
/// R(A) := closure(KPROTO[Bx])
pub fn exec_closure(lua_state: &mut LuaState, instr: Instruction) -> LuaResult<()> {
    let a = instr.get_a() as i32 + 1;
    lua_state.load_proto(instr.get_bx() as usize)?;
    lua_state.replace(a)
}

/// VARARG A B
/// R(A), R(A+1), ..., R(A+B-2) = vararg
pub fn exec_vararg(lua_state: &mut LuaState, instr: Instruction) -> LuaResult<()> {
    let a = instr.get_a() as i32 + 1;
    let b = instr.get_b() as i32;
    if b != 1 {
        lua_state.load_vararg(b - 1)?;
        lua_state.pop_results(a, b)?;
    }
    Ok(())
}
