/// Upvalue instructions
///
/// Upvalues are addressed through pseudo-indices of the running closure,
/// so every access goes through the regular stack API.
use crate::lua_vm::lua_limits::upvalue_index;
use crate::lua_vm::{Instruction, LuaResult, LuaState};

/// GETUPVAL A B
/// R(A) := UpValue[B]
pub fn exec_getupval(lua_state: &mut LuaState, instr: Instruction) -> LuaResult<()> {
    let a = instr.get_a() as i32 + 1;
    let b = instr.get_b() as i32 + 1;
    lua_state.copy(upvalue_index(b), a)
}

/// SETUPVAL A B
/// UpValue[B] := R(A)
pub fn exec_setupval(lua_state: &mut LuaState, instr: Instruction) -> LuaResult<()> {
    let a = instr.get_a() as i32 + 1;
    let b = instr.get_b() as i32 + 1;
    lua_state.copy(a, upvalue_index(b))
}

/// GETTABUP A B C
/// R(A) := UpValue[B][RK(C)]
pub fn exec_gettabup(lua_state: &mut LuaState, instr: Instruction) -> LuaResult<()> {
    let a = instr.get_a() as i32 + 1;
    let b = instr.get_b() as i32 + 1;
    lua_state.get_rk(instr.get_c())?;
    lua_state.get_table(upvalue_index(b))?;
    lua_state.replace(a)
}

/// SETTABUP A B C
/// UpValue[A][RK(B)] := RK(C)
pub fn exec_settabup(lua_state: &mut LuaState, instr: Instruction) -> LuaResult<()> {
    let a = instr.get_a() as i32 + 1;
    lua_state.get_rk(instr.get_b())?;
    lua_state.get_rk(instr.get_c())?;
    lua_state.set_table(upvalue_index(a))
}
