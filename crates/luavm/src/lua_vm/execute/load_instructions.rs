/// Load and Move instructions
///
/// These instructions move values between registers and load constants,
/// booleans and nils into registers.
use crate::lua_vm::{Instruction, LuaError, LuaResult, LuaState, OpCode};

/// MOVE A B
/// R(A) := R(B)
pub fn exec_move(lua_state: &mut LuaState, instr: Instruction) -> LuaResult<()> {
    let a = instr.get_a() as i32 + 1;
    let b = instr.get_b() as i32 + 1;
    lua_state.copy(b, a)
}

/// LOADK A Bx
/// R(A) := Kst(Bx)
pub fn exec_loadk(lua_state: &mut LuaState, instr: Instruction) -> LuaResult<()> {
    let a = instr.get_a() as i32 + 1;
    lua_state.get_const(instr.get_bx() as usize)?;
    lua_state.replace(a)
}

/// LOADKX A
/// R(A) := Kst(extra arg)
/// The constant index lives in the Ax field of the following EXTRAARG
pub fn exec_loadkx(lua_state: &mut LuaState, instr: Instruction) -> LuaResult<()> {
    let a = instr.get_a() as i32 + 1;
    let extra = lua_state.fetch()?;
    if extra.get_opcode() != Some(OpCode::ExtraArg) {
        return Err(LuaError::runtime("LOADKX without EXTRAARG"));
    }
    lua_state.get_const(extra.get_ax() as usize)?;
    lua_state.replace(a)
}

/// LOADBOOL A B C
/// R(A) := (Bool)B; if (C) pc++
pub fn exec_loadbool(lua_state: &mut LuaState, instr: Instruction) -> LuaResult<()> {
    let a = instr.get_a() as i32 + 1;
    lua_state.push_boolean(instr.get_b() != 0)?;
    lua_state.replace(a)?;
    if instr.get_c() != 0 {
        lua_state.add_pc(1);
    }
    Ok(())
}

/// LOADNIL A B
/// R(A), R(A+1), ..., R(A+B) := nil
pub fn exec_loadnil(lua_state: &mut LuaState, instr: Instruction) -> LuaResult<()> {
    let a = instr.get_a() as i32 + 1;
    let b = instr.get_b() as i32;
    lua_state.push_nil()?;
    for i in a..=a + b {
        lua_state.copy(-1, i)?;
    }
    lua_state.pop(1)
}
