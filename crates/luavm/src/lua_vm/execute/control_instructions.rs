/// Control flow instructions
use crate::lua_vm::{Instruction, LuaResult, LuaState};

/// JMP A sBx
/// pc += sBx; if (A) close all upvalues >= R(A - 1)
pub fn exec_jmp(lua_state: &mut LuaState, instr: Instruction) -> LuaResult<()> {
    lua_state.add_pc(instr.get_sbx());
    let a = instr.get_a();
    if a != 0 {
        lua_state.close_upvalues(a);
    }
    Ok(())
}

/// TEST A C
/// if not (R(A) <=> C) then pc++
pub fn exec_test(lua_state: &mut LuaState, instr: Instruction) -> LuaResult<()> {
    let a = instr.get_a() as i32 + 1;
    if lua_state.to_boolean(a) != (instr.get_c() != 0) {
        lua_state.add_pc(1);
    }
    Ok(())
}

/// TESTSET A B C
/// if (R(B) <=> C) then R(A) := R(B) else pc++
pub fn exec_testset(lua_state: &mut LuaState, instr: Instruction) -> LuaResult<()> {
    let a = instr.get_a() as i32 + 1;
    let b = instr.get_b() as i32 + 1;
    if lua_state.to_boolean(b) == (instr.get_c() != 0) {
        lua_state.copy(b, a)
    } else {
        lua_state.add_pc(1);
        Ok(())
    }
}
