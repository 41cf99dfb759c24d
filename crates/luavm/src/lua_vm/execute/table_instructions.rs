/// Table instructions
///
/// Construction, indexed access and list initialization. Indexed access
/// honours `__index` / `__newindex`; SETLIST writes raw.
use crate::lua_vm::lua_limits::LFIELDS_PER_FLUSH;
use crate::lua_vm::{Instruction, LuaError, LuaResult, LuaState, OpCode};

use super::helper::fb2int;

/// NEWTABLE A B C
/// R(A) := {} (size = B,C)
/// B and C are "floating point byte" size hints for the array and hash parts
pub fn exec_newtable(lua_state: &mut LuaState, instr: Instruction) -> LuaResult<()> {
    let a = instr.get_a() as i32 + 1;
    lua_state.create_table(fb2int(instr.get_b()), fb2int(instr.get_c()))?;
    lua_state.replace(a)
}

/// GETTABLE A B C
/// R(A) := R(B)[RK(C)]
pub fn exec_gettable(lua_state: &mut LuaState, instr: Instruction) -> LuaResult<()> {
    let a = instr.get_a() as i32 + 1;
    let b = instr.get_b() as i32 + 1;
    lua_state.get_rk(instr.get_c())?;
    lua_state.get_table(b)?;
    lua_state.replace(a)
}

/// SETTABLE A B C
/// R(A)[RK(B)] := RK(C)
pub fn exec_settable(lua_state: &mut LuaState, instr: Instruction) -> LuaResult<()> {
    let a = instr.get_a() as i32 + 1;
    lua_state.get_rk(instr.get_b())?;
    lua_state.get_rk(instr.get_c())?;
    lua_state.set_table(a)
}

/// SELF A B C
/// R(A+1) := R(B); R(A) := R(B)[RK(C)]
pub fn exec_self(lua_state: &mut LuaState, instr: Instruction) -> LuaResult<()> {
    let a = instr.get_a() as i32 + 1;
    let b = instr.get_b() as i32 + 1;
    lua_state.copy(b, a + 1)?;
    lua_state.get_rk(instr.get_c())?;
    lua_state.get_table(b)?;
    lua_state.replace(a)
}

/// SETLIST A B C
/// R(A)[(C-1)*FPF+i] := R(A+i), 1 <= i <= B
///
/// B == 0: the items run up to the values left by an open call or VARARG.
/// C == 0: the batch number is in the Ax field of the following EXTRAARG.
pub fn exec_setlist(lua_state: &mut LuaState, instr: Instruction) -> LuaResult<()> {
    let a = instr.get_a() as i32 + 1;
    let mut b = instr.get_b() as i32;
    let c = match instr.get_c() {
        0 => {
            let extra = lua_state.fetch()?;
            if extra.get_opcode() != Some(OpCode::ExtraArg) {
                return Err(LuaError::runtime("SETLIST without EXTRAARG"));
            }
            extra.get_ax() as i64
        }
        c => c as i64,
    };

    let open = b == 0;
    if open {
        b = lua_state.pop_open_mark()? - a - 1;
    }

    lua_state.check_stack(1)?;
    let mut idx = (c - 1) * LFIELDS_PER_FLUSH;
    for j in 1..=b {
        idx += 1;
        lua_state.push_value(a + j)?;
        lua_state.raw_set_i(a, idx)?;
    }

    if open {
        let register_count = lua_state.register_count() as i32;
        for j in register_count + 1..=lua_state.get_top() {
            idx += 1;
            lua_state.push_value(j)?;
            lua_state.raw_set_i(a, idx)?;
        }
        lua_state.set_top(register_count)?;
    }
    Ok(())
}
