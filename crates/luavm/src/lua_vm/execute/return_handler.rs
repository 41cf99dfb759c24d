/// RETURN A B
/// return R(A), ... ,R(A+B-2)
///
/// The values are left above the frame's registers. A frame entered by
/// CALL or TAILCALL is popped here and the results stored at its call
/// site; otherwise the call protocol collects them once the dispatch loop
/// stops. B == 0 returns everything up to the values pending from an open
/// call.
use crate::lua_vm::{Instruction, LuaResult, LuaState};

pub fn exec_return(lua_state: &mut LuaState, instr: Instruction) -> LuaResult<()> {
    let a = instr.get_a() as i32 + 1;
    let b = instr.get_b() as i32;
    if b == 1 {
        // no return values
    } else if b > 1 {
        lua_state.check_stack((b - 1) as usize)?;
        for i in a..=a + b - 2 {
            lua_state.push_value(i)?;
        }
    } else {
        lua_state.fix_stack(a)?;
    }
    if let Some(site) = lua_state.frame().call_site {
        lua_state.post_lua_call(site.c - 1)?;
        lua_state.pop_results(site.a, site.c)?;
    }
    Ok(())
}
