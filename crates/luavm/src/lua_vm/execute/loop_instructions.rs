/*----------------------------------------------------------------------
  Loop instructions

  Numeric for (FORPREP / FORLOOP) keeps the index, limit and step in
  R(A), R(A+1), R(A+2) and exposes the control variable in R(A+3).
  The loop runs on integers when the initial value and the step are
  integers and the limit can be clipped to an integer; otherwise
  everything is converted to floats.

  Generic for (TFORCALL / TFORLOOP) calls the iterator R(A) with the
  state R(A+1) and the control R(A+2).
----------------------------------------------------------------------*/

use crate::lua_value::{F2IMode, LuaValue};
use crate::lua_vm::{Instruction, LuaError, LuaResult, LuaState};

/// Clip a for-loop limit to an integer. Returns `(limit, stop_now)`, or
/// `None` when the limit is not a number at all.
fn for_limit(limit: &LuaValue, step: i64) -> Option<(i64, bool)> {
    let mode = if step < 0 { F2IMode::Ceil } else { F2IMode::Floor };
    if let Some(i) = limit.to_integer_mode(mode) {
        return Some((i, false));
    }
    let n = limit.to_float()?;
    if n > 0.0 {
        // larger than any integer
        Some((i64::MAX, step < 0))
    } else {
        // smaller than any integer, or NaN
        Some((i64::MIN, step >= 0))
    }
}

fn for_number(value: &LuaValue, what: &str) -> LuaResult<f64> {
    value
        .to_float()
        .ok_or_else(|| LuaError::runtime(format!("'for' {} must be a number", what)))
}

/// FORPREP A sBx
/// R(A) -= R(A+2); pc += sBx
pub fn exec_forprep(lua_state: &mut LuaState, instr: Instruction) -> LuaResult<()> {
    let a = instr.get_a() as i32 + 1;
    let init = lua_state.get(a);
    let limit = lua_state.get(a + 1);
    let step = lua_state.get(a + 2);

    let integer_loop = match (&init, &step) {
        (LuaValue::Integer(init), LuaValue::Integer(step)) => {
            for_limit(&limit, *step).map(|(ilimit, stop_now)| (*init, *step, ilimit, stop_now))
        }
        _ => None,
    };

    match integer_loop {
        Some((init, step, ilimit, stop_now)) => {
            let init = if stop_now { 0 } else { init };
            lua_state.set(a + 1, LuaValue::Integer(ilimit))?;
            lua_state.set(a, LuaValue::Integer(init.wrapping_sub(step)))?;
        }
        None => {
            let nlimit = for_number(&limit, "limit")?;
            let nstep = for_number(&step, "step")?;
            let ninit = for_number(&init, "initial value")?;
            lua_state.set(a + 1, LuaValue::Float(nlimit))?;
            lua_state.set(a + 2, LuaValue::Float(nstep))?;
            lua_state.set(a, LuaValue::Float(ninit - nstep))?;
        }
    }
    lua_state.add_pc(instr.get_sbx());
    Ok(())
}

/// FORLOOP A sBx
/// R(A) += R(A+2); if R(A) <?= R(A+1) then { pc += sBx; R(A+3) = R(A) }
pub fn exec_forloop(lua_state: &mut LuaState, instr: Instruction) -> LuaResult<()> {
    let a = instr.get_a() as i32 + 1;
    let next = match (lua_state.get(a), lua_state.get(a + 1), lua_state.get(a + 2)) {
        (LuaValue::Integer(idx), LuaValue::Integer(limit), LuaValue::Integer(step)) => {
            let idx = idx.wrapping_add(step);
            let continues = if step > 0 { idx <= limit } else { limit <= idx };
            continues.then_some(LuaValue::Integer(idx))
        }
        (idx, limit, step) => {
            let (idx, limit, step) = (
                idx.to_float().unwrap_or(f64::NAN),
                limit.to_float().unwrap_or(f64::NAN),
                step.to_float().unwrap_or(f64::NAN),
            );
            let idx = idx + step;
            let continues = if step > 0.0 { idx <= limit } else { limit <= idx };
            continues.then_some(LuaValue::Float(idx))
        }
    };
    if let Some(idx) = next {
        lua_state.add_pc(instr.get_sbx());
        lua_state.set(a, idx.clone())?;
        lua_state.set(a + 3, idx)?;
    }
    Ok(())
}

/// TFORCALL A C
/// R(A+3), ... ,R(A+2+C) := R(A)(R(A+1), R(A+2))
pub fn exec_tforcall(lua_state: &mut LuaState, instr: Instruction) -> LuaResult<()> {
    let a = instr.get_a() as i32 + 1;
    let c = instr.get_c() as i32;
    lua_state.push_func_and_args(a, 3)?;
    lua_state.call(2, c)?;
    lua_state.pop_results(a + 3, c + 1)
}

/// TFORLOOP A sBx
/// if R(A+1) ~= nil then { R(A) = R(A+1); pc += sBx }
pub fn exec_tforloop(lua_state: &mut LuaState, instr: Instruction) -> LuaResult<()> {
    let a = instr.get_a() as i32 + 1;
    if !lua_state.is_nil(a + 1) {
        lua_state.copy(a + 1, a)?;
        lua_state.add_pc(instr.get_sbx());
    }
    Ok(())
}
