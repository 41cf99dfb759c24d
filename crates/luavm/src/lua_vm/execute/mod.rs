/*----------------------------------------------------------------------
  Lua 5.3 VM Execution Engine

  Fetch-decode-dispatch over the running frame. Every handler is an
  entry of the static opcode table and works through the stack API:
  register R(x) is stack index x+1 of the current frame.

  Operator semantics (arithmetic, comparison, concatenation, length,
  indexing) live next to their handlers and fall back to metamethods
  through `metamethod.rs`.
----------------------------------------------------------------------*/

mod arithmetic_instructions;
mod call;
mod closure_vararg_ops;
mod comparison_ops;
mod concat;
mod control_instructions;
mod helper;
mod load_instructions;
mod loop_instructions;
mod metamethod;
mod return_handler;
mod table_instructions;
mod table_ops;
mod upvalue_instructions;

pub(crate) use arithmetic_instructions::{
    exec_add, exec_band, exec_bnot, exec_bor, exec_bxor, exec_div, exec_idiv, exec_mod, exec_mul,
    exec_not, exec_pow, exec_shl, exec_shr, exec_sub, exec_unm,
};
pub(crate) use call::{exec_call, exec_tailcall};
pub(crate) use closure_vararg_ops::{exec_closure, exec_vararg};
pub(crate) use comparison_ops::{exec_eq, exec_le, exec_lt};
pub(crate) use concat::{exec_concat, exec_len};
pub(crate) use control_instructions::{exec_jmp, exec_test, exec_testset};
pub(crate) use load_instructions::{exec_loadbool, exec_loadk, exec_loadkx, exec_loadnil, exec_move};
pub(crate) use loop_instructions::{exec_forloop, exec_forprep, exec_tforcall, exec_tforloop};
pub(crate) use return_handler::exec_return;
pub(crate) use table_instructions::{
    exec_gettable, exec_newtable, exec_self, exec_setlist, exec_settable,
};
pub(crate) use upvalue_instructions::{exec_gettabup, exec_getupval, exec_settabup, exec_setupval};

pub use arithmetic_instructions::{
    ArithOp, lua_fmod, lua_idiv, lua_imod, lua_shiftl, lua_shiftr,
};
pub use comparison_ops::CompareOp;
pub use metamethod::TmKind;

use crate::lua_vm::{Instruction, LuaError, LuaResult, LuaState, OpCode};

impl LuaState {
    /// Run the current Lua frame, and the Lua frames it calls, until its RETURN
    pub(crate) fn run_lua_closure(&mut self) -> LuaResult<()> {
        loop {
            let pc = self.frame().pc;
            let instr = self.fetch()?;
            let raw = instr.get_opcode_raw();
            let opcode = OpCode::from_u8(raw).ok_or(LuaError::UnimplementedOpcode(raw))?;
            let info = opcode.info();
            tracing::trace!(
                pc,
                op = info.name,
                a = instr.get_a(),
                b = instr.get_b(),
                c = instr.get_c(),
                "execute"
            );
            let action = info.action.ok_or(LuaError::UnimplementedOpcode(raw))?;
            let leaves_loop = opcode == OpCode::Return && self.frame().call_site.is_none();
            action(self, instr)?;
            if leaves_loop {
                return Ok(());
            }
        }
    }

    /// Instruction at pc, advancing pc past it
    pub(crate) fn fetch(&mut self) -> LuaResult<Instruction> {
        let frame = self.frame_mut();
        let instr = frame
            .closure
            .as_ref()
            .and_then(|c| c.chunk())
            .and_then(|chunk| chunk.code.get(frame.pc))
            .copied()
            .ok_or_else(|| LuaError::runtime(format!("program counter {} out of range", frame.pc)))?;
        frame.pc += 1;
        Ok(instr)
    }

    pub(crate) fn add_pc(&mut self, n: i32) {
        let frame = self.frame_mut();
        frame.pc = frame.pc.wrapping_add_signed(n as isize);
    }

    /// Push constant `idx` of the running prototype
    pub(crate) fn get_const(&mut self, idx: usize) -> LuaResult<()> {
        let constant = self
            .frame()
            .closure
            .as_ref()
            .and_then(|c| c.chunk())
            .and_then(|chunk| chunk.constants.get(idx))
            .cloned()
            .ok_or_else(|| LuaError::runtime(format!("constant index {} out of range", idx)))?;
        self.push(constant)
    }

    /// Push the value named by an RK operand
    pub(crate) fn get_rk(&mut self, rk: u32) -> LuaResult<()> {
        if Instruction::is_k(rk) {
            self.get_const(Instruction::rk_index(rk) as usize)
        } else {
            self.push_value(rk as i32 + 1)
        }
    }

    pub(crate) fn register_count(&self) -> usize {
        self.frame().register_count()
    }

    /// Push `n` varargs (all of them when `n < 0`), padding with nil
    pub(crate) fn load_vararg(&mut self, n: i32) -> LuaResult<()> {
        let varargs = self.frame().varargs.clone();
        let n = if n < 0 { varargs.len() as i32 } else { n };
        self.check_stack(n as usize)?;
        self.frame_mut().push_n(varargs, n)
    }

    /// Close open upvalues at or above register `a - 1` (a is the raw operand)
    pub(crate) fn close_upvalues(&mut self, a: u32) {
        self.frame_mut().close_upvalues_from(a.saturating_sub(1) as usize);
    }
}
