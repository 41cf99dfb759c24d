// Shared helpers for call-like instructions and table constructors.
//
// A call or VARARG with an open result count (C == 0 / B == 0) leaves its
// values above the frame's registers and pushes an integer sentinel holding
// the first destination register index. The next consumer (CALL with B == 0,
// RETURN with B == 0, SETLIST with B == 0) pops the sentinel and gathers the
// pending values.

use crate::lua_value::LuaValue;
use crate::lua_vm::{LuaError, LuaResult, LuaState};

// Preallocation cap for NEWTABLE size hints
const MAX_SIZE_HINT: usize = 1 << 16;

/// Decode a "floating point byte" (eeeeexxx) into (1xxx) * 2^(eeeee-1)
pub(crate) fn fb2int(x: u32) -> usize {
    if x < 8 {
        x as usize
    } else {
        let shift = (x >> 3) - 1;
        if shift >= 16 {
            MAX_SIZE_HINT
        } else {
            ((((x & 7) + 8) as usize) << shift).min(MAX_SIZE_HINT)
        }
    }
}

impl LuaState {
    /// Push the function at stack index `a` and its arguments; returns the argument count
    pub(crate) fn push_func_and_args(&mut self, a: i32, b: i32) -> LuaResult<usize> {
        if b >= 1 {
            self.check_stack(b as usize)?;
            for i in a..a + b {
                self.push_value(i)?;
            }
            Ok((b - 1) as usize)
        } else {
            self.fix_stack(a)?;
            (self.get_top() as usize)
                .checked_sub(self.register_count() + 1)
                .ok_or_else(|| LuaError::runtime("invalid open call"))
        }
    }

    /// Pop the sentinel left above the registers by an open call or VARARG.
    /// It must name a register of the running frame.
    pub(crate) fn pop_open_mark(&mut self) -> LuaResult<i32> {
        let regs = self.register_count();
        let above_registers = self.get_top() as usize > regs;
        let mark = match self.get(-1) {
            LuaValue::Integer(x) if above_registers && x >= 1 && x as usize <= regs => x as i32,
            _ => return Err(LuaError::runtime("invalid open call")),
        };
        self.pop(1)?;
        Ok(mark)
    }

    /// Move registers `a..sentinel` below the pending values left by an open call
    pub(crate) fn fix_stack(&mut self, a: i32) -> LuaResult<()> {
        let x = self.pop_open_mark()?;
        let n = (x - a).max(0);
        if n == 0 {
            return Ok(());
        }
        self.check_stack(n as usize)?;
        for i in a..a + n {
            self.push_value(i)?;
        }
        self.rotate(self.register_count() as i32 + 1, n)
    }

    /// Store call results into registers starting at stack index `a`.
    /// `c == 0` keeps them on the stack behind a sentinel.
    pub(crate) fn pop_results(&mut self, a: i32, c: i32) -> LuaResult<()> {
        if c == 1 {
            // no results wanted
        } else if c > 1 {
            for i in (a..=a + c - 2).rev() {
                self.replace(i)?;
            }
        } else {
            self.check_stack(1)?;
            self.push_integer(a as i64)?;
        }
        Ok(())
    }
}
