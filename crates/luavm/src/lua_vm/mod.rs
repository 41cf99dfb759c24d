// Lua Virtual Machine
// Executes Lua 5.3 bytecode with a register-based architecture
mod execute;
pub(crate) mod lua_call_frame;
mod lua_error;
pub mod lua_limits;
mod lua_state;
mod opcode;
mod safe_option;

use crate::lib_registry;
use crate::lua_value::LuaValue;
pub use crate::lua_vm::lua_error::{LuaError, LuaResult};
pub use crate::lua_vm::lua_state::LuaState;
pub use crate::lua_vm::safe_option::SafeOption;
pub use execute::{ArithOp, CompareOp, TmKind, lua_fmod, lua_idiv, lua_imod, lua_shiftl, lua_shiftr};
pub use lua_limits::LUA_MULTRET;
pub use opcode::{Instruction, OP_CODES, OpArgMask, OpCode, OpCodeInfo, OpMode};

/// Host-facing handle owning the main state
pub struct LuaVM {
    main_state: LuaState,
}

impl LuaVM {
    pub fn new(options: SafeOption) -> Self {
        LuaVM {
            main_state: LuaState::new(options),
        }
    }

    pub fn main_state(&self) -> &LuaState {
        &self.main_state
    }

    pub fn main_state_mut(&mut self) -> &mut LuaState {
        &mut self.main_state
    }

    /// Register `print`, `getmetatable` and `setmetatable` in the globals table
    pub fn open_libs(&mut self) -> LuaResult<()> {
        lib_registry::create_standard_registry().load_all(&mut self.main_state)
    }

    /// Undump a binary chunk and push its main function on the main stack
    pub fn load(&mut self, chunk: &[u8], chunk_name: &str) -> LuaResult<()> {
        self.main_state.load(chunk, chunk_name)
    }

    pub fn call(&mut self, n_args: usize, n_results: i32) -> LuaResult<()> {
        self.main_state.call(n_args, n_results)
    }

    /// Load and run a chunk, returning every value it returns.
    /// The main stack is left as it was, whether the chunk succeeds or fails.
    pub fn execute(&mut self, chunk: &[u8]) -> LuaResult<Vec<LuaValue>> {
        let base = self.main_state.get_top();
        let status = self
            .main_state
            .load(chunk, "=(execute)")
            .and_then(|()| self.main_state.call(0, LUA_MULTRET));
        if let Err(e) = status {
            self.main_state.set_top(base)?;
            return Err(e);
        }
        let n = (self.main_state.get_top() - base) as usize;
        self.main_state.frame_mut().pop_n(n)
    }

    pub fn get_global(&mut self, name: &str) -> LuaResult<LuaValue> {
        self.main_state.get_global(name)?;
        self.main_state.pop_value()
    }

    pub fn set_global(&mut self, name: &str, value: LuaValue) -> LuaResult<()> {
        self.main_state.check_stack(1)?;
        self.main_state.push(value)?;
        self.main_state.set_global(name)
    }
}

impl Default for LuaVM {
    fn default() -> Self {
        Self::new(SafeOption::default())
    }
}
