// Lua Runtime
// A Lua 5.3 bytecode virtual machine: binary chunk loader, register-based
// interpreter, hybrid tables and metatables

#[cfg(test)]
mod test;

pub mod lib_registry;
pub mod lua_value;
pub mod lua_vm;
pub mod stdlib;

pub use lib_registry::LibraryRegistry;
pub use lua_value::{Chunk, LuaClosure, LuaString, LuaTable, LuaType, LuaValue};
pub use lua_vm::{Instruction, LuaError, LuaResult, LuaState, LuaVM, OpCode, SafeOption};
