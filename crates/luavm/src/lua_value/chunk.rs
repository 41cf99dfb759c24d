use std::rc::Rc;

use smol_str::SmolStr;

use super::LuaValue;
use crate::lua_vm::Instruction;

/// Upvalue descriptor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpvalueDesc {
    /// true: captures a register of the enclosing frame, false: an upvalue of the enclosing closure
    pub in_stack: bool,
    pub index: u8,
}

/// Local variable debug information
#[derive(Debug, Clone, PartialEq)]
pub struct LocVar {
    pub name: SmolStr,
    pub start_pc: u32,
    pub end_pc: u32,
}

/// Compiled function prototype
#[derive(Debug, Clone, Default)]
pub struct Chunk {
    pub source: Option<SmolStr>,
    pub line_defined: u32,
    pub last_line_defined: u32,
    pub num_params: u8,
    pub is_vararg: bool,
    /// Number of registers the function needs
    pub max_stack_size: u8,
    pub code: Vec<Instruction>,
    pub constants: Vec<LuaValue>,
    pub upvalue_descs: Vec<UpvalueDesc>,
    pub child_protos: Vec<Rc<Chunk>>,

    // debug info
    pub line_info: Vec<u32>,
    pub locals: Vec<LocVar>,
    pub upvalue_names: Vec<SmolStr>,
}

impl Chunk {
    /// Source line of the instruction at `pc`, when line info was kept
    pub fn line_at(&self, pc: usize) -> Option<u32> {
        self.line_info.get(pc).copied()
    }

    pub fn source_name(&self) -> &str {
        self.source.as_deref().unwrap_or("?")
    }
}
