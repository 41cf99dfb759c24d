// Hand-assembled prototypes for exercising the VM without a compiler
use std::rc::Rc;

use crate::lua_value::chunk_serializer::dump;
use crate::lua_value::{Chunk, UpvalueDesc};
use crate::lua_vm::{Instruction, LuaResult, LuaVM, OpCode, SafeOption};
use crate::LuaValue;

pub fn abc(op: OpCode, a: u32, b: u32, c: u32) -> Instruction {
    Instruction::create_abc(op, a, b, c)
}

pub fn abx(op: OpCode, a: u32, bx: u32) -> Instruction {
    Instruction::create_abx(op, a, bx)
}

pub fn asbx(op: OpCode, a: u32, sbx: i32) -> Instruction {
    Instruction::create_asbx(op, a, sbx)
}

pub fn ax(op: OpCode, ax: u32) -> Instruction {
    Instruction::create_ax(op, ax)
}

/// RK operand naming constant `idx`
pub const fn k(idx: u32) -> u32 {
    Instruction::rk_as_k(idx)
}

pub struct ProtoBuilder {
    chunk: Chunk,
}

impl ProtoBuilder {
    /// A main function: vararg, `_ENV` as its only upvalue
    pub fn main() -> Self {
        ProtoBuilder {
            chunk: Chunk {
                source: Some("=test".into()),
                is_vararg: true,
                max_stack_size: 2,
                upvalue_descs: vec![UpvalueDesc {
                    in_stack: true,
                    index: 0,
                }],
                ..Default::default()
            },
        }
    }

    /// A nested function without upvalues
    pub fn function() -> Self {
        ProtoBuilder {
            chunk: Chunk {
                max_stack_size: 2,
                ..Default::default()
            },
        }
    }

    pub fn params(mut self, n: u8) -> Self {
        self.chunk.num_params = n;
        self
    }

    pub fn registers(mut self, n: u8) -> Self {
        self.chunk.max_stack_size = n;
        self
    }

    pub fn constants(mut self, constants: Vec<LuaValue>) -> Self {
        self.chunk.constants = constants;
        self
    }

    pub fn upvalue(mut self, in_stack: bool, index: u8) -> Self {
        self.chunk.upvalue_descs.push(UpvalueDesc { in_stack, index });
        self
    }

    pub fn child(mut self, proto: Chunk) -> Self {
        self.chunk.child_protos.push(Rc::new(proto));
        self
    }

    pub fn code(mut self, code: Vec<Instruction>) -> Self {
        self.chunk.code = code;
        self
    }

    pub fn build(self) -> Chunk {
        self.chunk
    }
}

pub fn new_vm() -> LuaVM {
    let mut vm = LuaVM::new(SafeOption::default());
    vm.open_libs().unwrap();
    vm
}

/// Dump `main` to bytes, then load and run it through `vm`
pub fn run(vm: &mut LuaVM, main: Chunk) -> LuaResult<Vec<LuaValue>> {
    let bytes = dump(&main)?;
    vm.execute(&bytes)
}

/// Run `main` in a fresh VM with the basic library open
pub fn run_main(main: Chunk) -> LuaResult<Vec<LuaValue>> {
    run(&mut new_vm(), main)
}

/// `return RK(b) op RK(c)` over two constants
pub fn eval_binary(op: OpCode, lhs: LuaValue, rhs: LuaValue) -> LuaResult<LuaValue> {
    let main = ProtoBuilder::main()
        .constants(vec![lhs, rhs])
        .code(vec![abc(op, 0, k(0), k(1)), abc(OpCode::Return, 0, 2, 0)])
        .build();
    let mut results = run_main(main)?;
    Ok(results.remove(0))
}
