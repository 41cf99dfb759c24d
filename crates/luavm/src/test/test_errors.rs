// Fault reporting and recovery
use super::chunk_builder::*;
use crate::lua_value::chunk_serializer::dump;
use crate::lua_vm::OpCode;
use crate::*;

fn hello() -> Chunk {
    ProtoBuilder::main()
        .constants(vec![LuaValue::string("hello")])
        .code(vec![abx(OpCode::LoadK, 0, 0), abc(OpCode::Return, 0, 2, 0)])
        .build()
}

#[test]
fn test_malformed_chunks() {
    let mut vm = new_vm();
    assert_eq!(
        vm.execute(b"print('hi')"),
        Err(LuaError::ChunkFormat("not a precompiled chunk".to_string()))
    );

    let mut bytes = dump(&hello()).unwrap();
    bytes[4] = 0x54;
    assert_eq!(
        vm.execute(&bytes),
        Err(LuaError::ChunkFormat("version mismatch".to_string()))
    );

    let bytes = dump(&hello()).unwrap();
    let truncated = &bytes[..bytes.len() - 3];
    assert!(matches!(vm.execute(truncated), Err(LuaError::ChunkFormat(_))));
    assert_eq!(vm.main_state().get_top(), 0);
}

#[test]
fn test_undefined_opcodes() {
    let undefined = ProtoBuilder::main()
        .code(vec![Instruction::from_u32(50)])
        .build();
    assert_eq!(run_main(undefined), Err(LuaError::UnimplementedOpcode(50)));

    // EXTRAARG is only ever read by the instruction before it
    let stray = ProtoBuilder::main()
        .code(vec![ax(OpCode::ExtraArg, 0), abc(OpCode::Return, 0, 1, 0)])
        .build();
    assert_eq!(run_main(stray), Err(LuaError::UnimplementedOpcode(46)));

    let loadkx = ProtoBuilder::main()
        .constants(vec![LuaValue::Integer(1)])
        .code(vec![abx(OpCode::LoadKX, 0, 0), abc(OpCode::Return, 0, 2, 0)])
        .build();
    assert_eq!(
        run_main(loadkx),
        Err(LuaError::RuntimeError("LOADKX without EXTRAARG".to_string()))
    );
}

#[test]
fn test_running_off_the_end() {
    let main = ProtoBuilder::main()
        .code(vec![abc(OpCode::LoadNil, 0, 0, 0)])
        .build();
    assert_eq!(
        run_main(main),
        Err(LuaError::RuntimeError("program counter 1 out of range".to_string()))
    );
}

#[test]
fn test_open_operands_without_pending_results() {
    let invalid = || Err(LuaError::RuntimeError("invalid open call".to_string()));

    let call = ProtoBuilder::main()
        .code(vec![abc(OpCode::Call, 0, 0, 1), abc(OpCode::Return, 0, 1, 0)])
        .build();
    assert_eq!(run_main(call), invalid());

    // an integer register is not taken for the pending-results mark
    let call_after_int = ProtoBuilder::main()
        .constants(vec![LuaValue::Integer(1)])
        .code(vec![
            abx(OpCode::LoadK, 1, 0),
            abc(OpCode::Call, 0, 0, 1),
            abc(OpCode::Return, 0, 1, 0),
        ])
        .build();
    assert_eq!(run_main(call_after_int), invalid());

    let ret = ProtoBuilder::main()
        .code(vec![abc(OpCode::Return, 0, 0, 0)])
        .build();
    assert_eq!(run_main(ret), invalid());

    let setlist = ProtoBuilder::main()
        .code(vec![
            abc(OpCode::NewTable, 0, 0, 0),
            abc(OpCode::SetList, 0, 0, 1),
            abc(OpCode::Return, 0, 2, 0),
        ])
        .build();
    assert_eq!(run_main(setlist), invalid());
}

#[test]
fn test_vm_usable_after_error() {
    let failing = ProtoBuilder::main()
        .constants(vec![LuaValue::Boolean(true), LuaValue::Integer(1)])
        .code(vec![
            abc(OpCode::Add, 0, k(0), k(1)),
            abc(OpCode::Return, 0, 2, 0),
        ])
        .build();
    let mut vm = new_vm();
    vm.main_state_mut().push_integer(7).unwrap();
    assert_eq!(
        run(&mut vm, failing),
        Err(LuaError::TypeError(
            "attempt to perform arithmetic on a boolean value".to_string()
        ))
    );
    assert_eq!(vm.main_state().get_top(), 1);
    assert_eq!(vm.main_state().call_depth(), 0);
    assert_eq!(run(&mut vm, hello()).unwrap(), vec![LuaValue::string("hello")]);
    assert_eq!(vm.main_state().to_integer(1), 7);
}

#[test]
fn test_error_display() {
    assert_eq!(LuaError::StackOverflow.to_string(), "stack overflow");
    assert_eq!(LuaError::StackUnderflow.to_string(), "stack underflow");
    assert_eq!(LuaError::InvalidIndex(-3).to_string(), "invalid stack index -3");
    assert_eq!(LuaError::NotATable("nil").to_string(), "table expected, got nil");
    assert_eq!(
        LuaError::ChunkFormat("truncated chunk".to_string()).to_string(),
        "bad binary chunk: truncated chunk"
    );
    assert_eq!(
        LuaError::UnimplementedOpcode(46).to_string(),
        "unimplemented opcode 46"
    );
    assert_eq!(
        LuaError::TypeError("attempt to index a nil value".to_string()).to_string(),
        "attempt to index a nil value"
    );
}
