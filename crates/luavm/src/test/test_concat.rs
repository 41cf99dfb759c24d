// CONCAT and LEN
use super::chunk_builder::*;
use crate::lua_vm::OpCode;
use crate::*;

fn concat_three(c: LuaValue) -> LuaResult<Vec<LuaValue>> {
    let main = ProtoBuilder::main()
        .registers(3)
        .constants(vec![LuaValue::string("a"), LuaValue::Integer(1), c])
        .code(vec![
            abx(OpCode::LoadK, 0, 0),
            abx(OpCode::LoadK, 1, 1),
            abx(OpCode::LoadK, 2, 2),
            abc(OpCode::Concat, 0, 0, 2),
            abc(OpCode::Return, 0, 2, 0),
        ])
        .build();
    run_main(main)
}

#[test]
fn test_concat_coerces_numbers() {
    assert_eq!(concat_three(LuaValue::Float(2.5)), Ok(vec![LuaValue::string("a12.5")]));
    assert_eq!(concat_three(LuaValue::Float(2.0)), Ok(vec![LuaValue::string("a12.0")]));
    assert_eq!(concat_three(LuaValue::Float(1e100)), Ok(vec![LuaValue::string("a11e+100")]));
    assert_eq!(concat_three(LuaValue::Integer(-7)), Ok(vec![LuaValue::string("a1-7")]));
}

fn concat_marker(state: &mut LuaState) -> LuaResult<usize> {
    state.push_string("meta")?;
    Ok(1)
}

fn concat_pair(vm: &mut LuaVM, lhs: Instruction) -> LuaResult<Vec<LuaValue>> {
    let main = ProtoBuilder::main()
        .constants(vec![LuaValue::string("a"), LuaValue::Integer(1), LuaValue::string("x")])
        .code(vec![
            lhs,
            abx(OpCode::LoadK, 1, 1),
            abc(OpCode::Concat, 0, 0, 1),
            abc(OpCode::Return, 0, 2, 0),
        ])
        .build();
    run(vm, main)
}

#[test]
fn test_string_number_concat_skips_concat_metamethod() {
    let mut vm = new_vm();
    let state = vm.main_state_mut();
    state.push_string("").unwrap();
    state.new_table().unwrap();
    state.push_rust_function(concat_marker).unwrap();
    state.set_field(-2, "__concat").unwrap();
    state.set_metatable(-2).unwrap();
    state.pop(1).unwrap();

    // "a" .. 1
    assert_eq!(
        concat_pair(&mut vm, abx(OpCode::LoadK, 0, 0)),
        Ok(vec![LuaValue::string("a1")])
    );

    // {} .. 1 has no string-like left operand and no metamethod
    assert_eq!(
        concat_pair(&mut vm, abc(OpCode::NewTable, 0, 0, 0)),
        Err(LuaError::TypeError("attempt to concatenate a table value".to_string()))
    );

    // {} .. "x" finds __concat through the string operand
    let state = vm.main_state_mut();
    state.new_table().unwrap();
    state.push_string("x").unwrap();
    state.concat(2).unwrap();
    assert_eq!(state.to_string_x(-1).unwrap().as_bytes(), b"meta");
    state.pop(1).unwrap();

    state.push_string("a").unwrap();
    state.push_integer(1).unwrap();
    state.concat(2).unwrap();
    assert_eq!(state.to_string_x(-1).unwrap().as_bytes(), b"a1");
}

#[test]
fn test_concat_of_table_faults() {
    let main = ProtoBuilder::main()
        .registers(2)
        .constants(vec![LuaValue::string("a")])
        .code(vec![
            abx(OpCode::LoadK, 0, 0),
            abc(OpCode::NewTable, 1, 0, 0),
            abc(OpCode::Concat, 0, 0, 1),
            abc(OpCode::Return, 0, 2, 0),
        ])
        .build();
    assert_eq!(
        run_main(main),
        Err(LuaError::TypeError("attempt to concatenate a table value".to_string()))
    );
}

#[test]
fn test_concat_api() {
    let mut state = LuaState::new(SafeOption::default());
    state.concat(0).unwrap();
    assert_eq!(state.to_string_x(-1).unwrap().as_bytes(), b"");

    state.push_string("x").unwrap();
    state.concat(1).unwrap();
    assert_eq!(state.get_top(), 2);

    state.push_integer(2).unwrap();
    state.push_number(0.5).unwrap();
    state.concat(3).unwrap();
    assert_eq!(state.get_top(), 2);
    assert_eq!(state.to_string_x(-1).unwrap().as_bytes(), b"x20.5");
}

#[test]
fn test_len_of_strings_and_tables() {
    let main = ProtoBuilder::main()
        .registers(4)
        .constants(vec![
            LuaValue::string("hello"),
            LuaValue::Integer(10),
            LuaValue::Integer(20),
        ])
        .code(vec![
            abx(OpCode::LoadK, 0, 0),
            abc(OpCode::Len, 0, 0, 0),
            abc(OpCode::NewTable, 1, 2, 0),
            abx(OpCode::LoadK, 2, 1),
            abx(OpCode::LoadK, 3, 2),
            abc(OpCode::SetList, 1, 2, 1),
            abc(OpCode::Len, 1, 1, 0),
            abc(OpCode::Return, 0, 3, 0),
        ])
        .build();
    assert_eq!(
        run_main(main).unwrap(),
        vec![LuaValue::Integer(5), LuaValue::Integer(2)]
    );
}

#[test]
fn test_len_of_boolean_faults() {
    let mut state = LuaState::new(SafeOption::default());
    state.push_boolean(true).unwrap();
    assert_eq!(
        state.len(1),
        Err(LuaError::TypeError("attempt to get length of a boolean value".to_string()))
    );
    assert_eq!(state.raw_len(1), 0);
}
