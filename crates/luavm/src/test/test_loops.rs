// Numeric and generic for loops
use super::chunk_builder::*;
use crate::lua_vm::OpCode;
use crate::*;

/// local s = 0; for i = init, limit, step do s = s + i end; return s
fn for_sum(init: LuaValue, limit: LuaValue, step: LuaValue) -> LuaResult<LuaValue> {
    let main = ProtoBuilder::main()
        .registers(5)
        .constants(vec![LuaValue::Integer(0), init, limit, step])
        .code(vec![
            abx(OpCode::LoadK, 0, 0),
            abx(OpCode::LoadK, 1, 1),
            abx(OpCode::LoadK, 2, 2),
            abx(OpCode::LoadK, 3, 3),
            asbx(OpCode::ForPrep, 1, 1),
            abc(OpCode::Add, 0, 0, 4),
            asbx(OpCode::ForLoop, 1, -2),
            abc(OpCode::Return, 0, 2, 0),
        ])
        .build();
    let mut results = run_main(main)?;
    Ok(results.remove(0))
}

fn int(i: i64) -> LuaValue {
    LuaValue::Integer(i)
}

#[test]
fn test_integer_loop() {
    assert_eq!(for_sum(int(1), int(10), int(1)), Ok(int(55)));
    assert_eq!(for_sum(int(10), int(1), int(-3)), Ok(int(22)));
    assert_eq!(for_sum(int(5), int(1), int(1)), Ok(int(0)));
}

#[test]
fn test_float_loop() {
    assert_eq!(
        for_sum(int(1), int(2), LuaValue::Float(0.5)),
        Ok(LuaValue::Float(4.5))
    );
    assert_eq!(
        for_sum(LuaValue::Float(0.5), int(2), int(1)),
        Ok(LuaValue::Float(2.0))
    );
}

#[test]
fn test_float_limit_is_clipped() {
    // 1 + 2 + 3, and the loop stays on integers
    assert_eq!(for_sum(int(1), LuaValue::Float(3.5), int(1)), Ok(int(6)));
    assert_eq!(for_sum(int(3), LuaValue::Float(0.5), int(-1)), Ok(int(6)));
}

#[test]
fn test_out_of_range_limit() {
    // no integer is >= 1e100, so a descending loop never starts
    assert_eq!(for_sum(int(5), LuaValue::Float(1e100), int(-1)), Ok(int(0)));
    assert_eq!(for_sum(int(5), LuaValue::Float(-1e100), int(1)), Ok(int(0)));
    assert_eq!(for_sum(int(1), LuaValue::Float(f64::NAN), int(1)), Ok(int(0)));
}

#[test]
fn test_non_numeric_loop_values() {
    assert_eq!(
        for_sum(LuaValue::string("x"), int(2), int(1)),
        Err(LuaError::RuntimeError("'for' initial value must be a number".to_string()))
    );
    assert_eq!(
        for_sum(int(1), LuaValue::Boolean(true), int(1)),
        Err(LuaError::RuntimeError("'for' limit must be a number".to_string()))
    );
    assert_eq!(
        for_sum(int(1), int(2), LuaValue::Nil),
        Err(LuaError::RuntimeError("'for' step must be a number".to_string()))
    );
    // numeric strings are accepted and force a float loop
    assert_eq!(
        for_sum(LuaValue::string("1"), int(3), int(1)),
        Ok(LuaValue::Float(6.0))
    );
}

/// Counts the control value up to 3, then ends the loop
fn upto3(state: &mut LuaState) -> LuaResult<usize> {
    let control = state.to_integer(2);
    if control < 3 {
        state.push_integer(control + 1)?;
    } else {
        state.push_nil()?;
    }
    Ok(1)
}

#[test]
fn test_generic_for_with_native_iterator() {
    // local acc = 0; for v in upto3, nil, 0 do acc = acc + v end; return acc
    let main = ProtoBuilder::main()
        .registers(5)
        .constants(vec![LuaValue::string("upto3"), LuaValue::Integer(0)])
        .code(vec![
            abc(OpCode::GetTabUp, 0, 0, k(0)),
            abc(OpCode::LoadNil, 1, 0, 0),
            abx(OpCode::LoadK, 2, 1),
            abx(OpCode::LoadK, 4, 1),
            asbx(OpCode::Jmp, 0, 1),
            abc(OpCode::Add, 4, 4, 3),
            abc(OpCode::TForCall, 0, 0, 1),
            asbx(OpCode::TForLoop, 2, -3),
            abc(OpCode::Return, 4, 2, 0),
        ])
        .build();
    let mut vm = new_vm();
    vm.main_state_mut().register("upto3", upto3).unwrap();
    assert_eq!(run(&mut vm, main).unwrap(), vec![LuaValue::Integer(6)]);
}
