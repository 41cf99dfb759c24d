// EQ / LT / LE through the dispatcher and the compare API
use super::chunk_builder::*;
use crate::lua_vm::{CompareOp, OpCode};
use crate::*;

/// `return lhs op rhs` as a boolean, the way the compiler lowers it
fn eval_compare(op: OpCode, lhs: LuaValue, rhs: LuaValue) -> LuaResult<bool> {
    let main = ProtoBuilder::main()
        .constants(vec![lhs, rhs])
        .code(vec![
            abc(op, 1, k(0), k(1)),
            asbx(OpCode::Jmp, 0, 1),
            abc(OpCode::LoadBool, 0, 0, 1),
            abc(OpCode::LoadBool, 0, 1, 0),
            abc(OpCode::Return, 0, 2, 0),
        ])
        .build();
    let results = run_main(main)?;
    Ok(results[0].to_boolean())
}

#[test]
fn test_numeric_equality_across_representations() {
    assert_eq!(eval_compare(OpCode::Eq, LuaValue::Integer(3), LuaValue::Float(3.0)), Ok(true));
    assert_eq!(eval_compare(OpCode::Eq, LuaValue::Integer(3), LuaValue::Float(3.5)), Ok(false));
    assert_eq!(
        eval_compare(OpCode::Eq, LuaValue::Float(f64::NAN), LuaValue::Float(f64::NAN)),
        Ok(false)
    );
    let big = (1i64 << 53) + 1;
    assert_eq!(
        eval_compare(OpCode::Eq, LuaValue::Integer(big), LuaValue::Float((1i64 << 53) as f64)),
        Ok(false)
    );
}

#[test]
fn test_equality_never_coerces_strings() {
    assert_eq!(eval_compare(OpCode::Eq, LuaValue::Integer(1), LuaValue::string("1")), Ok(false));
    assert_eq!(eval_compare(OpCode::Eq, LuaValue::string("a"), LuaValue::string("a")), Ok(true));
    assert_eq!(eval_compare(OpCode::Eq, LuaValue::Nil, LuaValue::Boolean(false)), Ok(false));
}

#[test]
fn test_string_ordering_is_lexicographic() {
    assert_eq!(eval_compare(OpCode::Lt, LuaValue::string("2"), LuaValue::string("10")), Ok(false));
    assert_eq!(eval_compare(OpCode::Lt, LuaValue::string("10"), LuaValue::string("2")), Ok(true));
    assert_eq!(eval_compare(OpCode::Lt, LuaValue::string("a"), LuaValue::string("ab")), Ok(true));
    assert_eq!(eval_compare(OpCode::Le, LuaValue::string("a"), LuaValue::string("a")), Ok(true));
}

#[test]
fn test_mixed_number_ordering() {
    assert_eq!(eval_compare(OpCode::Lt, LuaValue::Integer(1), LuaValue::Float(1.5)), Ok(true));
    assert_eq!(eval_compare(OpCode::Le, LuaValue::Float(2.0), LuaValue::Integer(2)), Ok(true));
    assert_eq!(eval_compare(OpCode::Lt, LuaValue::Float(2.0), LuaValue::Integer(2)), Ok(false));
    assert_eq!(
        eval_compare(OpCode::Lt, LuaValue::Integer(i64::MAX), LuaValue::Float(f64::INFINITY)),
        Ok(true)
    );
    assert_eq!(
        eval_compare(OpCode::Le, LuaValue::Float(f64::NAN), LuaValue::Integer(0)),
        Ok(false)
    );
}

#[test]
fn test_ordering_mismatched_types_faults() {
    assert_eq!(
        eval_compare(OpCode::Lt, LuaValue::Integer(1), LuaValue::string("2")),
        Err(LuaError::TypeError("attempt to compare number with string".to_string()))
    );
    assert_eq!(
        eval_compare(OpCode::Le, LuaValue::Nil, LuaValue::Nil),
        Err(LuaError::TypeError("attempt to compare two nil values".to_string()))
    );
}

#[test]
fn test_compare_api_on_tables() {
    let mut state = LuaState::new(SafeOption::default());
    state.new_table().unwrap();
    state.new_table().unwrap();
    state.push_value(1).unwrap();

    assert_eq!(state.compare(1, 2, CompareOp::Eq), Ok(false));
    assert_eq!(state.compare(1, 3, CompareOp::Eq), Ok(true));
    assert!(state.raw_equal(1, 3));
    assert!(!state.raw_equal(1, 2));
    assert_eq!(
        state.compare(1, 2, CompareOp::Lt),
        Err(LuaError::TypeError("attempt to compare two table values".to_string()))
    );
    // invalid indices compare false
    assert_eq!(state.compare(1, 9, CompareOp::Eq), Ok(false));
    assert_eq!(state.get_top(), 3);
}
