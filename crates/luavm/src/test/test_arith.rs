// Arithmetic and bitwise operators: coercion paths and integer edge cases
use proptest::prelude::*;

use super::chunk_builder::*;
use crate::lua_vm::{ArithOp, OpCode, lua_idiv, lua_imod};
use crate::*;

fn int(i: i64) -> LuaValue {
    LuaValue::Integer(i)
}

fn flt(f: f64) -> LuaValue {
    LuaValue::Float(f)
}

#[test]
fn test_integer_path_needs_two_integers() {
    assert_eq!(eval_binary(OpCode::Add, int(5), int(2)), Ok(int(7)));
    assert_eq!(eval_binary(OpCode::Add, int(1), LuaValue::string("2.0")), Ok(flt(3.0)));
    assert_eq!(eval_binary(OpCode::Add, LuaValue::string("2"), int(1)), Ok(flt(3.0)));
    assert_eq!(eval_binary(OpCode::Mul, int(3), flt(0.5)), Ok(flt(1.5)));
    assert_eq!(eval_binary(OpCode::Sub, int(i64::MIN), int(1)), Ok(int(i64::MAX)));
    assert_eq!(eval_binary(OpCode::Add, int(i64::MAX), int(1)), Ok(int(i64::MIN)));
}

#[test]
fn test_division_and_power_are_float() {
    assert_eq!(eval_binary(OpCode::Div, int(7), int(2)), Ok(flt(3.5)));
    assert_eq!(eval_binary(OpCode::Div, int(1), int(0)), Ok(flt(f64::INFINITY)));
    assert_eq!(eval_binary(OpCode::Pow, int(2), int(10)), Ok(flt(1024.0)));
    assert_eq!(eval_binary(OpCode::Pow, LuaValue::string("4"), flt(0.5)), Ok(flt(2.0)));
}

#[test]
fn test_floor_division_and_modulo() {
    assert_eq!(eval_binary(OpCode::IDiv, int(7), int(2)), Ok(int(3)));
    assert_eq!(eval_binary(OpCode::IDiv, int(-7), int(2)), Ok(int(-4)));
    assert_eq!(eval_binary(OpCode::IDiv, flt(7.0), int(2)), Ok(flt(3.0)));
    assert_eq!(eval_binary(OpCode::IDiv, int(1), flt(0.0)), Ok(flt(f64::INFINITY)));
    assert_eq!(eval_binary(OpCode::Mod, int(-7), int(3)), Ok(int(2)));
    assert_eq!(eval_binary(OpCode::Mod, int(7), int(-3)), Ok(int(-2)));
    assert_eq!(eval_binary(OpCode::Mod, flt(5.5), flt(-2.0)), Ok(flt(-0.5)));
    assert_eq!(eval_binary(OpCode::IDiv, int(i64::MIN), int(-1)), Ok(int(i64::MIN)));
}

#[test]
fn test_integer_division_by_zero() {
    assert_eq!(
        eval_binary(OpCode::IDiv, int(1), int(0)),
        Err(LuaError::RuntimeError("attempt to perform 'n//0'".to_string()))
    );
    assert_eq!(
        eval_binary(OpCode::Mod, int(1), int(0)),
        Err(LuaError::RuntimeError("attempt to perform 'n%%0'".to_string()))
    );
}

#[test]
fn test_bitwise_operators() {
    assert_eq!(eval_binary(OpCode::BAnd, int(6), int(3)), Ok(int(2)));
    assert_eq!(eval_binary(OpCode::BOr, int(6), int(3)), Ok(int(7)));
    assert_eq!(eval_binary(OpCode::BXor, int(6), int(3)), Ok(int(5)));
    assert_eq!(eval_binary(OpCode::BAnd, LuaValue::string("3"), flt(5.0)), Ok(int(1)));
    assert_eq!(eval_binary(OpCode::Shl, int(1), int(62)), Ok(int(1 << 62)));
    assert_eq!(eval_binary(OpCode::Shl, int(1), int(64)), Ok(int(0)));
    assert_eq!(eval_binary(OpCode::Shl, int(8), int(-2)), Ok(int(2)));
    assert_eq!(eval_binary(OpCode::Shr, int(-1), int(1)), Ok(int(i64::MAX)));
    assert_eq!(eval_binary(OpCode::Shr, int(-1), int(64)), Ok(int(0)));
    assert_eq!(eval_binary(OpCode::Shr, int(1), int(-63)), Ok(int(i64::MIN)));
}

#[test]
fn test_bitwise_rejects_fractional_numbers() {
    assert_eq!(
        eval_binary(OpCode::BOr, flt(1.5), int(1)),
        Err(LuaError::TypeError("number has no integer representation".to_string()))
    );
    assert_eq!(
        eval_binary(OpCode::BOr, LuaValue::string("x"), int(1)),
        Err(LuaError::TypeError(
            "attempt to perform bitwise operation on a string value".to_string()
        ))
    );
}

#[test]
fn test_unary_operators() {
    let main = ProtoBuilder::main()
        .registers(3)
        .constants(vec![int(5), LuaValue::string("3")])
        .code(vec![
            abx(OpCode::LoadK, 0, 0),
            abc(OpCode::Unm, 0, 0, 0),
            abx(OpCode::LoadK, 1, 1),
            abc(OpCode::BNot, 1, 1, 0),
            abx(OpCode::LoadK, 2, 1),
            abc(OpCode::Unm, 2, 2, 0),
            abc(OpCode::Return, 0, 4, 0),
        ])
        .build();
    assert_eq!(run_main(main).unwrap(), vec![int(-5), int(-4), flt(-3.0)]);
}

#[test]
fn test_arith_on_stack() {
    let mut state = LuaState::new(SafeOption::default());
    state.push_integer(7).unwrap();
    state.push_number(2.0).unwrap();
    state.arith(ArithOp::Div).unwrap();
    assert_eq!(state.get_top(), 1);
    assert_eq!(state.to_number_x(-1), Some(3.5));

    state.arith(ArithOp::Unm).unwrap();
    assert_eq!(state.get_top(), 1);
    assert_eq!(state.to_number_x(-1), Some(-3.5));

    state.push_nil().unwrap();
    assert_eq!(
        state.arith(ArithOp::Add),
        Err(LuaError::TypeError(
            "attempt to perform arithmetic on a nil value".to_string()
        ))
    );
}

proptest! {
    #[test]
    fn prop_floor_division_identity(a in any::<i64>(), b in any::<i64>().prop_filter("non-zero", |b| *b != 0)) {
        let q = lua_idiv(a, b).unwrap();
        let r = lua_imod(a, b).unwrap();
        prop_assert_eq!(b.wrapping_mul(q).wrapping_add(r), a);
        prop_assert!(r == 0 || (r < 0) == (b < 0));
        prop_assert!(r.unsigned_abs() < b.unsigned_abs());
    }
}
