// Stack API: index addressing, manipulation, conversions, pseudo-indices
use crate::lua_vm::lua_limits::{LUA_REGISTRYINDEX, upvalue_index};
use crate::*;

fn state_with(values: &[i64]) -> LuaState {
    let mut state = LuaState::new(SafeOption::default());
    for &v in values {
        state.push_integer(v).unwrap();
    }
    state
}

fn contents(state: &LuaState) -> Vec<i64> {
    (1..=state.get_top()).map(|i| state.to_integer(i)).collect()
}

#[test]
fn test_rotate() {
    let mut state = state_with(&[1, 2, 3, 4]);
    state.rotate(1, 1).unwrap();
    assert_eq!(contents(&state), vec![4, 1, 2, 3]);
    state.rotate(-4, -1).unwrap();
    assert_eq!(contents(&state), vec![1, 2, 3, 4]);
    state.rotate(2, 2).unwrap();
    assert_eq!(contents(&state), vec![1, 3, 4, 2]);
    assert_eq!(state.rotate(5, 1), Err(LuaError::InvalidIndex(5)));
}

#[test]
fn test_insert_remove_replace_copy() {
    let mut state = state_with(&[1, 2, 3]);
    state.push_integer(9).unwrap();
    state.insert(2).unwrap();
    assert_eq!(contents(&state), vec![1, 9, 2, 3]);

    state.remove(1).unwrap();
    assert_eq!(contents(&state), vec![9, 2, 3]);

    state.push_integer(7).unwrap();
    state.replace(-2).unwrap();
    assert_eq!(contents(&state), vec![9, 7, 3]);

    state.copy(1, 3).unwrap();
    assert_eq!(contents(&state), vec![9, 7, 9]);

    state.push_value(-2).unwrap();
    assert_eq!(contents(&state), vec![9, 7, 9, 7]);
}

#[test]
fn test_set_top_and_abs_index() {
    let mut state = state_with(&[1, 2]);
    state.set_top(4).unwrap();
    assert_eq!(state.get_top(), 4);
    assert!(state.is_nil(3));
    assert!(state.is_nil(4));
    assert_eq!(state.abs_index(-1), 4);

    state.set_top(-3).unwrap();
    assert_eq!(contents(&state), vec![1, 2]);
    state.set_top(0).unwrap();
    assert_eq!(state.get_top(), 0);
    assert_eq!(state.pop(1), Err(LuaError::StackUnderflow));
}

#[test]
fn test_invalid_indices() {
    let mut state = state_with(&[1]);
    assert!(state.is_none(2));
    assert!(state.is_none_or_nil(0));
    assert_eq!(state.type_name_at(5), "no value");
    assert_eq!(state.set_top(-3), Err(LuaError::StackUnderflow));
    // the value is popped before the write is rejected
    assert_eq!(state.replace(3), Err(LuaError::InvalidIndex(3)));
    assert_eq!(state.get_top(), 0);
}

#[test]
fn test_check_stack_limit() {
    let mut state = LuaState::new(SafeOption {
        max_stack_size: 8,
        ..SafeOption::default()
    });
    state.check_stack(8).unwrap();
    for i in 0..8 {
        state.push_integer(i).unwrap();
    }
    assert_eq!(state.check_stack(1), Err(LuaError::StackOverflow));
}

#[test]
fn test_access_and_conversion() {
    let mut state = LuaState::new(SafeOption::default());
    state.push_integer(3).unwrap();
    state.push_number(2.5).unwrap();
    state.push_string("0x10").unwrap();
    state.push_string("abc").unwrap();
    state.push_boolean(false).unwrap();
    state.push_nil().unwrap();

    assert!(state.is_integer(1));
    assert!(!state.is_integer(2));
    assert!(state.is_number(3));
    assert!(!state.is_number(4));
    assert!(state.is_string(1));
    assert!(state.is_boolean(5));
    assert_eq!(state.type_of(6), LuaType::Nil);

    assert_eq!(state.to_integer_x(3), Some(16));
    assert_eq!(state.to_integer_x(2), None);
    assert_eq!(state.to_number_x(1), Some(3.0));
    assert_eq!(state.to_number(4), 0.0);
    assert!(!state.to_boolean(5));
    assert!(!state.to_boolean(6));
    assert!(state.to_boolean(1));

    // converting a number rewrites its slot
    assert_eq!(state.to_string_x(2).unwrap().as_bytes(), b"2.5");
    assert_eq!(state.type_of(2), LuaType::String);
    assert!(state.to_string_x(5).is_none());
}

#[test]
fn test_raw_equal() {
    let mut state = LuaState::new(SafeOption::default());
    state.push_integer(1).unwrap();
    state.push_number(1.0).unwrap();
    state.push_string("1").unwrap();
    assert!(state.raw_equal(1, 2));
    assert!(!state.raw_equal(1, 3));
    assert!(!state.raw_equal(1, 9));
}

fn counter(state: &mut LuaState) -> LuaResult<usize> {
    let n = state.to_integer(upvalue_index(1)) + 1;
    state.push_integer(n)?;
    state.copy(-1, upvalue_index(1))?;
    Ok(1)
}

#[test]
fn test_native_closure_upvalues() {
    let mut state = LuaState::new(SafeOption::default());
    state.push_integer(0).unwrap();
    state.push_rust_closure(counter, 1).unwrap();
    assert_eq!(state.get_top(), 1);
    for expected in 1..=3 {
        state.push_value(1).unwrap();
        state.call(0, 1).unwrap();
        assert_eq!(state.to_integer(-1), expected);
        state.pop(1).unwrap();
    }
}

#[test]
fn test_registry_pseudo_index() {
    let mut state = LuaState::new(SafeOption::default());
    assert!(state.is_table(LUA_REGISTRYINDEX));
    state.push_string("stored").unwrap();
    state.set_field(LUA_REGISTRYINDEX, "key").unwrap();
    state.get_field(LUA_REGISTRYINDEX, "key").unwrap();
    assert_eq!(state.to_string_x(-1).unwrap().as_bytes(), b"stored");

    // registry slot 2 holds the globals
    state.raw_get_i(LUA_REGISTRYINDEX, 2).unwrap();
    state.push_global_table().unwrap();
    assert!(state.raw_equal(-1, -2));
    // host frame has no running closure, so no upvalues
    assert!(state.is_none(upvalue_index(1)));
}
