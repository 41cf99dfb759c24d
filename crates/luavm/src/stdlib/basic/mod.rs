// Basic library (_G global functions)
// Implements: print, getmetatable, setmetatable

use crate::lib_registry::LibraryModule;
use crate::lua_value::LuaValue;
use crate::lua_vm::{LuaError, LuaResult, LuaState};

pub fn create_basic_lib() -> LibraryModule {
    crate::lib_module!("_G", {
        "print" => lua_print,
        "getmetatable" => lua_getmetatable,
        "setmetatable" => lua_setmetatable,
    })
    .with_value("_VERSION", |_| LuaValue::string("Lua 5.3"))
}

/// One `print` line: strings and numbers as text, booleans as words,
/// anything else by type name, separated by tabs
pub fn format_print_line(args: &[LuaValue]) -> String {
    let parts: Vec<String> = args
        .iter()
        .map(|value| match value {
            LuaValue::Boolean(b) => b.to_string(),
            other => match other.to_lua_string() {
                Some(s) => s.to_str_lossy().into_owned(),
                None => other.type_name().to_string(),
            },
        })
        .collect();
    parts.join("\t")
}

/// print(...) - Print values to stdout
fn lua_print(l: &mut LuaState) -> LuaResult<usize> {
    let n = l.get_top();
    let args: Vec<LuaValue> = (1..=n).map(|i| l.get(i)).collect();
    println!("{}", format_print_line(&args));
    Ok(0)
}

/// getmetatable(v) - The metatable of v, or nil
fn lua_getmetatable(l: &mut LuaState) -> LuaResult<usize> {
    if !l.get_metatable(1)? {
        l.push_nil()?;
    }
    Ok(1)
}

/// setmetatable(t, mt) - Set (or with nil, remove) the metatable of table t; returns t
fn lua_setmetatable(l: &mut LuaState) -> LuaResult<usize> {
    if !l.is_table(1) {
        return Err(LuaError::runtime(format!(
            "bad argument #1 to 'setmetatable' (table expected, got {})",
            arg_type_name(l, 1)
        )));
    }
    if !l.is_none_or_nil(2) && !l.is_table(2) {
        return Err(LuaError::runtime(
            "bad argument #2 to 'setmetatable' (nil or table expected)",
        ));
    }
    l.set_top(2)?;
    l.set_metatable(1)?;
    Ok(1)
}

fn arg_type_name(l: &LuaState, idx: i32) -> &'static str {
    if l.is_none(idx) {
        "no value"
    } else {
        l.type_name_at(idx)
    }
}
