// Lua Values
// Closed tagged representation of every value the VM manipulates

mod chunk;
pub mod chunk_serializer;
mod lua_convert;
mod lua_function;
mod lua_table;

pub use chunk::{Chunk, LocVar, UpvalueDesc};
pub use lua_convert::{
    F2IMode, float_to_integer, float_to_integer_mode, format_float, format_integer,
    parse_float, parse_integer, str_to_number,
};
pub use lua_function::{ClosureBody, LuaClosure, LuaUpvalue, RustFunction, UpvalueRef};
pub use lua_table::{LuaTable, TableRef};

use std::cell::RefCell;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::Rc;

/// Basic type codes, numbered as in `lua.h` so registry keys line up
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i8)]
pub enum LuaType {
    None = -1,
    Nil = 0,
    Boolean = 1,
    Number = 3,
    String = 4,
    Table = 5,
    Function = 6,
}

impl LuaType {
    pub fn name(self) -> &'static str {
        match self {
            LuaType::None => "no value",
            LuaType::Nil => "nil",
            LuaType::Boolean => "boolean",
            LuaType::Number => "number",
            LuaType::String => "string",
            LuaType::Table => "table",
            LuaType::Function => "function",
        }
    }
}

/// Immutable byte string. Lua strings are not required to be UTF-8.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LuaString(Rc<[u8]>);

impl LuaString {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn to_str_lossy(&self) -> std::borrow::Cow<'_, str> {
        String::from_utf8_lossy(&self.0)
    }
}

impl From<&str> for LuaString {
    fn from(s: &str) -> Self {
        LuaString(Rc::from(s.as_bytes()))
    }
}

impl From<String> for LuaString {
    fn from(s: String) -> Self {
        LuaString(Rc::from(s.into_bytes()))
    }
}

impl From<&[u8]> for LuaString {
    fn from(s: &[u8]) -> Self {
        LuaString(Rc::from(s))
    }
}

impl From<Vec<u8>> for LuaString {
    fn from(s: Vec<u8>) -> Self {
        LuaString(Rc::from(s))
    }
}

impl fmt::Debug for LuaString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.to_str_lossy())
    }
}

impl fmt::Display for LuaString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_str_lossy())
    }
}

/// A Lua value.
///
/// Integers and floats are distinct representations of the single `number` type.
/// Tables and functions are shared references: cloning a value aliases the same object.
///
/// `PartialEq`/`Hash` are *structural identity* (the key relation of a table's hash
/// segment): `Integer(1)` and `Float(1.0)` differ here, tables and functions compare
/// by pointer. Language-level equality lives in [`LuaValue::raw_equals`] and the
/// metamethod-aware comparison of the VM.
#[derive(Clone, Default)]
pub enum LuaValue {
    #[default]
    Nil,
    Boolean(bool),
    Integer(i64),
    Float(f64),
    String(LuaString),
    Table(TableRef),
    Function(Rc<LuaClosure>),
}

impl LuaValue {
    // ============ Constructors ============

    pub fn string(s: impl Into<LuaString>) -> Self {
        LuaValue::String(s.into())
    }

    pub fn table(table: LuaTable) -> Self {
        LuaValue::Table(Rc::new(RefCell::new(table)))
    }

    pub fn new_table() -> Self {
        Self::table(LuaTable::default())
    }

    pub fn function(closure: LuaClosure) -> Self {
        LuaValue::Function(Rc::new(closure))
    }

    // ============ Type queries ============

    pub fn type_of(&self) -> LuaType {
        match self {
            LuaValue::Nil => LuaType::Nil,
            LuaValue::Boolean(_) => LuaType::Boolean,
            LuaValue::Integer(_) | LuaValue::Float(_) => LuaType::Number,
            LuaValue::String(_) => LuaType::String,
            LuaValue::Table(_) => LuaType::Table,
            LuaValue::Function(_) => LuaType::Function,
        }
    }

    pub fn type_name(&self) -> &'static str {
        self.type_of().name()
    }

    #[inline]
    pub fn is_nil(&self) -> bool {
        matches!(self, LuaValue::Nil)
    }

    #[inline]
    pub fn is_number(&self) -> bool {
        matches!(self, LuaValue::Integer(_) | LuaValue::Float(_))
    }

    #[inline]
    pub fn is_string(&self) -> bool {
        matches!(self, LuaValue::String(_))
    }

    #[inline]
    pub fn is_table(&self) -> bool {
        matches!(self, LuaValue::Table(_))
    }

    #[inline]
    pub fn is_function(&self) -> bool {
        matches!(self, LuaValue::Function(_))
    }

    pub fn as_table(&self) -> Option<&TableRef> {
        match self {
            LuaValue::Table(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_function(&self) -> Option<&Rc<LuaClosure>> {
        match self {
            LuaValue::Function(f) => Some(f),
            _ => None,
        }
    }

    pub fn as_lua_string(&self) -> Option<&LuaString> {
        match self {
            LuaValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// `false` only for nil and false
    #[inline]
    pub fn to_boolean(&self) -> bool {
        !matches!(self, LuaValue::Nil | LuaValue::Boolean(false))
    }

    /// Primitive equality: numbers compare by mathematical value, tables and
    /// functions by identity. Never consults metamethods.
    pub fn raw_equals(&self, other: &LuaValue) -> bool {
        match (self, other) {
            (LuaValue::Integer(x), LuaValue::Float(y)) | (LuaValue::Float(y), LuaValue::Integer(x)) => {
                float_to_integer(*y) == Some(*x)
            }
            (LuaValue::Float(x), LuaValue::Float(y)) => x == y,
            _ => self == other,
        }
    }
}

impl PartialEq for LuaValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (LuaValue::Nil, LuaValue::Nil) => true,
            (LuaValue::Boolean(a), LuaValue::Boolean(b)) => a == b,
            (LuaValue::Integer(a), LuaValue::Integer(b)) => a == b,
            (LuaValue::Float(a), LuaValue::Float(b)) => a.to_bits() == b.to_bits(),
            (LuaValue::String(a), LuaValue::String(b)) => a == b,
            (LuaValue::Table(a), LuaValue::Table(b)) => Rc::ptr_eq(a, b),
            (LuaValue::Function(a), LuaValue::Function(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl Eq for LuaValue {}

impl Hash for LuaValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            LuaValue::Nil => {}
            LuaValue::Boolean(b) => b.hash(state),
            LuaValue::Integer(i) => i.hash(state),
            LuaValue::Float(f) => f.to_bits().hash(state),
            LuaValue::String(s) => s.hash(state),
            LuaValue::Table(t) => std::ptr::hash(Rc::as_ptr(t), state),
            LuaValue::Function(f) => std::ptr::hash(Rc::as_ptr(f), state),
        }
    }
}

impl From<bool> for LuaValue {
    fn from(b: bool) -> Self {
        LuaValue::Boolean(b)
    }
}

impl From<i64> for LuaValue {
    fn from(i: i64) -> Self {
        LuaValue::Integer(i)
    }
}

impl From<f64> for LuaValue {
    fn from(f: f64) -> Self {
        LuaValue::Float(f)
    }
}

impl From<&str> for LuaValue {
    fn from(s: &str) -> Self {
        LuaValue::string(s)
    }
}

impl From<LuaString> for LuaValue {
    fn from(s: LuaString) -> Self {
        LuaValue::String(s)
    }
}

impl fmt::Display for LuaValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LuaValue::Nil => f.write_str("nil"),
            LuaValue::Boolean(b) => write!(f, "{}", b),
            LuaValue::Integer(i) => f.write_str(&format_integer(*i)),
            LuaValue::Float(n) => f.write_str(&format_float(*n)),
            LuaValue::String(s) => write!(f, "{}", s),
            LuaValue::Table(t) => write!(f, "table: {:p}", Rc::as_ptr(t)),
            LuaValue::Function(c) => write!(f, "function: {:p}", Rc::as_ptr(c)),
        }
    }
}

impl fmt::Debug for LuaValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LuaValue::String(s) => write!(f, "String({:?})", s),
            LuaValue::Integer(i) => write!(f, "Integer({})", i),
            LuaValue::Float(n) => write!(f, "Float({:?})", n),
            other => write!(f, "{}", other),
        }
    }
}
