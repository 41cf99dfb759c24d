// Lua table: array segment for keys [1..n] plus a lazily allocated hash segment.
//
// Invariant: an integer key in 1..=array.len() lives in the array segment and
// never also in the hash segment.
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use ahash::RandomState;

use super::{LuaValue, float_to_integer};
use crate::lua_vm::{LuaError, LuaResult};

pub type TableRef = Rc<RefCell<LuaTable>>;

#[derive(Default)]
pub struct LuaTable {
    /// Array part: values for integer keys [1..array.len()]
    array: Vec<LuaValue>,
    /// Hash part, allocated on first use
    hash: Option<HashMap<LuaValue, LuaValue, RandomState>>,
    metatable: Option<TableRef>,
}

/// Floats holding an exact integer are stored under the integer key
#[inline]
fn normalize_key(key: LuaValue) -> LuaValue {
    if let LuaValue::Float(f) = key {
        if let Some(i) = float_to_integer(f) {
            return LuaValue::Integer(i);
        }
    }
    key
}

impl LuaTable {
    /// Create a table with preallocated room for `n_arr` array slots and `n_rec` hash entries
    pub fn new(n_arr: usize, n_rec: usize) -> Self {
        LuaTable {
            array: Vec::with_capacity(n_arr),
            hash: (n_rec > 0).then(|| HashMap::with_capacity_and_hasher(n_rec, RandomState::new())),
            metatable: None,
        }
    }

    pub fn metatable(&self) -> Option<TableRef> {
        self.metatable.clone()
    }

    pub fn set_metatable(&mut self, mt: Option<TableRef>) {
        self.metatable = mt;
    }

    /// Length of the array segment, which is the table's border
    pub fn len(&self) -> usize {
        self.array.len()
    }

    pub fn is_empty(&self) -> bool {
        self.array.is_empty() && self.hash.as_ref().is_none_or(HashMap::is_empty)
    }

    /// Number of entries held by the hash segment
    pub fn hash_len(&self) -> usize {
        self.hash.as_ref().map_or(0, HashMap::len)
    }

    pub fn get(&self, key: &LuaValue) -> LuaValue {
        match key {
            LuaValue::Integer(i) => self.get_int(*i),
            LuaValue::Float(f) => match float_to_integer(*f) {
                Some(i) => self.get_int(i),
                None => self.get_from_hash(key),
            },
            _ => self.get_from_hash(key),
        }
    }

    pub fn get_int(&self, key: i64) -> LuaValue {
        if key >= 1 && key as u64 <= self.array.len() as u64 {
            return self.array[(key - 1) as usize].clone();
        }
        self.get_from_hash(&LuaValue::Integer(key))
    }

    /// Look up a string key, as used for metafields
    pub fn get_str(&self, key: &str) -> LuaValue {
        self.get_from_hash(&LuaValue::string(key))
    }

    fn get_from_hash(&self, key: &LuaValue) -> LuaValue {
        self.hash
            .as_ref()
            .and_then(|hash| hash.get(key))
            .cloned()
            .unwrap_or_default()
    }

    /// Raw assignment. Nil and NaN keys are rejected; a nil value deletes.
    pub fn put(&mut self, key: LuaValue, value: LuaValue) -> LuaResult<()> {
        match key {
            LuaValue::Nil => return Err(LuaError::type_error("table index is nil")),
            LuaValue::Float(f) if f.is_nan() => {
                return Err(LuaError::type_error("table index is NaN"));
            }
            _ => {}
        }
        match normalize_key(key) {
            LuaValue::Integer(i) => self.put_int(i, value),
            key => self.put_in_hash(key, value),
        }
        Ok(())
    }

    pub fn put_int(&mut self, key: i64, value: LuaValue) {
        let arr_len = self.array.len() as i64;
        if key >= 1 && key <= arr_len {
            let trailing_nil = key == arr_len && value.is_nil();
            self.array[(key - 1) as usize] = value;
            if trailing_nil {
                self.shrink_array();
            }
            return;
        }
        if key >= 1 && key == arr_len + 1 {
            if let Some(hash) = &mut self.hash {
                hash.remove(&LuaValue::Integer(key));
            }
            if !value.is_nil() {
                self.array.push(value);
                self.expand_array();
            }
            return;
        }
        self.put_in_hash(LuaValue::Integer(key), value);
    }

    fn put_in_hash(&mut self, key: LuaValue, value: LuaValue) {
        if value.is_nil() {
            if let Some(hash) = &mut self.hash {
                hash.remove(&key);
            }
        } else {
            self.hash
                .get_or_insert_with(|| HashMap::with_hasher(RandomState::new()))
                .insert(key, value);
        }
    }

    /// Drop trailing nils from the array segment
    fn shrink_array(&mut self) {
        while self.array.last().is_some_and(LuaValue::is_nil) {
            self.array.pop();
        }
    }

    /// Pull consecutive integer keys following the array segment out of the hash segment
    fn expand_array(&mut self) {
        let Some(hash) = &mut self.hash else {
            return;
        };
        loop {
            let next = LuaValue::Integer(self.array.len() as i64 + 1);
            match hash.remove(&next) {
                Some(value) => self.array.push(value),
                None => break,
            }
        }
    }
}
