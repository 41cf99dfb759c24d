/*----------------------------------------------------------------------
  Table access

  Indexed reads and writes with `__index` / `__newindex` fallback, plus
  the raw and global-table variants of the stack API. A metafield that
  is a function is called; any other value is indexed in turn, up to
  MAXTAGLOOP links.
----------------------------------------------------------------------*/

use crate::lua_value::{LuaTable, LuaType, LuaValue, RustFunction, TableRef};
use crate::lua_vm::lua_limits::MAXTAGLOOP;
use crate::lua_vm::{LuaError, LuaResult, LuaState};

use super::metamethod::TmKind;

fn index_error(value: &LuaValue) -> LuaError {
    LuaError::type_error(format!("attempt to index a {} value", value.type_name()))
}

fn expect_table(value: LuaValue) -> LuaResult<TableRef> {
    match value {
        LuaValue::Table(t) => Ok(t),
        other => Err(LuaError::NotATable(other.type_name())),
    }
}

impl LuaState {
    /// `t[k]` with `__index` fallback
    pub(crate) fn get_table_value(&mut self, t: &LuaValue, k: &LuaValue) -> LuaResult<LuaValue> {
        let mut t = t.clone();
        for _ in 0..MAXTAGLOOP {
            let handler = match &t {
                LuaValue::Table(table) => {
                    let value = table.borrow().get(k);
                    if !value.is_nil() {
                        return Ok(value);
                    }
                    let handler = self.get_metafield(&t, TmKind::Index);
                    if handler.is_nil() {
                        return Ok(LuaValue::Nil);
                    }
                    handler
                }
                other => {
                    let handler = self.get_metafield(other, TmKind::Index);
                    if handler.is_nil() {
                        return Err(index_error(other));
                    }
                    handler
                }
            };
            if handler.is_function() {
                self.check_stack(3)?;
                self.push(handler)?;
                self.push(t)?;
                self.push(k.clone())?;
                self.call(2, 1)?;
                return self.pop_value();
            }
            t = handler;
        }
        Err(LuaError::runtime("'__index' chain too long; possible loop"))
    }

    /// `t[k] = v` with `__newindex` fallback
    pub(crate) fn set_table_value(
        &mut self,
        t: &LuaValue,
        k: LuaValue,
        v: LuaValue,
    ) -> LuaResult<()> {
        let mut t = t.clone();
        for _ in 0..MAXTAGLOOP {
            let handler = match &t {
                LuaValue::Table(table) => {
                    let present = !table.borrow().get(&k).is_nil();
                    let handler = if present {
                        LuaValue::Nil
                    } else {
                        self.get_metafield(&t, TmKind::NewIndex)
                    };
                    if handler.is_nil() {
                        return table.borrow_mut().put(k, v);
                    }
                    handler
                }
                other => {
                    let handler = self.get_metafield(other, TmKind::NewIndex);
                    if handler.is_nil() {
                        return Err(index_error(other));
                    }
                    handler
                }
            };
            if handler.is_function() {
                self.check_stack(4)?;
                self.push(handler)?;
                self.push(t)?;
                self.push(k)?;
                self.push(v)?;
                return self.call(3, 0);
            }
            t = handler;
        }
        Err(LuaError::runtime("'__newindex' chain too long; possible loop"))
    }

    // ===== Table creation =====

    pub fn new_table(&mut self) -> LuaResult<()> {
        self.create_table(0, 0)
    }

    /// Push a new table with room for `n_arr` sequence items and `n_rec` other entries
    pub fn create_table(&mut self, n_arr: usize, n_rec: usize) -> LuaResult<()> {
        self.push(LuaValue::table(LuaTable::new(n_arr, n_rec)))
    }

    // ===== Get functions (Lua -> stack) =====

    /// Pop a key and push `t[key]`, where t is the value at `idx`
    pub fn get_table(&mut self, idx: i32) -> LuaResult<LuaType> {
        let t = self.get(idx);
        let k = self.pop_value()?;
        self.push_indexed(&t, &k)
    }

    pub fn get_field(&mut self, idx: i32, k: &str) -> LuaResult<LuaType> {
        let t = self.get(idx);
        self.push_indexed(&t, &LuaValue::string(k))
    }

    pub fn get_i(&mut self, idx: i32, i: i64) -> LuaResult<LuaType> {
        let t = self.get(idx);
        self.push_indexed(&t, &LuaValue::Integer(i))
    }

    fn push_indexed(&mut self, t: &LuaValue, k: &LuaValue) -> LuaResult<LuaType> {
        let value = self.get_table_value(t, k)?;
        let tp = value.type_of();
        self.push(value)?;
        Ok(tp)
    }

    pub fn raw_get(&mut self, idx: i32) -> LuaResult<LuaType> {
        let t = expect_table(self.get(idx))?;
        let k = self.pop_value()?;
        let value = t.borrow().get(&k);
        let tp = value.type_of();
        self.push(value)?;
        Ok(tp)
    }

    pub fn raw_get_i(&mut self, idx: i32, i: i64) -> LuaResult<LuaType> {
        let t = expect_table(self.get(idx))?;
        let value = t.borrow().get_int(i);
        let tp = value.type_of();
        self.push(value)?;
        Ok(tp)
    }

    pub fn get_global(&mut self, name: &str) -> LuaResult<LuaType> {
        let globals = self.globals();
        self.push_indexed(&globals, &LuaValue::string(name))
    }

    // ===== Set functions (stack -> Lua) =====

    /// Pop a value, then a key, and perform `t[key] = value`
    pub fn set_table(&mut self, idx: i32) -> LuaResult<()> {
        let t = self.get(idx);
        let v = self.pop_value()?;
        let k = self.pop_value()?;
        self.set_table_value(&t, k, v)
    }

    pub fn set_field(&mut self, idx: i32, k: &str) -> LuaResult<()> {
        let t = self.get(idx);
        let v = self.pop_value()?;
        self.set_table_value(&t, LuaValue::string(k), v)
    }

    pub fn set_i(&mut self, idx: i32, i: i64) -> LuaResult<()> {
        let t = self.get(idx);
        let v = self.pop_value()?;
        self.set_table_value(&t, LuaValue::Integer(i), v)
    }

    pub fn raw_set(&mut self, idx: i32) -> LuaResult<()> {
        let t = expect_table(self.get(idx))?;
        let v = self.pop_value()?;
        let k = self.pop_value()?;
        t.borrow_mut().put(k, v)
    }

    pub fn raw_set_i(&mut self, idx: i32, i: i64) -> LuaResult<()> {
        let t = expect_table(self.get(idx))?;
        let v = self.pop_value()?;
        t.borrow_mut().put_int(i, v);
        Ok(())
    }

    /// Pop a value into global `name`
    pub fn set_global(&mut self, name: &str) -> LuaResult<()> {
        let globals = self.globals();
        let v = self.pop_value()?;
        self.set_table_value(&globals, LuaValue::string(name), v)
    }

    /// Bind a native function to global `name`
    pub fn register(&mut self, name: &str, f: RustFunction) -> LuaResult<()> {
        self.push_rust_function(f)?;
        self.set_global(name)
    }
}
