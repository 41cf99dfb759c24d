/// Metamethod resolution
///
/// Looks up tag methods on a value's metatable (its own for tables, the
/// per-type registry entry for everything else) and invokes them through
/// the regular call protocol. Based on Lua 5.3 ltm.c
use crate::lua_value::{LuaType, LuaValue, TableRef};
use crate::lua_vm::{LuaError, LuaResult, LuaState};

/// Tag Method types (TMS from ltm.h)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum TmKind {
    Index = 0,
    NewIndex,
    Len,
    Eq,
    Add,
    Sub,
    Mul,
    Mod,
    Pow,
    Div,
    IDiv,
    Band,
    Bor,
    Bxor,
    Shl,
    Shr,
    Unm,
    Bnot,
    Lt,
    Le,
    Concat,
}

impl TmKind {
    pub const fn name(self) -> &'static str {
        match self {
            TmKind::Index => "__index",
            TmKind::NewIndex => "__newindex",
            TmKind::Len => "__len",
            TmKind::Eq => "__eq",
            TmKind::Add => "__add",
            TmKind::Sub => "__sub",
            TmKind::Mul => "__mul",
            TmKind::Mod => "__mod",
            TmKind::Pow => "__pow",
            TmKind::Div => "__div",
            TmKind::IDiv => "__idiv",
            TmKind::Band => "__band",
            TmKind::Bor => "__bor",
            TmKind::Bxor => "__bxor",
            TmKind::Shl => "__shl",
            TmKind::Shr => "__shr",
            TmKind::Unm => "__unm",
            TmKind::Bnot => "__bnot",
            TmKind::Lt => "__lt",
            TmKind::Le => "__le",
            TmKind::Concat => "__concat",
        }
    }
}

/// Registry key of the shared metatable for a non-table type
fn type_metatable_key(tp: LuaType) -> LuaValue {
    LuaValue::string(format!("_MT{}", tp as i8))
}

impl LuaState {
    pub(crate) fn metatable_of(&self, value: &LuaValue) -> Option<TableRef> {
        match value {
            LuaValue::Table(t) => t.borrow().metatable(),
            other => self
                .registry()
                .borrow()
                .get(&type_metatable_key(other.type_of()))
                .as_table()
                .cloned(),
        }
    }

    pub(crate) fn set_metatable_of(
        &mut self,
        value: &LuaValue,
        mt: Option<TableRef>,
    ) -> LuaResult<()> {
        match value {
            LuaValue::Table(t) => {
                t.borrow_mut().set_metatable(mt);
                Ok(())
            }
            other => {
                let key = type_metatable_key(other.type_of());
                let mt = mt.map(LuaValue::Table).unwrap_or_default();
                self.registry().borrow_mut().put(key, mt)
            }
        }
    }

    /// Field `event` of the value's metatable, nil when absent
    pub(crate) fn get_metafield(&self, value: &LuaValue, event: TmKind) -> LuaValue {
        self.metatable_of(value)
            .map(|mt| mt.borrow().get_str(event.name()))
            .unwrap_or_default()
    }

    /// Try `event` on `a`, then on `b`. When found, call it with `(a, b)` and one result.
    /// `Ok(None)` means neither operand provides it.
    pub(crate) fn call_metamethod(
        &mut self,
        a: &LuaValue,
        b: &LuaValue,
        event: TmKind,
    ) -> LuaResult<Option<LuaValue>> {
        let mut mm = self.get_metafield(a, event);
        if mm.is_nil() {
            mm = self.get_metafield(b, event);
            if mm.is_nil() {
                return Ok(None);
            }
        }
        tracing::trace!(event = event.name(), "call metamethod");
        self.check_stack(4)?;
        self.push(mm)?;
        self.push(a.clone())?;
        self.push(b.clone())?;
        self.call(2, 1)?;
        self.pop_value().map(Some)
    }

    // ===== Metatable API =====

    /// Push the metatable of the value at `idx`; false (nothing pushed) when it has none
    pub fn get_metatable(&mut self, idx: i32) -> LuaResult<bool> {
        let value = self.get(idx);
        match self.metatable_of(&value) {
            Some(mt) => {
                self.push(LuaValue::Table(mt))?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Pop a table (or nil) and make it the metatable of the value at `idx`
    pub fn set_metatable(&mut self, idx: i32) -> LuaResult<()> {
        let value = self.get(idx);
        let mt = match self.pop_value()? {
            LuaValue::Nil => None,
            LuaValue::Table(t) => Some(t),
            other => return Err(LuaError::NotATable(other.type_name())),
        };
        self.set_metatable_of(&value, mt)
    }
}
