// Library registration system for native libraries
// Provides a clean way to register Rust functions as Lua globals or library tables

use crate::lua_value::{LuaClosure, LuaTable, LuaValue, RustFunction};
use crate::lua_vm::{LuaResult, LuaState};
use crate::stdlib;

/// Type for value initializers - functions that create values when the module loads
pub type ValueInitializer = fn(&mut LuaState) -> LuaValue;

/// Entry in a library module - can be a function or a value
pub enum LibraryEntry {
    Function(RustFunction),
    Value(ValueInitializer),
}

/// A library module containing multiple functions and values
pub struct LibraryModule {
    pub name: &'static str,
    pub entries: Vec<(&'static str, LibraryEntry)>,
}

impl LibraryModule {
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            entries: Vec::new(),
        }
    }

    pub fn with_function(mut self, name: &'static str, func: RustFunction) -> Self {
        self.entries.push((name, LibraryEntry::Function(func)));
        self
    }

    pub fn with_value(mut self, name: &'static str, value_init: ValueInitializer) -> Self {
        self.entries.push((name, LibraryEntry::Value(value_init)));
        self
    }
}

/// Builder for creating library modules of functions
#[macro_export]
macro_rules! lib_module {
    ($name:expr, {
        $($item_name:expr => $item:expr),* $(,)?
    }) => {{
        let mut module = $crate::lib_registry::LibraryModule::new($name);
        $(
            module.entries.push(($item_name, $crate::lib_registry::LibraryEntry::Function($item)));
        )*
        module
    }};
}

/// Registry of native libraries, loaded in insertion order
pub struct LibraryRegistry {
    modules: Vec<LibraryModule>,
}

impl LibraryRegistry {
    pub fn new() -> Self {
        Self {
            modules: Vec::new(),
        }
    }

    pub fn register(&mut self, module: LibraryModule) {
        self.modules.push(module);
    }

    /// Load all registered libraries into a state
    pub fn load_all(&self, state: &mut LuaState) -> LuaResult<()> {
        for module in &self.modules {
            self.load_module(state, module)?;
        }
        Ok(())
    }

    /// The `_G` module binds its entries as globals; any other module
    /// becomes a global table named after it.
    pub fn load_module(&self, state: &mut LuaState, module: &LibraryModule) -> LuaResult<()> {
        tracing::debug!(module = module.name, entries = module.entries.len(), "load library");
        if module.name == "_G" {
            for (name, entry) in &module.entries {
                let value = entry_value(state, entry);
                state.check_stack(1)?;
                state.push(value)?;
                state.set_global(name)?;
            }
            return Ok(());
        }

        let mut lib_table = LuaTable::new(0, module.entries.len());
        for (name, entry) in &module.entries {
            let value = entry_value(state, entry);
            lib_table.put(LuaValue::string(*name), value)?;
        }
        state.check_stack(1)?;
        state.push(LuaValue::table(lib_table))?;
        state.set_global(module.name)
    }

    pub fn get_module(&self, name: &str) -> Option<&LibraryModule> {
        self.modules.iter().find(|m| m.name == name)
    }
}

fn entry_value(state: &mut LuaState, entry: &LibraryEntry) -> LuaValue {
    match entry {
        LibraryEntry::Function(func) => LuaValue::function(LuaClosure::rust(*func, Vec::new())),
        LibraryEntry::Value(value_init) => value_init(state),
    }
}

impl Default for LibraryRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// The libraries `LuaVM::open_libs` installs
pub fn create_standard_registry() -> LibraryRegistry {
    let mut registry = LibraryRegistry::new();
    registry.register(stdlib::basic::create_basic_lib());
    registry
}
