//! Centralized Lua VM limits and configuration constants.
//!
//! Mirrors Lua 5.3's `luaconf.h` / `llimits.h` / `lua.h` values.

// ===== Stack =====

/// Minimum guaranteed stack slots available to every frame above its registers.
pub const LUA_MINSTACK: usize = 20;

/// Default maximum size of a single frame (number of slots).
pub const LUAI_MAXSTACK: usize = 1_000_000;

/// Pseudo-index addressing the registry table.
pub const LUA_REGISTRYINDEX: i32 = -(LUAI_MAXSTACK as i32) - 1000;

/// Registry slot holding the globals table.
pub const LUA_RIDX_GLOBALS: i64 = 2;

/// "Keep every result" marker for call result counts.
pub const LUA_MULTRET: i32 = -1;

/// Default maximum number of active call frames.
pub const MAX_CALL_DEPTH: usize = 20_000;

/// Maximum nesting of calls that re-enter the VM from Rust: host calls,
/// native callbacks and metamethods.
pub const LUAI_MAXCCALLS: usize = 200;

// ===== Tables / metatables =====

/// Number of list items to flush per SETLIST instruction.
pub const LFIELDS_PER_FLUSH: i64 = 50;

/// Maximum length of an `__index` / `__newindex` chain.
pub const MAXTAGLOOP: usize = 2000;

/// Pseudo-index of the running closure's i-th upvalue (1-based).
#[inline]
pub const fn upvalue_index(i: i32) -> i32 {
    LUA_REGISTRYINDEX - i
}
