use super::lua_limits::{LUAI_MAXSTACK, MAX_CALL_DEPTH};

#[derive(Debug, Clone)]
pub struct SafeOption {
    /// Largest number of slots a single frame may grow to
    pub max_stack_size: usize,
    /// Largest number of active call frames before `StackOverflow`
    pub max_call_depth: usize,
}

impl Default for SafeOption {
    fn default() -> Self {
        Self {
            max_stack_size: LUAI_MAXSTACK,
            max_call_depth: MAX_CALL_DEPTH,
        }
    }
}
