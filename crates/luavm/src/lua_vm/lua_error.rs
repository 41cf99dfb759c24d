/// Every fault the VM can raise.
/// Execution never recovers internally: the error unwinds to whoever started the call.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LuaError {
    /// Pushing past a frame's capacity, or nesting calls beyond the configured depth
    #[error("stack overflow")]
    StackOverflow,
    /// Popping more values than the frame holds
    #[error("stack underflow")]
    StackUnderflow,
    /// Writing to a stack index outside the frame
    #[error("invalid stack index {0}")]
    InvalidIndex(i64),
    /// Arithmetic, comparison, concatenation, length or indexing with no applicable metamethod
    #[error("{0}")]
    TypeError(String),
    #[error("attempt to call a {0} value")]
    NotCallable(&'static str),
    #[error("table expected, got {0}")]
    NotATable(&'static str),
    #[error("bad binary chunk: {0}")]
    ChunkFormat(String),
    #[error("unimplemented opcode {0}")]
    UnimplementedOpcode(u8),
    #[error("{0}")]
    RuntimeError(String),
}

pub type LuaResult<T> = Result<T, LuaError>;

impl LuaError {
    pub(crate) fn type_error(msg: impl Into<String>) -> Self {
        LuaError::TypeError(msg.into())
    }

    pub(crate) fn runtime(msg: impl Into<String>) -> Self {
        LuaError::RuntimeError(msg.into())
    }

    pub(crate) fn chunk(msg: impl Into<String>) -> Self {
        LuaError::ChunkFormat(msg.into())
    }
}
