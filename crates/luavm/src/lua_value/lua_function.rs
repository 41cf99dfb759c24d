use std::cell::RefCell;
use std::rc::Rc;

use super::{Chunk, LuaValue};
use crate::lua_vm::{LuaResult, LuaState};

/// Native function: receives the state whose current frame holds exactly its
/// arguments, leaves its results on top and returns how many there are.
pub type RustFunction = fn(&mut LuaState) -> LuaResult<usize>;

/// Upvalue state - either open (aliasing a frame register) or closed (owning its value)
#[derive(Debug, Clone)]
pub enum UpvalueState {
    Open {
        /// Depth of the owning frame in the call stack
        frame: usize,
        register: usize,
    },
    Closed(LuaValue),
}

/// Shared variable cell captured by closures
#[derive(Debug)]
pub struct LuaUpvalue {
    state: RefCell<UpvalueState>,
}

pub type UpvalueRef = Rc<LuaUpvalue>;

impl LuaUpvalue {
    pub fn new_open(frame: usize, register: usize) -> UpvalueRef {
        Rc::new(LuaUpvalue {
            state: RefCell::new(UpvalueState::Open { frame, register }),
        })
    }

    pub fn new_closed(value: LuaValue) -> UpvalueRef {
        Rc::new(LuaUpvalue {
            state: RefCell::new(UpvalueState::Closed(value)),
        })
    }

    pub fn is_open(&self) -> bool {
        matches!(*self.state.borrow(), UpvalueState::Open { .. })
    }

    /// Detach from the frame, keeping `value` as the cell's own copy
    pub fn close(&self, value: LuaValue) {
        *self.state.borrow_mut() = UpvalueState::Closed(value);
    }

    pub fn get_value(&self, state: &LuaState) -> LuaValue {
        match &*self.state.borrow() {
            UpvalueState::Open { frame, register } => state
                .frame_at(*frame)
                .and_then(|f| f.slot(*register))
                .unwrap_or_default(),
            UpvalueState::Closed(value) => value.clone(),
        }
    }

    pub fn set_value(&self, state: &mut LuaState, value: LuaValue) {
        let (frame, register) = match &mut *self.state.borrow_mut() {
            UpvalueState::Open { frame, register } => (*frame, *register),
            UpvalueState::Closed(slot) => {
                *slot = value;
                return;
            }
        };
        if let Some(f) = state.frame_at_mut(frame) {
            f.set_slot(register, value);
        }
    }
}

#[derive(Clone)]
pub enum ClosureBody {
    Lua(Rc<Chunk>),
    Rust(RustFunction),
}

/// A Lua or native function together with its upvalues
pub struct LuaClosure {
    pub body: ClosureBody,
    pub upvalues: Vec<UpvalueRef>,
}

impl LuaClosure {
    pub fn lua(chunk: Rc<Chunk>, upvalues: Vec<UpvalueRef>) -> Self {
        LuaClosure {
            body: ClosureBody::Lua(chunk),
            upvalues,
        }
    }

    pub fn rust(func: RustFunction, upvalues: Vec<UpvalueRef>) -> Self {
        LuaClosure {
            body: ClosureBody::Rust(func),
            upvalues,
        }
    }

    pub fn chunk(&self) -> Option<&Rc<Chunk>> {
        match &self.body {
            ClosureBody::Lua(chunk) => Some(chunk),
            ClosureBody::Rust(_) => None,
        }
    }

    pub fn is_rust(&self) -> bool {
        matches!(self.body, ClosureBody::Rust(_))
    }
}
