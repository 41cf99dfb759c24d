/// Call protocol
///
/// `call` expects the callee at `-(n_args + 1)` with its arguments above it,
/// runs it in a fresh frame and leaves `n_results` values in place of the
/// callee and arguments (every result when `n_results < 0`).
///
/// CALL and TAILCALL do not recurse into the dispatch loop for a Lua
/// callee: they push its frame with a `CallSite` and the loop continues
/// there until RETURN pops it. Only `call` (hosts, native functions,
/// metamethods, generic `for` iterators) nests on the Rust stack, bounded
/// by `LUAI_MAXCCALLS`. Every frame pushed for a call is popped again on
/// both the normal and the error path.
use std::rc::Rc;

use crate::lua_value::chunk_serializer::undump;
use crate::lua_value::{Chunk, ClosureBody, LuaClosure, LuaUpvalue, LuaValue, RustFunction};
use crate::lua_vm::lua_call_frame::{CallSite, LuaCallFrame};
use crate::lua_vm::lua_limits::{LUA_MINSTACK, LUAI_MAXCCALLS};
use crate::lua_vm::{Instruction, LuaError, LuaResult, LuaState};

impl LuaState {
    pub fn call(&mut self, n_args: usize, n_results: i32) -> LuaResult<()> {
        if self.native_depth >= LUAI_MAXCCALLS {
            return Err(LuaError::StackOverflow);
        }
        self.native_depth += 1;
        let status = self.call_nested(n_args, n_results);
        self.native_depth -= 1;
        status
    }

    fn call_nested(&mut self, n_args: usize, n_results: i32) -> LuaResult<()> {
        let closure = self.callee(n_args)?;
        match closure.body.clone() {
            ClosureBody::Lua(chunk) => {
                let base = self.call_depth();
                let status = self
                    .push_lua_frame(n_args, closure, chunk, None)
                    .and_then(|()| self.run_lua_closure())
                    .and_then(|()| self.post_lua_call(n_results));
                if status.is_err() {
                    self.unwind_frames(base);
                }
                status
            }
            ClosureBody::Rust(f) => self.call_rust_closure(n_args, n_results, closure, f),
        }
    }

    /// Start the call made by a CALL or TAILCALL instruction. A Lua callee
    /// gets a frame the dispatch loop continues in; a native callee runs to
    /// completion and its results are stored at once.
    pub(crate) fn precall(&mut self, n_args: usize, site: CallSite) -> LuaResult<()> {
        let closure = self.callee(n_args)?;
        match closure.body.clone() {
            ClosureBody::Lua(chunk) => self.push_lua_frame(n_args, closure, chunk, Some(site)),
            ClosureBody::Rust(f) => {
                self.call_rust_closure(n_args, site.c - 1, closure, f)?;
                self.pop_results(site.a, site.c)
            }
        }
    }

    /// Pop a finished Lua frame and push its results onto the caller
    pub(crate) fn post_lua_call(&mut self, n_results: i32) -> LuaResult<()> {
        let mut frame = self.pop_frame()?;
        if n_results != 0 {
            let n = frame.top.saturating_sub(frame.register_count());
            let results = frame.pop_n(n)?;
            self.push_results(results, n_results)?;
        }
        Ok(())
    }

    fn callee(&self, n_args: usize) -> LuaResult<Rc<LuaClosure>> {
        match self.get(-(n_args as i32 + 1)) {
            LuaValue::Function(closure) => Ok(closure),
            other => Err(LuaError::NotCallable(other.type_name())),
        }
    }

    fn unwind_frames(&mut self, base: usize) {
        while self.call_depth() > base && self.pop_frame().is_ok() {}
    }

    fn push_lua_frame(
        &mut self,
        n_args: usize,
        closure: Rc<LuaClosure>,
        chunk: Rc<Chunk>,
        call_site: Option<CallSite>,
    ) -> LuaResult<()> {
        let n_regs = chunk.max_stack_size as usize;
        let n_params = chunk.num_params as usize;
        let mut frame = LuaCallFrame::new(n_regs + LUA_MINSTACK, Some(closure));
        frame.call_site = call_site;

        let mut args = self.frame_mut().pop_n(n_args)?;
        self.pop(1)?;
        if args.len() > n_params {
            let extra = args.split_off(n_params);
            if chunk.is_vararg {
                frame.varargs = extra;
            }
        }
        frame.push_n(args, n_params as i32)?;
        frame.top = n_regs;

        tracing::debug!(
            source = chunk.source_name(),
            line = chunk.line_defined,
            n_args,
            depth = self.call_depth() + 1,
            "call lua function"
        );

        self.push_frame(frame)
    }

    fn call_rust_closure(
        &mut self,
        n_args: usize,
        n_results: i32,
        closure: Rc<LuaClosure>,
        f: RustFunction,
    ) -> LuaResult<()> {
        let mut frame = LuaCallFrame::new(n_args + LUA_MINSTACK, Some(closure));
        let args = self.frame_mut().pop_n(n_args)?;
        self.pop(1)?;
        frame.push_n(args, n_args as i32)?;

        tracing::debug!(n_args, n_results, depth = self.call_depth() + 1, "call rust function");

        self.push_frame(frame)?;
        let status = f(self);
        let mut frame = self.pop_frame()?;
        let r = status?;

        if n_results != 0 {
            let results = frame.pop_n(r)?;
            self.push_results(results, n_results)?;
        }
        Ok(())
    }

    /// Push call results onto the caller, truncated or nil-padded to `n_results`
    fn push_results(&mut self, results: Vec<LuaValue>, n_results: i32) -> LuaResult<()> {
        let wanted = if n_results < 0 {
            results.len()
        } else {
            n_results as usize
        };
        self.check_stack(wanted)?;
        self.frame_mut().push_n(results, n_results)
    }

    /// Undump a binary chunk and push its main function.
    /// The first upvalue of the main function is the globals table.
    pub fn load(&mut self, chunk: &[u8], chunk_name: &str) -> LuaResult<()> {
        let proto = undump(chunk)?;
        tracing::debug!(
            chunk_name,
            source = proto.source_name(),
            instructions = proto.code.len(),
            constants = proto.constants.len(),
            protos = proto.child_protos.len(),
            "load chunk"
        );
        let globals = self.globals();
        let upvalues = (0..proto.upvalue_descs.len())
            .map(|i| {
                if i == 0 {
                    LuaUpvalue::new_closed(globals.clone())
                } else {
                    LuaUpvalue::new_closed(LuaValue::Nil)
                }
            })
            .collect();
        self.push(LuaValue::function(LuaClosure::lua(proto, upvalues)))
    }
}

/// CALL A B C
/// R(A), ... ,R(A+C-2) := R(A)(R(A+1), ... ,R(A+B-1))
pub fn exec_call(lua_state: &mut LuaState, instr: Instruction) -> LuaResult<()> {
    let a = instr.get_a() as i32 + 1;
    let b = instr.get_b() as i32;
    let c = instr.get_c() as i32;
    let n_args = lua_state.push_func_and_args(a, b)?;
    lua_state.precall(n_args, CallSite { a, c })
}

/// TAILCALL A B C
/// return R(A)(R(A+1), ... ,R(A+B-1))
/// Runs as a call keeping every result; the RETURN that follows hands them on.
pub fn exec_tailcall(lua_state: &mut LuaState, instr: Instruction) -> LuaResult<()> {
    let a = instr.get_a() as i32 + 1;
    let b = instr.get_b() as i32;
    let n_args = lua_state.push_func_and_args(a, b)?;
    lua_state.precall(n_args, CallSite { a, c: 0 })
}
