//! Return frames, catch frames and the stack primitives.

use std::rc::Rc;

use tern_ir::CodeBlock;

use crate::errors::{
    locals_overflow, return_stack_overflow, stack_overflow, stack_underflow, RuntimeResult,
};
use crate::heap::Gc;
use crate::value::Value;

use super::Runtime;

/// Capacities of the runtime's fixed stacks.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct StackLimits {
    pub operands: usize,
    pub frames: usize,
    pub locals: usize,
}

impl Default for StackLimits {
    fn default() -> Self {
        StackLimits {
            operands: 1024,
            frames: 512,
            locals: 4096,
        }
    }
}

/// An executing block.
#[derive(Debug)]
pub(crate) struct Frame {
    pub code: Rc<CodeBlock>,
    pub ip: usize,
    /// Start of this frame's window on the locals stack.
    pub locals_base: usize,
    /// Active closure context; held for the duration of the call.
    pub closure: Option<Gc>,
    /// Entered from `execute`: its `End` returns to the caller of the loop.
    pub boundary: bool,
}

/// Installed by `Try`: the handlers to search and the depths to restore.
#[derive(Debug)]
pub(crate) struct CatchFrame {
    pub code: Rc<CodeBlock>,
    pub table: usize,
    pub frames_len: usize,
    pub locals_len: usize,
    pub stack_len: usize,
    pub iter_len: usize,
}

impl Runtime {
    /// Push onto the operand stack.
    pub fn push(&mut self, value: Value) -> RuntimeResult<()> {
        if self.stack.len() >= self.limits.operands {
            return Err(stack_overflow());
        }
        self.stack.push(value);
        Ok(())
    }

    /// Pop from the operand stack.
    pub fn pop(&mut self) -> RuntimeResult<Value> {
        self.stack.pop().ok_or_else(stack_underflow)
    }

    /// The value `depth` entries below the top.
    pub fn peek(&self, depth: usize) -> RuntimeResult<&Value> {
        self.stack
            .len()
            .checked_sub(depth + 1)
            .and_then(|i| self.stack.get(i))
            .ok_or_else(stack_underflow)
    }

    /// Enter `code`: open a locals window and move its parameters into it,
    /// first parameter from the deepest argument.
    pub(crate) fn push_frame(
        &mut self,
        code: Rc<CodeBlock>,
        closure: Option<Gc>,
        boundary: bool,
    ) -> RuntimeResult<()> {
        if self.frames.len() >= self.limits.frames {
            return Err(return_stack_overflow());
        }
        let base = self.locals.len();
        let size = usize::from(code.locals);
        if base + size > self.limits.locals {
            return Err(locals_overflow());
        }
        let params = usize::from(code.params);
        let Some(args_start) = self.stack.len().checked_sub(params) else {
            return Err(stack_underflow());
        };
        self.locals.resize(base + size, Value::None);
        for (slot, value) in self.locals[base..].iter_mut().zip(self.stack.drain(args_start..)) {
            *slot = value;
        }
        tracing::trace!(block = code.display_name(), depth = self.frames.len(), "enter");
        self.frames.push(Frame {
            code,
            ip: 0,
            locals_base: base,
            closure,
            boundary,
        });
        Ok(())
    }

    /// Leave the current frame, closing its locals window.
    pub(crate) fn pop_frame(&mut self) -> Option<Frame> {
        let frame = self.frames.pop()?;
        self.locals.truncate(frame.locals_base);
        Some(frame)
    }
}
