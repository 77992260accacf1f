//! Per-level compile state: one context for the top level, one per word
//! definition, one per open lambda.

use std::rc::Rc;

use tern_ir::{CaptureSource, CatchTable, CodeBlock, Op, SourcePos};

use crate::errors::CompileErrorKind;

/// Instructions per block, `End` excluded.
pub(crate) const MAX_OPS: usize = 4096;
/// Locals per block, parameters included.
pub(crate) const MAX_LOCALS: usize = 32;

#[derive(Clone, Debug)]
pub(crate) enum ContextKind {
    Root,
    Word { index: u32, name: Rc<str> },
    Lambda,
}

/// An open control structure waiting for its closing token.
#[derive(Debug)]
pub(crate) enum Structure {
    If {
        jump: usize,
    },
    Else {
        jump: usize,
    },
    Loop {
        start: usize,
        leaves: Vec<usize>,
        iter: bool,
    },
    /// List literal; `mark` is where the current element's code began.
    List {
        mark: usize,
    },
    Hash {
        mark: usize,
    },
    Try {
        table: usize,
        exits: Vec<usize>,
        handlers: usize,
    },
}

/// Name resolved to a slot of the executing frame.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum VarRef {
    Local(u16),
    Closure(u16),
}

#[derive(Debug)]
pub(crate) struct CompileContext {
    pub kind: ContextKind,
    pub ops: Vec<Op>,
    positions: Vec<SourcePos>,
    pub structures: Vec<Structure>,
    locals: Vec<Rc<str>>,
    pub params: u16,
    closed: u32,
    /// Closure slots, cached by name.
    captures: Vec<(Rc<str>, CaptureSource)>,
    pub lambdas: Vec<Rc<CodeBlock>>,
    pub catch_tables: Vec<CatchTable>,
    /// Nothing compiled yet: a parameter block may still appear.
    pub at_start: bool,
    /// `times` or `each` was compiled; the loop body's `{` must follow.
    pub pending_iter: bool,
}

impl CompileContext {
    pub fn new(kind: ContextKind) -> Self {
        CompileContext {
            kind,
            ops: Vec::new(),
            positions: Vec::new(),
            structures: Vec::new(),
            locals: Vec::new(),
            params: 0,
            closed: 0,
            captures: Vec::new(),
            lambdas: Vec::new(),
            catch_tables: Vec::new(),
            at_start: true,
            pending_iter: false,
        }
    }

    /// Whether anything is still open inside this context.
    pub fn is_open(&self) -> bool {
        !self.structures.is_empty() || self.pending_iter
    }

    #[inline]
    pub fn here(&self) -> usize {
        self.ops.len()
    }

    /// Append `op`, recording `pos` when positions are tracked.
    pub fn emit(&mut self, op: Op, pos: Option<SourcePos>) -> Result<usize, CompileErrorKind> {
        if self.ops.len() >= MAX_OPS {
            return Err(CompileErrorKind::CodeTooLong);
        }
        let at = self.ops.len();
        self.ops.push(op);
        if let Some(pos) = pos {
            self.positions.push(pos);
        }
        Ok(at)
    }

    /// Point the jump at `at` to `target`.
    pub fn patch(&mut self, at: usize, target: usize) {
        let target = u32::try_from(target).unwrap_or(u32::MAX);
        if let Some(op) = self.ops.get_mut(at) {
            op.set_jump_target(target);
        }
    }

    pub fn find_local(&self, name: &str) -> Option<u16> {
        self.locals
            .iter()
            .position(|l| &**l == name)
            .and_then(|i| u16::try_from(i).ok())
    }

    pub fn add_local(&mut self, name: &str) -> Result<u16, CompileErrorKind> {
        if self.locals.len() >= MAX_LOCALS {
            return Err(CompileErrorKind::TooManyLocals);
        }
        let idx = u16::try_from(self.locals.len()).map_err(|_| CompileErrorKind::TooManyLocals)?;
        self.locals.push(Rc::from(name));
        Ok(idx)
    }

    pub fn mark_closed(&mut self, local: u16) {
        if usize::from(local) < MAX_LOCALS {
            self.closed |= 1 << local;
        }
    }

    pub fn find_capture(&self, name: &str) -> Option<u16> {
        self.captures
            .iter()
            .position(|(n, _)| &**n == name)
            .and_then(|i| u16::try_from(i).ok())
    }

    pub fn add_capture(
        &mut self,
        name: &str,
        source: CaptureSource,
    ) -> Result<u16, CompileErrorKind> {
        let slot =
            u16::try_from(self.captures.len()).map_err(|_| CompileErrorKind::TooManyLocals)?;
        self.captures.push((Rc::from(name), source));
        Ok(slot)
    }

    /// Freeze into an immutable block, appending the final `End`.
    pub fn freeze(mut self, source: Rc<str>, end_pos: Option<SourcePos>) -> CodeBlock {
        self.ops.push(Op::End);
        if let Some(pos) = end_pos {
            self.positions.push(pos);
        }
        let name = match self.kind {
            ContextKind::Word { name, .. } => Some(name),
            ContextKind::Root | ContextKind::Lambda => None,
        };
        #[allow(
            clippy::cast_possible_truncation,
            reason = "add_local caps locals at MAX_LOCALS"
        )]
        let locals = self.locals.len() as u16;
        CodeBlock {
            name,
            ops: self.ops.into_boxed_slice(),
            positions: self.positions.into_boxed_slice(),
            source,
            params: self.params,
            locals,
            closed_locals: self.closed,
            captures: self.captures.into_iter().map(|(_, s)| s).collect(),
            lambdas: self.lambdas.into_boxed_slice(),
            catch_tables: self.catch_tables.into_boxed_slice(),
        }
    }
}
