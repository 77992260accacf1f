//! Compiled code blocks.

use std::rc::Rc;

use crate::op::Op;
use crate::pos::SourcePos;
use crate::symbols::Symbol;

/// Where a closure slot's initial value comes from, seen from the frame
/// that evaluates the lambda literal.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum CaptureSource {
    /// The creating frame's local `n`.
    Local(u16),
    /// The creating frame's own closure slot `n`.
    Outer(u16),
}

/// What a catch entry matches.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum CatchKey {
    Symbol(Symbol),
    All,
}

/// Handlers of one `try` block, in source order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CatchTable {
    pub entries: Vec<(CatchKey, u32)>,
}

impl CatchTable {
    /// Handler address for `sym`; the first matching entry wins.
    pub fn find(&self, sym: Symbol) -> Option<u32> {
        self.entries.iter().find_map(|(key, target)| match key {
            CatchKey::All => Some(*target),
            CatchKey::Symbol(s) if *s == sym => Some(*target),
            CatchKey::Symbol(_) => None,
        })
    }
}

/// An immutable compiled block: a word body, a lambda, or a top-level
/// statement.
#[derive(Clone, Debug, PartialEq)]
pub struct CodeBlock {
    /// Word name for definitions.
    pub name: Option<Rc<str>>,
    pub ops: Box<[Op]>,
    /// One entry per instruction, or empty when positions are not tracked.
    pub positions: Box<[SourcePos]>,
    pub source: Rc<str>,
    pub params: u16,
    /// Total locals, parameters included.
    pub locals: u16,
    /// Bit `n` set when local `n` is captured by a nested lambda.
    pub closed_locals: u32,
    /// One entry per closure slot.
    pub captures: Box<[CaptureSource]>,
    pub lambdas: Box<[Rc<CodeBlock>]>,
    pub catch_tables: Box<[CatchTable]>,
}

impl CodeBlock {
    /// An empty block with no locals, used for deferred words and tests.
    pub fn empty(source: Rc<str>) -> Self {
        CodeBlock {
            name: None,
            ops: Box::new([Op::End]),
            positions: Box::default(),
            source,
            params: 0,
            locals: 0,
            closed_locals: 0,
            captures: Box::default(),
            lambdas: Box::default(),
            catch_tables: Box::default(),
        }
    }

    pub fn pos_at(&self, ip: usize) -> Option<SourcePos> {
        self.positions.get(ip).copied().filter(|p| p.is_known())
    }

    /// True when evaluating this block as a lambda literal creates a closure.
    #[inline]
    pub fn needs_closure(&self) -> bool {
        !self.captures.is_empty()
    }

    pub fn is_local_closed(&self, local: u16) -> bool {
        local < 32 && self.closed_locals & (1 << local) != 0
    }

    /// Display name, `<lambda>` for anonymous blocks.
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("<lambda>")
    }
}
