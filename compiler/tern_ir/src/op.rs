//! Instruction set.
//!
//! Operands that name runtime tables (`CallWord`, `LoadGlobal`, ...) are
//! indices into the runtime's namespaces; they stay valid because namespace
//! entries are never renumbered. Jump targets are absolute instruction
//! indices within the owning block.

use std::fmt;
use std::rc::Rc;

use crate::symbols::Symbol;

/// Binary operators.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Eq,
    Ne,
    Lt,
    Gt,
    Le,
    Ge,
    And,
    Or,
}

impl BinOp {
    pub const ALL: [BinOp; 13] = [
        BinOp::Add,
        BinOp::Sub,
        BinOp::Mul,
        BinOp::Div,
        BinOp::Mod,
        BinOp::Eq,
        BinOp::Ne,
        BinOp::Lt,
        BinOp::Gt,
        BinOp::Le,
        BinOp::Ge,
        BinOp::And,
        BinOp::Or,
    ];

    /// Surface-syntax spelling.
    pub fn symbol(self) -> &'static str {
        match self {
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::Mod => "%",
            BinOp::Eq => "=",
            BinOp::Ne => "!=",
            BinOp::Lt => "<",
            BinOp::Gt => ">",
            BinOp::Le => "<=",
            BinOp::Ge => ">=",
            BinOp::And => "and",
            BinOp::Or => "or",
        }
    }

    /// Disassembler mnemonic.
    pub fn mnemonic(self) -> &'static str {
        match self {
            BinOp::Add => "add",
            BinOp::Sub => "sub",
            BinOp::Mul => "mul",
            BinOp::Div => "div",
            BinOp::Mod => "mod",
            BinOp::Eq => "eq",
            BinOp::Ne => "ne",
            BinOp::Lt => "lt",
            BinOp::Gt => "gt",
            BinOp::Le => "le",
            BinOp::Ge => "ge",
            BinOp::And => "and",
            BinOp::Or => "or",
        }
    }

    pub fn from_mnemonic(text: &str) -> Option<BinOp> {
        BinOp::ALL.into_iter().find(|op| op.mnemonic() == text)
    }

    /// Comparison operators yield an `Int` truth value.
    pub fn is_comparison(self) -> bool {
        matches!(
            self,
            BinOp::Eq | BinOp::Ne | BinOp::Lt | BinOp::Gt | BinOp::Le | BinOp::Ge
        )
    }
}

impl fmt::Display for BinOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// One bytecode instruction.
#[derive(Clone, Debug, PartialEq)]
pub enum Op {
    // Literals
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    Str(Rc<str>),
    Symbol(Symbol),
    None,
    /// Push nested lambda `n` of the current block; creates a closure when
    /// the lambda captures anything.
    Lambda(u32),
    /// Push a word's value without calling it.
    WordRef(u32),
    NativeRef(u32),

    // Variables
    LoadLocal(u16),
    StoreLocal(u16),
    LoadClosure(u16),
    StoreClosure(u16),
    LoadGlobal(u32),
    StoreGlobal(u32),
    LoadConst(u32),
    /// Pop a value and bind it to constant `n`.
    SetConst(u32),
    GetProp(u32),
    SetProp(u32),

    // Calls
    CallWord(u32),
    CallNative(u32),
    /// Call the callable on top of the stack.
    Call,
    /// Call the executing block again.
    Recurse,

    // Stack
    Dup,
    Drop,
    Swap,
    Over,
    Rot,

    // Operators
    Binary(BinOp),
    Not,
    Neg,

    // Control flow
    Jump(u32),
    JumpIfFalse(u32),
    JumpIfTrue(u32),

    // Iteration
    IterStart,
    /// Jump to the target when the innermost iterator is exhausted,
    /// otherwise stash its next value.
    IterLeaveIfDone(u32),
    /// Push the stashed value `n` loops out (0 = innermost).
    IterValue(u8),
    IterEnd,

    // Containers
    NewList,
    ListAppend,
    NewHash,
    HashAdd,

    // Exceptions
    /// Push a catch frame for catch table `n` of the current block.
    Try(u32),
    /// Pop the catch frame and jump past the handlers.
    EndTry(u32),
    Throw,

    Print,
    End,
}

impl Op {
    /// Jump target, for instructions that have one.
    pub fn jump_target(&self) -> Option<u32> {
        match *self {
            Op::Jump(t)
            | Op::JumpIfFalse(t)
            | Op::JumpIfTrue(t)
            | Op::IterLeaveIfDone(t)
            | Op::EndTry(t) => Some(t),
            _ => None,
        }
    }

    /// Rewrite the jump target. No-op for instructions without one.
    pub fn set_jump_target(&mut self, target: u32) {
        match self {
            Op::Jump(t)
            | Op::JumpIfFalse(t)
            | Op::JumpIfTrue(t)
            | Op::IterLeaveIfDone(t)
            | Op::EndTry(t) => *t = target,
            _ => {}
        }
    }
}
