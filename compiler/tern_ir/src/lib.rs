//! Tern IR - bytecode and code blocks.
//!
//! Shared by the compiler and the interpreter:
//! - [`Op`]: the instruction set
//! - [`CodeBlock`]: an immutable compiled block with its closure capture
//!   table, nested lambdas and catch tables
//! - [`SymbolTable`] / [`SharedSymbols`]: the process-wide symbol interner
//! - [`disassemble`] / [`assemble`]: the textual form of a block

mod code_block;
mod disasm;
mod op;
mod pos;
mod symbols;

pub use code_block::{CaptureSource, CatchKey, CatchTable, CodeBlock};
pub use disasm::{assemble, disassemble, disassemble_with, AsmError};
pub use op::{BinOp, Op};
pub use pos::SourcePos;
pub use symbols::{SharedSymbols, Symbol, SymbolOverflow, SymbolTable};

/// Compile-time assertion that a type has a specific size.
#[macro_export]
macro_rules! static_assert_size {
    ($ty:ty, $size:expr) => {
        const _: [(); $size] = [(); ::std::mem::size_of::<$ty>()];
    };
}

static_assert_size!(SourcePos, 8);
static_assert_size!(Symbol, 4);
