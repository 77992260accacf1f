//! Tern VM - compiler, values and bytecode interpreter for the Tern
//! scripting language.
//!
//! # Architecture
//!
//! - [`Runtime`]: owns everything; [`Runtime::feed`] compiles a line and
//!   runs any top-level code it completes
//! - `compiler`: single-pass compiler from tokens to [`tern_ir::CodeBlock`]s
//!   with closure promotion and backpatched control structures
//! - [`Value`]: the value model, with [`Heap`] objects freed by reference
//!   count and a trial-deletion cycle collector
//! - [`Namespace`]: the word, global and constant tables
//! - [`NativeRegistry`] / [`PropertyRegistry`]: embedder hooks
//!
//! # Tracing
//!
//! Call [`init_tracing`] once, then set `RUST_LOG`:
//! - `RUST_LOG=tern_vm=debug`: feeds, word definitions, collections
//! - `RUST_LOG=tern_vm=trace`: every call and native invocation

mod builtins;
mod compiler;
pub mod errors;
pub mod heap;
mod interpreter;
pub mod namespace;
pub mod natives;
mod operators;
mod print_handler;
pub mod properties;
mod stack;
pub mod value;
mod visitor;

use std::sync::Once;

pub use errors::{CompileError, CompileErrorKind, RuntimeError, RuntimeErrorKind, RuntimeResult, TernError};
pub use heap::{GlobalCounters, GlobalLock, Heap};
pub use interpreter::{Runtime, RuntimeBuilder, StackLimits};
pub use namespace::Namespace;
pub use natives::{ArgKind, ArgSpec, NativeArgs, NativeFn, NativeRegistry};
pub use operators::{evaluate_binary, evaluate_neg, evaluate_not};
pub use print_handler::{
    buffer_handler, silent_handler, stdout_handler, BufferPrintHandler, PrintHandlerImpl,
    SharedPrintHandler, StdoutPrintHandler,
};
pub use properties::{Property, PropertyRegistry};
pub use stack::ensure_sufficient_stack;
pub use value::{
    Callable, CallableKind, HashKey, HashTable, Hashable, Iterable, NativeId, NativeObject,
    Numeric, RangeValue, Value, ValueType,
};

static TRACING_INIT: Once = Once::new();

/// Initialize tracing subscriber for debugging.
///
/// Respects `RUST_LOG`; does nothing when it is unset. Safe to call more
/// than once.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, prelude::*, EnvFilter};

        if std::env::var("RUST_LOG").is_ok() {
            let filter = EnvFilter::from_default_env();
            tracing_subscriber::registry()
                .with(fmt::layer().with_target(true).with_level(true))
                .with(filter)
                .init();
        }
    });
}

/// Report an unrecoverable internal failure and exit.
#[cold]
pub fn fatal(msg: &str) -> ! {
    tracing::error!("fatal: {msg}");
    eprintln!("tern: fatal: {msg}");
    std::process::exit(1)
}
