//! `RuntimeBuilder` for creating runtimes with various configurations.

use std::rc::Rc;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use tern_ir::SharedSymbols;

use super::{Runtime, StackLimits};
use crate::compiler::Compiler;
use crate::errors::RuntimeErrorKind;
use crate::heap::{GlobalLock, Heap};
use crate::namespace::Namespace;
use crate::natives::NativeRegistry;
use crate::print_handler::{stdout_handler, SharedPrintHandler};
use crate::properties::{AutoGc, PropertyRegistry};

/// Builder for [`Runtime`].
///
/// Defaults: 1024 operand slots, 512 return frames, 4096 locals, source
/// positions tracked, bare words off, output to stdout, no automatic
/// collection, core words registered.
pub struct RuntimeBuilder {
    limits: StackLimits,
    bare_words: bool,
    track_positions: bool,
    source_name: Rc<str>,
    print_handler: Option<SharedPrintHandler>,
    symbols: Option<SharedSymbols>,
    global_lock: Option<GlobalLock>,
    autogc: i64,
    core_words: bool,
}

impl RuntimeBuilder {
    pub fn new() -> Self {
        Self {
            limits: StackLimits::default(),
            bare_words: false,
            track_positions: true,
            source_name: Rc::from("<input>"),
            print_handler: None,
            symbols: None,
            global_lock: None,
            autogc: 0,
            core_words: true,
        }
    }

    #[must_use]
    pub fn limits(mut self, limits: StackLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Operand stack capacity.
    #[must_use]
    pub fn stack_size(mut self, size: usize) -> Self {
        self.limits.operands = size;
        self
    }

    /// Return stack capacity, in frames.
    #[must_use]
    pub fn frames(mut self, size: usize) -> Self {
        self.limits.frames = size;
        self
    }

    #[must_use]
    pub fn locals(mut self, size: usize) -> Self {
        self.limits.locals = size;
        self
    }

    /// Compile unknown identifiers as string literals instead of failing.
    #[must_use]
    pub fn bare_words(mut self, enabled: bool) -> Self {
        self.bare_words = enabled;
        self
    }

    /// Record a source position for every instruction.
    #[must_use]
    pub fn track_positions(mut self, enabled: bool) -> Self {
        self.track_positions = enabled;
        self
    }

    #[must_use]
    pub fn source_name(mut self, name: &str) -> Self {
        self.source_name = Rc::from(name);
        self
    }

    /// Where `.` and `p` write. Stdout when unset.
    #[must_use]
    pub fn print_handler(mut self, handler: SharedPrintHandler) -> Self {
        self.print_handler = Some(handler);
        self
    }

    /// Share a symbol table with other runtimes.
    #[must_use]
    pub fn symbols(mut self, symbols: SharedSymbols) -> Self {
        self.symbols = Some(symbols);
        self
    }

    #[must_use]
    pub fn global_lock(mut self, lock: GlobalLock) -> Self {
        self.global_lock = Some(lock);
        self
    }

    /// Initial `autogc` interval.
    #[must_use]
    pub fn autogc(mut self, interval: i64) -> Self {
        self.autogc = interval;
        self
    }

    /// Register the core words (`p`, `len`, `range`, ...).
    #[must_use]
    pub fn core_words(mut self, enabled: bool) -> Self {
        self.core_words = enabled;
        self
    }

    pub fn build(self) -> Runtime {
        let symbols = self.symbols.unwrap_or_default();
        for code in RuntimeErrorKind::CODES {
            symbols.intern(code);
        }

        let mut rt = Runtime {
            symbols,
            heap: Heap::new(self.global_lock),
            words: Namespace::new(),
            globals: Namespace::new(),
            consts: Namespace::new(),
            natives: NativeRegistry::new(),
            properties: PropertyRegistry::new(),
            compiler: Compiler::new(self.source_name, self.track_positions, self.bare_words),
            stack: Vec::with_capacity(self.limits.operands),
            frames: Vec::with_capacity(self.limits.frames.min(64)),
            locals: Vec::with_capacity(self.limits.locals.min(256)),
            iterators: Vec::new(),
            catches: Vec::new(),
            limits: self.limits,
            print: self.print_handler.unwrap_or_else(stdout_handler),
            stop: Arc::new(AtomicBool::new(false)),
            autogc: 0,
            gc_countdown: 0,
        };
        rt.set_autogc(self.autogc);
        rt.register_property("autogc", Rc::new(AutoGc));
        if self.core_words {
            crate::builtins::register(&mut rt);
        }
        rt
    }
}

impl Default for RuntimeBuilder {
    fn default() -> Self {
        Self::new()
    }
}
