//! The runtime: compiler, tables, heap and the stacks the dispatch loop
//! runs on.
//!
//! A [`Runtime`] is single-threaded. Only the symbol table (and the
//! optional [`GlobalLock`](crate::heap::GlobalLock)) may be shared between
//! runtimes; the stop flag returned by [`Runtime::stop_handle`] may be set
//! from any thread.

mod builder;
mod dispatch;
mod frames;

pub use builder::RuntimeBuilder;
pub use frames::StackLimits;

use std::rc::Rc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tern_ir::{disassemble_with, CodeBlock, Op, SharedSymbols, SymbolTable};

use crate::compiler::{CompileEnv, Compiler};
use crate::errors::{not_callable, RuntimeResult, TernError};
use crate::heap::{Gc, GcBody, Heap};
use crate::namespace::Namespace;
use crate::natives::{ArgSpec, NativeRegistry};
use crate::print_handler::SharedPrintHandler;
use crate::properties::{Property, PropertyRegistry};
use crate::stack::ensure_sufficient_stack;
use crate::value::{HashTable, NativeId, Value};

use frames::{CatchFrame, Frame};

pub struct Runtime {
    pub(crate) symbols: SharedSymbols,
    pub(crate) heap: Heap,
    pub(crate) words: Namespace,
    pub(crate) globals: Namespace,
    pub(crate) consts: Namespace,
    pub(crate) natives: NativeRegistry,
    pub(crate) properties: PropertyRegistry,
    compiler: Compiler,

    pub(crate) stack: Vec<Value>,
    pub(crate) frames: Vec<Frame>,
    pub(crate) locals: Vec<Value>,
    pub(crate) iterators: Vec<Gc>,
    pub(crate) catches: Vec<CatchFrame>,
    pub(crate) limits: StackLimits,

    pub(crate) print: SharedPrintHandler,
    pub(crate) stop: Arc<AtomicBool>,
    /// Collection interval in dispatched instructions; 0 or less is off.
    pub(crate) autogc: i64,
    pub(crate) gc_countdown: i64,
}

impl Runtime {
    /// A runtime with the default configuration and the core words.
    pub fn new() -> Self {
        RuntimeBuilder::new().build()
    }

    /// Compile one line of source, running any top-level code it completes.
    ///
    /// After a runtime error the operand stack holds whatever was on it
    /// when the error was raised; see [`Runtime::clear_stacks`].
    pub fn feed(&mut self, line: &str) -> Result<(), TernError> {
        let span = tracing::debug_span!("feed", source = %self.compiler.source_name());
        let _guard = span.enter();

        let mut env = CompileEnv {
            symbols: &self.symbols,
            words: &mut self.words,
            globals: &mut self.globals,
            consts: &mut self.consts,
            natives: &self.natives,
            properties: &self.properties,
        };
        let block = self.compiler.feed_line(line, &mut env)?;
        if let Some(code) = block {
            self.execute(code, None)?;
        }
        Ok(())
    }

    /// Feed every line of `text`, then report anything left open.
    ///
    /// A string literal left open at the end of a line takes the following
    /// lines with it until it closes.
    pub fn run_source(&mut self, text: &str) -> Result<(), TernError> {
        let mut pending = String::new();
        for line in text.lines() {
            if !pending.is_empty() {
                pending.push('\n');
            }
            pending.push_str(line);
            if self.compiler.ends_in_open_string(&pending) {
                continue;
            }
            self.feed(&pending)?;
            pending.clear();
        }
        if !pending.is_empty() {
            self.feed(&pending)?;
        }
        let mut env = CompileEnv {
            symbols: &self.symbols,
            words: &mut self.words,
            globals: &mut self.globals,
            consts: &mut self.consts,
            natives: &self.natives,
            properties: &self.properties,
        };
        self.compiler.finish(&mut env)?;
        Ok(())
    }

    /// Call any callable synchronously; results are left on the stack.
    ///
    /// Safe to use from inside a native. Only `try` blocks entered during
    /// this call can catch its errors.
    pub fn run_value(&mut self, value: &Value) -> RuntimeResult<()> {
        ensure_sufficient_stack(|| match value {
            Value::Code(code) => self.execute(Rc::clone(code), None),
            Value::Closure(g) => {
                let code = match &*g.body() {
                    GcBody::Closure(c) => Rc::clone(&c.code),
                    _ => return Err(not_callable("cleared closure")),
                };
                self.execute(code, Some(g.clone()))
            }
            Value::Native(id) => self.call_native(*id),
            other => Err(not_callable(other.type_name())),
        })
    }

    /// Run a compiled block at the top level.
    pub fn run_code(&mut self, code: Rc<CodeBlock>) -> RuntimeResult<()> {
        ensure_sufficient_stack(|| self.execute(code, None))
    }

    // Stacks

    /// The operand stack, bottom first.
    pub fn stack(&self) -> &[Value] {
        &self.stack
    }

    /// Empty every stack. Needed after an uncaught error before reuse.
    pub fn clear_stacks(&mut self) {
        self.stack.clear();
        self.frames.clear();
        self.locals.clear();
        self.iterators.clear();
        self.catches.clear();
    }

    pub fn limits(&self) -> StackLimits {
        self.limits
    }

    // Natives and properties

    /// Register a native. `spec` is the argument letter string; an empty
    /// spec leaves the stack to the native.
    pub fn register_native<F>(&mut self, name: &str, spec: &str, func: F) -> RuntimeResult<NativeId>
    where
        F: Fn(&mut Runtime, &[Value]) -> RuntimeResult<()> + 'static,
    {
        self.register_native_objects(name, spec, &[], func)
    }

    /// Register a native whose spec uses `A`/`B` for the object type names
    /// in `objects`.
    pub fn register_native_objects<F>(
        &mut self,
        name: &str,
        spec: &str,
        objects: &[&str],
        func: F,
    ) -> RuntimeResult<NativeId>
    where
        F: Fn(&mut Runtime, &[Value]) -> RuntimeResult<()> + 'static,
    {
        let spec = if spec.is_empty() {
            None
        } else {
            Some(ArgSpec::parse(spec, objects)?)
        };
        Ok(self.natives.register(name, spec, Rc::new(func)))
    }

    pub fn register_property(&mut self, name: &str, prop: Rc<dyn Property>) -> u32 {
        self.properties.register(name, prop)
    }

    // Collection

    /// Run the cycle collector; returns the number of objects destroyed.
    pub fn gc(&mut self) -> usize {
        let freed = self.heap.collect();
        tracing::debug!(freed, live = self.heap.live_count(), "collected cycles");
        freed
    }

    pub fn live_objects(&mut self) -> usize {
        self.heap.live_count()
    }

    pub fn autogc(&self) -> i64 {
        self.autogc
    }

    pub fn set_autogc(&mut self, interval: i64) {
        self.autogc = interval;
        self.gc_countdown = interval;
    }

    pub fn new_list(&mut self, items: Vec<Value>) -> Value {
        self.heap.new_list(items)
    }

    pub fn new_hash(&mut self, table: HashTable) -> Value {
        self.heap.new_hash(table)
    }

    // Stop flag

    /// Setting the returned flag stops the running code with `stopped`.
    pub fn stop_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.stop)
    }

    pub fn clear_stop(&self) {
        self.stop.store(false, Ordering::Relaxed);
    }

    // Tables

    pub fn word(&self, name: &str) -> Option<Value> {
        self.words.get(name).map(|i| self.words.value(i))
    }

    pub fn global(&self, name: &str) -> Option<Value> {
        self.globals.get(name).map(|i| self.globals.value(i))
    }

    /// Set a global, declaring it if needed.
    pub fn set_global(&mut self, name: &str, value: Value) -> RuntimeResult<()> {
        let idx = self.globals.add(name);
        self.globals.set(idx, value)
    }

    pub fn constant(&self, name: &str) -> Option<Value> {
        self.consts.get(name).map(|i| self.consts.value(i))
    }

    /// Disassembly of a defined word, table indices annotated with names.
    pub fn disassemble_word(&self, name: &str) -> Option<String> {
        let Value::Code(code) = self.word(name)? else {
            return None;
        };
        let annotate = |op: &Op| {
            let name = match *op {
                Op::CallWord(i) | Op::WordRef(i) => self.words.name(i),
                Op::CallNative(i) | Op::NativeRef(i) => self.natives.name(NativeId(i)),
                Op::LoadGlobal(i) | Op::StoreGlobal(i) => self.globals.name(i),
                Op::LoadConst(i) | Op::SetConst(i) => self.consts.name(i),
                Op::GetProp(i) | Op::SetProp(i) => self.properties.name(i),
                _ => return None,
            };
            Some(name.to_string())
        };
        Some(disassemble_with(&code, &self.symbols, &annotate))
    }

    // Misc

    pub fn symbols(&self) -> &SymbolTable {
        &self.symbols
    }

    pub fn shared_symbols(&self) -> SharedSymbols {
        self.symbols.clone()
    }

    pub fn display(&self, value: &Value) -> String {
        value.to_display_string(&self.symbols)
    }

    pub fn print_handler(&self) -> &SharedPrintHandler {
        &self.print
    }

    /// Name errors and positions after `name`, restarting line numbers.
    pub fn set_source_name(&mut self, name: &str) {
        self.compiler.set_source(Rc::from(name));
    }
}

impl Default for Runtime {
    fn default() -> Self {
        Self::new()
    }
}
