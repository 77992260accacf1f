//! The dispatch loop.

use std::rc::Rc;
use std::sync::atomic::Ordering;

use tern_ir::{CaptureSource, CodeBlock, Op};

use crate::errors::{
    bad_operation, deferred_word, not_callable, not_collection, not_found, stack_underflow,
    stopped, type_mismatch, user_throw, ErrorPos, RuntimeError, RuntimeErrorKind, RuntimeResult,
};
use crate::heap::{Gc, GcBody};
use crate::natives::NativeArgs;
use crate::operators::{evaluate_binary, evaluate_neg, evaluate_not};
use crate::value::{HashTable, Hashable, Iterable, NativeId, Value};

use super::frames::CatchFrame;
use super::Runtime;

impl Runtime {
    /// Run `code` to completion on a fresh boundary frame.
    ///
    /// Only catch frames installed during this call can intercept its
    /// errors. An uncaught error unwinds every frame, locals window,
    /// iterator and catch frame this call created and is returned; the
    /// operand stack is left as it was when the error was raised.
    pub(crate) fn execute(&mut self, code: Rc<CodeBlock>, closure: Option<Gc>) -> RuntimeResult<()> {
        let entry_frames = self.frames.len();
        let entry_locals = self.locals.len();
        let catch_base = self.catches.len();
        let iter_base = self.iterators.len();

        self.push_frame(code, closure, true)?;
        loop {
            let Err(err) = self.dispatch() else {
                return Ok(());
            };
            let err = self.locate(err);
            if err.is_catchable() && self.catch(&err, catch_base) {
                continue;
            }
            self.frames.truncate(entry_frames);
            self.locals.truncate(entry_locals);
            self.catches.truncate(catch_base);
            self.iterators.truncate(iter_base);
            if entry_frames == 0 {
                tracing::warn!(error = %err, "uncaught runtime error");
            }
            return Err(err);
        }
    }

    /// Attach the position of the failing instruction.
    fn locate(&self, err: RuntimeError) -> RuntimeError {
        if err.pos.is_some() {
            return err;
        }
        let Some(frame) = self.frames.last() else {
            return err;
        };
        match frame.code.pos_at(frame.ip.saturating_sub(1)) {
            Some(pos) => err.at(ErrorPos {
                source: Rc::clone(&frame.code.source),
                pos,
            }),
            None => err,
        }
    }

    /// Find the innermost handler at or above `catch_base` and resume there
    /// with `data sym` pushed.
    fn catch(&mut self, err: &RuntimeError, catch_base: usize) -> bool {
        let symbol = match &err.kind {
            RuntimeErrorKind::User { symbol, .. } => *symbol,
            kind => match kind.code() {
                Some(code) => self.symbols.intern(code),
                None => return false,
            },
        };
        let found = (catch_base..self.catches.len()).rev().find_map(|i| {
            let cf = &self.catches[i];
            let target = cf.code.catch_tables.get(cf.table)?.find(symbol)?;
            Some((i, target))
        });
        let Some((index, target)) = found else {
            return false;
        };
        self.catches.truncate(index + 1);
        let Some(cf) = self.catches.pop() else {
            return false;
        };

        self.frames.truncate(cf.frames_len);
        self.locals.truncate(cf.locals_len);
        self.stack.truncate(cf.stack_len);
        self.iterators.truncate(cf.iter_len);
        self.jump(target);

        let data = match &err.kind {
            RuntimeErrorKind::User { data, .. } => data.clone(),
            _ => Value::str(&err.message),
        };
        tracing::trace!(symbol = self.symbols.name(symbol), "caught");
        self.stack.push(data);
        self.stack.push(Value::Symbol(symbol));
        true
    }

    #[inline]
    fn jump(&mut self, target: u32) {
        if let Some(frame) = self.frames.last_mut() {
            frame.ip = target as usize;
        }
    }

    fn local_slot(&self, n: u16) -> RuntimeResult<usize> {
        let frame = self.frames.last().ok_or_else(|| bad_operation("no active frame"))?;
        let slot = frame.locals_base + usize::from(n);
        if slot < self.locals.len() {
            Ok(slot)
        } else {
            Err(bad_operation(format!("local {n} out of range")))
        }
    }

    fn active_closure(&self) -> RuntimeResult<&Gc> {
        self.frames
            .last()
            .and_then(|f| f.closure.as_ref())
            .ok_or_else(|| bad_operation("no closure context"))
    }

    fn load_closure(&self, n: u16) -> RuntimeResult<Value> {
        let closure = self.active_closure()?;
        let body = closure
            .try_body()
            .map_err(|_| bad_operation("closure is being modified"))?;
        let value = match &*body {
            GcBody::Closure(c) => c.table.get(usize::from(n)).cloned(),
            _ => None,
        };
        value.ok_or_else(|| bad_operation(format!("closure slot {n} out of range")))
    }

    fn store_closure(&self, n: u16, value: Value) -> RuntimeResult<()> {
        let closure = self.active_closure()?;
        let mut body = closure
            .try_body_mut()
            .map_err(|_| bad_operation("closure is in use"))?;
        let slot = match &mut *body {
            GcBody::Closure(c) => c.table.get_mut(usize::from(n)),
            _ => None,
        };
        let Some(slot) = slot else {
            return Err(bad_operation(format!("closure slot {n} out of range")));
        };
        let old = std::mem::replace(slot, value);
        drop(body);
        drop(old);
        Ok(())
    }

    /// Evaluate lambda literal `n` of the current block.
    fn make_lambda(&mut self, n: u32) -> RuntimeResult<Value> {
        let frame = self.frames.last().ok_or_else(|| bad_operation("no active frame"))?;
        let block = frame
            .code
            .lambdas
            .get(n as usize)
            .cloned()
            .ok_or_else(|| bad_operation(format!("lambda {n} out of range")))?;
        if !block.needs_closure() {
            return Ok(Value::Code(block));
        }
        let mut table = Vec::with_capacity(block.captures.len());
        for capture in &*block.captures {
            let value = match *capture {
                CaptureSource::Local(i) => self.locals[self.local_slot(i)?].clone(),
                CaptureSource::Outer(i) => self.load_closure(i)?,
            };
            table.push(value);
        }
        Ok(self.heap.new_closure(block, table))
    }

    /// Call `value` from inside the loop: code and closures get a new
    /// frame, natives run immediately.
    pub(crate) fn call_value(&mut self, value: Value) -> RuntimeResult<()> {
        match value {
            Value::Code(code) => self.push_frame(code, None, false),
            Value::Closure(g) => {
                let code = match &*g.body() {
                    GcBody::Closure(c) => Rc::clone(&c.code),
                    _ => return Err(not_callable("cleared closure")),
                };
                self.push_frame(code, Some(g), false)
            }
            Value::Native(id) => self.call_native(id),
            other => Err(not_callable(other.type_name())),
        }
    }

    pub(crate) fn call_native(&mut self, id: NativeId) -> RuntimeResult<()> {
        let Some(native) = self.natives.get(id) else {
            return Err(not_found(&format!("native #{}", id.0)));
        };
        let func = Rc::clone(&native.func);
        let args = match &native.spec {
            Some(spec) => spec.take(&mut self.stack, &self.symbols)?,
            None => NativeArgs::new(),
        };
        tracing::trace!(native = &*native.name, "native call");
        func(self, &args)
    }

    fn tick_autogc(&mut self) {
        if self.autogc <= 0 {
            return;
        }
        self.gc_countdown -= 1;
        if self.gc_countdown <= 0 {
            self.gc_countdown = self.autogc;
            self.heap.collect();
        }
    }

    /// Run instructions until the innermost boundary frame ends.
    fn dispatch(&mut self) -> RuntimeResult<()> {
        loop {
            if self.stop.load(Ordering::Relaxed) {
                return Err(stopped());
            }
            self.tick_autogc();

            let Some(frame) = self.frames.last_mut() else {
                return Ok(());
            };
            let op = frame.code.ops.get(frame.ip).cloned().unwrap_or(Op::End);
            frame.ip += 1;

            match op {
                Op::Int(v) => self.push(Value::Int(v))?,
                Op::Long(v) => self.push(Value::Long(v))?,
                Op::Float(v) => self.push(Value::Float(v))?,
                Op::Double(v) => self.push(Value::Double(v))?,
                Op::Str(s) => self.push(Value::Str(s))?,
                Op::Symbol(s) => self.push(Value::Symbol(s))?,
                Op::None => self.push(Value::None)?,
                Op::Lambda(n) => {
                    let value = self.make_lambda(n)?;
                    self.push(value)?;
                }
                Op::WordRef(i) => {
                    let word = self.words.value(i);
                    self.push(word)?;
                }
                Op::NativeRef(i) => self.push(Value::Native(NativeId(i)))?,

                Op::LoadLocal(n) => {
                    let value = self.locals[self.local_slot(n)?].clone();
                    self.push(value)?;
                }
                Op::StoreLocal(n) => {
                    let value = self.pop()?;
                    let slot = self.local_slot(n)?;
                    self.locals[slot] = value;
                }
                Op::LoadClosure(n) => {
                    let value = self.load_closure(n)?;
                    self.push(value)?;
                }
                Op::StoreClosure(n) => {
                    let value = self.pop()?;
                    self.store_closure(n, value)?;
                }
                Op::LoadGlobal(i) => {
                    let value = self.globals.value(i);
                    self.push(value)?;
                }
                Op::StoreGlobal(i) => {
                    let value = self.pop()?;
                    self.globals.set(i, value)?;
                }
                Op::LoadConst(i) => {
                    let value = self.consts.value(i);
                    self.push(value)?;
                }
                Op::SetConst(i) => {
                    let value = self.pop()?;
                    self.consts.set_const(i, value)?;
                }
                Op::GetProp(i) => {
                    let prop = self
                        .properties
                        .get(i)
                        .ok_or_else(|| bad_operation(format!("no property #{i}")))?;
                    let value = prop.get(self)?;
                    self.push(value)?;
                }
                Op::SetProp(i) => {
                    let prop = self
                        .properties
                        .get(i)
                        .ok_or_else(|| bad_operation(format!("no property #{i}")))?;
                    let value = self.pop()?;
                    prop.set(self, value)?;
                }

                Op::CallWord(i) => match self.words.value(i) {
                    Value::None => return Err(deferred_word(self.words.name(i))),
                    word => self.call_value(word)?,
                },
                Op::CallNative(i) => self.call_native(NativeId(i))?,
                Op::Call => {
                    let callee = self.pop()?;
                    self.call_value(callee)?;
                }
                Op::Recurse => {
                    let frame = self.frames.last().ok_or_else(|| bad_operation("no active frame"))?;
                    let code = Rc::clone(&frame.code);
                    let closure = frame.closure.clone();
                    self.push_frame(code, closure, false)?;
                }

                Op::Dup => {
                    let value = self.peek(0)?.clone();
                    self.push(value)?;
                }
                Op::Drop => {
                    self.pop()?;
                }
                Op::Swap => {
                    let len = self.stack.len();
                    if len < 2 {
                        return Err(stack_underflow());
                    }
                    self.stack.swap(len - 1, len - 2);
                }
                Op::Over => {
                    let value = self.peek(1)?.clone();
                    self.push(value)?;
                }
                Op::Rot => {
                    let len = self.stack.len();
                    if len < 3 {
                        return Err(stack_underflow());
                    }
                    let value = self.stack.remove(len - 3);
                    self.stack.push(value);
                }

                Op::Binary(op) => {
                    let right = self.pop()?;
                    let left = self.pop()?;
                    let result = evaluate_binary(&mut self.heap, &self.symbols, &left, &right, op)?;
                    self.push(result)?;
                }
                Op::Not => {
                    let value = self.pop()?;
                    self.push(evaluate_not(&value))?;
                }
                Op::Neg => {
                    let value = self.pop()?;
                    self.push(evaluate_neg(&value)?)?;
                }

                Op::Jump(t) => self.jump(t),
                Op::JumpIfFalse(t) => {
                    if !self.pop()?.is_truthy() {
                        self.jump(t);
                    }
                }
                Op::JumpIfTrue(t) => {
                    if self.pop()?.is_truthy() {
                        self.jump(t);
                    }
                }

                Op::IterStart => {
                    let iterable = self.pop()?;
                    let iter = iterable.make_iterator(&mut self.heap)?;
                    self.iterators.push(iter);
                }
                Op::IterLeaveIfDone(t) => {
                    let advanced = {
                        let iter = self
                            .iterators
                            .last()
                            .ok_or_else(|| bad_operation("no active loop"))?;
                        let mut body = iter
                            .try_body_mut()
                            .map_err(|_| bad_operation("iterator is in use"))?;
                        match &mut *body {
                            GcBody::Iterator(state) => state.advance(),
                            _ => false,
                        }
                    };
                    if !advanced {
                        self.jump(t);
                    }
                }
                Op::IterValue(n) => {
                    let value = {
                        let iter = self
                            .iterators
                            .len()
                            .checked_sub(1 + usize::from(n))
                            .and_then(|i| self.iterators.get(i))
                            .ok_or_else(|| bad_operation("no enclosing loop"))?;
                        let body = iter
                            .try_body()
                            .map_err(|_| bad_operation("iterator is in use"))?;
                        match &*body {
                            GcBody::Iterator(state) => state.current.clone(),
                            _ => Value::None,
                        }
                    };
                    self.push(value)?;
                }
                Op::IterEnd => {
                    self.iterators.pop();
                }

                Op::NewList => {
                    let list = self.heap.new_list(Vec::new());
                    self.push(list)?;
                }
                Op::ListAppend => {
                    let value = self.pop()?;
                    match self.peek(0)? {
                        Value::List(g) => {
                            if let GcBody::List(items) = &mut *g.body_mut() {
                                items.push(value);
                            }
                        }
                        other => return Err(not_collection(other.type_name())),
                    }
                }
                Op::NewHash => {
                    let hash = self.heap.new_hash(HashTable::new());
                    self.push(hash)?;
                }
                Op::HashAdd => {
                    let value = self.pop()?;
                    let key = self.pop()?;
                    let hash_key = key.hash_key()?;
                    match self.peek(0)? {
                        Value::Hash(g) => {
                            if let GcBody::Hash(table) = &mut *g.body_mut() {
                                table.insert(hash_key, key, value);
                            }
                        }
                        other => return Err(not_collection(other.type_name())),
                    }
                }

                Op::Try(table) => {
                    let frame = self.frames.last().ok_or_else(|| bad_operation("no active frame"))?;
                    let cf = CatchFrame {
                        code: Rc::clone(&frame.code),
                        table: table as usize,
                        frames_len: self.frames.len(),
                        locals_len: self.locals.len(),
                        stack_len: self.stack.len(),
                        iter_len: self.iterators.len(),
                    };
                    self.catches.push(cf);
                }
                Op::EndTry(t) => {
                    self.catches.pop();
                    self.jump(t);
                }
                Op::Throw => {
                    let data = self.pop()?;
                    let symbol = self.pop()?;
                    let Value::Symbol(sym) = symbol else {
                        return Err(type_mismatch("symbol", symbol.type_name()));
                    };
                    return Err(user_throw(sym, self.symbols.name(sym), data));
                }

                Op::Print => {
                    let value = self.pop()?;
                    let text = self.display(&value);
                    self.print.println(&text);
                }
                Op::End => {
                    if let Some(frame) = self.pop_frame() {
                        if frame.boundary {
                            return Ok(());
                        }
                    }
                }
            }
        }
    }
}
