//! Walk of every value reachable from the runtime's tables.
//!
//! Serializers use this to find everything that has to be written. Heap
//! objects and code blocks are reported once however many paths reach
//! them.

use std::rc::Rc;

use rustc_hash::FxHashSet;

use crate::heap::{Gc, GcBody, IterSource};
use crate::interpreter::Runtime;
use crate::value::Value;

impl Runtime {
    /// Call `f` on every value reachable from the words, globals and
    /// constants, each heap object and code block at most once.
    pub fn visit_reachable(&self, f: &mut dyn FnMut(&Value)) {
        let mut seen: FxHashSet<usize> = FxHashSet::default();
        let mut work: Vec<Value> = self
            .words
            .iter()
            .chain(self.globals.iter())
            .chain(self.consts.iter())
            .map(|(_, entry)| entry.value.clone())
            .collect();

        while let Some(value) = work.pop() {
            let key = match &value {
                Value::Code(code) => Some(Rc::as_ptr(code) as usize),
                other => other.as_gc().map(Gc::addr),
            };
            if let Some(key) = key {
                if !seen.insert(key) {
                    continue;
                }
            }
            f(&value);

            match &value {
                Value::Code(code) => {
                    work.extend(code.lambdas.iter().map(|l| Value::Code(Rc::clone(l))));
                }
                Value::Closure(g) | Value::List(g) | Value::Hash(g) | Value::Iterator(g) => {
                    let body = g.body();
                    match &*body {
                        GcBody::Closure(c) => work.push(Value::Code(Rc::clone(&c.code))),
                        GcBody::Iterator(state) => match &state.source {
                            IterSource::List { list, .. } => work.push(Value::List(list.clone())),
                            IterSource::HashKeys { hash, .. } => {
                                work.push(Value::Hash(hash.clone()));
                            }
                            IterSource::Range { .. } | IterSource::Chars { .. } => {}
                        },
                        _ => {}
                    }
                    body.for_each_value(&mut |v| work.push(v.clone()));
                }
                _ => {}
            }
        }
    }
}

#[cfg(test)]
mod tests;
