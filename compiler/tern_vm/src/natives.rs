//! Native functions registered by the embedder.
//!
//! A native is a name, an optional argument spec and a Rust closure. With a
//! spec the interpreter pops and type-checks the arguments before the call
//! and hands them over deepest first; without one the native works on the
//! operand stack directly.

use std::fmt;
use std::rc::Rc;

use rustc_hash::FxHashMap;
use smallvec::SmallVec;
use tern_ir::SymbolTable;

use crate::errors::{bad_operation, stack_underflow, type_mismatch, RuntimeResult};
use crate::interpreter::Runtime;
use crate::value::{Callable, NativeId, Value, ValueType};

pub type NativeFn = Rc<dyn Fn(&mut Runtime, &[Value]) -> RuntimeResult<()>>;

/// Popped native arguments, deepest first.
pub type NativeArgs = SmallVec<[Value; 4]>;

/// One argument letter.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ArgKind {
    /// `n`: int, long, float or double.
    Number,
    /// `i`: int or long.
    Integer,
    /// `s`: any value, stringified.
    Str,
    /// `c`: code, closure or native.
    Callable,
    /// `l`
    List,
    /// `h`
    Hash,
    /// `v`: anything.
    Any,
    /// `A`/`B`: an object whose type name is given at registration.
    Object(Rc<str>),
}

/// Parsed argument spec. The first entry is the deepest argument.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ArgSpec {
    args: Vec<ArgKind>,
}

impl ArgSpec {
    /// Parse `spec`; `A` and `B` take their type names from `objects`.
    pub fn parse(spec: &str, objects: &[&str]) -> RuntimeResult<ArgSpec> {
        let mut args = Vec::with_capacity(spec.len());
        for ch in spec.chars() {
            let kind = match ch {
                'n' => ArgKind::Number,
                'i' => ArgKind::Integer,
                's' => ArgKind::Str,
                'c' => ArgKind::Callable,
                'l' => ArgKind::List,
                'h' => ArgKind::Hash,
                'v' => ArgKind::Any,
                'A' | 'B' => {
                    let slot = usize::from(ch == 'B');
                    let Some(name) = objects.get(slot) else {
                        return Err(bad_operation(format!(
                            "argument spec `{spec}` uses `{ch}` without an object type name"
                        )));
                    };
                    ArgKind::Object(Rc::from(*name))
                }
                other => {
                    return Err(bad_operation(format!(
                        "unknown argument letter `{other}` in `{spec}`"
                    )))
                }
            };
            args.push(kind);
        }
        Ok(ArgSpec { args })
    }

    pub fn len(&self) -> usize {
        self.args.len()
    }

    pub fn is_empty(&self) -> bool {
        self.args.is_empty()
    }

    /// Pop and check the arguments from the top of `stack`.
    pub(crate) fn take(
        &self,
        stack: &mut Vec<Value>,
        symbols: &SymbolTable,
    ) -> RuntimeResult<NativeArgs> {
        let n = self.args.len();
        if stack.len() < n {
            return Err(stack_underflow());
        }
        let start = stack.len() - n;
        let mut out = NativeArgs::new();
        for (kind, value) in self.args.iter().zip(stack.drain(start..)) {
            out.push(check_arg(kind, value, symbols)?);
        }
        Ok(out)
    }
}

fn check_arg(kind: &ArgKind, value: Value, symbols: &SymbolTable) -> RuntimeResult<Value> {
    let ok = match kind {
        ArgKind::Any => true,
        ArgKind::Str => {
            return Ok(match value {
                Value::Str(_) => value,
                other => Value::str(&other.to_display_string(symbols)),
            })
        }
        ArgKind::Number => matches!(
            value.value_type(),
            ValueType::Int | ValueType::Long | ValueType::Float | ValueType::Double
        ),
        ArgKind::Integer => matches!(value, Value::Int(_) | Value::Long(_)),
        ArgKind::Callable => value.callable_kind().is_some(),
        ArgKind::List => matches!(value, Value::List(_)),
        ArgKind::Hash => matches!(value, Value::Hash(_)),
        ArgKind::Object(name) => matches!(&value, Value::Object(o) if o.type_name() == &**name),
    };
    if ok {
        Ok(value)
    } else {
        Err(type_mismatch(kind.expected(), value.type_name()))
    }
}

impl ArgKind {
    fn expected(&self) -> &str {
        match self {
            ArgKind::Number => "number",
            ArgKind::Integer => "integer",
            ArgKind::Str => "string",
            ArgKind::Callable => "callable",
            ArgKind::List => "list",
            ArgKind::Hash => "hash",
            ArgKind::Any => "any",
            ArgKind::Object(name) => name,
        }
    }
}

pub struct Native {
    pub name: Rc<str>,
    /// `None`: the native manages the stack itself.
    pub spec: Option<ArgSpec>,
    pub func: NativeFn,
}

impl fmt::Debug for Native {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Native")
            .field("name", &self.name)
            .field("spec", &self.spec)
            .finish_non_exhaustive()
    }
}

/// Registered natives, indexed by [`NativeId`].
#[derive(Debug, Default)]
pub struct NativeRegistry {
    natives: Vec<Native>,
    index: FxHashMap<Rc<str>, u32>,
}

impl NativeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register or replace `name`. Replacing keeps the id, so code already
    /// compiled against the old native calls the new one.
    pub fn register(&mut self, name: &str, spec: Option<ArgSpec>, func: NativeFn) -> NativeId {
        if let Some(&id) = self.index.get(name) {
            let native = &mut self.natives[id as usize];
            native.spec = spec;
            native.func = func;
            return NativeId(id);
        }
        let id = u32::try_from(self.natives.len())
            .unwrap_or_else(|_| crate::fatal("native id space exhausted"));
        let name: Rc<str> = Rc::from(name);
        self.index.insert(Rc::clone(&name), id);
        self.natives.push(Native { name, spec, func });
        NativeId(id)
    }

    pub fn lookup(&self, name: &str) -> Option<NativeId> {
        self.index.get(name).map(|&id| NativeId(id))
    }

    pub fn get(&self, id: NativeId) -> Option<&Native> {
        self.natives.get(id.0 as usize)
    }

    pub fn name(&self, id: NativeId) -> &str {
        self.get(id).map_or("", |n| &n.name)
    }

    pub fn len(&self) -> usize {
        self.natives.len()
    }

    pub fn is_empty(&self) -> bool {
        self.natives.is_empty()
    }
}

#[cfg(test)]
mod tests;
