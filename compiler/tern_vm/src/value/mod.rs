//! Runtime values.
//!
//! `Value` is a tagged sum. Scalars are stored inline; strings and code are
//! shared through `Rc`; the four garbage-collected kinds (closure, list,
//! hash, iterator) hold a [`Gc`] registered with the runtime's heap.
//!
//! Cloning a value is copy-assignment: the source's count is incremented
//! before the destination's old value is released, so `x = x.clone()` is
//! always safe.

mod hash;
mod traits;

use std::any::Any;
use std::fmt;
use std::rc::Rc;

use tern_ir::{CodeBlock, Symbol, SymbolTable};

use crate::heap::{Gc, GcBody};

pub use hash::{HashKey, HashTable};
pub use traits::{Callable, CallableKind, Hashable, Iterable, Numeric};

/// Stable type descriptor.
///
/// Ids are part of the serialized form and must never be renumbered.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ValueType {
    None = 0,
    Int = 1,
    Float = 2,
    Double = 3,
    Long = 4,
    Str = 5,
    Symbol = 6,
    Code = 7,
    Closure = 8,
    List = 9,
    Hash = 10,
    Iterator = 11,
    Range = 12,
    Native = 13,
    Object = 14,
}

impl ValueType {
    pub const ALL: [ValueType; 15] = [
        ValueType::None,
        ValueType::Int,
        ValueType::Float,
        ValueType::Double,
        ValueType::Long,
        ValueType::Str,
        ValueType::Symbol,
        ValueType::Code,
        ValueType::Closure,
        ValueType::List,
        ValueType::Hash,
        ValueType::Iterator,
        ValueType::Range,
        ValueType::Native,
        ValueType::Object,
    ];

    #[inline]
    pub fn id(self) -> u8 {
        self as u8
    }

    pub fn from_id(id: u8) -> Option<ValueType> {
        ValueType::ALL.get(usize::from(id)).copied()
    }

    pub fn name(self) -> &'static str {
        match self {
            ValueType::None => "none",
            ValueType::Int => "int",
            ValueType::Float => "float",
            ValueType::Double => "double",
            ValueType::Long => "long",
            ValueType::Str => "string",
            ValueType::Symbol => "symbol",
            ValueType::Code => "code",
            ValueType::Closure => "closure",
            ValueType::List => "list",
            ValueType::Hash => "hash",
            ValueType::Iterator => "iterator",
            ValueType::Range => "range",
            ValueType::Native => "native",
            ValueType::Object => "object",
        }
    }

    /// Garbage-collected kinds.
    pub fn is_collected(self) -> bool {
        matches!(
            self,
            ValueType::Closure | ValueType::List | ValueType::Hash | ValueType::Iterator
        )
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Integer range: `start` up to (excluding) `end` by `step`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct RangeValue {
    pub start: i64,
    pub end: i64,
    pub step: i64,
}

impl RangeValue {
    pub fn new(start: i64, end: i64, step: i64) -> Self {
        RangeValue { start, end, step }
    }

    /// Whether `value` is still inside the range.
    #[inline]
    pub fn contains(&self, value: i64) -> bool {
        match self.step.signum() {
            1 => value < self.end,
            -1 => value > self.end,
            _ => false,
        }
    }

    pub fn len(&self) -> usize {
        if !self.contains(self.start) {
            return 0;
        }
        let span = self.end.abs_diff(self.start);
        let step = self.step.unsigned_abs();
        usize::try_from(span.div_ceil(step)).unwrap_or(usize::MAX)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Embedder or plugin object carried by [`Value::Object`].
pub trait NativeObject {
    /// Name matched by the `A`/`B` native argument letters.
    fn type_name(&self) -> &str;

    fn display(&self) -> String {
        format!("<{}>", self.type_name())
    }

    fn as_any(&self) -> &dyn Any;
}

/// Index of a registered native function.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct NativeId(pub u32);

#[derive(Clone, Default)]
pub enum Value {
    #[default]
    None,
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    Str(Rc<str>),
    Symbol(Symbol),
    Code(Rc<CodeBlock>),
    Closure(Gc),
    List(Gc),
    Hash(Gc),
    Iterator(Gc),
    Range(RangeValue),
    Native(NativeId),
    Object(Rc<dyn NativeObject>),
}

impl Value {
    #[inline]
    pub fn str(s: &str) -> Value {
        Value::Str(Rc::from(s))
    }

    pub fn value_type(&self) -> ValueType {
        match self {
            Value::None => ValueType::None,
            Value::Int(_) => ValueType::Int,
            Value::Long(_) => ValueType::Long,
            Value::Float(_) => ValueType::Float,
            Value::Double(_) => ValueType::Double,
            Value::Str(_) => ValueType::Str,
            Value::Symbol(_) => ValueType::Symbol,
            Value::Code(_) => ValueType::Code,
            Value::Closure(_) => ValueType::Closure,
            Value::List(_) => ValueType::List,
            Value::Hash(_) => ValueType::Hash,
            Value::Iterator(_) => ValueType::Iterator,
            Value::Range(_) => ValueType::Range,
            Value::Native(_) => ValueType::Native,
            Value::Object(_) => ValueType::Object,
        }
    }

    /// Type name for messages; objects report their own type name.
    pub fn type_name(&self) -> &str {
        match self {
            Value::Object(o) => o.type_name(),
            other => other.value_type().name(),
        }
    }

    #[inline]
    pub fn is_none(&self) -> bool {
        matches!(self, Value::None)
    }

    /// Truthiness: `none` is false, numbers are true when non-zero, strings
    /// when non-empty; everything else is true.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::None => false,
            Value::Int(v) => *v != 0,
            Value::Long(v) => *v != 0,
            Value::Float(v) => *v != 0.0,
            Value::Double(v) => *v != 0.0,
            Value::Str(s) => !s.is_empty(),
            _ => true,
        }
    }

    #[inline]
    pub fn bool(b: bool) -> Value {
        Value::Int(i32::from(b))
    }

    /// The collected object behind this value, if any.
    pub fn as_gc(&self) -> Option<&Gc> {
        match self {
            Value::Closure(g) | Value::List(g) | Value::Hash(g) | Value::Iterator(g) => Some(g),
            _ => None,
        }
    }

    /// Display conversion. Containers already being printed show as `[...]`.
    pub fn to_display_string(&self, symbols: &SymbolTable) -> String {
        let mut out = String::new();
        let mut path = Vec::new();
        crate::stack::ensure_sufficient_stack(|| write_display(&mut out, self, symbols, &mut path));
        out
    }
}

fn write_display(out: &mut String, value: &Value, symbols: &SymbolTable, path: &mut Vec<usize>) {
    use std::fmt::Write as _;
    match value {
        Value::None => out.push_str("none"),
        Value::Int(v) => {
            let _ = write!(out, "{v}");
        }
        Value::Long(v) => {
            let _ = write!(out, "{v}");
        }
        Value::Float(v) => {
            let _ = write!(out, "{v}");
        }
        Value::Double(v) => {
            let _ = write!(out, "{v}");
        }
        Value::Str(s) => out.push_str(s),
        Value::Symbol(s) => out.push_str(symbols.name(*s)),
        Value::Code(c) => {
            let _ = write!(out, "<code {}>", c.display_name());
        }
        Value::Range(r) => {
            let _ = write!(out, "<range {} {} {}>", r.start, r.end, r.step);
        }
        Value::Native(id) => {
            let _ = write!(out, "<native {}>", id.0);
        }
        Value::Object(o) => out.push_str(&o.display()),
        Value::Closure(g) | Value::List(g) | Value::Hash(g) | Value::Iterator(g) => {
            if path.contains(&g.addr()) {
                out.push_str("[...]");
                return;
            }
            path.push(g.addr());
            let Ok(body) = g.try_body() else {
                out.push_str("[...]");
                path.pop();
                return;
            };
            match &*body {
                GcBody::List(items) => {
                    out.push('[');
                    for (i, item) in items.iter().enumerate() {
                        if i > 0 {
                            out.push(',');
                        }
                        write_display(out, item, symbols, path);
                    }
                    out.push(']');
                }
                GcBody::Hash(table) => {
                    out.push_str("[%");
                    for (i, (k, v)) in table.iter().enumerate() {
                        out.push_str(if i > 0 { ", " } else { " " });
                        write_display(out, k, symbols, path);
                        out.push(' ');
                        write_display(out, v, symbols, path);
                    }
                    out.push(']');
                }
                GcBody::Closure(c) => {
                    let _ = write!(out, "<closure {}>", c.code.display_name());
                }
                GcBody::Iterator(_) => out.push_str("<iterator>"),
                GcBody::Cleared => out.push_str("<cleared>"),
            }
            path.pop();
        }
    }
}

/// Equality: numbers and strings by value, symbols by id, everything else
/// by identity.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::None, Value::None) => true,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Long(a), Value::Long(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Double(a), Value::Double(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Symbol(a), Value::Symbol(b)) => a == b,
            (Value::Code(a), Value::Code(b)) => Rc::ptr_eq(a, b),
            (Value::Closure(a), Value::Closure(b))
            | (Value::List(a), Value::List(b))
            | (Value::Hash(a), Value::Hash(b))
            | (Value::Iterator(a), Value::Iterator(b)) => a.ptr_eq(b),
            (Value::Range(a), Value::Range(b)) => a == b,
            (Value::Native(a), Value::Native(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::None => write!(f, "None"),
            Value::Int(v) => write!(f, "Int({v})"),
            Value::Long(v) => write!(f, "Long({v})"),
            Value::Float(v) => write!(f, "Float({v:?})"),
            Value::Double(v) => write!(f, "Double({v:?})"),
            Value::Str(s) => write!(f, "Str({s:?})"),
            Value::Symbol(s) => write!(f, "{s:?}"),
            Value::Code(c) => write!(f, "Code({})", c.display_name()),
            Value::Closure(g) => write!(f, "Closure(#{})", g.handle().index),
            Value::List(g) => write!(f, "List(#{})", g.handle().index),
            Value::Hash(g) => write!(f, "Hash(#{})", g.handle().index),
            Value::Iterator(g) => write!(f, "Iterator(#{})", g.handle().index),
            Value::Range(r) => write!(f, "{r:?}"),
            Value::Native(id) => write!(f, "Native({})", id.0),
            Value::Object(o) => write!(f, "Object({})", o.type_name()),
        }
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Long(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Double(v)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::str(s)
    }
}
