//! Capability traits: how each kind behaves as a number, a hash key, an
//! iterable or a callable.

use std::rc::Rc;

use tern_lexer::{parse_number, Number};

use crate::errors::{bad_conversion, not_collection, not_hashable, RuntimeResult};
use crate::heap::{Gc, GcBody, Heap, IterSource};

use super::{HashKey, RangeValue, Value};

/// Numeric conversion.
pub trait Numeric {
    fn to_int(&self) -> RuntimeResult<i32>;
    fn to_long(&self) -> RuntimeResult<i64>;
    fn to_float(&self) -> RuntimeResult<f32>;
    fn to_double(&self) -> RuntimeResult<f64>;
}

/// A value narrowed to one of the four numeric kinds.
fn as_number(value: &Value, to: &'static str) -> RuntimeResult<Number> {
    match value {
        Value::Int(v) => Ok(Number::Int(*v)),
        Value::Long(v) => Ok(Number::Long(*v)),
        Value::Float(v) => Ok(Number::Float(*v)),
        Value::Double(v) => Ok(Number::Double(*v)),
        Value::Str(s) => {
            parse_number(s.trim()).ok_or_else(|| bad_conversion(&format!("string \"{s}\""), to))
        }
        other => Err(bad_conversion(other.type_name(), to)),
    }
}

#[allow(
    clippy::cast_possible_truncation,
    reason = "float to integer conversion truncates toward zero by definition"
)]
fn f64_to_i64(v: f64, to: &'static str) -> RuntimeResult<i64> {
    // i64::MAX is not exactly representable; the bound is exclusive.
    if v.is_nan() || v < -9.223_372_036_854_775_808e18 || v >= 9.223_372_036_854_775_808e18 {
        return Err(bad_conversion(&v.to_string(), to));
    }
    Ok(v as i64)
}

impl Numeric for Value {
    fn to_int(&self) -> RuntimeResult<i32> {
        let wide = self.to_long()?;
        i32::try_from(wide).map_err(|_| bad_conversion(&wide.to_string(), "int"))
    }

    fn to_long(&self) -> RuntimeResult<i64> {
        match as_number(self, "long")? {
            Number::Int(v) => Ok(i64::from(v)),
            Number::Long(v) => Ok(v),
            Number::Float(v) => f64_to_i64(f64::from(v), "long"),
            Number::Double(v) => f64_to_i64(v, "long"),
        }
    }

    fn to_float(&self) -> RuntimeResult<f32> {
        #[allow(
            clippy::cast_possible_truncation,
            reason = "single precision is the requested result"
        )]
        let narrowed = self.to_double()? as f32;
        Ok(narrowed)
    }

    fn to_double(&self) -> RuntimeResult<f64> {
        #[allow(
            clippy::cast_precision_loss,
            reason = "longs beyond 2^53 round to the nearest double"
        )]
        let value = match as_number(self, "double")? {
            Number::Int(v) => f64::from(v),
            Number::Long(v) => v as f64,
            Number::Float(v) => f64::from(v),
            Number::Double(v) => v,
        };
        Ok(value)
    }
}

/// Hash key derivation.
pub trait Hashable {
    fn hash_key(&self) -> RuntimeResult<HashKey>;
}

impl Hashable for Value {
    fn hash_key(&self) -> RuntimeResult<HashKey> {
        match self {
            Value::Int(v) => Ok(HashKey::Integer(i64::from(*v))),
            Value::Long(v) => Ok(HashKey::Integer(*v)),
            Value::Float(v) => Ok(HashKey::Float(f64::from(*v).to_bits())),
            Value::Double(v) => Ok(HashKey::Float(v.to_bits())),
            Value::Str(s) => Ok(HashKey::Str(Rc::clone(s))),
            Value::Symbol(s) => Ok(HashKey::Symbol(s.id())),
            Value::Code(c) => Ok(HashKey::Identity(Rc::as_ptr(c) as usize)),
            Value::Closure(g) => Ok(HashKey::Identity(g.addr())),
            Value::Native(id) => Ok(HashKey::Identity(id.0 as usize)),
            Value::Object(o) => Ok(HashKey::Identity(Rc::as_ptr(o).cast::<()>() as usize)),
            Value::None
            | Value::List(_)
            | Value::Hash(_)
            | Value::Iterator(_)
            | Value::Range(_) => Err(not_hashable(self.type_name())),
        }
    }
}

/// Iterator construction.
pub trait Iterable {
    /// A fresh heap iterator over this value. An iterator value yields
    /// itself.
    fn make_iterator(&self, heap: &mut Heap) -> RuntimeResult<Gc>;
}

impl Iterable for Value {
    fn make_iterator(&self, heap: &mut Heap) -> RuntimeResult<Gc> {
        let source = match self {
            Value::List(g) => IterSource::List {
                list: g.clone(),
                pos: 0,
            },
            Value::Hash(g) => IterSource::HashKeys {
                hash: g.clone(),
                pos: 0,
            },
            Value::Iterator(g) => return Ok(g.clone()),
            Value::Range(r) => IterSource::Range {
                range: *r,
                next: r.start,
            },
            Value::Str(s) => IterSource::Chars {
                text: Rc::clone(s),
                offset: 0,
            },
            Value::Int(n) => count_up(i64::from(*n)),
            Value::Long(n) => count_up(*n),
            other => return Err(not_collection(other.type_name())),
        };
        Ok(heap.new_iterator(source))
    }
}

fn count_up(n: i64) -> IterSource {
    IterSource::Range {
        range: RangeValue::new(0, n, 1),
        next: 0,
    }
}

/// What calling a value runs.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum CallableKind {
    Code,
    Closure,
    Native,
}

pub trait Callable {
    /// `None` when the value cannot be called.
    fn callable_kind(&self) -> Option<CallableKind>;
}

impl Callable for Value {
    fn callable_kind(&self) -> Option<CallableKind> {
        match self {
            Value::Code(_) => Some(CallableKind::Code),
            Value::Closure(g) => match g.try_body().as_deref() {
                Ok(GcBody::Closure(_)) => Some(CallableKind::Closure),
                _ => None,
            },
            Value::Native(_) => Some(CallableKind::Native),
            _ => None,
        }
    }
}
