//! Core words registered on every runtime built with `core_words(true)`.
//!
//! Collection words take the collection last: `key coll get`,
//! `value key coll set`, `value list push`.

use crate::errors::{bad_operation, not_collection, out_of_range, RuntimeResult};
use crate::heap::GcBody;
use crate::interpreter::Runtime;
use crate::value::{Hashable, Numeric, RangeValue, Value};

pub(crate) fn register(rt: &mut Runtime) {
    define(rt, "p", "v", |rt, args| {
        let text = rt.display(&args[0]);
        rt.print.print(&text);
        Ok(())
    });
    define(rt, "nl", "", |rt, _| {
        rt.print.println("");
        Ok(())
    });
    define(rt, "len", "v", |rt, args| {
        let len = length(&args[0])?;
        rt.push(int_or_long(len))
    });
    define(rt, "get", "vv", |rt, args| {
        let value = get(&args[1], &args[0])?;
        rt.push(value)
    });
    define(rt, "set", "vvv", |_, args| set(&args[2], &args[1], args[0].clone()));
    define(rt, "push", "vl", |_, args| {
        if let Value::List(g) = &args[1] {
            if let GcBody::List(items) = &mut *g.body_mut() {
                items.push(args[0].clone());
            }
        }
        Ok(())
    });
    define(rt, "pop", "l", |rt, args| {
        let popped = match &args[0] {
            Value::List(g) => match &mut *g.body_mut() {
                GcBody::List(items) => items.pop(),
                _ => None,
            },
            _ => None,
        };
        rt.push(popped.ok_or_else(|| out_of_range(-1))?)
    });
    define(rt, "range", "ii", |rt, args| {
        let range = RangeValue::new(args[0].to_long()?, args[1].to_long()?, 1);
        rt.push(Value::Range(range))
    });
    define(rt, "srange", "iii", |rt, args| {
        let step = args[2].to_long()?;
        if step == 0 {
            return Err(bad_operation("range step must not be zero"));
        }
        let range = RangeValue::new(args[0].to_long()?, args[1].to_long()?, step);
        rt.push(Value::Range(range))
    });
    define(rt, "type", "v", |rt, args| {
        let sym = rt.symbols.intern(args[0].type_name());
        rt.push(Value::Symbol(sym))
    });
    define(rt, "gc", "", |rt, _| {
        let freed = rt.gc();
        rt.push(int_or_long(freed))
    });
    define(rt, "int", "v", |rt, args| {
        let v = args[0].to_int()?;
        rt.push(Value::Int(v))
    });
    define(rt, "long", "v", |rt, args| {
        let v = args[0].to_long()?;
        rt.push(Value::Long(v))
    });
    define(rt, "float", "v", |rt, args| {
        let v = args[0].to_float()?;
        rt.push(Value::Float(v))
    });
    define(rt, "double", "v", |rt, args| {
        let v = args[0].to_double()?;
        rt.push(Value::Double(v))
    });
    define(rt, "str", "s", |rt, args| rt.push(args[0].clone()));
    define(rt, "isnone", "v", |rt, args| rt.push(Value::bool(args[0].is_none())));
}

fn define<F>(rt: &mut Runtime, name: &str, spec: &str, func: F)
where
    F: Fn(&mut Runtime, &[Value]) -> RuntimeResult<()> + 'static,
{
    if let Err(err) = rt.register_native(name, spec, func) {
        crate::fatal(&format!("core word `{name}`: {err}"));
    }
}

fn int_or_long(n: usize) -> Value {
    match i32::try_from(n) {
        Ok(v) => Value::Int(v),
        Err(_) => Value::Long(i64::try_from(n).unwrap_or(i64::MAX)),
    }
}

fn length(value: &Value) -> RuntimeResult<usize> {
    match value {
        Value::Str(s) => Ok(s.chars().count()),
        Value::Range(r) => Ok(r.len()),
        Value::List(g) | Value::Hash(g) => match &*g.body() {
            GcBody::List(items) => Ok(items.len()),
            GcBody::Hash(table) => Ok(table.len()),
            _ => Err(not_collection(value.type_name())),
        },
        other => Err(not_collection(other.type_name())),
    }
}

/// Resolve a possibly negative index against `len`.
fn index(key: &Value, len: usize) -> RuntimeResult<usize> {
    let i = key.to_long()?;
    let len_i = i64::try_from(len).unwrap_or(i64::MAX);
    let resolved = if i < 0 { i + len_i } else { i };
    if (0..len_i).contains(&resolved) {
        usize::try_from(resolved).map_err(|_| out_of_range(i))
    } else {
        Err(out_of_range(i))
    }
}

fn get(coll: &Value, key: &Value) -> RuntimeResult<Value> {
    match coll {
        Value::List(g) | Value::Hash(g) => match &*g.body() {
            GcBody::List(items) => Ok(items[index(key, items.len())?].clone()),
            GcBody::Hash(table) => Ok(table.get(&key.hash_key()?).cloned().unwrap_or(Value::None)),
            _ => Err(not_collection(coll.type_name())),
        },
        Value::Str(s) => {
            let at = index(key, s.chars().count())?;
            Ok(s.chars().nth(at).map_or(Value::None, |c| Value::str(c.encode_utf8(&mut [0; 4]))))
        }
        other => Err(not_collection(other.type_name())),
    }
}

fn set(coll: &Value, key: &Value, value: Value) -> RuntimeResult<()> {
    match coll {
        Value::List(g) | Value::Hash(g) => {
            let old = match &mut *g.body_mut() {
                GcBody::List(items) => {
                    let at = index(key, items.len())?;
                    std::mem::replace(&mut items[at], value)
                }
                GcBody::Hash(table) => {
                    table.insert(key.hash_key()?, key.clone(), value);
                    Value::None
                }
                _ => return Err(not_collection(coll.type_name())),
            };
            drop(old);
            Ok(())
        }
        other => Err(not_collection(other.type_name())),
    }
}

#[cfg(test)]
mod tests;
