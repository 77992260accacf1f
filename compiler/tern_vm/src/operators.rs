//! Binary and unary operators.
//!
//! Operand types decide the operation through a fixed ladder, tried in
//! order:
//! 1. `none` on either side: only `=` and `!=`, and `none` equals nothing.
//! 2. a list on either side: only `+`, which splices list operands.
//! 3. a string on either side: the other side is stringified.
//! 4. a float or double on either side: floating point, double wins.
//! 5. two integers: checked arithmetic, long if either side is long.
//!
//! Anything left over supports only identity equality. `and` and `or`
//! work on truthiness for every type.

use tern_ir::{BinOp, SymbolTable};

use crate::errors::{
    division_by_zero, integer_overflow, invalid_operands, type_mismatch, RuntimeResult,
};
use crate::heap::{GcBody, Heap};
use crate::value::Value;

#[inline]
fn checked_arith<T>(result: Option<T>, wrap: fn(T) -> Value, op_name: &'static str) -> RuntimeResult<Value> {
    result.map(wrap).ok_or_else(|| integer_overflow(op_name))
}

#[inline]
fn checked_div<T>(
    is_zero: bool,
    op: impl FnOnce() -> Option<T>,
    wrap: fn(T) -> Value,
    op_name: &'static str,
) -> RuntimeResult<Value> {
    if is_zero {
        Err(division_by_zero())
    } else {
        op().map(wrap).ok_or_else(|| integer_overflow(op_name))
    }
}

#[cold]
fn unsupported(op: BinOp, left: &Value, right: &Value) -> crate::errors::RuntimeError {
    invalid_operands(op.symbol(), left.type_name(), right.type_name())
}

/// Apply `op` to `left` and `right` (`left` was pushed first).
pub fn evaluate_binary(
    heap: &mut Heap,
    symbols: &SymbolTable,
    left: &Value,
    right: &Value,
    op: BinOp,
) -> RuntimeResult<Value> {
    match op {
        BinOp::And => return Ok(Value::bool(left.is_truthy() && right.is_truthy())),
        BinOp::Or => return Ok(Value::bool(left.is_truthy() || right.is_truthy())),
        _ => {}
    }

    match (left, right) {
        (Value::None, _) | (_, Value::None) => match op {
            BinOp::Eq => Ok(Value::bool(false)),
            BinOp::Ne => Ok(Value::bool(true)),
            _ => Err(unsupported(op, left, right)),
        },
        (Value::List(_), _) | (_, Value::List(_)) => {
            if op == BinOp::Add {
                Ok(concat_lists(heap, left, right))
            } else {
                Err(unsupported(op, left, right))
            }
        }
        (Value::Str(_), _) | (_, Value::Str(_)) => {
            let a = left.to_display_string(symbols);
            let b = right.to_display_string(symbols);
            eval_string_binary(&a, &b, op).ok_or_else(|| unsupported(op, left, right))
        }
        (Value::Double(_), _) | (_, Value::Double(_)) => {
            match (as_f64(left), as_f64(right)) {
                (Some(a), Some(b)) => eval_double_binary(a, b, op),
                _ => fallback(left, right, op),
            }
        }
        (Value::Float(_), _) | (_, Value::Float(_)) => {
            match (as_f32(left), as_f32(right)) {
                (Some(a), Some(b)) => eval_float_binary(a, b, op),
                _ => fallback(left, right, op),
            }
        }
        (Value::Int(a), Value::Int(b)) => eval_int_binary(*a, *b, op),
        (Value::Int(_) | Value::Long(_), Value::Int(_) | Value::Long(_)) => {
            match (as_i64(left), as_i64(right)) {
                (Some(a), Some(b)) => eval_long_binary(a, b, op),
                _ => fallback(left, right, op),
            }
        }
        _ => fallback(left, right, op),
    }
}

/// Identity equality for everything without arithmetic.
fn fallback(left: &Value, right: &Value, op: BinOp) -> RuntimeResult<Value> {
    match op {
        BinOp::Eq => Ok(Value::bool(left == right)),
        BinOp::Ne => Ok(Value::bool(left != right)),
        _ => Err(unsupported(op, left, right)),
    }
}

fn list_items(value: &Value) -> Option<Vec<Value>> {
    let Value::List(g) = value else {
        return None;
    };
    match &*g.body() {
        GcBody::List(items) => Some(items.clone()),
        _ => Some(Vec::new()),
    }
}

/// `+` with a list on at least one side. A non-list operand becomes a
/// single element.
fn concat_lists(heap: &mut Heap, left: &Value, right: &Value) -> Value {
    let mut items = list_items(left).unwrap_or_else(|| vec![left.clone()]);
    match list_items(right) {
        Some(more) => items.extend(more),
        None => items.push(right.clone()),
    }
    heap.new_list(items)
}

fn compare<T: PartialOrd + ?Sized>(a: &T, b: &T, op: BinOp) -> Option<bool> {
    Some(match op {
        BinOp::Eq => a == b,
        BinOp::Ne => a != b,
        BinOp::Lt => a < b,
        BinOp::Gt => a > b,
        BinOp::Le => a <= b,
        BinOp::Ge => a >= b,
        _ => return None,
    })
}

fn eval_string_binary(a: &str, b: &str, op: BinOp) -> Option<Value> {
    if op == BinOp::Add {
        let mut out = String::with_capacity(a.len() + b.len());
        out.push_str(a);
        out.push_str(b);
        return Some(Value::str(&out));
    }
    compare(a, b, op).map(Value::bool)
}

#[allow(
    clippy::cast_precision_loss,
    reason = "mixed integer and floating operands widen to floating point"
)]
fn as_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Int(v) => Some(f64::from(*v)),
        Value::Long(v) => Some(*v as f64),
        Value::Float(v) => Some(f64::from(*v)),
        Value::Double(v) => Some(*v),
        _ => None,
    }
}

#[allow(
    clippy::cast_precision_loss,
    reason = "mixed integer and float operands widen to float"
)]
fn as_f32(value: &Value) -> Option<f32> {
    match value {
        Value::Int(v) => Some(*v as f32),
        Value::Long(v) => Some(*v as f32),
        Value::Float(v) => Some(*v),
        _ => None,
    }
}

fn as_i64(value: &Value) -> Option<i64> {
    match value {
        Value::Int(v) => Some(i64::from(*v)),
        Value::Long(v) => Some(*v),
        _ => None,
    }
}

fn eval_double_binary(a: f64, b: f64, op: BinOp) -> RuntimeResult<Value> {
    match op {
        BinOp::Add => Ok(Value::Double(a + b)),
        BinOp::Sub => Ok(Value::Double(a - b)),
        BinOp::Mul => Ok(Value::Double(a * b)),
        BinOp::Div | BinOp::Mod if b == 0.0 => Err(division_by_zero()),
        BinOp::Div => Ok(Value::Double(a / b)),
        BinOp::Mod => Ok(Value::Double(a % b)),
        _ => compare(&a, &b, op)
            .map(Value::bool)
            .ok_or_else(|| type_mismatch("number", "double")),
    }
}

fn eval_float_binary(a: f32, b: f32, op: BinOp) -> RuntimeResult<Value> {
    match op {
        BinOp::Add => Ok(Value::Float(a + b)),
        BinOp::Sub => Ok(Value::Float(a - b)),
        BinOp::Mul => Ok(Value::Float(a * b)),
        BinOp::Div | BinOp::Mod if b == 0.0 => Err(division_by_zero()),
        BinOp::Div => Ok(Value::Float(a / b)),
        BinOp::Mod => Ok(Value::Float(a % b)),
        _ => compare(&a, &b, op)
            .map(Value::bool)
            .ok_or_else(|| type_mismatch("number", "float")),
    }
}

fn eval_int_binary(a: i32, b: i32, op: BinOp) -> RuntimeResult<Value> {
    match op {
        BinOp::Add => checked_arith(a.checked_add(b), Value::Int, "addition"),
        BinOp::Sub => checked_arith(a.checked_sub(b), Value::Int, "subtraction"),
        BinOp::Mul => checked_arith(a.checked_mul(b), Value::Int, "multiplication"),
        BinOp::Div => checked_div(b == 0, || a.checked_div(b), Value::Int, "division"),
        BinOp::Mod => checked_div(b == 0, || a.checked_rem(b), Value::Int, "remainder"),
        _ => compare(&a, &b, op)
            .map(Value::bool)
            .ok_or_else(|| type_mismatch("number", "int")),
    }
}

fn eval_long_binary(a: i64, b: i64, op: BinOp) -> RuntimeResult<Value> {
    match op {
        BinOp::Add => checked_arith(a.checked_add(b), Value::Long, "addition"),
        BinOp::Sub => checked_arith(a.checked_sub(b), Value::Long, "subtraction"),
        BinOp::Mul => checked_arith(a.checked_mul(b), Value::Long, "multiplication"),
        BinOp::Div => checked_div(b == 0, || a.checked_div(b), Value::Long, "division"),
        BinOp::Mod => checked_div(b == 0, || a.checked_rem(b), Value::Long, "remainder"),
        _ => compare(&a, &b, op)
            .map(Value::bool)
            .ok_or_else(|| type_mismatch("number", "long")),
    }
}

/// `neg`: arithmetic negation, checked for integers.
pub fn evaluate_neg(value: &Value) -> RuntimeResult<Value> {
    match value {
        Value::Int(v) => checked_arith(v.checked_neg(), Value::Int, "negation"),
        Value::Long(v) => checked_arith(v.checked_neg(), Value::Long, "negation"),
        Value::Float(v) => Ok(Value::Float(-v)),
        Value::Double(v) => Ok(Value::Double(-v)),
        other => Err(type_mismatch("number", other.type_name())),
    }
}

/// `not`: logical negation of truthiness.
pub fn evaluate_not(value: &Value) -> Value {
    Value::bool(!value.is_truthy())
}

#[cfg(test)]
mod tests;
