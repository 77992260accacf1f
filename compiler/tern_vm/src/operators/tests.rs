#![allow(clippy::unwrap_used, reason = "tests unwrap known-good values")]

use super::*;
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use tern_ir::SymbolTable;

fn eval(left: &Value, right: &Value, op: BinOp) -> RuntimeResult<Value> {
    let mut heap = Heap::default();
    let symbols = SymbolTable::new();
    evaluate_binary(&mut heap, &symbols, left, right, op)
}

fn code_of(result: RuntimeResult<Value>) -> Option<&'static str> {
    result.err().and_then(|e| e.kind.code())
}

#[test]
fn integer_arithmetic() {
    assert_eq!(eval(&Value::Int(2), &Value::Int(3), BinOp::Add).unwrap(), Value::Int(5));
    assert_eq!(eval(&Value::Int(7), &Value::Int(2), BinOp::Div).unwrap(), Value::Int(3));
    assert_eq!(eval(&Value::Int(-7), &Value::Int(2), BinOp::Mod).unwrap(), Value::Int(-1));
    assert_eq!(eval(&Value::Int(2), &Value::Long(3), BinOp::Mul).unwrap(), Value::Long(6));
    assert_eq!(eval(&Value::Int(2), &Value::Int(3), BinOp::Lt).unwrap(), Value::Int(1));
    assert_eq!(eval(&Value::Long(3), &Value::Int(3), BinOp::Eq).unwrap(), Value::Int(1));
}

#[test]
fn integer_errors() {
    assert_eq!(code_of(eval(&Value::Int(1), &Value::Int(0), BinOp::Div)), Some("divzero"));
    assert_eq!(code_of(eval(&Value::Long(1), &Value::Int(0), BinOp::Mod)), Some("divzero"));
    assert_eq!(
        code_of(eval(&Value::Int(i32::MAX), &Value::Int(1), BinOp::Add)),
        Some("overflow")
    );
    assert_eq!(
        code_of(eval(&Value::Int(i32::MIN), &Value::Int(-1), BinOp::Div)),
        Some("overflow")
    );
}

#[test]
fn floating_point() {
    assert_eq!(
        eval(&Value::Int(1), &Value::Float(0.5), BinOp::Add).unwrap(),
        Value::Float(1.5)
    );
    assert_eq!(
        eval(&Value::Float(0.5), &Value::Double(0.25), BinOp::Add).unwrap(),
        Value::Double(0.75)
    );
    assert_eq!(
        code_of(eval(&Value::Double(1.0), &Value::Int(0), BinOp::Div)),
        Some("divzero")
    );
    assert_eq!(
        eval(&Value::Double(2.0), &Value::Long(3), BinOp::Ge).unwrap(),
        Value::Int(0)
    );
}

#[test]
fn strings_stringify_the_other_side() {
    assert_eq!(
        eval(&Value::str("5"), &Value::Int(3), BinOp::Add).unwrap(),
        Value::str("53")
    );
    assert_eq!(
        eval(&Value::Int(3), &Value::str("x"), BinOp::Add).unwrap(),
        Value::str("3x")
    );
    assert_eq!(
        eval(&Value::str("abc"), &Value::str("abd"), BinOp::Lt).unwrap(),
        Value::Int(1)
    );
    assert_eq!(
        code_of(eval(&Value::str("a"), &Value::Int(2), BinOp::Mul)),
        Some("badtype")
    );
}

#[test]
fn none_equals_nothing() {
    assert_eq!(eval(&Value::None, &Value::None, BinOp::Eq).unwrap(), Value::Int(0));
    assert_eq!(eval(&Value::None, &Value::Int(0), BinOp::Ne).unwrap(), Value::Int(1));
    assert_eq!(code_of(eval(&Value::None, &Value::Int(1), BinOp::Add)), Some("badtype"));
}

#[test]
fn list_concatenation() {
    let mut heap = Heap::default();
    let symbols = SymbolTable::new();
    let a = heap.new_list(vec![Value::Int(1)]);
    let b = heap.new_list(vec![Value::Int(2), Value::Int(3)]);
    let joined = evaluate_binary(&mut heap, &symbols, &a, &b, BinOp::Add).unwrap();
    assert_eq!(joined.to_display_string(&symbols), "[1,2,3]");
    let appended = evaluate_binary(&mut heap, &symbols, &a, &Value::Int(9), BinOp::Add).unwrap();
    assert_eq!(appended.to_display_string(&symbols), "[1,9]");
    let prepended = evaluate_binary(&mut heap, &symbols, &Value::str("s"), &a, BinOp::Add).unwrap();
    assert_eq!(prepended.to_display_string(&symbols), "[s,1]");
    // Operands are untouched.
    assert_eq!(a.to_display_string(&symbols), "[1]");
    let err = evaluate_binary(&mut heap, &symbols, &a, &b, BinOp::Sub);
    assert_eq!(code_of(err), Some("badtype"));
}

#[test]
fn logic_uses_truthiness() {
    assert_eq!(eval(&Value::str("x"), &Value::Int(2), BinOp::And).unwrap(), Value::Int(1));
    assert_eq!(eval(&Value::None, &Value::Int(0), BinOp::Or).unwrap(), Value::Int(0));
    assert_eq!(evaluate_not(&Value::None), Value::Int(1));
    assert_eq!(evaluate_not(&Value::Int(4)), Value::Int(0));
}

#[test]
fn symbols_compare_by_identity() {
    let symbols = SymbolTable::new();
    let a = Value::Symbol(symbols.intern("a"));
    let b = Value::Symbol(symbols.intern("b"));
    assert_eq!(eval(&a, &a, BinOp::Eq).unwrap(), Value::Int(1));
    assert_eq!(eval(&a, &b, BinOp::Eq).unwrap(), Value::Int(0));
    assert_eq!(code_of(eval(&a, &b, BinOp::Lt)), Some("badtype"));
}

#[test]
fn negation() {
    assert_eq!(evaluate_neg(&Value::Int(3)).unwrap(), Value::Int(-3));
    assert_eq!(evaluate_neg(&Value::Double(1.5)).unwrap(), Value::Double(-1.5));
    assert_eq!(code_of(evaluate_neg(&Value::Int(i32::MIN))), Some("overflow"));
    assert_eq!(code_of(evaluate_neg(&Value::str("x"))), Some("badtype"));
}

proptest! {
    #[test]
    fn int_addition_matches_wide_arithmetic(a in any::<i32>(), b in any::<i32>()) {
        let wide = i64::from(a) + i64::from(b);
        let result = eval(&Value::Int(a), &Value::Int(b), BinOp::Add);
        match i32::try_from(wide) {
            Ok(sum) => prop_assert_eq!(result.unwrap(), Value::Int(sum)),
            Err(_) => prop_assert_eq!(code_of(result), Some("overflow")),
        }
    }

    #[test]
    fn comparisons_agree_with_rust(a in any::<i64>(), b in any::<i64>()) {
        let lt = eval(&Value::Long(a), &Value::Long(b), BinOp::Lt).unwrap();
        prop_assert_eq!(lt, Value::bool(a < b));
        let ge = eval(&Value::Long(a), &Value::Long(b), BinOp::Ge).unwrap();
        prop_assert_eq!(ge, Value::bool(a >= b));
    }

    #[test]
    fn division_identity(a in any::<i32>(), b in any::<i32>().prop_filter("non-zero", |b| *b != 0)) {
        prop_assume!(!(a == i32::MIN && b == -1));
        let q = eval(&Value::Int(a), &Value::Int(b), BinOp::Div).unwrap();
        let r = eval(&Value::Int(a), &Value::Int(b), BinOp::Mod).unwrap();
        let (Value::Int(q), Value::Int(r)) = (q, r) else {
            panic!("integer division produced a non-int");
        };
        prop_assert_eq!(i64::from(q) * i64::from(b) + i64::from(r), i64::from(a));
    }
}
