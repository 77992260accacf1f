#![allow(clippy::unwrap_used, reason = "tests unwrap known-good values")]

use super::*;
use crate::heap::Heap;
use pretty_assertions::assert_eq;

fn noop() -> NativeFn {
    Rc::new(|_, _| Ok(()))
}

#[test]
fn parse_letters() {
    let spec = ArgSpec::parse("nislchvA", &["file"]).unwrap();
    assert_eq!(spec.len(), 8);
    assert_eq!(spec.args[7], ArgKind::Object(Rc::from("file")));
    assert!(ArgSpec::parse("", &[]).unwrap().is_empty());
}

#[test]
fn parse_rejects_unknown_letters() {
    let err = ArgSpec::parse("nx", &[]).unwrap_err();
    assert_eq!(err.kind.code(), Some("badop"));
    let err = ArgSpec::parse("B", &["only_a"]).unwrap_err();
    assert_eq!(err.kind.code(), Some("badop"));
}

#[test]
fn take_pops_deepest_first() {
    let symbols = SymbolTable::new();
    let spec = ArgSpec::parse("is", &[]).unwrap();
    let mut stack = vec![Value::Int(0), Value::Long(7), Value::Double(1.5)];
    let args = spec.take(&mut stack, &symbols).unwrap();
    assert_eq!(args.as_slice(), &[Value::Long(7), Value::str("1.5")]);
    assert_eq!(stack, vec![Value::Int(0)]);
}

#[test]
fn take_checks_types() {
    let symbols = SymbolTable::new();
    let mut heap = Heap::default();
    let spec = ArgSpec::parse("l", &[]).unwrap();
    let mut stack = vec![Value::Int(1)];
    let err = spec.take(&mut stack, &symbols).unwrap_err();
    assert_eq!(err.kind.code(), Some("badtype"));

    let mut stack = vec![heap.new_list(Vec::new())];
    assert_eq!(spec.take(&mut stack, &symbols).unwrap().len(), 1);

    let spec = ArgSpec::parse("c", &[]).unwrap();
    let mut stack = vec![Value::Native(NativeId(0))];
    assert!(spec.take(&mut stack, &symbols).is_ok());
}

#[test]
fn take_underflow() {
    let symbols = SymbolTable::new();
    let spec = ArgSpec::parse("vv", &[]).unwrap();
    let mut stack = vec![Value::Int(1)];
    let err = spec.take(&mut stack, &symbols).unwrap_err();
    assert_eq!(err.kind.code(), Some("stackunderflow"));
    assert_eq!(stack.len(), 1);
}

#[test]
fn registry_replaces_in_place() {
    let mut reg = NativeRegistry::new();
    let a = reg.register("a", None, noop());
    let b = reg.register("b", Some(ArgSpec::parse("v", &[]).unwrap()), noop());
    assert_ne!(a, b);
    assert_eq!(reg.register("a", None, noop()), a);
    assert_eq!(reg.len(), 2);
    assert_eq!(reg.lookup("b"), Some(b));
    assert_eq!(reg.name(b), "b");
    assert_eq!(reg.lookup("c"), None);
}
