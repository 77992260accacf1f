#![allow(clippy::unwrap_used, reason = "tests unwrap known-good values")]

use crate::interpreter::{Runtime, RuntimeBuilder};
use crate::print_handler::silent_handler;
use crate::value::{RangeValue, Value};
use crate::TernError;
use pretty_assertions::assert_eq;

fn runtime() -> Runtime {
    RuntimeBuilder::new().print_handler(silent_handler()).build()
}

fn eval(src: &str) -> Vec<Value> {
    let mut rt = runtime();
    rt.run_source(src).unwrap();
    rt.stack().to_vec()
}

fn fails_with(src: &str) -> Option<&'static str> {
    let mut rt = runtime();
    let err: TernError = rt.run_source(src).unwrap_err();
    err.as_runtime().and_then(|e| e.kind.code())
}

#[test]
fn len_of_each_kind() {
    assert_eq!(
        eval("[1,2,3] len \"héllo\" len [% 1 2] len 2 7 range len"),
        vec![Value::Int(3), Value::Int(5), Value::Int(1), Value::Int(5)]
    );
    assert_eq!(fails_with("5 len"), Some("notcoll"));
}

#[test]
fn list_indexing() {
    assert_eq!(eval("1 [10,20,30] get"), vec![Value::Int(20)]);
    assert_eq!(eval("-1 [10,20,30] get"), vec![Value::Int(30)]);
    assert_eq!(fails_with("3 [1,2] get"), Some("outofrange"));
    assert_eq!(fails_with("1 5 [1,2] set"), Some("outofrange"));
}

#[test]
fn set_replaces_list_element() {
    let mut rt = runtime();
    rt.run_source("[1,2] !L 9 0 ?L set").unwrap();
    let list = rt.global("L").unwrap();
    assert_eq!(rt.display(&list), "[9,2]");
}

#[test]
fn hashes() {
    assert_eq!(eval("\"b\" [% \"a\" 1, \"b\" 2] get"), vec![Value::Int(2)]);
    assert_eq!(eval("\"z\" [% \"a\" 1] get"), vec![Value::None]);
    let mut rt = runtime();
    rt.run_source("[%] !H 5 `k ?H set `k ?H get ?H len").unwrap();
    assert_eq!(rt.stack(), &[Value::Int(5), Value::Int(1)][..]);
    assert_eq!(fails_with("0 [1] [%] set"), Some("nothashable"));
}

#[test]
fn string_indexing() {
    assert_eq!(eval("1 \"héllo\" get"), vec![Value::str("é")]);
}

#[test]
fn push_and_pop() {
    let mut rt = runtime();
    rt.run_source("[] !L 1 ?L push 2 ?L push ?L pop ?L len").unwrap();
    assert_eq!(rt.stack(), &[Value::Int(2), Value::Int(1)][..]);
    assert_eq!(fails_with("[] pop"), Some("outofrange"));
    assert_eq!(fails_with("1 2 push"), Some("badtype"));
}

#[test]
fn ranges() {
    assert_eq!(eval("0 3 range"), vec![Value::Range(RangeValue::new(0, 3, 1))]);
    assert_eq!(
        eval("10 0 -5 srange each { i }"),
        vec![Value::Int(10), Value::Int(5)]
    );
    assert_eq!(fails_with("0 3 0 srange"), Some("badop"));
    assert_eq!(fails_with("0 1.5 range"), Some("badtype"));
}

#[test]
fn type_names_are_symbols() {
    let mut rt = runtime();
    rt.run_source("1 type \"s\" type [] type").unwrap();
    let names: Vec<String> = rt.stack().iter().map(|v| rt.display(v)).collect();
    assert_eq!(names, vec!["int", "string", "list"]);
}

#[test]
fn conversions() {
    assert_eq!(
        eval("\"12\" int 3 long 1 float 2.5 int"),
        vec![
            Value::Int(12),
            Value::Long(3),
            Value::Float(1.0),
            Value::Int(2)
        ]
    );
    assert_eq!(eval("1 double"), vec![Value::Double(1.0)]);
    assert_eq!(eval("12 str"), vec![Value::str("12")]);
    assert_eq!(eval("none isnone 0 isnone"), vec![Value::Int(1), Value::Int(0)]);
    assert_eq!(fails_with("\"x\" int"), Some("badconv"));
}

#[test]
fn gc_word_reports_freed_objects() {
    let mut rt = runtime();
    rt.run_source("[] !A [?A] !B ?B ?A push 0 !A 0 !B gc").unwrap();
    assert_eq!(rt.stack(), &[Value::Int(2)][..]);
}

#[test]
fn core_words_can_be_left_out() {
    let mut rt = RuntimeBuilder::new()
        .core_words(false)
        .print_handler(silent_handler())
        .build();
    assert!(rt.feed("[1] len").is_err());
}
