#![allow(clippy::unwrap_used, reason = "tests unwrap known-good values")]

use rustc_hash::FxHashMap;

use crate::interpreter::{Runtime, RuntimeBuilder};
use crate::print_handler::silent_handler;
use crate::value::{Value, ValueType};

fn runtime() -> Runtime {
    RuntimeBuilder::new()
        .core_words(true)
        .print_handler(silent_handler())
        .build()
}

fn census(rt: &Runtime) -> FxHashMap<ValueType, usize> {
    let mut counts = FxHashMap::default();
    rt.visit_reachable(&mut |v| *counts.entry(v.value_type()).or_insert(0) += 1);
    counts
}

#[test]
fn shared_objects_are_visited_once() {
    let mut rt = runtime();
    rt.run_source("[1,2] !A ?A !B [?A, ?B] !C").unwrap();
    let counts = census(&rt);
    // A, B and C's items all name the same list; C is the second one.
    assert_eq!(counts.get(&ValueType::List), Some(&2));
}

#[test]
fn cycles_terminate() {
    let mut rt = runtime();
    rt.run_source("[] !A [?A] !B ?B ?A push").unwrap();
    assert_eq!(census(&rt).get(&ValueType::List), Some(&2));
}

#[test]
fn code_blocks_and_lambdas_are_reached() {
    let mut rt = runtime();
    rt.run_source(":adder |x:| (?x +) ;\n5 adder !Inc").unwrap();
    let counts = census(&rt);
    assert_eq!(counts.get(&ValueType::Closure), Some(&1));

    let mut names = Vec::new();
    rt.visit_reachable(&mut |v| {
        if let Value::Code(code) = v {
            names.push(code.display_name().to_string());
        }
    });
    // The word itself and its lambda, which the closure also references.
    assert_eq!(names.len(), 2);
    assert!(names.iter().any(|n| n == "adder"));
}

#[test]
fn values_inside_hashes_are_visited() {
    let mut rt = runtime();
    rt.run_source("[% `k [7]] !H").unwrap();
    let mut ints = Vec::new();
    rt.visit_reachable(&mut |v| {
        if let Value::Int(n) = v {
            ints.push(*n);
        }
    });
    assert!(ints.contains(&7));
    assert_eq!(census(&rt).get(&ValueType::Hash), Some(&1));
}
