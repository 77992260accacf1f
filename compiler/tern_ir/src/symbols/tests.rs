use super::*;

#[test]
fn intern_is_idempotent() {
    let table = SymbolTable::new();
    let a = table.intern("divzero");
    let b = table.intern("badtype");
    assert_eq!(a, table.intern("divzero"));
    assert_ne!(a, b);
    assert_eq!(table.name(a), "divzero");
    assert_eq!(table.name(b), "badtype");
}

#[test]
fn empty_name_is_preinterned() {
    let table = SymbolTable::new();
    assert!(table.is_empty());
    assert_eq!(table.intern(""), Symbol::EMPTY);
    assert_eq!(table.name(Symbol::EMPTY), "");
}

#[test]
fn get_does_not_intern() {
    let table = SymbolTable::new();
    assert_eq!(table.get("missing"), None);
    assert_eq!(table.len(), 1);
    let sym = table.intern("present");
    assert_eq!(table.get("present"), Some(sym));
    assert_eq!(table.len(), 2);
}

#[test]
fn shared_table_is_shared() {
    let shared = SharedSymbols::new();
    let other = shared.clone();
    assert_eq!(shared.intern("x"), other.intern("x"));
    assert_eq!(other.len(), 2);
}

#[test]
fn interning_from_threads_agrees() {
    let shared = SharedSymbols::new();
    let handles: Vec<_> = (0..4)
        .map(|_| {
            let table = shared.clone();
            std::thread::spawn(move || {
                (0..50)
                    .map(|i| table.intern(&format!("name{i}")))
                    .collect::<Vec<_>>()
            })
        })
        .collect();
    let results: Vec<Vec<Symbol>> = handles
        .into_iter()
        .map(|h| h.join().unwrap_or_default())
        .collect();
    for r in &results[1..] {
        assert_eq!(r, &results[0]);
    }
    assert_eq!(shared.len(), 51);
}
