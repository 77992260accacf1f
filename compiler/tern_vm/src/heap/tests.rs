use super::*;
use pretty_assertions::assert_eq;

fn code() -> Rc<CodeBlock> {
    Rc::new(CodeBlock::empty(Rc::from("test")))
}

fn push(list: &Value, item: Value) {
    if let Value::List(g) = list {
        if let GcBody::List(items) = &mut *g.body_mut() {
            items.push(item);
        }
    }
}

#[test]
fn acyclic_garbage_is_freed_by_reference_count() {
    let mut heap = Heap::default();
    let list = heap.new_list(vec![Value::Int(1)]);
    let inner = heap.new_list(vec![list.clone()]);
    assert_eq!(heap.live_count(), 2);
    drop(list);
    assert_eq!(heap.live_count(), 2);
    drop(inner);
    assert_eq!(heap.live_count(), 0);
    assert_eq!(heap.collect(), 0);
}

#[test]
fn self_referencing_list_is_collected() {
    let mut heap = Heap::default();
    let list = heap.new_list(Vec::new());
    push(&list, list.clone());
    drop(list);
    assert_eq!(heap.live_count(), 1);
    assert_eq!(heap.collect(), 1);
    assert_eq!(heap.live_count(), 0);
}

#[test]
fn mutually_capturing_closures_are_collected() {
    let mut heap = Heap::default();
    let a = heap.new_closure(code(), Vec::new());
    let b = heap.new_closure(code(), vec![a.clone()]);
    if let Value::Closure(g) = &a {
        if let GcBody::Closure(c) = &mut *g.body_mut() {
            c.table.push(b.clone());
        }
    }
    let keep = heap.new_list(vec![Value::Int(7)]);
    drop(a);
    drop(b);
    assert_eq!(heap.live_count(), 3);
    assert_eq!(heap.collect(), 2);
    assert_eq!(heap.live_count(), 1);
    drop(keep);
}

#[test]
fn rooted_cycle_survives() {
    let mut heap = Heap::default();
    let a = heap.new_list(Vec::new());
    let b = heap.new_list(vec![a.clone()]);
    push(&a, b.clone());
    drop(b);
    let before = heap.live_count();
    assert_eq!(heap.collect(), 0);
    assert_eq!(heap.live_count(), before);
    // The cycle is still intact.
    if let Value::List(g) = &a {
        if let GcBody::List(items) = &*g.body() {
            assert_eq!(items.len(), 1);
        }
    }
}

#[test]
fn cycle_reachable_from_rooted_container_survives() {
    let mut heap = Heap::default();
    let a = heap.new_list(Vec::new());
    let b = heap.new_list(vec![a.clone()]);
    push(&a, b.clone());
    let root = heap.new_hash(HashTable::new());
    if let Value::Hash(g) = &root {
        if let GcBody::Hash(t) = &mut *g.body_mut() {
            t.insert(crate::value::HashKey::Integer(1), Value::Int(1), a.clone());
        }
    }
    drop(a);
    drop(b);
    assert_eq!(heap.collect(), 0);
    assert_eq!(heap.live_count(), 3);
    drop(root);
    assert_eq!(heap.collect(), 2);
    assert_eq!(heap.live_count(), 0);
}

#[test]
fn iterator_sources_are_traced() {
    let mut heap = Heap::default();
    let list = heap.new_list(Vec::new());
    let Value::List(g) = &list else {
        unreachable!()
    };
    let iter = heap.new_iterator(IterSource::List {
        list: g.clone(),
        pos: 0,
    });
    push(&list, Value::Iterator(iter));
    drop(list);
    assert_eq!(heap.live_count(), 2);
    assert_eq!(heap.collect(), 2);
    assert_eq!(heap.live_count(), 0);
}

#[test]
fn self_assignment_keeps_object_and_count() {
    let mut heap = Heap::default();
    let mut x = heap.new_list(vec![Value::Int(1)]);
    let count = x.as_gc().map(Gc::strong_count);
    #[allow(clippy::redundant_clone, reason = "exercises copy-assignment onto itself")]
    let copy = x.clone();
    x = copy;
    assert_eq!(x.as_gc().map(Gc::strong_count), count);
    assert_eq!(heap.live_count(), 1);
}

#[test]
fn stale_handles_do_not_resolve() {
    let mut heap = Heap::default();
    let list = heap.new_list(Vec::new());
    let handle = list.as_gc().map(Gc::handle);
    let handle = handle.unwrap_or(GcHandle {
        index: u32::MAX,
        generation: 0,
    });
    assert!(heap.get(handle).is_some());
    drop(list);
    assert_eq!(heap.live_count(), 0);
    assert!(heap.get(handle).is_none());
    let reused = heap.new_list(Vec::new());
    let new_handle = reused.as_gc().map(Gc::handle);
    assert_eq!(new_handle.map(|h| h.index), Some(handle.index));
    assert_ne!(new_handle.map(|h| h.generation), Some(handle.generation));
}

#[test]
fn global_lock_tracks_counters() {
    let lock = GlobalLock::new();
    let mut heap = Heap::new(Some(lock.clone()));
    let list = heap.new_list(Vec::new());
    push(&list, list.clone());
    assert_eq!(lock.counters().live_objects, 1);
    drop(list);
    heap.collect();
    assert_eq!(
        lock.counters(),
        GlobalCounters {
            live_objects: 0,
            collections: 1
        }
    );
}

#[test]
fn range_iteration() {
    let mut it = IterState::new(IterSource::Range {
        range: RangeValue::new(0, 3, 1),
        next: 0,
    });
    let mut seen = Vec::new();
    while it.advance() {
        seen.push(it.current.clone());
    }
    assert_eq!(seen, vec![Value::Int(0), Value::Int(1), Value::Int(2)]);
    assert!(it.current.is_none());
}

#[test]
fn descending_range_and_chars() {
    let mut it = IterState::new(IterSource::Range {
        range: RangeValue::new(3, 0, -2),
        next: 3,
    });
    let mut seen = Vec::new();
    while it.advance() {
        seen.push(it.current.clone());
    }
    assert_eq!(seen, vec![Value::Int(3), Value::Int(1)]);

    let mut chars = IterState::new(IterSource::Chars {
        text: Rc::from("hé"),
        offset: 0,
    });
    assert!(chars.advance());
    assert_eq!(chars.current, Value::str("h"));
    assert!(chars.advance());
    assert_eq!(chars.current, Value::str("é"));
    assert!(!chars.advance());
}
