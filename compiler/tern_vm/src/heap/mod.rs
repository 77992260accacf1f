//! Garbage-collected objects and their arena.
//!
//! Closures, lists, hashes and iterators are `Rc`-owned [`GcCell`]s. The
//! ordinary reference count frees acyclic garbage deterministically; the
//! [cycle collector](Heap::collect) finds the rest by trial deletion.
//!
//! Every object is registered in the heap's slot arena when it is created.
//! A registration is a `Weak`, so it never keeps an object alive; a slot
//! whose object has died is recycled (with a new generation) the next time
//! dead registrations are pruned.

mod collect;

use std::cell::{BorrowError, BorrowMutError, Ref, RefCell, RefMut};
use std::rc::{Rc, Weak};
use std::sync::Arc;

use parking_lot::{Mutex, MutexGuard};

use tern_ir::CodeBlock;

use crate::value::{HashTable, RangeValue, Value};

/// Generation-checked arena position of an object.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct GcHandle {
    pub index: u32,
    pub generation: u32,
}

/// A closure: code plus the values captured when its lambda was evaluated.
#[derive(Debug)]
pub struct ClosureData {
    pub code: Rc<CodeBlock>,
    pub table: Vec<Value>,
}

/// Where an iterator draws its values from.
#[derive(Debug)]
pub enum IterSource {
    /// Elements of a list, read live by position.
    List { list: Gc, pos: usize },
    /// Keys of a hash in insertion order.
    HashKeys { hash: Gc, pos: usize },
    Range { range: RangeValue, next: i64 },
    /// One-character strings.
    Chars { text: Rc<str>, offset: usize },
}

#[derive(Debug)]
pub struct IterState {
    pub source: IterSource,
    /// Value produced by the last successful `advance`.
    pub current: Value,
}

impl IterState {
    pub fn new(source: IterSource) -> Self {
        IterState {
            source,
            current: Value::None,
        }
    }

    /// Step to the next value. Returns `false` once exhausted.
    pub fn advance(&mut self) -> bool {
        let next = match &mut self.source {
            IterSource::List { list, pos } => {
                let item = match list.try_body().as_deref() {
                    Ok(GcBody::List(items)) => items.get(*pos).cloned(),
                    _ => None,
                };
                *pos += 1;
                item
            }
            IterSource::HashKeys { hash, pos } => {
                let key = match hash.try_body().as_deref() {
                    Ok(GcBody::Hash(table)) => table.key_at(*pos).cloned(),
                    _ => None,
                };
                *pos += 1;
                key
            }
            IterSource::Range { range, next } => {
                if range.contains(*next) {
                    let value = *next;
                    match next.checked_add(range.step) {
                        Some(n) => *next = n,
                        // Past the representable range: exhaust after this value.
                        None => *next = range.end,
                    }
                    Some(i32::try_from(value).map_or(Value::Long(value), Value::Int))
                } else {
                    None
                }
            }
            IterSource::Chars { text, offset } => {
                text.get(*offset..).and_then(|rest| rest.chars().next()).map(|ch| {
                    *offset += ch.len_utf8();
                    let mut buf = [0u8; 4];
                    Value::str(ch.encode_utf8(&mut buf))
                })
            }
        };
        match next {
            Some(v) => {
                self.current = v;
                true
            }
            None => {
                self.current = Value::None;
                false
            }
        }
    }
}

/// Contents of a collected object.
#[derive(Debug)]
pub enum GcBody {
    List(Vec<Value>),
    Hash(HashTable),
    Closure(ClosureData),
    Iterator(IterState),
    /// Emptied by the cycle collector.
    Cleared,
}

impl GcBody {
    /// Call `f` for every collected object this body references.
    pub fn for_each_child(&self, f: &mut dyn FnMut(&Gc)) {
        let mut visit = |v: &Value| {
            if let Some(g) = v.as_gc() {
                f(g);
            }
        };
        match self {
            GcBody::List(items) => items.iter().for_each(&mut visit),
            GcBody::Hash(table) => {
                for (k, v) in table.iter() {
                    visit(k);
                    visit(v);
                }
            }
            GcBody::Closure(c) => c.table.iter().for_each(&mut visit),
            GcBody::Iterator(it) => {
                match &it.source {
                    IterSource::List { list: g, .. } | IterSource::HashKeys { hash: g, .. } => {
                        f(g);
                    }
                    IterSource::Range { .. } | IterSource::Chars { .. } => {}
                }
                if let Some(g) = it.current.as_gc() {
                    f(g);
                }
            }
            GcBody::Cleared => {}
        }
    }

    /// Every value held directly by this body.
    pub fn for_each_value(&self, f: &mut dyn FnMut(&Value)) {
        match self {
            GcBody::List(items) => items.iter().for_each(f),
            GcBody::Hash(table) => {
                for (k, v) in table.iter() {
                    f(k);
                    f(v);
                }
            }
            GcBody::Closure(c) => c.table.iter().for_each(f),
            GcBody::Iterator(it) => f(&it.current),
            GcBody::Cleared => {}
        }
    }
}

pub struct GcCell {
    handle: GcHandle,
    body: RefCell<GcBody>,
}

/// Shared owning pointer to a collected object.
#[derive(Clone)]
pub struct Gc(Rc<GcCell>);

impl Gc {
    #[inline]
    pub fn handle(&self) -> GcHandle {
        self.0.handle
    }

    /// Borrow the body.
    ///
    /// # Panics
    /// Panics if the body is mutably borrowed.
    #[inline]
    pub fn body(&self) -> Ref<'_, GcBody> {
        self.0.body.borrow()
    }

    #[inline]
    pub fn try_body(&self) -> Result<Ref<'_, GcBody>, BorrowError> {
        self.0.body.try_borrow()
    }

    /// Mutably borrow the body.
    ///
    /// # Panics
    /// Panics if the body is already borrowed.
    #[inline]
    pub fn body_mut(&self) -> RefMut<'_, GcBody> {
        self.0.body.borrow_mut()
    }

    #[inline]
    pub fn try_body_mut(&self) -> Result<RefMut<'_, GcBody>, BorrowMutError> {
        self.0.body.try_borrow_mut()
    }

    #[inline]
    pub fn ptr_eq(&self, other: &Gc) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    /// Address used for identity hashing and visited sets.
    #[inline]
    pub fn addr(&self) -> usize {
        Rc::as_ptr(&self.0) as usize
    }

    pub fn strong_count(&self) -> usize {
        Rc::strong_count(&self.0)
    }
}

impl std::fmt::Debug for Gc {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Gc(#{}.{})", self.0.handle.index, self.0.handle.generation)
    }
}

/// Process-wide counters guarded by [`GlobalLock`].
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct GlobalCounters {
    /// Registered objects across every heap using the lock (updated on
    /// registration and when dead registrations are pruned).
    pub live_objects: usize,
    pub collections: u64,
}

/// Optional process-wide lock. When installed, heap registration and
/// collection run under it.
#[derive(Clone, Debug, Default)]
pub struct GlobalLock(Arc<Mutex<GlobalCounters>>);

impl GlobalLock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn counters(&self) -> GlobalCounters {
        *self.0.lock()
    }

    fn lock(&self) -> MutexGuard<'_, GlobalCounters> {
        self.0.lock()
    }
}

struct Slot {
    generation: u32,
    cell: Option<Weak<GcCell>>,
}

/// Slot arena of registered objects.
pub struct Heap {
    slots: Vec<Slot>,
    free: Vec<u32>,
    /// Slots currently holding a registration (live or dead).
    registered: usize,
    /// Prune dead registrations when `registered` reaches this.
    prune_at: usize,
    lock: Option<GlobalLock>,
}

const MIN_PRUNE_AT: usize = 256;

impl Heap {
    pub fn new(lock: Option<GlobalLock>) -> Self {
        Heap {
            slots: Vec::new(),
            free: Vec::new(),
            registered: 0,
            prune_at: MIN_PRUNE_AT,
            lock,
        }
    }

    /// Register a new object.
    pub fn alloc(&mut self, body: GcBody) -> Gc {
        let lock = self.lock.clone();
        let mut guard = lock.as_ref().map(GlobalLock::lock);

        if self.free.is_empty() && self.registered >= self.prune_at {
            let pruned = self.prune();
            if let Some(g) = guard.as_mut() {
                g.live_objects = g.live_objects.saturating_sub(pruned);
            }
            self.prune_at = MIN_PRUNE_AT.max(self.registered * 2);
        }

        let index = match self.free.pop() {
            Some(i) => i,
            None => {
                let i = u32::try_from(self.slots.len())
                    .unwrap_or_else(|_| crate::fatal("heap slot arena exhausted"));
                self.slots.push(Slot {
                    generation: 0,
                    cell: None,
                });
                i
            }
        };
        let slot = &mut self.slots[index as usize];
        let handle = GcHandle {
            index,
            generation: slot.generation,
        };
        let cell = Rc::new(GcCell {
            handle,
            body: RefCell::new(body),
        });
        slot.cell = Some(Rc::downgrade(&cell));
        self.registered += 1;
        if let Some(g) = guard.as_mut() {
            g.live_objects += 1;
        }
        Gc(cell)
    }

    pub fn new_list(&mut self, items: Vec<Value>) -> Value {
        Value::List(self.alloc(GcBody::List(items)))
    }

    pub fn new_hash(&mut self, table: HashTable) -> Value {
        Value::Hash(self.alloc(GcBody::Hash(table)))
    }

    pub fn new_closure(&mut self, code: Rc<CodeBlock>, table: Vec<Value>) -> Value {
        Value::Closure(self.alloc(GcBody::Closure(ClosureData { code, table })))
    }

    pub fn new_iterator(&mut self, source: IterSource) -> Gc {
        self.alloc(GcBody::Iterator(IterState::new(source)))
    }

    /// Look up a registered object by handle; `None` once it has died or
    /// the slot was reused.
    pub fn get(&self, handle: GcHandle) -> Option<Gc> {
        let slot = self.slots.get(handle.index as usize)?;
        if slot.generation != handle.generation {
            return None;
        }
        slot.cell.as_ref()?.upgrade().map(Gc)
    }

    /// Number of live registered objects.
    pub fn live_count(&mut self) -> usize {
        let lock = self.lock.clone();
        let mut guard = lock.as_ref().map(GlobalLock::lock);
        let pruned = self.prune();
        if let Some(g) = guard.as_mut() {
            g.live_objects = g.live_objects.saturating_sub(pruned);
        }
        self.registered
    }

    /// Free the slots of dead objects. Returns how many were freed.
    fn prune(&mut self) -> usize {
        let mut pruned = 0;
        for (i, slot) in self.slots.iter_mut().enumerate() {
            let dead = slot.cell.as_ref().is_some_and(|w| w.strong_count() == 0);
            if dead {
                slot.cell = None;
                slot.generation = slot.generation.wrapping_add(1);
                if let Ok(index) = u32::try_from(i) {
                    self.free.push(index);
                }
                pruned += 1;
            }
        }
        self.registered -= pruned;
        pruned
    }

    /// Upgrade every live registration.
    fn live_objects(&self) -> Vec<Gc> {
        self.slots
            .iter()
            .filter_map(|s| s.cell.as_ref()?.upgrade().map(Gc))
            .collect()
    }
}

impl Default for Heap {
    fn default() -> Self {
        Heap::new(None)
    }
}

#[cfg(test)]
mod tests;
