//! Hash keys and the insertion-ordered hash table.

use std::rc::Rc;

use rustc_hash::FxHashMap;

use super::Value;

/// Normalised key derived from a hashable value.
///
/// Ints and longs with the same numeric value are the same key. Floats and
/// doubles key on the bit pattern of their `f64` widening.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum HashKey {
    Integer(i64),
    Float(u64),
    Str(Rc<str>),
    Symbol(u32),
    /// Code, closures, natives and objects hash by identity.
    Identity(usize),
}

/// Hash table preserving insertion order.
#[derive(Clone, Debug, Default)]
pub struct HashTable {
    entries: Vec<(Value, Value)>,
    index: FxHashMap<HashKey, usize>,
}

impl HashTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace; the original position of a replaced key is kept.
    pub fn insert(&mut self, key: HashKey, key_value: Value, value: Value) {
        match self.index.get(&key) {
            Some(&pos) => self.entries[pos].1 = value,
            None => {
                self.index.insert(key, self.entries.len());
                self.entries.push((key_value, value));
            }
        }
    }

    pub fn get(&self, key: &HashKey) -> Option<&Value> {
        self.index.get(key).map(|&pos| &self.entries[pos].1)
    }

    pub fn contains(&self, key: &HashKey) -> bool {
        self.index.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Key at insertion position `n`.
    pub fn key_at(&self, n: usize) -> Option<&Value> {
        self.entries.get(n).map(|(k, _)| k)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Value, &Value)> {
        self.entries.iter().map(|(k, v)| (k, v))
    }
}
