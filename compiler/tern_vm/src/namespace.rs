//! Append-only name tables.
//!
//! Indices handed out by [`Namespace::add`] are baked into compiled code,
//! so an entry is never removed or renumbered. [`Namespace::clear`] resets
//! every value to `none` and keeps the names.

use std::rc::Rc;

use rustc_hash::FxHashMap;

use crate::errors::{bad_operation, RuntimeResult};
use crate::value::Value;

#[derive(Debug)]
pub struct Entry {
    pub name: Rc<str>,
    pub value: Value,
    pub is_const: bool,
}

#[derive(Debug, Default)]
pub struct Namespace {
    entries: Vec<Entry>,
    index: FxHashMap<Rc<str>, u32>,
}

impl Namespace {
    pub fn new() -> Self {
        Self::default()
    }

    /// Index of `name`, creating an empty entry if it is new.
    pub fn add(&mut self, name: &str) -> u32 {
        if let Some(&idx) = self.index.get(name) {
            return idx;
        }
        let idx = u32::try_from(self.entries.len())
            .unwrap_or_else(|_| crate::fatal("namespace index space exhausted"));
        let name: Rc<str> = Rc::from(name);
        self.index.insert(Rc::clone(&name), idx);
        self.entries.push(Entry {
            name,
            value: Value::None,
            is_const: false,
        });
        idx
    }

    pub fn get(&self, name: &str) -> Option<u32> {
        self.index.get(name).copied()
    }

    pub fn entry(&self, idx: u32) -> Option<&Entry> {
        self.entries.get(idx as usize)
    }

    /// Value at `idx`; `none` for an index this table never issued.
    pub fn value(&self, idx: u32) -> Value {
        self.entry(idx).map_or(Value::None, |e| e.value.clone())
    }

    pub fn name(&self, idx: u32) -> &str {
        self.entry(idx).map_or("", |e| &e.name)
    }

    /// Assign a non-constant entry.
    pub fn set(&mut self, idx: u32, value: Value) -> RuntimeResult<()> {
        let Some(entry) = self.entries.get_mut(idx as usize) else {
            return Err(bad_operation(format!("no namespace entry {idx}")));
        };
        if entry.is_const {
            return Err(bad_operation(format!("`{}` is constant", entry.name)));
        }
        entry.value = value;
        Ok(())
    }

    /// Bind a word body. Word entries are never constant.
    pub fn bind_word(&mut self, idx: u32, value: Value) {
        if let Some(entry) = self.entries.get_mut(idx as usize) {
            debug_assert!(!entry.is_const, "word `{}` marked constant", entry.name);
            entry.value = value;
        }
    }

    /// Bind `idx` and mark it constant. Rebinding a constant is allowed.
    pub fn set_const(&mut self, idx: u32, value: Value) -> RuntimeResult<()> {
        let Some(entry) = self.entries.get_mut(idx as usize) else {
            return Err(bad_operation(format!("no namespace entry {idx}")));
        };
        entry.value = value;
        entry.is_const = true;
        Ok(())
    }

    /// Reset every value to `none`. Names, indices and const flags stay.
    pub fn clear(&mut self) {
        for entry in &mut self.entries {
            entry.value = Value::None;
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (u32, &Entry)> {
        (0u32..).zip(self.entries.iter())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
