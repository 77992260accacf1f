//! Process-wide symbol table.
//!
//! Symbols are interned names compared by integer id. The table is sharded
//! so several runtimes on different threads can intern concurrently; each
//! shard sits behind its own `RwLock`.

use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Interned symbol.
///
/// Layout: shard (top 4 bits) + index within the shard (low 28 bits).
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct Symbol(u32);

impl Symbol {
    /// Pre-interned empty name.
    pub const EMPTY: Symbol = Symbol(0);

    pub const MAX_LOCAL: u32 = 0x0FFF_FFFF;

    pub const NUM_SHARDS: usize = 16;

    #[inline]
    const fn new(shard: u32, local: u32) -> Self {
        debug_assert!(shard < 16);
        debug_assert!(local <= Self::MAX_LOCAL);
        Symbol((shard << 28) | local)
    }

    #[inline]
    const fn shard(self) -> usize {
        (self.0 >> 28) as usize
    }

    #[inline]
    const fn local(self) -> usize {
        (self.0 & Self::MAX_LOCAL) as usize
    }

    /// Raw id, stable for the life of the process.
    #[inline]
    pub const fn id(self) -> u32 {
        self.0
    }
}

impl fmt::Debug for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Symbol({}:{})", self.shard(), self.local())
    }
}

impl Default for Symbol {
    fn default() -> Self {
        Self::EMPTY
    }
}

/// Interning failed: a shard is full.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("symbol shard {shard} is full ({count} names)")]
pub struct SymbolOverflow {
    pub shard: usize,
    pub count: usize,
}

struct Shard {
    map: FxHashMap<&'static str, u32>,
    names: Vec<&'static str>,
}

impl Shard {
    fn new() -> Self {
        Self {
            map: FxHashMap::default(),
            names: Vec::with_capacity(64),
        }
    }
}

/// Sharded interner mapping names to [`Symbol`]s.
///
/// Interned names are never freed; a symbol stays valid for the life of the
/// process.
pub struct SymbolTable {
    shards: [RwLock<Shard>; Symbol::NUM_SHARDS],
    total: AtomicUsize,
}

impl SymbolTable {
    pub fn new() -> Self {
        let shards = std::array::from_fn(|i| {
            let mut shard = Shard::new();
            if i == 0 {
                shard.map.insert("", 0);
                shard.names.push("");
            }
            RwLock::new(shard)
        });
        Self {
            shards,
            total: AtomicUsize::new(1),
        }
    }

    #[inline]
    fn shard_for(s: &str) -> usize {
        let mut hash = 0u32;
        for byte in s.bytes().take(8) {
            hash = hash.wrapping_mul(31).wrapping_add(u32::from(byte));
        }
        (hash as usize) % Symbol::NUM_SHARDS
    }

    /// Intern `name`, returning its symbol.
    pub fn try_intern(&self, name: &str) -> Result<Symbol, SymbolOverflow> {
        let shard_idx = Self::shard_for(name);
        #[allow(
            clippy::cast_possible_truncation,
            reason = "shard index is bounded by NUM_SHARDS"
        )]
        let shard_u32 = shard_idx as u32;
        let shard = &self.shards[shard_idx];

        if let Some(&local) = shard.read().map.get(name) {
            return Ok(Symbol::new(shard_u32, local));
        }

        let mut guard = shard.write();
        if let Some(&local) = guard.map.get(name) {
            return Ok(Symbol::new(shard_u32, local));
        }
        let local = u32::try_from(guard.names.len())
            .ok()
            .filter(|l| *l <= Symbol::MAX_LOCAL)
            .ok_or(SymbolOverflow {
                shard: shard_idx,
                count: guard.names.len(),
            })?;
        let leaked: &'static str = Box::leak(name.to_owned().into_boxed_str());
        guard.names.push(leaked);
        guard.map.insert(leaked, local);
        self.total.fetch_add(1, Ordering::Relaxed);
        Ok(Symbol::new(shard_u32, local))
    }

    /// Intern `name`.
    ///
    /// # Panics
    /// Panics if a shard holds more than 2^28 names.
    #[inline]
    pub fn intern(&self, name: &str) -> Symbol {
        self.try_intern(name).unwrap_or_else(|e| panic!("{e}"))
    }

    /// Find an already-interned name without interning it.
    pub fn get(&self, name: &str) -> Option<Symbol> {
        let shard_idx = Self::shard_for(name);
        #[allow(
            clippy::cast_possible_truncation,
            reason = "shard index is bounded by NUM_SHARDS"
        )]
        let shard_u32 = shard_idx as u32;
        let local = *self.shards[shard_idx].read().map.get(name)?;
        Some(Symbol::new(shard_u32, local))
    }

    /// Name of `sym`. Unknown symbols (from another table) read as `""`.
    pub fn name(&self, sym: Symbol) -> &'static str {
        let guard = self.shards[sym.shard()].read();
        guard.names.get(sym.local()).copied().unwrap_or("")
    }

    pub fn len(&self) -> usize {
        self.total.load(Ordering::Relaxed)
    }

    /// True when only the empty name is interned.
    pub fn is_empty(&self) -> bool {
        self.len() <= 1
    }
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new()
    }
}

/// Symbol table shared between runtimes (and threads).
#[derive(Clone, Default)]
pub struct SharedSymbols(Arc<SymbolTable>);

impl SharedSymbols {
    pub fn new() -> Self {
        SharedSymbols(Arc::new(SymbolTable::new()))
    }
}

impl std::ops::Deref for SharedSymbols {
    type Target = SymbolTable;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl fmt::Debug for SharedSymbols {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharedSymbols")
            .field("len", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests;
