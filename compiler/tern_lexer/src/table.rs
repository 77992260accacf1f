//! Caller-supplied token table.
//!
//! The table maps keywords, single special characters and two-character
//! digraphs to caller-chosen ids. The tokeniser consults it while scanning;
//! anything not in the table is an identifier, literal or error.

use rustc_hash::FxHashMap;

/// Caller-chosen identifier for a keyword, special character or digraph.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TokenId(pub u16);

/// Registered keywords, specials, digraphs and the comment marker.
#[derive(Clone, Debug)]
pub struct TokenTable {
    keywords: FxHashMap<Box<str>, TokenId>,
    /// Indexed by ASCII byte.
    specials: [Option<TokenId>; 128],
    digraphs: Vec<([u8; 2], TokenId)>,
    comment: Box<[u8]>,
}

impl TokenTable {
    /// Create an empty table with `#` as the comment marker.
    pub fn new() -> Self {
        Self {
            keywords: FxHashMap::default(),
            specials: [None; 128],
            digraphs: Vec::new(),
            comment: Box::from(&b"#"[..]),
        }
    }

    /// Register a keyword.
    #[must_use]
    pub fn keyword(mut self, word: &str, id: TokenId) -> Self {
        self.keywords.insert(Box::from(word), id);
        self
    }

    /// Register a single special character. Non-ASCII bytes are ignored.
    #[must_use]
    pub fn special(mut self, ch: u8, id: TokenId) -> Self {
        if let Some(slot) = self.specials.get_mut(usize::from(ch)) {
            *slot = Some(id);
        }
        self
    }

    /// Register a two-character operator. Digraphs win over specials.
    #[must_use]
    pub fn digraph(mut self, text: &str, id: TokenId) -> Self {
        if let [a, b] = *text.as_bytes() {
            self.digraphs.retain(|(d, _)| *d != [a, b]);
            self.digraphs.push(([a, b], id));
        }
        self
    }

    /// Replace the single-line comment marker. An empty marker disables
    /// comments.
    #[must_use]
    pub fn comment_marker(mut self, marker: &str) -> Self {
        self.comment = Box::from(marker.as_bytes());
        self
    }

    pub fn keyword_id(&self, word: &str) -> Option<TokenId> {
        self.keywords.get(word).copied()
    }

    pub fn special_id(&self, ch: u8) -> Option<TokenId> {
        self.specials.get(usize::from(ch)).copied().flatten()
    }

    pub fn digraph_id(&self, a: u8, b: u8) -> Option<TokenId> {
        self.digraphs
            .iter()
            .find(|(d, _)| *d == [a, b])
            .map(|(_, id)| *id)
    }

    pub fn comment(&self) -> &[u8] {
        &self.comment
    }
}

impl Default for TokenTable {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests;
