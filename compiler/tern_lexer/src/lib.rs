//! Tern Lexer - table-driven tokeniser for the Tern scripting language.
//!
//! The tokeniser knows nothing about the language's keywords or operators:
//! the caller registers them in a [`TokenTable`] and receives their ids back
//! as [`TokenKind::Keyword`] / [`TokenKind::Special`]. Literal tokens
//! (numbers, strings) and identifiers are recognised by the tokeniser itself.
//!
//! # Usage
//!
//! ```text
//! let table = TokenTable::new().special(b'+', PLUS).keyword("if", IF);
//! let mut tok = Tokenizer::new(table);
//! tok.reset("2 3 +");
//! while tok.next() != TokenKind::Eof { ... }
//! ```
//!
//! Errors never unwind: a malformed token yields [`TokenKind::Error`], sets a
//! sticky flag and is reported through the injected error handler.

mod cursor;
mod error;
mod literal;
mod table;
mod tokenizer;

pub use cursor::Cursor;
pub use error::LexError;
pub use literal::{decode_escape, parse_number, Number};
pub use table::{TokenId, TokenTable};
pub use tokenizer::{ErrorHandler, Token, TokenKind, Tokenizer};
