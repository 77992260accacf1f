//! Lexical errors.

use thiserror::Error;

/// A malformed token.
///
/// Every variant carries the 1-based line on which the offending token
/// started, so the compiler can report it without re-scanning.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum LexError {
    #[error("line {line}: bad escape sequence `\\{escape}`")]
    BadEscape { escape: String, line: u32 },
    #[error("line {line}: unterminated string")]
    UnterminatedString { line: u32 },
    #[error("line {line}: malformed number `{text}`")]
    BadNumber { text: String, line: u32 },
    #[error("line {line}: unexpected character `{ch}`")]
    UnexpectedChar { ch: char, line: u32 },
}

impl LexError {
    /// Line on which the offending token started.
    pub fn line(&self) -> u32 {
        match self {
            LexError::BadEscape { line, .. }
            | LexError::UnterminatedString { line }
            | LexError::BadNumber { line, .. }
            | LexError::UnexpectedChar { line, .. } => *line,
        }
    }
}
