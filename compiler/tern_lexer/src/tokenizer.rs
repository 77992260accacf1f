//! The tokeniser proper.
//!
//! Recognition order for each token:
//! 1. the comment marker (skipped with the rest of the line);
//! 2. two-character digraphs from the table;
//! 3. numeric literals (a digit, or `-` immediately followed by a digit);
//! 4. single special characters from the table;
//! 5. quoted strings;
//! 6. identifiers, reported as keywords when the table knows them.
//!
//! `rewind` gives exactly one token of lookahead.

use crate::cursor::Cursor;
use crate::error::LexError;
use crate::literal::{decode_escape, parse_number, Number};
use crate::table::{TokenId, TokenTable};

/// Callback invoked for every lexical error.
pub type ErrorHandler = Box<dyn FnMut(&LexError)>;

/// Type of the most recently scanned token.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TokenKind {
    Eof,
    Error,
    Ident,
    Int,
    Long,
    Float,
    Double,
    Str,
    Keyword(TokenId),
    Special(TokenId),
}

#[derive(Clone, Debug, PartialEq)]
enum TokenValue {
    None,
    Number(Number),
    Text(String),
}

/// A scanned token with its position.
#[derive(Clone, Debug, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    value: TokenValue,
    /// Byte range of the token's source text.
    pub start: usize,
    pub end: usize,
    pub line: u32,
    pub column: u32,
}

impl Token {
    fn eof(pos: usize, line: u32, column: u32) -> Self {
        Self {
            kind: TokenKind::Eof,
            value: TokenValue::None,
            start: pos,
            end: pos,
            line,
            column,
        }
    }
}

/// Saved scanning position (survives `reset` of the borrowed cursor).
#[derive(Copy, Clone, Debug)]
struct ScanState {
    pos: usize,
    line: u32,
    line_start: usize,
}

/// Table-driven tokeniser.
pub struct Tokenizer {
    table: TokenTable,
    source: String,
    state: ScanState,
    current: Token,
    /// Set by `rewind`: the next `next()` re-delivers `current`.
    pushed_back: bool,
    error: Option<LexError>,
    handler: Option<ErrorHandler>,
}

impl Tokenizer {
    pub fn new(table: TokenTable) -> Self {
        Self {
            table,
            source: String::new(),
            state: ScanState {
                pos: 0,
                line: 1,
                line_start: 0,
            },
            current: Token::eof(0, 1, 1),
            pushed_back: false,
            error: None,
            handler: None,
        }
    }

    /// Install the callback invoked on every lexical error.
    pub fn set_error_handler(&mut self, handler: ErrorHandler) {
        self.handler = Some(handler);
    }

    pub fn table(&self) -> &TokenTable {
        &self.table
    }

    /// Begin scanning `text` from line 1.
    pub fn reset(&mut self, text: &str) {
        self.reset_at_line(text, 1);
    }

    /// Begin scanning `text`, numbering its first line `line`.
    ///
    /// Used when a caller feeds a larger source one line at a time.
    pub fn reset_at_line(&mut self, text: &str, line: u32) {
        self.source.clear();
        self.source.push_str(text);
        self.state = ScanState {
            pos: 0,
            line,
            line_start: 0,
        };
        self.current = Token::eof(0, line, 1);
        self.pushed_back = false;
    }

    /// Scan the next token and return its type.
    #[allow(
        clippy::should_implement_trait,
        reason = "tokens are read through accessors, not yielded"
    )]
    pub fn next(&mut self) -> TokenKind {
        if self.pushed_back {
            self.pushed_back = false;
            return self.current.kind;
        }
        let mut cursor = self.cursor();
        let scanned = scan(&self.table, &mut cursor);
        let state = ScanState {
            pos: cursor.pos(),
            line: cursor.line(),
            line_start: cursor.line_start(),
        };
        self.state = state;
        match scanned {
            Ok(token) => self.current = token,
            Err((err, token)) => {
                self.current = token;
                if let Some(handler) = self.handler.as_mut() {
                    handler(&err);
                }
                self.error = Some(err);
            }
        }
        self.current.kind
    }

    /// Undo the last `next()`. Only one token of lookahead is supported.
    pub fn rewind(&mut self) {
        debug_assert!(!self.pushed_back, "rewind called twice without next()");
        self.pushed_back = true;
    }

    fn cursor(&self) -> Cursor<'_> {
        let mut cursor = Cursor::new(self.source.as_bytes());
        cursor.restore(self.state.pos, self.state.line, self.state.line_start);
        cursor
    }

    /// True when `text` ends inside a string literal, so a line-oriented
    /// caller should append the next line before compiling. Does not touch
    /// the current scan or the error handler.
    pub fn ends_in_open_string(&self, text: &str) -> bool {
        let mut cursor = Cursor::new(text.as_bytes());
        loop {
            match scan(&self.table, &mut cursor) {
                Ok(token) if token.kind == TokenKind::Eof => return false,
                Ok(_) => {}
                Err((LexError::UnterminatedString { .. }, _)) => return true,
                Err(_) => return false,
            }
        }
    }

    /// Whether a lexical error has occurred since the last `clear_error`.
    pub fn has_error(&self) -> bool {
        self.error.is_some()
    }

    pub fn last_error(&self) -> Option<&LexError> {
        self.error.as_ref()
    }

    pub fn clear_error(&mut self) {
        self.error = None;
    }

    /// The current token.
    pub fn token(&self) -> &Token {
        &self.current
    }

    /// Source text of the current token.
    pub fn text(&self) -> &str {
        self.source
            .get(self.current.start..self.current.end)
            .unwrap_or("")
    }

    /// Line of the current token.
    pub fn line(&self) -> u32 {
        self.current.line
    }

    pub fn column(&self) -> u32 {
        self.current.column
    }

    /// Integer value of the current token (longs are truncated, floats
    /// rounded towards zero).
    #[allow(
        clippy::cast_possible_truncation,
        reason = "typed accessors follow the token's own width"
    )]
    pub fn as_int(&self) -> i32 {
        match self.current.value {
            TokenValue::Number(Number::Int(v)) => v,
            TokenValue::Number(Number::Long(v)) => v as i32,
            TokenValue::Number(Number::Float(v)) => v as i32,
            TokenValue::Number(Number::Double(v)) => v as i32,
            _ => 0,
        }
    }

    pub fn as_long(&self) -> i64 {
        match self.current.value {
            TokenValue::Number(Number::Int(v)) => i64::from(v),
            TokenValue::Number(Number::Long(v)) => v,
            _ => i64::from(self.as_int()),
        }
    }

    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_precision_loss,
        reason = "typed accessors follow the token's own width"
    )]
    pub fn as_float(&self) -> f32 {
        match self.current.value {
            TokenValue::Number(Number::Float(v)) => v,
            TokenValue::Number(Number::Double(v)) => v as f32,
            TokenValue::Number(Number::Int(v)) => v as f32,
            TokenValue::Number(Number::Long(v)) => v as f32,
            _ => 0.0,
        }
    }

    #[allow(
        clippy::cast_precision_loss,
        reason = "typed accessors follow the token's own width"
    )]
    pub fn as_double(&self) -> f64 {
        match self.current.value {
            TokenValue::Number(Number::Double(v)) => v,
            TokenValue::Number(Number::Float(v)) => f64::from(v),
            TokenValue::Number(Number::Int(v)) => f64::from(v),
            TokenValue::Number(Number::Long(v)) => v as f64,
            _ => 0.0,
        }
    }

    /// Decoded contents of a string token (escapes resolved).
    pub fn as_str(&self) -> &str {
        match &self.current.value {
            TokenValue::Text(s) => s,
            _ => "",
        }
    }

    /// Identifier or keyword text.
    pub fn as_ident(&self) -> &str {
        match self.current.kind {
            TokenKind::Ident | TokenKind::Keyword(_) => self.text(),
            _ => "",
        }
    }
}

type ScanResult = Result<Token, (LexError, Token)>;

fn scan(table: &TokenTable, cursor: &mut Cursor<'_>) -> ScanResult {
    skip_trivia(table, cursor);
    let start = cursor.pos();
    let line = cursor.line();
    let column = cursor.column();
    let make = |kind, value, end| Token {
        kind,
        value,
        start,
        end,
        line,
        column,
    };

    if cursor.is_eof() {
        return Ok(Token::eof(start, line, column));
    }

    let first = cursor.current();
    let second = cursor.peek();

    if let Some(id) = table.digraph_id(first, second) {
        cursor.advance();
        cursor.advance();
        return Ok(make(TokenKind::Special(id), TokenValue::None, cursor.pos()));
    }

    if first.is_ascii_digit() || (first == b'-' && second.is_ascii_digit()) {
        return number(cursor, start, line, column);
    }

    if let Some(id) = table.special_id(first) {
        cursor.advance();
        return Ok(make(TokenKind::Special(id), TokenValue::None, cursor.pos()));
    }

    if first == b'"' {
        return string(cursor, start, line, column);
    }

    if is_ident_start(first) {
        cursor.eat_while(is_ident_continue);
        let end = cursor.pos();
        let text = String::from_utf8_lossy(cursor.slice_from(start));
        let kind = table
            .keyword_id(&text)
            .map_or(TokenKind::Ident, TokenKind::Keyword);
        return Ok(make(kind, TokenValue::None, end));
    }

    // Consume the whole (possibly multi-byte) character so scanning resumes
    // at a character boundary.
    cursor.advance();
    cursor.eat_while(|b| (b & 0xC0) == 0x80);
    let ch = String::from_utf8_lossy(cursor.slice_from(start))
        .chars()
        .next()
        .unwrap_or('\u{FFFD}');
    Err((
        LexError::UnexpectedChar { ch, line },
        make(TokenKind::Error, TokenValue::None, cursor.pos()),
    ))
}

/// Skip whitespace and comments.
fn skip_trivia(table: &TokenTable, cursor: &mut Cursor<'_>) {
    loop {
        cursor.eat_whitespace();
        if cursor.starts_with(table.comment()) {
            cursor.eat_until_newline_or_eof();
        } else {
            return;
        }
    }
}

fn number(cursor: &mut Cursor<'_>, start: usize, line: u32, column: u32) -> ScanResult {
    if cursor.current() == b'-' {
        cursor.advance();
    }
    let mut exponent_ok = true;
    loop {
        let b = cursor.current();
        if b.is_ascii_alphanumeric() || b == b'.' {
            if !(b.is_ascii_digit() || b == b'.' || b == b'e' || b == b'E') {
                exponent_ok = false;
            }
            cursor.advance();
        } else if (b == b'+' || b == b'-')
            && exponent_ok
            && matches!(cursor.slice_from(start).last(), Some(b'e' | b'E'))
        {
            cursor.advance();
        } else {
            break;
        }
    }
    let text = String::from_utf8_lossy(cursor.slice_from(start)).into_owned();
    let end = cursor.pos();
    let token = |kind, value| Token {
        kind,
        value,
        start,
        end,
        line,
        column,
    };
    match parse_number(&text) {
        Some(n) => {
            let kind = match n {
                Number::Int(_) => TokenKind::Int,
                Number::Long(_) => TokenKind::Long,
                Number::Float(_) => TokenKind::Float,
                Number::Double(_) => TokenKind::Double,
            };
            Ok(token(kind, TokenValue::Number(n)))
        }
        None => Err((
            LexError::BadNumber { text, line },
            token(TokenKind::Error, TokenValue::None),
        )),
    }
}

fn string(cursor: &mut Cursor<'_>, start: usize, line: u32, column: u32) -> ScanResult {
    cursor.advance(); // opening quote
    let mut bytes: Vec<u8> = Vec::new();
    let fail = |err, end| {
        Err((
            err,
            Token {
                kind: TokenKind::Error,
                value: TokenValue::None,
                start,
                end,
                line,
                column,
            },
        ))
    };
    loop {
        if cursor.is_eof() {
            return fail(LexError::UnterminatedString { line }, cursor.pos());
        }
        match cursor.current() {
            b'"' => {
                cursor.advance();
                break;
            }
            b'\\' => {
                cursor.advance();
                let mut lookahead = *cursor;
                let mut rest = Vec::with_capacity(3);
                for _ in 0..3 {
                    if lookahead.is_eof() {
                        break;
                    }
                    rest.push(lookahead.current());
                    lookahead.advance();
                }
                match decode_escape(&rest) {
                    Some((ch, used)) => {
                        let mut buf = [0u8; 4];
                        bytes.extend_from_slice(ch.encode_utf8(&mut buf).as_bytes());
                        for _ in 0..used {
                            cursor.advance();
                        }
                    }
                    None => {
                        let escape = rest
                            .first()
                            .map(|b| char::from(*b).to_string())
                            .unwrap_or_default();
                        // Skip the offending character so scanning can resume.
                        cursor.advance();
                        skip_rest_of_string(cursor);
                        return fail(LexError::BadEscape { escape, line }, cursor.pos());
                    }
                }
            }
            b => {
                bytes.push(b);
                cursor.advance();
            }
        }
    }
    let text = String::from_utf8_lossy(&bytes).into_owned();
    Ok(Token {
        kind: TokenKind::Str,
        value: TokenValue::Text(text),
        start,
        end: cursor.pos(),
        line,
        column,
    })
}

/// After a bad escape, skip to the closing quote so the remainder of the
/// string is not tokenised as code.
fn skip_rest_of_string(cursor: &mut Cursor<'_>) {
    while !cursor.is_eof() {
        match cursor.current() {
            b'"' => {
                cursor.advance();
                return;
            }
            b'\\' => {
                cursor.advance();
                cursor.advance();
            }
            _ => cursor.advance(),
        }
    }
}

#[inline]
fn is_ident_start(b: u8) -> bool {
    b.is_ascii_alphabetic() || b == b'_'
}

#[inline]
fn is_ident_continue(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b == b'$'
}
