//! Byte cursor with line tracking.
//!
//! The cursor advances through the source byte-by-byte and keeps the line
//! counter current: every `\n` it steps over bumps the line, no matter
//! whether the newline sits in whitespace, a string or a comment.

/// Cheap, copyable cursor over a source buffer.
///
/// Being [`Copy`] lets the tokeniser snapshot its state before a token and
/// restore it on rewind.
#[derive(Clone, Copy, Debug)]
pub struct Cursor<'a> {
    buf: &'a [u8],
    pos: usize,
    /// 1-based line of `pos`.
    line: u32,
    /// Byte offset of the first byte of the current line.
    line_start: usize,
}

impl<'a> Cursor<'a> {
    /// Create a cursor at the start of `buf`, on line 1.
    pub fn new(buf: &'a [u8]) -> Self {
        Self {
            buf,
            pos: 0,
            line: 1,
            line_start: 0,
        }
    }

    /// Jump to a previously saved position.
    ///
    /// `line_start` must be the offset of the first byte of `line`.
    pub fn restore(&mut self, pos: usize, line: u32, line_start: usize) {
        self.pos = pos.min(self.buf.len());
        self.line = line;
        self.line_start = line_start.min(self.pos);
    }

    /// Offset of the first byte of the current line.
    #[inline]
    pub fn line_start(&self) -> usize {
        self.line_start
    }

    /// Returns the byte at the current position, or `0` at end of input.
    #[inline]
    pub fn current(&self) -> u8 {
        self.buf.get(self.pos).copied().unwrap_or(0)
    }

    /// Returns the byte one position ahead, or `0` past the end.
    #[inline]
    pub fn peek(&self) -> u8 {
        self.buf.get(self.pos + 1).copied().unwrap_or(0)
    }

    #[inline]
    pub fn is_eof(&self) -> bool {
        self.pos >= self.buf.len()
    }

    #[inline]
    pub fn pos(&self) -> usize {
        self.pos
    }

    #[inline]
    pub fn line(&self) -> u32 {
        self.line
    }

    /// 1-based column of the current position.
    #[allow(
        clippy::cast_possible_truncation,
        reason = "source lines longer than u32::MAX bytes are not supported"
    )]
    pub fn column(&self) -> u32 {
        (self.pos - self.line_start) as u32 + 1
    }

    /// Advance by one byte, counting newlines.
    #[inline]
    pub fn advance(&mut self) {
        if self.pos < self.buf.len() {
            if self.buf[self.pos] == b'\n' {
                self.line += 1;
                self.line_start = self.pos + 1;
            }
            self.pos += 1;
        }
    }

    /// Advance while `pred` holds for the current byte.
    #[inline]
    pub fn eat_while(&mut self, pred: impl Fn(u8) -> bool) {
        while !self.is_eof() && pred(self.current()) {
            self.advance();
        }
    }

    /// Skip spaces, tabs, carriage returns and newlines.
    pub fn eat_whitespace(&mut self) {
        self.eat_while(|b| matches!(b, b' ' | b'\t' | b'\r' | b'\n'));
    }

    /// Advance to the next `\n` (left unconsumed) or end of input.
    ///
    /// Used to skip comment bodies; no newline is crossed so the line
    /// counter needs no update.
    pub fn eat_until_newline_or_eof(&mut self) {
        let remaining = &self.buf[self.pos..];
        match memchr::memchr(b'\n', remaining) {
            Some(offset) => self.pos += offset,
            None => self.pos = self.buf.len(),
        }
    }

    /// Whether the unread input starts with `prefix`.
    #[inline]
    pub fn starts_with(&self, prefix: &[u8]) -> bool {
        !prefix.is_empty() && self.buf[self.pos..].starts_with(prefix)
    }

    /// The bytes from `start` up to the current position.
    #[inline]
    pub fn slice_from(&self, start: usize) -> &'a [u8] {
        &self.buf[start..self.pos]
    }
}
