//! Source positions recorded per instruction.

use std::fmt;

/// Line and column of an instruction's originating token (both 1-based).
///
/// `SourcePos::UNKNOWN` (0:0) marks code compiled without position tracking.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct SourcePos {
    pub line: u32,
    pub column: u32,
}

impl SourcePos {
    pub const UNKNOWN: SourcePos = SourcePos { line: 0, column: 0 };

    #[inline]
    pub const fn new(line: u32, column: u32) -> Self {
        SourcePos { line, column }
    }

    #[inline]
    pub fn is_known(self) -> bool {
        self.line != 0
    }
}

impl fmt::Display for SourcePos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}
