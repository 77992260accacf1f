//! The language's keywords, special characters and digraphs.

use tern_lexer::{TokenId, TokenTable};

/// Every registered token. The discriminant is the [`TokenId`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[repr(u16)]
pub(crate) enum Tok {
    // Keywords
    If,
    Else,
    Then,
    Times,
    Each,
    Leave,
    IfLeave,
    I,
    J,
    K,
    Try,
    Catch,
    CatchAll,
    EndTry,
    Throw,
    Recurse,
    Defer,
    Global,
    Const,
    Dup,
    Drop,
    Swap,
    Over,
    Rot,
    Not,
    Neg,
    And,
    Or,
    Call,
    NoneLit,
    // Specials
    Colon,
    Semi,
    Bar,
    Comma,
    LParen,
    RParen,
    Query,
    Bang,
    Amp,
    Backtick,
    At,
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Eq,
    Lt,
    Gt,
    Dot,
    // Digraphs
    Ne,
    Le,
    Ge,
    HashOpen,
}

const KEYWORDS: &[(&str, Tok)] = &[
    ("if", Tok::If),
    ("else", Tok::Else),
    ("then", Tok::Then),
    ("times", Tok::Times),
    ("each", Tok::Each),
    ("leave", Tok::Leave),
    ("ifleave", Tok::IfLeave),
    ("i", Tok::I),
    ("j", Tok::J),
    ("k", Tok::K),
    ("try", Tok::Try),
    ("catch", Tok::Catch),
    ("catchall", Tok::CatchAll),
    ("endtry", Tok::EndTry),
    ("throw", Tok::Throw),
    ("recurse", Tok::Recurse),
    ("defer", Tok::Defer),
    ("global", Tok::Global),
    ("const", Tok::Const),
    ("dup", Tok::Dup),
    ("drop", Tok::Drop),
    ("swap", Tok::Swap),
    ("over", Tok::Over),
    ("rot", Tok::Rot),
    ("not", Tok::Not),
    ("neg", Tok::Neg),
    ("and", Tok::And),
    ("or", Tok::Or),
    ("call", Tok::Call),
    ("none", Tok::NoneLit),
];

const SPECIALS: &[(u8, Tok)] = &[
    (b':', Tok::Colon),
    (b';', Tok::Semi),
    (b'|', Tok::Bar),
    (b',', Tok::Comma),
    (b'(', Tok::LParen),
    (b')', Tok::RParen),
    (b'?', Tok::Query),
    (b'!', Tok::Bang),
    (b'&', Tok::Amp),
    (b'`', Tok::Backtick),
    (b'@', Tok::At),
    (b'{', Tok::LBrace),
    (b'}', Tok::RBrace),
    (b'[', Tok::LBracket),
    (b']', Tok::RBracket),
    (b'+', Tok::Plus),
    (b'-', Tok::Minus),
    (b'*', Tok::Star),
    (b'/', Tok::Slash),
    (b'%', Tok::Percent),
    (b'=', Tok::Eq),
    (b'<', Tok::Lt),
    (b'>', Tok::Gt),
    (b'.', Tok::Dot),
];

const DIGRAPHS: &[(&str, Tok)] = &[
    ("!=", Tok::Ne),
    ("<=", Tok::Le),
    (">=", Tok::Ge),
    ("[%", Tok::HashOpen),
];

/// Ordered so that `ALL[tok as usize] == tok`.
const ALL: [Tok; 58] = [
    Tok::If,
    Tok::Else,
    Tok::Then,
    Tok::Times,
    Tok::Each,
    Tok::Leave,
    Tok::IfLeave,
    Tok::I,
    Tok::J,
    Tok::K,
    Tok::Try,
    Tok::Catch,
    Tok::CatchAll,
    Tok::EndTry,
    Tok::Throw,
    Tok::Recurse,
    Tok::Defer,
    Tok::Global,
    Tok::Const,
    Tok::Dup,
    Tok::Drop,
    Tok::Swap,
    Tok::Over,
    Tok::Rot,
    Tok::Not,
    Tok::Neg,
    Tok::And,
    Tok::Or,
    Tok::Call,
    Tok::NoneLit,
    Tok::Colon,
    Tok::Semi,
    Tok::Bar,
    Tok::Comma,
    Tok::LParen,
    Tok::RParen,
    Tok::Query,
    Tok::Bang,
    Tok::Amp,
    Tok::Backtick,
    Tok::At,
    Tok::LBrace,
    Tok::RBrace,
    Tok::LBracket,
    Tok::RBracket,
    Tok::Plus,
    Tok::Minus,
    Tok::Star,
    Tok::Slash,
    Tok::Percent,
    Tok::Eq,
    Tok::Lt,
    Tok::Gt,
    Tok::Dot,
    Tok::Ne,
    Tok::Le,
    Tok::Ge,
    Tok::HashOpen,
];

impl Tok {
    #[inline]
    pub(crate) fn id(self) -> TokenId {
        TokenId(self as u16)
    }

    pub(crate) fn from_id(id: TokenId) -> Option<Tok> {
        ALL.get(usize::from(id.0)).copied()
    }
}

pub(crate) fn token_table() -> TokenTable {
    let mut table = TokenTable::new();
    for &(word, tok) in KEYWORDS {
        table = table.keyword(word, tok.id());
    }
    for &(ch, tok) in SPECIALS {
        table = table.special(ch, tok.id());
    }
    for &(text, tok) in DIGRAPHS {
        table = table.digraph(text, tok.id());
    }
    table
}
