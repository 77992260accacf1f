//! Compile and runtime errors.
//!
//! Runtime errors are built through the `#[cold]` factory functions below;
//! each carries a [`RuntimeErrorKind`] whose [`RuntimeErrorKind::code`] is
//! the symbol a `catch:` clause matches against.

use std::fmt;
use std::rc::Rc;

use tern_ir::{SourcePos, Symbol};
use tern_lexer::LexError;

use crate::value::Value;

pub type RuntimeResult<T> = Result<T, RuntimeError>;

/// Typed runtime error category.
#[derive(Clone, Debug, PartialEq)]
pub enum RuntimeErrorKind {
    DivisionByZero,
    TypeMismatch { expected: String, got: String },
    NotCollection { type_name: String },
    OutOfRange { index: i64 },
    NotFound { name: String },
    NotCallable { type_name: String },
    NotHashable { type_name: String },
    BadConversion { from: String, to: &'static str },
    Overflow { operation: &'static str },
    StackOverflow,
    StackUnderflow,
    ReturnStackOverflow,
    LocalsOverflow,
    Deferred { name: String },
    BadOperation { message: String },
    Stopped,
    /// Raised by `throw`.
    User { symbol: Symbol, data: Value },
}

impl RuntimeErrorKind {
    /// Exception symbol name; `None` for user throws, which carry their own.
    pub fn code(&self) -> Option<&'static str> {
        Some(match self {
            Self::DivisionByZero => "divzero",
            Self::TypeMismatch { .. } => "badtype",
            Self::NotCollection { .. } => "notcoll",
            Self::OutOfRange { .. } => "outofrange",
            Self::NotFound { .. } => "notfound",
            Self::NotCallable { .. } => "notcallable",
            Self::NotHashable { .. } => "nothashable",
            Self::BadConversion { .. } => "badconv",
            Self::Overflow { .. } => "overflow",
            Self::StackOverflow => "stackoverflow",
            Self::StackUnderflow => "stackunderflow",
            Self::ReturnStackOverflow => "retoverflow",
            Self::LocalsOverflow => "localsoverflow",
            Self::Deferred { .. } => "deferred",
            Self::BadOperation { .. } => "badop",
            Self::Stopped => "stopped",
            Self::User { .. } => return None,
        })
    }

    /// Every built-in code, for pre-interning.
    pub const CODES: [&'static str; 16] = [
        "divzero",
        "badtype",
        "notcoll",
        "outofrange",
        "notfound",
        "notcallable",
        "nothashable",
        "badconv",
        "overflow",
        "stackoverflow",
        "stackunderflow",
        "retoverflow",
        "localsoverflow",
        "deferred",
        "badop",
        "stopped",
    ];
}

impl fmt::Display for RuntimeErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DivisionByZero => write!(f, "division by zero"),
            Self::TypeMismatch { expected, got } => {
                write!(f, "type mismatch: expected {expected}, got {got}")
            }
            Self::NotCollection { type_name } => write!(f, "{type_name} is not a collection"),
            Self::OutOfRange { index } => write!(f, "index {index} out of range"),
            Self::NotFound { name } => write!(f, "not found: {name}"),
            Self::NotCallable { type_name } => write!(f, "{type_name} is not callable"),
            Self::NotHashable { type_name } => write!(f, "{type_name} cannot be a hash key"),
            Self::BadConversion { from, to } => write!(f, "cannot convert {from} to {to}"),
            Self::Overflow { operation } => write!(f, "integer overflow in {operation}"),
            Self::StackOverflow => write!(f, "stack overflow"),
            Self::StackUnderflow => write!(f, "stack underflow"),
            Self::ReturnStackOverflow => write!(f, "return stack overflow"),
            Self::LocalsOverflow => write!(f, "locals stack overflow"),
            Self::Deferred { name } => write!(f, "word `{name}` is deferred and has no body"),
            Self::BadOperation { message } => write!(f, "{message}"),
            Self::Stopped => write!(f, "stopped"),
            Self::User { .. } => write!(f, "uncaught exception"),
        }
    }
}

/// Where a runtime error was raised.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ErrorPos {
    pub source: Rc<str>,
    pub pos: SourcePos,
}

impl fmt::Display for ErrorPos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.source, self.pos)
    }
}

/// Runtime error.
#[derive(Clone, Debug, PartialEq)]
pub struct RuntimeError {
    pub kind: RuntimeErrorKind,
    /// Human-readable message; equals `kind.to_string()` for factory errors.
    pub message: String,
    pub pos: Option<ErrorPos>,
}

impl fmt::Display for RuntimeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.pos {
            Some(pos) => write!(f, "{pos}: {}", self.message),
            None => write!(f, "{}", self.message),
        }
    }
}

impl std::error::Error for RuntimeError {}

impl RuntimeError {
    fn from_kind(kind: RuntimeErrorKind) -> Self {
        let message = kind.to_string();
        Self {
            kind,
            message,
            pos: None,
        }
    }

    /// Attach a position unless one is already recorded.
    #[must_use]
    pub fn at(mut self, pos: ErrorPos) -> Self {
        self.pos.get_or_insert(pos);
        self
    }

    /// Errors that `try` cannot intercept.
    pub fn is_catchable(&self) -> bool {
        !matches!(self.kind, RuntimeErrorKind::Stopped)
    }
}

#[cold]
pub fn division_by_zero() -> RuntimeError {
    RuntimeError::from_kind(RuntimeErrorKind::DivisionByZero)
}

#[cold]
pub fn type_mismatch(expected: &str, got: &str) -> RuntimeError {
    RuntimeError::from_kind(RuntimeErrorKind::TypeMismatch {
        expected: expected.to_string(),
        got: got.to_string(),
    })
}

/// Operator not defined for the operand types.
#[cold]
pub fn invalid_operands(op: &str, left: &str, right: &str) -> RuntimeError {
    let mut err = type_mismatch("operands valid for the operator", &format!("{left} {op} {right}"));
    err.message = format!("operator `{op}` cannot be applied to {left} and {right}");
    err
}

#[cold]
pub fn not_collection(type_name: &str) -> RuntimeError {
    RuntimeError::from_kind(RuntimeErrorKind::NotCollection {
        type_name: type_name.to_string(),
    })
}

#[cold]
pub fn out_of_range(index: i64) -> RuntimeError {
    RuntimeError::from_kind(RuntimeErrorKind::OutOfRange { index })
}

#[cold]
pub fn not_found(name: &str) -> RuntimeError {
    RuntimeError::from_kind(RuntimeErrorKind::NotFound {
        name: name.to_string(),
    })
}

#[cold]
pub fn not_callable(type_name: &str) -> RuntimeError {
    RuntimeError::from_kind(RuntimeErrorKind::NotCallable {
        type_name: type_name.to_string(),
    })
}

#[cold]
pub fn not_hashable(type_name: &str) -> RuntimeError {
    RuntimeError::from_kind(RuntimeErrorKind::NotHashable {
        type_name: type_name.to_string(),
    })
}

#[cold]
pub fn bad_conversion(from: &str, to: &'static str) -> RuntimeError {
    RuntimeError::from_kind(RuntimeErrorKind::BadConversion {
        from: from.to_string(),
        to,
    })
}

#[cold]
pub fn integer_overflow(operation: &'static str) -> RuntimeError {
    RuntimeError::from_kind(RuntimeErrorKind::Overflow { operation })
}

#[cold]
pub fn stack_overflow() -> RuntimeError {
    RuntimeError::from_kind(RuntimeErrorKind::StackOverflow)
}

#[cold]
pub fn stack_underflow() -> RuntimeError {
    RuntimeError::from_kind(RuntimeErrorKind::StackUnderflow)
}

#[cold]
pub fn return_stack_overflow() -> RuntimeError {
    RuntimeError::from_kind(RuntimeErrorKind::ReturnStackOverflow)
}

#[cold]
pub fn locals_overflow() -> RuntimeError {
    RuntimeError::from_kind(RuntimeErrorKind::LocalsOverflow)
}

#[cold]
pub fn deferred_word(name: &str) -> RuntimeError {
    RuntimeError::from_kind(RuntimeErrorKind::Deferred {
        name: name.to_string(),
    })
}

#[cold]
pub fn bad_operation(message: impl Into<String>) -> RuntimeError {
    RuntimeError::from_kind(RuntimeErrorKind::BadOperation {
        message: message.into(),
    })
}

#[cold]
pub fn stopped() -> RuntimeError {
    RuntimeError::from_kind(RuntimeErrorKind::Stopped)
}

/// A `throw` of `symbol` with `data`. `name` is the symbol's text.
#[cold]
pub fn user_throw(symbol: Symbol, name: &str, data: Value) -> RuntimeError {
    let mut err = RuntimeError::from_kind(RuntimeErrorKind::User { symbol, data });
    err.message = format!("uncaught exception `{name}`");
    err
}

/// Compile error category.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CompileErrorKind {
    NotFound,
    /// Mismatched or misplaced structure token.
    Malformed(&'static str),
    TooManyLocals,
    CodeTooLong,
    Lex(LexError),
    /// Input ended inside an open definition, lambda or structure.
    Unterminated,
    /// Word definitions, `global` and `defer` only at the top level.
    NotAtTopLevel,
    /// A keyword (`i`, `j`, `k`, `if`, ...) where a new name was expected.
    ReservedName,
}

impl fmt::Display for CompileErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => write!(f, "not found"),
            Self::Malformed(what) => write!(f, "malformed {what}"),
            Self::TooManyLocals => write!(f, "too many locals"),
            Self::CodeTooLong => write!(f, "code too long"),
            Self::Lex(e) => write!(f, "{e}"),
            Self::Unterminated => write!(f, "unterminated definition or structure"),
            Self::NotAtTopLevel => write!(f, "only allowed at the top level"),
            Self::ReservedName => write!(f, "reserved word cannot be used as a name"),
        }
    }
}

/// Compile error with the offending token's position.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("{source_name}:{line}:{column}: {kind}: `{token}`")]
pub struct CompileError {
    pub kind: CompileErrorKind,
    pub token: String,
    pub source_name: Rc<str>,
    pub line: u32,
    pub column: u32,
}

/// Any error from feeding source to a runtime.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum TernError {
    #[error(transparent)]
    Compile(#[from] CompileError),
    #[error(transparent)]
    Runtime(#[from] RuntimeError),
}

impl TernError {
    pub fn as_runtime(&self) -> Option<&RuntimeError> {
        match self {
            TernError::Runtime(e) => Some(e),
            TernError::Compile(_) => None,
        }
    }

    pub fn as_compile(&self) -> Option<&CompileError> {
        match self {
            TernError::Compile(e) => Some(e),
            TernError::Runtime(_) => None,
        }
    }
}
