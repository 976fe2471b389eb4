//! Error types for parsing and execution.
//!
//! One enum covers the whole taxonomy: parse rejections, name lookups,
//! stack/type/argument failures at run time, and the two control signals
//! (`WordReturn`, `Exit`) that are raised and caught internally but are not
//! user-visible errors.

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// All the ways a bok program can fail.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Error {
    /// The lexer or parser rejected the input. Positions are 1-based.
    #[error("unexpected {message} at ({line}, {column})")]
    Parse {
        line: usize,
        column: usize,
        message: String,
    },

    /// A late-bound or dotted name resolved against a missing dictionary entry.
    #[error("name '{0}' is not defined")]
    Name(String),

    /// An operation reached an empty (or too-shallow) stack.
    #[error("stack underflow")]
    StackUnderflow,

    /// Operand(s) had the wrong shape for the operator.
    #[error("type mismatch: expected {expected}, got {got}")]
    Type { expected: String, got: String },

    /// A combinator or builtin received a malformed operand.
    #[error("{0}")]
    Argument(String),

    /// `assert` popped a falsy value.
    #[error("assertion failed")]
    Assertion,

    #[error("division by zero")]
    DivisionByZero,

    /// User's explicit `error` word.
    #[error("{0}")]
    Raised(String),

    /// The step limit was exceeded. Not catchable by any word.
    #[error("step limit exceeded ({0})")]
    StepLimitExceeded(u64),

    /// Control signal: abort the currently executing word definition.
    /// Caught at the word boundary, never user-visible.
    #[error("return outside of a word")]
    WordReturn,

    /// Control signal: terminate the interpreter. Caught by the host.
    #[error("exit")]
    Exit,
}

impl Error {
    /// Shorthand for the pervasive type-mismatch constructor.
    pub(crate) fn type_mismatch(expected: impl Into<String>, got: impl Into<String>) -> Self {
        Self::Type {
            expected: expected.into(),
            got: got.into(),
        }
    }
}
