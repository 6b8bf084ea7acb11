use thiserror::Error;

/// Crate result type.
pub type Result<T> = std::result::Result<T, Error>;

/// What went wrong on a rejected line. Parameter indices are 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ErrorKind {
    #[error("Unknown command")]
    UnknownCommand,

    #[error("Not a number (parameter {0})")]
    NotANumber(usize),

    #[error("Invalid range (parameter {0})")]
    InvalidRange(usize),

    #[error("Invalid direction (parameter {0})")]
    InvalidDirectionMask(usize),

    #[error("Invalid condition (parameter {0})")]
    InvalidConditionMask(usize),

    #[error("Too many parameters")]
    TooManyParameters,

    #[error("Unclosed block (parameter {0})")]
    UnclosedBlock(usize),
}

impl ErrorKind {
    /// The offending parameter, if the error is tied to one.
    pub fn parameter(&self) -> Option<usize> {
        match *self {
            ErrorKind::UnknownCommand | ErrorKind::TooManyParameters => None,
            ErrorKind::NotANumber(p)
            | ErrorKind::InvalidRange(p)
            | ErrorKind::InvalidDirectionMask(p)
            | ErrorKind::InvalidConditionMask(p)
            | ErrorKind::UnclosedBlock(p) => Some(p),
        }
    }
}

/// The first rejected line of a program.
///
/// `line` is the 0-based index among the program's command lines (blank and
/// comment lines skipped); `source_line` is the 0-based line in the source
/// text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("line {source_line}: {kind} : {}", .tokens.join(" "))]
pub struct ValidationError {
    pub line: usize,
    pub source_line: usize,
    pub kind: ErrorKind,
    pub tokens: Vec<String>,
}

/// Limits hit while expanding `for` blocks.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FlattenError {
    #[error("for blocks nested deeper than {limit} (line {line})")]
    NestingTooDeep { line: usize, limit: usize },

    #[error("expanded program exceeds {limit} instructions")]
    TooLong { limit: usize },
}

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Flatten(#[from] FlattenError),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}
