use std::fmt;

use thiserror::Error;

/// 1-based source position of a token or of a syntax error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Position {
    pub line: usize,
    pub col: usize,
}

impl Position {
    pub fn new(line: usize, col: usize) -> Self {
        Self { line, col }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.col)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SyntaxErrorKind {
    #[error("unterminated single quote")]
    UnterminatedQuote,
    #[error("invalid file descriptor '{0}'")]
    InvalidIoNumber(String),
    #[error("unexpected token {0}, expected command")]
    UnexpectedToken(String),
    #[error("expected command")]
    ExpectedCommand,
    #[error("expected 'then'")]
    ExpectedThen,
    #[error("expected 'fi'")]
    ExpectedFi,
    #[error("expected word after redirection, found {0}")]
    ExpectedWord(String),
    #[error("expected ';' or newline, found {0}")]
    ExpectedSeparator(String),
    #[error("expected end of input, found {0}")]
    TrailingInput(String),
}

/// A fatal lexing or parsing error. Nothing is executed once one is raised.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind} at {position}")]
pub struct SyntaxError {
    pub kind: SyntaxErrorKind,
    pub position: Position,
}

impl SyntaxError {
    pub fn new(kind: SyntaxErrorKind, position: Position) -> Self {
        Self { kind, position }
    }
}
