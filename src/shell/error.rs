use std::io;

use rustyline::error::ReadlineError;
use thiserror::Error;

use super::parser::SyntaxError;

#[derive(Debug, Error)]
pub enum ShellError {
    #[error(transparent)]
    Syntax(#[from] SyntaxError),
    #[error("{0}")]
    Io(#[from] io::Error),
    #[error("readline: {0}")]
    Readline(#[from] ReadlineError),
}
