//! `minish`: a minimal POSIX-style shell.
//!
//! Input goes through three stages: the [`shell::parser::Lexer`] turns text
//! into tokens, the [`shell::parser::Parser`] builds a [`shell::parser::Node`]
//! tree, and the [`shell::executor::Executor`] walks that tree, running
//! built-ins in process and everything else through fork/exec.

pub mod shell;
pub mod utils;
