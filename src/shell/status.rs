//! Exit status bands shared by the executor and the command-line front end.

pub const SUCCESS: i32 = 0;
/// Fork, wait and redirection failures.
pub const FAILURE: i32 = 1;
/// Lexing, parsing and command-line usage errors.
pub const SYNTAX_ERROR: i32 = 2;
pub const NOT_FOUND: i32 = 127;
/// A child killed by signal N reports `SIGNAL_BASE + N`.
pub const SIGNAL_BASE: i32 = 128;
