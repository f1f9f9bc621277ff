pub mod error;
pub mod executor;
pub mod parser;
mod readline;
#[allow(clippy::module_inception)]
mod shell;
pub mod status;

pub use error::ShellError;
pub use shell::{run_source, Shell};
