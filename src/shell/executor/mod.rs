pub mod builtins;
#[allow(clippy::module_inception)]
pub mod executor;
pub mod process;
pub mod redirect;

pub use builtins::Builtin;
pub use executor::Executor;
