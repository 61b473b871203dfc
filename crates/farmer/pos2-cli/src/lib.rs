//! Shared plumbing behind the `pos2-cli` binary and its C ABI: command
//! implementations, argument parsing and the unified error type both
//! surfaces report through.

pub mod commands;
pub mod error;
pub mod ffi;

pub use error::{CliError, CliResult};
