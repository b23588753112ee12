//! Command-line interface for the `pbp` binary.

mod commands;
mod helpers;
mod progress;

pub use commands::{is_verbose, run};
