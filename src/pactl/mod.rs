//! Sound server control module.
//!
//! Wraps the `pactl` command line tool: runs commands (or echoes them in
//! dry-run mode) and parses its listings into typed records.

mod client;
mod error;
mod executor;
#[cfg(test)]
pub(crate) mod fake;
mod parse;

pub use client::{Client, DEFAULT_PROGRAM};
pub use error::PactlError;
pub use parse::SinkInput;
