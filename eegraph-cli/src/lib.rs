//! Support library for the eegraph CLI binary.
//!
//! Exposes argument parsing, command execution, and rendering so doctests
//! and unit tests can drive commands without spawning a process.

pub mod cli;
pub mod logging;
