//! Command-line interface
//!
//! Argument parsing and the handlers behind each `osce` subcommand.

pub mod args;
pub mod commands;
