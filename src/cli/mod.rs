//! CLI module - command-line interface
//!
//! Contains the REPL, command parsing and answer rendering.

pub mod commands;
pub mod repl;

pub use repl::{render_result, Repl};
