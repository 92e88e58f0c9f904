//! CLI module for the litscope command-line interface.
//!
//! Command handlers build a [`litscope::SemanticCoordinator`] over a JSON
//! library snapshot and print results as text or JSON.

mod commands;
mod output;

pub use commands::*;
