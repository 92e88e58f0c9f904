//! Configuration for the litscope engine.

mod settings;

pub use settings::*;
