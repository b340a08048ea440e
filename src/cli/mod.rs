//! CLI argument parsing.

mod args;

pub use args::{Args, DEFAULT_PORT, Device};
