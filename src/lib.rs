// ABOUTME: Library root for deckhand - exposes public types for testing.
// ABOUTME: The main binary is in main.rs.

pub mod config;
pub mod diagnostics;
pub mod engine;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod synth;
pub mod topology;
pub mod types;

pub use error::{Error, ErrorKind, Result};
pub use synth::{Synthesis, synthesize};
