//! chatterbox-driver: speech synthesis runs against a Chatterbox model server.
//!
//! Loads a pretrained text-to-speech model on a compute device, synthesizes
//! a text with and without reference voice prompts, and writes each result
//! to a WAV file.

pub mod audio;
pub mod backend;
pub mod cli;
pub mod engine;
pub mod plan;
