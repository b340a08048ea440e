//! Audio file handling.
//!
//! Persists synthesized waveforms as WAV files and validates reference
//! voice prompts before they are sent to the model server.

mod wav;

pub use wav::{AudioError, Waveform, decode_wav, probe_wav, read_wav, save_wav};
