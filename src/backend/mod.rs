//! Communication with the Chatterbox model server.
//!
//! Provides the traits the synthesis driver depends on and an HTTP
//! implementation talking to a server that hosts the pretrained model.

mod client;
mod types;

pub use client::HttpProvider;
pub use types::{BackendError, GenerateRequest, GenerationOptions, LoadRequest, ModelInfo};

use crate::audio::Waveform;
use crate::cli::Device;

/// Loads pretrained models.
///
/// Abstracted so the driver can be exercised against mock providers in tests.
#[cfg_attr(test, mockall::automock)]
pub trait ModelProvider {
    /// Load the model on `device`.
    fn load(&self, device: Device) -> Result<Box<dyn SpeechModel>, BackendError>;
}

/// A loaded text-to-speech model.
#[cfg_attr(test, mockall::automock)]
pub trait SpeechModel: Send + Sync {
    /// Sample rate of every waveform this model produces.
    fn sample_rate(&self) -> u32;

    /// Synthesize speech for the request.
    ///
    /// # Returns
    /// The decoded waveform and its sample rate
    fn generate(&self, request: &GenerateRequest) -> Result<Waveform, BackendError>;
}

/// Create a provider for the model server at `host:port`.
pub fn create_provider(host: &str, port: u16) -> Result<HttpProvider, BackendError> {
    HttpProvider::new(host, port)
}
