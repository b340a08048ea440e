//! Model server request/response types.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur when communicating with the model server.
#[derive(Error, Debug)]
pub enum BackendError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Request failed: {0}")]
    RequestFailed(String),

    #[error("Device unavailable: {0}")]
    DeviceUnavailable(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("Unsupported audio prompt: {0}")]
    InvalidAudio(String),
}

/// Body of a model load request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoadRequest {
    pub device: String,
}

/// Description of a loaded model.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ModelInfo {
    pub model: String,
    pub device: String,
    pub sample_rate: u32,
}

/// Sampling knobs passed to the model on every generation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationOptions {
    /// Emotion exaggeration.
    pub exaggeration: f32,
    /// Classifier-free guidance weight.
    pub cfg_weight: f32,
    pub temperature: f32,
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            exaggeration: 0.5,
            cfg_weight: 0.5,
            temperature: 0.8,
        }
    }
}

impl GenerationOptions {
    /// Check every option is inside the range the model accepts.
    pub fn validate(&self) -> Result<(), String> {
        if !(0.0..=2.0).contains(&self.exaggeration) {
            return Err(format!(
                "exaggeration must be between 0.0 and 2.0, got {}",
                self.exaggeration
            ));
        }
        if !(0.0..=1.0).contains(&self.cfg_weight) {
            return Err(format!(
                "cfg_weight must be between 0.0 and 1.0, got {}",
                self.cfg_weight
            ));
        }
        if !(0.05..=2.0).contains(&self.temperature) {
            return Err(format!(
                "temperature must be between 0.05 and 2.0, got {}",
                self.temperature
            ));
        }
        Ok(())
    }
}

/// Request for speech synthesis.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerateRequest {
    pub text: String,
    /// Reference audio conditioning the voice.
    pub audio_prompt: Option<PathBuf>,
    pub options: GenerationOptions,
}

impl GenerateRequest {
    /// Create a new synthesis request.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            audio_prompt: None,
            options: GenerationOptions::default(),
        }
    }

    /// Set the reference audio prompt.
    pub fn with_audio_prompt(mut self, path: impl Into<PathBuf>) -> Self {
        self.audio_prompt = Some(path.into());
        self
    }

    /// Set the generation options.
    pub fn with_options(mut self, options: GenerationOptions) -> Self {
        self.options = options;
        self
    }
}
