//! HTTP client for the Chatterbox model server.

use std::path::Path;
use std::time::Duration;

use reqwest::StatusCode;
use reqwest::blocking::{Client, Response, multipart};
use tracing::debug;

use crate::audio::{self, Waveform};
use crate::cli::Device;

use super::types::{BackendError, GenerateRequest, LoadRequest, ModelInfo};
use super::{ModelProvider, SpeechModel};

/// Synthesis of a short text can take minutes on CPU.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(600);

/// HTTP-based model provider.
pub struct HttpProvider {
    base_url: String,
    client: Client,
}

impl HttpProvider {
    /// Create a new HTTP provider for the server at `host:port`.
    pub fn new(host: &str, port: u16) -> Result<Self, BackendError> {
        Self::with_base_url(format!("http://{host}:{port}"))
    }

    /// Create a provider for a server at an explicit base URL.
    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self, BackendError> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| BackendError::ConnectionFailed(e.to_string()))?;

        Ok(Self {
            base_url: base_url.into(),
            client,
        })
    }

    /// Get the base URL for this provider.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

impl ModelProvider for HttpProvider {
    fn load(&self, device: Device) -> Result<Box<dyn SpeechModel>, BackendError> {
        let url = format!("{}/load", self.base_url);
        let body = LoadRequest {
            device: device.as_str().to_string(),
        };

        debug!(%url, device = device.as_str(), "loading model");

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .map_err(|e| BackendError::ConnectionFailed(e.to_string()))?;

        let status = response.status();
        if status == StatusCode::CONFLICT || status == StatusCode::SERVICE_UNAVAILABLE {
            return Err(BackendError::DeviceUnavailable(format!(
                "{}: {}",
                device.as_str(),
                error_body(response)
            )));
        }
        if !status.is_success() {
            return Err(BackendError::RequestFailed(format!(
                "Status: {status}: {}",
                error_body(response)
            )));
        }

        let info: ModelInfo = response
            .json()
            .map_err(|e| BackendError::InvalidResponse(e.to_string()))?;

        if info.sample_rate == 0 {
            return Err(BackendError::InvalidResponse(
                "Model reported a sample rate of 0".to_string(),
            ));
        }

        Ok(Box::new(HttpModel {
            base_url: self.base_url.clone(),
            client: self.client.clone(),
            info,
        }))
    }
}

/// Handle to a model loaded on the server.
pub struct HttpModel {
    base_url: String,
    client: Client,
    info: ModelInfo,
}

impl HttpModel {
    fn prompt_part(audio_prompt: &Path) -> Result<multipart::Part, BackendError> {
        let audio_data = std::fs::read(audio_prompt)
            .map_err(|_| BackendError::FileNotFound(audio_prompt.display().to_string()))?;

        let file_name = audio_prompt
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("prompt.wav");

        multipart::Part::bytes(audio_data)
            .file_name(file_name.to_string())
            .mime_str("audio/wav")
            .map_err(|e| BackendError::RequestFailed(e.to_string()))
    }
}

impl SpeechModel for HttpModel {
    fn sample_rate(&self) -> u32 {
        self.info.sample_rate
    }

    fn generate(&self, request: &GenerateRequest) -> Result<Waveform, BackendError> {
        let url = format!("{}/generate", self.base_url);
        let options = &request.options;

        let mut form = multipart::Form::new()
            .text("text", request.text.clone())
            .text("exaggeration", options.exaggeration.to_string())
            .text("cfg_weight", options.cfg_weight.to_string())
            .text("temperature", options.temperature.to_string());

        if let Some(prompt) = &request.audio_prompt {
            form = form.part("audio_prompt", Self::prompt_part(prompt)?);
        }

        debug!(%url, prompted = request.audio_prompt.is_some(), "generating speech");

        let response = self
            .client
            .post(&url)
            .multipart(form)
            .send()
            .map_err(|e| BackendError::ConnectionFailed(e.to_string()))?;

        let status = response.status();
        if request.audio_prompt.is_some()
            && (status == StatusCode::UNSUPPORTED_MEDIA_TYPE
                || status == StatusCode::UNPROCESSABLE_ENTITY)
        {
            return Err(BackendError::InvalidAudio(error_body(response)));
        }
        if !status.is_success() {
            return Err(BackendError::RequestFailed(format!(
                "Status: {status}: {}",
                error_body(response)
            )));
        }

        let bytes = response
            .bytes()
            .map_err(|e| BackendError::InvalidResponse(e.to_string()))?;

        audio::decode_wav(&bytes).map_err(|e| BackendError::InvalidResponse(e.to_string()))
    }
}

fn error_body(response: Response) -> String {
    response
        .text()
        .unwrap_or_else(|e| format!("<unreadable body: {e}>"))
}
