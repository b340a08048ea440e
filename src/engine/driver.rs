//! Synthesis driver implementation.

use std::path::{Path, PathBuf};
use std::time::Instant;

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::audio::{self, AudioError, Waveform};
use crate::backend::{
    BackendError, GenerateRequest, GenerationOptions, ModelProvider, SpeechModel,
};
use crate::cli::Device;
use crate::plan::SynthesisPlan;

/// Errors that abort a synthesis run.
#[derive(Error, Debug)]
pub enum DriverError {
    #[error("Failed to load model on device '{device}': {source}")]
    ModelLoad {
        device: String,
        #[source]
        source: BackendError,
    },

    #[error("Synthesis failed: {0}")]
    Synthesis(String),

    #[error("Audio prompt {}: {reason}", .path.display())]
    AudioPrompt { path: PathBuf, reason: String },

    #[error("Failed to write {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: AudioError,
    },
}

/// Outcome of one completed job.
#[derive(Debug, Clone, PartialEq)]
pub struct JobOutcome {
    pub audio_prompt: Option<PathBuf>,
    pub output: PathBuf,
    pub samples: usize,
    pub duration_secs: f32,
}

/// Files written by a run, in the order they were written.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunReport {
    /// Sample rate of every written file.
    pub sample_rate: u32,
    pub outputs: Vec<JobOutcome>,
}

/// Load the model on `device` and run every job of `plan`.
///
/// A load failure returns before any output file is created.
pub fn load_and_run<P>(
    provider: &P,
    device: Device,
    plan: &SynthesisPlan,
) -> Result<RunReport, DriverError>
where
    P: ModelProvider + ?Sized,
{
    let driver = SynthesisDriver::load(provider, device)?;
    driver.run(plan)
}

/// Owns a loaded model and runs synthesis requests against it one at a time.
pub struct SynthesisDriver {
    model: Box<dyn SpeechModel>,
}

impl SynthesisDriver {
    /// Load the model on `device`.
    ///
    /// Nothing is written to disk before this succeeds.
    pub fn load<P>(provider: &P, device: Device) -> Result<Self, DriverError>
    where
        P: ModelProvider + ?Sized,
    {
        let started = Instant::now();
        let model = provider
            .load(device)
            .map_err(|source| DriverError::ModelLoad {
                device: device.as_str().to_string(),
                source,
            })?;

        info!(
            device = device.as_str(),
            sample_rate = model.sample_rate(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "model loaded"
        );

        Ok(Self::from_model(model))
    }

    /// Wrap an already loaded model.
    pub fn from_model(model: Box<dyn SpeechModel>) -> Self {
        Self { model }
    }

    /// Sample rate of the loaded model.
    pub fn sample_rate(&self) -> u32 {
        self.model.sample_rate()
    }

    /// Synthesize `text`, optionally conditioned on a reference voice.
    ///
    /// Text, options and prompt are all validated before the model is called.
    /// A prompt must be a WAV file hound can decode; other containers and
    /// encodings are rejected here even if the server could read them.
    pub fn synthesize(
        &self,
        text: &str,
        audio_prompt: Option<&Path>,
        options: &GenerationOptions,
    ) -> Result<Waveform, DriverError> {
        if text.trim().is_empty() {
            return Err(DriverError::Synthesis("Text cannot be empty".to_string()));
        }

        options.validate().map_err(DriverError::Synthesis)?;

        if let Some(path) = audio_prompt {
            check_prompt(path)?;
        }

        let mut request = GenerateRequest::new(text).with_options(options.clone());
        if let Some(path) = audio_prompt {
            request = request.with_audio_prompt(path);
        }

        let started = Instant::now();
        let waveform = self
            .model
            .generate(&request)
            .map_err(|e| classify(e, audio_prompt))?;

        if waveform.is_empty() {
            return Err(DriverError::Synthesis(
                "Model returned an empty waveform".to_string(),
            ));
        }

        let expected = self.model.sample_rate();
        if waveform.sample_rate != expected {
            return Err(DriverError::Synthesis(format!(
                "Model returned audio at {} Hz, expected {} Hz",
                waveform.sample_rate, expected
            )));
        }

        debug!(
            samples = waveform.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "synthesized"
        );

        Ok(waveform)
    }

    /// Write a waveform to `output`.
    pub fn persist(&self, waveform: &Waveform, output: &Path) -> Result<(), DriverError> {
        audio::save_wav(output, &waveform.samples, waveform.sample_rate).map_err(|source| {
            DriverError::Io {
                path: output.to_path_buf(),
                source,
            }
        })
    }

    /// Run every job of the plan in order.
    ///
    /// Each result is on disk before the next request is issued. The first
    /// failure aborts the run; files already written are left in place.
    pub fn run(&self, plan: &SynthesisPlan) -> Result<RunReport, DriverError> {
        let mut report = RunReport {
            sample_rate: self.sample_rate(),
            outputs: Vec::new(),
        };

        if plan.jobs.is_empty() {
            warn!("run plan has no jobs");
            return Ok(report);
        }

        for (index, job) in plan.jobs.iter().enumerate() {
            info!(
                job = index + 1,
                total = plan.jobs.len(),
                prompt = ?job.audio_prompt,
                output = %job.output.display(),
                "synthesizing"
            );

            let waveform =
                self.synthesize(&plan.text, job.audio_prompt.as_deref(), &plan.options)?;
            self.persist(&waveform, &job.output)?;

            report.outputs.push(JobOutcome {
                audio_prompt: job.audio_prompt.clone(),
                output: job.output.clone(),
                samples: waveform.len(),
                duration_secs: waveform.duration_secs(),
            });
        }

        Ok(report)
    }
}

/// Reference prompts are sent as `audio/wav`, so they must decode as WAV locally.
fn check_prompt(path: &Path) -> Result<(), DriverError> {
    if !path.exists() {
        return Err(DriverError::AudioPrompt {
            path: path.to_path_buf(),
            reason: "file not found".to_string(),
        });
    }

    audio::probe_wav(path).map_err(|e| DriverError::AudioPrompt {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;

    Ok(())
}

fn classify(error: BackendError, audio_prompt: Option<&Path>) -> DriverError {
    match (error, audio_prompt) {
        (BackendError::FileNotFound(reason) | BackendError::InvalidAudio(reason), Some(path)) => {
            DriverError::AudioPrompt {
                path: path.to_path_buf(),
                reason,
            }
        }
        (other, _) => DriverError::Synthesis(other.to_string()),
    }
}
