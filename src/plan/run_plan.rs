//! Run plan: the text and the list of (prompt, output) jobs.

use std::path::{Path, PathBuf};

use crate::backend::GenerationOptions;

/// Text synthesized by the demonstration run.
pub const DEFAULT_TEXT: &str = "Suhhhhhhhhhhhhh";

/// First reference voice prompt.
pub const SAMPLE_PROMPT: &str = "sample.wav";

/// Second reference voice prompt.
pub const DAD_SAMPLE_PROMPT: &str = "dad_sample.wav";

pub const UNCONDITIONED_OUTPUT: &str = "test-1.wav";
pub const SAMPLE_OUTPUT: &str = "test-2.wav";
pub const DAD_SAMPLE_OUTPUT: &str = "test-3.wav";

/// One synthesis request and the file its result is written to.
#[derive(Debug, Clone, PartialEq)]
pub struct SynthesisJob {
    /// Reference audio conditioning the voice, if any.
    pub audio_prompt: Option<PathBuf>,
    /// Destination WAV file.
    pub output: PathBuf,
}

/// A fixed text synthesized once per job, in order.
#[derive(Debug, Clone, PartialEq)]
pub struct SynthesisPlan {
    pub text: String,
    pub options: GenerationOptions,
    pub jobs: Vec<SynthesisJob>,
}

impl SynthesisPlan {
    /// Create an empty plan for `text`.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            options: GenerationOptions::default(),
            jobs: Vec::new(),
        }
    }

    /// The three-file demonstration run: no prompt, then each reference voice.
    pub fn demo(text: impl Into<String>) -> Self {
        Self::new(text)
            .with_job(None, UNCONDITIONED_OUTPUT)
            .with_job(Some(PathBuf::from(SAMPLE_PROMPT)), SAMPLE_OUTPUT)
            .with_job(Some(PathBuf::from(DAD_SAMPLE_PROMPT)), DAD_SAMPLE_OUTPUT)
    }

    /// Append a job.
    pub fn with_job(mut self, audio_prompt: Option<PathBuf>, output: impl Into<PathBuf>) -> Self {
        self.jobs.push(SynthesisJob {
            audio_prompt,
            output: output.into(),
        });
        self
    }

    /// Set the generation options shared by every job.
    pub fn with_options(mut self, options: GenerationOptions) -> Self {
        self.options = options;
        self
    }

    /// Resolve relative prompt paths against `dir`.
    pub fn with_prompt_dir(mut self, dir: &Path) -> Self {
        for job in &mut self.jobs {
            if let Some(prompt) = job.audio_prompt.take() {
                job.audio_prompt = Some(resolve(dir, prompt));
            }
        }
        self
    }

    /// Resolve relative output paths against `dir`.
    pub fn with_output_dir(mut self, dir: &Path) -> Self {
        for job in &mut self.jobs {
            let output = std::mem::take(&mut job.output);
            job.output = resolve(dir, output);
        }
        self
    }
}

fn resolve(dir: &Path, path: PathBuf) -> PathBuf {
    if path.is_absolute() {
        path
    } else {
        dir.join(path)
    }
}
