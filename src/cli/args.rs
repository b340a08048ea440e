//! CLI argument definitions.

use clap::{Parser, ValueEnum};
use std::fmt;
use std::path::PathBuf;

use crate::backend::GenerationOptions;
use crate::plan::{DEFAULT_TEXT, SynthesisPlan};

/// Synthesize speech with a Chatterbox model server, with and without voice prompts.
#[derive(Parser, Debug)]
#[command(name = "chatterbox-driver")]
#[command(about = "Generate speech with Chatterbox, unconditioned and voice-conditioned")]
#[command(version)]
pub struct Args {
    /// Compute device the model is loaded on
    #[arg(short, long, value_enum, default_value = "cuda")]
    pub device: Device,

    /// Model server host address
    #[arg(long, default_value = "localhost")]
    pub host: String,

    /// Model server port
    #[arg(long, default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Text to synthesize
    #[arg(short, long, default_value = DEFAULT_TEXT)]
    pub text: String,

    /// Directory holding the reference voice prompts
    #[arg(long, default_value = ".")]
    pub prompt_dir: PathBuf,

    /// Directory the generated WAV files are written to
    #[arg(short, long, default_value = ".")]
    pub output_dir: PathBuf,

    /// Emotion exaggeration (0.0 to 2.0)
    #[arg(long, default_value_t = 0.5)]
    pub exaggeration: f32,

    /// Classifier-free guidance weight (0.0 to 1.0)
    #[arg(long, default_value_t = 0.5)]
    pub cfg_weight: f32,

    /// Sampling temperature (0.05 to 2.0)
    #[arg(long, default_value_t = 0.8)]
    pub temperature: f32,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

/// Default port of the Chatterbox model server.
pub const DEFAULT_PORT: u16 = 9282;

impl Args {
    /// Build the run plan described by these arguments.
    pub fn plan(&self) -> SynthesisPlan {
        SynthesisPlan::demo(self.text.clone())
            .with_options(self.options())
            .with_prompt_dir(&self.prompt_dir)
            .with_output_dir(&self.output_dir)
    }

    /// Generation options selected on the command line.
    pub fn options(&self) -> GenerationOptions {
        GenerationOptions {
            exaggeration: self.exaggeration,
            cfg_weight: self.cfg_weight,
            temperature: self.temperature,
        }
    }
}

/// Compute device selection.
#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Device {
    /// NVIDIA GPU
    #[default]
    #[value(name = "cuda")]
    Cuda,

    /// Apple Silicon GPU
    #[value(name = "mps")]
    Mps,

    /// CPU only
    #[value(name = "cpu")]
    Cpu,
}

impl Device {
    /// Returns the device identifier understood by the model server.
    pub fn as_str(&self) -> &'static str {
        match self {
            Device::Cuda => "cuda",
            Device::Mps => "mps",
            Device::Cpu => "cpu",
        }
    }
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
