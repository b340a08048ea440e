//! WAV encoding and decoding.

use std::io::{Cursor, Read};
use std::path::Path;

use hound::{SampleFormat, WavReader, WavSpec, WavWriter};
use thiserror::Error;

/// Errors that can occur while reading or writing audio files.
#[derive(Error, Debug)]
pub enum AudioError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("WAV error: {0}")]
    Wav(#[from] hound::Error),

    #[error("Audio contains no samples")]
    Empty,

    #[error("Invalid sample rate: {0}")]
    InvalidSampleRate(u32),
}

/// A mono waveform buffer and the rate it was sampled at.
#[derive(Debug, Clone, PartialEq)]
pub struct Waveform {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
}

impl Waveform {
    pub fn new(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self {
            samples,
            sample_rate,
        }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Playback length in seconds.
    pub fn duration_secs(&self) -> f32 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.samples.len() as f32 / self.sample_rate as f32
    }
}

/// Write mono samples to `path` as a 32-bit float WAV file.
pub fn save_wav(path: &Path, samples: &[f32], sample_rate: u32) -> Result<(), AudioError> {
    if sample_rate == 0 {
        return Err(AudioError::InvalidSampleRate(sample_rate));
    }

    let spec = WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 32,
        sample_format: SampleFormat::Float,
    };

    let mut writer = WavWriter::create(path, spec)?;
    for &sample in samples {
        writer.write_sample(sample)?;
    }
    writer.finalize()?;

    Ok(())
}

/// Read a WAV file into a mono waveform.
pub fn read_wav(path: &Path) -> Result<Waveform, AudioError> {
    let reader = WavReader::open(path)?;
    collect_mono(reader)
}

/// Decode an in-memory WAV file, as returned by the model server.
pub fn decode_wav(bytes: &[u8]) -> Result<Waveform, AudioError> {
    let reader = WavReader::new(Cursor::new(bytes))?;
    collect_mono(reader)
}

/// Check that `path` is a readable WAV file with at least one frame.
pub fn probe_wav(path: &Path) -> Result<WavSpec, AudioError> {
    let reader = WavReader::open(path)?;
    if reader.duration() == 0 {
        return Err(AudioError::Empty);
    }
    Ok(reader.spec())
}

fn collect_mono<R: Read>(mut reader: WavReader<R>) -> Result<Waveform, AudioError> {
    let spec = reader.spec();

    let interleaved: Vec<f32> = match spec.sample_format {
        SampleFormat::Float => reader.samples::<f32>().collect::<Result<_, _>>()?,
        SampleFormat::Int => {
            let scale = (1i64 << (spec.bits_per_sample - 1)) as f32;
            reader
                .samples::<i32>()
                .map(|s| s.map(|v| v as f32 / scale))
                .collect::<Result<_, _>>()?
        }
    };

    let channels = spec.channels.max(1) as usize;
    let samples = if channels == 1 {
        interleaved
    } else {
        interleaved
            .chunks(channels)
            .map(|frame| frame.iter().sum::<f32>() / frame.len() as f32)
            .collect()
    };

    Ok(Waveform::new(samples, spec.sample_rate))
}
