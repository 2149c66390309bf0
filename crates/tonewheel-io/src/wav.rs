//! WAV file reading and writing.
//!
//! The synth produces interleaved stereo 16-bit PCM, so that is the only
//! sample format handled here.

use crate::{Error, Result};
use hound::{SampleFormat, WavReader, WavWriter};
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;
use tonewheel_synth::{BufferHalf, DEFAULT_SAMPLE_RATE, DoubleBuffer};

/// WAV file specification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WavSpec {
    /// Number of audio channels (1 = mono, 2 = stereo).
    pub channels: u16,
    /// Sample rate in Hz (e.g., 44100, 48000).
    pub sample_rate: u32,
    /// Bit depth per sample. Always 16 for files written here.
    pub bits_per_sample: u16,
}

impl WavSpec {
    /// Interleaved stereo 16-bit at the given rate.
    pub fn stereo(sample_rate: u32) -> Self {
        Self {
            channels: 2,
            sample_rate,
            bits_per_sample: 16,
        }
    }
}

impl Default for WavSpec {
    fn default() -> Self {
        Self::stereo(DEFAULT_SAMPLE_RATE as u32)
    }
}

impl From<hound::WavSpec> for WavSpec {
    fn from(spec: hound::WavSpec) -> Self {
        Self {
            channels: spec.channels,
            sample_rate: spec.sample_rate,
            bits_per_sample: spec.bits_per_sample,
        }
    }
}

impl From<WavSpec> for hound::WavSpec {
    fn from(spec: WavSpec) -> Self {
        hound::WavSpec {
            channels: spec.channels,
            sample_rate: spec.sample_rate,
            bits_per_sample: spec.bits_per_sample,
            sample_format: SampleFormat::Int,
        }
    }
}

/// WAV file metadata extracted without loading sample data.
#[derive(Debug, Clone)]
pub struct WavInfo {
    /// File specification.
    pub spec: WavSpec,
    /// Total number of sample frames (samples per channel).
    pub num_frames: u64,
    /// Duration in seconds.
    pub duration_secs: f64,
}

/// Read WAV metadata without loading sample data.
pub fn read_wav_info<P: AsRef<Path>>(path: P) -> Result<WavInfo> {
    let reader = WavReader::open(path)?;
    let spec = WavSpec::from(reader.spec());
    let total_samples = u64::from(reader.len());
    let num_frames = total_samples / u64::from(spec.channels.max(1));
    let duration_secs = if spec.sample_rate == 0 {
        0.0
    } else {
        num_frames as f64 / f64::from(spec.sample_rate)
    };

    Ok(WavInfo {
        spec,
        num_frames,
        duration_secs,
    })
}

/// Read a 16-bit PCM WAV file as interleaved samples.
///
/// Float and non-16-bit files are rejected with [`Error::UnsupportedFormat`].
pub fn read_wav<P: AsRef<Path>>(path: P) -> Result<(Vec<i16>, WavSpec)> {
    let mut reader = WavReader::open(path)?;
    let raw = reader.spec();
    if raw.sample_format != SampleFormat::Int || raw.bits_per_sample != 16 {
        return Err(Error::UnsupportedFormat(format!(
            "{}-bit {:?} (expected 16-bit PCM)",
            raw.bits_per_sample, raw.sample_format
        )));
    }

    let samples = reader
        .samples::<i16>()
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok((samples, WavSpec::from(raw)))
}

/// Write interleaved 16-bit samples to a WAV file.
pub fn write_wav<P: AsRef<Path>>(path: P, samples: &[i16], spec: WavSpec) -> Result<()> {
    let mut recorder = WavRecorder::create(path, spec)?;
    recorder.write_samples(samples)?;
    recorder.finalize()
}

/// Streaming WAV writer for render output.
///
/// Samples are appended as they are rendered, so a long render never holds
/// the whole file in memory. Call [`finalize`](Self::finalize) to write the
/// final header; dropping the recorder also finalizes but swallows errors.
pub struct WavRecorder {
    writer: WavWriter<BufWriter<File>>,
    spec: WavSpec,
    samples_written: u64,
}

impl WavRecorder {
    /// Create (or truncate) a WAV file.
    pub fn create<P: AsRef<Path>>(path: P, spec: WavSpec) -> Result<Self> {
        if spec.bits_per_sample != 16 {
            return Err(Error::UnsupportedFormat(format!(
                "{}-bit output (only 16-bit is written)",
                spec.bits_per_sample
            )));
        }
        let writer = WavWriter::create(path, spec.into())?;
        Ok(Self {
            writer,
            spec,
            samples_written: 0,
        })
    }

    /// Append interleaved samples.
    pub fn write_samples(&mut self, samples: &[i16]) -> Result<()> {
        for &sample in samples {
            self.writer.write_sample(sample)?;
        }
        self.samples_written += samples.len() as u64;
        Ok(())
    }

    /// Append one rendered half of the output buffer.
    pub fn write_half(&mut self, buffer: &DoubleBuffer, half: BufferHalf) -> Result<()> {
        self.write_samples(buffer.half(half))
    }

    /// Frames written so far.
    pub fn frames_written(&self) -> u64 {
        self.samples_written / u64::from(self.spec.channels.max(1))
    }

    /// File specification.
    pub fn spec(&self) -> WavSpec {
        self.spec
    }

    /// Flush and write the final header.
    pub fn finalize(self) -> Result<()> {
        self.writer.finalize()?;
        Ok(())
    }
}
