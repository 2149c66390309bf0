//! Audio I/O layer for the tonewheel synth.
//!
//! This crate provides:
//!
//! - **WAV file I/O**: [`write_wav`], [`read_wav`] and the streaming
//!   [`WavRecorder`] for interleaved 16-bit synth output
//! - **Real-time streaming**: [`AudioStream`] for live output through cpal
//! - **Sample conversion**: [`write_frames`] maps interleaved stereo `i16`
//!   onto whatever channel layout the device wants
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use tonewheel_io::{WavRecorder, WavSpec};
//!
//! let mut recorder = WavRecorder::create("out.wav", WavSpec::stereo(44100))?;
//! recorder.write_samples(buffer.half(half))?;
//! recorder.finalize()?;
//! ```

mod stream;
mod wav;

pub use stream::{
    AudioDevice, AudioStream, StreamConfig, default_device, list_devices, write_frames,
};
pub use wav::{WavInfo, WavRecorder, WavSpec, read_wav, read_wav_info, write_wav};

/// Error types for audio I/O operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// WAV file read/write error.
    #[error("WAV file error: {0}")]
    Wav(#[from] hound::Error),

    /// Audio stream setup or runtime error.
    #[error("Audio stream error: {0}")]
    Stream(String),

    /// No audio device available on the system.
    #[error("No audio device available")]
    NoDevice,

    /// The requested sample format is not supported.
    #[error("Unsupported sample format: {0}")]
    UnsupportedFormat(String),

    /// The requested audio device was not found.
    #[error("Device not found: {0}")]
    DeviceNotFound(String),

    /// Standard I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience result type for audio I/O operations.
pub type Result<T> = std::result::Result<T, Error>;
