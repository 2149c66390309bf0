//! Session validation.
//!
//! Checks everything the synth would otherwise reject at setup time, plus
//! the things it would silently accept but that make no sense in a session
//! (no tracks, zero-length steps). All problems are collected, not just the
//! first.
//!
//! # Example
//!
//! ```rust
//! use tonewheel_config::{Session, validate_session};
//!
//! let mut session = Session::new("broken");
//! session.decay_shift = 40;
//!
//! assert!(validate_session(&session).is_err());
//! ```

use thiserror::Error;
use tonewheel_synth::{MAX_DECAY_SHIFT, Patch, Step, Waveform};

use crate::session::Session;

/// Validation error types.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ValidationError {
    /// Sample rate of zero.
    #[error("sample rate must be greater than zero")]
    ZeroSampleRate,

    /// Output buffer size is not a non-zero multiple of 8 bytes.
    #[error("buffer size {0} must be a non-zero multiple of 8 bytes")]
    BufferSize(usize),

    /// Delay line of zero samples.
    #[error("delay length must be at least one sample")]
    EmptyDelay,

    /// Decay shift past the 16-bit sample width.
    #[error("decay shift {0} out of range [0, 15]")]
    DecayShift(u8),

    /// Unknown envelope LFO waveform name.
    #[error("unknown waveform: {0}")]
    UnknownWaveform(String),

    /// Session has no tracks.
    #[error("session has no tracks")]
    NoTracks,

    /// Track refers to a patch that does not exist.
    #[error("track {track}: unknown patch '{patch}'")]
    UnknownPatch {
        /// Track index.
        track: usize,
        /// The patch name as written.
        patch: String,
    },

    /// Track step that is neither a rest nor a note.
    #[error("track {track}, step {step}: invalid value {value} (expected -1 or a note >= 0)")]
    InvalidStep {
        /// Track index.
        track: usize,
        /// Step index within the track.
        step: usize,
        /// The offending value.
        value: i8,
    },

    /// Track with zero step length.
    #[error("track {track}: step length must be greater than zero")]
    ZeroStepLength {
        /// Track index.
        track: usize,
    },

    /// Track with an empty pattern.
    #[error("track {track}: pattern is empty")]
    EmptyPattern {
        /// Track index.
        track: usize,
    },

    /// Multiple validation errors.
    #[error("multiple validation errors: {}", format_errors(.0))]
    Multiple(Vec<ValidationError>),
}

fn format_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Validate a whole session.
pub fn validate_session(session: &Session) -> ValidationResult<()> {
    let mut errors = Vec::new();

    if session.sample_rate == 0 {
        errors.push(ValidationError::ZeroSampleRate);
    }
    if session.buffer_size == 0 || session.buffer_size % 8 != 0 {
        errors.push(ValidationError::BufferSize(session.buffer_size));
    }
    if session.delay_length == 0 {
        errors.push(ValidationError::EmptyDelay);
    }
    if session.decay_shift > MAX_DECAY_SHIFT {
        errors.push(ValidationError::DecayShift(session.decay_shift));
    }
    if Waveform::from_name(&session.env_mod.waveform).is_none() {
        errors.push(ValidationError::UnknownWaveform(
            session.env_mod.waveform.clone(),
        ));
    }
    if session.tracks.is_empty() {
        errors.push(ValidationError::NoTracks);
    }

    for (track, config) in session.tracks.iter().enumerate() {
        if config.patch.parse::<Patch>().is_err() {
            errors.push(ValidationError::UnknownPatch {
                track,
                patch: config.patch.clone(),
            });
        }
        if config.step_ms == 0 {
            errors.push(ValidationError::ZeroStepLength { track });
        }
        if config.steps.is_empty() {
            errors.push(ValidationError::EmptyPattern { track });
        }
        for (step, &value) in config.steps.iter().enumerate() {
            if Step::try_from(value).is_err() {
                errors.push(ValidationError::InvalidStep { track, step, value });
            }
        }
    }

    match errors.len() {
        0 => Ok(()),
        1 => Err(errors.remove(0)),
        _ => Err(ValidationError::Multiple(errors)),
    }
}
