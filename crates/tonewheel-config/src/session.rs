//! Session file format and operations.

use serde::{Deserialize, Serialize};
use std::path::Path;

use tonewheel_synth::{
    DEFAULT_BUFFER_SIZE, DoubleBuffer, Patch, Sequencer, Synth, Track, Waveform, parse_steps,
};

use crate::error::ConfigError;
use crate::validation::{ValidationError, validate_session};

/// Session file format: everything needed to set up a synth and play it.
///
/// # TOML Format
///
/// ```toml
/// name = "demo"
/// description = "Lead and bass"
/// sample_rate = 44100
/// buffer_size = 4096
/// delay_length = 11025
/// decay_shift = 2
/// transpose = 0
///
/// [env_mod]
/// waveform = "sine_dc"
/// amplitude = 0.0
/// frequency = 0.0
/// dc = 1.0
///
/// [[tracks]]
/// patch = "lead"
/// steps = [36, -1, 12, 12]
/// step_ms = 250
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Session {
    /// Name of the session.
    pub name: String,

    /// Optional description of the session.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Output sample rate in Hz (defaults to 44100).
    #[serde(default = "default_sample_rate")]
    pub sample_rate: u32,

    /// Size of the shared interleaved output buffer in bytes (defaults to 4096).
    #[serde(default = "default_buffer_size")]
    pub buffer_size: usize,

    /// Delay line length in samples (defaults to a quarter second at 44.1 kHz).
    #[serde(default = "default_delay_length")]
    pub delay_length: usize,

    /// Right shift applied to the delay feedback (defaults to 2).
    #[serde(default = "default_decay_shift")]
    pub decay_shift: u8,

    /// Starting transpose step index.
    #[serde(default)]
    pub transpose: usize,

    /// Global envelope-rate LFO.
    #[serde(default)]
    pub env_mod: EnvModConfig,

    /// Sequencer tracks.
    #[serde(default)]
    pub tracks: Vec<TrackConfig>,
}

fn default_sample_rate() -> u32 {
    44100
}

fn default_buffer_size() -> usize {
    DEFAULT_BUFFER_SIZE
}

fn default_delay_length() -> usize {
    11025
}

fn default_decay_shift() -> u8 {
    2
}

/// Global envelope LFO settings.
///
/// Its output multiplies every envelope's attack and decay rate, so the
/// default is a constant 1.0.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EnvModConfig {
    /// Waveform name (see [`Waveform::name`]).
    pub waveform: String,
    /// LFO depth.
    #[serde(default)]
    pub amplitude: f32,
    /// LFO rate in Hz.
    #[serde(default)]
    pub frequency: f32,
    /// DC offset; the centre of the modulation.
    #[serde(default = "default_dc")]
    pub dc: f32,
}

fn default_dc() -> f32 {
    1.0
}

impl Default for EnvModConfig {
    fn default() -> Self {
        Self {
            waveform: Waveform::SineDc.name().to_string(),
            amplitude: 0.0,
            frequency: 0.0,
            dc: 1.0,
        }
    }
}

/// One sequencer track.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TrackConfig {
    /// Patch name (see [`Patch::name`]).
    pub patch: String,
    /// Pattern: `-1` for a rest, otherwise a note index.
    pub steps: Vec<i8>,
    /// Step length in milliseconds.
    pub step_ms: u32,
}

impl TrackConfig {
    /// Create a track configuration.
    pub fn new(patch: impl Into<String>, steps: Vec<i8>, step_ms: u32) -> Self {
        Self {
            patch: patch.into(),
            steps,
            step_ms,
        }
    }

    /// Build the runtime track.
    pub fn build(&self) -> Result<Track, ConfigError> {
        let patch: Patch = self.patch.parse()?;
        let steps = parse_steps(&self.steps)?;
        Ok(Track::new(patch, steps, self.step_ms))
    }
}

impl Session {
    /// Create a session with default settings and no tracks.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            sample_rate: default_sample_rate(),
            buffer_size: default_buffer_size(),
            delay_length: default_delay_length(),
            decay_shift: default_decay_shift(),
            transpose: 0,
            env_mod: EnvModConfig::default(),
            tracks: Vec::new(),
        }
    }

    /// Create a session with a description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Set the sample rate.
    pub fn with_sample_rate(mut self, sample_rate: u32) -> Self {
        self.sample_rate = sample_rate;
        self
    }

    /// Add a track.
    pub fn with_track(mut self, track: TrackConfig) -> Self {
        self.tracks.push(track);
        self
    }

    /// Load a session from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content =
            std::fs::read_to_string(path).map_err(|e| ConfigError::read_file(path, e))?;
        let session: Session = toml::from_str(&content)?;
        Ok(session)
    }

    /// Load a session from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(toml_str)?)
    }

    /// Save the session to a TOML file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::create_dir(parent, e))?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content).map_err(|e| ConfigError::write_file(path, e))?;
        Ok(())
    }

    /// Convert the session to a TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Check the session for errors.
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_session(self)
    }

    /// Build a synth configured by this session.
    ///
    /// Validates first. The delay buffer is allocated here; failure to
    /// allocate is an error, not a panic.
    pub fn build_synth<const N: usize>(&self) -> Result<Synth<N>, ConfigError> {
        self.validate()?;

        let mut synth: Synth<N> = Synth::new(self.sample_rate as f32);
        synth.init_delay(self.delay_length, self.decay_shift)?;

        let waveform = Waveform::from_name(&self.env_mod.waveform)
            .ok_or_else(|| ValidationError::UnknownWaveform(self.env_mod.waveform.clone()))?;
        synth.set_env_mod(
            waveform,
            self.env_mod.amplitude,
            self.env_mod.frequency,
            self.env_mod.dc,
        );
        synth.tuning_mut().set_transpose_index(self.transpose);
        Ok(synth)
    }

    /// Build the runtime tracks.
    pub fn build_tracks(&self) -> Result<Vec<Track>, ConfigError> {
        self.tracks.iter().map(TrackConfig::build).collect()
    }

    /// Build a sequencer holding every track.
    pub fn build_sequencer(&self) -> Result<Sequencer, ConfigError> {
        Ok(Sequencer::new(self.build_tracks()?))
    }

    /// Allocate the output double buffer.
    pub fn build_buffer(&self) -> Result<DoubleBuffer, ConfigError> {
        Ok(DoubleBuffer::new(self.buffer_size)?)
    }

    /// Frames rendered per buffer half.
    pub fn frames_per_half(&self) -> usize {
        self.buffer_size / 8
    }

    /// Duration of one buffer half in seconds.
    pub fn half_duration_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.frames_per_half() as f64 / f64::from(self.sample_rate)
    }

    /// Patch names used by the tracks, in track order.
    pub fn patch_names(&self) -> Vec<&str> {
        self.tracks.iter().map(|t| t.patch.as_str()).collect()
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new("Untitled")
    }
}
