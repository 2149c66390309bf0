//! Tonewheel Synth - real-time polyphonic synthesis core
//!
//! This crate turns note-on events into interleaved stereo 16-bit PCM at a
//! fixed sample rate. It is `no_std` + `alloc`: everything is allocated at
//! setup time and the render loop neither allocates nor fails.
//!
//! # Core Components
//!
//! ## Oscillators
//!
//! Phase-accumulator oscillators with a closed set of waveforms, used both as
//! carriers and as LFOs:
//!
//! - [`Oscillator`] - phase accumulator with two modulation inputs
//! - [`Waveform`] - sine, square, pulse, saw, triangle, wavetable morph, noise
//! - [`SourceBank`] - wavetables and the shared seeded noise generator
//!
//! ## Envelopes
//!
//! - [`AdsrEnvelope`] - linear ADSR; decay hands straight over to release
//! - [`EnvelopeState`] - envelope stage
//!
//! ## Voices
//!
//! - [`Voice`] - two carriers, an envelope, pitch and morph LFOs
//! - [`VoicePool`] - fixed ring of voices, strict round-robin allocation
//!
//! ## Output
//!
//! - [`Synth`] - owns everything above and renders frames
//! - [`EffectsBus`] - feedback delay mixed into the output
//! - [`DoubleBuffer`] / [`BufferReady`] - half-buffer streaming handshake
//!
//! ## Playing notes
//!
//! - [`Patch`] - built-in instruments
//! - [`Tuning`] - note table and transpose
//! - [`Track`] / [`Sequencer`] - looping step patterns
//!
//! # Example
//!
//! ```rust
//! use tonewheel_synth::{BufferHalf, BufferReady, DoubleBuffer, Patch, Synth};
//!
//! let mut synth: Synth = Synth::new(44100.0);
//! synth.init_delay(11025, 2).unwrap();
//!
//! Patch::Lead.note_on(&mut synth, 36, 0).unwrap();
//! Patch::Bass.note_on(&mut synth, 12, 0).unwrap();
//!
//! let ready = BufferReady::new();
//! let mut buffer = DoubleBuffer::new(4096).unwrap();
//!
//! // The output device signals that the first half has been played
//! ready.raise(BufferHalf::First);
//! assert_eq!(synth.service(&ready, &mut buffer), Some(BufferHalf::First));
//! ```
//!
//! # Features
//!
//! - `std` (default): link `std`. Without it the crate is `no_std` + `alloc`.
//! - `delay` (default): feedback delay on the effects bus. Without it the
//!   bus is silent.
//! - `tracing`: debug events at setup time (never from the render loop).

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(not(feature = "std"))]
extern crate alloc;

pub mod envelope;
pub mod error;
pub mod fx_bus;
pub mod oscillator;
pub mod output;
pub mod patch;
pub mod sequencer;
pub mod synth;
pub mod tuning;
pub mod voice;
pub mod wavetable;

// Re-export main types at crate root
pub use envelope::{AdsrEnvelope, ENVELOPE_SCALE, EnvelopeState};
pub use error::SynthError;
pub use fx_bus::{EffectsBus, MAX_DECAY_SHIFT, saturate_i16};
pub use oscillator::{DEFAULT_SAMPLE_RATE, Oscillator, Waveform, freq_to_rad, wrap_phase};
pub use output::{BufferHalf, BufferReady, DEFAULT_BUFFER_SIZE, DoubleBuffer};
pub use patch::Patch;
pub use sequencer::{Sequencer, Step, Track, parse_steps};
pub use synth::{DEFAULT_POLYPHONY, Synth};
pub use tuning::{NOTE_COUNT, NoteTable, TRANSPOSE_STEPS, Tuning};
pub use voice::{DEFAULT_ENVELOPE, Voice, VoicePool};
pub use wavetable::{NOISE_SEED, NoiseSource, SourceBank, WAVETABLE_LEN, Wavetable, WavetableId};
