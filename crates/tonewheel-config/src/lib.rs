//! Session configuration for the tonewheel synth.
//!
//! A session describes a complete performance setup: sample rate, output
//! buffer, delay line, the global envelope LFO, and the sequencer tracks that
//! drive the built-in patches. Sessions are TOML files; a few are built in.
//!
//! # Features
//!
//! - **Session files**: load and save TOML
//! - **Validation**: every problem in a session reported at once
//! - **Building**: a configured [`Synth`](tonewheel_synth::Synth), its
//!   tracks and its output buffer from one session
//! - **Factory sessions**: `demo`, `trio`, `glass`
//!
//! # Example
//!
//! ```rust
//! use tonewheel_config::{Session, TrackConfig, get_factory_session};
//! use tonewheel_synth::Synth;
//!
//! let demo = get_factory_session("demo").unwrap();
//! let synth: Synth = demo.build_synth().unwrap();
//! let sequencer = demo.build_sequencer().unwrap();
//! assert_eq!(sequencer.tracks().len(), 2);
//!
//! let custom = Session::new("mine")
//!     .with_description("One lonely lead")
//!     .with_track(TrackConfig::new("lead", vec![36, -1, 48, -1], 200));
//! assert!(custom.validate().is_ok());
//! ```

mod error;
mod session;

/// Session validation.
pub mod validation;

/// Factory sessions bundled with the library.
pub mod factory_sessions;

pub use error::ConfigError;
pub use factory_sessions::{
    FACTORY_SESSION_NAMES, factory_sessions, get_factory_session, is_factory_session,
    resolve_session,
};
pub use session::{EnvModConfig, Session, TrackConfig};
pub use validation::{ValidationError, ValidationResult, validate_session};
