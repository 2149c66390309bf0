//! Factory sessions bundled with the library.
//!
//! These are always available without external files and double as
//! examples of the session format.

use std::path::Path;

use crate::Session;
use crate::error::ConfigError;

/// Array of factory session names for external access.
pub static FACTORY_SESSION_NAMES: &[&str] = &["demo", "trio", "glass"];

/// TOML content for factory sessions, embedded at compile time.
static FACTORY_SESSIONS_TOML: &[(&str, &str)] = &[
    ("demo", DEMO_SESSION),
    ("trio", TRIO_SESSION),
    ("glass", GLASS_SESSION),
];

/// Lead over an octave-jumping bass.
const DEMO_SESSION: &str = r#"
name = "demo"
description = "Lead over an octave-jumping bass, quarter-second echo"
sample_rate = 44100
buffer_size = 4096
delay_length = 11025
decay_shift = 2
transpose = 0

[env_mod]
waveform = "sine_dc"
amplitude = 0.0
frequency = 0.0
dc = 1.0

[[tracks]]
patch = "lead"
steps = [36, -1, 12, 12, -1, -1, -1, -1, 48, -1, 17, 12, -1, -1, -1, 24]
step_ms = 250

[[tracks]]
patch = "bass"
steps = [0, 12, 0, 12, 0, 12, 0, 12, 7, 19, 7, 19, 7, 19, 7, 19]
step_ms = 500
"#;

/// Demo plus a slow saw/triangle duet.
const TRIO_SESSION: &str = r#"
name = "trio"
description = "Demo tracks plus a slow saw/triangle duet"
sample_rate = 44100
buffer_size = 4096
delay_length = 11025
decay_shift = 2
transpose = 0

[env_mod]
waveform = "sine_dc"
amplitude = 0.0
frequency = 0.0
dc = 1.0

[[tracks]]
patch = "lead"
steps = [36, -1, 12, 12, -1, -1, -1, -1, 48, -1, 17, 12, -1, -1, -1, 24]
step_ms = 250

[[tracks]]
patch = "bass"
steps = [0, 12, 0, 12, 0, 12, 0, 12, 7, 19, 7, 19, 7, 19, 7, 19]
step_ms = 500

[[tracks]]
patch = "duet"
steps = [-1, -1, -1, -1, 24, -1, 22, 19]
step_ms = 1000
"#;

/// Wavetable pads with breathing envelopes and a long echo.
const GLASS_SESSION: &str = r#"
name = "glass"
description = "Morphing wavetable arpeggio, breathing envelopes, long echo"
sample_rate = 44100
buffer_size = 4096
delay_length = 16538
decay_shift = 1
transpose = 0

[env_mod]
waveform = "sine_dc"
amplitude = 0.5
frequency = 0.1
dc = 1.0

[[tracks]]
patch = "glass"
steps = [24, -1, 31, -1, 28, -1, 36, 35]
step_ms = 375

[[tracks]]
patch = "bass"
steps = [12, -1, -1, -1, 17, -1, 19, -1]
step_ms = 750
"#;

/// Get all factory sessions.
pub fn factory_sessions() -> Vec<Session> {
    FACTORY_SESSIONS_TOML
        .iter()
        .filter_map(|(_, toml)| Session::from_toml(toml).ok())
        .collect()
}

/// Get a factory session by name (case-insensitive).
///
/// # Example
///
/// ```rust
/// use tonewheel_config::get_factory_session;
///
/// let demo = get_factory_session("Demo").unwrap();
/// assert_eq!(demo.tracks.len(), 2);
/// ```
pub fn get_factory_session(name: &str) -> Option<Session> {
    FACTORY_SESSIONS_TOML
        .iter()
        .find(|(session_name, _)| session_name.eq_ignore_ascii_case(name))
        .and_then(|(_, toml)| Session::from_toml(toml).ok())
}

/// Check if a name is a factory session (case-insensitive).
pub fn is_factory_session(name: &str) -> bool {
    FACTORY_SESSION_NAMES
        .iter()
        .any(|n| n.eq_ignore_ascii_case(name))
}

/// Resolve a session argument: a factory name, or a path to a TOML file.
///
/// Factory names win over files of the same name in the working directory.
pub fn resolve_session(name_or_path: &str) -> Result<Session, ConfigError> {
    if let Some(session) = get_factory_session(name_or_path) {
        return Ok(session);
    }
    let path = Path::new(name_or_path);
    if path.is_file() {
        return Session::load(path);
    }
    Err(ConfigError::SessionNotFound(name_or_path.to_string()))
}
