//! Linear ADSR envelope generator.
//!
//! Rates are per-sample increments. Attack and decay rates are scaled by a
//! shared modulation value supplied on every update (the synth's global
//! envelope LFO); release is never modulated.
//!
//! Decay hands over straight to release once the level reaches the sustain
//! gain, so a note rings down without a hold stage. [`EnvelopeState::Sustain`]
//! exists and holds its level, but is only entered through
//! [`AdsrEnvelope::hold`].

/// Full-scale factor applied to rates and gains: a level of 1.0 maps to the
/// largest positive 16-bit sample.
pub const ENVELOPE_SCALE: f32 = 32767.0;

/// Relative tolerance for reaching the attack peak under float accumulation.
const PEAK_TOLERANCE: f32 = 1e-6;

/// ADSR envelope states
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum EnvelopeState {
    /// Inactive. Output is zero and the voice is skipped by the renderer.
    #[default]
    Idle,
    /// Level rises toward the attack gain.
    Attack,
    /// Level falls toward the sustain gain.
    Decay,
    /// Level is held.
    Sustain,
    /// Level falls to zero.
    Release,
}

/// ADSR envelope with linear segments.
///
/// # Example
///
/// ```rust
/// use tonewheel_synth::{AdsrEnvelope, EnvelopeState};
///
/// let mut env = AdsrEnvelope::default();
/// env.init(0.1, 0.01, 0.01, 1.0, 0.5);
///
/// for _ in 0..10 {
///     env.update(1.0);
/// }
/// assert_eq!(env.state(), EnvelopeState::Decay);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct AdsrEnvelope {
    state: EnvelopeState,
    /// Current gain, scaled by [`ENVELOPE_SCALE`]
    level: f32,
    attack_rate: f32,
    decay_rate: f32,
    release_rate: f32,
    attack_gain: f32,
    sustain_gain: f32,
}

impl AdsrEnvelope {
    /// Create a configured envelope, starting in attack.
    pub fn new(
        attack_rate: f32,
        decay_rate: f32,
        release_rate: f32,
        attack_gain: f32,
        sustain_gain: f32,
    ) -> Self {
        let mut env = Self::default();
        env.init(
            attack_rate,
            decay_rate,
            release_rate,
            attack_gain,
            sustain_gain,
        );
        env
    }

    /// Configure rates and gains and restart from zero in attack.
    ///
    /// All values are normalized (1.0 = full scale) and stored multiplied by
    /// [`ENVELOPE_SCALE`]. Negative inputs are treated as zero.
    pub fn init(
        &mut self,
        attack_rate: f32,
        decay_rate: f32,
        release_rate: f32,
        attack_gain: f32,
        sustain_gain: f32,
    ) {
        self.attack_rate = attack_rate.max(0.0) * ENVELOPE_SCALE;
        self.decay_rate = decay_rate.max(0.0) * ENVELOPE_SCALE;
        self.release_rate = release_rate.max(0.0) * ENVELOPE_SCALE;
        self.attack_gain = attack_gain.max(0.0) * ENVELOPE_SCALE;
        self.sustain_gain = sustain_gain.max(0.0) * ENVELOPE_SCALE;
        self.state = EnvelopeState::Attack;
        self.level = 0.0;
    }

    /// Advance one sample and return the level.
    ///
    /// `env_mod` multiplies the attack and decay rates for this sample.
    #[inline]
    pub fn update(&mut self, env_mod: f32) -> f32 {
        match self.state {
            EnvelopeState::Attack => {
                self.level += self.attack_rate * env_mod;
                if self.level >= self.attack_gain * (1.0 - PEAK_TOLERANCE) {
                    self.level = self.attack_gain;
                    self.state = EnvelopeState::Decay;
                }
            }
            EnvelopeState::Decay => {
                if self.level > self.sustain_gain {
                    self.level = (self.level - self.decay_rate * env_mod).max(0.0);
                } else {
                    self.state = EnvelopeState::Release;
                }
            }
            EnvelopeState::Sustain => {}
            EnvelopeState::Release => {
                self.level = (self.level - self.release_rate).max(0.0);
                if self.level <= 0.0 {
                    self.state = EnvelopeState::Idle;
                }
            }
            EnvelopeState::Idle => {
                self.level = 0.0;
            }
        }
        self.level
    }

    /// Freeze the current level (enter sustain).
    pub fn hold(&mut self) {
        if self.state != EnvelopeState::Idle {
            self.state = EnvelopeState::Sustain;
        }
    }

    /// Start the release segment from the current level.
    pub fn release(&mut self) {
        if self.state != EnvelopeState::Idle {
            self.state = EnvelopeState::Release;
        }
    }

    /// Force the envelope to idle at zero.
    pub fn silence(&mut self) {
        self.state = EnvelopeState::Idle;
        self.level = 0.0;
    }

    /// Current state.
    pub fn state(&self) -> EnvelopeState {
        self.state
    }

    /// Current level (scaled).
    pub fn level(&self) -> f32 {
        self.level
    }

    /// Current level relative to full scale.
    pub fn normalized_level(&self) -> f32 {
        self.level / ENVELOPE_SCALE
    }

    /// Peak level (scaled).
    pub fn attack_gain(&self) -> f32 {
        self.attack_gain
    }

    /// Level at which decay hands over to release (scaled).
    pub fn sustain_gain(&self) -> f32 {
        self.sustain_gain
    }

    /// `true` unless idle.
    pub fn is_active(&self) -> bool {
        self.state != EnvelopeState::Idle
    }
}
