//! The synth context and its render loop.
//!
//! [`Synth`] owns everything the render loop touches: the voice pool, the
//! global LFOs, the effects bus, the wavetables and noise source, and the
//! tuning. Nothing is global; patches and the host get `&mut Synth`.
//!
//! ## Signal flow (per frame)
//!
//! ```text
//!  env LFO ──► env_mod ──┐
//!                        ▼
//!  voice[N-1..0]:  envelope.update ─► gain
//!                  pitch LFO ─► p,  morph LFO ─► m
//!                  left  += gain · osc[0](p, m)
//!                  right += gain · osc[1](p, m)
//!                        │
//!  delay tap ────────────┤  (added to both sides, then clipped)
//!                        ▼
//!        mono = (clip(left) + clip(right)) / 2 ─► [mono, mono]
//!        delay feed ◄── left + right (before clipping)
//! ```

use crate::envelope::EnvelopeState;
use crate::error::SynthError;
use crate::fx_bus::{EffectsBus, saturate_i16};
use crate::oscillator::{DEFAULT_SAMPLE_RATE, Oscillator, Waveform};
use crate::output::{BufferHalf, BufferReady, DoubleBuffer};
use crate::tuning::Tuning;
use crate::voice::{Voice, VoicePool};
use crate::wavetable::{NOISE_SEED, SourceBank};

#[cfg(not(feature = "std"))]
extern crate alloc;

#[cfg(feature = "std")]
extern crate std as alloc;

use alloc::boxed::Box;

/// Default polyphony.
pub const DEFAULT_POLYPHONY: usize = 8;

/// Polyphonic synth with `N` voices.
///
/// # Example
///
/// ```rust
/// use tonewheel_synth::{Patch, Synth};
///
/// let mut synth: Synth = Synth::new(44100.0);
/// synth.init_delay(4410, 2).unwrap();
/// Patch::Lead.note_on(&mut synth, 36, 0).unwrap();
///
/// let mut out = [0i16; 512];
/// synth.render_slice(&mut out);
/// assert!(out.iter().any(|&s| s != 0));
/// ```
#[derive(Debug, Clone)]
pub struct Synth<const N: usize = DEFAULT_POLYPHONY> {
    pool: VoicePool<N>,
    /// Global LFO whose output scales envelope attack/decay rates
    lfo_env_mod: Oscillator,
    /// Global filter LFO. Configurable but not wired into the signal path.
    lfo_filter: Oscillator,
    bus: EffectsBus,
    sources: SourceBank,
    tuning: Tuning,
    sample_rate: f32,
}

impl<const N: usize> Default for Synth<N> {
    fn default() -> Self {
        Self::new(DEFAULT_SAMPLE_RATE)
    }
}

impl<const N: usize> Synth<N> {
    /// Create a synth with idle voices and no delay buffer.
    ///
    /// The envelope LFO starts as a constant 1.0 so envelopes run at their
    /// nominal rates.
    pub fn new(sample_rate: f32) -> Self {
        Self::with_seed(sample_rate, NOISE_SEED)
    }

    /// Like [`new`](Self::new) with a custom noise seed.
    pub fn with_seed(sample_rate: f32, seed: u64) -> Self {
        let mut lfo_env_mod = Oscillator::new(sample_rate);
        lfo_env_mod.init(Waveform::Nop, 0.0, 0.0, 0.0, 1.0);

        #[cfg(feature = "tracing")]
        tracing::debug!(voices = N, sample_rate, "synth created");

        Self {
            pool: VoicePool::new(sample_rate),
            lfo_env_mod,
            lfo_filter: Oscillator::new(sample_rate),
            bus: EffectsBus::new(),
            sources: SourceBank::new(seed),
            tuning: Tuning::new(),
            sample_rate,
        }
    }

    /// Allocate and install a delay buffer of `len` samples.
    pub fn init_delay(&mut self, len: usize, decay_shift: u8) -> Result<(), SynthError> {
        let buffer = EffectsBus::allocate(len)?;
        self.bus.init(buffer, decay_shift)
    }

    /// Install a caller-supplied delay buffer. The previous one is dropped.
    pub fn set_delay_buffer(&mut self, buffer: Box<[i16]>, decay_shift: u8) -> Result<(), SynthError> {
        self.bus.init(buffer, decay_shift)
    }

    /// Configure the global envelope LFO.
    pub fn set_env_mod(&mut self, waveform: Waveform, amplitude: f32, freq_hz: f32, dc: f32) {
        self.lfo_env_mod.init(waveform, amplitude, 0.0, freq_hz, dc);
    }

    /// Render `out.len() / 2` interleaved stereo frames.
    ///
    /// Both channels carry the same mono mix. A trailing odd sample is left
    /// untouched.
    pub fn render_slice(&mut self, out: &mut [i16]) {
        for frame in out.chunks_exact_mut(2) {
            let env_mod = self.lfo_env_mod.advance(0.0, 0.0, &mut self.sources);

            let mut left: i32 = 0;
            let mut right: i32 = 0;
            for voice in self.pool.voices_mut().iter_mut().rev() {
                if voice.env.state() == EnvelopeState::Idle {
                    continue;
                }
                let (l, r) = render_voice(voice, env_mod, &mut self.sources);
                left = left.saturating_add(l);
                right = right.saturating_add(r);
            }

            let delayed = i32::from(self.bus.tap());
            left = left.saturating_add(delayed);
            right = right.saturating_add(delayed);

            let mono = (i32::from(saturate_i16(left)) + i32::from(saturate_i16(right))) / 2;
            frame[0] = mono as i16;
            frame[1] = mono as i16;

            self.bus.feed(left.saturating_add(right));
        }
    }

    /// Fill the half signalled by `ready`, if any.
    ///
    /// The signal is taken (cleared) before rendering, so a half raised by
    /// the device while this call runs is kept for the next one. Returns the
    /// half that was rendered.
    pub fn service(&mut self, ready: &BufferReady, buffer: &mut DoubleBuffer) -> Option<BufferHalf> {
        let half = ready.take()?;
        self.render_slice(buffer.half_mut(half));
        Some(half)
    }

    /// Silence all voices and clear the delay line.
    pub fn reset(&mut self) {
        self.pool.silence_all();
        self.bus.clear();
    }

    /// Change the sample rate used by later frequency settings.
    pub fn set_sample_rate(&mut self, sample_rate: f32) {
        self.sample_rate = sample_rate;
        self.pool.set_sample_rate(sample_rate);
        self.lfo_env_mod.set_sample_rate(sample_rate);
        self.lfo_filter.set_sample_rate(sample_rate);
    }

    /// Sample rate in Hz.
    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    /// Take the next voice from the pool. See [`VoicePool::acquire`].
    pub fn acquire_voice(&mut self, flags: u32) -> &mut Voice {
        self.pool.acquire(flags)
    }

    /// The voice pool.
    pub fn pool(&self) -> &VoicePool<N> {
        &self.pool
    }

    /// Mutable voice pool.
    pub fn pool_mut(&mut self) -> &mut VoicePool<N> {
        &mut self.pool
    }

    /// Envelope modulation LFO.
    pub fn lfo_env_mod(&self) -> &Oscillator {
        &self.lfo_env_mod
    }

    /// Mutable envelope modulation LFO.
    pub fn lfo_env_mod_mut(&mut self) -> &mut Oscillator {
        &mut self.lfo_env_mod
    }

    /// Filter LFO (not routed anywhere).
    pub fn lfo_filter(&self) -> &Oscillator {
        &self.lfo_filter
    }

    /// Mutable filter LFO.
    pub fn lfo_filter_mut(&mut self) -> &mut Oscillator {
        &mut self.lfo_filter
    }

    /// Effects bus.
    pub fn bus(&self) -> &EffectsBus {
        &self.bus
    }

    /// Wavetables and noise.
    pub fn sources(&self) -> &SourceBank {
        &self.sources
    }

    /// Mutable wavetables and noise, for registering user tables.
    pub fn sources_mut(&mut self) -> &mut SourceBank {
        &mut self.sources
    }

    /// Note table and transpose state.
    pub fn tuning(&self) -> &Tuning {
        &self.tuning
    }

    /// Mutable tuning.
    pub fn tuning_mut(&mut self) -> &mut Tuning {
        &mut self.tuning
    }

    /// Step to the next transpose offset; returns it in semitones.
    pub fn advance_transpose(&mut self) -> u8 {
        let offset = self.tuning.advance_transpose();
        #[cfg(feature = "tracing")]
        tracing::debug!(offset, "transpose");
        offset
    }
}

/// One sample of one voice, as (left, right) contributions.
#[inline]
fn render_voice(voice: &mut Voice, env_mod: f32, sources: &mut SourceBank) -> (i32, i32) {
    let gain = voice.env.update(env_mod);
    let p = voice.lfo_pitch.advance(0.0, 0.0, sources);
    let m = voice.lfo_morph.advance(0.0, 0.0, sources);
    let left = gain * voice.osc[0].advance(p, m, sources);
    let right = gain * voice.osc[1].advance(p, m, sources);
    (left as i32, right as i32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::envelope::ENVELOPE_SCALE;

    fn held_voice(synth: &mut Synth<4>, waveform: Waveform, amp: f32) {
        let voice = synth.acquire_voice(0);
        voice.env.init(1.0, 0.0, 0.0, 1.0, 1.0);
        voice.env.update(1.0);
        voice.env.hold();
        for osc in &mut voice.osc {
            osc.init(waveform, amp, 0.0, 220.0, 0.0);
        }
    }

    #[test]
    fn idle_synth_renders_silence() {
        let mut synth: Synth<4> = Synth::new(44100.0);
        synth.init_delay(100, 0).unwrap();
        let mut out = [1i16; 256];
        synth.render_slice(&mut out);
        assert!(out.iter().all(|&s| s == 0));
    }

    #[test]
    fn frames_are_mono() {
        let mut synth: Synth<4> = Synth::new(44100.0);
        held_voice(&mut synth, Waveform::Saw, 0.3);
        let mut out = [0i16; 512];
        synth.render_slice(&mut out);
        for frame in out.chunks_exact(2) {
            assert_eq!(frame[0], frame[1]);
        }
        assert!(out.iter().any(|&s| s != 0));
    }

    #[test]
    fn full_scale_voices_clip_to_i16() {
        let mut synth: Synth<4> = Synth::new(44100.0);
        synth.init_delay(64, 0).unwrap();
        for _ in 0..4 {
            held_voice(&mut synth, Waveform::Rect, 1.0);
        }
        let mut out = [0i16; 1024];
        synth.render_slice(&mut out);
        // Four voices at full scale: every sample clipped to one of the rails
        assert!(out.iter().all(|&s| s == i16::MAX || s == i16::MIN));
    }

    #[test]
    fn odd_trailing_sample_untouched() {
        let mut synth: Synth<4> = Synth::new(44100.0);
        held_voice(&mut synth, Waveform::Rect, 0.5);
        let mut out = [42i16; 5];
        synth.render_slice(&mut out);
        assert_eq!(out[4], 42);
        assert_ne!(out[0], 42);
    }

    #[test]
    fn env_mod_default_is_neutral() {
        let mut synth: Synth<4> = Synth::new(44100.0);
        let lfo = *synth.lfo_env_mod();
        assert_eq!(lfo.waveform(), Waveform::Nop);
        assert_eq!(lfo.dc_offset(), 1.0);

        synth.set_env_mod(Waveform::SineDc, 0.0, 0.0, 0.5);
        assert_eq!(synth.lfo_env_mod().waveform(), Waveform::SineDc);
        assert_eq!(synth.lfo_env_mod_mut().dc_offset(), 0.5);
    }

    #[test]
    fn env_mod_drives_envelopes() {
        let mut synth: Synth<4> = Synth::new(44100.0);
        synth.set_env_mod(Waveform::Nop, 0.0, 0.0, 0.0);
        {
            let voice = synth.acquire_voice(0);
            voice.env.init(0.1, 0.0, 0.0, 1.0, 0.5);
            voice.osc[0].init(Waveform::Rect, 1.0, 0.0, 100.0, 0.0);
        }
        let mut out = [0i16; 64];
        synth.render_slice(&mut out);
        // Zero env_mod: attack never moves
        assert_eq!(synth.pool().voices()[0].env.level(), 0.0);
        assert!(out.iter().all(|&s| s == 0));
    }

    #[cfg(feature = "delay")]
    #[test]
    fn delay_echoes_after_voice_stops() {
        let mut synth: Synth<4> = Synth::new(44100.0);
        synth.init_delay(32, 0).unwrap();
        {
            let voice = synth.acquire_voice(0);
            voice.env.init(1.0, 1.0, 1.0, 0.5, 0.0);
            voice.osc[0].init(Waveform::Nop, 0.0, 0.0, 0.0, 1.0);
        }

        // One sample at half scale, then the voice falls to idle within a few frames
        let mut out = [0i16; 8];
        synth.render_slice(&mut out);
        assert!(out[0] > 0);
        assert_eq!(synth.pool().active_count(), 0);

        let mut later = [0i16; 64];
        synth.render_slice(&mut later);
        assert!(later.iter().any(|&s| s != 0), "echo expected");
    }

    #[test]
    fn service_renders_only_signalled_half() {
        let mut synth: Synth<4> = Synth::new(44100.0);
        held_voice(&mut synth, Waveform::Rect, 0.5);
        let ready = BufferReady::new();
        let mut buffer = DoubleBuffer::new(256).unwrap();

        assert_eq!(synth.service(&ready, &mut buffer), None);
        assert!(buffer.as_slice().iter().all(|&s| s == 0));

        ready.raise(BufferHalf::Second);
        assert_eq!(synth.service(&ready, &mut buffer), Some(BufferHalf::Second));
        assert!(buffer.half(BufferHalf::First).iter().all(|&s| s == 0));
        assert!(buffer.half(BufferHalf::Second).iter().all(|&s| s != 0));
        assert_eq!(ready.peek(), None);
    }

    #[test]
    fn huge_dc_saturates_instead_of_wrapping() {
        let mut synth: Synth<4> = Synth::new(44100.0);
        synth.init_delay(16, 0).unwrap();
        for _ in 0..4 {
            let voice = synth.acquire_voice(0);
            voice.env.init(1.0, 0.0, 0.0, 1.0, 1.0);
            voice.env.update(1.0);
            voice.env.hold();
            for osc in &mut voice.osc {
                osc.init(Waveform::Nop, 0.0, 0.0, 0.0, 1.0e5);
            }
        }
        // Long enough for the saturated feedback to come back out of the tap
        let mut out = [0i16; 128];
        synth.render_slice(&mut out);
        assert!(out.iter().all(|&s| s == i16::MAX));
    }

    #[test]
    fn reset_silences() {
        let mut synth: Synth<4> = Synth::new(44100.0);
        synth.init_delay(16, 0).unwrap();
        held_voice(&mut synth, Waveform::Rect, 0.5);
        let mut out = [0i16; 64];
        synth.render_slice(&mut out);
        synth.reset();
        synth.render_slice(&mut out);
        assert!(out.iter().all(|&s| s == 0));
    }

    #[test]
    fn default_polyphony() {
        let synth: Synth = Synth::default();
        assert_eq!(synth.pool().capacity(), DEFAULT_POLYPHONY);
        assert_eq!(synth.sample_rate(), DEFAULT_SAMPLE_RATE);
        assert_eq!(synth.pool().voices()[0].env.attack_gain(), ENVELOPE_SCALE);
    }
}
