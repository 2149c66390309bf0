//! Phase-accumulator oscillators.
//!
//! An [`Oscillator`] keeps its phase in radians in `[0, 2π)` and advances it
//! by a fixed increment per sample, plus an optional per-sample phase
//! modulation. The waveform is a closed set of kinds ([`Waveform`]) matched
//! once per sample.
//!
//! The same type serves as audio carrier and as LFO: an LFO is just an
//! oscillator at a low frequency whose output is fed into another
//! oscillator's modulation inputs.

use core::f32::consts::{FRAC_1_PI, PI, TAU};

use crate::wavetable::{SourceBank, WavetableId, lookup};

/// Sample rate used when none is given.
pub const DEFAULT_SAMPLE_RATE: f32 = 44100.0;

/// Convert a frequency in Hz to a phase increment in radians per sample.
#[inline]
pub fn freq_to_rad(freq_hz: f32, sample_rate: f32) -> f32 {
    TAU * freq_hz / sample_rate
}

/// Wrap a phase into `[0, 2π)`.
///
/// Euclidean, so negative phase modulation wraps from the top. Non-finite
/// input resets to 0.
#[inline]
pub fn wrap_phase(phase: f32) -> f32 {
    let r = phase - TAU * libm::floorf(phase / TAU);
    if (0.0..TAU).contains(&r) { r } else { 0.0 }
}

/// `a` when `x < edge`, `b` otherwise.
#[inline]
fn step(x: f32, edge: f32, a: f32, b: f32) -> f32 {
    if x < edge { a } else { b }
}

/// Oscillator waveform kinds.
///
/// The `*Dc` variants add the oscillator's DC offset to the output; the plain
/// variants ignore it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Waveform {
    /// Sine from the shared table.
    Sine,
    /// Sine plus DC offset.
    SineDc,
    /// Square: `+amp` in the first half cycle, `-amp` in the second.
    Rect,
    /// Square whose edge moves with the second modulation input (pulse width).
    RectPhase,
    /// Square plus DC offset.
    RectDc,
    /// Rising ramp from `-amp` to `+amp`.
    Saw,
    /// Ramp plus DC offset.
    SawDc,
    /// Folded ramp, clamped at `-amp`.
    Triangle,
    /// Triangle plus DC offset.
    TriangleDc,
    /// Linear blend of two wavetables, blend factor from the morph input.
    WavetableMorph,
    /// White noise from the shared generator. Phase does not move.
    Noise,
    /// Noise plus DC offset.
    NoiseDc,
    /// Outputs the DC offset and nothing else. Used to switch an oscillator off.
    #[default]
    Nop,
}

impl Waveform {
    /// Every waveform kind.
    pub const ALL: [Waveform; 13] = [
        Waveform::Sine,
        Waveform::SineDc,
        Waveform::Rect,
        Waveform::RectPhase,
        Waveform::RectDc,
        Waveform::Saw,
        Waveform::SawDc,
        Waveform::Triangle,
        Waveform::TriangleDc,
        Waveform::WavetableMorph,
        Waveform::Noise,
        Waveform::NoiseDc,
        Waveform::Nop,
    ];

    /// Snake-case name, as used in session files.
    pub fn name(self) -> &'static str {
        match self {
            Waveform::Sine => "sine",
            Waveform::SineDc => "sine_dc",
            Waveform::Rect => "rect",
            Waveform::RectPhase => "rect_phase",
            Waveform::RectDc => "rect_dc",
            Waveform::Saw => "saw",
            Waveform::SawDc => "saw_dc",
            Waveform::Triangle => "triangle",
            Waveform::TriangleDc => "triangle_dc",
            Waveform::WavetableMorph => "wavetable_morph",
            Waveform::Noise => "noise",
            Waveform::NoiseDc => "noise_dc",
            Waveform::Nop => "nop",
        }
    }

    /// Look a waveform up by its [`name`](Self::name).
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|w| w.name().eq_ignore_ascii_case(name))
    }
}

/// Phase-accumulator oscillator.
///
/// # Example
///
/// ```rust
/// use tonewheel_synth::{Oscillator, SourceBank, Waveform};
///
/// let mut sources = SourceBank::default();
/// let mut osc = Oscillator::new(48000.0);
/// osc.init(Waveform::Saw, 0.5, 0.0, 440.0, 0.0);
///
/// let sample = osc.advance(0.0, 0.0, &mut sources);
/// assert!(sample.abs() <= 0.5);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct Oscillator {
    /// Current phase in radians, `[0, 2π)`
    phase: f32,
    /// Radians per sample
    phase_inc: f32,
    amplitude: f32,
    dc_offset: f32,
    waveform: Waveform,
    /// Morph source tables (A at morph 0.0, B at morph 1.0)
    tables: (WavetableId, WavetableId),
    sample_rate: f32,
}

impl Default for Oscillator {
    fn default() -> Self {
        Self::new(DEFAULT_SAMPLE_RATE)
    }
}

impl Oscillator {
    /// Create a silent ([`Waveform::Nop`]) oscillator.
    pub fn new(sample_rate: f32) -> Self {
        Self {
            phase: 0.0,
            phase_inc: 0.0,
            amplitude: 0.0,
            dc_offset: 0.0,
            waveform: Waveform::Nop,
            tables: (WavetableId::SINE, WavetableId::SINE),
            sample_rate,
        }
    }

    /// Configure waveform, gain, start phase, frequency and DC offset at once.
    ///
    /// The frequency is converted to a phase increment here and not
    /// recomputed per sample.
    pub fn init(
        &mut self,
        waveform: Waveform,
        amplitude: f32,
        phase: f32,
        freq_hz: f32,
        dc_offset: f32,
    ) {
        self.waveform = waveform;
        self.amplitude = amplitude;
        self.phase = wrap_phase(phase);
        self.phase_inc = freq_to_rad(freq_hz, self.sample_rate);
        self.dc_offset = dc_offset;
    }

    /// Switch the oscillator off: [`Waveform::Nop`] with zero gain and offset.
    pub fn disable(&mut self) {
        self.init(Waveform::Nop, 0.0, 0.0, 0.0, 0.0);
    }

    /// Select the two tables blended by [`Waveform::WavetableMorph`].
    pub fn set_wavetables(&mut self, a: WavetableId, b: WavetableId) {
        self.tables = (a, b);
    }

    /// Set frequency in Hz.
    pub fn set_frequency(&mut self, freq_hz: f32) {
        self.phase_inc = freq_to_rad(freq_hz, self.sample_rate);
    }

    /// Current frequency in Hz, derived from the phase increment.
    pub fn frequency(&self) -> f32 {
        self.phase_inc * self.sample_rate / TAU
    }

    /// Set the sample rate used by later frequency changes.
    pub fn set_sample_rate(&mut self, sample_rate: f32) {
        self.sample_rate = sample_rate;
    }

    /// Sample rate in Hz.
    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    /// Current phase in radians.
    pub fn phase(&self) -> f32 {
        self.phase
    }

    /// Phase increment in radians per sample.
    pub fn phase_increment(&self) -> f32 {
        self.phase_inc
    }

    /// Set the phase directly (wrapped into `[0, 2π)`).
    pub fn set_phase(&mut self, phase: f32) {
        self.phase = wrap_phase(phase);
    }

    /// Output gain.
    pub fn amplitude(&self) -> f32 {
        self.amplitude
    }

    /// Set the output gain.
    pub fn set_amplitude(&mut self, amplitude: f32) {
        self.amplitude = amplitude;
    }

    /// DC offset added by the `*Dc` waveforms and returned by `Nop`.
    pub fn dc_offset(&self) -> f32 {
        self.dc_offset
    }

    /// Current waveform.
    pub fn waveform(&self) -> Waveform {
        self.waveform
    }

    /// Set the waveform, keeping phase and frequency.
    pub fn set_waveform(&mut self, waveform: Waveform) {
        self.waveform = waveform;
    }

    /// Morph tables (A, B).
    pub fn wavetables(&self) -> (WavetableId, WavetableId) {
        self.tables
    }

    /// Advance the phase and return the next sample.
    ///
    /// `phase_mod` is added to the phase increment for this sample (radians).
    /// `morph` is the second modulation input: the blend factor for
    /// [`Waveform::WavetableMorph`] and the edge shift for
    /// [`Waveform::RectPhase`]; other waveforms ignore it.
    ///
    /// The phase is stored before the lookup, so the first call on a fresh
    /// oscillator already reads at `phase_increment`.
    #[inline]
    pub fn advance(&mut self, phase_mod: f32, morph: f32, sources: &mut SourceBank) -> f32 {
        let amp = self.amplitude;
        match self.waveform {
            Waveform::Nop => self.dc_offset,
            Waveform::Noise => sources.noise().next_bipolar() * amp,
            Waveform::NoiseDc => self.dc_offset + sources.noise().next_bipolar() * amp,
            Waveform::Sine => lookup(sources.sine(), self.step_phase(phase_mod)) * amp,
            Waveform::SineDc => {
                lookup(sources.sine(), self.step_phase(phase_mod)) * amp + self.dc_offset
            }
            Waveform::Rect => step(self.step_phase(phase_mod), PI, amp, -amp),
            Waveform::RectPhase => step(self.step_phase(phase_mod), PI + morph, amp, -amp),
            Waveform::RectDc => self.dc_offset + step(self.step_phase(phase_mod), PI, amp, -amp),
            Waveform::Saw => (self.step_phase(phase_mod) * FRAC_1_PI - 1.0) * amp,
            Waveform::SawDc => {
                (self.step_phase(phase_mod) * FRAC_1_PI - 1.0) * amp + self.dc_offset
            }
            Waveform::Triangle => triangle(self.step_phase(phase_mod), amp),
            Waveform::TriangleDc => triangle(self.step_phase(phase_mod), amp) + self.dc_offset,
            Waveform::WavetableMorph => {
                let phase = self.step_phase(phase_mod);
                let a = sources.table(self.tables.0).map_or(0.0, |t| lookup(t, phase));
                let b = sources.table(self.tables.1).map_or(0.0, |t| lookup(t, phase));
                (a + (b - a) * morph) * amp
            }
        }
    }

    #[inline]
    fn step_phase(&mut self, phase_mod: f32) -> f32 {
        self.phase = wrap_phase(self.phase + self.phase_inc + phase_mod);
        self.phase
    }
}

/// Folded ramp: -1 at phase 0, +1 at π, clamped below at `-amp`.
#[inline]
fn triangle(phase: f32, amp: f32) -> f32 {
    let x = 2.0 - phase * (2.0 * FRAC_1_PI);
    let x = 1.0 - step(x, 0.0, -x, x);
    if x > -1.0 { x * amp } else { -amp }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wavetable::WAVETABLE_LEN;

    fn osc(waveform: Waveform, amp: f32, freq: f32) -> Oscillator {
        let mut o = Oscillator::new(48000.0);
        o.init(waveform, amp, 0.0, freq, 0.0);
        o
    }

    #[test]
    fn first_advance_reads_at_increment() {
        let mut sources = SourceBank::default();
        let mut o = osc(Waveform::Sine, 1.0, 440.0);
        let inc = o.phase_increment();

        let sample = o.advance(0.0, 0.0, &mut sources);
        let expected = lookup(sources.sine(), inc);

        assert_eq!(o.phase(), inc);
        assert_eq!(sample, expected);
        assert!(sample > 0.0, "state advances before lookup");
    }

    #[test]
    fn advance_is_not_idempotent() {
        let mut sources = SourceBank::default();
        let mut o = osc(Waveform::Saw, 1.0, 1000.0);
        let a = o.advance(0.0, 0.0, &mut sources);
        let b = o.advance(0.0, 0.0, &mut sources);
        assert!(b > a, "saw should keep rising: {a} -> {b}");
    }

    #[test]
    fn sine_frequency_by_zero_crossings() {
        let mut sources = SourceBank::default();
        let mut o = osc(Waveform::Sine, 1.0, 440.0);

        let mut crossings: i32 = 0;
        let mut prev = 0.0;
        for _ in 0..48000 {
            let s = o.advance(0.0, 0.0, &mut sources);
            if prev <= 0.0 && s > 0.0 {
                crossings += 1;
            }
            prev = s;
        }
        assert!(
            (crossings - 440).abs() <= 2,
            "Expected ~440 zero crossings, got {}",
            crossings
        );
    }

    #[test]
    fn phase_wraps_with_large_and_negative_modulation() {
        let mut sources = SourceBank::default();
        let mut o = osc(Waveform::Sine, 1.0, 15000.0);
        for i in 0..10_000 {
            let m = if i % 2 == 0 { 9.0 } else { -13.5 };
            o.advance(m, 0.0, &mut sources);
            assert!((0.0..TAU).contains(&o.phase()), "phase {}", o.phase());
        }
    }

    #[test]
    fn rect_levels() {
        let mut sources = SourceBank::default();
        let mut o = osc(Waveform::Rect, 0.3, 100.0);
        for _ in 0..2000 {
            let s = o.advance(0.0, 0.0, &mut sources);
            assert!(s == 0.3 || s == -0.3, "rect sample {s}");
        }
    }

    #[test]
    fn rect_phase_moves_edge() {
        let mut sources = SourceBank::default();
        let mut narrow = osc(Waveform::RectPhase, 1.0, 100.0);
        let mut wide = osc(Waveform::RectPhase, 1.0, 100.0);

        let count = |o: &mut Oscillator, shift: f32, src: &mut SourceBank| {
            (0..480).filter(|_| o.advance(0.0, shift, src) > 0.0).count()
        };
        let n = count(&mut narrow, -PI / 2.0, &mut sources);
        let w = count(&mut wide, PI / 2.0, &mut sources);
        assert!((n as i32 - 120).abs() <= 2, "narrow high count {n}");
        assert!((w as i32 - 360).abs() <= 2, "wide high count {w}");
    }

    #[test]
    fn saw_formula() {
        let mut sources = SourceBank::default();
        let mut o = Oscillator::new(48000.0);
        o.init(Waveform::Saw, 2.0, 0.0, 0.0, 0.0);
        o.set_phase(PI / 2.0);
        // Zero increment: phase stays at π/2, (0.5 - 1) * 2 = -1
        assert!((o.advance(0.0, 0.0, &mut sources) + 1.0).abs() < 1e-6);
    }

    #[test]
    fn triangle_shape() {
        assert!((triangle(0.0, 1.0) + 1.0).abs() < 1e-6);
        assert!(triangle(PI / 2.0, 1.0).abs() < 1e-6);
        assert!((triangle(PI, 1.0) - 1.0).abs() < 1e-6);
        assert!(triangle(3.0 * PI / 2.0, 1.0).abs() < 1e-5);
        assert!(triangle(TAU - 1e-4, 0.5) >= -0.5);
    }

    #[test]
    fn dc_variants_add_offset() {
        let mut sources = SourceBank::default();
        for (plain, dc) in [
            (Waveform::Sine, Waveform::SineDc),
            (Waveform::Rect, Waveform::RectDc),
            (Waveform::Saw, Waveform::SawDc),
            (Waveform::Triangle, Waveform::TriangleDc),
        ] {
            let mut a = Oscillator::new(48000.0);
            let mut b = Oscillator::new(48000.0);
            a.init(plain, 0.5, 0.3, 220.0, 0.25);
            b.init(dc, 0.5, 0.3, 220.0, 0.25);
            for _ in 0..100 {
                let x = a.advance(0.0, 0.0, &mut sources);
                let y = b.advance(0.0, 0.0, &mut sources);
                assert!((y - x - 0.25).abs() < 1e-6, "{dc:?}: {x} vs {y}");
            }
        }
    }

    #[test]
    fn nop_returns_dc_and_keeps_phase() {
        let mut sources = SourceBank::default();
        let mut o = Oscillator::new(48000.0);
        o.init(Waveform::Nop, 1.0, 0.5, 440.0, 0.75);
        for _ in 0..10 {
            assert_eq!(o.advance(1.0, 1.0, &mut sources), 0.75);
        }
        assert_eq!(o.phase(), 0.5);
    }

    #[test]
    fn zero_sample_rate_keeps_phase_in_range() {
        let mut sources = SourceBank::default();
        let mut o = Oscillator::new(0.0);
        o.init(Waveform::Sine, 1.0, 0.0, 440.0, 0.0);
        for _ in 0..4 {
            let sample = o.advance(0.0, 0.0, &mut sources);
            assert!(sample.is_finite());
            assert!((0.0..TAU).contains(&o.phase()), "phase {}", o.phase());
        }

        let mut o = osc(Waveform::Saw, 1.0, 440.0);
        o.advance(f32::NAN, 0.0, &mut sources);
        assert_eq!(o.phase(), 0.0);
    }

    #[test]
    fn noise_ignores_phase_and_stays_in_range() {
        let mut sources = SourceBank::default();
        let mut o = osc(Waveform::Noise, 0.5, 440.0);
        for _ in 0..5000 {
            let s = o.advance(0.0, 0.0, &mut sources);
            assert!((-0.5..0.5).contains(&s), "noise sample {s}");
        }
        assert_eq!(o.phase(), 0.0);
    }

    #[test]
    fn morph_blends_tables() {
        let mut sources = SourceBank::default();
        let a = sources.add_wavetable([1.0; WAVETABLE_LEN]);
        let b = sources.add_wavetable([-1.0; WAVETABLE_LEN]);

        let mut o = osc(Waveform::WavetableMorph, 0.5, 440.0);
        o.set_wavetables(a, b);
        assert!((o.advance(0.0, 0.0, &mut sources) - 0.5).abs() < 1e-6);
        assert!((o.advance(0.0, 1.0, &mut sources) + 0.5).abs() < 1e-6);
        assert!(o.advance(0.0, 0.5, &mut sources).abs() < 1e-6);
    }

    #[test]
    fn waveform_names_roundtrip() {
        for w in Waveform::ALL {
            assert_eq!(Waveform::from_name(w.name()), Some(w));
        }
        assert_eq!(Waveform::from_name("SINE_DC"), Some(Waveform::SineDc));
        assert_eq!(Waveform::from_name("warble"), None);
    }

    #[test]
    fn frequency_conversion() {
        let o = osc(Waveform::Sine, 1.0, 440.0);
        assert!((o.phase_increment() - TAU * 440.0 / 48000.0).abs() < 1e-7);
        assert!((o.frequency() - 440.0).abs() < 1e-2);
    }
}
