//! Property-based tests for tonewheel-synth.
//!
//! Tests phase wrapping, envelope monotonicity, delay line timing and render
//! output bounds using proptest for randomized configurations.

use core::f32::consts::TAU;

use proptest::prelude::*;
use tonewheel_synth::{
    AdsrEnvelope, EffectsBus, EnvelopeState, Oscillator, Patch, SourceBank, Synth, Waveform,
    wrap_phase,
};

fn waveform(index: usize) -> Waveform {
    Waveform::ALL[index % Waveform::ALL.len()]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(300))]

    /// Oscillator phase stays in [0, 2π) for any frequency, start phase and
    /// per-sample phase modulation, including large negative values.
    #[test]
    fn phase_stays_wrapped(
        wf in 0usize..13,
        freq in 0.0f32..22050.0f32,
        start in -100.0f32..100.0f32,
        mods in prop::collection::vec(-50.0f32..50.0f32, 1..256),
    ) {
        let mut sources = SourceBank::default();
        let mut osc = Oscillator::new(44100.0);
        osc.init(waveform(wf), 1.0, start, freq, 0.0);

        for &m in &mods {
            osc.advance(m, 0.5, &mut sources);
            let phase = osc.phase();
            prop_assert!(
                (0.0..TAU).contains(&phase),
                "phase {} escaped [0, 2π) with mod {}", phase, m
            );
        }
    }

    /// wrap_phase lands in range for any finite input.
    #[test]
    fn wrap_phase_range(x in -1.0e6f32..1.0e6f32) {
        let w = wrap_phase(x);
        prop_assert!((0.0..TAU).contains(&w), "wrap_phase({}) = {}", x, w);
    }

    /// Attack never falls or overshoots the peak, release never rises or goes
    /// negative, idle outputs zero.
    #[test]
    fn envelope_segments_are_monotonic(
        attack in 0.0001f32..1.0f32,
        decay in 0.0001f32..0.1f32,
        release in 0.0001f32..0.1f32,
        peak in 0.1f32..1.0f32,
        sustain_frac in 0.0f32..1.0f32,
        env_mod in 0.1f32..2.0f32,
    ) {
        let mut env = AdsrEnvelope::new(attack, decay, release, peak, peak * sustain_frac);
        let mut prev = env.level();

        for _ in 0..200_000 {
            let state = env.state();
            let level = env.update(env_mod);
            match state {
                EnvelopeState::Attack => {
                    prop_assert!(level >= prev);
                    prop_assert!(level <= env.attack_gain());
                }
                EnvelopeState::Release => {
                    prop_assert!(level <= prev);
                    prop_assert!(level >= 0.0);
                }
                EnvelopeState::Idle => {
                    prop_assert_eq!(level, 0.0);
                    break;
                }
                _ => {}
            }
            prev = level;
        }
    }

    /// The value fed at step t comes back out of the tap at step t + len - 1,
    /// and both cursors are back at their start after len steps.
    #[test]
    fn delay_line_timing(len in 2usize..64, value in 1i32..30000) {
        let mut bus = EffectsBus::new();
        bus.init(EffectsBus::allocate(len).unwrap(), 0).unwrap();

        let mut taps = Vec::with_capacity(len);
        for t in 0..len {
            let wet = if t == 0 { value } else { 0 };
            taps.push(bus.step(wet));
        }
        if cfg!(feature = "delay") {
            prop_assert_eq!(bus.read_cursor(), 1);
            prop_assert_eq!(bus.write_cursor(), 0);
        }

        let echo_at = len - 1;
        for (t, &tap) in taps.iter().enumerate() {
            let expected = if cfg!(feature = "delay") && t == echo_at { value as i16 } else { 0 };
            prop_assert_eq!(tap, expected, "tap at step {}", t);
        }
    }

    /// Rendered samples stay inside i16 and frames stay mono for any mix of
    /// patches and notes, with the delay running at zero decay.
    #[test]
    fn render_is_bounded_and_mono(
        notes in prop::collection::vec((0usize..4, 0u8..60, 0u32..100_000), 1..16),
    ) {
        let mut synth: Synth<8> = Synth::new(44100.0);
        synth.init_delay(300, 0).unwrap();
        for &(patch, note, tick) in &notes {
            Patch::ALL[patch].note_on(&mut synth, note, tick).unwrap();
        }

        let mut out = vec![0i16; 2048];
        synth.render_slice(&mut out);
        for frame in out.chunks_exact(2) {
            prop_assert_eq!(frame[0], frame[1]);
        }
    }
}

#[test]
fn wrap_phase_resets_non_finite() {
    for x in [f32::NAN, f32::INFINITY, f32::NEG_INFINITY, f32::MAX, f32::MIN] {
        let w = wrap_phase(x);
        assert!((0.0..TAU).contains(&w), "wrap_phase({x}) = {w}");
    }
}
