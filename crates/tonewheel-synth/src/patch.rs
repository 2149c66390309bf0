//! Built-in instrument patches.
//!
//! A patch is a note-on handler: it resolves the note's frequency, takes the
//! next voice from the pool and configures its envelope, LFOs and carriers.
//! The frequency lookup happens first, so a rejected note leaves the pool
//! untouched.
//!
//! | Patch | Character |
//! |-------|-----------|
//! | [`Patch::Lead`] | Two sines with vibrato, long decay |
//! | [`Patch::Bass`] | Sine an octave down against a slightly flat sub |
//! | [`Patch::Duet`] | Saw and triangle a fourth apart, sides swap with time |
//! | [`Patch::Glass`] | Harmonic wavetable morph, octave pair |

use core::f32::consts::PI;
use core::fmt;
use core::str::FromStr;

use libm::sinf;

use crate::error::SynthError;
use crate::oscillator::{Waveform, freq_to_rad};
use crate::synth::Synth;
use crate::voice::Voice;
use crate::wavetable::WavetableId;

/// Vibrato depth of the pitch LFO, as the phase increment of this frequency.
const VIBRATO_DEPTH_HZ: f32 = 5.0;

/// Vibrato rate in Hz.
const VIBRATO_RATE_HZ: f32 = 10.0;

/// Built-in instruments.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Patch {
    /// Sine pair with vibrato.
    Lead,
    /// Detuned sine pair, an octave below the table pitch.
    Bass,
    /// Saw and triangle a fourth apart, with a swept morph LFO.
    Duet,
    /// Wavetable morph between harmonic tables.
    Glass,
}

impl Patch {
    /// Every built-in patch.
    pub const ALL: [Patch; 4] = [Patch::Lead, Patch::Bass, Patch::Duet, Patch::Glass];

    /// Lowercase name, as used in session files.
    pub fn name(self) -> &'static str {
        match self {
            Patch::Lead => "lead",
            Patch::Bass => "bass",
            Patch::Duet => "duet",
            Patch::Glass => "glass",
        }
    }

    /// One-line description for listings.
    pub fn description(self) -> &'static str {
        match self {
            Patch::Lead => "Two sines with 10 Hz vibrato and a long decay",
            Patch::Bass => "Sine an octave down plus a slightly flat sub-octave",
            Patch::Duet => "Saw and triangle a fourth apart; sides alternate over time",
            Patch::Glass => "Morphing harmonic wavetables, octave pair",
        }
    }

    /// Start a note.
    ///
    /// `tick` is the sequencer time in milliseconds; some patches vary with
    /// it. Fails with [`SynthError::NoteOutOfRange`] when the transposed
    /// note is past the note table, without touching any voice.
    pub fn note_on<const N: usize>(
        self,
        synth: &mut Synth<N>,
        note: u8,
        tick: u32,
    ) -> Result<(), SynthError> {
        let freq = synth.tuning().frequency(note)?;
        // Duet needs a second pitch; resolve it before a voice is taken
        let freq_fourth = match self {
            Patch::Duet => synth.tuning().frequency(note.saturating_add(5))?,
            _ => freq,
        };
        let sample_rate = synth.sample_rate();

        #[cfg(feature = "tracing")]
        tracing::trace!(patch = self.name(), note, tick, freq, "note on");

        let voice = synth.acquire_voice(self as u32);
        set_vibrato(voice, sample_rate);

        match self {
            Patch::Lead => {
                voice.env.init(0.25, 0.000025, 0.005, 1.0, 0.95);
                voice.osc[0].init(Waveform::Sine, 0.20, 0.0, freq, 0.0);
                voice.osc[1].init(Waveform::Sine, 0.10, 0.0, freq, 0.0);
            }
            Patch::Bass => {
                let freq = freq * 0.5;
                voice.env.init(0.25, 0.0000025, 0.005, 1.0, 0.95);
                voice.osc[0].init(Waveform::Sine, 0.30, 0.0, freq, 0.0);
                voice.osc[1].init(Waveform::Sine, 0.30, 0.0, freq * 0.51, 0.0);
            }
            Patch::Duet => {
                let sweep = sinf(tick as f32 * 0.0005);
                voice.env.init(0.025, 0.0000025, 0.00005, 1.0, 0.5);
                voice
                    .lfo_morph
                    .init(Waveform::SawDc, 0.499, PI, 4.0 + 3.9 * sweep, 0.5);
                let saw = ((tick >> 8) & 1) as usize;
                voice.osc[saw].init(Waveform::Saw, 0.15, 0.0, freq, 0.0);
                voice.osc[1 - saw].init(Waveform::Triangle, 0.15, 0.0, freq_fourth, 0.0);
            }
            Patch::Glass => {
                let sweep = sinf(tick as f32 * 0.0005);
                voice.env.init(0.01, 0.00001, 0.0001, 1.0, 0.6);
                voice
                    .lfo_morph
                    .init(Waveform::SineDc, 0.25 + 0.24 * sweep, 0.0, 0.5, 0.5);
                for (osc, mult) in voice.osc.iter_mut().zip([1.0, 2.0]) {
                    osc.init(Waveform::WavetableMorph, 0.12, 0.0, freq * mult, 0.0);
                    osc.set_wavetables(WavetableId::HARMONICS_3, WavetableId::HARMONICS_2);
                }
            }
        }
        Ok(())
    }
}

/// Sine vibrato shared by every patch.
fn set_vibrato(voice: &mut Voice, sample_rate: f32) {
    voice.lfo_pitch.init(
        Waveform::Sine,
        freq_to_rad(VIBRATO_DEPTH_HZ, sample_rate),
        0.0,
        VIBRATO_RATE_HZ,
        0.0,
    );
}

impl fmt::Display for Patch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Patch {
    type Err = SynthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Patch::ALL
            .iter()
            .copied()
            .find(|p| p.name().eq_ignore_ascii_case(s))
            .ok_or(SynthError::UnknownPatch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::envelope::{ENVELOPE_SCALE, EnvelopeState};

    fn synth() -> Synth<4> {
        Synth::new(44100.0)
    }

    #[test]
    fn lead_configures_voice() {
        let mut s = synth();
        Patch::Lead.note_on(&mut s, 33, 0).unwrap();

        let v = &s.pool().voices()[0];
        let a3 = s.tuning().frequency(33).unwrap();
        assert_eq!(v.env.state(), EnvelopeState::Attack);
        assert_eq!(v.env.sustain_gain(), 0.95 * ENVELOPE_SCALE);
        assert_eq!(v.osc[0].waveform(), Waveform::Sine);
        assert_eq!(v.osc[0].amplitude(), 0.20);
        assert_eq!(v.osc[1].amplitude(), 0.10);
        assert!((v.osc[0].frequency() - a3).abs() < 0.01);
        assert_eq!(v.lfo_pitch.waveform(), Waveform::Sine);
        assert!((v.lfo_pitch.amplitude() - freq_to_rad(5.0, 44100.0)).abs() < 1e-9);
        assert_eq!(v.lfo_morph.waveform(), Waveform::Nop);
        assert_eq!(v.flags, Patch::Lead as u32);
    }

    #[test]
    fn bass_plays_octave_down() {
        let mut s = synth();
        Patch::Bass.note_on(&mut s, 24, 0).unwrap();
        let table = s.tuning().frequency(24).unwrap();
        let v = &s.pool().voices()[0];
        assert!((v.osc[0].frequency() - table * 0.5).abs() < 0.01);
        assert!((v.osc[1].frequency() - table * 0.5 * 0.51).abs() < 0.01);
    }

    #[test]
    fn duet_alternates_sides() {
        let mut s = synth();
        Patch::Duet.note_on(&mut s, 24, 0).unwrap();
        Patch::Duet.note_on(&mut s, 24, 256).unwrap();
        let voices = s.pool().voices();
        assert_eq!(voices[0].osc[0].waveform(), Waveform::Saw);
        assert_eq!(voices[0].osc[1].waveform(), Waveform::Triangle);
        assert_eq!(voices[1].osc[1].waveform(), Waveform::Saw);
        assert_eq!(voices[1].osc[0].waveform(), Waveform::Triangle);

        let fourth = s.tuning().frequency(29).unwrap();
        assert!((voices[0].osc[1].frequency() - fourth).abs() < 0.01);
        assert_eq!(voices[0].lfo_morph.waveform(), Waveform::SawDc);
        assert!((voices[0].lfo_morph.frequency() - 4.0).abs() < 1e-3);
    }

    #[test]
    fn glass_uses_harmonic_tables() {
        let mut s = synth();
        Patch::Glass.note_on(&mut s, 40, 0).unwrap();
        let v = &s.pool().voices()[0];
        for osc in &v.osc {
            assert_eq!(osc.waveform(), Waveform::WavetableMorph);
            assert_eq!(
                osc.wavetables(),
                (WavetableId::HARMONICS_3, WavetableId::HARMONICS_2)
            );
        }
        assert!((v.osc[1].frequency() - 2.0 * v.osc[0].frequency()).abs() < 0.05);
        assert!((v.lfo_morph.amplitude() - 0.25).abs() < 1e-6);
    }

    #[test]
    fn out_of_range_note_keeps_pool() {
        let mut s = synth();
        assert_eq!(
            Patch::Lead.note_on(&mut s, 96, 0),
            Err(SynthError::NoteOutOfRange { index: 96, len: 96 })
        );
        // Duet's upper voice goes out of range first
        assert!(Patch::Duet.note_on(&mut s, 93, 0).is_err());
        assert_eq!(s.pool().cursor(), 0);
        assert_eq!(s.pool().active_count(), 0);
    }

    #[test]
    fn transpose_shifts_pitch() {
        let mut s = synth();
        s.advance_transpose(); // +5
        Patch::Lead.note_on(&mut s, 0, 0).unwrap();
        let expected = s.tuning().table().get(5).unwrap();
        assert!((s.pool().voices()[0].osc[0].frequency() - expected).abs() < 0.01);
    }

    #[test]
    fn names_parse_case_insensitively() {
        for p in Patch::ALL {
            assert_eq!(p.name().parse::<Patch>(), Ok(p));
        }
        assert_eq!("LEAD".parse::<Patch>(), Ok(Patch::Lead));
        assert_eq!("organ".parse::<Patch>(), Err(SynthError::UnknownPatch));
    }
}
