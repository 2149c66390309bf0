//! Voices and the fixed-capacity voice pool.
//!
//! Allocation is strict round-robin: every note-on takes the slot under the
//! cursor and moves the cursor on, whether or not that slot is still
//! sounding. With `N` slots, the `N+1`-th note steals the first one.

use crate::envelope::AdsrEnvelope;
use crate::oscillator::Oscillator;

/// Envelope every voice starts with: attack, decay, release, peak, sustain.
pub const DEFAULT_ENVELOPE: (f32, f32, f32, f32, f32) = (0.0025, 0.00025, 0.00005, 1.0, 0.25);

/// One polyphonic slot.
///
/// The two carriers feed the left and right channel. Both LFOs run once per
/// sample and their outputs are shared by both carriers: the pitch LFO as
/// phase modulation, the morph LFO as the second modulation input.
#[derive(Debug, Clone, Copy)]
pub struct Voice {
    /// Carrier oscillators (left, right)
    pub osc: [Oscillator; 2],
    /// Amplitude envelope
    pub env: AdsrEnvelope,
    /// Phase modulation source
    pub lfo_pitch: Oscillator,
    /// Morph / pulse-width modulation source
    pub lfo_morph: Oscillator,
    /// Caller-defined tag, stored on acquire
    pub flags: u32,
}

impl Voice {
    /// Create an idle voice with the default envelope rates.
    pub fn new(sample_rate: f32) -> Self {
        let (a, d, r, peak, sustain) = DEFAULT_ENVELOPE;
        let mut env = AdsrEnvelope::new(a, d, r, peak, sustain);
        env.silence();
        Self {
            osc: [Oscillator::new(sample_rate); 2],
            env,
            lfo_pitch: Oscillator::new(sample_rate),
            lfo_morph: Oscillator::new(sample_rate),
            flags: 0,
        }
    }

    /// `true` while the envelope is not idle.
    pub fn is_active(&self) -> bool {
        self.env.is_active()
    }
}

/// Fixed ring of `N` voices with a round-robin cursor.
///
/// # Example
///
/// ```rust
/// use tonewheel_synth::VoicePool;
///
/// let mut pool: VoicePool<4> = VoicePool::new(44100.0);
/// for _ in 0..5 {
///     pool.acquire(0);
/// }
/// // Fifth acquire wrapped around to slot 0
/// assert_eq!(pool.cursor(), 1);
/// ```
#[derive(Debug, Clone)]
pub struct VoicePool<const N: usize> {
    voices: [Voice; N],
    cursor: usize,
}

impl<const N: usize> VoicePool<N> {
    /// Create a pool of idle voices.
    pub fn new(sample_rate: f32) -> Self {
        Self {
            voices: [Voice::new(sample_rate); N],
            cursor: 0,
        }
    }

    /// Take the voice under the cursor and advance the cursor.
    ///
    /// Both LFOs of the returned voice are switched off and `flags` is
    /// stored; carriers and envelope are left for the caller to configure.
    pub fn acquire(&mut self, flags: u32) -> &mut Voice {
        let index = self.acquire_index(flags);
        &mut self.voices[index]
    }

    /// Like [`acquire`](Self::acquire), returning the slot index instead.
    pub fn acquire_index(&mut self, flags: u32) -> usize {
        let index = self.cursor;
        let voice = &mut self.voices[index];
        voice.lfo_pitch.disable();
        voice.lfo_morph.disable();
        voice.flags = flags;
        self.cursor = (index + 1) % N;
        index
    }

    /// Slot the next acquire will return.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Number of slots.
    pub fn capacity(&self) -> usize {
        N
    }

    /// Number of voices whose envelope is not idle.
    pub fn active_count(&self) -> usize {
        self.voices.iter().filter(|v| v.is_active()).count()
    }

    /// All voices.
    pub fn voices(&self) -> &[Voice; N] {
        &self.voices
    }

    /// Mutable access to all voices.
    pub fn voices_mut(&mut self) -> &mut [Voice; N] {
        &mut self.voices
    }

    /// Silence every voice.
    pub fn silence_all(&mut self) {
        for voice in &mut self.voices {
            voice.env.silence();
        }
    }

    /// Change the sample rate of every oscillator. Phase increments keep
    /// their value until the next frequency change.
    pub fn set_sample_rate(&mut self, sample_rate: f32) {
        for voice in &mut self.voices {
            for osc in &mut voice.osc {
                osc.set_sample_rate(sample_rate);
            }
            voice.lfo_pitch.set_sample_rate(sample_rate);
            voice.lfo_morph.set_sample_rate(sample_rate);
        }
    }
}
