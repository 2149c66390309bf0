//! Step sequencer: note patterns played through patches.
//!
//! Each [`Track`] plays one pattern with one patch at a fixed step length.
//! Time is a millisecond tick supplied by the host; a track fires at most one
//! step per update, so a host that polls late simply catches up one step at a
//! time.

#[cfg(not(feature = "std"))]
extern crate alloc;

#[cfg(feature = "std")]
extern crate std as alloc;

use alloc::vec::Vec;

use crate::error::SynthError;
use crate::patch::Patch;
use crate::synth::Synth;

/// One pattern step.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Step {
    /// Silence for one step.
    Rest,
    /// Note index into the note table (before transposition).
    Note(u8),
}

impl TryFrom<i8> for Step {
    type Error = SynthError;

    /// `-1` is a rest, `0..=127` a note.
    fn try_from(value: i8) -> Result<Self, Self::Error> {
        match value {
            -1 => Ok(Step::Rest),
            n if n >= 0 => Ok(Step::Note(n as u8)),
            n => Err(SynthError::InvalidStep(n)),
        }
    }
}

impl From<Step> for i8 {
    fn from(step: Step) -> Self {
        match step {
            Step::Rest => -1,
            Step::Note(n) => n as i8,
        }
    }
}

/// Parse a pattern from its `i8` encoding.
pub fn parse_steps(values: &[i8]) -> Result<Vec<Step>, SynthError> {
    values.iter().map(|&v| Step::try_from(v)).collect()
}

/// One looping pattern bound to a patch.
#[derive(Debug, Clone)]
pub struct Track {
    patch: Patch,
    steps: Vec<Step>,
    step_ms: u32,
    position: usize,
    next_tick: u32,
}

impl Track {
    /// Create a track that fires its first step at tick 0.
    pub fn new(patch: Patch, steps: Vec<Step>, step_ms: u32) -> Self {
        Self {
            patch,
            steps,
            step_ms,
            position: 0,
            next_tick: 0,
        }
    }

    /// Fire the current step if `tick` has reached it.
    ///
    /// Returns the step that fired. The pattern advances even when the
    /// patch rejects the note, so one bad note cannot stall the track.
    pub fn update<const N: usize>(
        &mut self,
        synth: &mut Synth<N>,
        tick: u32,
    ) -> Result<Option<Step>, SynthError> {
        if tick < self.next_tick || self.steps.is_empty() {
            return Ok(None);
        }

        let step = self.steps[self.position];
        self.position = (self.position + 1) % self.steps.len();
        self.next_tick = self.next_tick.wrapping_add(self.step_ms);

        if let Step::Note(note) = step {
            self.patch.note_on(synth, note, tick)?;
        }
        Ok(Some(step))
    }

    /// Restart from the first step at tick 0.
    pub fn rewind(&mut self) {
        self.position = 0;
        self.next_tick = 0;
    }

    /// Patch used for every note.
    pub fn patch(&self) -> Patch {
        self.patch
    }

    /// The pattern.
    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    /// Step length in milliseconds.
    pub fn step_ms(&self) -> u32 {
        self.step_ms
    }

    /// Index of the next step to fire.
    pub fn position(&self) -> usize {
        self.position
    }

    /// Tick at which the next step fires.
    pub fn next_tick(&self) -> u32 {
        self.next_tick
    }
}

/// A set of tracks updated together.
#[derive(Debug, Clone, Default)]
pub struct Sequencer {
    tracks: Vec<Track>,
}

impl Sequencer {
    /// Create a sequencer from tracks.
    pub fn new(tracks: Vec<Track>) -> Self {
        Self { tracks }
    }

    /// Add a track.
    pub fn push(&mut self, track: Track) {
        self.tracks.push(track);
    }

    /// Update every track in order.
    ///
    /// All tracks are updated even when one fails; the first error is
    /// returned.
    pub fn update_all<const N: usize>(
        &mut self,
        synth: &mut Synth<N>,
        tick: u32,
    ) -> Result<(), SynthError> {
        let mut first = None;
        self.update_each(synth, tick, |_, err| {
            first.get_or_insert(err);
        });
        first.map_or(Ok(()), Err)
    }

    /// Update every track in order, handing each failure to `on_error`
    /// with its track index. Returns the number of tracks that failed.
    pub fn update_each<const N: usize>(
        &mut self,
        synth: &mut Synth<N>,
        tick: u32,
        mut on_error: impl FnMut(usize, SynthError),
    ) -> usize {
        let mut failed = 0;
        for (index, track) in self.tracks.iter_mut().enumerate() {
            if let Err(err) = track.update(synth, tick) {
                failed += 1;
                on_error(index, err);
            }
        }
        failed
    }

    /// Rewind every track.
    pub fn rewind(&mut self) {
        for track in &mut self.tracks {
            track.rewind();
        }
    }

    /// The tracks.
    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }
}
