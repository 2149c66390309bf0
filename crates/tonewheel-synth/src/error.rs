//! Error type for synth setup and note handling.
//!
//! The render loop itself has no failure path; everything here is raised at
//! configuration time or at the patch boundary, before any voice is touched.

use thiserror::Error;

/// Errors raised while configuring the synth or handling a note-on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SynthError {
    /// Note plus transpose offset points past the end of the note table.
    #[error("note index {index} is outside the note table (length {len})")]
    NoteOutOfRange {
        /// Requested table index (note + transpose offset).
        index: usize,
        /// Length of the note table.
        len: usize,
    },

    /// The delay buffer could not be allocated.
    #[error("failed to allocate a delay buffer of {len} samples")]
    DelayAllocation {
        /// Requested length in samples.
        len: usize,
    },

    /// The delay buffer must hold at least one sample.
    #[error("delay buffer must not be empty")]
    EmptyDelayBuffer,

    /// Decay shift would discard the whole 16-bit sample.
    #[error("decay shift {0} is out of range (0..=15)")]
    InvalidDecayShift(u8),

    /// Output buffer size (in bytes) must be a non-zero multiple of 8.
    #[error("buffer size {0} is not a non-zero multiple of 8 bytes")]
    InvalidBufferSize(usize),

    /// No patch with the requested name exists.
    #[error("unknown patch")]
    UnknownPatch,

    /// Sequencer step value is neither a rest (-1) nor a note (>= 0).
    #[error("invalid step value {0} (expected -1 for a rest or a note >= 0)")]
    InvalidStep(i8),
}
