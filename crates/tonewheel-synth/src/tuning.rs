//! Note table and transpose control.
//!
//! Notes are plain indices into an equal-tempered table starting at C1, so
//! note 0 is C1 (32.7032 Hz), note 12 is C2 and so on for eight octaves.
//! A transpose offset from [`TRANSPOSE_STEPS`] is added to every note-on.

use crate::error::SynthError;

/// Number of entries in the note table (eight octaves).
pub const NOTE_COUNT: usize = 96;

/// Frequency of note 0 (C1) in Hz.
pub const BASE_FREQUENCY: f32 = 32.7032;

/// Transpose offsets in semitones, cycled by [`Tuning::advance_transpose`].
pub const TRANSPOSE_STEPS: [u8; 7] = [0, 5, 7, 8, 12, 19, 24];

/// Equal-tempered frequencies for [`NOTE_COUNT`] notes.
#[derive(Debug, Clone)]
pub struct NoteTable {
    freqs: [f32; NOTE_COUNT],
}

impl Default for NoteTable {
    fn default() -> Self {
        Self::new()
    }
}

impl NoteTable {
    /// Build the table from [`BASE_FREQUENCY`].
    pub fn new() -> Self {
        Self {
            freqs: core::array::from_fn(|i| {
                BASE_FREQUENCY * libm::powf(2.0, i as f32 / 12.0)
            }),
        }
    }

    /// Frequency of note `index`, if it is in the table.
    #[inline]
    pub fn get(&self, index: usize) -> Option<f32> {
        self.freqs.get(index).copied()
    }

    /// Number of notes.
    pub fn len(&self) -> usize {
        NOTE_COUNT
    }

    /// Always `false`.
    pub fn is_empty(&self) -> bool {
        false
    }
}

/// Note table plus the current transpose position.
#[derive(Debug, Clone, Default)]
pub struct Tuning {
    table: NoteTable,
    transpose_index: usize,
}

impl Tuning {
    /// Untransposed tuning.
    pub fn new() -> Self {
        Self::default()
    }

    /// Frequency for `note` after transposition.
    ///
    /// Fails with [`SynthError::NoteOutOfRange`] when the transposed index
    /// falls past the end of the table.
    pub fn frequency(&self, note: u8) -> Result<f32, SynthError> {
        let index = usize::from(note) + usize::from(self.transpose_offset());
        self.table.get(index).ok_or(SynthError::NoteOutOfRange {
            index,
            len: self.table.len(),
        })
    }

    /// Move to the next transpose step, wrapping after the last.
    ///
    /// Returns the new offset in semitones.
    pub fn advance_transpose(&mut self) -> u8 {
        self.transpose_index = (self.transpose_index + 1) % TRANSPOSE_STEPS.len();
        self.transpose_offset()
    }

    /// Jump to a transpose step (taken modulo the number of steps).
    pub fn set_transpose_index(&mut self, index: usize) {
        self.transpose_index = index % TRANSPOSE_STEPS.len();
    }

    /// Current position in [`TRANSPOSE_STEPS`].
    pub fn transpose_index(&self) -> usize {
        self.transpose_index
    }

    /// Current offset in semitones.
    pub fn transpose_offset(&self) -> u8 {
        TRANSPOSE_STEPS[self.transpose_index]
    }

    /// The underlying note table.
    pub fn table(&self) -> &NoteTable {
        &self.table
    }
}
