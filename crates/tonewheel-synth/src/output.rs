//! Double-buffered output and the half-ready signal.
//!
//! The output device streams one half of a shared interleaved buffer while
//! the synth fills the other. When the device finishes a half it raises
//! [`BufferReady`]; the render side takes the signal, fills that half and
//! leaves the flag cleared.
//!
//! ```text
//!  device:  |---- plays First ----|---- plays Second ----|
//!  signal:                        ^First ready           ^Second ready
//!  synth:                          fill First             fill Second
//! ```

#[cfg(not(feature = "std"))]
extern crate alloc;

#[cfg(feature = "std")]
extern crate std as alloc;

use alloc::vec;
use alloc::vec::Vec;
use core::sync::atomic::{AtomicU8, Ordering};

use crate::error::SynthError;

/// Default size of the shared buffer in bytes.
pub const DEFAULT_BUFFER_SIZE: usize = 4096;

const NONE: u8 = 0;
const FIRST: u8 = 1;
const SECOND: u8 = 2;

/// One half of a [`DoubleBuffer`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BufferHalf {
    /// Lower half.
    First,
    /// Upper half.
    Second,
}

impl BufferHalf {
    /// The half the device plays next.
    pub fn other(self) -> Self {
        match self {
            BufferHalf::First => BufferHalf::Second,
            BufferHalf::Second => BufferHalf::First,
        }
    }

    fn to_raw(self) -> u8 {
        match self {
            BufferHalf::First => FIRST,
            BufferHalf::Second => SECOND,
        }
    }

    fn from_raw(raw: u8) -> Option<Self> {
        match raw {
            FIRST => Some(BufferHalf::First),
            SECOND => Some(BufferHalf::Second),
            _ => None,
        }
    }
}

/// Lock-free tri-state flag: nothing ready, or which half is free to fill.
///
/// Single writer (the device side) and single reader (the render side).
#[derive(Debug, Default)]
pub struct BufferReady(AtomicU8);

impl BufferReady {
    /// A cleared flag.
    pub const fn new() -> Self {
        Self(AtomicU8::new(NONE))
    }

    /// Signal that `half` may be refilled. Overwrites an untaken signal.
    pub fn raise(&self, half: BufferHalf) {
        self.0.store(half.to_raw(), Ordering::Release);
    }

    /// Take the pending signal, leaving the flag cleared.
    pub fn take(&self) -> Option<BufferHalf> {
        BufferHalf::from_raw(self.0.swap(NONE, Ordering::AcqRel))
    }

    /// Pending signal, without clearing it.
    pub fn peek(&self) -> Option<BufferHalf> {
        BufferHalf::from_raw(self.0.load(Ordering::Acquire))
    }
}

/// Interleaved stereo `i16` buffer split into two halves.
///
/// Sized in bytes, like the device transfer it models: `size_bytes / 2`
/// samples, `size_bytes / 8` stereo frames per half.
#[derive(Debug, Clone)]
pub struct DoubleBuffer {
    samples: Vec<i16>,
}

impl DoubleBuffer {
    /// Allocate a zeroed buffer of `size_bytes`.
    ///
    /// The size must be a non-zero multiple of 8 so that each half holds a
    /// whole number of stereo frames.
    pub fn new(size_bytes: usize) -> Result<Self, SynthError> {
        if size_bytes == 0 || size_bytes % 8 != 0 {
            return Err(SynthError::InvalidBufferSize(size_bytes));
        }
        Ok(Self {
            samples: vec![0; size_bytes / 2],
        })
    }

    /// Size in bytes.
    pub fn size_bytes(&self) -> usize {
        self.samples.len() * 2
    }

    /// Stereo frames in one half.
    pub fn frames_per_half(&self) -> usize {
        self.samples.len() / 4
    }

    /// Interleaved samples of one half.
    pub fn half(&self, half: BufferHalf) -> &[i16] {
        let mid = self.samples.len() / 2;
        match half {
            BufferHalf::First => &self.samples[..mid],
            BufferHalf::Second => &self.samples[mid..],
        }
    }

    /// Mutable interleaved samples of one half.
    pub fn half_mut(&mut self, half: BufferHalf) -> &mut [i16] {
        let mid = self.samples.len() / 2;
        match half {
            BufferHalf::First => &mut self.samples[..mid],
            BufferHalf::Second => &mut self.samples[mid..],
        }
    }

    /// The whole buffer.
    pub fn as_slice(&self) -> &[i16] {
        &self.samples
    }
}

impl Default for DoubleBuffer {
    fn default() -> Self {
        Self {
            samples: vec![0; DEFAULT_BUFFER_SIZE / 2],
        }
    }
}
