//! Feedback delay on the summed output.
//!
//! The bus is a circular buffer of `i16` with independent read and write
//! cursors. The read cursor starts one slot ahead of the write cursor, so a
//! value written at step `t` is read back `len - 1` steps later. Written
//! values are attenuated by an arithmetic right shift, which makes every
//! echo quieter than the one before.
//!
//! Without the `delay` feature the bus is inert: [`EffectsBus::tap`] returns
//! 0 and neither cursor moves.

#[cfg(not(feature = "std"))]
extern crate alloc;

#[cfg(feature = "std")]
extern crate std as alloc;

use alloc::boxed::Box;
use alloc::vec::Vec;

use crate::error::SynthError;

/// Largest accepted decay shift.
pub const MAX_DECAY_SHIFT: u8 = 15;

/// Saturate a 32-bit accumulator into the 16-bit sample range.
#[inline]
pub fn saturate_i16(x: i32) -> i16 {
    x.clamp(i32::from(i16::MIN), i32::from(i16::MAX)) as i16
}

/// Circular feedback delay line.
///
/// # Example
///
/// ```rust
/// use tonewheel_synth::EffectsBus;
///
/// let mut bus = EffectsBus::new();
/// let buffer = EffectsBus::allocate(4).unwrap();
/// bus.init(buffer, 0).unwrap();
///
/// bus.step(1000);
/// assert_eq!(bus.step(0), 0);
/// assert_eq!(bus.step(0), 0);
/// # #[cfg(feature = "delay")]
/// assert_eq!(bus.step(0), 1000);
/// ```
#[derive(Debug, Clone, Default)]
pub struct EffectsBus {
    buffer: Box<[i16]>,
    read_cursor: usize,
    write_cursor: usize,
    decay_shift: u8,
}

impl EffectsBus {
    /// Create a bus with no buffer. It reads silence until [`init`](Self::init).
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a zeroed delay buffer of `len` samples.
    ///
    /// Fails instead of aborting when the allocator cannot satisfy the
    /// request.
    pub fn allocate(len: usize) -> Result<Box<[i16]>, SynthError> {
        let mut buffer = Vec::new();
        buffer
            .try_reserve_exact(len)
            .map_err(|_| SynthError::DelayAllocation { len })?;
        buffer.resize(len, 0);
        Ok(buffer.into_boxed_slice())
    }

    /// Install a delay buffer, dropping the previous one.
    ///
    /// The buffer is zero-filled, the write cursor starts at 0 and the read
    /// cursor at `1 % len`.
    pub fn init(&mut self, mut buffer: Box<[i16]>, decay_shift: u8) -> Result<(), SynthError> {
        if buffer.is_empty() {
            return Err(SynthError::EmptyDelayBuffer);
        }
        if decay_shift > MAX_DECAY_SHIFT {
            return Err(SynthError::InvalidDecayShift(decay_shift));
        }

        buffer.fill(0);
        self.read_cursor = 1 % buffer.len();
        self.write_cursor = 0;
        self.decay_shift = decay_shift;
        self.buffer = buffer;

        #[cfg(feature = "tracing")]
        tracing::debug!(
            len = self.buffer.len(),
            decay_shift,
            "effects bus initialized"
        );
        Ok(())
    }

    /// Read the delayed sample and advance the read cursor.
    #[inline]
    pub fn tap(&mut self) -> i16 {
        #[cfg(feature = "delay")]
        {
            let Some(&sample) = self.buffer.get(self.read_cursor) else {
                return 0;
            };
            self.read_cursor = wrap_next(self.read_cursor, self.buffer.len());
            sample
        }
        #[cfg(not(feature = "delay"))]
        {
            0
        }
    }

    /// Write `wet >> decay_shift`, saturated, and advance the write cursor.
    #[inline]
    pub fn feed(&mut self, wet: i32) {
        #[cfg(feature = "delay")]
        if let Some(slot) = self.buffer.get_mut(self.write_cursor) {
            *slot = saturate_i16(wet >> self.decay_shift);
            self.write_cursor = wrap_next(self.write_cursor, self.buffer.len());
        }
        #[cfg(not(feature = "delay"))]
        let _ = wet;
    }

    /// [`tap`](Self::tap) then [`feed`](Self::feed); returns the tapped sample.
    #[inline]
    pub fn step(&mut self, wet: i32) -> i16 {
        let delayed = self.tap();
        self.feed(wet);
        delayed
    }

    /// Zero the buffer, keeping the cursors.
    pub fn clear(&mut self) {
        self.buffer.fill(0);
    }

    /// Buffer length in samples (0 before [`init`](Self::init)).
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// `true` when no buffer is installed.
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Next read position.
    pub fn read_cursor(&self) -> usize {
        self.read_cursor
    }

    /// Next write position.
    pub fn write_cursor(&self) -> usize {
        self.write_cursor
    }

    /// Right shift applied to fed samples.
    pub fn decay_shift(&self) -> u8 {
        self.decay_shift
    }

    /// Raw buffer contents.
    pub fn buffer(&self) -> &[i16] {
        &self.buffer
    }
}

#[cfg(feature = "delay")]
#[inline]
fn wrap_next(cursor: usize, len: usize) -> usize {
    let next = cursor + 1;
    if next >= len { 0 } else { next }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bus(len: usize, shift: u8) -> EffectsBus {
        let mut bus = EffectsBus::new();
        bus.init(EffectsBus::allocate(len).unwrap(), shift).unwrap();
        bus
    }

    #[test]
    fn init_sets_cursors() {
        let b = bus(8, 1);
        assert_eq!(b.read_cursor(), 1);
        assert_eq!(b.write_cursor(), 0);
        assert_eq!(b.len(), 8);
        assert!(b.buffer().iter().all(|&s| s == 0));

        let single = bus(1, 0);
        assert_eq!(single.read_cursor(), 0);
    }

    #[test]
    fn init_rejects_bad_input() {
        let mut b = EffectsBus::new();
        assert_eq!(
            b.init(Box::new([]), 0),
            Err(SynthError::EmptyDelayBuffer)
        );
        assert_eq!(
            b.init(EffectsBus::allocate(4).unwrap(), 16),
            Err(SynthError::InvalidDecayShift(16))
        );
        assert!(b.is_empty());
    }

    #[test]
    fn init_zero_fills_supplied_buffer() {
        let mut b = EffectsBus::new();
        b.init(Vec::from([7i16; 5]).into_boxed_slice(), 0).unwrap();
        assert!(b.buffer().iter().all(|&s| s == 0));
    }

    #[test]
    fn uninitialized_bus_is_silent() {
        let mut b = EffectsBus::new();
        for _ in 0..10 {
            assert_eq!(b.step(12345), 0);
        }
    }

    #[test]
    fn saturate_clamps() {
        assert_eq!(saturate_i16(40000), i16::MAX);
        assert_eq!(saturate_i16(-40000), i16::MIN);
        assert_eq!(saturate_i16(-5), -5);
    }

    #[cfg(feature = "delay")]
    #[test]
    fn echo_arrives_after_len_minus_one_steps() {
        let len = 16;
        let mut b = bus(len, 0);
        b.step(500);
        for _ in 0..len - 2 {
            assert_eq!(b.step(0), 0);
        }
        assert_eq!(b.step(0), 500);
    }

    #[cfg(feature = "delay")]
    #[test]
    fn cursors_return_after_len_steps() {
        let len = 11;
        let mut b = bus(len, 2);
        for i in 0..len {
            b.step(i as i32 * 100);
        }
        assert_eq!(b.read_cursor(), 1);
        assert_eq!(b.write_cursor(), 0);
    }

    #[cfg(feature = "delay")]
    #[test]
    fn feed_applies_decay_and_saturation() {
        let mut b = bus(4, 2);
        b.feed(1000);
        assert_eq!(b.buffer()[0], 250);
        b.feed(-1000);
        assert_eq!(b.buffer()[1], -250);

        let mut loud = bus(4, 0);
        loud.feed(100_000);
        assert_eq!(loud.buffer()[0], i16::MAX);
    }

    #[cfg(not(feature = "delay"))]
    #[test]
    fn disabled_bus_never_moves() {
        let mut b = bus(8, 0);
        for _ in 0..20 {
            assert_eq!(b.step(1000), 0);
        }
        assert_eq!(b.read_cursor(), 1);
        assert_eq!(b.write_cursor(), 0);
    }
}
