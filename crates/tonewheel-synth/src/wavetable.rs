//! Wavetables and the shared noise generator.
//!
//! Every oscillator in a [`Synth`](crate::Synth) reads its lookup tables and
//! its noise from one [`SourceBank`]. Tables are addressed by [`WavetableId`]
//! rather than by reference, so oscillators stay plain `Copy`-able state that
//! can be reset in place when a voice is reused.
//!
//! # Built-in tables
//!
//! | Id | Content |
//! |----|---------|
//! | [`WavetableId::SINE`] | One cycle of `sin` |
//! | [`WavetableId::HARMONICS_2`] | Fundamental + 2nd harmonic |
//! | [`WavetableId::HARMONICS_3`] | Fundamental + 2nd + 3rd harmonic |
//! | [`WavetableId::NOISE`] | Seeded white noise, frozen at startup |

#[cfg(not(feature = "std"))]
extern crate alloc;

#[cfg(feature = "std")]
extern crate std as alloc;

use alloc::boxed::Box;
use alloc::vec::Vec;
use core::f32::consts::TAU;

use libm::sinf;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

/// Number of samples in one wavetable cycle.
pub const WAVETABLE_LEN: usize = 1024;

/// Seed for the shared noise generator.
pub const NOISE_SEED: u64 = 0x0cafe_bad;

/// One cycle of a waveform, sampled at [`WAVETABLE_LEN`] points.
pub type Wavetable = [f32; WAVETABLE_LEN];

/// Index of a table inside a [`SourceBank`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct WavetableId(u16);

impl WavetableId {
    /// Pure sine.
    pub const SINE: Self = Self(0);
    /// Fundamental plus second harmonic.
    pub const HARMONICS_2: Self = Self(1);
    /// Fundamental plus second and third harmonics.
    pub const HARMONICS_3: Self = Self(2);
    /// Frozen white noise.
    pub const NOISE: Self = Self(3);

    /// Position of the table in its bank.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Table index for a phase in radians.
///
/// The result is always a valid index, even for a phase that rounding has
/// pushed onto `2π` exactly.
#[inline]
pub fn table_index(phase: f32) -> usize {
    let idx = (phase * (WAVETABLE_LEN as f32 / TAU)) as usize;
    idx.min(WAVETABLE_LEN - 1)
}

/// Look up `table` at `phase` (radians, `[0, 2π)`).
#[inline]
pub fn lookup(table: &Wavetable, phase: f32) -> f32 {
    table[table_index(phase)]
}

/// Deterministic white noise source (PCG32).
///
/// One instance is shared by every noise oscillator of a synth, so the noise
/// sequence depends only on the seed and the order of calls.
#[derive(Debug, Clone)]
pub struct NoiseSource {
    rng: Pcg32,
}

impl NoiseSource {
    /// Create a generator from a seed.
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Pcg32::seed_from_u64(seed),
        }
    }

    /// Uniform value in `[-1.0, 1.0)`.
    #[inline]
    pub fn next_bipolar(&mut self) -> f32 {
        self.rng.r#gen::<f32>() * 2.0 - 1.0
    }
}

impl Default for NoiseSource {
    fn default() -> Self {
        Self::new(NOISE_SEED)
    }
}

/// Wavetables plus the shared noise generator.
#[derive(Debug, Clone)]
pub struct SourceBank {
    tables: Vec<Box<Wavetable>>,
    noise: NoiseSource,
}

impl Default for SourceBank {
    fn default() -> Self {
        Self::new(NOISE_SEED)
    }
}

impl SourceBank {
    /// Build the built-in tables and seed the noise generator.
    ///
    /// The noise table is drawn from the same generator before any
    /// oscillator runs, so it is identical for identical seeds.
    pub fn new(seed: u64) -> Self {
        let mut noise = NoiseSource::new(seed);
        let noise_table: Box<Wavetable> = Box::new(core::array::from_fn(|_| noise.next_bipolar()));

        let tables = alloc::vec![
            Box::new(harmonic_table(&[1.0])),
            Box::new(harmonic_table(&[1.0, 0.5])),
            Box::new(harmonic_table(&[1.0, 0.5, 0.33])),
            noise_table,
        ];

        Self { tables, noise }
    }

    /// Register a user table. Call at setup time; this allocates.
    pub fn add_wavetable(&mut self, table: Wavetable) -> WavetableId {
        self.tables.push(Box::new(table));
        WavetableId((self.tables.len() - 1) as u16)
    }

    /// Table for `id`, if it exists in this bank.
    #[inline]
    pub fn table(&self, id: WavetableId) -> Option<&Wavetable> {
        self.tables.get(id.index()).map(|t| &**t)
    }

    /// The sine table.
    #[inline]
    pub fn sine(&self) -> &Wavetable {
        &self.tables[WavetableId::SINE.index()]
    }

    /// Number of tables in the bank.
    pub fn len(&self) -> usize {
        self.tables.len()
    }

    /// Always `false`: the built-in tables are present from construction.
    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// Shared noise generator.
    #[inline]
    pub fn noise(&mut self) -> &mut NoiseSource {
        &mut self.noise
    }
}

/// Additive table from harmonic weights, normalized to a peak of 1.0.
fn harmonic_table(weights: &[f32]) -> Wavetable {
    let mut table: Wavetable = core::array::from_fn(|i| {
        let phase = i as f32 * TAU / WAVETABLE_LEN as f32;
        weights
            .iter()
            .enumerate()
            .map(|(h, w)| w * sinf(phase * (h + 1) as f32))
            .sum()
    });

    let peak = table.iter().fold(0.0f32, |m, s| m.max(s.abs()));
    if peak > 0.0 {
        for s in &mut table {
            *s /= peak;
        }
    }
    table
}
