//! Seeded pseudo-random stream used for reproducible name batches
//!
//! Mulberry32: a 32-bit state advanced by a fixed odd increment and mixed
//! with xor-shifts and multiplies. Small, fast, and identical on every
//! platform because it only uses wrapping `u32` arithmetic. Not suitable for
//! secrets; see [`crate::secrets`].

/// Golden-ratio style increment applied to the state on every draw
const INCREMENT: u32 = 0x6D2B_79F5;

/// 2^32, the divisor that maps a `u32` into [0, 1)
const TWO_POW_32: f64 = 4_294_967_296.0;

/// Deterministic generator; two instances with the same seed produce
/// bit-identical sequences
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeededRng {
    seed: u32,
    state: u32,
}

impl SeededRng {
    pub fn new(seed: u32) -> Self {
        Self { seed, state: seed }
    }

    pub fn seed(&self) -> u32 {
        self.seed
    }

    /// Restart the sequence from the original seed
    pub fn reseed(&mut self) {
        self.state = self.seed;
    }

    pub fn next_u32(&mut self) -> u32 {
        self.state = self.state.wrapping_add(INCREMENT);
        let mut t = self.state;
        t = (t ^ (t >> 15)).wrapping_mul(t | 1);
        t ^= t.wrapping_add((t ^ (t >> 7)).wrapping_mul(t | 61));
        t ^ (t >> 14)
    }

    /// Next value uniformly distributed in [0, 1)
    pub fn next_f64(&mut self) -> f64 {
        f64::from(self.next_u32()) / TWO_POW_32
    }

    /// Uniform index into a collection of `len` items.
    ///
    /// `len` must be non-zero.
    pub fn next_index(&mut self, len: usize) -> usize {
        let index = (self.next_f64() * len as f64) as usize;
        index.min(len.saturating_sub(1))
    }
}
