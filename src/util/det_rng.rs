//! Deterministic pseudo-random number generator.
//!
//! This module provides a small, explicitly reseedable PRNG based on
//! xorshift64. Encoder and decoder must draw exactly the same values from the
//! same key, so every keyed operation starts with [`DetRng::seed`] and no
//! state is expected to survive across keyed operations.
//!
//! # Determinism
//!
//! Given the same seed, the sequence of generated numbers is always identical
//! on every platform.

/// Golden-ratio increment used by the splitmix64 seed scrambler.
const SEED_GAMMA: u64 = 0x9E37_79B9_7F4A_7C15;

/// A deterministic pseudo-random number generator using xorshift64.
///
/// Seeds are scrambled with splitmix64 first, so small consecutive keys
/// (batch sequence numbers) start from unrelated states.
/// It is NOT cryptographically secure.
#[derive(Debug, Clone)]
pub struct DetRng {
    state: u64,
}

impl DetRng {
    /// Creates a new PRNG with the given seed.
    #[must_use]
    pub const fn new(seed: u64) -> Self {
        Self {
            state: scramble(seed),
        }
    }

    /// Reseeds the generator, discarding all previous state.
    pub fn seed(&mut self, seed: u64) {
        self.state = scramble(seed);
    }

    /// Generates the next pseudo-random u64 value.
    #[allow(clippy::missing_const_for_fn)] // Cannot be const: mutates self
    pub fn next_u64(&mut self) -> u64 {
        // xorshift64 algorithm
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.state = x;
        x
    }

    /// Generates a uniform integer in `[0, max_inclusive]`.
    ///
    /// Uses mask-and-reject sampling, so the result carries no modulo bias.
    /// `rand_int(0)` still consumes one draw.
    pub fn rand_int(&mut self, max_inclusive: usize) -> usize {
        let max = max_inclusive as u64;
        let mut mask = max;
        mask |= mask >> 1;
        mask |= mask >> 2;
        mask |= mask >> 4;
        mask |= mask >> 8;
        mask |= mask >> 16;
        mask |= mask >> 32;
        loop {
            let candidate = self.next_u64() & mask;
            if candidate <= max {
                return candidate as usize;
            }
        }
    }

    /// Generates a uniform float in `[0, 1)` with 53 bits of precision.
    #[allow(clippy::cast_precision_loss)]
    pub fn rand(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 * (1.0 / (1u64 << 53) as f64)
    }

    /// Partial Fisher-Yates step: swaps a uniformly chosen element of
    /// `slots[i..]` into position `i` and returns it.
    ///
    /// # Panics
    ///
    /// Panics if `i >= slots.len()`.
    pub fn pick_into<T: Copy>(&mut self, slots: &mut [T], i: usize) -> T {
        assert!(i < slots.len(), "pick position {i} out of range");
        let j = self.rand_int(slots.len() - 1 - i) + i;
        slots.swap(i, j);
        slots[i]
    }
}

/// splitmix64 finalizer; never returns zero (xorshift would get stuck).
const fn scramble(seed: u64) -> u64 {
    let mut z = seed.wrapping_add(SEED_GAMMA);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^= z >> 31;
    if z == 0 {
        1
    } else {
        z
    }
}
