//! xorshift64* random number generator
//!
//! Fast, deterministic PRNG used for every draw in the event generator and
//! analyzer. It passes TestU01's BigCrush and keeps its full state in one
//! `u64`, so a producer's stream can be reproduced from its seed alone.
//!
//! `RngManager` implements [`rand::RngCore`], which lets the `rand_distr`
//! distributions (Poisson, Normal) sample straight from it.

use rand::RngCore;
use std::sync::{Mutex, PoisonError};

/// Deterministic random number generator using xorshift64*
///
/// # Example
/// ```
/// use flow_simulator_core_rs::RngManager;
///
/// let mut rng = RngManager::new(12345);
/// let value = rng.next();
/// let unit = rng.next_f64(); // [0.0, 1.0)
/// ```
#[derive(Debug, Clone)]
pub struct RngManager {
    /// Internal state (64-bit)
    state: u64,
}

impl RngManager {
    /// Create a new RNG with given seed
    ///
    /// # Example
    /// ```
    /// use flow_simulator_core_rs::RngManager;
    ///
    /// let rng = RngManager::new(12345);
    /// ```
    pub fn new(seed: u64) -> Self {
        // xorshift state must never be zero
        let state = if seed == 0 { 1 } else { seed };
        Self { state }
    }

    /// Create an independent stream from a master seed.
    ///
    /// Each `(master_seed, stream)` pair maps through splitmix64 to a
    /// distinct, well-mixed starting state, so producers seeded with
    /// consecutive stream numbers do not walk correlated sequences.
    ///
    /// # Example
    /// ```
    /// use flow_simulator_core_rs::RngManager;
    ///
    /// let a = RngManager::derive(42, 1);
    /// let b = RngManager::derive(42, 2);
    /// assert_ne!(a.get_state(), b.get_state());
    /// ```
    pub fn derive(master_seed: u64, stream: u64) -> Self {
        let mut z = master_seed.wrapping_add(stream.wrapping_mul(0x9E37_79B9_7F4A_7C15));
        z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
        Self::new(z ^ (z >> 31))
    }

    /// Generate next random u64 value
    pub fn next(&mut self) -> u64 {
        let mut x = self.state;
        x ^= x >> 12;
        x ^= x << 25;
        x ^= x >> 27;
        self.state = x;
        x.wrapping_mul(0x2545F4914F6CDD1D)
    }

    /// Get current RNG state (for replay)
    pub fn get_state(&self) -> u64 {
        self.state
    }

    /// Generate random f64 in range [0.0, 1.0)
    ///
    /// # Example
    /// ```
    /// use flow_simulator_core_rs::RngManager;
    ///
    /// let mut rng = RngManager::new(12345);
    /// let probability = rng.next_f64();
    /// assert!(probability >= 0.0 && probability < 1.0);
    /// ```
    pub fn next_f64(&mut self) -> f64 {
        let value = self.next();
        // Top 53 bits scaled by 2^-53
        (value >> 11) as f64 * (1.0 / ((1u64 << 53) as f64))
    }
}

impl RngCore for RngManager {
    fn next_u32(&mut self) -> u32 {
        (self.next() >> 32) as u32
    }

    fn next_u64(&mut self) -> u64 {
        self.next()
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        for chunk in dest.chunks_mut(8) {
            let bytes = self.next().to_le_bytes();
            chunk.copy_from_slice(&bytes[..chunk.len()]);
        }
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
        self.fill_bytes(dest);
        Ok(())
    }
}

/// A generator shared between threads.
///
/// Every draw takes the lock, so concurrent callers advance one sequence
/// without tearing its state. Use it only for draws that must come from a
/// single run-wide stream; per-thread work should own an [`RngManager`].
#[derive(Debug)]
pub struct SharedRng {
    inner: Mutex<RngManager>,
}

impl SharedRng {
    pub fn new(rng: RngManager) -> Self {
        Self {
            inner: Mutex::new(rng),
        }
    }

    /// Run `f` with exclusive access to the generator.
    ///
    /// A poisoned lock is recovered: the state is a single `u64` and is
    /// valid after any partial update.
    pub fn with<T>(&self, f: impl FnOnce(&mut RngManager) -> T) -> T {
        let mut guard = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut guard)
    }

    /// Draw a uniform f64 in [0.0, 1.0)
    pub fn next_f64(&self) -> f64 {
        self.with(RngManager::next_f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_zero_seed_converted_to_nonzero() {
        let rng = RngManager::new(0);
        assert_ne!(rng.get_state(), 0, "Zero seed should be converted to 1");
    }

    #[test]
    fn test_next_f64_in_range() {
        let mut rng = RngManager::new(12345);

        for _ in 0..1000 {
            let val = rng.next_f64();
            assert!(
                (0.0..1.0).contains(&val),
                "next_f64() produced value {} outside [0.0, 1.0)",
                val
            );
        }
    }

    #[test]
    fn test_derive_is_deterministic_and_distinct() {
        let a1 = RngManager::derive(7, 3);
        let a2 = RngManager::derive(7, 3);
        let b = RngManager::derive(7, 4);

        assert_eq!(a1.get_state(), a2.get_state());
        assert_ne!(a1.get_state(), b.get_state());
    }

    #[test]
    fn test_fill_bytes_handles_partial_chunk() {
        let mut rng = RngManager::new(99);
        let mut buf = [0u8; 13];
        rng.fill_bytes(&mut buf);
        assert!(buf.iter().any(|&b| b != 0));
    }

    #[test]
    fn test_shared_rng_draws_are_serialized() {
        let shared = Arc::new(SharedRng::new(RngManager::new(5)));
        let mut handles = Vec::new();
        for _ in 0..4 {
            let shared = Arc::clone(&shared);
            handles.push(std::thread::spawn(move || {
                (0..250).map(|_| shared.with(|rng| rng.next())).collect::<Vec<_>>()
            }));
        }
        let mut drawn: Vec<u64> = handles
            .into_iter()
            .flat_map(|h| h.join().unwrap())
            .collect();

        // Same multiset as a single-threaded walk of the sequence
        let mut reference = RngManager::new(5);
        let mut expected: Vec<u64> = (0..1000).map(|_| reference.next()).collect();
        drawn.sort_unstable();
        expected.sort_unstable();
        assert_eq!(drawn, expected);
    }
}
