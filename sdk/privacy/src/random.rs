//! Randomness sources
//!
//! Randomness is always passed in by the caller. Any cryptographically
//! secure `RngCore` is a [`RandomnessSource`]; [`SeededRandomness`] is the
//! deterministic double used for reproducible vectors.

use ark_ff::PrimeField;
use rand::rngs::StdRng;
use rand::{CryptoRng, RngCore, SeedableRng};

/// Supplier of uniformly random scalars and bytes.
pub trait RandomnessSource: RngCore + CryptoRng {
    /// A uniformly random field element.
    fn next_scalar<F: PrimeField>(&mut self) -> F {
        F::rand(self)
    }

    /// `n` uniformly random bytes.
    fn next_bytes(&mut self, n: usize) -> Vec<u8> {
        let mut out = vec![0u8; n];
        self.fill_bytes(&mut out);
        out
    }

    fn next_array<const N: usize>(&mut self) -> [u8; N] {
        let mut out = [0u8; N];
        self.fill_bytes(&mut out);
        out
    }

    /// An independent stream seeded from this one, for handing to a worker.
    fn fork(&mut self) -> SeededRandomness {
        SeededRandomness::from_seed(self.next_array())
    }
}

impl<R: RngCore + CryptoRng + ?Sized> RandomnessSource for R {}

/// Deterministic source for tests and reproducible vectors.
#[derive(Debug, Clone)]
pub struct SeededRandomness(StdRng);

impl SeededRandomness {
    pub fn from_seed(seed: [u8; 32]) -> Self {
        Self(StdRng::from_seed(seed))
    }

    pub fn from_u64(seed: u64) -> Self {
        Self(StdRng::seed_from_u64(seed))
    }
}

impl RngCore for SeededRandomness {
    fn next_u32(&mut self) -> u32 {
        self.0.next_u32()
    }

    fn next_u64(&mut self) -> u64 {
        self.0.next_u64()
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        self.0.fill_bytes(dest)
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
        self.0.try_fill_bytes(dest)
    }
}

impl CryptoRng for SeededRandomness {}
