//! Poseidon parameters and the native hash helper
//!
//! Every Poseidon invocation in the workspace, native or in-circuit, uses the
//! single configuration returned by [`config`].

use std::sync::OnceLock;

use ark_crypto_primitives::sponge::{
    CryptographicSponge,
    poseidon::{PoseidonConfig, PoseidonSponge, find_poseidon_ark_and_mds},
};

use crate::Base;

/// Domain tags absorbed as the first element of each hash.
pub const ADDRESS_DOMAIN: u64 = 0x5348_4144; // "SHAD"
pub const NOTE_COMMIT_DOMAIN: u64 = 0x5348_434d; // "SHCM"
pub const NULLIFIER_DOMAIN: u64 = 0x5348_4e46; // "SHNF"

static CONFIG: OnceLock<PoseidonConfig<Base>> = OnceLock::new();

/// Poseidon configuration for Shroud
///
/// Field: BLS12-381 Fr (255 bits)
/// Rate: 2, Capacity: 1
/// Security: 128 bits
pub fn config() -> &'static PoseidonConfig<Base> {
    CONFIG.get_or_init(|| {
        let prime_bits: u64 = 255;
        let rate: usize = 2;
        let capacity: usize = 1;
        let full_rounds: u64 = 8;
        let partial_rounds: u64 = 57;
        let alpha: u64 = 5;
        let skip_matrices: u64 = 0;

        let (ark, mds) = find_poseidon_ark_and_mds::<Base>(
            prime_bits,
            rate,
            full_rounds,
            partial_rounds,
            skip_matrices,
        );

        PoseidonConfig::new(
            full_rounds as usize,
            partial_rounds as usize,
            alpha,
            mds,
            ark,
            rate,
            capacity,
        )
    })
}

/// Absorb `inputs` in order and squeeze one element.
pub fn hash(inputs: &[Base]) -> Base {
    let mut sponge = PoseidonSponge::new(config());
    sponge.absorb(&inputs);
    sponge.squeeze_field_elements(1)[0]
}

/// Parent of two tree nodes.
pub fn hash_pair(left: Base, right: Base) -> Base {
    hash(&[left, right])
}
