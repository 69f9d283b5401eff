//! Nullifiers
//!
//! Implements nullifier derivation for double-spend prevention.
//!
//! ```text
//! nf = Poseidon(NULLIFIER_DOMAIN, nk, rho, cm)
//! ```
//!
//! The same note and key always give the same nullifier; once it is
//! published the note cannot be spent again. Every note's `rho` is the
//! nullifier of the note spent alongside its creation, so nullifiers chain
//! and never repeat across distinct notes.

use crate::commitment::NoteCommitment;
use crate::encoding::{base_from_bytes, base_to_bytes};
use crate::keys::NullifierDerivingKey;
use crate::random::RandomnessSource;
use crate::{Base, poseidon};

/// A nullifier - unique public tag for a spent note
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Nullifier(Base);

impl Nullifier {
    /// Derive the nullifier of the note with uniqueness value `rho` and
    /// commitment `cm`.
    pub fn derive(nk: &NullifierDerivingKey, rho: Base, cm: &NoteCommitment) -> Self {
        Self(poseidon::hash(&[
            Base::from(poseidon::NULLIFIER_DOMAIN),
            nk.inner(),
            rho,
            cm.inner(),
        ]))
    }

    /// A uniformly random value; used as `rho` of dummy spends.
    pub fn random<R: RandomnessSource + ?Sized>(rng: &mut R) -> Self {
        Self(rng.next_scalar())
    }

    pub fn inner(&self) -> Base {
        self.0
    }

    pub fn to_bytes(&self) -> [u8; 32] {
        base_to_bytes(&self.0)
    }

    /// Rejects non-canonical encodings.
    pub fn from_bytes(bytes: &[u8; 32]) -> Option<Self> {
        base_from_bytes(bytes).map(Self)
    }
}
