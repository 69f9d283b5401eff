//! Note Commitments
//!
//! Implements Poseidon-based commitments for notes.
//!
//! ```text
//! cm = Poseidon(NOTE_COMMIT_DOMAIN, value, owner, rho, rcm)
//! ```
//!
//! `rcm` is derived from the note's random seed, so the commitment hides the
//! note contents while the action circuit can still open it.

use crate::encoding::{base_from_bytes, base_to_bytes};
use crate::{Base, poseidon};

/// A note commitment; also the leaf value in the commitment tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NoteCommitment(Base);

impl NoteCommitment {
    /// Commit to the opening of a note.
    pub fn derive(value: u64, owner: Base, rho: Base, rcm: Base) -> Self {
        Self(poseidon::hash(&[
            Base::from(poseidon::NOTE_COMMIT_DOMAIN),
            Base::from(value),
            owner,
            rho,
            rcm,
        ]))
    }

    pub fn from_field(f: Base) -> Self {
        Self(f)
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
