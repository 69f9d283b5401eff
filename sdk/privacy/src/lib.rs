//! Shroud Privacy SDK
//!
//! Note-based privacy primitives consumed by the bundle builder and the
//! action circuit.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                           Action                                │
//! │  ┌──────────────┐  ┌──────────────┐  ┌───────────────────────┐ │
//! │  │  Nullifier   │  │ Commitment   │  │   Encrypted Output    │ │
//! │  │  (spent)     │  │  (new note)  │  │   (for recipient)     │ │
//! │  └──────────────┘  └──────────────┘  └───────────────────────┘ │
//! │  ┌──────────────────────────┐  ┌──────────────────────────────┐ │
//! │  │ Value commitment (cv)    │  │ Randomized key (rk)          │ │
//! │  │ [v]V + [rcv]R on Jubjub  │  │ ak + [alpha]G                │ │
//! │  └──────────────────────────┘  └──────────────────────────────┘ │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Hash-based objects (commitments, nullifiers, tree nodes) live in the
//! BLS12-381 scalar field, which is also the base field of Jubjub. Value
//! commitments and signatures live on Jubjub.

pub mod commitment;
pub mod encryption;
pub mod error;
pub mod keys;
pub mod merkle;
pub mod note;
pub mod nullifier;
pub mod poseidon;
pub mod prf;
pub mod random;
pub mod redjubjub;
pub mod value;

pub use commitment::NoteCommitment;
pub use encryption::{
    ENC_CIPHERTEXT_SIZE, MEMO_SIZE, Memo, OUT_CIPHERTEXT_SIZE, TransmittedNoteCiphertext,
    empty_memo, encrypt_note, recover_with_ovk, try_note_decryption,
};
pub use error::PrivacyError;
pub use keys::{
    ADDRESS_SIZE, Address, FULL_VIEWING_KEY_SIZE, FullViewingKey, IncomingViewingKey,
    NullifierDerivingKey, OutgoingViewingKey, SpendAuthorizingKey, SpendValidatingKey, SpendingKey,
};
pub use merkle::{Anchor, CommitmentTree, MerklePath, TREE_DEPTH};
pub use note::{NOTE_SIZE, Note, NoteValue, RandomSeed, Rho};
pub use nullifier::Nullifier;
pub use random::{RandomnessSource, SeededRandomness};
pub use value::{ValueCommitTrapdoor, ValueCommitment, ValueSum};

/// Field of every hash-based object; the base field of Jubjub.
pub type Base = ark_ed_on_bls12_381::Fq;

/// Scalar field of the Jubjub prime-order subgroup.
pub type Scalar = ark_ed_on_bls12_381::Fr;

/// Jubjub points.
pub type Point = ark_ed_on_bls12_381::EdwardsProjective;
pub type AffinePoint = ark_ed_on_bls12_381::EdwardsAffine;

pub(crate) mod encoding {
    //! Fixed-width little-endian encodings shared by the public types.

    use ark_ec::CurveGroup;
    use ark_ff::{BigInteger, PrimeField};
    use ark_serialize::{CanonicalDeserialize, CanonicalSerialize};

    use crate::{AffinePoint, Base, Point, Scalar};

    pub fn base_to_bytes(f: &Base) -> [u8; 32] {
        let bytes = f.into_bigint().to_bytes_le();
        let mut arr = [0u8; 32];
        arr[..bytes.len()].copy_from_slice(&bytes);
        arr
    }

    /// Rejects non-canonical encodings.
    pub fn base_from_bytes(bytes: &[u8; 32]) -> Option<Base> {
        Base::deserialize_compressed(&bytes[..]).ok()
    }

    pub fn scalar_to_bytes(s: &Scalar) -> [u8; 32] {
        let bytes = s.into_bigint().to_bytes_le();
        let mut arr = [0u8; 32];
        arr[..bytes.len()].copy_from_slice(&bytes);
        arr
    }

    pub fn scalar_from_bytes(bytes: &[u8; 32]) -> Option<Scalar> {
        Scalar::deserialize_compressed(&bytes[..]).ok()
    }

    pub fn point_to_bytes(p: &Point) -> [u8; 32] {
        let mut arr = [0u8; 32];
        p.into_affine()
            .serialize_compressed(&mut arr[..])
            .expect("compressed Jubjub points are 32 bytes");
        arr
    }

    /// Decodes a compressed point, checking it is on the curve and in the
    /// prime-order subgroup.
    pub fn point_from_bytes(bytes: &[u8; 32]) -> Option<Point> {
        AffinePoint::deserialize_compressed(&bytes[..])
            .ok()
            .map(Point::from)
    }
}
