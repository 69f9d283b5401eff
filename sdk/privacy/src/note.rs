//! Shielded Notes
//!
//! A Note represents value held privately in the shielded pool.
//!
//! ```text
//! Note = {
//!     recipient: Address,   // owner commitment + transmission key
//!     value: u64,           // Amount in the smallest unit
//!     rho: Base,            // nullifier of the note spent in the same action
//!     rseed: [u8; 32],      // seed for rcm and the ephemeral key
//! }
//! ```

use crate::commitment::NoteCommitment;
use crate::encoding::{base_from_bytes, base_to_bytes};
use crate::error::PrivacyError;
use crate::keys::{ADDRESS_SIZE, Address, FullViewingKey, SpendingKey};
use crate::nullifier::Nullifier;
use crate::random::RandomnessSource;
use crate::{Base, prf};

/// Note value with overflow protection
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct NoteValue(u64);

impl NoteValue {
    pub const ZERO: Self = Self(0);
    pub const MAX: Self = Self(u64::MAX);

    pub fn new(value: u64) -> Self {
        Self(value)
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Checked addition
    pub fn checked_add(self, rhs: Self) -> Option<Self> {
        self.0.checked_add(rhs.0).map(Self)
    }

    /// Checked subtraction
    pub fn checked_sub(self, rhs: Self) -> Option<Self> {
        self.0.checked_sub(rhs.0).map(Self)
    }
}

/// Uniqueness value of a note.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rho(Base);

impl Rho {
    pub fn from_nullifier(nf: &Nullifier) -> Self {
        Self(nf.inner())
    }

    pub fn inner(&self) -> Base {
        self.0
    }

    pub fn to_bytes(&self) -> [u8; 32] {
        base_to_bytes(&self.0)
    }

    pub fn from_bytes(bytes: &[u8; 32]) -> Option<Self> {
        base_from_bytes(bytes).map(Self)
    }
}

/// Per-note seed from which `rcm` and the ephemeral secret are derived.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RandomSeed([u8; 32]);

impl RandomSeed {
    pub fn random<R: RandomnessSource + ?Sized>(rng: &mut R) -> Self {
        Self(rng.next_array())
    }

    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Note commitment trapdoor.
    pub fn rcm(&self, rho: &Rho) -> Base {
        prf::to_field(prf::RCM_DOMAIN, &[&self.0, &rho.to_bytes()])
    }

    /// Ephemeral x25519 secret for this note's encryption.
    pub fn esk(&self, rho: &Rho) -> [u8; 32] {
        prf::derive_key(prf::ESK_DOMAIN, &[&self.0, &rho.to_bytes()])
    }
}

/// Encoded size of a [`Note`]:
/// `recipient (64) || value (u64 LE) || rho (32) || rseed (32)`.
pub const NOTE_SIZE: usize = ADDRESS_SIZE + 8 + 32 + 32;

/// A shielded note representing privately held value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Note {
    /// Who can spend this note
    recipient: Address,
    /// The value (amount) held in this note
    value: NoteValue,
    /// Uniqueness value
    rho: Rho,
    /// Seed for the commitment trapdoor
    rseed: RandomSeed,
}

impl Note {
    pub fn from_parts(recipient: Address, value: NoteValue, rho: Rho, rseed: RandomSeed) -> Self {
        Self {
            recipient,
            value,
            rho,
            rseed,
        }
    }

    /// Create a note with a fresh seed
    pub fn new<R: RandomnessSource + ?Sized>(
        recipient: Address,
        value: NoteValue,
        rho: Rho,
        rng: &mut R,
    ) -> Self {
        Self::from_parts(recipient, value, rho, RandomSeed::random(rng))
    }

    /// A zero-valued note owned by a fresh key, as used for padding spends.
    ///
    /// Returns the key so the caller can authorize and prove the spend.
    pub fn dummy<R: RandomnessSource + ?Sized>(rng: &mut R) -> (SpendingKey, FullViewingKey, Self) {
        let sk = SpendingKey::random(rng);
        let fvk = FullViewingKey::from(&sk);
        let rho = Rho::from_nullifier(&Nullifier::random(rng));
        let note = Self::new(fvk.address(), NoteValue::ZERO, rho, rng);
        (sk, fvk, note)
    }

    pub fn recipient(&self) -> Address {
        self.recipient
    }

    pub fn value(&self) -> NoteValue {
        self.value
    }

    pub fn rho(&self) -> Rho {
        self.rho
    }

    pub fn rseed(&self) -> &RandomSeed {
        &self.rseed
    }

    /// Note commitment trapdoor
    pub fn rcm(&self) -> Base {
        self.rseed.rcm(&self.rho)
    }

    /// Compute the commitment for this note
    pub fn commitment(&self) -> NoteCommitment {
        NoteCommitment::derive(
            self.value.as_u64(),
            self.recipient.owner(),
            self.rho.inner(),
            self.rcm(),
        )
    }

    /// Derive the nullifier for spending this note
    pub fn nullifier(&self, fvk: &FullViewingKey) -> Nullifier {
        Nullifier::derive(fvk.nk(), self.rho.inner(), &self.commitment())
    }

    pub fn to_bytes(&self) -> [u8; NOTE_SIZE] {
        let mut out = [0u8; NOTE_SIZE];
        let (recipient, rest) = out.split_at_mut(ADDRESS_SIZE);
        let (value, rest) = rest.split_at_mut(8);
        let (rho, rseed) = rest.split_at_mut(32);

        recipient.copy_from_slice(&self.recipient.to_bytes());
        value.copy_from_slice(&self.value.as_u64().to_le_bytes());
        rho.copy_from_slice(&self.rho.to_bytes());
        rseed.copy_from_slice(self.rseed.as_bytes());
        out
    }

    /// Rejects non-canonical `owner` and `rho` field elements.
    pub fn from_bytes(bytes: &[u8; NOTE_SIZE]) -> Result<Self, PrivacyError> {
        let (recipient, rest) = bytes.split_at(ADDRESS_SIZE);
        let (value, rest) = rest.split_at(8);
        let (rho, rseed) = rest.split_at(32);

        let mut buf = [0u8; ADDRESS_SIZE];
        buf.copy_from_slice(recipient);
        let recipient =
            Address::from_bytes(&buf).ok_or(PrivacyError::InvalidEncoding("note recipient"))?;

        let mut buf = [0u8; 8];
        buf.copy_from_slice(value);
        let value = NoteValue::new(u64::from_le_bytes(buf));

        let mut buf = [0u8; 32];
        buf.copy_from_slice(rho);
        let rho = Rho::from_bytes(&buf).ok_or(PrivacyError::InvalidEncoding("note rho"))?;

        let mut buf = [0u8; 32];
        buf.copy_from_slice(rseed);
        Ok(Self::from_parts(recipient, value, rho, RandomSeed::from_bytes(buf)))
    }
}
