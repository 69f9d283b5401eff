//! Key components
//!
//! ```text
//! SpendingKey sk
//!   ├── ask = PRF(sk)            spend authorizing key (Jubjub scalar)
//!   │     └── ak = [ask] G       spend validating key
//!   └── nk  = PRF(sk)            nullifier deriving key (base field)
//!
//! FullViewingKey (ak, nk)
//!   ├── ivk = PRF(ak || nk)      x25519 secret, decrypts incoming notes
//!   ├── ovk = PRF(ak || nk)      recovers outgoing notes
//!   └── Address
//!         ├── owner = Poseidon(ADDRESS_DOMAIN, ak.x, nk)
//!         └── pk_d  = x25519(ivk)
//! ```

use std::fmt;

use ark_ff::Zero;
use x25519_dalek::{PublicKey, StaticSecret};

use crate::encoding::{base_from_bytes, base_to_bytes, point_from_bytes};
use crate::error::PrivacyError;
use crate::random::RandomnessSource;
use crate::redjubjub::{SigningKey, SpendAuth, VerificationKey};
use crate::{AffinePoint, Base, Point, Scalar, poseidon, prf};

/// Spending key - root of all other keys
///
/// Loss = loss of funds. Compromise = theft of funds.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct SpendingKey([u8; 32]);

impl fmt::Debug for SpendingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SpendingKey(..)")
    }
}

impl SpendingKey {
    /// Generate a random spending key
    pub fn random<R: RandomnessSource + ?Sized>(rng: &mut R) -> Self {
        loop {
            if let Some(sk) = Self::from_bytes(rng.next_array()) {
                return sk;
            }
        }
    }

    /// `None` if the derived authorizing key would be zero.
    pub fn from_bytes(bytes: [u8; 32]) -> Option<Self> {
        let sk = Self(bytes);
        if sk.ask_scalar().is_zero() {
            None
        } else {
            Some(sk)
        }
    }

    pub fn to_bytes(&self) -> [u8; 32] {
        self.0
    }

    fn ask_scalar(&self) -> Scalar {
        prf::to_field(prf::ASK_DOMAIN, &[&self.0])
    }
}

/// Spend authorizing key: signs for the notes of a spending key.
#[derive(Clone, Copy, Debug)]
pub struct SpendAuthorizingKey(SigningKey<SpendAuth>);

impl From<&SpendingKey> for SpendAuthorizingKey {
    fn from(sk: &SpendingKey) -> Self {
        // SpendingKey construction guarantees a nonzero scalar.
        let key = SigningKey::from_scalar(sk.ask_scalar())
            .expect("spending keys with a zero ask are rejected at construction");
        Self(key)
    }
}

impl SpendAuthorizingKey {
    /// `rsk = ask + alpha`; `None` only when `alpha = -ask`.
    pub fn randomize(&self, alpha: &Scalar) -> Option<SigningKey<SpendAuth>> {
        self.0.randomize(alpha)
    }

    pub fn validating_key(&self) -> SpendValidatingKey {
        SpendValidatingKey(self.0.verification_key())
    }
}

/// `ak = [ask] G`
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SpendValidatingKey(VerificationKey<SpendAuth>);

impl From<&SpendAuthorizingKey> for SpendValidatingKey {
    fn from(ask: &SpendAuthorizingKey) -> Self {
        ask.validating_key()
    }
}

impl SpendValidatingKey {
    /// `rk = ak + [alpha] G`
    pub fn randomize(&self, alpha: &Scalar) -> VerificationKey<SpendAuth> {
        self.0.randomize(alpha)
    }

    pub fn point(&self) -> Point {
        self.0.point()
    }

    pub fn to_affine(&self) -> AffinePoint {
        self.0.to_affine()
    }

    pub fn to_bytes(&self) -> [u8; 32] {
        self.0.to_bytes()
    }

    pub fn from_bytes(bytes: &[u8; 32]) -> Option<Self> {
        point_from_bytes(bytes).map(|p| Self(VerificationKey::from_point(p)))
    }
}

/// Nullifier deriving key
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NullifierDerivingKey(Base);

impl From<&SpendingKey> for NullifierDerivingKey {
    fn from(sk: &SpendingKey) -> Self {
        Self(prf::to_field(prf::NK_DOMAIN, &[&sk.0]))
    }
}

impl NullifierDerivingKey {
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

/// Encoded size of a [`FullViewingKey`]: `ak || nk`.
pub const FULL_VIEWING_KEY_SIZE: usize = 64;

/// Full viewing key: everything except the authority to sign.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FullViewingKey {
    ak: SpendValidatingKey,
    nk: NullifierDerivingKey,
}

impl From<&SpendingKey> for FullViewingKey {
    fn from(sk: &SpendingKey) -> Self {
        let ask = SpendAuthorizingKey::from(sk);
        Self {
            ak: ask.validating_key(),
            nk: NullifierDerivingKey::from(sk),
        }
    }
}

impl FullViewingKey {
    pub fn from_parts(ak: SpendValidatingKey, nk: NullifierDerivingKey) -> Self {
        Self { ak, nk }
    }

    pub fn ak(&self) -> &SpendValidatingKey {
        &self.ak
    }

    pub fn nk(&self) -> &NullifierDerivingKey {
        &self.nk
    }

    pub fn to_bytes(&self) -> [u8; FULL_VIEWING_KEY_SIZE] {
        let mut out = [0u8; FULL_VIEWING_KEY_SIZE];
        out[..32].copy_from_slice(&self.ak.to_bytes());
        out[32..].copy_from_slice(&self.nk.to_bytes());
        out
    }

    /// Rejects an `ak` that is not a nonzero point of the prime-order
    /// subgroup and an `nk` that is not a canonical field element.
    pub fn from_bytes(bytes: &[u8; FULL_VIEWING_KEY_SIZE]) -> Result<Self, PrivacyError> {
        let mut ak = [0u8; 32];
        ak.copy_from_slice(&bytes[..32]);
        let mut nk = [0u8; 32];
        nk.copy_from_slice(&bytes[32..]);

        let ak = SpendValidatingKey::from_bytes(&ak)
            .filter(|ak| !ak.point().is_zero())
            .ok_or(PrivacyError::InvalidEncoding("spend validating key"))?;
        let nk = NullifierDerivingKey::from_bytes(&nk)
            .ok_or(PrivacyError::InvalidEncoding("nullifier deriving key"))?;
        Ok(Self { ak, nk })
    }

    pub fn ivk(&self) -> IncomingViewingKey {
        let secret = prf::derive_key(prf::IVK_DOMAIN, &[&self.to_bytes()]);
        IncomingViewingKey(StaticSecret::from(secret))
    }

    pub fn ovk(&self) -> OutgoingViewingKey {
        OutgoingViewingKey(prf::derive_key(prf::OVK_DOMAIN, &[&self.to_bytes()]))
    }

    /// Identity commitment binding notes to this key: only the holder of
    /// `ak` and `nk` can open it inside the action circuit.
    pub fn owner(&self) -> Base {
        owner_commitment(&self.ak.to_affine(), &self.nk.0)
    }

    /// The single payment address of this key.
    pub fn address(&self) -> Address {
        Address {
            owner: self.owner(),
            transmission_key: self.ivk().transmission_key(),
        }
    }
}

/// `Poseidon(ADDRESS_DOMAIN, ak.x, nk)`
pub fn owner_commitment(ak: &AffinePoint, nk: &Base) -> Base {
    poseidon::hash(&[Base::from(poseidon::ADDRESS_DOMAIN), ak.x, *nk])
}

/// Incoming viewing key: decrypts notes sent to the address.
#[derive(Clone)]
pub struct IncomingViewingKey(StaticSecret);

impl fmt::Debug for IncomingViewingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("IncomingViewingKey(..)")
    }
}

impl IncomingViewingKey {
    pub fn transmission_key(&self) -> [u8; 32] {
        *PublicKey::from(&self.0).as_bytes()
    }

    pub(crate) fn secret(&self) -> &StaticSecret {
        &self.0
    }
}

/// Outgoing viewing key: lets the sender recover what they sent.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OutgoingViewingKey([u8; 32]);

impl OutgoingViewingKey {
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn random<R: RandomnessSource + ?Sized>(rng: &mut R) -> Self {
        Self(rng.next_array())
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

/// Encoded size of an [`Address`]: `owner || transmission_key`.
pub const ADDRESS_SIZE: usize = 64;

/// Payment address
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Address {
    /// Identity commitment of the owning key
    owner: Base,
    /// x25519 public key notes are encrypted to
    transmission_key: [u8; 32],
}

impl Address {
    pub fn from_parts(owner: Base, transmission_key: [u8; 32]) -> Self {
        Self {
            owner,
            transmission_key,
        }
    }

    pub fn owner(&self) -> Base {
        self.owner
    }

    pub fn transmission_key(&self) -> &[u8; 32] {
        &self.transmission_key
    }

    pub fn to_bytes(&self) -> [u8; ADDRESS_SIZE] {
        let mut out = [0u8; ADDRESS_SIZE];
        out[..32].copy_from_slice(&base_to_bytes(&self.owner));
        out[32..].copy_from_slice(&self.transmission_key);
        out
    }

    pub fn from_bytes(bytes: &[u8; ADDRESS_SIZE]) -> Option<Self> {
        let mut owner = [0u8; 32];
        owner.copy_from_slice(&bytes[..32]);
        let mut transmission_key = [0u8; 32];
        transmission_key.copy_from_slice(&bytes[32..]);
        Some(Self {
            owner: base_from_bytes(&owner)?,
            transmission_key,
        })
    }
}

/// Shorthand used in tests and by callers that only need a throwaway
/// recipient.
pub fn random_address<R: RandomnessSource + ?Sized>(rng: &mut R) -> Address {
    FullViewingKey::from(&SpendingKey::random(rng)).address()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::random::SeededRandomness;

    #[test]
    fn test_key_derivation_deterministic() {
        let sk = SpendingKey::from_bytes([7u8; 32]).expect("valid key");
        let fvk1 = FullViewingKey::from(&sk);
        let fvk2 = FullViewingKey::from(&sk);

        assert_eq!(fvk1, fvk2);
        assert_eq!(fvk1.address(), fvk2.address());
        assert_eq!(fvk1.ovk(), fvk2.ovk());
    }

    #[test]
    fn test_ak_matches_ask() {
        let sk = SpendingKey::from_bytes([8u8; 32]).expect("valid key");
        let ask = SpendAuthorizingKey::from(&sk);
        let fvk = FullViewingKey::from(&sk);
        assert_eq!(*fvk.ak(), SpendValidatingKey::from(&ask));
    }

    #[test]
    fn test_distinct_keys_distinct_addresses() {
        let mut rng = SeededRandomness::from_seed([9u8; 32]);
        let a = FullViewingKey::from(&SpendingKey::random(&mut rng)).address();
        let b = FullViewingKey::from(&SpendingKey::random(&mut rng)).address();
        assert_ne!(a.owner(), b.owner());
        assert_ne!(a.transmission_key(), b.transmission_key());
    }

    #[test]
    fn test_address_encoding() {
        let mut rng = SeededRandomness::from_seed([10u8; 32]);
        let addr = random_address(&mut rng);
        let decoded = Address::from_bytes(&addr.to_bytes()).expect("canonical");
        assert_eq!(decoded, addr);
    }

    #[test]
    fn test_ak_encoding() {
        let sk = SpendingKey::from_bytes([11u8; 32]).expect("valid key");
        let fvk = FullViewingKey::from(&sk);
        let decoded = SpendValidatingKey::from_bytes(&fvk.ak().to_bytes()).expect("valid point");
        assert_eq!(decoded, *fvk.ak());
    }

    #[test]
    fn test_full_viewing_key_encoding() {
        let mut rng = SeededRandomness::from_seed([12u8; 32]);
        let fvk = FullViewingKey::from(&SpendingKey::random(&mut rng));

        let decoded = FullViewingKey::from_bytes(&fvk.to_bytes()).unwrap();
        assert_eq!(decoded, fvk);
        assert_eq!(decoded.address(), fvk.address());
        assert_eq!(decoded.ovk(), fvk.ovk());
    }

    #[test]
    fn test_full_viewing_key_rejects_bad_encodings() {
        let mut rng = SeededRandomness::from_seed([13u8; 32]);
        let valid = FullViewingKey::from(&SpendingKey::random(&mut rng)).to_bytes();

        // ak is not a curve point
        let mut bytes = valid;
        bytes[..32].copy_from_slice(&[0xff; 32]);
        assert_eq!(
            FullViewingKey::from_bytes(&bytes),
            Err(PrivacyError::InvalidEncoding("spend validating key"))
        );

        // ak is the identity
        let mut bytes = valid;
        bytes[..32].copy_from_slice(&crate::encoding::point_to_bytes(&Point::zero()));
        assert_eq!(
            FullViewingKey::from_bytes(&bytes),
            Err(PrivacyError::InvalidEncoding("spend validating key"))
        );

        // nk is not canonical
        let mut bytes = valid;
        bytes[32..].copy_from_slice(&[0xff; 32]);
        assert_eq!(
            FullViewingKey::from_bytes(&bytes),
            Err(PrivacyError::InvalidEncoding("nullifier deriving key"))
        );
    }
}
