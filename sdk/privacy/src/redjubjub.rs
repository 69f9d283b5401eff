//! RedJubjub Schnorr signatures
//!
//! ```text
//! sign(sk, m):   r = H*(T || sk || m),  R = [r] B,  S = r + H*(R || vk || m) * sk
//! verify(vk, m): [S] B == R + [H*(R || vk || m)] vk
//! ```
//!
//! The basepoint `B` is a type parameter: [`SpendAuth`] signatures use the
//! curve generator, [`Binding`] signatures use the value-commitment trapdoor
//! generator so that `bvk = sum(cv) - [balance] V` is a valid key for
//! `bsk = sum(rcv)`.
//!
//! Signing keys are re-randomizable: `rsk = sk + alpha`, `rk = vk + [alpha] B`.

use std::marker::PhantomData;

use ark_ec::{AffineRepr, CurveGroup};
use ark_std::Zero;

use crate::encoding::{point_from_bytes, point_to_bytes, scalar_from_bytes, scalar_to_bytes};
use crate::random::RandomnessSource;
use crate::value::trapdoor_base;
use crate::{AffinePoint, Point, Scalar, prf};

/// Abstracts over the two basepoint choices.
pub trait SigType: private::Sealed {}

/// Signatures proving the value balance.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum Binding {}
impl SigType for Binding {}

/// Signatures authorizing a spend.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum SpendAuth {}
impl SigType for SpendAuth {}

mod private {
    use super::*;

    pub trait Sealed: Copy + Clone + Eq + PartialEq + std::fmt::Debug {
        fn basepoint() -> Point;
    }

    impl Sealed for Binding {
        fn basepoint() -> Point {
            trapdoor_base()
        }
    }

    impl Sealed for SpendAuth {
        fn basepoint() -> Point {
            AffinePoint::generator().into_group()
        }
    }
}

/// Basepoint of signature type `T`.
pub fn basepoint<T: SigType>() -> Point {
    T::basepoint()
}

/// A RedJubjub signing key.
#[derive(Copy, Clone, Debug)]
pub struct SigningKey<T: SigType> {
    sk: Scalar,
    pk: VerificationKey<T>,
}

impl<T: SigType> SigningKey<T> {
    /// Wrap a scalar; `None` for zero.
    pub fn from_scalar(sk: Scalar) -> Option<Self> {
        if sk.is_zero() {
            return None;
        }
        let pk = VerificationKey {
            point: T::basepoint() * sk,
            _marker: PhantomData,
        };
        Some(Self { sk, pk })
    }

    pub fn random<R: RandomnessSource + ?Sized>(rng: &mut R) -> Self {
        loop {
            if let Some(sk) = Self::from_scalar(rng.next_scalar()) {
                return sk;
            }
        }
    }

    /// `sk + alpha`
    pub fn randomize(&self, alpha: &Scalar) -> Option<Self> {
        Self::from_scalar(self.sk + alpha)
    }

    pub fn scalar(&self) -> Scalar {
        self.sk
    }

    pub fn verification_key(&self) -> VerificationKey<T> {
        self.pk
    }

    /// Sign with 32 bytes of fresh hedging randomness.
    pub fn sign<R: RandomnessSource + ?Sized>(&self, rng: &mut R, msg: &[u8]) -> Signature<T> {
        let hedge: [u8; 32] = rng.next_array();
        self.sign_with_hedge(&hedge, msg)
    }

    /// Sign without external randomness; the nonce depends only on the key
    /// and message.
    pub fn sign_deterministic(&self, msg: &[u8]) -> Signature<T> {
        self.sign_with_hedge(&[0u8; 32], msg)
    }

    fn sign_with_hedge(&self, hedge: &[u8; 32], msg: &[u8]) -> Signature<T> {
        let sk_bytes = scalar_to_bytes(&self.sk);
        let r: Scalar = prf::to_field(prf::SIG_NONCE_DOMAIN, &[hedge, &sk_bytes, msg]);
        let r_bytes = point_to_bytes(&(T::basepoint() * r));
        let c = challenge(&r_bytes, &self.pk.to_bytes(), msg);
        let s = r + c * self.sk;

        let mut bytes = [0u8; 64];
        bytes[..32].copy_from_slice(&r_bytes);
        bytes[32..].copy_from_slice(&scalar_to_bytes(&s));
        Signature::from_bytes(bytes)
    }
}

impl<'a, T: SigType> From<&'a SigningKey<T>> for VerificationKey<T> {
    fn from(sk: &'a SigningKey<T>) -> VerificationKey<T> {
        sk.pk
    }
}

/// A RedJubjub verification key.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct VerificationKey<T: SigType> {
    point: Point,
    _marker: PhantomData<T>,
}

impl<T: SigType> VerificationKey<T> {
    pub fn from_point(point: Point) -> Self {
        Self {
            point,
            _marker: PhantomData,
        }
    }

    pub fn point(&self) -> Point {
        self.point
    }

    pub fn to_affine(&self) -> AffinePoint {
        self.point.into_affine()
    }

    /// `vk + [alpha] B`
    pub fn randomize(&self, alpha: &Scalar) -> Self {
        Self::from_point(self.point + T::basepoint() * alpha)
    }

    pub fn to_bytes(&self) -> [u8; 32] {
        point_to_bytes(&self.point)
    }

    /// Rejects encodings off the curve or outside the prime-order subgroup.
    pub fn from_bytes(bytes: &[u8; 32]) -> Option<Self> {
        point_from_bytes(bytes).map(Self::from_point)
    }

    pub fn verify(&self, msg: &[u8], signature: &Signature<T>) -> bool {
        let Some(r) = point_from_bytes(&signature.r_bytes()) else {
            return false;
        };
        let Some(s) = scalar_from_bytes(&signature.s_bytes()) else {
            return false;
        };
        let c = challenge(&signature.r_bytes(), &self.to_bytes(), msg);

        T::basepoint() * s == r + self.point * c
    }
}

/// A RedJubjub signature: `R || S`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Signature<T: SigType> {
    bytes: [u8; 64],
    _marker: PhantomData<T>,
}

impl<T: SigType> Signature<T> {
    pub fn from_bytes(bytes: [u8; 64]) -> Self {
        Self {
            bytes,
            _marker: PhantomData,
        }
    }

    pub fn to_bytes(&self) -> [u8; 64] {
        self.bytes
    }

    fn r_bytes(&self) -> [u8; 32] {
        let mut r = [0u8; 32];
        r.copy_from_slice(&self.bytes[..32]);
        r
    }

    fn s_bytes(&self) -> [u8; 32] {
        let mut s = [0u8; 32];
        s.copy_from_slice(&self.bytes[32..]);
        s
    }
}

fn challenge(r_bytes: &[u8; 32], vk_bytes: &[u8; 32], msg: &[u8]) -> Scalar {
    prf::to_field(prf::SIG_CHALLENGE_DOMAIN, &[r_bytes, vk_bytes, msg])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::random::SeededRandomness;

    #[test]
    fn test_sign_verify() {
        let mut rng = SeededRandomness::from_seed([1u8; 32]);
        let sk = SigningKey::<SpendAuth>::random(&mut rng);
        let vk = VerificationKey::from(&sk);
        let sig = sk.sign(&mut rng, b"sighash");

        assert!(vk.verify(b"sighash", &sig));
        assert!(!vk.verify(b"other", &sig), "signature must bind the message");
    }

    #[test]
    fn test_wrong_key_rejects() {
        let mut rng = SeededRandomness::from_seed([2u8; 32]);
        let sk = SigningKey::<Binding>::random(&mut rng);
        let other = SigningKey::<Binding>::random(&mut rng);
        let sig = sk.sign_deterministic(b"msg");

        assert!(!other.verification_key().verify(b"msg", &sig));
    }

    #[test]
    fn test_randomized_keys_agree() {
        let mut rng = SeededRandomness::from_seed([3u8; 32]);
        let sk = SigningKey::<SpendAuth>::random(&mut rng);
        let alpha: Scalar = rng.next_scalar();

        let rsk = sk.randomize(&alpha).expect("nonzero");
        let rk = sk.verification_key().randomize(&alpha);
        assert_eq!(rsk.verification_key(), rk);

        let sig = rsk.sign(&mut rng, b"msg");
        assert!(rk.verify(b"msg", &sig));
        assert!(
            !sk.verification_key().verify(b"msg", &sig),
            "unrandomized key should not verify"
        );
    }

    #[test]
    fn test_deterministic_signing_is_stable() {
        let sk = SigningKey::<Binding>::from_scalar(Scalar::from(9u64)).expect("nonzero");
        assert_eq!(sk.sign_deterministic(b"m"), sk.sign_deterministic(b"m"));
    }

    #[test]
    fn test_basepoints_differ() {
        assert_ne!(basepoint::<Binding>(), basepoint::<SpendAuth>());
    }

    #[test]
    fn test_zero_key_rejected() {
        assert!(SigningKey::<SpendAuth>::from_scalar(Scalar::zero()).is_none());
    }

    #[test]
    fn test_malformed_signature_rejects() {
        let mut rng = SeededRandomness::from_seed([4u8; 32]);
        let sk = SigningKey::<SpendAuth>::random(&mut rng);
        let sig = Signature::<SpendAuth>::from_bytes([0xff; 64]);
        assert!(!sk.verification_key().verify(b"msg", &sig));
    }
}
