//! Value commitments
//!
//! ```text
//! cv = [v_spend - v_output] V + [rcv] R
//! ```
//!
//! `V` and `R` are independent Jubjub generators obtained by hashing to the
//! curve, so nobody knows their discrete-log relation. Commitments are
//! additively homomorphic: the sum of all action commitments minus
//! `[value_balance] V` is `[sum of rcv] R`, which is what the binding
//! signature proves knowledge of.

use std::iter::Sum;
use std::ops::{Add, Neg, Sub};
use std::sync::OnceLock;

use ark_ec::{AffineRepr, CurveGroup};
use ark_std::Zero;

use crate::encoding::{point_from_bytes, point_to_bytes, scalar_from_bytes, scalar_to_bytes};
use crate::note::NoteValue;
use crate::prf;
use crate::random::RandomnessSource;
use crate::{AffinePoint, Point, Scalar};

static VALUE_BASE: OnceLock<Point> = OnceLock::new();
static TRAPDOOR_BASE: OnceLock<Point> = OnceLock::new();

/// Generator committing to the value.
pub fn value_base() -> Point {
    *VALUE_BASE.get_or_init(|| hash_to_curve(b"value commitment v"))
}

/// Generator committing to the trapdoor; also the binding signature basepoint.
pub fn trapdoor_base() -> Point {
    *TRAPDOOR_BASE.get_or_init(|| hash_to_curve(b"value commitment r"))
}

/// Try-and-increment hash into the prime-order subgroup.
pub fn hash_to_curve(personalization: &[u8]) -> Point {
    let mut counter: u32 = 0;
    loop {
        let digest = prf::derive_key(
            prf::GENERATOR_DOMAIN,
            &[personalization, &counter.to_le_bytes()],
        );
        if let Some(candidate) = AffinePoint::from_random_bytes(&digest) {
            let point = candidate.clear_cofactor().into_group();
            if !point.is_zero() {
                return point;
            }
        }
        counter += 1;
    }
}

/// Signed sum of note values.
///
/// Accumulated in `i128` so any number of `u64` values can be combined
/// without wrapping; narrowing to the on-wire `i64` is checked.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct ValueSum(i128);

impl ValueSum {
    pub const ZERO: Self = Self(0);

    /// `spend - output` for a single action.
    pub fn from_pair(spend: NoteValue, output: NoteValue) -> Self {
        Self(i128::from(spend.as_u64()) - i128::from(output.as_u64()))
    }

    pub fn from_raw(value: i64) -> Self {
        Self(i128::from(value))
    }

    pub fn as_i128(&self) -> i128 {
        self.0
    }

    /// Narrow to the wire width.
    pub fn to_i64(self) -> Option<i64> {
        i64::try_from(self.0).ok()
    }

    pub fn checked_add(self, rhs: Self) -> Option<Self> {
        self.0.checked_add(rhs.0).map(Self)
    }

    /// The value as a Jubjub scalar, negatives reduced modulo the group order.
    pub fn to_scalar(self) -> Scalar {
        let magnitude = Scalar::from(self.0.unsigned_abs());
        if self.0 < 0 { -magnitude } else { magnitude }
    }
}

/// Blinding scalar of a value commitment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValueCommitTrapdoor(Scalar);

impl ValueCommitTrapdoor {
    pub fn random<R: RandomnessSource + ?Sized>(rng: &mut R) -> Self {
        Self(rng.next_scalar())
    }

    pub fn zero() -> Self {
        Self(Scalar::zero())
    }

    pub fn from_scalar(s: Scalar) -> Self {
        Self(s)
    }

    pub fn inner(&self) -> Scalar {
        self.0
    }

    pub fn to_bytes(&self) -> [u8; 32] {
        scalar_to_bytes(&self.0)
    }

    pub fn from_bytes(bytes: &[u8; 32]) -> Option<Self> {
        scalar_from_bytes(bytes).map(Self)
    }
}

impl Add for ValueCommitTrapdoor {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self(self.0 + rhs.0)
    }
}

impl Sum for ValueCommitTrapdoor {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::zero(), |acc, rcv| acc + rcv)
    }
}

/// A hiding, binding commitment to a signed value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValueCommitment(Point);

impl ValueCommitment {
    /// `[value] V + [rcv] R`
    pub fn derive(value: ValueSum, rcv: ValueCommitTrapdoor) -> Self {
        Self(value_base() * value.to_scalar() + trapdoor_base() * rcv.0)
    }

    /// Commitment to `value` with a zero trapdoor; used to strip the public
    /// value balance off the commitment sum.
    pub fn balance(value: ValueSum) -> Self {
        Self::derive(value, ValueCommitTrapdoor::zero())
    }

    pub fn identity() -> Self {
        Self(Point::zero())
    }

    pub fn inner(&self) -> Point {
        self.0
    }

    pub fn to_affine(&self) -> AffinePoint {
        self.0.into_affine()
    }

    pub fn to_bytes(&self) -> [u8; 32] {
        point_to_bytes(&self.0)
    }

    pub fn from_bytes(bytes: &[u8; 32]) -> Option<Self> {
        point_from_bytes(bytes).map(Self)
    }
}

impl Add for ValueCommitment {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self(self.0 + rhs.0)
    }
}

impl Sub for ValueCommitment {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self(self.0 - rhs.0)
    }
}

impl Neg for ValueCommitment {
    type Output = Self;

    fn neg(self) -> Self {
        Self(-self.0)
    }
}

impl Sum for ValueCommitment {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::identity(), |acc, cv| acc + cv)
    }
}
