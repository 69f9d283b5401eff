//! In-circuit counterparts of the native hash, tree and scalar helpers.
//!
//! Every gadget absorbs exactly the elements its native twin in
//! `shroud_privacy` absorbs, in the same order.

use ark_crypto_primitives::sponge::{
    constraints::CryptographicSpongeVar, poseidon::constraints::PoseidonSpongeVar,
};
use ark_ff::{AdditiveGroup, BigInteger, Field, PrimeField};
use ark_r1cs_std::{
    alloc::AllocVar, boolean::Boolean, eq::EqGadget, fields::fp::FpVar, prelude::*,
    select::CondSelectGadget,
};
use ark_relations::r1cs::{ConstraintSystemRef, SynthesisError};
use shroud_privacy::{Base, poseidon};

/// Poseidon over `inputs`, squeezing one element.
pub fn hash(
    cs: ConstraintSystemRef<Base>,
    inputs: &[FpVar<Base>],
) -> Result<FpVar<Base>, SynthesisError> {
    let mut sponge = PoseidonSpongeVar::new(cs, poseidon::config());
    sponge.absorb(&inputs)?;
    let mut result = sponge.squeeze_field_elements(1)?;
    Ok(result.remove(0))
}

/// Poseidon(domain, inputs...)
pub fn hash_with_domain(
    cs: ConstraintSystemRef<Base>,
    domain: u64,
    inputs: &[FpVar<Base>],
) -> Result<FpVar<Base>, SynthesisError> {
    let mut all = Vec::with_capacity(inputs.len() + 1);
    all.push(FpVar::constant(Base::from(domain)));
    all.extend_from_slice(inputs);
    hash(cs, &all)
}

/// Recompute the tree root from a leaf, its siblings and its position bits
/// (leaf to root, true = current node is the right child).
pub fn merkle_root(
    cs: ConstraintSystemRef<Base>,
    leaf: &FpVar<Base>,
    siblings: &[FpVar<Base>],
    position_bits: &[Boolean<Base>],
) -> Result<FpVar<Base>, SynthesisError> {
    let mut current = leaf.clone();

    for (sibling, is_right) in siblings.iter().zip(position_bits) {
        // If is_right, hash(sibling, current), else hash(current, sibling)
        let left = FpVar::conditionally_select(is_right, sibling, &current)?;
        let right = FpVar::conditionally_select(is_right, &current, sibling)?;
        current = hash(cs.clone(), &[left, right])?;
    }

    Ok(current)
}

/// Allocate `len` little-endian witness bits. `bits` is `None` during setup.
pub fn witness_bits(
    cs: ConstraintSystemRef<Base>,
    bits: Option<Vec<bool>>,
    len: usize,
) -> Result<Vec<Boolean<Base>>, SynthesisError> {
    (0..len)
        .map(|i| {
            Boolean::new_witness(cs.clone(), || {
                bits.as_ref()
                    .and_then(|b| b.get(i).copied())
                    .ok_or(SynthesisError::AssignmentMissing)
            })
        })
        .collect()
}

/// Little-endian bits of a `u64`.
pub fn u64_bits(v: u64) -> Vec<bool> {
    (0..64).map(|i| (v >> i) & 1 == 1).collect()
}

/// Little-endian bits of a `u32`.
pub fn u32_bits(v: u32) -> Vec<bool> {
    (0..32).map(|i| (v >> i) & 1 == 1).collect()
}

/// The low `MODULUS_BIT_SIZE` little-endian bits of a prime field element.
pub fn field_bits<F: PrimeField>(f: &F) -> Vec<bool> {
    let mut bits = f.into_bigint().to_bits_le();
    bits.truncate(F::MODULUS_BIT_SIZE as usize);
    bits
}

/// Pack little-endian bits into a field element: `sum(bit_i * 2^i)`.
pub fn pack_bits(bits: &[Boolean<Base>]) -> FpVar<Base> {
    let mut acc = FpVar::zero();
    let mut coeff = Base::ONE;
    for bit in bits {
        acc += FpVar::from(bit.clone()) * coeff;
        coeff.double_in_place();
    }
    acc
}

/// Enforce `value == 0` unless `enabled`.
pub fn enforce_zero_unless(
    value: &FpVar<Base>,
    enabled: &Boolean<Base>,
) -> Result<(), SynthesisError> {
    let disabled = FpVar::one() - FpVar::from(enabled.clone());
    (value * disabled).enforce_equal(&FpVar::zero())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ark_r1cs_std::R1CSVar;
    use ark_relations::r1cs::ConstraintSystem;
    use shroud_privacy::{CommitmentTree, NoteCommitment};

    #[test]
    fn test_hash_matches_native() {
        let cs = ConstraintSystem::<Base>::new_ref();
        let a = Base::from(7u64);
        let b = Base::from(11u64);

        let a_var = FpVar::new_witness(cs.clone(), || Ok(a)).unwrap();
        let b_var = FpVar::new_witness(cs.clone(), || Ok(b)).unwrap();
        let out =
            hash_with_domain(cs.clone(), poseidon::NULLIFIER_DOMAIN, &[a_var, b_var]).unwrap();

        assert_eq!(
            out.value().unwrap(),
            poseidon::hash(&[Base::from(poseidon::NULLIFIER_DOMAIN), a, b])
        );
        assert!(cs.is_satisfied().unwrap());
    }

    #[test]
    fn test_merkle_root_matches_native() {
        let mut tree = CommitmentTree::new();
        for i in 0..5u64 {
            tree.append(&NoteCommitment::from_field(Base::from(i + 100))).unwrap();
        }
        let path = tree.path(3).unwrap();
        let leaf = tree.get(3).unwrap();

        let cs = ConstraintSystem::<Base>::new_ref();
        let leaf_var = FpVar::new_witness(cs.clone(), || Ok(leaf.inner())).unwrap();
        let siblings: Vec<_> = path
            .auth_path()
            .iter()
            .map(|s| FpVar::new_witness(cs.clone(), || Ok(*s)).unwrap())
            .collect();
        let bits = witness_bits(cs.clone(), Some(u32_bits(path.position())), 32).unwrap();

        let root = merkle_root(cs.clone(), &leaf_var, &siblings, &bits).unwrap();
        assert_eq!(root.value().unwrap(), tree.root().inner());
        assert!(cs.is_satisfied().unwrap());
    }

    #[test]
    fn test_pack_bits() {
        let cs = ConstraintSystem::<Base>::new_ref();
        let bits = witness_bits(cs.clone(), Some(u64_bits(1000)), 64).unwrap();
        assert_eq!(pack_bits(&bits).value().unwrap(), Base::from(1000u64));
    }

    #[test]
    fn test_enforce_zero_unless() {
        let cs = ConstraintSystem::<Base>::new_ref();
        let value = FpVar::new_witness(cs.clone(), || Ok(Base::from(5u64))).unwrap();
        let disabled = Boolean::new_witness(cs.clone(), || Ok(false)).unwrap();

        enforce_zero_unless(&value, &disabled).unwrap();
        assert!(!cs.is_satisfied().unwrap(), "nonzero value with flag off");
    }
}
