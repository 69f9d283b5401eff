//! Action Circuit
//!
//! R1CS form of the action relation over BLS12-381 `Fr` (the Jubjub base
//! field). Jubjub arithmetic uses the twisted Edwards gadgets, hashes use the
//! Poseidon sponge gadget with the shared configuration.
//!
//! Public inputs are allocated in the order of
//! [`ActionInstance::to_public_inputs`](crate::ActionInstance::to_public_inputs).

use ark_ec::AffineRepr;
use ark_ed_on_bls12_381::constraints::EdwardsVar;
use ark_ff::PrimeField;
use ark_r1cs_std::{alloc::AllocVar, boolean::Boolean, eq::EqGadget, fields::fp::FpVar, prelude::*};
use ark_relations::r1cs::{ConstraintSynthesizer, ConstraintSystemRef, SynthesisError};
use shroud_privacy::merkle::TREE_DEPTH;
use shroud_privacy::value::{trapdoor_base, value_base};
use shroud_privacy::{AffinePoint, Base, Point, Scalar, poseidon};

use super::gadgets::{
    enforce_zero_unless, field_bits, hash_with_domain, merkle_root, pack_bits, u32_bits, u64_bits,
    witness_bits,
};
use crate::instance::{ActionInstance, ActionWitness};

const VALUE_BITS: usize = 64;
const SCALAR_BITS: usize = Scalar::MODULUS_BIT_SIZE as usize;

/// Circuit assignment. Every field is `None` for the blank circuit used at
/// setup; constraint shape never depends on the values.
#[derive(Clone, Debug, Default)]
pub struct ActionCircuit {
    // --- Public Inputs ---
    anchor: Option<Base>,
    cv_net: Option<AffinePoint>,
    nf: Option<Base>,
    rk: Option<AffinePoint>,
    cmx: Option<Base>,
    enable_spend: Option<bool>,
    enable_output: Option<bool>,

    // --- Private Witness ---
    ak: Option<AffinePoint>,
    nk: Option<Base>,
    v_old: Option<u64>,
    rho_old: Option<Base>,
    rcm_old: Option<Base>,
    position: Option<u32>,
    auth_path: Option<[Base; TREE_DEPTH]>,
    alpha: Option<Scalar>,
    owner_new: Option<Base>,
    v_new: Option<u64>,
    rcm_new: Option<Base>,
    rcv: Option<Scalar>,
}

impl ActionCircuit {
    /// Circuit with no assignment, for key generation.
    pub fn blank() -> Self {
        Self::default()
    }

    pub fn new(instance: &ActionInstance, witness: &ActionWitness) -> Self {
        Self {
            anchor: Some(instance.anchor.inner()),
            cv_net: Some(instance.cv_net.to_affine()),
            nf: Some(instance.nf.inner()),
            rk: Some(instance.rk.to_affine()),
            cmx: Some(instance.cmx.inner()),
            enable_spend: Some(instance.enable_spend),
            enable_output: Some(instance.enable_output),

            ak: Some(witness.ak.to_affine()),
            nk: Some(witness.nk.inner()),
            v_old: Some(witness.spent.value().as_u64()),
            rho_old: Some(witness.spent.rho().inner()),
            rcm_old: Some(witness.spent.rcm()),
            position: Some(witness.path.position()),
            auth_path: Some(*witness.path.auth_path()),
            alpha: Some(witness.alpha),
            owner_new: Some(witness.output.recipient().owner()),
            v_new: Some(witness.output.value().as_u64()),
            rcm_new: Some(witness.output.rcm()),
            rcv: Some(witness.rcv.inner()),
        }
    }
}

fn input_fp(
    cs: &ConstraintSystemRef<Base>,
    v: Option<Base>,
) -> Result<FpVar<Base>, SynthesisError> {
    FpVar::new_input(cs.clone(), || v.ok_or(SynthesisError::AssignmentMissing))
}

fn witness_fp(
    cs: &ConstraintSystemRef<Base>,
    v: Option<Base>,
) -> Result<FpVar<Base>, SynthesisError> {
    FpVar::new_witness(cs.clone(), || v.ok_or(SynthesisError::AssignmentMissing))
}

impl ConstraintSynthesizer<Base> for ActionCircuit {
    fn generate_constraints(self, cs: ConstraintSystemRef<Base>) -> Result<(), SynthesisError> {
        // === Allocate Public Inputs ===
        let anchor = input_fp(&cs, self.anchor)?;
        let cv_x = input_fp(&cs, self.cv_net.map(|p| p.x))?;
        let cv_y = input_fp(&cs, self.cv_net.map(|p| p.y))?;
        let nf = input_fp(&cs, self.nf)?;
        let rk_x = input_fp(&cs, self.rk.map(|p| p.x))?;
        let rk_y = input_fp(&cs, self.rk.map(|p| p.y))?;
        let cmx = input_fp(&cs, self.cmx)?;
        let enable_spend = Boolean::new_input(cs.clone(), || {
            self.enable_spend.ok_or(SynthesisError::AssignmentMissing)
        })?;
        let enable_output = Boolean::new_input(cs.clone(), || {
            self.enable_output.ok_or(SynthesisError::AssignmentMissing)
        })?;

        // === Allocate Private Witness ===
        let ak = EdwardsVar::new_witness(cs.clone(), || {
            self.ak
                .map(Point::from)
                .ok_or(SynthesisError::AssignmentMissing)
        })?;
        let nk = witness_fp(&cs, self.nk)?;
        let rho_old = witness_fp(&cs, self.rho_old)?;
        let rcm_old = witness_fp(&cs, self.rcm_old)?;
        let owner_new = witness_fp(&cs, self.owner_new)?;
        let rcm_new = witness_fp(&cs, self.rcm_new)?;
        let siblings = (0..TREE_DEPTH)
            .map(|i| witness_fp(&cs, self.auth_path.map(|p| p[i])))
            .collect::<Result<Vec<_>, _>>()?;

        let v_old_bits = witness_bits(cs.clone(), self.v_old.map(u64_bits), VALUE_BITS)?;
        let v_new_bits = witness_bits(cs.clone(), self.v_new.map(u64_bits), VALUE_BITS)?;
        let position_bits = witness_bits(cs.clone(), self.position.map(u32_bits), TREE_DEPTH)?;
        let alpha_bits = witness_bits(cs.clone(), self.alpha.map(|a| field_bits(&a)), SCALAR_BITS)?;
        let rcv_bits = witness_bits(cs.clone(), self.rcv.map(|r| field_bits(&r)), SCALAR_BITS)?;

        let v_old = pack_bits(&v_old_bits);
        let v_new = pack_bits(&v_new_bits);

        // 1. Spent note owner is bound to (ak, nk)
        let owner_old = hash_with_domain(
            cs.clone(),
            poseidon::ADDRESS_DOMAIN,
            &[ak.x.clone(), nk.clone()],
        )?;

        // 2. Spent note commitment
        let cm_old = hash_with_domain(
            cs.clone(),
            poseidon::NOTE_COMMIT_DOMAIN,
            &[v_old.clone(), owner_old, rho_old.clone(), rcm_old],
        )?;

        // 3. Membership, skipped for zero-valued spends
        let root = merkle_root(cs.clone(), &cm_old, &siblings, &position_bits)?;
        let is_real_spend = v_old.is_neq(&FpVar::zero())?;
        root.conditional_enforce_equal(&anchor, &is_real_spend)?;

        // 4. Nullifier
        let nf_computed = hash_with_domain(
            cs.clone(),
            poseidon::NULLIFIER_DOMAIN,
            &[nk, rho_old, cm_old],
        )?;
        nf_computed.enforce_equal(&nf)?;

        // 5. Spend authority: rk = ak + [alpha] G
        let spend_auth_base = EdwardsVar::constant(AffinePoint::generator().into_group());
        let rk = ak + spend_auth_base.scalar_mul_le(alpha_bits.iter())?;
        rk.x.enforce_equal(&rk_x)?;
        rk.y.enforce_equal(&rk_y)?;

        // 6. Output note commitment, with rho = nf
        let cmx_computed = hash_with_domain(
            cs.clone(),
            poseidon::NOTE_COMMIT_DOMAIN,
            &[v_new.clone(), owner_new, nf, rcm_new],
        )?;
        cmx_computed.enforce_equal(&cmx)?;

        // 7. Value commitment: cv = [v_old] V - [v_new] V + [rcv] R
        let v_base = EdwardsVar::constant(value_base());
        let r_base = EdwardsVar::constant(trapdoor_base());
        let cv = v_base.scalar_mul_le(v_old_bits.iter())? - v_base.scalar_mul_le(v_new_bits.iter())?
            + r_base.scalar_mul_le(rcv_bits.iter())?;
        cv.x.enforce_equal(&cv_x)?;
        cv.y.enforce_equal(&cv_y)?;

        // 8. Flags
        enforce_zero_unless(&v_old, &enable_spend)?;
        enforce_zero_unless(&v_new, &enable_output)?;

        Ok(())
    }
}
