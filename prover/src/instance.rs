//! Action Relation
//!
//! Public statement and private witness of a single action, and the native
//! evaluation of the relation between them.
//!
//! ```text
//! Public Inputs:
//!   anchor, cv_net (x, y), nf, rk (x, y), cmx, enable_spend, enable_output
//!
//! Private Witness:
//!   spent note, ak, nk, alpha, merkle path, output note, rcv
//!
//! Relation:
//!   owner(spent) = Poseidon(ADDRESS, ak.x, nk)
//!   cm_old       = Poseidon(CM, v_old, owner, rho_old, rcm_old)
//!   v_old != 0  => path.root(cm_old) = anchor
//!   nf           = Poseidon(NF, nk, rho_old, cm_old)
//!   rk           = ak + [alpha] G_spend
//!   cmx          = Poseidon(CM, v_new, owner_new, nf, rcm_new)
//!   cv_net       = [v_old - v_new] V + [rcv] R
//!   !enable_spend => v_old = 0,  !enable_output => v_new = 0
//! ```

use shroud_privacy::keys::owner_commitment;
use shroud_privacy::redjubjub::{SpendAuth, VerificationKey};
use shroud_privacy::{
    Anchor, Base, MerklePath, Note, NoteCommitment, Nullifier, NullifierDerivingKey, Rho, Scalar,
    SpendValidatingKey, ValueCommitTrapdoor, ValueCommitment, ValueSum,
};

use crate::errors::{ProverError, Result};

/// Number of public inputs of the action circuit.
pub const NUM_PUBLIC_INPUTS: usize = 9;

/// Public statement proven for one action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActionInstance {
    pub anchor: Anchor,
    pub cv_net: ValueCommitment,
    pub nf: Nullifier,
    pub rk: VerificationKey<SpendAuth>,
    pub cmx: NoteCommitment,
    pub enable_spend: bool,
    pub enable_output: bool,
}

impl ActionInstance {
    /// Field elements in circuit allocation order.
    pub fn to_public_inputs(&self) -> Vec<Base> {
        let cv = self.cv_net.to_affine();
        let rk = self.rk.to_affine();
        vec![
            self.anchor.inner(),
            cv.x,
            cv.y,
            self.nf.inner(),
            rk.x,
            rk.y,
            self.cmx.inner(),
            Base::from(self.enable_spend),
            Base::from(self.enable_output),
        ]
    }

    /// Canonical byte encoding of the statement, used for transcripts.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(32 * 5 + 2);
        out.extend_from_slice(&self.anchor.to_bytes());
        out.extend_from_slice(&self.cv_net.to_bytes());
        out.extend_from_slice(&self.nf.to_bytes());
        out.extend_from_slice(&self.rk.to_bytes());
        out.extend_from_slice(&self.cmx.to_bytes());
        out.push(u8::from(self.enable_spend));
        out.push(u8::from(self.enable_output));
        out
    }
}

/// Private witness for one action.
#[derive(Debug, Clone)]
pub struct ActionWitness {
    pub spent: Note,
    pub ak: SpendValidatingKey,
    pub nk: NullifierDerivingKey,
    pub alpha: Scalar,
    pub path: MerklePath,
    pub output: Note,
    pub rcv: ValueCommitTrapdoor,
}

impl ActionWitness {
    /// Evaluate the action relation natively against `instance`.
    pub fn check(&self, instance: &ActionInstance) -> Result<()> {
        let owner = owner_commitment(&self.ak.to_affine(), &self.nk.inner());
        if owner != self.spent.recipient().owner() {
            return Err(invalid("spent note is not owned by (ak, nk)"));
        }

        let cm_old = self.spent.commitment();
        if !self.spent.value().is_zero() && !self.path.verify(&cm_old, &instance.anchor) {
            return Err(invalid("merkle path does not reach the anchor"));
        }

        let nf = Nullifier::derive(&self.nk, self.spent.rho().inner(), &cm_old);
        if nf != instance.nf {
            return Err(invalid("nullifier mismatch"));
        }

        if self.ak.randomize(&self.alpha) != instance.rk {
            return Err(invalid("randomized key mismatch"));
        }

        if self.output.rho() != Rho::from_nullifier(&nf) {
            return Err(invalid("output rho is not the action nullifier"));
        }
        if self.output.commitment() != instance.cmx {
            return Err(invalid("output commitment mismatch"));
        }

        let v_net = ValueSum::from_pair(self.spent.value(), self.output.value());
        if ValueCommitment::derive(v_net, self.rcv) != instance.cv_net {
            return Err(invalid("value commitment mismatch"));
        }

        if !instance.enable_spend && !self.spent.value().is_zero() {
            return Err(invalid("spend value with spends disabled"));
        }
        if !instance.enable_output && !self.output.value().is_zero() {
            return Err(invalid("output value with outputs disabled"));
        }

        Ok(())
    }
}

fn invalid(reason: &str) -> ProverError {
    ProverError::InvalidWitness(reason.into())
}


#[cfg(test)]
mod tests {
    use super::testing::honest_action;
    use super::*;
    use shroud_privacy::SeededRandomness;

    #[test]
    fn test_honest_witness_satisfies_relation() {
        let mut rng = SeededRandomness::from_seed([1u8; 32]);
        let (instance, witness) = honest_action(&mut rng, 500, 200);
        assert!(witness.check(&instance).is_ok());
    }

    #[test]
    fn test_public_inputs_layout() {
        let mut rng = SeededRandomness::from_seed([2u8; 32]);
        let (instance, _) = honest_action(&mut rng, 1, 1);
        let inputs = instance.to_public_inputs();

        assert_eq!(inputs.len(), NUM_PUBLIC_INPUTS);
        assert_eq!(inputs[0], instance.anchor.inner());
        assert_eq!(inputs[3], instance.nf.inner());
        assert_eq!(inputs[6], instance.cmx.inner());
        assert_eq!(inputs[7], Base::from(1u64));
        assert_eq!(inputs[8], Base::from(1u64));
    }

    #[test]
    fn test_wrong_anchor_rejected() {
        let mut rng = SeededRandomness::from_seed([3u8; 32]);
        let (mut instance, witness) = honest_action(&mut rng, 10, 10);
        instance.anchor = Anchor::empty();

        assert_eq!(
            witness.check(&instance),
            Err(ProverError::InvalidWitness(
                "merkle path does not reach the anchor".into()
            ))
        );
    }

    #[test]
    fn test_zero_value_spend_skips_membership() {
        let mut rng = SeededRandomness::from_seed([4u8; 32]);
        let (mut instance, witness) = honest_action(&mut rng, 0, 10);
        instance.anchor = Anchor::empty();

        assert!(witness.check(&instance).is_ok());
    }

    #[test]
    fn test_tampered_cv_rejected() {
        let mut rng = SeededRandomness::from_seed([5u8; 32]);
        let (mut instance, witness) = honest_action(&mut rng, 10, 3);
        instance.cv_net = instance.cv_net + ValueCommitment::balance(ValueSum::from_raw(1));

        assert!(witness.check(&instance).is_err());
    }

    #[test]
    fn test_flags_enforced() {
        let mut rng = SeededRandomness::from_seed([6u8; 32]);
        let (mut instance, witness) = honest_action(&mut rng, 10, 0);
        instance.enable_output = false;
        assert!(witness.check(&instance).is_ok(), "zero output allowed");

        instance.enable_spend = false;
        assert_eq!(
            witness.check(&instance),
            Err(ProverError::InvalidWitness(
                "spend value with spends disabled".into()
            ))
        );
    }
}
