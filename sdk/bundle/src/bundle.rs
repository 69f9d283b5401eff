//! Type-state bundle: `Unauthorized -> Prepared -> Proven -> Authorized`.
//!
//! Each state is a distinct type, so calling an operation out of order does
//! not compile. [`PendingBundle`](crate::PendingBundle) offers the same
//! transitions with runtime checks.

use std::fmt;
use std::time::Instant;

use rayon::prelude::*;
use shroud_privacy::redjubjub::{Binding, Signature, SigningKey, SpendAuth, VerificationKey};
use shroud_privacy::{
    Anchor, RandomnessSource, Scalar, SpendAuthorizingKey, ValueCommitTrapdoor, ValueCommitment,
    ValueSum,
};
use shroud_prover::{ActionInstance, ActionWitness, ProofComponent, ProverError, ProvingKey};

use crate::action::{Action, ActionSecrets};
use crate::error::{BundleError, Result};
use crate::flags::Flags;
use crate::proof::Proof;

/// Authorization state of a bundle.
pub trait Authorization: fmt::Debug + Clone {
    /// What each action carries towards its spend authorization.
    type SpendAuth: fmt::Debug + Clone;
}

/// Freshly built: trapdoors drawn, nothing randomized or signed.
#[derive(Debug, Clone)]
pub struct Unauthorized {
    pub(crate) secrets: Vec<ActionSecrets>,
}

impl Authorization for Unauthorized {
    type SpendAuth = ();
}

/// Bound to a sighash, `rk` fixed for every action.
#[derive(Debug, Clone)]
pub struct Prepared {
    sighash: [u8; 32],
    secrets: Vec<ActionSecrets>,
}

impl Authorization for Prepared {
    type SpendAuth = SigningParts;
}

/// Every action proven; the witness has been dropped.
#[derive(Debug, Clone)]
pub struct Proven {
    sighash: [u8; 32],
    proof: Proof,
    bsk: ValueCommitTrapdoor,
}

impl Authorization for Proven {
    type SpendAuth = SigningParts;
}

/// Terminal state
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Authorized {
    pub(crate) proof: Proof,
    pub(crate) binding_signature: Signature<Binding>,
}

impl Authorization for Authorized {
    type SpendAuth = AuthorizedSpend;
}

/// Randomizer and (once attached) signature for one action's spend.
#[derive(Debug, Clone, Copy)]
pub struct SigningParts {
    rk: VerificationKey<SpendAuth>,
    alpha: Scalar,
    signature: Option<Signature<SpendAuth>>,
}

impl SigningParts {
    pub fn rk(&self) -> &VerificationKey<SpendAuth> {
        &self.rk
    }

    /// Randomizer an external signer needs to derive `rsk = ask + alpha`.
    pub fn alpha(&self) -> &Scalar {
        &self.alpha
    }

    pub fn signature(&self) -> Option<&Signature<SpendAuth>> {
        self.signature.as_ref()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthorizedSpend {
    pub(crate) rk: VerificationKey<SpendAuth>,
    pub(crate) signature: Signature<SpendAuth>,
}

impl AuthorizedSpend {
    pub fn rk(&self) -> &VerificationKey<SpendAuth> {
        &self.rk
    }

    pub fn signature(&self) -> &Signature<SpendAuth> {
        &self.signature
    }
}

#[derive(Debug, Clone)]
pub struct Bundle<A: Authorization> {
    pub(crate) actions: Vec<Action<A::SpendAuth>>,
    pub(crate) flags: Flags,
    pub(crate) value_balance: i64,
    pub(crate) anchor: Anchor,
    pub(crate) authorization: A,
}

impl<A: Authorization> Bundle<A> {
    pub fn actions(&self) -> &[Action<A::SpendAuth>] {
        &self.actions
    }

    pub fn flags(&self) -> Flags {
        self.flags
    }

    /// Net value leaving the shielded pool: spends minus outputs.
    pub fn value_balance(&self) -> i64 {
        self.value_balance
    }

    pub fn anchor(&self) -> &Anchor {
        &self.anchor
    }

    pub fn authorization(&self) -> &A {
        &self.authorization
    }

    /// `bvk = sum(cv_net) - [value_balance] V`
    pub fn binding_validating_key(&self) -> VerificationKey<Binding> {
        let cv_sum: ValueCommitment = self.actions.iter().map(|a| *a.cv_net()).sum();
        let balance = ValueCommitment::balance(ValueSum::from_raw(self.value_balance));
        VerificationKey::from_point((cv_sum - balance).inner())
    }

    fn instance(
        &self,
        action: &Action<A::SpendAuth>,
        rk: VerificationKey<SpendAuth>,
    ) -> ActionInstance {
        ActionInstance {
            anchor: self.anchor,
            cv_net: *action.cv_net(),
            nf: *action.nullifier(),
            rk,
            cmx: *action.cmx(),
            enable_spend: self.flags.spends_enabled(),
            enable_output: self.flags.outputs_enabled(),
        }
    }
}

impl Bundle<Unauthorized> {
    pub(crate) fn from_parts(
        actions: Vec<Action<()>>,
        secrets: Vec<ActionSecrets>,
        flags: Flags,
        value_balance: i64,
        anchor: Anchor,
    ) -> Self {
        Self {
            actions,
            flags,
            value_balance,
            anchor,
            authorization: Unauthorized { secrets },
        }
    }

    pub fn secrets(&self) -> &[ActionSecrets] {
        &self.authorization.secrets
    }

    /// Bind the bundle to `sighash`: draw a randomizer per action, derive
    /// `rk`, and sign every dummy spend.
    pub fn prepare<R: RandomnessSource + ?Sized>(
        self,
        rng: &mut R,
        sighash: [u8; 32],
    ) -> Bundle<Prepared> {
        let secrets = self.authorization.secrets;
        let actions: Vec<_> = self
            .actions
            .into_iter()
            .zip(&secrets)
            .map(|(action, secret)| {
                let alpha: Scalar = rng.next_scalar();
                let rk = secret.fvk.ak().randomize(&alpha);
                let signature = secret
                    .dummy_ask
                    .and_then(|ask| ask.randomize(&alpha))
                    .map(|rsk| rsk.sign(rng, &sighash));
                action.map(|()| SigningParts {
                    rk,
                    alpha,
                    signature,
                })
            })
            .collect();

        tracing::debug!(actions = actions.len(), "Prepared bundle");

        Bundle {
            actions,
            flags: self.flags,
            value_balance: self.value_balance,
            anchor: self.anchor,
            authorization: Prepared { sighash, secrets },
        }
    }

    pub fn serialized(&self) -> Result<Vec<u8>> {
        Err(BundleError::NotFinalized)
    }
}

/// Sign every action whose `rk` randomizes the key of `ask`.
fn sign_actions<R: RandomnessSource + ?Sized>(
    actions: &mut [Action<SigningParts>],
    rng: &mut R,
    ask: &SpendAuthorizingKey,
    sighash: &[u8; 32],
) -> usize {
    let ak = ask.validating_key();
    let mut signed = 0;
    for action in actions.iter_mut() {
        let parts = action.authorization_mut();
        if ak.randomize(&parts.alpha) != parts.rk {
            continue;
        }
        if let Some(rsk) = ask.randomize(&parts.alpha) {
            parts.signature = Some(rsk.sign(rng, sighash));
            signed += 1;
        }
    }
    signed
}

/// Attach externally produced signatures. Nothing is attached unless every
/// signature verifies against some action.
fn append_to_actions(
    actions: &mut [Action<SigningParts>],
    sighash: &[u8; 32],
    signatures: &[Signature<SpendAuth>],
) -> Result<()> {
    let mut matched = Vec::with_capacity(signatures.len());
    for signature in signatures {
        let index = actions
            .iter()
            .position(|a| a.authorization().rk.verify(sighash, signature))
            .ok_or(BundleError::InvalidSignature)?;
        matched.push((index, *signature));
    }
    for (index, signature) in matched {
        actions[index].authorization_mut().signature = Some(signature);
    }
    Ok(())
}

struct ProvingJob {
    index: usize,
    instance: ActionInstance,
    witness: ActionWitness,
    seed: [u8; 32],
}

impl Bundle<Prepared> {
    pub fn sighash(&self) -> &[u8; 32] {
        &self.authorization.sighash
    }

    /// Sign the spends belonging to `ask`. Returns how many were signed.
    pub fn sign<R: RandomnessSource + ?Sized>(
        &mut self,
        rng: &mut R,
        ask: &SpendAuthorizingKey,
    ) -> usize {
        let sighash = self.authorization.sighash;
        sign_actions(&mut self.actions, rng, ask, &sighash)
    }

    pub fn append_signatures(&mut self, signatures: &[Signature<SpendAuth>]) -> Result<()> {
        let sighash = self.authorization.sighash;
        append_to_actions(&mut self.actions, &sighash, signatures)
    }

    /// Public statement of every action, in action order.
    pub fn instances(&self) -> Vec<ActionInstance> {
        self.actions
            .iter()
            .map(|a| self.instance(a, a.authorization().rk))
            .collect()
    }

    /// Prove every action on the rayon pool.
    ///
    /// Each action gets its own 32-byte seed, drawn from `rng` in action
    /// order before any work is handed out. A failure consumes the bundle.
    pub fn create_proof<R: RandomnessSource + ?Sized>(
        self,
        pk: &ProvingKey,
        rng: &mut R,
    ) -> Result<Bundle<Proven>> {
        let start = Instant::now();

        let jobs: Vec<ProvingJob> = self
            .actions
            .iter()
            .zip(&self.authorization.secrets)
            .enumerate()
            .map(|(index, (action, secret))| {
                let parts = action.authorization();
                ProvingJob {
                    index,
                    instance: self.instance(action, parts.rk),
                    witness: ActionWitness {
                        spent: secret.spent,
                        ak: *secret.fvk.ak(),
                        nk: *secret.fvk.nk(),
                        alpha: parts.alpha,
                        path: secret.path.clone(),
                        output: secret.output,
                        rcv: secret.rcv,
                    },
                    seed: rng.next_array(),
                }
            })
            .collect();

        let prover = pk.prover();
        let prove_all = || -> Vec<(usize, std::result::Result<ProofComponent, ProverError>)> {
            jobs.par_iter()
                .map(|job| (job.index, prover.prove(&job.instance, &job.witness, job.seed)))
                .collect()
        };

        let mut results = match pk.worker_threads() {
            Some(threads) => rayon::ThreadPoolBuilder::new()
                .num_threads(threads)
                .build()
                .map_err(|e| BundleError::WorkerPool(e.to_string()))?
                .install(prove_all),
            None => prove_all(),
        };
        results.sort_by_key(|(index, _)| *index);

        let components = results
            .into_iter()
            .map(|(index, result)| {
                result.map_err(|source| {
                    tracing::warn!("Proof generation failed for action {}: {}", index, source);
                    BundleError::ProofGenerationFailed { index, source }
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let bsk: ValueCommitTrapdoor = self.authorization.secrets.iter().map(|s| s.rcv).sum();

        tracing::info!(
            actions = components.len(),
            backend = pk.backend_name(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Bundle proven"
        );

        Ok(Bundle {
            actions: self.actions,
            flags: self.flags,
            value_balance: self.value_balance,
            anchor: self.anchor,
            authorization: Proven {
                sighash: self.authorization.sighash,
                proof: Proof::from_components(components),
                bsk,
            },
        })
    }

    pub fn serialized(&self) -> Result<Vec<u8>> {
        Err(BundleError::NotFinalized)
    }
}

impl Bundle<Proven> {
    pub fn sighash(&self) -> &[u8; 32] {
        &self.authorization.sighash
    }

    pub fn proof(&self) -> &Proof {
        &self.authorization.proof
    }

    pub fn sign<R: RandomnessSource + ?Sized>(
        &mut self,
        rng: &mut R,
        ask: &SpendAuthorizingKey,
    ) -> usize {
        let sighash = self.authorization.sighash;
        sign_actions(&mut self.actions, rng, ask, &sighash)
    }

    pub fn append_signatures(&mut self, signatures: &[Signature<SpendAuth>]) -> Result<()> {
        let sighash = self.authorization.sighash;
        append_to_actions(&mut self.actions, &sighash, signatures)
    }

    /// Produce the binding signature. The proven bundle is left as it was,
    /// so a missing spend signature can still be supplied afterwards.
    pub fn finalize(&self) -> Result<Bundle<Authorized>> {
        let missing = self
            .actions
            .iter()
            .filter(|a| a.authorization().signature.is_none())
            .count();
        if missing > 0 {
            return Err(BundleError::MissingSignatures(missing));
        }

        let bsk = SigningKey::<Binding>::from_scalar(self.authorization.bsk.inner())
            .ok_or(BundleError::BindingKeyMismatch)?;
        if bsk.verification_key() != self.binding_validating_key() {
            return Err(BundleError::BindingKeyMismatch);
        }
        let binding_signature = bsk.sign_deterministic(&self.authorization.sighash);

        let actions = self
            .actions
            .iter()
            .cloned()
            .map(|action| {
                let parts = *action.authorization();
                let signature = parts.signature.ok_or(BundleError::MissingSignatures(1))?;
                Ok(action.map(|_| AuthorizedSpend {
                    rk: parts.rk,
                    signature,
                }))
            })
            .collect::<Result<Vec<_>>>()?;

        tracing::info!(
            actions = actions.len(),
            value_balance = self.value_balance,
            "Bundle authorized"
        );

        Ok(Bundle {
            actions,
            flags: self.flags,
            value_balance: self.value_balance,
            anchor: self.anchor,
            authorization: Authorized {
                proof: self.authorization.proof.clone(),
                binding_signature,
            },
        })
    }

    pub fn serialized(&self) -> Result<Vec<u8>> {
        Err(BundleError::NotFinalized)
    }
}

impl Bundle<Authorized> {
    pub fn proof(&self) -> &Proof {
        &self.authorization.proof
    }

    pub fn binding_signature(&self) -> &Signature<Binding> {
        &self.authorization.binding_signature
    }

    /// Public statement of every action, in action order.
    pub fn instances(&self) -> Vec<ActionInstance> {
        self.actions
            .iter()
            .map(|a| self.instance(a, a.authorization().rk))
            .collect()
    }

    pub fn verify_binding(&self, sighash: &[u8; 32]) -> bool {
        self.binding_validating_key()
            .verify(sighash, &self.authorization.binding_signature)
    }

    pub fn verify_spend_auths(&self, sighash: &[u8; 32]) -> bool {
        self.actions.iter().all(|a| {
            let spend = a.authorization();
            spend.rk.verify(sighash, &spend.signature)
        })
    }

    pub fn verify_proof(&self, pk: &ProvingKey) -> bool {
        let proof = &self.authorization.proof;
        proof.len() == self.actions.len()
            && self
                .instances()
                .iter()
                .zip(proof.components())
                .all(|(instance, component)| pk.verify_component(instance, component))
    }

    /// Every signature and every proof component.
    pub fn verify(&self, pk: &ProvingKey, sighash: &[u8; 32]) -> bool {
        self.verify_binding(sighash) && self.verify_spend_auths(sighash) && self.verify_proof(pk)
    }

    /// Canonical encoding.
    pub fn serialized(&self) -> Result<Vec<u8>> {
        Ok(self.to_bytes())
    }
}

impl PartialEq for Bundle<Authorized> {
    fn eq(&self, other: &Self) -> bool {
        self.actions == other.actions
            && self.flags == other.flags
            && self.value_balance == other.value_balance
            && self.anchor == other.anchor
            && self.authorization == other.authorization
    }
}

impl Eq for Bundle<Authorized> {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::Builder;
    use crate::descriptor::OutputDescriptor;
    use shroud_privacy::keys::random_address;
    use shroud_privacy::{NoteValue, SeededRandomness};

    const SIGHASH: [u8; 32] = [0x5a; 32];

    fn output_only_bundle(rng: &mut SeededRandomness, values: &[u64]) -> Bundle<Unauthorized> {
        let mut builder = Builder::new(Flags::ENABLED, Anchor::empty());
        for value in values {
            builder
                .add_output(OutputDescriptor::new(
                    None,
                    random_address(rng),
                    NoteValue::new(*value),
                    None,
                ))
                .unwrap();
        }
        builder.build(rng).unwrap().0
    }

    #[test]
    fn test_prepare_signs_dummy_spends() {
        let mut rng = SeededRandomness::from_seed([20u8; 32]);
        let prepared = output_only_bundle(&mut rng, &[10, 20]).prepare(&mut rng, SIGHASH);

        assert_eq!(prepared.sighash(), &SIGHASH);
        for action in prepared.actions() {
            let parts = action.authorization();
            let signature = parts.signature().expect("dummy spend signed at prepare");
            assert!(parts.rk().verify(&SIGHASH, signature));
        }
    }

    #[test]
    fn test_full_lifecycle_with_mock_prover() {
        let mut rng = SeededRandomness::from_seed([21u8; 32]);
        let pk = ProvingKey::mock();

        let bundle = output_only_bundle(&mut rng, &[1000])
            .prepare(&mut rng, SIGHASH)
            .create_proof(&pk, &mut rng)
            .unwrap()
            .finalize()
            .unwrap();

        assert_eq!(bundle.value_balance(), -1000);
        assert_eq!(bundle.proof().len(), bundle.actions().len());
        assert!(bundle.verify(&pk, &SIGHASH));
        assert!(!bundle.verify_binding(&[0u8; 32]), "bound to the sighash");
    }

    #[test]
    fn test_dedicated_worker_pool() {
        let prove_with = |pk: &ProvingKey| {
            let mut rng = SeededRandomness::from_seed([22u8; 32]);
            output_only_bundle(&mut rng, &[1, 2, 3])
                .prepare(&mut rng, SIGHASH)
                .create_proof(pk, &mut rng)
                .unwrap()
        };

        let dedicated = prove_with(&ProvingKey::mock().with_worker_threads(Some(2)));
        let global = prove_with(&ProvingKey::mock());
        assert_eq!(dedicated.proof().len(), 3);
        assert_eq!(dedicated.proof(), global.proof(), "pool size must not change proofs");
        assert_eq!(
            dedicated.finalize().unwrap().to_bytes(),
            global.finalize().unwrap().to_bytes()
        );
    }

    #[test]
    fn test_tampered_cv_fails_finalize() {
        let mut rng = SeededRandomness::from_seed([23u8; 32]);
        let pk = ProvingKey::mock();

        let mut proven = output_only_bundle(&mut rng, &[50])
            .prepare(&mut rng, SIGHASH)
            .create_proof(&pk, &mut rng)
            .unwrap();
        let tampered =
            *proven.actions[0].cv_net() + ValueCommitment::balance(ValueSum::from_raw(1));
        proven.actions[0].set_cv_net(tampered);

        assert_eq!(proven.finalize(), Err(BundleError::BindingKeyMismatch));
    }

    #[test]
    fn test_append_rejects_foreign_signature() {
        let mut rng = SeededRandomness::from_seed([24u8; 32]);
        let mut prepared = output_only_bundle(&mut rng, &[5]).prepare(&mut rng, SIGHASH);

        let stranger = SigningKey::<SpendAuth>::random(&mut rng);
        let signature = stranger.sign(&mut rng, &SIGHASH);
        assert_eq!(
            prepared.append_signatures(&[signature]),
            Err(BundleError::InvalidSignature)
        );
    }

    #[test]
    fn test_append_accepts_matching_signature() {
        let mut rng = SeededRandomness::from_seed([25u8; 32]);
        let mut prepared = output_only_bundle(&mut rng, &[5]).prepare(&mut rng, SIGHASH);

        // Re-sign the dummy out of band and append the result
        let parts = *prepared.actions()[0].authorization();
        let ask = prepared.authorization.secrets[0].dummy_ask.unwrap();
        let rsk = ask.randomize(&parts.alpha).unwrap();
        let signature = rsk.sign(&mut rng, &SIGHASH);

        prepared.append_signatures(&[signature]).unwrap();
        assert_eq!(prepared.actions()[0].authorization().signature(), Some(&signature));
    }

    #[test]
    fn test_unfinished_states_do_not_serialize() {
        let mut rng = SeededRandomness::from_seed([26u8; 32]);
        let bundle = output_only_bundle(&mut rng, &[5]);
        assert_eq!(bundle.serialized(), Err(BundleError::NotFinalized));

        let prepared = bundle.prepare(&mut rng, SIGHASH);
        assert_eq!(prepared.serialized(), Err(BundleError::NotFinalized));

        let proven = prepared.create_proof(&ProvingKey::mock(), &mut rng).unwrap();
        assert_eq!(proven.serialized(), Err(BundleError::NotFinalized));
    }
}
