//! Proving Backends
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                     ActionProver                              │
//! │                                                               │
//! │  prove(instance, witness, seed) ──► ProofComponent (192 B)    │
//! │  verify(instance, component)    ──► bool                      │
//! │                                                               │
//! │  ┌──────────────────────┐     ┌──────────────────────────┐    │
//! │  │ Groth16Prover        │     │ MockProver               │    │
//! │  │ BLS12-381, real ZK   │     │ native relation check +  │    │
//! │  │                      │     │ transcript hash          │    │
//! │  └──────────────────────┘     └──────────────────────────┘    │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! Both backends emit components of the same length, so a bundle's wire
//! encoding does not reveal which backend produced it.

use std::time::Instant;

use ark_bls12_381::Bls12_381;
use ark_groth16::{Groth16, PreparedVerifyingKey, Proof, ProvingKey, VerifyingKey};
use ark_serialize::{CanonicalDeserialize, CanonicalSerialize};
use ark_snark::SNARK;
use rand::rngs::StdRng;
use rand::{CryptoRng, RngCore, SeedableRng};

use crate::circuit::ActionCircuit;
use crate::errors::{ProverError, Result};
use crate::instance::{ActionInstance, ActionWitness};

/// Size of every proof component: a compressed Groth16 proof over BLS12-381.
pub const PROOF_COMPONENT_SIZE: usize = 192;

const MOCK_PROOF_DOMAIN: &str = "shroud 2024 mock action proof";
const MOCK_BLINDING_DOMAIN: &str = "shroud 2024 mock proof blinding";

/// The proof of a single action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProofComponent(Vec<u8>);

impl ProofComponent {
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

// ============================================================================
// Prover Trait
// ============================================================================

/// A proving system for the action relation
pub trait ActionProver: Send + Sync {
    /// Prove one action. `seed` is the only randomness the backend may use.
    fn prove(
        &self,
        instance: &ActionInstance,
        witness: &ActionWitness,
        seed: [u8; 32],
    ) -> Result<ProofComponent>;

    /// Verify one action proof against its public statement
    fn verify(&self, instance: &ActionInstance, component: &ProofComponent) -> bool;

    /// Short backend name for logs
    fn name(&self) -> &'static str;

    /// Hash identifying the verification key
    fn verification_key_hash(&self) -> [u8; 32];
}

// ============================================================================
// Mock Prover
// ============================================================================

/// Mock prover for tests and development.
///
/// Checks the relation natively and emits `blinding || H(statement, blinding)`.
/// It proves nothing to a third party.
#[derive(Debug, Clone)]
pub struct MockProver {
    vk_hash: [u8; 32],
}

impl MockProver {
    pub fn new() -> Self {
        Self {
            vk_hash: *blake3::hash(b"shroud-mock-vk-v1").as_bytes(),
        }
    }

    fn transcript(instance: &ActionInstance, blinding: &[u8]) -> [u8; PROOF_COMPONENT_SIZE - 32] {
        let mut hasher = blake3::Hasher::new_derive_key(MOCK_PROOF_DOMAIN);
        hasher.update(&instance.to_bytes());
        hasher.update(blinding);

        let mut out = [0u8; PROOF_COMPONENT_SIZE - 32];
        hasher.finalize_xof().fill(&mut out);
        out
    }
}

impl Default for MockProver {
    fn default() -> Self {
        Self::new()
    }
}

impl ActionProver for MockProver {
    fn prove(
        &self,
        instance: &ActionInstance,
        witness: &ActionWitness,
        seed: [u8; 32],
    ) -> Result<ProofComponent> {
        witness.check(instance)?;

        let blinding = blake3::derive_key(MOCK_BLINDING_DOMAIN, &seed);
        let mut bytes = Vec::with_capacity(PROOF_COMPONENT_SIZE);
        bytes.extend_from_slice(&blinding);
        bytes.extend_from_slice(&Self::transcript(instance, &blinding));

        Ok(ProofComponent(bytes))
    }

    fn verify(&self, instance: &ActionInstance, component: &ProofComponent) -> bool {
        if component.len() != PROOF_COMPONENT_SIZE {
            return false;
        }
        let (blinding, tail) = component.as_bytes().split_at(32);
        Self::transcript(instance, blinding).as_slice() == tail
    }

    fn name(&self) -> &'static str {
        "mock"
    }

    fn verification_key_hash(&self) -> [u8; 32] {
        self.vk_hash
    }
}

// ============================================================================
// Groth16 Prover
// ============================================================================

/// Groth16 prover for the action circuit over BLS12-381
pub struct Groth16Prover {
    /// The proving key (loaded from file or generated)
    proving_key: ProvingKey<Bls12_381>,
    /// The verifying key, prepared for pairing checks
    prepared_vk: PreparedVerifyingKey<Bls12_381>,
    /// Hash of the verification key
    vk_hash: [u8; 32],
}

impl Groth16Prover {
    /// Circuit-specific trusted setup
    pub fn setup<R: RngCore + CryptoRng>(rng: &mut R) -> Result<Self> {
        let start = Instant::now();
        let (pk, vk) = Groth16::<Bls12_381>::circuit_specific_setup(ActionCircuit::blank(), rng)?;
        tracing::info!(
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Groth16 action circuit setup complete"
        );
        Self::from_keys(pk, vk)
    }

    fn from_keys(proving_key: ProvingKey<Bls12_381>, vk: VerifyingKey<Bls12_381>) -> Result<Self> {
        let vk_hash = Self::compute_vk_hash(&vk)?;
        let prepared_vk = Groth16::<Bls12_381>::process_vk(&vk)?;
        Ok(Self {
            proving_key,
            prepared_vk,
            vk_hash,
        })
    }

    /// Create a new prover from serialized keys
    pub fn from_bytes(pk_bytes: &[u8], vk_bytes: &[u8]) -> Result<Self> {
        let proving_key = ProvingKey::<Bls12_381>::deserialize_compressed(pk_bytes)?;
        let verifying_key = VerifyingKey::<Bls12_381>::deserialize_compressed(vk_bytes)?;
        if Self::compute_vk_hash(&proving_key.vk)? != Self::compute_vk_hash(&verifying_key)? {
            return Err(ProverError::Serialization(
                "proving and verifying keys do not match".into(),
            ));
        }
        Self::from_keys(proving_key, verifying_key)
    }

    /// Load prover from files
    pub fn from_files(pk_path: &str, vk_path: &str) -> anyhow::Result<Self> {
        use anyhow::Context;

        let pk_bytes = std::fs::read(pk_path)
            .with_context(|| format!("Failed to read proving key from {}", pk_path))?;
        let vk_bytes = std::fs::read(vk_path)
            .with_context(|| format!("Failed to read verifying key from {}", vk_path))?;
        Ok(Self::from_bytes(&pk_bytes, &vk_bytes)?)
    }

    /// Serialized `(proving_key, verifying_key)`
    pub fn to_bytes(&self) -> Result<(Vec<u8>, Vec<u8>)> {
        let mut pk_bytes = Vec::new();
        self.proving_key.serialize_compressed(&mut pk_bytes)?;
        let mut vk_bytes = Vec::new();
        self.proving_key.vk.serialize_compressed(&mut vk_bytes)?;
        Ok((pk_bytes, vk_bytes))
    }

    pub fn verifying_key(&self) -> &VerifyingKey<Bls12_381> {
        &self.proving_key.vk
    }

    fn compute_vk_hash(vk: &VerifyingKey<Bls12_381>) -> Result<[u8; 32]> {
        let mut vk_bytes = Vec::new();
        vk.serialize_compressed(&mut vk_bytes)?;
        Ok(*blake3::hash(&vk_bytes).as_bytes())
    }
}

impl ActionProver for Groth16Prover {
    fn prove(
        &self,
        instance: &ActionInstance,
        witness: &ActionWitness,
        seed: [u8; 32],
    ) -> Result<ProofComponent> {
        // Groth16 would happily prove an unsatisfied system; reject up front.
        witness.check(instance)?;

        let mut rng = StdRng::from_seed(seed);
        let circuit = ActionCircuit::new(instance, witness);
        let proof = Groth16::<Bls12_381>::prove(&self.proving_key, circuit, &mut rng)?;

        let mut bytes = Vec::with_capacity(PROOF_COMPONENT_SIZE);
        proof.serialize_compressed(&mut bytes)?;
        Ok(ProofComponent(bytes))
    }

    fn verify(&self, instance: &ActionInstance, component: &ProofComponent) -> bool {
        let Ok(proof) = Proof::<Bls12_381>::deserialize_compressed(component.as_bytes()) else {
            return false;
        };
        Groth16::<Bls12_381>::verify_with_processed_vk(
            &self.prepared_vk,
            &instance.to_public_inputs(),
            &proof,
        )
        .unwrap_or(false)
    }

    fn name(&self) -> &'static str {
        "groth16"
    }

    fn verification_key_hash(&self) -> [u8; 32] {
        self.vk_hash
    }
}
