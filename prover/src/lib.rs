//! Shroud Action Prover
//!
//! The action relation, its R1CS encoding and the proving backends the
//! bundle pipeline treats as an external collaborator.

pub mod backend;
pub mod circuit;
pub mod errors;
pub mod instance;
pub mod proving_key;

// Re-export key types for external usage
pub use backend::{ActionProver, Groth16Prover, MockProver, PROOF_COMPONENT_SIZE, ProofComponent};
pub use circuit::ActionCircuit;
pub use errors::ProverError;
pub use instance::{ActionInstance, ActionWitness, NUM_PUBLIC_INPUTS};
pub use proving_key::ProvingKey;
