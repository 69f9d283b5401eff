//! Error definitions for the proving backends.
use thiserror::Error;

/// Errors raised while proving or verifying an action
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProverError {
    /// The witness does not satisfy the action relation
    #[error("Invalid witness: {0}")]
    InvalidWitness(String),

    /// Constraint synthesis or proving failed inside the backend
    #[error("Synthesis error: {0}")]
    Synthesis(String),

    /// Key or proof (de)serialization failed
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// A freshly generated proof did not verify
    #[error("Proof verification failed")]
    VerificationFailed,
}

impl From<ark_relations::r1cs::SynthesisError> for ProverError {
    fn from(e: ark_relations::r1cs::SynthesisError) -> Self {
        Self::Synthesis(e.to_string())
    }
}

impl From<ark_serialize::SerializationError> for ProverError {
    fn from(e: ark_serialize::SerializationError) -> Self {
        Self::Serialization(e.to_string())
    }
}

/// Result type for proving operations
pub type Result<T> = std::result::Result<T, ProverError>;
