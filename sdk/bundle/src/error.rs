//! Error types for bundle construction, proving and encoding.

use shroud_privacy::PrivacyError;
use shroud_prover::ProverError;
use thiserror::Error;

/// Failures while decoding or encoding the wire format
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// Underlying reader or writer failed (includes truncated input)
    #[error("I/O error: {0}")]
    Io(String),

    #[error("Unknown bundle format tag: {0:#04x}")]
    UnknownFormat(u8),

    #[error("Non-canonical compact size encoding")]
    NonCanonicalCompactSize,

    #[error("Bundle has no actions")]
    NoActions,

    #[error("Too many actions: {0}")]
    TooManyActions(u64),

    /// A field element or point did not decode to a valid value
    #[error("Invalid encoding of {0}")]
    InvalidEncoding(&'static str),

    #[error("Unknown flag bits: {0:#010b}")]
    UnknownFlags(u8),

    /// Offsets must start at 0, strictly increase and stay inside the proof
    #[error("Invalid proof component offsets")]
    InvalidProofOffsets,

    #[error("Aggregated proof too large: {0} bytes")]
    ProofTooLarge(u64),

    #[error("{0} trailing bytes after bundle")]
    TrailingBytes(usize),
}

impl From<std::io::Error> for CodecError {
    fn from(err: std::io::Error) -> Self {
        CodecError::Io(err.to_string())
    }
}

/// Broad classification of a [`BundleError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Caller misuse; the bundle is left as it was
    Usage,
    /// A cryptographic invariant broke; the bundle must be rebuilt
    Invariant,
    /// The environment could not supply what was needed
    Resource,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BundleError {
    // --- Builder ---
    #[error("Spend merkle path does not lead to the bundle anchor")]
    InvalidAnchor,

    #[error("{0} are disabled by the bundle flags")]
    DisabledByFlags(&'static str),

    #[error("Spent note is not owned by the supplied full viewing key")]
    SpendKeyMismatch,

    #[error("Note is already spent by this bundle")]
    DuplicateSpend,

    #[error("Bundle needs at least one spend or output")]
    InsufficientActions,

    #[error("Too many actions: {0}")]
    TooManyActions(usize),

    #[error("Value balance does not fit in i64")]
    ValueOverflow,

    // --- State machine ---
    #[error("Bundle has already been prepared")]
    AlreadyPrepared,

    #[error("Bundle has not been prepared")]
    NotYetPrepared,

    #[error("Bundle has already been proven")]
    AlreadyProven,

    #[error("Bundle has not been proven")]
    NotYetProven,

    #[error("Bundle is already authorized")]
    AlreadyAuthorized,

    #[error("Bundle is not finalized")]
    NotFinalized,

    #[error("Bundle was discarded after a fatal error")]
    Discarded,

    // --- Authorization ---
    #[error("{0} spends are missing an authorization signature")]
    MissingSignatures(usize),

    #[error("Signature does not verify against any action")]
    InvalidSignature,

    #[error("Proof generation failed for action {index}: {source}")]
    ProofGenerationFailed {
        index: usize,
        #[source]
        source: ProverError,
    },

    #[error("Binding signing key does not match the value commitments")]
    BindingKeyMismatch,

    #[error("Note encryption failed: {0}")]
    NoteEncryption(#[from] PrivacyError),

    #[error("Codec error: {0}")]
    Codec(#[from] CodecError),

    #[error("Failed to start proving pool: {0}")]
    WorkerPool(String),
}

impl BundleError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            BundleError::InvalidAnchor
            | BundleError::DisabledByFlags(_)
            | BundleError::SpendKeyMismatch
            | BundleError::DuplicateSpend
            | BundleError::InsufficientActions
            | BundleError::TooManyActions(_)
            | BundleError::ValueOverflow
            | BundleError::AlreadyPrepared
            | BundleError::NotYetPrepared
            | BundleError::AlreadyProven
            | BundleError::NotYetProven
            | BundleError::AlreadyAuthorized
            | BundleError::NotFinalized
            | BundleError::Discarded
            | BundleError::MissingSignatures(_)
            | BundleError::InvalidSignature => ErrorKind::Usage,
            BundleError::ProofGenerationFailed { .. }
            | BundleError::BindingKeyMismatch
            | BundleError::NoteEncryption(_)
            | BundleError::Codec(_) => ErrorKind::Invariant,
            BundleError::WorkerPool(_) => ErrorKind::Resource,
        }
    }

    /// Whether the bundle that raised this error can no longer be used.
    pub fn is_fatal(&self) -> bool {
        self.kind() != ErrorKind::Usage
    }
}

pub type Result<T> = std::result::Result<T, BundleError>;
