use thiserror::Error;

/// Errors raised by the note primitives
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PrivacyError {
    /// The commitment tree has no free leaf left
    #[error("Commitment tree of depth {0} is full")]
    TreeFull(usize),

    /// AEAD encryption failed
    #[error("Note encryption failed")]
    Encryption,

    /// A byte encoding held a non-canonical field element or an invalid point
    #[error("Invalid {0} encoding")]
    InvalidEncoding(&'static str),

    /// A ciphertext had the wrong length for its slot
    #[error("Invalid ciphertext length: expected {expected}, got {got}")]
    CiphertextLength { expected: usize, got: usize },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        assert_eq!(
            PrivacyError::TreeFull(32).to_string(),
            "Commitment tree of depth 32 is full"
        );
        assert_eq!(
            PrivacyError::CiphertextLength {
                expected: 569,
                got: 10
            }
            .to_string(),
            "Invalid ciphertext length: expected 569, got 10"
        );
        assert_eq!(
            PrivacyError::InvalidEncoding("note").to_string(),
            "Invalid note encoding"
        );
    }
}
