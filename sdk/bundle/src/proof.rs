//! Aggregated proof: one component per action, in action order.

use shroud_prover::ProofComponent;

use crate::error::CodecError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Proof {
    components: Vec<ProofComponent>,
}

impl Proof {
    pub fn from_components(components: Vec<ProofComponent>) -> Self {
        Self { components }
    }

    pub fn components(&self) -> &[ProofComponent] {
        &self.components
    }

    pub fn component(&self, index: usize) -> Option<&ProofComponent> {
        self.components.get(index)
    }

    /// Number of components
    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    /// Total size of the concatenated components
    pub fn byte_len(&self) -> usize {
        self.components.iter().map(ProofComponent::len).sum()
    }

    /// Start of each component inside [`Proof::to_bytes`].
    pub fn offsets(&self) -> Vec<u32> {
        let mut offsets = Vec::with_capacity(self.components.len());
        let mut start = 0usize;
        for component in &self.components {
            // The codec bounds the aggregate well below u32::MAX.
            offsets.push(start as u32);
            start += component.len();
        }
        offsets
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(self.byte_len());
        for component in &self.components {
            bytes.extend_from_slice(component.as_bytes());
        }
        bytes
    }

    /// Split aggregated bytes at `offsets`.
    ///
    /// Offsets must start at zero and strictly increase; every component is
    /// therefore non-empty.
    pub fn from_parts(bytes: &[u8], offsets: &[u32]) -> Result<Self, CodecError> {
        if offsets.first() != Some(&0) {
            return Err(CodecError::InvalidProofOffsets);
        }

        let mut components = Vec::with_capacity(offsets.len());
        for (i, start) in offsets.iter().enumerate() {
            let start = *start as usize;
            let end = match offsets.get(i + 1) {
                Some(next) => *next as usize,
                None => bytes.len(),
            };
            if start >= end || end > bytes.len() {
                return Err(CodecError::InvalidProofOffsets);
            }
            components.push(ProofComponent::from_bytes(bytes[start..end].to_vec()));
        }
        Ok(Self { components })
    }
}
