//! Merkle Tree for Note Commitments
//!
//! Append-only sparse Merkle tree over note commitments. Its root is the
//! anchor every spend in a bundle proves membership against.
//!
//! ```text
//!                    Root (anchor)
//!                   /    \
//!                 H01    H23
//!                /  \   /   \
//!               H0  H1 H2   H3
//!               |   |   |    |
//!              C0  C1  C2   C3  (Note Commitments)
//! ```

use std::collections::HashMap;
use std::sync::OnceLock;

use crate::commitment::NoteCommitment;
use crate::encoding::{base_from_bytes, base_to_bytes};
use crate::error::PrivacyError;
use crate::random::RandomnessSource;
use crate::{Base, poseidon};

/// Tree depth (supports 2^32 notes)
pub const TREE_DEPTH: usize = 32;

static EMPTY_ROOTS: OnceLock<Vec<Base>> = OnceLock::new();

/// Roots of empty subtrees, indexed by height; `[0]` is the empty leaf.
pub fn empty_roots() -> &'static [Base] {
    EMPTY_ROOTS.get_or_init(|| {
        let mut roots = Vec::with_capacity(TREE_DEPTH + 1);
        let mut current = poseidon::hash(&[Base::from(0u64)]);
        roots.push(current);
        for _ in 0..TREE_DEPTH {
            current = poseidon::hash_pair(current, current);
            roots.push(current);
        }
        roots
    })
}

/// Root of the commitment tree that spends are proven against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Anchor(Base);

impl Anchor {
    /// Root of the empty tree.
    pub fn empty() -> Self {
        Self(empty_roots()[TREE_DEPTH])
    }

    pub fn from_field(f: Base) -> Self {
        Self(f)
    }

    pub fn inner(&self) -> Base {
        self.0
    }

    pub fn to_bytes(&self) -> [u8; 32] {
        base_to_bytes(&self.0)
    }

    /// Rejects non-canonical encodings.
    pub fn from_bytes(bytes: &[u8; 32]) -> Option<Self> {
        base_from_bytes(bytes).map(Self)
    }
}

/// A Merkle path proving inclusion of a note
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MerklePath {
    /// The leaf position
    position: u32,
    /// Sibling hashes from leaf to root
    auth_path: [Base; TREE_DEPTH],
}

impl MerklePath {
    pub fn from_parts(position: u32, auth_path: [Base; TREE_DEPTH]) -> Self {
        Self {
            position,
            auth_path,
        }
    }

    /// A path to nowhere, for padding spends. Its root matches no real
    /// anchor; zero-valued spends are exempt from the membership check.
    pub fn dummy<R: RandomnessSource + ?Sized>(rng: &mut R) -> Self {
        let position = rng.next_u32();
        let auth_path = std::array::from_fn(|_| rng.next_scalar());
        Self {
            position,
            auth_path,
        }
    }

    pub fn position(&self) -> u32 {
        self.position
    }

    pub fn auth_path(&self) -> &[Base; TREE_DEPTH] {
        &self.auth_path
    }

    /// Position bits from leaf to root (true = current node is the right child)
    pub fn path_bits(&self) -> [bool; TREE_DEPTH] {
        std::array::from_fn(|level| (self.position >> level) & 1 == 1)
    }

    /// Compute root from leaf and authentication path
    pub fn root(&self, cm: &NoteCommitment) -> Anchor {
        let mut current = cm.inner();
        for (sibling, is_right) in self.auth_path.iter().zip(self.path_bits()) {
            current = if is_right {
                poseidon::hash_pair(*sibling, current)
            } else {
                poseidon::hash_pair(current, *sibling)
            };
        }
        Anchor(current)
    }

    /// Verify that this path proves inclusion of `cm` under `anchor`
    pub fn verify(&self, cm: &NoteCommitment, anchor: &Anchor) -> bool {
        &self.root(cm) == anchor
    }
}

/// Append-only sparse Merkle tree
///
/// Uses lazy evaluation - only stores non-empty nodes.
#[derive(Debug, Clone, Default)]
pub struct CommitmentTree {
    /// Non-empty nodes: (level, index) -> hash
    nodes: HashMap<(usize, u64), Base>,
    /// Next available leaf position
    next_index: u64,
}

impl CommitmentTree {
    /// Create a new empty tree
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of leaves appended so far
    pub fn size(&self) -> u64 {
        self.next_index
    }

    /// Get current root
    pub fn root(&self) -> Anchor {
        match self.nodes.get(&(TREE_DEPTH, 0)) {
            Some(root) => Anchor(*root),
            None => Anchor::empty(),
        }
    }

    fn node(&self, level: usize, index: u64) -> Base {
        self.nodes
            .get(&(level, index))
            .copied()
            .unwrap_or(empty_roots()[level])
    }

    /// Append a commitment and return its position
    pub fn append(&mut self, cm: &NoteCommitment) -> Result<u32, PrivacyError> {
        let position =
            u32::try_from(self.next_index).map_err(|_| PrivacyError::TreeFull(TREE_DEPTH))?;

        self.nodes.insert((0, u64::from(position)), cm.inner());

        // Update path to root
        let mut current_index = u64::from(position);
        let mut current_hash = cm.inner();

        for level in 0..TREE_DEPTH {
            let is_right = current_index & 1 == 1;
            let sibling = self.node(level, current_index ^ 1);

            current_hash = if is_right {
                poseidon::hash_pair(sibling, current_hash)
            } else {
                poseidon::hash_pair(current_hash, sibling)
            };
            current_index /= 2;

            self.nodes.insert((level + 1, current_index), current_hash);
        }

        self.next_index += 1;
        Ok(position)
    }

    /// Get Merkle path for a position
    pub fn path(&self, position: u32) -> Option<MerklePath> {
        if u64::from(position) >= self.next_index {
            return None;
        }

        let mut current_index = u64::from(position);
        let auth_path = std::array::from_fn(|level| {
            let sibling = self.node(level, current_index ^ 1);
            current_index /= 2;
            sibling
        });

        Some(MerklePath {
            position,
            auth_path,
        })
    }

    /// Get commitment at position
    pub fn get(&self, position: u32) -> Option<NoteCommitment> {
        self.nodes
            .get(&(0, u64::from(position)))
            .map(|h| NoteCommitment::from_field(*h))
    }
}
