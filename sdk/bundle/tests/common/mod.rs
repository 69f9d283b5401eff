#![allow(dead_code)]

use shroud_bundle::{OutputDescriptor, SpendDescriptor};
use shroud_privacy::keys::random_address;
use shroud_privacy::{
    Anchor, CommitmentTree, FullViewingKey, Note, NoteValue, Nullifier, OutgoingViewingKey, Rho,
    SeededRandomness, SpendAuthorizingKey, SpendingKey,
};

/// A single spending key and everything derived from it.
pub struct Wallet {
    pub sk: SpendingKey,
    pub fvk: FullViewingKey,
    pub ask: SpendAuthorizingKey,
}

impl Wallet {
    pub fn random(rng: &mut SeededRandomness) -> Self {
        let sk = SpendingKey::random(rng);
        Self {
            sk,
            fvk: FullViewingKey::from(&sk),
            ask: SpendAuthorizingKey::from(&sk),
        }
    }

    pub fn ovk(&self) -> OutgoingViewingKey {
        self.fvk.ovk()
    }
}

/// A wallet with notes committed to an in-memory tree.
pub struct TestFixture {
    pub rng: SeededRandomness,
    pub wallet: Wallet,
    pub tree: CommitmentTree,
    notes: Vec<(Note, u32)>,
}

impl TestFixture {
    pub fn new(seed: u64) -> Self {
        let mut rng = SeededRandomness::from_u64(seed);
        let wallet = Wallet::random(&mut rng);
        Self {
            rng,
            wallet,
            tree: CommitmentTree::new(),
            notes: Vec::new(),
        }
    }

    /// Mint a note of `value` to the wallet and append it to the tree.
    pub fn receive(&mut self, value: u64) -> Note {
        let rho = Rho::from_nullifier(&Nullifier::random(&mut self.rng));
        let note = Note::new(
            self.wallet.fvk.address(),
            NoteValue::new(value),
            rho,
            &mut self.rng,
        );
        let position = self.tree.append(&note.commitment()).expect("tree has room");
        self.notes.push((note, position));
        note
    }

    pub fn anchor(&self) -> Anchor {
        self.tree.root()
    }

    /// Spend descriptor against the current root.
    pub fn spend(&self, note: &Note) -> SpendDescriptor {
        let (_, position) = self
            .notes
            .iter()
            .find(|(n, _)| n == note)
            .expect("note was received");
        let path = self.tree.path(*position).expect("position in tree");
        SpendDescriptor::new(self.wallet.fvk, *note, path)
    }

    /// Output to a throwaway recipient.
    pub fn output(&mut self, value: u64) -> OutputDescriptor {
        OutputDescriptor::new(
            Some(self.wallet.ovk()),
            random_address(&mut self.rng),
            NoteValue::new(value),
            None,
        )
    }
}

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
