//! Spend and output intents, and the padded slots an action is built from.

use shroud_privacy::keys::random_address;
use shroud_privacy::{
    Address, FullViewingKey, Memo, MerklePath, Note, NoteValue, OutgoingViewingKey,
    RandomnessSource, SpendAuthorizingKey, SpendingKey, empty_memo,
};

/// A note the caller wants to spend
#[derive(Debug, Clone)]
pub struct SpendDescriptor {
    pub fvk: FullViewingKey,
    pub note: Note,
    pub merkle_path: MerklePath,
}

impl SpendDescriptor {
    pub fn new(fvk: FullViewingKey, note: Note, merkle_path: MerklePath) -> Self {
        Self {
            fvk,
            note,
            merkle_path,
        }
    }
}

/// A note the caller wants to create
#[derive(Debug, Clone)]
pub struct OutputDescriptor {
    /// Lets the sender recover the note later; `None` makes it unrecoverable
    pub ovk: Option<OutgoingViewingKey>,
    pub recipient: Address,
    pub value: NoteValue,
    pub memo: Option<Memo>,
}

impl OutputDescriptor {
    pub fn new(
        ovk: Option<OutgoingViewingKey>,
        recipient: Address,
        value: NoteValue,
        memo: Option<Memo>,
    ) -> Self {
        Self {
            ovk,
            recipient,
            value,
            memo,
        }
    }
}

#[derive(Debug, Clone)]
pub enum Descriptor {
    Spend(SpendDescriptor),
    Output(OutputDescriptor),
}

impl From<SpendDescriptor> for Descriptor {
    fn from(spend: SpendDescriptor) -> Self {
        Descriptor::Spend(spend)
    }
}

impl From<OutputDescriptor> for Descriptor {
    fn from(output: OutputDescriptor) -> Self {
        Descriptor::Output(output)
    }
}

/// Spend half of an action
#[derive(Debug, Clone)]
pub enum SpendSlot {
    Real(SpendDescriptor),
    /// Zero-valued note under a throwaway key; its path leads nowhere
    Dummy {
        sk: SpendingKey,
        fvk: FullViewingKey,
        note: Note,
        path: MerklePath,
    },
}

impl SpendSlot {
    pub fn dummy<R: RandomnessSource + ?Sized>(rng: &mut R) -> Self {
        let (sk, fvk, note) = Note::dummy(rng);
        let path = MerklePath::dummy(rng);
        SpendSlot::Dummy { sk, fvk, note, path }
    }

    pub fn is_dummy(&self) -> bool {
        matches!(self, SpendSlot::Dummy { .. })
    }

    pub fn fvk(&self) -> &FullViewingKey {
        match self {
            SpendSlot::Real(spend) => &spend.fvk,
            SpendSlot::Dummy { fvk, .. } => fvk,
        }
    }

    pub fn note(&self) -> &Note {
        match self {
            SpendSlot::Real(spend) => &spend.note,
            SpendSlot::Dummy { note, .. } => note,
        }
    }

    pub fn merkle_path(&self) -> &MerklePath {
        match self {
            SpendSlot::Real(spend) => &spend.merkle_path,
            SpendSlot::Dummy { path, .. } => path,
        }
    }

    /// The builder holds the authorizing key of dummies only.
    pub(crate) fn dummy_ask(&self) -> Option<SpendAuthorizingKey> {
        match self {
            SpendSlot::Real(_) => None,
            SpendSlot::Dummy { sk, .. } => Some(SpendAuthorizingKey::from(sk)),
        }
    }
}

/// Output half of an action
#[derive(Debug, Clone)]
pub enum OutputSlot {
    Real(OutputDescriptor),
    Dummy { recipient: Address },
}

impl OutputSlot {
    pub fn dummy<R: RandomnessSource + ?Sized>(rng: &mut R) -> Self {
        OutputSlot::Dummy {
            recipient: random_address(rng),
        }
    }

    pub fn is_dummy(&self) -> bool {
        matches!(self, OutputSlot::Dummy { .. })
    }

    pub fn recipient(&self) -> Address {
        match self {
            OutputSlot::Real(output) => output.recipient,
            OutputSlot::Dummy { recipient } => *recipient,
        }
    }

    pub fn value(&self) -> NoteValue {
        match self {
            OutputSlot::Real(output) => output.value,
            OutputSlot::Dummy { .. } => NoteValue::ZERO,
        }
    }

    pub fn memo(&self) -> Memo {
        match self {
            OutputSlot::Real(OutputDescriptor {
                memo: Some(memo), ..
            }) => *memo,
            _ => empty_memo(),
        }
    }

    /// The key the out-ciphertext is sealed under. Without a caller key a
    /// random one is drawn, so nobody can recover the note.
    pub fn ovk<R: RandomnessSource + ?Sized>(&self, rng: &mut R) -> OutgoingViewingKey {
        match self {
            OutputSlot::Real(OutputDescriptor { ovk: Some(ovk), .. }) => *ovk,
            _ => OutgoingViewingKey::random(rng),
        }
    }
}
