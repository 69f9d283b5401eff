//! A single paired spend and output.

use shroud_privacy::{
    FullViewingKey, MerklePath, Note, NoteCommitment, Nullifier, RandomnessSource, Rho,
    SpendAuthorizingKey, TransmittedNoteCiphertext, ValueCommitTrapdoor, ValueCommitment,
    ValueSum, encrypt_note,
};

use crate::descriptor::{OutputSlot, SpendSlot};
use crate::error::Result;

/// Public part of an action, with its spend authorization in state `A`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Action<A> {
    nf: Nullifier,
    cmx: NoteCommitment,
    cv_net: ValueCommitment,
    encrypted_note: TransmittedNoteCiphertext,
    authorization: A,
}

impl<A> Action<A> {
    pub(crate) fn from_parts(
        nf: Nullifier,
        cmx: NoteCommitment,
        cv_net: ValueCommitment,
        encrypted_note: TransmittedNoteCiphertext,
        authorization: A,
    ) -> Self {
        Self {
            nf,
            cmx,
            cv_net,
            encrypted_note,
            authorization,
        }
    }

    /// Nullifier of the spent note
    pub fn nullifier(&self) -> &Nullifier {
        &self.nf
    }

    /// Commitment to the output note
    pub fn cmx(&self) -> &NoteCommitment {
        &self.cmx
    }

    pub fn cv_net(&self) -> &ValueCommitment {
        &self.cv_net
    }

    pub fn encrypted_note(&self) -> &TransmittedNoteCiphertext {
        &self.encrypted_note
    }

    pub fn authorization(&self) -> &A {
        &self.authorization
    }

    pub(crate) fn authorization_mut(&mut self) -> &mut A {
        &mut self.authorization
    }

    pub fn map<B>(self, f: impl FnOnce(A) -> B) -> Action<B> {
        Action {
            nf: self.nf,
            cmx: self.cmx,
            cv_net: self.cv_net,
            encrypted_note: self.encrypted_note,
            authorization: f(self.authorization),
        }
    }

    #[cfg(test)]
    pub(crate) fn set_cv_net(&mut self, cv_net: ValueCommitment) {
        self.cv_net = cv_net;
    }
}

/// Private material an action keeps until it is proven.
#[derive(Debug, Clone)]
pub struct ActionSecrets {
    pub(crate) fvk: FullViewingKey,
    pub(crate) spent: Note,
    pub(crate) path: MerklePath,
    pub(crate) output: Note,
    pub(crate) rcv: ValueCommitTrapdoor,
    pub(crate) dummy_ask: Option<SpendAuthorizingKey>,
}

impl ActionSecrets {
    pub fn spent_note(&self) -> &Note {
        &self.spent
    }

    pub fn output_note(&self) -> &Note {
        &self.output
    }

    pub fn rcv(&self) -> &ValueCommitTrapdoor {
        &self.rcv
    }

    pub fn is_dummy_spend(&self) -> bool {
        self.dummy_ask.is_some()
    }
}

/// Pairs one spend slot with one output slot.
#[derive(Debug, Clone)]
pub struct ActionBuilder {
    spend: SpendSlot,
    output: OutputSlot,
    rcv: ValueCommitTrapdoor,
}

impl ActionBuilder {
    /// Draws a fresh value commitment trapdoor for the pair.
    pub fn new<R: RandomnessSource + ?Sized>(
        spend: SpendSlot,
        output: OutputSlot,
        rng: &mut R,
    ) -> Self {
        Self {
            spend,
            output,
            rcv: ValueCommitTrapdoor::random(rng),
        }
    }

    /// `v_spend - v_output`
    pub fn value_sum(&self) -> ValueSum {
        ValueSum::from_pair(self.spend.note().value(), self.output.value())
    }

    pub fn spend(&self) -> &SpendSlot {
        &self.spend
    }

    pub fn output(&self) -> &OutputSlot {
        &self.output
    }

    /// Derive the nullifier, output note and commitments, and encrypt the
    /// output to its recipient.
    pub fn build<R: RandomnessSource + ?Sized>(
        self,
        rng: &mut R,
    ) -> Result<(Action<()>, ActionSecrets)> {
        let fvk = *self.spend.fvk();
        let spent = *self.spend.note();
        let nf = spent.nullifier(&fvk);

        let ovk = self.output.ovk(rng);
        let output = Note::new(
            self.output.recipient(),
            self.output.value(),
            Rho::from_nullifier(&nf),
            rng,
        );
        let cmx = output.commitment();
        let cv_net = ValueCommitment::derive(self.value_sum(), self.rcv);
        let encrypted_note = encrypt_note(&output, &self.output.memo(), &ovk, &cv_net, &cmx)?;

        let secrets = ActionSecrets {
            fvk,
            spent,
            path: self.spend.merkle_path().clone(),
            output,
            rcv: self.rcv,
            dummy_ask: self.spend.dummy_ask(),
        };
        Ok((
            Action::from_parts(nf, cmx, cv_net, encrypted_note, ()),
            secrets,
        ))
    }
}
