//! Collects spend and output intents and lays them out as actions.

use std::collections::BTreeSet;

use rand::seq::SliceRandom;
use shroud_config::{ActionOrdering, BuilderConfig};
use shroud_privacy::{Anchor, NoteValue, RandomnessSource, ValueSum};

use crate::action::ActionBuilder;
use crate::bundle::{Bundle, Unauthorized};
use crate::codec::MAX_ACTIONS;
use crate::descriptor::{Descriptor, OutputDescriptor, OutputSlot, SpendDescriptor, SpendSlot};
use crate::error::{BundleError, Result};
use crate::flags::Flags;

/// Where each real spend and output ended up after padding and ordering.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BundleMetadata {
    spend_indices: Vec<usize>,
    output_indices: Vec<usize>,
}

impl BundleMetadata {
    /// Action index of the `n`-th spend passed to [`Builder::add_spend`].
    pub fn spend_action_index(&self, n: usize) -> Option<usize> {
        self.spend_indices.get(n).copied()
    }

    /// Action index of the `n`-th output passed to [`Builder::add_output`].
    pub fn output_action_index(&self, n: usize) -> Option<usize> {
        self.output_indices.get(n).copied()
    }
}

#[derive(Debug, Clone)]
pub struct Builder {
    flags: Flags,
    anchor: Anchor,
    ordering: ActionOrdering,
    min_actions: usize,
    spends: Vec<SpendDescriptor>,
    outputs: Vec<OutputDescriptor>,
    /// Nullifiers of the spends added so far
    nullifiers: BTreeSet<[u8; 32]>,
}

impl Builder {
    pub fn new(flags: Flags, anchor: Anchor) -> Self {
        Self {
            flags,
            anchor,
            ordering: ActionOrdering::default(),
            min_actions: 1,
            spends: Vec::new(),
            outputs: Vec::new(),
            nullifiers: BTreeSet::new(),
        }
    }

    pub fn from_config(config: &BuilderConfig, anchor: Anchor) -> Self {
        Self::new(Flags::from(config), anchor)
            .with_ordering(config.action_ordering)
            .with_min_actions(config.min_actions)
    }

    pub fn with_ordering(mut self, ordering: ActionOrdering) -> Self {
        self.ordering = ordering;
        self
    }

    /// Pad to at least `n` actions even when fewer are needed.
    pub fn with_min_actions(mut self, n: usize) -> Self {
        self.min_actions = n;
        self
    }

    pub fn flags(&self) -> Flags {
        self.flags
    }

    pub fn anchor(&self) -> &Anchor {
        &self.anchor
    }

    pub fn spends(&self) -> &[SpendDescriptor] {
        &self.spends
    }

    pub fn outputs(&self) -> &[OutputDescriptor] {
        &self.outputs
    }

    pub fn add_spend(&mut self, spend: SpendDescriptor) -> Result<()> {
        if !self.flags.spends_enabled() {
            return Err(BundleError::DisabledByFlags("spends"));
        }
        if spend.note.recipient() != spend.fvk.address() {
            return Err(BundleError::SpendKeyMismatch);
        }
        if !spend.merkle_path.verify(&spend.note.commitment(), &self.anchor) {
            return Err(BundleError::InvalidAnchor);
        }
        let nf = spend.note.nullifier(&spend.fvk).to_bytes();
        if self.nullifiers.contains(&nf) {
            return Err(BundleError::DuplicateSpend);
        }
        if self.spends.len() >= MAX_ACTIONS {
            return Err(BundleError::TooManyActions(self.spends.len() + 1));
        }

        self.nullifiers.insert(nf);
        self.spends.push(spend);
        Ok(())
    }

    pub fn add_output(&mut self, output: OutputDescriptor) -> Result<()> {
        if !self.flags.outputs_enabled() {
            return Err(BundleError::DisabledByFlags("outputs"));
        }
        if self.outputs.len() >= MAX_ACTIONS {
            return Err(BundleError::TooManyActions(self.outputs.len() + 1));
        }

        self.outputs.push(output);
        Ok(())
    }

    pub fn add(&mut self, descriptor: Descriptor) -> Result<()> {
        match descriptor {
            Descriptor::Spend(spend) => self.add_spend(spend),
            Descriptor::Output(output) => self.add_output(output),
        }
    }

    /// Sum of spend values minus sum of output values.
    pub fn value_balance(&self) -> Result<i64> {
        let mut total = ValueSum::ZERO;
        for spend in &self.spends {
            total = total
                .checked_add(ValueSum::from_pair(spend.note.value(), NoteValue::ZERO))
                .ok_or(BundleError::ValueOverflow)?;
        }
        for output in &self.outputs {
            total = total
                .checked_add(ValueSum::from_pair(NoteValue::ZERO, output.value))
                .ok_or(BundleError::ValueOverflow)?;
        }
        total.to_i64().ok_or(BundleError::ValueOverflow)
    }

    /// Pad, order and pair the descriptors into an unauthorized bundle.
    pub fn build<R: RandomnessSource + ?Sized>(
        self,
        rng: &mut R,
    ) -> Result<(Bundle<Unauthorized>, BundleMetadata)> {
        if self.spends.is_empty() && self.outputs.is_empty() {
            return Err(BundleError::InsufficientActions);
        }
        let value_balance = self.value_balance()?;

        let num_actions = self
            .spends
            .len()
            .max(self.outputs.len())
            .max(self.min_actions);
        if num_actions > MAX_ACTIONS {
            return Err(BundleError::TooManyActions(num_actions));
        }
        let num_spends = self.spends.len();
        let num_outputs = self.outputs.len();

        let mut spends: Vec<(Option<usize>, SpendSlot)> = self
            .spends
            .into_iter()
            .map(SpendSlot::Real)
            .enumerate()
            .map(|(i, slot)| (Some(i), slot))
            .collect();
        while spends.len() < num_actions {
            spends.push((None, SpendSlot::dummy(rng)));
        }

        let mut outputs: Vec<(Option<usize>, OutputSlot)> = self
            .outputs
            .into_iter()
            .map(OutputSlot::Real)
            .enumerate()
            .map(|(i, slot)| (Some(i), slot))
            .collect();
        while outputs.len() < num_actions {
            outputs.push((None, OutputSlot::dummy(rng)));
        }

        if self.ordering == ActionOrdering::Randomized {
            spends.shuffle(rng);
            outputs.shuffle(rng);
        }

        let mut metadata = BundleMetadata {
            spend_indices: vec![0; num_spends],
            output_indices: vec![0; num_outputs],
        };
        let mut actions = Vec::with_capacity(num_actions);
        let mut secrets = Vec::with_capacity(num_actions);

        for (index, ((spend_pos, spend), (output_pos, output))) in
            spends.into_iter().zip(outputs).enumerate()
        {
            if let Some(pos) = spend_pos {
                metadata.spend_indices[pos] = index;
            }
            if let Some(pos) = output_pos {
                metadata.output_indices[pos] = index;
            }
            let (action, secret) = ActionBuilder::new(spend, output, rng).build(rng)?;
            actions.push(action);
            secrets.push(secret);
        }

        tracing::debug!(
            actions = num_actions,
            spends = num_spends,
            outputs = num_outputs,
            value_balance,
            ordering = %self.ordering,
            "Built bundle"
        );

        Ok((
            Bundle::from_parts(actions, secrets, self.flags, value_balance, self.anchor),
            metadata,
        ))
    }
}
