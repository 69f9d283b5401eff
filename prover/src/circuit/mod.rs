//! R1CS encoding of the action relation.

pub mod action;
pub mod gadgets;

pub use action::ActionCircuit;
