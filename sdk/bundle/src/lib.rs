//! Shroud Bundle
//!
//! Builds shielded bundles: spend and output descriptors are paired into
//! actions, every action is proven, and the whole bundle is bound to the
//! transaction sighash by a binding signature.
//!
//! ```text
//! Builder ──build──▶ Bundle<Unauthorized>
//!                        │ prepare(rng, sighash)
//!                        ▼
//!                    Bundle<Prepared>   ◀── sign / append_signatures
//!                        │ create_proof(pk, rng)
//!                        ▼
//!                    Bundle<Proven>     ◀── sign / append_signatures
//!                        │ finalize()
//!                        ▼
//!                    Bundle<Authorized> ──to_bytes──▶ wire format
//! ```

pub mod action;
pub mod builder;
pub mod bundle;
pub mod codec;
pub mod descriptor;
pub mod error;
pub mod flags;
pub mod pipeline;
pub mod proof;

pub use action::{Action, ActionBuilder, ActionSecrets};
pub use builder::{Builder, BundleMetadata};
pub use bundle::{
    Authorization, Authorized, AuthorizedSpend, Bundle, Prepared, Proven, SigningParts,
    Unauthorized,
};
pub use codec::{BUNDLE_FORMAT_V1, MAX_ACTIONS};
pub use descriptor::{Descriptor, OutputDescriptor, OutputSlot, SpendDescriptor, SpendSlot};
pub use error::{BundleError, CodecError, ErrorKind};
pub use flags::Flags;
pub use pipeline::{BundleState, PendingBundle};
pub use proof::Proof;
