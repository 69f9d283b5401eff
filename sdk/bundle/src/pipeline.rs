//! Runtime-checked wrapper over the bundle states.

use std::fmt;
use std::mem;

use shroud_privacy::redjubjub::{Signature, SpendAuth};
use shroud_privacy::{RandomnessSource, SpendAuthorizingKey};
use shroud_prover::ProvingKey;

use crate::bundle::{Authorized, Bundle, Prepared, Proven, Unauthorized};
use crate::error::{BundleError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BundleState {
    Unauthorized,
    Prepared,
    Proven,
    Authorized,
    /// A fatal error consumed the bundle
    Discarded,
}

impl fmt::Display for BundleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BundleState::Unauthorized => write!(f, "unauthorized"),
            BundleState::Prepared => write!(f, "prepared"),
            BundleState::Proven => write!(f, "proven"),
            BundleState::Authorized => write!(f, "authorized"),
            BundleState::Discarded => write!(f, "discarded"),
        }
    }
}

#[derive(Debug, Clone)]
enum Stage {
    Unauthorized(Bundle<Unauthorized>),
    Prepared(Bundle<Prepared>),
    Proven(Bundle<Proven>),
    Authorized(Bundle<Authorized>),
    Discarded,
}

/// A bundle whose state is tracked at runtime.
///
/// Out-of-order calls return a usage error and leave the bundle untouched.
/// A fatal error moves it to [`BundleState::Discarded`].
#[derive(Debug, Clone)]
pub struct PendingBundle {
    stage: Stage,
}

impl From<Bundle<Unauthorized>> for PendingBundle {
    fn from(bundle: Bundle<Unauthorized>) -> Self {
        Self::new(bundle)
    }
}

impl PendingBundle {
    pub fn new(bundle: Bundle<Unauthorized>) -> Self {
        Self {
            stage: Stage::Unauthorized(bundle),
        }
    }

    pub fn state(&self) -> BundleState {
        match self.stage {
            Stage::Unauthorized(_) => BundleState::Unauthorized,
            Stage::Prepared(_) => BundleState::Prepared,
            Stage::Proven(_) => BundleState::Proven,
            Stage::Authorized(_) => BundleState::Authorized,
            Stage::Discarded => BundleState::Discarded,
        }
    }

    pub fn prepare<R: RandomnessSource + ?Sized>(
        &mut self,
        rng: &mut R,
        sighash: [u8; 32],
    ) -> Result<()> {
        match mem::replace(&mut self.stage, Stage::Discarded) {
            Stage::Unauthorized(bundle) => {
                self.stage = Stage::Prepared(bundle.prepare(rng, sighash));
                Ok(())
            }
            other => self.restore(other, BundleError::AlreadyPrepared),
        }
    }

    /// Returns how many spends `ask` signed.
    pub fn sign<R: RandomnessSource + ?Sized>(
        &mut self,
        rng: &mut R,
        ask: &SpendAuthorizingKey,
    ) -> Result<usize> {
        match &mut self.stage {
            Stage::Prepared(bundle) => Ok(bundle.sign(rng, ask)),
            Stage::Proven(bundle) => Ok(bundle.sign(rng, ask)),
            Stage::Unauthorized(_) => Err(BundleError::NotYetPrepared),
            Stage::Authorized(_) => Err(BundleError::AlreadyAuthorized),
            Stage::Discarded => Err(BundleError::Discarded),
        }
    }

    pub fn append_signatures(&mut self, signatures: &[Signature<SpendAuth>]) -> Result<()> {
        match &mut self.stage {
            Stage::Prepared(bundle) => bundle.append_signatures(signatures),
            Stage::Proven(bundle) => bundle.append_signatures(signatures),
            Stage::Unauthorized(_) => Err(BundleError::NotYetPrepared),
            Stage::Authorized(_) => Err(BundleError::AlreadyAuthorized),
            Stage::Discarded => Err(BundleError::Discarded),
        }
    }

    pub fn create_proof<R: RandomnessSource + ?Sized>(
        &mut self,
        pk: &ProvingKey,
        rng: &mut R,
    ) -> Result<()> {
        match mem::replace(&mut self.stage, Stage::Discarded) {
            Stage::Prepared(bundle) => {
                // On failure the stage stays Discarded
                self.stage = Stage::Proven(bundle.create_proof(pk, rng)?);
                Ok(())
            }
            other @ Stage::Unauthorized(_) => self.restore(other, BundleError::NotYetPrepared),
            other @ (Stage::Proven(_) | Stage::Authorized(_)) => {
                self.restore(other, BundleError::AlreadyProven)
            }
            Stage::Discarded => Err(BundleError::Discarded),
        }
    }

    pub fn finalize(&mut self) -> Result<()> {
        let result = match &self.stage {
            Stage::Proven(bundle) => bundle.finalize(),
            Stage::Unauthorized(_) | Stage::Prepared(_) => return Err(BundleError::NotYetProven),
            Stage::Authorized(_) => return Err(BundleError::AlreadyAuthorized),
            Stage::Discarded => return Err(BundleError::Discarded),
        };

        match result {
            Ok(authorized) => {
                self.stage = Stage::Authorized(authorized);
                Ok(())
            }
            Err(err) => {
                if err.is_fatal() {
                    tracing::warn!("Discarding bundle: {}", err);
                    self.stage = Stage::Discarded;
                }
                Err(err)
            }
        }
    }

    pub fn serialized(&self) -> Result<Vec<u8>> {
        match &self.stage {
            Stage::Authorized(bundle) => bundle.serialized(),
            Stage::Discarded => Err(BundleError::Discarded),
            _ => Err(BundleError::NotFinalized),
        }
    }

    pub fn as_authorized(&self) -> Option<&Bundle<Authorized>> {
        match &self.stage {
            Stage::Authorized(bundle) => Some(bundle),
            _ => None,
        }
    }

    pub fn into_authorized(self) -> Result<Bundle<Authorized>> {
        match self.stage {
            Stage::Authorized(bundle) => Ok(bundle),
            Stage::Discarded => Err(BundleError::Discarded),
            _ => Err(BundleError::NotFinalized),
        }
    }

    fn restore(&mut self, stage: Stage, err: BundleError) -> Result<()> {
        let err = match stage {
            Stage::Discarded => BundleError::Discarded,
            _ => err,
        };
        self.stage = stage;
        Err(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::Builder;
    use crate::descriptor::OutputDescriptor;
    use crate::flags::Flags;
    use shroud_privacy::keys::random_address;
    use shroud_privacy::{Anchor, NoteValue, SeededRandomness, SpendingKey};

    fn pending(rng: &mut SeededRandomness) -> PendingBundle {
        let mut builder = Builder::new(Flags::ENABLED, Anchor::empty());
        builder
            .add_output(OutputDescriptor::new(
                None,
                random_address(rng),
                NoteValue::new(9),
                None,
            ))
            .unwrap();
        PendingBundle::from(builder.build(rng).unwrap().0)
    }

    #[test]
    fn test_out_of_order_calls_leave_state() {
        let mut rng = SeededRandomness::from_seed([50u8; 32]);
        let pk = ProvingKey::mock();
        let mut bundle = pending(&mut rng);

        assert_eq!(bundle.finalize(), Err(BundleError::NotYetProven));
        assert_eq!(
            bundle.create_proof(&pk, &mut rng),
            Err(BundleError::NotYetPrepared)
        );
        assert_eq!(bundle.serialized(), Err(BundleError::NotFinalized));
        assert_eq!(bundle.state(), BundleState::Unauthorized);

        bundle.prepare(&mut rng, [0u8; 32]).unwrap();
        assert_eq!(
            bundle.prepare(&mut rng, [0u8; 32]),
            Err(BundleError::AlreadyPrepared)
        );
        assert_eq!(bundle.state(), BundleState::Prepared);

        bundle.create_proof(&pk, &mut rng).unwrap();
        assert_eq!(
            bundle.create_proof(&pk, &mut rng),
            Err(BundleError::AlreadyProven)
        );
        assert_eq!(bundle.state(), BundleState::Proven);

        bundle.finalize().unwrap();
        assert_eq!(bundle.finalize(), Err(BundleError::AlreadyAuthorized));
        assert_eq!(bundle.state(), BundleState::Authorized);
        assert!(bundle.serialized().is_ok());
    }

    #[test]
    fn test_signing_outside_signing_window() {
        let mut rng = SeededRandomness::from_seed([51u8; 32]);
        let ask = SpendAuthorizingKey::from(&SpendingKey::random(&mut rng));
        let mut bundle = pending(&mut rng);

        assert_eq!(bundle.sign(&mut rng, &ask), Err(BundleError::NotYetPrepared));
        bundle.prepare(&mut rng, [1u8; 32]).unwrap();
        assert_eq!(bundle.sign(&mut rng, &ask), Ok(0), "key owns no spend");
    }

    #[test]
    fn test_into_authorized() {
        let mut rng = SeededRandomness::from_seed([52u8; 32]);
        let mut bundle = pending(&mut rng);
        bundle.prepare(&mut rng, [0u8; 32]).unwrap();
        bundle.create_proof(&ProvingKey::mock(), &mut rng).unwrap();
        bundle.finalize().unwrap();

        let bytes = bundle.serialized().unwrap();
        let authorized = bundle.into_authorized().unwrap();
        assert_eq!(authorized.to_bytes(), bytes);
    }

    #[test]
    fn test_state_names() {
        assert_eq!(BundleState::Proven.to_string(), "proven");
        assert_eq!(BundleState::Discarded.to_string(), "discarded");
    }
}
