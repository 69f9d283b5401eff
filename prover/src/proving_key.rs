//! Opaque proving capability handed to the bundle pipeline.

use std::fmt;
use std::sync::Arc;

use rand::rngs::OsRng;
use rand::{CryptoRng, RngCore};
use shroud_config::{ProverBackend, ProverConfig};

use crate::backend::{ActionProver, Groth16Prover, MockProver, ProofComponent};
use crate::errors::Result;
use crate::instance::ActionInstance;

/// Handle over an [`ActionProver`]. Cheap to clone; safe to share across
/// proving workers.
#[derive(Clone)]
pub struct ProvingKey {
    backend: Arc<dyn ActionProver>,
    worker_threads: Option<usize>,
}

impl fmt::Debug for ProvingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProvingKey")
            .field("backend", &self.backend.name())
            .field("worker_threads", &self.worker_threads)
            .finish()
    }
}

impl ProvingKey {
    /// Run the Groth16 setup for the action circuit. Expensive; do it once.
    pub fn build() -> Result<Self> {
        Self::build_with_rng(&mut OsRng)
    }

    pub fn build_with_rng<R: RngCore + CryptoRng>(rng: &mut R) -> Result<Self> {
        Ok(Self::from_prover(Groth16Prover::setup(rng)?))
    }

    /// Key backed by [`MockProver`], for tests.
    pub fn mock() -> Self {
        Self::from_prover(MockProver::new())
    }

    pub fn from_prover<P: ActionProver + 'static>(prover: P) -> Self {
        Self {
            backend: Arc::new(prover),
            worker_threads: None,
        }
    }

    /// Select and load the backend named in `config`.
    ///
    /// A Groth16 backend without key paths runs a fresh setup.
    pub fn from_config(config: &ProverConfig) -> anyhow::Result<Self> {
        let key = match config.backend {
            ProverBackend::Mock => {
                tracing::info!("Using mock action prover");
                Self::mock()
            }
            ProverBackend::Groth16 => {
                match (&config.proving_key_path, &config.verifying_key_path) {
                    (Some(pk), Some(vk)) => {
                        tracing::info!("Loading Groth16 keys from {} and {}", pk, vk);
                        Self::from_prover(Groth16Prover::from_files(pk, vk)?)
                    }
                    _ => {
                        tracing::warn!("No Groth16 key paths configured, running setup");
                        Self::build()?
                    }
                }
            }
        };
        Ok(key.with_worker_threads(config.worker_threads))
    }

    /// Size of a dedicated proving pool; `None` uses the global pool.
    pub fn with_worker_threads(mut self, threads: Option<usize>) -> Self {
        self.worker_threads = threads.filter(|n| *n > 0);
        self
    }

    pub fn worker_threads(&self) -> Option<usize> {
        self.worker_threads
    }

    pub fn prover(&self) -> &dyn ActionProver {
        self.backend.as_ref()
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    pub fn verify_component(&self, instance: &ActionInstance, component: &ProofComponent) -> bool {
        self.backend.verify(instance, component)
    }
}
