// One engine per block-count configuration, owning the loaded keys. Built once
// and passed by reference (or shared behind an Arc) to every prove/verify call.

use std::path::Path;
use std::sync::Arc;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::Duration;

use tracing::warn;

use crate::config::CircuitConfig;
use crate::error::{ContingentError, Result};
use crate::inputs::{PrivateWitness, PublicInputs};
use crate::keys::{ProvingKey, VerifyingKey, generate_keys};
use crate::proof::ContingentProof;
use crate::prove::{CancelToken, Prover};
use crate::utils;
use crate::verify::Verifier;

pub struct Contingent {
    config: CircuitConfig,
    proving_key: Option<ProvingKey>,
    verifying_key: VerifyingKey,
    verifier: Verifier,
}

impl Contingent {
    /// Runs a fresh setup for `config`.
    pub fn setup(config: CircuitConfig) -> Result<Self> {
        let (pk, vk) = generate_keys(config)?;
        Self::from_keys(Some(pk), vk)
    }

    pub fn from_keys(proving_key: Option<ProvingKey>, verifying_key: VerifyingKey) -> Result<Self> {
        let config = verifying_key.config();
        if let Some(pk) = &proving_key {
            config.ensure_matches(&pk.config(), "proving key")?;
            if pk.verifying_key() != verifying_key {
                return Err(ContingentError::configuration(
                    "proving and verifying keys come from different setups",
                ));
            }
        }
        let verifier = Verifier::new(&verifying_key);
        Ok(Self {
            config,
            proving_key,
            verifying_key,
            verifier,
        })
    }

    /// Proving engine built from the proving key alone, as a seller holds it.
    pub fn from_proving_key(proving_key: ProvingKey) -> Result<Self> {
        let verifying_key = proving_key.verifying_key();
        Self::from_keys(Some(proving_key), verifying_key)
    }

    /// Verification-only engine, as a buyer holds it.
    pub fn for_verifier(verifying_key: VerifyingKey) -> Result<Self> {
        Self::from_keys(None, verifying_key)
    }

    pub fn load(pk_path: impl AsRef<Path>, vk_path: impl AsRef<Path>) -> Result<Self> {
        let pk = utils::load_proving_key(pk_path)?;
        let vk = utils::load_verifying_key(vk_path)?;
        Self::from_keys(Some(pk), vk)
    }

    pub fn save(&self, pk_path: impl AsRef<Path>, vk_path: impl AsRef<Path>) -> Result<()> {
        utils::save_proving_key(self.proving_key()?, pk_path)?;
        utils::save_verifying_key(&self.verifying_key, vk_path)
    }

    pub fn config(&self) -> CircuitConfig {
        self.config
    }

    pub fn num_blocks(&self) -> usize {
        self.config.num_blocks()
    }

    pub fn proving_key(&self) -> Result<&ProvingKey> {
        self.proving_key.as_ref().ok_or_else(|| {
            ContingentError::configuration("engine was loaded without a proving key")
        })
    }

    pub fn verifying_key(&self) -> &VerifyingKey {
        &self.verifying_key
    }

    pub fn prove(
        &self,
        public: &PublicInputs,
        witness: &PrivateWitness,
    ) -> Result<ContingentProof> {
        Prover::new(self.proving_key()?).prove(public, witness)
    }

    pub fn prove_with_cancel(
        &self,
        public: &PublicInputs,
        witness: &PrivateWitness,
        cancel: &CancelToken,
    ) -> Result<ContingentProof> {
        Prover::new(self.proving_key()?).prove_with_cancel(public, witness, cancel)
    }

    /// Proves on a worker thread and gives up after `timeout`. The abandoned
    /// worker is told to stop at its next checkpoint; the engine is untouched.
    pub fn prove_with_timeout(
        self: &Arc<Self>,
        public: PublicInputs,
        witness: PrivateWitness,
        timeout: Duration,
    ) -> Result<ContingentProof> {
        self.proving_key()?;
        let token = CancelToken::new();
        let (tx, rx) = mpsc::channel();
        let engine = Arc::clone(self);
        let worker_token = token.clone();
        thread::spawn(move || {
            // the receiver is gone if we timed out
            let _ = tx.send(engine.prove_with_cancel(&public, &witness, &worker_token));
        });
        rx.recv_timeout(timeout).unwrap_or_else(|err| Err(abandoned(err, &token, timeout)))
    }

    pub fn verify(&self, proof: &ContingentProof, public: &PublicInputs) -> Result<bool> {
        self.verifier.verify(proof, public)
    }

    pub fn verify_json(&self, proof_json: &str, public: &PublicInputs) -> Result<bool> {
        self.verifier.verify_json(proof_json, public)
    }
}

/// Error for a timed proof that produced no result. A dropped sender means the
/// worker died mid-proof.
fn abandoned(err: RecvTimeoutError, token: &CancelToken, timeout: Duration) -> ContingentError {
    token.cancel();
    match err {
        RecvTimeoutError::Timeout => {
            warn!(timeout_ms = timeout.as_millis() as u64, "abandoning proof after timeout");
            ContingentError::Cancelled
        }
        RecvTimeoutError::Disconnected => {
            warn!("proving worker exited without a result");
            ContingentError::ProofGeneration("proving worker panicked".into())
        }
    }
}
