// Groth16 key generation for the contingent circuit, and the key containers
// that pin each key to the block count it was generated for.

use std::time::Instant;

use ark_bn254::Bn254;
use ark_groth16::{Groth16, ProvingKey as Groth16ProvingKey, VerifyingKey as Groth16VerifyingKey};
use ark_serialize::{CanonicalDeserialize, CanonicalSerialize};
use rand::rngs::OsRng;
use rand::RngCore;
use tracing::info;

use crate::circuit::ContingentCircuit;
use crate::config::CircuitConfig;
use crate::encoding::{PROVING_KEY_MAGIC, VERIFYING_KEY_MAGIC, read_header, write_header};
use crate::error::{ContingentError, Result};

#[derive(Clone, Debug, PartialEq)]
pub struct ProvingKey {
    config: CircuitConfig,
    inner: Groth16ProvingKey<Bn254>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct VerifyingKey {
    config: CircuitConfig,
    inner: Groth16VerifyingKey<Bn254>,
}

/// A verifying key must carry one IC point per public input plus the constant.
fn check_ic_len(config: &CircuitConfig, vk: &Groth16VerifyingKey<Bn254>) -> Result<()> {
    let expected = config.num_public_inputs() + 1;
    if vk.gamma_abc_g1.len() != expected {
        return Err(ContingentError::Configuration(format!(
            "key has {} input commitments, {} blocks need {expected}",
            vk.gamma_abc_g1.len(),
            config.num_blocks()
        )));
    }
    Ok(())
}

impl ProvingKey {
    pub fn new(config: CircuitConfig, inner: Groth16ProvingKey<Bn254>) -> Result<Self> {
        check_ic_len(&config, &inner.vk)?;
        Ok(Self { config, inner })
    }

    pub fn config(&self) -> CircuitConfig {
        self.config
    }

    pub fn inner(&self) -> &Groth16ProvingKey<Bn254> {
        &self.inner
    }

    /// The verifying half embedded in every Groth16 proving key.
    pub fn verifying_key(&self) -> VerifyingKey {
        VerifyingKey {
            config: self.config,
            inner: self.inner.vk.clone(),
        }
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        write_header(&mut out, PROVING_KEY_MAGIC, &self.config);
        self.inner
            .serialize_uncompressed(&mut out)
            .map_err(|e| ContingentError::Encoding(format!("proving key: {e}")))?;
        Ok(out)
    }

    /// Point validation is skipped: proving keys are produced locally and are
    /// large enough that subgroup checks dominate load time.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let (config, mut payload) = read_header(bytes, PROVING_KEY_MAGIC)
            .map_err(|e| ContingentError::Encoding(format!("proving key: {e}")))?;
        let inner = Groth16ProvingKey::<Bn254>::deserialize_uncompressed_unchecked(&mut payload)
            .map_err(|e| ContingentError::Encoding(format!("proving key: {e}")))?;
        if !payload.is_empty() {
            return Err(ContingentError::encoding("trailing bytes after proving key"));
        }
        Self::new(config, inner)
    }
}

impl VerifyingKey {
    pub fn new(config: CircuitConfig, inner: Groth16VerifyingKey<Bn254>) -> Result<Self> {
        check_ic_len(&config, &inner)?;
        Ok(Self { config, inner })
    }

    pub fn config(&self) -> CircuitConfig {
        self.config
    }

    pub fn inner(&self) -> &Groth16VerifyingKey<Bn254> {
        &self.inner
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        write_header(&mut out, VERIFYING_KEY_MAGIC, &self.config);
        self.inner
            .serialize_compressed(&mut out)
            .map_err(|e| ContingentError::Encoding(format!("verifying key: {e}")))?;
        Ok(out)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let (config, mut payload) = read_header(bytes, VERIFYING_KEY_MAGIC)
            .map_err(|e| ContingentError::Encoding(format!("verifying key: {e}")))?;
        let inner = Groth16VerifyingKey::<Bn254>::deserialize_compressed(&mut payload)
            .map_err(|e| ContingentError::Encoding(format!("verifying key: {e}")))?;
        if !payload.is_empty() {
            return Err(ContingentError::encoding("trailing bytes after verifying key"));
        }
        Self::new(config, inner)
    }
}

/// Runs the Groth16 setup for `config` with fresh OS randomness.
///
/// The setup trapdoor (tau, alpha, beta, gamma, delta) is sampled inside the
/// backend call and dropped when it returns; it is never stored or returned.
pub fn generate_keys(config: CircuitConfig) -> Result<(ProvingKey, VerifyingKey)> {
    generate_keys_with_rng(config, &mut OsRng)
}

/// Setup with caller-supplied randomness. A seeded rng makes the trapdoor
/// recoverable, so only [`generate_keys`] output belongs in deployment.
pub fn generate_keys_with_rng<R: RngCore>(
    config: CircuitConfig,
    rng: &mut R,
) -> Result<(ProvingKey, VerifyingKey)> {
    let start = Instant::now();
    let circuit = ContingentCircuit::blank(config);
    let pk = Groth16::<Bn254>::generate_random_parameters_with_reduction(circuit, rng)
        .map_err(ContingentError::synthesis)?;
    let pk = ProvingKey::new(config, pk)?;
    let vk = pk.verifying_key();
    info!(
        num_blocks = config.num_blocks(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "generated proving and verifying keys"
    );
    Ok((pk, vk))
}
