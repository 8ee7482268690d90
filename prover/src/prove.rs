// Proof generation: shape checks, a local satisfiability pass, then Groth16.
// Nothing is emitted for a witness that fails the relation.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use ark_bn254::Bn254;
use ark_groth16::Groth16;
use rand::rngs::OsRng;
use rand::{CryptoRng, RngCore};
use tracing::{debug, info, warn};

use crate::circuit::ContingentCircuit;
use crate::error::{ContingentError, Result};
use crate::inputs::{PrivateWitness, PublicInputs};
use crate::keys::ProvingKey;
use crate::proof::ContingentProof;

/// Shared flag a caller flips to abandon an in-flight proof. Checked between
/// proving phases; the Groth16 computation itself is not interruptible.
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    fn check(&self) -> Result<()> {
        if self.is_cancelled() {
            return Err(ContingentError::Cancelled);
        }
        Ok(())
    }
}

/// Borrowing prover over a loaded proving key; cheap to build per call.
pub struct Prover<'a> {
    pub pk: &'a ProvingKey,
}

impl<'a> Prover<'a> {
    pub fn new(pk: &'a ProvingKey) -> Self {
        Self { pk }
    }

    pub fn prove(
        &self,
        public: &PublicInputs,
        witness: &PrivateWitness,
    ) -> Result<ContingentProof> {
        self.prove_with_rng(public, witness, None, &mut OsRng)
    }

    pub fn prove_with_cancel(
        &self,
        public: &PublicInputs,
        witness: &PrivateWitness,
        cancel: &CancelToken,
    ) -> Result<ContingentProof> {
        self.prove_with_rng(public, witness, Some(cancel), &mut OsRng)
    }

    pub fn prove_with_rng<R: RngCore + CryptoRng>(
        &self,
        public: &PublicInputs,
        witness: &PrivateWitness,
        cancel: Option<&CancelToken>,
        rng: &mut R,
    ) -> Result<ContingentProof> {
        let config = self.pk.config();
        let checkpoint = || cancel.map_or(Ok(()), CancelToken::check);

        checkpoint()?;
        let start = Instant::now();
        let circuit = ContingentCircuit::assigned(config, public, witness)?;

        let constraints = circuit.clone().check_satisfied().inspect_err(|e| {
            warn!(num_blocks = config.num_blocks(), error = %e, "rejecting witness");
        })?;
        debug!(constraints, "witness satisfies the relation");

        checkpoint()?;
        let proof =
            Groth16::<Bn254>::create_random_proof_with_reduction(circuit, self.pk.inner(), rng)
                .map_err(ContingentError::synthesis)?;
        checkpoint()?;

        info!(
            num_blocks = config.num_blocks(),
            constraints,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "generated proof"
        );
        Ok(ContingentProof::new(config, proof))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CircuitConfig;
    use crate::keys::generate_keys_with_rng;
    use ark_bn254::Fr;
    use ark_ff::UniformRand;
    use ark_std::test_rng;

    #[test]
    fn cancelled_token_stops_before_any_work() {
        let mut rng = test_rng();
        let config = CircuitConfig::new(1).unwrap();
        let (pk, _) = generate_keys_with_rng(config, &mut rng).unwrap();
        let witness = PrivateWitness {
            key: Fr::rand(&mut rng),
            plaintext: vec![Fr::rand(&mut rng)],
        };
        let public = witness.derive_public_inputs();

        let token = CancelToken::new();
        token.cancel();
        let err = Prover::new(&pk)
            .prove_with_cancel(&public, &witness, &token)
            .unwrap_err();
        assert!(matches!(err, ContingentError::Cancelled));
    }

    #[test]
    fn wrong_block_count_is_a_configuration_error() {
        let mut rng = test_rng();
        let (pk, _) = generate_keys_with_rng(CircuitConfig::new(1).unwrap(), &mut rng).unwrap();
        let witness = PrivateWitness {
            key: Fr::rand(&mut rng),
            plaintext: vec![Fr::rand(&mut rng), Fr::rand(&mut rng)],
        };
        let public = witness.derive_public_inputs();
        let err = Prover::new(&pk).prove(&public, &witness).unwrap_err();
        assert!(matches!(err, ContingentError::Configuration(_)));
    }
}
