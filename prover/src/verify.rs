// Proof verification against a prepared verifying key. Pure and lock-free, so
// one Verifier can be shared by any number of threads.

use ark_bn254::Bn254;
use ark_groth16::{Groth16, PreparedVerifyingKey, prepare_verifying_key};
use tracing::{info, warn};

use crate::config::CircuitConfig;
use crate::error::{ContingentError, Result};
use crate::inputs::PublicInputs;
use crate::keys::VerifyingKey;
use crate::proof::ContingentProof;

pub struct Verifier {
    config: CircuitConfig,
    pvk: PreparedVerifyingKey<Bn254>,
}

impl Verifier {
    pub fn new(vk: &VerifyingKey) -> Self {
        Self {
            config: vk.config(),
            pvk: prepare_verifying_key(vk.inner()),
        }
    }

    /// `Ok(true)` iff the proof is valid for exactly these inputs. Shape
    /// mismatches are errors, a failing pairing check is `Ok(false)`.
    pub fn verify(&self, proof: &ContingentProof, public: &PublicInputs) -> Result<bool> {
        self.config.ensure_matches(&proof.config(), "proof")?;
        public.check_shape(&self.config)?;

        let inputs = public.to_field_elements();
        let valid = Groth16::<Bn254>::verify_proof(&self.pvk, proof.inner(), &inputs)
            .map_err(|e| ContingentError::Configuration(e.to_string()))?;
        if valid {
            info!(num_blocks = self.config.num_blocks(), "proof verified");
        } else {
            warn!(num_blocks = self.config.num_blocks(), "proof failed verification");
        }
        Ok(valid)
    }

    /// Verifies a proof in its JSON text form. Malformed text is a decoding
    /// error, never `Ok(false)`.
    pub fn verify_json(&self, proof_json: &str, public: &PublicInputs) -> Result<bool> {
        let proof = ContingentProof::from_json(proof_json)?;
        self.verify(&proof, public)
    }

    pub fn verify_bytes(&self, proof_bytes: &[u8], public: &PublicInputs) -> Result<bool> {
        let proof = ContingentProof::from_bytes(proof_bytes)?;
        self.verify(&proof, public)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::generate_keys_with_rng;
    use ark_bn254::Fr;
    use ark_std::test_rng;

    #[test]
    fn malformed_proof_text_is_a_decoding_error() {
        let config = CircuitConfig::new(1).unwrap();
        let (_, vk) = generate_keys_with_rng(config, &mut test_rng()).unwrap();
        let verifier = Verifier::new(&vk);
        let public = PublicInputs {
            key_hash: [0u8; 32],
            ciphertext: vec![Fr::from(1u64)],
            plaintext_root: Fr::from(2u64),
        };
        assert!(matches!(
            verifier.verify_json("not json", &public),
            Err(ContingentError::ProofDecoding(_))
        ));
        assert!(matches!(
            verifier.verify_bytes(&[0u8; 3], &public),
            Err(ContingentError::ProofDecoding(_))
        ));
    }
}
