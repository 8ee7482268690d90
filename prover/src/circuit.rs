// Defines the zkSNARK constraint system for the contingent-payment relation.
// Public inputs are the key hash (two packed halves), the ciphertext blocks and
// the plaintext Merkle root; the key and the plaintext blocks are witnesses.
//
//   SHA256(key) == key_hash
//   MiMC(plaintext[i], key + i) == ciphertext[i]   for every block i
//   MerkleRoot(plaintext) == plaintext_root
//
// Encryption is checked rather than decryption since x^7 is cheaper than x^(1/7).

use ark_bn254::Fr;
use ark_r1cs_std::alloc::AllocVar;
use ark_r1cs_std::eq::EqGadget;
use ark_r1cs_std::fields::fp::FpVar;
use ark_relations::r1cs::{
    ConstraintSynthesizer, ConstraintSystem, ConstraintSystemRef, OptimizationGoal, SynthesisError,
};
use tracing::debug;

use crate::config::CircuitConfig;
use crate::error::{ContingentError, Result};
use crate::inputs::{PrivateWitness, PublicInputs};
use crate::{key_hash, merkle, mimc};

#[derive(Clone)]
pub struct ContingentCircuit {
    pub config: CircuitConfig,
    pub key_hash: Option<[Fr; 2]>,
    pub ciphertext: Option<Vec<Fr>>,
    pub plaintext_root: Option<Fr>,
    pub key: Option<Fr>,
    pub plaintext: Option<Vec<Fr>>,
}

impl ContingentCircuit {
    /// Shape only, for key generation.
    pub fn blank(config: CircuitConfig) -> Self {
        Self {
            config,
            key_hash: None,
            ciphertext: None,
            plaintext_root: None,
            key: None,
            plaintext: None,
        }
    }

    /// Fully assigned instance. Sizes must already match `config`.
    pub fn assigned(
        config: CircuitConfig,
        public: &PublicInputs,
        witness: &PrivateWitness,
    ) -> Result<Self> {
        public.check_shape(&config)?;
        witness.check_shape(&config)?;
        Ok(Self {
            config,
            key_hash: Some(key_hash::pack_digest(&public.key_hash)),
            ciphertext: Some(public.ciphertext.clone()),
            plaintext_root: Some(public.plaintext_root),
            key: Some(witness.key),
            plaintext: Some(witness.plaintext.clone()),
        })
    }

    /// Synthesises the assignment and reports the first violated constraint, if
    /// any, by the check it belongs to. Returns the number of constraints on
    /// success.
    pub fn check_satisfied(self) -> Result<usize> {
        let cs = ConstraintSystem::<Fr>::new_ref();
        cs.set_optimization_goal(OptimizationGoal::Constraints);
        let regions = self.synthesize(cs.clone()).map_err(ContingentError::synthesis)?;
        let num_constraints = cs.num_constraints();
        match first_unsatisfied(&cs).map_err(ContingentError::synthesis)? {
            None => Ok(num_constraints),
            Some(index) => {
                let region = regions
                    .iter()
                    .find(|(end, _)| index < *end)
                    .map_or("circuit", |(_, label)| label.as_str());
                let detail = format!("{region} (constraint {index})");
                Err(ContingentError::ConstraintViolation(detail))
            }
        }
    }

    /// Allocates inputs in verifier order, then witnesses, then enforces the
    /// relation. Returns each check's label with the constraint index it ends at.
    fn synthesize(
        self,
        cs: ConstraintSystemRef<Fr>,
    ) -> std::result::Result<Vec<(usize, String)>, SynthesisError> {
        let n = self.config.num_blocks();

        let key_hash = (0..2)
            .map(|i| {
                FpVar::new_input(cs.clone(), || {
                    self.key_hash.map(|h| h[i]).ok_or(SynthesisError::AssignmentMissing)
                })
            })
            .collect::<std::result::Result<Vec<_>, _>>()?;
        let ciphertext = (0..n)
            .map(|i| FpVar::new_input(cs.clone(), || element(&self.ciphertext, i)))
            .collect::<std::result::Result<Vec<_>, _>>()?;
        let plaintext_root = FpVar::new_input(cs.clone(), || {
            self.plaintext_root.ok_or(SynthesisError::AssignmentMissing)
        })?;

        let key = FpVar::new_witness(cs.clone(), || {
            self.key.ok_or(SynthesisError::AssignmentMissing)
        })?;
        let plaintext = (0..n)
            .map(|i| FpVar::new_witness(cs.clone(), || element(&self.plaintext, i)))
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let mut regions = Vec::with_capacity(n + 2);
        key_hash::enforce_key_hash(&key, &key_hash)?;
        regions.push((cs.num_constraints(), "key hash".to_owned()));

        for ((block, expected), tweak) in plaintext.iter().zip(&ciphertext).zip(0u64..) {
            mimc::encrypt_block_gadget(block, &key, tweak)?.enforce_equal(expected)?;
            regions.push((cs.num_constraints(), format!("ciphertext block {tweak}")));
        }

        merkle::root_gadget(&plaintext)?.enforce_equal(&plaintext_root)?;
        regions.push((cs.num_constraints(), "plaintext root".to_owned()));

        debug!(
            num_blocks = n,
            key_hash = regions[0].0,
            cipher = regions[n].0 - regions[0].0,
            merkle = regions[n + 1].0 - regions[n].0,
            "synthesised contingent circuit"
        );
        Ok(regions)
    }
}

/// Index of the first constraint the assignment violates. Evaluates the
/// finalized matrices directly, as the Groth16 prover reads them.
fn first_unsatisfied(
    cs: &ConstraintSystemRef<Fr>,
) -> std::result::Result<Option<usize>, SynthesisError> {
    cs.finalize();
    let matrices = cs.to_matrices().ok_or(SynthesisError::MissingCS)?;
    let system = cs.borrow().ok_or(SynthesisError::MissingCS)?;
    let num_instance = system.num_instance_variables;
    let assignment = |var: usize| {
        if var < num_instance {
            system.instance_assignment.get(var).copied()
        } else {
            system.witness_assignment.get(var - num_instance).copied()
        }
    };
    let evaluate = |row: &[(Fr, usize)]| {
        row.iter()
            .map(|(coeff, var)| assignment(*var).map(|value| *coeff * value))
            .sum::<Option<Fr>>()
            .ok_or(SynthesisError::AssignmentMissing)
    };
    for i in 0..matrices.num_constraints {
        if evaluate(&matrices.a[i])? * evaluate(&matrices.b[i])? != evaluate(&matrices.c[i])? {
            return Ok(Some(i));
        }
    }
    Ok(None)
}

fn element(values: &Option<Vec<Fr>>, i: usize) -> std::result::Result<Fr, SynthesisError> {
    values
        .as_ref()
        .and_then(|v| v.get(i).copied())
        .ok_or(SynthesisError::AssignmentMissing)
}

impl ConstraintSynthesizer<Fr> for ContingentCircuit {
    fn generate_constraints(
        self,
        cs: ConstraintSystemRef<Fr>,
    ) -> std::result::Result<(), SynthesisError> {
        self.synthesize(cs).map(|_| ())
    }
}
