// Circuit configuration: the block count fixes the shape of the relation and
// travels with every key and proof produced for it.

use serde::{Deserialize, Serialize};

use crate::error::{ContingentError, Result};

/// Largest block count accepted for key generation.
pub const MAX_BLOCKS: usize = 4096;

/// Public inputs besides the ciphertext: two packed key-hash halves and the root.
pub const EXTRA_PUBLIC_INPUTS: usize = 3;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "usize", into = "usize")]
pub struct CircuitConfig {
    num_blocks: usize,
}

impl CircuitConfig {
    pub fn new(num_blocks: usize) -> Result<Self> {
        if num_blocks == 0 {
            return Err(ContingentError::configuration("block count must be at least 1"));
        }
        if num_blocks > MAX_BLOCKS {
            return Err(ContingentError::Configuration(format!(
                "block count {num_blocks} exceeds the maximum of {MAX_BLOCKS}"
            )));
        }
        Ok(Self { num_blocks })
    }

    pub fn num_blocks(&self) -> usize {
        self.num_blocks
    }

    /// Number of field elements the verifier consumes as public input.
    pub fn num_public_inputs(&self) -> usize {
        self.num_blocks + EXTRA_PUBLIC_INPUTS
    }

    /// Fails with a configuration error unless `len` matches the block count.
    pub fn ensure_blocks(&self, what: &str, len: usize) -> Result<()> {
        if len != self.num_blocks {
            return Err(ContingentError::Configuration(format!(
                "{what} has {len} blocks but the circuit is configured for {}",
                self.num_blocks
            )));
        }
        Ok(())
    }

    /// Fails with a configuration error unless both sides were built for the same shape.
    pub fn ensure_matches(&self, other: &CircuitConfig, what: &str) -> Result<()> {
        if self != other {
            return Err(ContingentError::Configuration(format!(
                "{what} is for {} blocks but {} were expected",
                other.num_blocks, self.num_blocks
            )));
        }
        Ok(())
    }
}

impl TryFrom<usize> for CircuitConfig {
    type Error = ContingentError;

    fn try_from(num_blocks: usize) -> Result<Self> {
        Self::new(num_blocks)
    }
}

impl From<CircuitConfig> for usize {
    fn from(config: CircuitConfig) -> usize {
        config.num_blocks
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_zero_and_oversized_block_counts() {
        assert!(matches!(CircuitConfig::new(0), Err(ContingentError::Configuration(_))));
        assert!(matches!(
            CircuitConfig::new(MAX_BLOCKS + 1),
            Err(ContingentError::Configuration(_))
        ));
        assert_eq!(CircuitConfig::new(MAX_BLOCKS).unwrap().num_blocks(), MAX_BLOCKS);
    }

    #[test]
    fn public_input_count_includes_hash_halves_and_root() {
        let config = CircuitConfig::new(16).unwrap();
        assert_eq!(config.num_public_inputs(), 19);
    }

    #[test]
    fn block_mismatch_is_a_configuration_error() {
        let config = CircuitConfig::new(32).unwrap();
        assert!(config.ensure_blocks("ciphertext", 32).is_ok());
        let err = config.ensure_blocks("ciphertext", 16).unwrap_err();
        assert!(matches!(err, ContingentError::Configuration(_)));
    }

    #[test]
    fn serde_goes_through_validation() {
        let config: CircuitConfig = serde_json::from_str("8").unwrap();
        assert_eq!(config.num_blocks(), 8);
        assert!(serde_json::from_str::<CircuitConfig>("0").is_err());
    }
}
