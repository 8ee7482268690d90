// Error taxonomy shared by key generation, proving, verification and the
// encoding layers around them.

use ark_relations::r1cs::SynthesisError;

/// Everything that can go wrong in the contingent-payment relation engine.
///
/// A proof that decodes cleanly but fails the pairing check is not an error:
/// verification returns `Ok(false)` for it.
#[derive(Debug, thiserror::Error)]
pub enum ContingentError {
    /// Block count of the inputs disagrees with the key or proof, or is out of range.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Malformed field element, hash or key encoding.
    #[error("encoding error: {0}")]
    Encoding(String),

    /// The witness does not satisfy the relation; no proof was produced.
    #[error("witness does not satisfy the relation: {0}")]
    ConstraintViolation(String),

    /// The Groth16 backend failed after the witness was accepted.
    #[error("proof generation failed: {0}")]
    ProofGeneration(String),

    /// Structurally malformed or truncated proof data.
    #[error("malformed proof: {0}")]
    ProofDecoding(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The caller abandoned a proof before it completed.
    #[error("proving was cancelled")]
    Cancelled,
}

impl ContingentError {
    pub(crate) fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    pub(crate) fn encoding(msg: impl Into<String>) -> Self {
        Self::Encoding(msg.into())
    }

    pub(crate) fn proof_decoding(msg: impl Into<String>) -> Self {
        Self::ProofDecoding(msg.into())
    }

    pub(crate) fn synthesis(err: SynthesisError) -> Self {
        Self::ProofGeneration(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ContingentError>;
