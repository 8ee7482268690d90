// Core zkSNARK logic for zero-knowledge contingent payments.
//
// A seller proves that a published ciphertext is the MiMC encryption, under a
// key committed to by SHA256(key), of a plaintext committed to by a Merkle
// root, without revealing the key or the plaintext. Groth16 over BN254.
//
// Includes:
// - `keys::generate_keys`: circuit-specific setup for a block count
// - `prove::Prover`: local witness check, then a Groth16 proof
// - `verify::Verifier`: pairing check against the public inputs
// - `engine::Contingent`: owns the keys for one block count
// - `document`: packs bytes into blocks and seals them under a key
// - `utils`: key/proof files and verifying-key export for on-chain embedding

pub mod circuit;
pub mod config;
pub mod document;
pub mod encoding;
pub mod engine;
pub mod error;
pub mod inputs;
pub mod key_hash;
pub mod keys;
pub mod merkle;
pub mod mimc;
pub mod proof;
pub mod prove;
pub mod utils;
pub mod verify;

pub use ark_bn254::Fr;

pub use config::{CircuitConfig, MAX_BLOCKS};
pub use document::{Document, SealedDocument};
pub use engine::Contingent;
pub use error::{ContingentError, Result};
pub use inputs::{PrivateWitness, PublicInputs};
pub use key_hash::{KeyHash, hash_key};
pub use keys::{ProvingKey, VerifyingKey, generate_keys};
pub use proof::ContingentProof;
pub use prove::{CancelToken, Prover};
pub use verify::Verifier;
