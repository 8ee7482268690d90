// Packing arbitrary bytes into plaintext blocks, and sealing them under a key.
//
// Layout: an 8-byte little-endian length prefix followed by the data, cut into
// 31-byte chunks. Each chunk is read little-endian into one field element, so
// every block is below 2^248 and therefore canonical. Unused blocks are zero.

use ark_bn254::Fr;
use ark_ff::{BigInteger, PrimeField, UniformRand};
use rand::RngCore;

use crate::config::CircuitConfig;
use crate::error::{ContingentError, Result};
use crate::inputs::{PrivateWitness, PublicInputs};
use crate::key_hash::{KeyHash, hash_key};
use crate::{merkle, mimc};

pub const BYTES_PER_BLOCK: usize = 31;

const LENGTH_PREFIX: usize = 8;

/// Largest payload that fits into `config.num_blocks()` blocks.
pub fn capacity(config: &CircuitConfig) -> usize {
    (config.num_blocks() * BYTES_PER_BLOCK).saturating_sub(LENGTH_PREFIX)
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Document {
    blocks: Vec<Fr>,
}

/// Everything the seller publishes or keeps after encrypting a document.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SealedDocument {
    pub key: Fr,
    pub key_hash: KeyHash,
    pub plaintext: Vec<Fr>,
    pub ciphertext: Vec<Fr>,
    pub plaintext_root: Fr,
}

impl Document {
    pub fn from_bytes(data: &[u8], config: &CircuitConfig) -> Result<Self> {
        let available = capacity(config);
        if data.len() > available {
            return Err(ContingentError::Encoding(format!(
                "{} bytes do not fit into {} blocks ({available} bytes available)",
                data.len(),
                config.num_blocks()
            )));
        }
        let mut framed = Vec::with_capacity(config.num_blocks() * BYTES_PER_BLOCK);
        framed.extend_from_slice(&(data.len() as u64).to_le_bytes());
        framed.extend_from_slice(data);
        framed.resize(config.num_blocks() * BYTES_PER_BLOCK, 0);
        let blocks = framed
            .chunks(BYTES_PER_BLOCK)
            .map(Fr::from_le_bytes_mod_order)
            .collect();
        Ok(Self { blocks })
    }

    pub fn blocks(&self) -> &[Fr] {
        &self.blocks
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut framed = Vec::with_capacity(self.blocks.len() * BYTES_PER_BLOCK);
        for (i, block) in self.blocks.iter().enumerate() {
            let bytes = block.into_bigint().to_bytes_le();
            if bytes[BYTES_PER_BLOCK..].iter().any(|b| *b != 0) {
                return Err(ContingentError::Encoding(format!(
                    "block {i} does not hold a {BYTES_PER_BLOCK}-byte chunk"
                )));
            }
            framed.extend_from_slice(&bytes[..BYTES_PER_BLOCK]);
        }
        if framed.len() < LENGTH_PREFIX {
            return Err(ContingentError::encoding("document too short for its length prefix"));
        }
        let (prefix, body) = framed.split_at(LENGTH_PREFIX);
        let mut len = [0u8; LENGTH_PREFIX];
        len.copy_from_slice(prefix);
        let len = u64::from_le_bytes(len) as usize;
        if len > body.len() {
            return Err(ContingentError::Encoding(format!(
                "length prefix {len} exceeds the {} bytes present",
                body.len()
            )));
        }
        Ok(body[..len].to_vec())
    }

    pub fn seal(&self, key: Fr) -> SealedDocument {
        SealedDocument {
            key,
            key_hash: hash_key(&key),
            plaintext: self.blocks.clone(),
            ciphertext: mimc::encrypt(&self.blocks, key),
            plaintext_root: merkle::build_root(&self.blocks),
        }
    }

    /// Decrypts ciphertext blocks and unpacks the original bytes.
    pub fn open(ciphertext: &[Fr], key: Fr) -> Result<Vec<u8>> {
        Self {
            blocks: mimc::decrypt(ciphertext, key),
        }
        .to_bytes()
    }
}

impl SealedDocument {
    pub fn public_inputs(&self) -> PublicInputs {
        PublicInputs {
            key_hash: self.key_hash,
            ciphertext: self.ciphertext.clone(),
            plaintext_root: self.plaintext_root,
        }
    }

    pub fn witness(&self) -> PrivateWitness {
        PrivateWitness {
            key: self.key,
            plaintext: self.plaintext.clone(),
        }
    }
}

pub fn random_key<R: RngCore>(rng: &mut R) -> Fr {
    Fr::rand(rng)
}
