// SHA-256 commitment to the encryption key.
//
// The key is encoded as its 32-byte little-endian integer representative. Inside
// the circuit the digest is split into two 128-bit halves, each packed
// little-endian into one public field element.

use ark_bn254::Fr;
use ark_crypto_primitives::crh::sha256::constraints::Sha256Gadget;
use ark_ff::{BigInteger, PrimeField};
use ark_r1cs_std::prelude::*;
use ark_r1cs_std::fields::fp::FpVar;
use ark_relations::r1cs::SynthesisError;
use sha2::{Digest, Sha256};

use crate::error::{ContingentError, Result};

pub const KEY_HASH_LEN: usize = 32;

/// Width of one packed digest half, in bytes.
const HALF_LEN: usize = KEY_HASH_LEN / 2;

pub type KeyHash = [u8; KEY_HASH_LEN];

/// Canonical fixed-width encoding of a key.
pub fn key_bytes(key: &Fr) -> [u8; 32] {
    let mut out = [0u8; 32];
    out.copy_from_slice(&key.into_bigint().to_bytes_le());
    out
}

pub fn hash_key(key: &Fr) -> KeyHash {
    Sha256::digest(key_bytes(key)).into()
}

/// The two public field elements standing for a key hash in the circuit.
pub fn pack_digest(hash: &KeyHash) -> [Fr; 2] {
    [
        Fr::from_le_bytes_mod_order(&hash[..HALF_LEN]),
        Fr::from_le_bytes_mod_order(&hash[HALF_LEN..]),
    ]
}

pub fn parse_key_hash(hex_str: &str) -> Result<KeyHash> {
    let hex_str = hex_str.trim();
    let hex_str = hex_str.strip_prefix("0x").unwrap_or(hex_str);
    let bytes = hex::decode(hex_str)
        .map_err(|e| ContingentError::Encoding(format!("key hash is not hex: {e}")))?;
    key_hash_from_slice(&bytes)
}

pub fn key_hash_from_slice(bytes: &[u8]) -> Result<KeyHash> {
    bytes.try_into().map_err(|_| {
        ContingentError::Encoding(format!(
            "key hash must be {KEY_HASH_LEN} bytes, got {}",
            bytes.len()
        ))
    })
}

/// SHA-256 of the key's canonical bit decomposition. `to_bytes` enforces the
/// decomposition is below the modulus, so the encoding is unique.
pub fn hash_key_gadget(key: &FpVar<Fr>) -> std::result::Result<Vec<UInt8<Fr>>, SynthesisError> {
    let bytes = key.to_bytes()?;
    Ok(Sha256Gadget::digest(&bytes)?.0)
}

/// Enforces `pack_digest(SHA256(key)) == packed`.
pub fn enforce_key_hash(
    key: &FpVar<Fr>,
    packed: &[FpVar<Fr>],
) -> std::result::Result<(), SynthesisError> {
    let digest = hash_key_gadget(key)?;
    if packed.len() != 2 {
        return Err(SynthesisError::Unsatisfiable);
    }
    for (half, expected) in digest.chunks(HALF_LEN).zip(packed) {
        let mut bits = Vec::with_capacity(HALF_LEN * 8);
        for byte in half {
            bits.extend(byte.to_bits_le()?);
        }
        Boolean::le_bits_to_fp_var(&bits)?.enforce_equal(expected)?;
    }
    Ok(())
}
