// MiMC-p/p block cipher over the BN254 scalar field, and its R1CS gadget.
//
// Round function: x -> (x + k + c_j)^7 for j in 0..ROUNDS, followed by a final
// key addition. x^7 is a permutation of Fr since gcd(7, r - 1) = 1.
// Block i of a message is enciphered under the tweaked key k + i.

use std::sync::OnceLock;

use ark_bn254::Fr;
use ark_ff::{BigInteger, Field, PrimeField, Zero};
use ark_r1cs_std::fields::{FieldVar, fp::FpVar};
use ark_relations::r1cs::SynthesisError;
use num_bigint::BigUint;
use sha3::{Digest, Keccak256};

pub const EXPONENT: u64 = 7;

/// ceil(log_7(r)) for the 254-bit BN254 scalar field.
pub const ROUNDS: usize = 91;

/// Public seed the round constants are derived from.
pub const ROUND_CONSTANT_SEED: &[u8] = b"mimc";

/// `c_0 = 0`, then `c_j = keccak^j(seed)` read big-endian and reduced mod r.
pub fn round_constants() -> &'static [Fr] {
    static CONSTANTS: OnceLock<Vec<Fr>> = OnceLock::new();
    CONSTANTS.get_or_init(|| {
        let mut constants = Vec::with_capacity(ROUNDS);
        constants.push(Fr::zero());
        let mut digest = Keccak256::digest(ROUND_CONSTANT_SEED);
        while constants.len() < ROUNDS {
            constants.push(Fr::from_be_bytes_mod_order(&digest));
            digest = Keccak256::digest(digest);
        }
        constants
    })
}

/// Limbs of `7^{-1} mod (r - 1)`, the exponent that undoes one round.
fn inverse_exponent() -> &'static [u64] {
    static LIMBS: OnceLock<Vec<u64>> = OnceLock::new();
    LIMBS.get_or_init(|| {
        let order = BigUint::from_bytes_le(&Fr::MODULUS.to_bytes_le()) - 1u32;
        (1..EXPONENT)
            .map(|k| BigUint::from(k) * &order + 1u32)
            .find(|n| (n % EXPONENT) == BigUint::default())
            .map(|n| (n / EXPONENT).to_u64_digits())
            .unwrap_or_default()
    })
}

#[inline]
fn pow7(x: Fr) -> Fr {
    let x2 = x.square();
    let x4 = x2.square();
    x4 * x2 * x
}

/// Keyed permutation with no tweak. Also the compression primitive of the Merkle tree.
pub fn permute(x: Fr, key: Fr) -> Fr {
    let mut x = x;
    for c in round_constants() {
        x = pow7(x + key + c);
    }
    x + key
}

/// Inverse of [`permute`].
pub fn invert(y: Fr, key: Fr) -> Fr {
    let exp = inverse_exponent();
    let mut x = y - key;
    for c in round_constants().iter().rev() {
        x = x.pow(exp) - key - c;
    }
    x
}

/// Key for block `tweak` of a message.
#[inline]
pub fn tweaked_key(key: Fr, tweak: u64) -> Fr {
    key + Fr::from(tweak)
}

pub fn encrypt_block(plaintext: Fr, key: Fr, tweak: u64) -> Fr {
    permute(plaintext, tweaked_key(key, tweak))
}

pub fn decrypt_block(ciphertext: Fr, key: Fr, tweak: u64) -> Fr {
    invert(ciphertext, tweaked_key(key, tweak))
}

/// Encrypts every block under its index as tweak.
pub fn encrypt(plaintext: &[Fr], key: Fr) -> Vec<Fr> {
    plaintext
        .iter()
        .zip(0u64..)
        .map(|(p, i)| encrypt_block(*p, key, i))
        .collect()
}

pub fn decrypt(ciphertext: &[Fr], key: Fr) -> Vec<Fr> {
    ciphertext
        .iter()
        .zip(0u64..)
        .map(|(c, i)| decrypt_block(*c, key, i))
        .collect()
}

/// In-circuit [`permute`]: four multiplication constraints per round, none
/// when both operands are constants.
pub fn permute_gadget(x: &FpVar<Fr>, key: &FpVar<Fr>) -> Result<FpVar<Fr>, SynthesisError> {
    let mut x = x.clone();
    for c in round_constants() {
        let t = &x + key + *c;
        let t2 = t.square()?;
        let t4 = t2.square()?;
        let t6 = &t4 * &t2;
        x = &t6 * &t;
    }
    Ok(x + key)
}

/// In-circuit [`encrypt_block`].
pub fn encrypt_block_gadget(
    plaintext: &FpVar<Fr>,
    key: &FpVar<Fr>,
    tweak: u64,
) -> Result<FpVar<Fr>, SynthesisError> {
    let key = key + Fr::from(tweak);
    permute_gadget(plaintext, &key)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ark_ff::UniformRand;
    use ark_r1cs_std::{R1CSVar, alloc::AllocVar};
    use ark_relations::r1cs::ConstraintSystem;
    use ark_std::test_rng;

    #[test]
    fn round_constants_are_fixed() {
        let constants = round_constants();
        assert_eq!(constants.len(), ROUNDS);
        assert!(constants[0].is_zero());
        let first = Fr::from_be_bytes_mod_order(&Keccak256::digest(b"mimc"));
        assert_eq!(constants[1], first);
        assert_ne!(constants[1], constants[2]);
    }

    #[test]
    fn decrypt_inverts_encrypt() {
        let mut rng = test_rng();
        for tweak in [0u64, 1, 31, 1 << 20] {
            let key = Fr::rand(&mut rng);
            let plaintext = Fr::rand(&mut rng);
            let ciphertext = encrypt_block(plaintext, key, tweak);
            assert_ne!(ciphertext, plaintext);
            assert_eq!(decrypt_block(ciphertext, key, tweak), plaintext);
        }
    }

    #[test]
    fn identical_blocks_encrypt_differently() {
        let mut rng = test_rng();
        let key = Fr::rand(&mut rng);
        let block = Fr::rand(&mut rng);
        let ciphertext = encrypt(&[block, block, block], key);
        assert_ne!(ciphertext[0], ciphertext[1]);
        assert_ne!(ciphertext[1], ciphertext[2]);
        assert_eq!(decrypt(&ciphertext, key), vec![block; 3]);
    }

    #[test]
    fn different_keys_give_different_ciphertext() {
        let mut rng = test_rng();
        let block = Fr::rand(&mut rng);
        let k1 = Fr::rand(&mut rng);
        let k2 = Fr::rand(&mut rng);
        assert_ne!(encrypt_block(block, k1, 0), encrypt_block(block, k2, 0));
    }

    #[test]
    fn gadget_matches_native_cipher() {
        let mut rng = test_rng();
        let key = Fr::rand(&mut rng);
        let plaintext = Fr::rand(&mut rng);

        let cs = ConstraintSystem::<Fr>::new_ref();
        let key_var = FpVar::new_witness(cs.clone(), || Ok(key)).unwrap();
        let pt_var = FpVar::new_witness(cs.clone(), || Ok(plaintext)).unwrap();
        let out = encrypt_block_gadget(&pt_var, &key_var, 5).unwrap();

        assert_eq!(out.value().unwrap(), encrypt_block(plaintext, key, 5));
        assert!(cs.is_satisfied().unwrap());
        assert_eq!(cs.num_constraints(), 4 * ROUNDS);
    }

    #[test]
    fn gadget_on_constants_adds_no_constraints() {
        let cs = ConstraintSystem::<Fr>::new_ref();
        let x = FpVar::constant(Fr::from(3u64));
        let k = FpVar::constant(Fr::from(9u64));
        let out = permute_gadget(&x, &k).unwrap();
        assert_eq!(out.value().unwrap(), permute(Fr::from(3u64), Fr::from(9u64)));
        assert_eq!(cs.num_constraints(), 0);
    }
}
