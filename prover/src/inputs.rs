// Typed public inputs and private witness, and their text encodings.
//
// Field elements are canonical by construction once parsed: every decoder here
// rejects representatives >= r instead of reducing them.

use ark_bn254::Fr;
use ark_ff::{BigInteger, PrimeField};
use num_bigint::BigUint;

use crate::config::CircuitConfig;
use crate::error::{ContingentError, Result};
use crate::key_hash::{self, KeyHash};
use crate::{merkle, mimc};

/// What both the seller and buyer know.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PublicInputs {
    pub key_hash: KeyHash,
    pub ciphertext: Vec<Fr>,
    pub plaintext_root: Fr,
}

/// What only the seller knows.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PrivateWitness {
    pub key: Fr,
    pub plaintext: Vec<Fr>,
}

impl PublicInputs {
    pub fn num_blocks(&self) -> usize {
        self.ciphertext.len()
    }

    pub fn check_shape(&self, config: &CircuitConfig) -> Result<()> {
        config.ensure_blocks("ciphertext", self.ciphertext.len())
    }

    /// Verifier input vector: key-hash halves, ciphertext, root.
    pub fn to_field_elements(&self) -> Vec<Fr> {
        let mut out = Vec::with_capacity(self.ciphertext.len() + 3);
        out.extend(key_hash::pack_digest(&self.key_hash));
        out.extend_from_slice(&self.ciphertext);
        out.push(self.plaintext_root);
        out
    }

    /// Parses the human-facing form: hex key hash, decimal (or `0x` hex) field elements.
    pub fn parse<S: AsRef<str>>(
        key_hash: &str,
        ciphertext: &[S],
        plaintext_root: &str,
    ) -> Result<Self> {
        Ok(Self {
            key_hash: key_hash::parse_key_hash(key_hash)?,
            ciphertext: parse_fields(ciphertext)?,
            plaintext_root: parse_field(plaintext_root)?,
        })
    }
}

impl PrivateWitness {
    pub fn check_shape(&self, config: &CircuitConfig) -> Result<()> {
        config.ensure_blocks("plaintext", self.plaintext.len())
    }

    /// The public statement this witness satisfies.
    pub fn derive_public_inputs(&self) -> PublicInputs {
        PublicInputs {
            key_hash: key_hash::hash_key(&self.key),
            ciphertext: mimc::encrypt(&self.plaintext, self.key),
            plaintext_root: merkle::build_root(&self.plaintext),
        }
    }

    pub fn parse<S: AsRef<str>>(key: &str, plaintext: &[S]) -> Result<Self> {
        Ok(Self {
            key: parse_field(key)?,
            plaintext: parse_fields(plaintext)?,
        })
    }
}

fn modulus<F: PrimeField>() -> BigUint {
    BigUint::from_bytes_le(&F::MODULUS.to_bytes_le())
}

/// Interprets an integer as a field element, rejecting values >= the modulus.
pub fn canonical_from_biguint<F: PrimeField>(value: &BigUint) -> Result<F> {
    if *value >= modulus::<F>() {
        return Err(ContingentError::Encoding(format!(
            "{value} is not a canonical field element"
        )));
    }
    Ok(F::from_le_bytes_mod_order(&value.to_bytes_le()))
}

/// Decimal, or hexadecimal with a `0x` prefix.
pub fn parse_field_generic<F: PrimeField>(text: &str) -> Result<F> {
    let text = text.trim();
    let (digits, radix) = match text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        Some(hex) => (hex, 16),
        None => (text, 10),
    };
    if digits.is_empty() {
        return Err(ContingentError::encoding("empty field element"));
    }
    let value = BigUint::parse_bytes(digits.as_bytes(), radix)
        .ok_or_else(|| ContingentError::Encoding(format!("invalid field element {text:?}")))?;
    canonical_from_biguint(&value)
}

pub fn parse_field(text: &str) -> Result<Fr> {
    parse_field_generic(text)
}

pub fn parse_fields<S: AsRef<str>>(texts: &[S]) -> Result<Vec<Fr>> {
    texts.iter().map(|t| parse_field(t.as_ref())).collect()
}

fn to_biguint<F: PrimeField>(value: &F) -> BigUint {
    BigUint::from_bytes_le(&value.into_bigint().to_bytes_le())
}

/// Decimal rendering; zero renders as `0`.
pub fn format_field<F: PrimeField>(value: &F) -> String {
    to_biguint(value).to_str_radix(10)
}

/// `0x`-prefixed, zero-padded big-endian hex.
pub fn format_field_hex<F: PrimeField>(value: &F) -> String {
    format!("0x{}", hex::encode(value.into_bigint().to_bytes_be()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ark_ff::UniformRand;
    use ark_std::test_rng;

    const MODULUS_DEC: &str =
        "21888242871839275222246405745257275088548364400416034343698204186575808495617";

    #[test]
    fn parses_decimal_and_hex() {
        assert_eq!(parse_field("12345").unwrap(), Fr::from(12345u64));
        assert_eq!(parse_field("0x10").unwrap(), Fr::from(16u64));
        assert_eq!(parse_field(" 0 ").unwrap(), Fr::from(0u64));
    }

    #[test]
    fn rejects_non_canonical_and_garbage() {
        assert!(matches!(parse_field(MODULUS_DEC), Err(ContingentError::Encoding(_))));
        assert!(matches!(parse_field("-1"), Err(ContingentError::Encoding(_))));
        assert!(matches!(parse_field("12a"), Err(ContingentError::Encoding(_))));
        assert!(matches!(parse_field(""), Err(ContingentError::Encoding(_))));
        assert!(matches!(parse_field("0x"), Err(ContingentError::Encoding(_))));
    }

    #[test]
    fn text_formats_round_trip() {
        let mut rng = test_rng();
        let x = Fr::rand(&mut rng);
        assert_eq!(parse_field(&format_field(&x)).unwrap(), x);
        assert_eq!(parse_field(&format_field_hex(&x)).unwrap(), x);
        assert_eq!(format_field(&Fr::from(0u64)), "0");
        assert_eq!(format_field_hex(&Fr::from(255u64)).len(), 66);
    }

    #[test]
    fn field_vector_layout() {
        let witness = PrivateWitness {
            key: Fr::from(9u64),
            plaintext: vec![Fr::from(1u64), Fr::from(2u64)],
        };
        let public = witness.derive_public_inputs();
        let elements = public.to_field_elements();
        assert_eq!(elements.len(), 5);
        assert_eq!(&elements[..2], &key_hash::pack_digest(&public.key_hash));
        assert_eq!(&elements[2..4], public.ciphertext.as_slice());
        assert_eq!(elements[4], public.plaintext_root);
    }

    #[test]
    fn shape_checks_report_configuration_errors() {
        let config = CircuitConfig::new(2).unwrap();
        let witness = PrivateWitness {
            key: Fr::from(1u64),
            plaintext: vec![Fr::from(1u64)],
        };
        assert!(matches!(witness.check_shape(&config), Err(ContingentError::Configuration(_))));
        assert!(matches!(
            witness.derive_public_inputs().check_shape(&config),
            Err(ContingentError::Configuration(_))
        ));
    }
}
