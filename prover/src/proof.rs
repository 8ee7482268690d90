// Proof container and its two interchange forms: a versioned binary frame and a
// field-named JSON object with affine coordinates in big-endian hex.

use ark_bn254::{Bn254, Fq, Fq2, G1Affine, G2Affine};
use ark_ec::AffineRepr;
use ark_ff::Zero;
use ark_groth16::Proof;
use ark_serialize::{CanonicalDeserialize, CanonicalSerialize};
use serde::{Deserialize, Serialize};

use crate::config::CircuitConfig;
use crate::encoding::{FORMAT_VERSION, PROOF_MAGIC, read_header, write_header};
use crate::error::{ContingentError, Result};
use crate::inputs::{format_field_hex, parse_field_generic};

/// A Groth16 proof tagged with the block count of the circuit it was made for.
#[derive(Clone, Debug, PartialEq)]
pub struct ContingentProof {
    config: CircuitConfig,
    inner: Proof<Bn254>,
}

#[derive(Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct ProofJson {
    version: u16,
    num_blocks: usize,
    a: [String; 2],
    b: [[String; 2]; 2],
    c: [String; 2],
}

impl ContingentProof {
    pub fn new(config: CircuitConfig, inner: Proof<Bn254>) -> Self {
        Self { config, inner }
    }

    pub fn config(&self) -> CircuitConfig {
        self.config
    }

    pub fn num_blocks(&self) -> usize {
        self.config.num_blocks()
    }

    pub fn inner(&self) -> &Proof<Bn254> {
        &self.inner
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        write_header(&mut out, PROOF_MAGIC, &self.config);
        self.inner
            .serialize_compressed(&mut out)
            .map_err(|e| ContingentError::Encoding(format!("proof: {e}")))?;
        Ok(out)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let (config, mut payload) =
            read_header(bytes, PROOF_MAGIC).map_err(ContingentError::ProofDecoding)?;
        let inner = Proof::<Bn254>::deserialize_compressed(&mut payload)
            .map_err(|e| ContingentError::ProofDecoding(e.to_string()))?;
        if !payload.is_empty() {
            return Err(ContingentError::proof_decoding("trailing bytes after proof"));
        }
        Ok(Self { config, inner })
    }

    pub fn to_json(&self) -> Result<String> {
        let json = ProofJson {
            version: FORMAT_VERSION,
            num_blocks: self.config.num_blocks(),
            a: g1_to_hex(&self.inner.a),
            b: g2_to_hex(&self.inner.b),
            c: g1_to_hex(&self.inner.c),
        };
        serde_json::to_string_pretty(&json).map_err(|e| ContingentError::Encoding(e.to_string()))
    }

    pub fn from_json(text: &str) -> Result<Self> {
        let json: ProofJson =
            serde_json::from_str(text).map_err(|e| ContingentError::ProofDecoding(e.to_string()))?;
        if json.version != FORMAT_VERSION {
            return Err(ContingentError::ProofDecoding(format!(
                "unsupported proof version {}",
                json.version
            )));
        }
        let config = CircuitConfig::new(json.num_blocks)
            .map_err(|e| ContingentError::ProofDecoding(e.to_string()))?;
        let inner = Proof {
            a: g1_from_hex(&json.a).map_err(|e| ContingentError::ProofDecoding(format!("A: {e}")))?,
            b: g2_from_hex(&json.b).map_err(|e| ContingentError::ProofDecoding(format!("B: {e}")))?,
            c: g1_from_hex(&json.c).map_err(|e| ContingentError::ProofDecoding(format!("C: {e}")))?,
        };
        Ok(Self { config, inner })
    }
}

// The point at infinity is written as (0, 0), the EVM precompile convention.

fn g1_to_hex(p: &G1Affine) -> [String; 2] {
    let (x, y) = p.xy().map(|(x, y)| (*x, *y)).unwrap_or((Fq::zero(), Fq::zero()));
    [format_field_hex(&x), format_field_hex(&y)]
}

fn g2_to_hex(p: &G2Affine) -> [[String; 2]; 2] {
    let (x, y) = p.xy().map(|(x, y)| (*x, *y)).unwrap_or((Fq2::zero(), Fq2::zero()));
    [
        [format_field_hex(&x.c0), format_field_hex(&x.c1)],
        [format_field_hex(&y.c0), format_field_hex(&y.c1)],
    ]
}

fn fq(text: &str) -> std::result::Result<Fq, String> {
    parse_field_generic::<Fq>(text).map_err(|e| e.to_string())
}

fn g1_from_hex(coords: &[String; 2]) -> std::result::Result<G1Affine, String> {
    let x = fq(&coords[0])?;
    let y = fq(&coords[1])?;
    if x.is_zero() && y.is_zero() {
        return Ok(G1Affine::identity());
    }
    let p = G1Affine::new_unchecked(x, y);
    if !p.is_on_curve() {
        return Err("point is not on the curve".into());
    }
    if !p.is_in_correct_subgroup_assuming_on_curve() {
        return Err("point is not in the prime-order subgroup".into());
    }
    Ok(p)
}

fn g2_from_hex(coords: &[[String; 2]; 2]) -> std::result::Result<G2Affine, String> {
    let x = Fq2::new(fq(&coords[0][0])?, fq(&coords[0][1])?);
    let y = Fq2::new(fq(&coords[1][0])?, fq(&coords[1][1])?);
    if x.is_zero() && y.is_zero() {
        return Ok(G2Affine::identity());
    }
    let p = G2Affine::new_unchecked(x, y);
    if !p.is_on_curve() {
        return Err("point is not on the curve".into());
    }
    if !p.is_in_correct_subgroup_assuming_on_curve() {
        return Err("point is not in the prime-order subgroup".into());
    }
    Ok(p)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ark_ec::CurveGroup;
    use ark_ff::UniformRand;
    use ark_std::test_rng;

    fn random_proof() -> ContingentProof {
        let mut rng = test_rng();
        let inner = Proof {
            a: ark_bn254::G1Projective::rand(&mut rng).into_affine(),
            b: ark_bn254::G2Projective::rand(&mut rng).into_affine(),
            c: ark_bn254::G1Projective::rand(&mut rng).into_affine(),
        };
        ContingentProof::new(CircuitConfig::new(8).unwrap(), inner)
    }

    #[test]
    fn json_names_every_component() {
        let proof = random_proof();
        let text = proof.to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["version"], 1);
        assert_eq!(value["num_blocks"], 8);
        assert!(value["a"][0].as_str().unwrap().starts_with("0x"));
        assert_eq!(value["b"][1][1].as_str().unwrap().len(), 66);
        assert_eq!(ContingentProof::from_json(&text).unwrap(), proof);
    }

    #[test]
    fn identity_points_use_zero_coordinates() {
        let mut proof = random_proof();
        proof.inner.c = G1Affine::identity();
        let text = proof.to_json().unwrap();
        assert!(text.contains(&format!("\"{}\"", format_field_hex(&Fq::zero()))));
        assert_eq!(ContingentProof::from_json(&text).unwrap(), proof);
    }

    #[test]
    fn json_rejects_malformed_documents() {
        let proof = random_proof();
        let text = proof.to_json().unwrap();

        assert!(matches!(
            ContingentProof::from_json(&text[..text.len() / 2]),
            Err(ContingentError::ProofDecoding(_))
        ));
        assert!(matches!(ContingentProof::from_json("{}"), Err(ContingentError::ProofDecoding(_))));

        let mut value: serde_json::Value = serde_json::from_str(&text).unwrap();
        value["a"][1] = serde_json::Value::String("0x05".into());
        assert!(matches!(
            ContingentProof::from_json(&value.to_string()),
            Err(ContingentError::ProofDecoding(_))
        ));

        let mut value: serde_json::Value = serde_json::from_str(&text).unwrap();
        value["num_blocks"] = serde_json::Value::from(0);
        assert!(matches!(
            ContingentProof::from_json(&value.to_string()),
            Err(ContingentError::ProofDecoding(_))
        ));

        let mut value: serde_json::Value = serde_json::from_str(&text).unwrap();
        value["version"] = serde_json::Value::from(2);
        assert!(matches!(
            ContingentProof::from_json(&value.to_string()),
            Err(ContingentError::ProofDecoding(_))
        ));
    }

    #[test]
    fn json_rejects_non_canonical_coordinates() {
        let proof = random_proof();
        let mut value: serde_json::Value = serde_json::from_str(&proof.to_json().unwrap()).unwrap();
        value["c"][0] = serde_json::Value::String(format!("0x{}", "ff".repeat(32)));
        assert!(matches!(
            ContingentProof::from_json(&value.to_string()),
            Err(ContingentError::ProofDecoding(_))
        ));
    }

    #[test]
    fn binary_rejects_truncation() {
        let proof = random_proof();
        let bytes = proof.to_bytes().unwrap();
        assert_eq!(ContingentProof::from_bytes(&bytes).unwrap(), proof);
        assert!(matches!(
            ContingentProof::from_bytes(&bytes[..bytes.len() - 1]),
            Err(ContingentError::ProofDecoding(_))
        ));
        assert!(matches!(
            ContingentProof::from_bytes(&bytes[..4]),
            Err(ContingentError::ProofDecoding(_))
        ));
    }
}
