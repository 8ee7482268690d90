// MiMC Merkle commitment over the plaintext blocks.
//
// Leaves are padded with zero up to the next power of two, never fewer than two,
// so the root is always the output of at least one compression.

use ark_bn254::Fr;
use ark_ff::Zero;
use ark_r1cs_std::fields::{FieldVar, fp::FpVar};
use ark_relations::r1cs::SynthesisError;

use crate::mimc;

/// Number of leaves after padding.
pub fn padded_width(num_leaves: usize) -> usize {
    num_leaves.max(2).next_power_of_two()
}

/// Two-to-one compression: `E_left(right) + left + right`.
pub fn compress(left: Fr, right: Fr) -> Fr {
    mimc::permute(right, left) + left + right
}

pub fn build_root(leaves: &[Fr]) -> Fr {
    let mut layer = leaves.to_vec();
    layer.resize(padded_width(leaves.len()), Fr::zero());
    while layer.len() > 1 {
        layer = layer.chunks(2).map(|pair| compress(pair[0], pair[1])).collect();
    }
    layer[0]
}

pub fn compress_gadget(left: &FpVar<Fr>, right: &FpVar<Fr>) -> Result<FpVar<Fr>, SynthesisError> {
    Ok(mimc::permute_gadget(right, left)? + left + right)
}

/// In-circuit [`build_root`]. Padding leaves are constants.
pub fn root_gadget(leaves: &[FpVar<Fr>]) -> Result<FpVar<Fr>, SynthesisError> {
    let mut layer = leaves.to_vec();
    layer.resize(padded_width(leaves.len()), FpVar::zero());
    while layer.len() > 1 {
        layer = layer
            .chunks(2)
            .map(|pair| compress_gadget(&pair[0], &pair[1]))
            .collect::<Result<Vec<_>, _>>()?;
    }
    Ok(layer.swap_remove(0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ark_ff::UniformRand;
    use ark_r1cs_std::{R1CSVar, alloc::AllocVar};
    use ark_relations::r1cs::ConstraintSystem;
    use ark_std::test_rng;

    #[test]
    fn width_is_power_of_two_with_minimum_two() {
        assert_eq!(padded_width(0), 2);
        assert_eq!(padded_width(1), 2);
        assert_eq!(padded_width(2), 2);
        assert_eq!(padded_width(3), 4);
        assert_eq!(padded_width(32), 32);
        assert_eq!(padded_width(33), 64);
    }

    #[test]
    fn short_input_is_zero_padded() {
        let mut rng = test_rng();
        let leaves: Vec<Fr> = (0..3).map(|_| Fr::rand(&mut rng)).collect();
        let mut padded = leaves.clone();
        padded.push(Fr::zero());
        assert_eq!(build_root(&leaves), build_root(&padded));
        assert_eq!(
            build_root(&leaves),
            compress(compress(leaves[0], leaves[1]), compress(leaves[2], Fr::zero()))
        );
    }

    #[test]
    fn single_leaf_is_not_its_own_root() {
        let leaf = Fr::from(42u64);
        assert_eq!(build_root(&[leaf]), compress(leaf, Fr::zero()));
        assert_ne!(build_root(&[leaf]), leaf);
    }

    #[test]
    fn root_binds_order() {
        let a = Fr::from(1u64);
        let b = Fr::from(2u64);
        assert_ne!(build_root(&[a, b]), build_root(&[b, a]));
    }

    #[test]
    fn gadget_matches_native_root() {
        let mut rng = test_rng();
        for n in [1usize, 3, 4] {
            let leaves: Vec<Fr> = (0..n).map(|_| Fr::rand(&mut rng)).collect();
            let cs = ConstraintSystem::<Fr>::new_ref();
            let vars: Vec<_> = leaves
                .iter()
                .map(|l| FpVar::new_witness(cs.clone(), || Ok(*l)).unwrap())
                .collect();
            let root = root_gadget(&vars).unwrap();
            assert_eq!(root.value().unwrap(), build_root(&leaves));
            assert!(cs.is_satisfied().unwrap());
        }
    }
}
