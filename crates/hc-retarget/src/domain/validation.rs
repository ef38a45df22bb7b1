//! Proof-of-work check: a claimed hash against a claimed target.

use super::compact;
use super::params::ConsensusParams;
use primitive_types::U256;
use shared_types::{AlgoTag, Hash};

/// Reasons a proof is rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProofRejection {
    /// `bits` decodes to a negative, zero or overflowing target.
    MalformedTarget,
    /// Stake blocks carry no proof of work.
    NotProofOfWork,
    /// The algorithm has no ceiling on this network.
    AlgorithmDisabled,
    /// The target is easier than the algorithm's ceiling.
    AboveCeiling,
    /// The hash does not meet the target.
    HashAboveTarget,
}

/// Hash bytes in on-wire order read as a 256-bit number.
pub fn hash_to_u256(hash: &Hash) -> U256 {
    U256::from_little_endian(hash)
}

/// `true` when `hash` satisfies `bits` for `algo`.
pub fn check_proof_of_work(hash: U256, bits: u32, algo: AlgoTag, params: &ConsensusParams) -> bool {
    verify_proof_of_work(hash, bits, algo, params).is_ok()
}

/// [`check_proof_of_work`] with the rejection reason.
pub fn verify_proof_of_work(
    hash: U256,
    bits: u32,
    algo: AlgoTag,
    params: &ConsensusParams,
) -> Result<(), ProofRejection> {
    let decoded = compact::to_full(bits);
    if !decoded.is_valid() {
        return Err(ProofRejection::MalformedTarget);
    }
    if algo == AlgoTag::ProofOfStake {
        return Err(ProofRejection::NotProofOfWork);
    }
    if !params.is_enabled(algo) {
        return Err(ProofRejection::AlgorithmDisabled);
    }
    if decoded.target > params.pow_limit(algo) {
        return Err(ProofRejection::AboveCeiling);
    }
    if hash > decoded.target {
        return Err(ProofRejection::HashAboveTarget);
    }
    Ok(())
}
