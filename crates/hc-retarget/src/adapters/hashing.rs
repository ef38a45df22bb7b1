//! Proof-of-work hashing for the digest-based algorithms.
//!
//! | Algorithm | Function | Crate |
//! |-----------|----------|-------|
//! | Sha256d | SHA-256 applied twice | `sha2` |
//! | Keccak256 | Keccak-256 (pre-standard padding) | `sha3` |
//!
//! Xevan is not provided here; a node plugs in its own [`PowHasher`] for it.

use crate::ports::PowHasher;
use primitive_types::U256;
use sha2::{Digest, Sha256};
use sha3::Keccak256;
use shared_types::AlgoTag;

/// Compute SHA-256 hash of data
#[inline]
pub fn sha256(data: &[u8]) -> [u8; 32] {
    Sha256::digest(data).into()
}

/// Compute double SHA-256 hash (Bitcoin-style)
#[inline]
pub fn sha256d(data: &[u8]) -> [u8; 32] {
    sha256(&sha256(data))
}

/// Compute Keccak-256 hash of data
#[inline]
pub fn keccak256(data: &[u8]) -> [u8; 32] {
    Keccak256::digest(data).into()
}

/// [`PowHasher`] for Sha256d and Keccak256.
#[derive(Debug, Clone, Copy, Default)]
pub struct DigestPowHasher;

impl PowHasher for DigestPowHasher {
    fn pow_hash(&self, algo: AlgoTag, header_bytes: &[u8]) -> Option<U256> {
        let digest = match algo {
            AlgoTag::Sha256d => sha256d(header_bytes),
            AlgoTag::Keccak256 => keccak256(header_bytes),
            AlgoTag::Legacy | AlgoTag::ProofOfStake | AlgoTag::Xevan => return None,
        };
        Some(U256::from_little_endian(&digest))
    }
}
