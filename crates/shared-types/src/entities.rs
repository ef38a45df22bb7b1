//! # Core Chain Entities
//!
//! The subset of block-index data the retargeting engine reads, plus the
//! candidate header it computes a target for.

use crate::algo::{AlgoTag, FIRST_FORK_VERSION, LEGACY_BLOCK_VERSION};
use serde::{Deserialize, Serialize};
use std::fmt;

// Re-export the big integer types used across the workspace
pub use primitive_types::{U256, U512};

/// A 32-byte block hash in internal (little-endian) byte order.
pub type Hash = [u8; 32];

/// Stable arena key of a node in the block index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub u32);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One block on any branch ever seen.
///
/// Owned by the chain-state component. The engine follows `prev` links and
/// never keeps a node past a single call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockIndexNode {
    /// Block hash (internal byte order).
    pub hash: Hash,
    /// Height in the chain; genesis is 0.
    pub height: u32,
    /// Block timestamp (Unix seconds).
    pub time: i64,
    /// Compact difficulty target the block satisfied.
    pub bits: u32,
    /// Block version; encodes the algorithm tag after the first fork.
    pub version: i32,
    /// Whether the block was produced by staking.
    pub proof_of_stake: bool,
    /// Predecessor, `None` only for genesis.
    pub prev: Option<NodeId>,
}

impl BlockIndexNode {
    /// Algorithm tag decoded from the version field.
    pub fn algo(&self) -> AlgoTag {
        AlgoTag::from_version(self.version)
    }

    /// True when the node has no predecessor.
    pub fn is_genesis(&self) -> bool {
        self.prev.is_none()
    }
}

/// The header fields of a block being validated or assembled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateHeader {
    /// Block version.
    pub version: i32,
    /// Block timestamp (Unix seconds).
    pub time: i64,
    /// Stake flag supplied by the caller; only consulted for untagged versions.
    pub proof_of_stake: bool,
}

impl CandidateHeader {
    /// Header carrying the version for `algo`; the stake flag follows the tag.
    pub fn tagged(algo: AlgoTag, time: i64) -> Self {
        let version = algo.to_version().unwrap_or(LEGACY_BLOCK_VERSION);
        Self {
            version,
            time,
            proof_of_stake: algo == AlgoTag::ProofOfStake,
        }
    }

    /// Header with an explicit version and stake flag.
    pub fn new(version: i32, time: i64, proof_of_stake: bool) -> Self {
        Self {
            version,
            time,
            proof_of_stake,
        }
    }

    /// Algorithm tag decoded from the version field.
    pub fn algo(&self) -> AlgoTag {
        AlgoTag::from_version(self.version)
    }

    /// Proof-of-stake flag: derived from the tag when tagged.
    pub fn is_proof_of_stake(&self) -> bool {
        match self.algo() {
            AlgoTag::Legacy => self.proof_of_stake,
            algo => algo == AlgoTag::ProofOfStake,
        }
    }

    /// True once the version is at or past the first fork.
    pub fn is_post_fork(&self) -> bool {
        self.version >= FIRST_FORK_VERSION
    }
}

/// Parse a hash from its conventional display form (big-endian hex).
pub fn hash_from_display_hex(display: &str) -> Option<Hash> {
    let trimmed = display.strip_prefix("0x").unwrap_or(display);
    let mut bytes = hex::decode(trimmed).ok()?;
    if bytes.len() != 32 {
        return None;
    }
    bytes.reverse();
    let mut hash = [0u8; 32];
    hash.copy_from_slice(&bytes);
    Some(hash)
}

/// Render a hash in its conventional display form (big-endian hex).
pub fn hash_to_display_hex(hash: &Hash) -> String {
    let mut bytes = *hash;
    bytes.reverse();
    hex::encode(bytes)
}
