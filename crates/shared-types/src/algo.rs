//! # Algorithm Tags
//!
//! Several proof-of-work hash functions and the proof-of-stake path share one
//! block height sequence. Which one produced a block is encoded in its version
//! field once the chain passed the first fork; older blocks carry no tag.
//!
//! ## Version Layout
//!
//! ```text
//!  31      29 28            16 15        8 7          0
//! ┌──────────┬────────────────┬───────────┬────────────┐
//! │ 001 (top)│   (reserved)   │ algo index│ (reserved) │
//! └──────────┴────────────────┴───────────┴────────────┘
//! ```
//!
//! Versions below [`FIRST_FORK_VERSION`] predate explicit tagging and decode to
//! [`AlgoTag::Legacy`]. So does any tagged version whose index is outside the
//! enumeration.

use serde::{Deserialize, Serialize};
use std::fmt;

/// First block version that carries an explicit algorithm tag.
pub const FIRST_FORK_VERSION: i32 = 0x2000_0000;

/// Last block version used before explicit tagging.
pub const LEGACY_BLOCK_VERSION: i32 = 4;

/// Bit offset of the algorithm index inside the version field.
pub const ALGO_VERSION_SHIFT: u32 = 8;

/// Mask selecting the algorithm index bits of the version field.
pub const ALGO_VERSION_MASK: i32 = 0xff << ALGO_VERSION_SHIFT;

/// Number of tagged algorithms (proof-of-stake included).
pub const ALGO_COUNT: usize = 4;

/// Identifies which path produced a block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlgoTag {
    /// Pre-fork block without an explicit tag (or an unknown tag).
    Legacy,
    /// Proof-of-stake block.
    ProofOfStake,
    /// Xevan proof-of-work.
    Xevan,
    /// Double SHA-256 proof-of-work.
    Sha256d,
    /// Keccak-256 proof-of-work.
    Keccak256,
}

impl AlgoTag {
    /// All tagged algorithms, ordered by index.
    pub const TAGGED: [AlgoTag; ALGO_COUNT] = [
        AlgoTag::ProofOfStake,
        AlgoTag::Xevan,
        AlgoTag::Sha256d,
        AlgoTag::Keccak256,
    ];

    /// Index into per-algorithm tables, `None` for [`AlgoTag::Legacy`].
    pub const fn index(self) -> Option<usize> {
        match self {
            AlgoTag::Legacy => None,
            AlgoTag::ProofOfStake => Some(0),
            AlgoTag::Xevan => Some(1),
            AlgoTag::Sha256d => Some(2),
            AlgoTag::Keccak256 => Some(3),
        }
    }

    /// Tag for a table index, `None` when out of range.
    pub fn from_index(index: usize) -> Option<Self> {
        Self::TAGGED.get(index).copied()
    }

    /// Decode the algorithm tag from a block version.
    ///
    /// Never fails: untagged and malformed versions map to `Legacy`.
    pub fn from_version(version: i32) -> Self {
        if version < FIRST_FORK_VERSION {
            return AlgoTag::Legacy;
        }
        let index = ((version & ALGO_VERSION_MASK) >> ALGO_VERSION_SHIFT) as usize;
        Self::from_index(index).unwrap_or(AlgoTag::Legacy)
    }

    /// Smallest tagged block version for this algorithm.
    pub fn to_version(self) -> Option<i32> {
        self.index()
            .map(|index| FIRST_FORK_VERSION | ((index as i32) << ALGO_VERSION_SHIFT))
    }

    /// True for every tag except `Legacy`.
    pub const fn is_tagged(self) -> bool {
        !matches!(self, AlgoTag::Legacy)
    }

    /// True for tagged proof-of-work algorithms.
    pub const fn is_proof_of_work(self) -> bool {
        matches!(
            self,
            AlgoTag::Xevan | AlgoTag::Sha256d | AlgoTag::Keccak256
        )
    }
}

impl fmt::Display for AlgoTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AlgoTag::Legacy => "legacy",
            AlgoTag::ProofOfStake => "pos",
            AlgoTag::Xevan => "xevan",
            AlgoTag::Sha256d => "sha256d",
            AlgoTag::Keccak256 => "keccak256",
        };
        f.write_str(name)
    }
}
