//! Consensus parameters.
//!
//! Created once per process from the network selection and shared read-only
//! (`Arc<ConsensusParams>`) by every validation thread.

use crate::error::{Result, RetargetError};
use primitive_types::U256;
use serde::{Deserialize, Serialize};
use shared_types::{hash_from_display_hex, AlgoTag, BlockIndexNode, CandidateHeader, ALGO_COUNT};

use super::compact;

/// Network selection.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    /// Production network.
    #[default]
    Main,
    /// Public test network.
    Testnet,
    /// Signed test network.
    Signet,
    /// Local regression testing.
    Regtest,
}

impl std::fmt::Display for Network {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Network::Main => "main",
            Network::Testnet => "testnet",
            Network::Signet => "signet",
            Network::Regtest => "regtest",
        };
        f.write_str(name)
    }
}

/// A block whose required target was hard-coded after an earlier release
/// computed it wrongly.
///
/// Matched by exact equality on every field except `bits`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DifficultyOverride {
    /// Height of the overridden block.
    pub height: u32,
    /// Exact block timestamp.
    pub time: i64,
    /// Exact block version.
    pub version: i32,
    /// Hash of the parent block, display hex.
    pub prev_hash: &'static str,
    /// Target the block is required to carry.
    pub bits: u32,
}

impl DifficultyOverride {
    /// True when the candidate at `height` on top of `tip` is this block.
    ///
    /// Only untagged proof-of-stake candidates are eligible.
    pub fn matches(&self, height: u32, candidate: &CandidateHeader, tip: &BlockIndexNode) -> bool {
        self.height == height
            && candidate.version == self.version
            && candidate.time == self.time
            && candidate.algo() == AlgoTag::Legacy
            && candidate.is_proof_of_stake()
            && hash_from_display_hex(self.prev_hash).is_some_and(|prev| prev == tip.hash)
    }
}

/// The first proof-of-stake blocks on mainnet reused the proof-of-work
/// calculation.
pub const MAINNET_DIFFICULTY_OVERRIDES: &[DifficultyOverride] = &[
    DifficultyOverride {
        height: 43_201,
        time: 1_525_809_739,
        version: 4,
        prev_hash: "00000001697a06cf5e6f8a067770fa42f15218ca0d7637e4d3078c7857e3512a",
        bits: 0x1d04_4309,
    },
    DifficultyOverride {
        height: 43_202,
        time: 1_525_809_751,
        version: 4,
        prev_hash: "0fbe72517981d3fd9defebf0ba252ff744f44fdb0b73f1403d9a8de9325c7ae3",
        bits: 0x1d04_369d,
    },
];

/// Proof-of-work spacing used by every post-fork strategy, whatever the
/// configured block spacing.
pub const POW_TARGET_SPACING: i64 = 10 * 60;

/// Immutable per-network consensus configuration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConsensusParams {
    /// Network these values belong to.
    pub network: Network,
    /// Easiest allowed target per tagged algorithm; zero disables the algorithm.
    pub pow_limit: [U256; ALGO_COUNT],
    /// Target seconds between blocks.
    pub pow_target_spacing: i64,
    /// Seconds over which retargeting averages.
    pub pow_target_timespan: i64,
    /// Minimum-difficulty relaxation.
    pub pow_allow_min_difficulty_blocks: bool,
    /// Every block uses the ceiling target.
    pub pow_no_retargeting: bool,
    /// Height from which ASERT replaces the earlier strategies.
    pub mandatory_upgrade_block: u32,
    /// Stake minimum depth before / after the mandatory upgrade.
    pub stake_min_depth: [u32; 2],
    /// Stake minimum age in seconds before / after the mandatory upgrade.
    pub stake_min_age: [i64; 2],
    /// Age at which coin age stops accruing (seconds).
    pub stake_max_age: i64,
    /// Mask applied to stake timestamps.
    pub stake_timestamp_mask: u32,
    /// Last height at which proof-of-work is accepted, `None` for unlimited.
    pub last_pow_block: Option<u32>,
    /// Hard-coded historical targets.
    pub difficulty_overrides: &'static [DifficultyOverride],
}

impl ConsensusParams {
    /// Preset values for a network.
    pub fn for_network(network: Network) -> Self {
        match network {
            Network::Main => Self::main(),
            Network::Testnet => Self::testnet(),
            Network::Signet => Self::signet(),
            Network::Regtest => Self::regtest(),
        }
    }

    fn main() -> Self {
        Self {
            network: Network::Main,
            pow_limit: Self::limits(0x1e00_ffff, 0x1e0f_ffff),
            pow_target_spacing: 80,
            pow_target_timespan: 12 * 60 * 60,
            pow_allow_min_difficulty_blocks: true,
            pow_no_retargeting: false,
            mandatory_upgrade_block: 1_442_800,
            stake_min_depth: [10, 600],
            stake_min_age: [6 * 60 * 60, 12 * 60 * 60],
            stake_max_age: 30 * 24 * 60 * 60,
            stake_timestamp_mask: 0xf,
            last_pow_block: Some(100_000),
            difficulty_overrides: MAINNET_DIFFICULTY_OVERRIDES,
        }
    }

    fn testnet() -> Self {
        Self {
            network: Network::Testnet,
            mandatory_upgrade_block: 0,
            stake_min_depth: [100, 100],
            stake_min_age: [2 * 60 * 60, 2 * 60 * 60],
            last_pow_block: None,
            difficulty_overrides: &[],
            ..Self::main()
        }
    }

    fn signet() -> Self {
        Self {
            network: Network::Signet,
            pow_limit: Self::limits(0x1e00_ffff, 0x1e03_77ae),
            mandatory_upgrade_block: 0,
            last_pow_block: None,
            difficulty_overrides: &[],
            ..Self::main()
        }
    }

    fn regtest() -> Self {
        Self {
            network: Network::Regtest,
            pow_limit: Self::limits(0x207f_ffff, 0x207f_ffff),
            pow_target_timespan: 60 * 60,
            pow_no_retargeting: true,
            mandatory_upgrade_block: 0,
            stake_min_depth: [0, 0],
            stake_min_age: [60, 60],
            stake_timestamp_mask: 0x3,
            last_pow_block: None,
            difficulty_overrides: &[],
            ..Self::main()
        }
    }

    fn limits(pos_bits: u32, xevan_bits: u32) -> [U256; ALGO_COUNT] {
        let mut limits = [U256::zero(); ALGO_COUNT];
        limits[Self::index_of(AlgoTag::ProofOfStake)] = compact::target(pos_bits);
        limits[Self::index_of(AlgoTag::Xevan)] = compact::target(xevan_bits);
        limits
    }

    /// Replace the ceiling of one tagged algorithm.
    ///
    /// `Legacy` has no ceiling of its own and is ignored.
    pub fn with_pow_limit(mut self, algo: AlgoTag, limit: U256) -> Self {
        if let Some(index) = algo.index() {
            self.pow_limit[index] = limit;
        }
        self
    }

    /// Ceiling used for validation and the min-difficulty marker:
    /// `Legacy` maps to Xevan.
    pub fn pow_limit(&self, algo: AlgoTag) -> U256 {
        match algo.index() {
            Some(index) => self.pow_limit[index],
            None => self.pow_limit[Self::index_of(AlgoTag::Xevan)],
        }
    }

    /// Ceiling used by the retargeting strategies: `Legacy` maps to the
    /// proof-of-stake ceiling for stake candidates and Xevan otherwise.
    pub fn retarget_limit(&self, algo: AlgoTag, proof_of_stake: bool) -> U256 {
        match algo {
            AlgoTag::Legacy if proof_of_stake => self.pow_limit(AlgoTag::ProofOfStake),
            algo => self.pow_limit(algo),
        }
    }

    /// Whether the network accepts blocks of `algo` at all.
    ///
    /// A zero ceiling disables a tagged algorithm; `Legacy` follows Xevan.
    pub fn is_enabled(&self, algo: AlgoTag) -> bool {
        !self.pow_limit(algo).is_zero()
    }

    fn index_of(algo: AlgoTag) -> usize {
        algo.index().unwrap_or_default()
    }

    /// Blocks between legacy retargets, zero for a zero spacing.
    pub fn difficulty_adjustment_interval(&self) -> i64 {
        self.pow_target_timespan
            .checked_div(self.pow_target_spacing)
            .unwrap_or(0)
    }

    /// Height at which ASERT replaces the EMA fallback.
    pub fn asert_activation_height(&self) -> u32 {
        self.mandatory_upgrade_block.saturating_add(10)
    }

    /// Minimum stake age at `height`.
    pub fn stake_min_age(&self, height: u32) -> i64 {
        self.stake_min_age[self.upgrade_slot(height)]
    }

    /// Minimum stake depth at `height`.
    pub fn stake_min_depth(&self, height: u32) -> u32 {
        self.stake_min_depth[self.upgrade_slot(height)]
    }

    fn upgrade_slot(&self, height: u32) -> usize {
        usize::from(height >= self.mandatory_upgrade_block)
    }

    /// Whether proof-of-work blocks are still accepted at `height`.
    pub fn is_pow_allowed(&self, height: u32) -> bool {
        self.last_pow_block.map_or(true, |last| height <= last)
    }

    /// Target forced by a historical override, if the candidate is one.
    pub fn difficulty_override(
        &self,
        height: u32,
        candidate: &CandidateHeader,
        tip: &BlockIndexNode,
    ) -> Option<u32> {
        self.difficulty_overrides
            .iter()
            .find(|entry| entry.matches(height, candidate, tip))
            .map(|entry| entry.bits)
    }

    /// Reject values the strategies cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.pow_target_spacing <= 0 {
            return Err(RetargetError::InvalidParams(format!(
                "target spacing must be positive, got {}",
                self.pow_target_spacing
            )));
        }
        if self.pow_target_timespan <= 0 {
            return Err(RetargetError::InvalidParams(format!(
                "target timespan must be positive, got {}",
                self.pow_target_timespan
            )));
        }
        if self.difficulty_adjustment_interval() < 1 {
            return Err(RetargetError::InvalidParams(format!(
                "timespan {} is shorter than one block spacing {}",
                self.pow_target_timespan, self.pow_target_spacing
            )));
        }
        for algo in [AlgoTag::ProofOfStake, AlgoTag::Xevan] {
            if !self.is_enabled(algo) {
                return Err(RetargetError::InvalidParams(format!(
                    "{algo} ceiling must be non-zero"
                )));
            }
        }
        if self
            .difficulty_overrides
            .iter()
            .any(|entry| hash_from_display_hex(entry.prev_hash).is_none())
        {
            return Err(RetargetError::InvalidParams(
                "difficulty override with malformed parent hash".into(),
            ));
        }
        Ok(())
    }
}

impl Default for ConsensusParams {
    fn default() -> Self {
        Self::for_network(Network::Main)
    }
}
