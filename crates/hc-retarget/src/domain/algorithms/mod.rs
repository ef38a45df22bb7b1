//! Retargeting strategies.
//!
//! Each strategy maps `(tip, candidate, params)` to the compact target the
//! candidate must meet. They were introduced at different points of the
//! chain's history and each must keep producing the exact same values for the
//! blocks it once validated.
//!
//! | Strategy | Used for | Encoding |
//! |----------|----------|----------|
//! | [`legacy`] | Fixed-interval networks | truncating |
//! | [`sma`] | Pre-upgrade PoW | truncating before the first fork, rounding after |
//! | [`wtema`] | Pre-upgrade PoS, pre-ASERT fallback | see module |
//! | [`asert`] | Everything after the mandatory upgrade | rounding |
//!
//! Shared conventions:
//! - A strategy follows its own block series: blocks with the candidate's
//!   algorithm tag, or with its stake flag for untagged candidates.
//! - No tip, no earlier block in the series, or only one earlier block: the
//!   ceiling is returned.
//! - Results above the ceiling, zero results and arithmetic overflow all give
//!   the ceiling.
//! - The dispatcher never runs a strategy for a disabled algorithm (zero
//!   ceiling); called directly they return 0.

pub mod asert;
pub mod legacy;
pub mod sma;
pub mod wtema;

use super::compact;
use super::params::{ConsensusParams, POW_TARGET_SPACING};
use super::traversal::last_index_matching;
use super::wide::WideUint;
use primitive_types::U256;
use shared_types::{AlgoTag, BlockIndexNode, CandidateHeader, ChainIndexView, NodeId};

pub use asert::average_target_asert;
pub use legacy::{calculate_next_work_required, next_work_required_legacy};
pub use sma::simple_moving_average;
pub use wtema::{peercoin_wtema, weighted_target_ema};

/// Per-call inputs every strategy resolves first.
pub(crate) struct RetargetContext<'a, V: ?Sized> {
    pub view: &'a V,
    pub params: &'a ConsensusParams,
    pub candidate: &'a CandidateHeader,
    pub algo: AlgoTag,
    pub proof_of_stake: bool,
    pub limit: U256,
    pub limit_bits: u32,
}

/// The two newest blocks of the candidate's series.
#[derive(Debug, Clone, Copy)]
pub(crate) struct SeriesTail {
    pub prev: NodeId,
    pub prev_prev: NodeId,
}

impl<'a, V: ChainIndexView + ?Sized> RetargetContext<'a, V> {
    pub fn new(view: &'a V, params: &'a ConsensusParams, candidate: &'a CandidateHeader) -> Self {
        let algo = candidate.algo();
        let proof_of_stake = candidate.is_proof_of_stake();
        let limit = params.retarget_limit(algo, proof_of_stake);
        Self {
            view,
            params,
            candidate,
            algo,
            proof_of_stake,
            limit,
            limit_bits: compact::to_compact(limit),
        }
    }

    pub fn node(&self, id: NodeId) -> &'a BlockIndexNode {
        self.view.node(id)
    }

    /// Nearest block of the candidate's series at or before `start`.
    pub fn last_matching(&self, start: Option<NodeId>) -> Option<NodeId> {
        last_index_matching(self.view, start, self.algo, self.proof_of_stake)
    }

    /// Post-fork spacing: configured for PoS, fixed 600 s for PoW.
    pub fn spacing(&self) -> i64 {
        if self.proof_of_stake {
            self.params.pow_target_spacing
        } else {
            POW_TARGET_SPACING
        }
    }

    /// Newest two blocks of the series, `None` when either is a fixed point.
    pub fn series_tail(&self, tip: NodeId) -> Option<SeriesTail> {
        let prev = self.last_matching(Some(tip))?;
        let first_prev = self.node(prev).prev?;
        let prev_prev = self.last_matching(Some(first_prev))?;
        self.node(prev_prev).prev?;
        Some(SeriesTail { prev, prev_prev })
    }

    /// Bits marking a min-difficulty block of this series; zero when the
    /// algorithm is disabled.
    pub fn min_difficulty_marker(&self) -> u32 {
        self.limit_bits.saturating_sub(1)
    }

    /// Ceiling for overflow, zero and above-ceiling results.
    pub fn clamp(&self, scaled: Option<WideUint>) -> U256 {
        clamp_to_limit(scaled, self.limit)
    }
}

/// Narrow a scaled target, falling back to `limit` when it overflowed, is
/// zero or exceeds `limit`.
pub(crate) fn clamp_to_limit(scaled: Option<WideUint>, limit: U256) -> U256 {
    match scaled {
        Some(value) if !value.is_zero() && value.cmp_u256(limit).is_le() => value.trim256(),
        _ => limit,
    }
}

/// Abort on a broken traversal precondition.
///
/// Continuing would produce a target no other node computes.
#[cold]
pub(crate) fn invariant_violation(what: &str, at: NodeId) -> ! {
    panic!("retarget invariant violated at {at}: {what}")
}
