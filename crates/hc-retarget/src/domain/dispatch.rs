//! # Retarget Dispatcher
//!
//! Picks the strategy that governs a candidate and applies the two kinds of
//! forced targets that bypass strategies altogether.
//!
//! ## Decision Table
//!
//! ```text
//! ┌───────────────────────────────────────────┬──────────────────────────┐
//! │ Condition (first match wins)              │ Result                   │
//! ├───────────────────────────────────────────┼──────────────────────────┤
//! │ algorithm has a zero ceiling              │ Disabled (bits 0)        │
//! │ no tip, or retargeting disabled           │ Ceiling                  │
//! │ tagged, post-fork, min-difficulty allowed │ MinDifficulty override   │
//! │   and the 30-minute or reuse rule fires   │   (state still selected) │
//! │ height >= mandatory upgrade               │ Asert                    │
//! │ proof-of-stake, historical tuple matches  │ Historical override      │
//! │ proof-of-stake                            │ WeightedEma (Peercoin)   │
//! │ otherwise                                 │ SimpleMovingAverage      │
//! └───────────────────────────────────────────┴──────────────────────────┘
//! ```
//!
//! Networks that never adopted per-block retargeting use
//! [`next_work_required_for_legacy_network`] instead and always get
//! `LegacyPeriodic`. Both entry points resolve a [`Selection`] the same way.
//!
//! A `Disabled` outcome is a refusal: its `bits` are zero, which no proof
//! meets and which [`crate::domain::validation`] rejects as malformed.

use super::algorithms::{
    average_target_asert, next_work_required_legacy, peercoin_wtema, simple_moving_average,
};
use super::cache::{CacheOutcome, TargetAverageCache};
use super::compact;
use super::params::ConsensusParams;
use super::traversal::last_index_matching_algo;
use shared_types::{AlgoTag, CandidateHeader, ChainIndexView, NodeId};
use std::fmt;
use tracing::{debug, trace};

/// Seconds without a block of the same algorithm after which a
/// min-difficulty block is allowed.
pub const MIN_DIFFICULTY_DELAY: i64 = 30 * 60;

/// Height the last same-algorithm block must exceed before the
/// min-difficulty rules apply.
const MIN_DIFFICULTY_START_HEIGHT: u32 = 10;

/// Strategy family governing a candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RetargetState {
    /// The candidate's algorithm is not accepted on this network.
    Disabled,
    /// No tip or retargeting disabled: the ceiling.
    Ceiling,
    /// Fixed-interval retargeting.
    LegacyPeriodic,
    /// Tempered simple moving average (pre-upgrade proof-of-work).
    SimpleMovingAverage,
    /// Weighted-target EMA (pre-upgrade proof-of-stake).
    WeightedEma,
    /// Averaged-reference ASERT.
    Asert,
}

impl fmt::Display for RetargetState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RetargetState::Disabled => "disabled",
            RetargetState::Ceiling => "ceiling",
            RetargetState::LegacyPeriodic => "legacy",
            RetargetState::SimpleMovingAverage => "sma",
            RetargetState::WeightedEma => "wtema",
            RetargetState::Asert => "asert",
        };
        f.write_str(name)
    }
}

/// Why a target was forced instead of computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OverrideKind {
    /// Min-difficulty relaxation for tagged algorithms.
    MinDifficulty,
    /// Hard-coded historical block.
    Historical,
}

/// The dispatcher's decision for one candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Selection {
    /// Strategy family in force at the candidate's height.
    pub state: RetargetState,
    /// Forced target, when an override fires.
    pub forced: Option<(OverrideKind, u32)>,
}

impl RetargetState {
    /// `true` when the candidate is refused instead of given a target.
    pub fn is_refusal(self) -> bool {
        self == RetargetState::Disabled
    }
}

/// Result of a full target computation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetargetOutcome {
    /// Compact target the candidate must meet.
    pub bits: u32,
    /// Strategy family in force.
    pub state: RetargetState,
    /// Set when the target was forced.
    pub forced: Option<OverrideKind>,
    /// How the ASERT average was obtained, when one was used.
    pub cache: Option<CacheOutcome>,
}

/// Decide how the candidate's target is obtained without computing it.
pub fn select<V>(
    view: &V,
    tip: Option<NodeId>,
    candidate: &CandidateHeader,
    params: &ConsensusParams,
) -> Selection
where
    V: ChainIndexView + ?Sized,
{
    let algo = candidate.algo();
    if !params.is_enabled(algo) {
        return Selection {
            state: RetargetState::Disabled,
            forced: None,
        };
    }
    let limit_bits = compact::to_compact(params.pow_limit(algo));

    let tip = match tip {
        Some(tip) if !params.pow_no_retargeting => tip,
        _ => {
            return Selection {
                state: RetargetState::Ceiling,
                forced: None,
            }
        }
    };

    let height = view.node(tip).height + 1;
    let proof_of_stake = candidate.is_proof_of_stake();
    let state = if height >= params.mandatory_upgrade_block {
        RetargetState::Asert
    } else if proof_of_stake {
        RetargetState::WeightedEma
    } else {
        RetargetState::SimpleMovingAverage
    };

    if candidate.is_post_fork() && params.pow_allow_min_difficulty_blocks && algo.is_tagged() {
        if let Some(bits) = min_difficulty_override(view, tip, candidate, algo, limit_bits) {
            return Selection {
                state,
                forced: Some((OverrideKind::MinDifficulty, bits)),
            };
        }
    }

    if state == RetargetState::WeightedEma {
        if let Some(bits) = params.difficulty_override(height, candidate, view.node(tip)) {
            return Selection {
                state,
                forced: Some((OverrideKind::Historical, bits)),
            };
        }
    }

    Selection { state, forced: None }
}

/// Compact target the block after `tip` must meet.
pub fn next_work_required<V>(
    view: &V,
    tip: Option<NodeId>,
    candidate: &CandidateHeader,
    params: &ConsensusParams,
    cache: &TargetAverageCache,
) -> RetargetOutcome
where
    V: ChainIndexView + ?Sized,
{
    let selection = select(view, tip, candidate, params);
    resolve(view, tip, candidate, params, cache, selection)
}

/// Fixed-interval dispatch for networks without per-block retargeting.
pub fn next_work_required_for_legacy_network<V>(
    view: &V,
    tip: NodeId,
    candidate: &CandidateHeader,
    params: &ConsensusParams,
) -> RetargetOutcome
where
    V: ChainIndexView + ?Sized,
{
    let selection = Selection {
        state: RetargetState::LegacyPeriodic,
        forced: None,
    };
    resolve(view, Some(tip), candidate, params, &TargetAverageCache::disabled(), selection)
}

/// Turn a selection into the target: the forced value, or the strategy's.
fn resolve<V>(
    view: &V,
    tip: Option<NodeId>,
    candidate: &CandidateHeader,
    params: &ConsensusParams,
    cache: &TargetAverageCache,
    selection: Selection,
) -> RetargetOutcome
where
    V: ChainIndexView + ?Sized,
{
    let algo = candidate.algo();

    if let Some((kind, bits)) = selection.forced {
        debug!(
            height = tip.map(|id| view.node(id).height + 1),
            %algo,
            bits,
            kind = ?kind,
            "[hc-retarget] forced target"
        );
        return RetargetOutcome {
            bits,
            state: selection.state,
            forced: Some(kind),
            cache: None,
        };
    }

    let (bits, cache_outcome) = match selection.state {
        RetargetState::Disabled => {
            debug!(
                height = tip.map(|id| view.node(id).height + 1),
                %algo,
                network = %params.network,
                "[hc-retarget] algorithm disabled, no target"
            );
            (0, None)
        }
        RetargetState::Ceiling => (compact::to_compact(params.pow_limit(algo)), None),
        RetargetState::Asert => average_target_asert(view, tip, candidate, params, cache),
        RetargetState::WeightedEma => (peercoin_wtema(view, tip, candidate, params), None),
        RetargetState::SimpleMovingAverage => (simple_moving_average(view, tip, candidate, params), None),
        RetargetState::LegacyPeriodic => match tip {
            Some(tip) => (next_work_required_legacy(view, tip, candidate, params), None),
            None => (compact::to_compact(params.pow_limit(algo)), None),
        },
    };
    trace!(
        height = tip.map(|id| view.node(id).height + 1),
        %algo,
        state = %selection.state,
        bits,
        "[hc-retarget] next work required"
    );
    RetargetOutcome {
        bits,
        state: selection.state,
        forced: None,
        cache: cache_outcome,
    }
}

/// The two min-difficulty rules for tagged algorithms.
///
/// A block more than [`MIN_DIFFICULTY_DELAY`] after the last one of its
/// algorithm may use the marker (`ceiling - 1`). Right after such a block the
/// target reverts to the last regular one before it.
fn min_difficulty_override<V>(
    view: &V,
    tip: NodeId,
    candidate: &CandidateHeader,
    algo: AlgoTag,
    limit_bits: u32,
) -> Option<u32>
where
    V: ChainIndexView + ?Sized,
{
    let marker = limit_bits.checked_sub(1)?;
    let last = view.node(last_index_matching_algo(view, Some(tip), algo)?);

    if last.height > MIN_DIFFICULTY_START_HEIGHT && candidate.time > last.time + MIN_DIFFICULTY_DELAY {
        return Some(marker);
    }
    if last.prev.is_none() || last.bits != marker {
        return None;
    }

    // Newest regular block of this algorithm
    let mut regular = last;
    while let Some(prev) = regular.prev {
        if regular.bits != marker && regular.algo() == algo {
            break;
        }
        regular = view.node(prev);
    }

    let before = view.node(last_index_matching_algo(view, regular.prev, algo)?);
    if before.height <= MIN_DIFFICULTY_START_HEIGHT {
        return None;
    }
    // Never hand out the marker again
    Some(if before.bits != marker { before.bits } else { regular.bits })
}
