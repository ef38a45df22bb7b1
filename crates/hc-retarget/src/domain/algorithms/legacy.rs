//! Fixed-interval retargeting.
//!
//! The target changes once every `timespan / spacing` blocks, scaled by how
//! long the interval actually took, with the step limited to a factor of four
//! either way. Between retargets the previous target carries over, except on
//! networks with min-difficulty relaxation.

use super::invariant_violation;
use crate::domain::compact;
use crate::domain::params::ConsensusParams;
use crate::domain::wide::WideUint;
use shared_types::{AlgoTag, BlockIndexNode, CandidateHeader, ChainIndexView, NodeId};
use tracing::{debug, warn};

/// Target for the block after `tip` under fixed-interval rules.
///
/// Parameters without a whole interval (see [`ConsensusParams::validate`])
/// keep the tip's target.
///
/// # Panics
///
/// When the first block of the interval is missing from the index.
pub fn next_work_required_legacy<V>(
    view: &V,
    tip: NodeId,
    candidate: &CandidateHeader,
    params: &ConsensusParams,
) -> u32
where
    V: ChainIndexView + ?Sized,
{
    let limit_bits = compact::to_compact(params.pow_limit(AlgoTag::Xevan));
    let interval = params.difficulty_adjustment_interval();
    let last = view.node(tip);
    if interval < 1 {
        warn!(
            timespan = params.pow_target_timespan,
            spacing = params.pow_target_spacing,
            "[hc-retarget] no retarget interval, keeping the previous target"
        );
        return last.bits;
    }

    if (i64::from(last.height) + 1) % interval != 0 {
        if !params.pow_allow_min_difficulty_blocks {
            return last.bits;
        }
        // Two missed spacings allow a min-difficulty block
        if candidate.time > last.time + params.pow_target_spacing * 2 {
            return limit_bits;
        }
        // Otherwise the last block not mined under the relaxation
        let mut current = last;
        while let Some(prev) = current.prev {
            if i64::from(current.height) % interval == 0 || current.bits != limit_bits {
                break;
            }
            current = view.node(prev);
        }
        return current.bits;
    }

    let first_height = i64::from(last.height) - (interval - 1);
    let first = u32::try_from(first_height)
        .ok()
        .and_then(|height| view.ancestor(tip, height))
        .unwrap_or_else(|| invariant_violation("interval start missing", tip));
    calculate_next_work_required(last, view.node(first).time, params)
}

/// Scale `tip.bits` by the interval's actual duration.
pub fn calculate_next_work_required(
    tip: &BlockIndexNode,
    first_block_time: i64,
    params: &ConsensusParams,
) -> u32 {
    let timespan = params.pow_target_timespan;
    if params.pow_no_retargeting || timespan <= 0 {
        return tip.bits;
    }

    let actual = (tip.time - first_block_time).clamp(timespan / 4, timespan * 4);

    let limit = params.pow_limit(AlgoTag::Xevan);
    let scaled = match (u64::try_from(actual), u64::try_from(timespan)) {
        (Ok(actual), Ok(timespan)) => WideUint::mul_div(
            compact::target(tip.bits),
            WideUint::from_u64(actual),
            WideUint::from_u64(timespan),
        ),
        _ => None,
    };
    let next = match scaled {
        Some(value) if value.cmp_u256(limit).is_le() => value.trim256(),
        _ => limit,
    };
    let bits = compact::to_compact(next);
    debug!(height = tip.height + 1, actual, bits, "[hc-retarget] legacy retarget");
    bits
}
