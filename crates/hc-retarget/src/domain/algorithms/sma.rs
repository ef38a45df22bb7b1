//! Simple moving average of targets, optionally tempered.
//!
//! Before the first fork this is Dark Gravity Wave: 24 blocks at 60 s, the
//! newest target counted twice. After the fork it is DigiShield-style: a
//! quarter of `timespan / spacing` blocks, equal weights, and the measured
//! timespan blended 1:3 with the ideal one while it stays within 15 %.
//!
//! ```text
//! avg  = (w * T1 + T2 + ... + Tk) / (k + w - 1)
//! next = avg * actual / ideal                      (outside ±15 %)
//! next = avg * (actual + 3 * ideal) / (4 * ideal)  (tempered)
//! ```
//!
//! Min-difficulty blocks are skipped and replaced by one more block further
//! back, so the relaxation never drags the average up.

use super::{wtema, RetargetContext, SeriesTail};
use crate::domain::compact;
use crate::domain::params::ConsensusParams;
use crate::domain::wide::WideUint;
use primitive_types::U256;
use shared_types::{CandidateHeader, ChainIndexView, NodeId};
use tracing::trace;

/// Tempering blend: `(actual + (F - 1) * ideal) / (F * ideal)`.
const TEMPERING_FACTOR: i64 = 4;

/// Tempering is dropped once the timespan error reaches this percentage.
const MAX_SOLVETIME_ERROR_PERCENT: i64 = 15;

/// Dark Gravity Wave window.
const LEGACY_PAST_BLOCKS: i64 = 24;

/// Pre-fork spacing.
const LEGACY_SPACING: i64 = 60;

/// Next target from the average of the series' recent targets.
pub fn simple_moving_average<V>(
    view: &V,
    tip: Option<NodeId>,
    candidate: &CandidateHeader,
    params: &ConsensusParams,
) -> u32
where
    V: ChainIndexView + ?Sized,
{
    let ctx = RetargetContext::new(view, params, candidate);
    let post_fork = candidate.is_post_fork();

    let spacing = if post_fork { ctx.spacing() } else { LEGACY_SPACING };
    let mut tempering = post_fork;
    let mut past_blocks = if post_fork {
        params.pow_target_timespan / spacing
    } else {
        LEGACY_PAST_BLOCKS
    };
    if tempering {
        past_blocks /= TEMPERING_FACTOR;
    }
    let first_weight: i64 = if post_fork { 1 } else { 2 };

    let Some(tip) = tip else {
        return ctx.limit_bits;
    };
    let Some(SeriesTail { prev, .. }) = ctx.series_tail(tip) else {
        return ctx.limit_bits;
    };

    // Too short for a full window; the two leading ceiling blocks are skipped
    // after the fork
    let min_height = past_blocks + if post_fork { 2 } else { 0 };
    if i64::from(ctx.node(tip).height) < min_height {
        return if post_fork {
            wtema::weighted_target_ema(view, Some(tip), candidate, params)
        } else {
            ctx.limit_bits
        };
    }

    let marker = ctx.min_difficulty_marker();
    let allow_min = params.pow_allow_min_difficulty_blocks;
    let mut node = prev;
    let mut average = U256::zero();
    let mut count: i64 = 1;
    while count <= past_blocks {
        let current = ctx.node(node);
        if current.bits != marker || !allow_min {
            let mut target = compact::target(current.bits);
            if count == 1 {
                target = target.saturating_mul(U256::from(first_weight as u64));
            }
            let divisor = U256::from((past_blocks + first_weight - 1) as u64);
            average = average.saturating_add(target / divisor);
        } else {
            // One more block makes up for the skipped one
            count -= 1;
        }

        // Stopping at genesis or on the last DGW sample leaves the window one
        // timestamp short, as it always has
        match ctx.last_matching(current.prev) {
            Some(next) if ctx.node(next).height != 0 && (post_fork || count != past_blocks) => {
                node = next;
            }
            _ => break,
        }
        count += 1;
    }

    if average.is_zero() {
        average = ctx.limit;
    }

    let mut actual = ctx.node(prev).time - ctx.node(node).time;
    let mut ideal = past_blocks * spacing;
    let lower = ideal * (100 - MAX_SOLVETIME_ERROR_PERCENT) / 100;
    let upper = ideal * (100 + MAX_SOLVETIME_ERROR_PERCENT) / 100;
    if actual <= lower || actual >= upper {
        tempering = false;
    }
    if tempering {
        actual += (TEMPERING_FACTOR - 1) * ideal;
        ideal *= TEMPERING_FACTOR;
    }
    if actual < 1 {
        actual = 1;
    }

    let scaled = match u64::try_from(ideal) {
        Ok(ideal) => WideUint::mul_div(
            average,
            WideUint::from_u64(actual as u64),
            WideUint::from_u64(ideal),
        ),
        Err(_) => None,
    };
    let next = ctx.clamp(scaled);
    let bits = if post_fork {
        compact::to_compact_rounded(next)
    } else {
        compact::to_compact(next)
    };
    trace!(
        height = ctx.node(tip).height + 1,
        algo = %ctx.algo,
        actual,
        ideal,
        tempering,
        bits,
        "[hc-retarget] sma"
    );
    bits
}
