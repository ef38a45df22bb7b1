//! Weighted-target exponential moving average.
//!
//! Retargets every block from the previous target and the previous solve time
//! alone:
//!
//! ```text
//! next = prev * ((N - 1) * spacing + solvetime) / (N * spacing)
//! ```
//!
//! [`peercoin_wtema`] is the older proof-of-stake parameterization with
//! `(N - 1) * spacing + 2 * solvetime` over `(N + 1) * spacing`. It still
//! validates pre-upgrade stake blocks, including the very first ones that were
//! produced before the fork version existed.

use super::{RetargetContext, SeriesTail};
use crate::domain::compact;
use crate::domain::params::ConsensusParams;
use crate::domain::wide::WideUint;
use shared_types::{CandidateHeader, ChainIndexView, NodeId};
use tracing::trace;

/// Pre-fork stake spacing.
const LEGACY_STAKE_SPACING: i64 = 60;

/// Pre-fork stake timespan.
const LEGACY_STAKE_TIMESPAN: i64 = 40 * 60;

/// Standard WTEMA with `N = timespan / (2 * spacing)`; rounding encoding.
pub fn weighted_target_ema<V>(
    view: &V,
    tip: Option<NodeId>,
    candidate: &CandidateHeader,
    params: &ConsensusParams,
) -> u32
where
    V: ChainIndexView + ?Sized,
{
    let ctx = RetargetContext::new(view, params, candidate);
    let Some(tip) = tip else {
        return ctx.limit_bits;
    };
    let Some(SeriesTail { prev, prev_prev }) = ctx.series_tail(tip) else {
        return ctx.limit_bits;
    };
    let prev_node = ctx.node(prev);
    let mut solvetime = prev_node.time - ctx.node(prev_prev).time;

    let spacing = ctx.spacing();
    let interval = params.pow_target_timespan / (spacing * 2);

    // Keep the numerator positive
    let floor = -((interval - 1) * spacing);
    if solvetime <= floor {
        solvetime = floor + 1;
    }
    let numerator = (interval - 1) * spacing + solvetime;
    let denominator = interval * spacing;

    let next = ctx.clamp(scale(prev_node.bits, numerator, denominator));
    let bits = compact::to_compact_rounded(next);
    trace!(height = prev_node.height + 1, algo = %ctx.algo, solvetime, bits, "[hc-retarget] wtema");
    bits
}

/// Peercoin-style EMA used for stake blocks before the mandatory upgrade.
///
/// Pre-fork candidates use 60 s spacing over 40 minutes, clamp negative
/// solve times to one second and truncate. Post-fork candidates use the
/// configured timespan and round.
pub fn peercoin_wtema<V>(
    view: &V,
    tip: Option<NodeId>,
    candidate: &CandidateHeader,
    params: &ConsensusParams,
) -> u32
where
    V: ChainIndexView + ?Sized,
{
    let ctx = RetargetContext::new(view, params, candidate);
    let Some(tip) = tip else {
        return ctx.limit_bits;
    };
    let Some(SeriesTail { prev, prev_prev }) = ctx.series_tail(tip) else {
        return ctx.limit_bits;
    };
    let prev_node = ctx.node(prev);
    let mut solvetime = prev_node.time - ctx.node(prev_prev).time;

    let post_fork = candidate.is_post_fork();
    let (spacing, interval) = if post_fork {
        let spacing = ctx.spacing();
        (spacing, params.pow_target_timespan / spacing)
    } else {
        if solvetime < 0 {
            solvetime = 1;
        }
        (
            LEGACY_STAKE_SPACING,
            LEGACY_STAKE_TIMESPAN / LEGACY_STAKE_SPACING,
        )
    };

    let numerator = ((interval - 1) * spacing + 2 * solvetime).max(1);
    let denominator = (interval + 1) * spacing;

    let next = ctx.clamp(scale(prev_node.bits, numerator, denominator));
    let bits = if post_fork {
        compact::to_compact_rounded(next)
    } else {
        compact::to_compact(next)
    };
    trace!(height = prev_node.height + 1, algo = %ctx.algo, solvetime, bits, "[hc-retarget] peercoin wtema");
    bits
}

/// `target(bits) * numerator / denominator` in 512 bits.
fn scale(bits: u32, numerator: i64, denominator: i64) -> Option<WideUint> {
    let numerator = u64::try_from(numerator).ok()?;
    let denominator = u64::try_from(denominator).ok()?;
    WideUint::mul_div(
        compact::target(bits),
        WideUint::from_u64(numerator),
        WideUint::from_u64(denominator),
    )
}
