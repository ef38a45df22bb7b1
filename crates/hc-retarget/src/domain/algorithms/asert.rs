//! Absolutely scheduled exponentially rising targets, against an averaged
//! reference.
//!
//! The target depends only on how far the series is ahead of or behind the
//! ideal schedule since a fixed reference block:
//!
//! ```text
//! next = ref * 2^((time_diff - spacing * blocks_passed) / timespan)
//! ```
//!
//! `ref` is the average of `W = 4 * timespan / spacing` block targets ending
//! at the last multiple of `W` blocks since the reference, so a single
//! outlier at the reference height cannot pin the whole schedule. The
//! fractional part of the exponent uses the cubic
//! `(4x³ + 11x² + 35x + 50) / 50`, which equals 1 at `x = 0` and 2 at `x = 1`.
//!
//! Averages are memoized in [`TargetAverageCache`]; the value served from the
//! cache is always the value a fresh computation would give.

use super::{wtema, RetargetContext, SeriesTail};
use crate::domain::cache::{CacheOutcome, TargetAverageCache};
use crate::domain::compact;
use crate::domain::params::ConsensusParams;
use crate::domain::traversal::last_index_matching_algo;
use crate::domain::wide::WideUint;
use primitive_types::U256;
use shared_types::{CandidateHeader, ChainIndexView, NodeId};
use tracing::trace;

/// Number of block targets averaged into the reference.
pub fn averaging_window(params: &ConsensusParams, spacing: i64) -> u32 {
    u32::try_from(4 * params.pow_target_timespan / spacing).unwrap_or(0)
}

/// ASERT target for the candidate.
///
/// Returns the compact target and, when the averaged reference was used, how
/// the cache served it.
pub fn average_target_asert<V>(
    view: &V,
    tip: Option<NodeId>,
    candidate: &CandidateHeader,
    params: &ConsensusParams,
    cache: &TargetAverageCache,
) -> (u32, Option<CacheOutcome>)
where
    V: ChainIndexView + ?Sized,
{
    let ctx = RetargetContext::new(view, params, candidate);
    let spacing = ctx.spacing();

    let Some(tip) = tip else {
        return (ctx.limit_bits, None);
    };
    let Some(SeriesTail { prev, .. }) = ctx.series_tail(tip) else {
        return (ctx.limit_bits, None);
    };

    let start_height = params.asert_activation_height();
    let window = averaging_window(params, spacing);
    let height = ctx.node(tip).height + 1;
    if height < start_height {
        return (wtema::weighted_target_ema(view, Some(tip), candidate, params), None);
    }

    let (reference, blocks_passed) = reference_block(&ctx, prev, start_height);
    let reference_node = ctx.node(reference);
    let reference_prev = ctx.last_matching(reference_node.prev);
    // The reference's parent time keeps the schedule from starting one block late
    let anchor_time = match reference_prev {
        Some(id) => ctx.node(id).time,
        None => reference_node.time - spacing,
    };
    let time_diff = ctx.node(prev).time - anchor_time;

    let averaged = window > 0
        && height >= start_height.saturating_add(window)
        && blocks_passed >= window;
    let (reference_target, outcome) = if averaged {
        let first = skip_partial_window(&ctx, prev, blocks_passed % window);
        let anchor = ctx.node(first).hash;
        let window_index = blocks_passed / window;
        let (average, outcome) = cache.get_or_compute(ctx.algo, window_index, anchor, height, || {
            average_targets(&ctx, first, window)
        });
        (average, Some(outcome))
    } else {
        (compact::target(reference_node.bits), None)
    };

    let dividend = time_diff - spacing * i64::from(blocks_passed);
    let scaled = scale_by_schedule(reference_target, dividend, params.pow_target_timespan);
    let bits = compact::to_compact_rounded(ctx.clamp(scaled));
    trace!(
        height,
        algo = %ctx.algo,
        reference = reference_node.height,
        blocks_passed,
        dividend,
        averaged,
        bits,
        "[hc-retarget] asert"
    );
    (bits, outcome)
}

/// Walk from `prev` to the first block of the series at or past the start
/// height, counting the blocks on the way (the reference included).
///
/// The walk matches by algorithm tag even for untagged candidates.
fn reference_block<V>(ctx: &RetargetContext<'_, V>, prev: NodeId, start_height: u32) -> (NodeId, u32)
where
    V: ChainIndexView + ?Sized,
{
    let mut blocks_passed = 1u32;
    let mut current = prev;
    loop {
        let node = ctx.node(current);
        if node.height < start_height {
            break;
        }
        match last_index_matching_algo(ctx.view, node.prev, ctx.algo) {
            Some(earlier) => current = earlier,
            None => break,
        }
        blocks_passed += 1;
    }
    (current, blocks_passed)
}

/// Step back over the blocks of the unfinished window.
fn skip_partial_window<V>(ctx: &RetargetContext<'_, V>, prev: NodeId, count: u32) -> NodeId
where
    V: ChainIndexView + ?Sized,
{
    let mut current = prev;
    for _ in 0..count {
        match ctx.last_matching(ctx.node(current).prev) {
            Some(earlier) => current = earlier,
            None => break,
        }
    }
    current
}

/// Average `window` targets from `first` backwards, each divided before
/// summing. Min-difficulty blocks are replaced by the next older block.
fn average_targets<V>(ctx: &RetargetContext<'_, V>, first: NodeId, window: u32) -> U256
where
    V: ChainIndexView + ?Sized,
{
    let marker = ctx.min_difficulty_marker();
    let allow_min = ctx.params.pow_allow_min_difficulty_blocks;
    let divisor = U256::from(window);
    let mut average = U256::zero();
    let mut counted = 0u32;
    let mut current = Some(first);
    while let Some(id) = current {
        if counted >= window {
            break;
        }
        let node = ctx.node(id);
        if node.bits != marker || !allow_min {
            average = average.saturating_add(compact::target(node.bits) / divisor);
            counted += 1;
        }
        current = ctx.last_matching(node.prev);
    }
    average
}

/// `target * 2^(dividend / timespan)`, the fraction by cubic approximation.
///
/// `None` when the 512-bit intermediates overflow.
pub(crate) fn scale_by_schedule(target: U256, dividend: i64, timespan: i64) -> Option<WideUint> {
    let divisor = u64::try_from(timespan).ok().filter(|d| *d > 0)?;
    let exponent = dividend / timespan;
    let remainder = dividend.unsigned_abs() % divisor;
    let whole = WideUint::pow2(u32::try_from(exponent.unsigned_abs()).ok()?)?;

    let (mut numerator, mut denominator) = if dividend >= 0 {
        (whole, WideUint::one())
    } else {
        (WideUint::one(), whole)
    };
    if remainder != 0 {
        let (poly, base) = cubic_terms(remainder, divisor)?;
        if dividend >= 0 {
            numerator = numerator.checked_mul(poly)?;
            denominator = denominator.checked_mul(base)?;
        } else {
            numerator = numerator.checked_mul(base)?;
            denominator = denominator.checked_mul(poly)?;
        }
    }
    WideUint::mul_div(target, numerator, denominator)
}

/// `(4r³ + 11r²d + 35rd² + 50d³, 50d³)`.
fn cubic_terms(remainder: u64, divisor: u64) -> Option<(WideUint, WideUint)> {
    let r = WideUint::from_u64(remainder);
    let d = WideUint::from_u64(divisor);
    let r2 = r.checked_mul(r)?;
    let d2 = d.checked_mul(d)?;
    let r3 = r2.checked_mul(r)?;
    let d3 = d2.checked_mul(d)?;

    let base = d3.checked_mul_u64(50)?;
    let poly = r3
        .checked_mul_u64(4)?
        .checked_add(r2.checked_mul(d)?.checked_mul_u64(11)?)?
        .checked_add(r.checked_mul(d2)?.checked_mul_u64(35)?)?
        .checked_add(base)?;
    Some((poly, base))
}
