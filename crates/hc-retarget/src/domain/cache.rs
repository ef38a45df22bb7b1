//! Target average cache for ASERT.
//!
//! ASERT's reference target is the average of several days of block targets.
//! The average only changes when a new averaging window starts, so it is
//! computed once per window and reused until then.
//!
//! # Entry Scope
//!
//! ```text
//! ┌───────────┬──────────────┬────────────────────┬─────────┬──────────┐
//! │   algo    │ window_index │ anchor (newest     │ average │ computed │
//! │  (slot)   │              │  averaged block)   │         │ at height│
//! └───────────┴──────────────┴────────────────────┴─────────┴──────────┘
//! ```
//!
//! One slot per tagged algorithm. A lookup hits only when the window index
//! and the anchor both match, so two forks that share a window index but
//! diverge at or before the anchor never see each other's average. Forks that
//! diverge after the anchor average exactly the same blocks and may share.
//!
//! With fork scoping turned off the anchor is ignored and the cache keys on
//! `(window_index, algo)` alone, which is only sound while a single best chain
//! is extended.
//!
//! # Concurrency
//!
//! One mutex guards all slots. It is held across the check, the recompute on a
//! miss and the store, so concurrent validators never compute the same window
//! twice or interleave a half-written entry.

use parking_lot::Mutex;
use primitive_types::U256;
use shared_types::{AlgoTag, Hash, ALGO_COUNT};
use tracing::{debug, trace};

/// A cached average and where it came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheEntry {
    /// Averaging window the value belongs to.
    pub window_index: u32,
    /// Hash of the newest block included in the average.
    pub anchor: Hash,
    /// The averaged target.
    pub average: U256,
    /// Candidate height whose computation filled the entry.
    pub computed_at_height: u32,
}

/// How a lookup was served.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheOutcome {
    /// Served from a stored entry.
    Hit,
    /// Recomputed and stored.
    Miss,
    /// Computed without touching the cache.
    Bypassed,
}

/// Per-algorithm memo of ASERT reference averages.
#[derive(Debug)]
pub struct TargetAverageCache {
    enabled: bool,
    scope_to_fork: bool,
    slots: Mutex<[Option<CacheEntry>; ALGO_COUNT]>,
}

impl TargetAverageCache {
    /// Create a cache.
    pub fn new(enabled: bool, scope_to_fork: bool) -> Self {
        Self {
            enabled,
            scope_to_fork,
            slots: Mutex::new([None; ALGO_COUNT]),
        }
    }

    /// A cache that always recomputes.
    pub fn disabled() -> Self {
        Self::new(false, true)
    }

    /// Whether lookups may be served from stored entries.
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Return the average for `(algo, window_index, anchor)`, computing and
    /// storing it on a miss.
    ///
    /// Untagged candidates are never cached.
    pub fn get_or_compute<F>(
        &self,
        algo: AlgoTag,
        window_index: u32,
        anchor: Hash,
        height: u32,
        compute: F,
    ) -> (U256, CacheOutcome)
    where
        F: FnOnce() -> U256,
    {
        let slot = match algo.index() {
            Some(slot) if self.enabled => slot,
            _ => return (compute(), CacheOutcome::Bypassed),
        };

        let mut slots = self.slots.lock();
        if let Some(entry) = &slots[slot] {
            if self.is_hit(entry, window_index, &anchor) {
                trace!(%algo, window_index, height, "[hc-retarget] average cache hit");
                return (entry.average, CacheOutcome::Hit);
            }
            if entry.window_index == window_index {
                debug!(
                    %algo,
                    window_index,
                    height,
                    cached_at = entry.computed_at_height,
                    "[hc-retarget] average cache anchor changed, recomputing"
                );
            }
        }

        let average = compute();
        slots[slot] = Some(CacheEntry {
            window_index,
            anchor,
            average,
            computed_at_height: height,
        });
        trace!(%algo, window_index, height, "[hc-retarget] average cache miss");
        (average, CacheOutcome::Miss)
    }

    fn is_hit(&self, entry: &CacheEntry, window_index: u32, anchor: &Hash) -> bool {
        entry.window_index == window_index
            && !entry.average.is_zero()
            && (!self.scope_to_fork || entry.anchor == *anchor)
    }

    /// Stored entry for `algo`, if any.
    pub fn entry(&self, algo: AlgoTag) -> Option<CacheEntry> {
        algo.index().and_then(|slot| self.slots.lock()[slot])
    }

    /// Drop every entry, e.g. after a reorganization.
    pub fn invalidate(&self) {
        let mut slots = self.slots.lock();
        *slots = [None; ALGO_COUNT];
        debug!("[hc-retarget] average cache invalidated");
    }
}

impl Default for TargetAverageCache {
    fn default() -> Self {
        Self::new(true, true)
    }
}
