//! Metrics collection for the retargeting engine

use crate::domain::{CacheOutcome, OverrideKind, RetargetOutcome, RetargetState};
use std::sync::atomic::{AtomicU64, Ordering};

/// Metrics collector for the retargeting engine
#[derive(Debug, Default)]
pub struct Metrics {
    /// Targets computed by the fixed-interval strategy
    pub legacy_retargets: AtomicU64,

    /// Targets computed by the simple moving average
    pub sma_retargets: AtomicU64,

    /// Targets computed by the weighted-target EMA
    pub wtema_retargets: AtomicU64,

    /// Targets computed by ASERT
    pub asert_retargets: AtomicU64,

    /// Ceiling returned without running a strategy
    pub ceiling_targets: AtomicU64,

    /// Candidates refused because their algorithm is disabled
    pub disabled_targets: AtomicU64,

    /// Min-difficulty targets handed out
    pub min_difficulty_overrides: AtomicU64,

    /// Historical targets handed out
    pub historical_overrides: AtomicU64,

    /// ASERT averages served from the cache
    pub cache_hits: AtomicU64,

    /// ASERT averages recomputed (cache miss or bypass)
    pub cache_misses: AtomicU64,

    /// Proofs that met their target
    pub proofs_accepted: AtomicU64,

    /// Proofs rejected
    pub proofs_rejected: AtomicU64,
}

impl Metrics {
    /// Create new metrics collector
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one target computation
    pub fn record_retarget(&self, outcome: &RetargetOutcome) {
        match outcome.forced {
            Some(OverrideKind::MinDifficulty) => {
                self.min_difficulty_overrides.fetch_add(1, Ordering::Relaxed);
            }
            Some(OverrideKind::Historical) => {
                self.historical_overrides.fetch_add(1, Ordering::Relaxed);
            }
            None => {
                self.state_counter(outcome.state).fetch_add(1, Ordering::Relaxed);
            }
        }
        match outcome.cache {
            Some(CacheOutcome::Hit) => {
                self.cache_hits.fetch_add(1, Ordering::Relaxed);
            }
            Some(CacheOutcome::Miss | CacheOutcome::Bypassed) => {
                self.cache_misses.fetch_add(1, Ordering::Relaxed);
            }
            None => {}
        }
    }

    /// Record a proof check
    pub fn record_proof_check(&self, accepted: bool) {
        let counter = if accepted {
            &self.proofs_accepted
        } else {
            &self.proofs_rejected
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Get targets computed in `state`
    pub fn get_retargets(&self, state: RetargetState) -> u64 {
        self.state_counter(state).load(Ordering::Relaxed)
    }

    fn state_counter(&self, state: RetargetState) -> &AtomicU64 {
        match state {
            RetargetState::Disabled => &self.disabled_targets,
            RetargetState::Ceiling => &self.ceiling_targets,
            RetargetState::LegacyPeriodic => &self.legacy_retargets,
            RetargetState::SimpleMovingAverage => &self.sma_retargets,
            RetargetState::WeightedEma => &self.wtema_retargets,
            RetargetState::Asert => &self.asert_retargets,
        }
    }

    /// Get forced targets of `kind`
    pub fn get_overrides(&self, kind: OverrideKind) -> u64 {
        match kind {
            OverrideKind::MinDifficulty => self.min_difficulty_overrides.load(Ordering::Relaxed),
            OverrideKind::Historical => self.historical_overrides.load(Ordering::Relaxed),
        }
    }

    /// Get cache hit ratio (0.0 when nothing was looked up)
    pub fn get_cache_hit_ratio(&self) -> f64 {
        let hits = self.cache_hits.load(Ordering::Relaxed);
        let total = hits + self.cache_misses.load(Ordering::Relaxed);
        if total == 0 {
            return 0.0;
        }
        hits as f64 / total as f64
    }

    /// Get (accepted, rejected) proof counts
    pub fn get_proof_checks(&self) -> (u64, u64) {
        (
            self.proofs_accepted.load(Ordering::Relaxed),
            self.proofs_rejected.load(Ordering::Relaxed),
        )
    }
}
