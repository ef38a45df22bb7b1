//! Difficulty Engine Service Implementation
//!
//! Wires the pure domain functions to the owned target-average cache, the
//! metrics collector and the outbound hasher port.

use crate::{
    config::RetargetConfig,
    domain::{
        check_proof_of_work, dispatch, ConsensusParams, RetargetOutcome, TargetAverageCache,
    },
    error::{Result, RetargetError},
    metrics::Metrics,
    ports::{DifficultyApi, PowHasher},
};
use primitive_types::U256;
use shared_types::{AlgoTag, BlockIndexNode, CandidateHeader, ChainIndexView, NodeId};
use std::sync::Arc;
use tracing::{debug, info};

/// Concrete implementation of [`DifficultyApi`]
///
/// One engine serves every validation thread. The consensus parameters are
/// immutable and the cache synchronizes itself, so `&self` is all any call
/// needs.
pub struct DifficultyEngine {
    /// Engine configuration
    config: RetargetConfig,

    /// Consensus parameters, shared read-only
    params: Arc<ConsensusParams>,

    /// ASERT reference averages
    cache: TargetAverageCache,

    /// Metrics collector
    metrics: Arc<Metrics>,
}

impl DifficultyEngine {
    /// Create an engine with the preset parameters of the configured network.
    pub fn new(config: RetargetConfig) -> Result<Self> {
        let params = Arc::new(ConsensusParams::for_network(config.network));
        Self::with_params(config, params)
    }

    /// Create an engine with explicit parameters.
    ///
    /// The parameters must belong to the configured network and pass
    /// [`ConsensusParams::validate`].
    pub fn with_params(config: RetargetConfig, params: Arc<ConsensusParams>) -> Result<Self> {
        if params.network != config.network {
            return Err(RetargetError::Config(format!(
                "parameters are for {} but the engine is configured for {}",
                params.network, config.network
            )));
        }
        params.validate()?;

        let cache = TargetAverageCache::new(config.use_target_cache, config.scope_cache_to_fork);
        info!(
            network = %config.network,
            use_target_cache = config.use_target_cache,
            scope_cache_to_fork = config.scope_cache_to_fork,
            mandatory_upgrade_block = params.mandatory_upgrade_block,
            "[hc-retarget] difficulty engine initialized"
        );
        Ok(Self {
            config,
            params,
            cache,
            metrics: Arc::new(Metrics::new()),
        })
    }

    /// Engine configuration
    pub fn config(&self) -> &RetargetConfig {
        &self.config
    }

    /// Shared handle to the consensus parameters
    pub fn shared_params(&self) -> Arc<ConsensusParams> {
        Arc::clone(&self.params)
    }

    /// The target-average cache
    pub fn cache(&self) -> &TargetAverageCache {
        &self.cache
    }

    /// Shared handle to the metrics collector
    pub fn metrics(&self) -> Arc<Metrics> {
        Arc::clone(&self.metrics)
    }

    /// Drop all cached averages, e.g. after a reorganization.
    pub fn invalidate_cache(&self) {
        self.cache.invalidate();
    }

    /// [`DifficultyApi::next_required_target`] that rejects a tip the view
    /// does not contain instead of panicking on it, and a candidate whose
    /// algorithm is disabled instead of handing back a zero target.
    pub fn try_next_required_target(
        &self,
        view: &dyn ChainIndexView,
        tip: Option<NodeId>,
        candidate: &CandidateHeader,
    ) -> Result<RetargetOutcome> {
        let algo = candidate.algo();
        if !self.params.is_enabled(algo) {
            return Err(RetargetError::AlgorithmDisabled(algo));
        }
        if let Some(tip) = tip {
            if view.get(tip).is_none() {
                return Err(RetargetError::UnknownNode(tip));
            }
        }
        Ok(self.next_required_target(view, tip, candidate))
    }

    /// Hash a serialized header and check it against `bits`.
    ///
    /// Algorithms the hasher does not support fail the check.
    pub fn check_header_proof(
        &self,
        hasher: &dyn PowHasher,
        header_bytes: &[u8],
        bits: u32,
        algo: AlgoTag,
    ) -> bool {
        match hasher.pow_hash(algo, header_bytes) {
            Some(hash) => self.check_proof_of_work(hash, bits, algo),
            None => {
                debug!(%algo, "[hc-retarget] no hasher for algorithm, rejecting proof");
                self.metrics.record_proof_check(false);
                false
            }
        }
    }
}

impl DifficultyApi for DifficultyEngine {
    fn params(&self) -> &ConsensusParams {
        &self.params
    }

    fn next_required_target(
        &self,
        view: &dyn ChainIndexView,
        tip: Option<NodeId>,
        candidate: &CandidateHeader,
    ) -> RetargetOutcome {
        let outcome = dispatch::next_work_required(view, tip, candidate, &self.params, &self.cache);
        self.metrics.record_retarget(&outcome);
        outcome
    }

    fn next_work_required_legacy(
        &self,
        view: &dyn ChainIndexView,
        tip: NodeId,
        candidate: &CandidateHeader,
    ) -> u32 {
        let outcome =
            dispatch::next_work_required_for_legacy_network(view, tip, candidate, &self.params);
        self.metrics.record_retarget(&outcome);
        outcome.bits
    }

    fn calculate_next_work_required_legacy(&self, tip: &BlockIndexNode, first_block_time: i64) -> u32 {
        crate::domain::algorithms::calculate_next_work_required(tip, first_block_time, &self.params)
    }

    fn check_proof_of_work(&self, hash: U256, bits: u32, algo: AlgoTag) -> bool {
        let accepted = check_proof_of_work(hash, bits, algo, &self.params);
        self.metrics.record_proof_check(accepted);
        accepted
    }
}
