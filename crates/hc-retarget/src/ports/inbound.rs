//! Inbound ports (driving side - API)

use crate::domain::{ConsensusParams, RetargetOutcome};
use primitive_types::U256;
use shared_types::{AlgoTag, BlockIndexNode, CandidateHeader, ChainIndexView, NodeId};

/// Primary port: difficulty retargeting and proof checks.
///
/// Calls are synchronous and may run concurrently from several validation
/// threads against the same implementation.
pub trait DifficultyApi: Send + Sync {
    /// Consensus parameters the implementation was built with.
    fn params(&self) -> &ConsensusParams;

    /// Target the block after `tip` must meet, with how it was obtained.
    ///
    /// Candidates of a disabled algorithm come back as
    /// [`RetargetState::Disabled`](crate::domain::RetargetState::Disabled)
    /// with zero `bits`.
    fn next_required_target(
        &self,
        view: &dyn ChainIndexView,
        tip: Option<NodeId>,
        candidate: &CandidateHeader,
    ) -> RetargetOutcome;

    /// Fixed-interval target for networks without per-block retargeting.
    fn next_work_required_legacy(
        &self,
        view: &dyn ChainIndexView,
        tip: NodeId,
        candidate: &CandidateHeader,
    ) -> u32;

    /// Fixed-interval retarget step from the interval's first block time.
    fn calculate_next_work_required_legacy(&self, tip: &BlockIndexNode, first_block_time: i64) -> u32;

    /// `true` when `hash` satisfies `bits` for `algo`.
    fn check_proof_of_work(&self, hash: U256, bits: u32, algo: AlgoTag) -> bool;
}
