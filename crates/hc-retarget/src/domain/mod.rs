//! Domain layer - Pure retargeting and validation logic
//!
//! Everything here is synchronous and deterministic. The only shared state is
//! the [`TargetAverageCache`], which callers own and pass in.
//!
//! ## Primitives
//!
//! - [`WideUint`]: 512-bit intermediate with checked arithmetic
//! - [`compact`]: Compact target codec (truncating and rounding)
//! - [`ConsensusParams`]: Immutable per-network configuration
//! - [`traversal`]: Same-algorithm and same-stake-flag ancestor walks
//!
//! ## Services
//!
//! - [`algorithms`]: The four retargeting strategies
//! - [`dispatch`]: Strategy selection and forced targets
//! - [`validation`]: Hash-against-target check
//!
//! ## Invariants
//!
//! 1. A computed target never exceeds the algorithm's ceiling
//! 2. A computed target is never zero
//! 3. A cached average equals the freshly computed one

pub mod algorithms;
pub mod cache;
pub mod compact;
pub mod dispatch;
pub mod params;
pub mod traversal;
pub mod validation;
pub mod wide;

pub use cache::{CacheEntry, CacheOutcome, TargetAverageCache};
pub use compact::{block_proof, DecodedTarget};
pub use dispatch::{
    next_work_required, next_work_required_for_legacy_network, select, OverrideKind,
    RetargetOutcome, RetargetState, Selection,
};
pub use params::{ConsensusParams, DifficultyOverride, Network, MAINNET_DIFFICULTY_OVERRIDES};
pub use validation::{check_proof_of_work, hash_to_u256, verify_proof_of_work, ProofRejection};
pub use wide::WideUint;
