//! # Hybrid Chain - Difficulty Retargeting Engine
//!
//! **Bounded Context:** Proof-of-Work Difficulty & Validation
//! **Architecture Compliance:** DDD + Hexagonal + TDD
//!
//! ## Purpose
//!
//! Computes the compact target the next block must meet and checks a claimed
//! proof-of-work hash against it, for a chain that mixes proof of stake with
//! several independently retargeted proof-of-work algorithms:
//! - Fixed-interval retargeting for legacy networks
//! - Simple moving average for pre-upgrade PoW blocks
//! - Weighted target EMA for stake blocks
//! - Averaged ASERT after the mandatory upgrade, backed by a per-algorithm cache
//! - Min-difficulty relaxation and the historical mainnet overrides
//!
//! ## Architecture Layers
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │  Adapters (Outer)                                   │
//! │  - DigestPowHasher: SHA-256d, Keccak-256            │
//! └─────────────────────────────────────────────────────┘
//!                         │
//! ┌─────────────────────────────────────────────────────┐
//! │  Ports (Middle)                                     │
//! │  - Inbound: DifficultyApi                           │
//! │  - Outbound: PowHasher                              │
//! └─────────────────────────────────────────────────────┘
//!                         │
//! ┌─────────────────────────────────────────────────────┐
//! │  Domain (Inner - Pure Logic)                        │
//! │  - Compact codec, 512-bit arithmetic                │
//! │  - Retargeting strategies and dispatcher            │
//! │  - TargetAverageCache                               │
//! │  - Proof-of-work check                              │
//! └─────────────────────────────────────────────────────┘
//! ```
//!
//! ## Critical Invariants
//!
//! 1. **Ceiling**: A required target never exceeds the algorithm's ceiling
//! 2. **Non-zero**: A required target is never zero
//! 3. **Determinism**: Same chain, same candidate, same params, same target
//! 4. **Cache Transparency**: Cached and uncached runs agree bit for bit
//! 5. **Stake Exclusion**: A stake block never passes the proof-of-work check
//!
//! ## Usage Example
//!
//! ```rust,ignore
//! let engine = DifficultyEngine::new(RetargetConfig::for_network(Network::Main))?;
//! let outcome = engine.next_required_target(&index, Some(tip), &candidate);
//! let valid = engine.check_proof_of_work(hash, outcome.bits, candidate.algo());
//! ```
//!
//! ## Module Structure
//!
//! - [`domain`]: Pure domain logic (codec, strategies, dispatch, validation)
//! - [`ports`]: Hexagonal architecture interfaces (inbound/outbound)
//! - [`adapters`]: Digest-backed proof-of-work hashing
//! - [`service`]: The engine tying domain, cache and metrics together

#![warn(missing_docs)]
#![warn(clippy::all)]

/// Proof-of-work hashing adapters
pub mod adapters;
/// Domain models and retargeting logic
pub mod domain;
pub mod ports;
pub mod service;

mod config;
mod error;
mod metrics;

pub use config::RetargetConfig;
pub use error::{Result, RetargetError};
pub use metrics::Metrics;

// Re-export commonly used types
pub use domain::{
    check_proof_of_work, hash_to_u256, next_work_required, select, verify_proof_of_work,
    CacheOutcome, ConsensusParams, DifficultyOverride, Network, OverrideKind, ProofRejection,
    RetargetOutcome, RetargetState, TargetAverageCache,
};

pub use ports::{DifficultyApi, PowHasher};

pub use adapters::DigestPowHasher;

pub use service::DifficultyEngine;

/// Subsystem name used as the log prefix
pub const SUBSYSTEM_NAME: &str = "hc-retarget";

/// Proof-of-work spacing in seconds used by the post-fork strategies
pub const TARGET_SPACING_SECS: i64 = domain::params::POW_TARGET_SPACING;

/// Seconds without a block before a min-difficulty block is allowed
pub const MIN_DIFFICULTY_DELAY_SECS: i64 = domain::dispatch::MIN_DIFFICULTY_DELAY;
