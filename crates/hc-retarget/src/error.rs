//! Error types for the retargeting engine
//!
//! Consensus computations never return these: a required target is always
//! produced and a proof check is a plain `bool`. Errors only surface while
//! building the engine, when a caller hands in a key the index does not know,
//! or when it asks for a target for an algorithm the network does not accept.

use shared_types::{AlgoTag, NodeId};
use thiserror::Error;

/// Result type alias for engine operations
pub type Result<T> = std::result::Result<T, RetargetError>;

/// Errors that can occur around retargeting
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RetargetError {
    /// Consensus parameters the strategies cannot run with
    #[error("Invalid consensus parameters: {0}")]
    InvalidParams(String),

    /// Tip key not present in the chain index
    #[error("Unknown chain index node: {0}")]
    UnknownNode(NodeId),

    /// The candidate's algorithm has no ceiling on this network
    #[error("Algorithm disabled on this network: {0}")]
    AlgorithmDisabled(AlgoTag),

    /// Invalid engine configuration
    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl RetargetError {
    /// Check if error is recoverable (caller can retry with other input)
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::UnknownNode(_) | Self::AlgorithmDisabled(_))
    }

    /// Check if error is critical (engine must not start)
    pub fn is_critical(&self) -> bool {
        matches!(self, Self::InvalidParams(_) | Self::Config(_))
    }
}
