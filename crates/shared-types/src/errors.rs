//! # Error Types
//!
//! Errors raised while building the in-memory block index.

use crate::entities::NodeId;
use thiserror::Error;

/// Errors that can occur when inserting into a [`crate::ChainIndex`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChainIndexError {
    /// Parent key does not exist in the arena.
    #[error("Unknown parent node: {0}")]
    UnknownParent(NodeId),

    /// A block with the same hash is already indexed.
    #[error("Duplicate block: {hash} already indexed as {existing}")]
    DuplicateBlock {
        /// Display hex of the rejected hash
        hash: String,
        /// Node already holding that hash
        existing: NodeId,
    },

    /// The arena already holds a genesis node.
    #[error("Genesis already present as {0}")]
    DuplicateGenesis(NodeId),

    /// The arena is full.
    #[error("Chain index capacity exhausted")]
    CapacityExhausted,
}
