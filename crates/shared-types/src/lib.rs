//! # Shared Types Crate
//!
//! Chain primitives shared between the chain-state component (which owns the
//! block index) and the difficulty retargeting engine (which only reads it).
//!
//! ## Design Principles
//!
//! - **Read-only view**: The engine walks the block index through
//!   [`ChainIndexView`] and never mutates or retains nodes beyond a call.
//! - **Arena, not pointers**: Nodes are addressed by a stable [`NodeId`] and the
//!   predecessor link is an `Option<NodeId>`, so deep ancestor chains are plain
//!   index lookups.
//! - **Total decoding**: Every block version maps to an [`AlgoTag`]; malformed
//!   versions map to [`AlgoTag::Legacy`] rather than failing.

pub mod algo;
pub mod chain;
pub mod entities;
pub mod errors;

pub use algo::*;
pub use chain::{BlockEntry, ChainIndex, ChainIndexView};
pub use entities::*;
pub use errors::*;
