//! # Chain Index
//!
//! Read-only ancestor traversal over the block-index graph, plus an
//! in-memory arena that implements it.
//!
//! Following `prev` from any node reaches genesis in a finite number of steps:
//! a node can only be inserted under a parent that already exists, so the
//! graph has no cycles.

use crate::entities::{hash_to_display_hex, BlockIndexNode, Hash, NodeId};
use crate::errors::ChainIndexError;
use std::collections::HashMap;

/// Read-only view of the block index.
///
/// Supplied by the chain-state component. Implementations must keep every
/// node reachable from a handed-out [`NodeId`] valid and unchanged for the
/// duration of a call.
pub trait ChainIndexView {
    /// Look up a node by key.
    fn get(&self, id: NodeId) -> Option<&BlockIndexNode>;

    /// Look up a node that is known to exist.
    ///
    /// # Panics
    ///
    /// Panics if the key is dangling. Keys only come from the view itself,
    /// so a miss means the index was mutated underneath the caller.
    fn node(&self, id: NodeId) -> &BlockIndexNode {
        match self.get(id) {
            Some(node) => node,
            None => panic!("chain index lost node {id} during traversal"),
        }
    }

    /// Predecessor of a node, `None` for genesis.
    fn prev(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).prev
    }

    /// Ancestor of `id` at `height`, `None` if `height` is above the node.
    fn ancestor(&self, id: NodeId, height: u32) -> Option<NodeId> {
        let mut current = id;
        loop {
            let node = self.node(current);
            if node.height == height {
                return Some(current);
            }
            if node.height < height {
                return None;
            }
            current = node.prev?;
        }
    }
}

/// In-memory arena of block index nodes.
#[derive(Debug, Default, Clone)]
pub struct ChainIndex {
    nodes: Vec<BlockIndexNode>,
    by_hash: HashMap<Hash, NodeId>,
    genesis: Option<NodeId>,
}

/// Fields of a block being added to a [`ChainIndex`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockEntry {
    /// Block hash (internal byte order).
    pub hash: Hash,
    /// Block timestamp (Unix seconds).
    pub time: i64,
    /// Compact target the block satisfied.
    pub bits: u32,
    /// Block version.
    pub version: i32,
    /// Whether the block was produced by staking.
    pub proof_of_stake: bool,
}

impl ChainIndex {
    /// Create an empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert the genesis block.
    pub fn insert_genesis(&mut self, entry: BlockEntry) -> Result<NodeId, ChainIndexError> {
        if let Some(existing) = self.genesis {
            return Err(ChainIndexError::DuplicateGenesis(existing));
        }
        let id = self.push(entry, 0, None)?;
        self.genesis = Some(id);
        Ok(id)
    }

    /// Insert a block on top of `parent`; height is parent height + 1.
    pub fn insert(&mut self, parent: NodeId, entry: BlockEntry) -> Result<NodeId, ChainIndexError> {
        let parent_height = self
            .get(parent)
            .map(|node| node.height)
            .ok_or(ChainIndexError::UnknownParent(parent))?;
        self.push(entry, parent_height + 1, Some(parent))
    }

    fn push(
        &mut self,
        entry: BlockEntry,
        height: u32,
        prev: Option<NodeId>,
    ) -> Result<NodeId, ChainIndexError> {
        if let Some(existing) = self.by_hash.get(&entry.hash) {
            return Err(ChainIndexError::DuplicateBlock {
                hash: hash_to_display_hex(&entry.hash),
                existing: *existing,
            });
        }
        let raw = u32::try_from(self.nodes.len()).map_err(|_| ChainIndexError::CapacityExhausted)?;
        let id = NodeId(raw);
        self.nodes.push(BlockIndexNode {
            hash: entry.hash,
            height,
            time: entry.time,
            bits: entry.bits,
            version: entry.version,
            proof_of_stake: entry.proof_of_stake,
            prev,
        });
        self.by_hash.insert(entry.hash, id);
        Ok(id)
    }

    /// Key of the block with `hash`, if indexed.
    pub fn lookup(&self, hash: &Hash) -> Option<NodeId> {
        self.by_hash.get(hash).copied()
    }

    /// Key of the genesis block, if inserted.
    pub fn genesis(&self) -> Option<NodeId> {
        self.genesis
    }

    /// Number of indexed blocks across all branches.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// True when nothing has been indexed.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

impl ChainIndexView for ChainIndex {
    fn get(&self, id: NodeId) -> Option<&BlockIndexNode> {
        self.nodes.get(id.0 as usize)
    }
}
