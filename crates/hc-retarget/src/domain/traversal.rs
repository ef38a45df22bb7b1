//! Ancestor walks over the chain index.
//!
//! Each walk starts at a node and follows `prev` until the predicate holds or
//! genesis is reached. Genesis is returned even when it does not match: the
//! first block of a new algorithm finds no earlier sibling, and callers treat
//! that case as a fixed point.
//!
//! All walks accept an optional start so `node.prev` can be passed straight
//! through; `None` in gives `None` out.

use shared_types::{AlgoTag, ChainIndexView, NodeId};

/// Walk back from `start` to the nearest block with the given stake flag.
pub fn last_index_matching_stake_flag<V>(
    view: &V,
    start: Option<NodeId>,
    proof_of_stake: bool,
) -> Option<NodeId>
where
    V: ChainIndexView + ?Sized,
{
    walk_until(view, start, |node| node.proof_of_stake == proof_of_stake)
}

/// Walk back from `start` to the nearest block tagged `algo`.
///
/// `AlgoTag::Legacy` matches untagged blocks.
pub fn last_index_matching_algo<V>(view: &V, start: Option<NodeId>, algo: AlgoTag) -> Option<NodeId>
where
    V: ChainIndexView + ?Sized,
{
    walk_until(view, start, |node| node.algo() == algo)
}

/// The walk a retargeting strategy uses for its own block series: by stake
/// flag for untagged candidates, by algorithm tag otherwise.
pub fn last_index_matching<V>(
    view: &V,
    start: Option<NodeId>,
    algo: AlgoTag,
    proof_of_stake: bool,
) -> Option<NodeId>
where
    V: ChainIndexView + ?Sized,
{
    match algo {
        AlgoTag::Legacy => last_index_matching_stake_flag(view, start, proof_of_stake),
        algo => last_index_matching_algo(view, start, algo),
    }
}

fn walk_until<V, F>(view: &V, start: Option<NodeId>, matches: F) -> Option<NodeId>
where
    V: ChainIndexView + ?Sized,
    F: Fn(&shared_types::BlockIndexNode) -> bool,
{
    let mut current = start?;
    loop {
        let node = view.node(current);
        match node.prev {
            Some(prev) if !matches(node) => current = prev,
            _ => return Some(current),
        }
    }
}
