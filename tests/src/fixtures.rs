//! Synthetic chains for engine-level tests and benchmarks.

use hc_retarget::{DifficultyApi, DifficultyEngine, RetargetOutcome};
use shared_types::{AlgoTag, BlockEntry, CandidateHeader, ChainIndex, ChainIndexView, NodeId};

/// Genesis timestamp of every synthetic chain.
pub const GENESIS_TIME: i64 = 1_600_000_000;

/// A block index grown one block at a time.
///
/// `blocks` keeps every inserted node in insertion order, branches included.
pub struct SyntheticChain {
    pub index: ChainIndex,
    pub blocks: Vec<NodeId>,
    pub tip: NodeId,
    seed: u64,
}

impl SyntheticChain {
    /// Untagged genesis carrying `bits`.
    pub fn new(bits: u32) -> Self {
        let mut index = ChainIndex::new();
        let genesis = index
            .insert_genesis(BlockEntry {
                hash: block_hash(0),
                time: GENESIS_TIME,
                bits,
                version: 1,
                proof_of_stake: false,
            })
            .expect("empty index accepts genesis");
        Self {
            index,
            blocks: vec![genesis],
            tip: genesis,
            seed: 0,
        }
    }

    /// Timestamp of the current tip.
    pub fn tip_time(&self) -> i64 {
        self.index.node(self.tip).time
    }

    /// Height of the current tip.
    pub fn tip_height(&self) -> u32 {
        self.index.node(self.tip).height
    }

    /// Append a block `spacing` seconds after the tip with explicit bits.
    pub fn append(&mut self, algo: AlgoTag, spacing: i64, bits: u32) -> NodeId {
        let header = CandidateHeader::tagged(algo, self.tip_time() + spacing);
        self.seed += 1;
        self.tip = self
            .index
            .insert(
                self.tip,
                BlockEntry {
                    hash: block_hash(self.seed),
                    time: header.time,
                    bits,
                    version: header.version,
                    proof_of_stake: header.proof_of_stake,
                },
            )
            .expect("tip is always in the index");
        self.blocks.push(self.tip);
        self.tip
    }

    /// Append `count` blocks with the same spacing and bits.
    pub fn append_many(&mut self, count: usize, algo: AlgoTag, spacing: i64, bits: u32) -> NodeId {
        for _ in 0..count {
            self.append(algo, spacing, bits);
        }
        self.tip
    }

    /// Append a block carrying exactly the target the engine requires.
    pub fn append_mined(
        &mut self,
        engine: &DifficultyEngine,
        algo: AlgoTag,
        spacing: i64,
    ) -> RetargetOutcome {
        let candidate = CandidateHeader::tagged(algo, self.tip_time() + spacing);
        let outcome = engine.next_required_target(&self.index, Some(self.tip), &candidate);
        self.append(algo, spacing, outcome.bits);
        outcome
    }

    /// Continue from `from`: later appends build a branch there.
    pub fn branch_from(&mut self, from: NodeId) {
        self.tip = from;
    }
}

/// Candidate `spacing` seconds after `tip`.
pub fn candidate_after<V: ChainIndexView + ?Sized>(
    view: &V,
    tip: NodeId,
    algo: AlgoTag,
    spacing: i64,
) -> CandidateHeader {
    CandidateHeader::tagged(algo, view.node(tip).time + spacing)
}

/// Header bytes for a proof-of-work attempt: parent hash, time, bits, nonce.
pub fn header_bytes(prev_hash: &[u8; 32], time: i64, bits: u32, nonce: u32) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(48);
    bytes.extend_from_slice(prev_hash);
    bytes.extend_from_slice(&time.to_le_bytes());
    bytes.extend_from_slice(&bits.to_le_bytes());
    bytes.extend_from_slice(&nonce.to_le_bytes());
    bytes
}

/// Log output for a test run, filtered by `RUST_LOG`.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn block_hash(seed: u64) -> [u8; 32] {
    let mut hash = [0u8; 32];
    hash[0] = 0x5a;
    hash[24..].copy_from_slice(&seed.to_be_bytes());
    hash
}
