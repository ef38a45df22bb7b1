//! # Hybrid-Chain Retargeting Benchmarks
//!
//! | Path | Expectation |
//! |------|-------------|
//! | ASERT, warm cache | Reference walk only, no window average |
//! | ASERT, cold | Reference walk plus a full window average |
//! | SMA / WTEMA | A few ancestor steps |
//! | Proof check | Compact decode and one comparison |

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use hc_retarget::domain::compact;
use hc_retarget::{
    check_proof_of_work, ConsensusParams, DifficultyApi, DifficultyEngine, Network, RetargetConfig,
};
use hc_tests::fixtures::{candidate_after, SyntheticChain};
use primitive_types::U256;
use rand::Rng;
use shared_types::AlgoTag;
use std::time::Duration;

const BITS: u32 = 0x1d0f_0000;
const XEVAN_LIMIT: u32 = 0x1e0f_ffff;

fn engine(network: Network, use_target_cache: bool) -> DifficultyEngine {
    DifficultyEngine::new(RetargetConfig {
        use_target_cache,
        ..RetargetConfig::for_network(network)
    })
    .unwrap()
}

// ============================================================================
// ASERT: warm cache against recomputing the window average
// ============================================================================

fn bench_asert(c: &mut Criterion) {
    let mut group = c.benchmark_group("asert");
    group.measurement_time(Duration::from_secs(10));

    for blocks in [400usize, 1_000, 3_000] {
        let mut chain = SyntheticChain::new(XEVAN_LIMIT);
        chain.append_many(blocks, AlgoTag::Xevan, 600, BITS);
        let candidate = candidate_after(&chain.index, chain.tip, AlgoTag::Xevan, 600);

        let warm = engine(Network::Testnet, true);
        warm.next_required_target(&chain.index, Some(chain.tip), &candidate);
        group.bench_with_input(BenchmarkId::new("warm", blocks), &blocks, |b, _| {
            b.iter(|| {
                black_box(warm.next_required_target(&chain.index, Some(chain.tip), black_box(&candidate)))
            })
        });

        let cold = engine(Network::Testnet, false);
        group.bench_with_input(BenchmarkId::new("cold", blocks), &blocks, |b, _| {
            b.iter(|| {
                black_box(cold.next_required_target(&chain.index, Some(chain.tip), black_box(&candidate)))
            })
        });
    }

    group.finish();
}

// ============================================================================
// Pre-upgrade strategies
// ============================================================================

fn bench_pre_upgrade(c: &mut Criterion) {
    let mut group = c.benchmark_group("pre-upgrade");
    let engine = engine(Network::Main, true);

    let mut chain = SyntheticChain::new(XEVAN_LIMIT);
    for _ in 0..200 {
        chain.append(AlgoTag::ProofOfStake, 80, 0x1d00_ffff);
        chain.append(AlgoTag::Xevan, 80, BITS);
    }

    for algo in [AlgoTag::ProofOfStake, AlgoTag::Xevan] {
        let candidate = candidate_after(&chain.index, chain.tip, algo, 80);
        group.bench_function(algo.to_string(), |b| {
            b.iter(|| black_box(engine.next_required_target(&chain.index, Some(chain.tip), &candidate)))
        });
    }

    group.finish();
}

// ============================================================================
// Proof-of-work check
// ============================================================================

fn bench_proof_check(c: &mut Criterion) {
    let mut group = c.benchmark_group("proof-check");
    let params = ConsensusParams::for_network(Network::Main);

    let hashes: Vec<U256> = {
        let mut rng = rand::thread_rng();
        (0..1_000)
            .map(|_| {
                let mut bytes = [0u8; 32];
                rng.fill(&mut bytes);
                U256::from_little_endian(&bytes) >> 40
            })
            .collect()
    };

    group.throughput(Throughput::Elements(hashes.len() as u64));
    group.bench_function("check_proof_of_work", |b| {
        b.iter(|| {
            hashes
                .iter()
                .filter(|hash| check_proof_of_work(**hash, BITS, AlgoTag::Xevan, &params))
                .count()
        })
    });

    group.bench_function("compact_round_trip", |b| {
        b.iter(|| compact::to_compact_rounded(compact::target(black_box(BITS))))
    });

    group.finish();
}

criterion_group!(benches, bench_asert, bench_pre_upgrade, bench_proof_check);
criterion_main!(benches);
