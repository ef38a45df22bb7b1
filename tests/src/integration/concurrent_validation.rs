//! # Concurrent Validation
//!
//! Several validation threads share one [`DifficultyEngine`] and one block
//! index. Whatever the interleaving, every thread must see the targets a
//! single-threaded, uncached engine computes.

#[cfg(test)]
mod tests {
    use crate::fixtures::{candidate_after, SyntheticChain};
    use hc_retarget::{DifficultyApi, DifficultyEngine, Network, RetargetConfig};
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};
    use shared_types::{AlgoTag, ChainIndex, NodeId};
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;
    use std::thread;

    const THREADS: usize = 8;

    // =============================================================================
    // TEST FIXTURES
    // =============================================================================

    struct Workload {
        index: Arc<ChainIndex>,
        queries: Arc<Vec<(NodeId, AlgoTag)>>,
        expected: Vec<u32>,
    }

    /// A mined testnet chain with two work algorithms and stake blocks, plus
    /// the reference answer for every tip.
    fn workload() -> Workload {
        let params = hc_retarget::ConsensusParams::for_network(Network::Testnet)
            .with_pow_limit(AlgoTag::Sha256d, hc_retarget::domain::compact::target(0x1e0f_ffff));
        let reference = DifficultyEngine::with_params(
            RetargetConfig {
                use_target_cache: false,
                ..RetargetConfig::for_network(Network::Testnet)
            },
            Arc::new(params),
        )
        .unwrap();

        let mut rng = StdRng::seed_from_u64(42);
        let mut chain = SyntheticChain::new(0x1e0f_ffff);
        for _ in 0..900 {
            let algo = match rng.gen_range(0..10) {
                0..=1 => AlgoTag::ProofOfStake,
                2..=5 => AlgoTag::Sha256d,
                _ => AlgoTag::Xevan,
            };
            chain.append_mined(&reference, algo, rng.gen_range(200..=1000));
        }

        let queries: Vec<(NodeId, AlgoTag)> = chain
            .blocks
            .iter()
            .flat_map(|&tip| [(tip, AlgoTag::Xevan), (tip, AlgoTag::Sha256d)])
            .collect();
        let expected = queries
            .iter()
            .map(|&(tip, algo)| {
                let candidate = candidate_after(&chain.index, tip, algo, 600);
                reference.next_required_target(&chain.index, Some(tip), &candidate).bits
            })
            .collect();

        Workload {
            index: Arc::new(chain.index),
            queries: Arc::new(queries),
            expected,
        }
    }

    fn shared_engine() -> Arc<DifficultyEngine> {
        let params = hc_retarget::ConsensusParams::for_network(Network::Testnet)
            .with_pow_limit(AlgoTag::Sha256d, hc_retarget::domain::compact::target(0x1e0f_ffff));
        Arc::new(
            DifficultyEngine::with_params(RetargetConfig::for_network(Network::Testnet), Arc::new(params))
                .unwrap(),
        )
    }

    /// Every thread walks all queries, starting at a different offset.
    fn run_threads(
        engine: &Arc<DifficultyEngine>,
        workload: &Workload,
    ) -> Vec<thread::JoinHandle<Vec<(usize, u32)>>> {
        (0..THREADS)
            .map(|worker| {
                let engine = Arc::clone(engine);
                let index = Arc::clone(&workload.index);
                let queries = Arc::clone(&workload.queries);
                thread::spawn(move || {
                    let offset = worker * queries.len() / THREADS;
                    (0..queries.len())
                        .map(|step| {
                            let at = (offset + step) % queries.len();
                            let (tip, algo) = queries[at];
                            let candidate = candidate_after(index.as_ref(), tip, algo, 600);
                            let outcome =
                                engine.next_required_target(index.as_ref(), Some(tip), &candidate);
                            (at, outcome.bits)
                        })
                        .collect()
                })
            })
            .collect()
    }

    // =============================================================================
    // SHARED ENGINE
    // =============================================================================

    #[test]
    fn test_parallel_validators_agree_with_serial_reference() {
        let workload = workload();
        let engine = shared_engine();

        for handle in run_threads(&engine, &workload) {
            for (at, bits) in handle.join().unwrap() {
                assert_eq!(bits, workload.expected[at], "query {at}");
            }
        }

        let metrics = engine.metrics();
        assert!(metrics.get_cache_hit_ratio() > 0.0);
    }

    #[test]
    fn test_invalidation_while_validating() {
        let workload = workload();
        let engine = shared_engine();
        let done = Arc::new(AtomicBool::new(false));

        let invalidator = {
            let engine = Arc::clone(&engine);
            let done = Arc::clone(&done);
            thread::spawn(move || {
                while !done.load(Ordering::Relaxed) {
                    engine.invalidate_cache();
                    thread::yield_now();
                }
            })
        };

        let handles = run_threads(&engine, &workload);
        for handle in handles {
            for (at, bits) in handle.join().unwrap() {
                assert_eq!(bits, workload.expected[at], "query {at}");
            }
        }
        done.store(true, Ordering::Relaxed);
        invalidator.join().unwrap();
    }

    #[test]
    fn test_engine_is_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<DifficultyEngine>();
        assert_send_sync::<ChainIndex>();
    }
}
