//! # Retargeting Flows
//!
//! Drives [`DifficultyEngine`] over chains that are mined block by block, each
//! block carrying the target the engine required for it.
//!
//! ## Flows Tested:
//!
//! 1. **Cache transparency**: Cached and uncached engines agree on every block
//! 2. **Schedule tracking**: Slow blocks ease the target, fast blocks tighten it
//! 3. **Min-difficulty**: Late blocks get the marker, the next one the old target
//! 4. **Strategy routing**: Pre-upgrade PoW and PoS use their own strategies
//! 5. **Reorg**: Alternating between branches never serves a stale average
//! 6. **Mining**: A header found with the digest hasher passes validation

#[cfg(test)]
mod tests {
    use crate::fixtures::{candidate_after, header_bytes, init_tracing, SyntheticChain};
    use hc_retarget::domain::compact;
    use hc_retarget::{
        CacheOutcome, ConsensusParams, DifficultyApi, DifficultyEngine, DigestPowHasher, Network,
        OverrideKind, PowHasher, RetargetConfig, RetargetState,
    };
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};
    use shared_types::{AlgoTag, ChainIndexView};
    use std::sync::Arc;

    const BITS: u32 = 0x1d0f_0000;
    const XEVAN_LIMIT: u32 = 0x1e0f_ffff;

    // =============================================================================
    // TEST FIXTURES
    // =============================================================================

    fn engine(network: Network, use_target_cache: bool) -> DifficultyEngine {
        let config = RetargetConfig {
            use_target_cache,
            ..RetargetConfig::for_network(network)
        };
        DifficultyEngine::new(config).unwrap()
    }

    fn assert_within_ceiling(engine: &DifficultyEngine, bits: u32, algo: AlgoTag) {
        let decoded = compact::to_full(bits);
        assert!(decoded.is_valid(), "bits {bits:#010x} invalid");
        assert!(!decoded.target.is_zero());
        assert!(
            decoded.target <= engine.params().pow_limit(algo),
            "bits {bits:#010x} above the {algo} ceiling"
        );
    }

    // =============================================================================
    // CACHE TRANSPARENCY
    // =============================================================================

    #[test]
    fn test_mined_chain_cached_matches_uncached() {
        init_tracing();
        let cached = engine(Network::Testnet, true);
        let uncached = engine(Network::Testnet, false);
        let mut rng = StdRng::seed_from_u64(17);
        let mut chain = SyntheticChain::new(XEVAN_LIMIT);

        for _ in 0..800 {
            let algo = if rng.gen_bool(0.25) {
                AlgoTag::ProofOfStake
            } else {
                AlgoTag::Xevan
            };
            let spacing = rng.gen_range(300..=1500);
            let candidate = candidate_after(&chain.index, chain.tip, algo, spacing);

            let expected = uncached.next_required_target(&chain.index, Some(chain.tip), &candidate);
            let outcome = chain.append_mined(&cached, algo, spacing);

            assert_eq!(outcome.bits, expected.bits, "height {}", chain.tip_height());
            assert_eq!(outcome.state, RetargetState::Asert);
            assert_within_ceiling(&cached, outcome.bits, algo);
        }

        let metrics = cached.metrics();
        assert!(metrics.get_cache_hit_ratio() > 0.0);
        assert_eq!(uncached.metrics().get_cache_hit_ratio(), 0.0);
        assert_eq!(
            metrics.get_retargets(RetargetState::Asert)
                + metrics.get_overrides(OverrideKind::MinDifficulty),
            800
        );
    }

    // =============================================================================
    // SCHEDULE TRACKING
    // =============================================================================

    #[test]
    fn test_slow_then_fast_blocks() {
        let engine = engine(Network::Testnet, true);
        let mut chain = SyntheticChain::new(XEVAN_LIMIT);
        chain.append_many(40, AlgoTag::Xevan, 600, BITS);

        let on_schedule = chain.append_mined(&engine, AlgoTag::Xevan, 600);
        assert_eq!(on_schedule.bits, BITS);

        for _ in 0..20 {
            chain.append_mined(&engine, AlgoTag::Xevan, 1500);
        }
        let slow = chain.append_mined(&engine, AlgoTag::Xevan, 600);
        assert!(compact::target(slow.bits) > compact::target(BITS));

        for _ in 0..40 {
            chain.append_mined(&engine, AlgoTag::Xevan, 300);
        }
        let recovered = chain.append_mined(&engine, AlgoTag::Xevan, 600);
        assert!(compact::target(recovered.bits) < compact::target(slow.bits));
        assert!(compact::target(recovered.bits) > compact::target(BITS));
    }

    // =============================================================================
    // MIN-DIFFICULTY
    // =============================================================================

    #[test]
    fn test_min_difficulty_block_and_recovery() {
        let engine = engine(Network::Testnet, true);
        let mut chain = SyntheticChain::new(XEVAN_LIMIT);
        chain.append_many(20, AlgoTag::Xevan, 600, BITS);

        // Over thirty minutes late: the marker
        let late = chain.append_mined(&engine, AlgoTag::Xevan, 1801);
        assert_eq!(late.forced, Some(OverrideKind::MinDifficulty));
        assert_eq!(late.bits, XEVAN_LIMIT - 1);

        // Right after the marker: the target before it
        let after = chain.append_mined(&engine, AlgoTag::Xevan, 600);
        assert_eq!(after.forced, Some(OverrideKind::MinDifficulty));
        assert_eq!(after.bits, BITS);

        let regular = chain.append_mined(&engine, AlgoTag::Xevan, 600);
        assert_eq!(regular.forced, None);
        assert_eq!(regular.state, RetargetState::Asert);
        assert_eq!(engine.metrics().get_overrides(OverrideKind::MinDifficulty), 2);
    }

    // =============================================================================
    // STRATEGY ROUTING
    // =============================================================================

    #[test]
    fn test_mainnet_pre_upgrade_routing() {
        let engine = engine(Network::Main, true);
        let mut chain = SyntheticChain::new(XEVAN_LIMIT);
        for _ in 0..15 {
            chain.append(AlgoTag::ProofOfStake, 80, 0x1d00_ffff);
            chain.append(AlgoTag::Xevan, 80, BITS);
        }

        let stake = chain.append_mined(&engine, AlgoTag::ProofOfStake, 80);
        assert_eq!(stake.state, RetargetState::WeightedEma);
        assert_eq!(stake.cache, None);
        assert_within_ceiling(&engine, stake.bits, AlgoTag::ProofOfStake);

        let work = chain.append_mined(&engine, AlgoTag::Xevan, 80);
        assert_eq!(work.state, RetargetState::SimpleMovingAverage);
        assert_within_ceiling(&engine, work.bits, AlgoTag::Xevan);

        let metrics = engine.metrics();
        assert_eq!(metrics.get_retargets(RetargetState::WeightedEma), 1);
        assert_eq!(metrics.get_retargets(RetargetState::SimpleMovingAverage), 1);
    }

    #[test]
    fn test_legacy_network_entry_point() {
        let engine = engine(Network::Main, false);
        let mut chain = SyntheticChain::new(XEVAN_LIMIT);
        chain.append_many(5, AlgoTag::Legacy, 80, BITS);

        let candidate = candidate_after(&chain.index, chain.tip, AlgoTag::Legacy, 80);
        let bits = engine.next_work_required_legacy(&chain.index, chain.tip, &candidate);
        assert_eq!(bits, BITS);
        assert_eq!(engine.metrics().get_retargets(RetargetState::LegacyPeriodic), 1);

        // A full timespan on schedule keeps the target
        let tip = chain.index.node(chain.tip);
        let first_time = tip.time - engine.params().pow_target_timespan;
        assert_eq!(engine.calculate_next_work_required_legacy(tip, first_time), BITS);
    }

    // =============================================================================
    // REORG
    // =============================================================================

    #[test]
    fn test_alternating_branches_never_serve_stale_average() {
        let cached = engine(Network::Testnet, true);
        let uncached = engine(Network::Testnet, false);
        let mut chain = SyntheticChain::new(XEVAN_LIMIT);
        chain.append_many(620, AlgoTag::Xevan, 600, BITS);
        // Both tips sit in the third window; its first block differs per branch
        let fork_point = chain.blocks[500];
        let main_tip = chain.tip;

        chain.branch_from(fork_point);
        chain.append_many(100, AlgoTag::Xevan, 900, 0x1d0e_0000);
        let fork_tip = chain.tip;

        let mut outcomes = Vec::new();
        for tip in [main_tip, fork_tip, main_tip, fork_tip] {
            let candidate = candidate_after(&chain.index, tip, AlgoTag::Xevan, 600);
            let got = cached.next_required_target(&chain.index, Some(tip), &candidate);
            let want = uncached.next_required_target(&chain.index, Some(tip), &candidate);
            assert_eq!(got.bits, want.bits);
            outcomes.push(got.cache);
        }
        // Each switch changes the anchor
        assert!(outcomes.iter().all(|outcome| *outcome == Some(CacheOutcome::Miss)));

        let repeat = candidate_after(&chain.index, fork_tip, AlgoTag::Xevan, 600);
        let again = cached.next_required_target(&chain.index, Some(fork_tip), &repeat);
        assert_eq!(again.cache, Some(CacheOutcome::Hit));

        cached.invalidate_cache();
        let cleared = cached.next_required_target(&chain.index, Some(fork_tip), &repeat);
        assert_eq!(cleared.cache, Some(CacheOutcome::Miss));
        assert_eq!(cleared.bits, again.bits);
    }

    // =============================================================================
    // MINING WITH THE DIGEST HASHER
    // =============================================================================

    #[test]
    fn test_mine_and_validate_sha256d_block() {
        let params = ConsensusParams::for_network(Network::Regtest)
            .with_pow_limit(AlgoTag::Sha256d, compact::target(0x207f_ffff));
        let engine = DifficultyEngine::with_params(
            RetargetConfig::for_network(Network::Regtest),
            Arc::new(params),
        )
        .unwrap();
        let mut chain = SyntheticChain::new(0x207f_ffff);
        chain.append_many(3, AlgoTag::Sha256d, 600, 0x207f_ffff);

        let candidate = candidate_after(&chain.index, chain.tip, AlgoTag::Sha256d, 600);
        let required = engine.next_required_target(&chain.index, Some(chain.tip), &candidate);
        assert_eq!(required.state, RetargetState::Ceiling);
        assert_eq!(required.bits, 0x207f_ffff);

        // Mine below the required target
        let bits = 0x2000_ffff;
        let prev_hash = chain.index.node(chain.tip).hash;
        let header = (0u32..1_000_000)
            .map(|nonce| header_bytes(&prev_hash, candidate.time, bits, nonce))
            .find(|header| engine.check_header_proof(&DigestPowHasher, header, bits, AlgoTag::Sha256d))
            .expect("a nonce within a million attempts");

        let hash = DigestPowHasher.pow_hash(AlgoTag::Sha256d, &header).unwrap();
        assert!(hash <= compact::target(bits), "header {}", hex::encode(&header));
        assert!(engine.check_proof_of_work(hash, required.bits, AlgoTag::Sha256d));
        assert!(!engine.check_proof_of_work(hash, required.bits, AlgoTag::ProofOfStake));
        assert!(!engine.check_proof_of_work(hash, required.bits, AlgoTag::Keccak256));

        // Keccak-256 has no ceiling here: no target is handed out for it
        let keccak = candidate_after(&chain.index, chain.tip, AlgoTag::Keccak256, 600);
        let refused = engine.next_required_target(&chain.index, Some(chain.tip), &keccak);
        assert_eq!(refused.state, RetargetState::Disabled);
        assert!(engine
            .try_next_required_target(&chain.index, Some(chain.tip), &keccak)
            .is_err());

        let (accepted, _) = engine.metrics().get_proof_checks();
        assert_eq!(accepted, 2);
    }
}
