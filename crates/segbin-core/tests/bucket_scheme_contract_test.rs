//! Integration test: size <-> bucket contract across many configurations.
//!
//! Validates that, for every valid configuration in a grid:
//! 1. Word and double-word tiers round-trip for every size they own.
//! 2. The log tier round-trips for every bucket it owns (exhaustive).
//! 3. `size_of` is strictly increasing with no seams at tier boundaries.
//! 4. The bucket count stays within `2 * word_size_bits`.
//! 5. Request lookups round up and never under-serve.
//! 6. A black-box scan of `index_of` finds every bucket exactly once.
//!
//! Run: cargo test -p segbin-core --test bucket_scheme_contract_test

use segbin_core::binning::scan;
use segbin_core::{
    BucketConfig, BucketScheme, ConfigError, IndexError, LimitViolation, SizeError, Tier,
};

fn valid_grid() -> Vec<BucketScheme> {
    let mut schemes = Vec::new();
    for bits in [16u32, 32, 64] {
        let word = u64::from(bits / 8);
        for word_limit in [3 * word, 32, 64, 128, 256] {
            for double_limit in [32u64, 64, 128, 256, 512, 1024, 4096] {
                for subdivisions in [1u64, 2, 4, 8, 16] {
                    let config =
                        BucketConfig::new(bits, word_limit, double_limit, subdivisions);
                    if let Ok(scheme) = BucketScheme::new(config) {
                        schemes.push(scheme);
                    }
                }
            }
        }
    }
    schemes
}

#[test]
fn grid_contains_many_valid_configs() {
    let grid = valid_grid();
    assert!(grid.len() >= 40, "only {} valid configs", grid.len());
    assert!(grid.iter().any(|s| *s.config() == BucketConfig::WORD64));
    assert!(grid.iter().any(|s| *s.config() == BucketConfig::WORD32));
}

#[test]
fn linear_tiers_round_trip_for_every_size() {
    for scheme in valid_grid() {
        let config = *scheme.config();
        for size in scheme.min_chunk_size()..config.double_bucket_limit {
            let index = scheme.index_of(size).unwrap();
            let low = scheme.size_of(index).unwrap();
            let high = scheme.size_of(index + 1).unwrap();
            assert!(
                low <= size && size < high,
                "{config:?}: size {size} -> bucket {index} covering {low}..{high}"
            );
        }
    }
}

#[test]
fn log_tier_round_trips_for_every_bucket() {
    for scheme in valid_grid() {
        let base = scheme.tier_base(Tier::Log);
        assert_eq!(base, scheme.word_bin_count() + scheme.double_bin_count());
        for g in 0..scheme.log_bin_count() {
            let size = scheme.size_of(base + g).unwrap();
            assert_eq!(
                scheme.index_of(size),
                Ok(base + g),
                "{:?}: log bucket {g} (size {size})",
                scheme.config()
            );
            // The byte before a bucket's minimum belongs to the previous bucket.
            assert_eq!(scheme.index_of(size - 1), Ok(base + g - 1));
        }
    }
}

#[test]
fn sizes_strictly_increase_without_seams() {
    for scheme in valid_grid() {
        let config = *scheme.config();
        let sizes: Vec<u64> = (0..scheme.bucket_count())
            .map(|i| scheme.size_of(i).unwrap())
            .collect();
        for pair in sizes.windows(2) {
            assert!(pair[0] < pair[1], "{config:?}: {pair:?}");
        }
        assert_eq!(sizes[0], scheme.min_chunk_size());
        assert_eq!(
            sizes[scheme.word_bin_count()],
            config.word_bucket_limit,
            "{config:?}"
        );
        assert_eq!(
            sizes[scheme.word_bin_count() + scheme.double_bin_count()],
            config.double_bucket_limit,
            "{config:?}"
        );
    }
}

#[test]
fn bucket_count_is_bounded_by_word_bits() {
    for scheme in valid_grid() {
        let bits = scheme.config().word_size_bits as usize;
        assert!(scheme.bucket_count() <= 2 * bits);
        assert_eq!(scheme.size_classes().len(), scheme.bucket_count());
    }
}

#[test]
fn requests_round_up_to_a_sufficient_bucket() {
    for scheme in valid_grid() {
        let last = scheme.bucket_count() - 1;
        let largest = scheme.size_of(last).unwrap();
        let mut probes: Vec<u64> = (0..=scheme.config().double_bucket_limit).collect();
        for i in 0..=last {
            let size = scheme.size_of(i).unwrap();
            probes.extend([size - 1, size, size + 1]);
        }

        for size in probes.into_iter().filter(|&s| s <= largest) {
            let index = scheme.index_for_request(size).unwrap();
            assert!(scheme.size_of(index).unwrap() >= size);
            if index > 0 {
                assert!(
                    scheme.size_of(index - 1).unwrap() < size,
                    "{:?}: request {size} skipped a usable bucket",
                    scheme.config()
                );
            }
        }
        assert!(matches!(
            scheme.index_for_request(largest + 1),
            Err(SizeError::TooLarge { .. })
        ));
    }
}

#[test]
fn black_box_scan_finds_every_bucket() {
    for scheme in valid_grid() {
        let boundaries = scan::check_dense(scheme.min_chunk_size(), scheme.max_size(), 0, |s| {
            scheme.index_of(s).unwrap_or(usize::MAX)
        })
        .unwrap();
        assert_eq!(boundaries.len(), scheme.bucket_count());
        for (bin, size) in boundaries {
            assert_eq!(scheme.size_of(bin), Ok(size));
        }
    }
}

#[test]
fn log_tier_spread_is_bounded_by_subdivisions() {
    for scheme in valid_grid() {
        let bound = 1000 >> scheme.subdivision_bits();
        for class in scheme
            .size_classes()
            .into_iter()
            .filter(|c| c.tier == Tier::Log)
        {
            assert!(
                class.spread_permille <= bound,
                "{:?}: class {} spreads {} permille (bound {bound})",
                scheme.config(),
                class.index,
                class.spread_permille
            );
        }
    }
}

#[test]
fn word64_reference_values() {
    let scheme = BucketScheme::new(BucketConfig::WORD64).unwrap();
    assert_eq!(scheme.min_chunk_size(), 24);
    assert_eq!(scheme.index_of(24), Ok(0));
    assert_eq!(scheme.index_of(248), Ok(28));
    let base3 = scheme.word_bin_count() + scheme.double_bin_count();
    assert_eq!(base3, 45);
    assert_eq!(scheme.size_of(base3), Ok(512));
    assert_eq!(scheme.index_of(512), Ok(base3));
    assert_eq!(scheme.size_of(base3 + 1), Ok((4 + 1) << 7));
}

#[test]
fn error_cases() {
    let scheme = BucketScheme::new(BucketConfig::WORD64).unwrap();
    assert!(matches!(scheme.index_of(0), Err(SizeError::TooSmall { .. })));
    assert_eq!(
        scheme.size_of(scheme.bucket_count()),
        Err(IndexError::OutOfRange {
            index: 128,
            count: 128
        })
    );
    assert_eq!(
        BucketScheme::new(BucketConfig::new(64, 256, 768, 4)),
        Err(ConfigError::InvalidLimits(
            LimitViolation::DoubleLimitNotPowerOfTwo(768)
        ))
    );
}
