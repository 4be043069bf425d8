//! Property verification for a bucket scheme.
//!
//! Every check enumerates its whole domain rather than sampling: the linear
//! tiers are a few hundred sizes and the log tier is at most 128 buckets.

use std::fmt::Write as _;

use serde::{Deserialize, Serialize};

use segbin_core::binning::scan;
use segbin_core::{BucketScheme, Tier};

/// Result of a single property check.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerificationResult {
    /// Stable check identifier.
    pub check: String,
    /// What the check asserts.
    pub property: String,
    pub passed: bool,
    /// Number of sizes or buckets examined.
    pub cases: u64,
    /// First counterexample, if the check failed.
    pub failure: Option<String>,
}

impl VerificationResult {
    fn new(check: &str, property: &str, cases: u64, failure: Option<String>) -> Self {
        Self {
            check: check.to_string(),
            property: property.to_string(),
            passed: failure.is_none(),
            cases,
            failure,
        }
    }
}

/// Aggregate verification summary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerificationSummary {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub results: Vec<VerificationResult>,
}

impl VerificationSummary {
    /// Build a summary from a list of results.
    #[must_use]
    pub fn from_results(results: Vec<VerificationResult>) -> Self {
        let total = results.len();
        let passed = results.iter().filter(|r| r.passed).count();
        Self {
            total,
            passed,
            failed: total - passed,
            results,
        }
    }

    #[must_use]
    pub fn all_passed(&self) -> bool {
        self.failed == 0
    }

    /// Render as markdown under `title`.
    #[must_use]
    pub fn to_markdown(&self, title: &str) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "# {title}\n");
        let _ = writeln!(out, "- Total: {}", self.total);
        let _ = writeln!(out, "- Passed: {}", self.passed);
        let _ = writeln!(out, "- Failed: {}\n", self.failed);

        out.push_str("| Check | Cases | Status | Detail |\n");
        out.push_str("|-------|------:|--------|--------|\n");
        for r in &self.results {
            let status = if r.passed { "PASS" } else { "FAIL" };
            let _ = writeln!(
                out,
                "| {} | {} | {} | {} |",
                r.check,
                r.cases,
                status,
                r.failure.as_deref().unwrap_or("")
            );
        }
        out
    }
}

/// Runs every check against `scheme`.
#[must_use]
pub fn verify_scheme(scheme: &BucketScheme) -> VerificationSummary {
    VerificationSummary::from_results(vec![
        check_linear_round_trip(scheme),
        check_log_round_trip(scheme),
        check_monotonic_sizes(scheme),
        check_tier_seams(scheme),
        check_bucket_count_bound(scheme),
        check_request_rounding(scheme),
        check_boundary_scan(scheme),
        check_log_spread(scheme),
    ])
}

fn check_linear_round_trip(scheme: &BucketScheme) -> VerificationResult {
    let start = scheme.min_chunk_size();
    let end = scheme.config().double_bucket_limit;
    let failure = (start..end).find_map(|size| linear_round_trip_at(scheme, size).err());
    VerificationResult::new(
        "linear_round_trip",
        "size_of(index_of(s)) <= s < size_of(index_of(s) + 1) below the double bucket limit",
        end.saturating_sub(start),
        failure,
    )
}

/// `Err` carries the counterexample, including any lookup that failed.
fn linear_round_trip_at(scheme: &BucketScheme, size: u64) -> Result<(), String> {
    let index = scheme
        .index_of(size)
        .map_err(|e| format!("index_of({size}): {e}"))?;
    let low = size_of(scheme, index)?;
    let high = size_of(scheme, index + 1)?;
    if low <= size && size < high {
        Ok(())
    } else {
        Err(format!("size {size} -> bucket {index} covering {low}..{high}"))
    }
}

fn check_log_round_trip(scheme: &BucketScheme) -> VerificationResult {
    let base = scheme.tier_base(Tier::Log);
    let failure = (0..scheme.log_bin_count()).find_map(|g| {
        let size = match size_of(scheme, base + g) {
            Ok(size) => size,
            Err(e) => return Some(e),
        };
        match scheme.index_of(size) {
            Ok(index) if index == base + g => None,
            Ok(index) => Some(format!("log bucket {g}: size {size} maps back to {index}")),
            Err(e) => Some(format!("log bucket {g}: {e}")),
        }
    });
    VerificationResult::new(
        "log_round_trip",
        "index_of(size_of(base3 + g)) == base3 + g for every log bucket",
        scheme.log_bin_count() as u64,
        failure,
    )
}

fn check_monotonic_sizes(scheme: &BucketScheme) -> VerificationResult {
    let failure =
        (1..scheme.bucket_count()).find_map(|i| strictly_increasing_at(scheme, i).err());
    VerificationResult::new(
        "monotonic_sizes",
        "size_of is strictly increasing",
        scheme.bucket_count() as u64,
        failure,
    )
}

fn strictly_increasing_at(scheme: &BucketScheme, i: usize) -> Result<(), String> {
    let prev = size_of(scheme, i - 1)?;
    let cur = size_of(scheme, i)?;
    if prev < cur {
        Ok(())
    } else {
        Err(format!("size_of({}) = {prev} >= size_of({i}) = {cur}", i - 1))
    }
}

fn size_of(scheme: &BucketScheme, index: usize) -> Result<u64, String> {
    scheme
        .size_of(index)
        .map_err(|e| format!("size_of({index}): {e}"))
}

fn check_tier_seams(scheme: &BucketScheme) -> VerificationResult {
    let config = scheme.config();
    let seams = [
        (Tier::Word, scheme.min_chunk_size()),
        (Tier::DoubleWord, config.word_bucket_limit),
        (Tier::Log, config.double_bucket_limit),
    ];
    // An empty tier shares its base with the next one, whose limit is equal.
    let failure = seams.iter().find_map(|&(tier, expected)| {
        match scheme.size_of(scheme.tier_base(tier)) {
            Ok(size) if size == expected => None,
            Ok(size) => Some(format!(
                "{tier} tier starts at {size}, expected {expected}"
            )),
            Err(e) => Some(format!("{tier} tier base: {e}")),
        }
    });
    VerificationResult::new(
        "tier_seams",
        "each tier's first bucket starts exactly at its lower limit",
        seams.len() as u64,
        failure,
    )
}

fn check_bucket_count_bound(scheme: &BucketScheme) -> VerificationResult {
    let bound = 2 * scheme.config().word_size_bits as usize;
    let count = scheme.bucket_count();
    let failure = (count > bound).then(|| format!("{count} buckets exceed {bound}"));
    VerificationResult::new(
        "bucket_count_bound",
        "bucket_count() <= 2 * word_size_bits",
        1,
        failure,
    )
}

fn check_request_rounding(scheme: &BucketScheme) -> VerificationResult {
    let last = scheme.bucket_count() - 1;
    let Ok(largest) = scheme.size_of(last) else {
        return VerificationResult::new(
            "request_rounding",
            "size_of(index_for_request(s)) >= s",
            0,
            Some("last bucket has no size".to_string()),
        );
    };

    let mut probes: Vec<u64> = (0..=scheme.config().double_bucket_limit).collect();
    for i in 0..=last {
        if let Ok(size) = scheme.size_of(i) {
            probes.extend([size - 1, size, size + 1]);
        }
    }
    probes.retain(|&s| s <= largest);

    let failure = probes.iter().find_map(|&size| {
        let index = match scheme.index_for_request(size) {
            Ok(index) => index,
            Err(e) => return Some(format!("index_for_request({size}): {e}")),
        };
        let fits = scheme.size_of(index).is_ok_and(|s| s >= size);
        let tight = index == 0 || scheme.size_of(index - 1).is_ok_and(|s| s < size);
        if !fits {
            Some(format!("request {size} -> bucket {index} is too small"))
        } else if !tight {
            Some(format!("request {size} -> bucket {index} skips a usable bucket"))
        } else {
            None
        }
    });
    VerificationResult::new(
        "request_rounding",
        "index_for_request(s) is the smallest bucket with size_of >= s",
        probes.len() as u64,
        failure,
    )
}

fn check_boundary_scan(scheme: &BucketScheme) -> VerificationResult {
    let mut cases = 0u64;
    let scanned = scan::check_dense(scheme.min_chunk_size(), scheme.max_size(), 0, |s| {
        scheme.index_of(s).unwrap_or(usize::MAX)
    });
    let failure = match scanned {
        Err(violation) => Some(violation.to_string()),
        Ok(boundaries) => {
            cases = boundaries.len() as u64;
            if boundaries.len() != scheme.bucket_count() {
                Some(format!(
                    "scan found {} buckets, expected {}",
                    boundaries.len(),
                    scheme.bucket_count()
                ))
            } else {
                boundaries.iter().find_map(|&(bin, size)| match scheme.size_of(bin) {
                    Ok(expected) if expected == size => None,
                    Ok(expected) => Some(format!(
                        "bucket {bin} starts at {size} in the scan but size_of gives {expected}"
                    )),
                    Err(e) => Some(e.to_string()),
                })
            }
        }
    };
    VerificationResult::new(
        "boundary_scan",
        "a black-box scan of index_of finds every bucket once, at size_of(bucket)",
        cases,
        failure,
    )
}

fn check_log_spread(scheme: &BucketScheme) -> VerificationResult {
    let bound = 1000u32 >> scheme.subdivision_bits();
    let classes: Vec<_> = scheme
        .size_classes()
        .into_iter()
        .filter(|c| c.tier == Tier::Log)
        .collect();
    let failure = classes.iter().find_map(|c| {
        (c.spread_permille > bound).then(|| {
            format!(
                "class {} spreads {} permille, bound {bound}",
                c.index, c.spread_permille
            )
        })
    });
    VerificationResult::new(
        "log_spread",
        "log-tier relative bucket width stays within 1/2^p",
        classes.len() as u64,
        failure,
    )
}
