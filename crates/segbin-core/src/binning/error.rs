//! Error types for bucket configuration and lookups.
//!
//! Every error here is a programming or configuration defect. None of them
//! are transient, so callers should surface them rather than retry.

use thiserror::Error;

/// The specific limit rule a [`BucketConfig`](super::BucketConfig) broke.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum LimitViolation {
    #[error("word bucket limit {limit} is below the minimum chunk size {min_chunk}")]
    WordLimitBelowMinChunk { limit: u64, min_chunk: u64 },
    #[error("word bucket limit {limit} is not a multiple of the {word}-byte word")]
    MisalignedWordLimit { limit: u64, word: u64 },
    #[error("double bucket limit {double} is below the word bucket limit {word_limit}")]
    DoubleLimitBelowWordLimit { double: u64, word_limit: u64 },
    #[error("double bucket limit {0} is not a power of two")]
    DoubleLimitNotPowerOfTwo(u64),
    #[error("double-word span {span} is not a multiple of {step} bytes")]
    MisalignedDoubleSpan { span: u64, step: u64 },
    #[error("log subdivision count {0} is not a power of two")]
    SubdivisionsNotPowerOfTwo(u64),
    #[error("log subdivision count {subdivisions} exceeds the double bucket limit {double}")]
    SubdivisionsExceedDoubleLimit { subdivisions: u64, double: u64 },
    #[error("linear tiers use {linear} of {total} buckets, leaving none for the log tier")]
    NoLogBuckets { linear: u64, total: u64 },
    #[error("log tier would need sizes beyond a {bits}-bit word")]
    ExtentExceedsWord { bits: u32 },
}

/// Rejected configuration. Fatal at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("word size of {0} bits is not a power of two in 8..=64")]
    InvalidWordSize(u32),
    #[error("invalid bucket limits: {0}")]
    InvalidLimits(#[from] LimitViolation),
}

/// A preset name that matches no preset or alias.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown preset '{0}' (expected word64, word32 or native)")]
pub struct UnknownPreset(pub String);

/// A size outside the range the scheme can bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SizeError {
    #[error("size {size} is below the minimum chunk size {min}")]
    TooSmall { size: u64, min: u64 },
    #[error("size {size} exceeds the largest bucketed size {max}")]
    TooLarge { size: u64, max: u64 },
}

/// A bucket index past the end of the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum IndexError {
    #[error("bucket index {index} is out of range (bucket count {count})")]
    OutOfRange { index: usize, count: usize },
}

/// Any failure raised by this crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum BinningError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Size(#[from] SizeError),
    #[error(transparent)]
    Index(#[from] IndexError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn limit_violation_lifts_into_config_error() {
        let err: ConfigError = LimitViolation::DoubleLimitNotPowerOfTwo(500).into();
        assert_eq!(
            err,
            ConfigError::InvalidLimits(LimitViolation::DoubleLimitNotPowerOfTwo(500))
        );
        assert_eq!(
            err.to_string(),
            "invalid bucket limits: double bucket limit 500 is not a power of two"
        );
    }

    #[test]
    fn umbrella_error_is_transparent() {
        let err: BinningError = SizeError::TooSmall { size: 0, min: 24 }.into();
        assert_eq!(err.to_string(), "size 0 is below the minimum chunk size 24");

        let err: BinningError = IndexError::OutOfRange {
            index: 128,
            count: 128,
        }
        .into();
        assert!(matches!(err, BinningError::Index(_)));
    }
}
