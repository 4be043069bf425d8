//! The three-tier size <-> bucket mapping.
//!
//! Sizes are filed into buckets across three regions:
//! - word tier: one bucket per word from the minimum chunk size up to
//!   `word_bucket_limit`;
//! - double-word tier: one bucket per two words up to `double_bucket_limit`;
//! - log tier: starting at `double_bucket_limit` (a power of two), each
//!   octave is split into `log_subdivisions` equal steps, until the bucket
//!   budget of `2 * word_size_bits` is used up.
//!
//! Each tier is picked with plain comparisons, and the tier formulas never
//! call each other. Inside each tier `index_of` and `size_of` are exact inverses.

use std::ops::RangeInclusive;

use super::config::BucketConfig;
use super::error::{ConfigError, IndexError, LimitViolation, SizeError};
use super::log_tier;
use super::size_class::Tier;

/// A validated, immutable bucket scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BucketScheme {
    config: BucketConfig,
    /// log2 of the word size in bytes.
    word_shift: u32,
    min_chunk_size: u64,
    word_bin_count: usize,
    double_bin_count: usize,
    log_bin_count: usize,
    /// `p`: bits of linear division per octave.
    subdivision_bits: u32,
    /// log2 of `double_bucket_limit`.
    base_exp: u32,
    /// Largest size any bucket accepts (inclusive).
    max_size: u64,
}

impl BucketScheme {
    /// Validates `config` and precomputes the tier boundaries.
    pub fn new(config: BucketConfig) -> Result<Self, ConfigError> {
        let bits = config.word_size_bits;
        if !bits.is_power_of_two() || !(8..=64).contains(&bits) {
            return Err(ConfigError::InvalidWordSize(bits));
        }

        let word = config.word_size();
        let word_shift = word.trailing_zeros();
        let min_chunk_size = 3 * word;
        let word_limit = config.word_bucket_limit;
        let double_limit = config.double_bucket_limit;
        let subdivisions = config.log_subdivisions;

        if word_limit < min_chunk_size {
            return Err(LimitViolation::WordLimitBelowMinChunk {
                limit: word_limit,
                min_chunk: min_chunk_size,
            }
            .into());
        }
        if word_limit % word != 0 {
            return Err(LimitViolation::MisalignedWordLimit {
                limit: word_limit,
                word,
            }
            .into());
        }
        if double_limit < word_limit {
            return Err(LimitViolation::DoubleLimitBelowWordLimit {
                double: double_limit,
                word_limit,
            }
            .into());
        }
        if !double_limit.is_power_of_two() {
            return Err(LimitViolation::DoubleLimitNotPowerOfTwo(double_limit).into());
        }
        let span = double_limit - word_limit;
        if span % (2 * word) != 0 {
            return Err(LimitViolation::MisalignedDoubleSpan {
                span,
                step: 2 * word,
            }
            .into());
        }
        if !subdivisions.is_power_of_two() {
            return Err(LimitViolation::SubdivisionsNotPowerOfTwo(subdivisions).into());
        }
        if subdivisions > double_limit {
            return Err(LimitViolation::SubdivisionsExceedDoubleLimit {
                subdivisions,
                double: double_limit,
            }
            .into());
        }

        let word_bins = (word_limit - min_chunk_size) >> word_shift;
        let double_bins = span >> (word_shift + 1);
        let total = 2 * u64::from(bits);
        let linear = word_bins.saturating_add(double_bins);
        if linear >= total {
            return Err(LimitViolation::NoLogBuckets { linear, total }.into());
        }
        let log_bins = total - linear;

        let subdivision_bits = subdivisions.trailing_zeros();
        let base_exp = double_limit.trailing_zeros();

        // One past the last log bucket bounds every size the scheme accepts.
        let extent = log_tier::wide_size_of_bucket(log_bins, subdivision_bits, base_exp)
            .filter(|&extent| extent <= 1u128 << bits)
            .ok_or(LimitViolation::ExtentExceedsWord { bits })?;
        let max_size =
            u64::try_from(extent - 1).map_err(|_| LimitViolation::ExtentExceedsWord { bits })?;

        // All three counts are below `total <= 128`.
        Ok(Self {
            config,
            word_shift,
            min_chunk_size,
            word_bin_count: word_bins as usize,
            double_bin_count: double_bins as usize,
            log_bin_count: log_bins as usize,
            subdivision_bits,
            base_exp,
            max_size,
        })
    }

    #[must_use]
    pub const fn config(&self) -> &BucketConfig {
        &self.config
    }

    /// Total buckets across all tiers. Always `2 * word_size_bits`.
    #[must_use]
    pub const fn bucket_count(&self) -> usize {
        self.word_bin_count + self.double_bin_count + self.log_bin_count
    }

    #[must_use]
    pub const fn word_size(&self) -> u64 {
        1 << self.word_shift
    }

    /// Smallest size the scheme buckets: three words, the smallest block an
    /// allocator header permits.
    #[must_use]
    pub const fn min_chunk_size(&self) -> u64 {
        self.min_chunk_size
    }

    /// Largest size any bucket accepts (inclusive).
    #[must_use]
    pub const fn max_size(&self) -> u64 {
        self.max_size
    }

    #[must_use]
    pub const fn word_bin_count(&self) -> usize {
        self.word_bin_count
    }

    #[must_use]
    pub const fn double_bin_count(&self) -> usize {
        self.double_bin_count
    }

    #[must_use]
    pub const fn log_bin_count(&self) -> usize {
        self.log_bin_count
    }

    /// `log2(log_subdivisions)`.
    #[must_use]
    pub const fn subdivision_bits(&self) -> u32 {
        self.subdivision_bits
    }

    /// `log2(double_bucket_limit)`, the exponent of the first log octave.
    #[must_use]
    pub const fn base_exponent(&self) -> u32 {
        self.base_exp
    }

    /// First flat index belonging to `tier`.
    #[must_use]
    pub const fn tier_base(&self, tier: Tier) -> usize {
        match tier {
            Tier::Word => 0,
            Tier::DoubleWord => self.word_bin_count,
            Tier::Log => self.word_bin_count + self.double_bin_count,
        }
    }

    /// Bucket containing `size`: `size_of(i) <= size < size_of(i + 1)`.
    ///
    /// This is the list a free block of `size` bytes is filed into.
    pub fn index_of(&self, size: u64) -> Result<usize, SizeError> {
        if size < self.min_chunk_size {
            return Err(SizeError::TooSmall {
                size,
                min: self.min_chunk_size,
            });
        }

        if size < self.config.word_bucket_limit {
            Ok(((size - self.min_chunk_size) >> self.word_shift) as usize)
        } else if size < self.config.double_bucket_limit {
            let step = (size - self.config.word_bucket_limit) >> (self.word_shift + 1);
            Ok(self.word_bin_count + step as usize)
        } else if size <= self.max_size {
            let g = log_tier::bucket_of_size(size, self.subdivision_bits, self.base_exp);
            Ok(self.tier_base(Tier::Log) + g as usize)
        } else {
            Err(SizeError::TooLarge {
                size,
                max: self.max_size,
            })
        }
    }

    /// Like [`index_of`](Self::index_of), but sizes past [`max_size`](Self::max_size)
    /// land in the last bucket.
    pub fn index_of_saturating(&self, size: u64) -> Result<usize, SizeError> {
        match self.index_of(size) {
            Err(SizeError::TooLarge { .. }) => Ok(self.bucket_count() - 1),
            other => other,
        }
    }

    /// Smallest bucket whose every block can hold `size` bytes:
    /// `size_of(i) >= size` and `size_of(i - 1) < size`.
    ///
    /// This is the first list to search when servicing a request. Requests
    /// at or below the minimum chunk size are served from bucket 0.
    pub fn index_for_request(&self, size: u64) -> Result<usize, SizeError> {
        if size <= self.min_chunk_size {
            return Ok(0);
        }

        let last = self.bucket_count() - 1;
        let largest = self.class_min(last);
        if size > largest {
            return Err(SizeError::TooLarge { size, max: largest });
        }

        let index = self.index_of(size)?;
        if self.class_min(index) == size {
            Ok(index)
        } else {
            Ok(index + 1)
        }
    }

    /// Minimum size filed into bucket `index`.
    pub fn size_of(&self, index: usize) -> Result<u64, IndexError> {
        if index >= self.bucket_count() {
            return Err(IndexError::OutOfRange {
                index,
                count: self.bucket_count(),
            });
        }
        Ok(self.class_min(index))
    }

    /// Inclusive range of sizes filed into bucket `index`.
    pub fn bucket_range(&self, index: usize) -> Result<RangeInclusive<u64>, IndexError> {
        let start = self.size_of(index)?;
        let end = if index + 1 < self.bucket_count() {
            self.class_min(index + 1) - 1
        } else {
            self.max_size
        };
        Ok(start..=end)
    }

    pub fn tier_of_size(&self, size: u64) -> Result<Tier, SizeError> {
        let index = self.index_of(size)?;
        Ok(self.tier_at(index))
    }

    pub fn tier_of_index(&self, index: usize) -> Result<Tier, IndexError> {
        if index >= self.bucket_count() {
            return Err(IndexError::OutOfRange {
                index,
                count: self.bucket_count(),
            });
        }
        Ok(self.tier_at(index))
    }

    pub(crate) fn tier_at(&self, index: usize) -> Tier {
        if index < self.tier_base(Tier::DoubleWord) {
            Tier::Word
        } else if index < self.tier_base(Tier::Log) {
            Tier::DoubleWord
        } else {
            Tier::Log
        }
    }

    /// `size_of` without the range check. `index` must be below `bucket_count()`.
    fn class_min(&self, index: usize) -> u64 {
        let double_base = self.tier_base(Tier::DoubleWord);
        let log_base = self.tier_base(Tier::Log);

        if index < double_base {
            self.min_chunk_size + ((index as u64) << self.word_shift)
        } else if index < log_base {
            let step = (index - double_base) as u64;
            self.config.word_bucket_limit + (step << (self.word_shift + 1))
        } else {
            let g = (index - log_base) as u64;
            log_tier::size_of_bucket(g, self.subdivision_bits, self.base_exp)
        }
    }
}

impl TryFrom<BucketConfig> for BucketScheme {
    type Error = ConfigError;

    fn try_from(config: BucketConfig) -> Result<Self, Self::Error> {
        Self::new(config)
    }
}
