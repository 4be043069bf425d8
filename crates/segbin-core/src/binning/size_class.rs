//! Size class descriptors.
//!
//! A [`SizeClass`] describes one bucket of a [`BucketScheme`]: its tier, the
//! inclusive size range filed into it, and how wide that range is relative
//! to its minimum. This is what table dumps and reports consume.

use serde::{Deserialize, Serialize};

use super::error::IndexError;
use super::scheme::BucketScheme;

/// Granularity regime a bucket belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    /// One word apart.
    Word,
    /// Two words apart.
    DoubleWord,
    /// Linear steps within power-of-two octaves.
    Log,
}

impl Tier {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Word => "word",
            Self::DoubleWord => "double_word",
            Self::Log => "log",
        }
    }
}

impl std::fmt::Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Describes a single bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SizeClass {
    /// Flat bucket index.
    pub index: usize,
    pub tier: Tier,
    /// Smallest size filed here (`size_of(index)`).
    pub min_size: u64,
    /// Largest size filed here (inclusive).
    pub max_size: u64,
    /// `(max_size - min_size) / min_size`, in thousandths.
    pub spread_permille: u32,
}

impl SizeClass {
    /// Creates a new size class descriptor.
    pub fn new(index: usize, tier: Tier, min_size: u64, max_size: u64) -> Self {
        let spread = u128::from(max_size - min_size) * 1000 / u128::from(min_size.max(1));
        Self {
            index,
            tier,
            min_size,
            max_size,
            spread_permille: u32::try_from(spread).unwrap_or(u32::MAX),
        }
    }

    /// Number of distinct sizes filed into this bucket.
    #[must_use]
    pub const fn width(&self) -> u64 {
        self.max_size - self.min_size + 1
    }
}

impl BucketScheme {
    /// Descriptor for bucket `index`.
    pub fn size_class(&self, index: usize) -> Result<SizeClass, IndexError> {
        let range = self.bucket_range(index)?;
        Ok(SizeClass::new(
            index,
            self.tier_at(index),
            *range.start(),
            *range.end(),
        ))
    }

    /// The full table, one entry per bucket, in index order.
    #[must_use]
    pub fn size_classes(&self) -> Vec<SizeClass> {
        (0..self.bucket_count())
            .filter_map(|index| self.size_class(index).ok())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binning::BucketConfig;

    #[test]
    fn table_covers_every_bucket() {
        let scheme = BucketScheme::new(BucketConfig::WORD64).unwrap();
        let classes = scheme.size_classes();
        assert_eq!(classes.len(), scheme.bucket_count());
        for (i, class) in classes.iter().enumerate() {
            assert_eq!(class.index, i);
            assert!(class.min_size <= class.max_size);
        }
        assert_eq!(classes[0].min_size, 24);
        assert_eq!(classes.last().unwrap().max_size, scheme.max_size());
    }

    #[test]
    fn classes_are_contiguous() {
        let scheme = BucketScheme::new(BucketConfig::WORD32).unwrap();
        let classes = scheme.size_classes();
        for pair in classes.windows(2) {
            assert_eq!(
                pair[0].max_size + 1,
                pair[1].min_size,
                "gap between class {} and {}",
                pair[0].index,
                pair[1].index
            );
        }
    }

    #[test]
    fn spread_per_tier() {
        let scheme = BucketScheme::new(BucketConfig::WORD64).unwrap();
        // 24..=31
        let first = scheme.size_class(0).unwrap();
        assert_eq!(first.tier, Tier::Word);
        assert_eq!(first.width(), 8);
        assert_eq!(first.spread_permille, 7 * 1000 / 24);

        // 256..=271
        let double = scheme.size_class(29).unwrap();
        assert_eq!(double.tier, Tier::DoubleWord);
        assert_eq!(double.width(), 16);

        // 512..=639
        let log = scheme.size_class(45).unwrap();
        assert_eq!(log.tier, Tier::Log);
        assert_eq!(log.width(), 128);
        assert_eq!(log.spread_permille, 127 * 1000 / 512);
    }

    #[test]
    fn tier_labels() {
        assert_eq!(Tier::Word.to_string(), "word");
        assert_eq!(Tier::DoubleWord.to_string(), "double_word");
        assert_eq!(Tier::Log.to_string(), "log");
        assert_eq!(
            serde_json::to_string(&Tier::DoubleWord).unwrap(),
            "\"double_word\""
        );
    }

    #[test]
    fn out_of_range_class() {
        let scheme = BucketScheme::new(BucketConfig::WORD64).unwrap();
        assert!(scheme.size_class(scheme.bucket_count()).is_err());
    }
}
