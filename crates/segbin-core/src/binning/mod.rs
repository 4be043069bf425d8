//! Size-class binning for segregated free lists.
//!
//! Maps allocation sizes to free-list indices with three tiers:
//! - Word tier: one bucket per machine word (small, hot sizes)
//! - Double-word tier: one bucket per two words (mid sizes)
//! - Log tier: power-of-two octaves split into `2^p` linear steps (large sizes)

pub mod config;
pub mod error;
mod log_tier;
pub mod scan;
pub mod scheme;
pub mod size_class;

pub use config::{BucketConfig, PRESET_ENV, Preset};
pub use error::{BinningError, ConfigError, IndexError, LimitViolation, SizeError, UnknownPreset};
pub use scan::ScanViolation;
pub use scheme::BucketScheme;
pub use size_class::{SizeClass, Tier};
