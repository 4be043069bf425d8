//! # segbin-core
//!
//! Deterministic, invertible mapping between allocation sizes and the bucket
//! indices of a segregated-free-list allocator.
//!
//! ```
//! use segbin_core::{BucketConfig, BucketScheme};
//!
//! let scheme = BucketScheme::new(BucketConfig::WORD64)?;
//! assert_eq!(scheme.bucket_count(), 128);
//! assert_eq!(scheme.index_of(512)?, 45);
//! assert_eq!(scheme.size_of(46)?, 640);
//! # Ok::<(), segbin_core::BinningError>(())
//! ```
//!
//! No `unsafe` code is permitted in this crate.

#![deny(unsafe_code)]

pub mod binning;

pub use binning::{
    BinningError, BucketConfig, BucketScheme, ConfigError, IndexError, LimitViolation, Preset,
    SizeClass, SizeError, Tier, UnknownPreset,
};
