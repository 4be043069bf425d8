//! Tooling around the segbin bucket scheme.
//!
//! This crate provides:
//! - Scheme resolution: presets, `SEGBIN_PRESET`, or a JSON config file
//! - Table reports: every size class as CSV, JSON or Markdown
//! - Verification: exhaustive property checks of any configuration
//! - Structured logs: JSONL records for every harness run

#![forbid(unsafe_code)]

pub mod report;
pub mod source;
pub mod structured_log;
pub mod verify;

pub use report::{BucketTable, TableFormat};
pub use source::SchemeSource;
pub use verify::{VerificationResult, VerificationSummary, verify_scheme};
