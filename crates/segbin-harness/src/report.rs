//! Bucket table reports.
//!
//! Dumps every size class of a scheme as CSV, JSON or Markdown. The CSV is
//! the format downstream plotting/benchmark tooling consumes: one row per
//! bucket with plain numeric columns (plus the tier label).

use std::fmt::Write as _;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sha2::Digest;
use thiserror::Error;

use segbin_core::{BucketConfig, BucketScheme, SizeClass};

/// CSV header row.
pub const CSV_HEADER: &str = "index,tier,min_size,max_size,spread_permille";

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("unknown table format '{0}' (expected csv, json or markdown)")]
    UnknownFormat(String),
    #[error("json: {0}")]
    Json(#[from] serde_json::Error),
}

/// Output format for [`BucketTable::render`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TableFormat {
    #[default]
    Csv,
    Json,
    Markdown,
}

impl FromStr for TableFormat {
    type Err = ReportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "csv" => Ok(Self::Csv),
            "json" => Ok(Self::Json),
            "markdown" | "md" => Ok(Self::Markdown),
            _ => Err(ReportError::UnknownFormat(s.to_string())),
        }
    }
}

/// Every size class of one scheme, with the scheme's shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BucketTable {
    /// Preset name or config path the scheme came from.
    pub source: String,
    pub config: BucketConfig,
    pub bucket_count: usize,
    pub word_bin_count: usize,
    pub double_bin_count: usize,
    pub log_bin_count: usize,
    pub min_chunk_size: u64,
    pub max_size: u64,
    pub classes: Vec<SizeClass>,
}

impl BucketTable {
    #[must_use]
    pub fn from_scheme(source: impl Into<String>, scheme: &BucketScheme) -> Self {
        Self {
            source: source.into(),
            config: *scheme.config(),
            bucket_count: scheme.bucket_count(),
            word_bin_count: scheme.word_bin_count(),
            double_bin_count: scheme.double_bin_count(),
            log_bin_count: scheme.log_bin_count(),
            min_chunk_size: scheme.min_chunk_size(),
            max_size: scheme.max_size(),
            classes: scheme.size_classes(),
        }
    }

    /// One header line, then one line per bucket. Ends with a newline.
    #[must_use]
    pub fn to_csv(&self) -> String {
        let mut out = String::with_capacity(32 * (self.classes.len() + 1));
        out.push_str(CSV_HEADER);
        out.push('\n');
        for c in &self.classes {
            let _ = writeln!(
                out,
                "{},{},{},{},{}",
                c.index, c.tier, c.min_size, c.max_size, c.spread_permille
            );
        }
        out
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    #[must_use]
    pub fn to_markdown(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "# Bucket table: {}\n", self.source);
        let _ = writeln!(out, "- Word size: {} bits", self.config.word_size_bits);
        let _ = writeln!(
            out,
            "- Buckets: {} ({} word, {} double-word, {} log)",
            self.bucket_count, self.word_bin_count, self.double_bin_count, self.log_bin_count
        );
        let _ = writeln!(
            out,
            "- Sizes: {} ..= {}\n",
            self.min_chunk_size, self.max_size
        );

        out.push_str("| Index | Tier | Min size | Max size | Spread (permille) |\n");
        out.push_str("|------:|------|---------:|---------:|------------------:|\n");
        for c in &self.classes {
            let _ = writeln!(
                out,
                "| {} | {} | {} | {} | {} |",
                c.index, c.tier, c.min_size, c.max_size, c.spread_permille
            );
        }
        out
    }

    pub fn render(&self, format: TableFormat) -> Result<String, ReportError> {
        match format {
            TableFormat::Csv => Ok(self.to_csv()),
            TableFormat::Json => Ok(self.to_json()?),
            TableFormat::Markdown => Ok(self.to_markdown()),
        }
    }
}

/// Lowercase hex SHA-256 of `data`.
#[must_use]
pub fn sha256_hex(data: &[u8]) -> String {
    let digest = sha2::Sha256::digest(data);
    let mut out = String::with_capacity(digest.len() * 2);
    for byte in digest {
        let _ = write!(out, "{byte:02x}");
    }
    out
}
