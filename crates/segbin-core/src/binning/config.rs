//! Bucket scheme configuration.
//!
//! A [`BucketConfig`] is a plain value fixed before the scheme is built. The
//! presets below come from the word sizes the allocator targets:
//! - [`BucketConfig::WORD64`]: 8-byte words, word buckets below 256, double-word
//!   buckets below 512, quarter-octave log buckets (128 buckets).
//! - [`BucketConfig::WORD32`]: 4-byte words, word buckets below 64, double-word
//!   buckets below 128, half-octave log buckets (64 buckets).
//!
//! The preset can be picked at runtime through the `SEGBIN_PRESET` environment
//! variable (see [`Preset::from_env`]).

use serde::{Deserialize, Serialize};

use super::error::UnknownPreset;

/// Environment variable consulted by [`Preset::from_env`].
pub const PRESET_ENV: &str = "SEGBIN_PRESET";

/// Parameters of a three-tier bucket scheme.
///
/// Validation happens in [`BucketScheme::new`](super::BucketScheme::new), not here,
/// so that a config can be deserialized and reported on before it is checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BucketConfig {
    /// Bit width of the target machine word.
    pub word_size_bits: u32,
    /// Sizes below this are bucketed one word apart.
    pub word_bucket_limit: u64,
    /// Sizes below this are bucketed two words apart. Anchors the log tier.
    pub double_bucket_limit: u64,
    /// Equal linear steps per power-of-two octave in the log tier.
    pub log_subdivisions: u64,
}

impl BucketConfig {
    pub const WORD64: Self = Self::new(64, 256, 512, 4);
    pub const WORD32: Self = Self::new(32, 64, 128, 2);

    #[must_use]
    pub const fn new(
        word_size_bits: u32,
        word_bucket_limit: u64,
        double_bucket_limit: u64,
        log_subdivisions: u64,
    ) -> Self {
        Self {
            word_size_bits,
            word_bucket_limit,
            double_bucket_limit,
            log_subdivisions,
        }
    }

    /// The preset matching the host's pointer width.
    #[must_use]
    pub const fn native() -> Self {
        if cfg!(target_pointer_width = "64") {
            Self::WORD64
        } else {
            Self::WORD32
        }
    }

    /// Word size in bytes. Meaningless until the config is validated.
    #[must_use]
    pub const fn word_size(&self) -> u64 {
        (self.word_size_bits / 8) as u64
    }
}

impl Default for BucketConfig {
    fn default() -> Self {
        Self::native()
    }
}

/// Named configuration presets.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Preset {
    Word64,
    Word32,
    /// Whichever of the above matches `target_pointer_width`.
    #[default]
    Native,
}

impl Preset {
    /// Parse a preset name or alias (case-insensitive). `None` if unknown.
    #[must_use]
    pub fn from_name(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "word64" | "w64" | "64" | "x86_64" | "aarch64" => Some(Self::Word64),
            "word32" | "w32" | "32" | "wasm32" | "x86" => Some(Self::Word32),
            "native" => Some(Self::Native),
            _ => None,
        }
    }

    /// Like [`from_name`](Self::from_name), but unknown names fall back to `Native`.
    #[must_use]
    pub fn from_str_loose(s: &str) -> Self {
        Self::from_name(s).unwrap_or_default()
    }

    /// Reads [`PRESET_ENV`]; unset or unreadable means `Native`.
    #[must_use]
    pub fn from_env() -> Self {
        std::env::var(PRESET_ENV)
            .map(|v| Self::from_str_loose(&v))
            .unwrap_or_default()
    }

    #[must_use]
    pub const fn config(self) -> BucketConfig {
        match self {
            Self::Word64 => BucketConfig::WORD64,
            Self::Word32 => BucketConfig::WORD32,
            Self::Native => BucketConfig::native(),
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Word64 => "word64",
            Self::Word32 => "word32",
            Self::Native => "native",
        }
    }
}

/// Strict parsing, for names a user typed explicitly.
impl std::str::FromStr for Preset {
    type Err = UnknownPreset;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s).ok_or_else(|| UnknownPreset(s.to_string()))
    }
}

impl std::fmt::Display for Preset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
