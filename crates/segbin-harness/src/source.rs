//! Where a harness run gets its bucket configuration from.
//!
//! Precedence: an explicit `--config` JSON file, then `--preset`, then the
//! `SEGBIN_PRESET` environment variable, then the native preset.

use std::path::{Path, PathBuf};

use thiserror::Error;

use segbin_core::{BucketConfig, BucketScheme, ConfigError, Preset};

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("failed reading config '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed parsing config '{}': {source}", .path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error(transparent)]
    Config(#[from] ConfigError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemeSource {
    Preset(Preset),
    File(PathBuf),
}

impl SchemeSource {
    /// Picks the source from optional CLI arguments, falling back to the environment.
    #[must_use]
    pub fn resolve(preset: Option<Preset>, config: Option<&Path>) -> Self {
        match (config, preset) {
            (Some(path), _) => Self::File(path.to_path_buf()),
            (None, Some(preset)) => Self::Preset(preset),
            (None, None) => Self::Preset(Preset::from_env()),
        }
    }

    /// Short label for logs and report titles.
    #[must_use]
    pub fn label(&self) -> String {
        match self {
            Self::Preset(preset) => preset.to_string(),
            Self::File(path) => path.display().to_string(),
        }
    }

    /// Reads the configuration without validating it.
    pub fn load_config(&self) -> Result<BucketConfig, SourceError> {
        match self {
            Self::Preset(preset) => Ok(preset.config()),
            Self::File(path) => {
                let content = std::fs::read_to_string(path).map_err(|source| SourceError::Io {
                    path: path.clone(),
                    source,
                })?;
                serde_json::from_str(&content).map_err(|source| SourceError::Json {
                    path: path.clone(),
                    source,
                })
            }
        }
    }

    /// Loads and validates.
    pub fn build(&self) -> Result<BucketScheme, SourceError> {
        let config = self.load_config()?;
        Ok(BucketScheme::new(config)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_beats_preset() {
        let source = SchemeSource::resolve(Some(Preset::Word32), Some(Path::new("cfg.json")));
        assert_eq!(source, SchemeSource::File(PathBuf::from("cfg.json")));
        assert_eq!(source.label(), "cfg.json");
    }

    #[test]
    fn named_preset() {
        let source = SchemeSource::resolve("W32".parse().ok(), None);
        assert_eq!(source, SchemeSource::Preset(Preset::Word32));
        assert_eq!(source.label(), "word32");
        assert_eq!(source.build().unwrap().bucket_count(), 64);
    }

    #[test]
    fn missing_file_is_io_error() {
        let source = SchemeSource::File(PathBuf::from("/nonexistent/segbin/config.json"));
        let err = source.build().unwrap_err();
        assert!(matches!(err, SourceError::Io { .. }));
        assert!(err.to_string().contains("/nonexistent/segbin/config.json"));
    }

    #[test]
    fn invalid_config_file_is_config_error() {
        let dir = std::env::temp_dir().join(format!("segbin-source-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("bad.json");
        std::fs::write(
            &path,
            r#"{"word_size_bits":64,"word_bucket_limit":256,"double_bucket_limit":500,"log_subdivisions":4}"#,
        )
        .unwrap();

        let err = SchemeSource::File(path.clone()).build().unwrap_err();
        assert!(matches!(err, SourceError::Config(ConfigError::InvalidLimits(_))));

        std::fs::write(&path, "{ not json").unwrap();
        let err = SchemeSource::File(path).build().unwrap_err();
        assert!(matches!(err, SourceError::Json { .. }));
    }
}
