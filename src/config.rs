//! TOML-backed configuration for the formatter and the packaging engine.
//!
//! `ScenepackConfig` mirrors the layout of a `scenepack.toml` file. Every
//! table and key is optional; omitted values fall back to the defaults below,
//! and zero values are treated as omitted so a templated file with `0` never
//! produces a degenerate formatter or checksum loop.

use camino::{Utf8Path, Utf8PathBuf};
use serde::Deserialize;
use std::io;
use thiserror::Error;

/// Errors raised while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file exists but could not be read.
    #[error("failed to read configuration from {path}: {source}")]
    Read {
        /// File that failed to load.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// The configuration text is not valid TOML for this schema.
    #[error("invalid configuration: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Top-level configuration.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct ScenepackConfig {
    /// NFO rendering settings.
    pub nfo: NfoConfig,
    /// Packaging settings.
    pub packaging: PackagingConfig,
}

impl ScenepackConfig {
    /// Parses configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] when the text is malformed or names an
    /// unknown key.
    ///
    /// # Examples
    ///
    /// ```
    /// use scenepack::ScenepackConfig;
    ///
    /// let config = ScenepackConfig::from_toml_str("[nfo]\nmax_width = 60\n")?;
    /// assert_eq!(config.nfo.max_width(), 60);
    /// assert_eq!(config.packaging.checksum_chunk_size(), 65_536);
    /// # Ok::<(), scenepack::ConfigError>(())
    /// ```
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(source)?)
    }

    /// Loads configuration from `path`, returning defaults when the file is
    /// absent.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Read`] when the file exists but cannot be read,
    /// or [`ConfigError::Parse`] when its contents are invalid.
    pub fn load(path: &Utf8Path) -> Result<Self, ConfigError> {
        Self::load_with(path, |p| match std::fs::read_to_string(p) {
            Ok(text) => Ok(Some(text)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err),
        })
    }

    /// Loads configuration using the supplied reader.
    ///
    /// The reader returns `Ok(None)` when no configuration exists. This lets
    /// tests simulate file contents and read failures without touching the
    /// file system.
    ///
    /// # Errors
    ///
    /// Propagates reader failures as [`ConfigError::Read`] and malformed text
    /// as [`ConfigError::Parse`].
    pub fn load_with<F>(path: &Utf8Path, reader: F) -> Result<Self, ConfigError>
    where
        F: FnOnce(&Utf8Path) -> io::Result<Option<String>>,
    {
        match reader(path) {
            Ok(Some(text)) => Self::from_toml_str(&text),
            Ok(None) => {
                log::debug!("no configuration at {path}; using defaults");
                Ok(Self::default())
            }
            Err(source) => Err(ConfigError::Read {
                path: path.to_owned(),
                source,
            }),
        }
    }
}

/// NFO rendering settings.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct NfoConfig {
    /// Maximum line width in columns.
    pub max_width: usize,
}

impl NfoConfig {
    const fn default_max_width() -> usize {
        80
    }

    /// Effective line width, substituting the default for zero.
    #[must_use]
    pub const fn max_width(&self) -> usize {
        if self.max_width == 0 {
            Self::default_max_width()
        } else {
            self.max_width
        }
    }
}

impl Default for NfoConfig {
    fn default() -> Self {
        Self {
            max_width: Self::default_max_width(),
        }
    }
}

/// Packaging settings.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct PackagingConfig {
    /// Read buffer size used while hashing archives, in bytes.
    pub checksum_chunk_size: usize,
}

impl PackagingConfig {
    const fn default_checksum_chunk_size() -> usize {
        65_536
    }

    /// Effective chunk size, substituting the default for zero.
    #[must_use]
    pub const fn checksum_chunk_size(&self) -> usize {
        if self.checksum_chunk_size == 0 {
            Self::default_checksum_chunk_size()
        } else {
            self.checksum_chunk_size
        }
    }
}

impl Default for PackagingConfig {
    fn default() -> Self {
        Self {
            checksum_chunk_size: Self::default_checksum_chunk_size(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn defaults_match_the_ebook_baseline() {
        let config = ScenepackConfig::default();

        assert_eq!(config.nfo.max_width(), 80);
        assert_eq!(config.packaging.checksum_chunk_size(), 65_536);
    }

    #[rstest]
    fn deserialises_overrides_from_toml() {
        let source = "[nfo]\nmax_width = 72\n\n[packaging]\nchecksum_chunk_size = 4096\n";

        let config = ScenepackConfig::from_toml_str(source)
            .expect("expected configuration to parse successfully");

        assert_eq!(config.nfo.max_width(), 72);
        assert_eq!(config.packaging.checksum_chunk_size(), 4096);
    }

    #[rstest]
    #[case::width("[nfo]\nmax_width = 0\n")]
    #[case::chunk("[packaging]\nchecksum_chunk_size = 0\n")]
    fn zero_values_fall_back_to_defaults(#[case] source: &str) {
        let config = ScenepackConfig::from_toml_str(source).expect("parse");

        assert_eq!(config.nfo.max_width(), 80);
        assert_eq!(config.packaging.checksum_chunk_size(), 65_536);
    }

    #[rstest]
    #[case::top_level("colour = \"red\"\n")]
    #[case::nested("[nfo]\nheight = 10\n")]
    fn rejects_unknown_fields(#[case] source: &str) {
        let error = ScenepackConfig::from_toml_str(source).expect_err("unknown key rejected");

        assert!(matches!(error, ConfigError::Parse(_)));
    }

    #[rstest]
    fn missing_file_yields_defaults() {
        let config = ScenepackConfig::load_with(Utf8Path::new("scenepack.toml"), |_| Ok(None))
            .expect("defaults");

        assert_eq!(config, ScenepackConfig::default());
    }

    #[rstest]
    fn read_failures_name_the_path() {
        let error = ScenepackConfig::load_with(Utf8Path::new("locked.toml"), |_| {
            Err(io::Error::new(io::ErrorKind::PermissionDenied, "denied"))
        })
        .expect_err("read failure");

        assert!(error.to_string().contains("locked.toml"));
        assert!(matches!(error, ConfigError::Read { .. }));
    }

    #[rstest]
    fn loads_from_disk() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = Utf8PathBuf::from_path_buf(dir.path().join("scenepack.toml"))
            .expect("utf-8 temp path");
        std::fs::write(&path, "[nfo]\nmax_width = 64\n").expect("write config");

        let config = ScenepackConfig::load(&path).expect("load");

        assert_eq!(config.nfo.max_width(), 64);
        assert_eq!(
            ScenepackConfig::load(&path.with_file_name("absent.toml")).expect("absent"),
            ScenepackConfig::default()
        );
    }
}
