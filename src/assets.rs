//! Preset file loading with an embedded fallback
//!
//! - If no external path is given: use the embedded `tilequant.yaml` only
//! - If a path is given (`--config` or `TILEQUANT_CONFIG`): read that file;
//!   callers fall back to the embedded copy when it cannot be used

use rust_embed::RustEmbed;
use std::borrow::Cow;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Environment variable naming an external presets file.
pub const CONFIG_ENV: &str = "TILEQUANT_CONFIG";

/// File name of the embedded presets.
pub const CONFIG_FILE_NAME: &str = "tilequant.yaml";

/// Embedded default presets
#[derive(RustEmbed)]
#[folder = "."]
#[include = "tilequant.yaml"]
struct EmbeddedConfig;

/// Where the active configuration comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    Embedded,
    File(PathBuf),
    /// A path was configured but does not exist
    Missing(PathBuf),
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigSource::Embedded => write!(f, "embedded"),
            ConfigSource::File(path) => write!(f, "{}", path.display()),
            ConfigSource::Missing(path) => {
                write!(f, "embedded ({} not found)", path.display())
            }
        }
    }
}

/// Loads the presets file, external first
pub struct AssetLoader {
    /// External config file path (from --config or TILEQUANT_CONFIG)
    config_file: Option<PathBuf>,
}

impl AssetLoader {
    /// Create a new asset loader
    ///
    /// If `config_file` is `None`, the embedded presets are used exclusively.
    pub fn new(config_file: Option<PathBuf>) -> Self {
        Self { config_file }
    }

    /// Use `cli_path` if given, else the `TILEQUANT_CONFIG` environment variable.
    pub fn from_env(cli_path: Option<PathBuf>) -> Self {
        Self::new(cli_path.or_else(|| std::env::var_os(CONFIG_ENV).map(PathBuf::from)))
    }

    /// The configured external path, if any
    pub fn config_file(&self) -> Option<&Path> {
        self.config_file.as_deref()
    }

    /// Describe where [`read_config`](Self::read_config) reads from
    pub fn config_source(&self) -> ConfigSource {
        match self.config_file {
            Some(ref path) if path.exists() => ConfigSource::File(path.clone()),
            Some(ref path) => ConfigSource::Missing(path.clone()),
            None => ConfigSource::Embedded,
        }
    }

    /// Read the config file
    ///
    /// If an external path is configured, reads that file and reports its
    /// errors. Otherwise reads the embedded copy.
    pub fn read_config(&self) -> io::Result<Cow<'static, [u8]>> {
        if let Some(ref path) = self.config_file {
            tracing::trace!(path = %path.display(), "Loading config from filesystem");
            return Ok(Cow::Owned(fs::read(path)?));
        }
        Self::read_embedded_config()
    }

    /// Read config as a UTF-8 string
    pub fn read_config_string(&self) -> io::Result<String> {
        let bytes = self.read_config()?;
        String::from_utf8(bytes.into_owned())
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
    }

    /// The embedded presets file
    pub fn read_embedded_config() -> io::Result<Cow<'static, [u8]>> {
        EmbeddedConfig::get(CONFIG_FILE_NAME)
            .map(|f| {
                tracing::trace!("Loading config from embedded assets");
                f.data
            })
            .ok_or_else(|| {
                io::Error::new(
                    io::ErrorKind::NotFound,
                    format!("Embedded {CONFIG_FILE_NAME} not found"),
                )
            })
    }

    /// The embedded presets file as a UTF-8 string
    pub fn read_embedded_config_string() -> io::Result<String> {
        let bytes = Self::read_embedded_config()?;
        String::from_utf8(bytes.into_owned())
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embedded_config_present() {
        let content = AssetLoader::read_embedded_config_string().unwrap();
        assert!(content.contains("presets:"));
        assert!(content.contains("nds-4bpp"));
    }

    #[test]
    fn test_source_without_path_is_embedded() {
        let loader = AssetLoader::new(None);
        assert_eq!(loader.config_source(), ConfigSource::Embedded);
        assert_eq!(loader.config_source().to_string(), "embedded");
        assert!(loader.read_config().is_ok());
    }

    #[test]
    fn test_missing_external_file_is_an_error() {
        let loader = AssetLoader::new(Some(PathBuf::from("/nonexistent/tilequant.yaml")));
        assert!(matches!(loader.config_source(), ConfigSource::Missing(_)));
        assert_eq!(
            loader.read_config().unwrap_err().kind(),
            io::ErrorKind::NotFound
        );
    }

    #[test]
    fn test_cli_path_wins_over_env() {
        let loader = AssetLoader::from_env(Some(PathBuf::from("custom.yaml")));
        assert_eq!(loader.config_file(), Some(Path::new("custom.yaml")));
    }
}
