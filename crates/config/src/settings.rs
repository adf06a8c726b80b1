// Application settings
// Loaded from ~/.config/resortdesk/settings.toml (or --config / RDESK_CONFIG)

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use resortdesk_recon::MatchConfig;

/// Environment variable naming an explicit settings file.
pub const CONFIG_ENV: &str = "RDESK_CONFIG";

const APP_DIR: &str = "resortdesk";
const SETTINGS_FILE: &str = "settings.toml";
const DATABASE_FILE: &str = "catalog.db";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid settings file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("invalid settings file {path}: {message}")]
    Invalid { path: PathBuf, message: String },
}

/// Where the settings were read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettingsSource {
    /// `--config` flag
    Flag(PathBuf),
    /// `RDESK_CONFIG`
    Env(PathBuf),
    /// Platform config dir
    Default(PathBuf),
}

impl SettingsSource {
    pub fn path(&self) -> &Path {
        match self {
            Self::Flag(p) | Self::Env(p) | Self::Default(p) => p,
        }
    }

    fn is_explicit(&self) -> bool {
        !matches!(self, Self::Default(_))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Catalog database. Relative paths resolve against the settings file's
    /// directory.
    pub database: PathBuf,

    /// Matching thresholds, price tolerance and header keywords.
    pub import: MatchConfig,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            database: Self::default_database_path(),
            import: MatchConfig::default(),
        }
    }
}

impl Settings {
    pub fn config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(APP_DIR)
    }

    pub fn default_config_path() -> PathBuf {
        Self::config_dir().join(SETTINGS_FILE)
    }

    pub fn default_database_path() -> PathBuf {
        Self::config_dir().join(DATABASE_FILE)
    }

    /// Pick the settings file: flag, then environment, then platform default.
    pub fn locate(flag: Option<&Path>) -> SettingsSource {
        if let Some(path) = flag {
            return SettingsSource::Flag(path.to_path_buf());
        }
        match std::env::var_os(CONFIG_ENV) {
            Some(path) if !path.is_empty() => SettingsSource::Env(PathBuf::from(path)),
            _ => SettingsSource::Default(Self::default_config_path()),
        }
    }

    /// Load settings for the CLI.
    ///
    /// A missing default file yields defaults; a missing file that was named
    /// explicitly is an error. A file that exists but does not parse or
    /// validate is always an error.
    pub fn load(flag: Option<&Path>) -> Result<Self, ConfigError> {
        let source = Self::locate(flag);
        let path = source.path();
        if !path.exists() && !source.is_explicit() {
            tracing::debug!(path = %path.display(), "no settings file, using defaults");
            return Ok(Self::default());
        }
        Self::load_from(path)
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut settings = Self::from_toml(&contents, path)?;
        if settings.database.is_relative() {
            let base = path.parent().unwrap_or_else(|| Path::new("."));
            settings.database = base.join(&settings.database);
        }
        tracing::debug!(path = %path.display(), database = %settings.database.display(), "settings loaded");
        Ok(settings)
    }

    /// Parse settings text; `path` is used for error messages only.
    pub fn from_toml(contents: &str, path: &Path) -> Result<Self, ConfigError> {
        let settings: Self = toml::from_str(contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        settings.import.validate().map_err(|e| ConfigError::Invalid {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        Ok(settings)
    }

    /// Return these settings with the database path replaced, if given.
    pub fn with_database(mut self, database: Option<PathBuf>) -> Self {
        if let Some(db) = database {
            self.database = db;
        }
        self
    }
}
