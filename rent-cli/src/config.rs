//! Layered settings for `rent-budget`.
//!
//! Precedence (lowest to highest):
//! 1. Compiled defaults
//! 2. TOML settings file (`--config`, or `rent-budget.toml` in the working
//!    directory when present)
//! 3. Environment variables (`RENT_BUDGET_*`) and command-line flags

use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

/// File picked up from the working directory when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "rent-budget.toml";

pub const DEFAULT_BACKEND: &str = "sqlite";
pub const DEFAULT_DATABASE: &str = "rent.db";
pub const DEFAULT_TAX_YEAR: i32 = 2025;
pub const DEFAULT_REGION: &str = "BC";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config file '{}': {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid config file '{}': {source}", path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

/// Settings as written in a file or given on the command line; `None`
/// means "not specified here".
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RawSettings {
    pub backend: Option<String>,
    pub database: Option<String>,
    pub tax_year: Option<i32>,
    pub region: Option<String>,
}

impl RawSettings {
    /// Overlay wins field by field.
    pub fn merge(
        self,
        overlay: RawSettings,
    ) -> RawSettings {
        RawSettings {
            backend: overlay.backend.or(self.backend),
            database: overlay.database.or(self.database),
            tax_year: overlay.tax_year.or(self.tax_year),
            region: overlay.region.or(self.region),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub backend: String,
    pub database: String,
    pub tax_year: i32,
    pub region: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            backend: DEFAULT_BACKEND.to_string(),
            database: DEFAULT_DATABASE.to_string(),
            tax_year: DEFAULT_TAX_YEAR,
            region: DEFAULT_REGION.to_string(),
        }
    }
}

impl From<RawSettings> for Settings {
    fn from(raw: RawSettings) -> Self {
        let defaults = Settings::default();
        Self {
            backend: raw.backend.unwrap_or(defaults.backend),
            database: raw.database.unwrap_or(defaults.database),
            tax_year: raw.tax_year.unwrap_or(defaults.tax_year),
            region: raw
                .region
                .map(|r| r.trim().to_uppercase())
                .unwrap_or(defaults.region),
        }
    }
}

impl Settings {
    /// Resolves the final settings from an optional explicit file and the
    /// command-line layer.
    ///
    /// An explicit `config_path` must exist. Without one, the default file is
    /// read only if it is present in `working_dir`.
    pub fn resolve(
        config_path: Option<&Path>,
        working_dir: &Path,
        cli: RawSettings,
    ) -> Result<Settings, ConfigError> {
        let file = match config_path {
            Some(path) => load_raw_settings(path)?,
            None => {
                let candidate = working_dir.join(DEFAULT_CONFIG_FILE);
                if candidate.is_file() {
                    load_raw_settings(&candidate)?
                } else {
                    RawSettings::default()
                }
            }
        };

        Ok(Settings::from(file.merge(cli)))
    }
}

/// Reads and parses one TOML settings file.
pub fn load_raw_settings(path: &Path) -> Result<RawSettings, ConfigError> {
    debug!(path = %path.display(), "loading settings file");
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}
