use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::constants::{
    DEFAULT_CONFIG_FILE, DEFAULT_INACTIVE_WINDOW_DAYS, DEFAULT_LOG_DIR, ENV_CONFIG_PATH, ENV_ID_SCHEME,
    ENV_INACTIVE_WINDOW_DAYS, ENV_LOG_DIR, MAX_INACTIVE_WINDOW_DAYS,
};
use crate::error::{EnrichError, Result};
use crate::pipeline::{IdScheme, PipelineConfig, QualityGateConfig};
use crate::types::CollectionSpec;

/// Settings for the enrichment tool. Layered as defaults, then an optional
/// TOML file, then environment variables, then command line flags.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EnrichConfig {
    pub id_scheme: IdScheme,
    pub inactive_window_days: i64,
    /// Empty means auto-detect the default collections
    pub collections: Vec<CollectionSpec>,
    pub log_dir: PathBuf,
    pub pretty: bool,
}

impl Default for EnrichConfig {
    fn default() -> Self {
        Self {
            id_scheme: IdScheme::default(),
            inactive_window_days: DEFAULT_INACTIVE_WINDOW_DAYS,
            collections: Vec::new(),
            log_dir: PathBuf::from(DEFAULT_LOG_DIR),
            pretty: true,
        }
    }
}

impl EnrichConfig {
    /// Loads the file at `path`, or `$ENRICH_CONFIG`, or `enrich.toml` when it
    /// exists, then applies environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let env_path = std::env::var(ENV_CONFIG_PATH).ok().map(PathBuf::from);
        let mut config = match path.map(Path::to_path_buf).or(env_path) {
            Some(path) => Self::from_file(&path)?,
            None if Path::new(DEFAULT_CONFIG_FILE).exists() => Self::from_file(Path::new(DEFAULT_CONFIG_FILE))?,
            None => Self::default(),
        };
        config.apply_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            EnrichError::Config(format!("Failed to read config file '{}': {}", path.display(), e))
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: EnrichConfig = toml::from_str(content)?;
        Ok(config)
    }

    /// Applies overrides from a key lookup (the process environment in
    /// production, a map in tests)
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(scheme) = lookup(ENV_ID_SCHEME) {
            self.id_scheme = scheme.parse()?;
        }
        if let Some(days) = lookup(ENV_INACTIVE_WINDOW_DAYS) {
            self.inactive_window_days = days.trim().parse().map_err(|e| {
                EnrichError::Config(format!("{} must be a whole number of days, got '{}': {}", ENV_INACTIVE_WINDOW_DAYS, days, e))
            })?;
        }
        if let Some(dir) = lookup(ENV_LOG_DIR) {
            self.log_dir = PathBuf::from(dir);
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.inactive_window_days < 0 {
            return Err(EnrichError::Config(format!(
                "inactive_window_days must not be negative, got {}",
                self.inactive_window_days
            )));
        }
        if self.inactive_window_days > MAX_INACTIVE_WINDOW_DAYS {
            return Err(EnrichError::Config(format!(
                "inactive_window_days must be at most {}, got {}",
                MAX_INACTIVE_WINDOW_DAYS, self.inactive_window_days
            )));
        }
        Ok(())
    }

    pub fn pipeline_config(&self) -> PipelineConfig {
        PipelineConfig {
            id_scheme: self.id_scheme,
            collections: self.collections.clone(),
            quality_gate: QualityGateConfig {
                inactive_window_days: self.inactive_window_days,
            },
        }
    }
}
