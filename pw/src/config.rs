//! Planwizard configuration types and loading

use eyre::{Context, Result};
use planextract::RulesConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Main planwizard configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Rule set search paths
    pub rules: RulesConfig,

    /// Session defaults
    pub session: SessionConfig,

    /// Export settings
    pub export: ExportConfig,
}

impl Config {
    /// Load configuration.
    ///
    /// `--config` must name a readable file. Without it the first of
    /// `.planwizard.yml` and `~/.config/planwizard/planwizard.yml` that loads
    /// wins; a broken candidate is logged and skipped.
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        if let Some(path) = config_path {
            return Self::load_from_file(path).with_context(|| format!("planwizard --config {}", path.display()));
        }
        Ok(Self::load_first(&Self::candidates()).unwrap_or_default())
    }

    /// Project file first, then the per-user file
    fn candidates() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from(".planwizard.yml")];
        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("planwizard").join("planwizard.yml"));
        }
        paths
    }

    fn load_first(candidates: &[PathBuf]) -> Option<Self> {
        for path in candidates.iter().filter(|p| p.exists()) {
            match Self::load_from_file(path) {
                Ok(config) => return Some(config),
                Err(e) => tracing::warn!(path = %path.display(), error = %e, "Skipping unusable planwizard config"),
            }
        }
        tracing::info!(searched = candidates.len(), "No planwizard config found, using built-in defaults");
        None
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).with_context(|| format!("Cannot read planwizard config {}", path.display()))?;
        let config: Self = serde_yaml::from_str(&content)
            .with_context(|| format!("Invalid planwizard config {}", path.display()))?;

        tracing::info!(path = %path.display(), domain = %config.session.default_domain, "Using planwizard config");
        Ok(config)
    }
}

/// Session defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Rule set used when a command does not name one
    #[serde(rename = "default-domain")]
    pub default_domain: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            default_domain: "delivery".to_string(),
        }
    }
}

/// Export settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Directory export files are written to
    pub dir: String,

    /// Pretty-print exported JSON
    pub pretty: bool,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            dir: ".".to_string(),
            pretty: true,
        }
    }
}

impl ExportConfig {
    /// Export directory with ~/ expanded
    pub fn expanded_dir(&self) -> PathBuf {
        match self.dir.strip_prefix("~/") {
            Some(rest) => dirs::home_dir().map(|home| home.join(rest)).unwrap_or_else(|| PathBuf::from(&self.dir)),
            None => PathBuf::from(&self.dir),
        }
    }
}
