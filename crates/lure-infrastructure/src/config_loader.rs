//! Engagement configuration loading.
//!
//! Reads `config.toml` from an explicit path or the platform config
//! directory, then applies environment overrides.

use crate::paths::LurePaths;
use lure_core::config::EngagementConfig;
use lure_core::error::{LureError, Result};
use std::path::{Path, PathBuf};

/// Overrides the callback endpoint.
pub const ENV_CALLBACK_ENDPOINT: &str = "LURE_CALLBACK_ENDPOINT";
/// Overrides the callback API key.
pub const ENV_API_KEY: &str = "LURE_API_KEY";
/// Overrides `conversation.max_total_turns`.
pub const ENV_MAX_TURNS: &str = "LURE_MAX_TURNS";

/// Loads `EngagementConfig` from TOML.
///
/// A missing or empty file yields the defaults, so a fresh installation runs
/// without any configuration.
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    path: PathBuf,
}

impl ConfigLoader {
    /// Loader for an explicit file path.
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Loader for `<config dir>/lure/config.toml`.
    pub fn from_default_location() -> Result<Self> {
        let path = LurePaths::config_file().map_err(|e| LureError::config(e.to_string()))?;
        Ok(Self::from_path(path))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the file and applies process environment overrides.
    pub async fn load(&self) -> Result<EngagementConfig> {
        let config = self.load_file().await?;
        apply_overrides(config, |key| std::env::var(key).ok())
    }

    /// Reads the file without environment overrides.
    pub async fn load_file(&self) -> Result<EngagementConfig> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => {
                tracing::debug!(path = %self.path.display(), "Loading engagement config");
                EngagementConfig::from_toml_str(&content)
            }
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %self.path.display(), "No config file, using defaults");
                Ok(EngagementConfig::default())
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Writes `config` to the loader's path, creating parent directories.
    pub async fn save(&self, config: &EngagementConfig) -> Result<()> {
        config.validate()?;
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&self.path, config.to_toml_string()?).await?;
        Ok(())
    }
}

/// Applies environment overrides using `lookup` to read variables.
pub fn apply_overrides<F>(mut config: EngagementConfig, lookup: F) -> Result<EngagementConfig>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(endpoint) = lookup(ENV_CALLBACK_ENDPOINT).filter(|v| !v.trim().is_empty()) {
        config.callback.endpoint = endpoint.trim().to_string();
    }
    if let Some(key) = lookup(ENV_API_KEY).filter(|v| !v.trim().is_empty()) {
        config.callback.api_key = Some(key.trim().to_string());
    }
    if let Some(raw) = lookup(ENV_MAX_TURNS) {
        config.conversation.max_total_turns = raw
            .trim()
            .parse()
            .map_err(|_| LureError::config(format!("{ENV_MAX_TURNS} must be a positive integer, got '{raw}'")))?;
    }
    config.validate()?;
    Ok(config)
}
