use anyhow::{Context, Result};
use lure_core::config::EngagementConfig;
use lure_infrastructure::ConfigLoader;
use std::path::PathBuf;

/// Resolves the loader for an explicit path or the default location.
pub fn loader(path: Option<PathBuf>) -> Result<ConfigLoader> {
    match path {
        Some(path) => Ok(ConfigLoader::from_path(path)),
        None => ConfigLoader::from_default_location().context("Failed to resolve config directory"),
    }
}

/// Loads the effective configuration and checks it.
pub async fn load(path: Option<PathBuf>) -> Result<EngagementConfig> {
    let loader = loader(path)?;
    let config = loader
        .load()
        .await
        .with_context(|| format!("Failed to load {}", loader.path().display()))?;
    config.validate().context("Invalid configuration")?;
    Ok(config)
}

pub async fn show(path: Option<PathBuf>, defaults: bool) -> Result<()> {
    let config = if defaults {
        EngagementConfig::default()
    } else {
        let loader = loader(path.clone())?;
        println!("# source: {}", loader.path().display());
        load(path).await?
    };
    print!("{}", config.to_toml_string()?);
    Ok(())
}
