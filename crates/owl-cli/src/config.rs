//! Config file location and TOML I/O.

use std::path::{Path, PathBuf};

use owl_core::OwlConfig;
use tracing::debug;

pub fn default_config_path() -> anyhow::Result<PathBuf> {
    Ok(xdg_config_dir()?.join("config.toml"))
}

/// `--config` / `OWL_CONFIG` if given, else the XDG default.
pub fn resolve_config_path(override_path: Option<&Path>) -> anyhow::Result<PathBuf> {
    match override_path {
        Some(path) if !path.as_os_str().is_empty() => Ok(path.to_path_buf()),
        _ => default_config_path(),
    }
}

/// Parse a config file exactly as written (relative paths untouched).
pub fn read_config(path: &Path) -> anyhow::Result<OwlConfig> {
    let contents = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("Failed to read config {}: {}", path.display(), e))?;
    toml::from_str(&contents)
        .map_err(|e| anyhow::anyhow!("Failed to parse config {}: {}", path.display(), e))
}

/// Load the effective config: defaults for a missing file, relative paths
/// resolved against the config file's directory, values validated.
pub fn load_config(path: &Path) -> anyhow::Result<OwlConfig> {
    let config = if path.exists() {
        read_config(path)?
    } else {
        debug!(path = %path.display(), "config file missing; using defaults");
        OwlConfig::default()
    };
    config.validate()?;

    let base_dir = path
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .map(Path::to_path_buf)
        .unwrap_or(std::env::current_dir()?);
    Ok(config.resolved_against(&base_dir))
}

pub fn write_config(path: &Path, config: &OwlConfig) -> anyhow::Result<()> {
    let contents =
        toml::to_string_pretty(config).map_err(|e| anyhow::anyhow!("TOML error: {}", e))?;
    owl_core::fs::write_atomic(path, contents.as_bytes(), false)
        .map_err(|e| anyhow::anyhow!("Failed to write config {}: {}", path.display(), e))?;
    Ok(())
}

pub fn xdg_config_dir() -> anyhow::Result<PathBuf> {
    if let Ok(value) = std::env::var("XDG_CONFIG_HOME") {
        if !value.trim().is_empty() {
            return Ok(PathBuf::from(value).join("owl"));
        }
    }
    Ok(home_dir()?.join(".config").join("owl"))
}

fn home_dir() -> anyhow::Result<PathBuf> {
    let home = std::env::var("HOME")
        .map_err(|_| anyhow::anyhow!("HOME is not set; cannot resolve default paths"))?;
    Ok(PathBuf::from(home))
}
