use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Environment variable that overrides the configured shared mirror root.
pub const SHARED_ROOT_ENV: &str = "ATELIER_SHARED_ROOT";

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub storage: StorageConfig,
    #[serde(default)]
    pub mirror: MirrorConfig,
    #[serde(default)]
    pub user: Option<UserConfig>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    /// Base directory under which every per-user root is created.
    pub root: PathBuf,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct MirrorConfig {
    /// Shared network root to replicate into. `None` disables replication.
    /// Overridden by `ATELIER_SHARED_ROOT` when set.
    pub shared_root: Option<PathBuf>,
}

/// Default identity used when the CLI is run without `--user`/`--user-id`.
#[derive(Debug, Deserialize, Clone)]
pub struct UserConfig {
    pub display_name: String,
    pub id: String,
}

impl Config {
    /// Resolve the effective shared root: environment override first, then
    /// the config value, else replication is disabled.
    pub fn shared_root(&self) -> Option<PathBuf> {
        if let Ok(path) = std::env::var(SHARED_ROOT_ENV) {
            if !path.trim().is_empty() {
                return Some(PathBuf::from(path));
            }
        }
        self.mirror.shared_root.clone()
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    if config.storage.root.as_os_str().is_empty() {
        anyhow::bail!("storage.root must not be empty");
    }

    if let Some(ref shared) = config.mirror.shared_root {
        if shared == &config.storage.root {
            anyhow::bail!("mirror.shared_root must differ from storage.root");
        }
    }

    Ok(config)
}
