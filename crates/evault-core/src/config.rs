use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{EvaultError, EvaultResult};

/// Top-level configuration (loaded from evault.toml)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EvaultConfig {
    pub vault: VaultConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VaultConfig {
    /// Path of the persisted vault record (default: ~/.config/evault/vault.json)
    pub path: PathBuf,
    /// Default security level for new vaults: "medium" or "high"
    pub security_level: String,
}

impl Default for VaultConfig {
    fn default() -> Self {
        let base = std::env::var_os("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."));
        Self {
            path: base.join(".config/evault/vault.json"),
            security_level: "high".into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (default: info)
    pub level: String,
    /// Log format: "json" or "text"
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
            format: "text".into(),
        }
    }
}

impl EvaultConfig {
    /// Load configuration from a TOML file, falling back to defaults when the
    /// file does not exist.
    pub fn load(path: &Path) -> EvaultResult<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)
                .map_err(|e| EvaultError::Config(format!("reading {}: {e}", path.display())))?;
            toml::from_str(&content)
                .map_err(|e| EvaultError::Config(format!("parsing {}: {e}", path.display())))
        } else {
            tracing::warn!("config file not found: {}  (using defaults)", path.display());
            Ok(Self::default())
        }
    }
}
