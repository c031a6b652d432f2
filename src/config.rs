use anyhow::Result;
use ::config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::lifecycle::types::LifecyclePolicy;

/// Main configuration structure for the IP portal core
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PortalConfig {
    /// Where submissions are kept
    pub store: StoreConfig,
    /// Lifecycle rules that are a product decision rather than code
    pub lifecycle: LifecycleConfig,
    /// Logging settings
    pub observability: ObservabilityConfig,
    /// Database settings (optional, used by the sqlite backend)
    pub database: Option<DatabaseConfig>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    Memory,
    File,
    Sqlite,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Storage backend
    pub backend: StoreBackend,
    /// JSON document used by the file backend
    pub path: PathBuf,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct LifecycleConfig {
    /// Cap on resubmission rounds per submission; unset means unbounded
    pub max_resubmission_rounds: Option<u32>,
}

impl LifecycleConfig {
    pub fn policy(&self) -> LifecyclePolicy {
        LifecyclePolicy {
            max_resubmission_rounds: self.max_resubmission_rounds,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (EnvFilter syntax)
    pub log_level: String,
    /// Emit JSON log lines instead of the compact format
    pub json_logs: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    /// Database URL (SQLite file path or connection string)
    pub url: String,
    /// Maximum connections in pool
    pub max_connections: u32,
    /// Enable automatic migrations
    pub auto_migrate: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::File,
            path: PathBuf::from(".ip-portal/submissions.json"),
        }
    }
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "warn".to_string(),
            json_logs: false,
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite://.ip-portal/ip-portal.db".to_string(),
            max_connections: 5,
            auto_migrate: true,
        }
    }
}

impl Default for PortalConfig {
    fn default() -> Self {
        Self {
            store: StoreConfig::default(),
            lifecycle: LifecycleConfig::default(),
            observability: ObservabilityConfig::default(),
            database: None,
        }
    }
}

impl PortalConfig {
    /// Load configuration from multiple sources with precedence:
    /// 1. Default values
    /// 2. Configuration files (ip-portal.toml, .ip-portal-rc)
    /// 3. Environment variables (prefixed with IP_PORTAL_, `__` between sections)
    pub fn load() -> Result<Self> {
        Self::load_from(Path::new("."))
    }

    /// Same as [`PortalConfig::load`], resolving config files under `dir`.
    pub fn load_from(dir: &Path) -> Result<Self> {
        let mut builder = Config::builder();

        let toml_file = dir.join("ip-portal.toml");
        if toml_file.exists() {
            builder = builder.add_source(File::from(toml_file));
        }

        let rc_file = dir.join(".ip-portal-rc");
        if rc_file.exists() {
            builder = builder.add_source(File::new(
                &rc_file.to_string_lossy(),
                FileFormat::Toml,
            ));
        }

        builder = builder.add_source(
            Environment::with_prefix("IP_PORTAL")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build()?;
        let portal_config: PortalConfig = config.try_deserialize()?;
        portal_config.validate()?;
        Ok(portal_config)
    }

    fn validate(&self) -> Result<()> {
        if self.lifecycle.max_resubmission_rounds == Some(0) {
            anyhow::bail!("lifecycle.max_resubmission_rounds must be at least 1 when set");
        }
        if self.store.backend == StoreBackend::Sqlite && self.database.is_none() {
            anyhow::bail!("store.backend = \"sqlite\" requires a [database] section");
        }
        Ok(())
    }

    /// Save configuration to file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let toml_content = toml::to_string_pretty(self)?;
        std::fs::write(path, toml_content)?;
        Ok(())
    }

    /// Load .env file if it exists
    pub fn load_env_file() -> Result<()> {
        if Path::new(".env").exists() {
            dotenvy::dotenv()?;
            tracing::info!("Loaded environment variables from .env file");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_use_file_store_and_unbounded_rounds() {
        let config = PortalConfig::default();
        assert_eq!(config.store.backend, StoreBackend::File);
        assert_eq!(config.lifecycle.policy().max_resubmission_rounds, None);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn toml_file_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("ip-portal.toml"),
            "[store]\nbackend = \"memory\"\n\n[lifecycle]\nmax_resubmission_rounds = 3\n",
        )
        .unwrap();

        let config = PortalConfig::load_from(dir.path()).unwrap();
        assert_eq!(config.store.backend, StoreBackend::Memory);
        assert_eq!(config.lifecycle.max_resubmission_rounds, Some(3));
    }

    #[test]
    fn zero_round_cap_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("ip-portal.toml"),
            "[lifecycle]\nmax_resubmission_rounds = 0\n",
        )
        .unwrap();

        assert!(PortalConfig::load_from(dir.path()).is_err());
    }

    #[test]
    fn saved_config_loads_back() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = PortalConfig::default();
        config.lifecycle.max_resubmission_rounds = Some(2);
        config.save_to_file(dir.path().join("ip-portal.toml")).unwrap();

        let loaded = PortalConfig::load_from(dir.path()).unwrap();
        assert_eq!(loaded.lifecycle.max_resubmission_rounds, Some(2));
    }
}
