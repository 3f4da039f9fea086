//! Configuration management for netctl-meta

use crate::credential::SecretFlags;
use crate::error::{MetaError, MetaResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MetaConfig {
    /// Configuration file paths
    #[serde(default)]
    pub paths: ConfigPaths,
    /// Default settings
    #[serde(default)]
    pub defaults: DefaultSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigPaths {
    /// Base configuration directory
    #[serde(default = "default_config_dir")]
    pub config_dir: PathBuf,
    /// Connection profile directory
    #[serde(default = "default_profile_dir")]
    pub profile_dir: PathBuf,
    /// Directory for certificates exported from inline blobs
    #[serde(default = "default_cert_dir")]
    pub cert_dir: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultSettings {
    /// Log level when none is given on the command line
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Secret flags applied to newly stored private-key passwords
    #[serde(default)]
    pub private_key_password_flags: u32,
}

fn default_config_dir() -> PathBuf {
    PathBuf::from("/etc/netctl")
}

fn default_profile_dir() -> PathBuf {
    PathBuf::from("/etc/netctl/connections")
}

fn default_cert_dir() -> PathBuf {
    PathBuf::from("/etc/netctl/certs")
}

fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for ConfigPaths {
    fn default() -> Self {
        Self {
            config_dir: default_config_dir(),
            profile_dir: default_profile_dir(),
            cert_dir: default_cert_dir(),
        }
    }
}

impl Default for DefaultSettings {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            private_key_password_flags: 0,
        }
    }
}

impl MetaConfig {
    /// Load configuration from file
    pub fn load<P: AsRef<Path>>(path: P) -> MetaResult<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| MetaError::ConfigError(format!("Failed to read config: {}", e)))?;

        let config: MetaConfig = toml::from_str(&content)
            .map_err(|e| MetaError::ConfigError(format!("Failed to parse config: {}", e)))?;
        config.password_flags()?;

        Ok(config)
    }

    /// Save configuration to file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> MetaResult<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| MetaError::ConfigError(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path.as_ref(), content)
            .map_err(|e| MetaError::ConfigError(format!("Failed to write config: {}", e)))?;

        Ok(())
    }

    /// Ensure all directories exist
    pub fn ensure_directories(&self) -> MetaResult<()> {
        for dir in [&self.paths.config_dir, &self.paths.profile_dir, &self.paths.cert_dir] {
            std::fs::create_dir_all(dir)
                .map_err(|e| MetaError::ConfigError(format!("Failed to create directory {:?}: {}", dir, e)))?;
        }
        Ok(())
    }

    /// Default private-key password flags
    pub fn password_flags(&self) -> MetaResult<SecretFlags> {
        SecretFlags::from_bits(self.defaults.private_key_password_flags).ok_or_else(|| {
            MetaError::ConfigError(format!(
                "Unknown secret flag bits: {:#x}",
                self.defaults.private_key_password_flags
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = MetaConfig::default();
        assert_eq!(config.paths.profile_dir, PathBuf::from("/etc/netctl/connections"));
        assert_eq!(config.defaults.log_level, "warn");
        assert_eq!(config.password_flags().unwrap(), SecretFlags::NONE);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("netctl-meta.toml");
        std::fs::write(&path, "[defaults]\nprivate_key_password_flags = 1\n").unwrap();

        let config = MetaConfig::load(&path).unwrap();
        assert_eq!(config.password_flags().unwrap(), SecretFlags::AGENT_OWNED);
        assert_eq!(config.paths.cert_dir, PathBuf::from("/etc/netctl/certs"));
        assert_eq!(config.defaults.log_level, "warn");
    }

    #[test]
    fn test_unknown_flag_bits_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("netctl-meta.toml");
        std::fs::write(&path, "[defaults]\nprivate_key_password_flags = 16\n").unwrap();

        assert!(matches!(MetaConfig::load(&path), Err(MetaError::ConfigError(_))));
    }

    #[test]
    fn test_save_and_reload() {
        let dir = TempDir::new().unwrap();
        let mut config = MetaConfig::default();
        config.paths.profile_dir = dir.path().join("profiles");
        config.paths.cert_dir = dir.path().join("certs");
        config.paths.config_dir = dir.path().to_path_buf();
        config.ensure_directories().unwrap();
        assert!(dir.path().join("profiles").is_dir());

        let path = dir.path().join("netctl-meta.toml");
        config.save(&path).unwrap();
        let loaded = MetaConfig::load(&path).unwrap();
        assert_eq!(loaded.paths.profile_dir, config.paths.profile_dir);
    }
}
