//! Configuration management for the backup tool.
//!
//! Settings come from a TOML file kept next to the client
//! (`<client>/.tirisgarde.toml`), then environment variables, then
//! command-line flags, each layer overriding the previous one.

use crate::utils::{BackupError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// File name of the per-client configuration file
pub const CONFIG_FILE_NAME: &str = ".tirisgarde.toml";

/// Directory inside the client folder that gets backed up
pub const SOURCE_SUBDIR: &str = "WTF";

pub const ENV_DEST: &str = "TIRISGARDE_DEST";
pub const ENV_MAX_AGE: &str = "TIRISGARDE_MAX_AGE";
pub const ENV_LOG_LEVEL: &str = "TIRISGARDE_LOG_LEVEL";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Folder to store backups
    #[serde(default = "default_dest")]
    pub dest: PathBuf,

    /// Max age for backups, in days
    #[serde(rename = "max-age", default = "default_max_age")]
    pub max_age: u32,

    #[serde(default)]
    pub log: LogConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

/// Values given on the command line; `None` leaves the lower layers alone.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub dest: Option<PathBuf>,
    pub max_age: Option<u32>,
    pub log_level: Option<String>,
}

// Default values
fn default_dest() -> PathBuf {
    PathBuf::from("WTF-Backup")
}

fn default_max_age() -> u32 {
    30
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            dest: default_dest(),
            max_age: default_max_age(),
            log: LogConfig::default(),
        }
    }
}

impl Config {
    /// Location of the config file for a client directory
    pub fn default_path(client_dir: &Path) -> PathBuf {
        client_dir.join(CONFIG_FILE_NAME)
    }

    /// Load configuration from a TOML file.
    ///
    /// A missing file yields the defaults; an unreadable or malformed one is an error.
    pub fn from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Config::default());
        }
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Persist the configuration as TOML.
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Apply `TIRISGARDE_*` environment variables.
    pub fn apply_env(&mut self) -> Result<()> {
        self.apply_env_from(|key| std::env::var(key).ok())
    }

    fn apply_env_from<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(dest) = lookup(ENV_DEST).filter(|v| !v.is_empty()) {
            self.dest = PathBuf::from(dest);
        }

        if let Some(max_age) = lookup(ENV_MAX_AGE).filter(|v| !v.is_empty()) {
            self.max_age = max_age.trim().parse().map_err(|_| {
                BackupError::Config(format!(
                    "{} must be a non-negative number of days, got {:?}",
                    ENV_MAX_AGE, max_age
                ))
            })?;
        }

        if let Some(level) = lookup(ENV_LOG_LEVEL).filter(|v| !v.is_empty()) {
            self.log.level = level;
        }

        Ok(())
    }

    /// Apply command-line overrides.
    pub fn apply_overrides(&mut self, overrides: &Overrides) {
        if let Some(dest) = &overrides.dest {
            self.dest = dest.clone();
        }
        if let Some(max_age) = overrides.max_age {
            self.max_age = max_age;
        }
        if let Some(level) = &overrides.log_level {
            self.log.level = level.clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_missing_file_gives_defaults() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let config = Config::from_file(&Config::default_path(temp_dir.path()))?;
        assert_eq!(config, Config::default());
        assert_eq!(config.max_age, 30);
        assert_eq!(config.dest, PathBuf::from("WTF-Backup"));
        Ok(())
    }

    #[test]
    fn test_partial_file_fills_defaults() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let path = Config::default_path(temp_dir.path());
        std::fs::write(&path, "max-age = 7\n")?;

        let config = Config::from_file(&path)?;
        assert_eq!(config.max_age, 7);
        assert_eq!(config.dest, default_dest());
        assert_eq!(config.log.level, "info");
        Ok(())
    }

    #[test]
    fn test_malformed_file_is_an_error() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let path = Config::default_path(temp_dir.path());
        std::fs::write(&path, "max-age = \"soon\"\n")?;

        assert!(matches!(
            Config::from_file(&path),
            Err(BackupError::TomlParse(_))
        ));
        Ok(())
    }

    #[test]
    fn test_save_round_trip() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let path = Config::default_path(temp_dir.path());

        let config = Config {
            dest: PathBuf::from("/mnt/backups/wtf"),
            max_age: 90,
            log: LogConfig {
                level: "debug".to_string(),
            },
        };
        config.save(&path)?;

        let saved = std::fs::read_to_string(&path)?;
        assert!(saved.contains("max-age = 90"));
        assert_eq!(Config::from_file(&path)?, config);
        Ok(())
    }

    #[test]
    fn test_layer_precedence() -> Result<()> {
        let mut config = Config {
            dest: PathBuf::from("from-file"),
            max_age: 10,
            log: LogConfig::default(),
        };

        config.apply_env_from(env(&[(ENV_DEST, "from-env"), (ENV_MAX_AGE, "20")]))?;
        assert_eq!(config.dest, PathBuf::from("from-env"));
        assert_eq!(config.max_age, 20);

        config.apply_overrides(&Overrides {
            max_age: Some(5),
            ..Default::default()
        });
        assert_eq!(config.dest, PathBuf::from("from-env"));
        assert_eq!(config.max_age, 5);
        Ok(())
    }

    #[test]
    fn test_invalid_env_max_age() {
        let mut config = Config::default();
        let err = config
            .apply_env_from(env(&[(ENV_MAX_AGE, "-3")]))
            .unwrap_err();
        assert!(matches!(err, BackupError::Config(_)));
    }

    #[test]
    fn test_empty_env_values_are_ignored() -> Result<()> {
        let mut config = Config::default();
        config.apply_env_from(env(&[(ENV_DEST, ""), (ENV_LOG_LEVEL, "")]))?;
        assert_eq!(config, Config::default());
        Ok(())
    }
}
