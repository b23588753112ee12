//! Configuration management for pbpcrawl using the prefer crate.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::crawl::{RetryPolicy, DEFAULT_ATTEMPTS_PER_GAME, DEFAULT_MAX_CONSECUTIVE_FAILURES};
use crate::models::{Season, SeasonError};
use crate::repository::Manifest;
use crate::scrapers::Pacing;

/// Name used for config file discovery (`pbpcrawl.toml`, `pbpcrawl.yaml`, ...).
pub const CONFIG_NAME: &str = "pbpcrawl";

/// Default exports subdirectory name.
const EXPORT_SUBDIR: &str = "raw";

/// Errors from loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse {format} config {path}: {message}")]
    Parse {
        path: PathBuf,
        format: &'static str,
        message: String,
    },
    #[error("Invalid configuration: {0}")]
    Invalid(String),
    #[error(transparent)]
    Season(#[from] SeasonError),
}

/// Application settings.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Base data directory. Holds the manifest.
    pub data_dir: PathBuf,
    /// Directory export files are written to.
    pub export_dir: PathBuf,
    /// User agent override. `"impersonate"` picks a random browser agent.
    pub user_agent: Option<String>,
    /// Request timeout in seconds.
    pub request_timeout: u64,
    /// Lower bound of the pause before each step, in milliseconds.
    pub delay_min_ms: u64,
    /// Upper bound of the pause before each step, in milliseconds.
    pub delay_max_ms: u64,
    /// Attempts at one game when the failure is transient.
    pub attempts_per_game: u32,
    /// Consecutive failed games that stop a run.
    pub max_consecutive_failures: u32,
    /// Write export files through a temp file and rename.
    pub atomic_writes: bool,
    /// Season being crawled.
    pub season: Season,
}

impl Default for Settings {
    fn default() -> Self {
        let data_dir = PathBuf::from("data");
        Self {
            export_dir: data_dir.join(EXPORT_SUBDIR),
            data_dir,
            user_agent: None,
            request_timeout: 30,
            delay_min_ms: 1000,
            delay_max_ms: 3000,
            attempts_per_game: DEFAULT_ATTEMPTS_PER_GAME,
            max_consecutive_failures: DEFAULT_MAX_CONSECUTIVE_FAILURES,
            atomic_writes: false,
            season: Season::default(),
        }
    }
}

impl Settings {
    pub fn manifest_path(&self) -> PathBuf {
        Manifest::default_path(&self.data_dir, &self.season)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout)
    }

    pub fn pacing(&self) -> Pacing {
        Pacing::from_millis(self.delay_min_ms, self.delay_max_ms)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.attempts_per_game, self.max_consecutive_failures)
    }

    /// Reject settings a crawl cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.delay_min_ms > self.delay_max_ms {
            return Err(ConfigError::Invalid(format!(
                "delay_min_ms ({}) is greater than delay_max_ms ({})",
                self.delay_min_ms, self.delay_max_ms
            )));
        }
        if self.attempts_per_game == 0 {
            return Err(ConfigError::Invalid(
                "attempts_per_game must be at least 1".to_string(),
            ));
        }
        if self.max_consecutive_failures == 0 {
            return Err(ConfigError::Invalid(
                "max_consecutive_failures must be at least 1".to_string(),
            ));
        }
        if self.request_timeout == 0 {
            return Err(ConfigError::Invalid(
                "request_timeout must be at least 1 second".to_string(),
            ));
        }
        self.season.validate()?;
        Ok(())
    }

    /// Ensure the data and export directories exist.
    pub fn ensure_directories(&self) -> std::io::Result<()> {
        for (path, label) in [(&self.data_dir, "data"), (&self.export_dir, "export")] {
            if let Err(e) = std::fs::create_dir_all(path) {
                tracing::error!(
                    "Failed to create {} directory {}: {}",
                    label,
                    path.display(),
                    e
                );
                return Err(e);
            }
        }
        Ok(())
    }
}

/// Configuration file structure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Data directory path.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<String>,
    /// Export directory path. Defaults to `raw/` under the data directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub export_dir: Option<String>,
    /// User agent string.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
    /// Request timeout in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_timeout: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delay_min_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delay_max_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attempts_per_game: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_consecutive_failures: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub atomic_writes: Option<bool>,
    /// Season table. Missing keys fall back to the 2022-23 season.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub season: Option<Season>,
    /// Path to the config file this was loaded from (not serialized).
    #[serde(skip)]
    pub source_path: Option<PathBuf>,
}

impl Config {
    /// Load configuration using prefer crate for discovery.
    /// Falls back to defaults when no pbpcrawl config file is found.
    pub async fn load() -> Result<Self, ConfigError> {
        match prefer::load(CONFIG_NAME).await {
            Ok(pref_config) => match pref_config.source_path() {
                Some(path) => Self::load_from_path(path).await,
                None => Ok(Self::default()),
            },
            Err(e) => {
                tracing::debug!("No config file discovered: {}", e);
                Ok(Self::default())
            }
        }
    }

    /// Load configuration from a specific file path.
    /// Supports JSON, TOML and YAML based on file extension.
    pub async fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
        let contents =
            tokio::fs::read_to_string(path)
                .await
                .map_err(|source| ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                })?;

        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("json");
        let parse_error = |format: &'static str, message: String| ConfigError::Parse {
            path: path.to_path_buf(),
            format,
            message,
        };

        let mut config: Config = match ext {
            "toml" => toml::from_str(&contents).map_err(|e| parse_error("TOML", e.to_string()))?,
            "yaml" | "yml" => {
                serde_yaml::from_str(&contents).map_err(|e| parse_error("YAML", e.to_string()))?
            }
            _ => serde_json::from_str(&contents).map_err(|e| parse_error("JSON", e.to_string()))?,
        };

        tracing::debug!("Loaded config from {}", path.display());
        config.source_path = Some(path.to_path_buf());
        Ok(config)
    }

    /// Get the base directory for resolving relative paths.
    pub fn base_dir(&self) -> Option<PathBuf> {
        self.source_path
            .as_ref()
            .and_then(|p| p.parent().map(|p| p.to_path_buf()))
    }

    /// Resolve a path that may be relative to the config file.
    /// - Absolute paths are returned as-is
    /// - Paths starting with ~ are expanded
    /// - Relative paths are resolved relative to `base_dir`
    pub fn resolve_path(&self, path_str: &str, base_dir: &Path) -> PathBuf {
        let expanded = shellexpand::tilde(path_str);
        let path = Path::new(expanded.as_ref());

        if path.is_absolute() {
            path.to_path_buf()
        } else {
            base_dir.join(path)
        }
    }

    /// Apply configuration to settings.
    pub fn apply_to_settings(&self, settings: &mut Settings, base_dir: &Path) {
        if let Some(ref data_dir) = self.data_dir {
            settings.data_dir = self.resolve_path(data_dir, base_dir);
            settings.export_dir = settings.data_dir.join(EXPORT_SUBDIR);
        }
        if let Some(ref export_dir) = self.export_dir {
            settings.export_dir = self.resolve_path(export_dir, base_dir);
        }
        if let Some(ref user_agent) = self.user_agent {
            settings.user_agent = Some(user_agent.clone());
        }
        if let Some(timeout) = self.request_timeout {
            settings.request_timeout = timeout;
        }
        if let Some(min) = self.delay_min_ms {
            settings.delay_min_ms = min;
        }
        if let Some(max) = self.delay_max_ms {
            settings.delay_max_ms = max;
        }
        if let Some(attempts) = self.attempts_per_game {
            settings.attempts_per_game = attempts;
        }
        if let Some(threshold) = self.max_consecutive_failures {
            settings.max_consecutive_failures = threshold;
        }
        if let Some(atomic) = self.atomic_writes {
            settings.atomic_writes = atomic;
        }
        if let Some(ref season) = self.season {
            settings.season = season.clone();
        }
    }
}

/// Options for loading settings.
#[derive(Debug, Clone, Default)]
pub struct LoadOptions {
    /// Explicit config file path (overrides auto-discovery).
    pub config_path: Option<PathBuf>,
    /// Data directory override (--data-dir flag).
    pub data_dir: Option<PathBuf>,
    /// Export directory override (--export-dir flag).
    pub export_dir: Option<PathBuf>,
}

fn current_dir() -> PathBuf {
    std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
}

/// Load and validate settings.
/// Precedence: command-line overrides, then the config file, then defaults.
pub async fn load_settings(options: LoadOptions) -> Result<(Settings, Config), ConfigError> {
    let config = match options.config_path {
        Some(ref path) => Config::load_from_path(path).await?,
        None => Config::load().await?,
    };

    let mut settings = Settings::default();
    let base_dir = config.base_dir().unwrap_or_else(current_dir);
    config.apply_to_settings(&mut settings, &base_dir);

    // Command-line paths are relative to the working directory.
    let cwd = current_dir();
    if let Some(ref data_dir) = options.data_dir {
        settings.data_dir = config.resolve_path(&data_dir.to_string_lossy(), &cwd);
        if config.export_dir.is_none() {
            settings.export_dir = settings.data_dir.join(EXPORT_SUBDIR);
        }
    }
    if let Some(ref export_dir) = options.export_dir {
        settings.export_dir = config.resolve_path(&export_dir.to_string_lossy(), &cwd);
    }

    settings.validate()?;
    Ok((settings, config))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_defaults_are_valid() {
        let settings = Settings::default();
        assert!(settings.validate().is_ok());
        assert_eq!(settings.export_dir, PathBuf::from("data/raw"));
        assert_eq!(settings.pacing().min(), Duration::from_millis(1000));
        assert_eq!(settings.pacing().max(), Duration::from_millis(3000));
        assert_eq!(settings.retry_policy(), RetryPolicy::default());
        assert_eq!(
            settings.manifest_path(),
            PathBuf::from("data/manifest-S2223.json")
        );
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let inverted = Settings {
            delay_min_ms: 5000,
            delay_max_ms: 100,
            ..Default::default()
        };
        assert!(matches!(inverted.validate(), Err(ConfigError::Invalid(_))));

        let no_attempts = Settings {
            attempts_per_game: 0,
            ..Default::default()
        };
        assert!(no_attempts.validate().is_err());

        let no_threshold = Settings {
            max_consecutive_failures: 0,
            ..Default::default()
        };
        assert!(no_threshold.validate().is_err());

        let mut bad_season = Settings::default();
        bad_season.season.label = "../x".to_string();
        assert!(matches!(
            bad_season.validate(),
            Err(ConfigError::Season(SeasonError::InvalidLabel(_)))
        ));
    }

    #[tokio::test]
    async fn test_load_toml_with_partial_season() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("pbpcrawl.toml");
        std::fs::write(
            &path,
            r#"
data_dir = "store"
delay_min_ms = 10
delay_max_ms = 20
atomic_writes = true

[season]
label = "2324"
base_game_id = 22300001
"#,
        )
        .unwrap();

        let config = Config::load_from_path(&path).await.unwrap();
        let mut settings = Settings::default();
        config.apply_to_settings(&mut settings, &config.base_dir().unwrap());

        assert_eq!(settings.data_dir, dir.path().join("store"));
        assert_eq!(settings.export_dir, dir.path().join("store").join("raw"));
        assert!(settings.atomic_writes);
        assert_eq!(settings.season.label, "2324");
        assert_eq!(settings.season.base_game_id, 22_300_001);
        assert_eq!(settings.season.total_games, 1230);
        assert_eq!(settings.season.url_suffix, "/game-charts");
    }

    #[tokio::test]
    async fn test_load_yaml_and_json() {
        let dir = tempdir().unwrap();

        let yaml = dir.path().join("pbpcrawl.yaml");
        std::fs::write(&yaml, "export_dir: /tmp/pbp-out\nattempts_per_game: 5\n").unwrap();
        let config = Config::load_from_path(&yaml).await.unwrap();
        assert_eq!(config.export_dir.as_deref(), Some("/tmp/pbp-out"));
        assert_eq!(config.attempts_per_game, Some(5));

        let json = dir.path().join("pbpcrawl.json");
        std::fs::write(&json, r#"{"user_agent": "impersonate"}"#).unwrap();
        let config = Config::load_from_path(&json).await.unwrap();
        assert_eq!(config.user_agent.as_deref(), Some("impersonate"));
        assert_eq!(config.source_path.as_deref(), Some(json.as_path()));
    }

    #[tokio::test]
    async fn test_load_reports_parse_errors() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("pbpcrawl.toml");
        std::fs::write(&path, "delay_min_ms = \"soon\"").unwrap();

        let err = Config::load_from_path(&path).await.unwrap_err();
        assert!(matches!(err, ConfigError::Parse { format: "TOML", .. }));

        let missing = Config::load_from_path(&dir.path().join("nope.toml")).await;
        assert!(matches!(missing, Err(ConfigError::Read { .. })));
    }

    #[test]
    fn test_resolve_path() {
        let config = Config::default();
        let base = Path::new("/etc/pbp");
        assert_eq!(
            config.resolve_path("/var/data", base),
            PathBuf::from("/var/data")
        );
        assert_eq!(
            config.resolve_path("data", base),
            PathBuf::from("/etc/pbp/data")
        );
        assert!(!config.resolve_path("~/data", base).starts_with("~"));
    }

    #[tokio::test]
    async fn test_command_line_overrides() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("pbpcrawl.toml");
        std::fs::write(&path, "data_dir = \"from-config\"\n").unwrap();
        let data = dir.path().join("cli-data");

        let (settings, _) = load_settings(LoadOptions {
            config_path: Some(path.clone()),
            data_dir: Some(data.clone()),
            export_dir: None,
        })
        .await
        .unwrap();
        assert_eq!(settings.data_dir, data);
        assert_eq!(settings.export_dir, data.join("raw"));

        let export = dir.path().join("cli-export");
        let (settings, _) = load_settings(LoadOptions {
            config_path: Some(path),
            data_dir: None,
            export_dir: Some(export.clone()),
        })
        .await
        .unwrap();
        assert_eq!(settings.data_dir, dir.path().join("from-config"));
        assert_eq!(settings.export_dir, export);
    }

    #[tokio::test]
    async fn test_load_settings_validates() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("pbpcrawl.toml");
        std::fs::write(&path, "delay_min_ms = 9000\n").unwrap();

        let result = load_settings(LoadOptions {
            config_path: Some(path),
            ..Default::default()
        })
        .await;
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }
}
