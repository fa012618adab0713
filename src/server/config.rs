//! Configuration loading for orreryd.
//!
//! Configuration is loaded from TOML files with the following resolution order:
//! 1. `--config <path>` (CLI flag)
//! 2. `~/.orrery/config.toml` (user)
//! 3. `/etc/orrery/config.toml` (system)
//!
//! A missing file is not an error — every option has a default — and
//! recognized `ORRERY_*` environment variables override whatever the
//! file said, so a container deployment needs no file at all.

use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::cache::CachePolicy;
use crate::horizons::DEFAULT_HORIZONS_URL;
use crate::{OrreryError, Result};

/// Server configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub horizons: HorizonsConfig,
    #[serde(default)]
    pub cache: CacheConfig,
}

/// Network configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Address to bind to (default: 127.0.0.1:9770).
    #[serde(default = "default_address")]
    pub address: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            address: default_address(),
        }
    }
}

fn default_address() -> String {
    "127.0.0.1:9770".to_string()
}

/// Upstream endpoint configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct HorizonsConfig {
    /// Horizons API base URL.
    #[serde(default = "default_horizons_url")]
    pub base_url: String,
}

impl Default for HorizonsConfig {
    fn default() -> Self {
        Self {
            base_url: default_horizons_url(),
        }
    }
}

fn default_horizons_url() -> String {
    DEFAULT_HORIZONS_URL.to_string()
}

/// Cache tuning. All durations in milliseconds; a TTL of 0 disables
/// the corresponding cache (every request refreshes synchronously).
#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    /// Multi-body snapshot TTL (default: 120000).
    #[serde(default = "default_ephemeris_ttl_ms")]
    pub ephemeris_ttl_ms: u64,
    /// Stale-while-revalidate window (default: half the TTL).
    #[serde(default)]
    pub stale_window_ms: Option<u64>,
    /// Prewarm interval (default: max(30000, 80% of the TTL)).
    #[serde(default)]
    pub prewarm_interval_ms: Option<u64>,
    /// Single-body TTL (default: 180000).
    #[serde(default = "default_body_ttl_ms")]
    pub body_ttl_ms: u64,
    /// Shared snapshot-mirror directory. Absent = memory-only mode.
    #[serde(default)]
    pub shared_store_dir: Option<PathBuf>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ephemeris_ttl_ms: default_ephemeris_ttl_ms(),
            stale_window_ms: None,
            prewarm_interval_ms: None,
            body_ttl_ms: default_body_ttl_ms(),
            shared_store_dir: None,
        }
    }
}

fn default_ephemeris_ttl_ms() -> u64 {
    120_000
}

fn default_body_ttl_ms() -> u64 {
    180_000
}

impl Config {
    /// Load configuration from the standard locations, then apply
    /// environment overrides.
    pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
        let mut config = match Self::resolve_config_path(explicit_path)? {
            Some(path) => {
                let content = fs::read_to_string(&path).map_err(|e| {
                    OrreryError::Configuration(format!("failed to read config file {path:?}: {e}"))
                })?;
                toml::from_str(&content).map_err(|e| {
                    OrreryError::Configuration(format!("failed to parse config file {path:?}: {e}"))
                })?
            }
            None => Config::default(),
        };
        config.apply_env()?;
        Ok(config)
    }

    /// Resolve the config file path. `Ok(None)` means "use defaults".
    fn resolve_config_path(explicit: Option<&Path>) -> Result<Option<PathBuf>> {
        if let Some(path) = explicit {
            if path.exists() {
                return Ok(Some(path.to_path_buf()));
            }
            return Err(OrreryError::Configuration(format!(
                "config file not found: {path:?}"
            )));
        }

        if let Some(home) = dirs::home_dir() {
            let user_config = home.join(".orrery").join("config.toml");
            if user_config.exists() {
                return Ok(Some(user_config));
            }
        }

        let system_config = PathBuf::from("/etc/orrery/config.toml");
        if system_config.exists() {
            return Ok(Some(system_config));
        }

        Ok(None)
    }

    /// Apply `ORRERY_*` environment variable overrides.
    fn apply_env(&mut self) -> Result<()> {
        if let Ok(address) = std::env::var("ORRERY_ADDRESS") {
            self.server.address = address;
        }
        if let Ok(url) = std::env::var("ORRERY_HORIZONS_URL") {
            self.horizons.base_url = url;
        }
        if let Some(ttl) = env_ms("ORRERY_EPHEMERIS_TTL_MS")? {
            self.cache.ephemeris_ttl_ms = ttl;
        }
        if let Some(window) = env_ms("ORRERY_STALE_WINDOW_MS")? {
            self.cache.stale_window_ms = Some(window);
        }
        if let Some(interval) = env_ms("ORRERY_PREWARM_INTERVAL_MS")? {
            self.cache.prewarm_interval_ms = Some(interval);
        }
        if let Some(ttl) = env_ms("ORRERY_BODY_TTL_MS")? {
            self.cache.body_ttl_ms = ttl;
        }
        if let Ok(dir) = std::env::var("ORRERY_SHARED_STORE_DIR") {
            self.cache.shared_store_dir = if dir.is_empty() {
                None
            } else {
                Some(PathBuf::from(dir))
            };
        }
        Ok(())
    }

    /// Policy for the multi-body snapshot cache.
    pub fn snapshot_policy(&self) -> CachePolicy {
        let mut policy = CachePolicy::new(Duration::from_millis(self.cache.ephemeris_ttl_ms));
        if let Some(window) = self.cache.stale_window_ms {
            policy = policy.stale_window(Duration::from_millis(window));
        }
        if let Some(interval) = self.cache.prewarm_interval_ms {
            policy = policy.prewarm_interval(Duration::from_millis(interval));
        }
        policy
    }

    /// Policy for the single-body cache.
    pub fn body_policy(&self) -> CachePolicy {
        CachePolicy::new(Duration::from_millis(self.cache.body_ttl_ms))
    }
}

fn env_ms(name: &str) -> Result<Option<u64>> {
    match std::env::var(name) {
        Ok(value) => value.parse::<u64>().map(Some).map_err(|_| {
            OrreryError::Configuration(format!("{name} must be an integer, got '{value}'"))
        }),
        Err(_) => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_has_expected_values() {
        let config = Config::default();
        assert_eq!(config.server.address, "127.0.0.1:9770");
        assert_eq!(config.cache.ephemeris_ttl_ms, 120_000);
        assert_eq!(config.cache.body_ttl_ms, 180_000);
        assert!(config.cache.shared_store_dir.is_none());
        assert!(config.horizons.base_url.contains("jpl.nasa.gov"));
    }

    #[test]
    fn parse_minimal_config() {
        let toml = r#"
            [server]
            address = "0.0.0.0:9770"
        "#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.server.address, "0.0.0.0:9770");
        // Defaults preserved
        assert_eq!(config.cache.ephemeris_ttl_ms, 120_000);
    }

    #[test]
    fn parse_full_config() {
        let toml = r#"
            [server]
            address = "127.0.0.1:9770"

            [horizons]
            base_url = "http://localhost:8080/horizons.api"

            [cache]
            ephemeris_ttl_ms = 60000
            stale_window_ms = 20000
            prewarm_interval_ms = 45000
            body_ttl_ms = 90000
            shared_store_dir = "/var/cache/orrery"
        "#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.cache.ephemeris_ttl_ms, 60_000);
        assert_eq!(config.cache.stale_window_ms, Some(20_000));
        assert_eq!(
            config.cache.shared_store_dir,
            Some(PathBuf::from("/var/cache/orrery"))
        );
        assert_eq!(
            config.horizons.base_url,
            "http://localhost:8080/horizons.api"
        );
    }

    #[test]
    fn snapshot_policy_derives_defaults() {
        let config = Config::default();
        let policy = config.snapshot_policy();
        assert_eq!(policy.ttl, Duration::from_secs(120));
        assert_eq!(policy.stale_window, Duration::from_secs(60));
        assert_eq!(policy.prewarm_interval, Duration::from_secs(96));
    }

    #[test]
    fn snapshot_policy_honors_overrides() {
        let mut config = Config::default();
        config.cache.stale_window_ms = Some(15_000);
        config.cache.prewarm_interval_ms = Some(40_000);
        let policy = config.snapshot_policy();
        assert_eq!(policy.stale_window, Duration::from_secs(15));
        assert_eq!(policy.prewarm_interval, Duration::from_secs(40));
    }

    #[test]
    fn explicit_missing_config_is_an_error() {
        let result = Config::load(Some(Path::new("/nonexistent/config.toml")));
        assert!(result.is_err());
        let err = result.unwrap_err().to_string();
        assert!(err.contains("config file not found"));
    }
}
