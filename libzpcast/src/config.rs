//! Configuration management for Zpcast
//!
//! Non-secret settings come from a TOML file with environment overrides.
//! Secrets (the ZpDIC API key and the Bluesky password) are only ever read
//! from the environment, after `.env` has been loaded.

use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use crate::error::{ConfigError, Result};
use crate::format::LinkTarget;

pub const ENV_CONFIG_PATH: &str = "ZPCAST_CONFIG";
pub const ENV_MODE: &str = "ZPCAST_MODE";
pub const ENV_API_KEY: &str = "ZPDIC_API_KEY";
pub const ENV_DICTIONARY_ID: &str = "ZPDIC_DICTIONARY_ID";
pub const ENV_IDENTIFIER: &str = "BSKY_IDENTIFIER";
pub const ENV_PASSWORD: &str = "BSKY_PASSWORD";

/// Runtime the bot is deployed in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunMode {
    /// Post and exit; no read endpoint
    #[default]
    Local,
    /// Cache every post and serve the last one over HTTP
    Serve,
}

impl FromStr for RunMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "local" => Ok(RunMode::Local),
            "serve" => Ok(RunMode::Serve),
            _ => Err(format!(
                "Invalid mode: '{}'. Valid options: local, serve",
                s
            )),
        }
    }
}

impl std::fmt::Display for RunMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RunMode::Local => write!(f, "local"),
            RunMode::Serve => write!(f, "serve"),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub mode: RunMode,
    pub zpdic: ZpdicConfig,
    pub bluesky: BlueskyConfig,
    pub cache: CacheConfig,
    pub server: ServerConfig,
    pub schedule: ScheduleConfig,
    pub http: HttpConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ZpdicConfig {
    /// API root, e.g. `https://zpdic.ziphil.com/api/v0`
    pub base_url: String,
    /// Public site root used to build entry links
    pub link_base: String,
    pub dictionary_id: String,
}

impl Default for ZpdicConfig {
    fn default() -> Self {
        Self {
            base_url: "https://zpdic.ziphil.com/api/v0".to_string(),
            link_base: "https://zpdic.ziphil.com".to_string(),
            dictionary_id: "633".to_string(),
        }
    }
}

impl ZpdicConfig {
    pub fn link_target(&self) -> LinkTarget {
        LinkTarget::new(&self.link_base, &self.dictionary_id)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BlueskyConfig {
    /// PDS root, e.g. `https://bsky.social`
    pub service: String,
    pub identifier: String,
    /// Title shown on the link preview card
    pub embed_title: String,
}

impl Default for BlueskyConfig {
    fn default() -> Self {
        Self {
            service: "https://bsky.social".to_string(),
            identifier: "vaessenzlaendiskj.bsky.social".to_string(),
            embed_title: "ZpDIC Online".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Write the last post to the cache in local mode too
    pub enabled: bool,
    pub path: String,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            path: "~/.local/share/zpcast/cache.db".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0:8000".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScheduleConfig {
    /// Time between runs, humantime syntax (`1h`, `30m`)
    pub interval: String,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            interval: "1h".to_string(),
        }
    }
}

impl ScheduleConfig {
    pub fn interval(&self) -> Result<Duration> {
        let duration = humantime::parse_duration(&self.interval).map_err(|e| {
            ConfigError::InvalidValue {
                field: "schedule.interval".to_string(),
                message: e.to_string(),
            }
        })?;

        if duration.is_zero() {
            return Err(ConfigError::InvalidValue {
                field: "schedule.interval".to_string(),
                message: "interval must be greater than zero".to_string(),
            }
            .into());
        }

        Ok(duration)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Per-request timeout for every outbound call
    pub timeout_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self { timeout_secs: 30 }
    }
}

impl HttpConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Config {
    /// Load configuration from the default location, then apply env overrides
    ///
    /// A missing file at the default location yields the defaults; a file
    /// named explicitly through `ZPCAST_CONFIG` must exist.
    pub fn load() -> Result<Self> {
        let (config_path, explicit) = resolve_config_path()?;

        let mut config = if explicit || config_path.exists() {
            Self::load_from_path(&config_path)?
        } else {
            tracing::debug!(
                "No config file at {}, using defaults",
                config_path.display()
            );
            Self::default()
        };

        config.apply_env_overrides()?;
        Ok(config)
    }

    /// Load configuration from a specific path
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::ReadError)?;
        let config: Config = toml::from_str(&content).map_err(ConfigError::ParseError)?;
        Ok(config)
    }

    /// Apply `ZPDIC_DICTIONARY_ID`, `BSKY_IDENTIFIER` and `ZPCAST_MODE`
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        if let Some(id) = non_empty_env(ENV_DICTIONARY_ID) {
            self.zpdic.dictionary_id = id;
        }
        if let Some(identifier) = non_empty_env(ENV_IDENTIFIER) {
            self.bluesky.identifier = identifier;
        }
        if let Some(mode) = non_empty_env(ENV_MODE) {
            self.mode = mode.parse().map_err(|message| ConfigError::InvalidValue {
                field: ENV_MODE.to_string(),
                message,
            })?;
        }
        Ok(())
    }

    /// Whether runs should write the cache slot
    pub fn cache_enabled(&self) -> bool {
        self.mode == RunMode::Serve || self.cache.enabled
    }

    /// Check the settings every run depends on
    ///
    /// The schedule is only read by the daemon, which checks it through
    /// [`ScheduleConfig::interval`].
    pub fn validate(&self) -> Result<()> {
        if self.zpdic.dictionary_id.trim().is_empty() {
            return Err(ConfigError::MissingField("zpdic.dictionary_id".to_string()).into());
        }
        if self.bluesky.identifier.trim().is_empty() {
            return Err(ConfigError::MissingField("bluesky.identifier".to_string()).into());
        }
        for (field, url) in [
            ("zpdic.base_url", &self.zpdic.base_url),
            ("bluesky.service", &self.bluesky.service),
        ] {
            if reqwest::Url::parse(url).is_err() {
                return Err(ConfigError::InvalidValue {
                    field: field.to_string(),
                    message: format!("'{}' is not a valid URL", url),
                }
                .into());
            }
        }
        Ok(())
    }
}

/// Secrets needed for a run
pub struct Credentials {
    pub zpdic_api_key: SecretString,
    pub bluesky_password: SecretString,
}

impl Credentials {
    /// Read both secrets from the environment
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::MissingEnv` naming the first variable that is
    /// unset or empty.
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            zpdic_api_key: required_secret(ENV_API_KEY)?,
            bluesky_password: required_secret(ENV_PASSWORD)?,
        })
    }

    /// Only the dictionary key, for runs that never reach Bluesky
    pub fn api_key_from_env() -> Result<SecretString> {
        required_secret(ENV_API_KEY)
    }
}

fn required_secret(name: &str) -> Result<SecretString> {
    non_empty_env(name)
        .map(SecretString::from)
        .ok_or_else(|| ConfigError::MissingEnv(name.to_string()).into())
}

fn non_empty_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

/// Outcome of loading a `.env` file: the file read, or `None` when absent
pub type DotenvResult = std::result::Result<Option<PathBuf>, dotenvy::Error>;

/// Load `.env` from the working directory or its parents, if present
///
/// Runs before logging is installed, so the outcome is returned for
/// [`log_dotenv`] to report afterwards.
pub fn load_dotenv() -> DotenvResult {
    found_or_absent(dotenvy::dotenv())
}

/// Load a specific env file, if it exists
pub fn load_dotenv_from(path: &Path) -> DotenvResult {
    found_or_absent(dotenvy::from_path(path).map(|()| path.to_path_buf()))
}

fn found_or_absent(result: dotenvy::Result<PathBuf>) -> DotenvResult {
    match result {
        Ok(path) => Ok(Some(path)),
        Err(e) if e.not_found() => Ok(None),
        Err(e) => Err(e),
    }
}

pub fn log_dotenv(result: &DotenvResult) {
    match result {
        Ok(Some(path)) => tracing::debug!("Loaded environment from {}", path.display()),
        Ok(None) => {}
        Err(e) => tracing::warn!("Failed to load .env: {}", e),
    }
}

/// Resolve the configuration file path under the XDG config directory
///
/// Returns the path and whether it was named explicitly.
pub fn resolve_config_path() -> Result<(PathBuf, bool)> {
    if let Ok(path) = std::env::var(ENV_CONFIG_PATH) {
        return Ok((PathBuf::from(shellexpand::tilde(&path).to_string()), true));
    }

    let config_dir = dirs::config_dir()
        .ok_or_else(|| ConfigError::MissingField("config directory".to_string()))?;

    Ok((config_dir.join("zpcast").join("config.toml"), false))
}
