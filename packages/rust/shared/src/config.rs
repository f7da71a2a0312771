//! Application configuration for steamlib.
//!
//! User config lives at `~/.steamlib/steamlib.toml`.
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{Result, SteamError};
use crate::types::{DEFAULT_PAGE_SIZE, DEFAULT_TIME_ZONE, Environment};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "steamlib.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".steamlib";

// ---------------------------------------------------------------------------
// Config structs (matching steamlib.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Note service connection settings.
    #[serde(default)]
    pub remote: RemoteConfig,

    /// Aggregation pipeline tuning.
    #[serde(default)]
    pub aggregate: AggregateConfig,
}

/// `[remote]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteConfig {
    /// Name of the env var holding the auth token (never store the token itself).
    #[serde(default = "default_token_env")]
    pub token_env: String,

    /// Which deployment to target.
    #[serde(default)]
    pub environment: Environment,

    /// Base URL of the sandbox note store.
    #[serde(default = "default_sandbox_url")]
    pub sandbox_url: String,

    /// Base URL of the production note store.
    #[serde(default = "default_production_url")]
    pub production_url: String,

    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            token_env: default_token_env(),
            environment: Environment::default(),
            sandbox_url: default_sandbox_url(),
            production_url: default_production_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl RemoteConfig {
    /// Base URL for the configured environment, normalized to end with `/`
    /// so relative endpoint paths join underneath it.
    pub fn base_url(&self) -> Result<Url> {
        let raw = match self.environment {
            Environment::Sandbox => &self.sandbox_url,
            Environment::Production => &self.production_url,
        };

        let mut url = Url::parse(raw).map_err(|e| {
            SteamError::config(format!("invalid {} url '{raw}': {e}", self.environment))
        })?;
        if !url.path().ends_with('/') {
            let path = format!("{}/", url.path());
            url.set_path(&path);
        }
        Ok(url)
    }
}

fn default_token_env() -> String {
    "EVERNOTE_DEV_TOKEN".into()
}
fn default_sandbox_url() -> String {
    "https://sandbox.evernote.com/api/v1/".into()
}
fn default_production_url() -> String {
    "https://www.evernote.com/api/v1/".into()
}
fn default_timeout_secs() -> u64 {
    30
}

/// `[aggregate]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggregateConfig {
    /// Notes requested per listing page.
    #[serde(default = "default_page_size")]
    pub page_size: u32,

    /// Follow listing pages past the first one.
    #[serde(default)]
    pub all_pages: bool,

    /// Cap on concurrent remote calls (0 = unbounded).
    #[serde(default)]
    pub max_in_flight: usize,

    /// Fetch each tag once per aggregation instead of once per note.
    #[serde(default)]
    pub dedupe_tags: bool,

    /// Retries for transient failures on each remote call.
    #[serde(default)]
    pub max_retries: u32,

    /// Initial backoff between retries, doubled per attempt.
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,

    /// Time zone sent with note filters.
    #[serde(default = "default_time_zone")]
    pub time_zone: String,
}

impl Default for AggregateConfig {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
            all_pages: false,
            max_in_flight: 0,
            dedupe_tags: false,
            max_retries: 0,
            retry_backoff_ms: default_retry_backoff_ms(),
            time_zone: default_time_zone(),
        }
    }
}

fn default_page_size() -> u32 {
    DEFAULT_PAGE_SIZE
}
fn default_retry_backoff_ms() -> u64 {
    250
}
fn default_time_zone() -> String {
    DEFAULT_TIME_ZONE.into()
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.steamlib/`).
pub fn config_dir() -> Result<PathBuf> {
    let home =
        dirs::home_dir().ok_or_else(|| SteamError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.steamlib/steamlib.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| SteamError::io(path, e))?;

    toml::from_str(&content)
        .map_err(|e| SteamError::config(format!("failed to parse {}: {e}", path.display())))
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| SteamError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content = toml::to_string_pretty(&config).map_err(|e| SteamError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| SteamError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

/// Read the auth token from the env var named in `[remote] token_env`.
pub fn load_token(config: &AppConfig) -> Result<String> {
    let var_name = &config.remote.token_env;
    match std::env::var(var_name) {
        Ok(val) if !val.trim().is_empty() => Ok(val.trim().to_string()),
        _ => Err(SteamError::config(format!(
            "auth token not found. Set the {var_name} environment variable \
             to a developer token for the note service."
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_serializes() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize default config");
        assert!(toml_str.contains("page_size"));
        assert!(toml_str.contains("EVERNOTE_DEV_TOKEN"));
        assert!(toml_str.contains("environment = \"sandbox\""));
    }

    #[test]
    fn config_roundtrip() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize");
        let parsed: AppConfig = toml::from_str(&toml_str).expect("deserialize");
        assert_eq!(parsed.aggregate.page_size, DEFAULT_PAGE_SIZE);
        assert_eq!(parsed.remote.token_env, "EVERNOTE_DEV_TOKEN");
        assert!(!parsed.aggregate.dedupe_tags);
    }

    #[test]
    fn partial_config_fills_defaults() {
        let toml_str = r#"
[remote]
environment = "production"

[aggregate]
all_pages = true
max_in_flight = 8
"#;
        let config: AppConfig = toml::from_str(toml_str).expect("parse");
        assert_eq!(config.remote.environment, Environment::Production);
        assert_eq!(config.remote.timeout_secs, 30);
        assert!(config.aggregate.all_pages);
        assert_eq!(config.aggregate.max_in_flight, 8);
        assert_eq!(config.aggregate.page_size, DEFAULT_PAGE_SIZE);
    }

    #[test]
    fn base_url_follows_environment() {
        let mut remote = RemoteConfig::default();
        assert_eq!(remote.base_url().unwrap().host_str(), Some("sandbox.evernote.com"));

        remote.environment = Environment::Production;
        remote.production_url = "https://notes.example.com/api".into();
        let url = remote.base_url().unwrap();
        assert_eq!(url.as_str(), "https://notes.example.com/api/");
        assert_eq!(url.join("notebooks").unwrap().path(), "/api/notebooks");
    }

    #[test]
    fn invalid_base_url_is_config_error() {
        let remote = RemoteConfig {
            sandbox_url: "not a url".into(),
            ..RemoteConfig::default()
        };
        let err = remote.base_url().unwrap_err();
        assert!(err.to_string().starts_with("config error"));
    }

    #[test]
    fn missing_token_is_reported() {
        let mut config = AppConfig::default();
        // Use a unique env var name to avoid interfering with other tests
        config.remote.token_env = "STEAMLIB_TEST_NONEXISTENT_TOKEN_12345".into();
        let result = load_token(&config);
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("auth token not found"));
    }
}
