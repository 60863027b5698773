// crates/tradedesk-config/src/config.rs
// ============================================================================
// Module: Tradedesk Configuration
// Description: tradedesk.toml model, path resolution, and validation.
// Purpose: Provide one validated configuration value to the CLI.
// Dependencies: serde, thiserror, toml, url
// ============================================================================

//! ## Overview
//! [`TradedeskConfig::load`] resolves the config path (explicit argument,
//! then `TRADEDESK_CONFIG`, then `tradedesk.toml` in the working directory),
//! enforces path and size limits, parses TOML, applies environment overrides,
//! and validates every section.
//!
//! A missing default file yields built-in defaults; a missing explicit file
//! is an error. The gateway password is never read from the file.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;
use std::fs;
use std::path::Path;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;
use url::Url;

// ============================================================================
// SECTION: Limits
// ============================================================================

/// Default config file name resolved in the working directory.
pub const DEFAULT_CONFIG_NAME: &str = "tradedesk.toml";
/// Environment variable naming the config file.
pub const CONFIG_ENV_VAR: &str = "TRADEDESK_CONFIG";
/// Environment variable overriding `gateway.url`.
pub const GATEWAY_URL_ENV_VAR: &str = "TRADEDESK_GATEWAY_URL";
/// Environment variable overriding `gateway.username`.
pub const GATEWAY_USERNAME_ENV_VAR: &str = "TRADEDESK_GATEWAY_USERNAME";
/// Environment variable carrying the gateway password.
pub const GATEWAY_PASSWORD_ENV_VAR: &str = "TRADEDESK_GATEWAY_PASSWORD";
/// Environment variable overriding `output.format`.
pub const OUTPUT_FORMAT_ENV_VAR: &str = "TRADEDESK_CLI_OUTPUT_FORMAT";

/// Maximum config file size in bytes.
pub const MAX_CONFIG_FILE_BYTES: u64 = 1024 * 1024;
/// Maximum length of a single path component.
const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum total path length.
const MAX_TOTAL_PATH_LENGTH: usize = 4096;

/// Default gateway request timeout.
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 5_000;
/// Smallest accepted gateway request timeout.
const MIN_REQUEST_TIMEOUT_MS: u64 = 100;
/// Largest accepted gateway request timeout.
const MAX_REQUEST_TIMEOUT_MS: u64 = 600_000;
/// Default lifecycle poll interval.
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 1_000;
/// Smallest accepted poll interval.
const MIN_POLL_INTERVAL_MS: u64 = 50;
/// Largest accepted poll interval.
const MAX_POLL_INTERVAL_MS: u64 = 60_000;
/// Default lifecycle wait deadline.
pub const DEFAULT_WAIT_TIMEOUT_MS: u64 = 120_000;
/// Largest accepted wait deadline (one day).
const MAX_WAIT_TIMEOUT_MS: u64 = 86_400_000;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Configuration load and validation errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// Reading the file failed.
    #[error("config io error: {0}")]
    Io(String),
    /// The file is not valid TOML for the model.
    #[error("config parse error: {0}")]
    Parse(String),
    /// A value violates a constraint.
    #[error("invalid config: {0}")]
    Invalid(String),
}

// ============================================================================
// SECTION: Model
// ============================================================================

/// Root of `tradedesk.toml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TradedeskConfig {
    /// Remote gateway location and credentials.
    pub gateway: GatewayConfig,
    /// Lifecycle wait defaults.
    pub wait: WaitConfig,
    /// Output rendering.
    pub output: OutputConfig,
    /// Audit event logging.
    pub audit: AuditConfig,
}

/// `[gateway]` section.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GatewayConfig {
    /// Base URL of the gateway.
    pub url: Option<String>,
    /// Basic auth username.
    pub username: Option<String>,
    /// Basic auth password; environment only.
    #[serde(skip)]
    pub password: Option<String>,
    /// Per-request timeout in milliseconds.
    pub request_timeout_ms: u64,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            url: None,
            username: None,
            password: None,
            request_timeout_ms: DEFAULT_REQUEST_TIMEOUT_MS,
        }
    }
}

impl fmt::Debug for GatewayConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GatewayConfig")
            .field("url", &self.url)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("request_timeout_ms", &self.request_timeout_ms)
            .finish()
    }
}

impl GatewayConfig {
    /// Returns the parsed base URL, if configured.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when the URL is malformed or not HTTP(S).
    pub fn base_url(&self) -> Result<Option<Url>, ConfigError> {
        let Some(raw) = self.url.as_deref() else {
            return Ok(None);
        };
        let url = Url::parse(raw)
            .map_err(|err| ConfigError::Invalid(format!("gateway.url is not a valid url: {err}")))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ConfigError::Invalid(format!(
                "gateway.url must use http or https, got {}",
                url.scheme()
            )));
        }
        if url.host_str().is_none() {
            return Err(ConfigError::Invalid("gateway.url must include a host".to_string()));
        }
        Ok(Some(url))
    }

    /// Returns the request timeout.
    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    /// Validates the section.
    fn validate(&self) -> Result<(), ConfigError> {
        self.base_url()?;
        if !(MIN_REQUEST_TIMEOUT_MS ..= MAX_REQUEST_TIMEOUT_MS).contains(&self.request_timeout_ms) {
            return Err(ConfigError::Invalid(format!(
                "gateway.request_timeout_ms must be between {MIN_REQUEST_TIMEOUT_MS} and \
                 {MAX_REQUEST_TIMEOUT_MS}"
            )));
        }
        if self.username.as_deref().is_some_and(str::is_empty) {
            return Err(ConfigError::Invalid("gateway.username must be non-empty".to_string()));
        }
        if self.password.is_some() && self.username.is_none() {
            return Err(ConfigError::Invalid("gateway password requires a username".to_string()));
        }
        Ok(())
    }
}

/// `[wait]` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WaitConfig {
    /// Delay between status queries in milliseconds.
    pub poll_interval_ms: u64,
    /// Overall wait deadline in milliseconds.
    pub timeout_ms: u64,
}

impl Default for WaitConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            timeout_ms: DEFAULT_WAIT_TIMEOUT_MS,
        }
    }
}

impl WaitConfig {
    /// Returns the poll interval.
    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Returns the wait deadline.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Validates the section.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when a bound is violated.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(MIN_POLL_INTERVAL_MS ..= MAX_POLL_INTERVAL_MS).contains(&self.poll_interval_ms) {
            return Err(ConfigError::Invalid(format!(
                "wait.poll_interval_ms must be between {MIN_POLL_INTERVAL_MS} and \
                 {MAX_POLL_INTERVAL_MS}"
            )));
        }
        if self.timeout_ms == 0 || self.timeout_ms > MAX_WAIT_TIMEOUT_MS {
            return Err(ConfigError::Invalid(format!(
                "wait.timeout_ms must be between 1 and {MAX_WAIT_TIMEOUT_MS}"
            )));
        }
        Ok(())
    }
}

/// Output rendering format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-oriented text with YAML for structured payloads.
    #[default]
    Yaml,
    /// Canonical JSON.
    Json,
}

impl FromStr for OutputFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "yaml" => Ok(Self::Yaml),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Invalid(format!(
                "output format must be yaml or json, got '{other}'"
            ))),
        }
    }
}

/// `[output]` section.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputConfig {
    /// Rendering format.
    pub format: OutputFormat,
}

/// `[audit]` section.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AuditConfig {
    /// Emit JSON-lines audit events.
    pub enabled: bool,
    /// Append events to this file instead of stderr.
    pub path: Option<PathBuf>,
}

impl AuditConfig {
    /// Validates the section.
    fn validate(&self) -> Result<(), ConfigError> {
        if let Some(path) = &self.path {
            validate_path(path, "audit.path")?;
            if path.is_dir() {
                return Err(ConfigError::Invalid("audit.path must be a file".to_string()));
            }
        }
        Ok(())
    }
}

// ============================================================================
// SECTION: Loading
// ============================================================================

impl TradedeskConfig {
    /// Loads configuration using the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the file cannot be read or parsed, or a
    /// value fails validation.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        Self::load_with_env(path, |key| std::env::var(key).ok())
    }

    /// Loads configuration using `env` for environment lookups.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the file cannot be read or parsed, or a
    /// value fails validation.
    pub fn load_with_env<F>(path: Option<&Path>, env: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let (resolved, required) = resolve_path(path, &env);
        validate_path(&resolved, "config path")?;
        let mut config = match read_config_text(&resolved, required)? {
            Some(text) => Self::from_toml_str(&text)?,
            None => Self::default(),
        };
        config.apply_env(&env)?;
        config.validate()?;
        Ok(config)
    }

    /// Parses configuration text without environment overrides or validation.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed TOML or unknown fields.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        toml::from_str(text).map_err(|err| ConfigError::Parse(err.to_string()))
    }

    /// Applies environment overrides. Empty values are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when the output format override is
    /// not recognized.
    pub fn apply_env<F>(&mut self, env: &F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |key: &str| env(key).filter(|value| !value.trim().is_empty());
        if let Some(url) = lookup(GATEWAY_URL_ENV_VAR) {
            self.gateway.url = Some(url);
        }
        if let Some(username) = lookup(GATEWAY_USERNAME_ENV_VAR) {
            self.gateway.username = Some(username);
        }
        if let Some(password) = env(GATEWAY_PASSWORD_ENV_VAR).filter(|value| !value.is_empty()) {
            self.gateway.password = Some(password);
        }
        if let Some(format) = lookup(OUTPUT_FORMAT_ENV_VAR) {
            self.output.format = format.parse()?;
        }
        Ok(())
    }

    /// Validates every section.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the first violated constraint.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.gateway.validate()?;
        self.wait.validate()?;
        self.audit.validate()?;
        Ok(())
    }
}

/// Resolves the config path and whether it must exist.
fn resolve_path<F>(path: Option<&Path>, env: &F) -> (PathBuf, bool)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(path) = path {
        return (path.to_path_buf(), true);
    }
    if let Some(env_path) = env(CONFIG_ENV_VAR).filter(|value| !value.is_empty()) {
        return (PathBuf::from(env_path), true);
    }
    (PathBuf::from(DEFAULT_CONFIG_NAME), false)
}

/// Enforces path length limits; `label` names the path in errors.
fn validate_path(path: &Path, label: &str) -> Result<(), ConfigError> {
    if path.as_os_str().is_empty() {
        return Err(ConfigError::Invalid(format!("{label} must not be empty")));
    }
    if path.as_os_str().len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid(format!("{label} exceeds max length")));
    }
    for component in path.components() {
        if component.as_os_str().len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid(format!("{label} component too long")));
        }
    }
    Ok(())
}

/// Reads the config file with size and encoding checks. Returns `None` for a
/// missing optional file.
fn read_config_text(path: &Path, required: bool) -> Result<Option<String>, ConfigError> {
    let metadata = match fs::metadata(path) {
        Ok(metadata) => metadata,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound && !required => return Ok(None),
        Err(err) => return Err(ConfigError::Io(format!("{}: {err}", path.display()))),
    };
    if metadata.len() > MAX_CONFIG_FILE_BYTES {
        return Err(ConfigError::Invalid("config file exceeds size limit".to_string()));
    }
    let bytes = fs::read(path).map_err(|err| ConfigError::Io(format!("{}: {err}", path.display())))?;
    let text = String::from_utf8(bytes)
        .map_err(|_| ConfigError::Invalid("config file must be utf-8".to_string()))?;
    Ok(Some(text))
}
