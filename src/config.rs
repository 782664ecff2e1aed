//! Source configuration
//!
//! Configuration is read from a YAML file, then overlaid by command-line
//! flags and the `GITHUB_TOKEN` environment variable.

use crate::auth::AuthConfig;
use crate::engine::PollConfig;
use crate::error::{Error, Result};
use crate::http::{HttpClientConfig, RateLimiterConfig};
use crate::pagination::{CursorManagerConfig, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};
use crate::partition::SourcePartition;
use crate::types::{BackoffType, OptionStringExt, Timestamp};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use std::time::Duration;

/// Environment variable holding the API token
pub const TOKEN_ENV_VAR: &str = "GITHUB_TOKEN";

/// Lookback expressions: `45s`, `30m`, `12h`, `7d`, `2w`; a bare number is seconds
static DURATION_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*(\d+)\s*([smhdw]?)\s*$").unwrap());

// ============================================================================
// Top-Level Source Config
// ============================================================================

/// Complete source configuration
#[derive(Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Repository owner (user or organization)
    #[serde(default)]
    pub owner: String,

    /// Repository name
    #[serde(default)]
    pub repository: String,

    /// Topic records are published under
    #[serde(default)]
    pub topic: String,

    /// Explicit start of the first window; wins over `lookback`
    #[serde(default)]
    pub since: Option<Timestamp>,

    /// How far back the first window opens when nothing is persisted
    #[serde(default = "default_lookback")]
    pub lookback: String,

    /// API token, sent as a bearer token
    #[serde(default)]
    pub auth_token: Option<String>,

    /// API root
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Items per page; a page this long is considered full
    #[serde(default = "default_page_size")]
    pub page_size: usize,

    /// Boundary tick in milliseconds
    #[serde(default = "default_tick_ms")]
    pub tick_ms: u64,

    /// Delay after a partial page, in seconds
    #[serde(default = "default_idle_delay_secs")]
    pub idle_delay_secs: u64,

    /// Delay after a full page, in milliseconds
    #[serde(default)]
    pub busy_delay_ms: u64,

    /// Delay before retrying a transient failure, in seconds
    #[serde(default = "default_error_backoff_secs")]
    pub error_backoff_secs: u64,

    /// HTTP client configuration
    #[serde(default)]
    pub http: HttpConfig,

    /// Cursor state file
    #[serde(default = "default_state_file")]
    pub state_file: PathBuf,

    /// JSON-lines output file; standard output when unset
    #[serde(default)]
    pub output: Option<PathBuf>,
}

fn default_lookback() -> String {
    "7d".to_string()
}

fn default_base_url() -> String {
    "https://api.github.com".to_string()
}

fn default_page_size() -> usize {
    DEFAULT_PAGE_SIZE
}

fn default_tick_ms() -> u64 {
    1000
}

fn default_idle_delay_secs() -> u64 {
    60
}

fn default_error_backoff_secs() -> u64 {
    30
}

fn default_state_file() -> PathBuf {
    PathBuf::from("issue-source-state.json")
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            owner: String::new(),
            repository: String::new(),
            topic: String::new(),
            since: None,
            lookback: default_lookback(),
            auth_token: None,
            base_url: default_base_url(),
            page_size: default_page_size(),
            tick_ms: default_tick_ms(),
            idle_delay_secs: default_idle_delay_secs(),
            busy_delay_ms: 0,
            error_backoff_secs: default_error_backoff_secs(),
            http: HttpConfig::default(),
            state_file: default_state_file(),
            output: None,
        }
    }
}

impl std::fmt::Debug for SourceConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SourceConfig")
            .field("owner", &self.owner)
            .field("repository", &self.repository)
            .field("topic", &self.topic)
            .field("since", &self.since)
            .field("lookback", &self.lookback)
            .field("auth_token", &self.auth_token.as_ref().map(|_| "[REDACTED]"))
            .field("base_url", &self.base_url)
            .field("page_size", &self.page_size)
            .field("tick_ms", &self.tick_ms)
            .field("idle_delay_secs", &self.idle_delay_secs)
            .field("busy_delay_ms", &self.busy_delay_ms)
            .field("error_backoff_secs", &self.error_backoff_secs)
            .field("http", &self.http)
            .field("state_file", &self.state_file)
            .field("output", &self.output)
            .finish()
    }
}

/// Values supplied on the command line
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub owner: Option<String>,
    pub repository: Option<String>,
    pub topic: Option<String>,
    pub state_file: Option<PathBuf>,
    pub output: Option<PathBuf>,
}

impl SourceConfig {
    /// Parse configuration from YAML
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Load configuration from a YAML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(Error::FileNotFound {
                path: path.display().to_string(),
            });
        }
        let contents = std::fs::read_to_string(path)?;
        Self::from_yaml(&contents)
    }

    /// Apply command-line values on top of the file values
    #[must_use]
    pub fn overlay(mut self, overrides: ConfigOverrides) -> Self {
        if let Some(owner) = overrides.owner {
            self.owner = owner;
        }
        if let Some(repository) = overrides.repository {
            self.repository = repository;
        }
        if let Some(topic) = overrides.topic {
            self.topic = topic;
        }
        if let Some(state_file) = overrides.state_file {
            self.state_file = state_file;
        }
        if overrides.output.is_some() {
            self.output = overrides.output;
        }
        self
    }

    /// Use `token` when no token is configured
    #[must_use]
    pub fn with_fallback_token(mut self, token: Option<String>) -> Self {
        self.auth_token = self.auth_token.none_if_empty().or(token.none_if_empty());
        self
    }

    /// Use the token from the environment when none is configured
    #[must_use]
    pub fn with_env_token(self) -> Self {
        let token = std::env::var(TOKEN_ENV_VAR).ok();
        self.with_fallback_token(token)
    }

    /// Check the configuration before anything is started
    pub fn validate(&self) -> Result<()> {
        for (field, value) in [
            ("owner", &self.owner),
            ("repository", &self.repository),
            ("topic", &self.topic),
        ] {
            if value.trim().is_empty() {
                return Err(Error::missing_field(field));
            }
        }

        if !(1..=MAX_PAGE_SIZE).contains(&self.page_size) {
            return Err(Error::invalid_value(
                "page_size",
                format!("must be between 1 and {MAX_PAGE_SIZE}, got {}", self.page_size),
            ));
        }

        if self.tick_ms == 0 {
            return Err(Error::invalid_value("tick_ms", "must be greater than 0"));
        }

        url::Url::parse(&self.base_url)
            .map_err(|e| Error::invalid_value("base_url", e.to_string()))?;

        self.lookback_duration()?;
        Ok(())
    }

    /// Parsed `lookback`
    pub fn lookback_duration(&self) -> Result<Duration> {
        parse_duration(&self.lookback).map_err(|e| Error::invalid_value("lookback", e.to_string()))
    }

    /// Partition this configuration harvests
    pub fn partition(&self) -> SourcePartition {
        SourcePartition::new(self.owner.trim(), self.repository.trim())
    }

    /// Poll loop configuration
    pub fn poll_config(&self) -> Result<PollConfig> {
        Ok(PollConfig::new()
            .with_lookback(self.lookback_duration()?)
            .with_since(self.since)
            .with_cursor(CursorManagerConfig {
                tick: Duration::from_millis(self.tick_ms),
                idle_delay: Duration::from_secs(self.idle_delay_secs),
                busy_delay: Duration::from_millis(self.busy_delay_ms),
            })
            .with_error_backoff(Duration::from_secs(self.error_backoff_secs)))
    }

    /// HTTP client configuration
    pub fn http_client_config(&self) -> HttpClientConfig {
        let builder = HttpClientConfig::builder()
            .base_url(self.base_url.trim_end_matches('/'))
            .timeout(Duration::from_secs(self.http.timeout_secs))
            .max_retries(self.http.max_retries)
            .backoff(
                self.http.backoff.backoff_type,
                Duration::from_millis(self.http.backoff.initial_ms),
                Duration::from_millis(self.http.backoff.max_ms),
            )
            .header("X-GitHub-Api-Version", "2022-11-28");

        match self.http.requests_per_second {
            0 => builder.no_rate_limit().build(),
            rps => builder
                .rate_limit(RateLimiterConfig::new(rps, rps))
                .build(),
        }
    }

    /// Authentication to apply to every request
    pub fn auth_config(&self) -> AuthConfig {
        AuthConfig::from_token(self.auth_token.clone())
    }
}

// ============================================================================
// HTTP Config
// ============================================================================

/// HTTP client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Maximum number of retries for transient failures
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Client-side request rate; 0 disables pacing
    #[serde(default = "default_rps")]
    pub requests_per_second: u32,

    /// Retry backoff configuration
    #[serde(default)]
    pub backoff: BackoffConfig,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout(),
            max_retries: default_max_retries(),
            requests_per_second: default_rps(),
            backoff: BackoffConfig::default(),
        }
    }
}

fn default_timeout() -> u64 {
    30
}

fn default_max_retries() -> u32 {
    3
}

fn default_rps() -> u32 {
    5
}

/// Backoff configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackoffConfig {
    /// Type of backoff
    #[serde(rename = "type", default)]
    pub backoff_type: BackoffType,

    /// Initial delay in milliseconds
    #[serde(default = "default_initial_ms")]
    pub initial_ms: u64,

    /// Maximum delay in milliseconds
    #[serde(default = "default_max_ms")]
    pub max_ms: u64,
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            backoff_type: BackoffType::Exponential,
            initial_ms: default_initial_ms(),
            max_ms: default_max_ms(),
        }
    }
}

fn default_initial_ms() -> u64 {
    500
}

fn default_max_ms() -> u64 {
    60000
}

// ============================================================================
// Durations
// ============================================================================

/// Parse a duration such as `7d` or `90m`
pub fn parse_duration(raw: &str) -> Result<Duration> {
    let captures = DURATION_REGEX
        .captures(raw)
        .ok_or_else(|| Error::config(format!("Invalid duration '{raw}'")))?;

    let amount: u64 = captures[1]
        .parse()
        .map_err(|e| Error::config(format!("Invalid duration '{raw}': {e}")))?;

    let unit_secs = match &captures[2] {
        "" | "s" => 1,
        "m" => 60,
        "h" => 60 * 60,
        "d" => 24 * 60 * 60,
        "w" => 7 * 24 * 60 * 60,
        other => return Err(Error::config(format!("Unknown duration unit '{other}'"))),
    };

    amount
        .checked_mul(unit_secs)
        .map(Duration::from_secs)
        .ok_or_else(|| Error::config(format!("Duration '{raw}' is too large")))
}
