//! Client configuration with defaults and environment-variable overrides.
//!
//! Layers, later ones winning:
//! 1. Built-in defaults (`ClientConfig::default`)
//! 2. A serialized document (any serde format, e.g. JSON)
//! 3. `DEMO_API_*` environment variables via [`ClientConfig::with_env_overrides`]

use std::env;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::environment::{Environment, LOCAL_URL, PRODUCTION_URL};
use crate::error::ApiError;

pub const ENV_PREFIX: &str = "DEMO_API";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub environment: Environment,
    pub production_url: String,
    pub local_url: String,
    /// Application tag attached to every log line.
    pub app_name: String,
    pub log_prefix: String,
    /// Per-call timeout. `None` waits indefinitely.
    pub timeout_ms: Option<u64>,
    pub transport: TransportConfig,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            environment: Environment::Production,
            production_url: PRODUCTION_URL.to_string(),
            local_url: LOCAL_URL.to_string(),
            app_name: "demo-api".to_string(),
            log_prefix: "[demo-api]".to_string(),
            timeout_ms: None,
            transport: TransportConfig::default(),
        }
    }
}

/// Connection-pool settings for [`ReqwestTransport`](crate::transport::ReqwestTransport).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransportConfig {
    pub connect_timeout_ms: Option<u64>,
    pub pool_idle_timeout_ms: Option<u64>,
    pub pool_max_idle_per_host: usize,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            connect_timeout_ms: None,
            pool_idle_timeout_ms: Some(90_000),
            pool_max_idle_per_host: 8,
        }
    }
}

impl ClientConfig {
    pub fn new(environment: Environment) -> Self {
        Self {
            environment,
            ..Self::default()
        }
    }

    /// Defaults overlaid with `DEMO_API_*` variables from the process
    /// environment.
    pub fn from_env() -> Result<Self, ApiError> {
        Self::default().with_env_overrides(|key| env::var(key).ok())
    }

    /// Overlay values looked up by `lookup`, keyed by full variable name
    /// (e.g. `DEMO_API_TIMEOUT_MS`).
    pub fn with_env_overrides<F>(mut self, lookup: F) -> Result<Self, ApiError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(&format!("{ENV_PREFIX}_{name}"));

        if let Some(value) = var("ENVIRONMENT") {
            self.environment = value.parse()?;
        }
        if let Some(value) = var("PRODUCTION_URL") {
            self.production_url = value;
        }
        if let Some(value) = var("LOCAL_URL") {
            self.local_url = value;
        }
        if let Some(value) = var("APP_NAME") {
            self.app_name = value;
        }
        if let Some(value) = var("LOG_PREFIX") {
            self.log_prefix = value;
        }
        if let Some(value) = var("TIMEOUT_MS") {
            self.timeout_ms = parse_millis("TIMEOUT_MS", &value)?;
        }
        if let Some(value) = var("CONNECT_TIMEOUT_MS") {
            self.transport.connect_timeout_ms = parse_millis("CONNECT_TIMEOUT_MS", &value)?;
        }
        Ok(self)
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }
}

/// An empty value or `0` disables the timeout.
fn parse_millis(name: &str, value: &str) -> Result<Option<u64>, ApiError> {
    let value = value.trim();
    if value.is_empty() {
        return Ok(None);
    }
    let millis: u64 = value.parse().map_err(|_| {
        ApiError::Configuration(format!("{ENV_PREFIX}_{name} must be milliseconds, got '{value}'"))
    })?;
    Ok((millis > 0).then_some(millis))
}
