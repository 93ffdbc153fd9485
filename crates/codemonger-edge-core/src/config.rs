//! Edge configuration.
//!
//! Provides [`EdgeConfig`] for the local edge server. Values are loaded from
//! environment variables via [`EdgeConfig::from_env`].

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use typed_builder::TypedBuilder;

use crate::error::EdgeError;

/// Deployment stage of the distribution.
///
/// The stage decides the default cache TTL of served contents.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeploymentStage {
    /// Short-lived caching so edits show up immediately.
    #[default]
    Development,
    /// Public stage.
    Production,
}

impl DeploymentStage {
    /// Stage name as used in configuration.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Development => "development",
            Self::Production => "production",
        }
    }

    /// Default cache TTL of the stage.
    #[must_use]
    pub fn default_cache_ttl(self) -> Duration {
        match self {
            Self::Development => Duration::from_secs(1),
            Self::Production => Duration::from_secs(600),
        }
    }
}

impl fmt::Display for DeploymentStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DeploymentStage {
    type Err = EdgeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("development") {
            Ok(Self::Development)
        } else if s.eq_ignore_ascii_case("production") {
            Ok(Self::Production)
        } else {
            Err(EdgeError::InvalidDeploymentStage(s.to_owned()))
        }
    }
}

/// Edge server configuration.
///
/// # Examples
///
/// ```
/// use codemonger_edge_core::{DeploymentStage, EdgeConfig};
///
/// let config = EdgeConfig::default();
/// assert_eq!(config.gateway_listen, "0.0.0.0:3000");
/// assert_eq!(config.deployment_stage, DeploymentStage::Development);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, TypedBuilder)]
#[serde(rename_all = "camelCase")]
pub struct EdgeConfig {
    /// Bind address (e.g. `"0.0.0.0:3000"`).
    #[builder(default = String::from("0.0.0.0:3000"))]
    pub gateway_listen: String,

    /// Directory the origin serves contents from.
    #[builder(default = String::from("./docs"))]
    pub contents_dir: String,

    /// Deployment stage.
    #[builder(default)]
    pub deployment_stage: DeploymentStage,

    /// Cache TTL override in seconds. `None` uses the stage default.
    #[builder(default)]
    pub cache_ttl_seconds: Option<u64>,

    /// Log level filter string (e.g. `"info"`, `"debug"`).
    #[builder(default = String::from("info"))]
    pub log_level: String,
}

impl Default for EdgeConfig {
    fn default() -> Self {
        Self {
            gateway_listen: String::from("0.0.0.0:3000"),
            contents_dir: String::from("./docs"),
            deployment_stage: DeploymentStage::default(),
            cache_ttl_seconds: None,
            log_level: String::from("info"),
        }
    }
}

impl EdgeConfig {
    /// Load configuration from environment variables.
    ///
    /// | Variable | Default |
    /// |----------|---------|
    /// | `GATEWAY_LISTEN` | `0.0.0.0:3000` |
    /// | `CONTENTS_DIR` | `./docs` |
    /// | `DEPLOYMENT_STAGE` | `development` |
    /// | `CACHE_TTL_SECONDS` | *(stage default)* |
    /// | `LOG_LEVEL` | `info` |
    ///
    /// # Errors
    ///
    /// Fails on an unknown `DEPLOYMENT_STAGE` or a non-numeric
    /// `CACHE_TTL_SECONDS`.
    pub fn from_env() -> Result<Self, EdgeError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, EdgeError> {
        let mut config = Self::default();

        if let Some(v) = lookup("GATEWAY_LISTEN") {
            config.gateway_listen = v;
        }
        if let Some(v) = lookup("CONTENTS_DIR") {
            config.contents_dir = v;
        }
        if let Some(v) = lookup("DEPLOYMENT_STAGE") {
            config.deployment_stage = v.parse()?;
        }
        if let Some(v) = lookup("CACHE_TTL_SECONDS") {
            let ttl = v
                .parse::<u64>()
                .map_err(|e| EdgeError::Config(format!("invalid CACHE_TTL_SECONDS {v:?}: {e}")))?;
            config.cache_ttl_seconds = Some(ttl);
        }
        if let Some(v) = lookup("LOG_LEVEL") {
            config.log_level = v;
        }

        Ok(config)
    }

    /// Effective cache TTL: the override if set, else the stage default.
    #[must_use]
    pub fn cache_ttl(&self) -> Duration {
        self.cache_ttl_seconds
            .map_or_else(|| self.deployment_stage.default_cache_ttl(), Duration::from_secs)
    }
}
