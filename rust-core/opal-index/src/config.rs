// SPDX-License-Identifier: PMPL-1.0-or-later
//! Index and backend configuration.

use std::time::Duration;

use opal_query::TranslatorConfig;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{IndexError, Result};

/// Index façade configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexConfig {
    /// Index name
    pub name: String,
    /// Ask the engine to refresh after every write
    pub refresh: bool,
    /// Mapping used when the index has to be created
    pub mapping: Option<Value>,
    /// How filter mappings are translated
    pub translator: TranslatorConfig,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            name: "opal".to_string(),
            refresh: true,
            mapping: None,
            translator: TranslatorConfig::default(),
        }
    }
}

impl IndexConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_mapping(mut self, mapping: Value) -> Self {
        self.mapping = Some(mapping);
        self
    }
}

/// Authentication method for the REST backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Auth {
    None,
    /// `Authorization: Bearer <token>`
    Bearer(String),
    /// HTTP Basic authentication.
    Basic { username: String, password: String },
}

/// REST backend configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    /// Base URL of the engine
    pub url: String,
    pub username: Option<String>,
    pub password: Option<String>,
    pub bearer_token: Option<String>,
    /// Per-request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:9200".to_string(),
            username: None,
            password: None,
            bearer_token: None,
            timeout_secs: 30,
        }
    }
}

impl BackendConfig {
    pub const ENV_URL: &'static str = "OPAL_URL";
    pub const ENV_USERNAME: &'static str = "OPAL_USERNAME";
    pub const ENV_PASSWORD: &'static str = "OPAL_PASSWORD";
    pub const ENV_BEARER_TOKEN: &'static str = "OPAL_BEARER_TOKEN";
    pub const ENV_TIMEOUT_SECS: &'static str = "OPAL_TIMEOUT_SECS";

    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }

    /// Defaults overridden by any `OPAL_*` variables that are set.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok().filter(|v| !v.is_empty()))
    }

    /// Same as [`BackendConfig::from_env`] over an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        if let Some(url) = lookup(Self::ENV_URL) {
            config.url = url;
        }
        config.username = lookup(Self::ENV_USERNAME);
        config.password = lookup(Self::ENV_PASSWORD);
        config.bearer_token = lookup(Self::ENV_BEARER_TOKEN);
        if let Some(raw) = lookup(Self::ENV_TIMEOUT_SECS) {
            config.timeout_secs = raw.trim().parse().map_err(|_| {
                IndexError::Config(format!(
                    "{} must be a whole number of seconds, got {raw:?}",
                    Self::ENV_TIMEOUT_SECS
                ))
            })?;
        }
        config.auth()?;
        Ok(config)
    }

    /// Resolve the credentials into a single auth method.
    pub fn auth(&self) -> Result<Auth> {
        match (&self.username, &self.password, &self.bearer_token) {
            (None, None, None) => Ok(Auth::None),
            (None, None, Some(token)) => Ok(Auth::Bearer(token.clone())),
            (Some(username), Some(password), None) => Ok(Auth::Basic {
                username: username.clone(),
                password: password.clone(),
            }),
            (_, _, Some(_)) => Err(IndexError::Config(
                "bearer token and basic credentials are mutually exclusive".to_string(),
            )),
            _ => Err(IndexError::Config(
                "basic authentication needs both a username and a password".to_string(),
            )),
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}
