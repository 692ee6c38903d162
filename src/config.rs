//! Runtime configuration, read from the environment (and `.env`).

use figment::providers::Env;
use figment::{Figment, Provider};
use serde::Deserialize;
use std::time::Duration;

use crate::supabase::Credential;

/// Older project templates name the key after the role it carries.
const KEY_ALIAS: &str = "SUPABASE_ANON_KEY";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Project endpoint, e.g. `https://<ref>.supabase.co`.
    pub supabase_url: String,
    pub supabase_key: Credential,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Per-request timeout in seconds; `0` disables it.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_request_timeout_secs() -> u64 {
    30
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Extract(#[from] Box<figment::Error>),
    #[error("{0} must not be empty")]
    Empty(&'static str),
}

impl Config {
    /// Load from process environment variables. `SUPABASE_KEY` wins over
    /// `SUPABASE_ANON_KEY` when both are set.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_provider(
            Figment::new()
                .merge(Env::raw().only(&[KEY_ALIAS]).map(|_| "SUPABASE_KEY".into()))
                .merge(Env::raw().ignore(&[KEY_ALIAS])),
        )
    }

    pub fn from_provider(provider: impl Provider) -> Result<Self, ConfigError> {
        let config: Config = Figment::from(provider).extract().map_err(Box::new)?;

        if config.supabase_url.trim().is_empty() {
            return Err(ConfigError::Empty("SUPABASE_URL"));
        }
        if config.supabase_key.is_empty() {
            return Err(ConfigError::Empty("SUPABASE_KEY"));
        }
        Ok(config)
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        match self.request_timeout_secs {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        }
    }
}
