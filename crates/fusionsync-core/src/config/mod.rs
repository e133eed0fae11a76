//! Client connection settings.
//!
//! Resolves the API key and server host from command-line flags, environment
//! and the active CLI profile. The API key is a secret and is never persisted.

use crate::api::FusionAuthClient;
use crate::error::{Error, Result};
use crate::util::normalize_text_option;

pub const API_KEY_ENV: &str = "FUSIONAUTH_API_KEY";
pub const HOST_ENV: &str = "FUSIONAUTH_HOST";
pub const DEFAULT_HOST: &str = "http://localhost:9011";

/// Resolved connection settings for one invocation.
#[derive(Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub api_key: String,
    pub host: String,
}

impl std::fmt::Debug for ClientConfig {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("ClientConfig")
            .field("api_key", &"[REDACTED]")
            .field("host", &self.host)
            .finish()
    }
}

impl ClientConfig {
    /// Resolve settings in precedence order.
    ///
    /// Key: flag, then `FUSIONAUTH_API_KEY`. Host: flag, then
    /// `FUSIONAUTH_HOST`, then the profile host, then [`DEFAULT_HOST`].
    pub fn resolve<F>(
        key_flag: Option<String>,
        host_flag: Option<String>,
        profile_host: Option<String>,
        env: F,
    ) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_key = normalize_text_option(key_flag)
            .or_else(|| normalize_text_option(env(API_KEY_ENV)))
            .ok_or_else(|| {
                Error::Config(format!(
                    "an API key is required; pass --key or set {API_KEY_ENV}"
                ))
            })?;

        let host = normalize_text_option(host_flag)
            .or_else(|| normalize_text_option(env(HOST_ENV)))
            .or_else(|| normalize_text_option(profile_host))
            .unwrap_or_else(|| DEFAULT_HOST.to_string());

        let host =
            crate::api::normalize_host(&host).map_err(|error| Error::Config(error.to_string()))?;

        Ok(Self { api_key, host })
    }

    /// Resolve using the process environment.
    pub fn from_env(
        key_flag: Option<String>,
        host_flag: Option<String>,
        profile_host: Option<String>,
    ) -> Result<Self> {
        Self::resolve(key_flag, host_flag, profile_host, |key| {
            std::env::var(key).ok()
        })
    }

    pub fn client(&self) -> Result<FusionAuthClient> {
        Ok(FusionAuthClient::new(&self.host, self.api_key.clone())?)
    }
}
