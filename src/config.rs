//! Config file parsing and validation.

use crate::api_defaults::{
    API_BASE_URL, BACKOFF_BASE_MILLISECONDS, BACKOFF_MAX_MILLISECONDS, BASE_URL_ENV_VAR,
    CACHE_TTL_MILLISECONDS, DEFAULT_MAX_RETRIES, DEFAULT_TIMEOUT_SECONDS,
};
use crate::error::{AddContext, ApiError};
use crate::time::{Milliseconds, Seconds};
use crate::Result;
use serde::Deserialize;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::sync::Arc;

pub trait ConfigProperties: Send + Sync {
    fn base_url(&self) -> &str;
    fn cache_ttl(&self) -> Milliseconds {
        Milliseconds::new(CACHE_TTL_MILLISECONDS)
    }
    fn max_retries(&self) -> u32 {
        DEFAULT_MAX_RETRIES
    }
    fn backoff_base(&self) -> Milliseconds {
        Milliseconds::new(BACKOFF_BASE_MILLISECONDS)
    }
    fn backoff_max(&self) -> Milliseconds {
        Milliseconds::new(BACKOFF_MAX_MILLISECONDS)
    }
    fn timeout(&self) -> Seconds {
        Seconds::new(DEFAULT_TIMEOUT_SECONDS)
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    base_url: String,
    cache_ttl_ms: u64,
    max_retries: u32,
    backoff_base_ms: u64,
    backoff_max_ms: u64,
    timeout_seconds: u64,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            base_url: API_BASE_URL.to_string(),
            cache_ttl_ms: CACHE_TTL_MILLISECONDS,
            max_retries: DEFAULT_MAX_RETRIES,
            backoff_base_ms: BACKOFF_BASE_MILLISECONDS,
            backoff_max_ms: BACKOFF_MAX_MILLISECONDS,
            timeout_seconds: DEFAULT_TIMEOUT_SECONDS,
        }
    }
}

impl Config {
    /// Reads a TOML document. Every key is optional and falls back to the
    /// defaults in `api_defaults`.
    pub fn new<T: Read>(mut reader: T) -> Result<Self> {
        let mut config_data = String::new();
        reader.read_to_string(&mut config_data)?;
        let config: Config = toml::from_str(&config_data)
            .map_err(|err| ApiError::ConfigurationError(err.message().to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let f = File::open(path)
            .err_context(format!("Unable to open config file {}", path.display()))?;
        Config::new(f)
    }

    pub fn with_base_url<T: Into<String>>(mut self, base_url: T) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Replaces the base URL with the value of `PRICEWATCH_API_BASE_URL` if
    /// it is set and not empty.
    pub fn with_env_override(self) -> Self {
        match std::env::var(BASE_URL_ENV_VAR) {
            Ok(base_url) if !base_url.trim().is_empty() => self.with_base_url(base_url.trim()),
            _ => self,
        }
    }

    fn validate(&self) -> Result<()> {
        if self.base_url.trim().is_empty() {
            return Err(ApiError::ConfigurationError("base_url cannot be empty".to_string()).into());
        }
        if self.cache_ttl_ms == 0 {
            return Err(ApiError::ConfigurationError(
                "cache_ttl_ms must be greater than zero".to_string(),
            )
            .into());
        }
        if self.backoff_base_ms > self.backoff_max_ms {
            return Err(ApiError::ConfigurationError(format!(
                "backoff_base_ms ({}) cannot be greater than backoff_max_ms ({})",
                self.backoff_base_ms, self.backoff_max_ms
            ))
            .into());
        }
        Ok(())
    }
}

impl ConfigProperties for Config {
    fn base_url(&self) -> &str {
        &self.base_url
    }

    fn cache_ttl(&self) -> Milliseconds {
        Milliseconds::new(self.cache_ttl_ms)
    }

    fn max_retries(&self) -> u32 {
        self.max_retries
    }

    fn backoff_base(&self) -> Milliseconds {
        Milliseconds::new(self.backoff_base_ms)
    }

    fn backoff_max(&self) -> Milliseconds {
        Milliseconds::new(self.backoff_max_ms)
    }

    fn timeout(&self) -> Seconds {
        Seconds::new(self.timeout_seconds)
    }
}

impl<T: ConfigProperties + ?Sized> ConfigProperties for Arc<T> {
    fn base_url(&self) -> &str {
        self.as_ref().base_url()
    }

    fn cache_ttl(&self) -> Milliseconds {
        self.as_ref().cache_ttl()
    }

    fn max_retries(&self) -> u32 {
        self.as_ref().max_retries()
    }

    fn backoff_base(&self) -> Milliseconds {
        self.as_ref().backoff_base()
    }

    fn backoff_max(&self) -> Milliseconds {
        self.as_ref().backoff_max()
    }

    fn timeout(&self) -> Seconds {
        self.as_ref().timeout()
    }
}
