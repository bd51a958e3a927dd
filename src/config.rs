//! Startup configuration for the relay.
//!
//! Everything is read once from the environment (after loading `.env`) and
//! handed to the router explicitly. The provider credential is optional at
//! this stage: a missing key is reported at startup and turned into a
//! per-request configuration error by the handler.

use crate::utils::constants::{
    DEFAULT_GEMINI_API_BASE, DEFAULT_GEMINI_MODEL, DEFAULT_MODEL_TIMEOUT_SECS, DEFAULT_PORT,
    DEFAULT_UPLOAD_LIMIT_MB, ONE_MB,
};
use crate::utils::get_env::{get_optional_env_var, parse_env_value, split_env_list};
use std::time::Duration;

pub const API_KEY_VAR: &str = "GEMINI_API_KEY";

#[derive(Clone, Debug)]
pub struct RelayConfig {
    pub api_key: Option<String>,
    pub model: String,
    pub api_base: String,
    pub port: u16,
    pub upload_limit_bytes: usize,
    pub model_timeout: Duration,
    /// Requests per minute per client; `None` disables rate limiting.
    pub rate_limit_burst: Option<u32>,
    /// Proxies in front of the relay whose `X-Forwarded-For` entries are trusted.
    pub trusted_proxy_hops: usize,
    pub allowed_origins: Vec<String>,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_GEMINI_MODEL.to_string(),
            api_base: DEFAULT_GEMINI_API_BASE.to_string(),
            port: DEFAULT_PORT,
            upload_limit_bytes: DEFAULT_UPLOAD_LIMIT_MB * ONE_MB,
            model_timeout: Duration::from_secs(DEFAULT_MODEL_TIMEOUT_SECS),
            rate_limit_burst: None,
            trusted_proxy_hops: 0,
            allowed_origins: Vec::new(),
        }
    }
}

impl RelayConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(get_optional_env_var)
    }

    /// Builds the config from any key lookup, so tests don't touch the
    /// process environment.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let upload_limit_mb = parse_env_value(lookup("UPLOAD_LIMIT_MB"), DEFAULT_UPLOAD_LIMIT_MB);
        let model_timeout_secs =
            parse_env_value(lookup("MODEL_TIMEOUT_SECS"), DEFAULT_MODEL_TIMEOUT_SECS);

        Self {
            api_key: lookup(API_KEY_VAR).filter(|k| !k.trim().is_empty()),
            model: lookup("GEMINI_MODEL").unwrap_or(defaults.model),
            api_base: lookup("GEMINI_API_BASE").unwrap_or(defaults.api_base),
            port: parse_env_value(lookup("PORT"), defaults.port),
            upload_limit_bytes: upload_limit_mb.max(1) * ONE_MB,
            model_timeout: Duration::from_secs(model_timeout_secs.max(1)),
            rate_limit_burst: lookup("RATE_LIMIT_BURST")
                .and_then(|v| v.trim().parse::<u32>().ok())
                .filter(|burst| *burst > 0),
            trusted_proxy_hops: parse_env_value(lookup("TRUSTED_PROXY_HOPS"), 0),
            allowed_origins: split_env_list(lookup("ALLOWED_ORIGINS").as_deref()),
        }
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Names of required settings that are absent.
    pub fn missing_required(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.api_key.is_none() {
            missing.push(API_KEY_VAR);
        }
        missing
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn defaults_without_environment() {
        let config = RelayConfig::from_lookup(|_| None);
        assert!(config.api_key.is_none());
        assert_eq!(config.model, DEFAULT_GEMINI_MODEL);
        assert_eq!(config.port, 3000);
        assert_eq!(config.upload_limit_bytes, 20 * ONE_MB);
        assert!(config.rate_limit_burst.is_none());
        assert_eq!(config.trusted_proxy_hops, 0);
        assert_eq!(config.model_timeout, Duration::from_secs(300));
        assert_eq!(config.missing_required(), vec![API_KEY_VAR]);
    }

    #[test]
    fn reads_overrides() {
        let config = RelayConfig::from_lookup(lookup_from(&[
            ("GEMINI_API_KEY", "secret"),
            ("GEMINI_MODEL", "gemini-2.5-pro"),
            ("PORT", "8080"),
            ("UPLOAD_LIMIT_MB", "5"),
            ("RATE_LIMIT_BURST", "30"),
            ("TRUSTED_PROXY_HOPS", "1"),
            ("MODEL_TIMEOUT_SECS", "90"),
            ("ALLOWED_ORIGINS", "https://svgify.dev,http://localhost:5173"),
        ]));

        assert_eq!(config.api_key.as_deref(), Some("secret"));
        assert_eq!(config.model, "gemini-2.5-pro");
        assert_eq!(config.port, 8080);
        assert_eq!(config.upload_limit_bytes, 5 * ONE_MB);
        assert_eq!(config.rate_limit_burst, Some(30));
        assert_eq!(config.trusted_proxy_hops, 1);
        assert_eq!(config.model_timeout, Duration::from_secs(90));
        assert_eq!(config.allowed_origins.len(), 2);
        assert!(config.missing_required().is_empty());
    }

    #[test]
    fn zero_burst_disables_rate_limit() {
        let config = RelayConfig::from_lookup(lookup_from(&[("RATE_LIMIT_BURST", "0")]));
        assert!(config.rate_limit_burst.is_none());
    }
}
