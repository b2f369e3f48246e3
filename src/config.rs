//! # Configuration Module
//!
//! Application settings: where the recipe service lives, how long to wait for
//! it, and the engine's display and merge defaults. Values come from the
//! environment (after `.env` is loaded) and fall back to the constants below.

use anyhow::{bail, Context, Result};
use std::time::Duration;

use crate::consolidation::QuantityMergePolicy;
use crate::sort_filter::SortOrder;

// Constants for application configuration
pub const DEFAULT_API_URL: &str = "http://localhost:3000";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_LANGUAGE: &str = "en";

pub const ENV_API_URL: &str = "SMARTMEAL_API_URL";
pub const ENV_REQUEST_TIMEOUT_SECS: &str = "SMARTMEAL_REQUEST_TIMEOUT_SECS";
pub const ENV_QUANTITY_MERGE: &str = "SMARTMEAL_QUANTITY_MERGE";
pub const ENV_DEFAULT_SORT: &str = "SMARTMEAL_DEFAULT_SORT";
pub const ENV_LANGUAGE: &str = "SMARTMEAL_LANGUAGE";

/// Application configuration
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    /// Base URL of the recipe/plan generation service, without trailing slash
    pub api_base_url: String,
    /// Per-request timeout enforced by the HTTP client
    pub request_timeout_secs: u64,
    /// How duplicate ingredients with differing quantities are merged
    pub quantity_merge: QuantityMergePolicy,
    /// Initial shopping-list ordering
    pub default_sort: SortOrder,
    /// Language for status messages
    pub language: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_URL.to_string(),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            quantity_merge: QuantityMergePolicy::default(),
            default_sort: SortOrder::default(),
            language: DEFAULT_LANGUAGE.to_string(),
        }
    }
}

impl AppConfig {
    /// Load configuration from process environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through a key lookup, falling back to defaults
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let api_base_url = lookup(ENV_API_URL)
            .map(|url| url.trim().trim_end_matches('/').to_string())
            .unwrap_or(defaults.api_base_url);

        let request_timeout_secs = match lookup(ENV_REQUEST_TIMEOUT_SECS) {
            Some(value) => value
                .trim()
                .parse::<u64>()
                .with_context(|| format!("{ENV_REQUEST_TIMEOUT_SECS} must be a whole number of seconds"))?,
            None => defaults.request_timeout_secs,
        };

        let quantity_merge = match lookup(ENV_QUANTITY_MERGE) {
            Some(value) => value
                .parse::<QuantityMergePolicy>()
                .map_err(anyhow::Error::msg)
                .with_context(|| format!("{ENV_QUANTITY_MERGE} must be 'concatenate' or 'keep-first'"))?,
            None => defaults.quantity_merge,
        };

        let default_sort = match lookup(ENV_DEFAULT_SORT) {
            Some(value) => value
                .parse::<SortOrder>()
                .map_err(anyhow::Error::msg)
                .with_context(|| format!("{ENV_DEFAULT_SORT} must be 'alphabetical' or 'category'"))?,
            None => defaults.default_sort,
        };

        let language = lookup(ENV_LANGUAGE)
            .map(|lang| lang.trim().to_string())
            .unwrap_or(defaults.language);

        let config = Self {
            api_base_url,
            request_timeout_secs,
            quantity_merge,
            default_sort,
            language,
        };

        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if !(self.api_base_url.starts_with("http://") || self.api_base_url.starts_with("https://")) {
            bail!("API URL must start with http:// or https://, got '{}'", self.api_base_url);
        }

        if self.request_timeout_secs == 0 {
            bail!("Request timeout must be greater than 0");
        }

        Ok(())
    }

    /// Request timeout as a Duration
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
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
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = AppConfig::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.request_timeout(), Duration::from_secs(30));
    }

    #[test]
    fn test_overrides() {
        let config = AppConfig::from_lookup(lookup_from(&[
            (ENV_API_URL, "https://api.example.com/Prod/"),
            (ENV_REQUEST_TIMEOUT_SECS, "5"),
            (ENV_QUANTITY_MERGE, "keep-first"),
            (ENV_DEFAULT_SORT, "category"),
        ]))
        .unwrap();

        assert_eq!(config.api_base_url, "https://api.example.com/Prod");
        assert_eq!(config.request_timeout_secs, 5);
        assert_eq!(config.quantity_merge, QuantityMergePolicy::KeepFirst);
        assert_eq!(config.default_sort, SortOrder::Category);
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(AppConfig::from_lookup(lookup_from(&[(ENV_REQUEST_TIMEOUT_SECS, "soon")])).is_err());
        assert!(AppConfig::from_lookup(lookup_from(&[(ENV_REQUEST_TIMEOUT_SECS, "0")])).is_err());
        assert!(AppConfig::from_lookup(lookup_from(&[(ENV_API_URL, "ftp://x")])).is_err());
        assert!(AppConfig::from_lookup(lookup_from(&[(ENV_QUANTITY_MERGE, "sum")])).is_err());
        assert!(AppConfig::from_lookup(lookup_from(&[(ENV_DEFAULT_SORT, "price")])).is_err());
    }
}
