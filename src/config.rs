//! Query Options
//!
//! Operator names, server page size and continuation-token settings.
//! Every field has a default, so a partial JSON file is a valid config.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type for configuration loading
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Config file could not be read
    #[error("Failed to read config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Config file is not valid JSON for `CrudOptions`
    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    /// A value is out of range
    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// How continuation tokens are produced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenStrategy {
    /// Self-describing tokens, valid on any node
    #[default]
    Portable,
    /// Short opaque keys into a process-local cache
    Cached,
}

/// Query options
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrudOptions {
    #[serde(default = "default_count_operator")]
    pub count_operator: String,

    #[serde(default = "default_exclude_operator")]
    pub exclude_operator: String,

    #[serde(default = "default_filter_operator")]
    pub filter_operator: String,

    #[serde(default = "default_include_operator")]
    pub include_operator: String,

    #[serde(default = "default_max_page_size_operator")]
    pub max_page_size_operator: String,

    #[serde(default = "default_order_by_operator")]
    pub order_by_operator: String,

    #[serde(default = "default_select_operator")]
    pub select_operator: String,

    #[serde(default = "default_skip_operator")]
    pub skip_operator: String,

    #[serde(default = "default_top_operator")]
    pub top_operator: String,

    /// Server page size (default: 25)
    #[serde(default = "default_page_size")]
    pub default_page_size: i32,

    /// Token strategy (default: portable)
    #[serde(default)]
    pub token_strategy: TokenStrategy,

    /// Lifetime of cached tokens in seconds (default: 3600, 0 = never expire)
    #[serde(default = "default_token_ttl_seconds")]
    pub token_ttl_seconds: u64,

    /// Maximum cached tokens kept (default: 10000)
    #[serde(default = "default_token_cache_capacity")]
    pub token_cache_capacity: usize,
}

fn default_count_operator() -> String {
    "$count".to_string()
}

fn default_exclude_operator() -> String {
    "$exclude".to_string()
}

fn default_filter_operator() -> String {
    "$filter".to_string()
}

fn default_include_operator() -> String {
    "$include".to_string()
}

fn default_max_page_size_operator() -> String {
    "$maxpagesize".to_string()
}

fn default_order_by_operator() -> String {
    "$orderBy".to_string()
}

fn default_select_operator() -> String {
    "$select".to_string()
}

fn default_skip_operator() -> String {
    "$skip".to_string()
}

fn default_top_operator() -> String {
    "$top".to_string()
}

fn default_page_size() -> i32 {
    25
}

fn default_token_ttl_seconds() -> u64 {
    3600
}

fn default_token_cache_capacity() -> usize {
    10_000
}

impl Default for CrudOptions {
    fn default() -> Self {
        Self {
            count_operator: default_count_operator(),
            exclude_operator: default_exclude_operator(),
            filter_operator: default_filter_operator(),
            include_operator: default_include_operator(),
            max_page_size_operator: default_max_page_size_operator(),
            order_by_operator: default_order_by_operator(),
            select_operator: default_select_operator(),
            skip_operator: default_skip_operator(),
            top_operator: default_top_operator(),
            default_page_size: default_page_size(),
            token_strategy: TokenStrategy::default(),
            token_ttl_seconds: default_token_ttl_seconds(),
            token_cache_capacity: default_token_cache_capacity(),
        }
    }
}

impl CrudOptions {
    /// Options with a different server page size
    pub fn with_page_size(default_page_size: i32) -> Self {
        Self {
            default_page_size,
            ..Default::default()
        }
    }

    /// Loads and validates options from a JSON file
    pub fn from_json_file(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let options: CrudOptions = serde_json::from_str(&text)?;
        options.validate()?;
        Ok(options)
    }

    /// Checks value ranges
    pub fn validate(&self) -> ConfigResult<()> {
        if self.default_page_size <= 0 {
            return Err(ConfigError::Invalid(format!(
                "default_page_size must be positive, got {}",
                self.default_page_size
            )));
        }
        if self.token_cache_capacity == 0 {
            return Err(ConfigError::Invalid(
                "token_cache_capacity must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Cached token lifetime; `None` when tokens never expire
    pub fn token_ttl(&self) -> Option<Duration> {
        match self.token_ttl_seconds {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        }
    }
}
