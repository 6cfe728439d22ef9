use std::any::Any;
use std::time::Duration;

use keeper_states::{SnapshotClone, State, state_assign_impl};
use serde::Deserialize;
use thiserror::Error;
use ustr::Ustr;

/// Rows per page of the user list.
pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// Quiet period before a plan search is sent.
pub const DEFAULT_SEARCH_DEBOUNCE: Duration = Duration::from_millis(300);

const DEFAULT_API_BASE_URL: &str = "http://127.0.0.1:3000/api";

/// Environment variables read by [`BusinessConfig::from_env`] start with this.
pub const ENV_PREFIX: &str = "KEEPER_";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid environment configuration: {0}")]
    Env(String),
    #[error("KEEPER_API_BASE_URL must be an http(s) URL, got `{0}`")]
    InvalidBaseUrl(String),
    #[error("KEEPER_PAGE_SIZE must be greater than zero")]
    InvalidPageSize,
}

#[derive(Debug, Clone)]
pub struct BusinessConfig {
    pub api_base_url: String,
    /// Bearer token forwarded on every request when set.
    pub api_token: Option<String>,
    pub page_size: u32,
    pub search_debounce: Duration,
}

// Intermediate shape for deserializing `KEEPER_*` variables.
#[derive(Debug, Deserialize)]
struct RawConfig {
    api_base_url: Option<String>,
    api_token: Option<String>,
    page_size: Option<u32>,
    search_debounce_ms: Option<u64>,
}

impl BusinessConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            api_base_url: base_url.into(),
            ..Self::default()
        }
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.api_token = Some(token.into());
        self
    }

    pub fn with_search_debounce(mut self, debounce: Duration) -> Self {
        self.search_debounce = debounce;
        self
    }

    /// Base URL without a trailing slash.
    pub fn api_url(&self) -> Ustr {
        Ustr::from(self.api_base_url.trim_end_matches('/'))
    }

    pub fn endpoint(&self, path: &str) -> String {
        format!("{}{path}", self.api_url())
    }

    pub fn api_token(&self) -> Option<&str> {
        self.api_token.as_deref().filter(|t| !t.trim().is_empty())
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(std::env::vars())
    }

    /// Build from `(name, value)` pairs; only `KEEPER_*` names are considered.
    pub fn from_vars(vars: impl IntoIterator<Item = (String, String)>) -> Result<Self, ConfigError> {
        let scoped: Vec<(String, String)> = vars
            .into_iter()
            .filter_map(|(name, value)| {
                name.strip_prefix(ENV_PREFIX)
                    .map(|stripped| (stripped.to_owned(), value))
            })
            .collect();

        let raw: RawConfig =
            serde_env::from_iter(scoped).map_err(|e| ConfigError::Env(e.to_string()))?;
        Self::from_raw(raw)
    }

    fn from_raw(raw: RawConfig) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let api_base_url = raw.api_base_url.unwrap_or(defaults.api_base_url);
        if !(api_base_url.starts_with("http://") || api_base_url.starts_with("https://")) {
            return Err(ConfigError::InvalidBaseUrl(api_base_url));
        }

        let page_size = raw.page_size.unwrap_or(defaults.page_size);
        if page_size == 0 {
            return Err(ConfigError::InvalidPageSize);
        }

        Ok(Self {
            api_base_url,
            api_token: raw.api_token.filter(|t| !t.trim().is_empty()),
            page_size,
            search_debounce: raw
                .search_debounce_ms
                .map_or(defaults.search_debounce, Duration::from_millis),
        })
    }
}

impl Default for BusinessConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_owned(),
            api_token: None,
            page_size: DEFAULT_PAGE_SIZE,
            search_debounce: DEFAULT_SEARCH_DEBOUNCE,
        }
    }
}

impl SnapshotClone for BusinessConfig {
    fn clone_boxed(&self) -> Option<Box<dyn Any + Send>> {
        Some(Box::new(self.clone()))
    }
}

impl State for BusinessConfig {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn assign_box(&mut self, new_self: Box<dyn Any + Send>) {
        state_assign_impl(self, new_self);
    }
}
