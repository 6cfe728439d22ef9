//! Configuration file handling for the CLI.
//!
//! Reads `$XDG_CONFIG_HOME/keeper/config.toml` following the XDG Base
//! Directory Specification. Values there override `KEEPER_*` environment
//! variables; command-line flags override both.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result, ensure};
use directories::ProjectDirs;
use keeper_business::BusinessConfig;
use serde::{Deserialize, Serialize};

/// CLI configuration stored on disk
#[derive(Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Config {
    /// Backend connection section
    #[serde(default)]
    pub api: ApiConfig,
    /// User list section
    #[serde(default)]
    pub list: ListConfig,
}

#[derive(Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ApiConfig {
    pub base_url: Option<String>,
    /// Bearer token sent with every request
    pub token: Option<String>,
}

#[derive(Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ListConfig {
    pub page_size: Option<u32>,
}

/// Values given on the command line.
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub api_url: Option<String>,
    pub token: Option<String>,
}

impl Config {
    /// Returns `$XDG_CONFIG_HOME/keeper/config.toml` on Linux,
    /// appropriate paths on other platforms.
    pub fn config_path() -> Result<PathBuf> {
        let project_dirs = ProjectDirs::from("com", "keeper", "keeper")
            .context("Failed to determine config directory")?;

        Ok(project_dirs.config_dir().join("config.toml"))
    }

    /// Load configuration from the default location.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    /// Load configuration from `path`.
    ///
    /// Returns default configuration if file doesn't exist.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Layer this file and the command-line overrides on top of `base`,
    /// which normally comes from the environment.
    pub fn resolve(&self, base: BusinessConfig, overrides: &Overrides) -> Result<BusinessConfig> {
        let mut config = base;

        if let Some(url) = self.api.base_url.as_ref() {
            config.api_base_url.clone_from(url);
        }
        if let Some(token) = self.api.token.as_ref() {
            config.api_token = Some(token.clone());
        }
        if let Some(page_size) = self.list.page_size {
            ensure!(page_size > 0, "list.page_size must be greater than zero");
            config.page_size = page_size;
        }

        if let Some(url) = overrides.api_url.as_ref() {
            config.api_base_url.clone_from(url);
        }
        if let Some(token) = overrides.token.as_ref() {
            config.api_token = Some(token.clone());
        }

        ensure!(
            config.api_base_url.starts_with("http://") || config.api_base_url.starts_with("https://"),
            "API base URL must be an http(s) URL, got `{}`",
            config.api_base_url
        );
        Ok(config)
    }
}

/// Resolve the effective configuration: flags, then config file, then env.
pub fn load_business_config(overrides: &Overrides) -> Result<BusinessConfig> {
    let env = BusinessConfig::from_env().context("Failed to read KEEPER_* environment")?;
    Config::load()?.resolve(env, overrides)
}
