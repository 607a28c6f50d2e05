use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::client::ApiStyle;
use crate::error::StoreError;
use crate::guard::DEFAULT_CHAIN_ID;

pub const DEFAULT_API_URL: &str = "https://demo-api.yieldseeker.xyz";
pub const API_URL_ENV: &str = "YIELDSEEKER_API_URL";
pub const DEFAULT_LOG_FILTER: &str = "yieldseeker_core=info,yieldseeker_tui=info";

/// `<config dir>/yieldseeker`
pub fn app_config_dir() -> Result<PathBuf, StoreError> {
    let config_dir = dirs::config_dir().ok_or(StoreError::NoConfigDir)?;
    Ok(config_dir.join("yieldseeker"))
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub api_url: Option<String>,
    #[serde(default)]
    pub api_style: Option<String>,
    #[serde(default)]
    pub required_chain_id: Option<u64>,
    #[serde(default)]
    pub show_welcome: Option<bool>,
    #[serde(default)]
    pub log_filter: Option<String>,
}

impl Config {
    pub fn load() -> Result<Self, StoreError> {
        Self::load_from(&Self::get_config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self, StoreError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let config_content = fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&config_content)?;
        Ok(config)
    }

    /// Command line beats the environment, which beats the config file.
    pub fn resolve_api_url(&self, cli_override: Option<&str>, env_override: Option<&str>) -> String {
        [cli_override, env_override, self.api_url.as_deref()]
            .into_iter()
            .flatten()
            .find(|url| !url.trim().is_empty())
            .unwrap_or(DEFAULT_API_URL)
            .to_string()
    }

    /// Same as [`Config::resolve_api_url`], reading the environment itself.
    pub fn api_url(&self, cli_override: Option<&str>) -> String {
        let env_override = std::env::var(API_URL_ENV).ok();
        self.resolve_api_url(cli_override, env_override.as_deref())
    }

    pub fn api_style(&self) -> ApiStyle {
        self.api_style
            .as_deref()
            .and_then(|style| style.parse().ok())
            .unwrap_or_default()
    }

    pub fn required_chain_id(&self) -> u64 {
        self.required_chain_id.unwrap_or(DEFAULT_CHAIN_ID)
    }

    pub fn show_welcome(&self) -> bool {
        self.show_welcome.unwrap_or(true)
    }

    pub fn log_filter(&self) -> &str {
        self.log_filter.as_deref().unwrap_or(DEFAULT_LOG_FILTER)
    }

    fn get_config_path() -> Result<PathBuf, StoreError> {
        Ok(app_config_dir()?.join("config.json"))
    }
}
