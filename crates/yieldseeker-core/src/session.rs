//! Persisted wallet session, so a still-valid login survives restarts.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;

use crate::config::app_config_dir;
use crate::error::StoreError;
use crate::guard::AuthSignals;

static ADDRESS_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^0x[0-9a-fA-F]{40}$").expect("address pattern compiles"));

/// `0x` followed by 40 hex digits.
pub fn is_valid_address(account: &str) -> bool {
    ADDRESS_PATTERN.is_match(account)
}

pub fn validate_address(account: &str) -> Result<String, StoreError> {
    let account = account.trim();
    if is_valid_address(account) {
        Ok(account.to_string())
    } else {
        Err(StoreError::InvalidAddress(account.to_string()))
    }
}

pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    pub fn new() -> Result<Self, StoreError> {
        Ok(Self::at(app_config_dir()?.join("session.json")))
    }

    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> Result<AuthSignals, StoreError> {
        if !self.path.exists() {
            return Ok(AuthSignals::default());
        }

        let content = fs::read_to_string(&self.path)?;
        Ok(serde_json::from_str(&content)?)
    }

    pub fn save(&self, signals: &AuthSignals) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(signals)?;
        fs::write(&self.path, content)?;
        Ok(())
    }

    pub fn clear(&self) -> Result<(), StoreError> {
        if self.path.exists() {
            fs::remove_file(&self.path)?;
        }
        Ok(())
    }
}
