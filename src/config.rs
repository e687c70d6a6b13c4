//! Provider configuration
//!
//! The provider block is optional; every field has a default. It can be
//! supplied with `--config FILE` or through a `configure` request.

use crate::error::{ProviderError, Result};
use crate::exec::DEFAULT_SHELL;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Default time running commands get between SIGTERM and SIGKILL on shutdown
pub const DEFAULT_KILL_GRACE_PERIOD_SECS: u64 = 3;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProviderConfig {
    /// Program that runs commands as `<shell> -c <command>`
    pub shell: String,
    pub kill_grace_period_secs: u64,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            shell: DEFAULT_SHELL.to_string(),
            kill_grace_period_secs: DEFAULT_KILL_GRACE_PERIOD_SECS,
        }
    }
}

impl ProviderConfig {
    /// Load configuration from a JSON file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read provider configuration from {:?}", path.as_ref()))?;

        let config: Self = serde_json::from_str(&content)
            .context("Failed to parse provider configuration JSON")?;
        config.validate()?;

        Ok(config)
    }

    /// Build from the provider block of a `configure` request. `null` means
    /// an empty block.
    pub fn from_value(value: Value) -> Result<Self> {
        let config: Self = if value.is_null() {
            Self::default()
        } else {
            serde_json::from_value(value).map_err(|e| ProviderError::config(e.to_string()))?
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.shell.trim().is_empty() {
            return Err(ProviderError::config("shell must not be empty"));
        }
        Ok(())
    }

    pub fn kill_grace_period(&self) -> Duration {
        Duration::from_secs(self.kill_grace_period_secs)
    }
}
