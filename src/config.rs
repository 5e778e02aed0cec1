use crate::{MockError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::warn;

/// Default configuration file name
pub const DEFAULT_CONFIG_FILE: &str = ".static-double.toml";

/// Callee of the call-recording statement spliced into every replacement body.
pub const DEFAULT_RECORDER_HOOK: &str = "\\StaticDouble\\CallRecorder::record";

/// Text between the method name and the random suffix of an alias.
pub const DEFAULT_ALIAS_INFIX: &str = "override";

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct MockConfig {
    #[serde(default)]
    pub mock: ActivationConfig,
    #[serde(default)]
    pub recorder: RecorderConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ActivationConfig {
    /// Static method the host runtime routes to `MockSession::record_call`
    #[serde(default = "default_recorder_hook")]
    pub recorder_hook: String,
    /// Alias infix for the saved unmocked method
    #[serde(default = "default_alias_infix")]
    pub alias_infix: String,
    /// Statement placed first in every rewritten body
    #[serde(default)]
    pub instrumentation_prefix: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct RecorderConfig {
    /// Reject calls whose arguments have no canonical encoding instead of
    /// counting them in the unkeyed bucket
    #[serde(default)]
    pub strict_keys: bool,
}

fn default_recorder_hook() -> String {
    DEFAULT_RECORDER_HOOK.to_string()
}

fn default_alias_infix() -> String {
    DEFAULT_ALIAS_INFIX.to_string()
}

impl Default for ActivationConfig {
    fn default() -> Self {
        Self {
            recorder_hook: default_recorder_hook(),
            alias_infix: default_alias_infix(),
            instrumentation_prefix: None,
        }
    }
}

impl MockConfig {
    /// Load configuration from a file in the project root
    pub fn load() -> Result<Self> {
        Self::load_from(Path::new(DEFAULT_CONFIG_FILE))
    }

    /// Load configuration from an explicit path; a missing file yields defaults
    pub fn load_from(config_path: &Path) -> Result<Self> {
        if !config_path.exists() {
            return Ok(MockConfig::default());
        }

        let content = fs::read_to_string(config_path).map_err(|e| {
            MockError::ConfigFile(format!(
                "Failed to read config file {:?}: {}",
                config_path, e
            ))
        })?;

        Self::from_toml(&content).map_err(|e| match e {
            MockError::ConfigFile(msg) => {
                MockError::ConfigFile(format!("{} (in {:?})", msg, config_path))
            }
            other => other,
        })
    }

    /// Parse configuration from TOML text
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content)
            .map_err(|e| MockError::ConfigFile(format!("Failed to parse TOML config: {}", e)))
    }

    /// Load default config if file is missing, otherwise return error on parse failure
    pub fn load_or_default() -> Self {
        match Self::load() {
            Ok(config) => config,
            Err(e) => {
                warn!("Warning: Failed to load config: {}. Using defaults.", e);
                MockConfig::default()
            }
        }
    }
}
