// ABOUTME: Configuration types and parsing for dockside.yml.
// ABOUTME: Runtime override, CLI shell-out, wait policy, and registry credentials.

mod cli;
mod env_value;
mod init;
mod registry;
mod wait;

pub use cli::CliSettings;
pub use env_value::EnvValue;
pub use init::{init_config, template_yaml};
pub use registry::RegistrySettings;
pub use wait::WaitPolicy;

use crate::error::Result;
use crate::runtime::RuntimeConfig;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const CONFIG_FILENAME: &str = "dockside.yml";
pub const CONFIG_FILENAME_ALT: &str = "dockside.yaml";
pub const CONFIG_FILENAME_DIR: &str = ".dockside/config.yml";

/// Everything configurable about the façade. Every field has a default, so
/// an empty file (or none at all) is valid.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Settings {
    /// Explicit runtime and socket, overriding detection.
    #[serde(default)]
    pub runtime: RuntimeConfig,

    #[serde(default)]
    pub cli: CliSettings,

    #[serde(default)]
    pub wait: WaitPolicy,

    /// Grace period given to a container before it is killed on stop.
    #[serde(default = "default_stop_timeout", with = "humantime_serde")]
    pub stop_timeout: Duration,

    #[serde(default)]
    pub registry: Option<RegistrySettings>,
}

fn default_stop_timeout() -> Duration {
    Duration::from_secs(10)
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            runtime: RuntimeConfig::default(),
            cli: CliSettings::default(),
            wait: WaitPolicy::default(),
            stop_timeout: default_stop_timeout(),
            registry: None,
        }
    }
}

impl Settings {
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        // serde_yaml reads an empty document as unit, not as an empty map.
        if yaml.trim().is_empty() {
            return Ok(Settings::default());
        }
        Ok(serde_yaml::from_str(yaml)?)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// The first config file found in `dir`, if any.
    pub fn find(dir: &Path) -> Option<PathBuf> {
        [
            dir.join(CONFIG_FILENAME),
            dir.join(CONFIG_FILENAME_ALT),
            dir.join(CONFIG_FILENAME_DIR),
        ]
        .into_iter()
        .find(|path| path.exists())
    }

    /// Load the config file in `dir`, or defaults when there is none.
    pub fn discover(dir: &Path) -> Result<Self> {
        match Self::find(dir) {
            Some(path) => {
                tracing::debug!("loading settings from {}", path.display());
                Self::load(&path)
            }
            None => Ok(Settings::default()),
        }
    }

    /// The runtime override, or `None` when detection should decide.
    pub fn runtime_override(&self) -> Option<&RuntimeConfig> {
        if self.runtime.runtime.is_none() && self.runtime.socket.is_none() {
            None
        } else {
            Some(&self.runtime)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_yaml_is_default() {
        assert_eq!(Settings::from_yaml("").unwrap(), Settings::default());
        assert!(Settings::default().runtime_override().is_none());
    }
}
