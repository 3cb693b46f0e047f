// ABOUTME: Settings for shelling out to the engine's CLI binary.
// ABOUTME: Binary name, per-invocation timeout, and command echo.

use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct CliSettings {
    /// CLI binary to run. Defaults to the detected runtime's (`docker` or `podman`).
    #[serde(default)]
    pub binary: Option<String>,

    /// Kill `run` invocations that take longer than this.
    #[serde(default, with = "humantime_serde")]
    pub run_timeout: Option<Duration>,

    /// Log every assembled command at info level.
    #[serde(default)]
    pub debug: bool,
}
