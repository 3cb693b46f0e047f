// ABOUTME: Shared helper for loading settings and connecting to the local engine.
// ABOUTME: Used by every command that talks to the engine API.

use dockside::ApiDocker;
use dockside::config::Settings;
use dockside::error::Result;

/// Settings from the working directory's dockside.yml, or defaults.
pub fn load_settings() -> Result<Settings> {
    let cwd = std::env::current_dir()?;
    Settings::discover(&cwd)
}

/// Detect the local runtime and connect to it.
pub fn connect() -> Result<ApiDocker> {
    let api = ApiDocker::connect(load_settings()?)?;
    tracing::debug!("connected to {}", api.runtime_type());
    Ok(api)
}
