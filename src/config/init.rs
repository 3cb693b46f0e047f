// ABOUTME: Config scaffolding for new projects.
// ABOUTME: Writes a commented dockside.yml holding the default settings.

use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

use super::CONFIG_FILENAME;

/// Write the template to `dir/dockside.yml`. Refuses to overwrite unless `force`.
pub fn init_config(dir: &Path, force: bool) -> Result<PathBuf> {
    let config_path = dir.join(CONFIG_FILENAME);

    if config_path.exists() && !force {
        return Err(Error::AlreadyExists(config_path));
    }

    std::fs::write(&config_path, template_yaml())?;
    tracing::info!("wrote {}", config_path.display());

    Ok(config_path)
}

/// The template written by `dockside init`. Parses to the default settings.
pub fn template_yaml() -> &'static str {
    r#"# Runtime selection (auto-detected when omitted)
# runtime:
#   runtime: podman
#   socket: /run/user/1000/podman/podman.sock

cli:
  # binary: docker
  # run_timeout: 5m
  debug: false

wait:
  interval: 200ms
  attempts: 10

stop_timeout: 10s

# registry:
#   server: ghcr.io
#   username: deploy
#   password:
#     env: REGISTRY_PASSWORD
"#
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;

    #[test]
    fn template_parses_to_defaults() {
        let parsed = Settings::from_yaml(template_yaml()).unwrap();
        assert_eq!(parsed, Settings::default());
    }

    #[test]
    fn init_refuses_to_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let path = init_config(dir.path(), false).unwrap();
        assert!(path.ends_with(CONFIG_FILENAME));

        let err = init_config(dir.path(), false).unwrap_err();
        assert!(matches!(err, Error::AlreadyExists(_)));
        assert!(init_config(dir.path(), true).is_ok());
    }
}
