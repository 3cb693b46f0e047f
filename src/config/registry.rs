// ABOUTME: Registry credentials used for push, pull, and login.
// ABOUTME: The password may be read from the environment.

use super::EnvValue;
use crate::error::Result;
use crate::runtime::RegistryAuth;
use serde::Deserialize;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RegistrySettings {
    /// Registry host, e.g. `ghcr.io`. Docker Hub when absent.
    #[serde(default)]
    pub server: Option<String>,

    pub username: String,

    pub password: EnvValue,
}

impl RegistrySettings {
    /// Resolve the password and build engine credentials.
    pub fn auth(&self) -> Result<RegistryAuth> {
        Ok(RegistryAuth {
            username: self.username.clone(),
            password: self.password.resolve()?,
            server: self.server.clone(),
        })
    }
}
