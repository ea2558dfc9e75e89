use std::{io, path::Path};

use serde::{Deserialize, Serialize};
use tracing::info;

#[cfg(feature = "rest")]
use crate::actors::rest;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[cfg(feature = "rest")]
    #[serde(default)]
    pub rest: rest::Config,
}

impl Config {
    /// Loads a config from a JSON file. Sections missing from the file keep their defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let data = std::fs::read(path).map_err(|cause| ConfigError::IO {
            message: format!("failed to read config file: {}", path.display()),
            cause,
        })?;
        let config = serde_json::from_slice(&data)?;
        info!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub(crate) fn validate(&self) -> Result<(), String> {
        #[cfg(feature = "rest")]
        if self.rest.request_timeout.is_zero() {
            return Err("request timeout must be greater than zero".to_string());
        }
        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {message}: {cause}")]
    IO { message: String, cause: io::Error },
    #[error("Invalid config file: {0}")]
    Parse(#[from] serde_json::Error),
}
