use std::{env, net::SocketAddr, path::PathBuf};

use thiserror::Error;

pub const DEFAULT_BIND_PORT: u16 = 5000;
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 100 * 1024 * 1024;

#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: String,
    pub bind_port: u16,
    pub upload_dir: PathBuf,
    pub converted_dir: PathBuf,
    pub public_base_url: String,
    pub max_upload_bytes: usize,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("BIND_PORT must be a valid u16")]
    InvalidPort,
    #[error("MAX_UPLOAD_BYTES must be a positive integer")]
    InvalidUploadLimit,
    #[error("{0} must not be empty")]
    EmptyDirectory(&'static str),
    #[error("invalid bind address or port")]
    InvalidSocket,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup, falling back to
    /// the historical fixed values for every unset key.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let bind_addr = lookup("BIND_ADDR").unwrap_or_else(|| "127.0.0.1".to_string());
        let bind_port = lookup("BIND_PORT")
            .map(|value| {
                value
                    .trim()
                    .parse::<u16>()
                    .map_err(|_| ConfigError::InvalidPort)
            })
            .transpose()?
            .unwrap_or(DEFAULT_BIND_PORT);

        let upload_dir = directory(&lookup, "UPLOAD_DIR", "uploads")?;
        let converted_dir = directory(&lookup, "CONVERTED_DIR", "converted_models")?;

        let public_base_url = lookup("PUBLIC_BASE_URL")
            .map(|value| value.trim().trim_end_matches('/').to_string())
            .filter(|value| !value.is_empty())
            .unwrap_or_else(|| format!("http://localhost:{bind_port}"));

        let max_upload_bytes = lookup("MAX_UPLOAD_BYTES")
            .map(|value| {
                value
                    .trim()
                    .parse::<usize>()
                    .ok()
                    .filter(|limit| *limit > 0)
                    .ok_or(ConfigError::InvalidUploadLimit)
            })
            .transpose()?
            .unwrap_or(DEFAULT_MAX_UPLOAD_BYTES);

        let config = Self {
            bind_addr,
            bind_port,
            upload_dir,
            converted_dir,
            public_base_url,
            max_upload_bytes,
        };

        let _ = config.bind_socket()?;
        Ok(config)
    }

    pub fn bind_socket(&self) -> Result<SocketAddr, ConfigError> {
        format!("{}:{}", self.bind_addr, self.bind_port)
            .parse::<SocketAddr>()
            .map_err(|_| ConfigError::InvalidSocket)
    }

    pub fn download_url(&self, filename: &str) -> String {
        format!("{}/models/{}", self.public_base_url, filename)
    }
}

fn directory<F>(lookup: &F, key: &'static str, default: &str) -> Result<PathBuf, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(value) if value.trim().is_empty() => Err(ConfigError::EmptyDirectory(key)),
        Some(value) => Ok(PathBuf::from(value.trim())),
        None => Ok(PathBuf::from(default)),
    }
}
