use std::env;
use std::net::SocketAddr;
use thiserror::Error;

use crate::YOUTUBE_API_BASE;

pub const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.0-flash";
const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid BIND_ADDR {value:?}: {source}")]
    InvalidBindAddr {
        value: String,
        source: std::net::AddrParseError,
    },
}

/// Runtime settings, read once at startup and passed down explicitly.
#[derive(Debug, Clone)]
pub struct Config {
    /// `None` puts every YouTube pipeline into its no-network degraded mode.
    pub youtube_api_key: Option<String>,
    pub youtube_api_base: String,
    pub gemini_api_key: Option<String>,
    pub gemini_api_base: String,
    pub gemini_model: String,
    pub bind_addr: SocketAddr,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds the config from any variable source. Blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let non_empty_var = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let bind_addr_raw = non_empty_var("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let bind_addr = bind_addr_raw
            .parse()
            .map_err(|source| ConfigError::InvalidBindAddr { value: bind_addr_raw.clone(), source })?;

        Ok(Config {
            youtube_api_key: non_empty_var("YOUTUBE_API_KEY"),
            youtube_api_base: non_empty_var("YOUTUBE_API_BASE").unwrap_or_else(|| YOUTUBE_API_BASE.to_string()),
            gemini_api_key: non_empty_var("GEMINI_API_KEY").or_else(|| non_empty_var("GOOGLE_API_KEY")),
            gemini_api_base: non_empty_var("GEMINI_API_BASE").unwrap_or_else(|| GEMINI_API_BASE.to_string()),
            gemini_model: non_empty_var("GEMINI_MODEL").unwrap_or_else(|| DEFAULT_GEMINI_MODEL.to_string()),
            bind_addr,
        })
    }
}
