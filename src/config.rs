use std::net::SocketAddr;
use std::time::Duration;

use thiserror::Error;

pub const SITE_ADDR_VAR: &str = "HACKBOX_SITE_ADDR";
pub const DEFAULT_SITE_ADDR: &str = "0.0.0.0:3000";
pub const SESSION_IDLE_VAR: &str = "HACKBOX_SESSION_IDLE_SECS";
pub const DEFAULT_SESSION_IDLE_SECS: u64 = 1800;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid {var} value '{value}': {reason}")]
    InvalidAddr {
        var: &'static str,
        value: String,
        reason: String,
    },
    #[error("invalid {var} value '{value}': expected a positive number of seconds")]
    InvalidSeconds { var: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub site_addr: SocketAddr,
    /// Sessions untouched for this long are evicted.
    pub session_idle: Duration,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup, falling back to defaults for
    /// unset keys.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let value = lookup(SITE_ADDR_VAR).unwrap_or_else(|| DEFAULT_SITE_ADDR.to_string());
        let site_addr = value
            .trim()
            .parse::<SocketAddr>()
            .map_err(|e| ConfigError::InvalidAddr {
                var: SITE_ADDR_VAR,
                reason: e.to_string(),
                value,
            })?;

        let session_idle = match lookup(SESSION_IDLE_VAR) {
            None => Duration::from_secs(DEFAULT_SESSION_IDLE_SECS),
            Some(value) => match value.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => Duration::from_secs(secs),
                _ => {
                    return Err(ConfigError::InvalidSeconds {
                        var: SESSION_IDLE_VAR,
                        value,
                    })
                }
            },
        };

        Ok(Self {
            site_addr,
            session_idle,
        })
    }
}
