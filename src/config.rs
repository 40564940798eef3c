//! Environment-driven settings for the server and the terminal client

use crate::error::{Result, TrackerError};
use std::net::SocketAddr;
use std::path::PathBuf;

pub const ENV_ADDR: &str = "GYM_TRACKER_ADDR";
pub const ENV_DATA_DIR: &str = "GYM_TRACKER_DATA_DIR";
pub const ENV_JWT_SECRET: &str = "GYM_TRACKER_JWT_SECRET";
pub const ENV_TOKEN_TTL_MINUTES: &str = "GYM_TRACKER_TOKEN_TTL_MINUTES";
pub const ENV_URL: &str = "GYM_TRACKER_URL";
pub const ENV_TOKEN_FILE: &str = "GYM_TRACKER_TOKEN_FILE";

pub const DEFAULT_DATA_DIR: &str = "database";
pub const DEFAULT_TOKEN_TTL_MINUTES: i64 = 15;
/// Longest accepted token lifetime: one year
pub const MAX_TOKEN_TTL_MINUTES: i64 = 525_600;
pub const DEFAULT_URL: &str = "http://localhost:5000";
pub const DEFAULT_TOKEN_FILE: &str = ".gym_tracker_token";

/// Server settings
#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    /// Address the HTTP listener binds to
    pub bind_addr: SocketAddr,

    /// Directory holding `users.json` and per-user workout logs
    pub data_dir: PathBuf,

    /// Token signing secret; `None` means a random one is generated at startup
    pub jwt_secret: Option<String>,

    /// Lifetime of issued access tokens, in minutes
    pub token_ttl_minutes: i64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 5000)),
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            jwt_secret: None,
            token_ttl_minutes: DEFAULT_TOKEN_TTL_MINUTES,
        }
    }
}

impl ServerConfig {
    /// Read settings from the process environment
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build settings from an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = ServerConfig::default();

        if let Some(addr) = lookup(ENV_ADDR) {
            config.bind_addr = addr.parse().map_err(|_| {
                TrackerError::Config(format!("{} is not a socket address: {}", ENV_ADDR, addr))
            })?;
        }
        if let Some(dir) = lookup(ENV_DATA_DIR).filter(|d| !d.is_empty()) {
            config.data_dir = PathBuf::from(dir);
        }
        config.jwt_secret = lookup(ENV_JWT_SECRET).filter(|s| !s.is_empty());
        if let Some(ttl) = lookup(ENV_TOKEN_TTL_MINUTES) {
            config.token_ttl_minutes = parse_ttl(&ttl)?;
        }

        Ok(config)
    }
}

/// Parse a token lifetime in minutes
///
/// # Arguments
///
/// * `value` - Raw text from the environment or the command line
///
/// # Returns
///
/// * `Result<i64>` - The lifetime, or `Config` unless it is a whole number
///   between 1 and [`MAX_TOKEN_TTL_MINUTES`]
pub fn parse_ttl(value: &str) -> Result<i64> {
    let minutes = value.trim().parse::<i64>().map_err(|_| {
        TrackerError::Config(format!(
            "{} must be a positive number of minutes, got {:?}",
            ENV_TOKEN_TTL_MINUTES, value
        ))
    })?;
    check_ttl(minutes)
}

/// Reject token lifetimes outside `1..=MAX_TOKEN_TTL_MINUTES`
pub fn check_ttl(minutes: i64) -> Result<i64> {
    if (1..=MAX_TOKEN_TTL_MINUTES).contains(&minutes) {
        Ok(minutes)
    } else {
        Err(TrackerError::Config(format!(
            "{} must be between 1 and {} minutes, got {}",
            ENV_TOKEN_TTL_MINUTES, MAX_TOKEN_TTL_MINUTES, minutes
        )))
    }
}

/// Terminal client settings
#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    /// Base URL of the tracker API
    pub base_url: String,

    /// File the access token is kept in between invocations
    pub token_file: PathBuf,
}

impl Default for ClientConfig {
    fn default() -> Self {
        ClientConfig {
            base_url: DEFAULT_URL.to_string(),
            token_file: PathBuf::from(DEFAULT_TOKEN_FILE),
        }
    }
}

impl ClientConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = ClientConfig::default();
        if let Some(url) = lookup(ENV_URL).filter(|u| !u.is_empty()) {
            config.base_url = url.trim_end_matches('/').to_string();
        }
        if let Some(path) = lookup(ENV_TOKEN_FILE).filter(|p| !p.is_empty()) {
            config.token_file = PathBuf::from(path);
        }
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn server_defaults() {
        let config = ServerConfig::from_lookup(|_| None).unwrap();
        assert_eq!(config, ServerConfig::default());
        assert_eq!(config.bind_addr.port(), 5000);
        assert_eq!(config.token_ttl_minutes, 15);
    }

    #[test]
    fn server_overrides() {
        let vars = env(&[
            (ENV_ADDR, "0.0.0.0:8080"),
            (ENV_DATA_DIR, "/tmp/gym"),
            (ENV_JWT_SECRET, "s3cret"),
            (ENV_TOKEN_TTL_MINUTES, "60"),
        ]);
        let config = ServerConfig::from_lookup(|k| vars.get(k).cloned()).unwrap();
        assert_eq!(config.bind_addr.port(), 8080);
        assert_eq!(config.data_dir, PathBuf::from("/tmp/gym"));
        assert_eq!(config.jwt_secret.as_deref(), Some("s3cret"));
        assert_eq!(config.token_ttl_minutes, 60);
    }

    #[test]
    fn server_rejects_bad_values() {
        let vars = env(&[(ENV_ADDR, "localhost")]);
        assert!(ServerConfig::from_lookup(|k| vars.get(k).cloned()).is_err());

        let vars = env(&[(ENV_TOKEN_TTL_MINUTES, "0")]);
        assert!(matches!(
            ServerConfig::from_lookup(|k| vars.get(k).cloned()),
            Err(TrackerError::Config(_))
        ));
    }

    #[test]
    fn oversized_ttl_is_a_config_error() {
        for value in ["1000000000000", &i64::MAX.to_string(), "525601", "ten"] {
            assert!(
                matches!(parse_ttl(value), Err(TrackerError::Config(_))),
                "{}",
                value
            );
        }
        assert_eq!(parse_ttl("525600").unwrap(), MAX_TOKEN_TTL_MINUTES);
        assert_eq!(parse_ttl(" 30 ").unwrap(), 30);
        assert!(check_ttl(-5).is_err());
    }

    #[test]
    fn empty_secret_means_generated() {
        let vars = env(&[(ENV_JWT_SECRET, "")]);
        let config = ServerConfig::from_lookup(|k| vars.get(k).cloned()).unwrap();
        assert!(config.jwt_secret.is_none());
    }

    #[test]
    fn client_overrides() {
        let vars = env(&[
            (ENV_URL, "https://gym.example.com/"),
            (ENV_TOKEN_FILE, "/tmp/token"),
        ]);
        let config = ClientConfig::from_lookup(|k| vars.get(k).cloned());
        assert_eq!(config.base_url, "https://gym.example.com");
        assert_eq!(config.token_file, PathBuf::from("/tmp/token"));
        assert_eq!(ClientConfig::from_lookup(|_| None), ClientConfig::default());
    }
}
