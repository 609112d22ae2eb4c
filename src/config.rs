//! Configuration module
//!
//! Loads configuration from environment variables once at startup. The
//! resulting value is passed by reference to the components that need it.

use std::env;
use std::fmt;

use chrono::Duration;

/// Application configuration
#[derive(Clone)]
pub struct Config {
    /// Database connection URL
    pub database_url: String,

    /// Maximum database connections in pool
    pub database_max_connections: u32,

    /// Server host
    pub host: String,

    /// Server port
    pub port: u16,

    /// Environment (development, production)
    pub environment: String,

    /// HMAC key used to sign bearer tokens
    pub token_secret: String,

    /// Bearer token lifetime in seconds
    pub token_ttl_seconds: i64,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup("DATABASE_URL").ok_or(ConfigError::MissingEnv("DATABASE_URL"))?;

        let database_max_connections = lookup("DATABASE_MAX_CONNECTIONS")
            .unwrap_or_else(|| "10".to_string())
            .parse()
            .map_err(|_| ConfigError::InvalidValue("DATABASE_MAX_CONNECTIONS"))?;

        let host = lookup("HOST").unwrap_or_else(|| "127.0.0.1".to_string());

        let port = lookup("PORT")
            .unwrap_or_else(|| "3000".to_string())
            .parse()
            .map_err(|_| ConfigError::InvalidValue("PORT"))?;

        let environment = lookup("ENVIRONMENT").unwrap_or_else(|| "development".to_string());

        let token_secret = lookup("TOKEN_SECRET").ok_or(ConfigError::MissingEnv("TOKEN_SECRET"))?;
        if token_secret.is_empty() {
            return Err(ConfigError::InvalidValue("TOKEN_SECRET"));
        }

        let token_ttl_seconds: i64 = lookup("TOKEN_TTL_SECONDS")
            .unwrap_or_else(|| "3600".to_string())
            .parse()
            .map_err(|_| ConfigError::InvalidValue("TOKEN_TTL_SECONDS"))?;
        // Upper bound keeps `Duration::seconds` in range
        if !(0..=i64::from(u32::MAX)).contains(&token_ttl_seconds) {
            return Err(ConfigError::InvalidValue("TOKEN_TTL_SECONDS"));
        }

        Ok(Self {
            database_url,
            database_max_connections,
            host,
            port,
            environment,
            token_secret,
            token_ttl_seconds,
        })
    }

    /// Check if running in production
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    pub fn token_ttl(&self) -> Duration {
        Duration::seconds(self.token_ttl_seconds)
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("database_url", &"[REDACTED]")
            .field("database_max_connections", &self.database_max_connections)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("environment", &self.environment)
            .field("token_secret", &"[REDACTED]")
            .field("token_ttl_seconds", &self.token_ttl_seconds)
            .finish()
    }
}

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnv(&'static str),

    #[error("Invalid value for environment variable: {0}")]
    InvalidValue(&'static str),
}
