//! Configuration for the artists service.
//!
//! All configuration is loaded from environment variables. Lookups go
//! through a function so tests can supply a map instead of touching the
//! process environment.

use std::time::Duration;

use gostream_store::MongoConfig;

use crate::server::ServerConfig;

/// Application name reported to `MongoDB`.
const APP_NAME: &str = "gostream-artists";

/// Errors raised while loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A required variable is not set.
    #[error("missing required env var {0}")]
    Missing(&'static str),

    /// A variable is set but cannot be parsed.
    #[error("invalid {name}: {reason}")]
    Invalid {
        /// Variable name.
        name: &'static str,
        /// Parse failure.
        reason: String,
    },
}

/// Complete service configuration.
#[derive(Clone)]
pub struct ServiceConfig {
    /// Address to bind the HTTP listener to.
    pub bind_host: String,
    /// TCP port to listen on.
    pub port: u16,
    /// `MongoDB` `host:port`.
    pub mongo_host: String,
    /// `MongoDB` username.
    pub mongo_username: String,
    /// `MongoDB` password.
    pub mongo_password: String,
    /// Database holding the artists collection.
    pub database: String,
    /// Collection holding artist documents.
    pub collection: String,
    /// Per-request store deadline. `None` disables it.
    pub request_timeout: Option<Duration>,
}

impl ServiceConfig {
    /// Load configuration from environment variables.
    ///
    /// Required variables:
    /// - `MONGO_USERNAME` -- `MongoDB` user
    /// - `MONGO_PASSWORD` -- `MongoDB` password
    ///
    /// Optional variables:
    /// - `PORT` -- listen port (default 9871)
    /// - `BIND_HOST` -- listen address (default `0.0.0.0`)
    /// - `MONGO_HOST` -- `MongoDB` `host:port` (default `127.0.0.1:27017`)
    /// - `MONGO_DATABASE` -- database name (default `gostream`)
    /// - `MONGO_COLLECTION` -- collection name (default `artists`)
    /// - `REQUEST_TIMEOUT_MS` -- store deadline per request in milliseconds
    ///   (default 5000, `0` disables)
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through `lookup`, which returns a variable's
    /// value or `None` when it is unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |name: &'static str| lookup(name).ok_or(ConfigError::Missing(name));
        let optional =
            |name: &'static str, default: &str| lookup(name).unwrap_or_else(|| default.to_owned());

        let port = parse("PORT", &optional("PORT", "9871"))?;
        let timeout_ms: u64 = parse("REQUEST_TIMEOUT_MS", &optional("REQUEST_TIMEOUT_MS", "5000"))?;

        Ok(Self {
            bind_host: optional("BIND_HOST", "0.0.0.0"),
            port,
            mongo_host: optional("MONGO_HOST", "127.0.0.1:27017"),
            mongo_username: required("MONGO_USERNAME")?,
            mongo_password: required("MONGO_PASSWORD")?,
            database: optional("MONGO_DATABASE", "gostream"),
            collection: optional("MONGO_COLLECTION", "artists"),
            request_timeout: (timeout_ms > 0).then(|| Duration::from_millis(timeout_ms)),
        })
    }

    /// Client configuration for the artists database.
    pub fn mongo(&self) -> MongoConfig {
        MongoConfig::for_host(&self.mongo_host, &self.mongo_username, &self.mongo_password)
            .with_app_name(APP_NAME)
    }

    /// HTTP listener configuration.
    pub fn server(&self) -> ServerConfig {
        ServerConfig {
            host: self.bind_host.clone(),
            port: self.port,
        }
    }
}

impl std::fmt::Debug for ServiceConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceConfig")
            .field("bind_host", &self.bind_host)
            .field("port", &self.port)
            .field("mongo_host", &self.mongo_host)
            .field("mongo_username", &self.mongo_username)
            .field("database", &self.database)
            .field("collection", &self.collection)
            .field("request_timeout", &self.request_timeout)
            .finish_non_exhaustive()
    }
}

fn parse<T>(name: &'static str, raw: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
        name,
        reason: e.to_string(),
    })
}
