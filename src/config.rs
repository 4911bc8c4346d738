//! Process configuration.
//!
//! Every setting has a default that matches a local development setup
//! (MongoDB on `127.0.0.1:27017`, HTTP on port 5000). Environment variables
//! override the defaults:
//!
//! | Variable | Default |
//! |---|---|
//! | `TODOCRUD_ADDR` | `0.0.0.0:5000` |
//! | `TODOCRUD_MONGO_URI` | `mongodb://127.0.0.1:27017` |
//! | `TODOCRUD_DATABASE` | `todocrud` |
//! | `TODOCRUD_MONGO_TIMEOUT_SECS` | `5` |
//! | `TODOCRUD_STORE` | `mongo` (or `memory`) |

use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

pub const DEFAULT_ADDR: &str = "0.0.0.0:5000";
pub const DEFAULT_MONGO_URI: &str = "mongodb://127.0.0.1:27017";
pub const DEFAULT_DATABASE: &str = "todocrud";
const DEFAULT_TIMEOUT_SECS: u64 = 5;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var}: invalid value {value:?}: {reason}")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },
}

/// Which [`TodoStore`](crate::store::TodoStore) backend to run against.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum Backend {
    #[default]
    Mongo,
    Memory,
}

impl FromStr for Backend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "mongo" | "mongodb" => Ok(Self::Mongo),
            "memory" => Ok(Self::Memory),
            other => Err(format!("unknown store backend `{other}` (expected `mongo` or `memory`)")),
        }
    }
}

/// Connection settings for the MongoDB store.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct StoreConfig {
    pub uri: String,
    pub database: String,
    /// How long the driver waits for a usable server before an operation fails.
    pub server_selection_timeout: Duration,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Config {
    pub addr: SocketAddr,
    pub backend: Backend,
    pub store: StoreConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            addr: SocketAddr::from(([0, 0, 0, 0], 5000)),
            backend: Backend::Mongo,
            store: StoreConfig {
                uri: DEFAULT_MONGO_URI.to_owned(),
                database: DEFAULT_DATABASE.to_owned(),
                server_selection_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            },
        }
    }
}

impl Config {
    /// Reads the process environment on top of [`Config::default`].
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Same as [`from_env`](Config::from_env) with an explicit variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(addr) = lookup("TODOCRUD_ADDR") {
            config.addr = parse("TODOCRUD_ADDR", addr)?;
        }
        if let Some(backend) = lookup("TODOCRUD_STORE") {
            config.backend = parse("TODOCRUD_STORE", backend)?;
        }
        if let Some(uri) = lookup("TODOCRUD_MONGO_URI") {
            config.store.uri = uri;
        }
        if let Some(database) = lookup("TODOCRUD_DATABASE") {
            if database.is_empty() {
                return Err(ConfigError::Invalid {
                    var: "TODOCRUD_DATABASE",
                    value: database,
                    reason: "database name must not be empty".to_owned(),
                });
            }
            config.store.database = database;
        }
        if let Some(secs) = lookup("TODOCRUD_MONGO_TIMEOUT_SECS") {
            let secs: u64 = parse("TODOCRUD_MONGO_TIMEOUT_SECS", secs)?;
            config.store.server_selection_timeout = Duration::from_secs(secs);
        }

        Ok(config)
    }
}

fn parse<T>(var: &'static str, value: String) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: ToString,
{
    let parsed = value.trim().parse::<T>();
    parsed.map_err(|e| ConfigError::Invalid {
        var,
        reason: e.to_string(),
        value,
    })
}
