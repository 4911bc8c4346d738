//! Unified startup error type.

use thiserror::Error;

use crate::config::ConfigError;
use crate::store::StoreError;

/// The error type returned by todocrud's fallible startup operations.
///
/// Request-level failures (duplicate title, unknown id, store hiccups) are
/// expressed as HTTP [`Response`](crate::Response) values through
/// [`ApiError`](crate::api::ApiError), not as `Error`s. This type surfaces
/// infrastructure failures: reading configuration, reaching the database,
/// binding to a port.
#[derive(Debug, Error)]
pub enum Error {
    #[error("config: {0}")]
    Config(#[from] ConfigError),

    #[error("store: {0}")]
    Store(#[from] StoreError),

    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}
