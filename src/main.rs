//! The todocrud server binary.
//!
//! Run with:
//!   RUST_LOG=todocrud=debug cargo run
//!
//! Try:
//!   curl -X POST http://localhost:5000/create \
//!        -H 'content-type: application/json' \
//!        -d '{"title":"Buy milk","subtitle":"2%"}'
//!   curl http://localhost:5000/<id>
//!   curl -X PUT http://localhost:5000/<id> -d '{"subtitle":"oat"}'
//!   curl -X DELETE http://localhost:5000/<id>

use std::process::ExitCode;
use std::sync::Arc;

use todocrud::config::Backend;
use todocrud::{Config, Error, MemoryStore, MongoStore, Server, SharedStore, api};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

const DEFAULT_LOG_FILTER: &str = "todocrud=info";

#[tokio::main]
async fn main() -> ExitCode {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "todocrud failed to start");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<(), Error> {
    let config = Config::from_env()?;

    let store: SharedStore = match config.backend {
        Backend::Mongo => Arc::new(MongoStore::connect(&config.store).await?),
        Backend::Memory => {
            warn!("using the in-memory store; todos are lost on exit");
            Arc::new(MemoryStore::new())
        }
    };

    info!(addr = %config.addr, backend = ?config.backend, "starting todocrud");
    Server::bind(config.addr).serve(api::routes(store)).await
}
