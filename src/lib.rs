//! # todocrud
//!
//! A small HTTP CRUD service for todos, stored in MongoDB.
//!
//! The crate carries its own thin HTTP layer (radix-tree [`Router`], typed
//! [`Request`]/[`Response`], a hyper-backed [`Server`] with graceful
//! shutdown) and the todo service built on it: [`api::routes`] wires the four
//! endpoints to any [`TodoStore`].
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use todocrud::{Config, MongoStore, Server, api};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), todocrud::Error> {
//!     let config = Config::from_env()?;
//!     let store = MongoStore::connect(&config.store).await?;
//!
//!     Server::bind(config.addr)
//!         .serve(api::routes(Arc::new(store)))
//!         .await
//! }
//! ```
//!
//! ## Testing without MongoDB
//!
//! ```rust
//! use std::sync::Arc;
//! use bytes::Bytes;
//! use todocrud::{MemoryStore, StatusCode, api};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let app = api::routes(Arc::new(MemoryStore::new()));
//! let req = http::Request::builder()
//!     .method("POST")
//!     .uri("/create")
//!     .body(Bytes::from_static(br#"{"title":"Buy milk","subtitle":"2%"}"#))
//!     .unwrap();
//!
//! assert_eq!(app.handle(req).await.status_code(), StatusCode::OK);
//! # }
//! ```

mod error;
mod handler;
mod request;
mod response;
mod router;
mod server;

pub mod api;
pub mod config;
pub mod health;
pub mod store;
pub mod todo;

pub use config::Config;
pub use error::Error;
pub use handler::{Handler, with_state};
pub use http::{Method, StatusCode};
pub use request::Request;
pub use response::{IntoResponse, Json, Response, ResponseBuilder};
pub use router::Router;
pub use server::{Server, serve_with_shutdown};
pub use store::{MemoryStore, MongoStore, SharedStore, StoreError, TodoStore};
pub use todo::{Todo, TodoId};
