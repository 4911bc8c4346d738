//! Radix-tree request router.
//!
//! One tree per HTTP method, O(path-length) lookup via [`matchit`]. Static
//! segments win over parameters, so `/healthz` and `/{id}` coexist.

use std::collections::HashMap;
use std::sync::Arc;

use bytes::Bytes;
use http::{Method, StatusCode};
use matchit::Router as MatchitRouter;

use crate::handler::{BoxedHandler, Handler};
use crate::request::Request;
use crate::response::Response;

/// The application router.
///
/// Build it once at startup; pass it to [`Server::serve`](crate::Server::serve).
/// Each [`Router::on`] call returns `self` so registrations chain naturally.
pub struct Router {
    routes: HashMap<Method, MatchitRouter<BoxedHandler>>,
}

impl Router {
    pub fn new() -> Self {
        Self { routes: HashMap::new() }
    }

    /// Register a handler for a method + path pair. Returns `self` for chaining.
    ///
    /// Path parameters use `{name}` syntax; `req.param("name")` retrieves them.
    ///
    /// # Panics
    ///
    /// Panics if `path` is not a valid route or conflicts with one already
    /// registered for `method`. Routes are fixed at startup, so this is a
    /// programming error.
    pub fn on(mut self, method: Method, path: &str, handler: impl Handler) -> Self {
        self.routes
            .entry(method)
            .or_default()
            .insert(path, handler.into_boxed_handler())
            .unwrap_or_else(|e| panic!("invalid route `{path}`: {e}"));
        self
    }

    pub(crate) fn lookup(
        &self,
        method: &Method,
        path: &str,
    ) -> Option<(BoxedHandler, HashMap<String, String>)> {
        let tree = self.routes.get(method)?;
        let matched = tree.at(path).ok()?;
        let handler = Arc::clone(matched.value);
        let params = matched.params.iter()
            .map(|(k, v)| (k.to_owned(), v.to_owned()))
            .collect();
        Some((handler, params))
    }

    /// Methods with a route matching `path`, sorted.
    fn allowed(&self, path: &str) -> Vec<&str> {
        let mut allowed: Vec<&str> = self.routes.iter()
            .filter(|(_, tree)| tree.at(path).is_ok())
            .map(|(m, _)| m.as_str())
            .collect();
        allowed.sort_unstable();
        allowed
    }

    /// Routes one request and produces one response.
    ///
    /// Unknown paths get `404`; a path routed only for other methods gets
    /// `405` with an `allow` header.
    pub async fn handle(&self, req: http::Request<Bytes>) -> Response {
        let path = req.uri().path().to_owned();

        if let Some((handler, params)) = self.lookup(req.method(), &path) {
            return handler.call(Request::new(req, params)).await;
        }

        let allowed = self.allowed(&path);
        if allowed.is_empty() {
            return Response::status(StatusCode::NOT_FOUND);
        }
        Response::builder()
            .status(StatusCode::METHOD_NOT_ALLOWED)
            .header("allow", &allowed.join(", "))
            .no_body()
    }
}

impl Default for Router {
    fn default() -> Self { Self::new() }
}
