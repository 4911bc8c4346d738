//! Handler trait and type erasure.
//!
//! The router holds handlers of different concrete types in one
//! `HashMap<Method, Tree>`, so each handler is boxed behind the
//! [`ErasedHandler`] trait object:
//!
//! ```text
//! async fn get_todo(store, req) -> Result<Json<Todo>, ApiError>
//!        ↓ with_state(store, get_todo)
//! move |req| get_todo(store.clone(), req)          ← plain Fn(Request) -> Fut
//!        ↓ router.on(Method::GET, "/{id}", …)
//! Arc::new(FnHandler(f))                           ← BoxedHandler
//!        ↓ handler.call(req) at request time
//! Box::pin(async { f(req).await.into_response() })
//! ```

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::request::Request;
use crate::response::{IntoResponse, Response};

/// A heap-allocated, type-erased future that resolves to a [`Response`].
pub(crate) type BoxFuture = Pin<Box<dyn Future<Output = Response> + Send + 'static>>;

/// Internal dispatch interface.
///
/// `#[doc(hidden)] pub` rather than `pub(crate)` because it appears in the
/// return type of the public `Handler` trait's `into_boxed_handler` method.
#[doc(hidden)]
pub trait ErasedHandler {
    fn call(&self, req: Request) -> BoxFuture;
}

/// A type-erased handler shared across concurrent requests.
#[doc(hidden)]
pub type BoxedHandler = Arc<dyn ErasedHandler + Send + Sync + 'static>;

/// Implemented for every valid route handler.
///
/// Satisfied automatically by any function or closure of the shape
/// `Fn(Request) -> impl Future<Output = impl IntoResponse>`. Sealed: only the
/// blanket impl below can provide it.
pub trait Handler: private::Sealed + Send + Sync + 'static {
    #[doc(hidden)]
    fn into_boxed_handler(self) -> BoxedHandler;
}

mod private {
    pub trait Sealed {}
}

impl<F, Fut, R> private::Sealed for F
where
    F: Fn(Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoResponse + Send + 'static,
{
}

impl<F, Fut, R> Handler for F
where
    F: Fn(Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoResponse + Send + 'static,
{
    fn into_boxed_handler(self) -> BoxedHandler {
        Arc::new(FnHandler(self))
    }
}

struct FnHandler<F>(F);

impl<F, Fut, R> ErasedHandler for FnHandler<F>
where
    F: Fn(Request) -> Fut + Send + Sync,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoResponse + Send + 'static,
{
    fn call(&self, req: Request) -> BoxFuture {
        let fut = (self.0)(req);
        Box::pin(async move { fut.await.into_response() })
    }
}

/// Binds shared state to a two-argument handler, producing a [`Handler`].
///
/// The state is cloned once per request; pass an `Arc` for anything larger
/// than a pointer.
///
/// ```rust
/// use std::sync::Arc;
/// use todocrud::{Method, Request, Router, with_state};
///
/// async fn greet(name: Arc<str>, _req: Request) -> String {
///     format!("hello {name}")
/// }
///
/// let app = Router::new().on(Method::GET, "/", with_state(Arc::from("bob"), greet));
/// ```
pub fn with_state<S, F, Fut, R>(state: S, f: F) -> impl Handler
where
    S: Clone + Send + Sync + 'static,
    F: Fn(S, Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoResponse + Send + 'static,
{
    move |req: Request| f(state.clone(), req)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use bytes::Bytes;
    use http::StatusCode;

    use super::*;

    fn request() -> Request {
        let req = http::Request::builder().uri("/").body(Bytes::new()).unwrap();
        Request::new(req, HashMap::new())
    }

    async fn teapot(_req: Request) -> StatusCode {
        StatusCode::IM_A_TEAPOT
    }

    #[tokio::test]
    async fn async_fn_is_a_handler() {
        let handler = teapot.into_boxed_handler();
        assert_eq!(handler.call(request()).await.status_code(), StatusCode::IM_A_TEAPOT);
    }

    #[tokio::test]
    async fn state_is_shared_across_calls() {
        async fn count(hits: Arc<AtomicUsize>, _req: Request) -> String {
            (hits.fetch_add(1, Ordering::SeqCst) + 1).to_string()
        }

        let hits = Arc::new(AtomicUsize::new(0));
        let handler = with_state(Arc::clone(&hits), count).into_boxed_handler();

        handler.call(request()).await;
        let res = handler.call(request()).await;
        assert_eq!(res.body(), b"2");
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }
}
