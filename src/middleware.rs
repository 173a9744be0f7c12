//! Middleware: onion-style decorators around a route handler.
//!
//! A middleware is any `async fn(Request, Next) -> impl IntoResponse`. It
//! runs its pre-handler logic, calls [`Next::run`] to invoke the rest of the
//! chain, then runs its post-handler logic on the way back out:
//!
//! ```rust
//! use trellis::{Next, Request, Response};
//!
//! async fn timing(req: Request, next: Next) -> Response {
//!     let started = std::time::Instant::now();
//!     let res = next.run(req).await;
//!     tracing::info!(elapsed = ?started.elapsed(), "request finished");
//!     res
//! }
//! ```
//!
//! Given middlewares `A` then `B` attached to a route, a request observes
//! `A` pre, `B` pre, the handler, `B` post, `A` post.

use std::future::Future;
use std::sync::Arc;

use crate::handler::{BoxFuture, BoxedHandler};
use crate::request::Request;
use crate::response::IntoResponse;

/// Type-erased middleware interface. See [`ErasedHandler`](crate::handler::ErasedHandler).
#[doc(hidden)]
pub trait ErasedMiddleware {
    fn call(&self, req: Request, next: Next) -> BoxFuture;
}

#[doc(hidden)]
pub type BoxedMiddleware = Arc<dyn ErasedMiddleware + Send + Sync + 'static>;

/// Implemented for every valid middleware function. Sealed like
/// [`Handler`](crate::Handler).
pub trait Middleware: private::Sealed + Send + Sync + 'static {
    #[doc(hidden)]
    fn into_boxed_middleware(self) -> BoxedMiddleware;
}

mod private {
    pub trait Sealed {}
}

impl<F, Fut, R> private::Sealed for F
where
    F: Fn(Request, Next) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoResponse + Send + 'static,
{
}

impl<F, Fut, R> Middleware for F
where
    F: Fn(Request, Next) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoResponse + Send + 'static,
{
    fn into_boxed_middleware(self) -> BoxedMiddleware {
        Arc::new(FnMiddleware(self))
    }
}

struct FnMiddleware<F>(F);

impl<F, Fut, R> ErasedMiddleware for FnMiddleware<F>
where
    F: Fn(Request, Next) -> Fut + Send + Sync,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoResponse + Send + 'static,
{
    fn call(&self, req: Request, next: Next) -> BoxFuture {
        let fut = (self.0)(req, next);
        Box::pin(async move { fut.await.into_response() })
    }
}

/// The remainder of a middleware chain, ending in the route handler.
pub struct Next {
    chain: Arc<[BoxedMiddleware]>,
    position: usize,
    handler: BoxedHandler,
}

impl Next {
    pub(crate) fn new(chain: Arc<[BoxedMiddleware]>, handler: BoxedHandler) -> Self {
        Self { chain, position: 0, handler }
    }

    /// Runs the next middleware in the chain, or the handler once the chain
    /// is exhausted.
    pub fn run(self, req: Request) -> BoxFuture {
        match self.chain.get(self.position).cloned() {
            Some(middleware) => {
                let next = Next { position: self.position + 1, ..self };
                middleware.call(req, next)
            }
            None => self.handler.call(req),
        }
    }
}
