//! # trellis
//!
//! A segment-trie HTTP router. One trie per method, keyed by the literal
//! text of each path segment. Dynamic segments carry their own regular
//! expression and are only interpreted when no literal route fits.
//!
//! ## Pattern syntax
//!
//! - `/users/me` — literal; always wins over a dynamic route that would also
//!   match.
//! - `/users/{id:[0-9]+}` — named parameter bound by an expression.
//! - `/items/:id` — shorthand for `{id:[\d]+}`; any other `:name` is
//!   `{name:[\w]+}`.
//! - A trailing `/` is significant: `/docs/:page/` does not match `/docs/intro`.
//!
//! When several dynamic patterns could match one path, the one registered
//! first wins.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use trellis::{Next, Request, Response, RouterBuilder, Routes, Server};
//!
//! #[tokio::main]
//! async fn main() {
//!     let mut app = RouterBuilder::new();
//!     app.use_middleware(log_requests)
//!         .get("/users/me", me)
//!         .get("/users/{id:[0-9]+}", get_user);
//!     app.group("/admin").delete("/users/:id", delete_user);
//!
//!     Server::bind("0.0.0.0:3000").serve(app.build()).await.unwrap();
//! }
//!
//! async fn log_requests(req: Request, next: Next) -> Response {
//!     tracing::info!(path = req.path(), "request");
//!     next.run(req).await
//! }
//!
//! async fn me(_req: Request) -> Response {
//!     Response::text("me")
//! }
//!
//! async fn get_user(req: Request) -> Response {
//!     let id = req.param("id").unwrap_or("unknown");
//!     Response::json(format!(r#"{{"id":"{id}"}}"#))
//! }
//!
//! async fn delete_user(_req: Request) -> http::StatusCode {
//!     http::StatusCode::NO_CONTENT
//! }
//! ```

mod error;
mod fs;
mod handler;
mod method;
mod middleware;
mod node;
mod pattern;
mod request;
mod response;
mod router;
mod server;
mod tree;

pub use error::Error;
pub use handler::{BoxFuture, Handler};
pub use method::Method;
pub use middleware::{Middleware, Next};
pub use request::Request;
pub use response::{ContentType, IntoResponse, Response, ResponseBuilder};
pub use router::{Group, Resolution, Route, Router, RouterBuilder, Routes};
pub use server::Server;
