//! Host server: binds a socket and feeds each request to [`Router::dispatch`].
//!
//! This is plumbing around hyper, not part of routing. Each connection runs
//! on its own tokio task; each request on it calls the dispatcher once.
//!
//! # Shutdown
//!
//! On SIGTERM or Ctrl-C the accept loop stops, connections already accepted
//! finish their in-flight requests, and [`Server::serve`] returns.

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;

use bytes::Bytes;
use http::StatusCode;
use http_body_util::{BodyExt, Full};
use hyper::service::service_fn;
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto::Builder as ConnBuilder;
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinSet;
use tracing::{error, info, warn};

use crate::error::Error;
use crate::request::Request;
use crate::response::Response;
use crate::router::Router;

/// The HTTP server.
pub struct Server {
    addr: SocketAddr,
}

impl Server {
    /// Configures the server to bind to `addr` when [`serve`](Server::serve)
    /// is called.
    ///
    /// # Panics
    ///
    /// Panics if `addr` is not a valid `host:port` string.
    ///
    /// ```rust,no_run
    /// use trellis::Server;
    /// let server = Server::bind("0.0.0.0:3000");
    /// ```
    pub fn bind(addr: &str) -> Self {
        let addr: SocketAddr = addr.parse().expect("invalid socket address");
        Self { addr }
    }

    /// Accepts connections until a shutdown signal, then drains.
    ///
    /// The router is sealed before it gets here, so every connection task
    /// reads the same table through one `Arc` and nothing is locked.
    pub async fn serve(self, router: Router) -> Result<(), Error> {
        let listener = TcpListener::bind(self.addr).await?;
        let router = Arc::new(router);
        let mut connections = JoinSet::new();

        info!(addr = %self.addr, routes = router.routes().len(), "trellis listening");

        let shutdown = shutdown_signal();
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                // Shutdown is checked first so a queued backlog cannot delay it.
                biased;

                () = &mut shutdown => {
                    info!(in_flight = connections.len(), "shutdown signal received, draining connections");
                    break;
                }

                accepted = listener.accept() => match accepted {
                    Ok((stream, peer)) => {
                        connections.spawn(serve_connection(Arc::clone(&router), stream, peer));
                    }
                    Err(e) => error!("accept error: {e}"),
                },

                Some(_) = connections.join_next(), if !connections.is_empty() => {}
            }
        }

        while connections.join_next().await.is_some() {}

        info!("trellis stopped");
        Ok(())
    }
}

/// Serves every request on one connection, HTTP/1.1 or HTTP/2.
async fn serve_connection(router: Arc<Router>, stream: TcpStream, peer: SocketAddr) {
    let svc = service_fn(move |req| dispatch(Arc::clone(&router), req, peer));

    if let Err(e) = ConnBuilder::new(TokioExecutor::new())
        .serve_connection(TokioIo::new(stream), svc)
        .await
    {
        error!(%peer, "connection error: {e}");
    }
}

/// Buffers the body, then hands the request to the router. Every failure
/// becomes a response, so hyper never sees an error.
async fn dispatch(
    router: Arc<Router>,
    req: hyper::Request<hyper::body::Incoming>,
    peer: SocketAddr,
) -> Result<http::Response<Full<Bytes>>, Infallible> {
    let (parts, body) = req.into_parts();
    let body = match body.collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(e) => {
            let e = Error::from(e);
            warn!(%peer, method = %parts.method, path = parts.uri.path(), "{e}");
            return Ok(Response::status(StatusCode::BAD_REQUEST).into_inner());
        }
    };

    let response = router.dispatch(Request::from_parts(parts, body)).await;
    Ok(response.into_inner())
}

/// Resolves on the first SIGTERM or Ctrl-C. Non-Unix targets only get Ctrl-C.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let sigterm = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let sigterm = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c  => {}
        () = sigterm => {}
    }
}
