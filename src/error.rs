//! Unified error type.

/// The error type returned by trellis's fallible operations.
///
/// Application-level outcomes (404, 422, etc.) are expressed as HTTP
/// [`Response`](crate::Response) values, not as `Error`s. A request that
/// matches no route is [`Resolution::NotFound`](crate::Resolution), never an
/// error. This type surfaces configuration mistakes and infrastructure
/// failures.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Binding to a port or accepting a connection failed.
    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    /// A registered pattern carries a dynamic segment whose expression does
    /// not compile. Patterns are compiled lazily, so this surfaces on the
    /// first request that needs the pattern.
    #[error("invalid pattern `{pattern}`: {source}")]
    Pattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    /// A method string that is not one of the RFC 9110 verbs.
    #[error("unknown method `{0}`")]
    UnknownMethod(String),

    /// The request body could not be read off the connection.
    #[error("body: {0}")]
    Body(#[from] hyper::Error),
}
