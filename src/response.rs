//! Outgoing HTTP response type and the [`IntoResponse`] conversion trait.
//!
//! The router never looks at a response body. Handlers build bytes however
//! they like and hand them over.

use bytes::Bytes;
use http::header::{CONTENT_TYPE, HeaderName, HeaderValue};
use http::StatusCode;
use http_body_util::Full;

// ── ContentType ───────────────────────────────────────────────────────────────

/// Common content-type values for use with [`ResponseBuilder::bytes`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ContentType {
    Css,          // text/css
    Csv,          // text/csv
    Html,         // text/html; charset=utf-8
    Javascript,   // text/javascript
    Json,         // application/json
    OctetStream,  // application/octet-stream
    Pdf,          // application/pdf
    Png,          // image/png
    Svg,          // image/svg+xml
    Text,         // text/plain; charset=utf-8
    Xml,          // application/xml
    Yaml,         // application/x-yaml
}

impl ContentType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Css         => "text/css",
            Self::Csv         => "text/csv",
            Self::Html        => "text/html; charset=utf-8",
            Self::Javascript  => "text/javascript",
            Self::Json        => "application/json",
            Self::OctetStream => "application/octet-stream",
            Self::Pdf         => "application/pdf",
            Self::Png         => "image/png",
            Self::Svg         => "image/svg+xml",
            Self::Text        => "text/plain; charset=utf-8",
            Self::Xml         => "application/xml",
            Self::Yaml        => "application/x-yaml",
        }
    }

    /// Guess from a file extension. Unknown extensions are served as bytes.
    pub fn from_extension(ext: &str) -> Self {
        match ext.to_ascii_lowercase().as_str() {
            "css"          => Self::Css,
            "csv"          => Self::Csv,
            "htm" | "html" => Self::Html,
            "js" | "mjs"   => Self::Javascript,
            "json"         => Self::Json,
            "pdf"          => Self::Pdf,
            "png"          => Self::Png,
            "svg"          => Self::Svg,
            "txt"          => Self::Text,
            "xml"          => Self::Xml,
            "yaml" | "yml" => Self::Yaml,
            _              => Self::OctetStream,
        }
    }
}

// ── Response ─────────────────────────────────────────────────────────────────

/// An outgoing HTTP response.
///
/// ```rust
/// use http::StatusCode;
/// use trellis::{ContentType, Response};
///
/// Response::json(br#"{"id":1}"#.to_vec());
/// Response::text("hello");
/// Response::status(StatusCode::NO_CONTENT);
///
/// Response::builder()
///     .status(StatusCode::CREATED)
///     .header("location", "/users/42")
///     .bytes(ContentType::Xml, b"<ok/>".to_vec());
/// ```
#[derive(Debug)]
pub struct Response {
    pub(crate) body: Bytes,
    pub(crate) headers: Vec<(HeaderName, HeaderValue)>,
    pub(crate) status: StatusCode,
}

impl Response {
    /// `200 OK` — `application/json`.
    pub fn json(body: impl Into<Bytes>) -> Self {
        Self::builder().bytes(ContentType::Json, body)
    }

    /// `200 OK` — `text/plain; charset=utf-8`.
    pub fn text(body: impl Into<String>) -> Self {
        Self::builder().text(body)
    }

    /// Response with no body.
    pub fn status(code: StatusCode) -> Self {
        Self { body: Bytes::new(), headers: Vec::new(), status: code }
    }

    /// Builder for responses that need a custom status or extra headers.
    pub fn builder() -> ResponseBuilder {
        ResponseBuilder { headers: Vec::new(), status: StatusCode::OK }
    }

    pub fn status_code(&self) -> StatusCode { self.status }
    pub fn body(&self) -> &[u8] { &self.body }

    /// First value of a response header, if present and valid UTF-8.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.iter()
            .find(|(k, _)| k.as_str().eq_ignore_ascii_case(name))
            .and_then(|(_, v)| v.to_str().ok())
    }

    /// Converts into the `http` type hyper writes to the wire.
    pub(crate) fn into_inner(self) -> http::Response<Full<Bytes>> {
        let mut res = http::Response::new(Full::new(self.body));
        *res.status_mut() = self.status;
        let headers = res.headers_mut();
        for (name, value) in self.headers {
            headers.append(name, value);
        }
        res
    }
}

// ── ResponseBuilder ───────────────────────────────────────────────────────────

/// Fluent builder for [`Response`].
///
/// Obtain via [`Response::builder()`]. Defaults to `200 OK`.
/// Terminated by a typed body method.
pub struct ResponseBuilder {
    headers: Vec<(HeaderName, HeaderValue)>,
    status: StatusCode,
}

impl ResponseBuilder {
    pub fn status(mut self, code: StatusCode) -> Self {
        self.status = code;
        self
    }

    /// Appends a header. Names or values that are not valid HTTP are dropped.
    pub fn header(mut self, name: &str, value: &str) -> Self {
        match (HeaderName::try_from(name), HeaderValue::try_from(value)) {
            (Ok(n), Ok(v)) => self.headers.push((n, v)),
            _ => tracing::warn!(header = name, "dropping invalid response header"),
        }
        self
    }

    /// Terminate with a JSON body (`application/json`).
    pub fn json(self, body: impl Into<Bytes>) -> Response {
        self.bytes(ContentType::Json, body)
    }

    /// Terminate with a plain-text body (`text/plain; charset=utf-8`).
    pub fn text(self, body: impl Into<String>) -> Response {
        self.bytes(ContentType::Text, body.into())
    }

    /// Terminate with a typed body.
    pub fn bytes(self, content_type: ContentType, body: impl Into<Bytes>) -> Response {
        let mut headers = vec![(CONTENT_TYPE, HeaderValue::from_static(content_type.as_str()))];
        headers.extend(self.headers);
        Response { body: body.into(), headers, status: self.status }
    }

    /// Terminate with no body (e.g. `204 No Content`, redirects).
    pub fn no_body(self) -> Response {
        Response { body: Bytes::new(), headers: self.headers, status: self.status }
    }
}

// ── IntoResponse ──────────────────────────────────────────────────────────────

/// Conversion into an HTTP [`Response`].
///
/// Implement on your own types to return them directly from handlers and
/// middleware.
pub trait IntoResponse {
    fn into_response(self) -> Response;
}

impl IntoResponse for Response {
    fn into_response(self) -> Response { self }
}

impl IntoResponse for &'static str {
    fn into_response(self) -> Response { Response::text(self) }
}

impl IntoResponse for String {
    fn into_response(self) -> Response { Response::text(self) }
}

/// Return a status directly from a handler: `return StatusCode::NOT_FOUND`
impl IntoResponse for StatusCode {
    fn into_response(self) -> Response { Response::status(self) }
}
