//! Incoming HTTP request: the context a handler sees.
//!
//! The router fills in the path parameters of the route it resolved. Every
//! other accessor passes straight through to the underlying request.

use std::collections::HashMap;

use bytes::Bytes;
use http::header::{CONTENT_TYPE, COOKIE};
use http::{HeaderMap, Method};
use percent_encoding::percent_decode_str;
use url::form_urlencoded;

/// An incoming HTTP request with its body fully read.
#[derive(Debug)]
pub struct Request {
    method: Method,
    path: String,
    query: Option<String>,
    headers: HeaderMap,
    body: Bytes,
    pub(crate) params: HashMap<String, String>,
}

impl Request {
    pub(crate) fn from_parts(parts: http::request::Parts, body: Bytes) -> Self {
        Self {
            method: parts.method,
            path: parts.uri.path().to_owned(),
            query: parts.uri.query().map(str::to_owned),
            headers: parts.headers,
            body,
            params: HashMap::new(),
        }
    }

    pub fn method(&self) -> &Method { &self.method }
    pub fn path(&self) -> &str { &self.path }
    pub fn headers(&self) -> &HeaderMap { &self.headers }
    pub fn body(&self) -> &[u8] { &self.body }

    /// Case-insensitive header lookup. Non-UTF-8 values read as absent.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Returns a named path parameter.
    ///
    /// For a route `/users/{id:[0-9]+}`, `req.param("id")` on `/users/42`
    /// returns `Some("42")`. Values are raw text; parse them yourself.
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }

    /// Every path parameter bound by the resolved route.
    pub fn params(&self) -> &HashMap<String, String> {
        &self.params
    }

    /// First value of `key` in the URL query string, form-decoded.
    pub fn query(&self, key: &str) -> Option<String> {
        let query = self.query.as_deref()?;
        find_pair(query.as_bytes(), key)
    }

    /// First value of `key` in an `application/x-www-form-urlencoded` body.
    ///
    /// Falls back to the query string when the body is not a form, the way
    /// most form helpers do.
    pub fn form(&self, key: &str) -> Option<String> {
        let is_form = self.header(CONTENT_TYPE.as_str())
            .is_some_and(|ct| ct.starts_with("application/x-www-form-urlencoded"));
        if is_form {
            if let Some(value) = find_pair(&self.body, key) {
                return Some(value);
            }
        }
        self.query(key)
    }

    /// Value of the cookie `name`, percent-decoded.
    pub fn cookie(&self, name: &str) -> Option<String> {
        self.headers.get_all(COOKIE).iter()
            .filter_map(|v| v.to_str().ok())
            .flat_map(|v| v.split(';'))
            .filter_map(|pair| pair.trim().split_once('='))
            .find(|(k, _)| *k == name)
            .map(|(_, v)| {
                let v = v.trim_matches('"');
                percent_decode_str(v).decode_utf8_lossy().into_owned()
            })
    }
}

fn find_pair(input: &[u8], key: &str) -> Option<String> {
    form_urlencoded::parse(input)
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.into_owned())
}

/// Builds a request from an `http` request whose body is already buffered.
///
/// Handy for driving [`Router::dispatch`](crate::Router::dispatch) without a
/// socket.
impl From<http::Request<Bytes>> for Request {
    fn from(req: http::Request<Bytes>) -> Self {
        let (parts, body) = req.into_parts();
        Self::from_parts(parts, body)
    }
}
