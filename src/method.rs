//! HTTP method as a typed enum.
//!
//! Covers the nine RFC 9110 methods. Six of them can be registered one at a
//! time; `OPTIONS`, `CONNECT` and `TRACE` are only reachable through
//! [`Routes::any`](crate::Routes::any).
//!
//! Requests carrying any other method string resolve to not-found: there is
//! no tree to search for them.

use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// A known HTTP method.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
    Patch,
    Head,
    Options,
    Connect,
    Trace,
}

impl Method {
    /// Every method, in the order `any` registers them.
    pub const ALL: [Method; 9] = [
        Self::Get,
        Self::Post,
        Self::Put,
        Self::Patch,
        Self::Head,
        Self::Options,
        Self::Delete,
        Self::Connect,
        Self::Trace,
    ];

    /// Returns the uppercase wire representation (e.g. `"GET"`).
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Connect => "CONNECT",
            Self::Delete  => "DELETE",
            Self::Get     => "GET",
            Self::Head    => "HEAD",
            Self::Options => "OPTIONS",
            Self::Patch   => "PATCH",
            Self::Post    => "POST",
            Self::Put     => "PUT",
            Self::Trace   => "TRACE",
        }
    }

    /// Whether a route may be registered for this method on its own.
    pub fn is_registrable(self) -> bool {
        !matches!(self, Self::Options | Self::Connect | Self::Trace)
    }
}

/// Parses an uppercase method string (e.g. `"GET"`). Case-sensitive per RFC 9110 §9.1.
impl FromStr for Method {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "CONNECT" => Ok(Self::Connect),
            "DELETE"  => Ok(Self::Delete),
            "GET"     => Ok(Self::Get),
            "HEAD"    => Ok(Self::Head),
            "OPTIONS" => Ok(Self::Options),
            "PATCH"   => Ok(Self::Patch),
            "POST"    => Ok(Self::Post),
            "PUT"     => Ok(Self::Put),
            "TRACE"   => Ok(Self::Trace),
            _         => Err(Error::UnknownMethod(s.to_owned())),
        }
    }
}

impl TryFrom<&http::Method> for Method {
    type Error = Error;

    fn try_from(m: &http::Method) -> Result<Self, Self::Error> {
        m.as_str().parse()
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
