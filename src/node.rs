//! A single trie vertex.

use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

use crate::handler::BoxedHandler;
use crate::middleware::BoxedMiddleware;
use crate::pattern::Matcher;

/// One path segment of one registered pattern.
///
/// `children` is keyed by the literal segment text. A dynamic segment such as
/// `{id:[0-9]+}` or `:id` is stored verbatim as a key; only the pattern
/// compiler ever reads meaning into it.
pub(crate) struct Node {
    pub(crate) key: String,
    pub(crate) depth: usize,
    pub(crate) children: HashMap<String, Node>,
    /// Set when the node is created. Only a terminal node's sequence runs at
    /// dispatch; ancestors' middleware is never consulted.
    pub(crate) middleware: Arc<[BoxedMiddleware]>,
    pub(crate) endpoint: Option<Endpoint>,
}

/// What a terminal node carries. A node with `endpoint: None` was only ever
/// passed through on the way to somewhere else.
pub(crate) struct Endpoint {
    /// The registration pattern, leading separator stripped (except for the
    /// root route, stored as `/`).
    pub(crate) pattern: String,
    pub(crate) handler: BoxedHandler,
    /// Registration order within the owning tree; breaks ties between
    /// candidates in pattern mode.
    pub(crate) index: usize,
    matcher: OnceLock<Result<Matcher, regex::Error>>,
}

impl Node {
    pub(crate) fn new(key: impl Into<String>, depth: usize, middleware: Arc<[BoxedMiddleware]>) -> Self {
        Self {
            key: key.into(),
            depth,
            children: HashMap::new(),
            middleware,
            endpoint: None,
        }
    }

    pub(crate) fn is_terminal(&self) -> bool {
        self.endpoint.is_some()
    }

    /// The stored pattern, if this node terminates a route.
    pub(crate) fn pattern(&self) -> Option<&str> {
        self.endpoint.as_ref().map(|e| e.pattern.as_str())
    }
}

impl Endpoint {
    pub(crate) fn new(pattern: String, handler: BoxedHandler, index: usize) -> Self {
        Self { pattern, handler, index, matcher: OnceLock::new() }
    }

    /// The compiled matcher for this pattern, built on first use and kept.
    pub(crate) fn matcher(&self) -> Result<&Matcher, &regex::Error> {
        self.matcher
            .get_or_init(|| Matcher::compile(&self.pattern))
            .as_ref()
    }
}

impl std::fmt::Debug for Node {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Node")
            .field("key", &self.key)
            .field("depth", &self.depth)
            .field("pattern", &self.pattern())
            .field("children", &self.children.len())
            .field("middleware", &self.middleware.len())
            .finish()
    }
}
