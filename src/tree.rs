//! Segment trie for one HTTP method.
//!
//! The trie is a plain literal-text index. Insertion splits a pattern on `/`
//! and creates one child per segment, dynamic or not. Lookup runs in one of
//! two modes:
//!
//! - [`FindMode::Exact`] walks the request path segment by segment and stops
//!   at the first node whose stored pattern equals the path. A missing child
//!   means "no literal route"; the result is empty.
//! - [`FindMode::Prefix`] descends by a single hint segment (as far as it
//!   can) and returns every terminal node below that point as a candidate
//!   for the pattern compiler.

use std::sync::Arc;

use tracing::warn;

use crate::handler::BoxedHandler;
use crate::middleware::BoxedMiddleware;
use crate::node::{Endpoint, Node};

/// Key of the root node, and the pattern of the degenerate `/` route.
pub(crate) const ROOT: &str = "/";

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum FindMode {
    Exact,
    Prefix,
}

pub(crate) struct Tree {
    root: Node,
    /// Registered patterns, first registration order, no repeats.
    routes: Vec<String>,
    registered: usize,
}

impl Tree {
    pub(crate) fn new() -> Self {
        Self { root: Node::new(ROOT, 1, Arc::from([])), routes: Vec::new(), registered: 0 }
    }

    /// Inserts `pattern`, returning its registration index.
    ///
    /// Nodes created by this call receive `middleware`; nodes that already
    /// existed keep theirs, except the terminal node, which takes the
    /// middleware of its latest registration along with the handler.
    pub(crate) fn add(
        &mut self,
        pattern: &str,
        handler: BoxedHandler,
        middleware: Arc<[BoxedMiddleware]>,
    ) -> usize {
        let index = self.registered;
        self.registered += 1;

        let mut node = &mut self.root;
        let stored = if pattern == ROOT {
            ROOT.to_owned()
        } else {
            let body = pattern.strip_prefix('/').unwrap_or(pattern);
            for key in body.split('/') {
                let depth = node.depth + 1;
                node = node.children
                    .entry(key.to_owned())
                    .or_insert_with(|| Node::new(key, depth, Arc::clone(&middleware)));
            }
            body.to_owned()
        };

        if node.is_terminal() {
            warn!(pattern, "route registered twice; the later handler wins");
        } else {
            self.routes.push(pattern.to_owned());
        }
        node.middleware = middleware;
        node.endpoint = Some(Endpoint::new(stored, handler, index));
        index
    }

    /// Looks up `path` in the given mode. In [`FindMode::Prefix`] `path` is
    /// the hint segment, not the full request path.
    pub(crate) fn find(&self, path: &str, mode: FindMode) -> Vec<&Node> {
        if self.root.pattern() == Some(path) {
            return vec![&self.root];
        }

        let mut node = &self.root;
        match mode {
            FindMode::Exact => {
                let body = path.strip_prefix('/').unwrap_or(path);
                for key in body.split('/') {
                    let Some(child) = node.children.get(key) else {
                        return Vec::new();
                    };
                    if child.pattern() == Some(body) {
                        return vec![child];
                    }
                    node = child;
                }
            }
            FindMode::Prefix => {
                for key in path.split('/') {
                    match node.children.get(key) {
                        Some(child) => node = child,
                        None => break,
                    }
                }
            }
        }
        collect(node)
    }

    pub(crate) fn routes(&self) -> &[String] {
        &self.routes
    }
}

/// Breadth-first walk from `start`, returning every terminal node in
/// registration order.
fn collect(start: &Node) -> Vec<&Node> {
    let mut found = Vec::new();
    let mut level = vec![start];
    while !level.is_empty() {
        let mut next = Vec::new();
        for node in level {
            if node.is_terminal() {
                found.push(node);
            }
            next.extend(node.children.values());
        }
        level = next;
    }
    found.sort_by_key(|node| node.endpoint.as_ref().map(|e| e.index));
    found
}
