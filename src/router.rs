//! Route registration and resolution.
//!
//! Registration happens on a [`RouterBuilder`] (and the [`Group`]s borrowed
//! from it), one segment trie per HTTP method. [`RouterBuilder::build`]
//! seals the tries into a read-only [`Router`] that is shared across
//! requests without locking.
//!
//! Resolution tries the literal path first. Only when no registered pattern
//! equals the path does it fall back to compiling candidate patterns and
//! matching them, first registered wins.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use http::StatusCode;
use tracing::{debug, error, trace};

use crate::error::Error;
use crate::fs::StaticDir;
use crate::handler::{BoxedHandler, Handler};
use crate::method::Method;
use crate::middleware::{BoxedMiddleware, Middleware, Next};
use crate::node::Node;
use crate::request::Request;
use crate::response::Response;
use crate::tree::{FindMode, Tree};

// ── Registration state ────────────────────────────────────────────────────────

/// The tries being built, one per method.
///
/// `#[doc(hidden)] pub` because it appears in [`Routes::parts`].
#[doc(hidden)]
#[derive(Default)]
pub struct Registry {
    trees: HashMap<Method, Tree>,
}

impl Registry {
    fn insert(&mut self, method: Method, pattern: &str, handler: BoxedHandler, scope: &Scope) {
        let middleware: Arc<[BoxedMiddleware]> = Arc::from(scope.middleware.as_slice());
        let index = self.trees
            .entry(method)
            .or_insert_with(Tree::new)
            .add(pattern, handler, middleware);
        debug!(%method, pattern, index, middleware = scope.middleware.len(), "route registered");
    }
}

/// Prefix and middleware inherited by everything registered through one
/// builder or group.
#[doc(hidden)]
#[derive(Clone, Default)]
pub struct Scope {
    prefix: String,
    middleware: Vec<BoxedMiddleware>,
}

impl Scope {
    /// `prefix` + `pattern`, with exactly one separator between them. A
    /// trailing separator on `pattern` is kept.
    fn join(&self, pattern: &str) -> String {
        if self.prefix.is_empty() {
            return pattern.to_owned();
        }
        let prefix = self.prefix.trim_end_matches('/');
        let rest = pattern.trim_start_matches('/');
        match (prefix.is_empty(), rest.is_empty()) {
            (true, true) => "/".to_owned(),
            (true, false) => format!("/{rest}"),
            (false, true) => prefix.to_owned(),
            (false, false) => format!("{prefix}/{rest}"),
        }
    }

    fn nest(&self, prefix: &str) -> Scope {
        let mut prefix = self.join(prefix);
        if !prefix.starts_with('/') {
            prefix.insert(0, '/');
        }
        Scope { prefix, middleware: self.middleware.clone() }
    }
}

// ── Routes: the registration API ──────────────────────────────────────────────

/// Registration methods shared by [`RouterBuilder`] and [`Group`].
///
/// Every method returns `&mut Self`, so registrations chain:
///
/// ```rust
/// use trellis::{Request, Response, RouterBuilder, Routes};
///
/// # async fn list(_: Request) -> Response { Response::text("") }
/// # async fn show(_: Request) -> Response { Response::text("") }
/// # async fn create(_: Request) -> Response { Response::text("") }
/// let mut app = RouterBuilder::new();
/// app.get("/users", list)
///    .get("/users/{id:[0-9]+}", show)
///    .post("/users", create);
/// let router = app.build();
/// ```
pub trait Routes: private::Sealed {
    #[doc(hidden)]
    fn parts(&mut self) -> (&mut Registry, &mut Scope);

    /// Registers `handler` for `method` at `pattern` (joined to this scope's
    /// prefix).
    ///
    /// # Panics
    ///
    /// Panics if `method` is `OPTIONS`, `CONNECT` or `TRACE`; those are
    /// only registered through [`any`](Routes::any).
    fn handle(&mut self, method: Method, pattern: &str, handler: impl Handler) -> &mut Self {
        if !method.is_registrable() {
            panic!("invalid route `{method} {pattern}`: {method} routes are only registered through `any`");
        }
        let (registry, scope) = self.parts();
        registry.insert(method, &scope.join(pattern), handler.into_boxed_handler(), scope);
        self
    }

    /// Like [`handle`](Routes::handle), with the method given as a string.
    ///
    /// # Panics
    ///
    /// Panics on an unknown or non-registrable method.
    fn route(&mut self, method: &str, pattern: &str, handler: impl Handler) -> &mut Self {
        let method: Method = method
            .parse()
            .unwrap_or_else(|e| panic!("invalid route `{method} {pattern}`: {e}"));
        self.handle(method, pattern, handler)
    }

    fn get(&mut self, pattern: &str, handler: impl Handler) -> &mut Self {
        self.handle(Method::Get, pattern, handler)
    }

    fn post(&mut self, pattern: &str, handler: impl Handler) -> &mut Self {
        self.handle(Method::Post, pattern, handler)
    }

    fn put(&mut self, pattern: &str, handler: impl Handler) -> &mut Self {
        self.handle(Method::Put, pattern, handler)
    }

    fn delete(&mut self, pattern: &str, handler: impl Handler) -> &mut Self {
        self.handle(Method::Delete, pattern, handler)
    }

    fn patch(&mut self, pattern: &str, handler: impl Handler) -> &mut Self {
        self.handle(Method::Patch, pattern, handler)
    }

    fn head(&mut self, pattern: &str, handler: impl Handler) -> &mut Self {
        self.handle(Method::Head, pattern, handler)
    }

    /// Registers `handler` under all nine methods, including the three that
    /// cannot be registered on their own.
    fn any(&mut self, pattern: &str, handler: impl Handler) -> &mut Self {
        let handler = handler.into_boxed_handler();
        let (registry, scope) = self.parts();
        let pattern = scope.join(pattern);
        for method in Method::ALL {
            registry.insert(method, &pattern, Arc::clone(&handler), scope);
        }
        self
    }

    /// Serves files under `dir` at GET and HEAD `mount`.
    ///
    /// `mount` ends in a dynamic segment that swallows the rest of the path,
    /// e.g. `/assets/{file:.+}`. Everything before the first dynamic segment
    /// is stripped from the request path before it is resolved under `dir`.
    fn static_files(&mut self, mount: &str, dir: impl Into<PathBuf>) -> &mut Self {
        let (registry, scope) = self.parts();
        let pattern = scope.join(mount);
        let handler: BoxedHandler = Arc::new(StaticDir::new(&pattern, dir.into()));
        registry.insert(Method::Get, &pattern, Arc::clone(&handler), scope);
        registry.insert(Method::Head, &pattern, handler, scope);
        self
    }

    /// Appends a middleware to this scope. Routes registered afterwards,
    /// here or in groups created afterwards, run inside it.
    fn use_middleware(&mut self, middleware: impl Middleware) -> &mut Self {
        let (_, scope) = self.parts();
        scope.middleware.push(middleware.into_boxed_middleware());
        self
    }

    /// Opens a sub-scope that registers into the same tries under a longer
    /// prefix, starting from a copy of this scope's middleware.
    fn group(&mut self, prefix: &str) -> Group<'_> {
        let (registry, scope) = self.parts();
        Group { scope: scope.nest(prefix), registry }
    }
}

mod private {
    pub trait Sealed {}
    impl Sealed for super::RouterBuilder {}
    impl Sealed for super::Group<'_> {}
}

// ── RouterBuilder / Group ─────────────────────────────────────────────────────

/// Collects routes at start-up. Seal it with [`build`](RouterBuilder::build).
#[derive(Default)]
pub struct RouterBuilder {
    registry: Registry,
    scope: Scope,
    not_found: Option<BoxedHandler>,
}

impl RouterBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Handler for requests no route matches. Without one, such requests
    /// get an empty `404 Not Found`.
    pub fn not_found(&mut self, handler: impl Handler) -> &mut Self {
        self.not_found = Some(handler.into_boxed_handler());
        self
    }

    /// Seals registration. The not-found handler runs inside the root
    /// middleware registered so far.
    pub fn build(self) -> Router {
        let router = Router {
            trees: self.registry.trees,
            not_found: self.not_found,
            middleware: Arc::from(self.scope.middleware),
        };
        for (method, pattern) in router.routes() {
            debug!(%method, pattern, "route table");
        }
        router
    }
}

impl Routes for RouterBuilder {
    fn parts(&mut self) -> (&mut Registry, &mut Scope) {
        (&mut self.registry, &mut self.scope)
    }
}

/// A prefixed sub-scope of a [`RouterBuilder`]. Sibling groups share the
/// tries but not each other's prefix or middleware.
pub struct Group<'r> {
    registry: &'r mut Registry,
    scope: Scope,
}

impl Routes for Group<'_> {
    fn parts(&mut self) -> (&mut Registry, &mut Scope) {
        (&mut *self.registry, &mut self.scope)
    }
}

// ── Router ────────────────────────────────────────────────────────────────────

/// The sealed routing table.
///
/// Read-only: build it once, wrap it in an `Arc` (the [`Server`](crate::Server)
/// does) and resolve from any number of tasks.
pub struct Router {
    trees: HashMap<Method, Tree>,
    not_found: Option<BoxedHandler>,
    middleware: Arc<[BoxedMiddleware]>,
}

/// Outcome of [`Router::resolve`].
pub enum Resolution {
    Matched(Route),
    NotFound,
}

/// A resolved route: the handler, the middleware it runs inside, and the
/// parameters its pattern bound.
pub struct Route {
    pub pattern: String,
    pub params: HashMap<String, String>,
    handler: BoxedHandler,
    middleware: Arc<[BoxedMiddleware]>,
}

impl Route {
    fn from_node(node: &Node, params: HashMap<String, String>) -> Option<Self> {
        let endpoint = node.endpoint.as_ref()?;
        Some(Self {
            pattern: endpoint.pattern.clone(),
            params,
            handler: Arc::clone(&endpoint.handler),
            middleware: Arc::clone(&node.middleware),
        })
    }

    #[cfg(test)]
    fn middleware_len(&self) -> usize {
        self.middleware.len()
    }

    /// Runs the handler inside its middleware with `params` installed on
    /// the request.
    pub async fn call(self, mut req: Request) -> Response {
        req.params = self.params;
        Next::new(self.middleware, self.handler).run(req).await
    }
}

impl Router {
    /// Resolves `method` + `path` to at most one route.
    ///
    /// # Errors
    ///
    /// [`Error::Pattern`] when a candidate pattern fails to compile. That is
    /// a configuration mistake surfacing lazily; a miss is
    /// [`Resolution::NotFound`], not an error.
    pub fn resolve(&self, method: Method, path: &str) -> Result<Resolution, Error> {
        let Some(tree) = self.trees.get(&method) else {
            trace!(%method, path, "no routes for method");
            return Ok(Resolution::NotFound);
        };

        let bare = path.strip_prefix('/').unwrap_or(path);
        let is_literal = |node: &Node| node.pattern().is_some_and(|p| p == path || p == bare);

        let exact = tree.find(path, FindMode::Exact);
        if let Some(&node) = exact.first().filter(|&&node| is_literal(node)) {
            if let Some(route) = Route::from_node(node, HashMap::new()) {
                trace!(%method, path, "literal match");
                return Ok(Resolution::Matched(route));
            }
        }

        let hint = bare.split('/').next().unwrap_or_default();
        for node in tree.find(hint, FindMode::Prefix) {
            let Some(endpoint) = node.endpoint.as_ref() else { continue };
            if is_literal(node) {
                continue;
            }
            let matcher = endpoint.matcher().map_err(|e| Error::Pattern {
                pattern: endpoint.pattern.clone(),
                source: e.clone(),
            })?;
            if let Some(params) = matcher.captures(path) {
                trace!(%method, path, pattern = %endpoint.pattern, regex = matcher.as_str(), "pattern match");
                return Ok(Route::from_node(node, params)
                    .map_or(Resolution::NotFound, Resolution::Matched));
            }
        }

        trace!(%method, path, "no match");
        Ok(Resolution::NotFound)
    }

    /// Routes one request and produces one response. This is the entry point
    /// the host server calls per request.
    pub async fn dispatch(&self, req: Request) -> Response {
        let resolution = match Method::try_from(req.method()) {
            Ok(method) => self.resolve(method, req.path()),
            Err(_) => Ok(Resolution::NotFound),
        };

        match resolution {
            Ok(Resolution::Matched(route)) => route.call(req).await,
            Ok(Resolution::NotFound) => self.handle_not_found(req).await,
            Err(e) => {
                error!(method = %req.method(), path = req.path(), "{e}");
                Response::status(StatusCode::INTERNAL_SERVER_ERROR)
            }
        }
    }

    async fn handle_not_found(&self, req: Request) -> Response {
        match &self.not_found {
            Some(handler) => Next::new(Arc::clone(&self.middleware), Arc::clone(handler)).run(req).await,
            None => Response::status(StatusCode::NOT_FOUND),
        }
    }

    /// Every registered `(method, pattern)`, methods in declaration order,
    /// patterns in registration order.
    pub fn routes(&self) -> Vec<(Method, &str)> {
        let mut methods: Vec<_> = self.trees.keys().copied().collect();
        methods.sort();
        methods.into_iter()
            .flat_map(|m| self.trees[&m].routes().iter().map(move |p| (m, p.as_str())))
            .collect()
    }
}
