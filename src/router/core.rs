//! Route registration: the [`Router`] builder and its shared route table.
//!
//! A `Router` is a view onto a route table plus a chain of group prefixes.
//! [`Router::group`] returns another view onto the same table with one more
//! prefix, so routes and middleware registered through any view land in one
//! place. Group prefixes scope middleware only: route paths are stored as
//! written. [`Router::build`] snapshots the table into a [`Dispatcher`].

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use http::Method;
use tracing::{debug, info};

use super::tree::PathTree;
use crate::dispatcher::{Dispatcher, Handler, HandlerRequest, HandlerResponse};
use crate::error::{PatternError, RouteError};
use crate::middleware::{Middleware, MiddlewareTable};
use crate::pattern::PatternMatcher;
use crate::runtime_config::RouterConfig;
use crate::static_files::{StaticConfig, StaticFiles};

/// Everything registered during setup.
struct RouteTable {
    trees: HashMap<Method, PathTree<Handler>>,
    middlewares: MiddlewareTable,
    not_found: Option<Handler>,
}

/// Route registration builder.
///
/// Cloning a `Router` clones the view, not the table.
///
/// ```rust
/// use vi_router::dispatcher::{HandlerRequest, HandlerResponse};
/// use vi_router::router::Router;
///
/// let router = Router::default();
/// let api = router.group("/api");
/// api.get("/api/users/:id", |req: HandlerRequest| {
///     HandlerResponse::text(200, req.param("id").to_string())
/// })
/// .unwrap();
///
/// let dispatcher = router.build();
/// assert_eq!(
///     dispatcher.routes(),
///     vec![(http::Method::GET, "/api/users/:id".to_string())]
/// );
/// ```
#[derive(Clone)]
pub struct Router {
    table: Arc<Mutex<RouteTable>>,
    matcher: Arc<PatternMatcher>,
    config: Arc<RouterConfig>,
    prefixes: Arc<[Arc<str>]>,
}

impl Default for Router {
    fn default() -> Self {
        Self::new(RouterConfig::default())
    }
}

impl std::fmt::Debug for Router {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Router")
            .field("prefixes", &self.prefixes)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Join a group prefix and a path into one absolute path without a trailing
/// `/` (except for the root itself).
fn join_path(prefix: &str, path: &str) -> String {
    let path = route_path(path);
    let prefix = prefix.trim_end_matches('/');
    let joined = format!("{prefix}{}", path.trim_end_matches('/'));
    if joined.is_empty() {
        "/".to_string()
    } else {
        joined
    }
}

/// A route path as registered: trimmed, with a leading `/`.
fn route_path(path: &str) -> String {
    let path = path.trim();
    if path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{path}")
    }
}

impl Router {
    /// Empty route table configured by `config`.
    #[must_use]
    pub fn new(config: RouterConfig) -> Self {
        if config.banner {
            info!(version = env!("CARGO_PKG_VERSION"), "vi-router ready");
        }
        let table = RouteTable {
            trees: HashMap::new(),
            middlewares: MiddlewareTable::new(),
            not_found: None,
        };
        Self {
            table: Arc::new(Mutex::new(table)),
            matcher: Arc::new(PatternMatcher::new()),
            config: Arc::new(config),
            prefixes: Arc::from(vec![Arc::<str>::from("/")]),
        }
    }

    /// Router configured from `VI_*` environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        Self::new(RouterConfig::from_env())
    }

    fn table(&self) -> MutexGuard<'_, RouteTable> {
        self.table.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Full prefix of this view; `/` for the root router.
    #[must_use]
    pub fn prefix(&self) -> &str {
        self.prefixes.last().map_or("/", |p| &**p)
    }

    /// Group prefixes of this view, outermost first.
    #[must_use]
    pub fn prefixes(&self) -> &[Arc<str>] {
        &self.prefixes
    }

    /// The configuration this router was created with.
    #[must_use]
    pub fn config(&self) -> &RouterConfig {
        &self.config
    }

    /// The pattern matcher shared with every dispatcher built from this router.
    #[must_use]
    pub fn matcher(&self) -> &PatternMatcher {
        &self.matcher
    }

    /// Register `handler` for `method` and `path`.
    ///
    /// `path` is stored as written (a missing leading `/` is added) and this
    /// view's group prefixes are recorded on the route, so the route runs the
    /// middleware of every enclosing group. Registering the same method and
    /// path again replaces the handler.
    ///
    /// # Errors
    ///
    /// Fails for an empty or invalid method, an empty path, or a path that is
    /// not a valid route pattern.
    pub fn add<F>(&self, method: &str, path: &str, handler: F) -> Result<(), RouteError>
    where
        F: Fn(HandlerRequest) -> HandlerResponse + Send + Sync + 'static,
    {
        if method.is_empty() {
            return Err(RouteError::EmptyMethod);
        }
        let method = Method::from_bytes(method.as_bytes()).map_err(|_| RouteError::InvalidMethod {
            method: method.to_string(),
        })?;
        self.add_handler(method, path, Arc::new(handler))
    }

    /// Register an already boxed [`Handler`].
    ///
    /// # Errors
    ///
    /// Same as [`add`](Self::add), minus the method checks.
    pub fn add_handler(&self, method: Method, path: &str, handler: Handler) -> Result<(), RouteError> {
        if path.trim().is_empty() {
            return Err(RouteError::EmptyPath);
        }
        let full = route_path(path);

        // Compiled for validation only; the cache fills on first match.
        self.matcher
            .compile(&full)
            .map_err(|source| RouteError::Pattern {
                path: full.clone(),
                source,
            })?;

        let mut table = self.table();
        let tree = table.trees.entry(method.clone()).or_default();
        let replaced = tree.find(&full).iter().any(|n| n.path() == Some(full.as_str()));
        tree.add(&full, handler, Arc::clone(&self.prefixes));
        debug!(
            method = %method,
            path = %full,
            prefixes = ?self.prefixes,
            tree_size = tree.size(),
            replaced,
            "Route registered"
        );
        Ok(())
    }

    /// Register a `GET` route.
    ///
    /// # Errors
    ///
    /// See [`add`](Self::add).
    pub fn get<F>(&self, path: &str, handler: F) -> Result<(), RouteError>
    where
        F: Fn(HandlerRequest) -> HandlerResponse + Send + Sync + 'static,
    {
        self.add_handler(Method::GET, path, Arc::new(handler))
    }

    /// Register a `POST` route.
    ///
    /// # Errors
    ///
    /// See [`add`](Self::add).
    pub fn post<F>(&self, path: &str, handler: F) -> Result<(), RouteError>
    where
        F: Fn(HandlerRequest) -> HandlerResponse + Send + Sync + 'static,
    {
        self.add_handler(Method::POST, path, Arc::new(handler))
    }

    /// Register a `PUT` route.
    ///
    /// # Errors
    ///
    /// See [`add`](Self::add).
    pub fn put<F>(&self, path: &str, handler: F) -> Result<(), RouteError>
    where
        F: Fn(HandlerRequest) -> HandlerResponse + Send + Sync + 'static,
    {
        self.add_handler(Method::PUT, path, Arc::new(handler))
    }

    /// Register a `DELETE` route.
    ///
    /// # Errors
    ///
    /// See [`add`](Self::add).
    pub fn delete<F>(&self, path: &str, handler: F) -> Result<(), RouteError>
    where
        F: Fn(HandlerRequest) -> HandlerResponse + Send + Sync + 'static,
    {
        self.add_handler(Method::DELETE, path, Arc::new(handler))
    }

    /// Register a `PATCH` route.
    ///
    /// # Errors
    ///
    /// See [`add`](Self::add).
    pub fn patch<F>(&self, path: &str, handler: F) -> Result<(), RouteError>
    where
        F: Fn(HandlerRequest) -> HandlerResponse + Send + Sync + 'static,
    {
        self.add_handler(Method::PATCH, path, Arc::new(handler))
    }

    /// Register a `HEAD` route.
    ///
    /// # Errors
    ///
    /// See [`add`](Self::add).
    pub fn head<F>(&self, path: &str, handler: F) -> Result<(), RouteError>
    where
        F: Fn(HandlerRequest) -> HandlerResponse + Send + Sync + 'static,
    {
        self.add_handler(Method::HEAD, path, Arc::new(handler))
    }

    /// Register an `OPTIONS` route.
    ///
    /// # Errors
    ///
    /// See [`add`](Self::add).
    pub fn options<F>(&self, path: &str, handler: F) -> Result<(), RouteError>
    where
        F: Fn(HandlerRequest) -> HandlerResponse + Send + Sync + 'static,
    {
        self.add_handler(Method::OPTIONS, path, Arc::new(handler))
    }

    /// A view that scopes middleware to `prefix`.
    ///
    /// Nested groups join their prefixes: `group("/hello").group("world/")`
    /// has the prefix `/hello/world`. Routes registered through the view keep
    /// their own path.
    #[must_use]
    pub fn group(&self, prefix: &str) -> Router {
        let full: Arc<str> = Arc::from(join_path(self.prefix(), prefix));

        let mut prefixes = self.prefixes.to_vec();
        if prefixes.last() != Some(&full) {
            prefixes.push(Arc::clone(&full));
        }
        self.table().middlewares.ensure_prefix(&full);
        debug!(prefix = %full, depth = prefixes.len(), "Route group created");

        Router {
            table: Arc::clone(&self.table),
            matcher: Arc::clone(&self.matcher),
            config: Arc::clone(&self.config),
            prefixes: Arc::from(prefixes),
        }
    }

    /// Append `middleware` to this view's group.
    ///
    /// It wraps every route registered through this view or a nested group,
    /// including routes added before this call.
    pub fn use_middleware<M>(&self, middleware: M)
    where
        M: Middleware + 'static,
    {
        let prefix: Arc<str> = Arc::from(self.prefix());
        self.table().middlewares.push(&prefix, Arc::new(middleware));
    }

    /// Register a helper fragment for `:name` parameters.
    ///
    /// # Errors
    ///
    /// Returns [`PatternError::InvalidHelper`] when `fragment` is not a regex.
    pub fn register_helper(&self, name: &str, fragment: &str) -> Result<(), PatternError> {
        self.matcher.register_helper(name, fragment)
    }

    /// Replace the not-found handler for the whole table.
    pub fn not_found<F>(&self, handler: F)
    where
        F: Fn(HandlerRequest) -> HandlerResponse + Send + Sync + 'static,
    {
        self.table().not_found = Some(Arc::new(handler));
    }

    /// Serve files from `config.root` below `mount`.
    ///
    /// Registers `GET <mount>/*`; like any route, `mount` is not prefixed by
    /// the group.
    ///
    /// # Errors
    ///
    /// Fails when the root is not a directory or the mount is not a valid
    /// route pattern.
    pub fn serve_static(&self, mount: &str, config: StaticConfig) -> Result<(), RouteError> {
        let mount = join_path("/", mount);
        let files = StaticFiles::new(&mount, config)?;
        info!(mount = %mount, "Static files mounted");
        self.add_handler(Method::GET, &join_path(&mount, "/*"), files.into_handler())
    }

    /// Snapshot the table into an immutable [`Dispatcher`].
    ///
    /// Later registrations through this router do not affect dispatchers that
    /// were already built. Helpers are shared.
    #[must_use]
    pub fn build(&self) -> Dispatcher {
        let table = self.table();
        let not_found = table.not_found.clone().unwrap_or_else(|| {
            let body = self.config.not_found_body.clone();
            Arc::new(move |_req: HandlerRequest| HandlerResponse::text(404, body.clone()))
        });
        let routes: usize = table.trees.values().map(PathTree::len).sum();
        info!(
            methods = table.trees.len(),
            routes,
            groups = table.middlewares.prefixes().len(),
            "Dispatcher built"
        );
        Dispatcher::new(
            table.trees.clone(),
            table.middlewares.clone(),
            Arc::clone(&self.matcher),
            not_found,
        )
    }
}
