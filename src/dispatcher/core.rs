//! Dispatcher core: request/response types and the per-request state machine.
//!
//! Resolution runs in three steps for every request:
//!
//! 1. **ExactLookup**: the method's [`PathTree`] is walked with the request
//!    path; a leaf whose stored path is the request path wins outright
//! 2. **FallbackScan**: every route of the method is tried as a pattern, in
//!    registration order; the first match wins and its captures become path
//!    parameters
//! 3. **NotFound**: the configured not-found handler answers
//!
//! The winning route's group prefixes select the middleware wrapped around its
//! handler. The not-found handler runs without middleware.

use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use http::Method;
use serde_json::Value;
use smallvec::SmallVec;
use tracing::{debug, info, warn};
use url::form_urlencoded;

use crate::error::PatternError;
use crate::middleware::MiddlewareTable;
use crate::pattern::{ParamVec, PatternMatcher};
use crate::router::{PathTree, Route};

/// Maximum inline headers before heap allocation.
pub const MAX_INLINE_HEADERS: usize = 16;

/// Header storage for requests and responses.
///
/// Header names are `Arc<str>`; values are owned per request.
pub type HeaderVec = SmallVec<[(Arc<str>, String); MAX_INLINE_HEADERS]>;

/// A request handler.
///
/// Handlers are plain functions from request to response. They are shared
/// between threads, so they must be `Send + Sync`.
pub type Handler = Arc<dyn Fn(HandlerRequest) -> HandlerResponse + Send + Sync>;

/// Wrap a closure into a [`Handler`].
pub fn handler_fn<F>(f: F) -> Handler
where
    F: Fn(HandlerRequest) -> HandlerResponse + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Request data handed to a handler.
#[derive(Debug, Clone)]
pub struct HandlerRequest {
    /// HTTP method (GET, POST, etc.)
    pub method: Method,
    /// Request path, without the query string
    pub path: String,
    /// Parameters captured by the matched route pattern
    pub path_params: ParamVec,
    /// Decoded query string parameters
    pub query_params: ParamVec,
    /// Request headers, names lowercased
    pub headers: HeaderVec,
    /// Raw request body
    pub body: Vec<u8>,
}

impl HandlerRequest {
    /// Request for `method` and `uri`; the query string, if any, is decoded
    /// into [`query_params`](Self::query_params).
    #[must_use]
    pub fn new(method: Method, uri: &str) -> Self {
        let (path, query) = match uri.split_once('?') {
            Some((path, query)) => (path, Some(query)),
            None => (uri, None),
        };
        Self {
            method,
            path: if path.is_empty() { "/".to_string() } else { path.to_string() },
            path_params: ParamVec::new(),
            query_params: query.map(parse_query).unwrap_or_default(),
            headers: HeaderVec::new(),
            body: Vec::new(),
        }
    }

    /// Convert an [`http::Request`].
    ///
    /// Headers whose value is not visible ASCII are skipped.
    #[must_use]
    pub fn from_http(req: http::Request<Vec<u8>>) -> Self {
        let (parts, body) = req.into_parts();
        let headers = parts
            .headers
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (Arc::from(name.as_str()), v.to_string()))
            })
            .collect();
        Self {
            method: parts.method,
            path: parts.uri.path().to_string(),
            path_params: ParamVec::new(),
            query_params: parts.uri.query().map(parse_query).unwrap_or_default(),
            headers,
            body,
        }
    }

    /// Builder-style header insertion.
    #[must_use]
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers
            .push((Arc::from(name.to_ascii_lowercase()), value.to_string()));
        self
    }

    /// Builder-style body.
    #[must_use]
    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    /// Get a path parameter by name
    ///
    /// Uses "last write wins" semantics if a pattern repeats a name.
    #[inline]
    #[must_use]
    pub fn get_path_param(&self, name: &str) -> Option<&str> {
        self.path_params
            .iter()
            .rfind(|(k, _)| k.as_ref() == name)
            .map(|(_, v)| v.as_str())
    }

    /// Path parameter `name`, or `""` when the route did not capture it.
    #[inline]
    #[must_use]
    pub fn param(&self, name: &str) -> &str {
        self.get_path_param(name).unwrap_or_default()
    }

    /// Get a query parameter by name (last occurrence wins)
    #[inline]
    #[must_use]
    pub fn get_query_param(&self, name: &str) -> Option<&str> {
        self.query_params
            .iter()
            .rfind(|(k, _)| k.as_ref() == name)
            .map(|(_, v)| v.as_str())
    }

    /// Get a header by name (case-insensitive per RFC 7230)
    #[inline]
    #[must_use]
    pub fn get_header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Path parameters as a map.
    /// Note: This allocates - use get_path_param() in hot paths
    #[must_use]
    pub fn path_params_map(&self) -> HashMap<String, String> {
        self.path_params
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    /// Copy of everything but the body.
    #[must_use]
    pub fn head(&self) -> Self {
        Self {
            method: self.method.clone(),
            path: self.path.clone(),
            path_params: self.path_params.clone(),
            query_params: self.query_params.clone(),
            headers: self.headers.clone(),
            body: Vec::new(),
        }
    }
}

fn parse_query(query: &str) -> ParamVec {
    form_urlencoded::parse(query.as_bytes())
        .map(|(k, v)| (Arc::from(k.as_ref()), v.into_owned()))
        .collect()
}

/// Response returned by a handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandlerResponse {
    /// HTTP status code (200, 404, 500, etc.)
    pub status: u16,
    /// Response headers
    pub headers: HeaderVec,
    /// Response body
    pub body: Vec<u8>,
}

impl HandlerResponse {
    /// Create a new response with the given status, headers, and body
    #[must_use]
    pub fn new(status: u16, headers: HeaderVec, body: Vec<u8>) -> Self {
        Self {
            status,
            headers,
            body,
        }
    }

    /// Plain text response.
    #[must_use]
    pub fn text(status: u16, body: impl Into<String>) -> Self {
        let mut headers = HeaderVec::new();
        headers.push((
            Arc::from("content-type"),
            "text/plain; charset=utf-8".to_string(),
        ));
        Self::new(status, headers, body.into().into_bytes())
    }

    /// Create a JSON response with default headers
    #[must_use]
    pub fn json(status: u16, body: &Value) -> Self {
        let mut headers = HeaderVec::new();
        headers.push((Arc::from("content-type"), "application/json".to_string()));
        // Serializing a `Value` cannot fail.
        Self::new(status, headers, serde_json::to_vec(body).unwrap_or_default())
    }

    /// Create an error response
    #[must_use]
    pub fn error(status: u16, message: &str) -> Self {
        Self::json(status, &serde_json::json!({ "error": message }))
    }

    /// The stock `404 Not Found` text response.
    #[must_use]
    pub fn not_found() -> Self {
        Self::text(404, "404 Not Found")
    }

    /// Empty `204 No Content` response.
    #[must_use]
    pub fn no_content() -> Self {
        Self::new(204, HeaderVec::new(), Vec::new())
    }

    /// Get a header by name
    #[inline]
    #[must_use]
    pub fn get_header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Add or update a header
    pub fn set_header(&mut self, name: &str, value: String) {
        self.headers.retain(|(k, _)| !k.eq_ignore_ascii_case(name));
        self.headers.push((Arc::from(name), value));
    }

    /// Body as text, lossily decoded.
    #[must_use]
    pub fn body_str(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }

    /// Convert into an [`http::Response`].
    ///
    /// # Errors
    ///
    /// Fails when the status code or a header is not valid HTTP.
    pub fn into_http(self) -> Result<http::Response<Vec<u8>>, http::Error> {
        let mut builder = http::Response::builder().status(self.status);
        for (name, value) in &self.headers {
            builder = builder.header(name.as_ref(), value.as_str());
        }
        builder.body(self.body)
    }
}

/// How a route was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchKind {
    /// The request path equals a registered path
    Exact,
    /// A registered path matched as a pattern
    Fallback,
}

/// Result of resolving a request against the route table.
#[derive(Clone)]
pub struct RouteMatch {
    /// The registered path that matched
    pub route: String,
    /// Which lookup stage produced the match
    pub kind: MatchKind,
    /// Captured parameters; empty for exact matches
    pub path_params: ParamVec,
    /// Group prefixes recorded on the route, outermost first
    pub group_prefixes: Arc<[Arc<str>]>,
    /// The route's handler, before middleware
    pub handler: Handler,
}

impl RouteMatch {
    fn new(route: &Route<Handler>, kind: MatchKind, path_params: ParamVec) -> Self {
        Self {
            route: route.path.clone(),
            kind,
            path_params,
            group_prefixes: Arc::clone(&route.group_prefixes),
            handler: Arc::clone(&route.handler),
        }
    }

    /// Get a captured parameter by name
    #[must_use]
    pub fn get_path_param(&self, name: &str) -> Option<&str> {
        self.path_params
            .iter()
            .rfind(|(k, _)| k.as_ref() == name)
            .map(|(_, v)| v.as_str())
    }
}

impl fmt::Debug for RouteMatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteMatch")
            .field("route", &self.route)
            .field("kind", &self.kind)
            .field("path_params", &self.path_params)
            .field("group_prefixes", &self.group_prefixes)
            .finish_non_exhaustive()
    }
}

/// Immutable route table ready to serve requests.
///
/// Built by [`Router::build`](crate::router::Router::build). Every method takes
/// `&self`; the only state touched while serving is the compiled-pattern
/// cache, which is internally synchronized. Share it across threads with an
/// `Arc` or scoped borrows.
pub struct Dispatcher {
    trees: HashMap<Method, PathTree<Handler>>,
    middlewares: MiddlewareTable,
    matcher: Arc<PatternMatcher>,
    not_found: Handler,
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let routes: usize = self.trees.values().map(PathTree::len).sum();
        f.debug_struct("Dispatcher")
            .field("methods", &self.trees.len())
            .field("routes", &routes)
            .field("cached_patterns", &self.matcher.cache().len())
            .finish_non_exhaustive()
    }
}

impl Dispatcher {
    pub(crate) fn new(
        trees: HashMap<Method, PathTree<Handler>>,
        middlewares: MiddlewareTable,
        matcher: Arc<PatternMatcher>,
        not_found: Handler,
    ) -> Self {
        Self {
            trees,
            middlewares,
            matcher,
            not_found,
        }
    }

    /// The pattern matcher shared with the router that built this dispatcher.
    #[must_use]
    pub fn matcher(&self) -> &PatternMatcher {
        &self.matcher
    }

    /// Register (or replace) a helper fragment.
    ///
    /// Only affects patterns that have not been matched yet.
    ///
    /// # Errors
    ///
    /// Returns [`PatternError::InvalidHelper`] when `fragment` is not a regex.
    pub fn register_helper(&self, name: &str, fragment: &str) -> Result<(), PatternError> {
        self.matcher.register_helper(name, fragment)
    }

    /// The tree for `method`, if any route was registered for it.
    #[must_use]
    pub fn tree(&self, method: &Method) -> Option<&PathTree<Handler>> {
        self.trees.get(method)
    }

    /// Registered `(method, path)` pairs, methods sorted, paths in
    /// registration order.
    #[must_use]
    pub fn routes(&self) -> Vec<(Method, String)> {
        let mut methods: Vec<&Method> = self.trees.keys().collect();
        methods.sort_by(|a, b| a.as_str().cmp(b.as_str()));
        methods
            .into_iter()
            .flat_map(|method| {
                self.trees[method]
                    .leaves()
                    .into_iter()
                    .map(move |route| (method.clone(), route.path.clone()))
            })
            .collect()
    }

    /// Resolve `path` for `method` without invoking anything.
    ///
    /// Returns `None` for the not-found outcome.
    #[must_use]
    pub fn resolve(&self, method: &Method, path: &str) -> Option<RouteMatch> {
        let Some(tree) = self.trees.get(method) else {
            debug!(method = %method, path, "No routes registered for method");
            return None;
        };

        let exact = tree
            .find(path)
            .into_iter()
            .filter_map(|node| node.route())
            .find(|route| route.path == path);
        if let Some(route) = exact {
            debug!(method = %method, path, route = %route.path, "Exact route match");
            return Some(RouteMatch::new(route, MatchKind::Exact, ParamVec::new()));
        }

        debug!(method = %method, path, candidates = tree.len(), "Falling back to pattern scan");
        for route in tree.leaves() {
            match self.matcher.matches(path, &route.path) {
                Ok(result) if result.matched => {
                    debug!(
                        method = %method,
                        path,
                        route = %route.path,
                        params = result.params.len(),
                        "Pattern route match"
                    );
                    return Some(RouteMatch::new(route, MatchKind::Fallback, result.params));
                }
                Ok(_) => {}
                Err(error) => {
                    // Registration validates patterns; reaching this means the
                    // helper table changed underneath an uncached route.
                    warn!(route = %route.path, error = %error, "Skipping route with invalid pattern");
                }
            }
        }

        debug!(method = %method, path, "No route matched");
        None
    }

    /// Resolve and run `req`.
    ///
    /// Matched routes run through their middleware chain; everything else is
    /// answered by the not-found handler.
    pub fn dispatch(&self, mut req: HandlerRequest) -> HandlerResponse {
        let start = Instant::now();
        let Some(matched) = self.resolve(&req.method, &req.path) else {
            let method = req.method.clone();
            let path = req.path.clone();
            let resp = (self.not_found)(req);
            debug!(
                method = %method,
                path = %path,
                status = resp.status,
                duration_us = start.elapsed().as_micros() as u64,
                "Request not found"
            );
            return resp;
        };

        let method = req.method.clone();
        let path = req.path.clone();
        req.path_params = matched.path_params;
        let handler = self
            .middlewares
            .compose(&matched.group_prefixes, matched.handler);
        let resp = handler(req);

        info!(
            method = %method,
            path = %path,
            route = %matched.route,
            kind = ?matched.kind,
            status = resp.status,
            duration_us = start.elapsed().as_micros() as u64,
            "Request dispatched"
        );
        resp
    }

    /// Dispatch an [`http::Request`] and convert the response back.
    ///
    /// # Errors
    ///
    /// Fails when the handler produced an invalid status code or header.
    pub fn handle(
        &self,
        req: http::Request<Vec<u8>>,
    ) -> Result<http::Response<Vec<u8>>, http::Error> {
        self.dispatch(HandlerRequest::from_http(req)).into_http()
    }
}
