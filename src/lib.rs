//! # vi-router
//!
//! **vi-router** is an embeddable HTTP request router. It maps a
//! `(method, path)` pair to a handler, extracts named path parameters, and
//! wraps the handler in prefix-scoped middleware. It does not own a socket:
//! the host server hands it requests and sends back what it returns.
//!
//! ## Architecture
//!
//! - **[`router`]** - Registration API, route groups, and the per-method
//!   character trie ([`router::PathTree`])
//! - **[`pattern`]** - The route pattern language, helper fragments, and the
//!   compiled-pattern cache
//! - **[`dispatcher`]** - Immutable route table that resolves and serves
//!   requests
//! - **[`middleware`]** - The [`Middleware`](middleware::Middleware) trait,
//!   per-prefix chains, and stock tracing/metrics middleware
//! - **[`static_files`]** - Static file mounts
//! - **[`runtime_config`]** - Router settings from the environment or TOML
//! - **[`logging`]** - `tracing` subscriber setup for host programs
//!
//! ### Request Handling Flow
//!
//! ```text
//! request ──► exact lookup (trie walk)
//!               │ hit ─────────────────────┐
//!               │ miss                      ▼
//!               └─► pattern scan ──hit──► middleware(prefixes) ─► handler
//!                     (registration order)
//!                     │ miss
//!                     └─► not-found handler (no middleware)
//! ```
//!
//! ## Route Patterns
//!
//! | Segment         | Meaning                                              |
//! |-----------------|------------------------------------------------------|
//! | `users`         | Literal text; regex metacharacters are escaped       |
//! | `:name`         | Parameter; regex from the `name` helper or `[\w]+`   |
//! | `:name?`        | Parameter followed by a regex modifier               |
//! | `{name:regex}`  | Parameter with an explicit regex                     |
//! | `*`             | Anything, including `/`                              |
//!
//! A trailing `/` on the request path is always optional.
//!
//! ## Quick Start
//!
//! ```rust
//! use http::Method;
//! use vi_router::{HandlerRequest, HandlerResponse, Router};
//!
//! let router = Router::default();
//! router
//!     .get("/user/:name/:id", |req: HandlerRequest| {
//!         HandlerResponse::text(200, format!("{} #{}", req.param("name"), req.param("id")))
//!     })
//!     .unwrap();
//!
//! let api = router.group("/api");
//! api.use_middleware(vi_router::middleware::TracingMiddleware);
//! api.get("/api/ping", |_req: HandlerRequest| HandlerResponse::text(200, "pong")).unwrap();
//!
//! let dispatcher = router.build();
//! let resp = dispatcher.dispatch(HandlerRequest::new(Method::GET, "/user/anh/101"));
//! assert_eq!(resp.body_str(), "anh #101");
//! let resp = dispatcher.dispatch(HandlerRequest::new(Method::GET, "/api/ping"));
//! assert_eq!(resp.body_str(), "pong");
//! ```
//!
//! ## Concurrency
//!
//! Registration goes through a [`Router`] and is expected to happen before
//! serving. [`Router::build`] snapshots the table into a [`Dispatcher`], whose
//! methods all take `&self` and which can be shared across threads. The only
//! state it mutates while serving is the compiled-pattern cache, which is
//! internally synchronized.

pub mod cli;
pub mod dispatcher;
pub mod error;
pub mod logging;
pub mod middleware;
pub mod pattern;
pub mod router;
pub mod runtime_config;
pub mod static_files;

pub use dispatcher::{Dispatcher, Handler, HandlerRequest, HandlerResponse, MatchKind, RouteMatch};
pub use error::{PatternError, RouteError};
pub use middleware::Middleware;
pub use pattern::{MatchResult, PatternMatcher};
pub use router::Router;
pub use runtime_config::RouterConfig;
pub use static_files::StaticConfig;
