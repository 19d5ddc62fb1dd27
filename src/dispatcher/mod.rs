//! # Dispatcher Module
//!
//! The dispatcher answers requests against a finished route table.
//!
//! ## Request Flow
//!
//! 1. The method selects a [`PathTree`](crate::router::PathTree); unknown
//!    methods go straight to not-found
//! 2. An exact walk of the tree looks for a route registered under the
//!    request path itself
//! 3. Otherwise every route of the method is tried as a pattern, in
//!    registration order, and the first match supplies the path parameters
//! 4. The route's group middleware is composed around its handler and run
//! 5. With no match, the not-found handler answers
//!
//! ## Example
//!
//! ```rust
//! use http::Method;
//! use vi_router::dispatcher::{HandlerRequest, HandlerResponse};
//! use vi_router::router::Router;
//!
//! let router = Router::default();
//! router
//!     .get("/user/:name", |req: HandlerRequest| {
//!         HandlerResponse::text(200, format!("hello {}", req.param("name")))
//!     })
//!     .unwrap();
//! let dispatcher = router.build();
//!
//! let resp = dispatcher.dispatch(HandlerRequest::new(Method::GET, "/user/anh"));
//! assert_eq!(resp.body_str(), "hello anh");
//! ```

mod core;

pub use core::{
    handler_fn, Dispatcher, Handler, HandlerRequest, HandlerResponse, HeaderVec, MatchKind,
    RouteMatch, MAX_INLINE_HEADERS,
};
