//! # Middleware Module
//!
//! Middleware wraps route handlers. Each route group (identified by its
//! prefix) owns an ordered list; a dispatched route runs the middleware of
//! every group it was registered through, outermost group first.
//!
//! - [`Middleware`]: the `wrap(next) -> Handler` primitive
//! - [`Hooks`] and [`Hooked`]: before/after callbacks adapted to a middleware
//! - [`MiddlewareTable`] and [`compose`]: storage and chain assembly
//! - [`TracingMiddleware`], [`MetricsMiddleware`]: bundled implementations

mod chain;
mod core;
mod metrics;
mod tracing;

pub use chain::{compose, MiddlewareTable};
pub use core::{Hooked, Hooks, Middleware};
pub use metrics::MetricsMiddleware;
pub use tracing::TracingMiddleware;
