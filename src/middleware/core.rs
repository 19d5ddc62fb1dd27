use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::dispatcher::{Handler, HandlerRequest, HandlerResponse};

/// A wrapping behavior placed around a route handler.
///
/// `wrap` receives the next handler in the chain and returns the handler that
/// runs in its place. It is called once per dispatched request, while the
/// chain for that request is assembled.
///
/// Any `Fn(Handler) -> Handler` closure is a middleware:
///
/// ```rust
/// use std::sync::Arc;
/// use vi_router::dispatcher::{Handler, HandlerRequest};
///
/// let add_header = |next: Handler| -> Handler {
///     Arc::new(move |req: HandlerRequest| {
///         let mut resp = next(req);
///         resp.set_header("x-powered-by", "vi-router".to_string());
///         resp
///     })
/// };
/// # let _: &dyn vi_router::middleware::Middleware = &add_header;
/// ```
pub trait Middleware: Send + Sync {
    fn wrap(&self, next: Handler) -> Handler;
}

impl<F> Middleware for F
where
    F: Fn(Handler) -> Handler + Send + Sync,
{
    fn wrap(&self, next: Handler) -> Handler {
        self(next)
    }
}

/// Observe-only middleware expressed as before/after callbacks.
///
/// Adapt with [`Hooked`] to register it.
pub trait Hooks: Send + Sync {
    /// Runs before the handler; returning a response skips the handler and
    /// every inner middleware.
    fn before(&self, _req: &HandlerRequest) -> Option<HandlerResponse> {
        None
    }

    /// Runs after the handler. `req` carries everything but the body.
    fn after(&self, _req: &HandlerRequest, _res: &mut HandlerResponse, _latency: Duration) {}
}

/// [`Middleware`] adapter for a [`Hooks`] implementation.
pub struct Hooked<H> {
    hooks: Arc<H>,
}

impl<H: Hooks> Hooked<H> {
    pub fn new(hooks: H) -> Self {
        Self {
            hooks: Arc::new(hooks),
        }
    }
}

impl<H: Hooks + 'static> Middleware for Hooked<H> {
    fn wrap(&self, next: Handler) -> Handler {
        let hooks = Arc::clone(&self.hooks);
        Arc::new(move |req: HandlerRequest| {
            if let Some(early) = hooks.before(&req) {
                return early;
            }
            let head = req.head();
            let start = Instant::now();
            let mut resp = next(req);
            hooks.after(&head, &mut resp, start.elapsed());
            resp
        })
    }
}
