use std::sync::Arc;
use std::time::Instant;

use tracing::{field, info, info_span};

use super::Middleware;
use crate::dispatcher::{Handler, HandlerRequest};

/// Opens a `request` span around the inner chain and records the response
/// status and latency on it.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingMiddleware;

impl Middleware for TracingMiddleware {
    fn wrap(&self, next: Handler) -> Handler {
        Arc::new(move |req: HandlerRequest| {
            let span = info_span!(
                "request",
                method = %req.method,
                path = %req.path,
                status = field::Empty,
                latency_us = field::Empty,
            );
            let start = Instant::now();
            let resp = span.in_scope(|| next(req));
            let latency_us = start.elapsed().as_micros() as u64;

            span.record("status", resp.status);
            span.record("latency_us", latency_us);
            info!(parent: &span, status = resp.status, latency_us, "Request completed");
            resp
        })
    }
}
