use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use super::Hooks;
use crate::dispatcher::{HandlerRequest, HandlerResponse};

#[derive(Debug, Default)]
struct Counters {
    request_count: AtomicUsize,
    total_latency_ns: AtomicU64,
    status_2xx: AtomicUsize,
    status_3xx: AtomicUsize,
    status_4xx: AtomicUsize,
    status_5xx: AtomicUsize,
}

/// Request counters
///
/// Tracks request count, latency and responses per status class. All counters
/// use atomic operations, so one instance can observe every worker thread.
/// Clones share the same counters: keep one handle for reading and register
/// another with [`Hooked`](super::Hooked).
///
/// ```rust
/// use vi_router::middleware::{Hooked, MetricsMiddleware};
/// use vi_router::router::Router;
///
/// let metrics = MetricsMiddleware::new();
/// let router = Router::default();
/// router.use_middleware(Hooked::new(metrics.clone()));
/// assert_eq!(metrics.request_count(), 0);
/// ```
#[derive(Debug, Clone, Default)]
pub struct MetricsMiddleware {
    counters: Arc<Counters>,
}

impl MetricsMiddleware {
    /// Create a new metrics middleware with all counters initialized to zero
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the total number of requests processed
    #[must_use]
    pub fn request_count(&self) -> usize {
        self.counters.request_count.load(Ordering::Relaxed)
    }

    /// Calculate the average request latency
    ///
    /// Returns zero duration if no requests have been processed yet.
    #[must_use]
    pub fn average_latency(&self) -> Duration {
        let count = self.request_count() as u64;
        if count == 0 {
            Duration::from_nanos(0)
        } else {
            Duration::from_nanos(self.counters.total_latency_ns.load(Ordering::Relaxed) / count)
        }
    }

    /// Responses per status class: `(2xx, 3xx, 4xx, 5xx)`.
    #[must_use]
    pub fn status_counts(&self) -> (usize, usize, usize, usize) {
        let c = &self.counters;
        (
            c.status_2xx.load(Ordering::Relaxed),
            c.status_3xx.load(Ordering::Relaxed),
            c.status_4xx.load(Ordering::Relaxed),
            c.status_5xx.load(Ordering::Relaxed),
        )
    }
}

impl Hooks for MetricsMiddleware {
    fn before(&self, _req: &HandlerRequest) -> Option<HandlerResponse> {
        self.counters.request_count.fetch_add(1, Ordering::Relaxed);
        None
    }

    fn after(&self, _req: &HandlerRequest, res: &mut HandlerResponse, latency: Duration) {
        let c = &self.counters;
        c.total_latency_ns
            .fetch_add(latency.as_nanos() as u64, Ordering::Relaxed);
        let class = match res.status {
            200..=299 => &c.status_2xx,
            300..=399 => &c.status_3xx,
            400..=499 => &c.status_4xx,
            500..=599 => &c.status_5xx,
            _ => return,
        };
        class.fetch_add(1, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::Method;

    #[test]
    fn test_counts_by_status_class() {
        let metrics = MetricsMiddleware::new();
        let req = HandlerRequest::new(Method::GET, "/");
        for status in [200, 204, 404, 500] {
            assert!(metrics.before(&req).is_none());
            let mut resp = HandlerResponse::text(status, "");
            metrics.after(&req, &mut resp, Duration::from_micros(10));
        }
        assert_eq!(metrics.request_count(), 4);
        assert_eq!(metrics.status_counts(), (2, 0, 1, 1));
        assert_eq!(metrics.average_latency(), Duration::from_micros(10));
    }

    #[test]
    fn test_clones_share_counters() {
        let metrics = MetricsMiddleware::new();
        let handle = metrics.clone();
        metrics.before(&HandlerRequest::new(Method::GET, "/"));
        assert_eq!(handle.request_count(), 1);
    }
}
