//! Middleware storage by group prefix and chain composition.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use super::Middleware;
use crate::dispatcher::Handler;

/// Middleware lists keyed by route-group prefix.
///
/// The root prefix `/` always exists. Lists keep registration order.
#[derive(Clone)]
pub struct MiddlewareTable {
    by_prefix: HashMap<Arc<str>, Vec<Arc<dyn Middleware>>>,
}

impl Default for MiddlewareTable {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for MiddlewareTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut counts: Vec<(&str, usize)> = self
            .by_prefix
            .iter()
            .map(|(prefix, list)| (&**prefix, list.len()))
            .collect();
        counts.sort_unstable();
        f.debug_struct("MiddlewareTable")
            .field("by_prefix", &counts)
            .finish()
    }
}

impl MiddlewareTable {
    /// Table holding an empty list for `/`.
    #[must_use]
    pub fn new() -> Self {
        let mut by_prefix = HashMap::new();
        by_prefix.insert(Arc::from("/"), Vec::new());
        Self { by_prefix }
    }

    /// Make sure `prefix` has a (possibly empty) list.
    pub fn ensure_prefix(&mut self, prefix: &Arc<str>) {
        self.by_prefix.entry(Arc::clone(prefix)).or_default();
    }

    /// Append `middleware` to the list of `prefix`.
    pub fn push(&mut self, prefix: &Arc<str>, middleware: Arc<dyn Middleware>) {
        let list = self.by_prefix.entry(Arc::clone(prefix)).or_default();
        list.push(middleware);
        debug!(prefix = %prefix, count = list.len(), "Middleware registered");
    }

    /// Middleware registered for `prefix`, in registration order.
    #[must_use]
    pub fn get(&self, prefix: &str) -> &[Arc<dyn Middleware>] {
        self.by_prefix
            .get(prefix)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Known prefixes, sorted.
    #[must_use]
    pub fn prefixes(&self) -> Vec<&str> {
        let mut prefixes: Vec<&str> = self.by_prefix.keys().map(|p| &**p).collect();
        prefixes.sort_unstable();
        prefixes
    }

    /// Wrap `handler` with the middleware of every prefix in `prefixes`.
    ///
    /// `prefixes` runs outermost first, so the first middleware of the first
    /// prefix executes first and the last middleware of the last prefix runs
    /// right before `handler`.
    #[must_use]
    pub fn compose(&self, prefixes: &[Arc<str>], handler: Handler) -> Handler {
        let chain: Vec<&Arc<dyn Middleware>> = prefixes
            .iter()
            .flat_map(|prefix| self.get(prefix))
            .collect();
        compose(chain, handler)
    }
}

/// Fold `middlewares` around `handler`, right to left.
///
/// The first item ends up outermost.
pub fn compose<'m, I>(middlewares: I, handler: Handler) -> Handler
where
    I: IntoIterator<Item = &'m Arc<dyn Middleware>>,
    I::IntoIter: DoubleEndedIterator,
{
    middlewares
        .into_iter()
        .rev()
        .fold(handler, |next, middleware| middleware.wrap(next))
}
