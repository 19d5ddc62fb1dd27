//! Memo table for compiled route patterns.
//!
//! ## Thread Safety
//!
//! The table is a `RwLock<HashMap>`:
//! - Lookups share the read lock, so concurrent requests never serialize on hits
//! - Compilation runs with no lock held
//! - Insertion takes the write lock and keeps whichever entry landed first
//!
//! Two requests racing on the same uncached pattern may both compile it. That is
//! wasted work only: identical pattern text yields interchangeable matchers.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use tracing::debug;

use super::compiler::CompiledPattern;
use crate::error::PatternError;

/// Compiled patterns keyed by their raw pattern text.
#[derive(Debug, Default)]
pub struct PatternCache {
    entries: RwLock<HashMap<String, Arc<CompiledPattern>>>,
}

impl PatternCache {
    /// Empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached entry for `pattern`, if any.
    #[must_use]
    pub fn get(&self, pattern: &str) -> Option<Arc<CompiledPattern>> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(pattern)
            .map(Arc::clone)
    }

    /// Return the cached entry for `pattern` or build one with `compile`.
    ///
    /// Compile errors are returned to the caller and never cached.
    pub fn get_or_compile<F>(
        &self,
        pattern: &str,
        compile: F,
    ) -> Result<Arc<CompiledPattern>, PatternError>
    where
        F: FnOnce(&str) -> Result<CompiledPattern, PatternError>,
    {
        if let Some(hit) = self.get(pattern) {
            return Ok(hit);
        }

        let compiled = Arc::new(compile(pattern)?);

        let mut entries = self
            .entries
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        // Another thread may have inserted while we compiled.
        let entry = Arc::clone(
            entries
                .entry(pattern.to_string())
                .or_insert(compiled),
        );
        debug!(
            pattern,
            cache_size = entries.len(),
            "Route pattern cached"
        );
        Ok(entry)
    }

    /// Number of cached patterns.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// True when nothing has been compiled yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
