//! Named regex fragments for `:name` parameters.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use regex::Regex;
use tracing::{debug, info};

use crate::error::PatternError;

/// Fragment used when a `:name` parameter has no helper of its own.
pub const DEFAULT_HELPER: &str = "default";

const SEEDED: [(&str, &str); 2] = [(DEFAULT_HELPER, r"[\w]+"), ("id", r"[\d]+")];

/// Maps a parameter name to the regex fragment its capture uses.
///
/// `/location/:ip` looks up `ip` here; names without an entry fall back to
/// [`DEFAULT_HELPER`]. Lookups take a read lock, registration a write lock, so
/// helpers may be added while requests are served. Patterns that were already
/// compiled and cached keep the fragment they were built with.
#[derive(Debug)]
pub struct HelperRegistry {
    fragments: RwLock<HashMap<String, String>>,
}

impl Default for HelperRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl HelperRegistry {
    /// Registry seeded with `default` (`[\w]+`) and `id` (`[\d]+`).
    #[must_use]
    pub fn new() -> Self {
        let fragments = SEEDED
            .iter()
            .map(|(name, fragment)| ((*name).to_string(), (*fragment).to_string()))
            .collect();
        Self {
            fragments: RwLock::new(fragments),
        }
    }

    /// Insert or replace a helper.
    ///
    /// The fragment must compile on its own; a broken fragment would otherwise
    /// surface later as a failure of every pattern that uses the name.
    pub fn register(&self, name: &str, fragment: &str) -> Result<(), PatternError> {
        Regex::new(fragment).map_err(|source| PatternError::InvalidHelper {
            name: name.to_string(),
            source,
        })?;

        let mut fragments = self
            .fragments
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        let replaced = fragments
            .insert(name.to_string(), fragment.to_string())
            .is_some();
        info!(helper = name, fragment, replaced, "Helper fragment registered");
        Ok(())
    }

    /// Fragment for `name`, or the default fragment.
    #[must_use]
    pub fn resolve(&self, name: &str) -> String {
        let fragments = self
            .fragments
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        match fragments.get(name) {
            Some(fragment) => fragment.clone(),
            None => {
                debug!(helper = name, "No helper registered, using default fragment");
                fragments
                    .get(DEFAULT_HELPER)
                    .cloned()
                    .unwrap_or_else(|| SEEDED[0].1.to_string())
            }
        }
    }

    /// Whether a helper with this exact name exists.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.fragments
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(name)
    }
}
