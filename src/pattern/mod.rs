//! # Pattern Module
//!
//! Route patterns are the external contract of the router: literal segments,
//! `:name` parameters (optionally followed by a modifier such as `?` or `*`),
//! `{name:regex}` parameters, and the `*` wildcard. This module compiles them
//! into anchored regular expressions and runs them against request paths.
//!
//! ## Components
//!
//! - [`PatternCompiler`] turns one pattern into a [`CompiledPattern`]
//! - [`HelperRegistry`] supplies the regex fragment for `:name` parameters
//! - [`PatternCache`] memoizes compiled patterns by their text
//! - [`PatternMatcher`] ties the three together and is owned by one router
//!
//! ## Example
//!
//! ```rust
//! use vi_router::pattern::PatternMatcher;
//!
//! let matcher = PatternMatcher::new();
//! matcher
//!     .register_helper("ip", r"\d{1,3}\.\d{1,3}\.\d{1,3}\.\d{1,3}")
//!     .unwrap();
//!
//! let result = matcher.matches("/location/192.168.0.1", "/location/:ip").unwrap();
//! assert!(result.matched);
//! assert_eq!(result.get("ip"), Some("192.168.0.1"));
//! ```
//!
//! ## Ordering sensitivity
//!
//! Helpers are read when a pattern is compiled. A helper registered after a
//! pattern was first matched does not affect that pattern: the cached
//! compilation is kept for the lifetime of the matcher.

mod cache;
mod compiler;
mod helpers;

use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use smallvec::SmallVec;

pub use cache::PatternCache;
pub use compiler::{CompiledPattern, PatternCompiler};
pub use helpers::{HelperRegistry, DEFAULT_HELPER};

use crate::error::PatternError;

/// Maximum number of path/query parameters before heap allocation.
pub const MAX_INLINE_PARAMS: usize = 8;

/// Parameter storage: `(name, value)` pairs in capture order.
///
/// Names are `Arc<str>` shared with the compiled pattern; values are owned
/// per request.
pub type ParamVec = SmallVec<[(Arc<str>, String); MAX_INLINE_PARAMS]>;

/// Outcome of matching one URL against one pattern.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MatchResult {
    /// Whether the pattern accepted the URL
    pub matched: bool,
    /// Captured parameters; empty when nothing was captured or on no match
    pub params: ParamVec,
}

impl MatchResult {
    /// The no-match result.
    #[must_use]
    pub fn no_match() -> Self {
        Self::default()
    }

    /// Value of parameter `name`.
    ///
    /// Uses "last write wins" semantics if a pattern repeats a name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .rfind(|(k, _)| k.as_ref() == name)
            .map(|(_, v)| v.as_str())
    }
}

impl Serialize for MatchResult {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeStruct;

        let params: std::collections::BTreeMap<&str, &str> = self
            .params
            .iter()
            .map(|(k, v)| (k.as_ref(), v.as_str()))
            .collect();
        let mut state = serializer.serialize_struct("MatchResult", 2)?;
        state.serialize_field("matched", &self.matched)?;
        state.serialize_field("params", &params)?;
        state.end()
    }
}

/// Helper registry plus compiled-pattern cache for one router instance.
///
/// Nothing here is global: two matchers never share helpers or cache entries.
#[derive(Debug, Default)]
pub struct PatternMatcher {
    helpers: HelperRegistry,
    cache: PatternCache,
}

impl PatternMatcher {
    /// Matcher with the seeded helpers and an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) a helper fragment for `:name` parameters.
    ///
    /// Only patterns compiled after this call see the new fragment.
    pub fn register_helper(&self, name: &str, fragment: &str) -> Result<(), PatternError> {
        self.helpers.register(name, fragment)
    }

    /// The helper registry.
    #[must_use]
    pub fn helpers(&self) -> &HelperRegistry {
        &self.helpers
    }

    /// The compiled-pattern cache.
    #[must_use]
    pub fn cache(&self) -> &PatternCache {
        &self.cache
    }

    /// Compile `pattern` without touching the cache.
    pub fn compile(&self, pattern: &str) -> Result<CompiledPattern, PatternError> {
        PatternCompiler::new(&self.helpers).compile(pattern)
    }

    /// Match `url` against `pattern`, compiling and caching it on first use.
    pub fn matches(&self, url: &str, pattern: &str) -> Result<MatchResult, PatternError> {
        let compiled = self
            .cache
            .get_or_compile(pattern, |p| PatternCompiler::new(&self.helpers).compile(p))?;
        Ok(match compiled.captures(url) {
            Some(params) => MatchResult {
                matched: true,
                params,
            },
            None => MatchResult::no_match(),
        })
    }
}

/// One URL whose outcome disagreed with the expectation in [`verify_matches`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchMismatch {
    /// The pattern under test
    pub pattern: String,
    /// The URL that was matched
    pub url: String,
    /// What [`PatternMatcher::matches`] reported
    pub result: MatchResult,
}

impl fmt::Display for MatchMismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "got matched={} params={:?} when matching {} against {}",
            self.result.matched, self.result.params, self.url, self.pattern
        )
    }
}

/// Check a pattern against a table of URLs and expected parameters.
///
/// With `expect == true`, every URL must match and every listed parameter must
/// be captured with the listed value. With `expect == false`, every URL must
/// either not match or capture something other than what is listed. Returns
/// one [`MatchMismatch`] per URL that disagrees; an empty vector means the
/// table holds.
///
/// # Errors
///
/// Returns the compile error if `pattern` is malformed.
pub fn verify_matches<'a, I>(
    matcher: &PatternMatcher,
    expect: bool,
    pattern: &str,
    cases: I,
) -> Result<Vec<MatchMismatch>, PatternError>
where
    I: IntoIterator<Item = (&'a str, &'a [(&'a str, &'a str)])>,
{
    let mut mismatches = Vec::new();
    for (url, expected) in cases {
        let result = matcher.matches(url, pattern)?;
        let params_agree = expected
            .iter()
            .all(|(name, value)| result.get(name) == Some(*value));
        if (result.matched && params_agree) != expect {
            mismatches.push(MatchMismatch {
                pattern: pattern.to_string(),
                url: url.to_string(),
                result,
            });
        }
    }
    Ok(mismatches)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_match_result_serializes_params_as_map() {
        let matcher = PatternMatcher::new();
        let result = matcher.matches("/user/anh/101", "/user/:name/:id").unwrap();
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "matched": true, "params": { "name": "anh", "id": "101" } })
        );
    }

    #[test]
    fn test_helper_registered_after_first_match_is_ignored() {
        let matcher = PatternMatcher::new();
        assert!(!matcher.matches("/tag/a-b", "/tag/:slug").unwrap().matched);

        matcher.register_helper("slug", "[a-z-]+").unwrap();
        // cached compilation still uses the default fragment
        assert!(!matcher.matches("/tag/a-b", "/tag/:slug").unwrap().matched);
        // a pattern compiled afterwards sees the new helper
        assert!(!matcher.matches("/tag/a-b", "/tags/:slug").unwrap().matched);
        assert!(matcher.matches("/tags/a-b", "/tags/:slug").unwrap().matched);
    }

    #[test]
    fn test_verify_matches_reports_mismatches() {
        let matcher = PatternMatcher::new();
        let ok: &[(&str, &str)] = &[("name", "dion"), ("id", "1234")];
        let wrong: &[(&str, &str)] = &[("name", "someone-else")];
        let mismatches = verify_matches(
            &matcher,
            true,
            "/user/:name/:id",
            [("/user/dion/1234", ok), ("/user/dion/1234", wrong)],
        )
        .unwrap();
        assert_eq!(mismatches.len(), 1);
        assert_eq!(mismatches[0].url, "/user/dion/1234");
    }
}
