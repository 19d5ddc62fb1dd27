//! Error types for route registration and pattern compilation.
//!
//! Everything here is a configuration error: it means a route table or helper
//! fragment was written incorrectly. A request that matches no route is not an
//! error and never produces one of these values.

use thiserror::Error;

/// A route pattern could not be turned into a matcher.
#[derive(Debug, Error)]
pub enum PatternError {
    /// The pattern was empty (or only whitespace).
    #[error("route pattern is empty")]
    Empty,

    /// A segment opens `{` without closing `}` or the other way around.
    #[error("unbalanced braces in segment `{segment}`")]
    UnbalancedBrace {
        /// The offending segment
        segment: String,
    },

    /// A `:name` or `{name:regex}` segment has no name.
    #[error("parameter name is empty in segment `{segment}`")]
    EmptyParamName {
        /// The offending segment
        segment: String,
    },

    /// `{name:}`: an explicit regex body that is empty.
    #[error("explicit regex is empty in segment `{segment}`")]
    EmptyRegex {
        /// The offending segment
        segment: String,
    },

    /// The assembled expression was rejected by the regex engine.
    #[error("pattern `{pattern}` does not compile: {source}")]
    InvalidRegex {
        /// The route pattern as registered
        pattern: String,
        /// Error reported by the regex engine
        #[source]
        source: regex::Error,
    },

    /// A helper fragment handed to `register_helper` is not a valid regex.
    #[error("helper `{name}` is not a valid regex fragment: {source}")]
    InvalidHelper {
        /// Helper name
        name: String,
        /// Error reported by the regex engine
        #[source]
        source: regex::Error,
    },
}

/// A route could not be registered.
#[derive(Debug, Error)]
pub enum RouteError {
    /// `add` was called with an empty method string.
    #[error("method must not be empty")]
    EmptyMethod,

    /// The method string is not a valid HTTP method token.
    #[error("invalid HTTP method `{method}`")]
    InvalidMethod {
        /// The rejected method string
        method: String,
    },

    /// `add` was called with an empty path.
    #[error("path must not be empty")]
    EmptyPath,

    /// The path is not a valid route pattern.
    #[error("invalid route `{path}`: {source}")]
    Pattern {
        /// The path as registered
        path: String,
        /// Why compilation failed
        #[source]
        source: PatternError,
    },

    /// The static file root does not exist or is not a directory.
    #[error("static root `{path}` is not a readable directory")]
    StaticRoot {
        /// The configured root
        path: String,
    },
}
