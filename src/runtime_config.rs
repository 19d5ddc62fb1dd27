//! # Runtime Configuration Module
//!
//! Router-level settings, loaded from the environment or from a TOML
//! document.
//!
//! ## Environment Variables
//!
//! ### `VI_BANNER`
//!
//! When `true`/`1`/`yes`/`on`, the router logs a startup event carrying the
//! crate version once it is created. Default: off.
//!
//! ### `VI_NOT_FOUND_BODY`
//!
//! Body of the default not-found response. Default: `404 Not Found`.
//!
//! ## TOML
//!
//! ```toml
//! banner = true
//! not_found_body = "nothing here"
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use vi_router::runtime_config::RouterConfig;
//!
//! let config = RouterConfig::from_toml_str("banner = true").unwrap();
//! assert!(config.banner);
//! assert_eq!(config.not_found_body, "404 Not Found");
//! ```

use std::env;

use serde::Deserialize;

/// Body of the stock not-found response.
pub const DEFAULT_NOT_FOUND_BODY: &str = "404 Not Found";

/// Settings read once when a [`Router`](crate::router::Router) is created.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RouterConfig {
    /// Log the startup banner event
    pub banner: bool,
    /// Body of the default not-found response
    pub not_found_body: String,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            banner: false,
            not_found_body: DEFAULT_NOT_FOUND_BODY.to_string(),
        }
    }
}

impl RouterConfig {
    /// Load configuration from environment variables.
    ///
    /// Unset or unparsable values keep their defaults.
    #[must_use]
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(val) = env::var("VI_BANNER") {
            config.banner = parse_flag(&val).unwrap_or(config.banner);
        }
        if let Ok(val) = env::var("VI_NOT_FOUND_BODY") {
            if !val.is_empty() {
                config.not_found_body = val;
            }
        }
        config
    }

    /// Parse a TOML document; missing keys keep their defaults.
    ///
    /// # Errors
    ///
    /// Fails on malformed TOML, wrong value types, or unknown keys.
    pub fn from_toml_str(source: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(source)
    }
}

fn parse_flag(val: &str) -> Option<bool> {
    match val.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
