use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand};
use http::Method;
use serde_json::json;
use tracing::debug;

use crate::dispatcher::{HandlerRequest, HandlerResponse, MatchKind};
use crate::pattern::{verify_matches, PatternMatcher};
use crate::router::Router;
use crate::runtime_config::RouterConfig;

/// Command-line interface for vi-router
#[derive(Parser, Debug)]
#[command(name = "vi-router")]
#[command(version, about = "Route pattern and route table tools", long_about = None)]
pub struct Cli {
    /// Router settings (TOML); defaults to the `VI_*` environment variables
    #[arg(long, global = true, env = "VI_CONFIG")]
    pub config: Option<PathBuf>,

    /// The subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Match one URL against one pattern
    Match {
        #[arg(short, long)]
        pattern: String,

        #[arg(short, long)]
        url: String,

        /// Helper fragment as NAME=REGEX (repeatable)
        #[arg(long = "helper", value_name = "NAME=REGEX")]
        helpers: Vec<String>,
    },
    /// Check a pattern against a list of URLs
    Check {
        #[arg(short, long)]
        pattern: String,

        /// Expected parameter as NAME=VALUE, required of every URL (repeatable)
        #[arg(long = "expect", value_name = "NAME=VALUE")]
        expected: Vec<String>,

        /// Require every URL to be rejected instead
        #[arg(long, default_value_t = false)]
        expect_fail: bool,

        /// Helper fragment as NAME=REGEX (repeatable)
        #[arg(long = "helper", value_name = "NAME=REGEX")]
        helpers: Vec<String>,

        #[arg(required = true)]
        urls: Vec<String>,
    },
    /// Register routes and resolve requests against them
    Resolve {
        /// Route as "METHOD PATH" (repeatable, registration order is kept)
        #[arg(long = "route", value_name = "METHOD PATH", required = true)]
        routes: Vec<String>,

        /// Request as "METHOD PATH" (repeatable)
        #[arg(long = "request", value_name = "METHOD PATH", required = true)]
        requests: Vec<String>,

        /// Helper fragment as NAME=REGEX (repeatable)
        #[arg(long = "helper", value_name = "NAME=REGEX")]
        helpers: Vec<String>,
    },
}

/// Run a parsed command line, printing to stdout.
///
/// # Errors
///
/// Fails on bad arguments, malformed patterns, or when `check` finds a URL
/// that disagrees with the expectation.
pub fn run_cli(cli: Cli) -> Result<()> {
    let config = load_config(cli.config.as_ref())?;
    let stdout = io::stdout();
    let mut out = stdout.lock();
    execute(&cli.command, config, &mut out)
}

fn load_config(path: Option<&PathBuf>) -> Result<RouterConfig> {
    match path {
        Some(path) => {
            let source = fs::read_to_string(path)
                .with_context(|| format!("Failed to read config {}", path.display()))?;
            RouterConfig::from_toml_str(&source)
                .with_context(|| format!("Invalid config {}", path.display()))
        }
        None => Ok(RouterConfig::from_env()),
    }
}

/// Run one command, writing its output to `out`.
///
/// # Errors
///
/// See [`run_cli`].
pub fn execute<W: Write>(command: &Commands, config: RouterConfig, out: &mut W) -> Result<()> {
    match command {
        Commands::Match {
            pattern,
            url,
            helpers,
        } => {
            let matcher = PatternMatcher::new();
            for helper in helpers {
                let (name, fragment) = split_pair(helper, '=')?;
                matcher.register_helper(name, fragment)?;
            }
            let result = matcher.matches(url, pattern)?;
            writeln!(out, "{}", serde_json::to_string(&result)?)?;
            Ok(())
        }
        Commands::Check {
            pattern,
            expected,
            expect_fail,
            helpers,
            urls,
        } => {
            let matcher = PatternMatcher::new();
            for helper in helpers {
                let (name, fragment) = split_pair(helper, '=')?;
                matcher.register_helper(name, fragment)?;
            }
            let params = expected
                .iter()
                .map(|pair| split_pair(pair, '='))
                .collect::<Result<Vec<_>>>()?;
            let cases = urls.iter().map(|url| (url.as_str(), params.as_slice()));
            let mismatches = verify_matches(&matcher, !expect_fail, pattern, cases)?;
            for mismatch in &mismatches {
                writeln!(out, "FAIL {mismatch}")?;
            }
            if !mismatches.is_empty() {
                bail!("{} of {} URLs disagreed", mismatches.len(), urls.len());
            }
            writeln!(out, "ok: {} URLs checked against {pattern}", urls.len())?;
            Ok(())
        }
        Commands::Resolve {
            routes,
            requests,
            helpers,
        } => {
            let router = Router::new(config);
            for helper in helpers {
                let (name, fragment) = split_pair(helper, '=')?;
                router.register_helper(name, fragment)?;
            }
            for route in routes {
                let (method, path) = split_pair(route, ' ')?;
                let label = route.clone();
                router
                    .add(method, path, move |_req: HandlerRequest| {
                        HandlerResponse::text(200, label.clone())
                    })
                    .with_context(|| format!("Failed to register `{route}`"))?;
            }
            let dispatcher = router.build();

            for request in requests {
                let (method, path) = split_pair(request, ' ')?;
                let method = Method::from_bytes(method.as_bytes())
                    .map_err(|_| anyhow!("invalid method in `{request}`"))?;
                debug!(%method, path, "Resolving");
                let line = match dispatcher.resolve(&method, path) {
                    Some(found) => {
                        let params: serde_json::Map<String, serde_json::Value> = found
                            .path_params
                            .iter()
                            .map(|(k, v)| (k.to_string(), json!(v)))
                            .collect();
                        json!({
                            "request": request,
                            "route": found.route,
                            "kind": match found.kind {
                                MatchKind::Exact => "exact",
                                MatchKind::Fallback => "fallback",
                            },
                            "params": params,
                        })
                    }
                    None => json!({ "request": request, "route": null }),
                };
                writeln!(out, "{line}")?;
            }
            Ok(())
        }
    }
}

fn split_pair(input: &str, sep: char) -> Result<(&str, &str)> {
    input
        .split_once(sep)
        .map(|(a, b)| (a.trim(), b.trim()))
        .filter(|(a, b)| !a.is_empty() && !b.is_empty())
        .ok_or_else(|| anyhow!("expected `A{sep}B`, got `{input}`"))
}
