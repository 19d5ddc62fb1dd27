//! # CLI Module
//!
//! Command-line front end for poking at route patterns and route tables
//! without writing a host program.
//!
//! ## Commands
//!
//! ### `match`
//!
//! Match one URL against one pattern and print the result as JSON:
//!
//! ```bash
//! vi-router match --pattern '/user/:name/:id' --url /user/anh/101
//! # {"matched":true,"params":{"id":"101","name":"anh"}}
//! ```
//!
//! Options:
//! - `--helper <NAME=REGEX>` - Register a helper before matching (repeatable)
//!
//! ### `check`
//!
//! Assert that every URL matches (or, with `--expect-fail`, that none does).
//! Exits non-zero when any URL disagrees:
//!
//! ```bash
//! vi-router check --pattern '/user/:name' --expect name=anh /user/anh /user/anh/
//! ```
//!
//! ### `resolve`
//!
//! Build a route table and report which route each request lands on:
//!
//! ```bash
//! vi-router resolve \
//!     --route 'GET /user/:name' \
//!     --route 'GET /user/me' \
//!     --request 'GET /user/me' \
//!     --request 'GET /user/anh'
//! ```
//!
//! ## Usage from Code
//!
//! ```rust,ignore
//! use vi_router::cli::{Cli, run_cli};
//! use clap::Parser;
//!
//! let cli = Cli::parse();
//! run_cli(cli)?;
//! ```

mod commands;


pub use commands::{execute, run_cli, Cli, Commands};
