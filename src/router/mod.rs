//! # Router Module
//!
//! The router module owns route registration and the per-method path trees.
//!
//! ## Overview
//!
//! - [`Router`] is the registration builder: routes, groups, middleware,
//!   helpers, the not-found handler and static mounts
//! - [`PathTree`] stores the routes of one HTTP method as a character trie
//!
//! ## Architecture
//!
//! Registration happens in two phases:
//!
//! 1. **Setup**: routes are added through a [`Router`] and its groups. Every
//!    path is compiled once so a malformed pattern fails registration
//! 2. **Serving**: [`Router::build`] freezes the table into a
//!    [`Dispatcher`](crate::dispatcher::Dispatcher) that can be shared between
//!    threads
//!
//! ## Route lookup order
//!
//! A request path that equals a registered path always wins. Otherwise the
//! routes of the method are tried as patterns in the order they were first
//! registered; there is no specificity ranking. Register narrow patterns
//! before broad ones (`/user/:name/:id` before `/user/*`).

mod core;
mod tree;
#[cfg(test)]
mod tests;

pub use core::Router;
pub use tree::{PathTree, Route, TreeNode};
