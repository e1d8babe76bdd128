//! # Router Module
//!
//! Ordered URL-pattern tables used to resolve request paths to servlets and
//! to security policies.
//!
//! ## Overview
//!
//! A [`RouteTable`] is built once from an ordered `pattern -> payload` mapping.
//! Each pattern is compiled into an anchored regex:
//!
//! - a trailing `/*` becomes the capture `{placeholder_<index>}` matching `.*`,
//!   so it absorbs the rest of the path including further `/` separators
//! - `{name}` segments capture exactly one path segment
//! - everything else matches literally
//!
//! The route index doubles as the wildcard capture suffix, so two wildcard
//! routes never share a capture name.
//!
//! ## Matching
//!
//! [`RouteTable::match_path`] returns the first route, in insertion order,
//! matching the whole path. [`RouteTable::match_with_fallback`] implements the
//! progressive fallback traversal: on a miss it drops the final path segment
//! and retries until a route matches or no `/` remains.
//!
//! ## Example
//!
//! ```rust
//! use servlet_engine::router::RouteTable;
//!
//! let table = RouteTable::build(vec![
//!     ("/static/*", "static"),
//!     ("/users/{id}", "users"),
//! ])
//! .unwrap();
//!
//! let found = table.match_with_fallback("/users/42/avatar").unwrap();
//! assert_eq!(found.path, "/users/42");
//! assert_eq!(*found.route_match.payload(), "users");
//! assert_eq!(found.route_match.get_param("id"), Some("42"));
//! ```

mod core;
mod error;
#[cfg(test)]
mod tests;

pub use core::{
    FallbackMatch, ParamVec, Route, RouteMatch, RouteTable, MAX_INLINE_PARAMS, WILDCARD_PREFIX,
};
pub use error::RouteError;
