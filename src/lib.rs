//! # servlet-engine
//!
//! Request-dispatch core of a servlet-style application container, running
//! one `may` coroutine per connection.
//!
//! ## Overview
//!
//! A raw byte stream becomes a structured request, and the request is
//! resolved to the servlet registered for its path, together with any
//! URL-based access policy that applies to it.
//!
//! ```text
//! socket bytes -> HttpFramer -> raw header + body -> RequestBuilder -> HttpRequest
//!     -> ServletLocator (normalize -> cache -> route match -> security match)
//!     -> Resolution -> authenticate -> Servlet::service -> ServletResponse
//! ```
//!
//! ## Modules
//!
//! - **[`router`]** - ordered pattern route tables and progressive fallback matching
//! - **[`server`]** - HTTP framing, request parsing, responses, connection service and listener
//! - **[`locator`]** - per-application servlet resolution with caching and security overlay
//! - **[`application`]** - applications, attribute context, resolved-path cache, servlet manager
//! - **[`servlet`]** - servlet lifecycle trait, registry and built-in servlets
//! - **[`security`]** - secured URL configuration and HTTP Basic authentication
//! - **[`deployment`]** - application discovery from a directory tree
//! - **[`config`]** / **[`runtime_config`]** - YAML and environment configuration
//! - **[`logging`]** - `tracing` subscriber setup
//!
//! ## Example
//!
//! ```rust
//! use servlet_engine::application::{Application, ApplicationContext, ServletMapping};
//! use servlet_engine::locator::ServletLocator;
//! use servlet_engine::server::{HttpRequestBuilder, RequestBuilder};
//! use servlet_engine::servlet::DefaultServlet;
//! use std::collections::BTreeMap;
//! use std::sync::Arc;
//!
//! let context = Arc::new(ApplicationContext::new());
//! let mut app = Application::new("shop", "/srv/webapps/shop", context);
//! let servlet = Arc::new(DefaultServlet::from_config(&app.servlet_config("default", BTreeMap::new())));
//! app.add_servlet("default", servlet, BTreeMap::new());
//! app.servlets().add_mapping(ServletMapping::new("/*", "default"));
//!
//! let locator = ServletLocator::new(Arc::new(app)).unwrap();
//! let request = HttpRequestBuilder
//!     .init_from_raw_header(b"GET /shop/index.html HTTP/1.1\r\nHost: localhost")
//!     .unwrap();
//! let resolution = locator.locate(&request).unwrap();
//! assert_eq!(resolution.servlet_name, "default");
//! assert_eq!(resolution.request_path, "/index.html");
//! ```

pub mod application;
pub mod cli;
pub mod config;
pub mod deployment;
pub mod ids;
pub mod locator;
pub mod logging;
pub mod router;
pub mod runtime_config;
pub mod security;
pub mod server;
pub mod servlet;

pub use application::{Application, ApplicationContext};
pub use locator::{LocateError, Resolution, ServletLocator};
pub use server::{ContainerService, HttpFramer, HttpServer};
