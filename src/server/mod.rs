//! # Server Module
//!
//! Socket-facing half of the container.
//!
//! - [`HttpFramer`] turns a byte stream into a header block and a body of
//!   the declared length.
//! - [`RequestBuilder`] / [`HttpRequestBuilder`] parse the header block into
//!   an [`HttpRequest`].
//! - [`ContainerService`] runs the per-connection pipeline: frame, pick the
//!   application, locate, authenticate, service, respond.
//! - [`HttpServer`] accepts connections and runs each on its own `may`
//!   coroutine.

mod error;
mod framer;
mod http_server;
mod request;
mod response;
mod service;

pub use error::FramingError;
pub use framer::HttpFramer;
pub use http_server::{HttpServer, ServerHandle};
pub use request::{
    parse_cookies, parse_query_params, HttpRequest, HttpRequestBuilder, RequestBuilder,
    ServletRequest,
};
pub use response::ServletResponse;
pub use service::ContainerService;
