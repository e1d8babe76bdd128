use super::framer::HttpFramer;
use super::request::{HttpRequest, HttpRequestBuilder, ServletRequest};
use super::response::ServletResponse;
use crate::config::FramerConfig;
use crate::ids::{RequestId, REQUEST_ID_HEADER};
use crate::locator::{LocateError, ServletLocator};
use crate::security::{Authenticator, BasicAuthenticator};
use std::io::{self, Read, Write};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, info_span, warn};

/// Per-connection request pipeline shared by all connection coroutines.
///
/// One request is served per connection: frame, pick the application, locate
/// the servlet, authenticate, service, respond, close.
#[derive(Clone)]
pub struct ContainerService {
    locators: Arc<Vec<ServletLocator>>,
    framer: HttpFramer<HttpRequestBuilder>,
    authenticator: Arc<dyn Authenticator>,
}

impl ContainerService {
    pub fn new(framer_config: FramerConfig, locators: Vec<ServletLocator>) -> Self {
        Self {
            locators: Arc::new(locators),
            framer: HttpFramer::new(framer_config, HttpRequestBuilder),
            authenticator: Arc::new(BasicAuthenticator),
        }
    }

    #[must_use]
    pub fn with_authenticator(mut self, authenticator: Arc<dyn Authenticator>) -> Self {
        self.authenticator = authenticator;
        self
    }

    #[must_use]
    pub fn locators(&self) -> &[ServletLocator] {
        &self.locators
    }

    /// Application for a request: vhost match first, then first path segment.
    #[must_use]
    pub fn select_locator<R: ServletRequest + ?Sized>(&self, request: &R) -> Option<&ServletLocator> {
        let server_name = request.server_name();
        if let Some(found) = self
            .locators
            .iter()
            .find(|l| l.application().is_vhost_of(server_name))
        {
            return Some(found);
        }
        let segment = request
            .path_info()
            .trim_start_matches('/')
            .split('/')
            .next()
            .unwrap_or("");
        self.locators
            .iter()
            .find(|l| l.application().name() == segment)
    }

    /// Produce the response for an already framed request.
    #[must_use]
    pub fn handle_request(&self, request: &HttpRequest) -> ServletResponse {
        let Some(locator) = self.select_locator(request) else {
            debug!(path = %request.path_info, host = %request.server_name, "No application for request");
            return ServletResponse::not_found(&request.path_info);
        };

        let resolution = match locator.locate(request) {
            Ok(resolution) => resolution,
            Err(e @ LocateError::NotFound { .. }) => {
                debug!(application = %locator.application().name(), error = %e, "Servlet not found");
                return ServletResponse::text(404, e.to_string());
            }
            Err(e) => {
                error!(application = %locator.application().name(), error = %e, "Servlet lookup failed");
                return ServletResponse::text(e.status_code(), "Internal Server Error");
            }
        };

        if let Some(auth) = &resolution.auth {
            if !self.authenticator.authenticate(auth, request) {
                info!(
                    path = %resolution.request_path,
                    realm = %auth.realm,
                    "Authentication required"
                );
                return ServletResponse::text(401, "Unauthorized")
                    .with_header("WWW-Authenticate", auth.challenge());
            }
        }

        let servlet = Arc::clone(&resolution.servlet);
        match catch_unwind(AssertUnwindSafe(|| servlet.service(request, &resolution))) {
            Ok(response) => response,
            Err(_) => {
                error!(
                    servlet = %resolution.servlet_name,
                    path = %resolution.request_path,
                    "Servlet panicked"
                );
                ServletResponse::text(500, "Internal Server Error")
            }
        }
    }

    /// Serve one request on `stream`.
    ///
    /// Framing errors are answered with their status code where one applies
    /// (400, 431) and otherwise just end the connection.
    ///
    /// # Errors
    ///
    /// Returns an error only when writing the response fails.
    pub fn handle_connection<S: Read + Write + ?Sized>(&self, stream: &mut S) -> io::Result<()> {
        let connection_id = RequestId::new();
        let span = info_span!(
            "connection",
            connection_id = %connection_id,
            request_id = tracing::field::Empty
        );
        let _entered = span.enter();
        let started = Instant::now();

        let request = match self.framer.receive(stream) {
            Ok(request) => request,
            Err(e) => {
                warn!(error = %e, "Failed to frame request");
                return match e.status_code() {
                    Some(status) => ServletResponse::text(status, e.to_string()).write_to(stream),
                    None => Ok(()),
                };
            }
        };

        let request_id = RequestId::from_header_or_new(request.header(REQUEST_ID_HEADER));
        span.record("request_id", tracing::field::display(request_id));

        let response = self
            .handle_request(&request)
            .with_header("X-Request-Id", request_id.to_string());
        info!(
            method = %request.method,
            path = %request.path_info,
            host = %request.server_name,
            status = response.status,
            bytes = response.body.len(),
            elapsed_us = started.elapsed().as_micros() as u64,
            "Request served"
        );
        response.write_to(stream)
    }

    /// Undeploy every application.
    pub fn shutdown(&self) {
        for locator in self.locators.iter() {
            locator.application().undeploy();
        }
    }
}

impl std::fmt::Debug for ContainerService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContainerService")
            .field("locators", &self.locators)
            .field("framer", &self.framer)
            .finish_non_exhaustive()
    }
}
