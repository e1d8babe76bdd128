use super::{Servlet, ServletConfig, StaticResourceServlet};
use crate::locator::Resolution;
use crate::server::{HttpRequest, ServletResponse};
use tracing::debug;

/// Fallback servlet mapped to `/*` when an application declares nothing.
///
/// A directory requested without its trailing `/` is redirected to the
/// slashed form so relative links inside the index page resolve; anything
/// else is served as a static resource.
#[derive(Debug, Clone)]
pub struct DefaultServlet {
    files: StaticResourceServlet,
}

impl DefaultServlet {
    pub fn new(files: StaticResourceServlet) -> Self {
        Self { files }
    }

    #[must_use]
    pub fn from_config(config: &ServletConfig) -> Self {
        Self::new(StaticResourceServlet::from_config(config))
    }
}

impl Servlet for DefaultServlet {
    fn service(&self, request: &HttpRequest, resolution: &Resolution) -> ServletResponse {
        let path = &resolution.request_path;
        let is_dir = self.files.map_path(path).is_some_and(|p| p.is_dir());
        if is_dir && !path.ends_with('/') {
            // Redirect relative to what the client sent, application prefix included.
            let location = format!("{}/", request.path_info.trim_end_matches('/'));
            debug!(path = %path, location = %location, "Redirecting to directory");
            return ServletResponse::new(301).with_header("Location", location);
        }
        self.files.serve(request, path)
    }

    fn servlet_info(&self) -> &str {
        "DefaultServlet"
    }
}
