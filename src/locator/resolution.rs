use crate::security::AuthConfig;
use crate::servlet::Servlet;
use std::fmt;
use std::sync::Arc;

/// Outcome of locating one request.
///
/// Built fresh for every `locate` call and never shared between requests, so
/// the security requirement it carries belongs to this request alone.
#[derive(Clone)]
pub struct Resolution {
    pub servlet: Arc<dyn Servlet>,
    pub servlet_name: String,
    /// Request path after application prefix stripping
    pub request_path: String,
    /// Path that matched a route; equal to `request_path` on a cache hit
    pub matched_path: String,
    /// Policy from the secured route table, if any pattern matched
    pub auth: Option<Arc<AuthConfig>>,
    pub from_cache: bool,
}

impl Resolution {
    #[must_use]
    pub fn requires_authentication(&self) -> bool {
        self.auth.is_some()
    }

    /// Part of the request path below the matched path (`""` if none).
    #[must_use]
    pub fn extra_path(&self) -> &str {
        self.request_path
            .strip_prefix(self.matched_path.as_str())
            .unwrap_or("")
    }
}

impl fmt::Debug for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Resolution")
            .field("servlet_name", &self.servlet_name)
            .field("request_path", &self.request_path)
            .field("matched_path", &self.matched_path)
            .field("auth", &self.auth)
            .field("from_cache", &self.from_cache)
            .finish_non_exhaustive()
    }
}
