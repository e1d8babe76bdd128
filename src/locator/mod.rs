//! # Locator Module
//!
//! Resolves a structured request to the servlet that should handle it.
//!
//! ## Resolution steps
//!
//! 1. **Normalization**: unless the request reached the application through
//!    one of its virtual hosts, a leading `/<application>` segment is
//!    stripped. The result always starts with exactly one `/`.
//! 2. **Cache lookup**: the application's [`ServletCache`] maps normalized
//!    paths to servlet names. A hit skips route matching.
//! 3. **Progressive fallback**: the path is matched against the servlet route
//!    table; on a miss the last segment is dropped and matching retried while
//!    a `/` remains.
//! 4. **Security overlay**: the secured route table is matched against the
//!    full normalized path, with the same fallback, on every call, cached or
//!    not. A match attaches its [`AuthConfig`] to the result.
//! 5. **Cache write**: a fresh match is recorded for the normalized path
//!    together with the path its route matched.
//!
//! A cold and a warm call for the same request produce the same servlet,
//! matched path and policy.
//!
//! The result is an immutable [`Resolution`]; servlets are shared between
//! requests and never mutated by the locator.
//!
//! [`ServletCache`]: crate::application::ServletCache

mod error;
mod resolution;

#[cfg(test)]
mod tests;

pub use error::LocateError;
pub use resolution::Resolution;

use crate::application::{Application, CachedServlet};
use crate::router::{RouteError, RouteTable};
use crate::security::{AuthConfig, SecuredUrlConfig};
use crate::server::ServletRequest;
use arc_swap::ArcSwap;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{debug, info, warn};

/// Route table of servlet names
pub type ServletRoutes = RouteTable<String>;
/// Route table of security policies
pub type SecuredRoutes = RouteTable<Arc<AuthConfig>>;

/// Per-application resource locator
pub struct ServletLocator {
    application: Arc<Application>,
    routes: ArcSwap<ServletRoutes>,
    secured_routes: ArcSwap<SecuredRoutes>,
    // Serializes writers of the two tables; readers never take it.
    update_lock: Mutex<()>,
}

impl ServletLocator {
    /// Build both route tables from the application's current configuration.
    ///
    /// # Errors
    ///
    /// Returns [`RouteError::InvalidPattern`] for a pattern that does not
    /// compile and [`RouteError::UnknownServlet`] for a mapping that names a
    /// servlet the application does not have.
    pub fn new(application: Arc<Application>) -> Result<Self, RouteError> {
        let routes = build_servlet_routes(&application)?;
        let secured_routes = build_secured_routes(&application)?;
        info!(
            application = %application.name(),
            servlet_routes = routes.len(),
            secured_routes = secured_routes.len(),
            "Servlet locator initialized"
        );
        Ok(Self {
            application,
            routes: ArcSwap::from_pointee(routes),
            secured_routes: ArcSwap::from_pointee(secured_routes),
            update_lock: Mutex::new(()),
        })
    }

    #[must_use]
    pub fn application(&self) -> &Arc<Application> {
        &self.application
    }

    /// Current servlet route table.
    #[must_use]
    pub fn routes(&self) -> Arc<ServletRoutes> {
        self.routes.load_full()
    }

    /// Current secured route table.
    #[must_use]
    pub fn secured_routes(&self) -> Arc<SecuredRoutes> {
        self.secured_routes.load_full()
    }

    /// Request path relative to this application.
    #[must_use]
    pub fn request_path<R: ServletRequest + ?Sized>(&self, request: &R) -> String {
        let via_vhost = self.application.is_vhost_of(request.server_name());
        normalize_path(self.application.name(), request.path_info(), via_vhost)
    }

    /// Resolve `request` to a servlet.
    ///
    /// # Errors
    ///
    /// [`LocateError::NotFound`] when no route matches the path or any of its
    /// truncations; [`LocateError::ServletNotRegistered`] when the matched
    /// route names a servlet the application no longer has.
    pub fn locate<R: ServletRequest + ?Sized>(&self, request: &R) -> Result<Resolution, LocateError> {
        let request_path = self.request_path(request);
        let cache = self.application.cache();

        if let Some(cached) = cache.entry(&request_path) {
            match self.application.servlets().servlet(&cached.servlet_name) {
                Some(servlet) => {
                    let auth = self.secured_policy(&request_path);
                    debug!(
                        path = %request_path,
                        servlet = %cached.servlet_name,
                        secured = auth.is_some(),
                        "Servlet resolved from cache"
                    );
                    return Ok(Resolution {
                        servlet,
                        servlet_name: cached.servlet_name,
                        request_path,
                        matched_path: cached.matched_path,
                        auth,
                        from_cache: true,
                    });
                }
                None => warn!(
                    path = %request_path,
                    servlet = %cached.servlet_name,
                    "Cached servlet is not registered, matching again"
                ),
            }
        }

        let routes = self.routes.load();
        let (matched_path, servlet_name) = match routes.match_with_fallback(&request_path) {
            Ok(found) => (found.path.to_string(), found.route_match.payload().clone()),
            Err(last_attempt) => {
                debug!(
                    path = %request_path,
                    last_attempt = %last_attempt,
                    "No servlet route matched"
                );
                return Err(LocateError::NotFound {
                    last_attempt: last_attempt.to_string(),
                    path: request_path.clone(),
                });
            }
        };

        let servlet = self
            .application
            .servlets()
            .servlet(&servlet_name)
            .ok_or_else(|| LocateError::ServletNotRegistered {
                servlet_name: servlet_name.clone(),
                path: request_path.clone(),
            })?;
        let auth = self.secured_policy(&request_path);
        let cached = CachedServlet {
            servlet_name,
            matched_path,
        };
        cache.insert(&request_path, &cached);

        debug!(
            path = %request_path,
            matched_path = %cached.matched_path,
            servlet = %cached.servlet_name,
            secured = auth.is_some(),
            "Servlet resolved"
        );
        Ok(Resolution {
            servlet,
            servlet_name: cached.servlet_name,
            request_path,
            matched_path: cached.matched_path,
            auth,
            from_cache: false,
        })
    }

    /// Add a secured URL at runtime; applies from the next `locate` on.
    ///
    /// # Errors
    ///
    /// Returns [`RouteError::InvalidPattern`] if the pattern does not compile;
    /// the tables are left unchanged.
    pub fn register_secured_url(&self, config: SecuredUrlConfig) -> Result<(), RouteError> {
        let _guard = self.update_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let next = self
            .secured_routes
            .load()
            .with_route(&config.url_pattern, Arc::new(config.auth.clone()))?;
        self.secured_routes.store(Arc::new(next));
        info!(
            application = %self.application.name(),
            pattern = %config.url_pattern,
            realm = %config.auth.realm,
            "Secured URL registered"
        );
        self.application.servlets().add_secured_url(config);
        Ok(())
    }

    /// Rebuild both tables from the application's current mappings and drop
    /// the resolved-path cache.
    ///
    /// # Errors
    ///
    /// On a build error the previous tables and cache stay in place.
    pub fn reload_routes(&self) -> Result<(), RouteError> {
        let _guard = self.update_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let routes = build_servlet_routes(&self.application)?;
        let secured_routes = build_secured_routes(&self.application)?;
        info!(
            application = %self.application.name(),
            servlet_routes = routes.len(),
            secured_routes = secured_routes.len(),
            "Routes reloaded"
        );
        self.routes.store(Arc::new(routes));
        self.secured_routes.store(Arc::new(secured_routes));
        self.application.cache().invalidate();
        Ok(())
    }

    fn secured_policy(&self, path: &str) -> Option<Arc<AuthConfig>> {
        let secured = self.secured_routes.load();
        if secured.is_empty() {
            return None;
        }
        secured
            .match_with_fallback(path)
            .ok()
            .map(|found| Arc::clone(found.route_match.payload()))
    }
}

impl std::fmt::Debug for ServletLocator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServletLocator")
            .field("application", &self.application.name())
            .field("routes", &self.routes.load().len())
            .field("secured_routes", &self.secured_routes.load().len())
            .finish()
    }
}

/// Strip a leading `/<application_name>` segment unless reached by vhost.
///
/// Only a whole segment is stripped: for application `shop`, `/shop` and
/// `/shop/items` lose the prefix, `/shopping` keeps it. The result starts
/// with exactly one `/`.
#[must_use]
pub fn normalize_path(application_name: &str, path: &str, via_vhost: bool) -> String {
    let trimmed = path.trim_start_matches('/');
    let mut rest = trimmed;
    if !via_vhost && !application_name.is_empty() {
        if let Some(after) = trimmed.strip_prefix(application_name) {
            if after.is_empty() || after.starts_with('/') {
                rest = after.trim_start_matches('/');
            }
        }
    }
    format!("/{rest}")
}

fn build_servlet_routes(application: &Application) -> Result<ServletRoutes, RouteError> {
    let mappings = application.servlets().mappings();
    if let Some(unknown) = mappings
        .iter()
        .find(|m| application.servlets().servlet(&m.servlet_name).is_none())
    {
        return Err(RouteError::UnknownServlet {
            pattern: unknown.url_pattern.clone(),
            servlet_name: unknown.servlet_name.clone(),
        });
    }
    RouteTable::build(
        mappings
            .into_iter()
            .map(|m| (m.url_pattern, m.servlet_name)),
    )
}

fn build_secured_routes(application: &Application) -> Result<SecuredRoutes, RouteError> {
    RouteTable::build(
        application
            .servlets()
            .secured_urls()
            .into_iter()
            .map(|s| (s.url_pattern, Arc::new(s.auth))),
    )
}
