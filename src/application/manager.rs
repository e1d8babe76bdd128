use crate::security::SecuredUrlConfig;
use crate::servlet::{Servlet, ServletConfig};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::{Arc, PoisonError, RwLock};
use tracing::{debug, info, warn};

/// One `url-pattern -> servlet-name` entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ServletMapping {
    pub url_pattern: String,
    pub servlet_name: String,
}

impl ServletMapping {
    pub fn new(url_pattern: impl Into<String>, servlet_name: impl Into<String>) -> Self {
        Self {
            url_pattern: url_pattern.into(),
            servlet_name: servlet_name.into(),
        }
    }
}

/// A servlet instance and the configuration it was created with.
#[derive(Clone)]
pub struct RegisteredServlet {
    pub servlet: Arc<dyn Servlet>,
    pub config: ServletConfig,
}

/// Servlets, mappings and security configuration of one application.
///
/// Servlets are registered while the application is assembled. Mappings and
/// secured URLs may also be added after deployment; the locator picks them
/// up on `reload_routes` / `register_secured_url`.
#[derive(Default)]
pub struct ServletManager {
    servlets: BTreeMap<String, RegisteredServlet>,
    mappings: RwLock<Vec<ServletMapping>>,
    secured_urls: RwLock<Vec<SecuredUrlConfig>>,
}

impl ServletManager {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a servlet under `config.servlet_name`, replacing any previous one.
    pub fn add_servlet(&mut self, servlet: Arc<dyn Servlet>, config: ServletConfig) {
        let name = config.servlet_name.clone();
        if self
            .servlets
            .insert(name.clone(), RegisteredServlet { servlet, config })
            .is_some()
        {
            warn!(servlet = %name, "Servlet registered twice, keeping the last one");
        }
    }

    /// Append a mapping; order of addition is match order.
    pub fn add_mapping(&self, mapping: ServletMapping) {
        debug!(pattern = %mapping.url_pattern, servlet = %mapping.servlet_name, "Servlet mapping added");
        self.mappings
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(mapping);
    }

    pub fn add_secured_url(&self, config: SecuredUrlConfig) {
        self.secured_urls
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(config);
    }

    #[must_use]
    pub fn servlet(&self, name: &str) -> Option<Arc<dyn Servlet>> {
        self.servlets.get(name).map(|r| Arc::clone(&r.servlet))
    }

    #[must_use]
    pub fn servlet_config(&self, name: &str) -> Option<&ServletConfig> {
        self.servlets.get(name).map(|r| &r.config)
    }

    pub fn servlet_names(&self) -> impl Iterator<Item = &str> {
        self.servlets.keys().map(String::as_str)
    }

    /// Snapshot of the mappings in match order.
    #[must_use]
    pub fn mappings(&self) -> Vec<ServletMapping> {
        self.mappings
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Snapshot of the secured URL configs in match order.
    #[must_use]
    pub fn secured_urls(&self) -> Vec<SecuredUrlConfig> {
        self.secured_urls
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Run `init` on every servlet.
    ///
    /// # Errors
    ///
    /// Stops at, and returns, the first servlet that fails to initialize.
    pub fn init_all(&self) -> anyhow::Result<()> {
        for (name, registered) in &self.servlets {
            registered
                .servlet
                .init(&registered.config)
                .map_err(|e| e.context(format!("Failed to initialize servlet '{name}'")))?;
            info!(
                servlet = %name,
                application = %registered.config.application_name,
                info = %registered.servlet.servlet_info(),
                "Servlet initialized"
            );
        }
        Ok(())
    }

    pub fn destroy_all(&self) {
        for (name, registered) in &self.servlets {
            registered.servlet.destroy();
            debug!(servlet = %name, "Servlet destroyed");
        }
    }
}

impl std::fmt::Debug for ServletManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServletManager")
            .field("servlets", &self.servlets.keys().collect::<Vec<_>>())
            .field("mappings", &self.mappings())
            .field("secured_urls", &self.secured_urls().len())
            .finish()
    }
}
