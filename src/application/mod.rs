//! # Application Module
//!
//! A deployed web application: its name, virtual hosts, servlets, and the
//! attribute context holding its resolved-path cache.
//!
//! Applications are assembled mutably (servlets registered through
//! [`Application::add_servlet`]), then frozen behind an `Arc` and handed to a
//! [`ServletLocator`](crate::locator::ServletLocator). [`Application::deploy`]
//! initializes the servlets; [`Application::undeploy`] drops the cache and
//! destroys them.

mod cache;
mod context;
mod manager;

pub use cache::{CachedServlet, ServletCache};
pub use context::ApplicationContext;
pub use manager::{RegisteredServlet, ServletManager, ServletMapping};

use crate::servlet::{Servlet, ServletConfig};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

#[derive(Debug)]
pub struct Application {
    name: String,
    vhosts: Vec<String>,
    webapp_path: PathBuf,
    context: Arc<ApplicationContext>,
    servlets: ServletManager,
    cache: ServletCache,
}

impl Application {
    pub fn new(
        name: impl Into<String>,
        webapp_path: impl Into<PathBuf>,
        context: Arc<ApplicationContext>,
    ) -> Self {
        let name = name.into();
        let cache = ServletCache::new(&name, Arc::clone(&context));
        Self {
            name,
            vhosts: Vec::new(),
            webapp_path: webapp_path.into(),
            context,
            servlets: ServletManager::new(),
            cache,
        }
    }

    #[must_use]
    pub fn with_vhost(mut self, vhost: impl Into<String>) -> Self {
        self.vhosts.push(vhost.into());
        self
    }

    /// Register a servlet under `servlet_name` with a config derived from this
    /// application.
    pub fn add_servlet(
        &mut self,
        servlet_name: impl Into<String>,
        servlet: Arc<dyn Servlet>,
        init_params: BTreeMap<String, String>,
    ) {
        let config = self.servlet_config(servlet_name, init_params);
        self.servlets.add_servlet(servlet, config);
    }

    /// Config a servlet registered under `servlet_name` would receive.
    #[must_use]
    pub fn servlet_config(
        &self,
        servlet_name: impl Into<String>,
        init_params: BTreeMap<String, String>,
    ) -> ServletConfig {
        ServletConfig {
            servlet_name: servlet_name.into(),
            application_name: self.name.clone(),
            webapp_path: self.webapp_path.clone(),
            init_params,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn vhosts(&self) -> &[String] {
        &self.vhosts
    }

    #[must_use]
    pub fn webapp_path(&self) -> &Path {
        &self.webapp_path
    }

    #[must_use]
    pub fn context(&self) -> &Arc<ApplicationContext> {
        &self.context
    }

    #[must_use]
    pub fn servlets(&self) -> &ServletManager {
        &self.servlets
    }

    #[must_use]
    pub fn cache(&self) -> &ServletCache {
        &self.cache
    }

    /// `true` if `server_name` is one of this application's virtual hosts.
    #[must_use]
    pub fn is_vhost_of(&self, server_name: &str) -> bool {
        self.vhosts
            .iter()
            .any(|vhost| vhost.eq_ignore_ascii_case(server_name))
    }

    /// Initialize all servlets.
    ///
    /// # Errors
    ///
    /// Returns the first servlet initialization failure.
    pub fn deploy(&self) -> anyhow::Result<()> {
        self.servlets.init_all()?;
        info!(
            application = %self.name,
            vhosts = ?self.vhosts,
            path = %self.webapp_path.display(),
            "Application deployed"
        );
        Ok(())
    }

    /// Drop the resolved-path cache and destroy all servlets.
    pub fn undeploy(&self) {
        self.cache.invalidate();
        self.servlets.destroy_all();
        info!(application = %self.name, "Application undeployed");
    }
}
