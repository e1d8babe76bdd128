//! # Servlet Module
//!
//! Request-processing units registered with an application.
//!
//! A servlet is created once per registration by a factory in the
//! [`ServletRegistry`], initialized when its application is deployed, shared
//! by every request the locator resolves to it, and destroyed on undeploy.
//! Servlets never carry per-request state: everything a request needs
//! (matched path, security policy) arrives in the [`Resolution`].
//!
//! ## Built-in servlet classes
//!
//! | Class | Type | Behaviour |
//! |-------|------|-----------|
//! | `static` | [`StaticResourceServlet`] | serves files below the webapp directory |
//! | `default` | [`DefaultServlet`] | redirects bare directory paths to `<path>/`, else serves files |

mod default;
mod registry;
mod static_resource;

use crate::locator::Resolution;
use crate::server::{HttpRequest, ServletResponse};
use std::collections::BTreeMap;
use std::path::PathBuf;

pub use default::DefaultServlet;
pub use registry::{ServletFactory, ServletRegistry};
pub use static_resource::StaticResourceServlet;

/// Per-servlet configuration handed to factories and to [`Servlet::init`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServletConfig {
    pub servlet_name: String,
    pub application_name: String,
    /// Root directory of the owning application
    pub webapp_path: PathBuf,
    pub init_params: BTreeMap<String, String>,
}

impl ServletConfig {
    #[must_use]
    pub fn init_param(&self, name: &str) -> Option<&str> {
        self.init_params.get(name).map(String::as_str)
    }
}

/// Servlet lifecycle contract
pub trait Servlet: Send + Sync {
    /// Called once when the owning application is deployed.
    ///
    /// # Errors
    ///
    /// An error aborts deployment of the application.
    fn init(&self, _config: &ServletConfig) -> anyhow::Result<()> {
        Ok(())
    }

    /// Handle one request already resolved (and authenticated) for this servlet.
    fn service(&self, request: &HttpRequest, resolution: &Resolution) -> ServletResponse;

    /// Called once when the owning application is undeployed.
    fn destroy(&self) {}

    fn servlet_info(&self) -> &str {
        ""
    }
}
